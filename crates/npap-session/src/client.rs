//! Blocking NPAP client: command exchanges, subscription and the alert loop.

use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Instant;

use bytes::Bytes;
use npap_frame::{decode_parameters, ObjectId, Request};
use npap_transport::PrinterSocket;
use serde::Serialize;
use tracing::{debug, error, info, trace, warn};

use crate::alert::interpret;
use crate::cancel::CancelToken;
use crate::config::{ReceiveErrorPolicy, SessionConfig};
use crate::error::{Result, SessionError};
use crate::protocol::{self, DISCOVERY_OBJECT, MIN_DISCOVERY_RESPONSE};
use crate::sink::AlertSink;
use crate::state::LinkState;

/// Outcome of one negotiation command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub name: &'static str,
    pub acknowledged: bool,
}

/// What a successful subscribe negotiated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscribeReport {
    /// Feature bits the printer offered (discovery byte 9, masked).
    pub feature_flag: u8,
    /// Commands sent, discovery included.
    pub commands_sent: usize,
    /// Commands that got a matching Response.
    pub commands_acknowledged: usize,
    /// Follow-up commands in send order.
    pub steps: Vec<StepReport>,
}

/// Counters returned when the receive loop ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReceiveSummary {
    /// Datagrams received before cancellation.
    pub datagrams: u64,
    /// Alerts acknowledged (filtered ones included).
    pub acknowledged: u64,
    /// Jobs handed to the sink.
    pub emitted: u64,
    /// Datagrams from other hosts or that were not alerts.
    pub ignored: u64,
    /// Alerts outside the job-completion families.
    pub filtered: u64,
    /// Job alerts the interpreter did not report.
    pub discarded: u64,
    /// Socket errors skipped under [`ReceiveErrorPolicy::Skip`].
    pub errors: u64,
}

struct Link {
    socket: PrinterSocket,
    state: LinkState,
    buf: Vec<u8>,
}

/// A session with one printer.
///
/// All operations take `&self`; an internal lock serializes exchanges with
/// the receive loop, so the client can be shared across threads (for
/// example, run the loop on one thread and unsubscribe from another).
pub struct NpapClient {
    link: Mutex<Link>,
    printer: SocketAddr,
    config: SessionConfig,
    closed: bool,
}

impl NpapClient {
    /// Open a session towards `address` (IP literal or host name) with
    /// default settings.
    pub fn connect(address: &str) -> Result<Self> {
        Self::connect_with_config(address, SessionConfig::default())
    }

    pub fn connect_with_config(address: &str, config: SessionConfig) -> Result<Self> {
        Ok(Self::from_socket(PrinterSocket::connect(address)?, config))
    }

    /// Open a session towards an explicit endpoint (non-standard port, tests).
    pub fn connect_addr(printer: SocketAddr, config: SessionConfig) -> Result<Self> {
        Ok(Self::from_socket(PrinterSocket::connect_addr(printer)?, config))
    }

    fn from_socket(socket: PrinterSocket, config: SessionConfig) -> Self {
        let printer = socket.printer();
        let buf = vec![0u8; config.max_datagram_size.max(1)];

        info!(%printer, "npap session opened");

        Self {
            link: Mutex::new(Link {
                socket,
                state: LinkState::new(),
                buf,
            }),
            printer,
            config,
            closed: false,
        }
    }

    pub fn printer(&self) -> SocketAddr {
        self.printer
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.lock().socket.local_addr()?)
    }

    /// Acknowledgment number learned from the last accepted Response.
    pub fn ack_number(&self) -> u16 {
        self.lock().state.ack_number()
    }

    /// Packet id the next command will carry.
    pub fn next_packet_id(&self) -> u32 {
        self.lock().state.next_packet_id()
    }

    /// Send `request` and wait for its Response.
    ///
    /// The first datagram from the printer decides the exchange; anything
    /// but the matching Response fails it. An accepted Response is
    /// acknowledged to its source before the payload is returned.
    pub fn exchange(&self, request: &Request) -> Result<Bytes> {
        let payload = request.to_bytes()?;
        let timeout = self.config.response_timeout;

        let mut link = self.lock();
        let Link { socket, state, buf } = &mut *link;

        let (packet_id, datagram) = state.build_command(&payload);
        debug!(packet_id, object = %request.object(), "sending command");
        socket.send(&datagram)?;

        let deadline = Instant::now() + timeout;
        let received = loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(SessionError::NoResponse { packet_id, timeout });
            }
            let Some(received) = socket.recv(buf, remaining)? else {
                return Err(SessionError::NoResponse { packet_id, timeout });
            };
            if socket.is_from_printer(received.from) {
                break received;
            }
            trace!(from = %received.from, "ignoring datagram from another host");
        };

        let accepted = state.accept_response(&buf[..received.len])?;
        if let Err(err) = socket.send_to(&accepted.ack, received.from) {
            warn!(packet_id, %err, "failed to acknowledge response");
        }
        debug!(
            packet_id,
            sequence = accepted.sequence,
            ack_number = state.ack_number(),
            "command acknowledged"
        );

        Ok(accepted.payload)
    }

    /// Subscribe to job-completion alerts; `false` on any failure.
    pub fn subscribe(&self) -> bool {
        match self.try_subscribe() {
            Ok(_) => true,
            Err(err) => {
                warn!(printer = %self.printer, %err, "subscribe failed");
                false
            }
        }
    }

    /// Subscribe and report what was negotiated.
    ///
    /// Only the discovery exchange can fail the subscription; the follow-up
    /// commands are best-effort and their outcomes are reported.
    pub fn try_subscribe(&self) -> Result<SubscribeReport> {
        let response = self.exchange(&protocol::discovery())?;

        if response.len() < MIN_DISCOVERY_RESPONSE {
            return Err(SessionError::ShortResponse {
                len: response.len(),
                min: MIN_DISCOVERY_RESPONSE,
            });
        }
        if let Some(got) = ObjectId::from_payload(&response) {
            if got != DISCOVERY_OBJECT {
                return Err(SessionError::DescriptorMismatch {
                    expected: DISCOVERY_OBJECT,
                    got,
                });
            }
        }

        let feature_flag = protocol::feature_flag(&response);
        debug!(feature_flag, "printer features discovered");

        let steps: Vec<StepReport> = protocol::negotiation_plan(feature_flag)
            .into_iter()
            .map(|step| {
                let acknowledged = match self.exchange(&step.request) {
                    Ok(_) => true,
                    Err(err) => {
                        warn!(step = step.name, %err, "negotiation step failed, continuing");
                        false
                    }
                };
                StepReport {
                    name: step.name,
                    acknowledged,
                }
            })
            .collect();

        let report = SubscribeReport {
            feature_flag,
            commands_sent: 1 + steps.len(),
            commands_acknowledged: 1 + steps.iter().filter(|s| s.acknowledged).count(),
            steps,
        };
        info!(
            printer = %self.printer,
            feature_flag,
            acknowledged = report.commands_acknowledged,
            sent = report.commands_sent,
            "subscribed to job alerts"
        );
        Ok(report)
    }

    /// Disable all job alerts; `false` on any failure.
    pub fn unsubscribe(&self) -> bool {
        match self.try_unsubscribe() {
            Ok(()) => true,
            Err(err) => {
                warn!(printer = %self.printer, %err, "unsubscribe failed");
                false
            }
        }
    }

    pub fn try_unsubscribe(&self) -> Result<()> {
        self.exchange(&protocol::unsubscribe())?;
        info!(printer = %self.printer, "unsubscribed from job alerts");
        Ok(())
    }

    /// Receive alerts until `cancel` fires.
    ///
    /// Every alert from the printer is acknowledged. Job-completion alerts
    /// are decoded and interpreted, and reportable jobs go to `sink`, which
    /// is called without the session lock held.
    pub fn run_receive_loop<S>(&self, sink: &mut S, cancel: &CancelToken) -> Result<ReceiveSummary>
    where
        S: AlertSink + ?Sized,
    {
        let mut summary = ReceiveSummary::default();
        info!(printer = %self.printer, "receive loop started");

        while !cancel.is_cancelled() {
            let payload = match self.poll_alert(cancel, &mut summary) {
                Ok(Some(payload)) => payload,
                Ok(None) => continue,
                Err(err) => match self.config.receive_errors {
                    ReceiveErrorPolicy::Skip => {
                        summary.errors += 1;
                        warn!(%err, "receive failed, continuing");
                        thread::sleep(self.config.poll_interval);
                        continue;
                    }
                    ReceiveErrorPolicy::Stop => {
                        error!(%err, "receive failed, stopping loop");
                        return Err(err);
                    }
                },
            };

            let parameters = decode_parameters(&payload);
            trace!(parameters = parameters.len(), "decoded alert parameters");
            match interpret(&parameters) {
                Some(job) => {
                    summary.emitted += 1;
                    debug!(job_id = job.job_id(), pages = job.pages(), "job alert");
                    sink.on_alert(job);
                }
                None => summary.discarded += 1,
            }
        }

        info!(
            datagrams = summary.datagrams,
            emitted = summary.emitted,
            "receive loop cancelled"
        );
        Ok(summary)
    }

    /// Wait one poll interval for a datagram, acknowledge it if it is an
    /// alert, and return its payload if it is a job alert.
    fn poll_alert(&self, cancel: &CancelToken, summary: &mut ReceiveSummary) -> Result<Option<Bytes>> {
        let mut link = self.lock();
        let Link { socket, state, buf } = &mut *link;

        let Some(received) = socket.recv(buf, self.config.poll_interval)? else {
            return Ok(None);
        };
        if cancel.is_cancelled() {
            trace!(from = %received.from, "cancelled, dropping datagram");
            return Ok(None);
        }
        summary.datagrams += 1;

        if !socket.is_from_printer(received.from) {
            summary.ignored += 1;
            trace!(from = %received.from, "ignoring datagram from another host");
            return Ok(None);
        }
        let Some(inbound) = state.accept_alert(&buf[..received.len]) else {
            summary.ignored += 1;
            return Ok(None);
        };

        socket.send_to(&inbound.ack, received.from)?;
        summary.acknowledged += 1;

        if inbound.payload.is_none() {
            summary.filtered += 1;
            debug!(sequence = inbound.sequence, "alert outside job families, acknowledged only");
        }
        Ok(inbound.payload)
    }

    /// Unsubscribe and release the session. Returns the unsubscribe outcome.
    pub fn close(mut self) -> bool {
        let unsubscribed = self.unsubscribe();
        self.closed = true;
        unsubscribed
    }

    fn lock(&self) -> MutexGuard<'_, Link> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for NpapClient {
    fn drop(&mut self) {
        if self.closed || !self.config.unsubscribe_on_drop {
            return;
        }
        if let Err(err) = self.try_unsubscribe() {
            debug!(printer = %self.printer, %err, "unsubscribe on drop failed");
        }
    }
}

impl std::fmt::Debug for NpapClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NpapClient")
            .field("printer", &self.printer)
            .field("config", &self.config)
            .field("closed", &self.closed)
            .finish()
    }
}
