use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::{Result, TransportError};

/// UDP port every NPAP printer listens on.
pub const PRINTER_PORT: u16 = 9300;

/// Largest datagram the transport will ever hand back.
pub const MAX_DATAGRAM_SIZE: usize = 65_535;

/// Smallest timeout accepted by the socket layer (zero means "block forever").
const MIN_TIMEOUT: Duration = Duration::from_millis(1);

/// Metadata for one received datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Received {
    /// Number of bytes written into the caller's buffer.
    pub len: usize,
    /// Source address of the datagram.
    pub from: SocketAddr,
}

/// An unconnected UDP socket bound to an ephemeral local port, paired with
/// the printer endpoint it talks to.
///
/// The socket is closed when the value is dropped.
pub struct PrinterSocket {
    socket: UdpSocket,
    printer: SocketAddr,
}

impl PrinterSocket {
    /// Open a socket towards `address` on [`PRINTER_PORT`].
    ///
    /// `address` is an IPv4/IPv6 literal or a host name.
    pub fn connect(address: &str) -> Result<Self> {
        Self::connect_addr(resolve(address)?)
    }

    /// Open a socket towards an explicit printer endpoint.
    pub fn connect_addr(printer: SocketAddr) -> Result<Self> {
        let local = match printer {
            SocketAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            SocketAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        };
        let socket =
            UdpSocket::bind(local).map_err(|source| TransportError::Bind { addr: local, source })?;

        debug!(%printer, local = ?socket.local_addr().ok(), "opened printer socket");

        Ok(Self { socket, printer })
    }

    /// The printer endpoint datagrams are sent to.
    pub fn printer(&self) -> SocketAddr {
        self.printer
    }

    /// The local address the socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(Into::into)
    }

    /// Whether a datagram source belongs to the printer (same IP, any port).
    pub fn is_from_printer(&self, from: SocketAddr) -> bool {
        from.ip() == self.printer.ip()
    }

    /// Send one datagram to the printer.
    pub fn send(&self, datagram: &[u8]) -> Result<()> {
        self.send_to(datagram, self.printer)
    }

    /// Send one datagram to an explicit destination.
    pub fn send_to(&self, datagram: &[u8], dest: SocketAddr) -> Result<()> {
        let sent = loop {
            match self.socket.send_to(datagram, dest) {
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        };
        if sent != datagram.len() {
            return Err(TransportError::Io(std::io::Error::new(
                ErrorKind::WriteZero,
                format!("short datagram write ({sent} of {} bytes)", datagram.len()),
            )));
        }
        trace!(%dest, len = sent, "sent datagram");
        Ok(())
    }

    /// Receive one datagram, waiting at most `timeout`.
    ///
    /// Returns `Ok(None)` when the timeout elapses without traffic.
    pub fn recv(&self, buf: &mut [u8], timeout: Duration) -> Result<Option<Received>> {
        self.socket.set_read_timeout(Some(timeout.max(MIN_TIMEOUT)))?;
        loop {
            match self.socket.recv_from(buf) {
                Ok((len, from)) => {
                    trace!(%from, len, "received datagram");
                    return Ok(Some(Received { len, from }));
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
                {
                    return Ok(None);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

impl std::fmt::Debug for PrinterSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrinterSocket")
            .field("printer", &self.printer)
            .field("local", &self.socket.local_addr().ok())
            .finish()
    }
}

/// Resolve a printer address string to its NPAP endpoint.
///
/// IP literals are used as-is; anything else goes through the system
/// resolver and the first result wins.
pub fn resolve(address: &str) -> Result<SocketAddr> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(TransportError::InvalidAddress {
            address: address.to_string(),
            reason: "address is empty".to_string(),
        });
    }

    let literal = trimmed.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = literal.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, PRINTER_PORT));
    }

    let mut addrs =
        (trimmed, PRINTER_PORT)
            .to_socket_addrs()
            .map_err(|source| TransportError::Resolve {
                address: trimmed.to_string(),
                source,
            })?;

    addrs.next().ok_or_else(|| TransportError::InvalidAddress {
        address: trimmed.to_string(),
        reason: "resolver returned no addresses".to_string(),
    })
}
