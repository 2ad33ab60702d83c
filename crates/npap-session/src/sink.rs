use std::sync::mpsc::Sender;

use tracing::debug;

use crate::alert::AlertJob;

/// Receives every alert the receive loop accepts.
pub trait AlertSink {
    fn on_alert(&mut self, job: AlertJob);
}

impl<F> AlertSink for F
where
    F: FnMut(AlertJob),
{
    fn on_alert(&mut self, job: AlertJob) {
        self(job)
    }
}

/// Publishes alerts into an `mpsc` channel.
///
/// A disconnected receiver is not an error; the alert is dropped.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<AlertJob>,
}

impl ChannelSink {
    pub fn new(tx: Sender<AlertJob>) -> Self {
        Self { tx }
    }
}

impl AlertSink for ChannelSink {
    fn on_alert(&mut self, job: AlertJob) {
        if let Err(err) = self.tx.send(job) {
            debug!(job_id = %err.0.job_id(), "alert receiver gone, dropping alert");
        }
    }
}
