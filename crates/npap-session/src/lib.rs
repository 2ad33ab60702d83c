//! Alert subscription sessions with an NPAP printer.
//!
//! This is the "just works" layer. Open a [`NpapClient`] for a printer,
//! [`subscribe`](NpapClient::subscribe) to job-completion alerts, then run
//! the blocking [receive loop](NpapClient::run_receive_loop) on a thread of
//! your choosing; every accepted alert is decoded, interpreted into an
//! [`AlertJob`] and handed to an [`AlertSink`].

pub mod alert;
pub mod cancel;
pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod sink;
pub mod state;

pub use alert::{interpret, parse_annotation, AlertJob, Annotation};
pub use cancel::CancelToken;
pub use client::{NpapClient, ReceiveSummary, StepReport, SubscribeReport};
pub use config::{ReceiveErrorPolicy, SessionConfig};
pub use error::{Result, SessionError};
pub use sink::{AlertSink, ChannelSink};
pub use state::{Accepted, InboundAlert, LinkState};
