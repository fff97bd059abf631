//! SOS notification dispatch for Haven.
//!
//! The flow is linear: validate the trigger ([`request`]), resolve the user,
//! persist the alert, fan out to trusted contacts ([`fanout`]) over the
//! email and SMS [`channel`]s, and report how many contacts were reached
//! ([`dispatch`]).

pub mod channel;
pub mod compose;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod fanout;
pub mod request;

pub use dispatch::{DispatchResult, SosDispatcher};
pub use error::{DispatchError, TransportError};
pub use fanout::{ContactFanout, Notifier};
pub use request::{TriggerRequest, ValidationErrors};
