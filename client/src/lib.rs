//! Client side of the party signup system.
//!
//! This crate owns everything that happens before a registration reaches the
//! server: the payment-gated workflow state machine, the session-local draft
//! that survives a page reload, the dwell timer in front of the commit
//! button, and the polling watcher behind the organizer overview.

pub mod api;
pub mod flow;
pub mod language;
pub mod overview;
pub mod session;

pub use api::{ApiError, HttpRegistrationApi, RegistrationApi};
pub use flow::{
    CommitError, Draft, DraftError, FlowController, FlowError, FlowEvent, FlowState,
};
pub use language::Language;
pub use overview::OverviewWatcher;
pub use session::{FileSessionStore, MemorySessionStore, SessionStore};
