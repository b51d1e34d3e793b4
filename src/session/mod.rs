//! Session and message state management
//!
//! [`SessionController`] is the stateful owner of the session list, the
//! current session and its message log. It talks to the backend through a
//! [`crate::service::SessionService`] and keeps the local view consistent:
//! optimistic updates are marked with a [`SyncState`] until confirmed, and
//! locally appended messages carry a [`DeliveryStatus`].

pub mod activity;
pub mod controller;
pub mod convert;
pub mod flight;
pub mod types;

pub use activity::ActivityTracker;
pub use controller::{
    ControllerErrors, ControllerOptions, ControllerSnapshot, FetchOutcome, SessionController,
    DEFAULT_INACTIVITY_WINDOW,
};
pub use types::{DeliveryStatus, Message, Session, SessionUpdate, SyncState};
