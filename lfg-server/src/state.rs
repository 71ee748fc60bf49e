//! Application state shared across all request handlers.

use lfg_core::status::{EngineStatus, StatusReceiver};

/// Application state that is shared across all request handlers.
///
/// The handlers only ever read the latest snapshot published by the
/// engine; they never touch engine state directly.
#[derive(Clone)]
pub struct AppState {
    status: StatusReceiver,
}

impl AppState {
    pub fn new(status: StatusReceiver) -> Self {
        Self { status }
    }

    /// The most recent engine snapshot.
    pub fn status(&self) -> EngineStatus {
        self.status.borrow().clone()
    }
}
