//! Editing session: walks the uploaded sequence one image at a time.
//!
//! The [`Session`] is the single authoritative state holder. It owns the
//! crop engine, the active filter, the saved crop placement and the output
//! collector; hosts forward pointer and keyboard events to it and read the
//! observable state back after each event.

mod navigator;

use serde::Serialize;
use thiserror::Error;

pub use navigator::{ConfirmOutcome, Session};

/// Where the session is in the uploaded sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "index", rename_all = "lowercase")]
pub enum SessionState {
    /// Nothing was uploaded. Terminal.
    Empty,
    /// Showing the image at this index.
    Browsing(usize),
    /// Every image was confirmed or batch-processed. Terminal.
    Finished,
}

impl SessionState {
    pub fn index(self) -> Option<usize> {
        match self {
            SessionState::Browsing(i) => Some(i),
            _ => None,
        }
    }
}

/// A control call that is not valid in the current state.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No images uploaded yet")]
    Empty,

    #[error("All images have been processed")]
    Finished,

    #[error("A batch is already running")]
    BatchRunning,

    #[error("No batch is running")]
    NoBatchRunning,
}
