//! Session lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of an [`Optimizer`](super::Optimizer).
///
/// `Configured → Fitting → Fitted → Saved`, with `Fitting → Failed` when a
/// component errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Configured,
    Fitting,
    Fitted,
    Saved,
    Failed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Configured => "configured",
            SessionState::Fitting => "fitting",
            SessionState::Fitted => "fitted",
            SessionState::Saved => "saved",
            SessionState::Failed => "failed",
        }
    }

    /// True once an optimized model exists.
    pub fn has_result(&self) -> bool {
        matches!(self, SessionState::Fitted | SessionState::Saved)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
