//! Optimization sessions.
//!
//! An [`Optimizer`] owns the base model and up to one component of each
//! kind, runs them on `fit()` and persists the result.

mod save;
mod session;
mod state;


pub use session::{OptimizedModel, Optimizer};
pub use state::SessionState;
