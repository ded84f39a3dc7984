//! Error types and result aliases for Quiver.
//!
//! Every fallible operation in the workspace returns [`QuiverResult`]. Errors are
//! local to the failing evaluation; nothing here carries process-wide state.

mod error;

pub use error::{QuiverError, QuiverResult};
