//! Base types and error handling.
//!
//! - [`ProbeError`]: errors raised before any lookup is attempted
//! - [`CheckState`]: terminal states of a convergence check

pub mod checkstate;
pub mod error;

pub use checkstate::CheckState;
pub use error::ProbeError;
