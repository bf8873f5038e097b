//! Centralized error handling for the IPTV checker
//!
//! Per-source validation failures are never errors: they are recorded as
//! `ProbeOutcome`/`SourceResult` values and stay local to one source. The
//! types in this module cover everything else.
//!
//! # Error Categories
//!
//! - **Application Errors**: configuration, catalog I/O, missing external tools.
//!   These abort the whole run.
//! - **Capability Errors**: an external inspector or player could not be run
//!   or produced unusable output. Stage probes turn these into outcomes.
//! - **Reachability Errors**: HTTP transport failures seen by the
//!   reachability client, classified so the retry policy can tell transient
//!   conditions from definitive ones.
//!
//! # Usage
//!
//! ```rust
//! use iptv_checker::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Err(AppError::configuration("max_workers must be at least 1"))
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for capability invocations
pub type CapabilityResult<T> = Result<T, CapabilityError>;
