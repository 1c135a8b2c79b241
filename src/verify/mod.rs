//! CAPTCHA verification subsystem.
//!
//! # Data Flow
//! ```text
//! VerificationRequest (token, remote IP, secret)
//!     → client.rs builds a form-encoded POST for the endpoint
//!     → pool lease → send → read body (all deadline-bound)
//!     → JSON object, `success == true` ⇒ passed
//!     → outcome policy:
//!         lease / connect / read timeout ⇒ passed (fail-open)
//!         any other failure              ⇒ rejected
//! ```
//!
//! # Design Decisions
//! - Callers only ever see `bool`; errors are absorbed and logged here
//! - `try_verify` keeps the raw outcome available for diagnostics
//! - The connection returns to the pool only after a fully read response

pub mod client;
pub mod endpoint;
pub mod error;
pub mod types;

pub use client::VerificationClient;
pub use endpoint::Endpoint;
pub use error::VerifyError;
pub use types::{Outcome, VerificationRequest};
