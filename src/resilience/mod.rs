//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Verification call:
//!     → lease deadline   (apiConnectionRequestTimeout)
//!     → connect deadline (apiConnectTimeout)
//!     → read deadline    (apiSocketTimeout, per read)
//!     → timeout classified as TimeoutKind
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline unless the operator set it to 0
//! - Verification requests are POSTs and are never retried
//! - Timeout classes stay distinct so callers can apply policy per class

pub mod timeouts;
