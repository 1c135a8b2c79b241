//! Verification request and outcome types.

use std::fmt;

use crate::resilience::timeouts::TimeoutKind;

/// One login attempt's verification input. Never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    /// Token the CAPTCHA widget put in the login form.
    pub response_token: String,
    /// Address of the user agent submitting the form.
    pub remote_ip: String,
    /// Site secret shared with the verification API.
    pub secret: String,
}

impl VerificationRequest {
    pub fn new(
        response_token: impl Into<String>,
        remote_ip: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            response_token: response_token.into(),
            remote_ip: remote_ip.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for VerificationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationRequest")
            .field("response_token", &self.response_token)
            .field("remote_ip", &self.remote_ip)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// How a verification call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The API answered `success: true`.
    Passed,
    /// The API answered anything else.
    Rejected,
    /// A timeout was absorbed and the attempt let through.
    FailedOpen(TimeoutKind),
    /// Any other failure; the attempt is rejected.
    Failed,
}

impl Outcome {
    /// What the login flow is told.
    pub fn passed(&self) -> bool {
        matches!(self, Outcome::Passed | Outcome::FailedOpen(_))
    }

    /// Metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Passed => "passed",
            Outcome::Rejected => "rejected",
            Outcome::FailedOpen(_) => "failed_open",
            Outcome::Failed => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_redacted() {
        let request = VerificationRequest::new("token-123", "10.0.0.7", "very-secret");
        let debug = format!("{request:?}");
        assert!(debug.contains("token-123"));
        assert!(debug.contains("10.0.0.7"));
        assert!(!debug.contains("very-secret"));
    }

    #[test]
    fn test_outcome_policy() {
        assert!(Outcome::Passed.passed());
        assert!(Outcome::FailedOpen(TimeoutKind::Lease).passed());
        assert!(Outcome::FailedOpen(TimeoutKind::Connect).passed());
        assert!(Outcome::FailedOpen(TimeoutKind::Read).passed());
        assert!(!Outcome::Rejected.passed());
        assert!(!Outcome::Failed.passed());
    }
}
