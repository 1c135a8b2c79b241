//! Pooled client for the verification API.
//!
//! # Responsibilities
//! - Send `secret`, `response` and `remoteip` as a form-encoded POST
//! - Bound every wait with the pool's deadlines
//! - Turn the JSON reply into a pass/reject decision
//! - Apply the fail-open policy for timeouts

use std::future::poll_fn;
use std::pin::pin;
use std::time::Duration;

use hyper::body::{Body as _, Incoming};
use hyper::header::{ACCEPT, CONNECTION, CONTENT_TYPE, HOST, USER_AGENT};
use hyper::{Method, Request, Response};
use serde_json::{Map, Value};
use tracing::Instrument;
use uuid::Uuid;

use crate::observability::metrics;
use crate::pool::manager::RequestBody;
use crate::pool::{ConnectionPool, TransportError};
use crate::resilience::timeouts::within;
use crate::verify::endpoint::Endpoint;
use crate::verify::error::VerifyError;
use crate::verify::types::{Outcome, VerificationRequest};

/// Largest response body accepted from the API.
pub const MAX_RESPONSE_BYTES: usize = 64 * 1024;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Verifies CAPTCHA tokens over a [`ConnectionPool`].
#[derive(Debug, Clone)]
pub struct VerificationClient {
    pool: ConnectionPool,
    endpoint: Endpoint,
}

impl VerificationClient {
    /// Client for Google's `siteverify` endpoint.
    pub fn new(pool: ConnectionPool) -> Self {
        Self::with_endpoint(pool, Endpoint::siteverify())
    }

    pub fn with_endpoint(pool: ConnectionPool, endpoint: Endpoint) -> Self {
        Self { pool, endpoint }
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Verify a token. Never fails: errors are logged and mapped to a decision.
    ///
    /// Timeouts while leasing, connecting or reading let the attempt through;
    /// every other failure rejects it.
    pub async fn verify(&self, request: &VerificationRequest) -> bool {
        let span = tracing::info_span!("recaptcha_verify", attempt = %Uuid::new_v4());

        async {
            tracing::info!(endpoint = %self.endpoint, "Executing recaptcha verification request");
            tracing::debug!(
                response = %request.response_token,
                remote_ip = %request.remote_ip,
                "Verification request parameters"
            );

            let outcome = match self.try_verify(request).await {
                Ok(true) => Outcome::Passed,
                Ok(false) => Outcome::Rejected,
                Err(e) => match e.timeout_kind() {
                    Some(kind) => {
                        tracing::warn!(timeout = %kind, error = %e, "Timeout on recaptcha validation, letting attempt through");
                        Outcome::FailedOpen(kind)
                    }
                    None => {
                        tracing::error!(error = %e, "Recaptcha validation failed");
                        Outcome::Failed
                    }
                },
            };

            if matches!(outcome, Outcome::Passed | Outcome::Rejected) {
                tracing::info!(success = outcome.passed(), "Recaptcha validation completed");
            }
            metrics::record_verification(outcome);
            outcome.passed()
        }
        .instrument(span)
        .await
    }

    /// Verify a token and return the raw result, without the fail-open policy.
    pub async fn try_verify(&self, request: &VerificationRequest) -> Result<bool, VerifyError> {
        let http_request = self.build_request(request)?;
        let read_limit = self.pool.config().socket_timeout();
        let read_timeout = || TransportError::ReadTimeout(read_limit.unwrap_or_default());

        let mut lease = self.pool.lease(self.endpoint.route()).await?;
        let sender = lease.sender()?;

        within(read_limit, sender.ready())
            .await
            .map_err(|_| read_timeout())??;
        let response = within(read_limit, sender.send_request(http_request))
            .await
            .map_err(|_| read_timeout())??;

        let status = response.status();
        let keep_alive = !closes_connection(&response);
        let body = read_body(response.into_body(), read_limit).await?;
        if keep_alive {
            lease.release();
        }

        tracing::debug!(status = %status, bytes = body.len(), "Received verification response");
        parse_success(&body)
    }

    fn build_request(&self, request: &VerificationRequest) -> Result<Request<RequestBody>, VerifyError> {
        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("secret", &request.secret)
            .append_pair("response", &request.response_token)
            .append_pair("remoteip", &request.remote_ip)
            .finish();

        let request = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.path())
            .header(HOST, self.endpoint.route().authority())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, concat!("recaptcha-gate/", env!("CARGO_PKG_VERSION")))
            .body(form)?;
        Ok(request)
    }
}

fn closes_connection(response: &Response<Incoming>) -> bool {
    response
        .headers()
        .get(CONNECTION)
        .is_some_and(|v| v.as_bytes().eq_ignore_ascii_case(b"close"))
}

/// Read the whole body, bounding each read by `read_limit`.
async fn read_body(body: Incoming, read_limit: Option<Duration>) -> Result<Vec<u8>, TransportError> {
    let mut body = pin!(body);
    let mut buf = Vec::new();

    loop {
        let frame = within(read_limit, poll_fn(|cx| body.as_mut().poll_frame(cx)))
            .await
            .map_err(|_| TransportError::ReadTimeout(read_limit.unwrap_or_default()))?;

        match frame {
            None => break,
            Some(frame) => {
                if let Ok(data) = frame?.into_data() {
                    if buf.len() + data.len() > MAX_RESPONSE_BYTES {
                        return Err(TransportError::BodyTooLarge(MAX_RESPONSE_BYTES));
                    }
                    buf.extend_from_slice(&data);
                }
            }
        }
    }
    Ok(buf)
}

/// `true` only when the reply is a JSON object with `"success": true`.
fn parse_success(body: &[u8]) -> Result<bool, VerifyError> {
    let reply: Map<String, Value> = serde_json::from_slice(body)?;

    if let Some(codes) = reply.get("error-codes") {
        tracing::debug!(error_codes = %codes, "Verification API reported error codes");
    }
    Ok(reply.get("success") == Some(&Value::Bool(true)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use crate::pool::connector::{BoxedIo, Connect, Route};
    use futures_util::future::BoxFuture;
    use std::sync::Arc;

    #[test]
    fn test_success_true_passes() {
        assert!(parse_success(br#"{"success": true, "hostname": "example.com"}"#).unwrap());
    }

    #[test]
    fn test_anything_else_rejects() {
        assert!(!parse_success(br#"{"success": false, "error-codes": ["invalid-input-response"]}"#).unwrap());
        assert!(!parse_success(b"{}").unwrap());
        assert!(!parse_success(br#"{"success": "true"}"#).unwrap());
        assert!(!parse_success(br#"{"success": 1}"#).unwrap());
        assert!(!parse_success(br#"{"success": null}"#).unwrap());
    }

    #[test]
    fn test_other_fields_never_decide() {
        assert!(parse_success(br#"{"success": true, "hostname": 123}"#).unwrap());
        assert!(parse_success(br#"{"success": true, "challenge_ts": 1700000000}"#).unwrap());
        assert!(parse_success(br#"{"success": true, "error-codes": "none", "score": [0.9]}"#).unwrap());
        assert!(!parse_success(br#"{"success": false, "hostname": {"name": "example.com"}}"#).unwrap());
    }

    #[test]
    fn test_non_object_is_malformed() {
        assert!(matches!(parse_success(b"[true]"), Err(VerifyError::Malformed(_))));
        assert!(matches!(parse_success(b"<html>"), Err(VerifyError::Malformed(_))));
        assert!(matches!(parse_success(b""), Err(VerifyError::Malformed(_))));
    }

    #[test]
    fn test_form_encoding() {
        let pool = ConnectionPool::new(&PoolConfig::default());
        let client = VerificationClient::new(pool);
        let request = VerificationRequest::new("tok en&1", "192.0.2.10", "s=cret");

        let http = client.build_request(&request).unwrap();
        assert_eq!(http.method(), Method::POST);
        assert_eq!(http.uri(), "/recaptcha/api/siteverify");
        assert_eq!(http.headers()[HOST], "www.google.com");
        assert_eq!(http.headers()[CONTENT_TYPE], FORM_CONTENT_TYPE);
        assert_eq!(
            http.body(),
            "secret=s%3Dcret&response=tok+en%261&remoteip=192.0.2.10"
        );
    }

    /// Never finishes connecting.
    struct StallingConnector;

    impl Connect for StallingConnector {
        fn connect(&self, _route: &Route) -> BoxFuture<'static, std::io::Result<BoxedIo>> {
            Box::pin(futures_util::future::pending())
        }
    }

    fn stalled_client(config: PoolConfig) -> VerificationClient {
        let pool = ConnectionPool::with_connector(&config, Arc::new(StallingConnector));
        VerificationClient::new(pool)
    }

    #[tokio::test]
    async fn test_lease_timeout_fails_open() {
        let client = stalled_client(PoolConfig {
            max_connections: 1,
            connection_request_timeout_ms: 50,
            connect_timeout_ms: 0,
            ..PoolConfig::default()
        });

        // Occupy the only slot with a lease stuck connecting.
        let blocker = {
            let pool = client.pool().clone();
            let route = client.endpoint().route().clone();
            tokio::spawn(async move {
                let _ = pool.lease(&route).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(client.pool().stats().leased, 1);

        let request = VerificationRequest::new("token", "127.0.0.1", "secret");
        let err = client.try_verify(&request).await.unwrap_err();
        assert!(matches!(err, VerifyError::Transport(TransportError::LeaseTimeout(_))));
        assert!(client.verify(&request).await);

        blocker.abort();
    }

    #[tokio::test]
    async fn test_connect_timeout_fails_open() {
        let client = stalled_client(PoolConfig {
            connect_timeout_ms: 50,
            ..PoolConfig::default()
        });

        let request = VerificationRequest::new("token", "127.0.0.1", "secret");
        let err = client.try_verify(&request).await.unwrap_err();
        assert!(matches!(err, VerifyError::Transport(TransportError::ConnectTimeout(_))));
        assert!(client.verify(&request).await);
        assert_eq!(client.pool().stats().leased, 0);
    }
}
