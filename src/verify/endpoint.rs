//! Verification API endpoint.

use std::fmt;

use url::{Position, Url};

use crate::pool::{Route, Scheme, TransportError};

/// Google's reCAPTCHA `siteverify` URL.
pub const SITEVERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Where verification requests are sent: a pool route plus request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    route: Route,
    path: String,
}

impl Endpoint {
    /// Google's reCAPTCHA `siteverify` endpoint.
    pub fn siteverify() -> Self {
        Self {
            route: Route::new(Scheme::Https, "www.google.com", 443),
            path: "/recaptcha/api/siteverify".to_string(),
        }
    }

    /// Parse an absolute `http` or `https` URL.
    pub fn parse(raw: &str) -> Result<Self, TransportError> {
        let url = Url::parse(raw)
            .map_err(|e| TransportError::InvalidEndpoint(format!("`{raw}`: {e}")))?;
        let route = Route::from_url(&url)?;
        let path = url[Position::BeforePath..Position::AfterQuery].to_string();
        Ok(Self { route, path })
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Origin-form request target (path and query).
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::siteverify()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.route, self.path)
    }
}
