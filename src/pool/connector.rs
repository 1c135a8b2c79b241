//! Route addressing and transport connectors.
//!
//! # Responsibilities
//! - Identify a pool route (scheme, host, port)
//! - Open TCP streams, wrapped in rustls TLS for `https` routes
//! - Offer a seam for alternative transports

use std::fmt;
use std::io;
use std::sync::{Arc, OnceLock};

use futures_util::future::BoxFuture;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use url::{Host, Url};

use crate::pool::error::TransportError;

/// A bidirectional byte stream a pooled HTTP connection can run over.
pub trait Io: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T> Io for T where T: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

pub type BoxedIo = Box<dyn Io>;

/// URL scheme of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// Destination of pooled connections.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    scheme: Scheme,
    host: String,
    port: u16,
}

impl Route {
    pub fn new(scheme: Scheme, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme,
            host: host.into(),
            port,
        }
    }

    /// Build a route from an absolute `http` or `https` URL.
    pub fn from_url(url: &Url) -> Result<Self, TransportError> {
        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => {
                return Err(TransportError::InvalidEndpoint(format!(
                    "unsupported scheme `{other}`"
                )))
            }
        };
        let host = match url.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            None => return Err(TransportError::InvalidEndpoint(format!("`{url}` has no host"))),
        };
        let port = url.port().unwrap_or_else(|| scheme.default_port());

        Ok(Self::new(scheme, host, port))
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Value for the `Host` header: the port is omitted when it is the default.
    pub fn authority(&self) -> String {
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        if self.port == self.scheme.default_port() {
            host
        } else {
            format!("{}:{}", host, self.port)
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme.as_str(), self.authority())
    }
}

/// Opens transport streams for a route.
///
/// Implementations must not apply their own deadline; the pool bounds the
/// whole connect phase with `apiConnectTimeout`.
pub trait Connect: Send + Sync + 'static {
    fn connect(&self, route: &Route) -> BoxFuture<'static, io::Result<BoxedIo>>;
}

/// TCP connector with rustls for `https` routes, trusting the webpki roots.
#[derive(Debug, Clone, Default)]
pub struct TlsConnector;

impl TlsConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connect for TlsConnector {
    fn connect(&self, route: &Route) -> BoxFuture<'static, io::Result<BoxedIo>> {
        let route = route.clone();
        Box::pin(async move {
            let tcp = TcpStream::connect((route.host(), route.port())).await?;
            tcp.set_nodelay(true)?;

            match route.scheme() {
                Scheme::Http => Ok(Box::new(tcp) as BoxedIo),
                Scheme::Https => {
                    let server_name = ServerName::try_from(route.host().to_string())
                        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
                    let tls = tokio_rustls::TlsConnector::from(client_config()?)
                        .connect(server_name, tcp)
                        .await?;
                    Ok(Box::new(tls) as BoxedIo)
                }
            }
        })
    }
}

/// Shared across pools so TLS sessions resume after a rebuild.
fn client_config() -> io::Result<Arc<ClientConfig>> {
    static CONFIG: OnceLock<Result<Arc<ClientConfig>, rustls::Error>> = OnceLock::new();

    CONFIG
        .get_or_init(|| {
            let mut roots = RootCertStore::empty();
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

            let config = ClientConfig::builder_with_provider(Arc::new(
                rustls::crypto::ring::default_provider(),
            ))
            .with_safe_default_protocol_versions()?
            .with_root_certificates(roots)
            .with_no_client_auth();
            Ok(Arc::new(config))
        })
        .clone()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}
