//! Build request URLs for the target a hostname currently resolves to.

use crate::dns::ResolutionOutcome;
use url::Url;

/// Scheme, port and path to call on a resolved target.
///
/// # Example
///
/// ```rust,ignore
/// let endpoint = TargetEndpoint::new("http")
///     .port(4566)
///     .path("/dev/productApi")
///     .query("id=prod-1088");
/// if let Some(url) = endpoint.url_for(&outcome) {
///     println!("calling {}", url);
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEndpoint {
    scheme: String,
    port: Option<u16>,
    path: String,
    query: Option<String>,
}

impl Default for TargetEndpoint {
    fn default() -> Self {
        Self::new("https")
    }
}

impl TargetEndpoint {
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            port: None,
            path: "/".to_string(),
            query: None,
        }
    }

    /// Set an explicit port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the request path.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the query string (without `?`).
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// URL on the host an outcome ended at.
    ///
    /// Only `Resolved` and `NoRecord` outcomes name a host to call.
    pub fn url_for(&self, outcome: &ResolutionOutcome) -> Option<Url> {
        let host = outcome.final_host()?;
        let mut url = Url::parse(&format!("{}://{}", self.scheme, host)).ok()?;
        if let Some(port) = self.port {
            url.set_port(Some(port)).ok()?;
        }
        url.set_path(&self.path);
        url.set_query(self.query.as_deref());
        Some(url)
    }
}
