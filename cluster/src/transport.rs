use std::time::Duration;

use quorumgate_common::{ClusterError, Result};

/// Builds the HTTP clients used for peer traffic.
///
/// Peers are semi-trusted: redirects are never followed, so a redirect
/// response is handed back to the caller as the final response instead of
/// silently steering the request to another endpoint. TLS material is
/// injected here, keeping the discovery and promotion code transport
/// agnostic.
#[derive(Default, Clone)]
pub struct PeerTransport {
    root_certificate: Option<reqwest::Certificate>,
    identity: Option<reqwest::Identity>,
    accept_invalid_certs: bool,
}

impl PeerTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trusts an additional root CA for peer connections.
    pub fn with_root_certificate(mut self, cert: reqwest::Certificate) -> Self {
        self.root_certificate = Some(cert);
        self
    }

    /// Presents a client identity to peers (mTLS).
    pub fn with_identity(mut self, identity: reqwest::Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Skips peer certificate verification. Test clusters only.
    pub fn danger_accept_invalid_certs(mut self) -> Self {
        self.accept_invalid_certs = true;
        self
    }

    /// Constructs a fresh client for one operation. `timeout` bounds the
    /// whole request; `None` leaves only the client library's connect
    /// defaults in place.
    pub(crate) fn client(&self, timeout: Option<Duration>) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(cert) = &self.root_certificate {
            builder = builder.add_root_certificate(cert.clone());
        }
        if let Some(identity) = &self.identity {
            builder = builder.identity(identity.clone());
        }
        if self.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }
        builder
            .build()
            .map_err(|e| ClusterError::Transport(e.to_string()))
    }
}
