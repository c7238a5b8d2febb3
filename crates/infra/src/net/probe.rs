//! TCP connectivity probe
//!
//! A lightweight handshake against the secure-transport port, used only
//! to test reachability before transfer work is attempted. The socket is
//! scoped to the probe call and dropped on every exit path: success,
//! timeout, or connection error.

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::debug;

use terrasync_core::ports::Connectivity;
use terrasync_domain::ProbeConfig;

/// Probes `host:port` with a bounded TCP connect.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self { host: host.into(), port, timeout }
    }

    pub fn from_config(host: impl Into<String>, probe: &ProbeConfig) -> Self {
        Self::new(host, probe.port, probe.timeout())
    }
}

#[async_trait]
impl Connectivity for TcpProbe {
    /// True only if the handshake completes within the window. Never
    /// errors: timeouts and connection failures read as unreachable.
    async fn is_reachable(&self) -> bool {
        let addr = (self.host.as_str(), self.port);
        match tokio::time::timeout(self.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_stream)) => {
                debug!(host = %self.host, port = self.port, "probe handshake completed");
                true
            }
            Ok(Err(err)) => {
                debug!(host = %self.host, port = self.port, %err, "probe connection failed");
                false
            }
            Err(_) => {
                debug!(host = %self.host, port = self.port, timeout = ?self.timeout, "probe timed out");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reachable_local_listener() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let probe = TcpProbe::new("127.0.0.1", port, Duration::from_secs(1));
        assert!(probe.is_reachable().await);
    }

    #[tokio::test]
    async fn connection_refused_reads_as_unreachable() {
        // Bind and drop to get a port with nothing listening on it.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let probe = TcpProbe::new("127.0.0.1", port, Duration::from_secs(1));
        assert!(!probe.is_reachable().await);
    }

    #[tokio::test]
    async fn unresolvable_host_reads_as_unreachable() {
        let probe = TcpProbe::new("host.invalid", 443, Duration::from_millis(500));
        assert!(!probe.is_reachable().await);
    }
}
