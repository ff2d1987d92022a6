//! Helpers for exercising the client against an in-process server

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::AbortHandle;

use crate::{ApiClient, Result};

/// Request timeout of the client handed out by [`TestServer`]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// An axum router served on an ephemeral loopback port
///
/// The accept loop is aborted when this value drops.
pub struct TestServer {
    pub addr: SocketAddr,
    /// Client pointed at `addr`
    pub client: ApiClient,
    serve: AbortHandle,
}

impl TestServer {
    pub async fn start(router: axum::Router) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let serve = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::warn!("test server on {} stopped: {}", addr, e);
            }
        })
        .abort_handle();

        let client = ApiClient::with_config(
            &format!("http://{}", addr),
            CLIENT_TIMEOUT,
            CLIENT_TIMEOUT,
        )?;

        Ok(Self {
            addr,
            client,
            serve,
        })
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.serve.abort();
    }
}

/// Poll `condition` every 10ms until it holds or `timeout` passes
pub async fn wait_for<F>(condition: F, timeout: Duration) -> bool
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;

    while !condition() {
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    true
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_wait_for_sees_late_condition() {
        let flag = Arc::new(AtomicBool::new(false));
        let setter = flag.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            setter.store(true, Ordering::SeqCst);
        });

        assert!(wait_for(|| flag.load(Ordering::SeqCst), Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn test_wait_for_times_out() {
        assert!(!wait_for(|| false, Duration::from_millis(30)).await);
    }
}
