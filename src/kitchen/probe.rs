use std::time::Duration;
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, trace};

/// Existence check against the external asset store. Best effort: every kind
/// of failure answers `false`.
#[async_trait]
pub trait AssetProbe: Send + Sync {
    async fn asset_exists(&self, url: &str) -> bool;
}

/// Single `HEAD` request with a short timeout, no retries.
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl AssetProbe for HttpProbe {
    async fn asset_exists(&self, url: &str) -> bool {
        let response = match self.client.head(url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Asset probe failed for {}: {}", url, e);
                return false;
            }
        };

        match response.error_for_status() {
            Ok(_) => true,
            Err(e) => {
                debug!("Asset unavailable at {}: {}", url, e);
                false
            }
        }
    }
}

/// Skips the network and trusts the dataset.
pub struct TrustDataset;

#[async_trait]
impl AssetProbe for TrustDataset {
    async fn asset_exists(&self, _url: &str) -> bool {
        true
    }
}

/// Read-through cache keyed by URL. The asset store is immutable, so entries
/// never expire.
pub struct CachedProbe<P: AssetProbe> {
    inner: P,
    cache: DashMap<String, bool>,
}

impl<P: AssetProbe> CachedProbe<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: DashMap::with_capacity(1024),
        }
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}

#[async_trait]
impl<P: AssetProbe> AssetProbe for CachedProbe<P> {
    async fn asset_exists(&self, url: &str) -> bool {
        if let Some(hit) = self.cache.get(url) {
            trace!("Probe cache hit for {}", url);
            return *hit;
        }

        let exists = self.inner.asset_exists(url).await;
        self.cache.insert(url.to_string(), exists);
        exists
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    struct CountingProbe {
        calls: Arc<AtomicUsize>,
        answer: bool,
    }

    #[async_trait]
    impl AssetProbe for CountingProbe {
        async fn asset_exists(&self, _url: &str) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer
        }
    }

    #[tokio::test]
    async fn cache_reads_through_once_per_url() {
        let calls = Arc::new(AtomicUsize::new(0));
        let probe = CachedProbe::new(CountingProbe { calls: Arc::clone(&calls), answer: false });

        assert!(!probe.asset_exists("https://a.test/x.png").await);
        assert!(!probe.asset_exists("https://a.test/x.png").await);
        assert!(!probe.asset_exists("https://a.test/y.png").await);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(probe.cached_entries(), 2);
    }

    async fn serve_status(status_line: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let (mut socket, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                let mut buffer = [0u8; 1024];
                let _ = socket.read(&mut buffer).await;
                let response = format!("{}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n", status_line);
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });
        format!("http://{}/20210831/u1f600/u1f600_u1f602.png", addr)
    }

    #[tokio::test]
    async fn http_probe_maps_status_to_existence() {
        let probe = HttpProbe::new(Duration::from_secs(2)).unwrap();

        let ok_url = serve_status("HTTP/1.1 200 OK").await;
        assert!(probe.asset_exists(&ok_url).await);

        let missing_url = serve_status("HTTP/1.1 404 Not Found").await;
        assert!(!probe.asset_exists(&missing_url).await);
    }

    #[tokio::test]
    async fn http_probe_swallows_connection_errors() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe = HttpProbe::new(Duration::from_millis(500)).unwrap();
        assert!(!probe.asset_exists(&format!("http://{}/missing.png", addr)).await);
        assert!(!probe.asset_exists("not a url").await);
    }
}
