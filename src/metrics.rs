use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::kitchen::{Kitchen, MissReason, ResultView};

#[derive(Debug, Clone, Serialize)]
pub struct Metrics {
    pub uptime_seconds: u64,
    pub sessions_total: u64,
    pub active_sessions: u64,
    pub selections: u64,
    pub random_picks: u64,
    pub resolutions: u64,
    pub composites_found: u64,
    pub pairs_not_found: u64,
    pub assets_unavailable: u64,
    pub catalogue_size: usize,
    pub pair_records: usize,
}

pub struct MetricsCollector {
    start_time: std::time::SystemTime,
    sessions: AtomicU64,
    active_sessions: AtomicU64,
    selections: AtomicU64,
    random_picks: AtomicU64,
    resolutions: AtomicU64,
    composites_found: AtomicU64,
    pairs_not_found: AtomicU64,
    assets_unavailable: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            start_time: std::time::SystemTime::now(),
            sessions: AtomicU64::new(0),
            active_sessions: AtomicU64::new(0),
            selections: AtomicU64::new(0),
            random_picks: AtomicU64::new(0),
            resolutions: AtomicU64::new(0),
            composites_found: AtomicU64::new(0),
            pairs_not_found: AtomicU64::new(0),
            assets_unavailable: AtomicU64::new(0),
        }
    }

    pub fn session_opened(&self) {
        self.sessions.fetch_add(1, Ordering::Relaxed);
        self.active_sessions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn session_closed(&self) {
        self.active_sessions.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn record_selection(&self) {
        self.selections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_random_pick(&self) {
        self.random_picks.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a rendered result; unresolved views are not lookups.
    pub fn record_result(&self, result: &ResultView) {
        let counter = match result {
            ResultView::Unresolved => return,
            ResultView::Composite { .. } => &self.composites_found,
            ResultView::NoCombination { reason: MissReason::NotFound } => &self.pairs_not_found,
            ResultView::NoCombination { reason: MissReason::AssetUnavailable } => &self.assets_unavailable,
        };
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_metrics(&self, catalogue_size: usize, pair_records: usize) -> Metrics {
        let uptime = self.start_time.elapsed().unwrap_or_default().as_secs();

        Metrics {
            uptime_seconds: uptime,
            sessions_total: self.sessions.load(Ordering::Relaxed),
            active_sessions: self.active_sessions.load(Ordering::Relaxed),
            selections: self.selections.load(Ordering::Relaxed),
            random_picks: self.random_picks.load(Ordering::Relaxed),
            resolutions: self.resolutions.load(Ordering::Relaxed),
            composites_found: self.composites_found.load(Ordering::Relaxed),
            pairs_not_found: self.pairs_not_found.load(Ordering::Relaxed),
            assets_unavailable: self.assets_unavailable.load(Ordering::Relaxed),
            catalogue_size,
            pair_records,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Status code, content type and body for one status-server request line.
pub async fn handle_status_request(
    request_line: &str,
    kitchen: &Kitchen,
    metrics: &MetricsCollector,
) -> (&'static str, &'static str, String) {
    let target = match request_line.strip_prefix("GET ") {
        Some(rest) => rest.split_whitespace().next().unwrap_or("/"),
        None => return ("405 Method Not Allowed", "text/plain", "GET only".to_string()),
    };
    let (path, query) = target.split_once('?').unwrap_or((target, ""));

    match path {
        "/health" => ("200 OK", "text/plain", "OK".to_string()),
        "/metrics" => {
            let snapshot = metrics.get_metrics(kitchen.catalogue().len(), kitchen.resolver().table().len());
            let json = serde_json::to_string_pretty(&snapshot).unwrap_or_default();
            ("200 OK", "application/json", json)
        }
        "/view" => match kitchen.open_link(query) {
            Ok(selection) => {
                let view = kitchen.view(&selection).await;
                metrics.record_result(&view.result);
                let json = serde_json::to_string(&view).unwrap_or_default();
                ("200 OK", "application/json", json)
            }
            Err(e) => (
                "400 Bad Request",
                "application/json",
                serde_json::json!({"error": e.to_string()}).to_string(),
            ),
        },
        _ => ("404 Not Found", "text/plain", "not found".to_string()),
    }
}

pub async fn start_status_server(
    addr: &str,
    kitchen: Arc<Kitchen>,
    metrics: Arc<MetricsCollector>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Status server listening on {}", addr);

    loop {
        let (mut socket, _) = listener.accept().await?;
        let kitchen = Arc::clone(&kitchen);
        let metrics = Arc::clone(&metrics);

        tokio::spawn(async move {
            let mut buffer = [0; 2048];
            if let Ok(n) = socket.read(&mut buffer).await {
                let request = String::from_utf8_lossy(&buffer[..n]);
                let request_line = request.lines().next().unwrap_or_default();

                let (status, content_type, body) = handle_status_request(request_line, &kitchen, &metrics).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    content_type,
                    body.len(),
                    body
                );

                let _ = socket.write_all(response.as_bytes()).await;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kitchen::test_support::sample_kitchen;
    use crate::kitchen::TrustDataset;

    #[test]
    fn counts_results_by_outcome() {
        let metrics = MetricsCollector::new();
        metrics.session_opened();
        metrics.record_selection();
        metrics.record_result(&ResultView::Unresolved);
        metrics.record_result(&ResultView::NoCombination { reason: MissReason::NotFound });
        metrics.record_result(&ResultView::NoCombination { reason: MissReason::AssetUnavailable });

        let snapshot = metrics.get_metrics(3, 1);
        assert_eq!(snapshot.active_sessions, 1);
        assert_eq!(snapshot.selections, 1);
        assert_eq!(snapshot.resolutions, 2);
        assert_eq!(snapshot.pairs_not_found, 1);
        assert_eq!(snapshot.assets_unavailable, 1);
        assert_eq!(snapshot.composites_found, 0);

        metrics.session_closed();
        assert_eq!(metrics.get_metrics(3, 1).active_sessions, 0);
    }

    #[tokio::test]
    async fn serves_health_metrics_and_views() {
        let kitchen = sample_kitchen(Arc::new(TrustDataset));
        let metrics = MetricsCollector::new();

        let (status, _, body) = handle_status_request("GET /health HTTP/1.1", &kitchen, &metrics).await;
        assert_eq!((status, body.as_str()), ("200 OK", "OK"));

        let (status, _, body) =
            handle_status_request("GET /view?clicked=1f602&clicked=1f600 HTTP/1.1", &kitchen, &metrics).await;
        assert_eq!(status, "200 OK");
        let view: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(view["result"]["kind"], "composite");
        assert_eq!(view["first"]["id"], "1f602");

        let (_, _, body) = handle_status_request("GET /metrics HTTP/1.1", &kitchen, &metrics).await;
        let snapshot: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(snapshot["composites_found"], 1);
        assert_eq!(snapshot["catalogue_size"], 3);
    }

    #[tokio::test]
    async fn rejects_bad_requests() {
        let kitchen = sample_kitchen(Arc::new(TrustDataset));
        let metrics = MetricsCollector::new();

        let (status, _, _) = handle_status_request("GET /view?clicked=1f4a9 HTTP/1.1", &kitchen, &metrics).await;
        assert_eq!(status, "400 Bad Request");
        let (status, _, _) = handle_status_request("POST /view HTTP/1.1", &kitchen, &metrics).await;
        assert_eq!(status, "405 Method Not Allowed");
        let (status, _, _) = handle_status_request("GET /nope HTTP/1.1", &kitchen, &metrics).await;
        assert_eq!(status, "404 Not Found");
    }
}
