use tokio::net::TcpListener;
use tracing::{info, error};
use crate::config::ServerConfig;
use crate::kitchen::Kitchen;
use crate::metrics::{MetricsCollector, start_status_server};
use crate::session::Session;
use std::sync::Arc;

pub async fn run(config: &ServerConfig, kitchen: Kitchen) -> anyhow::Result<()> {
    run_on(&config.listen_address, &config.status_address, Arc::new(kitchen)).await
}

pub async fn run_on(addr: &str, status_addr: &str, kitchen: Arc<Kitchen>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    let metrics = Arc::new(MetricsCollector::new());

    let status_addr = status_addr.to_string();
    let kitchen_clone = Arc::clone(&kitchen);
    let metrics_clone = Arc::clone(&metrics);
    tokio::spawn(async move {
        if let Err(e) = start_status_server(&status_addr, kitchen_clone, metrics_clone).await {
            error!("Status server failed: {}", e);
        }
    });

    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                info!("New session from {}", peer);
                metrics.session_opened();

                let kitchen_clone = Arc::clone(&kitchen);
                let metrics_clone = Arc::clone(&metrics);
                let metrics_for_cleanup = Arc::clone(&metrics);

                tokio::spawn(async move {
                    let session = Session::new(socket, kitchen_clone, metrics_clone);
                    if let Err(e) = session.run().await {
                        error!("Session error for {}: {}", peer, e);
                    } else {
                        info!("Session completed for {}", peer);
                    }
                    metrics_for_cleanup.session_closed();
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kitchen::test_support::sample_kitchen;
    use crate::kitchen::TrustDataset;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpStream;

    async fn free_addr() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().to_string()
    }

    async fn connect(addr: &str) -> TcpStream {
        for _ in 0..50 {
            if let Ok(stream) = TcpStream::connect(addr).await {
                return stream;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        panic!("server at {} never came up", addr);
    }

    #[tokio::test]
    async fn serves_sessions_and_status_over_tcp() {
        let addr = free_addr().await;
        let status_addr = free_addr().await;
        let kitchen = Arc::new(sample_kitchen(Arc::new(TrustDataset)));
        tokio::spawn({
            let (addr, status_addr) = (addr.clone(), status_addr.clone());
            async move { run_on(&addr, &status_addr, kitchen).await }
        });

        let stream = connect(&addr).await;
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();
        lines.next_line().await.unwrap().expect("greeting");

        write.write_all(b"SELECT 1f605\nSELECT 1f600\n").await.unwrap();
        lines.next_line().await.unwrap().expect("first reply");
        let reply: serde_json::Value = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(reply["view"]["result"]["reason"], "not_found");

        let mut status = connect(&status_addr).await;
        status.write_all(b"GET /metrics HTTP/1.1\r\n\r\n").await.unwrap();
        let mut response = String::new();
        status.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("\"pairs_not_found\": 1"));
        assert!(response.contains("\"active_sessions\": 1"));
    }
}
