use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tracing::{debug, info, warn};

use crate::kitchen::{encode_selection, Kitchen, Selection};
use crate::metrics::MetricsCollector;
use crate::protocol::{read_line, write_greeting, write_reply, Reply, Request};

/// One connected user. Owns its selection; everything else is shared read-only.
pub struct Session<S> {
    stream: BufReader<S>,
    kitchen: Arc<Kitchen>,
    metrics: Arc<MetricsCollector>,
    selection: Selection,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Session<S> {
    pub fn new(stream: S, kitchen: Arc<Kitchen>, metrics: Arc<MetricsCollector>) -> Self {
        Self {
            stream: BufReader::new(stream),
            kitchen,
            metrics,
            selection: Selection::new(),
        }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        write_greeting(&mut self.stream, self.kitchen.catalogue().len()).await?;

        loop {
            let line = match read_line(&mut self.stream).await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("Client closed the stream");
                    break;
                }
                Err(e) if e.is_fatal() => {
                    warn!("Dropping session: {}", e);
                    let _ = write_reply(&mut self.stream, &Reply::error(e.to_string())).await;
                    return Err(e.into());
                }
                Err(e) => {
                    write_reply(&mut self.stream, &Reply::error(e.to_string())).await?;
                    continue;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            let request = match Request::parse(&line) {
                Ok(request) => request,
                Err(e) => {
                    debug!("Rejected line {:?}: {}", line, e);
                    write_reply(&mut self.stream, &Reply::error(e.to_string())).await?;
                    continue;
                }
            };

            if request == Request::Quit {
                info!("Client requested close");
                write_reply(&mut self.stream, &Reply::bye()).await?;
                break;
            }

            let reply = self.handle(request).await;
            write_reply(&mut self.stream, &reply).await?;
        }

        Ok(())
    }

    async fn handle(&mut self, request: Request) -> Reply {
        match request {
            Request::Select(id) => {
                if let Err(e) = self.kitchen.select(&mut self.selection, id) {
                    return Reply::error(e.to_string());
                }
                self.metrics.record_selection();
            }
            Request::Clear => self.selection.clear(),
            Request::Random => {
                if let Err(e) = self.kitchen.pick_random(&mut self.selection) {
                    return Reply::error(e.to_string());
                }
                self.metrics.record_random_pick();
            }
            Request::Open(link) => match self.kitchen.open_link(&link) {
                Ok(selection) => self.selection = selection,
                Err(e) => return Reply::error(e.to_string()),
            },
            Request::Partners(id) => {
                let id = match id.or_else(|| self.selection.first().cloned()) {
                    Some(id) => id,
                    None => return Reply::error("PARTNERS needs a symbol or a current pick"),
                };
                let partners = self.kitchen.partners(&id).to_vec();
                return Reply::partners(id, partners);
            }
            Request::State | Request::Quit => {}
        }

        self.render().await
    }

    /// Recomputes the view after a transition and mirrors the share link.
    async fn render(&self) -> Reply {
        let view = self.kitchen.view(&self.selection).await;
        self.metrics.record_result(&view.result);
        Reply::view(view, encode_selection(&self.selection))
    }
}
