use serde::Serialize;
use tokio::io::AsyncWrite;
use tracing::debug;

use crate::protocol::{PROTOCOL_NAME, PROTOCOL_VERSION};
use crate::protocol::command::write_json_line;

/// First line a client receives after connecting.
#[derive(Debug, Clone, Serialize)]
pub struct Greeting {
    pub ok: bool,
    pub server: &'static str,
    pub version: u16,
    pub symbols: usize,
}

impl Greeting {
    pub fn new(symbols: usize) -> Self {
        Self {
            ok: true,
            server: PROTOCOL_NAME,
            version: PROTOCOL_VERSION,
            symbols,
        }
    }
}

pub async fn write_greeting<W: AsyncWrite + Unpin>(writer: &mut W, symbols: usize) -> std::io::Result<()> {
    debug!("Writing greeting (protocol v{})", PROTOCOL_VERSION);
    write_json_line(writer, &Greeting::new(symbols)).await
}
