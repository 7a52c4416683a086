use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::dataset::SymbolId;
use crate::kitchen::ViewModel;
use crate::protocol::error::ProtocolError;
use crate::protocol::MAX_LINE_LEN;

/// One client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Select(SymbolId),
    Clear,
    Random,
    State,
    Partners(Option<SymbolId>),
    Open(String),
    Quit,
}

fn parse_symbol(raw: &str) -> Result<SymbolId, ProtocolError> {
    SymbolId::parse(raw).map_err(|e| ProtocolError::InvalidSymbol(e.to_string()))
}

impl Request {
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim();
        let (verb, arg) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, Some(rest.trim()).filter(|a| !a.is_empty())),
            None => (line, None),
        };

        let no_arg = |request: Request, name: &'static str| match arg {
            None => Ok(request),
            Some(_) => Err(ProtocolError::UnexpectedArgument(name)),
        };

        match verb.to_ascii_uppercase().as_str() {
            "SELECT" => {
                let arg = arg.ok_or(ProtocolError::MissingArgument("SELECT"))?;
                Ok(Request::Select(parse_symbol(arg)?))
            }
            "OPEN" => {
                let arg = arg.ok_or(ProtocolError::MissingArgument("OPEN"))?;
                Ok(Request::Open(arg.to_string()))
            }
            "PARTNERS" => Ok(Request::Partners(arg.map(parse_symbol).transpose()?)),
            "CLEAR" => no_arg(Request::Clear, "CLEAR"),
            "RANDOM" => no_arg(Request::Random, "RANDOM"),
            "STATE" => no_arg(Request::State, "STATE"),
            "QUIT" => no_arg(Request::Quit, "QUIT"),
            _ => Err(ProtocolError::UnknownCommand(verb.to_string())),
        }
    }
}

/// One JSON line answering a request.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<ViewModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<SymbolId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partners: Option<Vec<SymbolId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Reply {
    fn empty(ok: bool) -> Self {
        Self { ok, view: None, link: None, symbol: None, partners: None, error: None }
    }

    pub fn view(view: ViewModel, link: String) -> Self {
        Self { view: Some(view), link: Some(link), ..Self::empty(true) }
    }

    pub fn partners(symbol: SymbolId, partners: Vec<SymbolId>) -> Self {
        Self { symbol: Some(symbol), partners: Some(partners), ..Self::empty(true) }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { error: Some(message.into()), ..Self::empty(false) }
    }

    pub fn bye() -> Self {
        Self::empty(true)
    }
}

/// Reads one `\n`-terminated line. `Ok(None)` on a clean end of stream.
pub async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Option<String>, ProtocolError> {
    let mut buf = Vec::with_capacity(128);
    let limit = (MAX_LINE_LEN + 2) as u64; // room for "\r\n"
    let n = (&mut *reader).take(limit).read_until(b'\n', &mut buf).await?;

    if n == 0 {
        return Ok(None);
    }
    if buf.last() != Some(&b'\n') && n as u64 == limit {
        return Err(ProtocolError::LineTooLong(MAX_LINE_LEN));
    }

    while matches!(buf.last(), Some(b'\n') | Some(b'\r')) {
        buf.pop();
    }
    if buf.len() > MAX_LINE_LEN {
        return Err(ProtocolError::LineTooLong(MAX_LINE_LEN));
    }

    let line = String::from_utf8(buf).map_err(|_| ProtocolError::InvalidUtf8)?;
    trace!("Read line: {:?}", line);
    Ok(Some(line))
}

pub async fn write_json_line<W, T>(writer: &mut W, value: &T) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut encoded = serde_json::to_vec(value)?;
    encoded.push(b'\n');
    writer.write_all(&encoded).await?;
    writer.flush().await
}

pub async fn write_reply<W: AsyncWrite + Unpin>(writer: &mut W, reply: &Reply) -> std::io::Result<()> {
    write_json_line(writer, reply).await
}
