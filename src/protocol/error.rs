use std::fmt;

#[derive(Debug)]
pub enum ProtocolError {
    LineTooLong(usize),
    InvalidUtf8,
    UnknownCommand(String),
    MissingArgument(&'static str),
    UnexpectedArgument(&'static str),
    InvalidSymbol(String),
    Io(std::io::Error),
}

impl ProtocolError {
    /// Errors after which the stream can no longer be trusted.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProtocolError::LineTooLong(_) | ProtocolError::Io(_))
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::LineTooLong(len) =>
                write!(f, "line too long: more than {} bytes", len),
            ProtocolError::InvalidUtf8 =>
                write!(f, "line is not valid UTF-8"),
            ProtocolError::UnknownCommand(cmd) =>
                write!(f, "unknown command '{}'", cmd),
            ProtocolError::MissingArgument(cmd) =>
                write!(f, "{} requires an argument", cmd),
            ProtocolError::UnexpectedArgument(cmd) =>
                write!(f, "{} takes no argument", cmd),
            ProtocolError::InvalidSymbol(reason) =>
                write!(f, "invalid symbol: {}", reason),
            ProtocolError::Io(e) =>
                write!(f, "i/o error: {}", e),
        }
    }
}

impl std::error::Error for ProtocolError {}

impl From<std::io::Error> for ProtocolError {
    fn from(e: std::io::Error) -> Self {
        ProtocolError::Io(e)
    }
}
