//! Line protocol constants for kitchen sessions

/// Greeting identifier written when a session opens
pub const PROTOCOL_NAME: &str = "kitchend";

/// Current protocol version
pub const PROTOCOL_VERSION: u16 = 1;

/// Longest accepted command line, newline excluded
pub const MAX_LINE_LEN: usize = 1024;
