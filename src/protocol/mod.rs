pub mod constants;
pub mod error;
pub mod command;
pub mod handshake;

pub use constants::*;
pub use command::*;
pub use handshake::*;
