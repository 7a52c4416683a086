pub mod symbol;
pub mod catalogue;
pub mod pairs;
pub mod error;
pub mod loader;

pub use symbol::*;
pub use catalogue::*;
pub use pairs::*;
pub use error::*;
pub use loader::*;
