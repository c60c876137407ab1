pub mod address;
pub mod error;
pub mod interval;
pub mod reference;

pub use address::*;
pub use error::*;
pub use interval::*;
pub use reference::*;
