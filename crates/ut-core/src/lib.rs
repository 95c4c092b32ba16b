pub mod error;
pub mod input;
pub mod tree;
pub mod types;

pub use error::UiTestError;
pub use input::*;
pub use tree::*;
pub use types::*;
