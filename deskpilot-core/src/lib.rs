pub mod action;
pub mod config;
pub mod error;
pub mod keys;
pub mod prompt;
pub mod result;
pub mod transcript;
pub mod types;

pub use action::*;
pub use config::*;
pub use error::*;
pub use keys::*;
pub use prompt::*;
pub use result::*;
pub use transcript::*;
pub use types::*;
