pub mod driver;
pub mod executor;
pub mod session;
pub mod traits;
