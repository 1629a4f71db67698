pub mod keys;
pub mod recording;

#[cfg(feature = "desktop")]
pub mod desktop;
