//! Configuration Module
//!
//! Router settings and the loader that merges config files and environment.

pub mod loader;
pub mod settings;

pub use loader::ConfigLoader;
pub use settings::RouterConfig;
