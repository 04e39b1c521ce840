//! Common utilities and definitions shared across modules
//!
//! This module contains the configuration and error definitions used
//! throughout the turinc code generator.

pub mod config;
pub mod error;

// Re-export commonly used items for convenience
pub use config::Config;
pub use error::{Error, Result};
