/*!
 * Core Module
 * Error handling and configuration shared by every enforcer
 */

pub mod config;
pub mod errors;

// Re-export for convenience
pub use config::{EnforcerConfig, DEFAULT_RESOURCE_TYPES};
pub use errors::*;
