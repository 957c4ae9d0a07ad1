//! Core utilities for the guitar catalog tools
//!
//! This crate provides shared functionality used by the API client, the
//! search core and the command-line front end:
//!
//! - **Error handling**: Errors with codes, context, and recovery suggestions
//! - **Retry**: Exponential backoff policies and a circuit breaker
//! - **Configuration**: TOML-based configuration with validation
//!
//! # Example
//!
//! ```rust,no_run
//! use catalog_core::config::Config;
//!
//! let config = Config::load(None).expect("invalid configuration");
//! println!("API: {}", config.schema.api.base_url);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod retry;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ConfigSchema};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::retry::{retry_async, CircuitBreaker, CircuitBreakerConfig, RetryConfig};
}
