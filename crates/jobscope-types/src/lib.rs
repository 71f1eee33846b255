//! # jobscope-types
//!
//! Shared domain types for the jobscope runner.
//!
//! This crate defines the value objects that cross crate boundaries:
//! - `Marketplace`: the runtime selector used to choose among variant
//!   implementations of a capability
//! - `JobConfiguration`: the immutable per-registration parameters copied
//!   into every job execution
//!
//! ## Usage
//!
//! ```rust
//! use jobscope_types::{JobConfiguration, Marketplace};
//!
//! let config = JobConfiguration::new(Marketplace::Jet)
//!     .with_data("base_units", "5");
//! assert_eq!(config.marketplace(), Marketplace::Jet);
//! ```

pub mod config;
pub mod selector;

pub use config::JobConfiguration;
pub use selector::{Marketplace, ParseMarketplaceError};
