//! Lockstep Core Library
//!
//! Shared functionality for Lockstep components:
//! - Group-channel abstraction over a collective broadcast transport
//! - In-process transport for hosting several group members locally
//! - Rank tag palette for decorating multiplexed output
//! - Configuration resolution and hierarchy
//! - Common error types

pub mod config;
pub mod error;
pub mod group;
pub mod local;
pub mod tag;
pub mod tracing_init;

pub use config::Config;
pub use error::{Error, Result};
pub use group::{Frame, GroupChannel};
pub use local::LocalGroup;
pub use tag::TagPalette;
