//! Utility functions shared by the workspace crates.

pub mod constants;
pub mod formatting;
pub mod helpers;

pub use formatting::{has_0x_prefix, truncate_id, with_0x_prefix, without_0x_prefix};
pub use helpers::current_timestamp;
