//! Core data models for the application
//!
//! This module contains the primary data structures used throughout the application,
//! separated from the logic that operates on them.
//!
//! # Usage
//!
//! ```rust
//! use submerge::models::{Proxy, ProxyType};
//!
//! let mut proxy = Proxy::new(ProxyType::Trojan, "", "example.com", 443);
//! proxy.password = Some("secret".to_string());
//! proxy.ensure_remark();
//! assert_eq!(proxy.remark, "example.com:443");
//! ```
//!
//! Stored configuration lives in [`group`]: a [`GroupRecord`] is what the store hands
//! out, and [`GroupDescriptor::from_record`] decodes it into something renderable.

mod app_state;
mod group;
mod proxy;

pub use app_state::AppState;
pub use group::*;
pub use proxy::*;
