pub mod generator;
pub mod interfaces;
pub mod models;
pub mod parser;
pub mod settings;
pub mod store;
pub mod utils;

#[cfg(feature = "web-api")]
pub mod web_handlers;

// Re-export the main proxy types for easier access
pub use models::{Proxy, ProxyType};

pub use generator::{OutputFormat, RenderError, RenderOutput};
pub use parser::parse_nodes;
pub use settings::Settings;
pub use store::{GroupStore, MemoryStore, SourceStore, StoreError};
