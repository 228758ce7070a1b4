pub mod exports;
pub mod group;
pub mod render;
pub mod yaml;

// Re-export format converters
pub use exports::{proxy_to_clash, proxy_to_uri};

// Re-export the render pipeline
pub use render::{render_group, OutputFormat, RenderContext, RenderError, RenderOutput};
