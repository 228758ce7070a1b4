pub mod clash;
pub mod uri;

pub use clash::proxy_to_clash;
pub use uri::proxy_to_uri;
