pub mod base64;
pub mod deserialize;
pub mod url;

// Re-export common utilities
pub use self::base64::{base64_encode, try_base64_decode};
pub use self::url::{url_decode, url_encode};
