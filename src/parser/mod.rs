//! Subscription parsing: raw text in, ordered nodes out.

pub mod explodes;
pub mod shape;
pub mod yaml;

use log::{debug, warn};

use crate::models::Proxy;
pub use explodes::{explode, explode_sub};
pub use shape::InputShape;

/// Parse raw subscription content into nodes, in input order.
///
/// Never fails: anything that cannot be understood contributes no nodes.
pub fn parse_nodes(raw: &str) -> Vec<Proxy> {
    match InputShape::classify(raw) {
        InputShape::Empty => Vec::new(),
        InputShape::Structured => {
            debug!("Parsing content as a structured proxy list");
            yaml::clash::parse_clash_yaml(raw).unwrap_or_else(|e| {
                warn!("{}", e);
                Vec::new()
            })
        }
        InputShape::Encoded(decoded) => {
            debug!("Parsing content as a base64 link bundle");
            explode_sub(&decoded)
        }
        InputShape::Links => explode_sub(raw),
    }
}
