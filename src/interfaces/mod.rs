//! Entry points driving the parser and renderer on behalf of callers.

mod aggregate;

pub use aggregate::{
    check_content, render_by_token, split_nodes, CheckReport, NodeSummary, NormalizedLink,
};
