use log::{debug, info};
use serde::Serialize;

use crate::generator::exports::uri::proxy_to_uri;
use crate::generator::render::{render_group, OutputFormat, RenderError, RenderOutput};
use crate::models::GroupDescriptor;
use crate::parser::parse_nodes;
use crate::store::{GroupStore, SourceStore};

/// Render the group published under `token`.
///
/// Unknown tokens and disabled groups are both reported as [`RenderError::NotFound`].
/// A stored configuration that cannot be decoded renders with defaults.
pub async fn render_by_token<G, S>(
    groups: &G,
    sources: &S,
    token: &str,
    format: OutputFormat,
) -> Result<RenderOutput, RenderError>
where
    G: GroupStore,
    S: SourceStore,
{
    let record = match groups.get_group_by_token(token).await? {
        Some(record) if record.enabled => record,
        Some(record) => {
            debug!("Group '{}' is disabled", record.name);
            return Err(RenderError::NotFound);
        }
        None => return Err(RenderError::NotFound),
    };

    let group = GroupDescriptor::from_record(&record);
    render_group(sources, &group, format).await
}

/// One parsed node as reported by [`check_content`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub proxy_type: String,
    pub server: String,
    pub port: u16,
    /// Canonical link of the node
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    /// At least one node was recognised
    pub valid: bool,
    pub node_count: usize,
    pub nodes: Vec<NodeSummary>,
}

/// Parse raw content and describe what it contains.
pub fn check_content(raw: &str) -> CheckReport {
    let nodes: Vec<NodeSummary> = parse_nodes(raw)
        .iter()
        .map(|node| NodeSummary {
            name: node.remark.clone(),
            proxy_type: node.proxy_type.clash_type().to_string(),
            server: node.hostname.clone(),
            port: node.port,
            link: proxy_to_uri(node),
        })
        .collect();

    CheckReport {
        valid: !nodes.is_empty(),
        node_count: nodes.len(),
        nodes,
    }
}

/// A single node as a standalone, named link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedLink {
    pub name: String,
    pub link: String,
}

/// Split raw content into one canonical link per node.
///
/// Without a base name every link keeps its node's name. With one, a lone node takes
/// the base name and several nodes are numbered `"{base} {i}"` from 1.
pub fn split_nodes(raw: &str, base_name: Option<&str>) -> Vec<NormalizedLink> {
    let mut nodes = parse_nodes(raw);
    let base_name = base_name.map(str::trim).filter(|name| !name.is_empty());
    let total = nodes.len();

    if let Some(base) = base_name {
        for (index, node) in nodes.iter_mut().enumerate() {
            node.remark = if total == 1 {
                base.to_string()
            } else {
                format!("{} {}", base, index + 1)
            };
        }
    }

    info!("Split content into {} links", total);
    nodes
        .iter()
        .map(|node| NormalizedLink {
            name: node.remark.clone(),
            link: proxy_to_uri(node),
        })
        .collect()
}
