//! Group rendering pipeline.
//!
//! A render runs five stages over one [`RenderContext`]:
//! resolve sources, filter and collect, deduplicate, annotate chains, render.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use futures::future::join_all;
use log::{debug, error, info, warn};
use thiserror::Error;

use crate::generator::exports::clash::{groups_to_yaml, proxies_to_yaml, proxy_to_clash};
use crate::generator::exports::uri::proxy_to_uri;
use crate::generator::group::group_generate;
use crate::generator::yaml::clash_output::ClashProxy;
use crate::models::{ClashConfig, Directive, GroupDescriptor, Proxy, RenderMode, Source};
use crate::parser::parse_nodes;
use crate::store::{SourceStore, StoreError};
use crate::utils::base64::base64_encode;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Group not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for RenderError {
    fn from(e: StoreError) -> Self {
        RenderError::Internal(e.to_string())
    }
}

impl From<serde_yaml::Error> for RenderError {
    fn from(e: serde_yaml::Error) -> Self {
        RenderError::Internal(format!("Failed to serialize YAML: {}", e))
    }
}

/// Requested output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Base64 bundle of canonical links
    #[default]
    Plain,
    /// Clash YAML document
    Structured,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unsupported output format '{0}'")]
pub struct UnknownFormat(pub String);

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "base64" | "plain" => Ok(OutputFormat::Plain),
            "clash" | "structured" | "yaml" => Ok(OutputFormat::Structured),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Plain => f.write_str("base64"),
            OutputFormat::Structured => f.write_str("clash"),
        }
    }
}

impl OutputFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Plain => "text/plain; charset=utf-8",
            OutputFormat::Structured => "text/yaml; charset=utf-8",
        }
    }
}

/// A rendered group, ready to be served
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    pub content_type: &'static str,
    pub body: String,
    /// Suggested download name, `{group name}.yaml`
    pub filename: String,
}

/// Nodes of one directive after its source has been fetched and parsed
#[derive(Debug)]
pub struct ResolvedDirective<'a> {
    pub directive: &'a Directive,
    /// Display name of the source, `None` when it is missing
    pub source_name: Option<String>,
    pub nodes: Vec<Proxy>,
}

/// One node travelling through the pipeline
#[derive(Debug, Clone)]
pub struct RenderEntry {
    pub node: Proxy,
    pub source_name: Option<String>,
    pub chain: Option<String>,
}

/// Request-scoped state of one render
#[derive(Debug, Default)]
pub struct RenderContext {
    pub entries: Vec<RenderEntry>,
    /// Source display name to final node names, in render order
    pub resources: HashMap<String, Vec<String>>,
}

impl RenderContext {
    /// Filter and collect: keep included nodes, in directive order.
    pub fn collect(resolved: Vec<ResolvedDirective<'_>>) -> Self {
        let mut entries = Vec::new();
        for item in resolved {
            let include = &item.directive.include;
            let chain = item.directive.chain_target().map(str::to_string);
            for node in item.nodes {
                if !include.allows(&node.remark) {
                    continue;
                }
                entries.push(RenderEntry {
                    node,
                    source_name: item.source_name.clone(),
                    chain: chain.clone(),
                });
            }
        }
        RenderContext {
            entries,
            resources: HashMap::new(),
        }
    }

    /// Deduplicate: trim names and suffix collisions with a counter.
    ///
    /// Also records which final names every source display name produced.
    pub fn deduplicate(&mut self) {
        let mut used: HashSet<String> = HashSet::new();
        self.resources.clear();

        for entry in &mut self.entries {
            let base = entry.node.remark.trim().to_string();
            let mut name = base.clone();
            let mut counter = 1;
            while used.contains(&name) {
                name = format!("{} {}", base, counter);
                counter += 1;
            }
            used.insert(name.clone());
            entry.node.remark = name.clone();

            if let Some(source_name) = &entry.source_name {
                self.resources
                    .entry(source_name.clone())
                    .or_default()
                    .push(name);
            }
        }
    }

    /// Annotate chains, then move chained nodes behind the others.
    pub fn annotate_chains(&mut self) {
        for entry in &mut self.entries {
            entry.node.underlying_proxy = entry.chain.clone();
        }
        let (normal, chained): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| !entry.node.is_chained());
        self.entries = normal;
        self.entries.extend(chained);
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Proxy> {
        self.entries.iter().map(|entry| &entry.node)
    }

    /// Base64 bundle of canonical links, one per line.
    pub fn render_plain(&self) -> String {
        let links: Vec<String> = self.nodes().map(proxy_to_uri).collect();
        base64_encode(&links.join("\n"))
    }

    /// Clash document: header, proxies, proxy groups and rules.
    pub fn render_structured(&self, clash: &ClashConfig) -> Result<String, RenderError> {
        let proxies: Vec<ClashProxy> = self.nodes().map(proxy_to_clash).collect();
        debug!(
            "{} of {} proxies dial through another group",
            proxies
                .iter()
                .filter(|proxy| proxy.common().dialer_proxy.is_some())
                .count(),
            proxies.len()
        );
        let node_names: HashSet<&str> = self.nodes().map(|node| node.remark.as_str()).collect();
        let groups = group_generate(&clash.groups, &self.resources, &node_names);

        Ok(format!(
            "{}\n\n{}\n{}\n{}",
            clash.header,
            proxies_to_yaml(&proxies)?,
            groups_to_yaml(&groups)?,
            clash.rules
        ))
    }
}

/// Resolve sources: fetch every directive's source and parse it.
///
/// Fetches run concurrently; results keep directive order. A missing source
/// contributes no nodes.
pub async fn resolve_sources<'a, S: SourceStore>(
    store: &S,
    directives: &'a [Directive],
) -> Result<Vec<ResolvedDirective<'a>>, RenderError> {
    let fetched = join_all(
        directives
            .iter()
            .map(|directive| store.get_source(directive.source_id)),
    )
    .await;

    let mut resolved = Vec::with_capacity(directives.len());
    for (directive, source) in directives.iter().zip(fetched) {
        let item = match source? {
            Some(Source { name, content, .. }) => {
                let nodes = parse_nodes(&content);
                debug!("Source {} '{}' yielded {} nodes", directive.source_id, name, nodes.len());
                ResolvedDirective {
                    directive,
                    source_name: Some(name),
                    nodes,
                }
            }
            None => {
                warn!("Source {} not found, skipping", directive.source_id);
                ResolvedDirective {
                    directive,
                    source_name: None,
                    nodes: Vec::new(),
                }
            }
        };
        resolved.push(item);
    }
    Ok(resolved)
}

/// Render a decoded group in the requested format.
pub async fn render_group<S: SourceStore>(
    store: &S,
    group: &GroupDescriptor,
    format: OutputFormat,
) -> Result<RenderOutput, RenderError> {
    let base_name = match group.name.trim() {
        "" => "GroupConfig",
        name => name,
    };
    let filename = format!("{}.yaml", base_name);
    let output = |body: String| RenderOutput {
        content_type: format.content_type(),
        body,
        filename: filename.clone(),
    };

    if format == OutputFormat::Structured && group.clash.mode == RenderMode::Raw {
        debug!("Group '{}' is in raw mode, returning stored document", group.name);
        return Ok(output(group.clash.raw_yaml.clone()));
    }

    let directives: &[Directive] = match format {
        OutputFormat::Structured => group.structured_directives(),
        OutputFormat::Plain => &group.directives,
    };

    let resolved = resolve_sources(store, directives).await?;
    let mut ctx = RenderContext::collect(resolved);
    ctx.deduplicate();
    ctx.annotate_chains();

    let body = match format {
        OutputFormat::Plain => ctx.render_plain(),
        OutputFormat::Structured => ctx.render_structured(&group.clash).map_err(|e| {
            error!("Failed to render group '{}': {}", group.name, e);
            e
        })?,
    };

    info!(
        "Rendered group '{}' as {} with {} nodes",
        group.name,
        format,
        ctx.entries.len()
    );
    Ok(output(body))
}
