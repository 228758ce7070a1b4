//! Proxy group generation utilities
//!
//! Group members in a stored configuration may name a source instead of a node;
//! such members stand for every node that source contributed to the render.

use std::collections::{HashMap, HashSet};

use crate::generator::yaml::clash_output::ClashProxyGroup;
use crate::models::ProxyGroupConfig;

/// Built-in policies that are always valid group members
pub const RESERVED_MEMBERS: [&str; 3] = ["DIRECT", "REJECT", "NO-RESOLVE"];

/// Expands the member list of one group.
///
/// # Arguments
///
/// * `members` - Configured members: source names, node names or reserved policies
/// * `resources` - Source display name to final node names, in render order
/// * `node_names` - Final names of every node in the document
///
/// # Returns
///
/// Members in configured order with source names replaced by their nodes. Members
/// that resolve to nothing are dropped.
pub fn expand_members(
    members: &[String],
    resources: &HashMap<String, Vec<String>>,
    node_names: &HashSet<&str>,
) -> Vec<String> {
    let mut expanded = Vec::new();
    for member in members {
        match resources.get(member).filter(|names| !names.is_empty()) {
            Some(names) => expanded.extend(names.iter().cloned()),
            None if node_names.contains(member.as_str())
                || RESERVED_MEMBERS.contains(&member.as_str()) =>
            {
                expanded.push(member.clone());
            }
            None => {}
        }
    }
    expanded
}

/// Generates the output groups of a document from their stored definitions.
pub fn group_generate(
    groups: &[ProxyGroupConfig],
    resources: &HashMap<String, Vec<String>>,
    node_names: &HashSet<&str>,
) -> Vec<ClashProxyGroup> {
    groups
        .iter()
        .map(|group| ClashProxyGroup {
            name: group.name.clone(),
            group_type: group.group_type.clone(),
            proxies: expand_members(&group.proxies, resources, node_names),
            extra: group.extra.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_expand_members() {
        let mut resources = HashMap::new();
        resources.insert("Airport".to_string(), strings(&["HK", "HK 1"]));
        resources.insert("Empty".to_string(), Vec::new());
        let node_names: HashSet<&str> = ["HK", "HK 1", "JP"].into_iter().collect();

        let members = strings(&["Airport", "JP", "DIRECT", "Unknown", "Empty", "NO-RESOLVE"]);
        assert_eq!(
            expand_members(&members, &resources, &node_names),
            strings(&["HK", "HK 1", "JP", "DIRECT", "NO-RESOLVE"])
        );
    }

    #[test]
    fn test_source_name_wins_over_node_name() {
        let mut resources = HashMap::new();
        resources.insert("JP".to_string(), strings(&["Tokyo", "Osaka"]));
        let node_names: HashSet<&str> = ["JP", "Tokyo", "Osaka"].into_iter().collect();
        assert_eq!(
            expand_members(&strings(&["JP"]), &resources, &node_names),
            strings(&["Tokyo", "Osaka"])
        );
    }

    #[test]
    fn test_group_generate_keeps_extra_keys() {
        let mut config = ProxyGroupConfig::new("Auto", "url-test", ["JP", "REJECT"]);
        config.extra.insert("interval".to_string(), serde_json::json!(300));
        let node_names: HashSet<&str> = ["JP"].into_iter().collect();

        let groups = group_generate(&[config], &HashMap::new(), &node_names);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].group_type, "url-test");
        assert_eq!(groups[0].proxies, strings(&["JP", "REJECT"]));
        assert_eq!(groups[0].extra.get("interval"), Some(&serde_json::json!(300)));
    }
}
