use std::collections::HashMap;

use log::debug;
use url::Url;

use crate::models::{Proxy, ProxyType};
use crate::utils::url::url_decode;

/// Explode a proxy link into a Proxy object
///
/// This function detects the type of proxy link and calls the appropriate parser.
/// Returns `None` for unsupported schemes and malformed links.
pub fn explode(link: &str) -> Option<Proxy> {
    let link = link.trim();
    if link.is_empty() {
        return None;
    }

    let mut node = match ProxyType::from_link(link)? {
        ProxyType::Shadowsocks => super::ss::explode_ss(link),
        ProxyType::VMess => super::vmess::explode_vmess(link),
        ProxyType::Vless => super::vless::explode_vless(link),
        ProxyType::Trojan => super::trojan::explode_trojan(link),
        ProxyType::Hysteria2 => super::hysteria2::explode_hysteria2(link),
    }?;
    node.ensure_remark();
    Some(node)
}

/// Explode a subscription content into a vector of Proxy objects
///
/// The content is split on whitespace; every token that is not a supported,
/// well-formed link is skipped.
pub fn explode_sub(sub: &str) -> Vec<Proxy> {
    let mut nodes = Vec::new();
    for token in sub.split_whitespace() {
        match explode(token) {
            Some(node) => nodes.push(node),
            None => debug!("Skipping unrecognised token '{}'", truncate(token, 48)),
        }
    }
    nodes
}

fn truncate(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &value[..idx]),
        None => value.to_string(),
    }
}

/// Pieces of an authority-style link such as `trojan://secret@host:443?sni=x#name`.
#[derive(Debug)]
pub(crate) struct LinkParts {
    /// Decoded user-info; `user:password` is kept whole
    pub user: String,
    pub hostname: String,
    pub port: u16,
    pub params: HashMap<String, String>,
    pub remark: String,
}

impl LinkParts {
    pub fn param(&self, key: &str) -> Option<String> {
        self.params.get(key).filter(|v| !v.is_empty()).cloned()
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.params
            .get(key)
            .map(|v| crate::utils::deserialize::parse_flag(v))
    }
}

/// Split an authority-style link with the `url` crate.
///
/// Missing ports fall back to `default_port`; port 0 and an empty host are rejected.
pub(crate) fn split_link(link: &str, default_port: u16) -> Option<LinkParts> {
    let url = Url::parse(link).ok()?;

    let hostname = url
        .host_str()?
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_string();
    if hostname.is_empty() {
        return None;
    }
    let port = url.port().unwrap_or(default_port);
    if port == 0 {
        return None;
    }

    let mut user = url_decode(url.username());
    if let Some(password) = url.password() {
        user = format!("{}:{}", user, url_decode(password));
    }

    let params = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let remark = url.fragment().map(url_decode).unwrap_or_default();

    Some(LinkParts {
        user,
        hostname,
        port,
        params,
        remark,
    })
}
