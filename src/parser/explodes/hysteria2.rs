use super::common::split_link;
use super::vmess::split_alpn;
use crate::models::{Proxy, ProxyType};

/// Parse a Hysteria2 link into a Proxy object (handles both hysteria2:// and hy2://)
/// Format: hysteria2://auth@host:port/?sni=xxx&obfs=salamander&obfs-password=yyy#remark
pub fn explode_hysteria2(hysteria2: &str) -> Option<Proxy> {
    let parts = split_link(hysteria2, 443)?;

    let mut node = Proxy::new(
        ProxyType::Hysteria2,
        parts.remark.clone(),
        parts.hostname.clone(),
        parts.port,
    );
    node.password = Some(parts.user.clone()).filter(|p| !p.is_empty());
    node.sni = parts.param("sni");
    node.allow_insecure = parts.flag("insecure");
    node.obfs = parts.param("obfs");
    node.obfs_param = parts.param("obfs-password");
    node.fingerprint = parts.param("pinSHA256");
    node.alpn = parts.param("alpn").map(|a| split_alpn(&a)).unwrap_or_default();
    Some(node)
}
