use super::common::split_link;
use super::vless::apply_transport;
use crate::models::{Proxy, ProxyType};

/// Parse a Trojan link into a Proxy object
/// Format: trojan://password@host:port?sni=xxx&allowInsecure=1&type=ws&path=/ws#remark
pub fn explode_trojan(trojan: &str) -> Option<Proxy> {
    let parts = split_link(trojan, 443)?;
    if parts.user.is_empty() {
        return None;
    }

    let mut node = Proxy::new(
        ProxyType::Trojan,
        parts.remark.clone(),
        parts.hostname.clone(),
        parts.port,
    );
    node.password = Some(parts.user.clone());
    // Trojan always runs over TLS
    node.tls_secure = true;
    // Extract SNI - check for both "sni" and "peer" parameters
    node.sni = parts.param("sni").or_else(|| parts.param("peer"));
    node.allow_insecure = parts.flag("allowInsecure");
    apply_transport(&parts, &mut node);
    Some(node)
}
