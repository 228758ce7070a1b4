use super::common::{split_link, LinkParts};
use super::vmess::split_alpn;
use crate::models::{Proxy, ProxyType};

/// Read the transport part of a query (`type`, `host`, `path`, `serviceName`) into a node.
///
/// For gRPC the service name is kept in `path`.
pub(crate) fn apply_transport(parts: &LinkParts, node: &mut Proxy) {
    node.transfer_protocol = parts.param("type");
    node.host = parts.param("host");
    node.path = if node.transfer_protocol.as_deref() == Some("grpc") {
        parts.param("serviceName").or_else(|| parts.param("path"))
    } else {
        parts.param("path")
    };
    node.alpn = parts.param("alpn").map(|a| split_alpn(&a)).unwrap_or_default();
    node.fingerprint = parts.param("fp");
}

/// Parse a VLESS link into a Proxy object
/// Format: vless://uuid@host:port?security=tls|reality|none&type=ws&...#remark
pub fn explode_vless(vless: &str) -> Option<Proxy> {
    let parts = split_link(vless, 443)?;
    if parts.user.is_empty() {
        return None;
    }

    let mut node = Proxy::new(
        ProxyType::Vless,
        parts.remark.clone(),
        parts.hostname.clone(),
        parts.port,
    );
    node.user_id = Some(parts.user.clone());
    node.flow = parts.param("flow");
    apply_transport(&parts, &mut node);

    let security = parts.param("security").unwrap_or_default();
    node.tls_secure = matches!(security.as_str(), "tls" | "reality" | "xtls");
    if security == "reality" {
        node.public_key = parts.param("pbk");
        node.short_id = parts.param("sid");
    }
    node.sni = parts.param("sni");
    node.allow_insecure = parts.flag("allowInsecure");
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reality_link() {
        let link = "vless://b831381d-6324-4d53-ad4f-8cda48b30811@sg.example.com:443?encryption=none&flow=xtls-rprx-vision&security=reality&sni=www.microsoft.com&fp=chrome&pbk=PUBKEY&sid=6ba85179&type=tcp#SG%20Reality";
        let node = explode_vless(link).unwrap();
        assert_eq!(node.proxy_type, ProxyType::Vless);
        assert_eq!(node.remark, "SG Reality");
        assert_eq!(node.hostname, "sg.example.com");
        assert_eq!(node.port, 443);
        assert_eq!(
            node.user_id.as_deref(),
            Some("b831381d-6324-4d53-ad4f-8cda48b30811")
        );
        assert_eq!(node.flow.as_deref(), Some("xtls-rprx-vision"));
        assert!(node.tls_secure);
        assert_eq!(node.sni.as_deref(), Some("www.microsoft.com"));
        assert_eq!(node.fingerprint.as_deref(), Some("chrome"));
        assert_eq!(node.public_key.as_deref(), Some("PUBKEY"));
        assert_eq!(node.short_id.as_deref(), Some("6ba85179"));
        assert_eq!(node.transfer_protocol.as_deref(), Some("tcp"));
    }

    #[test]
    fn test_grpc_service_name() {
        let link = "vless://id@1.2.3.4:8443?security=tls&type=grpc&serviceName=svc#G";
        let node = explode_vless(link).unwrap();
        assert_eq!(node.transfer_protocol.as_deref(), Some("grpc"));
        assert_eq!(node.path.as_deref(), Some("svc"));
        assert_eq!(node.public_key, None);
    }

    #[test]
    fn test_missing_uuid() {
        assert!(explode_vless("vless://example.com:443").is_none());
    }
}
