use crate::models::{non_empty, Proxy, ProxyType};
use crate::utils::base64::try_base64_decode;
use crate::utils::deserialize::parse_flag;
use serde_json::Value;

/// Read a JSON field that may hold a string or a number.
fn json_string(json: &Value, key: &str) -> Option<String> {
    match &json[key] {
        Value::String(s) => non_empty(Some(s.trim().to_string())),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parse a VMess link into a Proxy object
///
/// The payload after `vmess://` is base64 encoded JSON in the v2rayN layout:
/// `ps, add, port, id, aid, scy, net, type, host, path, tls, sni, alpn, fp`.
pub fn explode_vmess(vmess: &str) -> Option<Proxy> {
    let encoded = vmess
        .get(8..)
        .filter(|_| vmess[..8].eq_ignore_ascii_case("vmess://"))?;
    // Some producers append a fragment to the encoded payload
    let encoded = encoded.split('#').next().unwrap_or(encoded);

    let decoded = try_base64_decode(encoded)?;
    let json: Value = serde_json::from_str(&decoded).ok()?;
    if !json.is_object() {
        return None;
    }

    let add = json_string(&json, "add")?;
    let port = json_string(&json, "port")?.parse::<u16>().ok().filter(|p| *p != 0)?;
    let id = json_string(&json, "id")?;
    let aid = json_string(&json, "aid")
        .and_then(|a| a.parse::<u16>().ok())
        .unwrap_or(0);

    let remark = json_string(&json, "ps").unwrap_or_default();
    let mut node = Proxy::new(ProxyType::VMess, remark, add, port);
    node.user_id = Some(id);
    node.alter_id = aid;
    node.encrypt_method = Some(json_string(&json, "scy").unwrap_or_else(|| "auto".to_string()));
    node.transfer_protocol = Some(json_string(&json, "net").unwrap_or_else(|| "tcp".to_string()));
    node.fake_type = json_string(&json, "type").filter(|t| t != "none");
    node.host = json_string(&json, "host");
    node.path = json_string(&json, "path");
    node.tls_secure = json_string(&json, "tls").is_some_and(|t| t == "tls");
    node.sni = json_string(&json, "sni");
    node.fingerprint = json_string(&json, "fp");
    node.alpn = json_string(&json, "alpn")
        .map(|a| split_alpn(&a))
        .unwrap_or_default();
    node.allow_insecure = json_string(&json, "allowInsecure").map(|v| parse_flag(&v));
    Some(node)
}

/// Split a comma separated ALPN list.
pub fn split_alpn(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::base64::base64_encode;

    #[test]
    fn test_standard_json() {
        let json = r#"{"v":"2","ps":"JP 01","add":"jp.example.com","port":"443","id":"b831381d-6324-4d53-ad4f-8cda48b30811","aid":"0","net":"ws","type":"none","host":"cdn.example.com","path":"/ray","tls":"tls","sni":"jp.example.com"}"#;
        let node = explode_vmess(&format!("vmess://{}", base64_encode(json))).unwrap();
        assert_eq!(node.proxy_type, ProxyType::VMess);
        assert_eq!(node.remark, "JP 01");
        assert_eq!(node.hostname, "jp.example.com");
        assert_eq!(node.port, 443);
        assert_eq!(
            node.user_id.as_deref(),
            Some("b831381d-6324-4d53-ad4f-8cda48b30811")
        );
        assert_eq!(node.alter_id, 0);
        assert_eq!(node.encrypt_method.as_deref(), Some("auto"));
        assert_eq!(node.transfer_protocol.as_deref(), Some("ws"));
        assert_eq!(node.fake_type, None);
        assert_eq!(node.host.as_deref(), Some("cdn.example.com"));
        assert_eq!(node.path.as_deref(), Some("/ray"));
        assert!(node.tls_secure);
        assert_eq!(node.sni.as_deref(), Some("jp.example.com"));
    }

    #[test]
    fn test_numeric_fields() {
        let json = r#"{"ps":"","add":"1.2.3.4","port":10086,"id":"uuid","aid":64,"scy":"aes-128-gcm"}"#;
        let node = explode_vmess(&format!("vmess://{}", base64_encode(json))).unwrap();
        assert_eq!(node.port, 10086);
        assert_eq!(node.alter_id, 64);
        assert_eq!(node.remark, "");
        assert_eq!(node.encrypt_method.as_deref(), Some("aes-128-gcm"));
        assert_eq!(node.transfer_protocol.as_deref(), Some("tcp"));
        assert!(!node.tls_secure);
    }

    #[test]
    fn test_malformed() {
        assert!(explode_vmess("vmess://").is_none());
        assert!(explode_vmess("vmess://not-base64!").is_none());
        let no_port = base64_encode(r#"{"add":"1.2.3.4","id":"uuid"}"#);
        assert!(explode_vmess(&format!("vmess://{}", no_port)).is_none());
    }
}
