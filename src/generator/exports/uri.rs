use serde_json::{json, Map, Value};

use crate::models::{Proxy, ProxyType};
use crate::utils::base64::{base64_encode, url_safe_base64_encode};
use crate::utils::url::{format_host, url_encode};

/// Query string builder; values are percent-encoded, empty ones dropped.
#[derive(Default)]
struct Query {
    pairs: Vec<String>,
}

impl Query {
    fn push(&mut self, key: &str, value: &str) {
        if !value.is_empty() {
            self.pairs.push(format!("{}={}", key, url_encode(value)));
        }
    }

    fn push_opt(&mut self, key: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.push(key, value);
        }
    }

    fn push_flag(&mut self, key: &str, value: Option<bool>) {
        if let Some(value) = value {
            self.push(key, if value { "1" } else { "0" });
        }
    }

    fn push_transport(&mut self, node: &Proxy) {
        let network = node.transfer_protocol.as_deref();
        self.push_opt("type", network);
        self.push_opt("host", node.host.as_deref());
        let path_key = if network == Some("grpc") {
            "serviceName"
        } else {
            "path"
        };
        self.push_opt(path_key, node.path.as_deref());
    }

    fn finish(self) -> String {
        if self.pairs.is_empty() {
            String::new()
        } else {
            format!("?{}", self.pairs.join("&"))
        }
    }
}

/// Convert a proxy to its canonical link.
///
/// The current remark becomes the fragment. Feeding the link back to the parser yields
/// the same node.
pub fn proxy_to_uri(node: &Proxy) -> String {
    let host = format_host(&node.hostname);
    let remark = url_encode(&node.remark);
    let alpn = node.alpn.join(",");

    match node.proxy_type {
        ProxyType::Shadowsocks => {
            // ss://BASE64URL(method:password)@server:port/?plugin=plugin;opts#remark
            let user_info = format!(
                "{}:{}",
                node.encrypt_method.as_deref().unwrap_or_default(),
                node.password.as_deref().unwrap_or_default()
            );
            let mut uri = format!(
                "ss://{}@{}:{}",
                url_safe_base64_encode(&user_info),
                host,
                node.port
            );
            if let Some(plugin) = node.plugin.as_deref().filter(|p| !p.is_empty()) {
                let plugin = match node.plugin_option.as_deref() {
                    Some(opts) if !opts.is_empty() => format!("{};{}", plugin, opts),
                    _ => plugin.to_string(),
                };
                uri.push_str(&format!("/?plugin={}", url_encode(&plugin)));
            }
            format!("{}#{}", uri, remark)
        }
        ProxyType::VMess => {
            // vmess://BASE64(JSON)
            let mut vmess = json!({
                "v": "2",
                "ps": node.remark,
                "add": node.hostname,
                "port": node.port.to_string(),
                "id": node.user_id.as_deref().unwrap_or_default(),
                "aid": node.alter_id.to_string(),
                "scy": node.encrypt_method.as_deref().unwrap_or("auto"),
                "net": node.transfer_protocol.as_deref().unwrap_or("tcp"),
                "type": node.fake_type.as_deref().unwrap_or("none"),
                "host": node.host.as_deref().unwrap_or_default(),
                "path": node.path.as_deref().unwrap_or_default(),
                "tls": if node.tls_secure { "tls" } else { "" },
            });
            if let Value::Object(fields) = &mut vmess {
                insert_non_empty(fields, "sni", node.sni.as_deref());
                insert_non_empty(fields, "alpn", Some(&alpn));
                insert_non_empty(fields, "fp", node.fingerprint.as_deref());
                if let Some(insecure) = node.allow_insecure {
                    fields.insert("allowInsecure".to_string(), Value::Bool(insecure));
                }
            }
            format!("vmess://{}", base64_encode(&vmess.to_string()))
        }
        ProxyType::Vless => {
            // vless://uuid@server:port?encryption=none&security=...#remark
            let security = if node.public_key.is_some() || node.short_id.is_some() {
                "reality"
            } else if node.tls_secure {
                "tls"
            } else {
                "none"
            };
            let mut query = Query::default();
            query.push("encryption", "none");
            query.push("security", security);
            query.push_opt("flow", node.flow.as_deref());
            query.push_opt("sni", node.sni.as_deref());
            query.push_opt("fp", node.fingerprint.as_deref());
            query.push_opt("pbk", node.public_key.as_deref());
            query.push_opt("sid", node.short_id.as_deref());
            query.push_transport(node);
            query.push("alpn", &alpn);
            query.push_flag("allowInsecure", node.allow_insecure);
            format!(
                "vless://{}@{}:{}{}#{}",
                url_encode(node.user_id.as_deref().unwrap_or_default()),
                host,
                node.port,
                query.finish(),
                remark
            )
        }
        ProxyType::Trojan => {
            // trojan://password@server:port?sni=...&allowInsecure=1#remark
            let mut query = Query::default();
            query.push_opt("sni", node.sni.as_deref());
            query.push_flag("allowInsecure", node.allow_insecure);
            query.push_transport(node);
            query.push("alpn", &alpn);
            query.push_opt("fp", node.fingerprint.as_deref());
            format!(
                "trojan://{}@{}:{}{}#{}",
                url_encode(node.password.as_deref().unwrap_or_default()),
                host,
                node.port,
                query.finish(),
                remark
            )
        }
        ProxyType::Hysteria2 => {
            // hysteria2://auth@server:port/?sni=...&obfs=salamander#remark
            let mut query = Query::default();
            query.push_opt("sni", node.sni.as_deref());
            query.push_flag("insecure", node.allow_insecure);
            query.push_opt("obfs", node.obfs.as_deref());
            query.push_opt("obfs-password", node.obfs_param.as_deref());
            query.push_opt("pinSHA256", node.fingerprint.as_deref());
            query.push("alpn", &alpn);
            let auth = match node.password.as_deref() {
                Some(password) if !password.is_empty() => format!("{}@", url_encode(password)),
                _ => String::new(),
            };
            format!(
                "hysteria2://{}{}:{}/{}#{}",
                auth,
                host,
                node.port,
                query.finish(),
                remark
            )
        }
    }
}

fn insert_non_empty(fields: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        fields.insert(key.to_string(), Value::String(value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_nodes;

    fn round_trip(node: &Proxy) {
        let uri = proxy_to_uri(node);
        let parsed = parse_nodes(&uri);
        assert_eq!(parsed.len(), 1, "{}", uri);
        assert_eq!(&parsed[0], node, "{}", uri);
    }

    #[test]
    fn test_shadowsocks_round_trip() {
        let mut node = Proxy::new(ProxyType::Shadowsocks, "HK #1 / 香港", "2001:db8::1", 8388);
        node.encrypt_method = Some("aes-256-gcm".to_string());
        node.password = Some("p@ss:w/rd".to_string());
        node.plugin = Some("obfs-local".to_string());
        node.plugin_option = Some("obfs=http;obfs-host=bing.com".to_string());
        round_trip(&node);

        node.plugin = None;
        node.plugin_option = None;
        round_trip(&node);
    }

    #[test]
    fn test_vmess_round_trip() {
        let mut node = Proxy::new(ProxyType::VMess, "JP 01", "jp.example.com", 443);
        node.user_id = Some("b831381d-6324-4d53-ad4f-8cda48b30811".to_string());
        node.alter_id = 2;
        node.encrypt_method = Some("auto".to_string());
        node.transfer_protocol = Some("ws".to_string());
        node.host = Some("cdn.example.com".to_string());
        node.path = Some("/ray?ed=2048".to_string());
        node.tls_secure = true;
        node.sni = Some("jp.example.com".to_string());
        node.alpn = vec!["h2".to_string(), "http/1.1".to_string()];
        node.fingerprint = Some("chrome".to_string());
        node.allow_insecure = Some(false);
        round_trip(&node);
    }

    #[test]
    fn test_vless_round_trip() {
        let mut node = Proxy::new(ProxyType::Vless, "SG Reality", "sg.example.com", 443);
        node.user_id = Some("b831381d-6324-4d53-ad4f-8cda48b30811".to_string());
        node.flow = Some("xtls-rprx-vision".to_string());
        node.transfer_protocol = Some("grpc".to_string());
        node.path = Some("svc".to_string());
        node.tls_secure = true;
        node.sni = Some("www.microsoft.com".to_string());
        node.fingerprint = Some("chrome".to_string());
        node.public_key = Some("PUBKEY".to_string());
        node.short_id = Some("6ba85179".to_string());
        round_trip(&node);

        let mut plain = Proxy::new(ProxyType::Vless, "plain", "1.2.3.4", 80);
        plain.user_id = Some("id".to_string());
        plain.transfer_protocol = Some("ws".to_string());
        plain.path = Some("/a b".to_string());
        round_trip(&plain);
    }

    #[test]
    fn test_trojan_round_trip() {
        let mut node = Proxy::new(ProxyType::Trojan, "US+1", "us.example.com", 8443);
        node.password = Some("p@ss word+".to_string());
        node.tls_secure = true;
        node.sni = Some("cdn.example.com".to_string());
        node.allow_insecure = Some(true);
        node.transfer_protocol = Some("ws".to_string());
        node.host = Some("cdn.example.com".to_string());
        node.path = Some("/ws".to_string());
        round_trip(&node);
    }

    #[test]
    fn test_hysteria2_round_trip() {
        let mut node = Proxy::new(ProxyType::Hysteria2, "HY2", "hy.example.com", 443);
        node.password = Some("user:pass".to_string());
        node.sni = Some("real.example.com".to_string());
        node.allow_insecure = Some(false);
        node.obfs = Some("salamander".to_string());
        node.obfs_param = Some("gawr gura".to_string());
        node.alpn = vec!["h3".to_string()];
        round_trip(&node);
    }

    #[test]
    fn test_hysteria2_uses_canonical_scheme() {
        let nodes = parse_nodes("hy2://pw@hy.example.com:443#x");
        assert!(proxy_to_uri(&nodes[0]).starts_with("hysteria2://pw@hy.example.com:443/"));
    }
}
