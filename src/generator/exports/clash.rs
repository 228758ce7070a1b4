use std::collections::BTreeMap;

use serde_yaml::Value as YamlValue;

use crate::generator::yaml::clash_output::{
    ClashProxiesSection, ClashProxy, ClashProxyGroup, ClashProxyGroupsSection,
    CommonProxyOptions, GrpcOpts, RealityOpts, WsOpts,
};
use crate::models::{Proxy, ProxyType};

/// Convert a node to its Clash proxy entry.
///
/// A chained node carries its upstream group as `dialer-proxy`.
pub fn proxy_to_clash(node: &Proxy) -> ClashProxy {
    let mut common = CommonProxyOptions::builder(
        node.remark.clone(),
        node.hostname.clone(),
        node.port,
    )
    .udp(node.udp)
    .skip_cert_verify(node.allow_insecure)
    .alpn(node.alpn.clone())
    .dialer_proxy(node.underlying_proxy.clone());
    if node.proxy_type != ProxyType::Hysteria2 {
        common = common.client_fingerprint(node.fingerprint.clone());
    }
    let common = common.build();

    match node.proxy_type {
        ProxyType::Shadowsocks => {
            let (plugin, plugin_opts) = plugin_to_clash(node);
            ClashProxy::Shadowsocks {
                common,
                cipher: node.encrypt_method.clone().unwrap_or_default(),
                password: node.password.clone().unwrap_or_default(),
                plugin,
                plugin_opts,
            }
        }
        ProxyType::VMess => ClashProxy::VMess {
            common,
            uuid: node.user_id.clone().unwrap_or_default(),
            alter_id: node.alter_id,
            cipher: node
                .encrypt_method
                .clone()
                .unwrap_or_else(|| "auto".to_string()),
            network: node.transfer_protocol.clone(),
            tls: Some(node.tls_secure),
            servername: node.sni.clone(),
            ws_opts: ws_opts(node),
            grpc_opts: grpc_opts(node),
        },
        ProxyType::Vless => ClashProxy::Vless {
            common,
            uuid: node.user_id.clone().unwrap_or_default(),
            flow: node.flow.clone(),
            network: node.transfer_protocol.clone(),
            tls: Some(node.tls_secure),
            servername: node.sni.clone(),
            reality_opts: node.public_key.as_ref().map(|public_key| RealityOpts {
                public_key: public_key.clone(),
                short_id: node.short_id.clone(),
            }),
            ws_opts: ws_opts(node),
            grpc_opts: grpc_opts(node),
        },
        ProxyType::Trojan => ClashProxy::Trojan {
            common,
            password: node.password.clone().unwrap_or_default(),
            sni: node.sni.clone(),
            network: node.transfer_protocol.clone(),
            ws_opts: ws_opts(node),
            grpc_opts: grpc_opts(node),
        },
        ProxyType::Hysteria2 => ClashProxy::Hysteria2 {
            common,
            password: node.password.clone().unwrap_or_default(),
            obfs: node.obfs.clone(),
            obfs_password: node.obfs_param.clone(),
            sni: node.sni.clone(),
            fingerprint: node.fingerprint.clone(),
        },
    }
}

fn ws_opts(node: &Proxy) -> Option<WsOpts> {
    if node.transfer_protocol.as_deref() != Some("ws") {
        return None;
    }
    let mut headers = BTreeMap::new();
    if let Some(host) = node.host.as_ref().filter(|h| !h.is_empty()) {
        headers.insert("Host".to_string(), host.clone());
    }
    Some(WsOpts {
        path: node.path.clone(),
        headers,
    })
}

fn grpc_opts(node: &Proxy) -> Option<GrpcOpts> {
    if node.transfer_protocol.as_deref() != Some("grpc") {
        return None;
    }
    node.path.as_ref().map(|service| GrpcOpts {
        grpc_service_name: service.clone(),
    })
}

/// Split a SIP003 option string into Clash `plugin-opts`.
///
/// `obfs-local`/`simple-obfs` become Clash's `obfs` plugin with `mode` and `host`;
/// other plugins keep their name, `key=value` pairs become strings and bare keys `true`.
fn plugin_to_clash(node: &Proxy) -> (Option<String>, BTreeMap<String, YamlValue>) {
    let plugin = match node.plugin.as_deref().filter(|p| !p.is_empty()) {
        Some(plugin) => plugin,
        None => return (None, BTreeMap::new()),
    };
    let is_obfs = matches!(plugin, "obfs-local" | "simple-obfs");

    let mut opts = BTreeMap::new();
    for item in node.plugin_option.as_deref().unwrap_or_default().split(';') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let (key, value) = match item.split_once('=') {
            Some((key, value)) => (key.trim(), YamlValue::String(value.trim().to_string())),
            None => (item, YamlValue::Bool(true)),
        };
        let key = match (is_obfs, key) {
            (true, "obfs") => "mode",
            (true, "obfs-host") => "host",
            (_, other) => other,
        };
        opts.insert(key.to_string(), value);
    }

    let name = if is_obfs { "obfs" } else { plugin };
    (Some(name.to_string()), opts)
}

/// Serialize the `proxies:` section of a document.
pub fn proxies_to_yaml(proxies: &[ClashProxy]) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(&ClashProxiesSection { proxies })
}

/// Serialize the `proxy-groups:` section of a document.
pub fn groups_to_yaml(groups: &[ClashProxyGroup]) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(&ClashProxyGroupsSection {
        proxy_groups: groups,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::yaml::clash::parse_clash_yaml;

    fn trojan() -> Proxy {
        let mut node = Proxy::new(ProxyType::Trojan, "US", "us.example.com", 443);
        node.password = Some("pw".to_string());
        node.tls_secure = true;
        node.sni = Some("cdn.example.com".to_string());
        node.transfer_protocol = Some("ws".to_string());
        node.host = Some("cdn.example.com".to_string());
        node.path = Some("/ws".to_string());
        node
    }

    #[test]
    fn test_dialer_proxy_only_when_chained() {
        let mut node = trojan();
        assert_eq!(proxy_to_clash(&node).common().dialer_proxy, None);

        node.underlying_proxy = Some("Relay".to_string());
        let yaml = proxies_to_yaml(&[proxy_to_clash(&node)]).unwrap();
        assert!(yaml.contains("dialer-proxy: Relay"), "{}", yaml);
        assert!(yaml.contains("type: trojan"));
        assert!(yaml.contains("sni: cdn.example.com"));
        assert!(yaml.contains("ws-opts:"));
    }

    #[test]
    fn test_vless_uses_servername_and_reality() {
        let mut node = Proxy::new(ProxyType::Vless, "R", "r.example.com", 443);
        node.user_id = Some("id".to_string());
        node.tls_secure = true;
        node.sni = Some("www.microsoft.com".to_string());
        node.public_key = Some("pk".to_string());
        node.short_id = Some("ab".to_string());
        let yaml = proxies_to_yaml(&[proxy_to_clash(&node)]).unwrap();
        assert!(yaml.contains("servername: www.microsoft.com"), "{}", yaml);
        assert!(yaml.contains("public-key: pk"));
        assert!(yaml.contains("short-id: ab"));
        assert!(!yaml.contains("sni:"));
    }

    #[test]
    fn test_obfs_plugin_mapping() {
        let mut node = Proxy::new(ProxyType::Shadowsocks, "SS", "ss.example.com", 8388);
        node.encrypt_method = Some("aes-256-gcm".to_string());
        node.password = Some("pw".to_string());
        node.plugin = Some("obfs-local".to_string());
        node.plugin_option = Some("obfs=http;obfs-host=bing.com".to_string());

        match proxy_to_clash(&node) {
            ClashProxy::Shadowsocks {
                plugin,
                plugin_opts,
                ..
            } => {
                assert_eq!(plugin.as_deref(), Some("obfs"));
                assert_eq!(
                    plugin_opts.get("mode"),
                    Some(&YamlValue::String("http".to_string()))
                );
                assert_eq!(
                    plugin_opts.get("host"),
                    Some(&YamlValue::String("bing.com".to_string()))
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_section_reads_back() {
        let nodes = vec![trojan()];
        let proxies: Vec<ClashProxy> = nodes.iter().map(proxy_to_clash).collect();
        let yaml = proxies_to_yaml(&proxies).unwrap();
        let parsed = parse_clash_yaml(&yaml).unwrap();
        assert_eq!(parsed, nodes);
    }
}
