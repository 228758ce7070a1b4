use std::collections::BTreeMap;

use log::debug;
use serde::Deserialize;
use serde_yaml::Value as YamlValue;

use super::proxy_types::{
    ClashProxyYamlInput, CommonInput, Hysteria2Input, ShadowsocksInput, TransportInput,
    TrojanInput, VMessInput, VlessInput,
};
use crate::models::{non_empty, Proxy, ProxyType};

/// Top level of a Clash document; everything but the proxy list is ignored
#[derive(Debug, Deserialize)]
struct ClashYamlInput {
    #[serde(default)]
    proxies: Option<Vec<YamlValue>>,
}

/// Parse the `proxies:` list of a Clash document.
///
/// Entries are decoded one by one so a malformed or unsupported entry only loses itself.
/// Fails only when the document as a whole is not YAML.
pub fn parse_clash_yaml(content: &str) -> Result<Vec<Proxy>, String> {
    let clash_input: ClashYamlInput = match serde_yaml::from_str(content) {
        Ok(input) => input,
        Err(e) => return Err(format!("Failed to parse Clash YAML: {}", e)),
    };

    let mut proxies = Vec::new();
    for (index, entry) in clash_input.proxies.unwrap_or_default().into_iter().enumerate() {
        let mut proxy: Proxy = match serde_yaml::from_value::<ClashProxyYamlInput>(entry) {
            Ok(ClashProxyYamlInput::Shadowsocks(ss)) => ss.into(),
            Ok(ClashProxyYamlInput::VMess(vmess)) => vmess.into(),
            Ok(ClashProxyYamlInput::Vless(vless)) => vless.into(),
            Ok(ClashProxyYamlInput::Trojan(trojan)) => trojan.into(),
            Ok(ClashProxyYamlInput::Hysteria2(hysteria2)) => hysteria2.into(),
            Ok(ClashProxyYamlInput::Unknown) => {
                debug!("Skipping proxy #{}: unsupported type", index);
                continue;
            }
            Err(e) => {
                debug!("Skipping proxy #{}: {}", index, e);
                continue;
            }
        };
        if proxy.hostname.is_empty() || proxy.port == 0 {
            debug!("Skipping proxy #{}: missing server or port", index);
            continue;
        }
        proxy.ensure_remark();
        proxies.push(proxy);
    }

    Ok(proxies)
}

fn new_proxy(proxy_type: ProxyType, common: &CommonInput) -> Proxy {
    let mut proxy = Proxy::new(
        proxy_type,
        common.name.trim(),
        common.server.trim(),
        common.port,
    );
    proxy.udp = common.udp;
    proxy.allow_insecure = common.skip_cert_verify;
    proxy.alpn = common.alpn.clone().unwrap_or_default();
    proxy
}

fn apply_transport(transport: &TransportInput, proxy: &mut Proxy) {
    proxy.transfer_protocol = non_empty(transport.network.clone());
    match proxy.transfer_protocol.as_deref() {
        Some("grpc") => {
            proxy.path = transport
                .grpc_opts
                .as_ref()
                .and_then(|grpc| non_empty(grpc.grpc_service_name.clone()));
        }
        _ => {
            if let Some(ws) = &transport.ws_opts {
                proxy.path = non_empty(ws.path.clone());
                proxy.host = non_empty(ws.host());
            }
        }
    }
}

/// Render a YAML scalar the way it would appear in a plugin option string
fn scalar_to_string(value: &YamlValue) -> Option<String> {
    match value {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Flatten Clash `plugin-opts` into a SIP003 plugin name and option string.
fn plugin_from_opts(
    plugin: &str,
    opts: Option<&BTreeMap<String, YamlValue>>,
) -> (String, Option<String>) {
    let opts = match opts {
        Some(opts) => opts,
        None => return (plugin.to_string(), None),
    };

    if plugin == "obfs" {
        let mut parts = Vec::new();
        if let Some(mode) = opts.get("mode").and_then(scalar_to_string) {
            parts.push(format!("obfs={}", mode));
        }
        if let Some(host) = opts.get("host").and_then(scalar_to_string) {
            parts.push(format!("obfs-host={}", host));
        }
        return ("obfs-local".to_string(), non_empty(Some(parts.join(";"))));
    }

    let parts: Vec<String> = opts
        .iter()
        .filter_map(|(key, value)| match value {
            YamlValue::Bool(true) => Some(key.clone()),
            YamlValue::Bool(false) => None,
            other => scalar_to_string(other).map(|v| format!("{}={}", key, v)),
        })
        .collect();
    (plugin.to_string(), non_empty(Some(parts.join(";"))))
}

impl From<ShadowsocksInput> for Proxy {
    fn from(ss: ShadowsocksInput) -> Self {
        let mut proxy = new_proxy(ProxyType::Shadowsocks, &ss.common);
        proxy.encrypt_method = Some(ss.cipher);
        proxy.password = Some(ss.password);
        if let Some(plugin) = non_empty(ss.plugin) {
            let (plugin, option) = plugin_from_opts(&plugin, ss.plugin_opts.as_ref());
            proxy.plugin = Some(plugin);
            proxy.plugin_option = option;
        }
        proxy
    }
}

impl From<VMessInput> for Proxy {
    fn from(vmess: VMessInput) -> Self {
        let mut proxy = new_proxy(ProxyType::VMess, &vmess.common);
        proxy.user_id = Some(vmess.uuid);
        proxy.alter_id = vmess.alter_id;
        proxy.encrypt_method =
            Some(non_empty(vmess.cipher).unwrap_or_else(|| "auto".to_string()));
        apply_transport(&vmess.transport, &mut proxy);
        proxy.transfer_protocol.get_or_insert_with(|| "tcp".to_string());
        proxy.tls_secure = vmess.tls.unwrap_or(false);
        proxy.sni = non_empty(vmess.servername).or(non_empty(vmess.sni));
        proxy.fingerprint = non_empty(vmess.common.client_fingerprint);
        proxy
    }
}

impl From<VlessInput> for Proxy {
    fn from(vless: VlessInput) -> Self {
        let mut proxy = new_proxy(ProxyType::Vless, &vless.common);
        proxy.user_id = Some(vless.uuid);
        proxy.flow = non_empty(vless.flow);
        apply_transport(&vless.transport, &mut proxy);
        proxy.tls_secure = vless.tls.unwrap_or(false);
        proxy.sni = non_empty(vless.servername).or(non_empty(vless.sni));
        proxy.fingerprint = non_empty(vless.common.client_fingerprint);
        if let Some(reality) = vless.reality_opts {
            proxy.public_key = non_empty(reality.public_key);
            proxy.short_id = non_empty(reality.short_id);
            if proxy.public_key.is_some() {
                proxy.tls_secure = true;
            }
        }
        proxy
    }
}

impl From<TrojanInput> for Proxy {
    fn from(trojan: TrojanInput) -> Self {
        let mut proxy = new_proxy(ProxyType::Trojan, &trojan.common);
        proxy.password = Some(trojan.password);
        proxy.tls_secure = true;
        proxy.sni = non_empty(trojan.sni);
        apply_transport(&trojan.transport, &mut proxy);
        proxy.fingerprint = non_empty(trojan.common.client_fingerprint);
        proxy
    }
}

impl From<Hysteria2Input> for Proxy {
    fn from(hysteria2: Hysteria2Input) -> Self {
        let mut proxy = new_proxy(ProxyType::Hysteria2, &hysteria2.common);
        proxy.password = non_empty(Some(hysteria2.password));
        proxy.sni = non_empty(hysteria2.sni);
        proxy.obfs = non_empty(hysteria2.obfs);
        proxy.obfs_param = non_empty(hysteria2.obfs_password);
        proxy.fingerprint = non_empty(hysteria2.fingerprint);
        proxy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
port: 7890
proxies:
  - name: "HK 01"
    type: ss
    server: hk.example.com
    port: 8388
    cipher: aes-256-gcm
    password: secret
    plugin: obfs
    plugin-opts:
      mode: http
      host: bing.com
  - name: broken
    type: vmess
    server: broken.example.com
  - name: legacy
    type: ssr
    server: ssr.example.com
    port: 443
  - name: JP
    type: vmess
    server: jp.example.com
    port: "443"
    uuid: b831381d-6324-4d53-ad4f-8cda48b30811
    alterId: 0
    cipher: auto
    tls: true
    servername: jp.example.com
    network: ws
    ws-opts:
      path: /ray
      headers:
        Host: cdn.example.com
  - type: hy2
    server: hy.example.com
    port: 443
    password: pw
    alpn: h3
rules:
  - MATCH,DIRECT
"#;

    #[test]
    fn test_parse_document() {
        let proxies = parse_clash_yaml(DOC).unwrap();
        assert_eq!(proxies.len(), 3);

        let ss = &proxies[0];
        assert_eq!(ss.proxy_type, ProxyType::Shadowsocks);
        assert_eq!(ss.remark, "HK 01");
        assert_eq!(ss.plugin.as_deref(), Some("obfs-local"));
        assert_eq!(
            ss.plugin_option.as_deref(),
            Some("obfs=http;obfs-host=bing.com")
        );

        let vmess = &proxies[1];
        assert_eq!(vmess.proxy_type, ProxyType::VMess);
        assert_eq!(vmess.port, 443);
        assert!(vmess.tls_secure);
        assert_eq!(vmess.sni.as_deref(), Some("jp.example.com"));
        assert_eq!(vmess.transfer_protocol.as_deref(), Some("ws"));
        assert_eq!(vmess.path.as_deref(), Some("/ray"));
        assert_eq!(vmess.host.as_deref(), Some("cdn.example.com"));

        let hy2 = &proxies[2];
        assert_eq!(hy2.proxy_type, ProxyType::Hysteria2);
        assert_eq!(hy2.remark, "hy.example.com:443");
        assert_eq!(hy2.alpn, vec!["h3".to_string()]);
    }

    #[test]
    fn test_vless_reality_and_grpc() {
        let doc = r#"
proxies:
  - name: R
    type: vless
    server: r.example.com
    port: 443
    uuid: id
    flow: xtls-rprx-vision
    network: grpc
    grpc-opts:
      grpc-service-name: svc
    reality-opts:
      public-key: pk
      short-id: ab
    client-fingerprint: chrome
"#;
        let proxies = parse_clash_yaml(doc).unwrap();
        assert_eq!(proxies.len(), 1);
        let vless = &proxies[0];
        assert!(vless.tls_secure);
        assert_eq!(vless.public_key.as_deref(), Some("pk"));
        assert_eq!(vless.short_id.as_deref(), Some("ab"));
        assert_eq!(vless.path.as_deref(), Some("svc"));
        assert_eq!(vless.fingerprint.as_deref(), Some("chrome"));
    }

    #[test]
    fn test_invalid_documents() {
        assert!(parse_clash_yaml("proxies: [unclosed").is_err());
        assert!(parse_clash_yaml("proxies:").unwrap().is_empty());
        assert!(parse_clash_yaml("proxies:\n  - just a string\n").unwrap().is_empty());
    }
}
