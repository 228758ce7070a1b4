use std::collections::BTreeMap;

use serde::Deserialize;
use serde_yaml::Value;

use crate::utils::deserialize::{
    deserialize_port, deserialize_string_list, deserialize_u16_lenient,
};

/// Fields every Clash proxy entry may carry
#[derive(Debug, Clone, Deserialize)]
pub struct CommonInput {
    #[serde(default)]
    pub name: String,
    pub server: String,
    #[serde(deserialize_with = "deserialize_port")]
    pub port: u16,
    #[serde(default)]
    pub udp: Option<bool>,
    #[serde(rename = "skip-cert-verify", default)]
    pub skip_cert_verify: Option<bool>,
    #[serde(rename = "client-fingerprint", default)]
    pub client_fingerprint: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub alpn: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WsOptsInput {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
}

impl WsOptsInput {
    /// `Host` header, matched case-insensitively
    pub fn host(&self) -> Option<String> {
        self.headers.as_ref().and_then(|headers| {
            headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("host"))
                .map(|(_, v)| v.clone())
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GrpcOptsInput {
    #[serde(rename = "grpc-service-name", default)]
    pub grpc_service_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RealityOptsInput {
    #[serde(rename = "public-key", default)]
    pub public_key: Option<String>,
    #[serde(rename = "short-id", default)]
    pub short_id: Option<String>,
}

/// Transport keys shared by the V2Ray family and trojan
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransportInput {
    #[serde(default)]
    pub network: Option<String>,
    #[serde(rename = "ws-opts", default)]
    pub ws_opts: Option<WsOptsInput>,
    #[serde(rename = "grpc-opts", default)]
    pub grpc_opts: Option<GrpcOptsInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShadowsocksInput {
    #[serde(flatten)]
    pub common: CommonInput,
    pub cipher: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub plugin: Option<String>,
    #[serde(rename = "plugin-opts", default)]
    pub plugin_opts: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VMessInput {
    #[serde(flatten)]
    pub common: CommonInput,
    #[serde(flatten)]
    pub transport: TransportInput,
    pub uuid: String,
    #[serde(rename = "alterId", default, deserialize_with = "deserialize_u16_lenient")]
    pub alter_id: u16,
    #[serde(default)]
    pub cipher: Option<String>,
    #[serde(default)]
    pub tls: Option<bool>,
    #[serde(default)]
    pub servername: Option<String>,
    #[serde(default)]
    pub sni: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VlessInput {
    #[serde(flatten)]
    pub common: CommonInput,
    #[serde(flatten)]
    pub transport: TransportInput,
    pub uuid: String,
    #[serde(default)]
    pub flow: Option<String>,
    #[serde(default)]
    pub tls: Option<bool>,
    #[serde(default)]
    pub servername: Option<String>,
    #[serde(default)]
    pub sni: Option<String>,
    #[serde(rename = "reality-opts", default)]
    pub reality_opts: Option<RealityOptsInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrojanInput {
    #[serde(flatten)]
    pub common: CommonInput,
    #[serde(flatten)]
    pub transport: TransportInput,
    pub password: String,
    #[serde(default)]
    pub sni: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hysteria2Input {
    #[serde(flatten)]
    pub common: CommonInput,
    #[serde(default, alias = "auth")]
    pub password: String,
    #[serde(default)]
    pub obfs: Option<String>,
    #[serde(rename = "obfs-password", default)]
    pub obfs_password: Option<String>,
    #[serde(default)]
    pub sni: Option<String>,
    /// Certificate pin
    #[serde(default)]
    pub fingerprint: Option<String>,
}

/// One entry of a Clash `proxies:` list, dispatched on its `type` key.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClashProxyYamlInput {
    #[serde(rename = "ss")]
    Shadowsocks(ShadowsocksInput),
    #[serde(rename = "vmess")]
    VMess(VMessInput),
    #[serde(rename = "vless")]
    Vless(VlessInput),
    #[serde(rename = "trojan")]
    Trojan(TrojanInput),
    #[serde(rename = "hysteria2", alias = "hy2")]
    Hysteria2(Hysteria2Input),
    #[serde(other)]
    Unknown,
}
