use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;

fn is_empty_option_string(s: &Option<String>) -> bool {
    s.as_deref().map_or(true, str::is_empty)
}

/// Common proxy options that can be used across different proxy types
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommonProxyOptions {
    pub name: String,
    pub server: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udp: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_cert_verify: Option<bool>,
    #[serde(skip_serializing_if = "is_empty_option_string")]
    pub client_fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alpn: Vec<String>,
    /// Upstream group the proxy dials through
    #[serde(skip_serializing_if = "is_empty_option_string")]
    pub dialer_proxy: Option<String>,
}

impl CommonProxyOptions {
    /// Create a new CommonProxyOptions with default values
    pub fn new(name: String, server: String, port: u16) -> Self {
        Self {
            name,
            server,
            port,
            udp: None,
            skip_cert_verify: None,
            client_fingerprint: None,
            alpn: Vec::new(),
            dialer_proxy: None,
        }
    }

    /// Create a builder for CommonProxyOptions
    pub fn builder(name: String, server: String, port: u16) -> CommonProxyOptionsBuilder {
        CommonProxyOptionsBuilder {
            common: Self::new(name, server, port),
        }
    }
}

/// Builder for CommonProxyOptions
pub struct CommonProxyOptionsBuilder {
    common: CommonProxyOptions,
}

impl CommonProxyOptionsBuilder {
    pub fn udp(mut self, value: Option<bool>) -> Self {
        self.common.udp = value;
        self
    }

    pub fn skip_cert_verify(mut self, value: Option<bool>) -> Self {
        self.common.skip_cert_verify = value;
        self
    }

    pub fn client_fingerprint(mut self, value: Option<String>) -> Self {
        self.common.client_fingerprint = value;
        self
    }

    pub fn alpn(mut self, value: Vec<String>) -> Self {
        self.common.alpn = value;
        self
    }

    pub fn dialer_proxy(mut self, value: Option<String>) -> Self {
        self.common.dialer_proxy = value;
        self
    }

    pub fn build(self) -> CommonProxyOptions {
        self.common
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WsOpts {
    #[serde(skip_serializing_if = "is_empty_option_string")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrpcOpts {
    #[serde(rename = "grpc-service-name")]
    pub grpc_service_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealityOpts {
    #[serde(rename = "public-key")]
    pub public_key: String,
    #[serde(rename = "short-id", skip_serializing_if = "is_empty_option_string")]
    pub short_id: Option<String>,
}

/// Represents a single proxy in Clash configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ClashProxy {
    #[serde(rename = "ss")]
    Shadowsocks {
        #[serde(flatten)]
        common: CommonProxyOptions,
        cipher: String,
        password: String,
        #[serde(skip_serializing_if = "is_empty_option_string")]
        plugin: Option<String>,
        #[serde(rename = "plugin-opts", skip_serializing_if = "BTreeMap::is_empty")]
        plugin_opts: BTreeMap<String, YamlValue>,
    },
    #[serde(rename = "vmess")]
    VMess {
        #[serde(flatten)]
        common: CommonProxyOptions,
        uuid: String,
        #[serde(rename = "alterId")]
        alter_id: u16,
        cipher: String,
        #[serde(skip_serializing_if = "is_empty_option_string")]
        network: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tls: Option<bool>,
        #[serde(skip_serializing_if = "is_empty_option_string")]
        servername: Option<String>,
        #[serde(rename = "ws-opts", skip_serializing_if = "Option::is_none")]
        ws_opts: Option<WsOpts>,
        #[serde(rename = "grpc-opts", skip_serializing_if = "Option::is_none")]
        grpc_opts: Option<GrpcOpts>,
    },
    #[serde(rename = "vless")]
    Vless {
        #[serde(flatten)]
        common: CommonProxyOptions,
        uuid: String,
        #[serde(skip_serializing_if = "is_empty_option_string")]
        flow: Option<String>,
        #[serde(skip_serializing_if = "is_empty_option_string")]
        network: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tls: Option<bool>,
        #[serde(skip_serializing_if = "is_empty_option_string")]
        servername: Option<String>,
        #[serde(rename = "reality-opts", skip_serializing_if = "Option::is_none")]
        reality_opts: Option<RealityOpts>,
        #[serde(rename = "ws-opts", skip_serializing_if = "Option::is_none")]
        ws_opts: Option<WsOpts>,
        #[serde(rename = "grpc-opts", skip_serializing_if = "Option::is_none")]
        grpc_opts: Option<GrpcOpts>,
    },
    #[serde(rename = "trojan")]
    Trojan {
        #[serde(flatten)]
        common: CommonProxyOptions,
        password: String,
        #[serde(skip_serializing_if = "is_empty_option_string")]
        sni: Option<String>,
        #[serde(skip_serializing_if = "is_empty_option_string")]
        network: Option<String>,
        #[serde(rename = "ws-opts", skip_serializing_if = "Option::is_none")]
        ws_opts: Option<WsOpts>,
        #[serde(rename = "grpc-opts", skip_serializing_if = "Option::is_none")]
        grpc_opts: Option<GrpcOpts>,
    },
    #[serde(rename = "hysteria2")]
    Hysteria2 {
        #[serde(flatten)]
        common: CommonProxyOptions,
        password: String,
        #[serde(skip_serializing_if = "is_empty_option_string")]
        obfs: Option<String>,
        #[serde(rename = "obfs-password", skip_serializing_if = "is_empty_option_string")]
        obfs_password: Option<String>,
        #[serde(skip_serializing_if = "is_empty_option_string")]
        sni: Option<String>,
        /// Certificate pin
        #[serde(skip_serializing_if = "is_empty_option_string")]
        fingerprint: Option<String>,
    },
}

impl ClashProxy {
    /// Options shared by every proxy type
    pub fn common(&self) -> &CommonProxyOptions {
        match self {
            ClashProxy::Shadowsocks { common, .. } => common,
            ClashProxy::VMess { common, .. } => common,
            ClashProxy::Vless { common, .. } => common,
            ClashProxy::Trojan { common, .. } => common,
            ClashProxy::Hysteria2 { common, .. } => common,
        }
    }
}

/// Represents a proxy group in Clash configuration
///
/// Group types are not interpreted; keys other than `name`, `type` and `proxies`
/// are passed through in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClashProxyGroup {
    pub name: String,
    #[serde(rename = "type")]
    pub group_type: String,
    pub proxies: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

/// The `proxies:` section of a document
#[derive(Debug, Serialize)]
pub struct ClashProxiesSection<'a> {
    pub proxies: &'a [ClashProxy],
}

/// The `proxy-groups:` section of a document
#[derive(Debug, Serialize)]
pub struct ClashProxyGroupsSection<'a> {
    #[serde(rename = "proxy-groups")]
    pub proxy_groups: &'a [ClashProxyGroup],
}
