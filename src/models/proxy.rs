//! Proxy model definitions
//!
//! Contains the core data structures for proxy nodes.

use std::fmt;

/// Represents the type of a proxy.
/// This is the canonical enum used for proxy type identification across the application.
/// The set is closed: a new protocol is a new variant with its own link grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyType {
    Shadowsocks,
    VMess,
    Vless,
    Trojan,
    Hysteria2,
}

impl ProxyType {
    /// Human-readable name of the proxy type.
    pub fn as_str(self) -> &'static str {
        match self {
            ProxyType::Shadowsocks => "SS",
            ProxyType::VMess => "VMess",
            ProxyType::Vless => "Vless",
            ProxyType::Trojan => "Trojan",
            ProxyType::Hysteria2 => "Hysteria2",
        }
    }

    /// Canonical link scheme, without the `://` separator.
    pub fn scheme(self) -> &'static str {
        match self {
            ProxyType::Shadowsocks => "ss",
            ProxyType::VMess => "vmess",
            ProxyType::Vless => "vless",
            ProxyType::Trojan => "trojan",
            ProxyType::Hysteria2 => "hysteria2",
        }
    }

    /// Value of the `type` key in a Clash proxy entry.
    pub fn clash_type(self) -> &'static str {
        match self {
            ProxyType::Shadowsocks => "ss",
            ProxyType::VMess => "vmess",
            ProxyType::Vless => "vless",
            ProxyType::Trojan => "trojan",
            ProxyType::Hysteria2 => "hysteria2",
        }
    }

    /// Match the scheme prefix of a link against the supported protocols.
    ///
    /// `hy2://` is accepted as an alias of `hysteria2://`.
    pub fn from_link(link: &str) -> Option<Self> {
        let (scheme, _) = link.split_once("://")?;
        match scheme.to_ascii_lowercase().as_str() {
            "ss" => Some(ProxyType::Shadowsocks),
            "vmess" => Some(ProxyType::VMess),
            "vless" => Some(ProxyType::Vless),
            "trojan" => Some(ProxyType::Trojan),
            "hysteria2" | "hy2" => Some(ProxyType::Hysteria2),
            _ => None,
        }
    }
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Link prefixes recognised by the parser.
pub const SUPPORTED_SCHEMES: [&str; 6] = [
    "ss://",
    "vmess://",
    "vless://",
    "trojan://",
    "hysteria2://",
    "hy2://",
];

/// Represents one proxy endpoint.
///
/// Nodes are rebuilt from source content on every render and never persisted.
/// Fields that do not apply to a protocol stay `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proxy {
    pub proxy_type: ProxyType,
    pub remark: String,
    pub hostname: String,
    pub port: u16,

    pub password: Option<String>,
    /// Shadowsocks method or VMess cipher
    pub encrypt_method: Option<String>,
    pub plugin: Option<String>,
    /// Plugin options in the format of `key1=value1;key2=value2`
    pub plugin_option: Option<String>,
    /// VMess / VLESS uuid
    pub user_id: Option<String>,
    pub alter_id: u16,
    pub flow: Option<String>,
    /// Transport network (`tcp`, `ws`, `grpc`, ...)
    pub transfer_protocol: Option<String>,
    /// VMess header type
    pub fake_type: Option<String>,
    pub host: Option<String>,
    /// Transport path, or the service name for gRPC
    pub path: Option<String>,

    pub tls_secure: bool,
    pub sni: Option<String>,
    pub allow_insecure: Option<bool>,
    pub fingerprint: Option<String>,
    pub alpn: Vec<String>,
    /// REALITY public key
    pub public_key: Option<String>,
    /// REALITY short id
    pub short_id: Option<String>,

    pub obfs: Option<String>,
    pub obfs_param: Option<String>,
    pub udp: Option<bool>,

    /// Upstream group this node dials through. Only set while rendering.
    pub underlying_proxy: Option<String>,
}

impl Proxy {
    /// Create a node with only the common fields set.
    pub fn new(
        proxy_type: ProxyType,
        remark: impl Into<String>,
        hostname: impl Into<String>,
        port: u16,
    ) -> Self {
        Proxy {
            proxy_type,
            remark: remark.into(),
            hostname: hostname.into(),
            port,
            password: None,
            encrypt_method: None,
            plugin: None,
            plugin_option: None,
            user_id: None,
            alter_id: 0,
            flow: None,
            transfer_protocol: None,
            fake_type: None,
            host: None,
            path: None,
            tls_secure: false,
            sni: None,
            allow_insecure: None,
            fingerprint: None,
            alpn: Vec::new(),
            public_key: None,
            short_id: None,
            obfs: None,
            obfs_param: None,
            udp: None,
            underlying_proxy: None,
        }
    }

    /// Fill an empty remark with `host:port`.
    pub fn ensure_remark(&mut self) {
        if self.remark.trim().is_empty() {
            self.remark = default_remark(&self.hostname, self.port);
        }
    }

    /// Whether this node dials through an upstream group.
    pub fn is_chained(&self) -> bool {
        self.underlying_proxy.is_some()
    }
}

/// Synthesized display name for nodes without one.
pub fn default_remark(hostname: &str, port: u16) -> String {
    format!("{}:{}", hostname, port)
}

/// Keep an option only if it carries a non-empty string.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
