use crate::models::{Proxy, ProxyType};
use crate::utils::base64::try_base64_decode;
use crate::utils::url::{split_host_port, url_decode};

/// Parse a Shadowsocks link into a Proxy object
///
/// Accepts the SIP002 form `ss://BASE64URL(method:password)@host:port/?plugin=...#name`,
/// the same form with a plain percent-encoded `method:password`, and the legacy form
/// `ss://BASE64(method:password@host:port)#name`.
pub fn explode_ss(ss: &str) -> Option<Proxy> {
    let content = ss.get(5..).filter(|_| ss[..5].eq_ignore_ascii_case("ss://"))?;
    let content = content.replace("/?", "?");

    // Extract fragment (remark) if present
    let (content, remark) = match content.split_once('#') {
        Some((body, fragment)) => (body.to_string(), url_decode(fragment)),
        None => (content, String::new()),
    };

    // Extract plugin from the query
    let (content, query) = match content.split_once('?') {
        Some((body, query)) => (body.to_string(), Some(query.to_string())),
        None => (content, None),
    };
    let mut plugin = None;
    let mut plugin_option = None;
    if let Some(query) = query {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if key == "plugin" && !value.is_empty() {
                match value.split_once(';') {
                    Some((name, opts)) => {
                        plugin = Some(name.to_string());
                        if !opts.is_empty() {
                            plugin_option = Some(opts.to_string());
                        }
                    }
                    None => plugin = Some(value.to_string()),
                }
            }
        }
    }

    let (method, password, authority) = match content.rsplit_once('@') {
        // SIP002 format
        Some((secret, authority)) => {
            let (method, password) = decode_secret(secret)?;
            (method, password, authority.trim_end_matches('/').to_string())
        }
        // Legacy format, everything is base64 encoded
        None => {
            let decoded = try_base64_decode(&content)?;
            let (secret, authority) = decoded.rsplit_once('@')?;
            let (method, password) = secret.split_once(':')?;
            (method.to_string(), password.to_string(), authority.to_string())
        }
    };

    if method.is_empty() {
        return None;
    }
    let (server, port) = split_host_port(&authority)?;

    let mut node = Proxy::new(ProxyType::Shadowsocks, remark, server, port);
    node.encrypt_method = Some(method);
    node.password = Some(password);
    node.plugin = plugin;
    node.plugin_option = plugin_option;
    Some(node)
}

/// Decode the user-info of a SIP002 link into method and password.
fn decode_secret(secret: &str) -> Option<(String, String)> {
    let plain = url_decode(secret);
    // Base64 user-info never contains ':' itself, a decoded one always does
    if !plain.contains(':') {
        let decoded = try_base64_decode(&plain)?;
        let (method, password) = decoded.split_once(':')?;
        return Some((method.to_string(), password.to_string()));
    }
    let (method, password) = plain.split_once(':')?;
    Some((method.to_string(), password.to_string()))
}
