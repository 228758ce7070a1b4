use submerge::generator::proxy_to_uri;
use submerge::parser::{parse_nodes, InputShape};
use submerge::utils::base64_encode;
use submerge::ProxyType;

const LINKS: &str = "\
ss://YWVzLTI1Ni1nY206cGFzc3dvcmQ=@ss.example.com:8388#SS%20Node
vmess://eyJ2IjoiMiIsInBzIjoiVk0iLCJhZGQiOiJ2bS5leGFtcGxlLmNvbSIsInBvcnQiOiI0NDMiLCJpZCI6ImIzMWMxNjNjLTM0NjQtNDk5My1hMmZiLTgxNGRjYWE0MDk3ZiIsImFpZCI6IjAiLCJuZXQiOiJ3cyIsImhvc3QiOiJjZG4uZXhhbXBsZS5jb20iLCJwYXRoIjoiL3dzIiwidGxzIjoidGxzIn0=
vless://b831381d-6324-4d53-ad4f-8cda48b30811@vl.example.com:443?security=tls&type=grpc&serviceName=svc&sni=vl.example.com#VL
trojan://secret@tr.example.com:443?sni=tr.example.com#TR
hy2://auth@hy.example.com:8443?obfs=salamander&obfs-password=o&insecure=1#HY
unsupported://whatever
";

#[test]
fn test_every_protocol_from_links() {
    let nodes = parse_nodes(LINKS);
    let types: Vec<ProxyType> = nodes.iter().map(|n| n.proxy_type).collect();
    assert_eq!(
        types,
        vec![
            ProxyType::Shadowsocks,
            ProxyType::VMess,
            ProxyType::Vless,
            ProxyType::Trojan,
            ProxyType::Hysteria2,
        ]
    );

    assert_eq!(nodes[0].remark, "SS Node");
    assert_eq!(nodes[0].encrypt_method.as_deref(), Some("aes-256-gcm"));
    assert_eq!(nodes[1].remark, "VM");
    assert_eq!(nodes[1].transfer_protocol.as_deref(), Some("ws"));
    assert_eq!(nodes[1].host.as_deref(), Some("cdn.example.com"));
    assert!(nodes[1].tls_secure);
    assert_eq!(nodes[2].path.as_deref(), Some("svc"));
    assert_eq!(nodes[3].password.as_deref(), Some("secret"));
    assert_eq!(nodes[4].obfs.as_deref(), Some("salamander"));
    assert_eq!(nodes[4].allow_insecure, Some(true));
}

#[test]
fn test_canonical_links_parse_back() {
    let nodes = parse_nodes(LINKS);
    let canonical: Vec<String> = nodes.iter().map(proxy_to_uri).collect();
    let reparsed = parse_nodes(&canonical.join("\n"));
    assert_eq!(reparsed, nodes);
}

#[test]
fn test_base64_bundle() {
    let bundle = base64_encode(LINKS);
    assert!(matches!(InputShape::classify(&bundle), InputShape::Encoded(_)));
    assert_eq!(parse_nodes(&bundle), parse_nodes(LINKS));
}

#[test]
fn test_structured_document() {
    let doc = r#"
proxies:
  - name: Tokyo
    type: vmess
    server: jp.example.com
    port: "443"
    uuid: b31c163c-3464-4993-a2fb-814dcaa4097f
    alterId: 0
    network: ws
    tls: true
    servername: jp.example.com
    ws-opts:
      path: /ws
      headers:
        Host: cdn.example.com
  - name: Ignored
    type: snell
    server: snell.example.com
    port: 1
  - type: trojan
    server: tr.example.com
    port: 443
    password: pw
"#;
    assert_eq!(InputShape::classify(doc), InputShape::Structured);

    let nodes = parse_nodes(doc);
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].remark, "Tokyo");
    assert_eq!(nodes[0].port, 443);
    assert_eq!(nodes[0].sni.as_deref(), Some("jp.example.com"));
    assert_eq!(nodes[0].host.as_deref(), Some("cdn.example.com"));
    assert_eq!(nodes[1].remark, "tr.example.com:443");
}

#[test]
fn test_empty_input() {
    assert!(parse_nodes("").is_empty());
    assert!(parse_nodes("   \n\n").is_empty());
    assert!(parse_nodes("not a link").is_empty());
    assert!(parse_nodes("proxies:").is_empty());
}
