use crate::models::SUPPORTED_SCHEMES;
use crate::utils::base64::try_base64_decode;

/// Shape of a raw subscription body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputShape {
    /// Nothing but whitespace
    Empty,
    /// A document carrying a top-level `proxies:` list
    Structured,
    /// A base64 blob, holding the decoded link text
    Encoded(String),
    /// Whitespace separated links
    Links,
}

impl InputShape {
    /// Classify raw content. The first matching shape wins.
    pub fn classify(raw: &str) -> Self {
        let content = raw.trim_start_matches('\u{feff}').trim();
        if content.is_empty() {
            return InputShape::Empty;
        }

        if content.starts_with("proxies:") || content.lines().any(|l| l.starts_with("proxies:"))
        {
            return InputShape::Structured;
        }

        if !has_scheme(content) {
            if let Some(decoded) = try_base64_decode(content) {
                if has_scheme(&decoded) {
                    return InputShape::Encoded(decoded);
                }
            }
        }

        InputShape::Links
    }
}

/// Whether the text mentions any supported link scheme.
fn has_scheme(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    SUPPORTED_SCHEMES.iter().any(|scheme| lower.contains(scheme))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::base64::base64_encode;

    #[test]
    fn test_empty() {
        assert_eq!(InputShape::classify(""), InputShape::Empty);
        assert_eq!(InputShape::classify(" \r\n\t"), InputShape::Empty);
    }

    #[test]
    fn test_structured() {
        assert_eq!(InputShape::classify("proxies: []"), InputShape::Structured);
        let doc = "port: 7890\nmode: rule\nproxies:\n  - name: a\n";
        assert_eq!(InputShape::classify(doc), InputShape::Structured);
        // An indented key is not a top level list
        assert_eq!(
            InputShape::classify("foo:\n  proxies:\n    - a"),
            InputShape::Links
        );
    }

    #[test]
    fn test_encoded() {
        let links = "trojan://a@one.example.com:443\nhy2://b@two.example.com:443";
        match InputShape::classify(&base64_encode(links)) {
            InputShape::Encoded(decoded) => assert_eq!(decoded, links),
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_links() {
        assert_eq!(
            InputShape::classify("trojan://a@one.example.com:443"),
            InputShape::Links
        );
        assert_eq!(InputShape::classify("not a link"), InputShape::Links);
        // Decodes fine but carries no link
        assert_eq!(
            InputShape::classify(&base64_encode("hello world")),
            InputShape::Links
        );
    }
}
