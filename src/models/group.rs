//! Stored render configuration: sources, directives and groups.

use std::collections::{BTreeMap, HashSet};

use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

use crate::utils::deserialize::{
    decode_lenient_list, deserialize_bool_lenient, deserialize_lenient_list,
    deserialize_or_default, deserialize_u64_lenient,
};

/// A stored, named blob of raw subscription text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Source {
    #[serde(deserialize_with = "deserialize_u64_lenient")]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    /// Links, a base64 blob of links, or a document with a `proxies:` list
    #[serde(default, alias = "url", alias = "raw_content")]
    pub content: String,
}

impl Source {
    pub fn new(id: u64, name: impl Into<String>, content: impl Into<String>) -> Self {
        Source {
            id,
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Which original node names a directive keeps.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IncludeFilter {
    #[default]
    All,
    Names(HashSet<String>),
}

impl IncludeFilter {
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: HashSet<String> = names.into_iter().map(Into::into).collect();
        if set.is_empty() {
            IncludeFilter::All
        } else {
            IncludeFilter::Names(set)
        }
    }

    pub fn allows(&self, name: &str) -> bool {
        match self {
            IncludeFilter::All => true,
            IncludeFilter::Names(names) => names.contains(name),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IncludeRepr {
    Keyword(String),
    Names(Vec<String>),
}

/// Accepts `"all"`, `null`, a missing key or an empty list as "keep everything".
impl<'de> Deserialize<'de> for IncludeFilter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let filter = match Option::<IncludeRepr>::deserialize(deserializer)? {
            None => IncludeFilter::All,
            Some(IncludeRepr::Keyword(keyword))
                if keyword.is_empty() || keyword.eq_ignore_ascii_case("all") =>
            {
                IncludeFilter::All
            }
            Some(IncludeRepr::Keyword(name)) => IncludeFilter::names([name]),
            Some(IncludeRepr::Names(names)) => IncludeFilter::names(names),
        };
        Ok(filter)
    }
}

/// Chain ("dialer-proxy") settings of a directive.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct DialerProxyConfig {
    #[serde(default, deserialize_with = "deserialize_bool_lenient")]
    pub enabled: bool,
    /// Name of the upstream proxy group
    #[serde(default, deserialize_with = "deserialize_or_default")]
    pub group: String,
}

/// One (source, filter, chain) binding inside a group.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Directive {
    #[serde(
        rename = "subId",
        alias = "source_id",
        deserialize_with = "deserialize_u64_lenient"
    )]
    pub source_id: u64,
    #[serde(default)]
    pub include: IncludeFilter,
    #[serde(
        default,
        rename = "dialerProxy",
        alias = "dialer_proxy",
        deserialize_with = "deserialize_or_default"
    )]
    pub dialer_proxy: Option<DialerProxyConfig>,
}

impl Directive {
    pub fn new(source_id: u64) -> Self {
        Directive {
            source_id,
            include: IncludeFilter::All,
            dialer_proxy: None,
        }
    }

    pub fn with_include(mut self, include: IncludeFilter) -> Self {
        self.include = include;
        self
    }

    pub fn with_chain(mut self, group: impl Into<String>) -> Self {
        self.dialer_proxy = Some(DialerProxyConfig {
            enabled: true,
            group: group.into(),
        });
        self
    }

    /// Upstream group for this directive's nodes, if chaining is enabled and named.
    pub fn chain_target(&self) -> Option<&str> {
        self.dialer_proxy
            .as_ref()
            .filter(|chain| chain.enabled && !chain.group.trim().is_empty())
            .map(|chain| chain.group.trim())
    }
}

/// How the structured document of a group is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Generate,
    Raw,
}

/// A proxy group definition of the structured document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProxyGroupConfig {
    pub name: String,
    #[serde(
        rename = "type",
        default = "default_group_type",
        deserialize_with = "deserialize_group_type"
    )]
    pub group_type: String,
    /// Node names, source display names or reserved literals
    #[serde(default, deserialize_with = "deserialize_lenient_list")]
    pub proxies: Vec<String>,
    /// Extra keys (`url`, `interval`, ...) copied into the rendered group
    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

fn default_group_type() -> String {
    "select".to_string()
}

fn deserialize_group_type<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let group_type: String = deserialize_or_default(deserializer)?;
    if group_type.trim().is_empty() {
        Ok(default_group_type())
    } else {
        Ok(group_type)
    }
}

impl ProxyGroupConfig {
    pub fn new<I, S>(name: impl Into<String>, group_type: impl Into<String>, proxies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ProxyGroupConfig {
            name: name.into(),
            group_type: group_type.into(),
            proxies: proxies.into_iter().map(Into::into).collect(),
            extra: BTreeMap::new(),
        }
    }
}

/// Structured-document settings of a group.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ClashConfig {
    #[serde(deserialize_with = "deserialize_or_default")]
    pub mode: RenderMode,
    /// Verbatim text placed before the proxies section
    #[serde(deserialize_with = "deserialize_or_default")]
    pub header: String,
    #[serde(deserialize_with = "deserialize_lenient_list")]
    pub groups: Vec<ProxyGroupConfig>,
    /// Verbatim rules block appended at the end
    #[serde(deserialize_with = "deserialize_or_default")]
    pub rules: String,
    /// Directive list that replaces the group's own for the structured format
    #[serde(deserialize_with = "deserialize_lenient_list")]
    pub resources: Vec<Directive>,
    /// Document returned verbatim in raw mode
    #[serde(deserialize_with = "deserialize_or_default")]
    pub raw_yaml: String,
}

/// A group as it sits in storage, with its configuration still undecoded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GroupRecord {
    #[serde(default, deserialize_with = "deserialize_u64_lenient")]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub token: String,
    #[serde(
        default = "default_enabled",
        alias = "status",
        deserialize_with = "deserialize_bool_lenient"
    )]
    pub enabled: bool,
    /// Directive list, as JSON text or an inline value
    #[serde(default)]
    pub config: JsonValue,
    /// Structured-document settings, as JSON text or an inline value
    #[serde(default)]
    pub clash_config: JsonValue,
}

fn default_enabled() -> bool {
    true
}

/// A group with its configuration decoded, ready to render.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupDescriptor {
    pub token: String,
    pub name: String,
    pub directives: Vec<Directive>,
    pub clash: ClashConfig,
}

impl GroupDescriptor {
    /// Decode a stored record.
    ///
    /// Unreadable directives are skipped one by one, and unreadable clash settings fall
    /// back field by field. Only a field that is not a list or object at all falls back
    /// whole, to an empty directive list or a blank `generate` configuration.
    pub fn from_record(record: &GroupRecord) -> Self {
        let directives = decode_stored::<JsonValue>(&record.config)
            .unwrap_or_else(|e| {
                warn!(
                    "Group '{}' has an unreadable directive list, using none: {}",
                    record.name, e
                );
                None
            })
            .map(decode_lenient_list::<Directive>)
            .unwrap_or_default();

        let clash = decode_stored::<ClashConfig>(&record.clash_config)
            .unwrap_or_else(|e| {
                warn!(
                    "Group '{}' has an unreadable clash config, using defaults: {}",
                    record.name, e
                );
                None
            })
            .unwrap_or_default();

        GroupDescriptor {
            token: record.token.clone(),
            name: record.name.clone(),
            directives,
            clash,
        }
    }

    /// Directives that feed the structured document.
    pub fn structured_directives(&self) -> &[Directive] {
        if self.clash.resources.is_empty() {
            &self.directives
        } else {
            &self.clash.resources
        }
    }
}

/// Decode a stored field that is either JSON text or an inline value.
fn decode_stored<T: DeserializeOwned>(value: &JsonValue) -> Result<Option<T>, serde_json::Error> {
    match value {
        JsonValue::Null => Ok(None),
        JsonValue::String(text) if text.trim().is_empty() => Ok(None),
        JsonValue::String(text) => serde_json::from_str(text).map(Some),
        other => T::deserialize(other).map(Some),
    }
}
