use crate::error::PlumaError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How a plugin's match against a user utterance is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParseMode {
    /// Matched by the rule-based parser against `pattern`.
    #[default]
    Rule,
    /// Recalled by embedding similarity against `pattern`.
    EmbeddingRecall,
    /// Selected by a model function call using the config's `name`.
    FunctionCall,
}

impl ParseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMode::Rule => "RULE",
            ParseMode::EmbeddingRecall => "EMBEDDING_RECALL",
            ParseMode::FunctionCall => "FUNCTION_CALL",
        }
    }

    pub fn all() -> &'static [ParseMode] {
        &[
            ParseMode::Rule,
            ParseMode::EmbeddingRecall,
            ParseMode::FunctionCall,
        ]
    }
}

impl std::fmt::Display for ParseMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ParseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParseMode::all()
            .iter()
            .copied()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| format!("unknown parse mode '{s}'"))
    }
}

/// Callable description embedded in a plugin's `parse_mode_config`.
///
/// Only `name` is required. Optional fields with an unexpected shape are
/// read as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseModeConfig {
    /// Function-call name the query engine invokes.
    pub name: String,

    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,

    /// Sample utterances for the function.
    #[serde(default, deserialize_with = "lenient")]
    pub examples: Vec<String>,

    /// JSON-schema style parameter description.
    #[serde(default)]
    pub parameters: Option<serde_json::Value>,
}

impl ParseModeConfig {
    /// Parse the semi-structured config text.
    pub fn parse(raw: &str) -> Result<Self, PlumaError> {
        serde_json::from_str(raw).map_err(|e| PlumaError::InvalidConfig(e.to_string()))
    }

    /// Read just the declared function name.
    pub fn parse_name(raw: &str) -> Result<String, PlumaError> {
        #[derive(Deserialize)]
        struct NameOnly {
            name: String,
        }
        serde_json::from_str::<NameOnly>(raw)
            .map(|config| config.name)
            .map_err(|e| PlumaError::InvalidConfig(e.to_string()))
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// The identity issuing a registry operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Caller {
    pub name: String,
}

impl Caller {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Mutable plugin fields supplied on create and update.
///
/// Update is a full overwrite: a field left at its default here clears the
/// stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginSpec {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(rename = "type", default)]
    pub plugin_type: String,

    #[serde(default)]
    pub pattern: String,

    #[serde(default)]
    pub parse_mode: ParseMode,

    #[serde(default)]
    pub parse_mode_config: Option<String>,

    #[serde(default)]
    pub domain_list: Vec<i64>,

    #[serde(default)]
    pub contains_all_domain: bool,

    /// Handler-specific configuration, opaque to the registry.
    #[serde(default)]
    pub config: Option<String>,

    #[serde(default)]
    pub comment: Option<String>,
}

/// A stored plugin as seen by registry callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plugin {
    pub id: i64,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(rename = "type")]
    pub plugin_type: String,

    pub pattern: String,

    pub parse_mode: ParseMode,

    #[serde(default)]
    pub parse_mode_config: Option<String>,

    #[serde(default)]
    pub domain_list: Vec<i64>,

    #[serde(default)]
    pub contains_all_domain: bool,

    #[serde(default)]
    pub config: Option<String>,

    #[serde(default)]
    pub comment: Option<String>,

    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

impl Plugin {
    /// Parsed parse-mode config, or `None` when absent or unusable.
    pub fn function_config(&self) -> Option<ParseModeConfig> {
        let raw = self.parse_mode_config.as_deref()?;
        if raw.trim().is_empty() {
            return None;
        }
        match ParseModeConfig::parse(raw) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::debug!(plugin_id = self.id, error = %e, "Skipping unusable parse mode config");
                None
            }
        }
    }

    /// Case-insensitive match of the callable name declared in the config.
    pub fn has_function_name(&self, name: &str) -> bool {
        let Some(raw) = self.parse_mode_config.as_deref().filter(|raw| !raw.trim().is_empty())
        else {
            return false;
        };
        match ParseModeConfig::parse_name(raw) {
            Ok(declared) => declared.to_lowercase() == name.to_lowercase(),
            Err(e) => {
                tracing::debug!(plugin_id = self.id, error = %e, "Skipping unusable parse mode config");
                false
            }
        }
    }

    /// The mutable fields of this plugin.
    pub fn spec(&self) -> PluginSpec {
        PluginSpec {
            name: self.name.clone(),
            plugin_type: self.plugin_type.clone(),
            pattern: self.pattern.clone(),
            parse_mode: self.parse_mode,
            parse_mode_config: self.parse_mode_config.clone(),
            domain_list: self.domain_list.clone(),
            contains_all_domain: self.contains_all_domain,
            config: self.config.clone(),
            comment: self.comment.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plugin_with_config(config: Option<&str>) -> Plugin {
        let now = Utc::now();
        Plugin {
            id: 1,
            name: Some("weather".into()),
            plugin_type: "WEB_SERVICE".into(),
            pattern: "weather today".into(),
            parse_mode: ParseMode::FunctionCall,
            parse_mode_config: config.map(str::to_string),
            domain_list: vec![],
            contains_all_domain: false,
            config: None,
            comment: None,
            created_by: "admin".into(),
            created_at: now,
            updated_by: "admin".into(),
            updated_at: now,
        }
    }

    #[test]
    fn parse_mode_wire_names() {
        assert_eq!(ParseMode::Rule.as_str(), "RULE");
        assert_eq!(
            serde_json::to_string(&ParseMode::EmbeddingRecall).unwrap(),
            "\"EMBEDDING_RECALL\""
        );
        assert_eq!("FUNCTION_CALL".parse::<ParseMode>(), Ok(ParseMode::FunctionCall));
        assert!("function_call".parse::<ParseMode>().is_err());
    }

    #[test]
    fn function_name_match_ignores_case() {
        let plugin = plugin_with_config(Some(r#"{"name":"GetWeather"}"#));
        assert!(plugin.has_function_name("getweather"));
        assert!(plugin.has_function_name("GETWEATHER"));
        assert!(!plugin.has_function_name("getweathers"));
    }

    #[test]
    fn unusable_configs_never_match() {
        assert!(!plugin_with_config(None).has_function_name("x"));
        assert!(!plugin_with_config(Some("   ")).has_function_name(""));
        assert!(!plugin_with_config(Some("not json")).has_function_name("not json"));
        assert!(!plugin_with_config(Some(r#"{"description":"no name"}"#)).has_function_name(""));
    }

    #[test]
    fn function_name_match_folds_non_ascii_case() {
        let plugin = plugin_with_config(Some(r#"{"name":"ÜberWetter"}"#));
        assert!(plugin.has_function_name("überwetter"));
        assert!(plugin.has_function_name("ÜBERWETTER"));
    }

    #[test]
    fn function_name_match_tolerates_odd_optional_fields() {
        for raw in [
            r#"{"name":"GetWeather","examples":null}"#,
            r#"{"name":"GetWeather","description":{"text":"weather"}}"#,
            r#"{"name":"GetWeather","examples":"one","extra":[1,2]}"#,
        ] {
            assert!(plugin_with_config(Some(raw)).has_function_name("getweather"), "{raw}");
        }
    }

    #[test]
    fn parse_reads_odd_optional_fields_as_absent() {
        let config =
            ParseModeConfig::parse(r#"{"name":"x","description":{"a":1},"examples":null}"#).unwrap();
        assert_eq!(config.name, "x");
        assert!(config.description.is_none());
        assert!(config.examples.is_empty());
    }

    #[test]
    fn parse_rejects_nameless_config() {
        let err = ParseModeConfig::parse(r#"{"examples":["a"]}"#).unwrap_err();
        assert!(matches!(err, PlumaError::InvalidConfig(_)));
    }

    #[test]
    fn parse_reads_optional_fields() {
        let config = ParseModeConfig::parse(
            r#"{"name":"buy","description":"Buy stock","examples":["buy AAPL"],"parameters":{"type":"object"}}"#,
        )
        .unwrap();
        assert_eq!(config.name, "buy");
        assert_eq!(config.description.as_deref(), Some("Buy stock"));
        assert_eq!(config.examples, vec!["buy AAPL".to_string()]);
        assert_eq!(config.parameters.unwrap()["type"], "object");
    }

    #[test]
    fn spec_deserializes_with_defaults() {
        let spec: PluginSpec = serde_json::from_str(r#"{"type":"DSL","pattern":"p"}"#).unwrap();
        assert_eq!(spec.plugin_type, "DSL");
        assert_eq!(spec.parse_mode, ParseMode::Rule);
        assert!(spec.domain_list.is_empty());
        assert!(!spec.contains_all_domain);
        assert!(spec.name.is_none());
    }
}
