//! Configuration types for the Header Mutator agent.

use serde::{Deserialize, Serialize};

/// Main configuration for the Header Mutator agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MutatorConfig {
    /// Configuration version
    pub version: String,
    /// Header mutations (applied in declared order)
    pub mutations: Vec<Mutation>,
    /// Headers synthesized from the request URL (applied after `mutations`)
    #[serde(rename = "fromUrlMutations", alias = "from_url_mutations")]
    pub from_url_mutations: Vec<FromUrlMutation>,
}

impl Default for MutatorConfig {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            mutations: vec![],
            from_url_mutations: vec![],
        }
    }
}

/// A header mutation: rename, clone, or rewrite an existing header.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mutation {
    /// Source header name (case-insensitive)
    pub header: String,
    /// Destination header name. Absent means the source is rewritten in place.
    #[serde(default, rename = "newName", alias = "new_name")]
    pub new_name: Option<String>,
    /// Pattern applied to every source value
    #[serde(default)]
    pub regex: Option<String>,
    /// Replacement template, required when `regex` is set
    #[serde(default)]
    pub replacement: Option<String>,
    /// Remove the source header once its values are read
    #[serde(default, rename = "deleteSource", alias = "delete_source")]
    pub delete_source: bool,
}

/// A header synthesized from the canonical request URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FromUrlMutation {
    /// Destination header name
    pub header: String,
    /// Pattern applied to the request URL (required)
    #[serde(default)]
    pub regex: Option<String>,
    /// Replacement template (required)
    #[serde(default)]
    pub replacement: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MutatorConfig::default();
        assert_eq!(config.version, "1");
        assert!(config.mutations.is_empty());
        assert!(config.from_url_mutations.is_empty());
    }

    #[test]
    fn test_config_parsing() {
        let yaml = r#"
version: "1"
mutations:
  - header: Host
    newName: X-Host
    regex: "^(.+)$"
    replacement: "$1"
  - header: Location
fromUrlMutations:
  - header: X-Url
    regex: "^http://(.+)$"
    replacement: "$1"
"#;
        let config: MutatorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.mutations.len(), 2);
        assert_eq!(config.mutations[0].header, "Host");
        assert_eq!(config.mutations[0].new_name.as_deref(), Some("X-Host"));
        assert_eq!(config.mutations[0].regex.as_deref(), Some("^(.+)$"));
        assert!(!config.mutations[0].delete_source);
        assert!(config.mutations[1].new_name.is_none());
        assert!(config.mutations[1].regex.is_none());
        assert_eq!(config.from_url_mutations.len(), 1);
        assert_eq!(config.from_url_mutations[0].header, "X-Url");
    }

    #[test]
    fn test_snake_case_aliases() {
        let json = r#"{
            "mutations": [
                {"header": "Host", "new_name": "X-Host", "delete_source": true}
            ],
            "from_url_mutations": [
                {"header": "X-Url", "regex": "(.*)", "replacement": "$1"}
            ]
        }"#;
        let config: MutatorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.version, "1");
        assert_eq!(config.mutations[0].new_name.as_deref(), Some("X-Host"));
        assert!(config.mutations[0].delete_source);
        assert_eq!(config.from_url_mutations.len(), 1);
    }

    #[test]
    fn test_missing_url_regex_still_parses() {
        // Validation happens at compile time, not deserialization.
        let yaml = r#"
fromUrlMutations:
  - header: X-Url
"#;
        let config: MutatorConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.from_url_mutations[0].regex.is_none());
        assert!(config.from_url_mutations[0].replacement.is_none());
    }
}
