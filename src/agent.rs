//! Header mutator agent implementation.

use crate::config::MutatorConfig;
use crate::context::RequestInfo;
use crate::headers::HeaderCollection;
use crate::rule::{RuleError, RuleSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, trace};

/// Header Mutator Agent for Zentinel.
///
/// Owns the compiled rules and applies them to each request exactly once.
/// Safe to share across worker threads behind an `Arc`.
pub struct HeaderMutatorAgent {
    /// Compiled rules
    rules: RuleSet,
    /// Metrics: total requests processed.
    requests_total: AtomicU64,
    /// Metrics: requests where at least one rule wrote a header.
    requests_mutated: AtomicU64,
}

/// Point-in-time view of the agent counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentMetrics {
    pub requests_total: u64,
    pub requests_mutated: u64,
}

impl HeaderMutatorAgent {
    /// Create a new agent from configuration.
    pub fn new(config: MutatorConfig) -> Result<Self, RuleError> {
        let rules = RuleSet::compile(&config)?;

        info!(
            version = %config.version,
            header_rules = rules.header_rules().len(),
            url_rules = rules.url_rules().len(),
            "Header mutator agent initialized"
        );

        Ok(Self {
            rules,
            requests_total: AtomicU64::new(0),
            requests_mutated: AtomicU64::new(0),
        })
    }

    /// Create from a YAML configuration string.
    pub fn from_yaml(yaml: &str) -> Result<Self, AgentError> {
        let config: MutatorConfig = serde_yaml::from_str(yaml)?;
        Self::new(config).map_err(AgentError::from)
    }

    /// Create from a JSON configuration string.
    pub fn from_json(json: &str) -> Result<Self, AgentError> {
        let config: MutatorConfig = serde_json::from_str(json)?;
        Self::new(config).map_err(AgentError::from)
    }

    /// Compiled rules.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Apply all rules to a request and return the resulting headers.
    ///
    /// Header mutations run first, then from-URL mutations. The request
    /// itself is left untouched.
    pub fn process(&self, request: &RequestInfo) -> HeaderCollection {
        self.requests_total.fetch_add(1, Ordering::Relaxed);

        if self.rules.is_empty() {
            trace!("No mutation rules configured");
            return request.headers.clone();
        }

        let result = self.rules.apply(request);

        if result.is_modified() {
            self.requests_mutated.fetch_add(1, Ordering::Relaxed);
            debug!(
                host = %request.host,
                path = %request.path,
                rules_applied = result.rules_applied,
                "Applied header mutations"
            );
        } else {
            trace!(host = %request.host, path = %request.path, "No header mutations applied");
        }

        result.headers
    }

    /// Current counter values.
    pub fn metrics(&self) -> AgentMetrics {
        AgentMetrics {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_mutated: self.requests_mutated.load(Ordering::Relaxed),
        }
    }
}

/// Header mutator agent errors.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn make_request() -> RequestInfo {
        RequestInfo {
            method: "GET".to_string(),
            host: "example.com".to_string(),
            path: "/test".to_string(),
            query_string: None,
            secure: false,
            headers: [("Host", "example.com")].into_iter().collect(),
        }
    }

    #[test]
    fn test_agent_creation() {
        let agent = HeaderMutatorAgent::new(MutatorConfig::default()).unwrap();
        assert!(agent.rules().is_empty());
        assert_eq!(
            agent.metrics(),
            AgentMetrics {
                requests_total: 0,
                requests_mutated: 0
            }
        );
    }

    #[test]
    fn test_agent_from_yaml() {
        let yaml = r#"
version: "1"
mutations:
  - header: Host
    newName: X-Host
fromUrlMutations:
  - header: X-Url
    regex: "^(.*)$"
    replacement: "$1"
"#;
        let agent = HeaderMutatorAgent::from_yaml(yaml).unwrap();
        assert_eq!(agent.rules().header_rules().len(), 1);
        assert_eq!(agent.rules().url_rules().len(), 1);
    }

    #[test]
    fn test_agent_from_json_rule_error() {
        let json = r#"{"mutations": [{"header": "Host", "regex": "(.+)"}]}"#;
        let err = HeaderMutatorAgent::from_json(json).err().unwrap();
        assert!(matches!(err, AgentError::Rule(RuleError::MissingReplacement { .. })));
    }

    #[test]
    fn test_agent_from_yaml_parse_error() {
        let err = HeaderMutatorAgent::from_yaml("mutations: [").err().unwrap();
        assert!(matches!(err, AgentError::Yaml(_)));
    }

    #[test]
    fn test_process_leaves_request_untouched() {
        let agent = HeaderMutatorAgent::from_yaml(
            r#"
mutations:
  - header: Host
    regex: "^(.+)\\.com$"
    replacement: "$1.org"
"#,
        )
        .unwrap();
        let request = make_request();

        let headers = agent.process(&request);
        assert_eq!(headers.get("host"), Some("example.org"));
        assert_eq!(request.header("host"), Some("example.com"));
    }

    #[test]
    fn test_metrics() {
        let agent = HeaderMutatorAgent::from_yaml(
            r#"
mutations:
  - header: X-Missing
    newName: X-Other
"#,
        )
        .unwrap();

        agent.process(&make_request());
        let mut request = make_request();
        request.headers.append("X-Missing", "present");
        agent.process(&request);

        assert_eq!(
            agent.metrics(),
            AgentMetrics {
                requests_total: 2,
                requests_mutated: 1
            }
        );
    }

    #[test]
    fn test_concurrent_processing() {
        let agent = Arc::new(
            HeaderMutatorAgent::from_yaml(
                r#"
mutations:
  - header: Host
    newName: X-Host
"#,
            )
            .unwrap(),
        );

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let agent = Arc::clone(&agent);
                std::thread::spawn(move || {
                    let mut request = make_request();
                    request.host = format!("host-{}.example.com", i);
                    request.headers = [("Host", request.host.clone())].into_iter().collect();
                    let headers = agent.process(&request);
                    assert_eq!(headers.get("X-Host"), Some(request.host.as_str()));
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(agent.metrics().requests_total, 8);
        assert_eq!(agent.metrics().requests_mutated, 8);
    }
}
