//! Rule compilation.
//!
//! Turns the declarative [`MutatorConfig`] into an immutable [`RuleSet`].
//! Compilation is all-or-nothing: the first invalid rule aborts and no rule
//! set is produced.

use crate::config::{FromUrlMutation, Mutation, MutatorConfig};
use crate::context::{RequestInfo, TransformContext};
use crate::transformer::{HeaderTransformer, TransformResult, Transformer, UrlTransformer};
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// A compiled regex and its replacement template.
#[derive(Debug, Clone)]
pub struct ValueRewrite {
    pattern: Regex,
    replacement: String,
}

fn compile_pattern(pattern: &str) -> Result<Regex, RuleError> {
    Regex::new(pattern).map_err(|source| RuleError::InvalidRegex {
        pattern: pattern.to_string(),
        source,
    })
}

impl ValueRewrite {
    /// Replace every match in `input` using the template.
    ///
    /// An empty result (no match, or a match that expands to nothing) yields
    /// `input` unchanged.
    pub fn apply(&self, input: &str) -> String {
        let rewritten = self.pattern.replace_all(input, self.replacement.as_str());
        if rewritten.is_empty() {
            input.to_string()
        } else {
            rewritten.into_owned()
        }
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }
}

/// A compiled header mutation.
#[derive(Debug, Clone)]
pub struct HeaderMutationRule {
    /// Source header name
    pub(crate) source: String,
    /// Destination header name (`None` = in place)
    pub(crate) destination: Option<String>,
    /// Value rewrite (`None` = copy values unchanged)
    pub(crate) rewrite: Option<ValueRewrite>,
    /// Remove the source header before writing the destination
    pub(crate) delete_source: bool,
}

impl HeaderMutationRule {
    fn compile(config: &Mutation) -> Result<Self, RuleError> {
        let destination = non_empty(config.new_name.as_deref()).map(str::to_string);

        let rewrite = match non_empty(config.regex.as_deref()) {
            Some(pattern) => {
                let pattern = compile_pattern(pattern)?;
                let replacement = non_empty(config.replacement.as_deref()).ok_or_else(|| {
                    RuleError::MissingReplacement {
                        header: config.header.clone(),
                    }
                })?;
                Some(ValueRewrite {
                    pattern,
                    replacement: replacement.to_string(),
                })
            }
            None => None,
        };

        Ok(Self {
            source: config.header.clone(),
            destination,
            rewrite,
            delete_source: config.delete_source,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    /// Header the rule writes to.
    pub fn effective_destination(&self) -> &str {
        self.destination.as_deref().unwrap_or(&self.source)
    }

    pub fn rewrite(&self) -> Option<&ValueRewrite> {
        self.rewrite.as_ref()
    }

    pub fn deletes_source(&self) -> bool {
        self.delete_source
    }

    /// A rule with neither a destination nor a rewrite does nothing.
    pub fn is_noop(&self) -> bool {
        self.destination.is_none() && self.rewrite.is_none()
    }
}

/// A compiled from-URL mutation.
#[derive(Debug, Clone)]
pub struct UrlMutationRule {
    /// Destination header name
    pub(crate) destination: String,
    /// Rewrite applied to the canonical URL
    pub(crate) rewrite: ValueRewrite,
}

impl UrlMutationRule {
    fn compile(config: &FromUrlMutation) -> Result<Self, RuleError> {
        if config.header.is_empty() {
            return Err(RuleError::MissingUrlHeader);
        }
        let pattern = non_empty(config.regex.as_deref()).ok_or_else(|| RuleError::MissingUrlRegex {
            header: config.header.clone(),
        })?;
        let pattern = compile_pattern(pattern)?;
        let replacement = non_empty(config.replacement.as_deref()).ok_or_else(|| {
            RuleError::MissingUrlReplacement {
                header: config.header.clone(),
            }
        })?;

        Ok(Self {
            destination: config.header.clone(),
            rewrite: ValueRewrite {
                pattern,
                replacement: replacement.to_string(),
            },
        })
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn rewrite(&self) -> &ValueRewrite {
        &self.rewrite
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Immutable, ordered set of compiled rules.
///
/// Cloning is cheap; clones share the same rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    header_rules: Arc<[HeaderMutationRule]>,
    url_rules: Arc<[UrlMutationRule]>,
}

impl RuleSet {
    /// Compile and validate every rule in the configuration.
    pub fn compile(config: &MutatorConfig) -> Result<Self, RuleError> {
        let header_rules = config
            .mutations
            .iter()
            .map(HeaderMutationRule::compile)
            .collect::<Result<Vec<_>, _>>()?;

        for rule in header_rules.iter().filter(|r| r.is_noop()) {
            warn!(
                header = %rule.source,
                "Mutation has neither newName nor regex and will have no effect"
            );
        }

        let url_rules = config
            .from_url_mutations
            .iter()
            .map(UrlMutationRule::compile)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            header_rules = header_rules.len(),
            url_rules = url_rules.len(),
            "Compiled mutation rules"
        );

        Ok(Self {
            header_rules: header_rules.into(),
            url_rules: url_rules.into(),
        })
    }

    /// Header mutation rules in declared order.
    pub fn header_rules(&self) -> &[HeaderMutationRule] {
        &self.header_rules
    }

    /// From-URL mutation rules in declared order.
    pub fn url_rules(&self) -> &[UrlMutationRule] {
        &self.url_rules
    }

    /// Total number of rules.
    pub fn len(&self) -> usize {
        self.header_rules.len() + self.url_rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run header rules, then URL rules, against a request.
    ///
    /// The request is not modified; the resulting headers are returned.
    pub fn apply(&self, request: &RequestInfo) -> TransformResult {
        let ctx = TransformContext::new(request);
        let header = HeaderTransformer::new(&self.header_rules);
        let url = UrlTransformer::new(&self.url_rules);
        let stages: [&dyn Transformer; 2] = [&header, &url];

        stages
            .iter()
            .fold(TransformResult::new(request.headers.clone()), |result, stage| {
                let result = stage.transform(&ctx, result);
                trace!(
                    transformer = stage.name(),
                    rules_applied = result.rules_applied,
                    "Transformer finished"
                );
                result
            })
    }
}

/// Errors that can occur during rule compilation.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("error compiling regex {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("replacement is required when regex is set (header {header:?})")]
    MissingReplacement { header: String },

    #[error("regex for url mutation cannot be empty (header {header:?})")]
    MissingUrlRegex { header: String },

    #[error("replacement is required for url mutation (header {header:?})")]
    MissingUrlReplacement { header: String },

    #[error("header name is required for url mutation")]
    MissingUrlHeader,
}
