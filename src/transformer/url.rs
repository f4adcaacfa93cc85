//! Headers synthesized from the request URL.

use super::{TransformResult, Transformer};
use crate::context::TransformContext;
use crate::rule::UrlMutationRule;
use tracing::trace;

/// Appends one value per from-URL rule, derived from the canonical URL.
///
/// Existing values are never cleared, so several rules targeting the same
/// header accumulate.
pub struct UrlTransformer<'a> {
    rules: &'a [UrlMutationRule],
}

impl<'a> UrlTransformer<'a> {
    pub fn new(rules: &'a [UrlMutationRule]) -> Self {
        Self { rules }
    }
}

impl Transformer for UrlTransformer<'_> {
    fn transform(&self, ctx: &TransformContext, mut result: TransformResult) -> TransformResult {
        for rule in self.rules {
            let value = rule.rewrite.apply(&ctx.canonical_url);
            trace!(
                destination = %rule.destination,
                value = %value,
                "Applied url mutation"
            );
            result.headers.append(rule.destination.as_str(), value);
            result.rules_applied += 1;
        }

        result
    }

    fn name(&self) -> &'static str {
        "url_transformer"
    }
}
