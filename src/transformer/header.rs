//! Header rename / clone / rewrite transformer.

use super::{TransformResult, Transformer};
use crate::context::TransformContext;
use crate::rule::HeaderMutationRule;
use tracing::trace;

/// Applies header mutation rules in declared order.
///
/// Each rule replaces every value under its destination. Rules run against
/// the headers left by the previous rule, so a later rule writing the same
/// destination wins.
pub struct HeaderTransformer<'a> {
    rules: &'a [HeaderMutationRule],
}

impl<'a> HeaderTransformer<'a> {
    pub fn new(rules: &'a [HeaderMutationRule]) -> Self {
        Self { rules }
    }
}

impl Transformer for HeaderTransformer<'_> {
    fn transform(&self, _ctx: &TransformContext, mut result: TransformResult) -> TransformResult {
        for rule in self.rules {
            if rule.is_noop() {
                continue;
            }

            let values = result.headers.get_all(&rule.source).to_vec();
            if values.is_empty() {
                continue;
            }

            if rule.delete_source {
                result.headers.remove(&rule.source);
            }

            let destination = rule.effective_destination();
            result.headers.remove(destination);

            for value in values {
                let value = match &rule.rewrite {
                    Some(rewrite) => rewrite.apply(&value),
                    None => value,
                };
                result.headers.append(destination, value);
            }

            trace!(
                source = %rule.source,
                destination = %destination,
                "Applied header mutation"
            );
            result.rules_applied += 1;
        }

        result
    }

    fn name(&self) -> &'static str {
        "header_transformer"
    }
}
