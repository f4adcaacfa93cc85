//! Header transformers.
//!
//! Each transformer takes the headers produced so far and returns the next
//! version; nothing is shared or mutated outside the value passed in.

mod header;
mod url;

pub use header::HeaderTransformer;
pub use url::UrlTransformer;

use crate::context::TransformContext;
use crate::headers::HeaderCollection;

/// Trait for a stage of header transformation.
pub trait Transformer: Send + Sync {
    /// Apply this transformer to the result of the previous stage.
    fn transform(&self, ctx: &TransformContext, result: TransformResult) -> TransformResult;

    /// Get the transformer name for debugging.
    fn name(&self) -> &'static str;
}

/// Headers flowing through the transformers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformResult {
    /// Current header state
    pub headers: HeaderCollection,
    /// Number of rules that wrote at least one value
    pub rules_applied: usize,
}

impl TransformResult {
    /// Start from the request's original headers.
    pub fn new(headers: HeaderCollection) -> Self {
        Self {
            headers,
            rules_applied: 0,
        }
    }

    /// Whether any rule wrote to the headers.
    pub fn is_modified(&self) -> bool {
        self.rules_applied > 0
    }
}
