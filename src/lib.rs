//! Request Header Mutator Agent for Zentinel.
//!
//! Rewrites inbound request headers before they reach the next stage:
//!
//! - Rename or clone a header under a new name
//! - Rewrite header values in place with regex capture groups
//! - Synthesize headers from the canonical request URL
//!
//! Rules are compiled once into an immutable [`RuleSet`] and applied to every
//! request in declared order. Responses are never touched.
//!
//! ## Configuration Example
//!
//! ```yaml
//! mutations:
//!   - header: Location
//!     regex: "^http://(.+)$"
//!     replacement: "https://$1"
//! fromUrlMutations:
//!   - header: X-Url-Host
//!     regex: "^https?://([^/]+)/.*$"
//!     replacement: "$1"
//! ```

pub mod agent;
pub mod config;
pub mod context;
pub mod headers;
pub mod middleware;
pub mod rule;
pub mod transformer;

pub use agent::{AgentError, AgentMetrics, HeaderMutatorAgent};
pub use config::MutatorConfig;
pub use context::{RequestInfo, TransformContext};
pub use headers::HeaderCollection;
pub use rule::{RuleError, RuleSet};
