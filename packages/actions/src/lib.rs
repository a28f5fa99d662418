//! # Docedit Actions
//!
//! The closed set of declarative edit actions, and the gate every untrusted
//! action payload passes through before it may touch a document.
//!
//! ```text
//! raw text ──extract [..]──► JSON ──normalize──► validate (oneOf) ──► ActionBatch
//!                  │                                   │
//!        not JSON: single noop              SchemaViolation (batch rejected)
//! ```
//!
//! ## Core Principles
//!
//! 1. **Closed vocabulary**: [`EditAction`] is an exhaustive enum; consumers
//!    match on it without a fallback arm.
//! 2. **Validate before apply**: only [`parse_actions`] and
//!    [`parse_action_values`] turn loose JSON into actions.
//! 3. **Truncation is not an error**: an unparseable payload becomes one `noop`
//!    carrying a hint for the user.
//! 4. **Minimal repair**: normalization fixes three known field typos and
//!    nothing else.

mod action;
mod error;
mod normalize;
mod payload;
mod schema;

pub use action::{ActionBatch, EditAction, Justification, RewriteStyle, StyleType};
pub use error::SchemaViolation;
pub use normalize::{normalize, Correction};
pub use payload::{extract_json_array, parse_action_values, parse_actions, TRUNCATED_RESPONSE_HINT};
pub use schema::{validate, validate_action, VariantSchema, VARIANTS};
