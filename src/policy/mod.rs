//! Child-safety content policy.
//!
//! A request's [`Viewer`] is resolved once from the session user and the
//! explicit active-child selection. Its [`PolicyScope`] turns into
//! [`PolicyClause`]s that every video query ANDs into its own filter.

pub mod clause;
pub mod error;
pub mod resolver;
pub mod types;

pub use clause::{build_clauses, PolicyClause, ENTERTAINMENT_CATEGORIES};
pub use error::PolicyError;
pub use resolver::{PolicyResolver, Viewer};
pub use types::{AgeGroup, ContentPolicy, PolicyScope};
