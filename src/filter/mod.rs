//! JSON where/order dialect compiled into parameterized PostgreSQL.
//!
//! Column and table names are validated as identifiers and quoted; every
//! value becomes a `$n` parameter.

pub mod error;
pub mod filter;
pub mod filter_order;
pub mod filter_where;
pub mod types;

pub use error::FilterError;
pub use filter::Filter;
pub use types::*;
