//! SQL parsing for observed queries
//!
//! This crate handles:
//! - Parsing query text with datafusion-sqlparser-rs, per database kind
//! - Finding the entities a query reads or writes
//! - Building short, stable query names for violation messages

pub mod describe;
pub mod parser;

pub use describe::{describe_query, QueryDescription};
pub use parser::{ParseError, ParsedSql, SqlParser};
