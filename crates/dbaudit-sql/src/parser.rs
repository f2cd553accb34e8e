//! SQL parsing using datafusion-sqlparser-rs
//!
//! Parses observed query text into AST, picking the dialect from the
//! database kind reported in the snapshot stats.

use sqlparser::ast::Statement;
use sqlparser::dialect::{
    BigQueryDialect, Dialect, GenericDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect,
    SnowflakeDialect,
};
use sqlparser::parser::{Parser, ParserError};

/// SQL parser with configurable dialect
pub struct SqlParser {
    dialect: Box<dyn Dialect>,
}

impl SqlParser {
    /// Create a parser from a database kind (`DatabaseStats::kind`), generic when unknown
    pub fn for_database_kind(kind: Option<&str>) -> Self {
        let dialect: Box<dyn Dialect> = match kind.map(|k| k.to_lowercase()).as_deref() {
            Some("postgres") | Some("postgresql") => Box::new(PostgreSqlDialect {}),
            Some("mysql") | Some("mariadb") => Box::new(MySqlDialect {}),
            Some("sqlite") => Box::new(SQLiteDialect {}),
            Some("sqlserver") | Some("mssql") => Box::new(MsSqlDialect {}),
            Some("bigquery") => Box::new(BigQueryDialect {}),
            Some("snowflake") => Box::new(SnowflakeDialect {}),
            _ => Box::new(GenericDialect {}),
        };
        Self { dialect }
    }

    /// Parse SQL string into AST
    pub fn parse(&self, sql: &str) -> Result<ParsedSql, ParseError> {
        match Parser::parse_sql(&*self.dialect, sql) {
            Ok(statements) => Ok(ParsedSql { statements }),
            Err(error) => Err(ParseError { error }),
        }
    }
}

/// Successfully parsed SQL with AST
#[derive(Debug, Clone)]
pub struct ParsedSql {
    /// Parsed statements
    pub statements: Vec<Statement>,
}

/// SQL parsing error
#[derive(Debug, thiserror::Error)]
#[error("SQL parse error: {error}")]
pub struct ParseError {
    /// Parser error from sqlparser
    pub error: ParserError,
}
