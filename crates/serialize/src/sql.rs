//! # SQL
//!
//! Lowers a compiled query into a parameterized `SELECT` statement. Values
//! are never inlined: each one becomes a `$n` placeholder with the value
//! pushed onto [`Output::params`].

use support_store::store::serializer::{Clause, Serializer};
use support_store::{Cmp, Direction, Query, Test, Value};

/// A query against `table`, ready to be lowered into SQL.
#[derive(Clone, Copy, Debug)]
pub struct SqlQuery<'a> {
    table: &'a str,
    query: &'a Query,
}

impl<'a> SqlQuery<'a> {
    /// Wrap `query` for serialization against `table`.
    #[must_use]
    pub const fn new(table: &'a str, query: &'a Query) -> Self {
        Self { table, query }
    }

    /// The table (collection) queried.
    #[must_use]
    pub const fn table(&self) -> &str {
        self.table
    }

    /// The wrapped query.
    #[must_use]
    pub const fn query(&self) -> &Query {
        self.query
    }
}

/// The generated statement and its positional parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Output {
    /// The `SELECT` statement.
    pub statement: String,

    /// Parameter values, `$1` first.
    pub params: Vec<Value>,
}

/// SQL `Serializer` implements `Serializer` to generate SQL queries.
#[derive(Debug)]
pub struct Sql {
    has_clause: bool,
    has_order: bool,
    output: String,
    params: Vec<Value>,
    clauses: Vec<SqlClause>,
}

/// `SqlClause` is used to store the conjunction and condition state of a
/// clause.
#[derive(Debug)]
struct SqlClause {
    conjunction: &'static str,
    has_condition: bool,
}

impl Sql {
    /// Create a new `Serializer` selecting every row of `table`.
    #[must_use]
    pub fn new(table: &str) -> Self {
        Self {
            has_clause: false,
            has_order: false,
            output: format!("SELECT * FROM {}", quote(table)),
            params: vec![],
            clauses: vec![],
        }
    }

    /// Returns the generated statement and parameters.
    #[must_use]
    pub fn output(self) -> Output {
        Output {
            statement: self.output,
            params: self.params,
        }
    }

    // Logic common to both clause methods.
    fn add_clause(&mut self, conjunction: &'static str) -> &mut Self {
        // add the WHERE keyword when this is the first clause
        if !self.has_clause {
            self.output.push_str(" WHERE ");
        }
        self.has_clause = true;

        self.separate();
        self.output.push('(');
        self.clauses.push(SqlClause {
            conjunction,
            has_condition: false,
        });
        self
    }

    // Only add a conjunction when the current clause already has a condition.
    fn separate(&mut self) {
        if let Some(current) = self.clauses.last_mut() {
            if current.has_condition {
                self.output.push_str(current.conjunction);
            }
            current.has_condition = true;
        }
    }

    fn param(&mut self, value: &Value) -> String {
        self.params.push(value.clone());
        format!("${}", self.params.len())
    }

    fn list(&mut self, values: &[Value]) -> String {
        let placeholders: Vec<String> = values.iter().map(|v| self.param(v)).collect();
        placeholders.join(", ")
    }
}

impl Serializer for Sql {
    type Clause = Self;

    fn or_clause(&mut self) -> &mut Self::Clause {
        self.add_clause(" OR ")
    }

    fn and_clause(&mut self) -> &mut Self::Clause {
        self.add_clause(" AND ")
    }

    fn order(&mut self, field: &str, direction: Direction) {
        self.output.push_str(if self.has_order { ", " } else { " ORDER BY " });
        self.has_order = true;

        let direction = match direction {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        };
        self.output.push_str(&format!("{} {direction}", quote(field)));
    }

    fn limit(&mut self, limit: Option<u64>, skip: Option<u64>) {
        if let Some(limit) = limit {
            self.output.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(skip) = skip {
            self.output.push_str(&format!(" OFFSET {skip}"));
        }
    }
}

impl Clause for Sql {
    fn condition(&mut self, field: &str, test: &Test) {
        self.separate();

        let field = quote(field);
        let condition = match test {
            Test::Compare(cmp, value) => {
                let op = match cmp {
                    Cmp::Eq => "=",
                    Cmp::Ne => "<>",
                    Cmp::Gt => ">",
                    Cmp::Ge => ">=",
                    Cmp::Lt => "<",
                    Cmp::Le => "<=",
                };
                format!("{field} {op} {}", self.param(value))
            }
            Test::Exists(true) => format!("{field} IS NOT NULL"),
            Test::Exists(false) => format!("{field} IS NULL"),
            Test::In(values) if values.is_empty() => "1 = 0".to_string(),
            Test::NotIn(values) if values.is_empty() => "1 = 1".to_string(),
            Test::In(values) => format!("{field} IN ({})", self.list(values)),
            Test::NotIn(values) => format!("{field} NOT IN ({})", self.list(values)),
        };
        self.output.push_str(&condition);
    }

    fn close(&mut self) {
        // an empty AND matches every row, an empty OR matches none
        if let Some(SqlClause {
            conjunction,
            has_condition: false,
        }) = self.clauses.pop()
        {
            self.output.push_str(if conjunction == " OR " { "1 = 0" } else { "1 = 1" });
        }
        self.output.push(')');
    }
}

// Identifiers are double-quoted with embedded quotes doubled.
fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
