//! # MongoDB
//!
//! Lowers a compiled query into a MongoDB filter document and find options.

use serde_json::{Map, Value as Json, json};
use support_store::store::serializer::{Clause, Serializer};
use support_store::{Cmp, Direction, Query, Test, Value};

/// A query ready to be lowered into MongoDB syntax.
#[derive(Clone, Copy, Debug)]
pub struct MongoQuery<'a>(&'a Query);

impl<'a> MongoQuery<'a> {
    /// Wrap `query` for serialization.
    #[must_use]
    pub const fn new(query: &'a Query) -> Self {
        Self(query)
    }

    /// The wrapped query.
    #[must_use]
    pub const fn query(&self) -> &Query {
        self.0
    }
}

/// The serialized filter document and find options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Output {
    /// The filter document. `{}` matches every document.
    pub filter: Json,

    /// Find options: `sort`, `skip` and `limit` when set.
    pub options: Json,
}

/// MongoDB `Serializer` builds a filter document clause by clause.
#[derive(Debug, Default)]
pub struct Mongo {
    clauses: Vec<MongoClause>,
    filter: Option<Json>,
    sort: Map<String, Json>,
    limit: Option<u64>,
    skip: Option<u64>,
}

/// `MongoClause` holds the conjunction and conditions of an open clause.
#[derive(Debug)]
struct MongoClause {
    conjunction: &'static str,
    conditions: Vec<Json>,
}

impl Mongo {
    /// Create an empty serializer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the generated filter document and options.
    #[must_use]
    pub fn output(self) -> Output {
        let mut options = Map::new();
        if !self.sort.is_empty() {
            options.insert("sort".into(), Json::Object(self.sort));
        }
        if let Some(skip) = self.skip {
            options.insert("skip".into(), json!(skip));
        }
        if let Some(limit) = self.limit {
            options.insert("limit".into(), json!(limit));
        }

        Output {
            filter: self.filter.unwrap_or_else(|| json!({})),
            options: Json::Object(options),
        }
    }

    fn open(&mut self, conjunction: &'static str) -> &mut Self {
        self.clauses.push(MongoClause {
            conjunction,
            conditions: vec![],
        });
        self
    }

    fn push(&mut self, document: Json) {
        match self.clauses.last_mut() {
            Some(clause) => clause.conditions.push(document),
            None => self.filter = Some(document),
        }
    }
}

impl Serializer for Mongo {
    type Clause = Self;

    fn or_clause(&mut self) -> &mut Self::Clause {
        self.open("$or")
    }

    fn and_clause(&mut self) -> &mut Self::Clause {
        self.open("$and")
    }

    fn order(&mut self, field: &str, direction: Direction) {
        let direction = match direction {
            Direction::Ascending => 1,
            Direction::Descending => -1,
        };
        self.sort.insert(field.to_string(), json!(direction));
    }

    fn limit(&mut self, limit: Option<u64>, skip: Option<u64>) {
        self.limit = limit;
        self.skip = skip;
    }
}

impl Clause for Mongo {
    fn condition(&mut self, field: &str, test: &Test) {
        let test = match test {
            Test::Compare(cmp, value) => {
                let op = match cmp {
                    Cmp::Eq => "$eq",
                    Cmp::Ne => "$ne",
                    Cmp::Gt => "$gt",
                    Cmp::Ge => "$gte",
                    Cmp::Lt => "$lt",
                    Cmp::Le => "$lte",
                };
                json!({ op: to_json(value) })
            }
            // null is absent: `$eq: null` matches missing and null fields
            Test::Exists(true) => json!({ "$ne": null }),
            Test::Exists(false) => json!({ "$eq": null }),
            Test::In(values) => json!({ "$in": values.iter().map(to_json).collect::<Json>() }),
            Test::NotIn(values) => json!({ "$nin": values.iter().map(to_json).collect::<Json>() }),
        };
        self.push(json!({ field: test }));
    }

    fn close(&mut self) {
        let Some(clause) = self.clauses.pop() else {
            return;
        };

        // a single-condition AND is just the condition
        let document = match (clause.conjunction, clause.conditions.len()) {
            ("$and", 0) => json!({}),
            ("$or", 0) => json!({ "$nor": [{}] }),
            ("$and", 1) => clause.conditions.into_iter().next().unwrap_or_default(),
            (conjunction, _) => json!({ conjunction: clause.conditions }),
        };
        self.push(document);
    }
}

fn to_json(value: &Value) -> Json {
    match value {
        Value::Bool(b) => json!(b),
        Value::Int(i) => json!(i),
        Value::Float(f) => json!(f),
        Value::Id(id) => json!(id.to_string()),
        Value::Timestamp(ts) => json!(ts),
        Value::Str(s) => json!(s),
    }
}
