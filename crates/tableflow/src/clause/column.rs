//! Column references, literal values and condition operands.

use super::ClauseNode;
use super::condition::{BinaryOp, Condition};
use crate::alias::NameAlias;
use crate::ident::{Dialect, clean_ident};
use crate::query::QueryBuilder;
use crate::table::{Entity, TableId};
use std::collections::BTreeSet;

/// A column, optionally qualified by a table name or alias.
///
/// ```
/// use tableflow::{Column, ClauseNode, Dialect};
///
/// assert_eq!(Column::new("name").to_sql(Dialect::Sqlite), "`name`");
/// assert_eq!(
///     Column::qualified("users", "name").to_sql(Dialect::Sqlite),
///     "`users`.`name`"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    table: Option<String>,
    name: String,
}

impl Column {
    /// Unqualified column. `*` is kept as a bare wildcard.
    pub fn new(name: &str) -> Self {
        Self {
            table: None,
            name: clean_ident(name),
        }
    }

    /// Column qualified by a table name or alias.
    pub fn qualified(table: &str, name: &str) -> Self {
        let table = clean_ident(table);
        Self {
            table: (!table.is_empty()).then_some(table),
            name: clean_ident(name),
        }
    }

    /// Column of an entity's table: `` `Table`.`name` ``.
    pub fn of<E: Entity>(name: &str) -> Self {
        Self::qualified(E::TABLE_NAME, name)
    }

    /// Qualify with a table reference, preferring its alias.
    pub fn with_table(mut self, table: &NameAlias) -> Self {
        self.table = Some(table.reference().to_string());
        self
    }

    /// Drop any qualifier.
    pub fn unqualified(mut self) -> Self {
        self.table = None;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    fn binary(self, op: BinaryOp, operand: impl Into<Operand>) -> Condition {
        Condition::Binary {
            column: self,
            op,
            operand: operand.into(),
        }
    }

    /// `column=operand`
    pub fn eq(self, operand: impl Into<Operand>) -> Condition {
        self.binary(BinaryOp::Eq, operand)
    }

    /// `column!=operand`
    pub fn not_eq(self, operand: impl Into<Operand>) -> Condition {
        self.binary(BinaryOp::NotEq, operand)
    }

    /// `column>operand`
    pub fn gt(self, operand: impl Into<Operand>) -> Condition {
        self.binary(BinaryOp::Gt, operand)
    }

    /// `column>=operand`
    pub fn gte(self, operand: impl Into<Operand>) -> Condition {
        self.binary(BinaryOp::Gte, operand)
    }

    /// `column<operand`
    pub fn lt(self, operand: impl Into<Operand>) -> Condition {
        self.binary(BinaryOp::Lt, operand)
    }

    /// `column<=operand`
    pub fn lte(self, operand: impl Into<Operand>) -> Condition {
        self.binary(BinaryOp::Lte, operand)
    }

    /// `column LIKE pattern`
    pub fn like(self, pattern: impl Into<Operand>) -> Condition {
        self.binary(BinaryOp::Like, pattern)
    }

    /// `column NOT LIKE pattern`
    pub fn not_like(self, pattern: impl Into<Operand>) -> Condition {
        self.binary(BinaryOp::NotLike, pattern)
    }

    /// `column GLOB pattern`
    pub fn glob(self, pattern: impl Into<Operand>) -> Condition {
        self.binary(BinaryOp::Glob, pattern)
    }

    /// `column IN (v1,v2,...)`
    pub fn in_list<V: Into<SqlValue>>(self, values: impl IntoIterator<Item = V>) -> Condition {
        self.binary(BinaryOp::In, Operand::list(values))
    }

    /// `column NOT IN (v1,v2,...)`
    pub fn not_in<V: Into<SqlValue>>(self, values: impl IntoIterator<Item = V>) -> Condition {
        self.binary(BinaryOp::NotIn, Operand::list(values))
    }

    /// `column IN (SELECT ...)`
    pub fn in_query(self, query: QueryBuilder) -> Condition {
        self.binary(BinaryOp::In, query)
    }

    /// `column IS NULL`
    pub fn is_null(self) -> Condition {
        Condition::Null {
            column: self,
            negated: false,
        }
    }

    /// `column IS NOT NULL`
    pub fn is_not_null(self) -> Condition {
        Condition::Null {
            column: self,
            negated: true,
        }
    }

    /// `column BETWEEN low AND high`
    pub fn between(self, low: impl Into<Operand>, high: impl Into<Operand>) -> Condition {
        Condition::Between {
            column: self,
            low: low.into(),
            high: high.into(),
            negated: false,
        }
    }

    /// `column NOT BETWEEN low AND high`
    pub fn not_between(self, low: impl Into<Operand>, high: impl Into<Operand>) -> Condition {
        Condition::Between {
            column: self,
            low: low.into(),
            high: high.into(),
            negated: true,
        }
    }
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        Column::new(name)
    }
}

impl ClauseNode for Column {
    fn write_sql(&self, out: &mut String, dialect: Dialect) {
        if let Some(table) = &self.table {
            dialect.write_ident(out, table);
            out.push('.');
        }
        if self.name == "*" {
            out.push('*');
        } else {
            dialect.write_ident(out, &self.name);
        }
    }
}

/// A literal value, rendered inline.
///
/// Text is single-quoted with embedded quotes doubled, booleans render as
/// `1`/`0`, blobs as `X'..'`. Non-finite reals have no SQL literal and render
/// as `NULL`.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Bool(bool),
    Blob(Vec<u8>),
}

impl ClauseNode for SqlValue {
    fn write_sql(&self, out: &mut String, _dialect: Dialect) {
        match self {
            Self::Null => out.push_str("NULL"),
            Self::Integer(v) => out.push_str(&v.to_string()),
            Self::Real(v) if v.is_finite() => out.push_str(&v.to_string()),
            Self::Real(_) => out.push_str("NULL"),
            Self::Text(s) => {
                out.push('\'');
                for ch in s.chars() {
                    if ch == '\'' {
                        out.push('\'');
                    }
                    out.push(ch);
                }
                out.push('\'');
            }
            Self::Bool(b) => out.push(if *b { '1' } else { '0' }),
            Self::Blob(bytes) => {
                out.push_str("X'");
                for b in bytes {
                    out.push_str(&format!("{b:02X}"));
                }
                out.push('\'');
            }
        }
    }
}

macro_rules! sql_value_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for SqlValue {
            fn from(v: $t) -> Self {
                SqlValue::Integer(i64::from(v))
            }
        })*
    };
}

sql_value_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        SqlValue::Real(f64::from(v))
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Blob(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

/// Right-hand side of a condition or assignment.
#[derive(Debug, Clone)]
pub enum Operand {
    Value(SqlValue),
    Column(Column),
    List(Vec<SqlValue>),
    Subquery(Box<QueryBuilder>),
}

impl Operand {
    /// A parenthesized value list, as used by `IN`.
    pub fn list<V: Into<SqlValue>>(values: impl IntoIterator<Item = V>) -> Self {
        Operand::List(values.into_iter().map(Into::into).collect())
    }
}

impl ClauseNode for Operand {
    fn write_sql(&self, out: &mut String, dialect: Dialect) {
        match self {
            Self::Value(v) => v.write_sql(out, dialect),
            Self::Column(c) => c.write_sql(out, dialect),
            Self::List(values) => {
                out.push('(');
                super::write_list(out, values, ",", dialect);
                out.push(')');
            }
            Self::Subquery(query) => {
                out.push('(');
                query.write_sql(out, dialect);
                out.push(')');
            }
        }
    }

    fn referenced_tables(&self, tables: &mut BTreeSet<TableId>) {
        if let Self::Subquery(query) = self {
            query.collect_tables(tables);
        }
    }
}

impl From<Column> for Operand {
    fn from(c: Column) -> Self {
        Operand::Column(c)
    }
}

impl From<QueryBuilder> for Operand {
    fn from(q: QueryBuilder) -> Self {
        Operand::Subquery(Box::new(q))
    }
}

impl From<SqlValue> for Operand {
    fn from(v: SqlValue) -> Self {
        Operand::Value(v)
    }
}

macro_rules! operand_from_value {
    ($($t:ty),*) => {
        $(impl From<$t> for Operand {
            fn from(v: $t) -> Self {
                Operand::Value(SqlValue::from(v))
            }
        })*
    };
}

operand_from_value!(i8, i16, i32, i64, u8, u16, u32, f32, f64, bool, &str, String, Vec<u8>);

impl<T: Into<SqlValue>> From<Option<T>> for Operand {
    fn from(v: Option<T>) -> Self {
        Operand::Value(SqlValue::from(v))
    }
}
