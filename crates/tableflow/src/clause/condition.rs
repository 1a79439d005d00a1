//! WHERE / HAVING / ON conditions.

use super::ClauseNode;
use super::column::{Column, Operand};
use crate::ident::Dialect;
use crate::query::QueryBuilder;
use crate::table::TableId;
use std::collections::BTreeSet;

/// Binary comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
    Glob,
    In,
    NotIn,
}

impl BinaryOp {
    /// SQL text including surrounding spaces for keyword operators.
    ///
    /// Symbolic operators are written without spaces: `` `a`=1 ``.
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Like => " LIKE ",
            Self::NotLike => " NOT LIKE ",
            Self::Glob => " GLOB ",
            Self::In => " IN ",
            Self::NotIn => " NOT IN ",
        }
    }
}

/// A single boolean condition.
#[derive(Debug, Clone)]
pub enum Condition {
    Binary {
        column: Column,
        op: BinaryOp,
        operand: Operand,
    },
    Null {
        column: Column,
        negated: bool,
    },
    Between {
        column: Column,
        low: Operand,
        high: Operand,
        negated: bool,
    },
    Exists {
        query: Box<QueryBuilder>,
        negated: bool,
    },
    /// Nested group, rendered in parentheses.
    Group(ConditionGroup),
}

impl Condition {
    /// `EXISTS (SELECT ...)`
    pub fn exists(query: QueryBuilder) -> Self {
        Self::Exists {
            query: Box::new(query),
            negated: false,
        }
    }

    /// `NOT EXISTS (SELECT ...)`
    pub fn not_exists(query: QueryBuilder) -> Self {
        Self::Exists {
            query: Box::new(query),
            negated: true,
        }
    }

    /// `self AND other`
    pub fn and(self, other: impl Into<Condition>) -> ConditionGroup {
        ConditionGroup::from(self).and(other)
    }

    /// `self OR other`
    pub fn or(self, other: impl Into<Condition>) -> ConditionGroup {
        ConditionGroup::from(self).or(other)
    }

    fn is_empty(&self) -> bool {
        matches!(self, Self::Group(group) if group.is_empty())
    }
}

impl ClauseNode for Condition {
    fn write_sql(&self, out: &mut String, dialect: Dialect) {
        match self {
            Self::Binary {
                column,
                op,
                operand,
            } => match (op, operand) {
                // `IN ()` is not valid SQL everywhere; an empty list matches nothing.
                (BinaryOp::In, Operand::List(values)) if values.is_empty() => {
                    out.push_str("1=0")
                }
                (BinaryOp::NotIn, Operand::List(values)) if values.is_empty() => {
                    out.push_str("1=1")
                }
                _ => {
                    column.write_sql(out, dialect);
                    out.push_str(op.as_sql());
                    operand.write_sql(out, dialect);
                }
            },
            Self::Null { column, negated } => {
                column.write_sql(out, dialect);
                out.push_str(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Self::Between {
                column,
                low,
                high,
                negated,
            } => {
                column.write_sql(out, dialect);
                out.push_str(if *negated { " NOT BETWEEN " } else { " BETWEEN " });
                low.write_sql(out, dialect);
                out.push_str(" AND ");
                high.write_sql(out, dialect);
            }
            Self::Exists { query, negated } => {
                out.push_str(if *negated { "NOT EXISTS (" } else { "EXISTS (" });
                query.write_sql(out, dialect);
                out.push(')');
            }
            Self::Group(group) => {
                out.push('(');
                group.write_sql(out, dialect);
                out.push(')');
            }
        }
    }

    fn referenced_tables(&self, tables: &mut BTreeSet<TableId>) {
        match self {
            Self::Binary { operand, .. } => operand.referenced_tables(tables),
            Self::Null { .. } => {}
            Self::Between { low, high, .. } => {
                low.referenced_tables(tables);
                high.referenced_tables(tables);
            }
            Self::Exists { query, .. } => query.collect_tables(tables),
            Self::Group(group) => group.referenced_tables(tables),
        }
    }
}

impl From<ConditionGroup> for Condition {
    fn from(group: ConditionGroup) -> Self {
        Condition::Group(group)
    }
}

/// Boolean operator joining a condition to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    fn as_sql(self) -> &'static str {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// Ordered conditions joined by explicit `AND` / `OR`.
///
/// No precedence is inferred: `a OR b AND c` renders exactly in that order.
/// Use a nested group (`Condition::Group`) to force parentheses.
#[derive(Debug, Clone, Default)]
pub struct ConditionGroup {
    items: Vec<(Connector, Condition)>,
}

impl ConditionGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// All conditions joined with `AND`.
    pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Self {
        let mut group = Self::new();
        for c in conditions {
            group.push(Connector::And, c);
        }
        group
    }

    /// All conditions joined with `OR`.
    pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Self {
        let mut group = Self::new();
        for c in conditions {
            group.push(Connector::Or, c);
        }
        group
    }

    /// Append with `AND`.
    pub fn and(mut self, condition: impl Into<Condition>) -> Self {
        self.push(Connector::And, condition.into());
        self
    }

    /// Append with `OR`.
    pub fn or(mut self, condition: impl Into<Condition>) -> Self {
        self.push(Connector::Or, condition.into());
        self
    }

    pub fn push(&mut self, connector: Connector, condition: Condition) {
        self.items.push((connector, condition));
    }

    /// True when nothing would be rendered.
    pub fn is_empty(&self) -> bool {
        self.items.iter().all(|(_, c)| c.is_empty())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl ClauseNode for ConditionGroup {
    fn write_sql(&self, out: &mut String, dialect: Dialect) {
        let mut first = true;
        for (connector, condition) in &self.items {
            if condition.is_empty() {
                continue;
            }
            if !first {
                out.push_str(connector.as_sql());
            }
            condition.write_sql(out, dialect);
            first = false;
        }
    }

    fn referenced_tables(&self, tables: &mut BTreeSet<TableId>) {
        for (_, condition) in &self.items {
            condition.referenced_tables(tables);
        }
    }
}

impl From<Condition> for ConditionGroup {
    fn from(condition: Condition) -> Self {
        let mut group = Self::new();
        group.push(Connector::And, condition);
        group
    }
}
