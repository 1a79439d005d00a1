//! UPDATE assignments and conflict handling.

use super::ClauseNode;
use super::column::{Column, Operand};
use crate::ident::Dialect;
use crate::table::TableId;
use std::collections::BTreeSet;

/// `UPDATE OR <action>` conflict resolution (SQLite only; ignored for Postgres).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictAction {
    Rollback,
    Abort,
    Replace,
    Fail,
    Ignore,
}

impl ConflictAction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Rollback => "ROLLBACK",
            Self::Abort => "ABORT",
            Self::Replace => "REPLACE",
            Self::Fail => "FAIL",
            Self::Ignore => "IGNORE",
        }
    }
}

/// `` `column`=value ``
#[derive(Debug, Clone)]
pub struct Assignment {
    column: Column,
    value: Operand,
}

impl Assignment {
    pub fn new(column: Column, value: impl Into<Operand>) -> Self {
        Self {
            column: column.unqualified(),
            value: value.into(),
        }
    }
}

impl ClauseNode for Assignment {
    fn write_sql(&self, out: &mut String, dialect: Dialect) {
        self.column.write_sql(out, dialect);
        out.push('=');
        self.value.write_sql(out, dialect);
    }

    fn referenced_tables(&self, tables: &mut BTreeSet<TableId>) {
        self.value.referenced_tables(tables);
    }
}
