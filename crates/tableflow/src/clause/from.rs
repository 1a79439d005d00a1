//! FROM sources and the INDEXED BY hint.

use super::ClauseNode;
use crate::alias::{AliasResolver, NameAlias};
use crate::ident::{Dialect, clean_ident};
use crate::query::QueryBuilder;
use crate::table::TableId;
use std::collections::BTreeSet;
use std::sync::Arc;

/// What a FROM or JOIN reads from: a table or a nested query.
#[derive(Debug, Clone)]
pub enum Source {
    Table(Arc<NameAlias>),
    Subquery {
        query: Box<QueryBuilder>,
        alias: Option<String>,
    },
}

impl Source {
    /// The physical table, if this is a bare table reference.
    pub fn table(&self) -> Option<&TableId> {
        match self {
            Self::Table(name) => Some(name.name()),
            Self::Subquery { .. } => None,
        }
    }

    pub fn alias(&self) -> Option<&str> {
        match self {
            Self::Table(name) => name.alias(),
            Self::Subquery { alias, .. } => alias.as_deref(),
        }
    }

    /// The nested query, if any.
    pub fn subquery(&self) -> Option<&QueryBuilder> {
        match self {
            Self::Table(_) => None,
            Self::Subquery { query, .. } => Some(query),
        }
    }

    pub(crate) fn set_alias(&mut self, new_alias: &str) {
        match self {
            Self::Table(name) => *name = AliasResolver::with_alias(name, new_alias),
            Self::Subquery { alias, .. } => {
                let cleaned = clean_ident(new_alias);
                *alias = (!cleaned.is_empty()).then_some(cleaned);
            }
        }
    }

    /// Render, using `fallback_alias` for an unaliased subquery when the
    /// dialect requires one.
    pub(crate) fn write_source(&self, out: &mut String, dialect: Dialect, fallback_alias: &str) {
        match self {
            Self::Table(name) => name.write_full_name(out, dialect),
            Self::Subquery { query, alias } => {
                out.push('(');
                query.write_sql(out, dialect);
                out.push(')');
                match alias {
                    Some(alias) => {
                        out.push_str(" AS ");
                        dialect.write_ident(out, alias);
                    }
                    None if dialect.requires_subquery_alias() => {
                        out.push_str(" AS ");
                        dialect.write_ident(out, fallback_alias);
                    }
                    None => {}
                }
            }
        }
    }
}

impl ClauseNode for Source {
    fn write_sql(&self, out: &mut String, dialect: Dialect) {
        self.write_source(out, dialect, "t");
    }

    fn referenced_tables(&self, tables: &mut BTreeSet<TableId>) {
        match self {
            Self::Table(name) => {
                tables.insert(name.name().clone());
            }
            Self::Subquery { query, .. } => query.collect_tables(tables),
        }
    }
}

/// `INDEXED BY <index>` hint following a table reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedBy {
    index: String,
}

impl IndexedBy {
    pub fn new(index: &str) -> Self {
        Self {
            index: clean_ident(index),
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }
}

impl ClauseNode for IndexedBy {
    fn write_sql(&self, out: &mut String, dialect: Dialect) {
        out.push_str("INDEXED BY ");
        dialect.write_ident(out, &self.index);
    }
}

/// The FROM clause body: source plus optional index hint.
///
/// The `FROM` keyword itself is written by the owning builder, which omits it
/// for UPDATE statements.
#[derive(Debug, Clone)]
pub struct FromClause {
    source: Source,
    indexed_by: Option<IndexedBy>,
}

impl FromClause {
    pub(crate) fn new(source: Source) -> Self {
        Self {
            source,
            indexed_by: None,
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub(crate) fn source_mut(&mut self) -> &mut Source {
        &mut self.source
    }

    pub fn indexed_by(&self) -> Option<&IndexedBy> {
        self.indexed_by.as_ref()
    }

    pub(crate) fn set_indexed_by(&mut self, index: IndexedBy) {
        self.indexed_by = Some(index);
    }
}

impl ClauseNode for FromClause {
    fn write_sql(&self, out: &mut String, dialect: Dialect) {
        self.source.write_sql(out, dialect);
        // INDEXED BY is SQLite syntax.
        if let (Some(index), Dialect::Sqlite) = (&self.indexed_by, dialect) {
            out.push(' ');
            index.write_sql(out, dialect);
        }
    }

    fn referenced_tables(&self, tables: &mut BTreeSet<TableId>) {
        self.source.referenced_tables(tables);
    }
}
