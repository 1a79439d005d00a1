//! Table name / alias records and their per-builder cache.

use crate::ident::{Dialect, clean_ident};
use crate::table::TableId;
use std::collections::HashMap;
use std::sync::Arc;

/// A table reference with an optional alias.
///
/// Renders as `` `name` `` or `` `name` AS `alias` ``. Anything that refers back
/// to the table (qualified columns, join conditions) uses the alias when set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameAlias {
    name: TableId,
    alias: Option<String>,
}

impl NameAlias {
    /// Record for `name` without an alias.
    pub fn new(name: TableId) -> Self {
        Self { name, alias: None }
    }

    /// The physical table.
    pub fn name(&self) -> &TableId {
        &self.name
    }

    /// The alias, if any.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The name other clauses should use to refer to this table.
    pub fn reference(&self) -> &str {
        self.alias.as_deref().unwrap_or_else(|| self.name.name())
    }

    /// `` `name`[ AS `alias`] `` for the given dialect.
    pub fn full_name(&self, dialect: Dialect) -> String {
        let mut out = String::new();
        self.write_full_name(&mut out, dialect);
        out
    }

    pub(crate) fn write_full_name(&self, out: &mut String, dialect: Dialect) {
        dialect.write_ident(out, self.name.name());
        if let Some(alias) = &self.alias {
            out.push_str(" AS ");
            dialect.write_ident(out, alias);
        }
    }
}

/// Builds and caches [`NameAlias`] records for one builder.
///
/// Records are handed out as `Arc`s. Aliasing goes through `Arc::make_mut`, so a
/// record already held by another clause is copied, never changed under it.
#[derive(Debug, Clone, Default)]
pub struct AliasResolver {
    cache: HashMap<TableId, Arc<NameAlias>>,
}

impl AliasResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached record for `table`, created without an alias on first use.
    pub fn resolve(&mut self, table: &TableId) -> Arc<NameAlias> {
        Arc::clone(
            self.cache
                .entry(table.clone())
                .or_insert_with(|| Arc::new(NameAlias::new(table.clone()))),
        )
    }

    /// A copy of `current` carrying `alias`; `current` is left untouched.
    ///
    /// An empty alias (after stripping quotes) clears it.
    pub fn with_alias(current: &Arc<NameAlias>, alias: &str) -> Arc<NameAlias> {
        let mut next = Arc::clone(current);
        Arc::make_mut(&mut next).alias = clean_alias(alias);
        next
    }

    /// Number of cached records.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

fn clean_alias(alias: &str) -> Option<String> {
    let cleaned = clean_ident(alias);
    (!cleaned.is_empty()).then_some(cleaned)
}
