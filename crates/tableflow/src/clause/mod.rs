//! Composable statement fragments.
//!
//! Each clause renders its own SQL fragment and, where it can reach other
//! tables (subqueries, joins), reports them so the owning builder can compute
//! its full table dependency set.

mod column;
mod condition;
mod from;
mod join;
mod ordering;
mod projection;
mod set;

pub use column::{Column, Operand, SqlValue};
pub use condition::{BinaryOp, Condition, ConditionGroup, Connector};
pub use from::{FromClause, IndexedBy, Source};
pub use join::{Join, JoinKind};
pub use ordering::{GroupBy, OrderBy};
pub use projection::Projection;
pub use set::{Assignment, ConflictAction};

use crate::ident::Dialect;
use crate::table::TableId;
use std::collections::BTreeSet;

/// A renderable statement fragment.
pub trait ClauseNode {
    /// Append this fragment's SQL to `out`.
    fn write_sql(&self, out: &mut String, dialect: Dialect);

    /// Add every physical table this fragment reads from to `tables`.
    fn referenced_tables(&self, tables: &mut BTreeSet<TableId>) {
        let _ = tables;
    }

    /// Render this fragment on its own.
    fn to_sql(&self, dialect: Dialect) -> String {
        let mut out = String::new();
        self.write_sql(&mut out, dialect);
        out
    }
}

/// Write `items` separated by `sep`.
pub(crate) fn write_list<T: ClauseNode>(
    out: &mut String,
    items: &[T],
    sep: &str,
    dialect: Dialect,
) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        item.write_sql(out, dialect);
    }
}
