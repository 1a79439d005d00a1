use super::ClauseNode;
use super::column::Column;
use crate::ident::Dialect;

/// The column list of a SELECT.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Projection {
    /// `*`
    #[default]
    All,
    /// `` `a`,`b` `` (no space after the comma); an empty list renders `*`
    Columns(Vec<Column>),
    /// `COUNT(*)`
    Count,
}

impl ClauseNode for Projection {
    fn write_sql(&self, out: &mut String, dialect: Dialect) {
        match self {
            Self::All => out.push('*'),
            Self::Columns(cols) if cols.is_empty() => out.push('*'),
            Self::Columns(cols) => super::write_list(out, cols, ",", dialect),
            Self::Count => out.push_str("COUNT(*)"),
        }
    }
}
