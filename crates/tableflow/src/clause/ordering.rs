use super::ClauseNode;
use super::column::Column;
use crate::ident::Dialect;

/// One ORDER BY term. Direction is always rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    column: Column,
    ascending: bool,
}

impl OrderBy {
    pub fn asc(column: Column) -> Self {
        Self {
            column,
            ascending: true,
        }
    }

    pub fn desc(column: Column) -> Self {
        Self {
            column,
            ascending: false,
        }
    }

    pub fn is_ascending(&self) -> bool {
        self.ascending
    }
}

impl ClauseNode for OrderBy {
    fn write_sql(&self, out: &mut String, dialect: Dialect) {
        self.column.write_sql(out, dialect);
        out.push_str(if self.ascending { " ASC" } else { " DESC" });
    }
}

impl From<Column> for OrderBy {
    fn from(column: Column) -> Self {
        Self::asc(column)
    }
}

/// GROUP BY column list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupBy {
    columns: Vec<Column>,
}

impl GroupBy {
    pub fn new(columns: impl IntoIterator<Item = Column>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
        }
    }

    pub fn push(&mut self, column: Column) {
        self.columns.push(column);
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl ClauseNode for GroupBy {
    fn write_sql(&self, out: &mut String, dialect: Dialect) {
        super::write_list(out, &self.columns, ",", dialect);
    }
}
