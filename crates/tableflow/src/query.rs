//! Statement composition: entry points, sources and the [`QueryBuilder`].
//!
//! ```
//! use tableflow::{select, Column};
//!
//! let mut query = select().from("SimpleModel")?;
//! query
//!     .inner_join("TwoColumnModel")?
//!     .on(Column::new("name").eq(Column::qualified("TwoColumnModel", "name")));
//!
//! assert_eq!(
//!     query.render(),
//!     "SELECT * FROM `SimpleModel` INNER JOIN `TwoColumnModel` ON `name`=`TwoColumnModel`.`name`"
//! );
//! # Ok::<(), tableflow::FlowError>(())
//! ```

use crate::alias::AliasResolver;
use crate::clause::{
    Assignment, ClauseNode, Column, Condition, ConditionGroup, ConflictAction, Connector,
    FromClause, GroupBy, IndexedBy, Join, JoinKind, OrderBy, Operand, Projection, Source,
    write_list,
};
use crate::error::{FlowError, FlowResult};
use crate::ident::Dialect;
use crate::register::ChangeAction;
use crate::table::{Entity, IntoTableId, Table, TableId};
use std::collections::BTreeSet;
use std::fmt;

/// Statement kind of a builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Update,
    Delete,
}

impl StatementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone)]
enum Statement {
    Select {
        projection: Projection,
        distinct: bool,
    },
    Update {
        conflict: Option<ConflictAction>,
        assignments: Vec<Assignment>,
    },
    Delete,
}

impl Statement {
    fn kind(&self) -> StatementKind {
        match self {
            Self::Select { .. } => StatementKind::Select,
            Self::Update { .. } => StatementKind::Update,
            Self::Delete => StatementKind::Delete,
        }
    }
}

// ==================== Sources ====================

/// A resolved query source: a physical table or a nested SELECT.
#[derive(Debug, Clone)]
pub enum SourceSpec {
    Table(TableId),
    Query(QueryBuilder),
}

/// Anything usable after `FROM`, `UPDATE` or `JOIN`.
pub trait IntoSource {
    fn into_source(self) -> FlowResult<SourceSpec>;
}

macro_rules! into_source_via_table_id {
    ($($t:ty),*) => {
        $(impl IntoSource for $t {
            fn into_source(self) -> FlowResult<SourceSpec> {
                self.into_table_id().map(SourceSpec::Table)
            }
        })*
    };
}

into_source_via_table_id!(TableId, &TableId, &str, String);

impl<E: Entity> IntoSource for Table<E> {
    fn into_source(self) -> FlowResult<SourceSpec> {
        self.into_table_id().map(SourceSpec::Table)
    }
}

impl IntoSource for QueryBuilder {
    fn into_source(self) -> FlowResult<SourceSpec> {
        Ok(SourceSpec::Query(self))
    }
}

impl IntoSource for SourceSpec {
    fn into_source(self) -> FlowResult<SourceSpec> {
        Ok(self)
    }
}

// ==================== Entry points ====================

/// SELECT base waiting for its FROM source.
#[derive(Debug, Clone, Default)]
pub struct Select {
    projection: Projection,
    distinct: bool,
}

impl Select {
    /// `SELECT DISTINCT ...`
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Attach the FROM source.
    pub fn from(self, source: impl IntoSource) -> FlowResult<QueryBuilder> {
        QueryBuilder::with_source(
            Statement::Select {
                projection: self.projection,
                distinct: self.distinct,
            },
            source.into_source()?,
        )
    }
}

/// DELETE base waiting for its FROM table.
#[derive(Debug, Clone, Copy, Default)]
pub struct Delete;

impl Delete {
    pub fn from(self, source: impl IntoSource) -> FlowResult<QueryBuilder> {
        QueryBuilder::with_source(Statement::Delete, source.into_source()?)
    }
}

/// `SELECT *`
pub fn select() -> Select {
    Select::default()
}

/// `SELECT <columns>`
pub fn select_columns<C: Into<Column>>(columns: impl IntoIterator<Item = C>) -> Select {
    Select {
        projection: Projection::Columns(columns.into_iter().map(Into::into).collect()),
        distinct: false,
    }
}

/// `SELECT COUNT(*)`
pub fn select_count() -> Select {
    Select {
        projection: Projection::Count,
        distinct: false,
    }
}

/// `DELETE FROM ...`
pub fn delete() -> Delete {
    Delete
}

/// `UPDATE <table>`
pub fn update(source: impl IntoSource) -> FlowResult<QueryBuilder> {
    QueryBuilder::with_source(
        Statement::Update {
            conflict: None,
            assignments: Vec::new(),
        },
        source.into_source()?,
    )
}

// ==================== Builder ====================

/// Position of a join within its builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JoinId(usize);

impl JoinId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A composed statement.
///
/// Owns every clause it renders; `clone()` deep-copies all of them, nested
/// subqueries included. Builders are validated while they are composed, so
/// [`render`](Self::render) cannot fail.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    statement: Statement,
    from: FromClause,
    joins: Vec<Join>,
    where_group: ConditionGroup,
    group_by: GroupBy,
    having: ConditionGroup,
    order_by: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
    dialect: Dialect,
    resolver: AliasResolver,
}

impl QueryBuilder {
    fn with_source(statement: Statement, spec: SourceSpec) -> FlowResult<Self> {
        let mut resolver = AliasResolver::new();
        let source = match spec {
            SourceSpec::Table(table) => Source::Table(resolver.resolve(&table)),
            SourceSpec::Query(query) => {
                if statement.kind() != StatementKind::Select {
                    return Err(FlowError::configuration(format!(
                        "{} cannot read from a subquery",
                        statement.kind().as_str()
                    )));
                }
                ensure_select_subquery(&query)?;
                Source::Subquery {
                    query: Box::new(query),
                    alias: None,
                }
            }
        };

        Ok(Self {
            statement,
            from: FromClause::new(source),
            joins: Vec::new(),
            where_group: ConditionGroup::new(),
            group_by: GroupBy::default(),
            having: ConditionGroup::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            dialect: Dialect::default(),
            resolver,
        })
    }

    // ==================== FROM ====================

    /// Set or replace the FROM alias.
    pub fn alias(&mut self, alias: &str) -> &mut Self {
        self.from.source_mut().set_alias(alias);
        self
    }

    /// `INDEXED BY <index>` after the FROM table (SQLite only).
    pub fn indexed_by(&mut self, index: &str) -> FlowResult<&mut Self> {
        if self.from.source().table().is_none() {
            return Err(FlowError::configuration(
                "INDEXED BY requires a table source",
            ));
        }
        let index = IndexedBy::new(index);
        if index.index().is_empty() {
            return Err(FlowError::configuration("index name cannot be empty"));
        }
        self.from.set_indexed_by(index);
        Ok(self)
    }

    // ==================== JOIN ====================

    /// Append a join and return a handle to configure it.
    pub fn join(&mut self, source: impl IntoSource, kind: JoinKind) -> FlowResult<JoinHandle<'_>> {
        if self.kind() != StatementKind::Select {
            return Err(FlowError::configuration(format!(
                "{} statements do not support joins",
                self.kind().as_str()
            )));
        }
        let source = match source.into_source()? {
            SourceSpec::Table(table) => Source::Table(self.resolver.resolve(&table)),
            SourceSpec::Query(query) => {
                ensure_select_subquery(&query)?;
                Source::Subquery {
                    query: Box::new(query),
                    alias: None,
                }
            }
        };
        let id = JoinId(self.joins.len());
        self.joins.push(Join::new(kind, source, id.0));
        Ok(JoinHandle { builder: self, id })
    }

    pub fn cross_join(&mut self, source: impl IntoSource) -> FlowResult<JoinHandle<'_>> {
        self.join(source, JoinKind::Cross)
    }

    pub fn inner_join(&mut self, source: impl IntoSource) -> FlowResult<JoinHandle<'_>> {
        self.join(source, JoinKind::Inner)
    }

    pub fn left_outer_join(&mut self, source: impl IntoSource) -> FlowResult<JoinHandle<'_>> {
        self.join(source, JoinKind::LeftOuter)
    }

    pub fn natural_join(&mut self, source: impl IntoSource) -> FlowResult<JoinHandle<'_>> {
        self.join(source, JoinKind::Natural)
    }

    // ==================== WHERE / GROUP BY / HAVING / ORDER BY ====================

    /// Add a WHERE condition, joined with `AND` to any existing ones.
    pub fn where_(&mut self, condition: impl Into<Condition>) -> &mut Self {
        self.where_group.push(Connector::And, condition.into());
        self
    }

    /// Add a WHERE condition joined with `AND`.
    pub fn and(&mut self, condition: impl Into<Condition>) -> &mut Self {
        self.where_(condition)
    }

    /// Add a WHERE condition joined with `OR`.
    pub fn or(&mut self, condition: impl Into<Condition>) -> &mut Self {
        self.where_group.push(Connector::Or, condition.into());
        self
    }

    pub fn group_by<C: Into<Column>>(&mut self, columns: impl IntoIterator<Item = C>) -> &mut Self {
        for column in columns {
            self.group_by.push(column.into());
        }
        self
    }

    /// Add a HAVING condition, joined with `AND`.
    pub fn having(&mut self, condition: impl Into<Condition>) -> &mut Self {
        self.having.push(Connector::And, condition.into());
        self
    }

    /// Append an ORDER BY term; a bare column sorts ascending.
    pub fn order_by(&mut self, order: impl Into<OrderBy>) -> &mut Self {
        self.order_by.push(order.into());
        self
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    // ==================== UPDATE ====================

    /// Add `` `column`=value `` to an UPDATE.
    pub fn set(&mut self, column: impl Into<Column>, value: impl Into<Operand>) -> FlowResult<&mut Self> {
        match &mut self.statement {
            Statement::Update { assignments, .. } => {
                assignments.push(Assignment::new(column.into(), value));
                Ok(self)
            }
            other => Err(FlowError::configuration(format!(
                "SET is only valid for UPDATE, not {}",
                other.kind().as_str()
            ))),
        }
    }

    /// `UPDATE OR <action>` (SQLite only).
    pub fn or_conflict(&mut self, action: ConflictAction) -> FlowResult<&mut Self> {
        match &mut self.statement {
            Statement::Update { conflict, .. } => {
                *conflict = Some(action);
                Ok(self)
            }
            other => Err(FlowError::configuration(format!(
                "conflict action is only valid for UPDATE, not {}",
                other.kind().as_str()
            ))),
        }
    }

    // ==================== Options ====================

    /// Select the rendering dialect.
    pub fn dialect(&mut self, dialect: Dialect) -> &mut Self {
        self.dialect = dialect;
        self
    }

    /// A clone with the LIMIT/OFFSET window replaced.
    pub fn constrain(&self, offset: u64, limit: u64) -> Self {
        let mut constrained = self.clone();
        constrained.offset = Some(offset);
        constrained.limit = Some(limit);
        constrained
    }

    // ==================== Introspection ====================

    pub fn kind(&self) -> StatementKind {
        self.statement.kind()
    }

    pub fn sql_dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn from_clause(&self) -> &FromClause {
        &self.from
    }

    /// The FROM table, or `None` when reading from a subquery.
    pub fn target_table(&self) -> Option<&TableId> {
        self.from.source().table()
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn join_at(&self, id: JoinId) -> Option<&Join> {
        self.joins.get(id.0)
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    /// The change a successful execution makes; `None` for reads.
    pub fn primary_action(&self) -> Option<ChangeAction> {
        match self.statement {
            Statement::Select { .. } => None,
            Statement::Update { .. } => Some(ChangeAction::Update),
            Statement::Delete => Some(ChangeAction::Delete),
        }
    }

    /// Every physical table this statement reads, including those of nested
    /// subqueries. Recomputed on each call.
    pub fn associated_tables(&self) -> BTreeSet<TableId> {
        let mut tables = BTreeSet::new();
        self.collect_tables(&mut tables);
        tables
    }

    pub(crate) fn collect_tables(&self, tables: &mut BTreeSet<TableId>) {
        self.from.referenced_tables(tables);
        if let Statement::Update { assignments, .. } = &self.statement {
            for assignment in assignments {
                assignment.referenced_tables(tables);
            }
        }
        for join in &self.joins {
            join.referenced_tables(tables);
        }
        self.where_group.referenced_tables(tables);
        self.having.referenced_tables(tables);
    }

    // ==================== Rendering ====================

    /// Render the full statement in this builder's dialect.
    pub fn render(&self) -> String {
        self.render_with(self.dialect)
    }

    /// Render in `dialect`, ignoring the builder's own setting.
    pub fn render_with(&self, dialect: Dialect) -> String {
        let mut out = String::with_capacity(128);
        self.write_sql(&mut out, dialect);
        tracing::trace!(target: "tableflow", sql = %out, "rendered statement");
        out
    }

    /// `SELECT COUNT(*) FROM (<this statement>)`.
    pub fn count_query(&self) -> FlowResult<String> {
        let mut count = select_count().from(self.clone())?;
        count.dialect(self.dialect);
        Ok(count.render())
    }

    pub(crate) fn write_sql(&self, out: &mut String, dialect: Dialect) {
        match &self.statement {
            Statement::Select {
                projection,
                distinct,
            } => {
                out.push_str("SELECT ");
                if *distinct {
                    out.push_str("DISTINCT ");
                }
                projection.write_sql(out, dialect);
                out.push_str(" FROM ");
            }
            Statement::Update { conflict, .. } => {
                out.push_str("UPDATE ");
                if let (Some(action), Dialect::Sqlite) = (conflict, dialect) {
                    out.push_str("OR ");
                    out.push_str(action.as_sql());
                    out.push(' ');
                }
            }
            Statement::Delete => out.push_str("DELETE FROM "),
        }
        self.from.write_sql(out, dialect);

        match &self.statement {
            Statement::Select { .. } => {
                for join in &self.joins {
                    out.push(' ');
                    join.write_sql(out, dialect);
                }
            }
            Statement::Update { assignments, .. } if !assignments.is_empty() => {
                out.push_str(" SET ");
                write_list(out, assignments, ",", dialect);
            }
            _ => {}
        }

        if !self.where_group.is_empty() {
            out.push_str(" WHERE ");
            self.where_group.write_sql(out, dialect);
        }
        if !self.group_by.is_empty() {
            out.push_str(" GROUP BY ");
            self.group_by.write_sql(out, dialect);
        }
        if !self.having.is_empty() {
            out.push_str(" HAVING ");
            self.having.write_sql(out, dialect);
        }
        if !self.order_by.is_empty() {
            out.push_str(" ORDER BY ");
            write_list(out, &self.order_by, ",", dialect);
        }
        if let Some(limit) = self.limit {
            out.push_str(" LIMIT ");
            out.push_str(&limit.to_string());
        }
        if let Some(offset) = self.offset {
            out.push_str(" OFFSET ");
            out.push_str(&offset.to_string());
        }
    }
}

impl fmt::Display for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn ensure_select_subquery(query: &QueryBuilder) -> FlowResult<()> {
    match query.kind() {
        StatementKind::Select => Ok(()),
        other => Err(FlowError::configuration(format!(
            "subquery must be a SELECT, got {}",
            other.as_str()
        ))),
    }
}

/// Mutable view of one join, returned by [`QueryBuilder::join`].
#[derive(Debug)]
pub struct JoinHandle<'a> {
    builder: &'a mut QueryBuilder,
    id: JoinId,
}

impl<'a> JoinHandle<'a> {
    pub fn id(&self) -> JoinId {
        self.id
    }

    fn join_mut(&mut self) -> &mut Join {
        &mut self.builder.joins[self.id.0]
    }

    /// Add an ON condition, joined with `AND` to any existing ones.
    pub fn on(mut self, condition: impl Into<Condition>) -> Self {
        self.join_mut().on_mut().push(Connector::And, condition.into());
        self
    }

    /// `USING (<columns>)`, rendered only when no ON condition is set.
    pub fn using<C: Into<Column>>(mut self, columns: impl IntoIterator<Item = C>) -> Self {
        let join = self.join_mut();
        join.using_mut()
            .extend(columns.into_iter().map(|c| c.into().unqualified()));
        self
    }

    /// Set or replace the joined source's alias.
    pub fn alias(mut self, alias: &str) -> Self {
        self.join_mut().source_mut().set_alias(alias);
        self
    }

    /// Give the builder back for further chaining.
    pub fn done(self) -> &'a mut QueryBuilder {
        self.builder
    }
}

#[cfg(test)]
mod tests;
