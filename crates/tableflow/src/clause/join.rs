use super::ClauseNode;
use super::column::Column;
use super::condition::ConditionGroup;
use super::from::Source;
use crate::ident::Dialect;
use crate::table::TableId;
use std::collections::BTreeSet;

/// Join flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Cross,
    Inner,
    LeftOuter,
    Natural,
}

impl JoinKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Cross => "CROSS JOIN",
            Self::Inner => "INNER JOIN",
            Self::LeftOuter => "LEFT OUTER JOIN",
            Self::Natural => "NATURAL JOIN",
        }
    }
}

/// One entry of a builder's ordered join list.
///
/// Renders as `<KIND> JOIN <source>[ ON <cond> | USING (<cols>)]`. A NATURAL
/// join never renders ON or USING.
#[derive(Debug, Clone)]
pub struct Join {
    kind: JoinKind,
    source: Source,
    on: ConditionGroup,
    using: Vec<Column>,
    fallback_alias: String,
}

impl Join {
    pub(crate) fn new(kind: JoinKind, source: Source, position: usize) -> Self {
        Self {
            kind,
            source,
            on: ConditionGroup::new(),
            using: Vec::new(),
            fallback_alias: format!("j{position}"),
        }
    }

    pub fn kind(&self) -> JoinKind {
        self.kind
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn on_condition(&self) -> Option<&ConditionGroup> {
        (!self.on.is_empty()).then_some(&self.on)
    }

    pub fn using_columns(&self) -> &[Column] {
        &self.using
    }

    pub(crate) fn source_mut(&mut self) -> &mut Source {
        &mut self.source
    }

    pub(crate) fn on_mut(&mut self) -> &mut ConditionGroup {
        &mut self.on
    }

    pub(crate) fn using_mut(&mut self) -> &mut Vec<Column> {
        &mut self.using
    }
}

impl ClauseNode for Join {
    fn write_sql(&self, out: &mut String, dialect: Dialect) {
        out.push_str(self.kind.as_sql());
        out.push(' ');
        self.source.write_source(out, dialect, &self.fallback_alias);

        if self.kind == JoinKind::Natural {
            return;
        }
        if !self.on.is_empty() {
            out.push_str(" ON ");
            self.on.write_sql(out, dialect);
        } else if !self.using.is_empty() {
            out.push_str(" USING (");
            super::write_list(out, &self.using, ",", dialect);
            out.push(')');
        }
    }

    fn referenced_tables(&self, tables: &mut BTreeSet<TableId>) {
        self.source.referenced_tables(tables);
        self.on.referenced_tables(tables);
    }
}
