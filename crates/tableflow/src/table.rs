//! Physical table identifiers.

use crate::error::FlowResult;
use crate::ident::normalize_ident;
use std::borrow::Borrow;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Opaque identifier of a physical table.
///
/// Cheap to clone and immutable once created. Ordering and hashing follow the
/// table name, so a `TableId` can be looked up by `&str`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(Arc<str>);

impl TableId {
    /// Validate and create a table identifier.
    ///
    /// Surrounding backticks or double quotes are stripped.
    pub fn new(name: &str) -> FlowResult<Self> {
        let name = normalize_ident("table", name)?;
        Ok(Self(Arc::from(name)))
    }

    /// Identifier of an [`Entity`]'s table, normalized like [`TableId::new`].
    pub fn of<E: Entity>() -> FlowResult<Self> {
        Self::new(E::TABLE_NAME)
    }

    /// The table name (unquoted).
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TableId").field(&&*self.0).finish()
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for TableId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A model type backed by one physical table.
///
/// Implementations are normally generated alongside per-entity adapters.
///
/// ```
/// use tableflow::Entity;
///
/// struct User;
/// impl Entity for User {
///     const TABLE_NAME: &'static str = "users";
/// }
/// ```
pub trait Entity {
    const TABLE_NAME: &'static str;
}

/// Typed handle to an entity's table, usable anywhere a query source is expected.
pub struct Table<E>(PhantomData<fn() -> E>);

/// Typed handle to the table of `E`.
pub fn table<E: Entity>() -> Table<E> {
    Table(PhantomData)
}

impl<E> Clone for Table<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Table<E> {}

impl<E: Entity> fmt::Debug for Table<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Table").field(&E::TABLE_NAME).finish()
    }
}

/// Convert an input into a [`TableId`].
///
/// This is mainly for ergonomics in builder and register APIs.
pub trait IntoTableId {
    fn into_table_id(self) -> FlowResult<TableId>;
}

impl IntoTableId for TableId {
    fn into_table_id(self) -> FlowResult<TableId> {
        Ok(self)
    }
}

impl IntoTableId for &TableId {
    fn into_table_id(self) -> FlowResult<TableId> {
        Ok(self.clone())
    }
}

impl IntoTableId for &str {
    fn into_table_id(self) -> FlowResult<TableId> {
        TableId::new(self)
    }
}

impl IntoTableId for String {
    fn into_table_id(self) -> FlowResult<TableId> {
        TableId::new(&self)
    }
}

impl<E: Entity> IntoTableId for Table<E> {
    fn into_table_id(self) -> FlowResult<TableId> {
        TableId::of::<E>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct SimpleModel;
    impl Entity for SimpleModel {
        const TABLE_NAME: &'static str = "SimpleModel";
    }

    #[test]
    fn table_id_strips_quotes() {
        let id = TableId::new("`SimpleModel`").unwrap();
        assert_eq!(id.name(), "SimpleModel");
        assert_eq!(id, TableId::of::<SimpleModel>().unwrap());
    }

    #[test]
    fn table_id_rejects_empty() {
        assert!(TableId::new("").unwrap_err().is_configuration());
    }

    #[test]
    fn table_id_lookup_by_str() {
        let mut set = HashSet::new();
        set.insert(TableId::new("users").unwrap());
        assert!(set.contains("users"));
        assert!(!set.contains("orders"));
    }

    struct QuotedModel;
    impl Entity for QuotedModel {
        const TABLE_NAME: &'static str = " \"orders\" ";
    }

    #[test]
    fn entity_ids_agree_on_normalized_name() {
        let direct = TableId::of::<QuotedModel>().unwrap();
        let via_handle = table::<QuotedModel>().into_table_id().unwrap();
        assert_eq!(direct, via_handle);
        assert_eq!(direct, TableId::new("orders").unwrap());
    }

    #[test]
    fn entity_table_into_id() {
        let id = table::<SimpleModel>().into_table_id().unwrap();
        assert_eq!(id.to_string(), "SimpleModel");
        assert_eq!(format!("{id:?}"), "TableId(\"SimpleModel\")");
    }
}
