//! # tableflow
//!
//! Type-safe SQL composition with table-change driven paging.
//!
//! ## Features
//!
//! - **Composable statements**: SELECT / UPDATE / DELETE builders over tables or subqueries
//! - **Byte-stable rendering**: upper-case keywords, single spaces, dialect-aware quoting
//! - **Dependency tracking**: every builder knows the physical tables it reads
//! - **Change notifications**: an in-process register fans table changes out to listeners
//! - **Consistent paging**: count/range pairs that straddle an invalidation are discarded
//!
//! ## Query Builder
//!
//! ```
//! use tableflow::{select, update, Column};
//!
//! let mut query = select().from("SimpleModel")?;
//! query.alias("Simple").where_(Column::new("id").gt(10));
//! assert_eq!(
//!     query.render(),
//!     "SELECT * FROM `SimpleModel` AS `Simple` WHERE `id`>10"
//! );
//!
//! let mut write = update("SimpleModel")?;
//! write.set("name", "Andrew")?.where_(Column::new("id").eq(5));
//! assert_eq!(
//!     write.render(),
//!     "UPDATE `SimpleModel` SET `name`='Andrew' WHERE `id`=5"
//! );
//! # Ok::<(), tableflow::FlowError>(())
//! ```
//!
//! ## Paging
//!
//! ```ignore
//! let register = ChangeRegister::new();
//! let client = FlowClient::new(PgPoolExecutor::new(create_pool(url)?), register)
//!     .with_dialect(Dialect::Postgres);
//!
//! let source = client.paged(&select().from("users")?)?;
//! let page = source.initial_load(0, 50).await?;
//! let mut invalidated = source.invalidations();
//!
//! client.write(&delete().from("users")?).await?;
//! invalidated.changed().await?; // recreate the source
//! ```

pub mod alias;
pub mod clause;
pub mod error;
pub mod executor;
pub mod ident;
pub mod paging;
pub mod prelude;
pub mod query;
pub mod register;
pub mod table;

pub use alias::{AliasResolver, NameAlias};
pub use clause::{
    Assignment, BinaryOp, ClauseNode, Column, Condition, ConditionGroup, ConflictAction,
    Connector, FromClause, GroupBy, IndexedBy, Join, JoinKind, Operand, OrderBy, Projection,
    Source, SqlValue,
};
pub use error::{FlowError, FlowResult};
pub use executor::{FlowClient, QueryExecutor, Serialized};
pub use ident::Dialect;
pub use paging::{InitialPage, Page, PagedQuerySource, PagedQuerySourceFactory, PagingConfig};
pub use query::{
    Delete, IntoSource, JoinHandle, JoinId, QueryBuilder, Select, SourceSpec, StatementKind,
    delete, select, select_columns, select_count, update,
};
pub use register::{ChangeAction, ChangeRegister, RegisteredListener, TableChangeListener};
pub use table::{Entity, IntoTableId, Table, TableId, table};

#[cfg(feature = "postgres")]
pub mod pg;

#[cfg(feature = "postgres")]
pub use pg::PgExecutor;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{PgPoolExecutor, create_pool, create_pool_with_config};
