//! Convenient imports for typical `tableflow` usage.
//!
//! ```ignore
//! use tableflow::prelude::*;
//! ```

pub use crate::{
    ChangeAction, ChangeRegister, ClauseNode, Column, Condition, Dialect, Entity, FlowClient,
    FlowError, FlowResult, JoinKind, OrderBy, PagedQuerySource, PagingConfig, QueryBuilder,
    QueryExecutor, TableId, delete, select, select_columns, select_count, table, update,
};

#[cfg(feature = "pool")]
pub use crate::{PgPoolExecutor, create_pool, create_pool_with_config};

#[cfg(feature = "postgres")]
pub use crate::PgExecutor;
