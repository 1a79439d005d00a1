use super::*;
use crate::clause::SqlValue;
use crate::table::table;

struct SimpleModel;
impl Entity for SimpleModel {
    const TABLE_NAME: &'static str = "SimpleModel";
}

struct TwoColumnModel;
impl Entity for TwoColumnModel {
    const TABLE_NAME: &'static str = "TwoColumnModel";
}

fn ids(names: &[&str]) -> BTreeSet<TableId> {
    names.iter().map(|n| TableId::new(n).unwrap()).collect()
}

// ==================== FROM ====================

#[test]
fn select_all_from_table() {
    let query = select().from(table::<SimpleModel>()).unwrap();
    assert_eq!(query.render(), "SELECT * FROM `SimpleModel`");
    assert_eq!(query.to_string(), query.render());
}

#[test]
fn select_single_column() {
    let query = select_columns(["name"]).from("SimpleModel").unwrap();
    assert_eq!(query.render(), "SELECT `name` FROM `SimpleModel`");
}

#[test]
fn select_multiple_columns_no_space_after_comma() {
    let query = select_columns(["name", "name", "id"])
        .from("SimpleModel")
        .unwrap();
    assert_eq!(query.render(), "SELECT `name`,`name`,`id` FROM `SimpleModel`");
}

#[test]
fn select_with_alias() {
    let mut query = select().from("SimpleModel").unwrap();
    query.alias("Simple");
    assert_eq!(query.render(), "SELECT * FROM `SimpleModel` AS `Simple`");
}

#[test]
fn alias_replaces_rather_than_stacks() {
    let mut query = select().from("SimpleModel").unwrap();
    query.alias("A").alias("B");
    assert_eq!(query.render(), "SELECT * FROM `SimpleModel` AS `B`");
}

#[test]
fn select_distinct() {
    let query = select_columns(["name"]).distinct().from("SimpleModel").unwrap();
    assert_eq!(query.render(), "SELECT DISTINCT `name` FROM `SimpleModel`");
}

#[test]
fn select_count_projection() {
    let query = select_count().from("SimpleModel").unwrap();
    assert_eq!(query.render(), "SELECT COUNT(*) FROM `SimpleModel`");
}

#[test]
fn invalid_table_name_is_configuration_error() {
    let err = select().from("").unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn indexed_by_follows_table() {
    let mut query = select().from("SimpleModel").unwrap();
    query.alias("s");
    query.indexed_by("idx_name").unwrap();
    assert_eq!(
        query.render(),
        "SELECT * FROM `SimpleModel` AS `s` INDEXED BY `idx_name`"
    );
    assert_eq!(query.associated_tables(), ids(&["SimpleModel"]));
}

#[test]
fn indexed_by_is_dropped_for_postgres() {
    let mut query = select().from("SimpleModel").unwrap();
    query.indexed_by("idx_name").unwrap().dialect(Dialect::Postgres);
    assert_eq!(query.render(), "SELECT * FROM \"SimpleModel\"");
}

#[test]
fn indexed_by_on_subquery_is_rejected() {
    let inner = select().from("SimpleModel").unwrap();
    let mut query = select().from(inner).unwrap();
    assert!(query.indexed_by("idx").unwrap_err().is_configuration());
}

// ==================== JOIN ====================

#[test]
fn inner_join_with_on() {
    let mut query = select().from(table::<SimpleModel>()).unwrap();
    query
        .inner_join(table::<TwoColumnModel>())
        .unwrap()
        .on(Column::new("name").eq(Column::of::<TwoColumnModel>("name")));

    assert_eq!(
        query.render(),
        "SELECT * FROM `SimpleModel` INNER JOIN `TwoColumnModel` ON `name`=`TwoColumnModel`.`name`"
    );
    assert_eq!(
        query.associated_tables(),
        ids(&["SimpleModel", "TwoColumnModel"])
    );
}

#[test]
fn join_kinds_render_in_order() {
    let mut query = select().from("a").unwrap();
    query.cross_join("b").unwrap();
    query
        .left_outer_join("c")
        .unwrap()
        .using([Column::new("id"), Column::qualified("c", "kind")]);
    query.natural_join("d").unwrap().on(Column::new("x").eq(1));

    assert_eq!(
        query.render(),
        "SELECT * FROM `a` CROSS JOIN `b` LEFT OUTER JOIN `c` USING (`id`,`kind`) NATURAL JOIN `d`"
    );
    assert_eq!(query.joins().len(), 3);
    assert_eq!(query.join_at(JoinId(1)).unwrap().kind(), JoinKind::LeftOuter);
}

#[test]
fn on_takes_precedence_over_using() {
    let mut query = select().from("a").unwrap();
    query
        .inner_join("b")
        .unwrap()
        .using(["id"])
        .on(Column::qualified("a", "id").eq(Column::qualified("b", "id")));
    assert_eq!(
        query.render(),
        "SELECT * FROM `a` INNER JOIN `b` ON `a`.`id`=`b`.`id`"
    );
}

#[test]
fn join_alias_does_not_leak_to_from_of_same_table() {
    let mut query = select().from("users").unwrap();
    query
        .inner_join("users")
        .unwrap()
        .alias("manager")
        .on(Column::qualified("users", "manager_id").eq(Column::qualified("manager", "id")));

    assert_eq!(
        query.render(),
        "SELECT * FROM `users` INNER JOIN `users` AS `manager` ON `users`.`manager_id`=`manager`.`id`"
    );
    assert_eq!(query.associated_tables(), ids(&["users"]));
}

#[test]
fn join_handle_done_returns_builder() {
    let mut query = select().from("a").unwrap();
    let handle = query.inner_join("b").unwrap();
    let id = handle.id();
    handle
        .on(Column::new("x").eq(Column::qualified("b", "x")))
        .done()
        .limit(5);
    assert_eq!(id.index(), 0);
    assert!(query.render().ends_with(" LIMIT 5"));
}

#[test]
fn join_on_non_select_is_rejected() {
    let mut query = delete().from("a").unwrap();
    assert!(query.inner_join("b").unwrap_err().is_configuration());

    let mut query = update("a").unwrap();
    assert!(query.cross_join("b").unwrap_err().is_configuration());
}

#[test]
fn join_on_subquery_collects_inner_tables() {
    let mut inner = select_columns(["id"]).from("orders").unwrap();
    inner.where_(Column::new("total").gt(Column::new("limit_value")));
    let mut query = select().from("users").unwrap();
    query
        .inner_join(inner)
        .unwrap()
        .alias("o")
        .on(Column::qualified("users", "id").eq(Column::qualified("o", "id")));

    assert_eq!(
        query.render(),
        "SELECT * FROM `users` INNER JOIN (SELECT `id` FROM `orders` WHERE `total`>`limit_value`) AS `o` ON `users`.`id`=`o`.`id`"
    );
    assert_eq!(query.associated_tables(), ids(&["orders", "users"]));
}

#[test]
fn postgres_subquery_join_gets_fallback_alias() {
    let inner = select().from("orders").unwrap();
    let mut query = select().from("users").unwrap();
    query.dialect(Dialect::Postgres);
    query.cross_join(inner).unwrap();
    assert_eq!(
        query.render(),
        "SELECT * FROM \"users\" CROSS JOIN (SELECT * FROM \"orders\") AS \"j0\""
    );
}

// ==================== Subqueries ====================

#[test]
fn subquery_source_renders_parenthesized() {
    let mut inner = select().from("SimpleModel").unwrap();
    inner.where_(Column::new("id").gt(10));
    let mut query = select().from(inner).unwrap();
    query.alias("s");
    assert_eq!(
        query.render(),
        "SELECT * FROM (SELECT * FROM `SimpleModel` WHERE `id`>10) AS `s`"
    );
    assert_eq!(query.target_table(), None);
    assert_eq!(query.associated_tables(), ids(&["SimpleModel"]));
}

#[test]
fn subquery_without_alias_on_sqlite_is_bare() {
    let inner = select().from("SimpleModel").unwrap();
    let query = select().from(inner).unwrap();
    assert_eq!(query.render(), "SELECT * FROM (SELECT * FROM `SimpleModel`)");
}

#[test]
fn non_select_base_rejects_subquery_source() {
    let inner = select().from("SimpleModel").unwrap();
    assert!(delete().from(inner.clone()).unwrap_err().is_configuration());
    assert!(update(inner).unwrap_err().is_configuration());
}

#[test]
fn non_select_subquery_is_rejected() {
    let inner = delete().from("SimpleModel").unwrap();
    assert!(select().from(inner).unwrap_err().is_configuration());
}

#[test]
fn where_subquery_tables_are_associated() {
    let active = select_columns(["user_id"]).from("sessions").unwrap();
    let banned = select().from("bans").unwrap();
    let mut query = select().from("users").unwrap();
    query
        .where_(Column::new("id").in_query(active))
        .and(Condition::not_exists(banned));

    assert_eq!(
        query.render(),
        "SELECT * FROM `users` WHERE `id` IN (SELECT `user_id` FROM `sessions`) AND NOT EXISTS (SELECT * FROM `bans`)"
    );
    assert_eq!(
        query.associated_tables(),
        ids(&["bans", "sessions", "users"])
    );
}

// ==================== WHERE / GROUP BY / ORDER BY ====================

#[test]
fn full_clause_order() {
    let mut query = select_columns(["kind"]).from("events").unwrap();
    query
        .where_(Column::new("kind").not_eq("debug"))
        .or(Column::new("level").gte(3))
        .group_by(["kind"])
        .having(Column::new("kind").is_not_null())
        .order_by(Column::new("kind"))
        .order_by(OrderBy::desc(Column::new("level")))
        .limit(10)
        .offset(20);

    assert_eq!(
        query.render(),
        "SELECT `kind` FROM `events` WHERE `kind`!='debug' OR `level`>=3 GROUP BY `kind` HAVING `kind` IS NOT NULL ORDER BY `kind` ASC,`level` DESC LIMIT 10 OFFSET 20"
    );
}

#[test]
fn nested_condition_group_is_parenthesized() {
    let mut query = select().from("t").unwrap();
    query
        .where_(Column::new("a").eq(1))
        .and(Column::new("b").eq(2).or(Column::new("c").is_null()));
    assert_eq!(
        query.render(),
        "SELECT * FROM `t` WHERE `a`=1 AND (`b`=2 OR `c` IS NULL)"
    );
}

#[test]
fn empty_where_group_adds_nothing() {
    let mut query = select().from("t").unwrap();
    query.where_(ConditionGroup::new());
    assert_eq!(query.render(), "SELECT * FROM `t`");
}

#[test]
fn rendered_output_has_no_surrounding_whitespace() {
    let mut query = select().from("t").unwrap();
    query.inner_join("u").unwrap();
    let sql = query.render();
    assert_eq!(sql, sql.trim());
    assert!(!sql.contains("  "));
}

// ==================== UPDATE / DELETE ====================

#[test]
fn update_has_no_from_keyword() {
    let mut query = update("SimpleModel").unwrap();
    query
        .set("name", "Andrew")
        .unwrap()
        .set("id", SqlValue::Null)
        .unwrap()
        .where_(Column::new("id").eq(5));
    assert_eq!(
        query.render(),
        "UPDATE `SimpleModel` SET `name`='Andrew',`id`=NULL WHERE `id`=5"
    );
    assert_eq!(query.primary_action(), Some(ChangeAction::Update));
    assert_eq!(query.target_table().map(TableId::name), Some("SimpleModel"));
}

#[test]
fn update_or_conflict_action() {
    let mut query = update("SimpleModel").unwrap();
    query.or_conflict(ConflictAction::Ignore).unwrap();
    query.set("name", "x").unwrap();
    assert_eq!(
        query.render(),
        "UPDATE OR IGNORE `SimpleModel` SET `name`='x'"
    );

    query.dialect(Dialect::Postgres);
    assert_eq!(query.render(), "UPDATE \"SimpleModel\" SET \"name\"='x'");
}

#[test]
fn set_outside_update_is_rejected() {
    let mut query = select().from("t").unwrap();
    assert!(query.set("a", 1).unwrap_err().is_configuration());
    assert!(query.or_conflict(ConflictAction::Abort).unwrap_err().is_configuration());
}

#[test]
fn delete_with_from() {
    let mut query = delete().from("SimpleModel").unwrap();
    query.where_(Column::new("name").like("A%"));
    assert_eq!(
        query.render(),
        "DELETE FROM `SimpleModel` WHERE `name` LIKE 'A%'"
    );
    assert_eq!(query.primary_action(), Some(ChangeAction::Delete));
    assert_eq!(query.kind(), StatementKind::Delete);
}

#[test]
fn select_has_no_primary_action() {
    let query = select().from("t").unwrap();
    assert_eq!(query.primary_action(), None);
}

// ==================== Derived queries ====================

#[test]
fn constrain_rebinds_window_on_a_clone() {
    let mut query = select().from("t").unwrap();
    query.limit(100);
    let page = query.constrain(20, 10);
    assert_eq!(page.render(), "SELECT * FROM `t` LIMIT 10 OFFSET 20");
    assert_eq!(query.render(), "SELECT * FROM `t` LIMIT 100");
    assert_eq!(page.offset_value(), Some(20));
    assert_eq!(page.limit_value(), Some(10));
}

#[test]
fn count_query_wraps_statement() {
    let mut query = select().from("t").unwrap();
    query.where_(Column::new("a").eq(1));
    assert_eq!(
        query.count_query().unwrap(),
        "SELECT COUNT(*) FROM (SELECT * FROM `t` WHERE `a`=1)"
    );

    query.dialect(Dialect::Postgres);
    assert_eq!(
        query.count_query().unwrap(),
        "SELECT COUNT(*) FROM (SELECT * FROM \"t\" WHERE \"a\"=1) AS \"t\""
    );
}

#[test]
fn count_query_requires_select() {
    let query = delete().from("t").unwrap();
    assert!(query.count_query().unwrap_err().is_configuration());
}

#[test]
fn clone_is_independent() {
    let mut original = select().from("t").unwrap();
    original.inner_join("u").unwrap();
    let mut copy = original.clone();
    copy.alias("x");
    copy.inner_join("v").unwrap();

    assert_eq!(original.render(), "SELECT * FROM `t` INNER JOIN `u`");
    assert_eq!(
        copy.render(),
        "SELECT * FROM `t` AS `x` INNER JOIN `u` INNER JOIN `v`"
    );
}

#[test]
fn builder_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<QueryBuilder>();
}

#[test]
fn empty_in_list_renders_valid_where_clause() {
    let mut query = select().from("items").unwrap();
    query
        .where_(Column::new("id").in_list(Vec::<i64>::new()))
        .or(Column::new("kind").not_in(Vec::<&str>::new()));
    assert_eq!(query.render(), "SELECT * FROM `items` WHERE 1=0 OR 1=1");
    assert_eq!(
        query.render_with(Dialect::Postgres),
        "SELECT * FROM \"items\" WHERE 1=0 OR 1=1"
    );
}

#[test]
fn non_finite_reals_render_as_null_literals() {
    let mut query = select().from("items").unwrap();
    query
        .where_(Column::new("x").gt(f64::NAN))
        .or(Column::new("y").lt(f64::INFINITY));
    assert_eq!(
        query.render(),
        "SELECT * FROM `items` WHERE `x`>NULL OR `y`<NULL"
    );

    let mut write = update("items").unwrap();
    write.set("ratio", f64::NEG_INFINITY).unwrap();
    assert_eq!(write.render(), "UPDATE `items` SET `ratio`=NULL");
}
