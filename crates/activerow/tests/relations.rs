//! Relation resolution: lazy access, batched eager loading, junction
//! queries, stat aggregates, through-bridges, scopes, and overrides.

mod common;

use activerow::{
    Condition, Context, Criteria, EntityDef, EntityRegistry, Error, Finder, RelationDef,
    RelationOptions, RelationOverride, Value,
};

use common::{MockExecutor, customer_row, entities, item_row, order_row, row, schemas};

#[test]
fn lazy_belongs_to_resolves_once_and_caches() {
    let executor = MockExecutor::new();
    let schemas = schemas();
    let entities = entities();
    let ctx = Context::new(&executor, &schemas, &entities);

    executor.queue_rows(vec![order_row(11, 1, 25.0, "paid")]);
    let mut order = Finder::new(&ctx, "order")
        .unwrap()
        .find_by_pk(11i64)
        .unwrap()
        .unwrap();
    assert_eq!(executor.state().query_calls, 1);

    executor.queue_rows(vec![customer_row(1, "Ada", "active")]);
    let customer = order.related(&ctx, "customer").unwrap();
    let customer = customer.as_record().expect("belongs_to yields one record");
    assert_eq!(customer.get("name"), &Value::Text("Ada".into()));

    {
        let state = executor.state();
        assert_eq!(state.query_calls, 2);
        let (sql, params) = &state.queried[1];
        assert_eq!(sql, "SELECT * FROM \"customers\" WHERE \"id\" IN (?)");
        assert_eq!(params, &vec![Value::BigInt(1)]);
    }

    // Second access is a pure cache read.
    order.related(&ctx, "customer").unwrap();
    assert_eq!(executor.state().query_calls, 2);
}

#[test]
fn eager_has_many_issues_two_queries_and_partitions_by_fk() {
    let executor = MockExecutor::new();
    let schemas = schemas();
    let entities = entities();
    let ctx = Context::new(&executor, &schemas, &entities);

    executor.queue_rows(vec![
        customer_row(1, "Ada", "active"),
        customer_row(2, "Grace", "active"),
        customer_row(3, "Edsger", "inactive"),
    ]);
    executor.queue_rows(vec![
        order_row(11, 1, 10.0, "paid"),
        order_row(12, 1, 20.0, "open"),
        order_row(21, 2, 30.0, "paid"),
    ]);

    let customers = Finder::new(&ctx, "customer")
        .unwrap()
        .find_all_with(Criteria::new(), &["orders"])
        .unwrap();

    let state = executor.state();
    assert_eq!(state.query_calls, 2, "customers query plus one orders query");
    let (sql, params) = &state.queried[1];
    assert_eq!(
        sql,
        "SELECT * FROM \"orders\" WHERE \"customer_id\" IN (?, ?, ?) ORDER BY \"id\" ASC"
    );
    assert_eq!(
        params,
        &vec![Value::BigInt(1), Value::BigInt(2), Value::BigInt(3)]
    );
    drop(state);

    assert_eq!(customers.len(), 3);
    let orders_of = |i: usize| {
        customers[i]
            .related_cached("orders")
            .unwrap()
            .as_collection()
            .unwrap()
    };

    assert_eq!(orders_of(0).len(), 2);
    for order in orders_of(0).iter() {
        assert_eq!(order.get("customer_id"), customers[0].get("id"));
    }
    assert_eq!(orders_of(1).len(), 1);
    assert_eq!(orders_of(1).records()[0].get("id"), &Value::BigInt(21));
    // No orders is an empty collection, never null.
    assert_eq!(orders_of(2).len(), 0);
}

#[test]
fn override_overlay_indexes_the_collection_without_touching_the_template() {
    let executor = MockExecutor::new();
    let schemas = schemas();
    let entities = entities();
    let ctx = Context::new(&executor, &schemas, &entities);

    executor.queue_rows(vec![customer_row(1, "Ada", "active")]);
    let mut customer = Finder::new(&ctx, "customer")
        .unwrap()
        .find_by_pk(1i64)
        .unwrap()
        .unwrap();

    executor.queue_rows(vec![
        order_row(11, 1, 10.0, "paid"),
        order_row(12, 1, 20.0, "open"),
    ]);
    let overrides = RelationOverride::Options(RelationOptions {
        index_by: Some("id".to_string()),
        ..RelationOptions::default()
    });
    let orders = customer.related_with(&ctx, "orders", &overrides).unwrap();
    let orders = orders.as_collection().unwrap();

    assert!(orders.is_indexed());
    assert_eq!(orders.get("12").unwrap().get("total"), &Value::Double(20.0));

    // The stored template is untouched.
    let template = customer.entity().relation_def("orders").unwrap();
    assert!(template.options.index_by.is_none());
}

#[test]
fn override_transform_is_applied_to_a_clone() {
    let executor = MockExecutor::new();
    let schemas = schemas();
    let entities = entities();
    let ctx = Context::new(&executor, &schemas, &entities);

    executor.queue_rows(vec![order_row(11, 1, 25.0, "paid")]);
    let mut order = Finder::new(&ctx, "order")
        .unwrap()
        .find_by_pk(11i64)
        .unwrap()
        .unwrap();

    executor.queue_rows(vec![customer_row(1, "Ada", "gold")]);
    let transform = |def: RelationDef| def.filter(Condition::eq("status", "gold"));
    order
        .related_with(&ctx, "customer", &RelationOverride::Transform(&transform))
        .unwrap();

    let state = executor.state();
    let (sql, params) = &state.queried[1];
    assert_eq!(
        sql,
        "SELECT * FROM \"customers\" WHERE (\"status\" = ? AND \"id\" IN (?))"
    );
    assert_eq!(
        params,
        &vec![Value::Text("gold".into()), Value::BigInt(1)]
    );
    drop(state);

    let template = order.entity().relation_def("customer").unwrap();
    assert!(template.options.criteria.condition.is_empty());
}

#[test]
fn many_to_many_strips_junction_columns_from_attributes() {
    let executor = MockExecutor::new();
    let schemas = schemas();
    let entities = entities();
    let ctx = Context::new(&executor, &schemas, &entities);

    executor.queue_rows(vec![row(
        &["id", "title", "views"],
        vec![
            Value::BigInt(1),
            Value::Text("hello".into()),
            Value::BigInt(0),
        ],
    )]);
    let mut post = Finder::new(&ctx, "post")
        .unwrap()
        .find_by_pk(1i64)
        .unwrap()
        .unwrap();

    executor.queue_rows(vec![
        row(
            &["id", "label", "__owner_0"],
            vec![
                Value::BigInt(5),
                Value::Text("rust".into()),
                Value::BigInt(1),
            ],
        ),
        row(
            &["id", "label", "__owner_0"],
            vec![
                Value::BigInt(6),
                Value::Text("orm".into()),
                Value::BigInt(1),
            ],
        ),
    ]);
    let tags = post.related(&ctx, "tags").unwrap();
    let tags = tags.as_collection().unwrap();

    assert_eq!(tags.len(), 2);
    for tag in tags.iter() {
        assert!(!tag.is_set("__owner_0"), "junction key must not leak");
        assert!(!tag.is_set("post_id"), "junction columns must not leak");
        assert!(tag.is_set("label"));
    }

    let state = executor.state();
    let (sql, params) = &state.queried[1];
    assert_eq!(
        sql,
        "SELECT \"t\".\"id\", \"t\".\"label\", \"j\".\"post_id\" AS \"__owner_0\" \
         FROM \"tags\" AS \"t\" \
         INNER JOIN \"post_tags\" AS \"j\" ON \"j\".\"tag_id\" = \"t\".\"id\" \
         WHERE \"j\".\"post_id\" IN (?)"
    );
    assert_eq!(params, &vec![Value::BigInt(1)]);
}

#[test]
fn stat_relation_assigns_scalars_and_defaults() {
    let executor = MockExecutor::new();
    let schemas = schemas();
    let entities = entities();
    let ctx = Context::new(&executor, &schemas, &entities);

    executor.queue_rows(vec![
        customer_row(1, "Ada", "active"),
        customer_row(2, "Grace", "active"),
        customer_row(3, "Edsger", "inactive"),
    ]);
    executor.queue_rows(vec![
        row(
            &["customer_id", "__stat"],
            vec![Value::BigInt(1), Value::BigInt(5)],
        ),
        row(
            &["customer_id", "__stat"],
            vec![Value::BigInt(2), Value::BigInt(1)],
        ),
    ]);

    let customers = Finder::new(&ctx, "customer")
        .unwrap()
        .find_all_with(Criteria::new(), &["order_count"])
        .unwrap();

    let count_of = |i: usize| {
        customers[i]
            .related_cached("order_count")
            .unwrap()
            .as_scalar()
            .unwrap()
            .clone()
    };
    assert_eq!(count_of(0), Value::BigInt(5));
    assert_eq!(count_of(1), Value::BigInt(1));
    // No matching rows: the declared default.
    assert_eq!(count_of(2), Value::BigInt(0));

    let state = executor.state();
    assert_eq!(state.query_calls, 2);
    let (sql, _) = &state.queried[1];
    assert_eq!(
        sql,
        "SELECT \"customer_id\", COUNT(*) AS \"__stat\" FROM \"orders\" \
         WHERE \"customer_id\" IN (?, ?, ?) GROUP BY \"customer_id\""
    );
}

#[test]
fn through_relation_bridges_and_regroups_to_original_owners() {
    let executor = MockExecutor::new();
    let schemas = schemas();
    let entities = entities();
    let ctx = Context::new(&executor, &schemas, &entities);

    executor.queue_rows(vec![
        customer_row(1, "Ada", "active"),
        customer_row(2, "Grace", "active"),
    ]);
    // Bridge query: orders of both customers.
    executor.queue_rows(vec![
        order_row(11, 1, 10.0, "paid"),
        order_row(12, 1, 20.0, "open"),
        order_row(21, 2, 30.0, "paid"),
    ]);
    // Target query: items of those orders.
    executor.queue_rows(vec![
        item_row(101, 11, "sku-a"),
        item_row(102, 12, "sku-b"),
        item_row(201, 21, "sku-c"),
    ]);

    let customers = Finder::new(&ctx, "customer")
        .unwrap()
        .find_all_with(Criteria::new(), &["items"])
        .unwrap();

    let state = executor.state();
    assert_eq!(
        state.query_calls, 3,
        "owners, bridge, and target: one query each"
    );
    let (sql, params) = &state.queried[2];
    assert_eq!(
        sql,
        "SELECT * FROM \"order_items\" WHERE \"order_id\" IN (?, ?, ?) ORDER BY \"id\" ASC"
    );
    assert_eq!(
        params,
        &vec![Value::BigInt(11), Value::BigInt(12), Value::BigInt(21)]
    );
    drop(state);

    let items_of = |i: usize| {
        customers[i]
            .related_cached("items")
            .unwrap()
            .as_collection()
            .unwrap()
    };
    assert_eq!(items_of(0).len(), 2);
    assert_eq!(items_of(0).records()[0].get("sku"), &Value::Text("sku-a".into()));
    assert_eq!(items_of(1).len(), 1);
    assert_eq!(items_of(1).records()[0].get("id"), &Value::BigInt(201));
}

#[test]
fn scoped_relation_merges_the_named_scope() {
    let executor = MockExecutor::new();
    let schemas = schemas();
    let entities = entities();
    let ctx = Context::new(&executor, &schemas, &entities);

    executor.queue_rows(vec![customer_row(1, "Ada", "active")]);
    let mut customer = Finder::new(&ctx, "customer")
        .unwrap()
        .find_by_pk(1i64)
        .unwrap()
        .unwrap();

    executor.queue_rows(vec![order_row(11, 1, 10.0, "paid")]);
    customer.related(&ctx, "paid_orders").unwrap();

    let state = executor.state();
    let (sql, params) = &state.queried[1];
    assert_eq!(
        sql,
        "SELECT * FROM \"orders\" WHERE (\"status\" = ? AND \"customer_id\" IN (?))"
    );
    assert_eq!(
        params,
        &vec![Value::Text("paid".into()), Value::BigInt(1)]
    );
}

#[test]
fn unknown_scope_reference_is_a_configuration_error() {
    let executor = MockExecutor::new();
    let schemas = schemas();
    let entities = entities();
    let ctx = Context::new(&executor, &schemas, &entities);

    executor.queue_rows(vec![customer_row(1, "Ada", "active")]);
    let mut customer = Finder::new(&ctx, "customer")
        .unwrap()
        .find_by_pk(1i64)
        .unwrap()
        .unwrap();

    let transform = |def: RelationDef| def.scope("nope");
    let err = customer
        .related_with(&ctx, "orders", &RelationOverride::Transform(&transform))
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn unknown_relation_name_is_its_own_error() {
    let executor = MockExecutor::new();
    let schemas = schemas();
    let entities = entities();
    let ctx = Context::new(&executor, &schemas, &entities);

    executor.queue_rows(vec![customer_row(1, "Ada", "active")]);
    let mut customer = Finder::new(&ctx, "customer")
        .unwrap()
        .find_by_pk(1i64)
        .unwrap()
        .unwrap();

    let err = customer.related(&ctx, "payments").unwrap_err();
    assert!(matches!(err, Error::UnknownRelation(_)));
    assert_eq!(executor.state().query_calls, 1, "no query issued");
}

#[test]
fn mismatched_composite_key_spec_fails_at_resolve_time() {
    let executor = MockExecutor::new();
    let schemas = schemas();

    // Declaring the bad relation is fine; only resolving it fails.
    let mut registry = EntityRegistry::new();
    registry.register(
        EntityDef::new("order", "orders").relation(RelationDef::belongs_to(
            "customer",
            "customer",
            "customer_id, extra_id",
        )),
    );
    registry.register(EntityDef::new("customer", "customers"));
    let ctx = Context::new(&executor, &schemas, &registry);

    executor.queue_rows(vec![order_row(11, 1, 25.0, "paid")]);
    let mut order = Finder::new(&ctx, "order")
        .unwrap()
        .find_by_pk(11i64)
        .unwrap()
        .unwrap();

    let err = order.related(&ctx, "customer").unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn eager_loading_with_no_owners_issues_no_relation_query() {
    let executor = MockExecutor::new();
    let schemas = schemas();
    let entities = entities();
    let ctx = Context::new(&executor, &schemas, &entities);

    executor.queue_rows(vec![]);
    let customers = Finder::new(&ctx, "customer")
        .unwrap()
        .find_all_with(Criteria::new(), &["orders"])
        .unwrap();

    assert!(customers.is_empty());
    assert_eq!(executor.state().query_calls, 1);
}

#[test]
fn null_foreign_key_yields_no_related_record_without_a_query_key() {
    let executor = MockExecutor::new();
    let schemas = schemas();
    let entities = entities();
    let ctx = Context::new(&executor, &schemas, &entities);

    executor.queue_rows(vec![row(
        &["id", "customer_id", "total", "status"],
        vec![
            Value::BigInt(11),
            Value::Null,
            Value::Double(5.0),
            Value::Text("open".into()),
        ],
    )]);
    let mut order = Finder::new(&ctx, "order")
        .unwrap()
        .find_by_pk(11i64)
        .unwrap()
        .unwrap();

    let customer = order.related(&ctx, "customer").unwrap();
    assert!(customer.as_record().is_none());
    // All foreign keys were NULL: no target query at all.
    assert_eq!(executor.state().query_calls, 1);
}

#[test]
fn unset_related_invalidates_the_cache() {
    let executor = MockExecutor::new();
    let schemas = schemas();
    let entities = entities();
    let ctx = Context::new(&executor, &schemas, &entities);

    executor.queue_rows(vec![order_row(11, 1, 25.0, "paid")]);
    let mut order = Finder::new(&ctx, "order")
        .unwrap()
        .find_by_pk(11i64)
        .unwrap()
        .unwrap();

    executor.queue_rows(vec![customer_row(1, "Ada", "active")]);
    order.related(&ctx, "customer").unwrap();
    assert_eq!(executor.state().query_calls, 2);

    order.unset_related("customer");
    executor.queue_rows(vec![customer_row(1, "Ada", "active")]);
    order.related(&ctx, "customer").unwrap();
    assert_eq!(executor.state().query_calls, 3);
}
