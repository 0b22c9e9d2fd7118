//! Shared test doubles and fixtures.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use activerow::{
    ColumnSchema, Condition, Criteria, EntityDef, EntityRegistry, JunctionTable, RelationDef,
    Result, Row, SchemaIntrospector, SchemaRegistry, SqlExecutor, TableSchema, Value,
};

/// Recorded traffic plus scripted responses for the mock executor.
#[derive(Debug, Default)]
pub struct MockState {
    pub query_calls: usize,
    pub execute_calls: usize,
    pub queried: Vec<(String, Vec<Value>)>,
    pub executed: Vec<(String, Vec<Value>)>,
    pub queued_rows: VecDeque<Vec<Row>>,
    pub next_insert_id: i64,
    pub execute_result: u64,
}

/// A recording SQL executor with FIFO-scripted query results.
#[derive(Debug)]
pub struct MockExecutor {
    state: Arc<Mutex<MockState>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                next_insert_id: 42,
                execute_result: 1,
                ..MockState::default()
            })),
        }
    }

    /// Script the result set for the next query, in call order.
    pub fn queue_rows(&self, rows: Vec<Row>) {
        self.state().queued_rows.push_back(rows);
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("lock poisoned")
    }
}

impl SqlExecutor for MockExecutor {
    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        let mut state = self.state();
        state.execute_calls += 1;
        state.executed.push((sql.to_string(), params.to_vec()));
        Ok(state.execute_result)
    }

    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let mut state = self.state();
        state.query_calls += 1;
        state.queried.push((sql.to_string(), params.to_vec()));
        Ok(state.queued_rows.pop_front().unwrap_or_default())
    }

    fn last_insert_id(&self, _sequence: Option<&str>) -> Result<Value> {
        Ok(Value::BigInt(self.state().next_insert_id))
    }
}

/// Fixed-schema introspector covering the test tables.
pub struct StaticIntrospector {
    tables: HashMap<String, TableSchema>,
}

impl StaticIntrospector {
    pub fn new() -> Self {
        let mut tables = HashMap::new();
        for schema in [
            TableSchema::new("customers")
                .column(ColumnSchema::new("id").not_null())
                .column(ColumnSchema::new("name").not_null())
                .column(ColumnSchema::new("status"))
                .primary_key(&["id"])
                .sequence("customers_id_seq"),
            TableSchema::new("orders")
                .column(ColumnSchema::new("id").not_null())
                .column(ColumnSchema::new("customer_id"))
                .column(ColumnSchema::new("total"))
                .column(ColumnSchema::new("status"))
                .primary_key(&["id"])
                .sequence("orders_id_seq"),
            TableSchema::new("order_items")
                .column(ColumnSchema::new("id").not_null())
                .column(ColumnSchema::new("order_id"))
                .column(ColumnSchema::new("sku"))
                .primary_key(&["id"])
                .sequence("order_items_id_seq"),
            TableSchema::new("posts")
                .column(ColumnSchema::new("id").not_null())
                .column(ColumnSchema::new("title"))
                .column(ColumnSchema::new("views"))
                .primary_key(&["id"])
                .sequence("posts_id_seq"),
            TableSchema::new("tags")
                .column(ColumnSchema::new("id").not_null())
                .column(ColumnSchema::new("label"))
                .primary_key(&["id"])
                .sequence("tags_id_seq"),
            TableSchema::new("memberships")
                .column(ColumnSchema::new("org_id").not_null())
                .column(ColumnSchema::new("user_id").not_null())
                .column(ColumnSchema::new("role"))
                .primary_key(&["org_id", "user_id"]),
        ] {
            tables.insert(schema.table.clone(), schema);
        }
        Self { tables }
    }
}

impl SchemaIntrospector for StaticIntrospector {
    fn introspect(&self, table: &str) -> Result<TableSchema> {
        self.tables.get(table).cloned().ok_or_else(|| {
            activerow::Error::schema(table, "table does not exist")
        })
    }
}

/// A schema registry over the static test tables.
pub fn schemas() -> SchemaRegistry {
    SchemaRegistry::new(Box::new(StaticIntrospector::new()))
}

/// The test entity graph.
///
/// customer —(has_many)— order —(has_many)— item, plus a stat aggregate,
/// a through relation, a scoped relation, a many-to-many post/tag pair,
/// and a composite-key membership entity.
pub fn entities() -> EntityRegistry {
    let mut registry = EntityRegistry::new();
    registry.register(
        EntityDef::new("customer", "customers")
            .relation(RelationDef::has_many("orders", "order", "customer_id").order("\"id\" ASC"))
            .relation(
                RelationDef::has_many("items", "item", "order_id")
                    .through("orders")
                    .order("\"id\" ASC"),
            )
            .relation(RelationDef::stat("order_count", "order", "customer_id"))
            .relation(RelationDef::has_many("paid_orders", "order", "customer_id").scope("paid")),
    );
    registry.register(
        EntityDef::new("order", "orders")
            .relation(RelationDef::belongs_to("customer", "customer", "customer_id"))
            .relation(RelationDef::has_many("items", "item", "order_id"))
            .scope(
                "paid",
                Criteria::new().filter(Condition::eq("status", "paid")),
            ),
    );
    registry.register(EntityDef::new("item", "order_items"));
    registry.register(
        EntityDef::new("post", "posts").relation(RelationDef::many_to_many(
            "tags",
            "tag",
            JunctionTable::new("post_tags", "post_id", "tag_id"),
        )),
    );
    registry.register(EntityDef::new("tag", "tags"));
    registry.register(EntityDef::new("membership", "memberships"));
    registry
}

/// Shorthand for building a result row.
pub fn row(columns: &[&str], values: Vec<Value>) -> Row {
    Row::new(columns.iter().map(|&c| c.to_string()).collect(), values)
}

/// A customers-table row.
pub fn customer_row(id: i64, name: &str, status: &str) -> Row {
    row(
        &["id", "name", "status"],
        vec![
            Value::BigInt(id),
            Value::Text(name.to_string()),
            Value::Text(status.to_string()),
        ],
    )
}

/// An orders-table row.
pub fn order_row(id: i64, customer_id: i64, total: f64, status: &str) -> Row {
    row(
        &["id", "customer_id", "total", "status"],
        vec![
            Value::BigInt(id),
            Value::BigInt(customer_id),
            Value::Double(total),
            Value::Text(status.to_string()),
        ],
    )
}

/// An order_items-table row.
pub fn item_row(id: i64, order_id: i64, sku: &str) -> Row {
    row(
        &["id", "order_id", "sku"],
        vec![
            Value::BigInt(id),
            Value::BigInt(order_id),
            Value::Text(sku.to_string()),
        ],
    )
}
