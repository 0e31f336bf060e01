//! Shared fixtures for the workspace tests

#![allow(dead_code)]

use hadb_core::mock::{MockDatabase, MockSchema, StaticBalancer};
use hadb_sync::ClusterHandle;
use std::sync::Arc;

/// A small storefront schema with keys, a unique index and identity columns
pub fn shop_schema() -> MockSchema {
    MockSchema::new()
        .keywords(&["LIMIT", "Offset"])
        .table("shop", "customers")
        .table("shop", "orders")
        .table("shop", "Order")
        .column("shop", "customers", "id", 4, "int4")
        .column("shop", "customers", "email", 12, "varchar")
        .primary_key("shop", "customers", "customers_pkey", &["id"])
        .unique_index("shop", "customers", "customers_email_key", &["email"])
        .column("shop", "orders", "id", 4, "int4")
        .column("shop", "orders", "customer_id", 4, "int4")
        .column("shop", "orders", "limit", 4, "int4")
        .primary_key("shop", "orders", "orders_pkey", &["id"])
        .foreign_key("shop", "orders", "orders_customer_fk", &["customer_id"], "shop", "customers", &["id"])
        .column("shop", "Order", "id", 4, "int4")
        .auto_increment("shop.customers", &[true, false])
        .auto_increment("shop.orders", &[false, false, false])
        .auto_increment("shop.\"Order\"", &[false])
}

/// Three backends of one cluster: `db1` and `db2` active, `db3` to be synchronized
pub struct Fixture {
    pub db1: Arc<MockDatabase>,
    pub db2: Arc<MockDatabase>,
    pub db3: Arc<MockDatabase>,
    pub balancer: Arc<StaticBalancer<MockDatabase>>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with(|_, schema| schema)
    }

    /// Build the fixture, letting `customize` adjust each backend's schema by id
    pub fn with(customize: impl Fn(&str, MockSchema) -> MockSchema) -> Self {
        let db1 = Arc::new(MockDatabase::new("db1", customize("db1", shop_schema())));
        let db2 = Arc::new(MockDatabase::new("db2", customize("db2", shop_schema())));
        let db3 = Arc::new(MockDatabase::new("db3", customize("db3", shop_schema())));
        let balancer = Arc::new(StaticBalancer::new(vec![db1.clone(), db2.clone()]));
        Self { db1, db2, db3, balancer }
    }

    pub fn cluster(&self) -> ClusterHandle<MockDatabase> {
        ClusterHandle::new("cluster-a", self.balancer.clone())
    }

    pub fn open_connections(&self) -> usize {
        self.db1.open_connections() + self.db2.open_connections() + self.db3.open_connections()
    }
}
