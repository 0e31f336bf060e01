//! Resynchronize one backend of a simulated three node cluster
//!
//! Reads `hadb.toml` when one is found, falling back to defaults, and
//! prints the DDL a copy strategy would plan for the target.
//!
//! Run with: cargo run --example resync

use async_trait::async_trait;
use hadb_core::mock::{MockDatabase, MockSchema, StaticBalancer};
use hadb_core::{Database, HaConfig, Result, create_codec};
use hadb_sync::{ClusterHandle, DatabaseCluster, SynchronizationContext, SynchronizationStrategy, synchronize};
use hadb_telemetry::{init_telemetry_with, safe_serialize};
use std::sync::Arc;

/// Prints the constraint statements that bracket a full copy
struct PlanPrinter;

#[async_trait]
impl SynchronizationStrategy<MockDatabase> for PlanPrinter {
    async fn synchronize(&self, context: Arc<SynchronizationContext<MockDatabase>>) -> Result<()> {
        let target = context.target_database_properties();
        let dialect = context.dialect();

        for table in target.tables() {
            println!("-- {}", table.qualified_name_for_ddl());
            for key in table.foreign_keys() {
                println!("{};", dialect.drop_foreign_key_constraint_sql(target, key));
                tracing::debug!(constraint = %safe_serialize(key), "Foreign key");
            }
            println!("{};", dialect.truncate_table_sql(table));
            println!("{};", dialect.select_all_sql(context.source_database_properties(), table, true));
            for key in table.foreign_keys() {
                println!("{};", dialect.create_foreign_key_constraint_sql(target, key));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "plan-printer"
    }
}

fn schema() -> MockSchema {
    MockSchema::new()
        .table("inventory", "warehouses")
        .table("inventory", "Stock")
        .column("inventory", "warehouses", "id", 4, "int4")
        .column("inventory", "Stock", "warehouse_id", 4, "int4")
        .column("inventory", "Stock", "sku", 12, "varchar")
        .primary_key("inventory", "warehouses", "warehouses_pkey", &["id"])
        .unique_index("inventory", "Stock", "stock_sku_key", &["sku"])
        .foreign_key(
            "inventory",
            "Stock",
            "stock_warehouse_fk",
            &["warehouse_id"],
            "inventory",
            "warehouses",
            &["id"],
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = HaConfig::load().unwrap_or_default();
    init_telemetry_with(&config.logging)?;

    // stored passwords are kept in the configured encoding
    let password = create_codec(config.codec.kind).encode("inventory-secret")?;
    let primary = Arc::new(MockDatabase::new("primary", schema()).with_password(&password));
    let replica = Arc::new(MockDatabase::new("replica", schema()).with_password(&password));
    let stale = Arc::new(MockDatabase::new("stale", schema()).with_password(&password));

    let balancer = Arc::new(StaticBalancer::new(vec![primary, replica]));
    let cluster: ClusterHandle<MockDatabase> = ClusterHandle::from_config("inventory", balancer, &config);

    let active: Vec<String> = cluster.balancer().backends().iter().map(|d| d.id().to_string()).collect();
    println!("-- resynchronizing stale from active set [{}]", active.join(", "));

    synchronize(&cluster, stale.clone(), &PlanPrinter).await?;

    println!("-- open connections left on stale: {}", stale.open_connections());
    Ok(())
}
