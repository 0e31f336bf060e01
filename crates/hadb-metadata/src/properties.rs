//! Cached schema snapshot of one backend

use crate::introspector::{MetaDataIntrospector, probe_auto_increment, qualify};
use crate::quoting::DialectFacts;
use crate::types::{ColumnProperties, ForeignKeyConstraint, UniqueConstraint};
use hadb_core::{Connection, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Everything known about one table
#[derive(Debug, Clone)]
pub struct TableProperties {
    schema: String,
    name: String,
    qualified_name_for_dml: String,
    qualified_name_for_ddl: String,
    columns: HashMap<String, ColumnProperties>,
    primary_key: Option<UniqueConstraint>,
    foreign_keys: Vec<ForeignKeyConstraint>,
    unique_constraints: Vec<UniqueConstraint>,
}

impl TableProperties {
    /// Quoted schema name
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Quoted table name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualified_name_for_dml(&self) -> &str {
        &self.qualified_name_for_dml
    }

    pub fn qualified_name_for_ddl(&self) -> &str {
        &self.qualified_name_for_ddl
    }

    pub fn columns(&self) -> &HashMap<String, ColumnProperties> {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnProperties> {
        self.columns.get(name)
    }

    pub fn primary_key(&self) -> Option<&UniqueConstraint> {
        self.primary_key.as_ref()
    }

    pub fn foreign_keys(&self) -> &[ForeignKeyConstraint] {
        &self.foreign_keys
    }

    pub fn unique_constraints(&self) -> &[UniqueConstraint] {
        &self.unique_constraints
    }
}

/// Schema and capabilities of one backend, as introspected at load time
///
/// Everything except the auto-increment answers is fixed at construction.
/// Auto-increment requires a live probe, so it is asked on first use and
/// remembered per qualified table name.
#[derive(Debug)]
pub struct DatabaseProperties {
    facts: Arc<DialectFacts>,
    schemas: HashMap<String, Vec<String>>,
    tables: Vec<TableProperties>,
    supports_select_for_update: bool,
    supports_schemas_in_dml: bool,
    supports_schemas_in_ddl: bool,
    auto_increment: Mutex<HashMap<String, bool>>,
}

impl DatabaseProperties {
    /// Introspect the whole schema reachable through `connection`
    ///
    /// Fails without a partial result if any introspection call fails.
    pub async fn load(connection: &dyn Connection) -> Result<Self> {
        let introspector = MetaDataIntrospector::flush(connection).await?;
        let metadata = connection.metadata();

        let supports_select_for_update = metadata.supports_select_for_update().await?;
        let supports_schemas_in_dml = metadata.supports_schemas_in_data_manipulation().await?;
        let supports_schemas_in_ddl = metadata.supports_schemas_in_table_definitions().await?;

        let rows = introspector.table_rows().await?;
        let schemas = introspector.group_tables(&rows);

        let mut tables = Vec::with_capacity(rows.len());
        for row in &rows {
            let schema = introspector.quote(&row.schema);
            let name = introspector.quote(&row.name);

            tracing::debug!(schema = %schema, table = %name, "Introspecting table");

            tables.push(TableProperties {
                qualified_name_for_dml: qualify(supports_schemas_in_dml, &schema, &name),
                qualified_name_for_ddl: qualify(supports_schemas_in_ddl, &schema, &name),
                columns: introspector.get_columns(&row.schema, &row.name).await?,
                primary_key: introspector.get_primary_key(&row.schema, &row.name).await?,
                foreign_keys: introspector
                    .get_foreign_key_constraints(&row.schema, &row.name)
                    .await?,
                unique_constraints: introspector
                    .get_unique_constraints(&row.schema, &row.name)
                    .await?,
                schema,
                name,
            });
        }

        Ok(Self {
            facts: introspector.facts().clone(),
            schemas,
            tables,
            supports_select_for_update,
            supports_schemas_in_dml,
            supports_schemas_in_ddl,
            auto_increment: Mutex::new(HashMap::new()),
        })
    }

    /// Dialect facts the snapshot was quoted with
    pub fn facts(&self) -> &Arc<DialectFacts> {
        &self.facts
    }

    /// Quoted table names keyed by quoted schema name
    pub fn schemas(&self) -> &HashMap<String, Vec<String>> {
        &self.schemas
    }

    /// Tables in introspection order
    pub fn tables(&self) -> &[TableProperties] {
        &self.tables
    }

    /// Look up a table by quoted schema and table name
    pub fn table(&self, schema: &str, name: &str) -> Option<&TableProperties> {
        self.tables
            .iter()
            .find(|t| t.schema == schema && t.name == name)
    }

    pub fn supports_select_for_update(&self) -> bool {
        self.supports_select_for_update
    }

    pub fn qualified_name_for_dml(&self, schema: &str, table: &str) -> String {
        qualify(self.supports_schemas_in_dml, schema, table)
    }

    pub fn qualified_name_for_ddl(&self, schema: &str, table: &str) -> String {
        qualify(self.supports_schemas_in_ddl, schema, table)
    }

    /// Whether `table` has a column populated by the backend, probing through `connection` once
    pub async fn contains_auto_increment_column(&self, connection: &dyn Connection, table: &TableProperties) -> Result<bool> {
        let qualified = table.qualified_name_for_dml();

        if let Some(cached) = self.cached_auto_increment(qualified) {
            return Ok(cached);
        }

        let found = probe_auto_increment(connection, qualified).await?;
        self.auto_increment
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(qualified.to_string(), found);
        Ok(found)
    }

    fn cached_auto_increment(&self, qualified: &str) -> Option<bool> {
        self.auto_increment
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(qualified)
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hadb_core::mock::{MockConnection, MockSchema};

    fn shop() -> MockSchema {
        MockSchema::new()
            .qualification(true, false)
            .table("shop", "customers")
            .table("shop", "orders")
            .column("shop", "customers", "id", 4, "int4")
            .column("shop", "customers", "email", 12, "varchar")
            .primary_key("shop", "customers", "customers_pkey", &["id"])
            .unique_index("shop", "customers", "customers_email_key", &["email"])
            .column("shop", "orders", "id", 4, "int4")
            .column("shop", "orders", "customer_id", 4, "int4")
            .primary_key("shop", "orders", "orders_pkey", &["id"])
            .foreign_key("shop", "orders", "orders_customer_fk", &["customer_id"], "shop", "customers", &["id"])
            .auto_increment("shop.orders", &[true, false])
    }

    #[tokio::test]
    async fn test_load_snapshot() {
        let connection = MockConnection::new(Arc::new(shop()));
        let properties = DatabaseProperties::load(&connection).await.unwrap();

        assert_eq!(properties.schemas()["shop"], vec!["customers", "orders"]);
        assert_eq!(properties.tables().len(), 2);
        assert!(properties.supports_select_for_update());

        let orders = properties.table("shop", "orders").unwrap();
        assert_eq!(orders.qualified_name_for_dml(), "shop.orders");
        assert_eq!(orders.qualified_name_for_ddl(), "orders");
        assert_eq!(orders.columns().len(), 2);
        assert_eq!(orders.primary_key().unwrap().columns(), ["id"]);
        assert_eq!(orders.foreign_keys()[0].foreign_table(), "customers");
        assert!(orders.unique_constraints().is_empty());

        let customers = properties.table("shop", "customers").unwrap();
        assert_eq!(customers.unique_constraints()[0].columns(), ["email"]);
        assert!(customers.foreign_keys().is_empty());
    }

    #[tokio::test]
    async fn test_auto_increment_probed_once() {
        let connection = MockConnection::new(Arc::new(shop()));
        let properties = DatabaseProperties::load(&connection).await.unwrap();
        let orders = properties.table("shop", "orders").unwrap();

        assert!(properties.contains_auto_increment_column(&connection, orders).await.unwrap());
        assert!(properties.contains_auto_increment_column(&connection, orders).await.unwrap());
        assert_eq!(connection.queries().len(), 1);
    }

    #[tokio::test]
    async fn test_load_is_all_or_nothing() {
        let connection = MockConnection::new(Arc::new(shop().fail_on("index_info")));
        let result = DatabaseProperties::load(&connection).await;
        assert!(result.unwrap_err().is_data_access());
    }
}
