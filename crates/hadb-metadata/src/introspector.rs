//! Schema introspection against one live connection

use crate::quoting::DialectFacts;
use crate::types::{ColumnProperties, ForeignKeyConstraint, UniqueConstraint};
use hadb_core::metadata::index_type;
use hadb_core::{Connection, Result, ResultSet, TableRow};
use std::collections::HashMap;
use std::sync::Arc;

const TABLE_TYPES: &[&str] = &["TABLE"];

/// Introspects a backend through `connection`, quoting with facts read from it
///
/// Table, schema, constraint and key column names are returned quoted.
/// Unique constraint member columns are returned as the driver reports them.
pub struct MetaDataIntrospector<'a> {
    connection: &'a dyn Connection,
    facts: Arc<DialectFacts>,
}

impl<'a> MetaDataIntrospector<'a> {
    /// Read fresh dialect facts from `connection`
    pub async fn flush(connection: &'a dyn Connection) -> Result<Self> {
        let facts = DialectFacts::load(connection.metadata()).await?;
        Ok(Self::with_facts(connection, Arc::new(facts)))
    }

    /// Reuse facts previously read from the same backend
    pub fn with_facts(connection: &'a dyn Connection, facts: Arc<DialectFacts>) -> Self {
        Self { connection, facts }
    }

    pub fn facts(&self) -> &Arc<DialectFacts> {
        &self.facts
    }

    pub fn quote(&self, identifier: &str) -> String {
        self.facts.quote(identifier)
    }

    /// Raw table rows in driver order
    pub(crate) async fn table_rows(&self) -> Result<Vec<TableRow>> {
        self.connection.metadata().tables(TABLE_TYPES).await
    }

    /// Group quoted table names under their quoted schema, preserving row order per schema
    pub(crate) fn group_tables(&self, rows: &[TableRow]) -> HashMap<String, Vec<String>> {
        let mut schemas: HashMap<String, Vec<String>> = HashMap::new();
        for row in rows {
            schemas
                .entry(self.quote(&row.schema))
                .or_default()
                .push(self.quote(&row.name));
        }
        schemas
    }

    /// Quoted table names of every schema, keyed by quoted schema name
    pub async fn get_tables(&self) -> Result<HashMap<String, Vec<String>>> {
        let rows = self.table_rows().await?;
        Ok(self.group_tables(&rows))
    }

    /// Columns of a table keyed by quoted name; a repeated name keeps the last row
    pub async fn get_columns(&self, schema: &str, table: &str) -> Result<HashMap<String, ColumnProperties>> {
        let rows = self.connection.metadata().columns(schema, table).await?;

        let mut columns = HashMap::with_capacity(rows.len());
        for row in rows {
            let name = self.quote(&row.name);
            columns.insert(name.clone(), ColumnProperties::new(name, row.data_type, row.type_name));
        }
        Ok(columns)
    }

    /// Primary key of a table, or `None` if it has none
    pub async fn get_primary_key(&self, schema: &str, table: &str) -> Result<Option<UniqueConstraint>> {
        let rows = self.connection.metadata().primary_keys(schema, table).await?;

        let mut constraint: Option<UniqueConstraint> = None;
        for row in rows {
            let key = constraint.get_or_insert_with(|| {
                UniqueConstraint::new(self.quote(&row.pk_name), self.quote(schema), self.quote(table))
            });
            key.push_column(self.quote(&row.column_name));
        }
        Ok(constraint)
    }

    /// Foreign keys of a table, one per constraint name, in first-seen order
    ///
    /// Referenced table and rule codes come from the first row of each key.
    pub async fn get_foreign_key_constraints(&self, schema: &str, table: &str) -> Result<Vec<ForeignKeyConstraint>> {
        let rows = self.connection.metadata().imported_keys(schema, table).await?;

        let mut keys: Vec<ForeignKeyConstraint> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for row in rows {
            let name = self.quote(&row.fk_name);
            let position = *positions.entry(name.clone()).or_insert_with(|| {
                keys.push(ForeignKeyConstraint::new(
                    name,
                    self.quote(schema),
                    self.quote(table),
                    self.quote(&row.pktable_schema),
                    self.quote(&row.pktable_name),
                    row.delete_rule,
                    row.update_rule,
                    row.deferrability,
                ));
                keys.len() - 1
            });

            keys[position].push_column_pair(self.quote(&row.fkcolumn_name), self.quote(&row.pkcolumn_name));
        }
        Ok(keys)
    }

    /// Unique indexes of a table, in first-seen order, skipping statistics rows
    pub async fn get_unique_constraints(&self, schema: &str, table: &str) -> Result<Vec<UniqueConstraint>> {
        let rows = self.connection.metadata().index_info(schema, table, true).await?;

        let mut keys: Vec<UniqueConstraint> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for row in rows {
            if row.index_type == index_type::STATISTIC {
                continue;
            }
            let (Some(index_name), Some(column)) = (row.index_name, row.column_name) else {
                continue;
            };

            let name = self.quote(&index_name);
            let position = *positions.entry(name.clone()).or_insert_with(|| {
                keys.push(UniqueConstraint::new(name, self.quote(schema), self.quote(table)));
                keys.len() - 1
            });

            keys[position].push_column(column);
        }
        Ok(keys)
    }

    /// Whether any column of `qualified_table` is populated by the backend
    pub async fn contains_auto_increment_column(&self, qualified_table: &str) -> Result<bool> {
        probe_auto_increment(self.connection, qualified_table).await
    }

    pub async fn get_qualified_name_for_dml(&self, schema: &str, table: &str) -> Result<String> {
        let supported = self.connection.metadata().supports_schemas_in_data_manipulation().await?;
        Ok(qualify(supported, schema, table))
    }

    pub async fn get_qualified_name_for_ddl(&self, schema: &str, table: &str) -> Result<String> {
        let supported = self.connection.metadata().supports_schemas_in_table_definitions().await?;
        Ok(qualify(supported, schema, table))
    }

    pub async fn supports_select_for_update(&self) -> Result<bool> {
        self.connection.metadata().supports_select_for_update().await
    }
}

pub(crate) fn qualify(supports_schema: bool, schema: &str, table: &str) -> String {
    if supports_schema {
        format!("{}.{}", schema, table)
    } else {
        table.to_string()
    }
}

/// Run a zero-row query against `qualified_table` and inspect its result columns
///
/// The result set is closed whether or not inspection succeeds.
pub(crate) async fn probe_auto_increment(connection: &dyn Connection, qualified_table: &str) -> Result<bool> {
    let sql = format!("SELECT * FROM {} WHERE 0=1", qualified_table);
    let mut result_set = connection.execute_query(&sql).await?;

    let found = any_auto_increment(result_set.as_ref());
    let closed = result_set.close().await;

    let found = found?;
    closed?;
    Ok(found)
}

fn any_auto_increment(result_set: &dyn ResultSet) -> Result<bool> {
    for column in 0..result_set.column_count() {
        if result_set.is_auto_increment(column)? {
            return Ok(true);
        }
    }
    Ok(false)
}
