//! In-memory mock driver
//!
//! Backends are scripted with a [`MockSchema`]; connections opened from a
//! [`MockDatabase`] answer introspection from that script and record closes
//! and result set releases so tests can assert on resource handling.

use crate::balancer::Balancer;
use crate::codec::Codec;
use crate::connection::{Connection, ResultSet};
use crate::database::Database;
use crate::error::{Error, Result};
use crate::metadata::{
    ColumnRow, DatabaseMetaData, ImportedKeyRow, IndexRow, PrimaryKeyRow, TableRow, deferrability,
    index_type, referential_action,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

type TableKey = (String, String);

fn key(schema: &str, table: &str) -> TableKey {
    (schema.to_string(), table.to_string())
}

/// Scripted dialect and schema of a mock backend
#[derive(Debug, Clone)]
pub struct MockSchema {
    pub quote: String,
    pub keywords: Vec<String>,
    pub extra_name_characters: String,
    pub mixed_case: bool,
    pub mixed_case_quoted: bool,
    pub stores_lower: bool,
    pub stores_upper: bool,
    pub schemas_in_dml: bool,
    pub schemas_in_ddl: bool,
    pub select_for_update: bool,
    pub tables: Vec<TableRow>,
    pub columns: HashMap<TableKey, Vec<ColumnRow>>,
    pub primary_keys: HashMap<TableKey, Vec<PrimaryKeyRow>>,
    pub imported_keys: HashMap<TableKey, Vec<ImportedKeyRow>>,
    pub indexes: HashMap<TableKey, Vec<IndexRow>>,
    /// Per-column auto-increment flags keyed by the probed table expression
    pub auto_increment: HashMap<String, Vec<bool>>,
    /// Names of calls that fail with a data access error
    pub failing: HashSet<String>,
}

impl Default for MockSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSchema {
    /// A lower-case folding dialect quoting with `"`
    pub fn new() -> Self {
        Self {
            quote: "\"".to_string(),
            keywords: Vec::new(),
            extra_name_characters: String::new(),
            mixed_case: false,
            mixed_case_quoted: true,
            stores_lower: true,
            stores_upper: false,
            schemas_in_dml: true,
            schemas_in_ddl: true,
            select_for_update: true,
            tables: Vec::new(),
            columns: HashMap::new(),
            primary_keys: HashMap::new(),
            imported_keys: HashMap::new(),
            indexes: HashMap::new(),
            auto_increment: HashMap::new(),
            failing: HashSet::new(),
        }
    }

    pub fn quote_string(mut self, quote: &str) -> Self {
        self.quote = quote.to_string();
        self
    }

    pub fn keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn extra_name_characters(mut self, extra: &str) -> Self {
        self.extra_name_characters = extra.to_string();
        self
    }

    /// Set mixed-case support and the case the backend stores unquoted identifiers in
    pub fn case_policy(mut self, mixed_case: bool, mixed_case_quoted: bool, lower: bool, upper: bool) -> Self {
        self.mixed_case = mixed_case;
        self.mixed_case_quoted = mixed_case_quoted;
        self.stores_lower = lower;
        self.stores_upper = upper;
        self
    }

    pub fn qualification(mut self, dml: bool, ddl: bool) -> Self {
        self.schemas_in_dml = dml;
        self.schemas_in_ddl = ddl;
        self
    }

    pub fn select_for_update(mut self, supported: bool) -> Self {
        self.select_for_update = supported;
        self
    }

    pub fn table(mut self, schema: &str, name: &str) -> Self {
        self.tables.push(TableRow {
            schema: schema.to_string(),
            name: name.to_string(),
            table_type: "TABLE".to_string(),
        });
        self
    }

    pub fn view(mut self, schema: &str, name: &str) -> Self {
        self.tables.push(TableRow {
            schema: schema.to_string(),
            name: name.to_string(),
            table_type: "VIEW".to_string(),
        });
        self
    }

    pub fn column(mut self, schema: &str, table: &str, name: &str, data_type: i32, type_name: &str) -> Self {
        self.columns.entry(key(schema, table)).or_default().push(ColumnRow {
            name: name.to_string(),
            data_type,
            type_name: type_name.to_string(),
        });
        self
    }

    pub fn primary_key(mut self, schema: &str, table: &str, name: &str, columns: &[&str]) -> Self {
        let rows = self.primary_keys.entry(key(schema, table)).or_default();
        for (i, column) in columns.iter().enumerate() {
            rows.push(PrimaryKeyRow {
                pk_name: name.to_string(),
                column_name: column.to_string(),
                key_seq: i as i16 + 1,
            });
        }
        self
    }

    /// Add a foreign key with `ON DELETE CASCADE`, `ON UPDATE RESTRICT`, not deferrable
    pub fn foreign_key(
        mut self,
        schema: &str,
        table: &str,
        name: &str,
        columns: &[&str],
        foreign_schema: &str,
        foreign_table: &str,
        foreign_columns: &[&str],
    ) -> Self {
        let rows = self.imported_keys.entry(key(schema, table)).or_default();
        for (i, (column, foreign_column)) in columns.iter().zip(foreign_columns).enumerate() {
            rows.push(ImportedKeyRow {
                fk_name: name.to_string(),
                pktable_schema: foreign_schema.to_string(),
                pktable_name: foreign_table.to_string(),
                pkcolumn_name: foreign_column.to_string(),
                fkcolumn_name: column.to_string(),
                key_seq: i as i16 + 1,
                update_rule: referential_action::RESTRICT,
                delete_rule: referential_action::CASCADE,
                deferrability: deferrability::NOT_DEFERRABLE,
            });
        }
        self
    }

    pub fn imported_key_row(mut self, schema: &str, table: &str, row: ImportedKeyRow) -> Self {
        self.imported_keys.entry(key(schema, table)).or_default().push(row);
        self
    }

    pub fn unique_index(mut self, schema: &str, table: &str, name: &str, columns: &[&str]) -> Self {
        let rows = self.indexes.entry(key(schema, table)).or_default();
        for (i, column) in columns.iter().enumerate() {
            rows.push(IndexRow {
                index_name: Some(name.to_string()),
                index_type: index_type::OTHER,
                non_unique: false,
                column_name: Some(column.to_string()),
                ordinal_position: i as i16 + 1,
            });
        }
        self
    }

    /// Append a table statistics row to the index listing
    pub fn statistics_row(mut self, schema: &str, table: &str) -> Self {
        self.indexes.entry(key(schema, table)).or_default().push(IndexRow {
            index_name: None,
            index_type: index_type::STATISTIC,
            non_unique: false,
            column_name: None,
            ordinal_position: 0,
        });
        self
    }

    pub fn index_row(mut self, schema: &str, table: &str, row: IndexRow) -> Self {
        self.indexes.entry(key(schema, table)).or_default().push(row);
        self
    }

    /// Script the result columns returned when `qualified_table` is probed
    pub fn auto_increment(mut self, qualified_table: &str, flags: &[bool]) -> Self {
        self.auto_increment
            .insert(qualified_table.to_string(), flags.to_vec());
        self
    }

    /// Make the named call fail with a data access error
    pub fn fail_on(mut self, call: &str) -> Self {
        self.failing.insert(call.to_string());
        self
    }

    fn check(&self, call: &str) -> Result<()> {
        if self.failing.contains(call) {
            Err(Error::data_access(format!("mock failure in {}", call)))
        } else {
            Ok(())
        }
    }

    fn rows<T: Clone>(map: &HashMap<TableKey, Vec<T>>, schema: &str, table: &str) -> Vec<T> {
        map.get(&key(schema, table)).cloned().unwrap_or_default()
    }
}

/// Connection answering from a [`MockSchema`]
pub struct MockConnection {
    schema: Arc<MockSchema>,
    closed: AtomicBool,
    fail_close: bool,
    open_result_sets: Arc<AtomicUsize>,
    queries: Mutex<Vec<String>>,
}

impl MockConnection {
    pub fn new(schema: Arc<MockSchema>) -> Self {
        Self {
            schema,
            closed: AtomicBool::new(false),
            fail_close: false,
            open_result_sets: Arc::new(AtomicUsize::new(0)),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    /// Result sets handed out and not yet closed
    pub fn open_result_sets(&self) -> usize {
        self.open_result_sets.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl DatabaseMetaData for MockConnection {
    async fn identifier_quote_string(&self) -> Result<String> {
        self.schema.check("identifier_quote_string")?;
        Ok(self.schema.quote.clone())
    }

    async fn sql_keywords(&self) -> Result<Vec<String>> {
        self.schema.check("sql_keywords")?;
        Ok(self.schema.keywords.clone())
    }

    async fn extra_name_characters(&self) -> Result<String> {
        self.schema.check("extra_name_characters")?;
        Ok(self.schema.extra_name_characters.clone())
    }

    async fn supports_mixed_case_identifiers(&self) -> Result<bool> {
        Ok(self.schema.mixed_case)
    }

    async fn supports_mixed_case_quoted_identifiers(&self) -> Result<bool> {
        Ok(self.schema.mixed_case_quoted)
    }

    async fn stores_lower_case_identifiers(&self) -> Result<bool> {
        Ok(self.schema.stores_lower)
    }

    async fn stores_upper_case_identifiers(&self) -> Result<bool> {
        Ok(self.schema.stores_upper)
    }

    async fn supports_schemas_in_data_manipulation(&self) -> Result<bool> {
        Ok(self.schema.schemas_in_dml)
    }

    async fn supports_schemas_in_table_definitions(&self) -> Result<bool> {
        Ok(self.schema.schemas_in_ddl)
    }

    async fn supports_select_for_update(&self) -> Result<bool> {
        Ok(self.schema.select_for_update)
    }

    async fn tables(&self, types: &[&str]) -> Result<Vec<TableRow>> {
        self.schema.check("tables")?;
        Ok(self
            .schema
            .tables
            .iter()
            .filter(|t| types.contains(&t.table_type.as_str()))
            .cloned()
            .collect())
    }

    async fn columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnRow>> {
        self.schema.check("columns")?;
        Ok(MockSchema::rows(&self.schema.columns, schema, table))
    }

    async fn primary_keys(&self, schema: &str, table: &str) -> Result<Vec<PrimaryKeyRow>> {
        self.schema.check("primary_keys")?;
        Ok(MockSchema::rows(&self.schema.primary_keys, schema, table))
    }

    async fn imported_keys(&self, schema: &str, table: &str) -> Result<Vec<ImportedKeyRow>> {
        self.schema.check("imported_keys")?;
        Ok(MockSchema::rows(&self.schema.imported_keys, schema, table))
    }

    async fn index_info(&self, schema: &str, table: &str, unique: bool) -> Result<Vec<IndexRow>> {
        self.schema.check("index_info")?;
        Ok(MockSchema::rows(&self.schema.indexes, schema, table)
            .into_iter()
            .filter(|row| !unique || !row.non_unique)
            .collect())
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn metadata(&self) -> &dyn DatabaseMetaData {
        self
    }

    async fn execute_query(&self, sql: &str) -> Result<Box<dyn ResultSet>> {
        self.schema.check("execute_query")?;
        self.queries.lock().unwrap().push(sql.to_string());

        let flags = self
            .schema
            .auto_increment
            .iter()
            .find(|(table, _)| sql == format!("SELECT * FROM {} WHERE 0=1", table))
            .map(|(_, flags)| flags.clone())
            .ok_or_else(|| Error::data_access(format!("no such relation in: {}", sql)))?;

        self.open_result_sets.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockResultSet {
            flags,
            fail_inspect: self.schema.failing.contains("is_auto_increment"),
            open: self.open_result_sets.clone(),
            closed: false,
        }))
    }

    async fn is_closed(&self) -> Result<bool> {
        Ok(self.closed.load(Ordering::SeqCst))
    }

    async fn close(&self) -> Result<()> {
        if self.fail_close {
            return Err(Error::data_access("mock failure in close"));
        }
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

struct MockResultSet {
    flags: Vec<bool>,
    fail_inspect: bool,
    open: Arc<AtomicUsize>,
    closed: bool,
}

#[async_trait]
impl ResultSet for MockResultSet {
    fn column_count(&self) -> usize {
        self.flags.len()
    }

    fn is_auto_increment(&self, column: usize) -> Result<bool> {
        if self.fail_inspect {
            return Err(Error::data_access("mock failure in is_auto_increment"));
        }
        self.flags
            .get(column)
            .copied()
            .ok_or_else(|| Error::data_access(format!("column index {} out of range", column)))
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.open.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Backend opening [`MockConnection`]s
pub struct MockDatabase {
    id: String,
    schema: Arc<MockSchema>,
    password: String,
    fail_connect: bool,
    fail_close: bool,
    connect_delay: Option<Duration>,
    connects: AtomicUsize,
    connections: Mutex<Vec<Arc<MockConnection>>>,
}

impl std::fmt::Debug for MockDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDatabase").field("id", &self.id).finish()
    }
}

impl MockDatabase {
    pub fn new(id: &str, schema: MockSchema) -> Self {
        Self {
            id: id.to_string(),
            schema: Arc::new(schema),
            password: String::new(),
            fail_connect: false,
            fail_close: false,
            connect_delay: None,
            connects: AtomicUsize::new(0),
            connections: Mutex::new(Vec::new()),
        }
    }

    /// Stored (encoded) password, decoded with the cluster codec on connect
    pub fn with_password(mut self, encoded: &str) -> Self {
        self.password = encoded.to_string();
        self
    }

    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    /// Connections from this backend fail to close
    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = Some(delay);
        self
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn connections(&self) -> Vec<Arc<MockConnection>> {
        self.connections.lock().unwrap().clone()
    }

    pub fn open_connections(&self) -> usize {
        self.connections().iter().filter(|c| c.is_open()).count()
    }
}

#[async_trait]
impl Database for MockDatabase {
    fn id(&self) -> &str {
        &self.id
    }

    async fn connect(&self, codec: &dyn Codec) -> Result<Arc<dyn Connection>> {
        codec.decode(&self.password)?;

        if let Some(delay) = self.connect_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_connect {
            return Err(Error::data_access(format!("connection refused by {}", self.id)));
        }

        self.connects.fetch_add(1, Ordering::SeqCst);
        let mut connection = MockConnection::new(self.schema.clone());
        connection.fail_close = self.fail_close;
        let connection = Arc::new(connection);
        self.connections.lock().unwrap().push(connection.clone());
        Ok(connection)
    }
}

/// Balancer over a fixed, externally mutable active set
///
/// `next` always answers the first active backend.
pub struct StaticBalancer<D> {
    backends: RwLock<Vec<Arc<D>>>,
}

impl<D: Database> StaticBalancer<D> {
    pub fn new(backends: Vec<Arc<D>>) -> Self {
        Self {
            backends: RwLock::new(backends),
        }
    }

    pub fn activate(&self, database: Arc<D>) {
        self.backends.write().unwrap().push(database);
    }

    pub fn deactivate(&self, database: &D) {
        self.backends
            .write()
            .unwrap()
            .retain(|d| d.id() != database.id());
    }
}

impl<D: Database> Balancer<D> for StaticBalancer<D> {
    fn next(&self) -> Option<Arc<D>> {
        self.backends.read().unwrap().first().cloned()
    }

    fn backends(&self) -> Vec<Arc<D>> {
        self.backends.read().unwrap().clone()
    }

    fn active_count(&self) -> usize {
        self.backends.read().unwrap().len()
    }

    fn contains(&self, database: &D) -> bool {
        self.backends
            .read()
            .unwrap()
            .iter()
            .any(|d| d.id() == database.id())
    }
}
