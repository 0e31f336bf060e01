//! Driver-level metadata introspection contract
//!
//! Rows mirror what a driver reports for each introspection call. Codes for
//! index types, referential actions and deferrability follow the standard
//! enumeration used by SQL drivers.

use crate::error::Result;
use async_trait::async_trait;

/// Index type codes reported by `index_info`
pub mod index_type {
    pub const STATISTIC: i16 = 0;
    pub const CLUSTERED: i16 = 1;
    pub const HASHED: i16 = 2;
    pub const OTHER: i16 = 3;
}

/// Update/delete rule codes reported by `imported_keys`
pub mod referential_action {
    pub const CASCADE: i32 = 0;
    pub const RESTRICT: i32 = 1;
    pub const SET_NULL: i32 = 2;
    pub const NO_ACTION: i32 = 3;
    pub const SET_DEFAULT: i32 = 4;
}

/// Deferrability codes reported by `imported_keys`
pub mod deferrability {
    pub const INITIALLY_DEFERRED: i32 = 5;
    pub const INITIALLY_IMMEDIATE: i32 = 6;
    pub const NOT_DEFERRABLE: i32 = 7;
}

/// A table reported by `tables`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub schema: String,
    pub name: String,
    pub table_type: String,
}

/// A column reported by `columns`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRow {
    pub name: String,
    /// Backend-reported SQL type code
    pub data_type: i32,
    /// Backend-native type name
    pub type_name: String,
}

/// One member column of a primary key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKeyRow {
    pub pk_name: String,
    pub column_name: String,
    pub key_seq: i16,
}

/// One column pair of a foreign key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedKeyRow {
    pub fk_name: String,
    pub pktable_schema: String,
    pub pktable_name: String,
    pub pkcolumn_name: String,
    pub fkcolumn_name: String,
    pub key_seq: i16,
    pub update_rule: i32,
    pub delete_rule: i32,
    pub deferrability: i32,
}

/// One member column of an index, or a table statistics row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRow {
    /// Absent for statistics rows
    pub index_name: Option<String>,
    pub index_type: i16,
    pub non_unique: bool,
    pub column_name: Option<String>,
    pub ordinal_position: i16,
}

/// Introspection calls and dialect facts a backend reports about itself
#[async_trait]
pub trait DatabaseMetaData: Send + Sync {
    async fn identifier_quote_string(&self) -> Result<String>;

    /// Backend keywords beyond the SQL standard
    async fn sql_keywords(&self) -> Result<Vec<String>>;

    /// Characters allowed in unquoted identifiers beyond `[A-Za-z0-9_]`
    async fn extra_name_characters(&self) -> Result<String>;

    async fn supports_mixed_case_identifiers(&self) -> Result<bool>;
    async fn supports_mixed_case_quoted_identifiers(&self) -> Result<bool>;
    async fn stores_lower_case_identifiers(&self) -> Result<bool>;
    async fn stores_upper_case_identifiers(&self) -> Result<bool>;

    async fn supports_schemas_in_data_manipulation(&self) -> Result<bool>;
    async fn supports_schemas_in_table_definitions(&self) -> Result<bool>;
    async fn supports_select_for_update(&self) -> Result<bool>;

    /// Tables of the given types across all schemas
    async fn tables(&self, types: &[&str]) -> Result<Vec<TableRow>>;

    async fn columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnRow>>;

    async fn primary_keys(&self, schema: &str, table: &str) -> Result<Vec<PrimaryKeyRow>>;

    async fn imported_keys(&self, schema: &str, table: &str) -> Result<Vec<ImportedKeyRow>>;

    async fn index_info(&self, schema: &str, table: &str, unique: bool) -> Result<Vec<IndexRow>>;
}
