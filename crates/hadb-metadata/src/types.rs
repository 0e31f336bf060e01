//! Schema snapshot types produced by introspection

use serde::Serialize;

/// A column of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnProperties {
    name: String,
    data_type: i32,
    native_type: String,
}

impl ColumnProperties {
    pub fn new(name: impl Into<String>, data_type: i32, native_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type,
            native_type: native_type.into(),
        }
    }

    /// Quoted column name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backend-reported SQL type code
    pub fn data_type(&self) -> i32 {
        self.data_type
    }

    /// Backend-native type name
    pub fn native_type(&self) -> &str {
        &self.native_type
    }
}

/// A primary key or unique index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniqueConstraint {
    name: String,
    schema: String,
    table: String,
    columns: Vec<String>,
}

impl UniqueConstraint {
    pub fn new(name: impl Into<String>, schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            table: table.into(),
            columns: Vec::new(),
        }
    }

    pub(crate) fn push_column(&mut self, column: impl Into<String>) {
        self.columns.push(column.into());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Member columns in introspection order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

/// A foreign key, possibly spanning several columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyConstraint {
    name: String,
    schema: String,
    table: String,
    foreign_schema: String,
    foreign_table: String,
    columns: Vec<String>,
    foreign_columns: Vec<String>,
    delete_rule: i32,
    update_rule: i32,
    deferrability: i32,
}

impl ForeignKeyConstraint {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
        foreign_schema: impl Into<String>,
        foreign_table: impl Into<String>,
        delete_rule: i32,
        update_rule: i32,
        deferrability: i32,
    ) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            table: table.into(),
            foreign_schema: foreign_schema.into(),
            foreign_table: foreign_table.into(),
            columns: Vec::new(),
            foreign_columns: Vec::new(),
            delete_rule,
            update_rule,
            deferrability,
        }
    }

    pub(crate) fn push_column_pair(&mut self, column: impl Into<String>, foreign_column: impl Into<String>) {
        self.columns.push(column.into());
        self.foreign_columns.push(foreign_column.into());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn foreign_schema(&self) -> &str {
        &self.foreign_schema
    }

    pub fn foreign_table(&self) -> &str {
        &self.foreign_table
    }

    /// Local columns, parallel to [`foreign_columns`](Self::foreign_columns)
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn foreign_columns(&self) -> &[String] {
        &self.foreign_columns
    }

    pub fn delete_rule(&self) -> i32 {
        self.delete_rule
    }

    pub fn update_rule(&self) -> i32 {
        self.update_rule
    }

    pub fn deferrability(&self) -> i32 {
        self.deferrability
    }
}
