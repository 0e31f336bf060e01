//! SQL generation for synchronization strategies
//!
//! Statements are built from already-quoted metadata, qualified according
//! to the capabilities of the backend they will run against.

use crate::properties::{DatabaseProperties, TableProperties};
use crate::types::{ForeignKeyConstraint, UniqueConstraint};
use hadb_core::metadata::{deferrability, referential_action};

pub trait Dialect: Send + Sync {
    fn create_foreign_key_constraint_sql(&self, properties: &DatabaseProperties, key: &ForeignKeyConstraint) -> String;

    fn drop_foreign_key_constraint_sql(&self, properties: &DatabaseProperties, key: &ForeignKeyConstraint) -> String;

    fn create_unique_constraint_sql(&self, properties: &DatabaseProperties, key: &UniqueConstraint) -> String;

    fn drop_unique_constraint_sql(&self, properties: &DatabaseProperties, key: &UniqueConstraint) -> String;

    /// Remove every row of `table`
    fn truncate_table_sql(&self, table: &TableProperties) -> String;

    /// Select every row of `table`, locking them when the backend supports it and `lock` is set
    fn select_all_sql(&self, properties: &DatabaseProperties, table: &TableProperties, lock: bool) -> String;
}

/// SQL as written by the standard
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardDialect;

impl StandardDialect {
    fn referential_action(code: i32) -> Option<&'static str> {
        match code {
            referential_action::CASCADE => Some("CASCADE"),
            referential_action::RESTRICT => Some("RESTRICT"),
            referential_action::SET_NULL => Some("SET NULL"),
            referential_action::NO_ACTION => Some("NO ACTION"),
            referential_action::SET_DEFAULT => Some("SET DEFAULT"),
            _ => None,
        }
    }

    fn deferrability(code: i32) -> Option<&'static str> {
        match code {
            deferrability::INITIALLY_DEFERRED => Some("DEFERRABLE INITIALLY DEFERRED"),
            deferrability::INITIALLY_IMMEDIATE => Some("DEFERRABLE INITIALLY IMMEDIATE"),
            deferrability::NOT_DEFERRABLE => Some("NOT DEFERRABLE"),
            _ => None,
        }
    }
}

impl Dialect for StandardDialect {
    fn create_foreign_key_constraint_sql(&self, properties: &DatabaseProperties, key: &ForeignKeyConstraint) -> String {
        let mut sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            properties.qualified_name_for_ddl(key.schema(), key.table()),
            key.name(),
            key.columns().join(", "),
            properties.qualified_name_for_ddl(key.foreign_schema(), key.foreign_table()),
            key.foreign_columns().join(", "),
        );

        match Self::referential_action(key.delete_rule()) {
            Some(action) => sql.push_str(&format!(" ON DELETE {}", action)),
            None => tracing::warn!(constraint = %key.name(), code = key.delete_rule(), "Unknown delete rule"),
        }
        match Self::referential_action(key.update_rule()) {
            Some(action) => sql.push_str(&format!(" ON UPDATE {}", action)),
            None => tracing::warn!(constraint = %key.name(), code = key.update_rule(), "Unknown update rule"),
        }
        if let Some(clause) = Self::deferrability(key.deferrability()) {
            sql.push(' ');
            sql.push_str(clause);
        }
        sql
    }

    fn drop_foreign_key_constraint_sql(&self, properties: &DatabaseProperties, key: &ForeignKeyConstraint) -> String {
        format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            properties.qualified_name_for_ddl(key.schema(), key.table()),
            key.name()
        )
    }

    fn create_unique_constraint_sql(&self, properties: &DatabaseProperties, key: &UniqueConstraint) -> String {
        format!(
            "ALTER TABLE {} ADD CONSTRAINT {} UNIQUE ({})",
            properties.qualified_name_for_ddl(key.schema(), key.table()),
            key.name(),
            key.columns().join(", ")
        )
    }

    fn drop_unique_constraint_sql(&self, properties: &DatabaseProperties, key: &UniqueConstraint) -> String {
        format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            properties.qualified_name_for_ddl(key.schema(), key.table()),
            key.name()
        )
    }

    fn truncate_table_sql(&self, table: &TableProperties) -> String {
        format!("DELETE FROM {}", table.qualified_name_for_dml())
    }

    fn select_all_sql(&self, properties: &DatabaseProperties, table: &TableProperties, lock: bool) -> String {
        let mut sql = format!("SELECT * FROM {}", table.qualified_name_for_dml());
        if lock && properties.supports_select_for_update() {
            sql.push_str(" FOR UPDATE");
        }
        sql
    }
}
