//! Catalog introspection.
//!
//! Builds the Schema Descriptor (tables, columns, primary keys, foreign
//! keys, indexes) for the connected database. Everything here reads the live
//! catalog on every call — no caching; if the calling agent wants to cache a
//! schema, that is its decision, not this core's.
//!
//! # Architecture
//!
//! SQL/PRAGMA text is organized in the `queries` submodule with constants per
//! database type. Database-specific implementations live in their respective
//! submodules (postgres, mysql, sqlite), each providing the same interface.

use crate::db::ident::quote_identifier;
use crate::db::manager::DbPool;
use crate::error::DbResult;
use crate::models::{
    ColumnDefinition, DatabaseType, ForeignKey, IndexInfo, SchemaDescriptor, TableSchema,
};
use sqlx::Row;
use tracing::debug;

/// Schema inspector for database introspection.
pub struct SchemaInspector;

impl SchemaInspector {
    /// List the names of all base tables.
    ///
    /// This is also the allowlist the sampling tool validates table names
    /// against, so it is always fetched fresh.
    pub async fn list_table_names(pool: &DbPool) -> DbResult<Vec<String>> {
        match pool {
            DbPool::Postgres(p) => postgres::list_table_names(p).await,
            DbPool::MySql(p) => mysql::list_table_names(p).await,
            DbPool::SQLite(p) => sqlite::list_table_names(p).await,
        }
    }

    /// Build the full Schema Descriptor for the connected database.
    pub async fn describe(pool: &DbPool) -> DbResult<SchemaDescriptor> {
        let names = Self::list_table_names(pool).await?;
        debug!(table_count = names.len(), "Introspecting schema");

        let mut tables = Vec::with_capacity(names.len());
        for name in &names {
            let table = match pool {
                DbPool::Postgres(p) => postgres::table_schema(p, name).await?,
                DbPool::MySql(p) => mysql::table_schema(p, name).await?,
                DbPool::SQLite(p) => sqlite::table_schema(p, name).await?,
            };
            tables.push(table);
        }

        Ok(SchemaDescriptor { tables })
    }
}

// =============================================================================
// SQL Query Templates
// =============================================================================

mod queries {
    pub mod postgres {
        pub const LIST_TABLES: &str = r#"
            SELECT table_name
            FROM information_schema.tables
            WHERE table_schema = 'public'
            AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#;

        pub const COLUMNS: &str = r#"
            SELECT column_name, data_type, is_nullable, column_default
            FROM information_schema.columns
            WHERE table_schema = 'public' AND table_name = $1
            ORDER BY ordinal_position
            "#;

        pub const PRIMARY_KEY: &str = r#"
            SELECT kcu.column_name
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON tc.constraint_name = kcu.constraint_name
                AND tc.table_schema = kcu.table_schema
            WHERE tc.table_schema = 'public'
            AND tc.table_name = $1
            AND tc.constraint_type = 'PRIMARY KEY'
            ORDER BY kcu.ordinal_position
            "#;

        pub const FOREIGN_KEYS: &str = r#"
            SELECT
                tc.constraint_name,
                kcu.column_name,
                ccu.table_name AS referred_table,
                ccu.column_name AS referred_column
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON tc.constraint_name = kcu.constraint_name
                AND tc.table_schema = kcu.table_schema
            JOIN information_schema.constraint_column_usage ccu
                ON ccu.constraint_name = tc.constraint_name
                AND ccu.table_schema = tc.table_schema
            WHERE tc.table_schema = 'public'
            AND tc.table_name = $1
            AND tc.constraint_type = 'FOREIGN KEY'
            ORDER BY tc.constraint_name, kcu.ordinal_position
            "#;

        pub const INDEXES: &str = r#"
            SELECT
                i.relname AS index_name,
                array_agg(a.attname ORDER BY array_position(ix.indkey, a.attnum)) AS column_names,
                ix.indisunique AS is_unique
            FROM pg_index ix
            JOIN pg_class i ON i.oid = ix.indexrelid
            JOIN pg_class t ON t.oid = ix.indrelid
            JOIN pg_namespace n ON n.oid = t.relnamespace
            JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(ix.indkey)
            WHERE t.relname = $1 AND n.nspname = 'public' AND NOT ix.indisprimary
            GROUP BY i.relname, ix.indisunique
            ORDER BY i.relname
            "#;
    }

    pub mod mysql {
        pub const LIST_TABLES: &str = r#"
            SELECT CONVERT(TABLE_NAME USING utf8) AS TABLE_NAME
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = DATABASE()
            AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
            "#;

        pub const COLUMNS: &str = r#"
            SELECT
                CONVERT(COLUMN_NAME USING utf8) AS COLUMN_NAME,
                CONVERT(COLUMN_TYPE USING utf8) AS COLUMN_TYPE,
                CONVERT(IS_NULLABLE USING utf8) AS IS_NULLABLE,
                CONVERT(COLUMN_DEFAULT USING utf8) AS COLUMN_DEFAULT
            FROM information_schema.COLUMNS
            WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
            "#;

        pub const PRIMARY_KEY: &str = r#"
            SELECT CONVERT(COLUMN_NAME USING utf8) AS COLUMN_NAME
            FROM information_schema.KEY_COLUMN_USAGE
            WHERE TABLE_SCHEMA = DATABASE()
            AND TABLE_NAME = ?
            AND CONSTRAINT_NAME = 'PRIMARY'
            ORDER BY ORDINAL_POSITION
            "#;

        pub const FOREIGN_KEYS: &str = r#"
            SELECT
                CONVERT(CONSTRAINT_NAME USING utf8) AS CONSTRAINT_NAME,
                CONVERT(COLUMN_NAME USING utf8) AS COLUMN_NAME,
                CONVERT(REFERENCED_TABLE_NAME USING utf8) AS REFERRED_TABLE,
                CONVERT(REFERENCED_COLUMN_NAME USING utf8) AS REFERRED_COLUMN
            FROM information_schema.KEY_COLUMN_USAGE
            WHERE TABLE_SCHEMA = DATABASE()
            AND TABLE_NAME = ?
            AND REFERENCED_TABLE_NAME IS NOT NULL
            ORDER BY CONSTRAINT_NAME, ORDINAL_POSITION
            "#;

        pub const INDEXES: &str = r#"
            SELECT
                CONVERT(INDEX_NAME USING utf8) AS INDEX_NAME,
                NON_UNIQUE,
                CONVERT(COLUMN_NAME USING utf8) AS COLUMN_NAME
            FROM information_schema.STATISTICS
            WHERE TABLE_SCHEMA = DATABASE()
            AND TABLE_NAME = ?
            AND INDEX_NAME <> 'PRIMARY'
            ORDER BY INDEX_NAME, SEQ_IN_INDEX
            "#;
    }

    pub mod sqlite {
        pub const LIST_TABLES: &str = r#"
            SELECT name FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#;
    }
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================

mod postgres {
    use super::*;
    use sqlx::PgPool;

    pub async fn list_table_names(pool: &PgPool) -> DbResult<Vec<String>> {
        let rows = sqlx::query(queries::postgres::LIST_TABLES)
            .fetch_all(pool)
            .await?;
        rows.iter()
            .map(|r| r.try_get::<String, _>("table_name").map_err(Into::into))
            .collect()
    }

    pub async fn table_schema(pool: &PgPool, table: &str) -> DbResult<TableSchema> {
        let mut schema = TableSchema::new(table);

        let rows = sqlx::query(queries::postgres::COLUMNS)
            .bind(table)
            .fetch_all(pool)
            .await?;
        for row in &rows {
            let name: String = row.try_get("column_name")?;
            let data_type: String = row.try_get("data_type")?;
            let is_nullable: String = row.try_get("is_nullable")?;
            let default: Option<String> = row.try_get("column_default")?;
            let mut column = ColumnDefinition::new(name, data_type, is_nullable == "YES");
            if let Some(default) = default {
                column = column.with_default(default);
            }
            schema.columns.push(column);
        }

        let rows = sqlx::query(queries::postgres::PRIMARY_KEY)
            .bind(table)
            .fetch_all(pool)
            .await?;
        for row in &rows {
            schema.primary_key.push(row.try_get("column_name")?);
        }

        let rows = sqlx::query(queries::postgres::FOREIGN_KEYS)
            .bind(table)
            .fetch_all(pool)
            .await?;
        let mut fk_acc = Vec::new();
        for row in &rows {
            let constraint: String = row.try_get("constraint_name")?;
            let column: String = row.try_get("column_name")?;
            let referred_table: String = row.try_get("referred_table")?;
            let referred_column: String = row.try_get("referred_column")?;
            push_foreign_key_column(
                &mut fk_acc,
                &constraint,
                column,
                referred_table,
                Some(referred_column),
            );
        }
        schema.foreign_keys = finish_foreign_keys(fk_acc);

        let rows = sqlx::query(queries::postgres::INDEXES)
            .bind(table)
            .fetch_all(pool)
            .await?;
        for row in &rows {
            schema.indexes.push(IndexInfo {
                name: row.try_get("index_name")?,
                unique: row.try_get("is_unique")?,
                column_names: row.try_get("column_names")?,
            });
        }

        Ok(schema)
    }
}

mod mysql {
    use super::*;
    use sqlx::MySqlPool;

    pub async fn list_table_names(pool: &MySqlPool) -> DbResult<Vec<String>> {
        let rows = sqlx::query(queries::mysql::LIST_TABLES)
            .fetch_all(pool)
            .await?;
        rows.iter()
            .map(|r| r.try_get::<String, _>("TABLE_NAME").map_err(Into::into))
            .collect()
    }

    pub async fn table_schema(pool: &MySqlPool, table: &str) -> DbResult<TableSchema> {
        let mut schema = TableSchema::new(table);

        let rows = sqlx::query(queries::mysql::COLUMNS)
            .bind(table)
            .fetch_all(pool)
            .await?;
        for row in &rows {
            let name: String = row.try_get("COLUMN_NAME")?;
            let data_type: String = row.try_get("COLUMN_TYPE")?;
            let is_nullable: String = row.try_get("IS_NULLABLE")?;
            let default: Option<String> = row.try_get("COLUMN_DEFAULT")?;
            let mut column = ColumnDefinition::new(name, data_type, is_nullable == "YES");
            if let Some(default) = default {
                column = column.with_default(default);
            }
            schema.columns.push(column);
        }

        let rows = sqlx::query(queries::mysql::PRIMARY_KEY)
            .bind(table)
            .fetch_all(pool)
            .await?;
        for row in &rows {
            schema.primary_key.push(row.try_get("COLUMN_NAME")?);
        }

        let rows = sqlx::query(queries::mysql::FOREIGN_KEYS)
            .bind(table)
            .fetch_all(pool)
            .await?;
        let mut fk_acc = Vec::new();
        for row in &rows {
            let constraint: String = row.try_get("CONSTRAINT_NAME")?;
            let column: String = row.try_get("COLUMN_NAME")?;
            let referred_table: String = row.try_get("REFERRED_TABLE")?;
            let referred_column: String = row.try_get("REFERRED_COLUMN")?;
            push_foreign_key_column(
                &mut fk_acc,
                &constraint,
                column,
                referred_table,
                Some(referred_column),
            );
        }
        schema.foreign_keys = finish_foreign_keys(fk_acc);

        let rows = sqlx::query(queries::mysql::INDEXES)
            .bind(table)
            .fetch_all(pool)
            .await?;
        for row in &rows {
            let name: String = row.try_get("INDEX_NAME")?;
            let non_unique: i64 = row.try_get("NON_UNIQUE")?;
            let column: String = row.try_get("COLUMN_NAME")?;
            match schema.indexes.iter_mut().find(|i| i.name == name) {
                Some(index) => index.column_names.push(column),
                None => schema.indexes.push(IndexInfo {
                    name,
                    unique: non_unique == 0,
                    column_names: vec![column],
                }),
            }
        }

        Ok(schema)
    }
}

mod sqlite {
    use super::*;
    use sqlx::SqlitePool;

    pub async fn list_table_names(pool: &SqlitePool) -> DbResult<Vec<String>> {
        let rows = sqlx::query(queries::sqlite::LIST_TABLES)
            .fetch_all(pool)
            .await?;
        rows.iter()
            .map(|r| r.try_get::<String, _>("name").map_err(Into::into))
            .collect()
    }

    pub async fn table_schema(pool: &SqlitePool, table: &str) -> DbResult<TableSchema> {
        let mut schema = TableSchema::new(table);
        let quoted = quote_identifier(table, DatabaseType::SQLite);

        // PRAGMAs take no bind parameters; the name comes from sqlite_master
        // and is quoted anyway.
        let rows = sqlx::query(&format!("PRAGMA table_info({})", quoted))
            .fetch_all(pool)
            .await?;
        // pk column: 0 = not part of key, otherwise 1-based position
        let mut pk_columns: Vec<(i64, String)> = Vec::new();
        for row in &rows {
            let name: String = row.try_get("name")?;
            let data_type: String = row.try_get("type")?;
            let notnull: i64 = row.try_get("notnull")?;
            let default: Option<String> = row.try_get("dflt_value")?;
            let pk: i64 = row.try_get("pk")?;

            let mut column = ColumnDefinition::new(name.clone(), data_type, notnull == 0);
            if let Some(default) = default {
                column = column.with_default(default);
            }
            schema.columns.push(column);

            if pk > 0 {
                pk_columns.push((pk, name));
            }
        }
        pk_columns.sort_by_key(|(pos, _)| *pos);
        schema.primary_key = pk_columns.into_iter().map(|(_, name)| name).collect();

        let rows = sqlx::query(&format!("PRAGMA foreign_key_list({})", quoted))
            .fetch_all(pool)
            .await?;
        let mut fk_acc = Vec::new();
        for row in &rows {
            let id: i64 = row.try_get("id")?;
            let column: String = row.try_get("from")?;
            let referred_table: String = row.try_get("table")?;
            // "to" is null when the reference targets the primary key
            let referred_column: Option<String> = row.try_get("to")?;
            push_foreign_key_column(
                &mut fk_acc,
                &format!("fk_{}", id),
                column,
                referred_table,
                referred_column,
            );
        }
        schema.foreign_keys = finish_foreign_keys(fk_acc);

        let rows = sqlx::query(&format!("PRAGMA index_list({})", quoted))
            .fetch_all(pool)
            .await?;
        for row in &rows {
            let name: String = row.try_get("name")?;
            if name.starts_with("sqlite_autoindex_") {
                continue;
            }
            let unique: i64 = row.try_get("unique")?;

            let index_quoted = quote_identifier(&name, DatabaseType::SQLite);
            let info_rows = sqlx::query(&format!("PRAGMA index_info({})", index_quoted))
                .fetch_all(pool)
                .await?;
            let mut column_names = Vec::with_capacity(info_rows.len());
            for info in &info_rows {
                // Expression index members have no column name
                if let Some(column) = info.try_get::<Option<String>, _>("name")? {
                    column_names.push(column);
                }
            }

            schema.indexes.push(IndexInfo {
                name,
                unique: unique == 1,
                column_names,
            });
        }

        Ok(schema)
    }
}

/// Append one column pair to the foreign key identified by `constraint`,
/// creating it on first sight. Composite keys arrive as one row per column,
/// ordered by constraint then position. The constraint name itself is not
/// part of the public model, so the accumulator carries it alongside.
fn push_foreign_key_column(
    acc: &mut Vec<(String, ForeignKey)>,
    constraint: &str,
    column: String,
    referred_table: String,
    referred_column: Option<String>,
) {
    match acc.iter_mut().find(|(name, _)| name == constraint) {
        Some((_, fk)) => {
            fk.constrained_columns.push(column);
            if let Some(rc) = referred_column {
                fk.referred_columns.push(rc);
            }
        }
        None => acc.push((
            constraint.to_string(),
            ForeignKey {
                constrained_columns: vec![column],
                referred_table,
                referred_columns: referred_column.into_iter().collect(),
            },
        )),
    }
}

/// Drop the constraint names once grouping is done.
fn finish_foreign_keys(acc: Vec<(String, ForeignKey)>) -> Vec<ForeignKey> {
    acc.into_iter().map(|(_, fk)| fk).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_foreign_key_groups_composite_columns() {
        let mut acc = Vec::new();
        push_foreign_key_column(
            &mut acc,
            "fk_1",
            "order_id".into(),
            "orders".into(),
            Some("id".into()),
        );
        push_foreign_key_column(
            &mut acc,
            "fk_1",
            "order_region".into(),
            "orders".into(),
            Some("region".into()),
        );
        let fks = finish_foreign_keys(acc);
        assert_eq!(fks.len(), 1);
        assert_eq!(fks[0].constrained_columns, vec!["order_id", "order_region"]);
        assert_eq!(fks[0].referred_columns, vec!["id", "region"]);
    }

    #[test]
    fn test_push_foreign_key_separates_constraints() {
        let mut acc = Vec::new();
        push_foreign_key_column(
            &mut acc,
            "fk_1",
            "user_id".into(),
            "users".into(),
            Some("id".into()),
        );
        push_foreign_key_column(
            &mut acc,
            "fk_2",
            "product_id".into(),
            "products".into(),
            Some("id".into()),
        );
        // Two constraints referring to different tables stay separate
        let fks = finish_foreign_keys(acc);
        assert_eq!(fks.len(), 2);
        assert_eq!(fks[0].referred_table, "users");
        assert_eq!(fks[1].referred_table, "products");
    }
}
