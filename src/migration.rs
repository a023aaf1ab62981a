//! DDL for the document tables, plus database creation at startup.
//!
//! Every collection is one table of `(id, payload, inserted_at)`; the
//! payload is the whole record as JSONB. All tables live in the schema named
//! by `StoreConfig::schema`.

use crate::config::StoreConfig;
use crate::error::{AppError, ConfigError};
use sqlx::postgres::PgConnectOptions;
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn table_ddl(schema: &str, table: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.{} (
            id UUID PRIMARY KEY,
            payload JSONB NOT NULL,
            inserted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        quote_ident(schema),
        quote_ident(table)
    )
}

fn class_name_index_ddl(schema: &str, table: &str) -> String {
    format!(
        "CREATE INDEX IF NOT EXISTS {} ON {}.{} ((payload->>'className'))",
        quote_ident(&format!("{}_class_name_idx", table)),
        quote_ident(schema),
        quote_ident(table)
    )
}

/// Unique index on the users' login attribute, so concurrent sign-ups with the
/// same login cannot both insert.
fn login_index_ddl(schema: &str, table: &str, login_field: &str) -> String {
    format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {}.{} ((payload->>'{}'))",
        quote_ident(&format!("{}_{}_key", table, login_field)),
        quote_ident(schema),
        quote_ident(table),
        login_field.replace('\'', "''")
    )
}

/// Create the schema, the objects/schemas/users tables, the `className`
/// index on objects and the unique login index on users. Idempotent.
pub async fn apply_migrations(pool: &PgPool, config: &StoreConfig, login_field: &str) -> Result<(), AppError> {
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(&config.schema)))
        .execute(pool)
        .await?;
    for table in [&config.objects_table, &config.schemas_table, &config.users_table] {
        sqlx::query(&table_ddl(&config.schema, table)).execute(pool).await?;
        tracing::debug!(schema = %config.schema, table = %table, "ensured document table");
    }
    sqlx::query(&class_name_index_ddl(&config.schema, &config.objects_table))
        .execute(pool)
        .await?;
    sqlx::query(&login_index_ddl(&config.schema, &config.users_table, login_field))
        .execute(pool)
        .await?;
    tracing::info!(schema = %config.schema, "migrations applied");
    Ok(())
}

/// Connect to the `postgres` maintenance database and create the target
/// database when it does not exist yet.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin, db_name) = target_database(database_url)?;
    let Some(db_name) = db_name.filter(|name| name != "postgres") else {
        return Ok(());
    };
    let mut conn: sqlx::PgConnection = admin.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

/// Options for the maintenance database plus the database named by `url`,
/// if it names one.
fn target_database(url: &str) -> Result<(PgConnectOptions, Option<String>), AppError> {
    let options = PgConnectOptions::from_str(url).map_err(|e| {
        AppError::Config(ConfigError::Invalid {
            key: "DATABASE_URL",
            message: e.to_string(),
        })
    })?;
    let db_name = options
        .get_database()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);
    Ok((options.database("postgres"), db_name))
}
