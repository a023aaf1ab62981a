//! PostgreSQL document collection: one table per collection, documents kept as JSONB.
//! Tables are created by [`crate::migration::apply_migrations`].

use super::{DocumentCollection, DocumentId, Filter, FindOptions, Record, ID_FIELD};
use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct PgCollection {
    pool: PgPool,
    table: String,
}

impl PgCollection {
    /// `schema` and `table` must already be validated identifiers.
    pub fn new(pool: PgPool, schema: &str, table: &str) -> Self {
        Self {
            pool,
            table: qualified_table(schema, table),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quote(schema), quote(table))
}

fn row_to_record(id: Uuid, payload: Value) -> Record {
    let mut doc = match payload {
        Value::Object(m) => m,
        _ => Record::new(),
    };
    doc.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    doc
}

/// Unique index violations become [`StoreError::Duplicate`].
fn write_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Duplicate(db.constraint().unwrap_or("unique index").to_string())
        }
        other => StoreError::Db(other),
    }
}

fn id_param(filter: &Filter) -> Option<Uuid> {
    filter.id.map(|DocumentId(u)| u)
}

#[async_trait]
impl DocumentCollection for PgCollection {
    async fn insert(&self, mut doc: Record) -> Result<Record, StoreError> {
        doc.remove(ID_FIELD);
        let id = DocumentId::generate();
        let payload = Value::Object(doc);
        let sql = format!("INSERT INTO {} (id, payload) VALUES ($1, $2)", self.table);
        tracing::debug!(sql = %sql, id = %id, "query");
        sqlx::query(&sql)
            .bind(id.0)
            .bind(&payload)
            .execute(&self.pool)
            .await
            .map_err(write_error)?;
        Ok(row_to_record(id.0, payload))
    }

    async fn find(&self, filter: &Filter, options: FindOptions) -> Result<Vec<Record>, StoreError> {
        let sql = format!(
            "SELECT id, payload FROM {} WHERE payload @> $1 AND ($2::uuid IS NULL OR id = $2) \
             ORDER BY inserted_at, id LIMIT $3 OFFSET $4",
            self.table
        );
        tracing::debug!(sql = %sql, filter = ?filter, options = ?options, "query");
        let rows: Vec<(Uuid, Value)> = sqlx::query_as(&sql)
            .bind(Value::Object(filter.fields.clone()))
            .bind(id_param(filter))
            .bind(i64::try_from(options.limit).unwrap_or(i64::MAX))
            .bind(i64::try_from(options.skip).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(id, payload)| row_to_record(id, payload)).collect())
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Record>, StoreError> {
        let sql = format!(
            "SELECT id, payload FROM {} WHERE payload @> $1 AND ($2::uuid IS NULL OR id = $2) \
             ORDER BY inserted_at, id LIMIT 1",
            self.table
        );
        tracing::debug!(sql = %sql, filter = ?filter, "query");
        let row: Option<(Uuid, Value)> = sqlx::query_as(&sql)
            .bind(Value::Object(filter.fields.clone()))
            .bind(id_param(filter))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(id, payload)| row_to_record(id, payload)))
    }

    async fn update(&self, filter: &Filter, mut changes: Record, multi: bool) -> Result<u64, StoreError> {
        changes.remove(ID_FIELD);
        let sql = if multi {
            format!(
                "UPDATE {t} SET payload = payload || $1 WHERE payload @> $2 AND ($3::uuid IS NULL OR id = $3)",
                t = self.table
            )
        } else {
            format!(
                "UPDATE {t} SET payload = payload || $1 WHERE id = (\
                 SELECT id FROM {t} WHERE payload @> $2 AND ($3::uuid IS NULL OR id = $3) \
                 ORDER BY inserted_at, id LIMIT 1)",
                t = self.table
            )
        };
        tracing::debug!(sql = %sql, filter = ?filter, "query");
        let result = sqlx::query(&sql)
            .bind(Value::Object(changes))
            .bind(Value::Object(filter.fields.clone()))
            .bind(id_param(filter))
            .execute(&self.pool)
            .await
            .map_err(write_error)?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn qualified_table_quotes_both_parts() {
        assert_eq!(qualified_table("baas", "objects"), "\"baas\".\"objects\"");
        assert_eq!(quote("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn non_constraint_errors_stay_db_errors() {
        assert!(matches!(write_error(sqlx::Error::RowNotFound), StoreError::Db(_)));
    }

    #[test]
    fn row_to_record_exposes_id() {
        let id = Uuid::new_v4();
        let rec = row_to_record(id, json!({"className": "Note"}));
        assert_eq!(rec[ID_FIELD], json!(id.to_string()));
        assert_eq!(rec["className"], json!("Note"));
    }
}
