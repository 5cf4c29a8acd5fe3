use std::str::FromStr;
use std::time::Instant;

use metrics::histogram;
use sqlx::{
    Arguments, FromRow,
    sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
};
use tracing::debug;

use super::{Dialect, Select};
use crate::error::Error;
use crate::value::Value;

/// Runs [`Select`] queries against SQLite.
///
/// Every connection enables `case_sensitive_like`, so `like` keeps SQL's
/// case-sensitive meaning and only `ilike` folds case.
pub struct SqliteExecutor {
    pool: SqlitePool,
}

impl SqliteExecutor {
    /// File-backed database, created when missing.
    pub async fn new_file(path: &str) -> Result<Self, Error> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .pragma("case_sensitive_like", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;

        Ok(Self { pool })
    }

    /// In-memory database on a single connection.
    pub async fn new_memory() -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| Error::Storage(e.to_string()))?
            .pragma("case_sensitive_like", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Uses the pool as configured by the caller; `like` then follows the
    /// pool's own `case_sensitive_like` setting.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn fetch_all<T>(&self, select: &Select) -> Result<Vec<T>, Error>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let start = Instant::now();
        let (sql, params) = select.to_sql(Dialect::Sqlite);
        debug!(sql = %sql, params = params.len(), "fetch");

        let rows = sqlx::query_as_with::<_, T, _>(&sql, bind_params(params)?)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;

        histogram!("taxis.query.duration_us", "kind" => "fetch")
            .record(start.elapsed().as_micros() as f64);
        Ok(rows)
    }

    pub async fn count(&self, select: &Select) -> Result<u64, Error> {
        let start = Instant::now();
        let (sql, params) = select.to_count_sql(Dialect::Sqlite);
        debug!(sql = %sql, params = params.len(), "count");

        let count: i64 = sqlx::query_scalar_with(&sql, bind_params(params)?)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;

        histogram!("taxis.query.duration_us", "kind" => "count")
            .record(start.elapsed().as_micros() as f64);
        Ok(count.max(0) as u64)
    }
}

fn bind_params<'q>(params: Vec<Value>) -> Result<SqliteArguments<'q>, Error> {
    let mut args = SqliteArguments::default();
    for value in params {
        let bound = match value {
            Value::Null => args.add(None::<String>),
            Value::Bool(b) => args.add(b),
            Value::Int(i) => args.add(i),
            Value::Float(f) => args.add(f),
            Value::String(s) => args.add(s),
            Value::Timestamp(t) => args.add(t),
            Value::Uuid(uid) => args.add(uid),
            // Lists outside IN/NOT IN are compared as their JSON text
            Value::List(items) => args.add(
                serde_json::to_string(&items).map_err(|e| Error::Serialize(e.to_string()))?,
            ),
        };
        bound.map_err(|e| Error::Storage(e.to_string()))?;
    }
    Ok(args)
}
