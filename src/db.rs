use crate::models::UserId;
use crate::plan::CascadePlan;
use anyhow::{bail, Context};
use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::str::FromStr;

pub type DbPool = SqlitePool;

/// Hands out exclusively owned connections.
#[async_trait]
pub trait ConnectionPool: Send + Sync {
    type Conn: PooledConnection;

    async fn get_connection(&self) -> anyhow::Result<Self::Conn>;
}

/// One database session borrowed from a pool. `release` consumes the
/// handle, so it can only be given back once.
#[async_trait]
pub trait PooledConnection: Send + Sized {
    async fn begin_transaction(&mut self) -> anyhow::Result<()>;

    /// Runs `sql` with `user_id` bound to its single placeholder and returns
    /// the affected-row count.
    async fn execute(&mut self, sql: &str, user_id: UserId) -> anyhow::Result<u64>;

    async fn commit(&mut self) -> anyhow::Result<()>;

    async fn rollback(&mut self) -> anyhow::Result<()>;

    fn release(self);
}

/// A pooled SQLite connection. While a transaction is open the connection
/// lives inside a `sqlx::Transaction`, so dropping the session at any point
/// queues a rollback before the connection is reused.
pub struct SqliteSession {
    idle: Option<PoolConnection<Sqlite>>,
    tx: Option<Transaction<'static, Sqlite>>,
}

impl SqliteSession {
    fn connection(&mut self) -> anyhow::Result<&mut SqliteConnection> {
        match (self.tx.as_mut(), self.idle.as_mut()) {
            (Some(tx), _) => Ok(&mut **tx),
            (None, Some(conn)) => Ok(&mut **conn),
            (None, None) => bail!("connection was already returned to the pool"),
        }
    }
}

#[async_trait]
impl ConnectionPool for SqlitePool {
    type Conn = SqliteSession;

    async fn get_connection(&self) -> anyhow::Result<Self::Conn> {
        Ok(SqliteSession {
            idle: Some(self.acquire().await?),
            tx: None,
        })
    }
}

#[async_trait]
impl PooledConnection for SqliteSession {
    async fn begin_transaction(&mut self) -> anyhow::Result<()> {
        if self.tx.is_some() {
            bail!("transaction already open");
        }
        let conn = self
            .idle
            .take()
            .context("connection was already returned to the pool")?;
        let tx = Transaction::<'static, Sqlite>::begin(conn, None).await?;
        self.tx = Some(tx);
        Ok(())
    }

    async fn execute(&mut self, sql: &str, user_id: UserId) -> anyhow::Result<u64> {
        let res = sqlx::query(sql)
            .bind(user_id.0)
            .execute(self.connection()?)
            .await?;
        Ok(res.rows_affected())
    }

    // commit and rollback consume the transaction, which hands the
    // connection back to the pool
    async fn commit(&mut self) -> anyhow::Result<()> {
        let tx = self.tx.take().context("no open transaction to commit")?;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&mut self) -> anyhow::Result<()> {
        let tx = self.tx.take().context("no open transaction to roll back")?;
        tx.rollback().await?;
        Ok(())
    }

    fn release(self) {
        drop(self);
    }
}

pub async fn establish_db(db_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

/// Creates the owner table and every dependent table named by `plan` when
/// they do not exist yet.
pub async fn ensure_schema(db: &DbPool, plan: &CascadePlan) -> Result<(), sqlx::Error> {
    let key = plan.key_column();
    sqlx::query(&format!(
        "CREATE TABLE IF NOT EXISTS {} ({} INTEGER PRIMARY KEY, username TEXT NOT NULL)",
        plan.owner(),
        key
    ))
    .execute(db)
    .await?;

    for table in plan.dependents() {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {} (id INTEGER PRIMARY KEY AUTOINCREMENT, {} INTEGER NOT NULL, content TEXT)",
            table, key
        ))
        .execute(db)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::time::Duration;

    /// Single-connection in-memory database; more connections would each
    /// see their own empty database.
    pub async fn memory_pool() -> DbPool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .acquire_timeout(Duration::from_secs(5))
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite")
    }

    pub async fn seed_user(db: &DbPool, plan: &CascadePlan, user_id: i64) {
        sqlx::query(&format!(
            "INSERT INTO {} ({}, username) VALUES (?, ?)",
            plan.owner(),
            plan.key_column()
        ))
        .bind(user_id)
        .bind(format!("user{user_id}"))
        .execute(db)
        .await
        .unwrap();

        for table in plan.dependents() {
            for n in 0..2 {
                sqlx::query(&format!(
                    "INSERT INTO {} ({}, content) VALUES (?, ?)",
                    table,
                    plan.key_column()
                ))
                .bind(user_id)
                .bind(format!("{table} row {n}"))
                .execute(db)
                .await
                .unwrap();
            }
        }
    }

    pub async fn count_rows(db: &DbPool, table: &str, key: &str, user_id: i64) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table} WHERE {key} = ?"))
            .bind(user_id)
            .fetch_one(db)
            .await
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn sqlite_connection_rolls_back_uncommitted_deletes() {
        let db = memory_pool().await;
        let plan = CascadePlan::default();
        ensure_schema(&db, &plan).await.unwrap();
        seed_user(&db, &plan, 1).await;

        let mut conn = db.get_connection().await.unwrap();
        conn.begin_transaction().await.unwrap();
        let affected = conn
            .execute("DELETE FROM table1 WHERE user_id = ?", UserId(1))
            .await
            .unwrap();
        assert_eq!(affected, 2);
        conn.rollback().await.unwrap();
        conn.release();

        assert_eq!(count_rows(&db, "table1", "user_id", 1).await, 2);
    }

    #[tokio::test]
    async fn dropped_session_rolls_back_before_reuse() {
        let db = memory_pool().await;
        let plan = CascadePlan::default();
        ensure_schema(&db, &plan).await.unwrap();
        seed_user(&db, &plan, 1).await;

        let mut conn = db.get_connection().await.unwrap();
        conn.begin_transaction().await.unwrap();
        conn.execute("DELETE FROM table1 WHERE user_id = ?", UserId(1))
            .await
            .unwrap();
        drop(conn);

        let mut next = db.get_connection().await.unwrap();
        next.begin_transaction().await.unwrap();
        next.rollback().await.unwrap();
        next.release();
        assert_eq!(count_rows(&db, "table1", "user_id", 1).await, 2);
    }

    #[tokio::test]
    async fn commit_without_begin_is_an_error() {
        let db = memory_pool().await;
        let mut conn = db.get_connection().await.unwrap();
        assert!(conn.commit().await.is_err());
        assert!(conn.rollback().await.is_err());
        conn.release();
    }

    #[tokio::test]
    async fn ensure_schema_is_repeatable() {
        let db = memory_pool().await;
        let plan = CascadePlan::default();
        ensure_schema(&db, &plan).await.unwrap();
        ensure_schema(&db, &plan).await.unwrap();
        assert_eq!(count_rows(&db, "Users", "user_id", 1).await, 0);
    }
}
