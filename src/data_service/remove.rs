use super::DataService;
use crate::db::{ConnectionPool, PooledConnection};
use crate::models::{DeletionOutcome, UserId};
use log::{error, info, warn};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("could not acquire a database connection: {0}")]
pub struct AcquisitionError(#[source] pub anyhow::Error);

impl<P: ConnectionPool> DataService<P> {
    /// Deletes every row referencing `user_id`, dependents first and the
    /// owner row last, in one transaction.
    ///
    /// Only a failure to obtain a connection is returned as `Err`. Anything
    /// that goes wrong once the connection is held is rolled back and
    /// reported as [`DeletionOutcome::Failed`]. The connection is released
    /// exactly once on every path.
    pub async fn remove_user(&self, user_id: UserId) -> Result<DeletionOutcome, AcquisitionError> {
        let mut conn = self.pool.get_connection().await.map_err(AcquisitionError)?;

        let outcome = match self.cascade_delete(&mut conn, user_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Err(rollback_err) = conn.rollback().await {
                    warn!("Rollback after failed delete of user {user_id} also failed: {rollback_err}");
                }
                error!("Deleting user {user_id} failed: {e}");
                DeletionOutcome::Failed(failure_message(&e))
            }
        };

        conn.release();
        outcome_logged(user_id, &outcome);
        Ok(outcome)
    }

    async fn cascade_delete(
        &self,
        conn: &mut P::Conn,
        user_id: UserId,
    ) -> anyhow::Result<DeletionOutcome> {
        conn.begin_transaction().await?;

        for sql in self.plan.dependent_deletes() {
            conn.execute(&sql, user_id).await?;
        }
        let affected = conn.execute(&self.plan.owner_delete(), user_id).await?;

        if affected == 0 {
            // dependent deletes may have touched orphan rows; keep them
            conn.rollback().await?;
            return Ok(DeletionOutcome::NotDeleted);
        }

        conn.commit().await?;
        Ok(DeletionOutcome::Deleted)
    }
}

/// Database errors are reported with the driver's own message; anything
/// else with its display text.
fn failure_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db_err)) => db_err.message().to_string(),
        _ => err.to_string(),
    }
}

fn outcome_logged(user_id: UserId, outcome: &DeletionOutcome) {
    match outcome {
        DeletionOutcome::Deleted => info!("User {user_id} deleted."),
        DeletionOutcome::NotDeleted => warn!("User {user_id} not found, nothing deleted."),
        DeletionOutcome::Failed(_) => {}
    }
}
