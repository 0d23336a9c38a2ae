pub mod remove;

use crate::plan::CascadePlan;
use sqlx::SqlitePool;
use std::sync::Arc;

pub use remove::*;

/// User data operations over any pool that implements
/// [`crate::db::ConnectionPool`].
pub struct DataService<P = SqlitePool> {
    pub pool: Arc<P>,
    pub plan: CascadePlan,
}

impl<P> DataService<P> {
    pub fn new(pool: Arc<P>, plan: CascadePlan) -> Self {
        DataService { pool, plan }
    }
}

impl<P> Clone for DataService<P> {
    fn clone(&self) -> Self {
        DataService {
            pool: Arc::clone(&self.pool),
            plan: self.plan.clone(),
        }
    }
}
