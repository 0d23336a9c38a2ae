use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        UserId(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a transactional user delete. Failures inside the transaction
/// land in `Failed` instead of being returned as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionOutcome {
    Deleted,
    NotDeleted,
    Failed(String),
}

impl DeletionOutcome {
    pub fn message(&self) -> &str {
        match self {
            DeletionOutcome::Deleted => "User deleted",
            DeletionOutcome::NotDeleted => "User not deleted",
            DeletionOutcome::Failed(reason) => reason,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DeletionMessage {
    pub message: String,
}

impl From<DeletionOutcome> for DeletionMessage {
    fn from(outcome: DeletionOutcome) -> Self {
        DeletionMessage {
            message: outcome.message().to_owned(),
        }
    }
}
