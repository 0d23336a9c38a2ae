use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("invalid SQL identifier: {0:?}")]
    InvalidIdentifier(String),
    #[error("owner table {0:?} is also listed as a dependent table")]
    OwnerListedAsDependent(String),
}

/// Tables touched by a user delete: dependents first, in order, then the
/// owner row. All tables share the same key column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadePlan {
    dependents: Vec<String>,
    owner: String,
    key_column: String,
}

impl Default for CascadePlan {
    fn default() -> Self {
        CascadePlan {
            dependents: vec!["table1".to_string(), "table2".to_string()],
            owner: "Users".to_string(),
            key_column: "user_id".to_string(),
        }
    }
}

impl CascadePlan {
    pub fn new(
        dependents: Vec<String>,
        owner: String,
        key_column: String,
    ) -> Result<Self, PlanError> {
        for ident in dependents.iter().chain([&owner, &key_column]) {
            validate_identifier(ident)?;
        }
        if dependents.iter().any(|t| t.eq_ignore_ascii_case(&owner)) {
            return Err(PlanError::OwnerListedAsDependent(owner));
        }
        Ok(CascadePlan {
            dependents,
            owner,
            key_column,
        })
    }

    pub fn dependents(&self) -> &[String] {
        &self.dependents
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    pub fn dependent_deletes(&self) -> impl Iterator<Item = String> + '_ {
        self.dependents.iter().map(|table| self.delete_from(table))
    }

    pub fn owner_delete(&self) -> String {
        self.delete_from(&self.owner)
    }

    /// Every statement in execution order; the owner delete is last.
    pub fn statements(&self) -> Vec<String> {
        let mut statements: Vec<String> = self.dependent_deletes().collect();
        statements.push(self.owner_delete());
        statements
    }

    fn delete_from(&self, table: &str) -> String {
        format!("DELETE FROM {} WHERE {} = ?", table, self.key_column)
    }
}

// identifiers end up in SQL text, the user id never does
fn validate_identifier(ident: &str) -> Result<(), PlanError> {
    let mut chars = ident.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(PlanError::InvalidIdentifier(ident.to_string()))
    }
}
