use crate::plan::CascadePlan;
use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub plan: CascadePlan,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, falling back to defaults for
    /// missing keys.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://users.db".to_string());

        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .with_context(|| format!("DB_MAX_CONNECTIONS must be a positive integer, got {raw:?}"))?,
            None => 5,
        };

        let defaults = CascadePlan::default();
        let dependents = match lookup("PURGE_DEPENDENT_TABLES") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            None => defaults.dependents().to_vec(),
        };
        let owner = lookup("PURGE_OWNER_TABLE").unwrap_or_else(|| defaults.owner().to_string());
        let key_column =
            lookup("PURGE_KEY_COLUMN").unwrap_or_else(|| defaults.key_column().to_string());

        let plan = CascadePlan::new(dependents, owner, key_column)
            .context("invalid cascade table configuration")?;

        Ok(Config {
            database_url,
            max_connections,
            plan,
        })
    }
}
