use crate::error::{Result, StoreError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

/// A tenant-scoped count of rows whose `field` equals `value`.
///
/// Renders as
/// `SELECT COUNT(*) FROM <table> WHERE organization_id = $1 AND business_unit_id = $2 AND <field> = $3`,
/// plus `AND id <> $4` when an id is excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountQuery {
    pub table: String,
    pub field: String,
    pub value: String,
    pub organization_id: String,
    pub business_unit_id: String,
    /// Row id left out of the count, set when validating an update
    pub exclude_id: Option<String>,
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,
}

fn default_case_sensitive() -> bool {
    true
}

impl CountQuery {
    /// Reject table and column names that could not be used verbatim in SQL.
    pub fn check_identifiers(&self) -> Result<()> {
        for identifier in [&self.table, &self.field] {
            if !is_identifier(identifier) {
                return Err(StoreError::InvalidIdentifier(identifier.clone()));
            }
        }
        Ok(())
    }

    /// SQL text with `$n` placeholders, bound in the order of [`params`](Self::params).
    pub fn to_sql(&self) -> Result<String> {
        self.check_identifiers()?;
        let comparison = if self.case_sensitive {
            format!("{} = $3", self.field)
        } else {
            format!("LOWER({}) = LOWER($3)", self.field)
        };
        let mut sql = format!(
            "SELECT COUNT(*) FROM {} WHERE organization_id = $1 AND business_unit_id = $2 AND {}",
            self.table, comparison
        );
        if self.exclude_id.is_some() {
            sql.push_str(" AND id <> $4");
        }
        Ok(sql)
    }

    /// Bind parameters for [`to_sql`](Self::to_sql).
    pub fn params(&self) -> Vec<&str> {
        let mut params = vec![
            self.organization_id.as_str(),
            self.business_unit_id.as_str(),
            self.value.as_str(),
        ];
        if let Some(id) = &self.exclude_id {
            params.push(id);
        }
        params
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Read-only, tenant-filtered query capability used by uniqueness checks.
///
/// Implementations must be safe for concurrent use; connection pooling is
/// their concern.
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Count rows matching `query`.
    async fn count(&self, query: &CountQuery) -> Result<i64>;
}
