use super::{CountQuery, TenantStore};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A row as column name to text value.
pub type Row = HashMap<String, String>;

/// In-memory tenant store (not persistent, for testing/dev)
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<HashMap<String, Vec<Row>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row to `table`.
    pub async fn insert<I, K, V>(&self, table: &str, row: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let row: Row = row.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    /// Number of rows in `table`.
    pub async fn row_count(&self, table: &str) -> usize {
        self.tables.read().await.get(table).map_or(0, Vec::len)
    }

    pub async fn clear(&self) {
        self.tables.write().await.clear();
    }
}

fn row_matches(row: &Row, query: &CountQuery) -> bool {
    let column = |name: &str| row.get(name).map(String::as_str);

    let same_value = match column(query.field.as_str()) {
        Some(v) if query.case_sensitive => v == query.value,
        Some(v) => v.to_lowercase() == query.value.to_lowercase(),
        None => false,
    };

    same_value
        && column("organization_id") == Some(query.organization_id.as_str())
        && column("business_unit_id") == Some(query.business_unit_id.as_str())
        && query
            .exclude_id
            .as_deref()
            .map_or(true, |id| column("id") != Some(id))
}

#[async_trait]
impl TenantStore for InMemoryStore {
    async fn count(&self, query: &CountQuery) -> Result<i64> {
        query.check_identifiers()?;
        let tables = self.tables.read().await;
        let count = tables
            .get(&query.table)
            .map_or(0, |rows| rows.iter().filter(|row| row_matches(row, query)).count());
        Ok(count as i64)
    }
}
