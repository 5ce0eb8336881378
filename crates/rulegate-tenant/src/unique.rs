//! Tenant-scoped uniqueness checks.

use crate::error::StoreError;
use crate::store::{CountQuery, TenantStore};
use async_trait::async_trait;
use rulegate_core::{
    trace_warn, Context, ErrorCode, MultiError, Priority, RuleFault, Stage, ValidationRule,
    ALL_FIELDS,
};
use std::fmt;
use std::sync::Arc;

/// Resolves the store to query for a validation call.
pub type StoreProvider =
    Arc<dyn Fn(&Context) -> Result<Arc<dyn TenantStore>, StoreError> + Send + Sync>;

/// Declares a field whose value must be unique within a tenant.
///
/// `message` may contain `:value`, replaced by the presented value.
#[derive(Clone)]
pub struct UniqueField {
    name: String,
    get_value: Arc<dyn Fn() -> String + Send + Sync>,
    message: Option<String>,
    case_sensitive: bool,
}

impl UniqueField {
    /// Field whose value is read through `get_value` when the check runs.
    pub fn new<F>(name: impl Into<String>, get_value: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            get_value: Arc::new(get_value),
            message: None,
            case_sensitive: true,
        }
    }

    /// Field with a fixed value.
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        Self::new(name, move || value.clone())
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Compare values case-insensitively.
    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> String {
        (self.get_value)()
    }

    fn render(&self, model_name: &str, value: &str) -> String {
        let template = self.message.clone().unwrap_or_else(|| {
            format!(
                "{model_name} with {} ':value' already exists in the organization.",
                self.name
            )
        });
        template.replace(":value", value)
    }
}

impl fmt::Debug for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniqueField")
            .field("name", &self.name)
            .field("message", &self.message)
            .field("case_sensitive", &self.case_sensitive)
            .finish()
    }
}

/// Reports every unique field that collides with another row of the tenant.
///
/// Runs in `DataIntegrity` at `Medium` priority. Each field is checked with
/// its own count query so that each collision is reported on its own field.
/// Empty values are skipped. If the store cannot be reached or a query fails,
/// one `system-error` on `__all__` is recorded for the whole run and the
/// remaining fields are still checked.
pub struct UniquenessRule {
    provider: StoreProvider,
    table: String,
    organization_id: String,
    business_unit_id: String,
    model_name: String,
    fields: Vec<UniqueField>,
    exclude_id: Option<String>,
}

impl UniquenessRule {
    pub fn new(
        provider: StoreProvider,
        table: impl Into<String>,
        organization_id: impl Into<String>,
        business_unit_id: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            table: table.into(),
            organization_id: organization_id.into(),
            business_unit_id: business_unit_id.into(),
            model_name: "Entity".to_string(),
            fields: Vec::new(),
            exclude_id: None,
        }
    }

    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    pub fn with_fields(mut self, fields: Vec<UniqueField>) -> Self {
        self.fields = fields;
        self
    }

    /// Leave the row with this id out of every count (update mode).
    pub fn excluding(mut self, id: impl Into<String>) -> Self {
        self.exclude_id = Some(id.into());
        self
    }

    fn query(&self, field: &UniqueField, value: String) -> CountQuery {
        CountQuery {
            table: self.table.clone(),
            field: field.name.clone(),
            value,
            organization_id: self.organization_id.clone(),
            business_unit_id: self.business_unit_id.clone(),
            exclude_id: self.exclude_id.clone(),
            case_sensitive: field.case_sensitive,
        }
    }

    fn record_failure(&self, errors: &mut MultiError, error: &StoreError) {
        trace_warn!(table = %self.table, error = %error, "uniqueness check failed");
        errors.add(
            ALL_FIELDS,
            ErrorCode::SystemError,
            format!("Failed to check {} uniqueness: {error}", self.model_name),
        );
    }
}

impl fmt::Debug for UniquenessRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniquenessRule")
            .field("table", &self.table)
            .field("organization_id", &self.organization_id)
            .field("business_unit_id", &self.business_unit_id)
            .field("fields", &self.fields)
            .field("exclude_id", &self.exclude_id)
            .finish()
    }
}

#[async_trait]
impl ValidationRule for UniquenessRule {
    fn name(&self) -> &str {
        "uniqueness"
    }

    fn stage(&self) -> Stage {
        Stage::DataIntegrity
    }

    fn priority(&self) -> Priority {
        Priority::Medium
    }

    async fn validate(&self, ctx: &Context, errors: &mut MultiError) -> Result<(), RuleFault> {
        let store = match (self.provider)(ctx) {
            Ok(store) => store,
            Err(error) => {
                self.record_failure(errors, &error);
                return Ok(());
            }
        };

        let mut failure = None;
        for field in &self.fields {
            let value = field.value();
            if value.is_empty() {
                continue;
            }
            let query = self.query(field, value.clone());
            let counted = tokio::select! {
                biased;
                _ = ctx.cancelled() => return Err(RuleFault::Cancelled),
                counted = store.count(&query) => counted,
            };
            match counted {
                Ok(0) => {}
                Ok(_) => errors.add(
                    &field.name,
                    ErrorCode::Invalid,
                    field.render(&self.model_name, &value),
                ),
                Err(error) => {
                    failure.get_or_insert(error);
                }
            }
        }

        if let Some(error) = failure {
            self.record_failure(errors, &error);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;

    async fn provider() -> StoreProvider {
        let store = InMemoryStore::new();
        store
            .insert(
                "customers",
                [
                    ("id", "X"),
                    ("name", "Acme"),
                    ("code", "ACM"),
                    ("organization_id", "O1"),
                    ("business_unit_id", "B1"),
                ],
            )
            .await;
        let store: Arc<dyn TenantStore> = Arc::new(store);
        Arc::new(move |_ctx: &Context| Ok(Arc::clone(&store)))
    }

    fn rule(provider: StoreProvider) -> UniquenessRule {
        UniquenessRule::new(provider, "customers", "O1", "B1").with_model_name("Customer")
    }

    #[tokio::test]
    async fn reports_collision_with_default_message() {
        let rule = rule(provider().await).with_fields(vec![UniqueField::with_value("name", "Acme")]);

        let mut errors = MultiError::new();
        rule.validate(&Context::background(), &mut errors).await.unwrap();

        let recorded = errors.errors();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].field, "name");
        assert_eq!(recorded[0].code, ErrorCode::Invalid);
        assert_eq!(
            recorded[0].message,
            "Customer with name 'Acme' already exists in the organization."
        );
    }

    #[tokio::test]
    async fn fields_are_checked_independently() {
        let rule = rule(provider().await).with_fields(vec![
            UniqueField::with_value("name", "Acme"),
            UniqueField::with_value("code", "acm")
                .case_insensitive()
                .message("Code ':value' is taken"),
            UniqueField::with_value("name", ""),
        ]);

        let mut errors = MultiError::new();
        rule.validate(&Context::background(), &mut errors).await.unwrap();

        assert_eq!(errors.fields(), vec!["name", "code"]);
        assert_eq!(errors.errors()[1].message, "Code 'acm' is taken");
    }

    #[tokio::test]
    async fn update_excludes_own_row() {
        let rule = rule(provider().await)
            .with_fields(vec![UniqueField::with_value("name", "Acme")])
            .excluding("X");

        let mut errors = MultiError::new();
        rule.validate(&Context::background(), &mut errors).await.unwrap();
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn provider_failure_is_one_system_error() {
        let provider: StoreProvider =
            Arc::new(|_ctx: &Context| Err(StoreError::Unavailable("pool exhausted".into())));
        let rule = rule(provider).with_fields(vec![
            UniqueField::with_value("name", "Acme"),
            UniqueField::with_value("code", "ACM"),
        ]);

        let mut errors = MultiError::new();
        rule.validate(&Context::background(), &mut errors).await.unwrap();

        let recorded = errors.errors();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].field, ALL_FIELDS);
        assert!(recorded[0].is_system());
        assert_eq!(
            recorded[0].message,
            "Failed to check Customer uniqueness: Store unavailable: pool exhausted"
        );
    }

    #[tokio::test]
    async fn invalid_identifier_is_a_system_error() {
        let rule = rule(provider().await).with_fields(vec![
            UniqueField::with_value("name; --", "x"),
            UniqueField::with_value("name", "Acme"),
        ]);

        let mut errors = MultiError::new();
        rule.validate(&Context::background(), &mut errors).await.unwrap();
        assert_eq!(errors.fields(), vec!["name", ALL_FIELDS]);
    }
}
