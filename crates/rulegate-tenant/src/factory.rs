//! Composes a full validation engine for a tenanted entity.

use crate::entity::{TenantedEntity, ValidationContext};
use crate::store::TenantStore;
use crate::unique::{StoreProvider, UniqueField, UniquenessRule};
use async_trait::async_trait;
use rulegate_core::{
    Context, EngineConfig, ErrorCode, MultiError, Priority, RuleFault, SharedRule, Stage,
    ValidationEngine, ValidationRule,
};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

type UniqueFieldsFn<E> = Arc<dyn Fn(&E) -> Vec<UniqueField> + Send + Sync>;
type CustomRulesFn<E> = Arc<dyn Fn(&Arc<E>, &ValidationContext) -> Vec<SharedRule> + Send + Sync>;

/// Builds validation engines for one entity kind.
///
/// Every engine it produces runs, in stage order:
///
/// 1. the entity's own [`validate`](TenantedEntity::validate) (`Basic`, `High`)
/// 2. on create, a check that the id is unset (`BusinessRules`, `Medium`)
/// 3. tenant-scoped uniqueness of the declared fields (`DataIntegrity`, `Medium`)
/// 4. any custom rules, as supplied
///
/// ## Example
///
/// ```rust,ignore
/// let factory = TenantedValidatorFactory::<Customer>::new(store)
///     .with_model_name("Customer")
///     .with_unique_fields(|c| vec![UniqueField::with_value("name", c.name.clone())]);
///
/// let errors = factory
///     .validate(&Context::background(), customer, &ValidationContext::create())
///     .await;
/// ```
pub struct TenantedValidatorFactory<E> {
    provider: StoreProvider,
    model_name: String,
    unique_fields: Option<UniqueFieldsFn<E>>,
    custom_rules: Option<CustomRulesFn<E>>,
    id_validation: bool,
    config: EngineConfig,
    _entity: PhantomData<fn(&E)>,
}

impl<E: TenantedEntity> TenantedValidatorFactory<E> {
    /// Factory querying `store` for uniqueness.
    pub fn new(store: Arc<dyn TenantStore>) -> Self {
        Self::with_provider(move |_ctx: &Context| Ok(Arc::clone(&store)))
    }

    /// Factory resolving its store per validation call.
    pub fn with_provider<F>(provider: F) -> Self
    where
        F: Fn(&Context) -> crate::error::Result<Arc<dyn TenantStore>> + Send + Sync + 'static,
    {
        Self {
            provider: Arc::new(provider),
            model_name: "Entity".to_string(),
            unique_fields: None,
            custom_rules: None,
            id_validation: true,
            config: EngineConfig::default().max_parallel(5).fail_fast(false),
            _entity: PhantomData,
        }
    }

    /// Name used in generated messages, e.g. `"Customer"`.
    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    pub fn with_unique_fields<F>(mut self, unique_fields: F) -> Self
    where
        F: Fn(&E) -> Vec<UniqueField> + Send + Sync + 'static,
    {
        self.unique_fields = Some(Arc::new(unique_fields));
        self
    }

    pub fn with_custom_rules<F>(mut self, custom_rules: F) -> Self
    where
        F: Fn(&Arc<E>, &ValidationContext) -> Vec<SharedRule> + Send + Sync + 'static,
    {
        self.custom_rules = Some(Arc::new(custom_rules));
        self
    }

    /// Toggle the id-on-create check. On by default.
    pub fn with_id_validation(mut self, enabled: bool) -> Self {
        self.id_validation = enabled;
        self
    }

    pub fn with_engine_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Engine with every rule that applies to `entity` under `vctx`.
    pub fn engine(&self, entity: Arc<E>, vctx: &ValidationContext) -> ValidationEngine {
        let mut engine = ValidationEngine::new(self.config.clone());

        engine.add_rule(DomainRule(Arc::clone(&entity)));

        if self.id_validation && vctx.is_create {
            engine.add_rule(IdOnCreateRule(Arc::clone(&entity)));
        }

        let fields = self
            .unique_fields
            .as_ref()
            .map(|unique_fields| unique_fields(&entity))
            .unwrap_or_default();
        if !fields.is_empty() {
            let mut rule = UniquenessRule::new(
                Arc::clone(&self.provider),
                entity.table_name(),
                entity.organization_id(),
                entity.business_unit_id(),
            )
            .with_model_name(self.model_name.clone())
            .with_fields(fields);
            if vctx.is_update {
                if let Some(id) = entity.present_id() {
                    rule = rule.excluding(id);
                }
            }
            engine.add_rule(rule);
        }

        if let Some(custom_rules) = &self.custom_rules {
            engine.add_rules(custom_rules(&entity, vctx));
        }

        engine
    }

    /// Validate `entity` with a freshly built engine.
    pub async fn validate(
        &self,
        ctx: &Context,
        entity: impl Into<Arc<E>>,
        vctx: &ValidationContext,
    ) -> Option<MultiError> {
        self.engine(entity.into(), vctx).validate(ctx).await
    }
}

impl<E> fmt::Debug for TenantedValidatorFactory<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantedValidatorFactory")
            .field("model_name", &self.model_name)
            .field("unique_fields", &self.unique_fields.is_some())
            .field("custom_rules", &self.custom_rules.is_some())
            .field("id_validation", &self.id_validation)
            .field("config", &self.config)
            .finish()
    }
}

struct DomainRule<E>(Arc<E>);

#[async_trait]
impl<E: TenantedEntity> ValidationRule for DomainRule<E> {
    fn name(&self) -> &str {
        "domain"
    }

    fn stage(&self) -> Stage {
        Stage::Basic
    }

    fn priority(&self) -> Priority {
        Priority::High
    }

    async fn validate(&self, _ctx: &Context, errors: &mut MultiError) -> Result<(), RuleFault> {
        self.0.validate(errors);
        Ok(())
    }
}

struct IdOnCreateRule<E>(Arc<E>);

#[async_trait]
impl<E: TenantedEntity> ValidationRule for IdOnCreateRule<E> {
    fn name(&self) -> &str {
        "id_on_create"
    }

    fn stage(&self) -> Stage {
        Stage::BusinessRules
    }

    fn priority(&self) -> Priority {
        Priority::Medium
    }

    async fn validate(&self, _ctx: &Context, errors: &mut MultiError) -> Result<(), RuleFault> {
        if self.0.present_id().is_some() {
            errors.add("id", ErrorCode::Invalid, "ID cannot be set on create");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;
    use rulegate_core::rules::BusinessRule;

    #[derive(Debug, Default)]
    struct Note {
        id: String,
        title: String,
    }

    impl TenantedEntity for Note {
        fn validate(&self, errors: &mut MultiError) {
            if self.title.is_empty() {
                errors.add("title", ErrorCode::Required, "Title is required");
            }
        }

        fn id(&self) -> Option<&str> {
            Some(&self.id)
        }

        fn table_name(&self) -> &str {
            "notes"
        }

        fn organization_id(&self) -> &str {
            "O1"
        }

        fn business_unit_id(&self) -> &str {
            "B1"
        }
    }

    fn factory() -> TenantedValidatorFactory<Note> {
        TenantedValidatorFactory::new(Arc::new(InMemoryStore::new())).with_model_name("Note")
    }

    #[test]
    fn engine_composition_follows_lifecycle() {
        let note = Arc::new(Note {
            id: "N1".into(),
            title: "t".into(),
        });
        let factory = factory().with_unique_fields(|n: &Note| {
            vec![UniqueField::with_value("title", n.title.clone())]
        });

        let names = |engine: &ValidationEngine| {
            engine
                .rules()
                .iter()
                .map(|r| r.name().to_string())
                .collect::<Vec<_>>()
        };

        let created = factory.engine(Arc::clone(&note), &ValidationContext::create());
        assert_eq!(names(&created), vec!["domain", "id_on_create", "uniqueness"]);

        let updated = factory.engine(note, &ValidationContext::update());
        assert_eq!(names(&updated), vec!["domain", "uniqueness"]);
    }

    #[test]
    fn id_validation_can_be_disabled() {
        let engine = factory()
            .with_id_validation(false)
            .engine(Arc::new(Note::default()), &ValidationContext::create());
        assert_eq!(engine.rule_count(), 1);
    }

    #[tokio::test]
    async fn custom_rules_see_entity_and_context() {
        let factory = factory().with_custom_rules(|note: &Arc<Note>, vctx: &ValidationContext| {
            let long = note.title.len() > 5;
            let is_update = vctx.is_update;
            let rule = BusinessRule::new("title_length").with_check(move |errors| {
                if long && is_update {
                    errors.add("title", ErrorCode::Invalid, "Title cannot grow on update");
                }
                Ok(())
            });
            vec![Arc::new(rule) as SharedRule]
        });

        let note = Note {
            id: "N1".into(),
            title: "a long title".into(),
        };
        let errors = factory
            .validate(&Context::background(), note, &ValidationContext::update())
            .await
            .unwrap();
        assert_eq!(errors.fields(), vec!["title"]);
    }

    #[tokio::test]
    async fn domain_errors_come_first() {
        let note = Note {
            id: "N1".into(),
            title: String::new(),
        };
        let errors = factory()
            .validate(&Context::background(), note, &ValidationContext::create())
            .await
            .unwrap();

        let recorded = errors.errors();
        assert_eq!(errors.fields(), vec!["title", "id"]);
        assert_eq!(recorded[0].priority, Priority::High);
        assert_eq!(recorded[1].message, "ID cannot be set on create");
        assert_eq!(recorded[1].priority, Priority::Medium);
    }
}
