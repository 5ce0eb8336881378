use rulegate_core::MultiError;
use serde::{Deserialize, Serialize};

/// What the validator factory needs to know about an entity.
///
/// The factory never looks at entity fields directly; everything goes through
/// these accessors.
pub trait TenantedEntity: Send + Sync + 'static {
    /// Structural checks of the entity itself, run in the `Basic` stage at
    /// `High` priority.
    fn validate(&self, errors: &mut MultiError);

    /// Primary key. `None` or an empty string means the id is unset.
    fn id(&self) -> Option<&str>;

    /// Table the entity is stored in, used by uniqueness checks.
    fn table_name(&self) -> &str;

    fn organization_id(&self) -> &str;

    fn business_unit_id(&self) -> &str;

    /// The id, if set and non-empty.
    fn present_id(&self) -> Option<&str> {
        self.id().filter(|id| !id.is_empty())
    }
}

/// Lifecycle operation being validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationContext {
    pub is_create: bool,
    pub is_update: bool,
}

impl ValidationContext {
    pub fn create() -> Self {
        Self {
            is_create: true,
            is_update: false,
        }
    }

    pub fn update() -> Self {
        Self {
            is_create: false,
            is_update: true,
        }
    }
}
