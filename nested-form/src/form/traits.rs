//! Collaborator contracts of the nested form component
//!
//! The component drives three external collaborators:
//!
//! - [`FormLoader`]: fetches form definitions by locator
//! - [`FormRenderer`]: instantiates an embedded form into the anchor
//! - [`ComponentBase`]: the generic component behavior used as fallback
//!
//! The embedded form itself is opaque once instantiated; the component only
//! talks to it through [`EmbeddedForm`].

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use super::options::ChildOptions;
use super::CurrentForm;
use crate::config::LoadSettings;
use crate::dom::Anchor;
use crate::error::{FormError, FormResult};
use crate::events::ChildEvents;
use crate::schema::{Conditional, FormDefinition, NestedFormSchema, Submission};

/// Shared handle to an embedded form instance
pub type ChildForm = Arc<dyn EmbeddedForm>;

/// Non-owning reference to the outermost form
pub type RootRef = Weak<dyn FormRoot>;

/// Flags accepted by value operations
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValueFlags {
    /// Never fetch a referenced submission
    pub no_load: bool,
    /// Do not raise change notifications
    pub no_update_event: bool,
    /// Do not fall back to default values
    pub no_default: bool,
    /// Value was changed by the user
    pub modified: bool,
}

impl ValueFlags {
    /// Flags that suppress reference expansion
    #[must_use]
    pub fn no_load() -> Self {
        Self {
            no_load: true,
            ..Self::default()
        }
    }
}

/// Flags passed with change notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeFlags {
    /// Notify the parent without asking the source to notify again
    pub no_emit: bool,
}

/// Query sent with definition requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadQuery {
    /// Request authoritative, non-cached content
    pub live: bool,
}

impl LoadQuery {
    /// Live (non-cached) query
    #[must_use]
    pub const fn live() -> Self {
        Self { live: true }
    }

    /// Query parameters to append to the request
    #[must_use]
    pub fn params(&self) -> Vec<(&'static str, &'static str)> {
        if self.live {
            vec![("live", "1")]
        } else {
            Vec::new()
        }
    }
}

impl Default for LoadQuery {
    fn default() -> Self {
        Self::live()
    }
}

impl From<&LoadSettings> for LoadQuery {
    fn from(settings: &LoadSettings) -> Self {
        Self {
            live: settings.live,
        }
    }
}

/// Client that fetches form definitions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FormLoader: Send + Sync {
    /// Fetch the definition at `src`
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Load`] when the definition cannot be fetched.
    async fn load_form(&self, src: &str, query: &LoadQuery) -> FormResult<FormDefinition>;
}

/// Instantiates embedded forms
#[async_trait]
pub trait FormRenderer: Send + Sync {
    /// Render `definition` into `anchor` and return the operable instance
    ///
    /// The instance must emit its events through `events`.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Render`] when instantiation fails.
    async fn render(
        &self,
        anchor: Anchor,
        definition: FormDefinition,
        options: ChildOptions,
        events: ChildEvents,
    ) -> FormResult<ChildForm>;
}

/// Operations the nested form component invokes on its embedded form
#[async_trait]
pub trait EmbeddedForm: Send + Sync {
    /// Current submission value
    fn value(&self) -> Submission;

    /// Replace the value; returns whether it changed
    fn set_value(&self, submission: &Submission, flags: ValueFlags) -> bool;

    /// Validate the given data
    fn check_validity(&self, data: &Value, dirty: bool) -> bool;

    /// Whether any field declares conditional logic
    fn has_condition(&self) -> bool;

    /// Evaluate conditional logic against the given data
    fn check_conditions(&self, data: &Value) -> bool;

    /// Recalculate calculated values; returns whether anything changed
    fn calculate_value(&self, data: &Value, flags: ValueFlags) -> bool;

    /// Mark every field pristine (or dirty)
    fn set_pristine(&self, pristine: bool);

    /// Every descendant field
    fn components(&self) -> Vec<Arc<dyn FormComponent>>;

    /// Set the outermost form
    fn set_root(&self, root: RootRef);

    /// Set the form used for page-navigation semantics
    fn set_current_form(&self, form: CurrentForm);

    /// Set the visibility inherited from the embedding field
    fn set_parent_visible(&self, visible: bool);

    /// Suppress standalone submission
    fn set_nosubmit(&self, nosubmit: bool);

    /// Point the form at a form or submission URL
    fn set_url(&self, url: &str);

    /// Forms root of the form's data source, when it has one
    fn forms_url(&self) -> Option<String>;

    /// Set the loading indicator
    fn set_loading(&self, loading: bool);

    /// Submit the form standalone
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Submission`] when the submission is rejected.
    async fn submit(&self) -> FormResult<Submission>;

    /// Fetch the submission the form currently points at
    ///
    /// # Errors
    ///
    /// Returns an error when the submission cannot be fetched.
    async fn load_submission(&self) -> FormResult<Submission>;

    /// Report a submission failure through the form's own error display
    fn on_submission_error(&self, error: &FormError);

    /// Tear down the form
    fn destroy(&self);
}

/// A field inside an embedded form
pub trait FormComponent: Send + Sync {
    /// Data key of the field
    fn key(&self) -> String;

    /// Set the form used for page-navigation semantics
    fn set_current_form(&self, form: CurrentForm);
}

/// The outermost form
pub trait FormRoot: Send + Sync {
    /// Whether standalone submission is suppressed
    fn nosubmit(&self) -> bool;
}

/// Generic component behavior, used whenever no embedded form exists
pub trait ComponentBase: Send + Sync {
    /// Validate the component against the given data
    fn check_validity(&self, _data: &Value, _dirty: bool) -> bool {
        true
    }

    /// Evaluate the component's own conditional logic
    fn check_conditions(&self, _data: &Value) -> bool {
        true
    }

    /// Recalculate a calculated value
    fn calculate_value(&self, _data: &Value, _flags: ValueFlags) -> bool {
        false
    }

    /// Record pristine state
    fn set_pristine(&self, _pristine: bool) {}

    /// Tell the parent that the component's data changed
    fn trigger_change(&self, _flags: ChangeFlags) {}

    /// Whether the containing form is still loading
    fn parent_is_loading(&self) -> bool {
        false
    }

    /// Default page-advance behavior
    ///
    /// # Errors
    ///
    /// Returns an error to stop the page advance.
    fn before_next(&self) -> FormResult<()> {
        Ok(())
    }

    /// Default pre-submission behavior
    ///
    /// # Errors
    ///
    /// Returns an error to stop the submission.
    fn before_submit(&self) -> FormResult<()> {
        Ok(())
    }

    /// Release base resources
    fn destroy(&self) {}
}

/// Change hook installed on [`DefaultBase`]
pub type ChangeHook = Arc<dyn Fn(ChangeFlags) + Send + Sync>;

/// Base behavior driven by the schema's simple conditional
pub struct DefaultBase {
    conditional: Option<Conditional>,
    pristine: AtomicBool,
    parent_loading: AtomicBool,
    on_change: Option<ChangeHook>,
}

impl DefaultBase {
    /// Base behavior for a schema
    #[must_use]
    pub fn from_schema(schema: &NestedFormSchema) -> Self {
        Self {
            conditional: schema.conditional.clone(),
            pristine: AtomicBool::new(true),
            parent_loading: AtomicBool::new(false),
            on_change: None,
        }
    }

    /// Call `hook` on every change notification
    #[must_use]
    pub fn with_change_hook(mut self, hook: impl Fn(ChangeFlags) + Send + Sync + 'static) -> Self {
        self.on_change = Some(Arc::new(hook));
        self
    }

    /// Record whether the containing form is still loading
    pub fn set_parent_loading(&self, loading: bool) {
        self.parent_loading.store(loading, Ordering::SeqCst);
    }

    /// Last recorded pristine state
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.pristine.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for DefaultBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultBase")
            .field("conditional", &self.conditional)
            .field("pristine", &self.is_pristine())
            .finish_non_exhaustive()
    }
}

impl ComponentBase for DefaultBase {
    fn check_conditions(&self, data: &Value) -> bool {
        self.conditional
            .as_ref()
            .is_none_or(|conditional| conditional.evaluate(data))
    }

    fn set_pristine(&self, pristine: bool) {
        self.pristine.store(pristine, Ordering::SeqCst);
    }

    fn trigger_change(&self, flags: ChangeFlags) {
        if let Some(hook) = &self.on_change {
            hook(flags);
        }
    }

    fn parent_is_loading(&self) -> bool {
        self.parent_loading.load(Ordering::SeqCst)
    }
}
