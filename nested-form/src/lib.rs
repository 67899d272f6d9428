//! nested-form: embed an independently defined form inside a parent form
//!
//! A nested form field loads another form's definition (from a server or
//! declared inline), instantiates it as a child, and makes it behave as a
//! single field of the parent:
//! - **Source resolution**: `src`, `form` id, `path` slug, project and revision
//! - **Loading**: at most one fetch, observed through one readiness signal
//! - **Value sync**: values set early are buffered and replayed in order
//! - **Submission**: optional reference mode storing only `{ _id, form }`
//! - **Events**: child events bubble to the parent except internal plumbing
//!
//! # Design Principles
//!
//! 1. **Collaborators behind traits**: loading, rendering and base behavior are
//!    injected, so the component runs without a browser or a server
//! 2. **One load, one signal**: every caller awaits the same readiness signal
//! 3. **Non-owning back-references**: root and page context are `Weak`
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use nested_form::client::HttpFormLoader;
//! use nested_form::prelude::*;
//! use std::sync::Arc;
//!
//! async fn embed_applicant(renderer: Arc<dyn FormRenderer>) -> anyhow::Result<()> {
//!     nested_form::observability::init()?;
//!     let config = NestedFormConfig::load_for_service("intake")?;
//!
//!     let field = NestedForm::builder(
//!         NestedFormSchema::for_form("applicant", "5d0797bc872fc747da559858"),
//!         Arc::new(HttpFormLoader::new()),
//!         renderer,
//!     )
//!     .config(&config)
//!     .build();
//!
//!     field.ensure_loaded().wait().await?;
//!     let submitted = field.before_submit().await?;
//!     println!("{}", serde_json::to_string(&submitted)?);
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `testing`: in-memory collaborators in `nested_form::testing` for
//!   driving the component without a server or a browser

#![allow(clippy::missing_errors_doc)]

pub mod client;
pub mod config;
pub mod dom;
pub mod error;
pub mod events;
pub mod form;
pub mod observability;
pub mod schema;
pub mod source;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub mod prelude {
    //! Convenience re-exports for common types and traits
    //!
    //! # Examples
    //!
    //! ```rust
    //! use nested_form::prelude::*;
    //! ```

    pub use crate::config::NestedFormConfig;
    pub use crate::dom::{Anchor, Node};
    pub use crate::error::{FormError, FormResult};
    pub use crate::events::{ChildEvents, Emitter};
    pub use crate::form::{
        ChangeFlags, ChildForm, ChildOptions, ComponentBase, CurrentForm, DefaultBase,
        EmbeddedForm, FormComponent, FormLoader, FormRenderer, FormRoot, HostOptions, LoadQuery,
        LoadState, NestedForm, NestedFormBuilder, ReadySignal, ValueChange, ValueFlags,
    };
    pub use crate::schema::{FormDefinition, NestedFormSchema, Submission};
    pub use crate::source::{resolve_source, ApiRoots, Resolution};
}
