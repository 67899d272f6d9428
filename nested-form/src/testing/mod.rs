//! Testing utilities for nested forms
//!
//! In-memory collaborators for unit and integration tests:
//! - [`StaticLoader`] - Serves one definition, counts requests, can be gated
//! - [`FakeRenderer`] - Instantiates scripted [`FakeChild`] forms
//! - [`RecordingBase`] - Base behavior that records what it was asked
//! - [`StaticRoot`] - Outermost form with a fixed submit-suppression flag
//!
//! # Example
//!
//! ```rust
//! use nested_form::prelude::*;
//! use nested_form::testing::{FakeRenderer, StaticLoader};
//! use std::sync::Arc;
//!
//! #[tokio::test]
//! async fn test_value_reaches_child() {
//!     let renderer = Arc::new(FakeRenderer::new());
//!     let field = NestedForm::builder(
//!         NestedFormSchema::for_form("applicant", "abc123"),
//!         Arc::new(StaticLoader::new(FormDefinition::new("Applicant", vec![]))),
//!         renderer.clone(),
//!     )
//!     .build();
//!
//!     field
//!         .set_value(Submission::empty(), ValueFlags::default())
//!         .settled()
//!         .await
//!         .unwrap();
//!
//!     assert_eq!(renderer.render_count(), 1);
//! }
//! ```

mod collaborators;
mod loader;
mod renderer;

pub use collaborators::{RecordingBase, StaticRoot};
pub use loader::{LoadGate, StaticLoader};
pub use renderer::{FakeChild, FakeComponent, FakeRenderer};
