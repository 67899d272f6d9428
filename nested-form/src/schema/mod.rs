//! Schema types for the nested form component
//!
//! - [`NestedFormSchema`]: configuration of the embedding field itself
//! - [`FormDefinition`]: the definition of the embedded form
//! - [`Submission`]: the value wire format (`{ data }` or `{ _id, form }`)

mod component;
mod definition;
mod submission;

pub use component::{builder_info, BuilderInfo, Conditional, NestedFormSchema};
pub use definition::FormDefinition;
pub use submission::Submission;
