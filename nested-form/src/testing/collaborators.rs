//! Recording base behavior and a fixed root form

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::FormResult;
use crate::form::{ChangeFlags, ComponentBase, FormRoot, ValueFlags};

#[derive(Debug, Default)]
struct Recorded {
    changes: Vec<ChangeFlags>,
    pristine: Option<bool>,
    destroy_calls: usize,
    before_next_calls: usize,
    before_submit_calls: usize,
}

/// Base behavior with scripted answers that records every notification
#[derive(Debug)]
pub struct RecordingBase {
    valid: bool,
    conditions_pass: bool,
    parent_loading: bool,
    recorded: Mutex<Recorded>,
}

impl Default for RecordingBase {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBase {
    /// Valid, visible, parent finished loading
    #[must_use]
    pub fn new() -> Self {
        Self {
            valid: true,
            conditions_pass: true,
            parent_loading: false,
            recorded: Mutex::new(Recorded::default()),
        }
    }

    /// Validity reported by the base
    #[must_use]
    pub const fn valid(mut self, valid: bool) -> Self {
        self.valid = valid;
        self
    }

    /// Result of the base conditions
    #[must_use]
    pub const fn conditions(mut self, pass: bool) -> Self {
        self.conditions_pass = pass;
        self
    }

    /// Whether the containing form reports itself as loading
    #[must_use]
    pub const fn parent_loading(mut self, loading: bool) -> Self {
        self.parent_loading = loading;
        self
    }

    /// Change notifications received
    #[must_use]
    pub fn changes(&self) -> Vec<ChangeFlags> {
        self.recorded.lock().changes.clone()
    }

    /// Last pristine flag received
    #[must_use]
    pub fn pristine(&self) -> Option<bool> {
        self.recorded.lock().pristine
    }

    /// Number of teardowns
    #[must_use]
    pub fn destroy_calls(&self) -> usize {
        self.recorded.lock().destroy_calls
    }

    /// Number of default page advances
    #[must_use]
    pub fn before_next_calls(&self) -> usize {
        self.recorded.lock().before_next_calls
    }

    /// Number of default pre-submissions
    #[must_use]
    pub fn before_submit_calls(&self) -> usize {
        self.recorded.lock().before_submit_calls
    }
}

impl ComponentBase for RecordingBase {
    fn check_validity(&self, _data: &Value, _dirty: bool) -> bool {
        self.valid
    }

    fn check_conditions(&self, _data: &Value) -> bool {
        self.conditions_pass
    }

    fn calculate_value(&self, _data: &Value, _flags: ValueFlags) -> bool {
        false
    }

    fn set_pristine(&self, pristine: bool) {
        self.recorded.lock().pristine = Some(pristine);
    }

    fn trigger_change(&self, flags: ChangeFlags) {
        self.recorded.lock().changes.push(flags);
    }

    fn parent_is_loading(&self) -> bool {
        self.parent_loading
    }

    fn before_next(&self) -> FormResult<()> {
        self.recorded.lock().before_next_calls += 1;
        Ok(())
    }

    fn before_submit(&self) -> FormResult<()> {
        self.recorded.lock().before_submit_calls += 1;
        Ok(())
    }

    fn destroy(&self) {
        self.recorded.lock().destroy_calls += 1;
    }
}

/// Outermost form with a fixed submit-suppression flag
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticRoot {
    nosubmit: bool,
}

impl StaticRoot {
    /// Root that does (or does not) suppress standalone submission
    #[must_use]
    pub const fn new(nosubmit: bool) -> Self {
        Self { nosubmit }
    }
}

impl FormRoot for StaticRoot {
    fn nosubmit(&self) -> bool {
        self.nosubmit
    }
}
