//! Test utilities
//!
//! A scripted [`BuildSystem`] and proptest generators.

use std::cell::RefCell;
use std::collections::HashSet;

use crate::core::build_system::BuildSystem;
use crate::error::BuildError;

/// Call made against a [`RecordingBuildSystem`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `invoke(step, target)`
    Invoke { step: String, target: String },
    /// `try_resolve_target(target)`
    Lookup(String),
}

/// Build system that records calls and fails on request
#[derive(Debug, Default)]
pub struct RecordingBuildSystem {
    calls: RefCell<Vec<Call>>,
    failing: HashSet<String>,
    unresolvable: HashSet<String>,
}

impl RecordingBuildSystem {
    /// Build system where every target succeeds and resolves
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `target` exit with status 2
    pub fn failing(mut self, target: &str) -> Self {
        self.failing.insert(target.to_string());
        self
    }

    /// Make lookups of `target` fail
    pub fn unresolvable(mut self, target: &str) -> Self {
        self.unresolvable.insert(target.to_string());
        self
    }

    /// Every call in order
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Targets passed to `invoke`, in order
    pub fn invoked(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Invoke { target, .. } => Some(target.clone()),
                Call::Lookup(_) => None,
            })
            .collect()
    }

    /// Targets passed to `try_resolve_target`, in order
    pub fn looked_up(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Lookup(target) => Some(target.clone()),
                Call::Invoke { .. } => None,
            })
            .collect()
    }
}

impl BuildSystem for RecordingBuildSystem {
    fn invoke(&self, step: &str, target: &str) -> Result<(), BuildError> {
        self.calls.borrow_mut().push(Call::Invoke {
            step: step.to_string(),
            target: target.to_string(),
        });
        if self.failing.contains(target) {
            return Err(BuildError::CommandFailed {
                step: step.to_string(),
                target: target.to_string(),
                status: Some(2),
            });
        }
        Ok(())
    }

    fn try_resolve_target(&self, target: &str) -> bool {
        self.calls
            .borrow_mut()
            .push(Call::Lookup(target.to_string()));
        !self.unresolvable.contains(target)
    }
}

pub mod generators {
    use proptest::prelude::*;

    /// Generate a Buildroot package name
    pub fn package_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,20}"
    }

    /// Generate a list of distinct package names
    pub fn candidate_list() -> impl Strategy<Value = Vec<String>> {
        proptest::collection::hash_set(package_name(), 1..6)
            .prop_map(|set| set.into_iter().collect())
    }

    /// Generate a defconfig name with or without the `_defconfig` suffix
    pub fn defconfig_name() -> impl Strategy<Value = String> {
        ("[a-z][a-z0-9_]{0,20}", any::<bool>()).prop_map(|(board, suffix)| {
            if suffix {
                format!("{board}_defconfig")
            } else {
                board
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_recording_build_system_records_in_order() {
        let build = RecordingBuildSystem::new()
            .failing("bad")
            .unresolvable("ghost");
        assert!(build.invoke("a", "good").is_ok());
        assert!(build.invoke("b", "bad").is_err());
        assert!(!build.try_resolve_target("ghost"));
        assert!(build.try_resolve_target("real"));
        assert_eq!(build.invoked(), vec!["good", "bad"]);
        assert_eq!(build.looked_up(), vec!["ghost", "real"]);
        assert_eq!(build.calls().len(), 4);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_candidate_list_generator_distinct(list in candidate_list()) {
            let set: HashSet<_> = list.iter().collect();
            prop_assert_eq!(set.len(), list.len());
            prop_assert!(!list.is_empty());
        }
    }
}
