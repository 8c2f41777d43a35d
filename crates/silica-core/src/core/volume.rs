use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum VolumeError {
    #[error(
        "assembly volumes and logical volumes cannot coexist; logical volume '{logical}' is already selected"
    )]
    LogicalAlreadySet { logical: String },

    #[error(
        "assembly volumes and logical volumes cannot coexist; assembly volumes already selected: {}",
        assemblies.join(", ")
    )]
    AssembliesAlreadySet { assemblies: Vec<String> },
}

/// The geometry-description mode of one subsystem.
///
/// The two populated variants are mutually exclusive for the lifetime of a
/// subsystem instance; the "both populated" state is unrepresentable. `None`
/// is valid and means the subsystem constrains no volumes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VolumeMode {
    #[default]
    None,
    Assembly(BTreeSet<String>),
    Logical(String),
}

/// Tracks which geometry-description mode is active for a subsystem.
///
/// A conflicting selection is a configuration-time fatal error: the caller
/// must abort the run rather than proceed with a malformed geometry
/// description. On conflict the selector is left untouched.
#[derive(Debug, Clone, Default)]
pub struct VolumeSelector {
    mode: VolumeMode,
}

impl VolumeSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named assembly volume. Duplicate names are merged.
    ///
    /// Fails if a logical volume is already selected, naming the conflicting
    /// logical volume in the error.
    pub fn add_assembly_volume(&mut self, name: &str) -> Result<(), VolumeError> {
        match &mut self.mode {
            VolumeMode::None => {
                let mut set = BTreeSet::new();
                set.insert(name.to_string());
                self.mode = VolumeMode::Assembly(set);
                Ok(())
            }
            VolumeMode::Assembly(set) => {
                set.insert(name.to_string());
                Ok(())
            }
            VolumeMode::Logical(logical) => Err(VolumeError::LogicalAlreadySet {
                logical: logical.clone(),
            }),
        }
    }

    /// Selects a single logical volume, replacing any previously selected one.
    ///
    /// Fails if assembly volumes are already registered, enumerating every
    /// registered assembly name in the error.
    pub fn use_logical_volume(&mut self, name: &str) -> Result<(), VolumeError> {
        match &self.mode {
            VolumeMode::None | VolumeMode::Logical(_) => {
                self.mode = VolumeMode::Logical(name.to_string());
                Ok(())
            }
            VolumeMode::Assembly(set) => Err(VolumeError::AssembliesAlreadySet {
                assemblies: set.iter().cloned().collect(),
            }),
        }
    }

    pub fn mode(&self) -> &VolumeMode {
        &self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_after_assemblies_is_rejected_and_mutates_nothing() {
        let mut selector = VolumeSelector::new();
        selector.add_assembly_volume("VST").unwrap();
        selector.add_assembly_volume("FST").unwrap();

        let err = selector.use_logical_volume("World").unwrap_err();
        assert_eq!(
            err,
            VolumeError::AssembliesAlreadySet {
                assemblies: vec!["FST".to_string(), "VST".to_string()],
            }
        );

        let VolumeMode::Assembly(set) = selector.mode() else {
            panic!("assembly mode must survive the failed selection");
        };
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn assembly_after_logical_is_rejected_and_mutates_nothing() {
        let mut selector = VolumeSelector::new();
        selector.use_logical_volume("Foo").unwrap();

        let err = selector.add_assembly_volume("Bar").unwrap_err();
        assert_eq!(
            err,
            VolumeError::LogicalAlreadySet {
                logical: "Foo".to_string(),
            }
        );
        assert_eq!(selector.mode(), &VolumeMode::Logical("Foo".to_string()));
    }

    #[test]
    fn duplicate_assembly_names_are_merged() {
        let mut selector = VolumeSelector::new();
        selector.add_assembly_volume("VST").unwrap();
        selector.add_assembly_volume("VST").unwrap();

        let VolumeMode::Assembly(set) = selector.mode() else {
            panic!("expected assembly mode");
        };
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn reselecting_a_logical_volume_replaces_it() {
        let mut selector = VolumeSelector::new();
        selector.use_logical_volume("Foo").unwrap();
        selector.use_logical_volume("Bar").unwrap();

        assert_eq!(selector.mode(), &VolumeMode::Logical("Bar".to_string()));
    }

    #[test]
    fn absence_of_any_selection_is_valid() {
        let selector = VolumeSelector::new();
        assert_eq!(selector.mode(), &VolumeMode::None);
    }
}
