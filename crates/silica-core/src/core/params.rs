use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ParamError {
    #[error("unknown parameter '{0}': no default was registered for this subsystem")]
    Unknown(String),

    #[error("parameter '{name}' is declared as {expected}, not {requested}")]
    KindMismatch {
        name: String,
        expected: ParamKind,
        requested: ParamKind,
    },

    #[error("parameter store is sealed: default for '{0}' must be registered before run initialization")]
    Sealed(String),
}

/// The declared kind of a parameter, fixed when its default is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Double,
    Int,
    Str,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Double => write!(f, "double"),
            ParamKind::Int => write!(f, "int"),
            ParamKind::Str => write!(f, "string"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Double(f64),
    Int(i64),
    Str(String),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Double(_) => ParamKind::Double,
            ParamValue::Int(_) => ParamKind::Int,
            ParamValue::Str(_) => ParamKind::Str,
        }
    }
}

/// Typed key/value store of named subsystem parameters with declared defaults.
///
/// Every parameter a subsystem reads at run time must have had a default
/// registered during subsystem construction. Overrides and lookups against a
/// name that was never declared are misuse errors, not recoverable runtime
/// failures; the declared defaults form a closed parameter schema per
/// subsystem type.
///
/// The store is sealed when the owning subsystem initializes for a run; after
/// that point no further defaults may be registered.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    defaults: HashMap<String, ParamValue>,
    overrides: HashMap<String, ParamValue>,
    sealed: bool,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a double default. Re-registering the same name overwrites
    /// the previous default.
    pub fn set_default_double(&mut self, name: &str, value: f64) -> Result<(), ParamError> {
        self.set_default(name, ParamValue::Double(value))
    }

    /// Registers an integer default. Re-registering the same name overwrites
    /// the previous default.
    pub fn set_default_int(&mut self, name: &str, value: i64) -> Result<(), ParamError> {
        self.set_default(name, ParamValue::Int(value))
    }

    /// Registers a string default. Re-registering the same name overwrites
    /// the previous default.
    pub fn set_default_string(&mut self, name: &str, value: &str) -> Result<(), ParamError> {
        self.set_default(name, ParamValue::Str(value.to_string()))
    }

    fn set_default(&mut self, name: &str, value: ParamValue) -> Result<(), ParamError> {
        if self.sealed {
            return Err(ParamError::Sealed(name.to_string()));
        }
        self.defaults.insert(name.to_string(), value);
        Ok(())
    }

    /// Overrides the value of a declared double parameter.
    pub fn set_double(&mut self, name: &str, value: f64) -> Result<(), ParamError> {
        self.set_override(name, ParamValue::Double(value))
    }

    /// Overrides the value of a declared integer parameter.
    pub fn set_int(&mut self, name: &str, value: i64) -> Result<(), ParamError> {
        self.set_override(name, ParamValue::Int(value))
    }

    /// Overrides the value of a declared string parameter.
    pub fn set_string(&mut self, name: &str, value: &str) -> Result<(), ParamError> {
        self.set_override(name, ParamValue::Str(value.to_string()))
    }

    fn set_override(&mut self, name: &str, value: ParamValue) -> Result<(), ParamError> {
        let declared = self
            .defaults
            .get(name)
            .ok_or_else(|| ParamError::Unknown(name.to_string()))?;
        if declared.kind() != value.kind() {
            return Err(ParamError::KindMismatch {
                name: name.to_string(),
                expected: declared.kind(),
                requested: value.kind(),
            });
        }
        self.overrides.insert(name.to_string(), value);
        Ok(())
    }

    /// Returns the current double value: the override if one was set, else the default.
    pub fn get_double(&self, name: &str) -> Result<f64, ParamError> {
        match self.get(name, ParamKind::Double)? {
            ParamValue::Double(v) => Ok(*v),
            _ => unreachable!("kind checked by get"),
        }
    }

    /// Returns the current integer value: the override if one was set, else the default.
    pub fn get_int(&self, name: &str) -> Result<i64, ParamError> {
        match self.get(name, ParamKind::Int)? {
            ParamValue::Int(v) => Ok(*v),
            _ => unreachable!("kind checked by get"),
        }
    }

    /// Returns the current string value: the override if one was set, else the default.
    pub fn get_string(&self, name: &str) -> Result<&str, ParamError> {
        match self.get(name, ParamKind::Str)? {
            ParamValue::Str(v) => Ok(v.as_str()),
            _ => unreachable!("kind checked by get"),
        }
    }

    fn get(&self, name: &str, requested: ParamKind) -> Result<&ParamValue, ParamError> {
        let declared = self
            .defaults
            .get(name)
            .ok_or_else(|| ParamError::Unknown(name.to_string()))?;
        if declared.kind() != requested {
            return Err(ParamError::KindMismatch {
                name: name.to_string(),
                expected: declared.kind(),
                requested,
            });
        }
        Ok(self.overrides.get(name).unwrap_or(declared))
    }

    /// Seals the store against further default registration. Called by the
    /// owning subsystem when it initializes for a run.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Iterates over all declared parameter names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.defaults.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_defaults() -> ParameterStore {
        let mut params = ParameterStore::new();
        params.set_default_double("place_x", 0.0).unwrap();
        params.set_default_int("active", 0).unwrap();
        params
            .set_default_string("gdml_path", "DefaultParameters-InvalidPath")
            .unwrap();
        params
    }

    #[test]
    fn registered_defaults_are_retrievable_before_any_override() {
        let params = store_with_defaults();

        assert_eq!(params.get_double("place_x").unwrap(), 0.0);
        assert_eq!(params.get_int("active").unwrap(), 0);
        assert_eq!(
            params.get_string("gdml_path").unwrap(),
            "DefaultParameters-InvalidPath"
        );
    }

    #[test]
    fn override_shadows_default_without_erasing_it() {
        let mut params = store_with_defaults();

        params.set_double("place_x", 12.5).unwrap();
        assert_eq!(params.get_double("place_x").unwrap(), 12.5);

        params.set_int("active", 1).unwrap();
        assert_eq!(params.get_int("active").unwrap(), 1);
    }

    #[test]
    fn re_registering_a_default_overwrites_it() {
        let mut params = store_with_defaults();

        params.set_default_double("place_x", -3.0).unwrap();
        assert_eq!(params.get_double("place_x").unwrap(), -3.0);
    }

    #[test]
    fn lookup_of_undeclared_name_is_an_unknown_parameter_error() {
        let params = store_with_defaults();

        assert_eq!(
            params.get_double("place_q"),
            Err(ParamError::Unknown("place_q".to_string()))
        );
    }

    #[test]
    fn override_of_undeclared_name_is_rejected() {
        let mut params = store_with_defaults();

        assert_eq!(
            params.set_double("never_declared", 1.0),
            Err(ParamError::Unknown("never_declared".to_string()))
        );
    }

    #[test]
    fn kind_mismatch_is_distinct_from_unknown() {
        let mut params = store_with_defaults();

        let get_err = params.get_int("place_x").unwrap_err();
        assert!(matches!(get_err, ParamError::KindMismatch { .. }));

        let set_err = params.set_string("active", "yes").unwrap_err();
        assert!(matches!(set_err, ParamError::KindMismatch { .. }));
    }

    #[test]
    fn sealed_store_rejects_new_defaults_but_accepts_overrides() {
        let mut params = store_with_defaults();
        params.seal();

        assert_eq!(
            params.set_default_int("late", 1),
            Err(ParamError::Sealed("late".to_string()))
        );
        params.set_int("active", 1).unwrap();
        assert_eq!(params.get_int("active").unwrap(), 1);
    }
}
