//! Registry-free caster for flat scalar targets.

use crate::caster::Caster;
use crate::error::{CastError, MappingError};
use crate::types::{Type, TypeDeclaration, TypeName};
use crate::Value;

/// Casts to the first `string`, `int`, `float`, `bool` or `mixed` candidate of a
/// declaration, using [`Type::cast_scalar`]. A `mixed` target keeps the raw string.
///
/// ```
/// use rowcast::{Caster, ScalarCaster, TypeDeclaration, Value};
///
/// let decl = TypeDeclaration::property("Item", "price").with_types("?float");
/// let caster = ScalarCaster::new(&decl, Some(Value::Float(0.0))).unwrap();
/// assert_eq!(caster.to_variable(Some("9.5")).unwrap(), Value::Float(9.5));
/// assert_eq!(caster.to_variable(None).unwrap(), Value::Float(0.0));
/// ```
#[derive(Debug, Clone)]
pub struct ScalarCaster {
    target: Type,
    nullable: bool,
    default: Option<Value>,
}

impl ScalarCaster {
    /// Build a caster for `declaration`. `default` replaces null cells.
    ///
    /// An untyped declaration behaves as nullable `mixed`.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::UnsupportedType`] if no candidate is a scalar or `mixed`.
    pub fn new(declaration: &TypeDeclaration, default: Option<Value>) -> Result<Self, MappingError> {
        let (target, nullable) = if declaration.is_untyped() {
            (Type::Mixed, true)
        } else {
            let target = declaration
                .candidates()
                .iter()
                .find_map(|c| match c.name {
                    TypeName::Builtin(t) if t.is_scalar() || t == Type::Mixed => Some(t),
                    _ => None,
                })
                .ok_or_else(|| MappingError::UnsupportedType {
                    site: declaration.site().to_string(),
                    caster: "scalar",
                    expected: "string, int, float, bool, mixed",
                })?;
            (target, declaration.is_nullable())
        };

        tracing::debug!(site = %declaration.site(), %target, nullable, "configured scalar caster");
        Ok(Self {
            target,
            nullable,
            default,
        })
    }
}

impl Caster for ScalarCaster {
    fn to_variable(&self, raw: Option<&str>) -> Result<Value, CastError> {
        match raw {
            None if self.nullable => Ok(self.default.clone().unwrap_or_default()),
            None => Err(CastError::not_nullable(self.target.as_str(), None)),
            Some(raw) => self.target.cast_scalar(raw).map_err(|err| {
                CastError::invalid_value(raw, self.target.as_str(), Some(Box::new(err)))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_scalar_candidate_wins() {
        let decl = TypeDeclaration::property("C", "p").with_types("array|bool|int");
        let caster = ScalarCaster::new(&decl, None).unwrap();
        assert_eq!(caster.to_variable(Some("on")).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_non_scalar_declaration_is_rejected() {
        let decl = TypeDeclaration::property("C", "p").with_types("array|iterable");
        let err = ScalarCaster::new(&decl, None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The property `C::p` must be typed with one of string, int, float, bool, mixed \
             to use the scalar caster"
        );
    }

    #[test]
    fn test_untyped_keeps_raw_and_accepts_null() {
        let decl = TypeDeclaration::property("C", "p");
        let caster = ScalarCaster::new(&decl, None).unwrap();
        assert_eq!(caster.to_variable(Some(" x ")).unwrap(), Value::from(" x "));
        assert_eq!(caster.to_variable(None).unwrap(), Value::Null);
    }

    #[test]
    fn test_non_nullable_rejects_null() {
        let decl = TypeDeclaration::property("C", "p").with_types("int");
        let caster = ScalarCaster::new(&decl, None).unwrap();
        assert!(matches!(
            caster.to_variable(None),
            Err(CastError::NotNullable { .. })
        ));
        assert!(matches!(
            caster.to_variable(Some("1e3")),
            Err(CastError::InvalidValue { .. })
        ));
    }
}
