//! The `Caster` trait and the registry-backed callback caster.

use std::fmt::{self, Debug};

use crate::error::{CastError, MappingError};
use crate::registry::{CastCallback, CasterRegistry};
use crate::types::{TypeDeclaration, TypeName};
use crate::Value;

/// Converts one raw cell (or its absence) into a typed [`Value`].
///
/// Casters are configured once and reused for every cell of a column.
pub trait Caster: Send + Sync + Debug {
    /// Convert `raw`. `None` stands for a null cell.
    ///
    /// # Errors
    ///
    /// Returns [`CastError::NotNullable`] when `None` reaches a non-nullable target and
    /// [`CastError::InvalidValue`] when the raw string cannot be converted.
    fn to_variable(&self, raw: Option<&str>) -> Result<Value, CastError>;
}

impl<C: Caster + ?Sized> Caster for Box<C> {
    fn to_variable(&self, raw: Option<&str>) -> Result<Value, CastError> {
        (**self).to_variable(raw)
    }
}

/// Caster delegating to a callback taken from a [`CasterRegistry`].
///
/// The callback is looked up at construction; later registry changes do not affect
/// an existing caster.
///
/// ```
/// use rowcast::{CallbackCaster, Caster, CasterRegistry, TypeDeclaration, Value};
///
/// let registry = CasterRegistry::with_builtin_casters();
/// let decl = TypeDeclaration::property("User", "age").with_types("?int");
/// let caster = CallbackCaster::new(&registry, &decl, None).unwrap();
///
/// assert_eq!(caster.to_variable(Some("42")).unwrap(), Value::Int(42));
/// assert_eq!(caster.to_variable(None).unwrap(), Value::Null);
/// assert!(caster.to_variable(Some("")).is_err());
/// ```
pub struct CallbackCaster {
    type_name: TypeName,
    nullable: bool,
    alias: Option<String>,
    callback: CastCallback,
    options: Vec<Value>,
}

impl Debug for CallbackCaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackCaster")
            .field("type_name", &self.type_name)
            .field("nullable", &self.nullable)
            .field("alias", &self.alias)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl CallbackCaster {
    /// Resolve `declaration` and bind the matching callback, without options.
    ///
    /// # Errors
    ///
    /// See [`with_options`](Self::with_options).
    pub fn new(
        registry: &CasterRegistry,
        declaration: &TypeDeclaration,
        alias: Option<&str>,
    ) -> Result<Self, MappingError> {
        Self::with_options(registry, declaration, alias, None, Vec::new())
    }

    /// Resolve `declaration` and bind the matching callback.
    ///
    /// `type_override` replaces a `mixed` target when no alias is given. `options` are
    /// passed to the callback on every call.
    ///
    /// # Errors
    ///
    /// - [`MappingError::UnsupportedDeclaration`] if no candidate is castable
    /// - [`MappingError::MissingCallback`] if nothing is registered for the target
    pub fn with_options(
        registry: &CasterRegistry,
        declaration: &TypeDeclaration,
        alias: Option<&str>,
        type_override: Option<&str>,
        options: Vec<Value>,
    ) -> Result<Self, MappingError> {
        let target = registry.resolve(declaration)?;
        let (type_name, callback) = registry.resolve_callback(&target, alias, type_override)?;
        tracing::debug!(
            site = %declaration.site(),
            type_name = %type_name,
            nullable = target.nullable,
            alias,
            "configured callback caster"
        );

        Ok(Self {
            type_name,
            nullable: target.nullable,
            alias: alias.map(str::to_owned),
            callback,
            options,
        })
    }

    /// The effective target type.
    #[must_use]
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    /// Whether the target accepts null.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

impl Caster for CallbackCaster {
    fn to_variable(&self, raw: Option<&str>) -> Result<Value, CastError> {
        (self.callback)(raw, self.nullable, &self.options).map_err(|err| {
            let err = match err.downcast::<CastError>() {
                Ok(cast) => return *cast,
                Err(other) => other,
            };
            tracing::trace!(type_name = %self.type_name, error = %err, "casting callback failed");
            match raw {
                None => CastError::not_nullable(self.type_name.as_str(), Some(err)),
                Some(raw) => CastError::invalid_value(raw, self.type_name.as_str(), Some(err)),
            }
        })
    }
}
