//! Casting callback registry.
//!
//! Maps a [`TypeName`] (optionally qualified by an `@alias`) to a casting callback.
//! Callbacks are erased behind `Arc<dyn Fn>` at registration time; casters clone the
//! `Arc` when they are configured, so a caster keeps working even if the registry is
//! mutated afterwards.
//!
//! # Two maps
//!
//! | Map | Key | Used when |
//! |-----|-----|-----------|
//! | unaliased | `type` | no alias is requested |
//! | aliased | `type` → `@alias` | an alias is requested |
//!
//! Alias names are unique across all types.
//!
//! # Example
//!
//! ```
//! use rowcast::{CasterRegistry, Value};
//!
//! let mut registry = CasterRegistry::new();
//! registry
//!     .register_alias("int", "@cents", |raw, _nullable, _options| {
//!         let raw = raw.unwrap_or_default();
//!         let amount: f64 = raw.trim().parse()?;
//!         Ok(Value::Int((amount * 100.0).round() as i64))
//!     })
//!     .unwrap();
//!
//! assert!(registry.supports_alias("@cents"));
//! assert_eq!(registry.aliases()["@cents"].as_str(), "int");
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::error::{BoxError, CastError, MappingError};
use crate::types::{CastTarget, Type, TypeDeclaration, TypeName};
use crate::Value;

/// Erased casting callback: `(raw, target_is_nullable, options) -> value`.
pub type CastCallback =
    Arc<dyn Fn(Option<&str>, bool, &[Value]) -> Result<Value, BoxError> + Send + Sync>;

/// Returns `true` if `alias` matches `^@[A-Za-z0-9_]+$`.
#[must_use]
pub fn is_valid_alias(alias: &str) -> bool {
    alias.strip_prefix('@').is_some_and(|name| {
        !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
    })
}

/// Registry of casting callbacks keyed by type and alias.
///
/// The registry is an ordinary value: mutation takes `&mut self`. Hosts that share one
/// across threads wrap it in a lock.
#[derive(Default)]
pub struct CasterRegistry {
    types: HashMap<TypeName, CastCallback>,
    aliases: HashMap<TypeName, BTreeMap<String, CastCallback>>,
    declared: HashSet<String>,
}

impl std::fmt::Debug for CasterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<&str> = self.types.keys().map(TypeName::as_str).collect();
        types.sort_unstable();
        f.debug_struct("CasterRegistry")
            .field("types", &types)
            .field("aliases", &self.aliases())
            .field("declared", &self.declared.len())
            .finish()
    }
}

impl CasterRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the scalar callbacks already registered.
    ///
    /// See [`register_builtin_casters`].
    #[must_use]
    pub fn with_builtin_casters() -> Self {
        let mut registry = Self::new();
        register_builtin_casters(&mut registry);
        registry
    }

    /// Make an external type name registrable.
    ///
    /// Built-in type names never need declaring.
    pub fn declare_type(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into().trim().to_owned();
        tracing::debug!(type_name = %name, "declared external type");
        self.declared.insert(name);
        self
    }

    fn registrable(&self, type_name: &str) -> Result<TypeName, MappingError> {
        match TypeName::parse(type_name) {
            TypeName::External(name) if !self.declared.contains(&name) => {
                Err(MappingError::UnregistrableType { type_name: name })
            }
            name => Ok(name),
        }
    }

    /// Register (or replace) the unaliased callback for `type_name`.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::UnregistrableType`] if `type_name` is neither built-in
    /// nor declared via [`declare_type`](Self::declare_type).
    pub fn register<F>(&mut self, type_name: &str, callback: F) -> Result<(), MappingError>
    where
        F: Fn(Option<&str>, bool, &[Value]) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        let key = self.registrable(type_name)?;
        tracing::debug!(type_name = %key, "registered casting callback");
        self.types.insert(key, erase(callback));
        Ok(())
    }

    /// Register the callback for `type_name` under `alias`.
    ///
    /// Validation order: alias syntax, alias uniqueness, then the type.
    ///
    /// # Errors
    ///
    /// - [`MappingError::InvalidAlias`] if `alias` does not match `^@[A-Za-z0-9_]+$`
    /// - [`MappingError::DuplicateAlias`] if `alias` is registered for any type
    /// - [`MappingError::UnregistrableType`] as for [`register`](Self::register)
    pub fn register_alias<F>(
        &mut self,
        type_name: &str,
        alias: &str,
        callback: F,
    ) -> Result<(), MappingError>
    where
        F: Fn(Option<&str>, bool, &[Value]) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        if !is_valid_alias(alias) {
            return Err(MappingError::InvalidAlias {
                alias: alias.to_owned(),
            });
        }

        if let Some(owner) = self.alias_owner(alias) {
            return Err(MappingError::DuplicateAlias {
                alias: alias.to_owned(),
                type_name: owner.to_string(),
            });
        }

        let key = self.registrable(type_name)?;
        tracing::debug!(type_name = %key, alias, "registered aliased casting callback");
        self.aliases
            .entry(key)
            .or_default()
            .insert(alias.to_owned(), erase(callback));
        Ok(())
    }

    fn alias_owner(&self, alias: &str) -> Option<&TypeName> {
        self.aliases
            .iter()
            .find(|(_, by_alias)| by_alias.contains_key(alias))
            .map(|(type_name, _)| type_name)
    }

    /// Remove the unaliased callback for `type_name`.
    ///
    /// Returns `true` if something was removed.
    pub fn unregister_type(&mut self, type_name: &str) -> bool {
        let removed = self.types.remove(&TypeName::parse(type_name)).is_some();
        if removed {
            tracing::debug!(type_name, "unregistered casting callback");
        }
        removed
    }

    /// Remove every unaliased callback.
    pub fn unregister_types(&mut self) {
        self.types.clear();
    }

    /// Remove an aliased callback.
    ///
    /// Returns `false` for syntactically invalid aliases and unknown aliases.
    pub fn unregister_alias(&mut self, alias: &str) -> bool {
        if !is_valid_alias(alias) {
            return false;
        }

        let Some(owner) = self.alias_owner(alias).cloned() else {
            return false;
        };

        if let Some(by_alias) = self.aliases.get_mut(&owner) {
            by_alias.remove(alias);
            if by_alias.is_empty() {
                self.aliases.remove(&owner);
            }
        }
        tracing::debug!(type_name = %owner, alias, "unregistered aliased casting callback");
        true
    }

    /// Remove every aliased callback.
    pub fn unregister_aliases(&mut self) {
        self.aliases.clear();
    }

    /// Remove every callback, aliased or not. Declared type names are kept.
    pub fn unregister_all(&mut self) {
        self.unregister_types();
        self.unregister_aliases();
    }

    /// Returns `true` if an unaliased callback exists for `type_name`.
    #[must_use]
    pub fn supports_type(&self, type_name: &str) -> bool {
        self.types.contains_key(&TypeName::parse(type_name))
    }

    /// Returns `true` if `alias` is registered for some type.
    #[must_use]
    pub fn supports_alias(&self, alias: &str) -> bool {
        self.alias_owner(alias).is_some()
    }

    /// Snapshot of every alias and the type it belongs to.
    #[must_use]
    pub fn aliases(&self) -> BTreeMap<String, TypeName> {
        self.aliases
            .iter()
            .flat_map(|(type_name, by_alias)| {
                by_alias
                    .keys()
                    .map(move |alias| (alias.clone(), type_name.clone()))
            })
            .collect()
    }

    /// Returns `true` if some candidate of `declaration` can be cast.
    ///
    /// Without an alias a candidate qualifies when its type has an unaliased callback.
    /// With an alias it qualifies when the alias belongs to its type, or when the
    /// candidate is `mixed` and the alias exists.
    #[must_use]
    pub fn supports(&self, declaration: &TypeDeclaration, alias: Option<&str>) -> bool {
        let owner = alias.and_then(|a| self.alias_owner(a));
        declaration.candidates().iter().any(|candidate| match alias {
            None => self.types.contains_key(&candidate.name),
            Some(_) => owner.is_some_and(|o| *o == candidate.name || candidate.name.is_mixed()),
        })
    }

    /// Resolve a declaration into a cast target.
    ///
    /// The first candidate with a registered callback (aliased or not) is selected.
    /// The target is nullable if any candidate is. With no known candidate, a `mixed`
    /// candidate yields a nullable `mixed` target.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::UnsupportedDeclaration`] otherwise.
    pub fn resolve(&self, declaration: &TypeDeclaration) -> Result<CastTarget, MappingError> {
        let nullable = declaration.is_nullable();
        let known = declaration.candidates().iter().find(|candidate| {
            self.types.contains_key(&candidate.name) || self.aliases.contains_key(&candidate.name)
        });

        if let Some(candidate) = known {
            return Ok(CastTarget {
                type_name: candidate.name.clone(),
                nullable,
            });
        }

        if declaration.candidates().iter().any(|c| c.name.is_mixed()) {
            return Ok(CastTarget {
                type_name: TypeName::Builtin(Type::Mixed),
                nullable: true,
            });
        }

        Err(MappingError::UnsupportedDeclaration {
            site: declaration.site().to_string(),
        })
    }

    /// Fetch the callback for a resolved target.
    ///
    /// Returns the callback together with the effective type name, which differs from
    /// the target's when the target is `mixed`:
    ///
    /// - without alias, a supplied `type_override` replaces `mixed`
    /// - with alias, `mixed` is replaced by the alias' own type
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::MissingCallback`] if nothing is registered for the pair.
    pub fn resolve_callback(
        &self,
        target: &CastTarget,
        alias: Option<&str>,
        type_override: Option<&str>,
    ) -> Result<(TypeName, CastCallback), MappingError> {
        let missing = |type_name: &TypeName| MappingError::MissingCallback {
            type_name: type_name.to_string(),
            alias: alias.map(str::to_owned),
        };

        match alias {
            None => {
                let type_name = match type_override {
                    Some(t) if target.type_name.is_mixed() => TypeName::parse(t),
                    _ => target.type_name.clone(),
                };
                let callback = self.types.get(&type_name).ok_or_else(|| missing(&type_name))?;
                Ok((type_name.clone(), Arc::clone(callback)))
            }
            Some(alias) => {
                let type_name = if target.type_name.is_mixed() {
                    self.alias_owner(alias)
                        .cloned()
                        .ok_or_else(|| missing(&target.type_name))?
                } else {
                    target.type_name.clone()
                };
                let callback = self
                    .aliases
                    .get(&type_name)
                    .and_then(|by_alias| by_alias.get(alias))
                    .ok_or_else(|| missing(&type_name))?;
                Ok((type_name, Arc::clone(callback)))
            }
        }
    }
}

/// Register callbacks for the `string`, `int`, `float` and `bool` types.
///
/// The callbacks convert with [`Type::cast_scalar`]. A null cell becomes the first
/// option (or `Value::Null`) when the target is nullable, and is rejected otherwise.
pub fn register_builtin_casters(registry: &mut CasterRegistry) {
    for scalar in [Type::String, Type::Int, Type::Float, Type::Bool] {
        registry
            .types
            .insert(TypeName::Builtin(scalar), scalar_callback(scalar));
    }
    tracing::debug!("registered builtin scalar casting callbacks");
}

fn scalar_callback(scalar: Type) -> CastCallback {
    erase(move |raw, nullable, options| match raw {
        Some(raw) => Ok(scalar.cast_scalar(raw)?),
        None if nullable => Ok(options.first().cloned().unwrap_or_default()),
        None => Err(CastError::not_nullable(scalar.as_str(), None).into()),
    })
}

fn erase<F>(callback: F) -> CastCallback
where
    F: Fn(Option<&str>, bool, &[Value]) -> Result<Value, BoxError> + Send + Sync + 'static,
{
    Arc::new(callback)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo(raw: Option<&str>, _: bool, _: &[Value]) -> Result<Value, BoxError> {
        Ok(raw.map_or(Value::Null, Value::from))
    }

    #[test]
    fn test_alias_syntax() {
        assert!(is_valid_alias("@money_2"));
        assert!(!is_valid_alias("@"));
        assert!(!is_valid_alias("money"));
        assert!(!is_valid_alias("@mo-ney"));
        assert!(!is_valid_alias("@é"));
    }

    #[test]
    fn test_register_then_supports_type() {
        let mut registry = CasterRegistry::new();
        assert!(!registry.supports_type("int"));
        registry.register("int", echo).unwrap();
        assert!(registry.supports_type("int"));
        assert!(registry.unregister_type("int"));
        assert!(!registry.unregister_type("int"));
        assert!(!registry.supports_type("int"));
    }

    #[test]
    fn test_external_type_requires_declaration() {
        let mut registry = CasterRegistry::new();
        let err = registry.register("App\\Money", echo).unwrap_err();
        assert!(matches!(err, MappingError::UnregistrableType { .. }));

        registry.declare_type("App\\Money");
        registry.register("App\\Money", echo).unwrap();
        assert!(registry.supports_type("App\\Money"));
    }

    #[test]
    fn test_alias_validation_order() {
        let mut registry = CasterRegistry::new();

        let err = registry.register_alias("nope", "money", echo).unwrap_err();
        assert!(matches!(err, MappingError::InvalidAlias { .. }));

        registry.register_alias("int", "@money", echo).unwrap();
        let err = registry.register_alias("nope", "@money", echo).unwrap_err();
        assert!(matches!(err, MappingError::DuplicateAlias { .. }));

        let err = registry.register_alias("nope", "@other", echo).unwrap_err();
        assert!(matches!(err, MappingError::UnregistrableType { .. }));
    }

    #[test]
    fn test_alias_is_unique_across_types() {
        let mut registry = CasterRegistry::new();
        registry.register_alias("int", "@money", echo).unwrap();
        let err = registry.register_alias("float", "@money", echo).unwrap_err();
        assert_eq!(
            err.to_string(),
            "the alias `@money` is already registered for `int`; choose another name"
        );
    }

    #[test]
    fn test_unregister_alias() {
        let mut registry = CasterRegistry::new();
        registry.register_alias("int", "@money", echo).unwrap();
        assert!(!registry.unregister_alias("money"));
        assert!(!registry.unregister_alias("@unknown"));
        assert!(registry.unregister_alias("@money"));
        assert!(!registry.supports_alias("@money"));
        assert!(registry.aliases().is_empty());
        assert!(registry.aliases.is_empty());
    }

    #[test]
    fn test_unregister_all_is_idempotent() {
        let mut registry = CasterRegistry::with_builtin_casters();
        registry.register_alias("int", "@money", echo).unwrap();
        registry.unregister_all();
        registry.unregister_all();
        assert!(!registry.supports_type("int"));
        assert!(!registry.supports_alias("@money"));
    }

    #[test]
    fn test_resolve_priority() {
        let mut registry = CasterRegistry::new();
        registry.register("float", echo).unwrap();

        let decl = TypeDeclaration::property("C", "p").with_types("App\\A|mixed|float");
        let target = registry.resolve(&decl).unwrap();
        assert_eq!(target.type_name, TypeName::Builtin(Type::Float));

        registry.unregister_type("float");
        let target = registry.resolve(&decl).unwrap();
        assert_eq!(target.type_name, TypeName::Builtin(Type::Mixed));
        assert!(target.nullable);
    }

    #[test]
    fn test_resolve_nullability_scans_all_candidates() {
        let mut registry = CasterRegistry::new();
        registry.register("int", echo).unwrap();
        let decl = TypeDeclaration::property("C", "p")
            .with("int", false)
            .with("int", true);
        let target = registry.resolve(&decl).unwrap();
        assert!(target.nullable);
    }

    #[test]
    fn test_resolve_aliased_type_counts_as_known() {
        let mut registry = CasterRegistry::new();
        registry.register_alias("int", "@money", echo).unwrap();
        let decl = TypeDeclaration::property("C", "p").with_types("string|int");
        assert_eq!(
            registry.resolve(&decl).unwrap().type_name,
            TypeName::Builtin(Type::Int)
        );
    }

    #[test]
    fn test_resolve_unsupported_names_site() {
        let registry = CasterRegistry::new();
        let decl = TypeDeclaration::parameter(Some("User"), "setAge", "age").with_types("int");
        let err = registry.resolve(&decl).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The method `User::setAge` argument `age` must be typed with a supported type"
        );
    }

    #[test]
    fn test_resolve_callback_mixed_with_override_and_alias() {
        let mut registry = CasterRegistry::new();
        registry.register("int", echo).unwrap();
        registry.register_alias("float", "@ratio", echo).unwrap();

        let mixed = CastTarget {
            type_name: TypeName::Builtin(Type::Mixed),
            nullable: true,
        };

        let (name, _) = registry.resolve_callback(&mixed, None, Some("int")).unwrap();
        assert_eq!(name, TypeName::Builtin(Type::Int));

        let (name, _) = registry.resolve_callback(&mixed, Some("@ratio"), None).unwrap();
        assert_eq!(name, TypeName::Builtin(Type::Float));

        let Err(err) = registry.resolve_callback(&mixed, None, None) else {
            panic!("mixed without an alias has no callback");
        };
        assert!(matches!(err, MappingError::MissingCallback { .. }));
    }

    #[test]
    fn test_supports() {
        let mut registry = CasterRegistry::new();
        registry.register("int", echo).unwrap();
        registry.register_alias("float", "@ratio", echo).unwrap();

        let int_decl = TypeDeclaration::property("C", "p").with_types("?int");
        let mixed_decl = TypeDeclaration::property("C", "p").with_types("mixed");
        let float_decl = TypeDeclaration::property("C", "p").with_types("float");

        assert!(registry.supports(&int_decl, None));
        assert!(!registry.supports(&float_decl, None));
        assert!(registry.supports(&float_decl, Some("@ratio")));
        assert!(registry.supports(&mixed_decl, Some("@ratio")));
        assert!(!registry.supports(&int_decl, Some("@ratio")));
        assert!(!registry.supports(&mixed_decl, Some("@unknown")));
    }

    #[test]
    fn test_builtin_callbacks() {
        let registry = CasterRegistry::with_builtin_casters();
        let int = &registry.types[&TypeName::Builtin(Type::Int)];

        assert_eq!(int(Some("12"), false, &[]).unwrap(), Value::Int(12));
        assert_eq!(int(None, true, &[Value::Int(5)]).unwrap(), Value::Int(5));
        assert_eq!(int(None, true, &[]).unwrap(), Value::Null);

        let err = int(None, false, &[]).unwrap_err();
        assert!(err.downcast_ref::<CastError>().is_some());
        let err = int(Some("x"), false, &[]).unwrap_err();
        assert!(err.downcast_ref::<crate::ConversionError>().is_some());
    }
}
