//! Type declarations: what a cell should become.
//!
//! A [`TypeDeclaration`] is the ordered list of candidate types attached to a property
//! or a method argument, together with the site it was declared at. The registry
//! resolves it into a [`CastTarget`] by picking the first candidate it knows.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConversionError, MappingError};
use crate::Value;

// ═══════════════════════════════════════════════════════════════════════════════
// Type
// ═══════════════════════════════════════════════════════════════════════════════

/// The closed set of built-in type identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    /// `string`
    String,
    /// `int`
    Int,
    /// `float`
    Float,
    /// `bool`
    Bool,
    /// `array`
    Array,
    /// `iterable`
    Iterable,
    /// `enum`
    Enum,
    /// `date`
    Date,
    /// `mixed`: accepts anything, always nullable.
    Mixed,
    /// `null`
    Null,
}

impl Type {
    /// Every built-in type, in declaration order.
    pub const ALL: [Type; 10] = [
        Self::String,
        Self::Int,
        Self::Float,
        Self::Bool,
        Self::Array,
        Self::Iterable,
        Self::Enum,
        Self::Date,
        Self::Mixed,
        Self::Null,
    ];

    /// Canonical lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Array => "array",
            Self::Iterable => "iterable",
            Self::Enum => "enum",
            Self::Date => "date",
            Self::Mixed => "mixed",
            Self::Null => "null",
        }
    }

    /// Look a built-in type up by its exact lowercase identifier.
    #[must_use]
    pub fn try_from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// Returns `true` if `self` is one of `types`.
    #[must_use]
    pub fn is_one_of(self, types: &[Type]) -> bool {
        types.contains(&self)
    }

    /// Returns `true` for the flat types a raw string converts to directly.
    #[must_use]
    pub fn is_scalar(self) -> bool {
        self.is_one_of(&[Self::String, Self::Int, Self::Float, Self::Bool])
    }

    /// Convert a raw string with the scalar rules of this type.
    ///
    /// - `string`: unchanged
    /// - `int`: trimmed, base-10 `i64`
    /// - `float`: trimmed, finite `f64`
    /// - `bool`: trimmed, case-insensitive `1 true on yes` / `0 false off no` / empty
    ///
    /// Non-scalar types keep the raw string.
    ///
    /// ```
    /// use rowcast::{Type, Value};
    ///
    /// assert_eq!(Type::Int.cast_scalar(" 42 ").unwrap(), Value::Int(42));
    /// assert_eq!(Type::Bool.cast_scalar("Yes").unwrap(), Value::Bool(true));
    /// assert!(Type::Float.cast_scalar("NaN").is_err());
    /// ```
    pub fn cast_scalar(self, raw: &str) -> Result<Value, ConversionError> {
        let invalid = || ConversionError {
            value: raw.to_owned(),
            type_name: self.as_str(),
        };

        match self {
            Self::Int => raw.trim().parse::<i64>().map(Value::Int).map_err(|_| invalid()),
            Self::Float => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Value::Float)
                .ok_or_else(invalid),
            Self::Bool => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => Ok(Value::Bool(true)),
                "0" | "false" | "off" | "no" | "" => Ok(Value::Bool(false)),
                _ => Err(invalid()),
            },
            _ => Ok(Value::String(raw.to_owned())),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Type {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from_name(s).ok_or_else(|| MappingError::UnknownType { name: s.to_owned() })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TypeName
// ═══════════════════════════════════════════════════════════════════════════════

/// A built-in type or an external (user declared) type name.
///
/// Registry keys are `TypeName`s. External names are case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeName {
    /// One of the built-in identifiers.
    Builtin(Type),
    /// A user type such as `App\Money` or `chrono::NaiveDate`.
    External(String),
}

impl TypeName {
    /// Parse a name: built-in identifiers win, anything else is external.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        Type::try_from_name(name).map_or_else(
            || Self::External(name.trim().to_owned()),
            Self::Builtin,
        )
    }

    /// The identifier as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Builtin(t) => t.as_str(),
            Self::External(n) => n,
        }
    }

    /// Returns the built-in type, if any.
    #[must_use]
    pub fn builtin(&self) -> Option<Type> {
        match self {
            Self::Builtin(t) => Some(*t),
            Self::External(_) => None,
        }
    }

    /// Returns `true` for `mixed`.
    #[must_use]
    pub fn is_mixed(&self) -> bool {
        matches!(self, Self::Builtin(Type::Mixed))
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<Type> for TypeName {
    fn from(t: Type) -> Self {
        Self::Builtin(t)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Declarations
// ═══════════════════════════════════════════════════════════════════════════════

/// One candidate of a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredType {
    /// The candidate type.
    pub name: TypeName,
    /// Whether the candidate admits null.
    pub nullable: bool,
}

impl DeclaredType {
    /// Create a candidate; `null` and `mixed` are always nullable.
    #[must_use]
    pub fn new(name: impl Into<TypeName>, nullable: bool) -> Self {
        let name = name.into();
        let nullable = nullable
            || matches!(name, TypeName::Builtin(Type::Null | Type::Mixed));
        Self { name, nullable }
    }
}

/// Where a declaration lives; used in error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationSite {
    /// A property on a class or struct.
    Property {
        /// Owning type.
        class: String,
        /// Property name.
        property: String,
    },
    /// An argument of a method or free function.
    Parameter {
        /// Owning type, absent for free functions.
        class: Option<String>,
        /// Method or function name.
        function: String,
        /// Argument name.
        parameter: String,
    },
}

impl fmt::Display for DeclarationSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property { class, property } => {
                write!(f, "The property `{class}::{property}`")
            }
            Self::Parameter {
                class: Some(class),
                function,
                parameter,
            } => write!(f, "The method `{class}::{function}` argument `{parameter}`"),
            Self::Parameter {
                class: None,
                function,
                parameter,
            } => write!(f, "The function `{function}` argument `{parameter}`"),
        }
    }
}

/// An ordered union of candidate types declared at one site.
///
/// ```
/// use rowcast::{Type, TypeDeclaration, TypeName};
///
/// let decl = TypeDeclaration::property("User", "age").with_types("?int|string");
/// assert_eq!(decl.candidates().len(), 2);
/// assert_eq!(decl.candidates()[0].name, TypeName::Builtin(Type::Int));
/// assert!(decl.candidates()[0].nullable);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclaration {
    site: DeclarationSite,
    candidates: Vec<DeclaredType>,
}

impl TypeDeclaration {
    /// Start an (untyped) property declaration.
    #[must_use]
    pub fn property(class: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            site: DeclarationSite::Property {
                class: class.into(),
                property: property.into(),
            },
            candidates: Vec::new(),
        }
    }

    /// Start an (untyped) argument declaration.
    #[must_use]
    pub fn parameter(
        class: Option<&str>,
        function: impl Into<String>,
        parameter: impl Into<String>,
    ) -> Self {
        Self {
            site: DeclarationSite::Parameter {
                class: class.map(str::to_owned),
                function: function.into(),
                parameter: parameter.into(),
            },
            candidates: Vec::new(),
        }
    }

    /// Append a candidate.
    #[must_use]
    pub fn with(mut self, name: impl Into<TypeName>, nullable: bool) -> Self {
        self.candidates.push(DeclaredType::new(name, nullable));
        self
    }

    /// Append candidates written as a union: `?int|string|null`.
    ///
    /// A leading `?` marks a candidate nullable. Empty segments are ignored.
    #[must_use]
    pub fn with_types(mut self, union: &str) -> Self {
        for part in union.split('|').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, nullable) = match part.strip_prefix('?') {
                Some(rest) => (rest.trim(), true),
                None => (part, false),
            };
            self.candidates.push(DeclaredType::new(name, nullable));
        }
        self
    }

    /// Declaration site.
    #[must_use]
    pub fn site(&self) -> &DeclarationSite {
        &self.site
    }

    /// Candidates in declaration order.
    #[must_use]
    pub fn candidates(&self) -> &[DeclaredType] {
        &self.candidates
    }

    /// Returns `true` if no type was declared.
    #[must_use]
    pub fn is_untyped(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Returns `true` if any candidate admits null.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.candidates.iter().any(|c| c.nullable)
    }
}

/// The resolved destination of a cast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastTarget {
    /// Selected type.
    pub type_name: TypeName,
    /// Whether null is accepted.
    pub nullable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_from_str() {
        assert_eq!("int".parse::<Type>().unwrap(), Type::Int);
        assert_eq!(" iterable ".parse::<Type>().unwrap(), Type::Iterable);
        for name in ["integer", "INT", "Bool"] {
            assert!(
                matches!(name.parse::<Type>(), Err(MappingError::UnknownType { .. })),
                "{name}"
            );
        }
    }

    #[test]
    fn test_cast_scalar_int() {
        assert_eq!(Type::Int.cast_scalar("-7").unwrap(), Value::Int(-7));
        assert!(Type::Int.cast_scalar("1.5").is_err());
        assert!(Type::Int.cast_scalar("").is_err());
    }

    #[test]
    fn test_cast_scalar_float() {
        assert_eq!(Type::Float.cast_scalar("1.5").unwrap(), Value::Float(1.5));
        assert_eq!(Type::Float.cast_scalar("3").unwrap(), Value::Float(3.0));
        assert!(Type::Float.cast_scalar("inf").is_err());
    }

    #[test]
    fn test_cast_scalar_bool() {
        for raw in ["1", "true", "ON", " yes "] {
            assert_eq!(Type::Bool.cast_scalar(raw).unwrap(), Value::Bool(true), "{raw}");
        }
        for raw in ["0", "False", "off", "no", ""] {
            assert_eq!(Type::Bool.cast_scalar(raw).unwrap(), Value::Bool(false), "{raw}");
        }
        let err = Type::Bool.cast_scalar("maybe").unwrap_err();
        assert_eq!(err.to_string(), "`maybe` is not a valid bool");
    }

    #[test]
    fn test_cast_scalar_string_is_untouched() {
        assert_eq!(Type::String.cast_scalar(" a ").unwrap(), Value::from(" a "));
    }

    #[test]
    fn test_type_name_parse() {
        assert_eq!(TypeName::parse("float"), TypeName::Builtin(Type::Float));
        assert_eq!(TypeName::parse("Date"), TypeName::External("Date".into()));
        assert_eq!(
            TypeName::parse("String"),
            TypeName::External("String".into())
        );
        assert_eq!(
            TypeName::parse("App\\Money"),
            TypeName::External("App\\Money".into())
        );
    }

    #[test]
    fn test_null_and_mixed_are_nullable() {
        assert!(DeclaredType::new(Type::Mixed, false).nullable);
        assert!(DeclaredType::new(Type::Null, false).nullable);
        assert!(!DeclaredType::new(Type::Int, false).nullable);
    }

    #[test]
    fn test_with_types_parses_union() {
        let decl = TypeDeclaration::property("User", "id").with_types("?int | string|null|");
        let names: Vec<&str> = decl.candidates().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["int", "string", "null"]);
        let nullable: Vec<bool> = decl.candidates().iter().map(|c| c.nullable).collect();
        assert_eq!(nullable, [true, false, true]);
    }

    #[test]
    fn test_site_display() {
        let decl = TypeDeclaration::property("User", "age");
        assert_eq!(decl.site().to_string(), "The property `User::age`");

        let decl = TypeDeclaration::parameter(Some("User"), "setAge", "age");
        assert_eq!(
            decl.site().to_string(),
            "The method `User::setAge` argument `age`"
        );
    }
}
