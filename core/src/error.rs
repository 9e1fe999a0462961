//! Error taxonomy.
//!
//! Four families, matching the four moments something can go wrong:
//!
//! | Error | Raised when | Example |
//! |-------|-------------|---------|
//! | [`MappingError`] | registration / caster construction | duplicate alias |
//! | [`CastError`] | converting one raw cell | `"abc"` for an `int` target |
//! | [`StatementError`] | resolving columns out of a row | unknown column `age` |
//! | [`QueryError`] | building or evaluating predicates | unknown operator `~=` |
//!
//! Configuration errors are never retried. Fix the setup and rebuild.

use crate::Key;
use thiserror::Error;

/// Boxed error returned by user supplied casting callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Setup-time failures: registry mutations, type resolution, caster options.
#[derive(Debug, Error)]
pub enum MappingError {
    /// The alias does not match `^@[A-Za-z0-9_]+$`.
    #[error(
        "the alias `{alias}` is invalid; it must start with an `@` character and contain \
         only letters, digits or underscores"
    )]
    InvalidAlias {
        /// The rejected alias.
        alias: String,
    },

    /// The alias is already registered (for any type).
    #[error("the alias `{alias}` is already registered for `{type_name}`; choose another name")]
    DuplicateAlias {
        /// The rejected alias.
        alias: String,
        /// The type that already owns the alias.
        type_name: String,
    },

    /// The type is neither built-in nor declared on the registry.
    #[error("the `{type_name}` type could not be registered; declare it first or use a built-in type")]
    UnregistrableType {
        /// The rejected type name.
        type_name: String,
    },

    /// No candidate of a declaration is castable.
    #[error("{site} must be typed with a supported type")]
    UnsupportedDeclaration {
        /// Human readable declaration site.
        site: String,
    },

    /// A caster variant does not support any candidate of the declaration.
    #[error("{site} must be typed with one of {expected} to use the {caster} caster")]
    UnsupportedType {
        /// Human readable declaration site.
        site: String,
        /// The caster that rejected the declaration.
        caster: &'static str,
        /// The accepted type names.
        expected: &'static str,
    },

    /// The registry holds no callback for the resolved type / alias pair.
    #[error("no casting callback is registered for `{type_name}`{}", alias_suffix(.alias))]
    MissingCallback {
        /// The resolved type name.
        type_name: String,
        /// The requested alias, if any.
        alias: Option<String>,
    },

    /// The array caster received inconsistent shape options.
    #[error("invalid array casting option: {reason}")]
    InvalidArrayOption {
        /// What is wrong with the options.
        reason: String,
    },

    /// Array elements can only be cast to flat scalar types.
    #[error("only scalar types are supported for array element casting; `{type_name}` given")]
    NonScalarElement {
        /// The rejected element type.
        type_name: &'static str,
    },

    /// The array shape name is unknown.
    #[error("unknown array shape `{shape}`; expected one of `list`, `csv`, `json`")]
    UnknownArrayShape {
        /// The rejected shape name.
        shape: String,
    },

    /// The built-in type name is unknown.
    #[error("unknown built-in type `{name}`")]
    UnknownType {
        /// The rejected type name.
        name: String,
    },
}

fn alias_suffix(alias: &Option<String>) -> String {
    alias
        .as_ref()
        .map(|a| format!(" with the alias `{a}`"))
        .unwrap_or_default()
}

/// Per-value failures raised by [`Caster::to_variable`](crate::Caster::to_variable).
#[derive(Debug, Error)]
pub enum CastError {
    /// A `null` cell reached a non-nullable target.
    #[error("the `null` value can not be cast to `{type_name}`; the target is not nullable")]
    NotNullable {
        /// The target type name.
        type_name: String,
        /// The underlying failure, if any.
        #[source]
        source: Option<BoxError>,
    },

    /// The raw cell could not be converted.
    #[error("unable to cast the given data `{value}` to a `{type_name}`")]
    InvalidValue {
        /// The offending raw value, or `empty string` for `""`.
        value: String,
        /// The target type name.
        type_name: String,
        /// The underlying failure, if any.
        #[source]
        source: Option<BoxError>,
    },
}

impl CastError {
    /// Marker reported instead of an invisible empty value.
    pub const EMPTY_STRING: &'static str = "empty string";

    /// Build an [`InvalidValue`](Self::InvalidValue) error for `raw`.
    pub fn invalid_value(
        raw: &str,
        type_name: impl Into<String>,
        source: Option<BoxError>,
    ) -> Self {
        let value = if raw.is_empty() {
            Self::EMPTY_STRING.to_owned()
        } else {
            raw.to_owned()
        };
        Self::InvalidValue {
            value,
            type_name: type_name.into(),
            source,
        }
    }

    /// Build a [`NotNullable`](Self::NotNullable) error.
    pub fn not_nullable(type_name: impl Into<String>, source: Option<BoxError>) -> Self {
        Self::NotNullable {
            type_name: type_name.into(),
            source,
        }
    }
}

/// A raw string that does not satisfy a scalar conversion rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{value}` is not a valid {type_name}")]
pub struct ConversionError {
    /// The rejected input.
    pub value: String,
    /// The scalar type it was checked against.
    pub type_name: &'static str,
}

/// Column lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatementError {
    /// The key is not resolvable on the row.
    #[error("the column `{key}` does not exist in `{row}`")]
    UnknownColumn {
        /// The requested key.
        key: Key,
        /// Debug rendering of the row.
        row: String,
    },

    /// Zero keys were requested.
    #[error("no column was selected; at least one column must be requested")]
    MissingColumn,

    /// The value is neither array-like nor an object.
    #[error("the value must be an array or an object; received `{type_name}`")]
    NotARow {
        /// Type name of the rejected value.
        type_name: &'static str,
    },
}

/// Predicate construction and evaluation failures.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The operator symbol is unknown.
    #[error("unknown or unsupported comparison operator `{operator}`")]
    UnknownOperator {
        /// The rejected symbol.
        operator: String,
    },

    /// The operand shape does not fit the operator.
    #[error("the value used for comparison with the `{operator}` operator {expected}")]
    InvalidOperand {
        /// Canonical operator name.
        operator: &'static str,
        /// What the operator expects.
        expected: &'static str,
    },

    /// A regular expression operand does not compile.
    #[error("invalid regular expression `{pattern}`")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
        /// The compiler error.
        #[source]
        source: regex::Error,
    },

    /// The second operand of a two-column predicate is malformed.
    #[error(
        "the second column must be a string, an integer or a list of strings \
         and/or integers"
    )]
    InvalidColumnList,

    /// Criteria nesting exceeds [`MAX_CRITERIA_DEPTH`](crate::MAX_CRITERIA_DEPTH).
    #[error("criteria nesting depth is {depth}, but maximum allowed is {max}")]
    DepthExceeded {
        /// Actual depth.
        depth: usize,
        /// Maximum allowed depth.
        max: usize,
    },

    /// Column resolution failed while evaluating a row.
    #[error(transparent)]
    Statement(#[from] StatementError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_reports_empty_string_marker() {
        let err = CastError::invalid_value("", "int", None);
        assert_eq!(
            err.to_string(),
            "unable to cast the given data `empty string` to a `int`"
        );

        let err = CastError::invalid_value("abc", "int", None);
        assert!(err.to_string().contains("`abc`"));
    }

    #[test]
    fn cast_error_keeps_source() {
        let cause = ConversionError {
            value: "x".into(),
            type_name: "int",
        };
        let err = CastError::invalid_value("x", "int", Some(Box::new(cause)));
        let source = std::error::Error::source(&err).expect("source is kept");
        assert_eq!(source.to_string(), "`x` is not a valid int");
    }

    #[test]
    fn missing_callback_mentions_alias() {
        let err = MappingError::MissingCallback {
            type_name: "int".into(),
            alias: Some("@money".into()),
        };
        assert_eq!(
            err.to_string(),
            "no casting callback is registered for `int` with the alias `@money`"
        );

        let err = MappingError::MissingCallback {
            type_name: "int".into(),
            alias: None,
        };
        assert_eq!(err.to_string(), "no casting callback is registered for `int`");
    }

    #[test]
    fn statement_error_converts_into_query_error() {
        let err: QueryError = StatementError::MissingColumn.into();
        assert!(matches!(
            err,
            QueryError::Statement(StatementError::MissingColumn)
        ));
    }
}
