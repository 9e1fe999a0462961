//! Config types for criteria construction.
//!
//! These types mirror the runtime predicate types but are serde-deserializable, so a
//! filter can be written in JSON or YAML and turned into a [`Criteria`] with
//! [`CriteriaConfig::load`].
//!
//! | Config variant | Runtime type |
//! |----------------|--------------|
//! | `column` | [`Column`] |
//! | `two_columns` | [`TwoColumns`] |
//! | `all` / `any` / `none` / `xor` / `not` | [`Criteria`] |

use serde::{Deserialize, Serialize};

use crate::{Column, Criteria, Key, QueryError, TwoColumns, Value, MAX_CRITERIA_DEPTH};

/// Configuration for a [`Criteria`].
///
/// Uses `#[serde(tag = "type")]` for discriminated union deserialization:
///
/// ```yaml
/// type: all
/// predicates:
///   - type: column
///     column: age
///     operator: ">="
///     value: 18
///   - type: two_columns
///     first: spent
///     operator: ">"
///     second: [budget, limit]
///   - type: not
///     predicate:
///       type: column
///       column: email
///       operator: ENDS_WITH
///       value: "@example.com"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CriteriaConfig {
    /// One column against a value.
    Column {
        /// Column name or position.
        column: Key,
        /// Operator symbol or alias.
        operator: String,
        /// Reference value.
        #[serde(default)]
        value: Value,
    },

    /// One column against one or several other columns.
    TwoColumns {
        /// Left-hand column.
        first: Key,
        /// Operator symbol or alias.
        operator: String,
        /// Column name, position, or a list of those.
        second: Value,
    },

    /// Every child must hold.
    All {
        /// Children.
        predicates: Vec<CriteriaConfig>,
    },

    /// Some child must hold.
    Any {
        /// Children.
        predicates: Vec<CriteriaConfig>,
    },

    /// No child may hold.
    #[serde(rename = "none")]
    NoneOf {
        /// Children.
        predicates: Vec<CriteriaConfig>,
    },

    /// An odd number of children must hold.
    Xor {
        /// Children.
        predicates: Vec<CriteriaConfig>,
    },

    /// Negates the child.
    Not {
        /// The negated child.
        predicate: Box<CriteriaConfig>,
    },
}

impl CriteriaConfig {
    /// Nesting depth; a leaf has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Column { .. } | Self::TwoColumns { .. } => 1,
            Self::All { predicates }
            | Self::Any { predicates }
            | Self::NoneOf { predicates }
            | Self::Xor { predicates } => {
                1 + predicates.iter().map(Self::depth).max().unwrap_or(0)
            }
            Self::Not { predicate } => 1 + predicate.depth(),
        }
    }

    /// Build the runtime [`Criteria`].
    ///
    /// # Errors
    ///
    /// - [`QueryError::DepthExceeded`] if nesting exceeds [`MAX_CRITERIA_DEPTH`]
    /// - any error raised by [`Column::filter_on`] or [`TwoColumns::filter_on`]
    pub fn load(&self) -> Result<Criteria, QueryError> {
        let depth = self.depth();
        if depth > MAX_CRITERIA_DEPTH {
            return Err(QueryError::DepthExceeded {
                depth,
                max: MAX_CRITERIA_DEPTH,
            });
        }

        let criteria = self.build()?;
        tracing::debug!(depth, "loaded criteria");
        Ok(criteria)
    }

    fn build(&self) -> Result<Criteria, QueryError> {
        let children = |predicates: &[CriteriaConfig]| -> Result<Vec<Criteria>, QueryError> {
            predicates.iter().map(Self::build).collect()
        };

        Ok(match self {
            Self::Column {
                column,
                operator,
                value,
            } => Column::filter_on(column.clone(), operator.as_str(), value.clone())?.into(),
            Self::TwoColumns {
                first,
                operator,
                second,
            } => TwoColumns::filter_on(first.clone(), operator.as_str(), second.clone())?.into(),
            Self::All { predicates } => Criteria::all(children(predicates)?),
            Self::Any { predicates } => Criteria::any(children(predicates)?),
            Self::NoneOf { predicates } => Criteria::none(children(predicates)?),
            Self::Xor { predicates } => Criteria::xor(children(predicates)?),
            Self::Not { predicate } => Criteria::not(predicate.build()?),
        })
    }
}
