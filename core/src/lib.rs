//! rowcast - Typed casting and predicate filtering for untyped tabular rows
//!
//! Tabular sources (CSV files, spreadsheets, query results) hand out cells as optional
//! strings. `rowcast` turns those cells into typed [`Value`]s and filters rows with
//! composable predicates.
//!
//! # Architecture
//!
//! Casting:
//!
//! - [`TypeDeclaration`]: the declared type of a destination field or parameter
//! - [`CasterRegistry`]: built-in and user casters, keyed by type and alias
//! - [`Caster`]: converts one raw cell. [`ScalarCaster`], [`ArrayCaster`] and
//!   [`CallbackCaster`] are the provided implementations
//!
//! Filtering:
//!
//! - [`Row`]: what a predicate reads from (lists, [`Map`]s, or [`Record`] objects)
//! - [`select_many`] / [`select_one`]: column resolution on any row shape
//! - [`Comparison`]: the operator set, compiled into a [`Condition`]
//! - [`Predicate`]: [`Column`] and [`TwoColumns`] leaves, composed with [`Criteria`]
//! - [`CriteriaConfig`]: serde form of a criteria tree
//!
//! # Example
//!
//! ```
//! use rowcast::prelude::*;
//!
//! let registry = CasterRegistry::with_builtin_casters();
//! let declaration = TypeDeclaration::property("User", "age").with("int", false);
//! let age = CallbackCaster::new(&registry, &declaration, None).unwrap();
//!
//! let mut rows = Vec::new();
//! for (name, raw) in [("ann", "34"), ("bob", "12")] {
//!     let cell = age.to_variable(Some(raw)).unwrap();
//!     rows.push(Map::new().with("name", name).with("age", cell));
//! }
//!
//! let adults = Column::filter_on("age", ">=", 18).unwrap();
//! let kept = adults.filter_array(rows).unwrap();
//! assert_eq!(kept.len(), 1);
//! assert_eq!(kept[0].1.get(&"age".into()), Some(&Value::Int(34)));
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod array;
mod caster;
mod column;
mod comparison;
mod config;
mod error;
mod predicate;
mod registry;
mod row;
mod scalar;
mod select;
mod types;
mod value;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Values
pub use value::{CustomValue, Key, Map, Number, Value};

// Type declarations
pub use types::{CastTarget, DeclarationSite, DeclaredType, Type, TypeDeclaration, TypeName};

// Casting
pub use array::{ArrayCaster, ArrayOptions, ArrayShape, DEFAULT_JSON_DEPTH, MAX_JSON_DEPTH};
pub use caster::{CallbackCaster, Caster};
pub use registry::{is_valid_alias, register_builtin_casters, CastCallback, CasterRegistry};
pub use scalar::ScalarCaster;

// Rows and selection
pub use row::{Record, Row, RowView};
pub use select::{camel_case, select_many, select_one};

// Predicates
pub use column::{Column, SecondColumn, TwoColumns};
pub use comparison::{Comparison, Condition, IntoComparison};
pub use config::CriteriaConfig;
pub use predicate::{Criteria, Filter, Indexed, Predicate};

// Errors
pub use error::{
    BoxError, CastError, ConversionError, MappingError, QueryError, StatementError,
};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use rowcast::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Casting
        ArrayCaster,
        ArrayOptions,
        ArrayShape,
        CallbackCaster,
        // Errors
        CastError,
        Caster,
        CasterRegistry,
        // Predicates
        Column,
        Comparison,
        Criteria,
        CriteriaConfig,
        // Values
        Key,
        Map,
        MappingError,
        Predicate,
        QueryError,
        // Rows
        Record,
        Row,
        RowView,
        ScalarCaster,
        StatementError,
        TwoColumns,
        Type,
        TypeDeclaration,
        Value,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum allowed nesting depth for a [`CriteriaConfig`].
///
/// Checked by [`CriteriaConfig::load`] before any predicate is built.
pub const MAX_CRITERIA_DEPTH: usize = 32;
