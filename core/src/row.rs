//! `Row`: What a predicate can read from.
//!
//! Rows come in two flavours:
//!
//! - **array-like**: a `Vec<Value>`/slice (positional) or a [`Map`] (named, ordered)
//! - **object**: any type implementing [`Record`], exposing members by name
//!
//! [`Row::view`] classifies a value once so column resolution can branch on the shape.

use std::fmt::Debug;

use crate::{Map, Value};

/// Named member access for object rows.
///
/// Every method has a "not present" default; implement the ones your type supports,
/// then expose the type as a row with a one-line [`Row`] impl returning
/// [`RowView::Object`].
///
/// Column resolution tries the members in this order: [`field`](Self::field),
/// [`method`](Self::method) (for the name, its camel-cased form, then `get` + camel
/// case), [`dynamic_call`](Self::dynamic_call), and finally
/// [`offset_get`](Self::offset_get).
///
/// # Example
///
/// ```
/// use rowcast::{select_one, Record, Row, RowView, Value};
///
/// #[derive(Debug)]
/// struct User { name: String, born: i64 }
///
/// impl Record for User {
///     fn field(&self, name: &str) -> Option<Value> {
///         (name == "name").then(|| Value::from(self.name.clone()))
///     }
///
///     fn method(&self, name: &str) -> Option<Value> {
///         (name == "getBirthYear").then_some(Value::Int(self.born))
///     }
/// }
///
/// impl Row for User {
///     fn view(&self) -> RowView<'_> {
///         RowView::Object(self)
///     }
/// }
///
/// let user = User { name: "ada".into(), born: 1815 };
/// assert_eq!(select_one(&user, &"name".into()).unwrap(), Value::from("ada"));
/// assert_eq!(select_one(&user, &"birth_year".into()).unwrap(), Value::Int(1815));
/// ```
pub trait Record: Debug {
    /// A public field named `name`.
    fn field(&self, _name: &str) -> Option<Value> {
        None
    }

    /// The result of a public zero-argument method named `name`.
    fn method(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Returns `true` if the type answers arbitrary method names.
    fn has_dynamic_call(&self) -> bool {
        false
    }

    /// Invoke the catch-all method handler. Only called when
    /// [`has_dynamic_call`](Self::has_dynamic_call) is `true`.
    fn dynamic_call(&self, _name: &str) -> Value {
        Value::Null
    }

    /// Returns `true` if indexed access knows `key`.
    fn offset_exists(&self, _key: &str) -> bool {
        false
    }

    /// Indexed access. Only called when [`offset_exists`](Self::offset_exists) is `true`.
    fn offset_get(&self, _key: &str) -> Value {
        Value::Null
    }
}

/// The shape of a row.
#[derive(Debug, Clone, Copy)]
pub enum RowView<'a> {
    /// Positional cells.
    List(&'a [Value]),
    /// Keyed cells.
    Map(&'a Map),
    /// Object members.
    Object(&'a dyn Record),
    /// Not a row; carries the type name for error reporting.
    Scalar(&'static str),
}

impl RowView<'_> {
    /// Debug rendering used in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::List(cells) => format!("{cells:?}"),
            Self::Map(map) => format!("{map:?}"),
            Self::Object(record) => format!("{record:?}"),
            Self::Scalar(type_name) => (*type_name).to_owned(),
        }
    }
}

/// Anything that can be filtered or selected from.
///
/// Implemented for `Vec<Value>`, `[Value]`, [`Map`], [`Value`], `dyn Record`, and
/// references or boxes of those.
pub trait Row {
    /// Classify `self`.
    fn view(&self) -> RowView<'_>;
}

impl Row for [Value] {
    fn view(&self) -> RowView<'_> {
        RowView::List(self)
    }
}

impl Row for Vec<Value> {
    fn view(&self) -> RowView<'_> {
        RowView::List(self)
    }
}

impl Row for Map {
    fn view(&self) -> RowView<'_> {
        RowView::Map(self)
    }
}

impl Row for Value {
    fn view(&self) -> RowView<'_> {
        match self {
            Self::List(cells) => RowView::List(cells),
            Self::Map(map) => RowView::Map(map),
            Self::Custom(custom) => custom
                .as_record()
                .map_or(RowView::Scalar(custom.custom_type_name()), RowView::Object),
            other => RowView::Scalar(other.type_name()),
        }
    }
}

impl Row for dyn Record + '_ {
    fn view(&self) -> RowView<'_> {
        RowView::Object(self)
    }
}

impl<R: Row + ?Sized> Row for &R {
    fn view(&self) -> RowView<'_> {
        (**self).view()
    }
}

impl<R: Row + ?Sized> Row for Box<R> {
    fn view(&self) -> RowView<'_> {
        (**self).view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;
    use std::sync::Arc;

    use crate::CustomValue;

    #[derive(Debug)]
    struct Point {
        x: i64,
    }

    impl Record for Point {
        fn field(&self, name: &str) -> Option<Value> {
            (name == "x").then_some(Value::Int(self.x))
        }
    }

    impl CustomValue for Point {
        fn custom_type_name(&self) -> &'static str {
            "point"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_record(&self) -> Option<&dyn Record> {
            Some(self)
        }
    }

    #[derive(Debug)]
    struct Opaque;

    impl CustomValue for Opaque {
        fn custom_type_name(&self) -> &'static str {
            "opaque"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_value_views() {
        assert!(matches!(Value::from(vec![1]).view(), RowView::List(_)));
        assert!(matches!(Value::Map(Map::new()).view(), RowView::Map(_)));
        assert!(matches!(Value::Int(1).view(), RowView::Scalar("int")));
        assert!(matches!(Value::Null.view(), RowView::Scalar("null")));
    }

    #[test]
    fn test_custom_value_with_record_is_an_object() {
        let value = Value::Custom(Arc::new(Point { x: 3 }));
        let RowView::Object(record) = value.view() else {
            panic!("expected an object view");
        };
        assert_eq!(record.field("x"), Some(Value::Int(3)));

        let opaque = Value::Custom(Arc::new(Opaque));
        assert!(matches!(opaque.view(), RowView::Scalar("opaque")));
    }

    #[test]
    fn test_record_defaults() {
        let point = Point { x: 1 };
        assert!(point.method("x").is_none());
        assert!(!point.has_dynamic_call());
        assert!(!point.offset_exists("x"));
        assert!(matches!((&point as &dyn Record).view(), RowView::Object(_)));
    }

    #[test]
    fn test_references_and_boxes_delegate() {
        let row = vec![Value::Int(1)];
        assert!(matches!((&row).view(), RowView::List(_)));
        let boxed: Box<dyn Row> = Box::new(Map::new());
        assert!(matches!(boxed.view(), RowView::Map(_)));
    }
}
