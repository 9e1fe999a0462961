//! Column resolution: reading one or several cells out of a row.
//!
//! # Array-like rows
//!
//! - integer keys are positions; a keyed [`Map`] is re-indexed to `0..len` first, and
//!   negative keys count from the end
//! - string keys are looked up by name
//!
//! # Object rows
//!
//! Integer keys are rejected. A string key is tried, in order, as a field, as a method
//! (`key`, `camelKey`, `getCamelKey`), through the dynamic call handler, and through
//! indexed access.

use crate::error::StatementError;
use crate::row::{Record, Row, RowView};
use crate::{Key, Map, Value};

/// Resolve `keys` on `row`.
///
/// The result keeps the first-seen order of the keys; a repeated key is resolved once.
///
/// # Errors
///
/// - [`StatementError::MissingColumn`] if `keys` is empty
/// - [`StatementError::UnknownColumn`] if a key cannot be resolved
/// - [`StatementError::NotARow`] if `row` is neither array-like nor an object
///
/// ```
/// use rowcast::{select_many, Key, Value};
///
/// let row = vec![Value::from("a"), Value::from("b"), Value::from("c")];
/// let picked = select_many(&row, &[Key::from(-1), Key::from(0)]).unwrap();
/// assert_eq!(picked.into_values(), [Value::from("c"), Value::from("a")]);
/// ```
pub fn select_many<R: Row + ?Sized>(row: &R, keys: &[Key]) -> Result<Map, StatementError> {
    let view = row.view();
    let mut selected = Map::new();

    for key in keys {
        if selected.contains_key(key) {
            continue;
        }

        let value = match view {
            RowView::List(cells) => list_entry(cells, key),
            RowView::Map(map) => map_entry(map, key),
            RowView::Object(record) => object_member(record, key),
            RowView::Scalar(type_name) => return Err(StatementError::NotARow { type_name }),
        };

        let value = value.ok_or_else(|| StatementError::UnknownColumn {
            key: key.clone(),
            row: view.describe(),
        })?;
        selected.insert(key.clone(), value);
    }

    if selected.is_empty() {
        return match view {
            RowView::Scalar(type_name) => Err(StatementError::NotARow { type_name }),
            _ => Err(StatementError::MissingColumn),
        };
    }

    tracing::trace!(columns = selected.len(), "selected columns");
    Ok(selected)
}

/// Resolve a single `key` on `row`.
///
/// # Errors
///
/// See [`select_many`].
pub fn select_one<R: Row + ?Sized>(row: &R, key: &Key) -> Result<Value, StatementError> {
    let selected = select_many(row, std::slice::from_ref(key))?;
    Ok(selected.into_values().into_iter().next().unwrap_or_default())
}

fn position(len: usize, offset: i64) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let offset = if offset < 0 { offset + len } else { offset };
    usize::try_from(offset).ok()
}

fn list_entry(cells: &[Value], key: &Key) -> Option<Value> {
    match key {
        Key::Index(offset) => cells.get(position(cells.len(), *offset)?).cloned(),
        Key::Name(_) => None,
    }
}

fn map_entry(map: &Map, key: &Key) -> Option<Value> {
    match key {
        Key::Index(offset) => map.value_at(position(map.len(), *offset)?).cloned(),
        Key::Name(_) => map.get(key).cloned(),
    }
}

fn object_member(record: &dyn Record, key: &Key) -> Option<Value> {
    let Key::Name(name) = key else {
        return None;
    };

    if let Some(value) = record.field(name) {
        return Some(value);
    }

    let mut methods = vec![name.clone()];
    let camel = camel_case(name, "");
    if camel != *name {
        methods.push(camel);
    }
    methods.push(camel_case(name, "get"));

    if let Some(value) = methods.iter().find_map(|m| record.method(m)) {
        return Some(value);
    }

    if record.has_dynamic_call() {
        return Some(record.dynamic_call(&methods[1]));
    }

    record
        .offset_exists(name)
        .then(|| record.offset_get(name))
}

/// Camel-case `value`, optionally behind `prefix`.
///
/// `-` and `_` separate words; every word gets an upper-case first letter, words are
/// joined and the first letter of the result is lower-cased.
///
/// ```
/// use rowcast::camel_case;
///
/// assert_eq!(camel_case("first_name", ""), "firstName");
/// assert_eq!(camel_case("first-name", "get"), "getFirstName");
/// assert_eq!(camel_case("Name", ""), "name");
/// ```
#[must_use]
pub fn camel_case(value: &str, prefix: &str) -> String {
    let source = if prefix.is_empty() {
        value.to_owned()
    } else {
        format!("{prefix}_{value}")
    };

    let joined: String = source
        .split(['-', '_', ' '])
        .map(upper_first)
        .collect();
    lower_first(&joined)
}

fn upper_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lower_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
