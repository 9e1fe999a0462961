//! Leaf predicates: one column against a value, or two columns against each other.

use crate::comparison::{Comparison, Condition, IntoComparison};
use crate::error::QueryError;
use crate::predicate::Predicate;
use crate::row::Row;
use crate::select::{select_many, select_one};
use crate::{Key, Value};

/// Compares one column of each row with a fixed value.
///
/// The operand is validated (and a pattern compiled) when the predicate is built.
///
/// ```
/// use rowcast::{Column, Map, Predicate};
///
/// let rows = vec![
///     Map::new().with("name", "alice").with("role", "admin"),
///     Map::new().with("name", "bob").with("role", "user"),
/// ];
/// let admins = Column::filter_on("role", "=", "admin").unwrap();
/// let kept = admins.filter_array(rows).unwrap();
/// assert_eq!(kept.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Column {
    column: Key,
    condition: Condition,
}

impl Column {
    /// Build a predicate reading `column` and comparing it with `value`.
    ///
    /// # Errors
    ///
    /// - [`QueryError::UnknownOperator`] if `operator` is not a known symbol
    /// - [`QueryError::InvalidOperand`] / [`QueryError::InvalidPattern`] if `value`
    ///   does not fit the operator
    pub fn filter_on(
        column: impl Into<Key>,
        operator: impl IntoComparison,
        value: impl Into<Value>,
    ) -> Result<Self, QueryError> {
        let comparison = operator.into_comparison()?;
        let condition = comparison.compile(value.into())?;
        Ok(Self {
            column: column.into(),
            condition,
        })
    }

    /// The column read from each row.
    #[must_use]
    pub fn column(&self) -> &Key {
        &self.column
    }

    /// The operator.
    #[must_use]
    pub fn comparison(&self) -> Comparison {
        self.condition.comparison()
    }

    /// The reference value.
    #[must_use]
    pub fn value(&self) -> &Value {
        self.condition.reference()
    }
}

impl Predicate for Column {
    fn test(&self, row: &dyn Row, _key: &Key) -> Result<bool, QueryError> {
        let subject = select_one(row, &self.column)?;
        Ok(self.condition.test(&subject))
    }
}

/// The right-hand side of a [`TwoColumns`] predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecondColumn {
    /// One column.
    One(Key),
    /// Several columns.
    Many(Vec<Key>),
}

impl SecondColumn {
    fn parse(value: Value) -> Result<Self, QueryError> {
        match value {
            Value::String(name) => Ok(Self::One(Key::Name(name))),
            Value::Int(index) => Ok(Self::One(Key::Index(index))),
            Value::List(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(name) => Ok(Key::Name(name)),
                    Value::Int(index) => Ok(Key::Index(index)),
                    _ => Err(QueryError::InvalidColumnList),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Many),
            _ => Err(QueryError::InvalidColumnList),
        }
    }
}

/// Compares two columns of the same row.
///
/// With several second columns, `IN`, `NIN`, `BETWEEN` and `NBETWEEN` receive the
/// whole list of selected values; every other operator holds when it holds for at
/// least one of them.
///
/// ```
/// use rowcast::{Map, Predicate, TwoColumns, Value};
///
/// let row = Map::new().with("price", 10).with("floor", 5).with("cap", 20);
/// let above_floor = TwoColumns::filter_on("price", ">", "floor").unwrap();
/// assert!(above_floor.test(&row, &0.into()).unwrap());
///
/// let within = TwoColumns::filter_on("price", "BETWEEN", vec!["floor", "cap"]).unwrap();
/// assert!(within.test(&row, &0.into()).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct TwoColumns {
    first: Key,
    comparison: Comparison,
    second: SecondColumn,
}

impl TwoColumns {
    /// Build a predicate comparing `first` with `second`.
    ///
    /// `second` is a column name (string), a position (integer), or a list of those.
    /// An empty list never holds.
    ///
    /// # Errors
    ///
    /// - [`QueryError::UnknownOperator`] if `operator` is not a known symbol
    /// - [`QueryError::InvalidColumnList`] if `second` is malformed
    pub fn filter_on(
        first: impl Into<Key>,
        operator: impl IntoComparison,
        second: impl Into<Value>,
    ) -> Result<Self, QueryError> {
        let comparison = operator.into_comparison()?;
        let second = SecondColumn::parse(second.into())?;
        Ok(Self {
            first: first.into(),
            comparison,
            second,
        })
    }

    /// The column on the left-hand side.
    #[must_use]
    pub fn first(&self) -> &Key {
        &self.first
    }

    /// The operator.
    #[must_use]
    pub fn comparison(&self) -> Comparison {
        self.comparison
    }

    /// The right-hand side columns.
    #[must_use]
    pub fn second(&self) -> &SecondColumn {
        &self.second
    }
}

impl Predicate for TwoColumns {
    fn test(&self, row: &dyn Row, _key: &Key) -> Result<bool, QueryError> {
        match &self.second {
            SecondColumn::One(column) => {
                let reference = select_one(row, column)?;
                let condition = self.comparison.compile(reference)?;
                Ok(condition.test(&select_one(row, &self.first)?))
            }
            SecondColumn::Many(columns) if columns.is_empty() => Ok(false),
            SecondColumn::Many(columns) => {
                let references = select_many(row, columns)?.into_values();
                if self.comparison.is_set_operator() {
                    let condition = self.comparison.compile(Value::List(references))?;
                    return Ok(condition.test(&select_one(row, &self.first)?));
                }

                let subject = select_one(row, &self.first)?;
                for reference in references {
                    if self.comparison.compile(reference)?.test(&subject) {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Map, Record, RowView, StatementError};

    fn row() -> Map {
        Map::new()
            .with("a", 10)
            .with("b", 5)
            .with("c", 20)
            .with("name", "alice")
            .with("tags", "alice,bob")
    }

    fn holds(predicate: &dyn Predicate) -> bool {
        predicate.test(&row(), &Key::from(0)).unwrap()
    }

    #[test]
    fn test_column_validates_eagerly() {
        assert!(matches!(
            Column::filter_on("a", "BETWEEN", 3),
            Err(QueryError::InvalidOperand { .. })
        ));
        assert!(matches!(
            Column::filter_on("a", "REGEXP", "("),
            Err(QueryError::InvalidPattern { .. })
        ));
        assert!(matches!(
            Column::filter_on("a", "~", 3),
            Err(QueryError::UnknownOperator { .. })
        ));
    }

    #[test]
    fn test_column_compares() {
        assert!(holds(&Column::filter_on("a", ">", 9).unwrap()));
        assert!(holds(&Column::filter_on("name", "REGEXP", "^al").unwrap()));
        assert!(holds(&Column::filter_on(-1, "CONTAINS", "bob").unwrap()));
        assert!(!holds(&Column::filter_on("b", "IN", vec![1, 2]).unwrap()));
        assert!(holds(&Column::filter_on(Key::from("b"), Comparison::In, vec![5, 6]).unwrap()));
    }

    #[test]
    fn test_column_reports_unknown_column() {
        let predicate = Column::filter_on("missing", "=", 1).unwrap();
        assert!(matches!(
            predicate.test(&row(), &Key::from(0)),
            Err(QueryError::Statement(StatementError::UnknownColumn { .. }))
        ));
    }

    #[test]
    fn test_two_columns_single() {
        assert!(holds(&TwoColumns::filter_on("a", ">", "b").unwrap()));
        assert!(!holds(&TwoColumns::filter_on("a", ">", "c").unwrap()));
        assert!(holds(&TwoColumns::filter_on("a", "<", 2).unwrap()));
    }

    #[test]
    fn test_two_columns_any_element() {
        let predicate = TwoColumns::filter_on("a", ">", vec!["b", "c"]).unwrap();
        assert!(holds(&predicate));

        let predicate = TwoColumns::filter_on("a", "=", vec!["b", "c"]).unwrap();
        assert!(!holds(&predicate));
    }

    #[test]
    fn test_two_columns_set_operators_get_whole_list() {
        let predicate = TwoColumns::filter_on("a", "BETWEEN", vec!["b", "c"]).unwrap();
        assert!(holds(&predicate));

        let predicate = TwoColumns::filter_on("b", "IN", vec!["a", "b"]).unwrap();
        assert!(holds(&predicate));

        let predicate = TwoColumns::filter_on("a", "BETWEEN", vec!["b", "c", "name"]).unwrap();
        assert!(matches!(
            predicate.test(&row(), &Key::from(0)),
            Err(QueryError::InvalidOperand { .. })
        ));
    }

    #[test]
    fn test_two_columns_rejects_bad_second_operand() {
        for second in [
            Value::Bool(true),
            Value::from(vec![Value::from("a"), Value::Float(1.5)]),
        ] {
            assert!(matches!(
                TwoColumns::filter_on("a", "=", second),
                Err(QueryError::InvalidColumnList)
            ));
        }
    }

    #[test]
    fn test_two_columns_empty_list_never_holds() {
        for operator in ["=", "!=", ">", "IN", "NIN", "BETWEEN"] {
            let predicate = TwoColumns::filter_on("a", operator, Vec::<Value>::new()).unwrap();
            assert_eq!(predicate.second(), &SecondColumn::Many(vec![]));
            assert!(!holds(&predicate), "{operator}");
        }
    }

    #[test]
    fn test_two_columns_mixed_keys() {
        let predicate = TwoColumns::filter_on("a", ">", vec![Value::Int(1), Value::from("c")]).unwrap();
        assert_eq!(
            predicate.second(),
            &SecondColumn::Many(vec![Key::Index(1), Key::from("c")])
        );
        assert!(holds(&predicate));
    }

    #[derive(Debug)]
    struct Product;

    impl Record for Product {
        fn method(&self, name: &str) -> Option<Value> {
            match name {
                "getPrice" => Some(Value::Int(12)),
                "getCost" => Some(Value::Int(7)),
                _ => None,
            }
        }
    }

    impl Row for Product {
        fn view(&self) -> RowView<'_> {
            RowView::Object(self)
        }
    }

    #[test]
    fn test_two_columns_on_objects() {
        let predicate = TwoColumns::filter_on("price", ">", "cost").unwrap();
        assert!(predicate.test(&Product, &Key::from(0)).unwrap());
    }
}
