//! Predicate: Boolean functions over rows
//!
//! A [`Predicate`] receives a row and its key and answers whether the row is kept.
//! [`Column`](crate::Column) and [`TwoColumns`](crate::TwoColumns) are the leaf
//! predicates; [`Criteria`] composes them with boolean logic.
//!
//! # Filtering
//!
//! | Method | Input | Output |
//! |--------|-------|--------|
//! | [`filter`](Predicate::filter) | rows, keyed by position | lazy [`Filter`] |
//! | [`filter_keyed`](Predicate::filter_keyed) | `(Key, row)` pairs | lazy [`Filter`] |
//! | [`filter_array`](Predicate::filter_array) | rows, keyed by position | `Vec<(Key, row)>` |
//!
//! Filters keep the order and the keys of the kept rows. A lookup failure aborts the
//! whole pass.

use std::fmt::Debug;

use crate::error::QueryError;
use crate::row::Row;
use crate::{Column, Key, TwoColumns};

/// A boolean function over a keyed row.
///
/// # Thread Safety
///
/// Implementations are immutable after construction and must be `Send + Sync`.
///
/// # Example
///
/// ```
/// use rowcast::{Column, Predicate, Value};
///
/// let adults = Column::filter_on(1, ">=", 18).unwrap();
/// let rows = vec![
///     vec![Value::from("ann"), Value::from("34")],
///     vec![Value::from("bob"), Value::from("12")],
/// ];
/// let kept = adults.filter_array(rows).unwrap();
/// assert_eq!(kept.len(), 1);
/// assert_eq!(kept[0].0, 0.into());
/// ```
pub trait Predicate: Send + Sync + Debug {
    /// Evaluate the predicate.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] when a column cannot be resolved on `row` or an operand
    /// resolved from the row does not fit the operator.
    fn test(&self, row: &dyn Row, key: &Key) -> Result<bool, QueryError>;

    /// Lazily keep the rows that satisfy the predicate, keyed by position.
    fn filter<I>(&self, rows: I) -> Filter<'_, Self, Indexed<I::IntoIter>>
    where
        Self: Sized,
        I: IntoIterator,
        I::Item: Row,
    {
        Filter {
            predicate: self,
            rows: Indexed {
                rows: rows.into_iter().enumerate(),
            },
            failed: false,
        }
    }

    /// Lazily keep the `(key, row)` pairs that satisfy the predicate.
    fn filter_keyed<I, T>(&self, rows: I) -> Filter<'_, Self, I::IntoIter>
    where
        Self: Sized,
        I: IntoIterator<Item = (Key, T)>,
        T: Row,
    {
        Filter {
            predicate: self,
            rows: rows.into_iter(),
            failed: false,
        }
    }

    /// Eagerly keep the rows that satisfy the predicate, keyed by position.
    ///
    /// # Errors
    ///
    /// Returns the first [`QueryError`] raised while evaluating a row.
    fn filter_array<I>(&self, rows: I) -> Result<Vec<(Key, I::Item)>, QueryError>
    where
        Self: Sized,
        I: IntoIterator,
        I::Item: Row,
    {
        self.filter(rows).collect()
    }
}

impl<P: Predicate + ?Sized> Predicate for Box<P> {
    fn test(&self, row: &dyn Row, key: &Key) -> Result<bool, QueryError> {
        (**self).test(row, key)
    }
}

/// Pairs every row with its position.
#[derive(Debug, Clone)]
pub struct Indexed<I> {
    rows: std::iter::Enumerate<I>,
}

impl<I: Iterator> Iterator for Indexed<I> {
    type Item = (Key, I::Item);

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next().map(|(i, row)| (Key::from(i), row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

/// Lazy filtering iterator returned by [`Predicate::filter`].
///
/// Yields `Ok((key, row))` for kept rows and stops after the first error. It can be
/// restarted by cloning whenever the underlying iterator is `Clone`.
#[derive(Debug)]
pub struct Filter<'p, P: ?Sized, I> {
    predicate: &'p P,
    rows: I,
    failed: bool,
}

impl<P: ?Sized, I: Clone> Clone for Filter<'_, P, I> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate,
            rows: self.rows.clone(),
            failed: self.failed,
        }
    }
}

impl<P, I, T> Iterator for Filter<'_, P, I>
where
    P: Predicate + ?Sized,
    I: Iterator<Item = (Key, T)>,
    T: Row,
{
    type Item = Result<(Key, T), QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        for (key, row) in self.rows.by_ref() {
            match self.predicate.test(&row, &key) {
                Ok(true) => return Some(Ok((key, row))),
                Ok(false) => tracing::trace!(%key, "row filtered out"),
                Err(err) => {
                    tracing::debug!(%key, error = %err, "filter aborted");
                    self.failed = true;
                    return Some(Err(err));
                }
            }
        }
        None
    }
}

/// Boolean composition of predicates.
///
/// | Variant | Holds when | Empty |
/// |---------|------------|-------|
/// | `All` | every child holds (short-circuits on `false`) | `true` |
/// | `Any` | some child holds (short-circuits on `true`) | `false` |
/// | `NoneOf` | no child holds | `true` |
/// | `Xor` | an odd number of children hold | `false` |
/// | `Not` | the child does not hold | |
///
/// # Example
///
/// ```
/// use rowcast::{Column, Criteria, Predicate, Value};
///
/// let criteria = Criteria::all(vec![
///     Column::filter_on(0, "STARTS_WITH", "a").unwrap().into(),
///     Criteria::not(Column::filter_on(1, "<", 18).unwrap().into()),
/// ]);
///
/// let rows = vec![
///     vec![Value::from("ann"), Value::from("34")],
///     vec![Value::from("amy"), Value::from("9")],
///     vec![Value::from("bob"), Value::from("50")],
/// ];
/// let kept = criteria.filter_array(rows).unwrap();
/// assert_eq!(kept.len(), 1);
/// ```
#[derive(Debug)]
pub enum Criteria {
    /// A leaf predicate.
    Single(Box<dyn Predicate>),
    /// Logical AND.
    All(Vec<Criteria>),
    /// Logical OR.
    Any(Vec<Criteria>),
    /// Logical NOR.
    NoneOf(Vec<Criteria>),
    /// Odd parity.
    Xor(Vec<Criteria>),
    /// Logical NOT.
    Not(Box<Criteria>),
}

impl Criteria {
    /// Wrap a leaf predicate.
    #[must_use]
    pub fn single(predicate: impl Predicate + 'static) -> Self {
        Self::Single(Box::new(predicate))
    }

    /// Every child must hold.
    #[must_use]
    pub fn all(children: Vec<Criteria>) -> Self {
        Self::All(children)
    }

    /// Some child must hold.
    #[must_use]
    pub fn any(children: Vec<Criteria>) -> Self {
        Self::Any(children)
    }

    /// No child may hold.
    #[must_use]
    pub fn none(children: Vec<Criteria>) -> Self {
        Self::NoneOf(children)
    }

    /// An odd number of children must hold.
    #[must_use]
    pub fn xor(children: Vec<Criteria>) -> Self {
        Self::Xor(children)
    }

    /// Negate `child`.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(child: Criteria) -> Self {
        Self::Not(Box::new(child))
    }

    /// `self AND other`, flattening an existing `All`.
    #[must_use]
    pub fn and(self, other: impl Into<Criteria>) -> Self {
        match self {
            Self::All(mut children) => {
                children.push(other.into());
                Self::All(children)
            }
            this => Self::All(vec![this, other.into()]),
        }
    }

    /// `self OR other`, flattening an existing `Any`.
    #[must_use]
    pub fn or(self, other: impl Into<Criteria>) -> Self {
        match self {
            Self::Any(mut children) => {
                children.push(other.into());
                Self::Any(children)
            }
            this => Self::Any(vec![this, other.into()]),
        }
    }

    /// Nesting depth; a leaf has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::All(children)
            | Self::Any(children)
            | Self::NoneOf(children)
            | Self::Xor(children) => 1 + children.iter().map(Self::depth).max().unwrap_or(0),
            Self::Not(child) => 1 + child.depth(),
        }
    }
}

impl Predicate for Criteria {
    fn test(&self, row: &dyn Row, key: &Key) -> Result<bool, QueryError> {
        match self {
            Self::Single(predicate) => predicate.test(row, key),
            Self::All(children) => {
                for child in children {
                    if !child.test(row, key)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Any(children) => {
                for child in children {
                    if child.test(row, key)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::NoneOf(children) => {
                for child in children {
                    if child.test(row, key)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Xor(children) => {
                let mut odd = false;
                for child in children {
                    odd ^= child.test(row, key)?;
                }
                Ok(odd)
            }
            Self::Not(child) => Ok(!child.test(row, key)?),
        }
    }
}

impl From<Column> for Criteria {
    fn from(column: Column) -> Self {
        Self::single(column)
    }
}

impl From<TwoColumns> for Criteria {
    fn from(columns: TwoColumns) -> Self {
        Self::single(columns)
    }
}

impl From<Box<dyn Predicate>> for Criteria {
    fn from(predicate: Box<dyn Predicate>) -> Self {
        Self::Single(predicate)
    }
}
