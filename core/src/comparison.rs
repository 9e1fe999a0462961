//! `Comparison`: Operators used by column predicates
//!
//! Each operator has one canonical symbol plus word aliases, all case-insensitive:
//!
//! | Operator | Symbol | Aliases |
//! |----------|--------|---------|
//! | `Equals` | `=` | `==`, `EQ`, `IS` |
//! | `NotEquals` | `!=` | `<>`, `NEQ`, `IS NOT` |
//! | `GreaterThan` | `>` | `GT` |
//! | `GreaterThanOrEqual` | `>=` | `GTE` |
//! | `LesserThan` | `<` | `LT` |
//! | `LesserThanOrEqual` | `<=` | `LTE` |
//! | `Between` | `BETWEEN` | |
//! | `NotBetween` | `NBETWEEN` | `NOT_BETWEEN`, `NOT BETWEEN` |
//! | `Regexp` | `REGEXP` | |
//! | `NotRegexp` | `NREGEXP` | `NOT_REGEXP`, `NOT REGEXP` |
//! | `In` | `IN` | |
//! | `NotIn` | `NIN` | `NOT_IN`, `NOT IN` |
//! | `Contains` | `CONTAINS` | |
//! | `NotContain` | `NCONTAIN` | `NOT_CONTAIN`, `NOT CONTAIN` |
//! | `StartsWith` | `STARTS_WITH` | |
//! | `EndsWith` | `ENDS_WITH` | |
//!
//! # Semantics
//!
//! - equality (and `IN`) is strict: `"10"` does not equal `10`
//! - ordering is numeric when both sides are numbers or numeric strings, lexical when
//!   both are strings, and false otherwise
//! - string operators are false for non-string subjects

use std::cmp::Ordering;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::QueryError;
use crate::Value;

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    /// Strict equality.
    Equals,
    /// Strict inequality.
    NotEquals,
    /// `subject > reference`
    GreaterThan,
    /// `subject >= reference`
    GreaterThanOrEqual,
    /// `subject < reference`
    LesserThan,
    /// `subject <= reference`
    LesserThanOrEqual,
    /// `min <= subject <= max`, reference is `[min, max]`.
    Between,
    /// `subject < min || subject > max`, reference is `[min, max]`.
    NotBetween,
    /// The subject matches the reference pattern.
    Regexp,
    /// The subject does not match the reference pattern.
    NotRegexp,
    /// The reference list contains the subject.
    In,
    /// The reference list does not contain the subject.
    NotIn,
    /// The subject contains the reference string.
    Contains,
    /// The subject does not contain the reference string.
    NotContain,
    /// The subject starts with the reference string.
    StartsWith,
    /// The subject ends with the reference string.
    EndsWith,
}

impl Comparison {
    /// Every operator.
    pub const ALL: [Comparison; 16] = [
        Self::Equals,
        Self::NotEquals,
        Self::GreaterThan,
        Self::GreaterThanOrEqual,
        Self::LesserThan,
        Self::LesserThanOrEqual,
        Self::Between,
        Self::NotBetween,
        Self::Regexp,
        Self::NotRegexp,
        Self::In,
        Self::NotIn,
        Self::Contains,
        Self::NotContain,
        Self::StartsWith,
        Self::EndsWith,
    ];

    /// Parse an operator symbol or alias. Surrounding whitespace and case are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownOperator`] for unknown symbols.
    ///
    /// ```
    /// use rowcast::Comparison;
    ///
    /// assert_eq!(Comparison::from_operator(" gte ").unwrap(), Comparison::GreaterThanOrEqual);
    /// assert_eq!(Comparison::from_operator("<>").unwrap(), Comparison::NotEquals);
    /// assert!(Comparison::from_operator("~=").is_err());
    /// ```
    pub fn from_operator(operator: &str) -> Result<Self, QueryError> {
        let symbol = operator.trim().to_ascii_uppercase();
        let comparison = match symbol.as_str() {
            "=" | "==" | "EQ" | "IS" => Self::Equals,
            "!=" | "<>" | "NEQ" | "IS NOT" => Self::NotEquals,
            ">" | "GT" => Self::GreaterThan,
            ">=" | "GTE" => Self::GreaterThanOrEqual,
            "<" | "LT" => Self::LesserThan,
            "<=" | "LTE" => Self::LesserThanOrEqual,
            "BETWEEN" => Self::Between,
            "NBETWEEN" | "NOT_BETWEEN" | "NOT BETWEEN" => Self::NotBetween,
            "REGEXP" => Self::Regexp,
            "NREGEXP" | "NOT_REGEXP" | "NOT REGEXP" => Self::NotRegexp,
            "IN" => Self::In,
            "NIN" | "NOT_IN" | "NOT IN" => Self::NotIn,
            "CONTAINS" => Self::Contains,
            "NCONTAIN" | "NOT_CONTAIN" | "NOT CONTAIN" => Self::NotContain,
            "STARTS_WITH" => Self::StartsWith,
            "ENDS_WITH" => Self::EndsWith,
            _ => {
                return Err(QueryError::UnknownOperator {
                    operator: operator.to_owned(),
                })
            }
        };
        Ok(comparison)
    }

    /// The canonical symbol.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::NotEquals => "!=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::LesserThan => "<",
            Self::LesserThanOrEqual => "<=",
            Self::Between => "BETWEEN",
            Self::NotBetween => "NBETWEEN",
            Self::Regexp => "REGEXP",
            Self::NotRegexp => "NREGEXP",
            Self::In => "IN",
            Self::NotIn => "NIN",
            Self::Contains => "CONTAINS",
            Self::NotContain => "NCONTAIN",
            Self::StartsWith => "STARTS_WITH",
            Self::EndsWith => "ENDS_WITH",
        }
    }

    /// Returns `true` for operators whose reference is a list of values.
    #[must_use]
    pub fn is_set_operator(self) -> bool {
        matches!(
            self,
            Self::In | Self::NotIn | Self::Between | Self::NotBetween
        )
    }

    /// Check that `reference` is a valid operand for this operator.
    ///
    /// # Errors
    ///
    /// - [`QueryError::InvalidOperand`] if the shape does not fit
    /// - [`QueryError::InvalidPattern`] if a regular expression does not compile
    pub fn accept(self, reference: &Value) -> Result<(), QueryError> {
        self.compile(reference.clone()).map(|_| ())
    }

    /// Validate `reference` and bind it, compiling patterns once.
    ///
    /// # Errors
    ///
    /// See [`accept`](Self::accept).
    pub fn compile(self, reference: Value) -> Result<Condition, QueryError> {
        let invalid = |expected: &'static str| QueryError::InvalidOperand {
            operator: self.as_str(),
            expected,
        };

        let pattern = match self {
            Self::Between | Self::NotBetween => {
                match reference.as_list() {
                    Some(bounds) if bounds.len() == 2 => {}
                    _ => return Err(invalid("must be a list containing exactly two values")),
                }
                None
            }
            Self::In | Self::NotIn => {
                if reference.as_list().is_none() {
                    return Err(invalid("must be a list"));
                }
                None
            }
            Self::Regexp | Self::NotRegexp => {
                let source = reference.as_str().ok_or_else(|| invalid("must be a string"))?;
                Some(compile_pattern(source)?)
            }
            Self::Contains | Self::NotContain | Self::StartsWith | Self::EndsWith => {
                if reference.as_str().is_none() {
                    return Err(invalid("must be a string"));
                }
                None
            }
            _ => None,
        };

        Ok(Condition {
            comparison: self,
            reference,
            pattern,
        })
    }

    /// Compare `subject` against `reference`.
    ///
    /// # Errors
    ///
    /// See [`accept`](Self::accept).
    ///
    /// ```
    /// use rowcast::{Comparison, Value};
    ///
    /// let between = Comparison::Between;
    /// assert!(between.compare(&Value::from("15"), &Value::from(vec![10, 20])).unwrap());
    /// assert!(!Comparison::Equals.compare(&Value::from("10"), &Value::Int(10)).unwrap());
    /// ```
    pub fn compare(self, subject: &Value, reference: &Value) -> Result<bool, QueryError> {
        Ok(self.compile(reference.clone())?.test(subject))
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Comparison {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_operator(s)
    }
}

impl Serialize for Comparison {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Comparison {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let symbol = String::deserialize(deserializer)?;
        Self::from_operator(&symbol).map_err(serde::de::Error::custom)
    }
}

/// Anything that names an operator.
pub trait IntoComparison {
    /// Resolve the operator.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownOperator`] for unknown symbols.
    fn into_comparison(self) -> Result<Comparison, QueryError>;
}

impl IntoComparison for Comparison {
    fn into_comparison(self) -> Result<Comparison, QueryError> {
        Ok(self)
    }
}

impl IntoComparison for &str {
    fn into_comparison(self) -> Result<Comparison, QueryError> {
        Comparison::from_operator(self)
    }
}

impl IntoComparison for String {
    fn into_comparison(self) -> Result<Comparison, QueryError> {
        Comparison::from_operator(&self)
    }
}

// `/body/flags` is accepted alongside bare patterns.
fn compile_pattern(source: &str) -> Result<Regex, QueryError> {
    let translated = delimited_pattern(source);
    let pattern = translated.as_deref().unwrap_or(source);
    Regex::new(pattern).map_err(|err| QueryError::InvalidPattern {
        pattern: source.to_owned(),
        source: err,
    })
}

fn delimited_pattern(source: &str) -> Option<String> {
    let body = source.strip_prefix('/')?;
    let end = body.rfind('/')?;
    let (body, flags) = (&body[..end], &body[end + 1..]);
    if !flags.chars().all(|c| "imsxuU".contains(c)) {
        return None;
    }

    let inline: String = flags.chars().filter(|c| *c != 'u').collect();
    Some(if inline.is_empty() {
        body.to_owned()
    } else {
        format!("(?{inline}){body}")
    })
}

/// An operator bound to a validated reference value.
#[derive(Debug, Clone)]
pub struct Condition {
    comparison: Comparison,
    reference: Value,
    pattern: Option<Regex>,
}

impl Condition {
    /// The operator.
    #[must_use]
    pub fn comparison(&self) -> Comparison {
        self.comparison
    }

    /// The reference value.
    #[must_use]
    pub fn reference(&self) -> &Value {
        &self.reference
    }

    /// Evaluate the condition for `subject`.
    #[must_use]
    pub fn test(&self, subject: &Value) -> bool {
        let reference = &self.reference;
        match self.comparison {
            Comparison::Equals => subject == reference,
            Comparison::NotEquals => subject != reference,
            Comparison::GreaterThan => loose_cmp(subject, reference) == Some(Ordering::Greater),
            Comparison::GreaterThanOrEqual => matches!(
                loose_cmp(subject, reference),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Comparison::LesserThan => loose_cmp(subject, reference) == Some(Ordering::Less),
            Comparison::LesserThanOrEqual => matches!(
                loose_cmp(subject, reference),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Comparison::Between | Comparison::NotBetween => {
                let Some([min, max]) = reference.as_list() else {
                    return false;
                };
                let within = matches!(
                    loose_cmp(subject, min),
                    Some(Ordering::Greater | Ordering::Equal)
                ) && matches!(
                    loose_cmp(subject, max),
                    Some(Ordering::Less | Ordering::Equal)
                );
                if self.comparison == Comparison::Between {
                    within
                } else {
                    loose_cmp(subject, min) == Some(Ordering::Less)
                        || loose_cmp(subject, max) == Some(Ordering::Greater)
                }
            }
            Comparison::In => reference.as_list().is_some_and(|l| l.contains(subject)),
            Comparison::NotIn => reference.as_list().is_some_and(|l| !l.contains(subject)),
            Comparison::Regexp | Comparison::NotRegexp => {
                let (Some(input), Some(re)) = (subject.as_str(), &self.pattern) else {
                    return false;
                };
                re.is_match(input) == (self.comparison == Comparison::Regexp)
            }
            Comparison::Contains
            | Comparison::NotContain
            | Comparison::StartsWith
            | Comparison::EndsWith => {
                let (Some(input), Some(needle)) = (subject.as_str(), reference.as_str()) else {
                    return false;
                };
                match self.comparison {
                    Comparison::Contains => input.contains(needle),
                    Comparison::NotContain => !input.contains(needle),
                    Comparison::StartsWith => input.starts_with(needle),
                    _ => input.ends_with(needle),
                }
            }
        }
    }
}

fn loose_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_number(), b.as_number()) {
        return x.partial_cmp(y);
    }
    match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmp(op: &str, subject: impl Into<Value>, reference: impl Into<Value>) -> bool {
        Comparison::from_operator(op)
            .unwrap()
            .compare(&subject.into(), &reference.into())
            .unwrap()
    }

    #[test]
    fn test_every_alias_maps_to_one_operator() {
        for comparison in Comparison::ALL {
            assert_eq!(
                Comparison::from_operator(comparison.as_str()).unwrap(),
                comparison
            );
            assert_eq!(
                Comparison::from_operator(&comparison.as_str().to_lowercase()).unwrap(),
                comparison
            );
        }
        assert_eq!(Comparison::from_operator("is not").unwrap(), Comparison::NotEquals);
        assert_eq!(Comparison::from_operator("not_in").unwrap(), Comparison::NotIn);
        assert_eq!(Comparison::from_operator("lte").unwrap(), Comparison::LesserThanOrEqual);
    }

    #[test]
    fn test_unknown_operator() {
        let err = Comparison::from_operator("LIKE").unwrap_err();
        assert_eq!(err.to_string(), "unknown or unsupported comparison operator `LIKE`");
    }

    #[test]
    fn test_strict_equality() {
        assert!(cmp("=", "10", "10"));
        assert!(!cmp("=", "10", 10));
        assert!(cmp("!=", "10", 10));
        assert!(cmp("IN", "b", vec!["a", "b"]));
        assert!(!cmp("IN", "1", vec![1, 2]));
        assert!(cmp("NOT IN", "c", vec!["a", "b"]));
    }

    #[test]
    fn test_ordering_is_numeric_for_numeric_strings() {
        assert!(cmp(">", "10", "5"));
        assert!(cmp(">", "10", 5));
        assert!(cmp("<=", 2.5, "2.5"));
        assert!(cmp("<", "apple", "banana"));
        assert!(!cmp(">", "abc", 5));
        assert!(!cmp("<", Value::Null, 5));
    }

    #[test]
    fn test_between() {
        assert!(cmp("BETWEEN", 10, vec![10, 20]));
        assert!(cmp("BETWEEN", "20", vec![10, 20]));
        assert!(!cmp("BETWEEN", 21, vec![10, 20]));
        assert!(cmp("NBETWEEN", 21, vec![10, 20]));
        assert!(!cmp("NBETWEEN", 15, vec![10, 20]));
        assert!(!cmp("NBETWEEN", "x", vec![10, 20]));
    }

    #[test]
    fn test_string_operators() {
        assert!(cmp("CONTAINS", "hello world", "lo w"));
        assert!(cmp("NCONTAIN", "hello", "xyz"));
        assert!(cmp("STARTS_WITH", "hello", "he"));
        assert!(cmp("ENDS_WITH", "hello", "lo"));
        assert!(!cmp("CONTAINS", 12345, "23"));
        assert!(!cmp("NCONTAIN", 12345, "9"));
    }

    #[test]
    fn test_regexp() {
        assert!(cmp("REGEXP", "user-12", r"^user-\d+$"));
        assert!(cmp("NREGEXP", "user-ab", r"^user-\d+$"));
        assert!(cmp("REGEXP", "HELLO", "/^hello$/i"));
        assert!(!cmp("REGEXP", 12, r"\d+"));
    }

    #[test]
    fn test_accept_rejects_bad_operands() {
        let cases = [
            (Comparison::Between, Value::from(vec![1])),
            (Comparison::NotBetween, Value::Int(1)),
            (Comparison::In, Value::from("a")),
            (Comparison::Contains, Value::Int(1)),
            (Comparison::Regexp, Value::Int(1)),
        ];
        for (comparison, reference) in cases {
            assert!(
                matches!(
                    comparison.accept(&reference),
                    Err(QueryError::InvalidOperand { .. })
                ),
                "{comparison} {reference:?}"
            );
        }

        assert!(matches!(
            Comparison::Regexp.accept(&Value::from("(")),
            Err(QueryError::InvalidPattern { .. })
        ));
        assert!(Comparison::Equals.accept(&Value::from(vec![1])).is_ok());
    }

    #[test]
    fn test_serde_uses_aliases() {
        let ops: Vec<Comparison> = serde_json::from_str(r#"["gte", "not in", "="]"#).unwrap();
        assert_eq!(
            ops,
            [Comparison::GreaterThanOrEqual, Comparison::NotIn, Comparison::Equals]
        );
        assert!(serde_json::from_str::<Comparison>(r#""~""#).is_err());
        assert_eq!(serde_json::to_string(&Comparison::NotIn).unwrap(), r#""NIN""#);
    }

    #[test]
    fn test_delimited_pattern() {
        assert_eq!(delimited_pattern("/a+/i").as_deref(), Some("(?i)a+"));
        assert_eq!(delimited_pattern("/a/b/").as_deref(), Some("a/b"));
        assert_eq!(delimited_pattern("a+"), None);
        assert_eq!(delimited_pattern("/a+/zz"), None);
    }
}
