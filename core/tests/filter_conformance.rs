//! Conformance tests that run the YAML filter fixtures against rowcast
//!
//! Run with: cargo test -p rowcast-core --test filter_conformance

use rowcast::{CriteriaConfig, Key, Predicate, QueryError, Value};
use serde::Deserialize;

const FIXTURES: &str = include_str!("fixtures/filter.yaml");

/// A single filter scenario.
#[derive(Debug, Deserialize)]
struct Fixture {
    name: String,
    #[allow(dead_code)]
    description: String,
    criteria: CriteriaConfig,
    rows: Vec<Value>,
    #[serde(default)]
    kept: Vec<Key>,
    #[serde(default)]
    error: Option<ExpectedError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ExpectedError {
    /// The criteria fails to load.
    Load,
    /// A row cannot be read.
    Statement,
}

impl Fixture {
    fn from_yaml_multi(yaml: &str) -> Vec<Self> {
        serde_yaml::Deserializer::from_str(yaml)
            .map(|doc| Self::deserialize(doc).expect("valid fixture"))
            .collect()
    }

    fn run_and_assert(self) {
        let criteria = match (self.criteria.load(), self.error) {
            (Ok(criteria), _) => criteria,
            (Err(_), Some(ExpectedError::Load)) => return,
            (Err(err), _) => panic!("{}: unexpected load error: {err}", self.name),
        };
        assert_ne!(
            self.error,
            Some(ExpectedError::Load),
            "{}: expected a load error",
            self.name
        );

        match criteria.filter_array(self.rows) {
            Ok(kept) => {
                assert_eq!(self.error, None, "{}: expected a filter error", self.name);
                let keys: Vec<Key> = kept.into_iter().map(|(key, _)| key).collect();
                assert_eq!(keys, self.kept, "{}", self.name);
            }
            Err(QueryError::Statement(_)) if self.error == Some(ExpectedError::Statement) => {}
            Err(err) => panic!("{}: unexpected filter error: {err}", self.name),
        }
    }
}

#[test]
fn test_filter_fixtures() {
    let fixtures = Fixture::from_yaml_multi(FIXTURES);
    assert!(fixtures.len() > 10);
    for fixture in fixtures {
        println!("  Running: {}", fixture.name);
        fixture.run_and_assert();
    }
}

#[test]
fn test_lazy_filter_stops_at_first_error() {
    let config: CriteriaConfig = serde_yaml::from_str(
        "
type: column
column: age
operator: '>'
value: 1
",
    )
    .unwrap();
    let criteria = config.load().unwrap();

    let rows: Vec<Value> = serde_json::from_str(r#"[{"age": 5}, {"name": "x"}, {"age": 9}]"#).unwrap();
    let mut filter = criteria.filter(rows);
    assert!(matches!(filter.next(), Some(Ok((Key::Index(0), _)))));
    assert!(matches!(filter.next(), Some(Err(QueryError::Statement(_)))));
    assert!(filter.next().is_none());
}

#[test]
fn test_filter_keyed_preserves_keys() {
    let config = CriteriaConfig::Column {
        column: Key::from(0),
        operator: "STARTS_WITH".into(),
        value: Value::from("a"),
    };
    let criteria = config.load().unwrap();

    let rows = vec![
        (Key::from("first"), vec![Value::from("ann")]),
        (Key::from("second"), vec![Value::from("bob")]),
        (Key::from("third"), vec![Value::from("amy")]),
    ];
    let kept: Vec<Key> = criteria
        .filter_keyed(rows)
        .map(|item| item.unwrap().0)
        .collect();
    assert_eq!(kept, vec![Key::from("first"), Key::from("third")]);
}
