//! Array-shape caster: one raw cell into a list or map.
//!
//! | Shape | Input | Output |
//! |-------|-------|--------|
//! | `list` | `1,2,3` | `[1, 2, 3]` (elements cast to the element type) |
//! | `csv` | `"a,b",c` | `["a,b", "c"]` (one CSV line, elements cast) |
//! | `json` | `{"a":1}` | `{"a": 1}` (array or object only) |
//!
//! An empty cell always becomes an empty list.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::caster::Caster;
use crate::error::{BoxError, CastError, MappingError};
use crate::types::{Type, TypeDeclaration, TypeName};
use crate::Value;

/// Deepest JSON nesting the decoder accepts; `serde_json` refuses to recurse further.
pub const MAX_JSON_DEPTH: usize = 127;

/// Default JSON nesting limit.
pub const DEFAULT_JSON_DEPTH: usize = MAX_JSON_DEPTH;

/// How a raw cell is split into elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrayShape {
    /// Split on a delimiter.
    #[default]
    List,
    /// Parse one CSV record.
    Csv,
    /// Decode a JSON array or object.
    Json,
}

impl ArrayShape {
    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ArrayShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArrayShape {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "list" => Ok(Self::List),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(MappingError::UnknownArrayShape {
                shape: s.to_owned(),
            }),
        }
    }
}

/// Options of an [`ArrayCaster`].
///
/// Deserializable so column casting can be described in configuration files:
///
/// ```yaml
/// shape: csv
/// delimiter: ";"
/// type: int
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArrayOptions {
    /// How the cell is split.
    pub shape: ArrayShape,
    /// Element separator (`list`: any non-empty string, `csv`: one byte).
    pub delimiter: String,
    /// CSV field enclosure (one byte).
    pub enclosure: String,
    /// Maximum JSON nesting depth (1 to [`MAX_JSON_DEPTH`]).
    pub json_depth: usize,
    /// Element type for `list` and `csv` shapes.
    #[serde(rename = "type")]
    pub element_type: Type,
    /// Value returned for null cells on nullable targets.
    pub default: Option<Vec<Value>>,
}

impl Default for ArrayOptions {
    fn default() -> Self {
        Self {
            shape: ArrayShape::List,
            delimiter: ",".to_owned(),
            enclosure: "\"".to_owned(),
            json_depth: DEFAULT_JSON_DEPTH,
            element_type: Type::String,
            default: None,
        }
    }
}

impl ArrayOptions {
    /// Options for the given shape, everything else defaulted.
    #[must_use]
    pub fn shape(shape: ArrayShape) -> Self {
        Self {
            shape,
            ..Self::default()
        }
    }

    /// Set the delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Set the CSV enclosure.
    #[must_use]
    pub fn with_enclosure(mut self, enclosure: impl Into<String>) -> Self {
        self.enclosure = enclosure.into();
        self
    }

    /// Set the JSON depth limit.
    #[must_use]
    pub fn with_json_depth(mut self, depth: usize) -> Self {
        self.json_depth = depth;
        self
    }

    /// Set the element type.
    #[must_use]
    pub fn with_element_type(mut self, element_type: Type) -> Self {
        self.element_type = element_type;
        self
    }

    /// Set the null replacement.
    #[must_use]
    pub fn with_default(mut self, default: Vec<Value>) -> Self {
        self.default = Some(default);
        self
    }

    fn validate(&self) -> Result<(), MappingError> {
        let invalid = |reason: String| Err(MappingError::InvalidArrayOption { reason });

        match self.shape {
            ArrayShape::Json if self.json_depth < 1 => {
                return invalid("the json depth can not be less than 1".to_owned());
            }
            ArrayShape::Json if self.json_depth > MAX_JSON_DEPTH => {
                return invalid(format!(
                    "the json depth can not be greater than {MAX_JSON_DEPTH}; {} given",
                    self.json_depth
                ));
            }
            ArrayShape::List if self.delimiter.is_empty() => {
                return invalid(
                    "expects delimiter to be a non-empty string for list conversion; \
                     empty string given"
                        .to_owned(),
                );
            }
            ArrayShape::Csv if self.delimiter.len() != 1 => {
                return invalid(format!(
                    "expects delimiter to be a single character for CSV conversion; `{}` given",
                    self.delimiter
                ));
            }
            ArrayShape::Csv if self.enclosure.len() != 1 => {
                return invalid(format!(
                    "expects enclosure to be a single character; `{}` given",
                    self.enclosure
                ));
            }
            _ => {}
        }

        if self.shape != ArrayShape::Json && !self.element_type.is_scalar() {
            return Err(MappingError::NonScalarElement {
                type_name: self.element_type.as_str(),
            });
        }

        Ok(())
    }
}

/// Caster for `array`, `iterable` and `mixed` targets.
///
/// ```
/// use rowcast::{ArrayCaster, ArrayOptions, Caster, Type, TypeDeclaration, Value};
///
/// let decl = TypeDeclaration::property("Post", "tags").with_types("array");
/// let options = ArrayOptions::default().with_element_type(Type::Int);
/// let caster = ArrayCaster::new(&decl, options).unwrap();
///
/// assert_eq!(
///     caster.to_variable(Some("1,2,3")).unwrap(),
///     Value::from(vec![1, 2, 3]),
/// );
/// assert_eq!(caster.to_variable(Some("")).unwrap(), Value::List(vec![]));
/// ```
#[derive(Debug, Clone)]
pub struct ArrayCaster {
    target: Type,
    nullable: bool,
    options: ArrayOptions,
}

impl ArrayCaster {
    /// Build a caster for `declaration`.
    ///
    /// An untyped declaration behaves as nullable `mixed`.
    ///
    /// # Errors
    ///
    /// - [`MappingError::UnsupportedType`] if no candidate is `array`, `iterable` or `mixed`
    /// - [`MappingError::InvalidArrayOption`] for inconsistent shape options
    /// - [`MappingError::NonScalarElement`] for a non-scalar element type
    pub fn new(declaration: &TypeDeclaration, options: ArrayOptions) -> Result<Self, MappingError> {
        let (target, nullable) = if declaration.is_untyped() {
            (Type::Mixed, true)
        } else {
            let target = declaration
                .candidates()
                .iter()
                .find_map(|c| match c.name {
                    TypeName::Builtin(t) if t.is_one_of(&[Type::Mixed, Type::Array, Type::Iterable]) => {
                        Some(t)
                    }
                    _ => None,
                })
                .ok_or_else(|| MappingError::UnsupportedType {
                    site: declaration.site().to_string(),
                    caster: "array",
                    expected: "array, iterable, mixed",
                })?;
            (target, declaration.is_nullable())
        };

        options.validate()?;
        tracing::debug!(
            site = %declaration.site(),
            %target,
            nullable,
            shape = %options.shape,
            "configured array caster"
        );

        Ok(Self {
            target,
            nullable,
            options,
        })
    }

    /// The configured options.
    #[must_use]
    pub fn options(&self) -> &ArrayOptions {
        &self.options
    }

    fn invalid(&self, raw: &str, source: Option<BoxError>) -> CastError {
        CastError::invalid_value(raw, self.target.as_str(), source)
    }

    fn decode_json(&self, raw: &str) -> Result<Value, CastError> {
        let json: Value =
            serde_json::from_str(raw).map_err(|err| self.invalid(raw, Some(Box::new(err))))?;

        let depth = json_depth(&json);
        if depth > self.options.json_depth {
            return Err(self.invalid(
                raw,
                Some(
                    format!(
                        "nesting depth {depth} exceeds the limit of {}",
                        self.options.json_depth
                    )
                    .into(),
                ),
            ));
        }

        if matches!(json, Value::List(_) | Value::Map(_)) {
            Ok(json)
        } else {
            Err(self.invalid(raw, None))
        }
    }

    fn split_csv(&self, raw: &str) -> Result<Vec<String>, CastError> {
        // 0xFF never occurs in UTF-8, so line breaks stay inside the single record.
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.options.delimiter.as_bytes()[0])
            .quote(self.options.enclosure.as_bytes()[0])
            .terminator(csv::Terminator::Any(0xFF))
            .escape(None)
            .double_quote(true)
            .from_reader(raw.as_bytes());

        match reader.records().next() {
            Some(record) => record
                .map(|r| r.iter().map(str::to_owned).collect())
                .map_err(|err| self.invalid(raw, Some(Box::new(err)))),
            None => Ok(Vec::new()),
        }
    }

    fn cast_elements<'a>(
        &self,
        raw: &str,
        elements: impl IntoIterator<Item = &'a str>,
    ) -> Result<Value, CastError> {
        elements
            .into_iter()
            .map(|element| {
                self.options
                    .element_type
                    .cast_scalar(element)
                    .map_err(|err| self.invalid(raw, Some(Box::new(err))))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }
}

impl Caster for ArrayCaster {
    fn to_variable(&self, raw: Option<&str>) -> Result<Value, CastError> {
        let Some(raw) = raw else {
            if self.nullable || self.target == Type::Mixed {
                return Ok(self.options.default.clone().map_or(Value::Null, Value::List));
            }
            return Err(CastError::not_nullable(self.target.as_str(), None));
        };

        if raw.is_empty() {
            return Ok(Value::List(Vec::new()));
        }

        tracing::trace!(shape = %self.options.shape, raw, "casting array cell");
        match self.options.shape {
            ArrayShape::Json => self.decode_json(raw),
            ArrayShape::List => self.cast_elements(raw, raw.split(self.options.delimiter.as_str())),
            ArrayShape::Csv => {
                let fields = self.split_csv(raw)?;
                self.cast_elements(raw, fields.iter().map(String::as_str))
            }
        }
    }
}

// Scalars sit at depth 0; every array or object adds one level.
fn json_depth(value: &Value) -> usize {
    match value {
        Value::List(items) => 1 + items.iter().map(json_depth).max().unwrap_or(0),
        Value::Map(fields) => 1 + fields.iter().map(|(_, v)| json_depth(v)).max().unwrap_or(0),
        _ => 0,
    }
}
