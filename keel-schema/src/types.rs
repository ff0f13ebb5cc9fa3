//! Logical column types.

use std::fmt;
use std::mem;

use serde::{Deserialize, Serialize};

/// Marker used as the target table of a self-referencing foreign key.
pub const SELF_REFERENCE: &str = "self";

fn default_max_length() -> u32 {
    255
}

fn default_max_digits() -> u32 {
    10
}

fn default_decimal_places() -> u32 {
    5
}

fn default_dimensions() -> u32 {
    1
}

fn default_target_field() -> String {
    "id".to_string()
}

/// The logical type of a field, with its type-specific parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    /// Auto-incrementing integer key.
    Auto,
    /// Auto-incrementing 64-bit key.
    BigAuto,
    /// 16-bit integer.
    SmallInteger,
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    BigInteger,
    /// Single precision float.
    Float,
    /// Double precision float.
    Double,
    /// Fixed precision decimal.
    Decimal {
        /// Total number of digits.
        #[serde(default = "default_max_digits")]
        max_digits: u32,
        /// Digits after the decimal point.
        #[serde(default = "default_decimal_places")]
        decimal_places: u32,
        /// Round values to `decimal_places` before storing.
        #[serde(default)]
        auto_round: bool,
        /// Rounding mode used with `auto_round`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rounding: Option<String>,
    },
    /// Bounded string.
    Char {
        /// Maximum length.
        #[serde(default = "default_max_length")]
        max_length: u32,
    },
    /// Unbounded string.
    Text,
    /// Boolean.
    Boolean,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Date and time.
    DateTime {
        /// Accepted input formats.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        formats: Vec<String>,
    },
    /// Timestamp with time zone.
    Timestamp,
    /// UUID.
    Uuid,
    /// Binary blob.
    Binary,
    /// JSON document.
    Json,
    /// Array of an inner type.
    Array {
        /// Element type.
        inner: Box<FieldType>,
        /// Number of dimensions.
        #[serde(default = "default_dimensions")]
        dimensions: u32,
    },
    /// Reference to another table.
    ForeignKey(ForeignKey),
}

impl FieldType {
    /// A `Char` with the given maximum length.
    pub fn char(max_length: u32) -> Self {
        Self::Char { max_length }
    }

    /// A `Decimal` with the given precision and scale.
    pub fn decimal(max_digits: u32, decimal_places: u32) -> Self {
        Self::Decimal {
            max_digits,
            decimal_places,
            auto_round: false,
            rounding: None,
        }
    }

    /// A `DateTime` without explicit formats.
    pub fn datetime() -> Self {
        Self::DateTime {
            formats: Vec::new(),
        }
    }

    /// A one-dimensional array.
    pub fn array(inner: FieldType) -> Self {
        Self::Array {
            inner: Box::new(inner),
            dimensions: 1,
        }
    }

    /// A foreign key to `table`.
    pub fn foreign_key(fk: ForeignKey) -> Self {
        Self::ForeignKey(fk)
    }

    /// Name of the type class, used in messages.
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::BigAuto => "big_auto",
            Self::SmallInteger => "small_integer",
            Self::Integer => "integer",
            Self::BigInteger => "big_integer",
            Self::Float => "float",
            Self::Double => "double",
            Self::Decimal { .. } => "decimal",
            Self::Char { .. } => "char",
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime { .. } => "datetime",
            Self::Timestamp => "timestamp",
            Self::Uuid => "uuid",
            Self::Binary => "binary",
            Self::Json => "json",
            Self::Array { .. } => "array",
            Self::ForeignKey(_) => "foreign_key",
        }
    }

    /// Check whether two types belong to the same class, ignoring parameters.
    pub fn same_class(&self, other: &FieldType) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }

    /// Check if this is an auto-incrementing key type.
    pub fn is_auto(&self) -> bool {
        matches!(self, Self::Auto | Self::BigAuto)
    }

    /// Get the foreign key descriptor, if any.
    pub fn as_foreign_key(&self) -> Option<&ForeignKey> {
        match self {
            Self::ForeignKey(fk) => Some(fk),
            _ => None,
        }
    }

    /// Mutable access to the foreign key descriptor, if any.
    pub fn as_foreign_key_mut(&mut self) -> Option<&mut ForeignKey> {
        match self {
            Self::ForeignKey(fk) => Some(fk),
            _ => None,
        }
    }

    /// List the parameters that differ between two types.
    ///
    /// Returns `["type"]` when the classes differ.
    pub fn param_changes(&self, other: &FieldType) -> Vec<&'static str> {
        if !self.same_class(other) {
            return vec!["type"];
        }

        let mut changes = Vec::new();
        match (self, other) {
            (
                Self::Decimal {
                    max_digits: d1,
                    decimal_places: p1,
                    auto_round: a1,
                    rounding: r1,
                },
                Self::Decimal {
                    max_digits: d2,
                    decimal_places: p2,
                    auto_round: a2,
                    rounding: r2,
                },
            ) => {
                if d1 != d2 {
                    changes.push("max_digits");
                }
                if p1 != p2 {
                    changes.push("decimal_places");
                }
                if a1 != a2 {
                    changes.push("auto_round");
                }
                if r1 != r2 {
                    changes.push("rounding");
                }
            }
            (Self::Char { max_length: a }, Self::Char { max_length: b }) => {
                if a != b {
                    changes.push("max_length");
                }
            }
            (Self::DateTime { formats: a }, Self::DateTime { formats: b }) => {
                if a != b {
                    changes.push("formats");
                }
            }
            (
                Self::Array {
                    inner: i1,
                    dimensions: d1,
                },
                Self::Array {
                    inner: i2,
                    dimensions: d2,
                },
            ) => {
                if i1 != i2 {
                    changes.push("inner");
                }
                if d1 != d2 {
                    changes.push("dimensions");
                }
            }
            (Self::ForeignKey(a), Self::ForeignKey(b)) => changes.extend(a.param_changes(b)),
            _ => {}
        }
        changes
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char { max_length } => write!(f, "char({})", max_length),
            Self::Decimal {
                max_digits,
                decimal_places,
                ..
            } => write!(f, "decimal({}, {})", max_digits, decimal_places),
            Self::Array { inner, dimensions } => {
                write!(f, "{}", inner)?;
                for _ in 0..*dimensions {
                    write!(f, "[]")?;
                }
                Ok(())
            }
            Self::ForeignKey(fk) => write!(f, "foreign_key({}.{})", fk.table, fk.field),
            other => write!(f, "{}", other.class_name()),
        }
    }
}

/// Resolved physical target of a foreign key.
///
/// Filled in by the registry so that dialects can render the referencing
/// column without a registry lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignTarget {
    /// Referenced table name (never the self marker).
    pub table: String,
    /// Referenced column name.
    pub column: String,
    /// Type of the referenced column.
    pub field_type: Box<FieldType>,
}

/// Foreign key descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Referenced table name, or [`SELF_REFERENCE`].
    pub table: String,
    /// Referenced field name.
    #[serde(default = "default_target_field")]
    pub field: String,
    /// `ON DELETE` policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
    /// `ON UPDATE` policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<String>,
    /// Name of the reverse relation on the referenced table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backref: Option<String>,
    /// Resolved target, not persisted.
    #[serde(skip)]
    pub target: Option<ForeignTarget>,
}

impl ForeignKey {
    /// Reference the `id` field of `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            field: default_target_field(),
            on_delete: None,
            on_update: None,
            backref: None,
            target: None,
        }
    }

    /// Reference the table the field belongs to.
    pub fn self_reference() -> Self {
        Self::new(SELF_REFERENCE)
    }

    /// Set the referenced field.
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    /// Set the `ON DELETE` policy.
    pub fn on_delete(mut self, policy: impl Into<String>) -> Self {
        self.on_delete = Some(policy.into());
        self
    }

    /// Set the `ON UPDATE` policy.
    pub fn on_update(mut self, policy: impl Into<String>) -> Self {
        self.on_update = Some(policy.into());
        self
    }

    /// Set the back-reference name.
    pub fn backref(mut self, name: impl Into<String>) -> Self {
        self.backref = Some(name.into());
        self
    }

    /// Check if this key references its own table.
    pub fn is_self_reference(&self) -> bool {
        self.table == SELF_REFERENCE
    }

    /// Referenced table name, resolving the self marker to `own_table`.
    pub fn target_table<'a>(&'a self, own_table: &'a str) -> &'a str {
        if self.is_self_reference() {
            own_table
        } else {
            &self.table
        }
    }

    /// Referenced column, falling back to the referenced field name.
    pub fn target_column(&self) -> &str {
        self.target
            .as_ref()
            .map(|t| t.column.as_str())
            .unwrap_or(&self.field)
    }

    fn param_changes(&self, other: &ForeignKey) -> Vec<&'static str> {
        let mut changes = Vec::new();
        if self.table != other.table {
            changes.push("table");
        }
        if self.field != other.field {
            changes.push("field");
        }
        if !same_policy(self.on_delete.as_deref(), other.on_delete.as_deref()) {
            changes.push("on_delete");
        }
        if !same_policy(self.on_update.as_deref(), other.on_update.as_deref()) {
            changes.push("on_update");
        }
        changes
    }
}

fn same_policy(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        (None, None) => true,
        _ => false,
    }
}

// Back-references and the resolved target are derived, never compared.
impl PartialEq for ForeignKey {
    fn eq(&self, other: &Self) -> bool {
        self.param_changes(other).is_empty()
    }
}
