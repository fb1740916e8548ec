//! Feature field catalog and ordered schema variants
//!
//! The model consumes a fixed-width vector; the order of fields is part of
//! the trained artifact and is declared here per variant, never inferred
//! from input. Field names match the training dataset columns exactly.

use serde::{Deserialize, Serialize};

/// How a field's value comes into existence during assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Supplied by the caller, required.
    Direct,
    /// Computed from other fields in the same record, never supplied.
    Derived,
    /// Trailing-window statistic; defaults to 0.0 when the historical
    /// context is unavailable at request time.
    Contextual,
}

/// Inclusive numeric domain of a field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Domain {
    pub min: f64,
    pub max: f64,
    /// Integer-coded fields reject fractional values.
    pub integer: bool,
}

impl Domain {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Every feature field the model family knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureField {
    GlobalReactivePower,
    Voltage,
    GlobalIntensity,
    SubMetering1,
    SubMetering2,
    SubMetering3,
    Hour,
    DayOfWeek,
    Month,
    IsWeekend,
    GapRollingMean60,
    GapRollingMean120,
    GapDiff1,
    GapDiff60,
    SubMeteringTotal,
}

impl FeatureField {
    /// All known fields, in the canonical training-column order.
    pub const ALL: [FeatureField; 15] = [
        FeatureField::GlobalReactivePower,
        FeatureField::Voltage,
        FeatureField::GlobalIntensity,
        FeatureField::SubMetering1,
        FeatureField::SubMetering2,
        FeatureField::SubMetering3,
        FeatureField::Hour,
        FeatureField::DayOfWeek,
        FeatureField::Month,
        FeatureField::IsWeekend,
        FeatureField::GapRollingMean60,
        FeatureField::GapRollingMean120,
        FeatureField::GapDiff1,
        FeatureField::GapDiff60,
        FeatureField::SubMeteringTotal,
    ];

    /// Dataset column name, also the wire name for API input.
    pub const fn name(self) -> &'static str {
        match self {
            FeatureField::GlobalReactivePower => "Global_reactive_power",
            FeatureField::Voltage => "Voltage",
            FeatureField::GlobalIntensity => "Global_intensity",
            FeatureField::SubMetering1 => "Sub_metering_1",
            FeatureField::SubMetering2 => "Sub_metering_2",
            FeatureField::SubMetering3 => "Sub_metering_3",
            FeatureField::Hour => "hour",
            FeatureField::DayOfWeek => "day_of_week",
            FeatureField::Month => "month",
            FeatureField::IsWeekend => "is_weekend",
            FeatureField::GapRollingMean60 => "GAP_rolling_mean_60",
            FeatureField::GapRollingMean120 => "GAP_rolling_mean_120",
            FeatureField::GapDiff1 => "GAP_diff_1",
            FeatureField::GapDiff60 => "GAP_diff_60",
            FeatureField::SubMeteringTotal => "sub_metering_total",
        }
    }

    pub const fn kind(self) -> FieldKind {
        match self {
            FeatureField::IsWeekend | FeatureField::SubMeteringTotal => FieldKind::Derived,
            FeatureField::GapRollingMean60
            | FeatureField::GapRollingMean120
            | FeatureField::GapDiff1
            | FeatureField::GapDiff60 => FieldKind::Contextual,
            _ => FieldKind::Direct,
        }
    }

    /// Declared domain, matching the bounded input controls of the
    /// dashboard surface.
    pub const fn domain(self) -> Domain {
        match self {
            FeatureField::GlobalReactivePower => Domain { min: 0.0, max: 1.0, integer: false },
            FeatureField::Voltage => Domain { min: 220.0, max: 250.0, integer: false },
            FeatureField::GlobalIntensity => Domain { min: 0.0, max: 30.0, integer: false },
            FeatureField::SubMetering1
            | FeatureField::SubMetering2
            | FeatureField::SubMetering3 => Domain { min: 0.0, max: 50.0, integer: false },
            FeatureField::Hour => Domain { min: 0.0, max: 23.0, integer: true },
            FeatureField::DayOfWeek => Domain { min: 0.0, max: 6.0, integer: true },
            FeatureField::Month => Domain { min: 1.0, max: 12.0, integer: true },
            FeatureField::IsWeekend => Domain { min: 0.0, max: 1.0, integer: true },
            FeatureField::GapRollingMean60 | FeatureField::GapRollingMean120 => {
                Domain { min: 0.0, max: 5.0, integer: false }
            }
            FeatureField::GapDiff1 | FeatureField::GapDiff60 => {
                Domain { min: -1.0, max: 1.0, integer: false }
            }
            FeatureField::SubMeteringTotal => Domain { min: 0.0, max: 150.0, integer: false },
        }
    }

    /// Reverse lookup by dataset column name.
    pub fn from_name(name: &str) -> Option<FeatureField> {
        FeatureField::ALL.iter().copied().find(|f| f.name() == name)
    }
}

/// An ordered, named selection of fields a model was trained on.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    name: String,
    fields: Vec<FeatureField>,
}

impl FeatureSchema {
    /// The 15-field superset, in the exact order of the training columns.
    pub fn full() -> Self {
        Self {
            name: "full".to_string(),
            fields: FeatureField::ALL.to_vec(),
        }
    }

    /// The 11-field variant without rolling/diff context, relative order
    /// preserved.
    pub fn compact() -> Self {
        Self {
            name: "compact".to_string(),
            fields: FeatureField::ALL
                .iter()
                .copied()
                .filter(|f| f.kind() != FieldKind::Contextual)
                .collect(),
        }
    }

    /// Resolve a schema variant declared in configuration.
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "full" => Some(Self::full()),
            "compact" => Some(Self::compact()),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FeatureField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: FeatureField) -> bool {
        self.fields.contains(&field)
    }

    /// Position of a field within this schema's order.
    pub fn position(&self, field: FeatureField) -> Option<usize> {
        self.fields.iter().position(|f| *f == field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_schema_order_matches_training_columns() {
        let schema = FeatureSchema::full();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            vec![
                "Global_reactive_power",
                "Voltage",
                "Global_intensity",
                "Sub_metering_1",
                "Sub_metering_2",
                "Sub_metering_3",
                "hour",
                "day_of_week",
                "month",
                "is_weekend",
                "GAP_rolling_mean_60",
                "GAP_rolling_mean_120",
                "GAP_diff_1",
                "GAP_diff_60",
                "sub_metering_total",
            ]
        );
    }

    #[test]
    fn test_compact_schema_drops_contextual_fields() {
        let schema = FeatureSchema::compact();
        assert_eq!(schema.len(), 11);
        assert!(!schema.contains(FeatureField::GapRollingMean60));
        assert!(!schema.contains(FeatureField::GapDiff60));
        // Derived fields are still part of the vector
        assert!(schema.contains(FeatureField::IsWeekend));
        assert!(schema.contains(FeatureField::SubMeteringTotal));
    }

    #[test]
    fn test_by_name() {
        assert_eq!(FeatureSchema::by_name("full").unwrap().len(), 15);
        assert_eq!(FeatureSchema::by_name("compact").unwrap().len(), 11);
        assert!(FeatureSchema::by_name("v2-experimental").is_none());
    }

    #[test]
    fn test_field_name_round_trip() {
        for field in FeatureField::ALL {
            assert_eq!(FeatureField::from_name(field.name()), Some(field));
        }
        assert_eq!(FeatureField::from_name("Global_active_power"), None);
    }

    #[test]
    fn test_integer_domains() {
        assert!(FeatureField::Hour.domain().integer);
        assert!(FeatureField::DayOfWeek.domain().integer);
        assert!(FeatureField::Month.domain().integer);
        assert!(!FeatureField::Voltage.domain().integer);
    }

    #[test]
    fn test_domain_contains() {
        let d = FeatureField::Voltage.domain();
        assert!(d.contains(220.0));
        assert!(d.contains(250.0));
        assert!(!d.contains(219.9));
        assert!(!d.contains(250.1));
    }
}
