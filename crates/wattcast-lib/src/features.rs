//! Feature assembly for model inference
//!
//! Turns named scalar inputs into the fixed-order numeric record the model
//! was trained on. Derived fields are always computed here; supplying them
//! from the outside is rejected so a record can never contradict itself.

use crate::error::AssemblyError;
use crate::schema::{FeatureField, FeatureSchema, FieldKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Raw named scalar inputs, keyed by dataset column name.
///
/// This is the shape inputs take when they arrive from an unconstrained
/// source (API request, CSV row). Bounded UI controls produce the same
/// mapping with the bounds already enforced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawReading(BTreeMap<String, f64>);

impl RawReading {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert by field.
    pub fn with(mut self, field: FeatureField, value: f64) -> Self {
        self.0.insert(field.name().to_string(), value);
        self
    }

    /// Insert by raw column name; unknown names are caught at assembly.
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An assembled, validated record in the field order of one schema.
///
/// Constructed fresh per prediction request and discarded after use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRecord {
    schema: String,
    values: Vec<f64>,
}

impl FeatureRecord {
    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    /// Values in the schema's declared order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The f32 vector submitted to the model.
    pub fn to_model_input(&self) -> Vec<f32> {
        self.values.iter().map(|&v| v as f32).collect()
    }
}

/// Assembles raw inputs into `FeatureRecord`s for one schema variant.
///
/// Pure with respect to its inputs: same reading, same record.
#[derive(Debug, Clone)]
pub struct FeatureAssembler {
    schema: FeatureSchema,
}

impl FeatureAssembler {
    pub fn new(schema: FeatureSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Validate and order a raw reading into a feature record.
    ///
    /// Contextual fields absent from the reading default to 0.0; this is a
    /// deliberate approximation carried over from the trained deployment
    /// and is surfaced with a warning rather than hidden.
    pub fn assemble(&self, reading: &RawReading) -> Result<FeatureRecord, AssemblyError> {
        let supplied = self.validate_keys(reading)?;

        let mut defaulted: Vec<&'static str> = Vec::new();
        let mut values = Vec::with_capacity(self.schema.len());

        for &field in self.schema.fields() {
            let value = match field.kind() {
                FieldKind::Direct => *supplied
                    .get(&field)
                    .ok_or(AssemblyError::MissingField(field.name()))?,
                FieldKind::Contextual => match supplied.get(&field) {
                    Some(&v) => v,
                    None => {
                        defaulted.push(field.name());
                        0.0
                    }
                },
                FieldKind::Derived => derive(field, &supplied)?,
            };
            values.push(value);
        }

        if !defaulted.is_empty() {
            warn!(
                fields = ?defaulted,
                "rolling context unavailable, defaulting to 0.0"
            );
        }

        Ok(FeatureRecord {
            schema: self.schema.name().to_string(),
            values,
        })
    }

    /// Check every supplied key against the catalog and this schema, and
    /// validate values against their declared domains.
    fn validate_keys(
        &self,
        reading: &RawReading,
    ) -> Result<HashMap<FeatureField, f64>, AssemblyError> {
        let mut supplied = HashMap::with_capacity(reading.len());

        for key in reading.keys() {
            let field = FeatureField::from_name(key)
                .ok_or_else(|| AssemblyError::UnknownField(key.to_string()))?;

            if field.kind() == FieldKind::Derived {
                return Err(AssemblyError::DerivedFieldSupplied(field.name()));
            }
            if !self.schema.contains(field) {
                return Err(AssemblyError::NotInSchema {
                    field: field.name(),
                    schema: self.schema.name().to_string(),
                });
            }

            let value = reading.get(key).unwrap_or_default();
            check_domain(field, value)?;
            supplied.insert(field, value);
        }

        Ok(supplied)
    }
}

fn check_domain(field: FeatureField, value: f64) -> Result<(), AssemblyError> {
    let domain = field.domain();
    if !value.is_finite() || !domain.contains(value) {
        return Err(AssemblyError::OutOfDomain {
            field: field.name(),
            value,
            min: domain.min,
            max: domain.max,
        });
    }
    if domain.integer && value.fract() != 0.0 {
        return Err(AssemblyError::NotAnInteger {
            field: field.name(),
            value,
        });
    }
    Ok(())
}

/// Derived fields are pure functions of the other fields in the record.
fn derive(
    field: FeatureField,
    supplied: &HashMap<FeatureField, f64>,
) -> Result<f64, AssemblyError> {
    let input = |f: FeatureField| {
        supplied
            .get(&f)
            .copied()
            .ok_or(AssemblyError::MissingField(f.name()))
    };

    match field {
        FeatureField::IsWeekend => {
            let day = input(FeatureField::DayOfWeek)?;
            Ok(if day >= 5.0 { 1.0 } else { 0.0 })
        }
        FeatureField::SubMeteringTotal => Ok(input(FeatureField::SubMetering1)?
            + input(FeatureField::SubMetering2)?
            + input(FeatureField::SubMetering3)?),
        // kind() routes only derived fields here
        _ => unreachable!("field `{}` is not derived", field.name()),
    }
}
