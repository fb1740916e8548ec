//! Historical sample ingestion and actual-vs-predicted reporting
//!
//! Loads a read-only CSV of past readings with recorded target values,
//! runs the model over them as one batch, and exposes the series the
//! comparison charts are built from. Loaded once and held for the process
//! lifetime; nothing here mutates after load.

use crate::error::{AssemblyError, PredictionError};
use crate::features::{FeatureAssembler, FeatureRecord, RawReading};
use crate::predictor::PowerPredictor;
use crate::schema::{FeatureField, FeatureSchema};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Default number of comparison pairs exposed for display.
pub const DEFAULT_COMPARISON_LIMIT: usize = 1000;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to read historical sample: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

/// One past reading with its recorded target value.
///
/// Column names match the sample CSV; columns the assembler derives
/// itself (is_weekend, sub_metering_total) are ignored if present.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoricalRow {
    #[serde(rename = "Global_active_power")]
    pub global_active_power: f64,
    #[serde(rename = "Global_reactive_power")]
    pub global_reactive_power: f64,
    #[serde(rename = "Voltage")]
    pub voltage: f64,
    #[serde(rename = "Global_intensity")]
    pub global_intensity: f64,
    #[serde(rename = "Sub_metering_1")]
    pub sub_metering_1: f64,
    #[serde(rename = "Sub_metering_2")]
    pub sub_metering_2: f64,
    #[serde(rename = "Sub_metering_3")]
    pub sub_metering_3: f64,
    pub hour: u32,
    pub day_of_week: u32,
    pub month: u32,
    #[serde(rename = "GAP_rolling_mean_60", default)]
    pub gap_rolling_mean_60: Option<f64>,
    #[serde(rename = "GAP_rolling_mean_120", default)]
    pub gap_rolling_mean_120: Option<f64>,
    #[serde(rename = "GAP_diff_1", default)]
    pub gap_diff_1: Option<f64>,
    #[serde(rename = "GAP_diff_60", default)]
    pub gap_diff_60: Option<f64>,
}

impl HistoricalRow {
    /// Raw input for the given schema. Contextual columns are passed along
    /// only when the schema carries them.
    pub fn to_reading(&self, schema: &FeatureSchema) -> RawReading {
        let mut reading = RawReading::new()
            .with(FeatureField::GlobalReactivePower, self.global_reactive_power)
            .with(FeatureField::Voltage, self.voltage)
            .with(FeatureField::GlobalIntensity, self.global_intensity)
            .with(FeatureField::SubMetering1, self.sub_metering_1)
            .with(FeatureField::SubMetering2, self.sub_metering_2)
            .with(FeatureField::SubMetering3, self.sub_metering_3)
            .with(FeatureField::Hour, self.hour as f64)
            .with(FeatureField::DayOfWeek, self.day_of_week as f64)
            .with(FeatureField::Month, self.month as f64);

        let contextual = [
            (FeatureField::GapRollingMean60, self.gap_rolling_mean_60),
            (FeatureField::GapRollingMean120, self.gap_rolling_mean_120),
            (FeatureField::GapDiff1, self.gap_diff_1),
            (FeatureField::GapDiff60, self.gap_diff_60),
        ];
        for (field, value) in contextual {
            if let Some(v) = value {
                if schema.contains(field) {
                    reading = reading.with(field, v);
                }
            }
        }

        reading
    }
}

/// An actual/predicted pair, positionally matched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonPoint {
    pub index: usize,
    pub actual_kw: f64,
    pub predicted_kw: f64,
}

/// Mean actual and predicted consumption for one hour of the day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyMean {
    pub hour: u32,
    pub mean_actual_kw: f64,
    pub mean_predicted_kw: f64,
    pub samples: usize,
}

/// One bin of the target-value histogram.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower_kw: f64,
    pub upper_kw: f64,
    pub count: usize,
}

/// Read-only table of past readings, loaded once.
pub struct HistoricalSample {
    rows: Vec<HistoricalRow>,
}

impl HistoricalSample {
    pub fn from_rows(rows: Vec<HistoricalRow>) -> Self {
        Self { rows }
    }

    pub fn from_csv_path(path: &Path) -> Result<Self, HistoryError> {
        let mut reader = csv::Reader::from_path(path)?;
        let rows: Vec<HistoricalRow> = reader.deserialize().collect::<Result<_, _>>()?;
        info!(rows = rows.len(), path = %path.display(), "historical sample loaded");
        Ok(Self { rows })
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, HistoryError> {
        let mut reader = csv::Reader::from_reader(reader);
        let rows: Vec<HistoricalRow> = reader.deserialize().collect::<Result<_, _>>()?;
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[HistoricalRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Predict the first `limit` rows in one batch and pair each result
    /// with its recorded actual value.
    pub fn comparison(
        &self,
        predictor: &dyn PowerPredictor,
        assembler: &FeatureAssembler,
        limit: usize,
    ) -> Result<Vec<ComparisonPoint>, HistoryError> {
        let take = self.rows.len().min(limit);
        let records = self.assemble_rows(assembler, take)?;
        let predicted = predictor.predict_batch(&records)?;

        Ok(self.rows[..take]
            .iter()
            .zip(predicted)
            .enumerate()
            .map(|(index, (row, predicted_kw))| ComparisonPoint {
                index,
                actual_kw: row.global_active_power,
                predicted_kw,
            })
            .collect())
    }

    /// Mean actual and predicted consumption grouped by hour of day.
    pub fn mean_by_hour(
        &self,
        predictor: &dyn PowerPredictor,
        assembler: &FeatureAssembler,
    ) -> Result<Vec<HourlyMean>, HistoryError> {
        let records = self.assemble_rows(assembler, self.rows.len())?;
        let predicted = predictor.predict_batch(&records)?;

        let mut sums = [(0.0f64, 0.0f64, 0usize); 24];
        for (row, predicted_kw) in self.rows.iter().zip(predicted) {
            let slot = &mut sums[(row.hour as usize).min(23)];
            slot.0 += row.global_active_power;
            slot.1 += predicted_kw;
            slot.2 += 1;
        }

        Ok(sums
            .iter()
            .enumerate()
            .filter(|(_, (_, _, n))| *n > 0)
            .map(|(hour, (actual, predicted, n))| HourlyMean {
                hour: hour as u32,
                mean_actual_kw: actual / *n as f64,
                mean_predicted_kw: predicted / *n as f64,
                samples: *n,
            })
            .collect())
    }

    /// Equal-width histogram of the recorded target values.
    pub fn histogram(&self, bins: usize) -> Vec<HistogramBin> {
        if self.rows.is_empty() || bins == 0 {
            return Vec::new();
        }

        let values: Vec<f64> = self.rows.iter().map(|r| r.global_active_power).collect();
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let width = (max - min) / bins as f64;

        if width == 0.0 {
            // all values identical
            return vec![HistogramBin {
                lower_kw: min,
                upper_kw: max,
                count: values.len(),
            }];
        }

        let mut counts = vec![0usize; bins];
        for v in &values {
            let idx = (((v - min) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }

        counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                lower_kw: min + width * i as f64,
                upper_kw: min + width * (i + 1) as f64,
                count,
            })
            .collect()
    }

    fn assemble_rows(
        &self,
        assembler: &FeatureAssembler,
        take: usize,
    ) -> Result<Vec<FeatureRecord>, HistoryError> {
        self.rows[..take]
            .iter()
            .map(|row| {
                assembler
                    .assemble(&row.to_reading(assembler.schema()))
                    .map_err(HistoryError::from)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::check_schema;

    const SAMPLE_CSV: &str = "\
Global_active_power,Global_reactive_power,Voltage,Global_intensity,Sub_metering_1,Sub_metering_2,Sub_metering_3,hour,day_of_week,month,is_weekend,GAP_rolling_mean_60,GAP_rolling_mean_120,GAP_diff_1,GAP_diff_60,sub_metering_total
1.2,0.1,235.0,10.0,10,10,10,12,0,1,0,1.1,1.0,0.0,0.1,30
2.4,0.2,240.0,12.0,5,5,20,18,5,6,1,2.0,1.8,0.1,-0.2,30
0.8,0.05,230.0,6.0,0,0,15,3,2,11,0,0.7,0.9,-0.1,0.0,15
";

    /// Predicts 1/100 of the record sum; deterministic and order-sensitive.
    struct SumStub {
        schema: FeatureSchema,
    }

    impl PowerPredictor for SumStub {
        fn schema(&self) -> &FeatureSchema {
            &self.schema
        }

        fn model_version(&self) -> &str {
            "stub"
        }

        fn predict(&self, record: &FeatureRecord) -> Result<f64, PredictionError> {
            check_schema(&self.schema, record)?;
            Ok(record.values().iter().sum::<f64>() / 100.0)
        }
    }

    fn sample() -> HistoricalSample {
        HistoricalSample::from_reader(SAMPLE_CSV.as_bytes()).unwrap()
    }

    #[test]
    fn test_csv_parsing_ignores_derived_columns() {
        let sample = sample();
        assert_eq!(sample.len(), 3);
        assert_eq!(sample.rows()[0].global_active_power, 1.2);
        assert_eq!(sample.rows()[1].hour, 18);
        assert_eq!(sample.rows()[2].gap_rolling_mean_60, Some(0.7));
    }

    #[test]
    fn test_comparison_pairs_actuals_positionally() {
        let sample = sample();
        let assembler = FeatureAssembler::new(FeatureSchema::full());
        let stub = SumStub { schema: FeatureSchema::full() };

        let points = sample.comparison(&stub, &assembler, 10).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].actual_kw, 1.2);
        assert_eq!(points[1].actual_kw, 2.4);
        assert_eq!(points[2].actual_kw, 0.8);
        assert_eq!(points[0].index, 0);
        assert_eq!(points[2].index, 2);
    }

    #[test]
    fn test_comparison_truncates_to_limit() {
        let sample = sample();
        let assembler = FeatureAssembler::new(FeatureSchema::full());
        let stub = SumStub { schema: FeatureSchema::full() };

        let points = sample.comparison(&stub, &assembler, 2).unwrap();
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn test_comparison_batch_matches_individual() {
        let sample = sample();
        let assembler = FeatureAssembler::new(FeatureSchema::full());
        let stub = SumStub { schema: FeatureSchema::full() };

        let points = sample.comparison(&stub, &assembler, 10).unwrap();
        for (row, point) in sample.rows().iter().zip(&points) {
            let record = assembler.assemble(&row.to_reading(assembler.schema())).unwrap();
            assert_eq!(stub.predict(&record).unwrap(), point.predicted_kw);
        }
    }

    #[test]
    fn test_comparison_with_compact_schema() {
        let sample = sample();
        let assembler = FeatureAssembler::new(FeatureSchema::compact());
        let stub = SumStub { schema: FeatureSchema::compact() };

        // rows carry rolling columns; compact schema must not receive them
        let points = sample.comparison(&stub, &assembler, 10).unwrap();
        assert_eq!(points.len(), 3);
    }

    #[test]
    fn test_mean_by_hour_groups_rows() {
        let sample = sample();
        let assembler = FeatureAssembler::new(FeatureSchema::full());
        let stub = SumStub { schema: FeatureSchema::full() };

        let hourly = sample.mean_by_hour(&stub, &assembler).unwrap();
        assert_eq!(hourly.len(), 3); // hours 3, 12, 18
        assert_eq!(hourly[0].hour, 3);
        assert_eq!(hourly[1].hour, 12);
        assert_eq!(hourly[2].hour, 18);
        assert_eq!(hourly[1].mean_actual_kw, 1.2);
        assert_eq!(hourly[1].samples, 1);
    }

    #[test]
    fn test_histogram_covers_value_range() {
        let sample = sample();
        let bins = sample.histogram(4);

        assert_eq!(bins.len(), 4);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 3);
        assert_eq!(bins[0].lower_kw, 0.8);
        assert!((bins[3].upper_kw - 2.4).abs() < 1e-9);
    }

    #[test]
    fn test_histogram_empty_and_degenerate() {
        let empty = HistoricalSample::from_rows(Vec::new());
        assert!(empty.histogram(10).is_empty());
        assert!(sample().histogram(0).is_empty());
    }

    #[test]
    fn test_missing_contextual_columns_parse_as_none() {
        let csv = "\
Global_active_power,Global_reactive_power,Voltage,Global_intensity,Sub_metering_1,Sub_metering_2,Sub_metering_3,hour,day_of_week,month
1.0,0.1,235.0,10.0,1,2,3,8,6,3
";
        let sample = HistoricalSample::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(sample.rows()[0].gap_rolling_mean_60, None);

        // and the full-schema assembler defaults them to zero
        let assembler = FeatureAssembler::new(FeatureSchema::full());
        let stub = SumStub { schema: FeatureSchema::full() };
        let points = sample.comparison(&stub, &assembler, 1).unwrap();
        assert_eq!(points.len(), 1);
    }
}
