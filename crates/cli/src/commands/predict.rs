//! Prediction command

use anyhow::Result;
use clap::Args;
use serde_json::{json, Map, Value};

use crate::client::{ApiClient, PredictResponse};
use crate::output::{print_success, OutputFormat};

/// Household reading for one prediction request.
///
/// Field bounds are enforced server-side; out-of-range values come back
/// as a descriptive error naming the field.
#[derive(Debug, Args)]
pub struct PredictArgs {
    /// Reactive power (kW)
    #[arg(long, value_name = "KW")]
    pub global_reactive_power: f64,

    /// Voltage (V)
    #[arg(long, value_name = "V")]
    pub voltage: f64,

    /// Global intensity (A)
    #[arg(long, value_name = "A")]
    pub global_intensity: f64,

    /// Kitchen sub-meter reading (Wh)
    #[arg(long, value_name = "WH")]
    pub sub_metering_1: f64,

    /// Laundry sub-meter reading (Wh)
    #[arg(long, value_name = "WH")]
    pub sub_metering_2: f64,

    /// Water-heater/AC sub-meter reading (Wh)
    #[arg(long, value_name = "WH")]
    pub sub_metering_3: f64,

    /// Hour of day (0-23)
    #[arg(long)]
    pub hour: u8,

    /// Day of week (0=Monday .. 6=Sunday)
    #[arg(long)]
    pub day_of_week: u8,

    /// Month (1-12)
    #[arg(long)]
    pub month: u8,

    /// 60-minute rolling mean of active power (kW); 0 when omitted
    #[arg(long, value_name = "KW")]
    pub gap_rolling_mean_60: Option<f64>,

    /// 120-minute rolling mean of active power (kW); 0 when omitted
    #[arg(long, value_name = "KW")]
    pub gap_rolling_mean_120: Option<f64>,

    /// 1-minute first difference of active power (kW); 0 when omitted
    #[arg(long, value_name = "KW")]
    pub gap_diff_1: Option<f64>,

    /// 60-minute first difference of active power (kW); 0 when omitted
    #[arg(long, value_name = "KW")]
    pub gap_diff_60: Option<f64>,
}

impl PredictArgs {
    /// Wire representation keyed by dataset column name.
    fn to_reading(&self) -> Value {
        let mut reading = Map::new();
        reading.insert("Global_reactive_power".into(), json!(self.global_reactive_power));
        reading.insert("Voltage".into(), json!(self.voltage));
        reading.insert("Global_intensity".into(), json!(self.global_intensity));
        reading.insert("Sub_metering_1".into(), json!(self.sub_metering_1));
        reading.insert("Sub_metering_2".into(), json!(self.sub_metering_2));
        reading.insert("Sub_metering_3".into(), json!(self.sub_metering_3));
        reading.insert("hour".into(), json!(self.hour as f64));
        reading.insert("day_of_week".into(), json!(self.day_of_week as f64));
        reading.insert("month".into(), json!(self.month as f64));

        let contextual = [
            ("GAP_rolling_mean_60", self.gap_rolling_mean_60),
            ("GAP_rolling_mean_120", self.gap_rolling_mean_120),
            ("GAP_diff_1", self.gap_diff_1),
            ("GAP_diff_60", self.gap_diff_60),
        ];
        for (name, value) in contextual {
            if let Some(v) = value {
                reading.insert(name.into(), json!(v));
            }
        }

        Value::Object(reading)
    }
}

pub async fn run(client: &ApiClient, args: PredictArgs, format: OutputFormat) -> Result<()> {
    let response: PredictResponse = client.post("api/v1/predict", &args.to_reading()).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Table => {
            print_success(&format!(
                "Predicted global active power: {} kW",
                response.display
            ));
            println!("Model: {} (schema {})", response.model_version, response.schema);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> PredictArgs {
        PredictArgs {
            global_reactive_power: 0.1,
            voltage: 235.0,
            global_intensity: 10.0,
            sub_metering_1: 10.0,
            sub_metering_2: 10.0,
            sub_metering_3: 10.0,
            hour: 12,
            day_of_week: 0,
            month: 1,
            gap_rolling_mean_60: None,
            gap_rolling_mean_120: None,
            gap_diff_1: None,
            gap_diff_60: None,
        }
    }

    #[test]
    fn test_reading_uses_dataset_column_names() {
        let reading = args().to_reading();
        let object = reading.as_object().unwrap();

        assert_eq!(object["Global_reactive_power"], 0.1);
        assert_eq!(object["Voltage"], 235.0);
        assert_eq!(object["hour"], 12.0);
        // derived fields are never sent
        assert!(!object.contains_key("is_weekend"));
        assert!(!object.contains_key("sub_metering_total"));
        // omitted contextual fields are left to the server default
        assert!(!object.contains_key("GAP_rolling_mean_60"));
    }

    #[test]
    fn test_supplied_contextual_fields_are_sent() {
        let mut predict_args = args();
        predict_args.gap_rolling_mean_60 = Some(1.5);

        let reading = predict_args.to_reading();
        assert_eq!(reading.as_object().unwrap()["GAP_rolling_mean_60"], 1.5);
    }
}
