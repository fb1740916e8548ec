//! Schema inspection command

use anyhow::Result;
use tabled::Tabled;

use crate::client::{ApiClient, SchemaResponse};
use crate::output::{print_table, OutputFormat};

#[derive(Tabled, serde::Serialize)]
struct FieldRow {
    #[tabled(rename = "Field")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Min")]
    min: String,
    #[tabled(rename = "Max")]
    max: String,
    #[tabled(rename = "Type")]
    value_type: String,
}

/// Show the active feature schema with per-field bounds.
pub async fn run(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let schema: SchemaResponse = client.get("api/v1/schema").await?;

    let rows: Vec<FieldRow> = schema
        .fields
        .iter()
        .map(|f| FieldRow {
            name: f.name.clone(),
            kind: f.kind.clone(),
            min: format!("{}", f.min),
            max: format!("{}", f.max),
            value_type: if f.integer { "int" } else { "float" }.to_string(),
        })
        .collect();

    if matches!(format, OutputFormat::Table) {
        println!("Schema: {} ({} fields)", schema.name, schema.fields.len());
    }
    print_table(&rows, format);

    Ok(())
}
