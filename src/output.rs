use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use serde_json::Value;

use crate::records::VariableRecord;

pub fn module_filename(module_type: &str) -> String {
    format!("{module_type}_modules.cellml")
}

pub fn parameters_filename(module_type: &str) -> String {
    format!("{module_type}_parameters.csv")
}

/// Module descriptor read by the assembly tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleConfig {
    pub vessel_type: String,
    #[serde(rename = "BC_type")]
    pub bc_type: String,
    pub module_format: String,
    pub module_file: String,
    pub module_type: String,
    pub entrance_ports: Vec<Value>,
    pub exit_ports: Vec<Value>,
    pub variables_and_units: Vec<[String; 4]>,
}

impl ModuleConfig {
    pub fn new(records: &[VariableRecord], vessel_type: &str, bc_type: &str, module_type: &str) -> Self {
        Self {
            vessel_type: vessel_type.to_string(),
            bc_type: bc_type.to_string(),
            module_format: "cellml".to_string(),
            module_file: module_filename(module_type),
            module_type: module_type.to_string(),
            entrance_ports: Vec::new(),
            exit_ports: Vec::new(),
            variables_and_units: records
                .iter()
                .map(|r| {
                    [
                        r.name.clone(),
                        r.units.clone(),
                        "access".to_string(),
                        r.role.as_str().to_string(),
                    ]
                })
                .collect(),
        }
    }
}

/// Writes `config` as a one-element JSON list and returns the file written.
pub fn write_module_config(output_dir: &Path, config: &ModuleConfig) -> Result<PathBuf> {
    let path = output_dir.join(&config.module_file);
    let file = File::create(&path).with_context(|| format!("cannot create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &[config])
        .with_context(|| format!("cannot write {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("cannot write {}", path.display()))?;
    Ok(path)
}

/// Writes one row per record, names suffixed with the module type.
pub fn write_parameters_csv(
    output_dir: &Path,
    records: &[VariableRecord],
    module_type: &str,
) -> Result<PathBuf> {
    let path = output_dir.join(parameters_filename(module_type));
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(&path)
        .with_context(|| format!("cannot create {}", path.display()))?;
    writer.write_record(["variable_name", "units", "value", "data_reference"])?;
    for record in records {
        writer.write_record([
            format!("{}_{module_type}", record.name).as_str(),
            record.units.as_str(),
            record.initial_value.as_str(),
            "user_defined",
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("cannot write {}", path.display()))?;
    Ok(path)
}
