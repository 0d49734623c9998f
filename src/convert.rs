use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::error::ConvertError;
use crate::issues::{Issues, Level};
use crate::legacy::apply_legacy_patches;
use crate::output::{write_module_config, write_parameters_csv, ModuleConfig};
use crate::records::{collect_records, VariableRecord};
use crate::toolkit::{CellmlToolkit, EditableModel, ModelToolkit};

/// Names written into the generated module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    pub module_type: String,
    pub vessel_type: String,
    pub bc_type: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            module_type: "NKE_pump".to_string(),
            vessel_type: "NKE_pump".to_string(),
            bc_type: "nn".to_string(),
        }
    }
}

/// What a successful conversion produced.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub module_config: PathBuf,
    pub parameters: PathBuf,
    pub records: Vec<VariableRecord>,
}

/// Turns a CellML file into a module descriptor and a parameters table.
#[derive(Debug, Default)]
pub struct Converter<T: ModelToolkit = CellmlToolkit> {
    options: ConvertOptions,
    toolkit: T,
}

impl Converter<CellmlToolkit> {
    pub fn new(options: ConvertOptions) -> Self {
        Self::with_toolkit(options, CellmlToolkit)
    }
}

fn log_issues(stage: &str, issues: &Issues) {
    for issue in issues.iter() {
        match issue.level() {
            Level::Error | Level::Warning => warn!("{stage}: {}", issue.description()),
            Level::Message => info!("{stage}: {}", issue.description()),
        }
    }
}

impl<T: ModelToolkit> Converter<T> {
    pub fn with_toolkit(options: ConvertOptions, toolkit: T) -> Self {
        Self { options, toolkit }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    pub fn toolkit(&self) -> &T {
        &self.toolkit
    }

    pub fn convert(&self, input: &Path, output_dir: &Path) -> Result<Conversion, ConvertError> {
        if !input.is_file() {
            return Err(ConvertError::MissingInput(input.to_path_buf()));
        }
        if !output_dir.is_dir() {
            return Err(ConvertError::MissingOutputDir(output_dir.to_path_buf()));
        }
        let text = fs::read_to_string(input).map_err(|source| ConvertError::ReadInput {
            path: input.to_path_buf(),
            source,
        })?;

        let (mut model, issues) = self.toolkit.parse_model(&text);
        debug!("parsed model '{}' from {}", model.name(), input.display());
        log_issues("parser", &issues);

        apply_legacy_patches(input, &mut model);

        let issues = self.toolkit.validate_model(&model);
        if issues.has_errors() {
            return Err(ConvertError::ValidationFailed(issues));
        }

        let analysed = self
            .toolkit
            .analyse_model(&model)
            .map_err(ConvertError::AnalysisFailed)?;
        log_issues("analyser", analysed.issues());

        let records = collect_records(&analysed);
        debug!(
            "keeping {} of {} analysed variables",
            records.len(),
            analysed.variable_count()
        );

        let ConvertOptions {
            module_type,
            vessel_type,
            bc_type,
        } = &self.options;
        let config = ModuleConfig::new(&records, vessel_type, bc_type, module_type);
        let module_config = write_module_config(output_dir, &config)?;
        let parameters = write_parameters_csv(output_dir, &records, module_type)?;
        info!(
            "wrote {} and {}",
            module_config.display(),
            parameters.display()
        );
        Ok(Conversion {
            module_config,
            parameters,
            records,
        })
    }
}
