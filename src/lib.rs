pub mod analyser;
pub mod ast;
pub mod convert;
pub mod error;
pub mod issues;
pub mod legacy;
pub mod model;
pub mod output;
pub mod parser;
pub mod records;
pub mod toolkit;
pub mod units;
pub mod utils;
pub mod validator;

use std::path::Path;

pub use analyser::{AnalysedModel, AnalysedVariable, Analyser, VariableType};
pub use convert::{Conversion, ConvertOptions, Converter};
pub use error::ConvertError;
pub use issues::{Issue, Issues, Level};
pub use model::Model;
pub use parser::Parser;
pub use toolkit::{CellmlToolkit, EditableModel, ModelToolkit};
pub use validator::Validator;

/// Converts `input` with the default options, writing both files into `output_dir`.
pub fn convert(input: &Path, output_dir: &Path) -> Result<Conversion, ConvertError> {
    Converter::new(ConvertOptions::default()).convert(input, output_dir)
}
