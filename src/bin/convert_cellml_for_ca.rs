use std::path::PathBuf;
use std::process::ExitCode;

use cellml_ca::{convert, ConvertError};
use clap::Parser;
use log::error;

/// Converts a CellML model into a Circulatory Autogen module
#[derive(Parser, Debug)]
#[command(name = "convert_cellml_for_ca", about, long_about = None)]
struct Args {
    /// CellML model to convert
    #[arg(short, long)]
    input_model: PathBuf,

    /// Output directory for the converted model data
    #[arg(short, long)]
    output_dir: PathBuf,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    match convert(&args.input_model, &args.output_dir) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            match err {
                ConvertError::ValidationFailed(issues) | ConvertError::AnalysisFailed(issues) => {
                    print!("{}", issues.report());
                }
                err => error!("{:#}", anyhow::Error::new(err)),
            }
            ExitCode::from(code)
        }
    }
}
