use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::issues::Issues;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("input model {0} does not exist")]
    MissingInput(PathBuf),
    #[error("output directory {0} does not exist")]
    MissingOutputDir(PathBuf),
    #[error("cannot read {path}")]
    ReadInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("model is invalid ({} errors)", .0.error_count())]
    ValidationFailed(Issues),
    #[error("model analysis failed ({} errors)", .0.error_count())]
    AnalysisFailed(Issues),
    #[error(transparent)]
    Output(#[from] anyhow::Error),
}

impl ConvertError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            ConvertError::MissingInput(_) => 1,
            ConvertError::MissingOutputDir(_) => 2,
            ConvertError::ValidationFailed(_) => 3,
            ConvertError::AnalysisFailed(_) => 4,
            ConvertError::ReadInput { .. } | ConvertError::Output(_) => 5,
        }
    }

    pub fn issues(&self) -> Option<&Issues> {
        match self {
            ConvertError::ValidationFailed(issues) | ConvertError::AnalysisFailed(issues) => {
                Some(issues)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::ConvertError;
    use crate::issues::Issues;

    #[test]
    fn exit_codes() {
        let mut issues = Issues::new();
        issues.error("Model does not have a valid name attribute.".to_string());
        let cases = [
            (ConvertError::MissingInput(PathBuf::from("in.cellml")), 1),
            (ConvertError::MissingOutputDir(PathBuf::from("out")), 2),
            (ConvertError::ValidationFailed(issues.clone()), 3),
            (ConvertError::AnalysisFailed(issues.clone()), 4),
            (ConvertError::Output(anyhow::anyhow!("disk full")), 5),
        ];
        for (err, code) in cases {
            assert_eq!(err.exit_code(), code, "{err}");
        }
        let err = ConvertError::ValidationFailed(issues);
        assert_eq!(err.to_string(), "model is invalid (1 errors)");
        assert_eq!(err.issues().unwrap().error_count(), 1);
        assert!(ConvertError::MissingInput(PathBuf::new()).issues().is_none());
    }
}
