//! JSON output formatting

use cadenza_core::FeatureVector;
use serde::Serialize;

/// Single-line result envelope printed by `czanalyze`
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AnalysisOutput {
    Success {
        success: bool,
        features: FeatureVector,
    },
    Failure {
        success: bool,
        error: String,
    },
}

impl AnalysisOutput {
    pub fn from_result(result: anyhow::Result<FeatureVector>) -> Self {
        match result {
            Ok(features) => AnalysisOutput::Success {
                success: true,
                features,
            },
            Err(e) => AnalysisOutput::failure(format!("{:#}", e)),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        AnalysisOutput::Failure {
            success: false,
            error: error.into(),
        }
    }

    pub fn usage(program: &str) -> Self {
        Self::failure(format!("Usage: {} <audio_file_path>", program))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisOutput::Success { .. })
    }
}

/// Print `value` as one line of JSON on stdout
pub fn print_json_line<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => println!("{}", json),
        Err(e) => println!(
            "{{\"success\":false,\"error\":\"Error serializing result: {}\"}}",
            e.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        ),
    }
}
