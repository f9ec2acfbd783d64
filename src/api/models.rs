use serde::{Deserialize, Serialize};

/// Body of `POST /summarize`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummarizeRequest {
    #[serde(default)]
    pub text: String,
    /// Signed so that out-of-range values are reported rather than rejected by the parser
    pub max_length: Option<i64>,
    pub min_length: Option<i64>,
    pub num_beams: Option<i64>,
}

/// Body of `POST /api/validate`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidateRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub word_count: usize,
    /// Rough estimate in seconds, one per thousand characters
    pub estimated_processing_time: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct LanguageInfo {
    pub code: String,
    pub name: String,
    /// Whether requests in this language go through translation
    pub translated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LimitsInfo {
    pub input_max_length: usize,
    pub default_max_length: usize,
    pub default_min_length: usize,
    pub default_num_beams: u32,
    pub max_length_range: [i64; 2],
    pub min_length_floor: i64,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub model: String,
    pub languages: Vec<LanguageInfo>,
    pub limits: LimitsInfo,
}
