use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::RfpError;

// ---------------------------------------------------------------------------
// Confidence
// ---------------------------------------------------------------------------

/// Qualitative rating attached to a suggested response.
///
/// Anything other than `high`, `medium` or `low` is kept verbatim as
/// `Unrecognized` so that a stray value in the input never aborts a render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Confidence {
    High,
    Medium,
    Low,
    Unrecognized(String),
}

impl Confidence {
    /// The lowercase wire name (`"high"`, ...) or the raw unrecognized text.
    pub fn as_str(&self) -> &str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
            Confidence::Unrecognized(raw) => raw.as_str(),
        }
    }
}

impl From<String> for Confidence {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "high" => Confidence::High,
            "medium" => Confidence::Medium,
            "low" => Confidence::Low,
            _ => Confidence::Unrecognized(s),
        }
    }
}

impl From<Confidence> for String {
    fn from(c: Confidence) -> Self {
        c.as_str().to_string()
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AnalysisResult
// ---------------------------------------------------------------------------

/// A drafted answer to a single RFP requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedResponse {
    pub requirement: String,
    pub response: String,
    pub confidence: Confidence,
}

/// The structured analysis of one RFP. The input of every reporter.
///
/// String fields are required on the wire; sequence fields default to empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub executive_summary: String,
    #[serde(default)]
    pub key_requirements: Vec<String>,
    #[serde(default, rename = "d365Advantages")]
    pub d365_advantages: Vec<String>,
    #[serde(default)]
    pub competitive_insights: Vec<String>,
    #[serde(default)]
    pub suggested_responses: Vec<SuggestedResponse>,
    pub architecture_recommendations: String,
    pub implementation_timeline: String,
    pub risk_assessment: String,
}

impl AnalysisResult {
    /// Parses an analysis result from its JSON wire form.
    ///
    /// A missing string field is reported by name, e.g.
    /// ``Input error: missing field `riskAssessment` at line 1 column 2``.
    pub fn from_json(input: &str) -> Result<Self, RfpError> {
        serde_json::from_str(input).map_err(|e| RfpError::Input(e.to_string()))
    }

    /// Reads and parses an analysis result file.
    pub fn from_path(path: &Path) -> Result<Self, RfpError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RfpError::Input(format!("Cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| RfpError::Input(format!("{}: {e}", path.display())))
    }
}

// ---------------------------------------------------------------------------
// CustomerContext
// ---------------------------------------------------------------------------

/// Customer background supplied alongside the RFP document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerContext {
    pub current_erp: String,
    pub industry: String,
    pub region: String,
    #[serde(default)]
    pub pain_points: String,
    #[serde(default)]
    pub company_size: String,
    #[serde(default)]
    pub additional_context: String,
}

impl CustomerContext {
    /// Names of required fields that are blank, in form order.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.current_erp.trim().is_empty() {
            missing.push("currentErp");
        }
        if self.industry.trim().is_empty() {
            missing.push("industry");
        }
        if self.region.trim().is_empty() {
            missing.push("region");
        }
        missing
    }
}

// ---------------------------------------------------------------------------
// RfpDocument
// ---------------------------------------------------------------------------

/// File formats accepted as RFP documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Xlsx,
    Xls,
    Pptx,
    Ppt,
}

impl DocumentKind {
    /// Maps a file extension (case-insensitive, without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "xlsx" => Some(DocumentKind::Xlsx),
            "xls" => Some(DocumentKind::Xls),
            "pptx" => Some(DocumentKind::Pptx),
            "ppt" => Some(DocumentKind::Ppt),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            DocumentKind::Xls => "application/vnd.ms-excel",
            DocumentKind::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            DocumentKind::Ppt => "application/vnd.ms-powerpoint",
        }
    }
}

/// An uploaded RFP document. Only metadata is kept; contents are never parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RfpDocument {
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: u64,
    pub kind: DocumentKind,
}

impl RfpDocument {
    /// Builds a document descriptor from explicit metadata, validating the kind.
    pub fn new(path: PathBuf, size_bytes: u64) -> Result<Self, RfpError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| RfpError::Input(format!("{} is not a file", path.display())))?;
        let kind = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(DocumentKind::from_extension)
            .ok_or_else(|| {
                RfpError::Input(format!(
                    "Unsupported document '{file_name}': expected .pdf, .xlsx, .xls, .pptx, or .ppt"
                ))
            })?;
        Ok(RfpDocument {
            path,
            file_name,
            size_bytes,
            kind,
        })
    }

    /// Stats a file on disk and builds its descriptor.
    pub fn open(path: &Path) -> Result<Self, RfpError> {
        let meta = std::fs::metadata(path).map_err(|e| {
            RfpError::Input(format!("Cannot read {}: {}", path.display(), e))
        })?;
        if !meta.is_file() {
            return Err(RfpError::Input(format!("{} is not a file", path.display())));
        }
        Self::new(path.to_path_buf(), meta.len())
    }
}

/// Human-readable byte count: `0 Bytes`, `512 Bytes`, `1.5 KB`, `2.34 MB`.
///
/// Binary multiples, at most two decimals, trailing zeros dropped.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut idx = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && idx < UNITS.len() - 1 {
        value /= 1024.0;
        idx += 1;
    }
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[idx])
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of "now". Injected wherever output depends on the current time.
pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

/// Wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Reporter trait
// ---------------------------------------------------------------------------

/// The pluggable interface for output formats.
pub trait Reporter {
    fn format_name(&self) -> &str;

    /// Renders `result` to a string without touching the filesystem.
    fn render(
        &self,
        result: &AnalysisResult,
        config: &crate::config::ReportConfig,
        clock: &dyn Clock,
    ) -> Result<String, RfpError>;

    /// Renders and writes to `config.output_path`, or stdout when unset.
    fn report(
        &self,
        result: &AnalysisResult,
        config: &crate::config::ReportConfig,
        clock: &dyn Clock,
    ) -> Result<(), RfpError> {
        let rendered = self.render(result, config, clock)?;
        match &config.output_path {
            Some(path) => crate::reporting::write_to_file(path, rendered.as_bytes()),
            None => {
                print!("{rendered}");
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"{
        "executiveSummary": "Summary",
        "keyRequirements": ["Req 1"],
        "d365Advantages": ["Adv 1"],
        "competitiveInsights": ["Ins 1"],
        "suggestedResponses": [
            {"requirement": "Req 1", "response": "Resp 1", "confidence": "high"}
        ],
        "architectureRecommendations": "Arch",
        "implementationTimeline": "Timeline",
        "riskAssessment": "Risk"
    }"#;

    #[test]
    fn parses_camel_case_wire_form() {
        let r = AnalysisResult::from_json(FULL).unwrap();
        assert_eq!(r.executive_summary, "Summary");
        assert_eq!(r.d365_advantages, vec!["Adv 1".to_string()]);
        assert_eq!(r.suggested_responses[0].confidence, Confidence::High);
        assert_eq!(r.risk_assessment, "Risk");
    }

    #[test]
    fn missing_string_field_is_named() {
        let input = r#"{
            "executiveSummary": "S",
            "architectureRecommendations": "A",
            "implementationTimeline": "T"
        }"#;
        let err = AnalysisResult::from_json(input).unwrap_err();
        assert!(err.to_string().contains("missing field `riskAssessment`"), "{err}");
    }

    #[test]
    fn missing_sequences_default_to_empty() {
        let input = r#"{
            "executiveSummary": "S",
            "architectureRecommendations": "A",
            "implementationTimeline": "T",
            "riskAssessment": "R"
        }"#;
        let r = AnalysisResult::from_json(input).unwrap();
        assert!(r.key_requirements.is_empty());
        assert!(r.d365_advantages.is_empty());
        assert!(r.competitive_insights.is_empty());
        assert!(r.suggested_responses.is_empty());
    }

    #[test]
    fn confidence_parsing_keeps_unknown_values() {
        assert_eq!(Confidence::from("HIGH".to_string()), Confidence::High);
        assert_eq!(Confidence::from("medium".to_string()), Confidence::Medium);
        assert_eq!(Confidence::from(" low ".to_string()), Confidence::Low);
        assert_eq!(
            Confidence::from("certain".to_string()),
            Confidence::Unrecognized("certain".to_string())
        );
    }

    #[test]
    fn confidence_serializes_as_plain_string() {
        let json = serde_json::to_string(&Confidence::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
    }

    #[test]
    fn json_round_trip_preserves_field_names() {
        let r = AnalysisResult::from_json(FULL).unwrap();
        let value = serde_json::to_value(&r).unwrap();
        assert!(value.get("d365Advantages").is_some());
        assert!(value.get("executiveSummary").is_some());
        assert_eq!(AnalysisResult::from_json(&value.to_string()).unwrap(), r);
    }

    #[test]
    fn customer_context_reports_blank_required_fields() {
        let ctx = CustomerContext {
            current_erp: "SAP ECC".into(),
            industry: "  ".into(),
            ..Default::default()
        };
        assert_eq!(ctx.missing_required(), vec!["industry", "region"]);
    }

    #[test]
    fn document_kind_by_extension() {
        assert_eq!(DocumentKind::from_extension("PDF"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_extension("pptx"), Some(DocumentKind::Pptx));
        assert_eq!(DocumentKind::from_extension("docx"), None);
    }

    #[test]
    fn rfp_document_rejects_unsupported_kind() {
        assert!(RfpDocument::new(PathBuf::from("/tmp/rfp.docx"), 10).is_err());
        let doc = RfpDocument::new(PathBuf::from("/tmp/rfp.xlsx"), 10).unwrap();
        assert_eq!(doc.file_name, "rfp.xlsx");
        assert_eq!(doc.kind, DocumentKind::Xlsx);
    }

    #[test]
    fn file_size_formatting() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_file_size(2_453_000), "2.34 MB");
    }
}
