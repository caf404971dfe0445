//! Machine-readable JSON reporter.
//!
//! Emits a single JSON object with `version`, `generatedAt`, a `summary`
//! of counts, and the `analysis` itself in its camelCase wire form. The
//! `analysis` member can be fed straight back into `rfp render`.

use serde_json::json;

use crate::config::ReportConfig;
use crate::models::{AnalysisResult, Clock, Confidence, Reporter};
use crate::RfpError;

/// Counts suggested responses by confidence: `(high, medium, low, unrated)`.
fn confidence_counts(result: &AnalysisResult) -> (usize, usize, usize, usize) {
    let (mut h, mut m, mut l, mut u) = (0, 0, 0, 0);
    for r in &result.suggested_responses {
        match r.confidence {
            Confidence::High => h += 1,
            Confidence::Medium => m += 1,
            Confidence::Low => l += 1,
            Confidence::Unrecognized(_) => u += 1,
        }
    }
    (h, m, l, u)
}

pub(crate) fn format_json(
    result: &AnalysisResult,
    clock: &dyn Clock,
) -> Result<String, RfpError> {
    let (high, medium, low, unrated) = confidence_counts(result);
    let analysis = serde_json::to_value(result)
        .map_err(|e| RfpError::Report(format!("Cannot serialize analysis: {e}")))?;

    let doc = json!({
        "version": env!("CARGO_PKG_VERSION"),
        "generatedAt": clock.now().to_rfc3339(),
        "summary": {
            "keyRequirements": result.key_requirements.len(),
            "advantages": result.d365_advantages.len(),
            "competitiveInsights": result.competitive_insights.len(),
            "suggestedResponses": {
                "total": result.suggested_responses.len(),
                "high": high,
                "medium": medium,
                "low": low,
                "unrated": unrated,
            },
        },
        "analysis": analysis,
    });

    let mut out = serde_json::to_string_pretty(&doc)
        .map_err(|e| RfpError::Report(format!("Cannot serialize report: {e}")))?;
    out.push('\n');
    Ok(out)
}

/// JSON reporter for piping into other tooling.
pub struct JsonReporter;

impl Reporter for JsonReporter {
    fn format_name(&self) -> &str {
        "json"
    }

    fn render(
        &self,
        result: &AnalysisResult,
        _config: &ReportConfig,
        clock: &dyn Clock,
    ) -> Result<String, RfpError> {
        format_json(result, clock)
    }
}
