//! RFP analysis requests.
//!
//! An [`AnalysisBackend`] turns a validated [`AnalysisRequest`] into an
//! [`AnalysisResult`] in a single call. The crate ships [`SampleBackend`],
//! which answers every request with the same demonstration analysis; a real
//! inference service plugs in behind the same trait.

use std::path::Path;

use thiserror::Error;

use crate::models::{
    format_file_size, AnalysisResult, Confidence, CustomerContext, RfpDocument, SuggestedResponse,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("no RFP document selected")]
    NoDocument,

    #[error("missing customer context: {}", .0.join(", "))]
    MissingContext(Vec<&'static str>),

    #[error("analysis backend failed: {0}")]
    Backend(String),
}

/// A document plus the customer context it should be read against.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub document: RfpDocument,
    pub context: CustomerContext,
}

impl AnalysisRequest {
    /// Builds a request, rejecting blank required context fields.
    pub fn new(
        document: Option<RfpDocument>,
        context: CustomerContext,
    ) -> Result<Self, AnalysisError> {
        let document = document.ok_or(AnalysisError::NoDocument)?;
        let missing = context.missing_required();
        if !missing.is_empty() {
            return Err(AnalysisError::MissingContext(missing));
        }
        Ok(AnalysisRequest { document, context })
    }

    /// Opens `path` and builds a request from it.
    pub fn from_path(path: &Path, context: CustomerContext) -> Result<Self, crate::RfpError> {
        let document = RfpDocument::open(path)?;
        Ok(Self::new(Some(document), context)?)
    }
}

/// One request, one response. No retries, no progress callbacks.
pub trait AnalysisBackend {
    fn name(&self) -> &str;
    fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError>;
}

/// Returns the built-in demonstration analysis for any valid request.
pub struct SampleBackend;

impl AnalysisBackend for SampleBackend {
    fn name(&self) -> &str {
        "sample"
    }

    fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        log::info!(
            "analyzing {} ({}) for {} / {} / {}",
            request.document.file_name,
            format_file_size(request.document.size_bytes),
            request.context.current_erp,
            request.context.industry,
            request.context.region,
        );
        Ok(sample_analysis())
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The demonstration analysis of a manufacturing ERP replacement RFP.
pub fn sample_analysis() -> AnalysisResult {
    AnalysisResult {
        executive_summary: "Based on comprehensive analysis of the customer's RFP and competitive \
            landscape, we've identified strategic opportunities for Dynamics 365 F&O to address \
            their manufacturing and supply chain requirements while positioning against incumbent \
            solutions. The customer seeks to modernize their legacy ERP system with enhanced \
            reporting capabilities, real-time inventory management, and improved financial \
            controls, while facing competitive pressure from SAP and Oracle proposals."
            .to_string(),
        key_requirements: strings(&[
            "Real-time inventory tracking and management across multiple locations",
            "Advanced financial reporting and analytics with regulatory compliance",
            "Supply chain optimization and demand planning capabilities",
            "Multi-location support with centralized consolidation",
            "Seamless integration with existing CRM and third-party systems",
            "Mobile access for field operations and remote workforce",
            "Competitive total cost of ownership against current SAP proposal",
            "Proven implementation methodology with risk mitigation",
        ]),
        d365_advantages: strings(&[
            "Unified Microsoft ecosystem integration (Power BI, Office 365, Teams, Azure) \
             eliminates integration costs that SAP/Oracle require",
            "Industry-specific manufacturing modules with AI-powered demand forecasting and \
             supply chain insights",
            "Cloud-first architecture with automatic updates vs. SAP's complex on-premise \
             upgrade cycles",
            "Power Platform low-code/no-code customization reduces long-term development costs \
             by 60% vs. traditional ERP",
            "Built-in sustainability reporting and ESG compliance features ahead of regulatory \
             requirements",
            "Transparent, predictable subscription pricing vs. SAP's complex licensing and \
             maintenance fees",
        ]),
        competitive_insights: strings(&[
            "SAP S/4HANA migration costs average $2.5M more than D365 implementation due to code \
             remediation requirements",
            "Oracle's cloud transition has 40% higher failure rate compared to D365's proven \
             migration methodology",
            "NetSuite lacks advanced manufacturing planning - requires expensive third-party \
             add-ons that D365 includes natively",
            "D365's Power Platform integration provides competitive advantage that no other ERP \
             vendor can match",
            "Microsoft's $12B annual R&D investment in cloud and AI far exceeds SAP's $3.2B \
             technology investment",
            "Customer references show 25% faster D365 implementations vs. SAP due to \
             pre-configured industry solutions",
        ]),
        suggested_responses: vec![
            SuggestedResponse {
                requirement: "Real-time inventory tracking".to_string(),
                response: "Dynamics 365 F&O provides real-time inventory visibility across all \
                    locations with automated replenishment, cycle counting, and warehouse \
                    management. Integration with IoT devices enables automatic inventory updates."
                    .to_string(),
                confidence: Confidence::High,
            },
            SuggestedResponse {
                requirement: "Advanced reporting capabilities".to_string(),
                response: "Built-in Power BI integration delivers self-service analytics with \
                    pre-built industry dashboards. Financial reporting includes regulatory \
                    compliance templates and real-time consolidation."
                    .to_string(),
                confidence: Confidence::High,
            },
            SuggestedResponse {
                requirement: "Multi-location support".to_string(),
                response: "D365 supports unlimited legal entities and locations with centralized \
                    configuration management. Inter-company transactions and consolidation are \
                    handled automatically."
                    .to_string(),
                confidence: Confidence::Medium,
            },
        ],
        architecture_recommendations: "Recommend a phased cloud implementation starting with \
            Finance & Operations core modules, followed by Supply Chain Management and \
            Manufacturing. Leverage Azure integration for data lake and advanced analytics. \
            Consider Power Apps for custom mobile solutions."
            .to_string(),
        implementation_timeline: "Phase 1 (6 months): Core Finance & Operations. Phase 2 \
            (4 months): Supply Chain & Manufacturing modules. Phase 3 (3 months): Advanced \
            analytics and mobile solutions. Total timeline: 13 months with parallel testing and \
            training."
            .to_string(),
        risk_assessment: "Low risk implementation given D365's proven track record in \
            manufacturing. Main considerations include data migration quality and user adoption. \
            Recommend comprehensive training program and phased go-live approach."
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn context() -> CustomerContext {
        CustomerContext {
            current_erp: "SAP ECC 6.0".into(),
            industry: "Manufacturing".into(),
            region: "EMEA".into(),
            ..Default::default()
        }
    }

    fn document() -> RfpDocument {
        RfpDocument::new(PathBuf::from("/tmp/rfp.pdf"), 2048).unwrap()
    }

    #[test]
    fn request_requires_document() {
        let err = AnalysisRequest::new(None, context()).unwrap_err();
        assert_eq!(err, AnalysisError::NoDocument);
    }

    #[test]
    fn request_lists_missing_context_fields() {
        let ctx = CustomerContext {
            industry: "Retail".into(),
            ..Default::default()
        };
        let err = AnalysisRequest::new(Some(document()), ctx).unwrap_err();
        assert_eq!(err, AnalysisError::MissingContext(vec!["currentErp", "region"]));
        assert_eq!(err.to_string(), "missing customer context: currentErp, region");
    }

    #[test]
    fn sample_backend_answers_valid_request() {
        let req = AnalysisRequest::new(Some(document()), context()).unwrap();
        let result = SampleBackend.analyze(&req).unwrap();
        assert_eq!(result.key_requirements.len(), 8);
        assert_eq!(result.d365_advantages.len(), 6);
        assert_eq!(result.competitive_insights.len(), 6);
        assert_eq!(result.suggested_responses.len(), 3);
        assert_eq!(result.suggested_responses[2].confidence, Confidence::Medium);
    }

    #[test]
    fn sample_text_has_no_line_break_artifacts() {
        let result = sample_analysis();
        assert!(!result.executive_summary.contains("  "));
        assert!(result.d365_advantages.iter().all(|a| !a.contains("  ")));
    }

    #[test]
    fn from_path_validates_extension() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("rfp.docx");
        std::fs::write(&bad, b"x").unwrap();
        assert!(AnalysisRequest::from_path(&bad, context()).is_err());

        let good = dir.path().join("rfp.pptx");
        std::fs::write(&good, b"slides").unwrap();
        let req = AnalysisRequest::from_path(&good, context()).unwrap();
        assert_eq!(req.document.size_bytes, 6);
    }
}
