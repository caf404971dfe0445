//! End-to-end checks over the public API: load a fixture, render it, and
//! run the download export against a temporary directory.

use std::path::PathBuf;

use chrono::{Local, TimeZone};
use rfp_report::analysis::{sample_analysis, AnalysisBackend, AnalysisRequest, SampleBackend};
use rfp_report::export::{download_filename, ClipboardSink, ExportError, ReportExporter};
use rfp_report::models::{AnalysisResult, CustomerContext, FixedClock};
use rfp_report::reporting::html::{render, RenderOptions};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn clock() -> FixedClock {
    FixedClock(Local.with_ymd_and_hms(2025, 11, 2, 10, 15, 0).unwrap())
}

struct BlockedClipboard;

impl ClipboardSink for BlockedClipboard {
    fn set_text(&mut self, _text: &str) -> Result<(), ExportError> {
        Err(ExportError::ClipboardUnavailable("no display".into()))
    }
}

#[test]
fn fixture_renders_in_section_order() {
    let result = AnalysisResult::from_path(&fixture("analysis.json")).unwrap();
    let html = render(&result, &RenderOptions::default(), clock().0);

    let find = |s: &str| html.find(s).unwrap_or_else(|| panic!("missing {s:?}"));
    assert!(find("Generated on 11/2/2025") < find("Summary A"));
    assert!(find("Summary A") < find("\u{2713} Req 1"));
    assert!(find("\u{2713} Req 1") < find("\u{2713} Req 2"));
    assert!(find("Unified Microsoft ecosystem") < find("<h3>Req 1"));
    assert!(find("<h3>Req 1") < find("<h3>Req 2"));
    assert!(find("<h3>Req 2") < find("Oracle cloud transition risk"));
    assert!(find("Oracle cloud transition risk") < find("NetSuite lacks MRP"));
    assert!(find("Phased cloud rollout") < find("13 months"));
    assert!(find("13 months") < find("Low risk"));
    assert!(html.contains("<span class=\"confidence-low\">low confidence</span>"));
}

#[test]
fn missing_field_fails_before_rendering() {
    let err = AnalysisResult::from_path(&fixture("missing_field.json")).unwrap_err();
    assert!(
        err.to_string().contains("missing field `implementationTimeline`"),
        "{err}"
    );
}

#[test]
fn download_then_read_back_matches_render() {
    let dir = tempfile::tempdir().unwrap();
    let result = AnalysisResult::from_path(&fixture("analysis.json")).unwrap();
    let html = render(&result, &RenderOptions::default(), clock().0);

    let exporter = ReportExporter::new(html.clone());
    let notice = exporter.download(dir.path(), &clock());
    assert!(notice.is_success(), "{notice}");

    let path = dir.path().join(download_filename(clock().0.timestamp_millis()));
    assert_eq!(std::fs::read_to_string(path).unwrap(), html);
}

#[test]
fn clipboard_failure_is_a_notice_not_a_panic() {
    let exporter = ReportExporter::new("<html></html>".into());
    let notice = exporter.copy(&mut BlockedClipboard);
    assert!(!notice.is_success());
    assert!(notice.to_string().contains("no display"));
}

#[test]
fn sample_backend_output_renders() {
    let dir = tempfile::tempdir().unwrap();
    let doc = dir.path().join("customer-rfp.xlsx");
    std::fs::write(&doc, b"sheet").unwrap();
    let context = CustomerContext {
        current_erp: "Dynamics GP".into(),
        industry: "Manufacturing".into(),
        region: "North America".into(),
        ..Default::default()
    };
    let request = AnalysisRequest::from_path(&doc, context).unwrap();
    let result = SampleBackend.analyze(&request).unwrap();
    assert_eq!(result, sample_analysis());

    let html = render(&result, &RenderOptions::default(), clock().0);
    assert_eq!(html.matches("class=\"requirement\"").count(), 8);
    assert_eq!(html.matches("class=\"response\"").count(), 3);
    // Ampersands in the sample text are escaped.
    assert!(html.contains("Finance &amp; Operations"));
}
