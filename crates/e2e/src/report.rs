//! Suite result reporting: console list, JUnit XML, and an HTML bundle

use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::E2eResult;
use crate::runner::SuiteResult;

/// Human-readable list output
pub fn print_list(suite: &SuiteResult) {
    info!("");
    for result in &suite.results {
        let mark = if result.success { "✓" } else { "✗" };
        let note = if result.success {
            result.detail.clone()
        } else {
            result.error.clone().unwrap_or_default()
        };
        info!("  {} {} ({} ms) {}", mark, result.name, result.duration_ms, note);
    }
    info!(
        "  {} total, {} passed, {} failed, {} retried",
        suite.total, suite.passed, suite.failed, suite.retried
    );
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Write a JUnit-compatible results.xml for CI ingestion
pub fn write_junit(suite: &SuiteResult, output_dir: &Path) -> E2eResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!(
        "<testsuite name=\"shopfront-e2e\" tests=\"{}\" failures=\"{}\" time=\"{:.3}\" timestamp=\"{}\">\n",
        suite.total,
        suite.failed,
        suite.duration_ms as f64 / 1000.0,
        chrono::Utc::now().to_rfc3339(),
    ));

    for result in &suite.results {
        xml.push_str(&format!(
            "  <testcase name=\"{}\" classname=\"shopfront.e2e\" time=\"{:.3}\"",
            xml_escape(&result.name),
            result.duration_ms as f64 / 1000.0,
        ));
        if result.success {
            xml.push_str("/>\n");
        } else {
            let message = result.error.as_deref().unwrap_or("unknown error");
            xml.push_str(&format!(
                ">\n    <failure message=\"{}\"/>\n  </testcase>\n",
                xml_escape(message)
            ));
        }
    }
    xml.push_str("</testsuite>\n");

    let path = output_dir.join("results.xml");
    std::fs::write(&path, xml)?;
    Ok(path)
}

/// Write a browsable HTML report bundle
pub fn write_html(suite: &SuiteResult, output_dir: &Path) -> E2eResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let mut rows = String::new();
    for result in &suite.results {
        let (class, mark) = if result.success {
            ("pass", "✓")
        } else {
            ("fail", "✗")
        };
        let note = if result.success {
            result.detail.clone()
        } else {
            result.error.clone().unwrap_or_default()
        };
        rows.push_str(&format!(
            "      <tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{} ms</td><td>{}</td></tr>\n",
            class,
            mark,
            xml_escape(&result.name),
            result
                .state
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".into()),
            result.duration_ms,
            xml_escape(&note),
        ));
    }

    let html = format!(
        r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Shopfront E2E Report</title>
    <style>
      body {{ font-family: sans-serif; margin: 2rem; }}
      table {{ border-collapse: collapse; width: 100%; }}
      td, th {{ border: 1px solid #ccc; padding: 0.4rem 0.8rem; text-align: left; }}
      tr.pass td:first-child {{ color: #2e7d32; }}
      tr.fail td:first-child {{ color: #c62828; }}
    </style>
  </head>
  <body>
    <h1>Shopfront E2E Report</h1>
    <p>{total} scenario(s): {passed} passed, {failed} failed, {retried} retried in {secs:.1}s</p>
    <table>
      <tr><th></th><th>Scenario</th><th>State</th><th>Duration</th><th>Detail</th></tr>
{rows}    </table>
  </body>
</html>
"#,
        total = suite.total,
        passed = suite.passed,
        failed = suite.failed,
        retried = suite.retried,
        secs = suite.duration_ms as f64 / 1000.0,
        rows = rows,
    );

    let path = output_dir.join("report.html");
    std::fs::write(&path, html)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ScenarioResult;
    use crate::scenario::PageState;

    fn sample_suite() -> SuiteResult {
        SuiteResult {
            total: 2,
            passed: 1,
            failed: 1,
            retried: 1,
            duration_ms: 1500,
            results: vec![
                ScenarioResult {
                    name: "shop".into(),
                    success: true,
                    state: Some(PageState::ProductListPopulated),
                    detail: "2 name(s), 2 price(s)".into(),
                    duration_ms: 900,
                    retried: false,
                    error: None,
                },
                ScenarioResult {
                    name: "login".into(),
                    success: false,
                    state: None,
                    detail: String::new(),
                    duration_ms: 600,
                    retried: true,
                    error: Some("state unknown & <weird>".into()),
                },
            ],
        }
    }

    #[test]
    fn test_junit_report_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_junit(&sample_suite(), dir.path()).unwrap();
        let xml = std::fs::read_to_string(path).unwrap();

        assert!(xml.contains("tests=\"2\""));
        assert!(xml.contains("failures=\"1\""));
        assert!(xml.contains("<testcase name=\"shop\""));
        // Failure text must be XML-escaped
        assert!(xml.contains("state unknown &amp; &lt;weird&gt;"));
    }

    #[test]
    fn test_html_report_lists_every_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_html(&sample_suite(), dir.path()).unwrap();
        let html = std::fs::read_to_string(path).unwrap();

        assert!(html.contains("shop"));
        assert!(html.contains("login"));
        assert!(html.contains("1 failed"));
    }
}
