//! JSON report: the full run and its summary.

use crate::error::Result;
use chrono::{DateTime, Utc};
use locascan_core::{RunSummary, ScanRun};
use serde::Serialize;

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    summary: RunSummary,
    run: &'a ScanRun,
}

/// Pretty-printed JSON of the run.
pub fn render_json(run: &ScanRun) -> Result<String> {
    let report = JsonReport {
        generated_at: Utc::now(),
        summary: run.summary(),
        run,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_contains_summary_and_run() {
        let run = ScanRun::new("fr", vec!["en".to_string()]);
        let value: serde_json::Value =
            serde_json::from_str(&render_json(&run).expect("render")).expect("parse");
        assert_eq!(value["summary"]["issues"], 0);
        assert_eq!(value["run"]["target_language"], "fr");
        assert_eq!(value["run"]["run_id"], run.run_id.as_str());
    }
}
