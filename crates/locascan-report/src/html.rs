//! HTML report.
//!
//! Screenshots are referenced relative to the report, under `assets/`;
//! [`write_reports`](crate::write_reports) copies them there.

use crate::rows::{state_rows, status_text, Outcome, StateRow};
use locascan_core::ScanRun;
use std::fmt::Write;

/// Directory next to the HTML file that holds screenshot copies.
pub const ASSETS_DIR: &str = "assets";

const STYLE: &str = r"
:root { --primary: #2563eb; --bg: #f8fafc; --text: #1e293b; --border: #e2e8f0; }
body { font-family: -apple-system, 'Segoe UI', Roboto, Arial, sans-serif; color: var(--text);
       background: var(--bg); margin: 0; padding: 20px; line-height: 1.5; }
.container { max-width: 1200px; margin: 0 auto; background: white; border-radius: 8px; padding: 20px; }
h1, h2 { color: var(--primary); margin-top: 0; }
.stats { display: grid; grid-template-columns: repeat(auto-fit, minmax(180px, 1fr)); gap: 16px; }
.stat { background: var(--bg); padding: 12px; border-radius: 4px; text-align: center; }
.stat .n { font-size: 24px; font-weight: bold; color: var(--primary); }
.state { margin: 32px 0; border: 1px solid var(--border); border-radius: 8px; overflow: hidden; }
.state header { background: var(--primary); color: white; padding: 12px 16px;
                display: flex; justify-content: space-between; }
.state .body { display: grid; grid-template-columns: 1fr 1fr; gap: 16px; padding: 16px; }
.state img { max-width: 100%; border: 1px solid var(--border); }
.issue { margin-bottom: 8px; padding: 8px; background: #f1f5f9; border-radius: 4px; }
.issue .text { font-weight: 500; color: var(--primary); }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid var(--border); padding: 6px 8px; text-align: left; }
tr.clean td.outcome { color: #15803d; }
tr.issues td.outcome { color: #b45309; }
tr.failed td.outcome { color: #b91c1c; font-weight: bold; }
tr.skipped td.outcome { color: #64748b; }
";

/// Escape text for HTML element content and attribute values.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Relative `src` of a state's screenshot inside the report directory.
pub(crate) fn asset_name(row: &StateRow<'_>) -> Option<String> {
    let file = row.state?.screenshot_ref.path().file_name()?.to_str()?;
    Some(format!("{ASSETS_DIR}/{file}"))
}

/// Render the HTML report.
#[must_use]
pub fn render_html(run: &ScanRun, title: &str) -> String {
    let rows = state_rows(run);
    let summary = run.summary();
    let mut html = String::new();

    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>{} - {}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<div class=\"container\">\n",
        escape(title),
        run.started_at.format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(html, "<h1>{}</h1>", escape(title));
    let _ = writeln!(
        html,
        "<p>Run {} started {}. Target language <b>{}</b>, flagging {}.{}</p>",
        escape(&run.run_id),
        run.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        escape(&run.target_language),
        escape(&run.check_languages.join(", ")),
        if run.cancelled {
            " <b>The scan was cancelled before it finished.</b>"
        } else {
            ""
        }
    );

    html.push_str("<h2>Summary</h2>\n<div class=\"stats\">\n");
    for (n, label) in [
        (summary.pages_attempted, "Pages"),
        (summary.states_captured, "Screenshots"),
        (summary.issues, "Issues"),
        (summary.failed_states, "Failed states"),
        (summary.skipped_states, "Skipped states"),
    ] {
        let _ = writeln!(
            html,
            "<div class=\"stat\"><div class=\"n\">{n}</div><div>{label}</div></div>"
        );
    }
    html.push_str("</div>\n");

    render_coverage(&mut html, &rows);

    html.push_str("<h2>Issues</h2>\n");
    let with_issues: Vec<&StateRow<'_>> = rows.iter().filter(|r| !r.issues.is_empty()).collect();
    if with_issues.is_empty() {
        html.push_str("<p>No missing translations found in the scanned states.</p>\n");
    }
    for row in with_issues {
        render_state(&mut html, row);
    }

    html.push_str("</div>\n</body>\n</html>\n");
    html
}

fn render_coverage(html: &mut String, rows: &[StateRow<'_>]) {
    html.push_str(
        "<h2>Coverage</h2>\n<table>\n<tr><th>Page</th><th>Modal</th><th>Outcome</th>\
         <th>Issues</th><th>Capture</th><th>Restore</th><th>Detail</th></tr>\n",
    );
    for row in rows {
        let outcome = row.outcome();
        let detail = [
            row.capture.detail.as_deref(),
            row.restore.and_then(|r| r.detail.as_deref()),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("; ");
        let _ = writeln!(
            html,
            "<tr class=\"{class}\"><td>{page}</td><td>{modal}</td><td class=\"outcome\">{label}</td>\
             <td>{issues}</td><td>{capture}</td><td>{restore}</td><td>{detail}</td></tr>",
            class = outcome.label(),
            page = escape(row.page_name),
            modal = escape(row.section()),
            label = match outcome {
                Outcome::Clean => "Clean",
                Outcome::Issues => "Issues found",
                Outcome::Failed => "Could not scan",
                Outcome::Skipped => "Not scanned",
            },
            issues = row.issues.len(),
            capture = escape(&status_text(row.capture)),
            restore = escape(&row.restore.map(status_text).unwrap_or_default()),
            detail = escape(&detail),
        );
    }
    html.push_str("</table>\n");
}

fn render_state(html: &mut String, row: &StateRow<'_>) {
    let heading = match row.modal_name {
        Some(modal) => format!("{} / {}", row.page_name, modal),
        None => row.page_name.to_string(),
    };
    let _ = write!(
        html,
        "<section class=\"state\">\n<header><h3>{}</h3><span>{} issue(s)</span></header>\n<div class=\"body\">\n",
        escape(&heading),
        row.issues.len()
    );
    match asset_name(row) {
        Some(src) => {
            let _ = writeln!(
                html,
                "<div><img src=\"{}\" alt=\"{} screenshot\"></div>",
                escape(&src),
                escape(&heading)
            );
        }
        None => html.push_str("<div><p>Screenshot unavailable.</p></div>\n"),
    }
    html.push_str("<div>\n");
    for issue in &row.issues {
        let _ = writeln!(
            html,
            "<div class=\"issue\"><div class=\"text\">{}</div><div>Detected as {} ({:.0}%)</div></div>",
            escape(&issue.text_snippet),
            escape(&issue.detected_language),
            issue.confidence * 100.0
        );
    }
    html.push_str("</div>\n</div>\n</section>\n");
}
