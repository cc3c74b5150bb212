//! Response bodies for the HTTP routes.

use std::fmt::Write;

use crate::generator::Readings;

/// Body of the 404 returned by `/exceeding` outside page mode.
pub const DISPLAY_MODE_MISMATCH: &str = "Display mode is not set to 'page' or 'both'.";

/// One `name{app_name="appN"} value` line per reading.
pub fn format_exposition(metric_name: &str, readings: &Readings) -> String {
    let mut out = String::new();
    for (i, reading) in readings.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(
            out,
            "{}{{app_name=\"{}\"}} {}",
            metric_name,
            escape_label_value(&reading.app_name),
            reading.value
        );
    }
    out
}

/// HTML page listing the ranking.
pub fn render_exceeding_page(top_k: usize, top: &[(String, u64)]) -> String {
    let title = format!("Top {} Apps Exceeding Threshold", top_k);
    let mut rows = String::new();

    if top.is_empty() {
        rows.push_str("      <tr><td colspan=\"3\">No app has exceeded the threshold yet.</td></tr>\n");
    }
    for (rank, (name, count)) in top.iter().enumerate() {
        let _ = writeln!(
            rows,
            "      <tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            rank + 1,
            escape_html(name),
            count
        );
    }

    format!(
        "<!DOCTYPE html>
<html>
<head>
  <meta charset=\"utf-8\">
  <title>{title}</title>
</head>
<body>
  <h1>{title}</h1>
  <table>
    <thead>
      <tr><th>Rank</th><th>App</th><th>Exceedances</th></tr>
    </thead>
    <tbody>
{rows}    </tbody>
  </table>
</body>
</html>
"
    )
}

fn escape_label_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
