//! Server-rendered HTML form.
//!
//! Widgets are generated from `FORM_FIELDS`, so option labels, bounds and
//! defaults come from the same lookup tables that validation uses.

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use std::fmt::Write as _;

use crate::clinical::{FieldSpec, Widget, FORM_FIELDS};
use crate::decision::RiskLabel;
use crate::error::InvalidInputError;

pub const PAGE_TITLE: &str = "Heart Disease Prediction App";

/// Message shown when the pipeline fails for reasons other than input.
pub const PREDICTION_FAILED_MESSAGE: &str = "Prediction could not be computed.";

/// What to show under the form.
#[derive(Debug, Clone, Copy)]
pub enum Outcome<'a> {
    Predicted(RiskLabel),
    Rejected(&'a InvalidInputError),
    Failed,
}

/// Render the full page with `values` (in `FORM_FIELDS` order) preselected.
pub fn render_page(values: [f64; 7], outcome: Option<Outcome<'_>>) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str("<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(out, "<title>{}</title>", text(PAGE_TITLE));
    out.push_str(STYLE);
    out.push_str("</head>\n<body>\n<main>\n");
    let _ = writeln!(out, "<h1>{}</h1>", text(PAGE_TITLE));
    out.push_str(
        "<p>Enter the clinical parameters below to assess the risk of heart disease.</p>\n",
    );

    out.push_str("<form method=\"post\" action=\"/\">\n");
    for (spec, value) in FORM_FIELDS.iter().zip(values) {
        render_field(&mut out, spec, value);
    }
    out.push_str("<button type=\"submit\">Predict</button>\n</form>\n");

    match outcome {
        Some(Outcome::Predicted(label)) => {
            let class = if label.is_at_risk() { "risk" } else { "clear" };
            let _ = writeln!(
                out,
                "<h2 class=\"{class}\">Prediction: {}</h2>",
                text(label.as_str())
            );
        }
        Some(Outcome::Rejected(err)) => {
            out.push_str("<div class=\"error\">\n<p>Some values are outside their allowed range:</p>\n<ul>\n");
            for v in &err.violations {
                let _ = writeln!(out, "<li>{}</li>", text(&v.to_string()));
            }
            out.push_str("</ul>\n</div>\n");
        }
        Some(Outcome::Failed) => {
            let _ = writeln!(
                out,
                "<div class=\"error\"><p>{}</p></div>",
                text(PREDICTION_FAILED_MESSAGE)
            );
        }
        None => {}
    }

    out.push_str("</main>\n</body>\n</html>\n");
    out
}

fn render_field(out: &mut String, spec: &FieldSpec, value: f64) {
    let _ = writeln!(
        out,
        "<label for=\"{name}\">{label}</label>\n<small>{help}</small>",
        name = attr(spec.name),
        label = text(spec.label),
        help = text(spec.help),
    );
    match spec.widget {
        Widget::Select { options } => {
            let _ = writeln!(out, "<select id=\"{0}\" name=\"{0}\">", attr(spec.name));
            for c in options {
                let selected = if f64::from(c.code) == value {
                    " selected"
                } else {
                    ""
                };
                let _ = writeln!(
                    out,
                    "<option value=\"{}\"{selected}>{}</option>",
                    c.code,
                    text(c.label)
                );
            }
            out.push_str("</select>\n");
        }
        Widget::Slider { min, max, step } => {
            let shown = format_value(value, step);
            let _ = writeln!(
                out,
                "<input type=\"range\" id=\"{0}\" name=\"{0}\" min=\"{1}\" max=\"{2}\" step=\"{3}\" value=\"{4}\" oninput=\"this.nextElementSibling.value=this.value\">\n<output>{4}</output>",
                attr(spec.name),
                min,
                max,
                step,
                shown,
            );
        }
    }
}

fn format_value(value: f64, step: f64) -> String {
    let decimals: usize = if step >= 1.0 { 0 } else { 1 };
    let fixed = format!("{value:.decimals$}");
    // off-grid submissions are echoed as sent
    match fixed.parse::<f64>() {
        Ok(v) if (v - value).abs() < 1e-9 => fixed,
        _ => value.to_string(),
    }
}

const STYLE: &str = r#"<style>
body { font-family: system-ui, sans-serif; background: #f7f7f9; }
main { max-width: 40rem; margin: 2rem auto; background: #fff; padding: 2rem; border-radius: 8px; }
label { display: block; margin-top: 1rem; font-weight: 600; }
small { display: block; color: #666; }
select, input[type=range] { width: 100%; }
button { margin-top: 1.5rem; padding: 0.5rem 1.5rem; }
.risk { color: #b91c1c; }
.clear { color: #047857; }
.error { color: #b91c1c; border: 1px solid #fca5a5; padding: 0 1rem; margin-top: 1rem; }
</style>
"#;
