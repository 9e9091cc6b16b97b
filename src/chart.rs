//! Chart rendering seam.
//!
//! The data layer hands a [`BarChart`] (labels plus one numeric series per
//! player) to a [`ChartRenderer`] and gets image bytes back. Rendering
//! problems never fail a command: [`render_or_placeholder()`] swaps in a
//! placeholder image and logs a warning.

use std::fmt::Write as _;

use log::warn;
use serde::Serialize;

use crate::{error::RenderError, value::format_compact};

const SERIES_COLOURS: &[&str] = &["#4169e1", "#dc143c", "#2ecc71", "#f39c12"];
const PLACEHOLDER_TEXT: &str = "Chart unavailable";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarChart {
    pub title: String,
    pub labels: Vec<String>,
    /// `(series name, one value per label)`.
    pub series: Vec<(String, Vec<i64>)>,
}

impl BarChart {
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.labels.is_empty() {
            return Err(RenderError("chart has no categories".to_string()));
        }
        if self.series.is_empty() {
            return Err(RenderError("chart has no series".to_string()));
        }
        if let Some((name, values)) = self
            .series
            .iter()
            .find(|(_, values)| values.len() != self.labels.len())
        {
            return Err(RenderError(format!(
                "series '{name}' has {} value(s) for {} categor(ies)",
                values.len(),
                self.labels.len()
            )));
        }
        Ok(())
    }
}

pub trait ChartRenderer {
    fn render(&self, chart: &BarChart) -> Result<Vec<u8>, RenderError>;

    /// File extension of the produced image, without the dot.
    fn extension(&self) -> &'static str;
}

/// Grouped vertical bars as a standalone SVG document.
#[derive(Debug, Clone, Copy)]
pub struct SvgBarChart {
    pub width: u32,
    pub height: u32,
}

impl Default for SvgBarChart {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
        }
    }
}

impl ChartRenderer for SvgBarChart {
    fn render(&self, chart: &BarChart) -> Result<Vec<u8>, RenderError> {
        chart.validate()?;
        let (w, h) = (self.width as f64, self.height as f64);
        let pad_left = 90.0;
        let pad_right = 30.0;
        let pad_top = 60.0;
        let pad_bottom = 120.0;
        let plot_w = w - pad_left - pad_right;
        let plot_h = h - pad_top - pad_bottom;
        if plot_w <= 0.0 || plot_h <= 0.0 {
            return Err(RenderError(format!(
                "canvas {}x{} is too small",
                self.width, self.height
            )));
        }

        let max = chart
            .series
            .iter()
            .flat_map(|(_, values)| values.iter().copied())
            .max()
            .unwrap_or(0)
            .max(1);
        let baseline = pad_top + plot_h;
        let group_w = plot_w / chart.labels.len() as f64;
        let bar_w = group_w * 0.7 / chart.series.len() as f64;

        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
        );
        let _ = write!(svg, r#"<rect width="{w}" height="{h}" fill="white"/>"#);
        let _ = write!(
            svg,
            r#"<text x="{}" y="32" font-size="20" text-anchor="middle" font-family="sans-serif">{}</text>"#,
            w / 2.0,
            escape(&chart.title)
        );

        for step in 0..=4 {
            let fraction = step as f64 / 4.0;
            let y = baseline - plot_h * fraction;
            let tick = (max as f64 * fraction).round() as i64;
            let _ = write!(
                svg,
                r##"<line x1="{pad_left}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#cccccc" stroke-dasharray="4,3"/>"##,
                w - pad_right
            );
            let _ = write!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" font-size="11" text-anchor="end" font-family="sans-serif">{}</text>"#,
                pad_left - 8.0,
                y + 4.0,
                format_compact(tick)
            );
        }

        for (group, label) in chart.labels.iter().enumerate() {
            let group_x = pad_left + group_w * group as f64 + group_w * 0.15;
            for (index, (_, values)) in chart.series.iter().enumerate() {
                let value = values[group].max(0);
                let bar_h = plot_h * value as f64 / max as f64;
                let x = group_x + bar_w * index as f64;
                let colour = SERIES_COLOURS[index % SERIES_COLOURS.len()];
                let _ = write!(
                    svg,
                    r#"<rect x="{x:.1}" y="{:.1}" width="{bar_w:.1}" height="{bar_h:.1}" fill="{colour}" opacity="0.8"/>"#,
                    baseline - bar_h
                );
            }
            let label_x = pad_left + group_w * (group as f64 + 0.5);
            let label_y = baseline + 16.0;
            let _ = write!(
                svg,
                r#"<text x="{label_x:.1}" y="{label_y:.1}" font-size="12" text-anchor="end" font-family="sans-serif" transform="rotate(-45 {label_x:.1} {label_y:.1})">{}</text>"#,
                escape(label)
            );
        }

        for (index, (name, _)) in chart.series.iter().enumerate() {
            let y = 50.0 + 18.0 * index as f64;
            let x = w - pad_right - 160.0;
            let colour = SERIES_COLOURS[index % SERIES_COLOURS.len()];
            let _ = write!(
                svg,
                r#"<rect x="{x:.1}" y="{:.1}" width="12" height="12" fill="{colour}"/>"#,
                y - 10.0
            );
            let _ = write!(
                svg,
                r#"<text x="{:.1}" y="{y:.1}" font-size="12" font-family="sans-serif">{}</text>"#,
                x + 18.0,
                escape(name)
            );
        }
        svg.push_str("</svg>");
        Ok(svg.into_bytes())
    }

    fn extension(&self) -> &'static str {
        "svg"
    }
}

/// Renders `chart`, substituting a placeholder image when rendering fails.
pub fn render_or_placeholder(renderer: &dyn ChartRenderer, chart: &BarChart) -> Vec<u8> {
    match renderer.render(chart) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("Using placeholder chart: {err}");
            placeholder()
        }
    }
}

pub fn placeholder() -> Vec<u8> {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="400" height="120"><rect width="400" height="120" fill="white"/><text x="200" y="65" font-size="16" text-anchor="middle" font-family="sans-serif">{PLACEHOLDER_TEXT}</text></svg>"#
    )
    .into_bytes()
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart() -> BarChart {
        BarChart {
            title: "DKP Comparison".to_string(),
            labels: vec!["DKP SCORE".to_string(), "DKP GOAL".to_string()],
            series: vec![
                ("Alice".to_string(), vec![900, 1_000]),
                ("Bob & Co".to_string(), vec![1_200, 1_000]),
            ],
        }
    }

    struct Broken;

    impl ChartRenderer for Broken {
        fn render(&self, _chart: &BarChart) -> Result<Vec<u8>, RenderError> {
            Err(RenderError("backend offline".to_string()))
        }

        fn extension(&self) -> &'static str {
            "png"
        }
    }

    #[test]
    fn svg_contains_one_bar_per_value_and_escaped_legend() {
        let bytes = SvgBarChart::default().render(&chart()).expect("render");
        let svg = String::from_utf8(bytes).expect("utf8");
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches(r#"opacity="0.8""#).count(), 4);
        assert!(svg.contains("Bob &amp; Co"));
        assert!(svg.contains("DKP GOAL"));
    }

    #[test]
    fn mismatched_series_are_rejected() {
        let mut bad = chart();
        bad.series[1].1.pop();
        let err = SvgBarChart::default().render(&bad).expect_err("invalid chart");
        assert!(err.0.contains("Bob & Co"));
    }

    #[test]
    fn failed_render_yields_placeholder() {
        let bytes = render_or_placeholder(&Broken, &chart());
        assert_eq!(bytes, placeholder());
        let svg = String::from_utf8(bytes).expect("utf8");
        assert!(svg.contains(PLACEHOLDER_TEXT));
    }
}
