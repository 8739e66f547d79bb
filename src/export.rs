//! Chart export to HTML and SVG
//!
//! Each chart is written twice at a fixed base name: a standalone SVG image
//! and an HTML page embedding the same SVG with a legend.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::aggregate::CumulativeSeries;

/// Image dimensions in pixels
const WIDTH: f64 = 1200.0;
const HEIGHT: f64 = 800.0;

/// Plot margins (left, right, top, bottom)
const MARGIN: (f64, f64, f64, f64) = (100.0, 140.0, 70.0, 90.0);

/// Color of the current year's line
pub const CURRENT_YEAR_COLOR: &str = "#FF0000";

/// Errors that can occur while writing chart files
#[derive(Debug, Error)]
pub enum ExportError {
    /// Writing an output file failed
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Nothing to draw
    #[error("Chart '{0}' has no series")]
    EmptyChart(String),

    /// Formatting the SVG document failed
    #[error("Failed to render chart: {0}")]
    Render(#[from] std::fmt::Error),
}

/// The two chart kinds and their fixed output names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Counts,
    Amounts,
}

impl ChartKind {
    /// File name stem shared by the HTML and SVG outputs
    pub fn basename(&self) -> &'static str {
        match self {
            ChartKind::Counts => "nih_awards",
            ChartKind::Amounts => "nih_award_amounts",
        }
    }

    /// Heading drawn above the plot
    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::Counts => "Cumulative NIH Awards (YTD) by Award Notice Date",
            ChartKind::Amounts => "Cumulative NIH Award Dollars (YTD) by Award Notice Date",
        }
    }

    /// Label of the vertical axis
    pub fn y_label(&self) -> &'static str {
        match self {
            ChartKind::Counts => "Cumulative Number of Awards",
            ChartKind::Amounts => "Cumulative Award Amount (USD)",
        }
    }
}

/// Converts HLS to RGB, all components in `[0, 1]`
fn hls_to_rgb(h: f64, l: f64, s: f64) -> (f64, f64, f64) {
    if s == 0.0 {
        return (l, l, l);
    }
    let m2 = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let m1 = 2.0 * l - m2;
    let channel = |hue: f64| {
        let hue = hue.rem_euclid(1.0);
        if hue < 1.0 / 6.0 {
            m1 + (m2 - m1) * hue * 6.0
        } else if hue < 0.5 {
            m2
        } else if hue < 2.0 / 3.0 {
            m1 + (m2 - m1) * (2.0 / 3.0 - hue) * 6.0
        } else {
            m1
        }
    };
    (channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
}

/// Pastel RGB for the `i`-th of `total` colors
pub fn pastel_rgb(i: usize, total: usize) -> (u8, u8, u8) {
    let hue = i as f64 / total.max(1) as f64;
    let (r, g, b) = hls_to_rgb(hue, 0.8, 0.5);
    ((r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8)
}

/// Pastel color as `#RRGGBB`
pub fn pastel_color(i: usize, total: usize) -> String {
    let (r, g, b) = pastel_rgb(i, total);
    format!("#{:02X}{:02X}{:02X}", r, g, b)
}

/// Line style for one year on a chart
#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub color: String,
    pub width: f64,
    pub dashed: bool,
}

/// Assigns styles: the current year solid red, every other year a dashed pastel
pub fn line_styles<'a>(
    years: impl IntoIterator<Item = &'a i32>,
    current_year: i32,
) -> BTreeMap<i32, LineStyle> {
    let others: Vec<i32> = years.into_iter().copied().filter(|y| *y != current_year).collect();
    let total = others.len();
    let mut styles: BTreeMap<i32, LineStyle> = others
        .iter()
        .enumerate()
        .map(|(i, year)| {
            let style = LineStyle {
                color: pastel_color(i, total),
                width: 2.0,
                dashed: true,
            };
            (*year, style)
        })
        .collect();
    styles.insert(
        current_year,
        LineStyle {
            color: CURRENT_YEAR_COLOR.to_string(),
            width: 3.0,
            dashed: false,
        },
    );
    styles
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn format_value(value: f64) -> String {
    if value >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if value >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if value >= 1e3 {
        format!("{:.1}k", value / 1e3)
    } else {
        format!("{}", value.round())
    }
}

/// Renders a chart as a standalone SVG document
pub fn render_svg(
    kind: ChartKind,
    series: &CumulativeSeries,
    current_year: i32,
    tick_interval: usize,
) -> Result<String, std::fmt::Error> {
    let (left, right, top, bottom) = MARGIN;
    let plot_w = WIDTH - left - right;
    let plot_h = HEIGHT - top - bottom;
    let days = series.days().max(1);
    let max_value = series.max_value().max(1.0);

    let x = |i: usize| {
        if days <= 1 {
            left
        } else {
            left + plot_w * i as f64 / (days - 1) as f64
        }
    };
    let y = |v: f64| top + plot_h * (1.0 - v / max_value);

    let mut svg = String::new();
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#,
        w = WIDTH,
        h = HEIGHT
    )?;
    writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#)?;
    writeln!(
        svg,
        r#"<text x="{}" y="40" font-size="22" text-anchor="middle">{}</text>"#,
        WIDTH / 2.0,
        escape(kind.title())
    )?;

    // Axes
    writeln!(
        svg,
        r#"<line x1="{l}" y1="{b}" x2="{r}" y2="{b}" stroke="black"/><line x1="{l}" y1="{t}" x2="{l}" y2="{b}" stroke="black"/>"#,
        l = left,
        r = left + plot_w,
        t = top,
        b = top + plot_h
    )?;

    // X ticks every `tick_interval` days
    for (i, label) in series.labels.iter().enumerate().step_by(tick_interval.max(1)) {
        writeln!(
            svg,
            r##"<line x1="{x}" y1="{t}" x2="{x}" y2="{b}" stroke="#eeeeee"/><text x="{x}" y="{ly}" font-size="11" text-anchor="end" transform="rotate(-45 {x} {ly})">{label}</text>"##,
            x = x(i),
            t = top,
            b = top + plot_h,
            ly = top + plot_h + 18.0,
            label = escape(label)
        )?;
    }

    // Y ticks at fifths of the maximum
    for step in 0..=5 {
        let value = max_value * step as f64 / 5.0;
        writeln!(
            svg,
            r##"<line x1="{l}" y1="{y}" x2="{r}" y2="{y}" stroke="#eeeeee"/><text x="{tx}" y="{y}" font-size="12" text-anchor="end" dominant-baseline="middle">{v}</text>"##,
            l = left,
            r = left + plot_w,
            y = y(value),
            tx = left - 8.0,
            v = format_value(value)
        )?;
    }

    writeln!(
        svg,
        r#"<text x="{}" y="{}" font-size="14" text-anchor="middle">Date (Month-Day)</text>"#,
        left + plot_w / 2.0,
        HEIGHT - 15.0
    )?;
    writeln!(
        svg,
        r#"<text x="25" y="{y}" font-size="14" text-anchor="middle" transform="rotate(-90 25 {y})">{label}</text>"#,
        y = top + plot_h / 2.0,
        label = escape(kind.y_label())
    )?;

    let styles = line_styles(series.years.keys(), current_year);
    for (legend_row, (year, values)) in series.years.iter().enumerate() {
        let Some(style) = styles.get(year) else {
            continue;
        };
        let points: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(i, v)| format!("{:.1},{:.1}", x(i), y(*v)))
            .collect();
        let dash = if style.dashed { r#" stroke-dasharray="8 5""# } else { "" };
        writeln!(
            svg,
            r#"<polyline fill="none" stroke="{}" stroke-width="{}"{} points="{}"/>"#,
            style.color,
            style.width,
            dash,
            points.join(" ")
        )?;

        let ly = top + 10.0 + legend_row as f64 * 22.0;
        let lx = left + plot_w + 20.0;
        writeln!(
            svg,
            r#"<line x1="{lx}" y1="{ly}" x2="{lx2}" y2="{ly}" stroke="{c}" stroke-width="{w}"{d}/><text x="{tx}" y="{ly}" font-size="13" dominant-baseline="middle">{year}</text>"#,
            lx = lx,
            lx2 = lx + 30.0,
            ly = ly,
            c = style.color,
            w = style.width,
            d = dash,
            tx = lx + 38.0,
            year = year
        )?;
    }

    svg.push_str("</svg>\n");
    Ok(svg)
}

/// Renders an HTML page around the SVG chart
pub fn render_html(kind: ChartKind, svg: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n{svg}</body>\n</html>\n",
        title = escape(kind.title()),
        svg = svg
    )
}

/// Paths of the files written for one chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedChart {
    pub html: PathBuf,
    pub image: PathBuf,
}

fn write_file(path: &Path, content: &str) -> Result<(), ExportError> {
    fs::write(path, content).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `<basename>.html` and `<basename>.svg` into `output_dir`
pub fn export_chart(
    kind: ChartKind,
    series: &CumulativeSeries,
    current_year: i32,
    tick_interval: usize,
    output_dir: &Path,
) -> Result<ExportedChart, ExportError> {
    if series.years.is_empty() {
        return Err(ExportError::EmptyChart(kind.basename().to_string()));
    }

    let svg = render_svg(kind, series, current_year, tick_interval)?;
    let html = output_dir.join(format!("{}.html", kind.basename()));
    let image = output_dir.join(format!("{}.svg", kind.basename()));

    write_file(&html, &render_html(kind, &svg))?;
    write_file(&image, &svg)?;

    Ok(ExportedChart { html, image })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::cumulative_counts;
    use tempfile::TempDir;

    fn sample_series() -> CumulativeSeries {
        let mut by_year = BTreeMap::new();
        by_year.insert(2024, vec![3, 8]);
        by_year.insert(2025, vec![1]);
        by_year.insert(2026, vec![2, 2, 9]);
        cumulative_counts(&by_year, 14)
    }

    #[test]
    fn test_pastel_color_format() {
        let color = pastel_color(0, 4);
        assert_eq!(color.len(), 7);
        assert!(color.starts_with('#'));
        assert!(color[1..].chars().all(|c| c.is_ascii_hexdigit()));
        // Hue 0 at lightness 0.8 is a light red
        assert_eq!(color, "#E5B2B2");
    }

    #[test]
    fn test_pastel_colors_are_distinct() {
        let colors: Vec<String> = (0..9).map(|i| pastel_color(i, 9)).collect();
        for (i, a) in colors.iter().enumerate() {
            for b in colors.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_pastel_handles_zero_total() {
        assert_eq!(pastel_color(0, 0), pastel_color(0, 1));
    }

    #[test]
    fn test_current_year_is_solid_red() {
        let styles = line_styles([2024, 2025, 2026].iter(), 2026);
        let current = &styles[&2026];
        assert_eq!(current.color, CURRENT_YEAR_COLOR);
        assert!(!current.dashed);
        assert!(styles[&2024].dashed);
        assert_ne!(styles[&2024].color, CURRENT_YEAR_COLOR);
    }

    #[test]
    fn test_svg_contains_every_year_and_ticks() {
        let svg = render_svg(ChartKind::Counts, &sample_series(), 2026, 7).unwrap();

        assert_eq!(svg.matches("<polyline").count(), 3);
        assert!(svg.contains(">2024</text>"));
        assert!(svg.contains("Jan 01"));
        assert!(svg.contains("Jan 08"));
        assert!(!svg.contains("Jan 02"));
        assert!(svg.contains(CURRENT_YEAR_COLOR));
    }

    #[test]
    fn test_export_writes_fixed_names() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let exported =
            export_chart(ChartKind::Amounts, &sample_series(), 2026, 7, temp_dir.path()).unwrap();

        assert_eq!(exported.html, temp_dir.path().join("nih_award_amounts.html"));
        assert_eq!(exported.image, temp_dir.path().join("nih_award_amounts.svg"));
        let html = fs::read_to_string(&exported.html).unwrap();
        assert!(html.contains("<svg"));
        assert!(html.contains("Award Dollars"));
    }

    #[test]
    fn test_export_rejects_empty_chart() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let empty = cumulative_counts(&BTreeMap::new(), 10);
        let result = export_chart(ChartKind::Counts, &empty, 2026, 7, temp_dir.path());
        assert!(matches!(result, Err(ExportError::EmptyChart(_))));
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(0.0), "0");
        assert_eq!(format_value(2500.0), "2.5k");
        assert_eq!(format_value(3_200_000.0), "3.2M");
        assert_eq!(format_value(1_500_000_000.0), "1.5B");
    }
}
