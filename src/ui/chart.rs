//! Terminal preview of a cumulative chart

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

use crate::aggregate::CumulativeSeries;
use crate::export::{pastel_rgb, ChartKind};

/// Points for one year, x = day index
fn year_points(values: &[f64]) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64, *v))
        .collect()
}

/// Color for a year, matching the exported chart
fn year_color(index: usize, total: usize, is_current: bool) -> Color {
    if is_current {
        Color::Red
    } else {
        let (r, g, b) = pastel_rgb(index, total);
        Color::Rgb(r, g, b)
    }
}

/// Renders the chart for all years into `area`
pub fn render(
    frame: &mut Frame,
    area: Rect,
    kind: ChartKind,
    series: &CumulativeSeries,
    current_year: i32,
) {
    let points: Vec<(i32, Vec<(f64, f64)>)> = series
        .years
        .iter()
        .map(|(year, values)| (*year, year_points(values)))
        .collect();
    let others = points.iter().filter(|(y, _)| *y != current_year).count();

    let mut other_index = 0;
    let datasets: Vec<Dataset> = points
        .iter()
        .map(|(year, data)| {
            let is_current = *year == current_year;
            let color = year_color(other_index, others, is_current);
            if !is_current {
                other_index += 1;
            }
            let mut style = Style::default().fg(color);
            if is_current {
                style = style.add_modifier(Modifier::BOLD);
            }
            Dataset::default()
                .name(year.to_string())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(style)
                .data(data)
        })
        .collect();

    let last_day = series.days().saturating_sub(1);
    let max_value = series.max_value().max(1.0);
    let first_label = series.labels.first().cloned().unwrap_or_default();
    let last_label = series.labels.last().cloned().unwrap_or_default();

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(kind.title(), Style::default().fg(Color::Cyan))),
        )
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, last_day.max(1) as f64])
                .labels(vec![first_label, last_label]),
        )
        .y_axis(
            Axis::default()
                .title(kind.y_label())
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, max_value])
                .labels(vec![
                    "0".to_string(),
                    format!("{:.0}", max_value / 2.0),
                    format!("{:.0}", max_value),
                ]),
        );

    frame.render_widget(chart, area);
}
