//! Terminal rendering for awardpace
//!
//! Draws the finished charts inline below the run's log output using ratatui,
//! without taking over the screen.

pub mod chart;

use std::io::{self, IsTerminal};

use ratatui::{backend::CrosstermBackend, Terminal, TerminalOptions, Viewport};

use crate::aggregate::CumulativeSeries;
use crate::export::ChartKind;

/// Height of the inline preview in rows
const PREVIEW_HEIGHT: u16 = 24;

/// Draws a chart inline on stdout if it is a terminal
///
/// Returns `Ok(false)` when stdout is not a terminal and nothing was drawn.
pub fn preview(kind: ChartKind, series: &CumulativeSeries, current_year: i32) -> io::Result<bool> {
    let stdout = io::stdout();
    if !stdout.is_terminal() {
        return Ok(false);
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::with_options(
        backend,
        TerminalOptions {
            viewport: Viewport::Inline(PREVIEW_HEIGHT),
        },
    )?;
    terminal.draw(|frame| {
        let area = frame.area();
        chart::render(frame, area, kind, series, current_year);
    })?;
    println!();
    Ok(true)
}
