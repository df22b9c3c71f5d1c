//! UI rendering and layout utilities

use crate::constants::{audio::MAX_DB, ui::BAR_BORDER_WIDTH};
use crate::levels::{Glow, LEGEND, REFERENCE_GUIDE};
use crate::state::MeterReadout;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Sparkline},
};

/// Terminal colour for a band's glow
pub fn glow_color(glow: Glow) -> Color {
    match glow {
        Glow::Cyan => Color::Rgb(34, 211, 238),
        Glow::Yellow => Color::Rgb(250, 204, 21),
        Glow::Orange => Color::Rgb(251, 146, 60),
        Glow::Red => Color::Rgb(239, 68, 68),
    }
}

/// Format seconds as `m:ss`
pub fn format_time(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Create a gradient bar showing the level, coloured by loudness zone
pub fn create_gradient_bar(width: usize, ratio: f64) -> Line<'static> {
    let ratio = ratio.clamp(0.0, 1.0);
    let filled = (ratio * width as f64) as usize;
    let partial_fill = (ratio * width as f64) - filled as f64;
    let mut spans = Vec::with_capacity(width);

    for i in 0..width {
        let db = (i as f64 + 0.5) / width as f64 * MAX_DB as f64;
        let color = glow_color(crate::levels::classify(db as u32).style_tag);

        let ch = if i < filled {
            '█'
        } else if i == filled && partial_fill > 0.0 {
            match (partial_fill * 8.0) as usize {
                0..=1 => '░',
                2..=3 => '▒',
                4..=5 => '▓',
                _ => '█',
            }
        } else {
            '░'
        };
        spans.push(Span::styled(ch.to_string(), Style::default().fg(color)));
    }

    Line::from(spans)
}

/// Vertical frequency bars drawn with eighth-block characters
pub fn create_frequency_rows(bars: &[f32], height: usize) -> Vec<Line<'static>> {
    const LEVELS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    let mut rows = Vec::with_capacity(height);

    for row in (0..height).rev() {
        let spans = bars
            .iter()
            .map(|&value| {
                let cells = value.clamp(0.0, 1.0) as f64 * height as f64;
                let fill = (cells - row as f64).clamp(0.0, 1.0);
                let ch = LEVELS[(fill * 8.0).round() as usize];
                let color = if value > 0.75 {
                    glow_color(Glow::Red)
                } else if value > 0.5 {
                    glow_color(Glow::Orange)
                } else if value > 0.25 {
                    glow_color(Glow::Yellow)
                } else {
                    glow_color(Glow::Cyan)
                };
                Span::styled(ch.to_string(), Style::default().fg(color))
            })
            .collect::<Vec<_>>();
        rows.push(Line::from(spans));
    }

    rows
}

/// Render the complete UI
pub fn render_ui(f: &mut Frame, state: &MeterReadout) {
    let size = f.size();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(size);

    render_meter(f, rows[0], state);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(columns[0]);

    render_spectrum(f, left[0], state);
    render_history(f, left[1], state);
    render_stats(f, columns[1], state);

    let help = match &state.error {
        Some(error) => Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))),
        None => Line::from(
            "[space] start/stop  [r] reset peak  [c] clear session  [q] quit",
        ),
    };
    f.render_widget(Paragraph::new(help), rows[2]);
}

fn render_meter(f: &mut Frame, area: Rect, state: &MeterReadout) {
    let color = glow_color(state.display_level.style_tag);
    let title = if state.is_listening {
        "Listening"
    } else {
        "Stopped"
    };

    let bar_width = (area.width as usize).saturating_sub(BAR_BORDER_WIDTH);
    let headline = Line::from(vec![
        Span::styled(
            format!("{:>3} dB  ", state.decibels),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(state.display_level.label, Style::default().fg(color)),
    ]);
    let legend = Line::from(
        LEGEND
            .iter()
            .flat_map(|&(label, glow)| {
                [
                    Span::styled("■ ", Style::default().fg(glow_color(glow))),
                    Span::raw(format!("{}  ", label)),
                ]
            })
            .collect::<Vec<_>>(),
    );

    let meter = Paragraph::new(vec![
        headline,
        create_gradient_bar(bar_width, state.display_ratio()),
        legend,
    ])
    .block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(meter, area);
}

fn render_spectrum(f: &mut Frame, area: Rect, state: &MeterReadout) {
    let height = (area.height as usize).saturating_sub(BAR_BORDER_WIDTH);
    let spectrum = Paragraph::new(create_frequency_rows(&state.frequency_bars, height))
        .block(Block::default().title("Frequency").borders(Borders::ALL));
    f.render_widget(spectrum, area);
}

fn render_history(f: &mut Frame, area: Rect, state: &MeterReadout) {
    let data: Vec<u64> = state.db_history.iter().map(|&db| db as u64).collect();
    let history = Sparkline::default()
        .block(Block::default().title("History").borders(Borders::ALL))
        .data(&data)
        .max(MAX_DB as u64)
        .style(Style::default().fg(glow_color(Glow::Cyan)));
    f.render_widget(history, area);
}

fn render_stats(f: &mut Frame, area: Rect, state: &MeterReadout) {
    let peak_level = state.peak_level();
    let session = if state.is_listening {
        format_time(state.session_time)
    } else {
        "--:--".to_string()
    };

    let mut lines = vec![
        Line::from(vec![
            Span::raw("Peak     "),
            Span::styled(
                format!("{} dB", state.peak_decibels),
                Style::default().fg(glow_color(peak_level.style_tag)),
            ),
        ]),
        Line::from(format!("Average  {} dB", state.avg_decibels)),
        Line::from(format!("Session  {}", session)),
        Line::from(""),
        Line::from(Span::styled(
            "Reference Guide",
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];

    for &(label, db, glow) in REFERENCE_GUIDE.iter() {
        lines.push(Line::from(vec![
            Span::raw(format!("{:<14}", label)),
            Span::styled(format!("{} dB", db), Style::default().fg(glow_color(glow))),
        ]));
    }

    let stats = Paragraph::new(lines).block(Block::default().title("Session").borders(Borders::ALL));
    f.render_widget(stats, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(65), "1:05");
        assert_eq!(format_time(600), "10:00");
    }

    #[test]
    fn test_gradient_bar_fill() {
        let line = create_gradient_bar(10, 0.5);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "█████░░░░░");
    }

    #[test]
    fn test_frequency_rows_shape() {
        let rows = create_frequency_rows(&[0.0, 1.0, 0.5], 4);
        assert_eq!(rows.len(), 4);
        let top: String = rows[0].spans.iter().map(|s| s.content.as_ref()).collect();
        let bottom: String = rows[3].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(top, " █ ");
        assert_eq!(bottom, " ██");
    }
}
