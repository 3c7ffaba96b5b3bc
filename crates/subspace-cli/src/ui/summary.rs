//! Due-payments summary — right panel.
//!
//! Recomputed from the in-memory record list on every frame; the evaluation
//! is pure, so this is just a projection of the latest snapshot.

use chrono::{Datelike as _, Local};
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Wrap},
};
use subspace_core::due::{evaluate_due_payments, format_due_date};

use crate::app::App;

/// Render the due-payment summary into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let block = Block::default()
    .title(" Due this month ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let today = Local::now().date_naive();
  let summary = evaluate_due_payments(&app.records, today.day());

  let mut lines = vec![
    Line::from(vec![
      Span::raw("Payments left this month: "),
      Span::styled(
        summary.count.to_string(),
        Style::default().add_modifier(Modifier::BOLD),
      ),
    ]),
    Line::from(vec![
      Span::raw("Total price to pay: "),
      Span::styled(
        format!("${:.2}", summary.total),
        Style::default().add_modifier(Modifier::BOLD),
      ),
    ]),
    Line::raw(""),
    Line::from(Span::styled(
      "Subscriptions left to pay:",
      Style::default().fg(Color::Gray),
    )),
  ];

  if summary.due.is_empty() {
    lines.push(Line::from(Span::styled(
      "No upcoming payments this month.",
      Style::default().fg(Color::DarkGray),
    )));
  } else {
    for record in &summary.due {
      lines.push(Line::from(Span::raw(format!(
        "{} - ${:.2} (Due: {})",
        record.name,
        record.price,
        format_due_date(record, today),
      ))));
    }
  }

  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
