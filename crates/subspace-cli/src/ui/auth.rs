//! Sign-in / register dialog — shown while unauthenticated.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use crate::app::{App, AuthField, AuthTab};

/// Render the auth dialog centered in `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let dialog = centered_rect(50, 10, area);

  let block = Block::default()
    .title(" Account access ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(dialog);
  f.render_widget(block, dialog);

  let active_tab = Style::default()
    .fg(Color::Black)
    .bg(Color::Cyan)
    .add_modifier(Modifier::BOLD);
  let inactive_tab = Style::default().fg(Color::DarkGray);

  let (sign_in_style, register_style) = match app.auth_tab {
    AuthTab::SignIn => (active_tab, inactive_tab),
    AuthTab::Register => (inactive_tab, active_tab),
  };

  let tabs = Line::from(vec![
    Span::styled(" Sign in ", sign_in_style),
    Span::raw("  "),
    Span::styled(" Register ", register_style),
  ]);

  let field_line = |label: &str, value: &str, active: bool| {
    let marker = if active { "_" } else { "" };
    let style = if active {
      Style::default().fg(Color::Yellow)
    } else {
      Style::default()
    };
    Line::from(vec![
      Span::raw(format!("{label:<10}")),
      Span::styled(format!("{value}{marker}"), style),
    ])
  };

  // Passwords never render as typed.
  let masked = "•".repeat(app.auth_password.chars().count());

  let mut lines = vec![
    tabs,
    Line::raw(""),
    field_line(
      "Email:",
      &app.auth_email,
      app.auth_field == AuthField::Email,
    ),
    field_line("Password:", &masked, app.auth_field == AuthField::Password),
    Line::raw(""),
  ];

  if let Some(error) = &app.auth_error {
    lines.push(Line::from(Span::styled(
      error.clone(),
      Style::default().fg(Color::Red),
    )));
  } else {
    let verb = match app.auth_tab {
      AuthTab::SignIn => "sign in",
      AuthTab::Register => "register",
    };
    lines.push(Line::from(Span::styled(
      format!("Press Enter to {verb}."),
      Style::default().fg(Color::DarkGray),
    )));
  }

  f.render_widget(Paragraph::new(lines), inner);
}

/// A `width` x `height` rectangle centered within `area`, clamped to fit.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
  let width = width.min(area.width);
  let height = height.min(area.height);
  Rect {
    x: area.x + (area.width - width) / 2,
    y: area.y + (area.height - height) / 2,
    width,
    height,
  }
}
