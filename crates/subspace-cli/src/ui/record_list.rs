//! Record list and entry form — left panel.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::app::{App, FormField};

/// Render the record list (and the entry form, when active) into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let block = Block::default()
    .title(format!(" Subscriptions ({}) ", app.records.len()))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let mut inner = block.inner(area);
  f.render_widget(block, area);

  // Entry form occupies the bottom row of the pane while active.
  if app.form_active && inner.height > 1 {
    let form_area = Rect {
      x:      inner.x,
      y:      inner.y + inner.height - 1,
      width:  inner.width,
      height: 1,
    };
    inner.height -= 1;
    draw_form(f, form_area, app);
  }

  if !app.records_loaded {
    f.render_widget(
      Paragraph::new(Span::styled(
        "Loading subscriptions…",
        Style::default().fg(Color::DarkGray),
      )),
      inner,
    );
    return;
  }

  if app.records.is_empty() {
    f.render_widget(
      Paragraph::new(Span::styled(
        "No subscriptions added yet.",
        Style::default().fg(Color::DarkGray),
      )),
      inner,
    );
    return;
  }

  let items: Vec<ListItem> = app
    .records
    .iter()
    .enumerate()
    .map(|(i, record)| {
      let style = if i == app.list_cursor {
        Style::default()
          .bg(Color::Blue)
          .fg(Color::White)
          .add_modifier(Modifier::BOLD)
      } else {
        Style::default()
      };

      ListItem::new(Line::from(vec![
        Span::styled(format!("{:<24}", record.name), style),
        Span::styled(format!("${:>8.2}  ", record.price), style),
        Span::styled(record.due_date.to_string(), style),
      ]))
    })
    .collect();

  let mut state = ListState::default();
  state.select(Some(app.list_cursor));

  f.render_stateful_widget(
    List::new(items)
      .highlight_style(
        Style::default()
          .bg(Color::Blue)
          .fg(Color::White)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol(""),
    inner,
    &mut state,
  );
}

/// One-line entry form: `Name [..] Price [..] Date [..]`.
fn draw_form(f: &mut Frame, area: Rect, app: &App) {
  let field = |label: &str, value: &str, active: bool| {
    let style = if active {
      Style::default().fg(Color::Yellow)
    } else {
      Style::default().fg(Color::Gray)
    };
    let marker = if active { "_" } else { "" };
    vec![
      Span::styled(format!("{label}: "), Style::default().fg(Color::DarkGray)),
      Span::styled(format!("{value}{marker}  "), style),
    ]
  };

  let mut spans = Vec::new();
  spans.extend(field(
    "Name",
    &app.draft.name,
    app.form_field == FormField::Name,
  ));
  spans.extend(field(
    "Price",
    &app.draft.price,
    app.form_field == FormField::Price,
  ));
  spans.extend(field(
    "Date (YYYY-MM-DD)",
    &app.draft.due_date,
    app.form_field == FormField::DueDate,
  ));

  f.render_widget(Paragraph::new(Line::from(spans)), area);
}
