#![forbid(unsafe_code)]

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

use crate::error::VibeError;
use crate::tui;

#[derive(Debug, Clone)]
pub struct PickerItem {
    pub label: String,
    pub detail: String,
}

/// Filter-as-you-type single selection. `Ok(None)` on cancel.
pub fn pick_one(title: &str, items: &[PickerItem]) -> Result<Option<usize>, VibeError> {
    let selection = run_picker(title, items, false)?;
    Ok(selection.and_then(|s| s.into_iter().next()))
}

/// Multi selection (Tab toggles). The chosen subset in the order the user
/// toggled it, with Enter on an untoggled list meaning "just the highlighted
/// item". Empty on cancel.
pub fn pick_many(title: &str, items: &[PickerItem]) -> Result<Vec<usize>, VibeError> {
    Ok(run_picker(title, items, true)?.unwrap_or_default())
}

fn run_picker(
    title: &str,
    items: &[PickerItem],
    multi: bool,
) -> Result<Option<Vec<usize>>, VibeError> {
    if items.is_empty() {
        return Ok(None);
    }
    if !tui::is_tty() {
        return Err(VibeError::Other(
            "interactive selection requires a TTY".to_owned(),
        ));
    }

    let terminal = tui::init_terminal()?;
    let mut guard = TerminalGuard::new(terminal);

    let lower_labels: Vec<String> = items.iter().map(|i| i.label.to_lowercase()).collect();

    let mut query = String::new();
    let mut filtered: Vec<usize> = (0..items.len()).collect();
    let mut cursor = 0usize;
    let mut list_state = ListState::default();
    list_state.select(Some(0));
    let mut toggled: Vec<usize> = Vec::new();

    loop {
        let terminal = guard
            .terminal
            .as_mut()
            .ok_or_else(|| VibeError::Other("terminal unavailable".to_owned()))?;
        terminal
            .draw(|f| {
                draw_ui(
                    f,
                    title,
                    items,
                    &query,
                    &filtered,
                    cursor,
                    &toggled,
                    multi,
                    &mut list_state,
                );
            })
            .map_err(|e| VibeError::Other(format!("failed to draw picker: {e}")))?;

        if !event::poll(Duration::from_millis(50))
            .map_err(|e| VibeError::Other(format!("event poll failed: {e}")))?
        {
            continue;
        }
        let Event::Key(key) =
            event::read().map_err(|e| VibeError::Other(format!("event read failed: {e}")))?
        else {
            continue;
        };

        match handle_key(
            key,
            &lower_labels,
            &mut query,
            &mut filtered,
            &mut cursor,
            &mut list_state,
            &mut toggled,
            multi,
        ) {
            KeyOutcome::Continue => {}
            KeyOutcome::Cancel => return Ok(None),
            KeyOutcome::Accept => {
                let selection = if multi && !toggled.is_empty() {
                    toggled
                } else {
                    vec![filtered.get(cursor).copied().unwrap_or(0)]
                };
                return Ok(Some(selection));
            }
        }
    }
}

enum KeyOutcome {
    Continue,
    Accept,
    Cancel,
}

#[allow(clippy::too_many_arguments)]
fn handle_key(
    key: KeyEvent,
    lower_labels: &[String],
    query: &mut String,
    filtered: &mut Vec<usize>,
    cursor: &mut usize,
    list_state: &mut ListState,
    toggled: &mut Vec<usize>,
    multi: bool,
) -> KeyOutcome {
    if key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c')) {
        return KeyOutcome::Cancel;
    }

    match key.code {
        KeyCode::Esc => return KeyOutcome::Cancel,
        KeyCode::Enter => return KeyOutcome::Accept,
        KeyCode::Tab => {
            if multi && let Some(&idx) = filtered.get(*cursor) {
                if let Some(pos) = toggled.iter().position(|&t| t == idx) {
                    toggled.remove(pos);
                } else {
                    toggled.push(idx);
                }
            }
        }
        KeyCode::Up => {
            if *cursor > 0 {
                *cursor -= 1;
                list_state.select(Some(*cursor));
            }
        }
        KeyCode::Down => {
            if *cursor + 1 < filtered.len() {
                *cursor += 1;
                list_state.select(Some(*cursor));
            }
        }
        KeyCode::Backspace => {
            query.pop();
            recompute_filter(query, lower_labels, filtered, cursor, list_state);
        }
        KeyCode::Char(c) => {
            if !key.modifiers.contains(KeyModifiers::CONTROL)
                && !key.modifiers.contains(KeyModifiers::ALT)
            {
                query.push(c);
                recompute_filter(query, lower_labels, filtered, cursor, list_state);
            }
        }
        _ => {}
    }

    KeyOutcome::Continue
}

fn recompute_filter(
    query: &str,
    lower_labels: &[String],
    filtered: &mut Vec<usize>,
    cursor: &mut usize,
    list_state: &mut ListState,
) {
    let q = query.to_lowercase();
    if q.is_empty() {
        *filtered = (0..lower_labels.len()).collect();
    } else {
        *filtered = lower_labels
            .iter()
            .enumerate()
            .filter_map(|(i, l)| l.contains(&q).then_some(i))
            .collect();
    }

    if filtered.is_empty() {
        *filtered = (0..lower_labels.len()).collect();
    }

    if *cursor >= filtered.len() {
        *cursor = 0;
    }
    list_state.select(Some(*cursor));
}

#[allow(clippy::too_many_arguments)]
fn draw_ui(
    f: &mut Frame<'_>,
    title: &str,
    items: &[PickerItem],
    query: &str,
    filtered: &[usize],
    cursor: usize,
    toggled: &[usize],
    multi: bool,
    list_state: &mut ListState,
) {
    let area = f.area();
    let outer = Block::default().title(title).borders(Borders::ALL);
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[0]);

    let list_items: Vec<ListItem> = filtered
        .iter()
        .map(|&idx| {
            let mut line = items[idx].label.clone();
            if multi {
                let marker = if toggled.contains(&idx) { "[x] " } else { "[ ] " };
                line = format!("{marker}{line}");
            }
            ListItem::new(Line::from(line))
        })
        .collect();

    let list = List::new(list_items)
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">");
    f.render_stateful_widget(list, body[0], list_state);

    let detail_idx = filtered.get(cursor).copied().unwrap_or(0);
    let detail = Paragraph::new(items[detail_idx].detail.clone())
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    f.render_widget(detail, body[1]);

    let help = if multi {
        "↑/↓ move • Tab toggle • Enter accept • Esc cancel"
    } else {
        "↑/↓ move • Enter accept • Esc cancel"
    };
    let footer = Paragraph::new(Line::from(vec![
        Span::styled("> ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(query),
        Span::raw("  "),
        Span::styled(help, Style::default().fg(Color::DarkGray)),
    ]));
    f.render_widget(footer, chunks[1]);
}

struct TerminalGuard {
    terminal: Option<ratatui::Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>>,
}

impl TerminalGuard {
    fn new(
        terminal: ratatui::Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>,
    ) -> Self {
        Self {
            terminal: Some(terminal),
        }
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Some(terminal) = self.terminal.take() {
            let _ = tui::restore_terminal(terminal);
        }
    }
}
