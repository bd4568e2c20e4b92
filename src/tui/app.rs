//! Rendering and event loop for the terminal user interface.
//!
//! `App` draws a [`Session`] with ratatui and feeds it crossterm key events.
//! All state transitions live in the session; this module only translates
//! keys and paints.

use std::io;
use std::time::Duration;

use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};

use crate::db::format_due_input;
use crate::fields::Priority;
use crate::tree::{ItemId, Listable};
use crate::tui::{
    colors::{DARK_GREEN, DARK_PURPLE, DARK_RED, GOLD},
    enums::{Flow, Input, Mode, Notice},
    item_form::{ItemForm, ItemKind},
    session::Session,
    utils::centered_rect,
};

pub struct App {
    session: Session,
    list_state: TableState,
}

/// Translate a terminal key event into a session input.
pub fn map_key(key: KeyEvent) -> Option<Input> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let input = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Input::Interrupt,
        KeyCode::Char('t') if key.modifiers.contains(KeyModifiers::ALT) => Input::ToggleTarget,
        KeyCode::Char(c) => Input::Char(c),
        KeyCode::Enter => Input::Enter,
        KeyCode::Esc => Input::Esc,
        KeyCode::Up => Input::Up,
        KeyCode::Down => Input::Down,
        KeyCode::Left => Input::Left,
        KeyCode::Right => Input::Right,
        KeyCode::Tab => Input::Tab,
        KeyCode::BackTab => Input::BackTab,
        KeyCode::Backspace => Input::Backspace,
        KeyCode::Delete => Input::Delete,
        _ => return None,
    };
    Some(input)
}

/// Terminal cell for a text cursor inside a bordered field, kept within
/// the field's inner width.
fn cursor_position(chunk: Rect, cursor: usize) -> (u16, u16) {
    let offset = u16::try_from(cursor).unwrap_or(u16::MAX);
    let right_edge = chunk.x.saturating_add(chunk.width.saturating_sub(2));
    let x = chunk.x.saturating_add(1).saturating_add(offset).min(right_edge);
    (x, chunk.y.saturating_add(1))
}

fn key_help(mode: &Mode) -> &'static str {
    match mode {
        Mode::Browsing => {
            "enter: open/toggle  n: new  e: edit  d: delete  f: sort  p: preview  /: filter  b: back  r: reload  q: quit"
        }
        Mode::EditingFields(_) => "tab/↓: next  shift+tab/↑: prev  alt+t: task/folder  enter: save  esc: cancel",
        Mode::DeleteStaging(_) => "d: stage  c: confirm  esc: cancel  ↑/↓ enter b: navigate",
        Mode::SortSelecting => "1: priority  2: name  3: completion  esc: cancel",
    }
}

impl App {
    pub fn new(session: Session) -> Self {
        App {
            session,
            list_state: TableState::default(),
        }
    }

    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if let Some(input) = map_key(key) {
                    return Ok(self.session.handle(input, Local::now()) == Flow::Quit);
                }
            }
        }
        Ok(false)
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let title = self.session.title();
        let mut lines = title.lines();
        let path = lines.next().unwrap_or_default().to_string();
        let mut summary = lines.next().unwrap_or_default().to_string();
        if let Some(folder) = self.session.tree().folder(self.session.current_folder()) {
            summary.push_str(&format!("  ({:.0}% done)", folder.status().progress() * 100.0));
        }
        let text = vec![
            Line::from(vec![
                Span::styled(path, Style::default().add_modifier(Modifier::BOLD)),
                Span::raw("  "),
                Span::styled(
                    format!("[{}]", self.session.mode().label()),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
                ),
            ]),
            Line::from(summary),
        ];
        let header = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title(format!(" tt: {} ", self.session.store().path().display())))
            .alignment(Alignment::Left);
        f.render_widget(header, area);
    }

    fn render_list(&mut self, f: &mut Frame, area: Rect) {
        let tree = self.session.tree();
        let entries = self.session.visible_entries();
        let total = tree.entries(self.session.current_folder()).len();

        let header_cells = ["Name", "Status", "Due", "Priority"]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD)));
        let header = Row::new(header_cells)
            .style(Style::default().bg(DARK_GREEN).fg(Color::White))
            .height(1);

        let rows: Vec<Row> = entries
            .iter()
            .filter_map(|id| match *id {
                ItemId::Folder(fid) => tree.folder(fid).map(|folder| {
                    let style = if folder.is_pending_deletion() {
                        Style::default().fg(DARK_RED).add_modifier(Modifier::CROSSED_OUT)
                    } else {
                        Style::default().fg(GOLD)
                    };
                    Row::new(vec![
                        Cell::from(folder.title()),
                        Cell::from(folder.status().summary()),
                        Cell::from("-"),
                        Cell::from("-"),
                    ])
                    .style(style)
                }),
                ItemId::Task(tid) => tree.task(tid).map(|task| {
                    let mark = if task.completed { "[x]" } else { "[ ]" };
                    let state = if task.completed {
                        "done"
                    } else if task.overdue {
                        "overdue"
                    } else {
                        "open"
                    };
                    let style = if task.is_pending_deletion() {
                        Style::default().fg(DARK_RED).add_modifier(Modifier::CROSSED_OUT)
                    } else if task.completed {
                        Style::default().fg(Color::DarkGray)
                    } else if task.overdue {
                        Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(Color::White)
                    };
                    let priority = match task.priority {
                        Priority::None => "-",
                        other => other.token(),
                    };
                    Row::new(vec![
                        Cell::from(format!("{mark} {}", task.title())),
                        Cell::from(state),
                        Cell::from(task.due.map(format_due_input).unwrap_or_else(|| "-".to_string())),
                        Cell::from(priority),
                    ])
                    .style(style)
                }),
            })
            .collect();

        let widths = [
            Constraint::Min(20),    // Name
            Constraint::Length(28), // Status
            Constraint::Length(16), // Due
            Constraint::Length(9),  // Priority
        ];

        let title = match self.session.filter() {
            Some(filter) if !filter.query.is_empty() => {
                format!("Items ({}/{}) filtered by '{}'", entries.len(), total, filter.query)
            }
            _ => format!("Items ({total})"),
        };
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        self.list_state
            .select(if entries.is_empty() { None } else { Some(self.session.selected()) });
        f.render_stateful_widget(table, area, &mut self.list_state);
    }

    fn render_side_panel(&self, f: &mut Frame, area: Rect) {
        let tree = self.session.tree();
        let text = if self.session.status_message().is_empty() {
            self.session
                .selected_item()
                .and_then(|id| tree.item(id))
                .map(|item| item.description().to_string())
                .unwrap_or_default()
        } else {
            self.session.status_message().to_string()
        };
        let panel = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("Details"))
            .wrap(Wrap { trim: false });
        f.render_widget(panel, area);
    }

    fn render_form(&self, f: &mut Frame, area: Rect, form: &ItemForm) {
        let noun = match form.kind() {
            ItemKind::Task => "Task",
            ItemKind::Folder => "Folder",
        };
        let verb = if form.is_editing() { "Edit" } else { "New" };
        let block = Block::default()
            .title(format!("{verb} {noun}"))
            .borders(Borders::ALL)
            .style(Style::default().bg(DARK_PURPLE));

        let area = centered_rect(60, 60, area);
        f.render_widget(Clear, area);
        f.render_widget(block, area);

        let fields = form.fields();
        let mut constraints: Vec<Constraint> = fields.iter().map(|_| Constraint::Length(3)).collect();
        constraints.push(Constraint::Length(1)); // Error
        constraints.push(Constraint::Min(0)); // Instructions
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints(constraints)
            .split(area);

        for (field_id, chunk) in fields.iter().zip(chunks.iter()) {
            let border_style = if *field_id == form.focus() {
                Style::default().fg(GOLD)
            } else {
                Style::default()
            };
            let input = Paragraph::new(form.field(*field_id).value.as_str()).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(field_id.label())
                    .border_style(border_style),
            );
            f.render_widget(input, *chunk);
        }

        if let Some(err) = &form.error {
            let error = Paragraph::new(err.to_string()).style(Style::default().fg(Color::LightRed));
            f.render_widget(error, chunks[fields.len()]);
        }

        let toggle_hint = if form.is_editing() { "" } else { "  alt+t: switch task/folder" };
        let instructions = Paragraph::new(format!("enter: save  esc: cancel{toggle_hint}"))
            .style(Style::default().fg(Color::Gray))
            .wrap(Wrap { trim: true });
        f.render_widget(instructions, chunks[fields.len() + 1]);

        if let Some(i) = fields.iter().position(|id| *id == form.focus()) {
            let chunk = chunks[i];
            let field = form.field(form.focus());
            f.set_cursor_position(cursor_position(chunk, field.cursor));
        }
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let (text, bg) = match (self.session.notice(), self.session.filter()) {
            (Some(Notice::Info(msg)), _) => (msg.clone(), DARK_GREEN),
            (Some(notice), _) => (notice.text().to_string(), DARK_RED),
            (None, Some(filter)) if filter.editing => (
                format!("Filter: {} (Esc to clear, Enter to confirm)", filter.query),
                DARK_GREEN,
            ),
            (None, _) => (key_help(self.session.mode()).to_string(), DARK_GREEN),
        };
        let status = Paragraph::new(text)
            .style(Style::default().bg(bg).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        self.render_header(f, chunks[0]);
        self.render_list(f, body[0]);
        self.render_side_panel(f, body[1]);
        if let Mode::EditingFields(form) = self.session.mode() {
            self.render_form(f, chunks[1], form);
        }
        self.render_status_bar(f, chunks[2]);
    }

    /// Main event loop. Statuses of the visible folders are brought up to
    /// date before every frame.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            self.session.refresh(Local::now());
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}
