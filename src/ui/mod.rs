use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use tokio::sync::mpsc;
use tracing::error;

use crate::agent::Agent;
use crate::session::Session;

mod colors {
    use ratatui::style::Color;

    pub const BASE: Color = Color::Rgb(30, 30, 46);
    pub const MANTLE: Color = Color::Rgb(24, 24, 37);
    pub const TEXT: Color = Color::Rgb(205, 214, 244);
    pub const SUBTEXT: Color = Color::Rgb(166, 173, 200);
    pub const SURFACE: Color = Color::Rgb(69, 71, 90);
    pub const BLUE: Color = Color::Rgb(137, 180, 250);
    pub const GREEN: Color = Color::Rgb(166, 227, 161);
    pub const RED: Color = Color::Rgb(243, 139, 168);
    pub const MAUVE: Color = Color::Rgb(203, 166, 247);
    pub const LAVENDER: Color = Color::Rgb(180, 190, 254);
}

/// Events the streaming worker sends back to the surface.
#[derive(Debug, Clone)]
enum UiEvent {
    AssistantChunk(String),
    TurnComplete,
    TurnFailed(String),
}

#[derive(Debug, Clone)]
struct DisplayMessage {
    role: &'static str,
    content: String,
    timestamp: String,
}

impl DisplayMessage {
    fn new(role: &'static str, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
        }
    }
}

#[derive(PartialEq, Eq)]
enum InputMode {
    Normal,
    Editing,
}

struct ChatSurface {
    running: bool,
    input_mode: InputMode,
    messages: Vec<DisplayMessage>,
    input: String,
    /// Streamed text of the in-flight turn. Rendered live but only appended
    /// to `messages` when the turn completes; a failed turn discards it.
    pending: String,
    busy: bool,
    status_line: String,
    scroll_offset: usize,
    input_tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<UiEvent>,
}

/// Full-screen chat surface. Turns stream token-by-token straight from the
/// model; no tools are offered in this mode. The surface owns the display
/// history, the worker task owns the session, and exactly one turn is in
/// flight at a time.
pub async fn run_chat_surface(agent: Agent, mut session: Session, greeting: &str) -> Result<()> {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        while let Some(input) = input_rx.recv().await {
            let mut on_chunk = |chunk: &str| {
                let _ = event_tx.send(UiEvent::AssistantChunk(chunk.to_string()));
            };
            match agent
                .run_streaming_turn(&input, &mut session, &mut on_chunk)
                .await
            {
                Ok(_) => {
                    let _ = event_tx.send(UiEvent::TurnComplete);
                }
                Err(err) => {
                    error!(error = %err, "streaming turn failed");
                    let _ = event_tx.send(UiEvent::TurnFailed(format!("{:#}", err)));
                }
            }
        }
    });

    let mut surface = ChatSurface {
        running: true,
        input_mode: InputMode::Normal,
        messages: vec![DisplayMessage::new("assistant", greeting)],
        input: String::new(),
        pending: String::new(),
        busy: false,
        status_line: "Ready | 'i' to type, 'q' to quit".to_string(),
        scroll_offset: 0,
        input_tx,
        rx: event_rx,
    };

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = surface.run_loop(&mut terminal);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

impl ChatSurface {
    fn run_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if event::poll(std::time::Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_keypress(key);
                    }
                }
            }

            while let Ok(event) = self.rx.try_recv() {
                self.handle_ui_event(event);
            }

            if !self.running {
                break;
            }
        }
        Ok(())
    }

    fn handle_ui_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::AssistantChunk(chunk) => {
                self.pending.push_str(&chunk);
                self.auto_scroll();
            }
            UiEvent::TurnComplete => {
                let text = self.pending.trim().to_string();
                if !text.is_empty() {
                    self.messages.push(DisplayMessage::new("assistant", text));
                }
                self.pending.clear();
                self.busy = false;
                self.status_line = "Ready | 'i' to type, 'q' to quit".to_string();
                self.auto_scroll();
            }
            UiEvent::TurnFailed(err) => {
                self.pending.clear();
                self.messages.push(DisplayMessage::new("error", &err));
                self.busy = false;
                self.status_line = format!("Turn failed: {}", err);
                self.auto_scroll();
            }
        }
    }

    fn handle_keypress(&mut self, key: KeyEvent) {
        match self.input_mode {
            InputMode::Normal => match key.code {
                KeyCode::Char('i') => {
                    self.input_mode = InputMode::Editing;
                    self.status_line = "Insert | Enter to send, Esc to cancel".to_string();
                }
                KeyCode::Char('q') => {
                    self.running = false;
                }
                KeyCode::Up => {
                    self.scroll_offset = self.scroll_offset.saturating_sub(1);
                }
                KeyCode::Down => {
                    if self.scroll_offset < self.messages.len().saturating_sub(1) {
                        self.scroll_offset += 1;
                    }
                }
                _ => {}
            },
            InputMode::Editing => match key.code {
                KeyCode::Enter => self.submit_input(),
                KeyCode::Char(c) => {
                    self.input.push(c);
                }
                KeyCode::Backspace => {
                    self.input.pop();
                }
                KeyCode::Esc => {
                    self.input_mode = InputMode::Normal;
                    self.status_line = "Ready | 'i' to type, 'q' to quit".to_string();
                }
                _ => {}
            },
        }
    }

    fn submit_input(&mut self) {
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return;
        }
        // One in-flight turn at a time; hold further input until it lands.
        if self.busy {
            self.status_line = "Still responding, one moment...".to_string();
            return;
        }

        self.messages.push(DisplayMessage::new("user", &text));
        self.auto_scroll();

        self.busy = true;
        self.status_line = "Nexus is responding...".to_string();
        let _ = self.input_tx.send(text);

        self.input.clear();
        self.input_mode = InputMode::Normal;
    }

    fn auto_scroll(&mut self) {
        if self.messages.len() > 10 {
            self.scroll_offset = self.messages.len().saturating_sub(10);
        }
    }

    fn render(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_messages(f, chunks[1]);
        self.render_input(f, chunks[2]);
        self.render_status(f, chunks[3]);
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let title = vec![
            Span::styled("● ", Style::default().fg(colors::GREEN)),
            Span::styled(
                "Nexus",
                Style::default()
                    .fg(colors::LAVENDER)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled("│", Style::default().fg(colors::SURFACE)),
            Span::raw(" "),
            Span::styled("Meg's Executive Assistant", Style::default().fg(colors::SUBTEXT)),
        ];

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(colors::SURFACE))
            .style(Style::default().bg(colors::MANTLE));

        f.render_widget(
            Paragraph::new(Line::from(title))
                .block(block)
                .style(Style::default().fg(colors::TEXT)),
            area,
        );
    }

    fn render_messages(&self, f: &mut Frame, area: Rect) {
        let mut items: Vec<ListItem> = self
            .messages
            .iter()
            .skip(self.scroll_offset)
            .map(|msg| message_item(msg.role, &msg.timestamp, &msg.content))
            .collect();

        // The in-flight reply renders live below the committed history.
        if self.busy {
            let shown = if self.pending.is_empty() {
                "…"
            } else {
                self.pending.as_str()
            };
            items.push(message_item("assistant", "now", shown));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(colors::SURFACE))
            .title(Line::from(Span::styled(
                " Conversation ",
                Style::default().fg(colors::TEXT).add_modifier(Modifier::BOLD),
            )))
            .style(Style::default().bg(colors::BASE));

        f.render_widget(
            List::new(items)
                .block(block)
                .style(Style::default().fg(colors::TEXT)),
            area,
        );
    }

    fn render_input(&self, f: &mut Frame, area: Rect) {
        let input_line = match self.input_mode {
            InputMode::Editing => Line::from(vec![
                Span::styled(
                    "❯ ",
                    Style::default().fg(colors::BLUE).add_modifier(Modifier::BOLD),
                ),
                Span::styled(&self.input, Style::default().fg(colors::TEXT)),
                Span::styled("█", Style::default().fg(colors::LAVENDER)),
            ]),
            InputMode::Normal => Line::from(Span::styled(
                "Press 'i' to enter your command...",
                Style::default()
                    .fg(colors::SUBTEXT)
                    .add_modifier(Modifier::ITALIC),
            )),
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if self.input_mode == InputMode::Editing {
                colors::BLUE
            } else {
                colors::SURFACE
            }))
            .style(Style::default().bg(colors::MANTLE));

        f.render_widget(
            Paragraph::new(input_line).block(block).wrap(Wrap { trim: false }),
            area,
        );
    }

    fn render_status(&self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(colors::SURFACE))
            .style(Style::default().bg(colors::MANTLE));

        f.render_widget(
            Paragraph::new(Line::from(Span::styled(
                &*self.status_line,
                Style::default().fg(colors::TEXT),
            )))
            .block(block),
            area,
        );
    }
}

fn message_item(role: &str, timestamp: &str, content: &str) -> ListItem<'static> {
    let (label, color, icon) = match role {
        "user" => ("Meg", colors::BLUE, "❯"),
        "assistant" => ("Nexus", colors::MAUVE, "●"),
        "error" => ("Error", colors::RED, "✗"),
        _ => ("?", colors::TEXT, "?"),
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(format!("{} ", icon), Style::default().fg(color)),
        Span::styled(
            format!("{:8}", label),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" │ ", Style::default().fg(colors::SURFACE)),
        Span::styled(timestamp.to_string(), Style::default().fg(colors::SUBTEXT)),
    ])];

    for line in content.lines() {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(line.to_string(), Style::default().fg(colors::TEXT)),
        ]));
    }
    lines.push(Line::from(""));

    ListItem::new(Text::from(lines))
}
