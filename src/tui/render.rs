use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::backend::ServiceTag;
use crate::constants::{PRODUCT_NAME, PRODUCT_TAGLINE, QUICK_PROMPTS, UI_DEFAULT_VIEWPORT_HEIGHT};
use crate::session::{ConnectivityStatus, Message, MessageTone, Sender, SessionState};
use crate::tui::app::{App, InputMode};
use crate::tui::markdown::render_markdown;

/// Render the main UI
pub fn render_ui(frame: &mut Frame, app: &App, state: &SessionState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(1), // Service selector
            Constraint::Min(6),    // Chat
            Constraint::Length(3), // Input
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_header(frame, chunks[0], state);
    render_services(frame, chunks[1], state.active_service);
    render_chat(frame, chunks[2], app, state);
    render_input(frame, chunks[3], app, state);
    render_status_bar(frame, chunks[4], app, state);

    if app.show_help {
        render_help(frame);
    }
}

fn connectivity_color(status: ConnectivityStatus) -> Color {
    match status {
        ConnectivityStatus::Connected => Color::Green,
        ConnectivityStatus::AgentsNotReady => Color::Yellow,
        ConnectivityStatus::ApiDown | ConnectivityStatus::InitializationFailed => Color::Red,
        ConnectivityStatus::Unknown => Color::Gray,
    }
}

fn render_header(frame: &mut Frame, area: Rect, state: &SessionState) {
    let status = state.connectivity;
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            PRODUCT_NAME,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" · {}", PRODUCT_TAGLINE), Style::default().fg(Color::Gray)),
        Span::raw("   "),
        Span::styled("● ", Style::default().fg(connectivity_color(status))),
        Span::raw(if status.is_online() { "Online" } else { "Offline" }),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray)),
    )
    .alignment(Alignment::Center);

    frame.render_widget(header, area);
}

fn render_services(frame: &mut Frame, area: Rect, active: ServiceTag) {
    let mut spans = vec![Span::styled(" Service: ", Style::default().fg(Color::DarkGray))];
    for service in ServiceTag::ALL {
        let style = if service == active {
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {} ", service.display_name()), style));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled(
        format!("(Tab) {}", active.description()),
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn tone_style(tone: MessageTone) -> Style {
    match tone {
        MessageTone::Normal => Style::default(),
        MessageTone::Error => Style::default().fg(Color::Red),
        MessageTone::Success => Style::default().fg(Color::Green),
    }
}

fn message_lines(message: &Message, show_timestamps: bool) -> Vec<Line<'static>> {
    let (label, color) = match (message.sender, message.tone) {
        (Sender::User, _) => ("You".to_string(), Color::Blue),
        (Sender::Assistant, MessageTone::Error) => (format!("{} ✗", PRODUCT_NAME), Color::Red),
        (Sender::Assistant, MessageTone::Success) => (format!("{} ✓", PRODUCT_NAME), Color::Green),
        (Sender::Assistant, MessageTone::Normal) => match message.service {
            Some(service) => (format!("{} · {}", PRODUCT_NAME, service.display_name()), Color::Cyan),
            None => (PRODUCT_NAME.to_string(), Color::Cyan),
        },
    };

    let mut header = vec![Span::styled(
        format!("[{}]", label),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )];
    if show_timestamps {
        header.push(Span::styled(
            format!(" {}", message.timestamp),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let mut lines = vec![Line::from(header)];
    match message.sender {
        Sender::User => lines.extend(message.text.lines().map(|l| Line::from(l.to_string()))),
        Sender::Assistant => lines.extend(render_markdown(&message.text, tone_style(message.tone))),
    }
    lines.push(Line::from(""));
    lines
}

fn welcome_lines(app: &App, state: &SessionState) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            format!("Welcome to {} - A FinancialAI", PRODUCT_NAME),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(
            "Get personalized investment advice, find qualified advisors, and access the latest market research.",
        ),
        Line::from(""),
    ];

    if app.ui.show_quick_prompts {
        lines.push(Line::from(Span::styled(
            "Or try these examples:",
            Style::default().fg(Color::Gray),
        )));
        for (idx, prompt) in QUICK_PROMPTS.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(format!("  F{} ", idx + 1), Style::default().fg(Color::Yellow)),
                Span::raw(prompt.to_string()),
            ]));
        }
        lines.push(Line::from(""));
    }

    if !state.connectivity.is_online() {
        lines.push(Line::from(Span::styled(
            format!(
                "{}. Start the API server, then run :init to initialize agents or :health to re-check.",
                state.connectivity.label()
            ),
            Style::default().fg(Color::Yellow),
        )));
    }
    lines
}

/// Rows a line occupies once wrapped to `width`
fn wrapped_height(line: &Line<'_>, width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows = line.width().max(1).div_ceil(width);
    u16::try_from(rows).unwrap_or(u16::MAX)
}

fn render_chat(frame: &mut Frame, area: Rect, app: &App, state: &SessionState) {
    let mut lines: Vec<Line<'static>> = if state.messages.is_empty() {
        welcome_lines(app, state)
    } else {
        state
            .messages
            .iter()
            .flat_map(|m| message_lines(m, app.ui.show_timestamps))
            .collect()
    };

    if state.pending_submission {
        let dots = ".".repeat((app.tick / 8 % 4) as usize);
        lines.push(Line::from(Span::styled(
            format!("Analyzing your request{}", dots),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
        )));
    }
    if state.uploading {
        lines.push(Line::from(Span::styled(
            "Uploading to knowledge base...",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        )));
    }

    // Scroll so the newest line sits at the bottom, minus whatever the user scrolled back
    let inner_width = area.width.saturating_sub(2);
    let viewport = if area.height > 2 {
        area.height - 2
    } else {
        UI_DEFAULT_VIEWPORT_HEIGHT
    };
    let total: u16 = lines
        .iter()
        .fold(0u16, |acc, l| acc.saturating_add(wrapped_height(l, inner_width)));
    let max_scroll = total.saturating_sub(viewport);
    let top = max_scroll.saturating_sub(app.scroll_offset.min(max_scroll));

    let title = format!(" Chat [{}] ", state.active_service.display_name());
    let chat = Paragraph::new(lines)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .wrap(Wrap { trim: false })
        .scroll((top, 0));

    frame.render_widget(chat, area);
}

fn render_input(frame: &mut Frame, area: Rect, app: &App, state: &SessionState) {
    let (text, style, title, border) = match app.mode {
        InputMode::Command => (
            format!(":{}", app.command_input),
            Style::default().fg(Color::White),
            " Enter Command ",
            Color::Yellow,
        ),
        _ if !state.input_enabled() || state.draft_input.is_empty() => {
            let (text, style) = if state.draft_input.is_empty() {
                (
                    state.input_placeholder().to_string(),
                    Style::default().fg(Color::DarkGray),
                )
            } else {
                (state.draft_input.clone(), Style::default().fg(Color::Gray))
            };
            let border = if state.input_enabled() {
                Color::DarkGray
            } else {
                Color::Red
            };
            (text, style, " Message (Enter to send • Esc then : for commands) ", border)
        }
        _ => (
            state.draft_input.clone(),
            Style::default().fg(Color::White),
            " Message (Enter to send • Esc then : for commands) ",
            Color::Cyan,
        ),
    };

    let input = Paragraph::new(text).style(style).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(title),
    );
    frame.render_widget(input, area);

    let cursor_offset = match app.mode {
        InputMode::Command => app.command_input.chars().count() + 1,
        InputMode::Insert => state.draft_input.chars().count(),
        InputMode::Normal => return,
    };
    let cursor_x = (area.x + 1 + cursor_offset as u16).min(area.x + area.width.saturating_sub(2));
    frame.set_cursor_position((cursor_x, area.y + 1));
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App, state: &SessionState) {
    let (mode_str, mode_color) = match app.mode {
        InputMode::Normal => ("NORMAL", Color::Blue),
        InputMode::Insert => ("INSERT", Color::Green),
        InputMode::Command => ("COMMAND", Color::Yellow),
    };

    let status_text = if let Some(status) = &app.status_message {
        status.clone()
    } else if state.pending_submission {
        "Waiting for the advisory agents...".to_string()
    } else {
        state.connectivity.label().to_string()
    };

    let spans = vec![
        Span::styled(
            format!(" {} ", mode_str),
            Style::default()
                .bg(mode_color)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled("● ", Style::default().fg(connectivity_color(state.connectivity))),
        Span::raw(status_text),
        Span::raw(" | "),
        Span::raw(format!("Docs: {}", state.uploads.len())),
        Span::raw(" | "),
        Span::styled(
            "Tab: service  F1-F4: examples  ?: help  Ctrl+C: quit",
            Style::default().fg(Color::DarkGray),
        ),
    ];

    let status_bar = Paragraph::new(Line::from(spans))
        .style(Style::default().bg(Color::Black))
        .block(Block::default());
    frame.render_widget(status_bar, area);
}

fn render_help(frame: &mut Frame) {
    let area = frame.area();
    let width = area.width.min(64);
    let height = area.height.min(18);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    let rows = [
        (":health", "Re-check API and agent status (Ctrl+R)"),
        (":init", "Initialize agents"),
        (":upload <files>", "Upload documents in one request"),
        (":files", "List knowledge base documents"),
        (":service <id>", "investment | advisor | research | all"),
        (":quit / :q", "Quit"),
        ("Tab", "Cycle service"),
        ("F1-F4", "Fill an example prompt"),
        ("i / Esc", "Insert / normal mode"),
        ("Up/Down, PgUp/PgDn", "Scroll the conversation"),
        ("?", "Toggle this help"),
    ];
    let lines: Vec<Line> = rows
        .iter()
        .map(|(key, desc)| {
            Line::from(vec![
                Span::styled(
                    format!("  {:<20}", key),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ),
                Span::styled(*desc, Style::default().fg(Color::Gray)),
            ])
        })
        .collect();

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help "),
        ),
        popup,
    );
}
