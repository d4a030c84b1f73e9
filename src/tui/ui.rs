use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::backend::ServiceTag;
use crate::constants::{UI_REFRESH_INTERVAL_MS, UI_SCROLL_LINES};
use crate::tui::app::{App, InputMode};
use crate::tui::render::render_ui;
use crate::utils::FinovaError;

/// Run the terminal UI
pub async fn run_ui(mut app: App) -> Result<()> {
    // Check if we have an interactive terminal
    if !crossterm::tty::IsTty::is_tty(&io::stdout()) {
        eprintln!("❌ Finova requires an interactive terminal.");
        eprintln!("   For scripted use, pass a prompt: finova -p \"...\"");
        return Err(FinovaError::NoTerminal.into());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Run the UI loop
    let res = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    while app.running {
        let state = app.controller.snapshot();
        app.on_frame(&state);
        terminal.draw(|f| render_ui(f, app, &state))?;

        // Poll without blocking the runtime so spawned backend calls keep progressing
        let has_event = tokio::task::block_in_place(|| {
            event::poll(Duration::from_millis(UI_REFRESH_INTERVAL_MS))
        })?;
        if !has_event {
            tokio::task::yield_now().await;
            continue;
        }

        if let Event::Key(key) = event::read()? {
            handle_key(app, key);
        }
    }

    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global shortcuts that work in any mode
    if key.modifiers == KeyModifiers::CONTROL {
        match key.code {
            KeyCode::Char('c') => {
                app.quit();
                return;
            }
            KeyCode::Char('r') => {
                app.check_health();
                return;
            }
            _ => {}
        }
    }
    if let KeyCode::F(n @ 1..=4) = key.code {
        app.quick_prompt(usize::from(n - 1));
        return;
    }
    if key.code == KeyCode::Tab && app.mode != InputMode::Command {
        app.cycle_service();
        return;
    }

    match app.mode {
        InputMode::Normal => match key.code {
            KeyCode::Char('q') => app.quit(),
            KeyCode::Char('i') | KeyCode::Enter => app.mode = InputMode::Insert,
            KeyCode::Char(':') => {
                app.mode = InputMode::Command;
                app.command_input.clear();
            }
            KeyCode::Char('?') => app.show_help = !app.show_help,
            KeyCode::Up | KeyCode::Char('k') => app.scroll_up(1),
            KeyCode::Down | KeyCode::Char('j') => app.scroll_down(1),
            KeyCode::PageUp => app.scroll_up(UI_SCROLL_LINES * 5),
            KeyCode::PageDown => app.scroll_down(UI_SCROLL_LINES * 5),
            _ => {}
        },
        InputMode::Insert => match key.code {
            KeyCode::Esc => app.mode = InputMode::Normal,
            KeyCode::Enter => app.submit(),
            KeyCode::Char(c) => app.push_char(c),
            KeyCode::Backspace => app.pop_char(),
            KeyCode::Up => app.scroll_up(UI_SCROLL_LINES),
            KeyCode::Down => app.scroll_down(UI_SCROLL_LINES),
            _ => {}
        },
        InputMode::Command => match key.code {
            KeyCode::Esc => {
                app.mode = InputMode::Normal;
                app.command_input.clear();
            }
            KeyCode::Enter => {
                let command = std::mem::take(&mut app.command_input);
                app.mode = InputMode::Normal;
                handle_command(app, &command);
            }
            KeyCode::Char(c) => app.command_input.push(c),
            KeyCode::Backspace => {
                if app.command_input.pop().is_none() {
                    app.mode = InputMode::Normal;
                }
            }
            _ => {}
        },
    }
}

/// Execute a `:` command
pub(crate) fn handle_command(app: &mut App, command: &str) {
    let parts: Vec<&str> = command.split_whitespace().collect();

    match parts.first().copied() {
        Some("quit") | Some("q") => app.quit(),
        Some("health") => app.check_health(),
        Some("init") => app.initialize_agents(),
        Some("upload") | Some("u") => {
            let paths = parts[1..].iter().map(PathBuf::from).collect();
            app.upload(paths);
        }
        Some("files") => app.list_files(),
        Some("service") | Some("s") => match parts.get(1).map(|s| s.parse::<ServiceTag>()) {
            Some(Ok(service)) => app.select_service(service),
            Some(Err(e)) => app.set_status(e),
            None => {
                let current = app.controller.snapshot().active_service;
                app.set_status(format!("Current service: {}", current.display_name()));
            }
        },
        Some("help") | Some("h") => app.show_help = true,
        None => {}
        _ => app.set_status(format!("Unknown command: {}", command)),
    }
}
