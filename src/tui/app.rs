use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::app::UIConfig;
use crate::backend::{ServiceTag, UploadFile};
use crate::session::{SessionController, SessionState};

/// Which part of the UI receives key presses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Viewing chat, keys scroll
    Normal,
    /// Typing into the message box
    Insert,
    /// Entering a `:` command
    Command,
}

/// Application state for the terminal front end.
/// Conversation state lives in the controller; this only holds view concerns.
pub struct App {
    pub controller: SessionController,
    pub ui: UIConfig,
    pub running: bool,
    pub mode: InputMode,
    /// Command line buffer for `:` commands
    pub command_input: String,
    /// Lines scrolled back from the newest message
    pub scroll_offset: u16,
    pub status_message: Option<String>,
    pub show_help: bool,
    /// Frame counter for the loading animation
    pub tick: u64,
    seen_messages: usize,
    status_tx: mpsc::UnboundedSender<String>,
    status_rx: mpsc::UnboundedReceiver<String>,
}

impl App {
    pub fn new(controller: SessionController, ui: UIConfig) -> Self {
        let (status_tx, status_rx) = mpsc::unbounded_channel();
        Self {
            controller,
            ui,
            running: true,
            mode: InputMode::Insert,
            command_input: String::new(),
            scroll_offset: 0,
            status_message: None,
            show_help: false,
            tick: 0,
            seen_messages: 0,
            status_tx,
            status_rx,
        }
    }

    /// Called once per frame with a fresh snapshot
    pub fn on_frame(&mut self, state: &SessionState) {
        self.tick = self.tick.wrapping_add(1);

        // Keep the newest message in view after every append
        if state.messages.len() != self.seen_messages {
            self.seen_messages = state.messages.len();
            self.scroll_offset = 0;
        }

        while let Ok(status) = self.status_rx.try_recv() {
            self.status_message = Some(status);
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn push_char(&self, c: char) {
        self.controller.edit_draft(|draft| draft.push(c));
    }

    pub fn pop_char(&self) {
        self.controller.edit_draft(|draft| {
            draft.pop();
        });
    }

    /// Send the draft unless the input control is disabled.
    /// The user message and draft clear happen here; only the backend call is spawned.
    pub fn submit(&mut self) {
        let state = self.controller.snapshot();
        if !state.input_enabled() {
            self.set_status(state.connectivity.label());
            return;
        }

        if let Some(pending) = self.controller.start_draft_submission() {
            let controller = self.controller.clone();
            tokio::spawn(async move {
                controller.finish_submission(pending).await;
            });
        }
    }

    pub fn cycle_service(&mut self) {
        let next = self.controller.snapshot().active_service.cycle();
        self.select_service(next);
    }

    pub fn select_service(&mut self, service: ServiceTag) {
        self.controller.select_service(service);
        self.set_status(format!("Service: {}", service.display_name()));
    }

    pub fn quick_prompt(&mut self, index: usize) {
        if self.controller.apply_quick_prompt(index) {
            self.mode = InputMode::Insert;
        }
    }

    pub fn check_health(&mut self) {
        self.set_status("Checking API health...");
        let controller = self.controller.clone();
        let tx = self.status_tx.clone();
        tokio::spawn(async move {
            let status = controller.check_health().await;
            let _ = tx.send(status.label().to_string());
        });
    }

    pub fn initialize_agents(&mut self) {
        self.set_status("Initializing agents...");
        let controller = self.controller.clone();
        let tx = self.status_tx.clone();
        tokio::spawn(async move {
            let status = controller.initialize_agents().await;
            let _ = tx.send(status.label().to_string());
        });
    }

    pub fn upload(&mut self, paths: Vec<PathBuf>) {
        if paths.is_empty() {
            self.set_status("Usage: :upload <file> [file...]");
            return;
        }
        if self.controller.snapshot().uploading {
            self.set_status("An upload is already in progress");
            return;
        }

        self.set_status(format!("Uploading {} file(s)...", paths.len()));
        let controller = self.controller.clone();
        let tx = self.status_tx.clone();
        tokio::spawn(async move {
            let mut files = Vec::with_capacity(paths.len());
            for path in &paths {
                match UploadFile::from_path(path).await {
                    Ok(file) => files.push(file),
                    Err(e) => {
                        let _ = tx.send(format!("✗ {}", e));
                        return;
                    }
                }
            }
            controller.upload_files(files).await;
            let _ = tx.send("Upload finished".to_string());
        });
    }

    pub fn list_files(&mut self) {
        let controller = self.controller.clone();
        let tx = self.status_tx.clone();
        tokio::spawn(async move {
            let status = match controller.refresh_files().await {
                Ok(files) if files.is_empty() => "Knowledge base is empty".to_string(),
                Ok(files) => format!("Knowledge base: {}", files.join(", ")),
                Err(e) => format!("✗ Could not list files: {}", e),
            };
            let _ = tx.send(status);
        });
    }

    pub fn scroll_up(&mut self, amount: u16) {
        self.scroll_offset = self.scroll_offset.saturating_add(amount);
    }

    pub fn scroll_down(&mut self, amount: u16) {
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
    }

    pub fn quit(&mut self) {
        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SimulatedGateway;
    use crate::session::{ConnectivityStatus, Message};
    use std::sync::Arc;
    use std::time::Duration;

    fn app() -> App {
        let controller = SessionController::new(Arc::new(SimulatedGateway::new(Duration::ZERO)));
        App::new(controller, UIConfig::default())
    }

    #[test]
    fn test_typing_edits_the_draft() {
        let app = app();
        for c in "hey".chars() {
            app.push_char(c);
        }
        app.pop_char();
        assert_eq!(app.controller.snapshot().draft_input, "he");
    }

    #[test]
    fn test_new_messages_reset_scroll() {
        let mut app = app();
        app.scroll_up(10);

        let mut state = SessionState::default();
        app.on_frame(&state);
        assert_eq!(app.scroll_offset, 10);

        state.messages.push(Message::user("hi"));
        app.on_frame(&state);
        assert_eq!(app.scroll_offset, 0);
    }

    #[tokio::test]
    async fn test_submit_is_blocked_while_offline() {
        let mut app = app();
        app.quick_prompt(0);
        app.submit();

        assert!(app.controller.snapshot().messages.is_empty());
        assert_eq!(app.status_message.as_deref(), Some("Checking status..."));
    }

    #[tokio::test]
    async fn test_typing_during_submit_starts_a_fresh_draft() {
        let controller = SessionController::with_state(
            Arc::new(SimulatedGateway::new(Duration::from_secs(60))),
            SessionState {
                connectivity: ConnectivityStatus::Connected,
                ..SessionState::default()
            },
        );
        let mut app = App::new(controller, UIConfig::default());
        for c in "hello".chars() {
            app.push_char(c);
        }

        app.submit();
        app.push_char('x');

        let state = app.controller.snapshot();
        assert!(state.pending_submission);
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].text, "hello");
        assert_eq!(state.draft_input, "x");
    }

    #[test]
    fn test_cycle_service() {
        let mut app = app();
        app.cycle_service();
        assert_eq!(app.controller.snapshot().active_service, ServiceTag::Investment);
    }
}
