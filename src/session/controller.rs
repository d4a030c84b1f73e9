use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::message::{Message, MessageId};
use super::state::{ConnectivityStatus, SessionState};
use crate::backend::{BackendError, BackendGateway, ServiceTag, UploadFile};
use crate::constants::{
    AGENTS_NOT_READY_TEXT, API_UNREACHABLE_TEXT, GENERIC_FAILURE_TEXT, QUICK_PROMPTS,
    SUBMISSION_CANCELLED_TEXT, UPLOAD_CANCELLED_TEXT, UPLOAD_FAILURE_TEXT,
};

/// What happened to a submit request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank text or a submission already in flight; nothing changed
    Ignored,
    /// The backend answered; carries the reply's id
    Replied(MessageId),
    /// The backend failed; carries the error message's id
    Failed(MessageId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Ignored,
    Uploaded { files: usize, records: usize },
    Failed,
}

/// Text shown in the conversation for a failed chat call
pub fn failure_text(err: &BackendError) -> &'static str {
    match err {
        BackendError::AgentsNotInitialized(_) => AGENTS_NOT_READY_TEXT,
        BackendError::NetworkUnavailable(_) => API_UNREACHABLE_TEXT,
        _ => GENERIC_FAILURE_TEXT,
    }
}

fn upload_success_text(files: usize) -> String {
    format!(
        "Successfully uploaded {} file(s) to knowledge base. You can now ask questions about these documents.",
        files
    )
}

#[derive(Debug, Clone, Copy)]
enum InFlight {
    Submission,
    Upload,
}

/// Owns a raised `pending_submission` / `uploading` flag.
/// If dropped while armed the flag is cleared and an error message closes out the request,
/// so a cancelled future never leaves the session locked.
struct InFlightGuard {
    state: Arc<Mutex<SessionState>>,
    kind: InFlight,
    armed: bool,
}

impl InFlightGuard {
    fn new(state: Arc<Mutex<SessionState>>, kind: InFlight) -> Self {
        Self {
            state,
            kind,
            armed: true,
        }
    }

    /// The request completed normally and its owner already lowered the flag
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock();
        match self.kind {
            InFlight::Submission => {
                warn!("Submission dropped before the backend replied");
                state.pending_submission = false;
                state.messages.push(Message::error(SUBMISSION_CANCELLED_TEXT));
            }
            InFlight::Upload => {
                warn!("Upload dropped before the backend replied");
                state.uploading = false;
                state.messages.push(Message::error(UPLOAD_CANCELLED_TEXT));
            }
        }
    }
}

/// A submission whose user message is already in the log, waiting for its reply.
///
/// Hand it to [`SessionController::finish_submission`]. Dropping it instead closes the
/// cycle with an error message.
pub struct PendingSubmission {
    text: String,
    service: ServiceTag,
    guard: InFlightGuard,
}

impl PendingSubmission {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn service(&self) -> ServiceTag {
        self.service
    }
}

/// Owns the conversation state and funnels every mutation through its operations.
///
/// Clones share the same session. The state lock is never held across a backend call,
/// so the UI can keep reading snapshots while a request is in flight.
#[derive(Clone)]
pub struct SessionController {
    gateway: Arc<dyn BackendGateway>,
    state: Arc<Mutex<SessionState>>,
}

impl SessionController {
    pub fn new(gateway: Arc<dyn BackendGateway>) -> Self {
        Self::with_state(gateway, SessionState::default())
    }

    pub fn with_state(gateway: Arc<dyn BackendGateway>, state: SessionState) -> Self {
        Self {
            gateway,
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn gateway_name(&self) -> String {
        self.gateway.name().to_string()
    }

    /// Copy of the current state for rendering
    pub fn snapshot(&self) -> SessionState {
        self.state.lock().clone()
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        self.state.lock().draft_input = text.into();
    }

    /// Edit the draft in place under the state lock
    pub fn edit_draft(&self, edit: impl FnOnce(&mut String)) {
        edit(&mut self.state.lock().draft_input);
    }

    /// Fill the draft with one of the example prompts
    pub fn apply_quick_prompt(&self, index: usize) -> bool {
        match QUICK_PROMPTS.get(index) {
            Some(prompt) => {
                self.set_draft(*prompt);
                true
            }
            None => false,
        }
    }

    /// Switch the active service. Messages and uploads are untouched.
    pub fn select_service(&self, service: ServiceTag) {
        debug!("Active service -> {}", service);
        self.state.lock().active_service = service;
    }

    /// Submit the current draft with the active service
    pub async fn submit_draft(&self) -> SubmitOutcome {
        match self.start_draft_submission() {
            Some(pending) => self.finish_submission(pending).await,
            None => SubmitOutcome::Ignored,
        }
    }

    /// Run one submit cycle: append the user message, call the backend,
    /// then append exactly one reply or error message.
    pub async fn submit_query(&self, text: &str, service: ServiceTag) -> SubmitOutcome {
        match self.start_submission(text, service) {
            Some(pending) => self.finish_submission(pending).await,
            None => SubmitOutcome::Ignored,
        }
    }

    /// First half of a submit cycle, without awaiting: records the user message,
    /// raises the pending flag and clears the draft. None when the text is blank
    /// or another submission is in flight.
    pub fn start_submission(&self, text: &str, service: ServiceTag) -> Option<PendingSubmission> {
        let mut state = self.state.lock();
        self.record_submission(&mut state, text.to_string(), service)
    }

    /// Like [`start_submission`](Self::start_submission) for the draft and active service,
    /// read and cleared under one lock
    pub fn start_draft_submission(&self) -> Option<PendingSubmission> {
        let mut state = self.state.lock();
        let (text, service) = (state.draft_input.clone(), state.active_service);
        self.record_submission(&mut state, text, service)
    }

    fn record_submission(
        &self,
        state: &mut SessionState,
        text: String,
        service: ServiceTag,
    ) -> Option<PendingSubmission> {
        if text.trim().is_empty() || state.pending_submission {
            debug!("Submit ignored (pending: {})", state.pending_submission);
            return None;
        }
        state.messages.push(Message::user(text.as_str()));
        state.pending_submission = true;
        state.draft_input.clear();

        Some(PendingSubmission {
            text,
            service,
            guard: InFlightGuard::new(self.state.clone(), InFlight::Submission),
        })
    }

    /// Second half of a submit cycle: call the backend and append the reply
    pub async fn finish_submission(&self, mut pending: PendingSubmission) -> SubmitOutcome {
        let result = self.gateway.chat(&pending.text, pending.service).await;

        let mut state = self.state.lock();
        let outcome = match result {
            Ok(response) => {
                let reply = Message::assistant(response, pending.service);
                let id = reply.id;
                state.messages.push(reply);
                SubmitOutcome::Replied(id)
            }
            Err(err) => {
                warn!("Chat call failed: {}", err);
                let message = Message::error(failure_text(&err));
                let id = message.id;
                state.messages.push(message);
                SubmitOutcome::Failed(id)
            }
        };
        state.pending_submission = false;
        pending.guard.disarm();
        outcome
    }

    /// Probe the backend and record the resulting connectivity
    pub async fn check_health(&self) -> ConnectivityStatus {
        let status = match self.gateway.health().await {
            Ok(report) if report.agents_initialized => ConnectivityStatus::Connected,
            Ok(_) => ConnectivityStatus::AgentsNotReady,
            Err(err) => {
                warn!("Health check failed: {}", err);
                ConnectivityStatus::ApiDown
            }
        };
        self.set_connectivity(status);
        status
    }

    /// Ask the backend to start its agents. No retry; callers may invoke again.
    pub async fn initialize_agents(&self) -> ConnectivityStatus {
        let status = match self.gateway.initialize().await {
            Ok(()) => {
                info!("Agents initialized");
                ConnectivityStatus::Connected
            }
            Err(err) if err.is_transport() => {
                warn!("Initialize request failed: {}", err);
                ConnectivityStatus::ApiDown
            }
            Err(err) => {
                warn!("Agent initialization rejected: {}", err);
                ConnectivityStatus::InitializationFailed
            }
        };
        self.set_connectivity(status);
        status
    }

    fn set_connectivity(&self, status: ConnectivityStatus) {
        debug!("Connectivity -> {:?}", status);
        self.state.lock().connectivity = status;
    }

    /// Send all files in a single request and report the result in the conversation
    pub async fn upload_files(&self, files: Vec<UploadFile>) -> UploadOutcome {
        if files.is_empty() {
            return UploadOutcome::Ignored;
        }
        {
            let mut state = self.state.lock();
            if state.uploading {
                debug!("Upload ignored, another is in flight");
                return UploadOutcome::Ignored;
            }
            state.uploading = true;
        }
        let mut guard = InFlightGuard::new(self.state.clone(), InFlight::Upload);

        let result = self.gateway.upload(&files).await;

        let mut state = self.state.lock();
        let outcome = match result {
            Ok(records) => {
                let count = records.len();
                state.uploads.extend(records);
                // Reports files submitted, not records returned
                state.messages.push(Message::success(upload_success_text(files.len())));
                UploadOutcome::Uploaded {
                    files: files.len(),
                    records: count,
                }
            }
            Err(err) => {
                warn!("Upload failed: {}", err);
                state.messages.push(Message::error(UPLOAD_FAILURE_TEXT));
                UploadOutcome::Failed
            }
        };
        state.uploading = false;
        guard.disarm();
        outcome
    }

    /// Documents the backend currently holds. Does not touch session state.
    pub async fn refresh_files(&self) -> Result<Vec<String>, BackendError> {
        self.gateway.list_files().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{HealthReport, MockBackendGateway, UploadRecord};
    use crate::session::message::Sender;
    use pretty_assertions::assert_eq;

    fn controller(mock: MockBackendGateway) -> SessionController {
        SessionController::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn test_successful_submit_appends_reply() {
        let mut mock = MockBackendGateway::new();
        mock.expect_chat()
            .withf(|msg, service| {
                msg == "I want to invest $50,000 in a balanced portfolio"
                    && *service == ServiceTag::Investment
            })
            .times(1)
            .returning(|_, _| Ok("**INVESTMENT ANALYSIS** ...".to_string()));
        let ctl = controller(mock);

        let outcome = ctl
            .submit_query(
                "I want to invest $50,000 in a balanced portfolio",
                ServiceTag::Investment,
            )
            .await;

        let state = ctl.snapshot();
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[0].sender, Sender::User);
        let reply = &state.messages[1];
        assert_eq!(outcome, SubmitOutcome::Replied(reply.id));
        assert_eq!(reply.text, "**INVESTMENT ANALYSIS** ...");
        assert_eq!(reply.service, Some(ServiceTag::Investment));
        assert!(!reply.is_error());
        assert!(!state.pending_submission);
    }

    #[tokio::test]
    async fn test_failure_text_follows_error_kind() {
        let cases = [
            (
                BackendError::NetworkUnavailable("connection refused".into()),
                API_UNREACHABLE_TEXT,
            ),
            (
                BackendError::AgentsNotInitialized("Agents not initialized.".into()),
                AGENTS_NOT_READY_TEXT,
            ),
            (
                BackendError::HttpError {
                    status: 500,
                    message: "Internal server error".into(),
                },
                GENERIC_FAILURE_TEXT,
            ),
            (BackendError::InvalidResponse("eof".into()), GENERIC_FAILURE_TEXT),
        ];

        for (err, expected) in cases {
            let mut mock = MockBackendGateway::new();
            let returned = err.clone();
            mock.expect_chat().returning(move |_, _| Err(returned.clone()));
            let ctl = controller(mock);

            let outcome = ctl.submit_query("hello", ServiceTag::All).await;
            let state = ctl.snapshot();
            let last = state.last_message().unwrap();
            assert_eq!(outcome, SubmitOutcome::Failed(last.id));
            assert!(last.is_error());
            assert_eq!(last.text, expected, "for {:?}", err);
            assert_eq!(state.messages.len(), 2);
        }
    }

    #[tokio::test]
    async fn test_blank_text_is_ignored() {
        let mut mock = MockBackendGateway::new();
        mock.expect_chat().never();
        let ctl = controller(mock);

        assert_eq!(ctl.submit_query("   \n", ServiceTag::All).await, SubmitOutcome::Ignored);
        assert!(ctl.snapshot().messages.is_empty());
    }

    #[test]
    fn test_dropped_submission_closes_the_cycle() {
        let ctl = controller(MockBackendGateway::new());

        let pending = ctl.start_submission("hello", ServiceTag::All).unwrap();
        assert!(ctl.snapshot().pending_submission);
        assert!(ctl.start_submission("again", ServiceTag::All).is_none());

        drop(pending);
        let state = ctl.snapshot();
        assert!(!state.pending_submission);
        assert_eq!(state.messages.len(), 2);
        assert!(state.messages[1].is_error());
        assert_eq!(state.messages[1].text, SUBMISSION_CANCELLED_TEXT);
        assert!(ctl.start_submission("again", ServiceTag::All).is_some());
    }

    #[test]
    fn test_keystrokes_after_start_do_not_restore_the_draft() {
        let ctl = controller(MockBackendGateway::new());
        ctl.set_draft("hello");

        let pending = ctl.start_draft_submission().unwrap();
        assert_eq!(pending.text(), "hello");
        assert_eq!(ctl.snapshot().draft_input, "");

        ctl.edit_draft(|draft| draft.push('x'));
        assert_eq!(ctl.snapshot().draft_input, "x");
        ctl.edit_draft(|draft| {
            draft.pop();
        });
        assert_eq!(ctl.snapshot().draft_input, "");
        assert_eq!(ctl.snapshot().messages[0].text, "hello");
    }

    #[tokio::test]
    async fn test_submit_draft_uses_active_service_and_clears_draft() {
        let mut mock = MockBackendGateway::new();
        mock.expect_chat()
            .withf(|msg, service| msg == "Find me a financial advisor in Charlotte, NC" && *service == ServiceTag::Advisor)
            .returning(|_, _| Ok("matches".to_string()));
        let ctl = controller(mock);

        ctl.select_service(ServiceTag::Advisor);
        assert!(ctl.apply_quick_prompt(1));
        ctl.submit_draft().await;

        let state = ctl.snapshot();
        assert_eq!(state.draft_input, "");
        assert_eq!(state.messages[1].service, Some(ServiceTag::Advisor));
    }

    #[tokio::test]
    async fn test_select_service_leaves_history_alone() {
        let mut mock = MockBackendGateway::new();
        mock.expect_chat().returning(|_, _| Ok("ok".to_string()));
        mock.expect_upload()
            .returning(|_| Ok(vec![UploadRecord { file_name: "a.pdf".into() }]));
        let ctl = controller(mock);
        ctl.submit_query("hi", ServiceTag::All).await;
        ctl.upload_files(vec![UploadFile::new("a.pdf", "x")]).await;
        let before = ctl.snapshot();

        for service in ServiceTag::ALL {
            ctl.select_service(service);
        }

        let after = ctl.snapshot();
        assert_eq!(after.messages, before.messages);
        assert_eq!(after.uploads, before.uploads);
        assert_eq!(after.active_service, ServiceTag::Research);
    }

    #[test]
    fn test_quick_prompt_out_of_range() {
        let ctl = controller(MockBackendGateway::new());
        assert!(!ctl.apply_quick_prompt(QUICK_PROMPTS.len()));
        assert_eq!(ctl.snapshot().draft_input, "");
    }

    #[tokio::test]
    async fn test_health_maps_to_connectivity() {
        let cases = [
            (Ok(true), ConnectivityStatus::Connected),
            (Ok(false), ConnectivityStatus::AgentsNotReady),
            (Err(()), ConnectivityStatus::ApiDown),
        ];

        for (reply, expected) in cases {
            let mut mock = MockBackendGateway::new();
            mock.expect_health().returning(move || match reply {
                Ok(ready) => Ok(HealthReport {
                    status: Some("healthy".into()),
                    agents_initialized: ready,
                }),
                Err(()) => Err(BackendError::NetworkUnavailable("refused".into())),
            });
            let ctl = controller(mock);

            assert_eq!(ctl.check_health().await, expected);
            assert_eq!(ctl.snapshot().connectivity, expected);
            assert!(ctl.snapshot().messages.is_empty());
        }
    }

    #[tokio::test]
    async fn test_initialize_maps_to_connectivity() {
        let mut rejected = MockBackendGateway::new();
        rejected.expect_initialize().returning(|| {
            Err(BackendError::InitializationRejected {
                status: 500,
                message: "Failed to initialize agents".into(),
            })
        });
        assert_eq!(
            controller(rejected).initialize_agents().await,
            ConnectivityStatus::InitializationFailed
        );

        let mut unreachable = MockBackendGateway::new();
        unreachable
            .expect_initialize()
            .returning(|| Err(BackendError::NetworkUnavailable("refused".into())));
        assert_eq!(
            controller(unreachable).initialize_agents().await,
            ConnectivityStatus::ApiDown
        );
    }

    #[tokio::test]
    async fn test_initialize_twice_sends_two_requests() {
        let mut mock = MockBackendGateway::new();
        mock.expect_initialize().times(2).returning(|| Ok(()));
        let ctl = controller(mock);

        assert_eq!(ctl.initialize_agents().await, ConnectivityStatus::Connected);
        assert_eq!(ctl.initialize_agents().await, ConnectivityStatus::Connected);
        assert!(ctl.snapshot().messages.is_empty());
    }

    #[tokio::test]
    async fn test_empty_upload_is_noop() {
        let mut mock = MockBackendGateway::new();
        mock.expect_upload().never();
        let ctl = controller(mock);

        assert_eq!(ctl.upload_files(Vec::new()).await, UploadOutcome::Ignored);
        let state = ctl.snapshot();
        assert!(state.messages.is_empty());
        assert!(state.uploads.is_empty());
        assert!(!state.uploading);
    }

    #[tokio::test]
    async fn test_upload_message_counts_submitted_files() {
        let mut mock = MockBackendGateway::new();
        mock.expect_upload()
            .withf(|files| files.len() == 2)
            .times(1)
            .returning(|_| Ok(vec![UploadRecord { file_name: "f1.pdf".into() }]));
        let ctl = controller(mock);

        let outcome = ctl
            .upload_files(vec![UploadFile::new("f1.pdf", "a"), UploadFile::new("f2.exe", "b")])
            .await;

        assert_eq!(outcome, UploadOutcome::Uploaded { files: 2, records: 1 });
        let state = ctl.snapshot();
        assert_eq!(state.uploads.len(), 1);
        assert_eq!(state.messages.len(), 1);
        let message = &state.messages[0];
        assert!(message.is_success());
        assert!(message.text.contains("uploaded 2 file(s)"));
        assert!(!state.uploading);
    }

    #[tokio::test]
    async fn test_upload_failure_appends_error() {
        let mut mock = MockBackendGateway::new();
        mock.expect_upload().returning(|_| {
            Err(BackendError::HttpError {
                status: 400,
                message: "No valid files uploaded".into(),
            })
        });
        let ctl = controller(mock);

        assert_eq!(
            ctl.upload_files(vec![UploadFile::new("a.png", "x")]).await,
            UploadOutcome::Failed
        );
        let state = ctl.snapshot();
        assert!(state.uploads.is_empty());
        assert_eq!(state.messages.len(), 1);
        assert!(state.messages[0].is_error());
        assert_eq!(state.messages[0].text, UPLOAD_FAILURE_TEXT);
        assert!(!state.uploading);
    }

    #[tokio::test]
    async fn test_refresh_files_does_not_touch_state() {
        let mut mock = MockBackendGateway::new();
        mock.expect_list_files()
            .returning(|| Ok(vec!["statement.pdf".to_string()]));
        let ctl = controller(mock);

        assert_eq!(ctl.refresh_files().await.unwrap(), vec!["statement.pdf"]);
        assert!(ctl.snapshot().uploads.is_empty());
    }
}
