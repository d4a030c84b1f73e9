/// Session management module - Gateway

mod controller;
mod message;
mod state;

pub use controller::{
    failure_text, PendingSubmission, SessionController, SubmitOutcome, UploadOutcome,
};
pub use message::{Message, MessageId, MessageTone, Sender};
pub use state::{ConnectivityStatus, SessionState};
