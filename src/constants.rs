/// Constants module to avoid magic numbers in the codebase

// Network Configuration
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5001";
pub const HEALTH_PATH: &str = "/api/health";
pub const INITIALIZE_PATH: &str = "/api/initialize";
pub const CHAT_PATH: &str = "/api/chat";
pub const UPLOAD_PATH: &str = "/api/upload";
pub const FILES_PATH: &str = "/api/files";

// Simulated backend
pub const SIMULATED_LATENCY_MS: u64 = 2000;

// UI Configuration
pub const UI_REFRESH_INTERVAL_MS: u64 = 50;
pub const UI_SCROLL_LINES: u16 = 3;
pub const UI_DEFAULT_VIEWPORT_HEIGHT: u16 = 20;

// Product copy
pub const PRODUCT_NAME: &str = "Finova";
pub const PRODUCT_TAGLINE: &str = "Premium Advisory Platform";

/// Example prompts offered on an empty conversation
pub const QUICK_PROMPTS: &[&str] = &[
    "I want to invest $50,000 in a balanced portfolio",
    "Find me a financial advisor in Charlotte, NC",
    "What are the latest renewable energy investment trends?",
    "I'm 35, want to invest $100k for retirement",
];

// Failure copy shown in the conversation
pub const AGENTS_NOT_READY_TEXT: &str = "The financial agents are not ready. Please make sure your ACP servers are running and try clicking 'Initialize Agents'.";
pub const API_UNREACHABLE_TEXT: &str = "Cannot connect to the API server. Please make sure the API server is running (python api_server.py).";
pub const GENERIC_FAILURE_TEXT: &str =
    "I'm having trouble connecting to the financial analysis system.";
pub const UPLOAD_FAILURE_TEXT: &str = "Failed to upload files. Please try again.";
pub const SUBMISSION_CANCELLED_TEXT: &str =
    "The request was cancelled before the financial agents replied. Please try again.";
pub const UPLOAD_CANCELLED_TEXT: &str = "The upload was cancelled before it finished. Please try again.";

/// Marker the backend puts in its error body when no agents are loaded
pub const AGENTS_NOT_INITIALIZED_MARKER: &str = "Agents not initialized";
