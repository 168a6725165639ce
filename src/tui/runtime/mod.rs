//! Runtime Bridge - Connector Layer
//!
//! Runs backend calls on tokio tasks and reports back through an mpsc
//! channel, so the UI loop never awaits the network.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::backend::{Backend, QueryResult};
use crate::catalog::Question;
use crate::error::FixSuggestion;

// ─────────────────────────────────────────────────────────────────────────────
// Runtime Bridge Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Bridge between the dashboard and the question-answering service
pub trait RuntimeBridge: Send + Sync {
    /// Backend name shown in the header
    fn name(&self) -> &str;

    /// Fetch the catalog; answers with [`RuntimeEvent::QuestionsLoaded`]
    fn load_questions(&self);

    /// Run a question; answers with `QueryCompleted` or `QueryFailed`
    /// carrying the same `request_id`
    fn submit(&self, request_id: u64, question: String);

    /// Abort every in-flight call
    fn shutdown(&self);
}

// ─────────────────────────────────────────────────────────────────────────────
// Runtime Events
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    QuestionsLoaded(Vec<Question>),
    QueryCompleted {
        request_id: u64,
        result: QueryResult,
    },
    QueryFailed {
        request_id: u64,
        message: String,
        hint: Option<String>,
    },
}

impl RuntimeEvent {
    /// Short description for logging
    pub fn description(&self) -> String {
        match self {
            Self::QuestionsLoaded(questions) => format!("Loaded {} questions", questions.len()),
            Self::QueryCompleted { request_id, result } => {
                format!("Query #{} completed ({} steps)", request_id, result.steps.len())
            }
            Self::QueryFailed {
                request_id,
                message,
                ..
            } => format!("Query #{} failed: {}", request_id, message),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Runtime
// ─────────────────────────────────────────────────────────────────────────────

/// Bridge backed by any [`Backend`]
pub struct BackendRuntime {
    backend: Arc<dyn Backend>,
    tx: mpsc::UnboundedSender<RuntimeEvent>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl BackendRuntime {
    /// Bridge plus the receiving end of its event channel
    pub fn new(backend: Arc<dyn Backend>) -> (Self, mpsc::UnboundedReceiver<RuntimeEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let runtime = Self {
            backend,
            tx,
            tasks: Mutex::new(Vec::new()),
        };
        (runtime, rx)
    }

    fn track(&self, handle: JoinHandle<()>) {
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.retain(|t| !t.is_finished());
            tasks.push(handle);
        }
    }
}

impl RuntimeBridge for BackendRuntime {
    fn name(&self) -> &str {
        self.backend.name()
    }

    fn load_questions(&self) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        self.track(tokio::spawn(async move {
            let questions = backend.questions().await;
            let _ = tx.send(RuntimeEvent::QuestionsLoaded(questions));
        }));
    }

    fn submit(&self, request_id: u64, question: String) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        tracing::info!(request_id, question = %question, "Submitting question");
        self.track(tokio::spawn(async move {
            let event = match backend.run(&question).await {
                Ok(result) => RuntimeEvent::QueryCompleted { request_id, result },
                Err(e) => RuntimeEvent::QueryFailed {
                    request_id,
                    message: e.banner_message(),
                    hint: e.fix_suggestion().map(str::to_string),
                },
            };
            let _ = tx.send(event);
        }));
    }

    fn shutdown(&self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }
}
