use async_trait::async_trait;
use rusqlite::Connection;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use ticketai_core::errors::{ExError, ExErrorKind, Result};
use ticketai_core::ViewRegistry;
use ticketai_engine::ModelClient;
use ticketai_store::{demo, migrations};

pub const TICKETS: &str = "vw_Tickets_AI_Report";
pub const USERS: &str = "vw_Users_AI_Safe";
pub const PRODUCTS: &str = "vw_Products_AI_Safe";

/// Model that replays canned replies in order and records every prompt
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl ScriptedModel {
    pub fn replying(reply: &str) -> Arc<Self> {
        Self::script(vec![Ok(reply.to_string())])
    }

    pub fn failing(err: ExError) -> Arc<Self> {
        Self::script(vec![Err(err)])
    }

    pub fn script(replies: Vec<Result<String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ExError::new(ExErrorKind::Internal).with_message("script exhausted"))
            })
    }
}

/// Model that never answers
#[allow(dead_code)]
pub struct PendingModel;

#[async_trait]
impl ModelClient for PendingModel {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        std::future::pending().await
    }
}

/// Model that answers and cancels the caller's token in the same call
#[allow(dead_code)]
pub struct CancellingModel {
    pub reply: String,
    pub token: CancellationToken,
}

#[async_trait]
impl ModelClient for CancellingModel {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        self.token.cancel();
        Ok(self.reply.clone())
    }
}

#[allow(dead_code)]
pub fn transport_error(message: &str) -> ExError {
    ExError::new(ExErrorKind::ExternalService)
        .with_op("model_complete")
        .with_message(message)
}

#[allow(dead_code)]
pub fn demo_db() -> Connection {
    let mut conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    migrations::apply_migrations(&mut conn).expect("migrations");
    demo::seed_demo(&mut conn).expect("demo seed");
    conn
}

#[allow(dead_code)]
pub fn registry(top: u32) -> Arc<ViewRegistry> {
    Arc::new(ViewRegistry::new([TICKETS, USERS, PRODUCTS], top, "main").unwrap())
}
