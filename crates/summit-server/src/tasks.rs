//! Background task queue and worker.
//!
//! [`TaskQueue`] is the [`TaskDispatcher`] handed to the API: an unbounded
//! channel, so enqueueing never blocks a request. [`TaskWorker`] drains it on
//! its own Tokio task. Failures are logged and never reach the request that
//! caused them.

use std::sync::Arc;

use summit_core::{
    Cache, Store, StoreError, Task, TaskDispatcher,
    announcement::{refresh_announcement, refresh_featured_speaker},
};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from executing a task.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Mail delivery failure
    #[error("mail delivery failed: {0}")]
    Mail(String),
}

/// Outgoing e-mail.
pub trait Mailer: Send + Sync + 'static {
    /// Deliver one message.
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), TaskError>;
}

/// Mailer that writes messages to the log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), TaskError> {
        tracing::info!(to, subject, body_len = body.len(), "mail sent");
        Ok(())
    }
}

/// Sending half of the task channel.
#[derive(Debug, Clone)]
pub struct TaskQueue {
    sender: mpsc::UnboundedSender<Task>,
}

impl TaskQueue {
    /// Create a queue and the receiver a [`TaskWorker`] drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Task>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl TaskDispatcher for TaskQueue {
    fn enqueue(&self, task: Task) {
        let name = task.name();
        if self.sender.send(task).is_err() {
            tracing::warn!(task = name, "task worker stopped, dropping task");
        } else {
            tracing::debug!(task = name, "task enqueued");
        }
    }
}

/// Executes queued tasks.
pub struct TaskWorker<S> {
    store: Arc<S>,
    cache: Arc<dyn Cache>,
    mailer: Arc<dyn Mailer>,
}

impl<S: Store> TaskWorker<S> {
    /// Create a worker over the same store and cache as the API.
    pub fn new(store: Arc<S>, cache: Arc<dyn Cache>, mailer: Arc<dyn Mailer>) -> Self {
        Self { store, cache, mailer }
    }

    /// Drain `receiver` until every sender is dropped.
    pub async fn run(self, mut receiver: mpsc::UnboundedReceiver<Task>) {
        while let Some(task) = receiver.recv().await {
            let name = task.name();
            if let Err(err) = self.execute(task) {
                tracing::error!(task = name, error = %err, "task failed");
            }
        }
        tracing::info!("task worker stopped");
    }

    /// Execute one task.
    pub fn execute(&self, task: Task) -> Result<(), TaskError> {
        match task {
            Task::SendConfirmationEmail { email, conference, conference_name } => {
                let body = format!(
                    "Hi, you have created the following conference:\r\n\r\n\
                     {conference_name} ({conference})"
                );
                self.mailer.send(&email, "You created a new Conference!", &body)
            },
            Task::SetFeaturedSpeaker { conference, speaker } => {
                refresh_featured_speaker(
                    self.store.as_ref(),
                    self.cache.as_ref(),
                    &conference,
                    &speaker,
                )?;
                Ok(())
            },
            Task::RefreshAnnouncement => {
                refresh_announcement(self.store.as_ref(), self.cache.as_ref())?;
                Ok(())
            },
        }
    }
}
