use std::{panic::AssertUnwindSafe, sync::Arc};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::FutureExt;
use mail_relay::MailRelay;
use shared::{
    domain::{ContactField, ContactFields, NotificationKind},
    error::ValidationError,
    protocol::{ContactPayload, Notification},
};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::notify::Notifier;

const SENDING_LABEL: &str = "Sending...";

/// Delivers one contact message. Timeouts are the implementation's concern.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, payload: &ContactPayload) -> Result<()>;
}

#[async_trait]
impl<T> MessageSender for T
where
    T: MailRelay,
{
    async fn send(&self, payload: &ContactPayload) -> Result<()> {
        self.deliver(payload).await
    }
}

pub struct MissingMessageSender;

#[async_trait]
impl MessageSender for MissingMessageSender {
    async fn send(&self, _payload: &ContactPayload) -> Result<()> {
        Err(anyhow!("message relay is not configured"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Sent,
    Failed(String),
    /// A send is already in flight; nothing was done.
    AlreadySubmitting,
    Rejected(ValidationError),
}

/// Pre-resolved toast descriptions and button label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessages {
    pub success: String,
    pub error: String,
    pub send_label: String,
}

impl Default for ContactMessages {
    fn default() -> Self {
        Self {
            success: "Your message has been sent. I'll get back to you soon.".to_string(),
            error: "Your message could not be sent. Please try again.".to_string(),
            send_label: "Send Message".to_string(),
        }
    }
}

struct FormState {
    state: SubmissionState,
    fields: ContactFields,
}

pub struct ContactSubmissionController {
    sender: Arc<dyn MessageSender>,
    notifier: Arc<dyn Notifier>,
    messages: ContactMessages,
    inner: Mutex<FormState>,
    state_tx: watch::Sender<SubmissionState>,
}

impl ContactSubmissionController {
    pub fn new(sender: Arc<dyn MessageSender>, notifier: Arc<dyn Notifier>) -> Arc<Self> {
        Self::with_messages(sender, notifier, ContactMessages::default())
    }

    pub fn with_messages(
        sender: Arc<dyn MessageSender>,
        notifier: Arc<dyn Notifier>,
        messages: ContactMessages,
    ) -> Arc<Self> {
        let (state_tx, _) = watch::channel(SubmissionState::Idle);
        Arc::new(Self {
            sender,
            notifier,
            messages,
            inner: Mutex::new(FormState {
                state: SubmissionState::Idle,
                fields: ContactFields::default(),
            }),
            state_tx,
        })
    }

    pub async fn set_field(&self, field: ContactField, value: impl Into<String>) {
        self.inner.lock().await.fields.set(field, value);
    }

    pub async fn fields(&self) -> ContactFields {
        self.inner.lock().await.fields.clone()
    }

    pub fn state(&self) -> SubmissionState {
        *self.state_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.state_tx.subscribe()
    }

    pub fn is_submit_enabled(&self) -> bool {
        self.state() != SubmissionState::Submitting
    }

    pub fn button_label(&self) -> &str {
        if self.state() == SubmissionState::Submitting {
            SENDING_LABEL
        } else {
            &self.messages.send_label
        }
    }

    /// Validates and sends the current fields.
    ///
    /// Delivery runs on its own task, so the form still settles if the
    /// caller stops waiting. Calls made while a send is in flight return
    /// [`SubmitOutcome::AlreadySubmitting`] without touching the sender.
    pub async fn submit(self: &Arc<Self>) -> SubmitOutcome {
        let payload = {
            let mut guard = self.inner.lock().await;
            if guard.state == SubmissionState::Submitting {
                debug!("contact: submit ignored, send already in flight");
                return SubmitOutcome::AlreadySubmitting;
            }
            if let Err(err) = guard.fields.validate() {
                debug!(field = %err.field(), error = %err, "contact: submit rejected locally");
                return SubmitOutcome::Rejected(err);
            }
            guard.state = SubmissionState::Submitting;
            self.state_tx.send_replace(SubmissionState::Submitting);
            ContactPayload::from(&guard.fields)
        };

        let controller = Arc::clone(self);
        let delivery = tokio::spawn(async move {
            let result = match AssertUnwindSafe(controller.sender.send(&payload))
                .catch_unwind()
                .await
            {
                Ok(result) => result.map_err(|err| format!("{err:#}")),
                Err(_) => Err("message sender panicked".to_string()),
            };
            controller.settle(result).await
        });

        match delivery.await {
            Ok(outcome) => outcome,
            Err(err) => {
                // Only reachable when the runtime is shutting down.
                warn!(error = %err, "contact: delivery task did not complete");
                self.settle(Err(err.to_string())).await
            }
        }
    }

    async fn settle(&self, result: std::result::Result<(), String>) -> SubmitOutcome {
        let mut guard = self.inner.lock().await;
        if guard.state != SubmissionState::Submitting {
            return match guard.state {
                SubmissionState::Succeeded => SubmitOutcome::Sent,
                _ => SubmitOutcome::Failed("submission already settled".to_string()),
            };
        }

        match result {
            Ok(()) => {
                guard.state = SubmissionState::Succeeded;
                guard.fields.clear();
                self.state_tx.send_replace(SubmissionState::Succeeded);
                info!("contact: message sent");
                self.notifier.notify(Notification::new(
                    NotificationKind::Success,
                    self.messages.success.clone(),
                ));
                SubmitOutcome::Sent
            }
            Err(reason) => {
                guard.state = SubmissionState::Failed;
                self.state_tx.send_replace(SubmissionState::Failed);
                warn!(error = %reason, "contact: message delivery failed");
                self.notifier.notify(Notification::new(
                    NotificationKind::Error,
                    self.messages.error.clone(),
                ));
                SubmitOutcome::Failed(reason)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/contact_tests.rs"]
mod tests;
