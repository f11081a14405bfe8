use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ContactFields, NotificationKind};

/// What leaves the page when a contact message is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPayload {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl From<&ContactFields> for ContactPayload {
    fn from(fields: &ContactFields) -> Self {
        Self {
            name: fields.name.trim().to_string(),
            email: fields.email.trim().to_string(),
            message: fields.message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayTemplateParams {
    pub from_name: String,
    pub from_email: String,
    pub message: String,
}

/// Request body accepted by the hosted mail relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelaySendRequest {
    pub service_id: String,
    pub template_id: String,
    pub user_id: String,
    pub template_params: RelayTemplateParams,
}

impl RelaySendRequest {
    pub fn new(
        service_id: impl Into<String>,
        template_id: impl Into<String>,
        user_id: impl Into<String>,
        payload: &ContactPayload,
    ) -> Self {
        Self {
            service_id: service_id.into(),
            template_id: template_id.into(),
            user_id: user_id.into(),
            template_params: RelayTemplateParams {
                from_name: payload.name.clone(),
                from_email: payload.email.clone(),
                message: payload.message.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
    pub issued_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(kind: NotificationKind, description: impl Into<String>) -> Self {
        let title = match kind {
            NotificationKind::Success => "Success!",
            NotificationKind::Error => "Error",
        };
        Self {
            kind,
            title: title.to_string(),
            description: description.into(),
            issued_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_request_uses_template_param_names() {
        let payload = ContactPayload::from(&ContactFields::new(
            " Ada ",
            "ada@example.com",
            "Hello",
        ));
        let request = RelaySendRequest::new("service_1", "template_1", "public_key", &payload);
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(json["service_id"], "service_1");
        assert_eq!(json["template_id"], "template_1");
        assert_eq!(json["user_id"], "public_key");
        assert_eq!(json["template_params"]["from_name"], "Ada");
        assert_eq!(json["template_params"]["from_email"], "ada@example.com");
        assert_eq!(json["template_params"]["message"], "Hello");
    }

    #[test]
    fn notification_titles_follow_kind() {
        assert_eq!(
            Notification::new(NotificationKind::Success, "sent").title,
            "Success!"
        );
        assert_eq!(Notification::new(NotificationKind::Error, "failed").title, "Error");
    }
}
