use serde::{Deserialize, Serialize};

/// What triggered a notification email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailKind {
    Registration,
    PasswordChange,
    EmailChange,
    PasswordReset,
}

impl EmailKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailKind::Registration => "registration",
            EmailKind::PasswordChange => "password_change",
            EmailKind::EmailChange => "email_change",
            EmailKind::PasswordReset => "password_reset",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "registration" => Some(EmailKind::Registration),
            "password_change" => Some(EmailKind::PasswordChange),
            "email_change" => Some(EmailKind::EmailChange),
            "password_reset" => Some(EmailKind::PasswordReset),
            _ => None,
        }
    }
}

/// Delivery outcome recorded in the email log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailStatus {
    Sent,
    Failed,
}

impl EmailStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailStatus::Sent => "sent",
            EmailStatus::Failed => "failed",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sent" => Some(EmailStatus::Sent),
            "failed" => Some(EmailStatus::Failed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_as_str_parse_roundtrip() {
        for kind in [
            EmailKind::Registration,
            EmailKind::PasswordChange,
            EmailKind::EmailChange,
            EmailKind::PasswordReset,
        ] {
            assert_eq!(EmailKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EmailKind::parse("newsletter"), None);
    }

    #[test]
    fn test_status_as_str_parse_roundtrip() {
        for status in [EmailStatus::Sent, EmailStatus::Failed] {
            assert_eq!(EmailStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(EmailStatus::parse("queued"), None);
    }
}
