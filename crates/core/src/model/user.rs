use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::content_lock::{self, LockState};
use crate::model::ids::{LessonId, TopicId, UserId};
use crate::model::personal::PersonalInfo;
use crate::model::progress::{ActivityKind, UserProgress};
use crate::model::role::{AdminPermissions, Permission, UserRole};
use crate::model::settings::UserSettings;
use crate::readiness;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("email address is not valid")]
    InvalidEmail,
    #[error("first name cannot be empty")]
    EmptyFirstName,
    #[error("last name cannot be empty")]
    EmptyLastName,
    #[error("password must be at least {MIN_PASSWORD_CHARS} characters")]
    PasswordTooShort,
    #[error("username may only contain lowercase letters and digits")]
    InvalidUsername,
}

// ─── Email Address ─────────────────────────────────────────────────────────────

/// A validated, normalized (trimmed + lowercased) e-mail address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parses an address.
    ///
    /// Acceptance rule: no whitespace anywhere, exactly one `@` splitting a
    /// non-empty local part from a domain that contains an interior dot.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::InvalidEmail`] when the rule is not met.
    pub fn parse(raw: &str) -> Result<Self, UserError> {
        let candidate = raw.trim().to_lowercase();
        if candidate.chars().any(char::is_whitespace) {
            return Err(UserError::InvalidEmail);
        }
        let (local, domain) = candidate.split_once('@').ok_or(UserError::InvalidEmail)?;
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(UserError::InvalidEmail);
        }
        if !domain_has_interior_dot(domain) {
            return Err(UserError::InvalidEmail);
        }
        Ok(Self(candidate))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn domain_has_interior_dot(domain: &str) -> bool {
    let count = domain.chars().count();
    domain
        .chars()
        .enumerate()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < count)
}

// ─── Username ──────────────────────────────────────────────────────────────────

/// A generated handle: lowercase ASCII letters and digits only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Builds the handle for a name pair plus a zero-padded 4-digit suffix.
    ///
    /// The base is the lowercased concatenation of both names with every
    /// character outside `[a-z0-9]` removed. Names written in another script
    /// (Arabic, for instance) can strip down to nothing, leaving a handle of
    /// just the four digits.
    #[must_use]
    pub fn with_suffix(first_name: &str, last_name: &str, suffix: u16) -> Self {
        let base: String = format!("{first_name}{last_name}")
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            .collect();
        Self(format!("{base}{:04}", suffix % 10_000))
    }

    /// Parses a stored handle.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::InvalidUsername`] when empty or containing
    /// characters outside `[a-z0-9]`.
    pub fn parse(raw: &str) -> Result<Self, UserError> {
        if raw.is_empty()
            || !raw
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(UserError::InvalidUsername);
        }
        Ok(Self(raw.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── User ──────────────────────────────────────────────────────────────────────

/// A registered account with its embedded onboarding, progress, and settings
/// documents.
///
/// Deliberately not `Serialize`: the record carries the password hash, and
/// anything leaving the service layer goes through [`User::profile`] instead.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub email: EmailAddress,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub username: Username,
    /// Data URL of the avatar image; empty when unset.
    pub avatar: String,
    pub role: UserRole,
    pub admin_permissions: Option<AdminPermissions>,
    pub is_verified: bool,
    pub is_banned: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    pub personal_info: PersonalInfo,
    pub progress: UserProgress,
    pub settings: UserSettings,
    pub following_count: u32,
    pub followers_count: u32,
}

impl User {
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Role-aware permission check.
    #[must_use]
    pub fn permits(&self, permission: Permission) -> bool {
        self.role.permits(self.admin_permissions.as_ref(), permission)
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.progress.content_locked
    }

    /// Recomputes the stored readiness score and returns it.
    pub fn refresh_readiness(&mut self) -> u8 {
        self.progress.exam_readiness = readiness::score(&self.progress);
        self.progress.exam_readiness
    }

    /// Re-evaluates the content-lock invariant against the stored flag.
    ///
    /// Returns the new state when it changed, `None` when the stored flag was
    /// already correct (callers can skip the write in that case).
    pub fn refresh_content_lock(&mut self) -> Option<LockState> {
        let next = content_lock::transition(
            LockState::from_locked_flag(self.progress.content_locked),
            self.progress.activity_started(),
            self.personal_info.is_completed,
        );
        if let Some(state) = next {
            self.progress.content_locked = state.is_locked();
        }
        next
    }

    /// Records a quiz result and refreshes the derived fields.
    pub fn record_quiz(&mut self, correct: u32, wrong: u32, today: NaiveDate) {
        self.progress.record_quiz(correct, wrong, today);
        self.refresh_derived();
    }

    /// Records a lesson completion. Returns false when already completed.
    pub fn complete_lesson(&mut self, lesson: LessonId, today: NaiveDate) -> bool {
        let inserted = self.progress.complete_lesson(lesson, today);
        if inserted {
            self.refresh_derived();
        }
        inserted
    }

    /// Records a topic completion. Returns false when already completed.
    pub fn complete_topic(&mut self, topic: TopicId, today: NaiveDate) -> bool {
        let inserted = self.progress.complete_topic(topic, today);
        if inserted {
            self.refresh_derived();
        }
        inserted
    }

    /// Sets a first-activity flag and re-evaluates the lock.
    pub fn mark_activity(&mut self, kind: ActivityKind) {
        self.progress.mark_activity(kind);
        self.refresh_content_lock();
    }

    /// Replaces the onboarding record, recomputing its completion flag and
    /// the lock. Returns true when the record is now complete.
    pub fn update_personal_info(&mut self, mut info: PersonalInfo) -> bool {
        let completed = info.refresh_completion();
        self.personal_info = info;
        self.refresh_content_lock();
        completed
    }

    fn refresh_derived(&mut self) {
        self.refresh_readiness();
        self.refresh_content_lock();
    }

    /// Public view of the account, without the password hash.
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            username: self.username.clone(),
            avatar: self.avatar.clone(),
            role: self.role,
            admin_permissions: self.admin_permissions,
            is_verified: self.is_verified,
            is_banned: self.is_banned,
            created_at: self.created_at,
            last_login: self.last_login,
            personal_info: self.personal_info.clone(),
            progress: self.progress.clone(),
            settings: self.settings,
            following_count: self.following_count,
            followers_count: self.followers_count,
        }
    }
}

/// What other users (and the account holder) are allowed to see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub email: EmailAddress,
    pub first_name: String,
    pub last_name: String,
    pub username: Username,
    pub avatar: String,
    pub role: UserRole,
    pub admin_permissions: Option<AdminPermissions>,
    pub is_verified: bool,
    pub is_banned: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    pub personal_info: PersonalInfo,
    pub progress: UserProgress,
    pub settings: UserSettings,
    pub following_count: u32,
    pub followers_count: u32,
}

// ─── Draft & Validation ────────────────────────────────────────────────────────

/// Raw registration input, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct UserDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl UserDraft {
    /// Validates the draft: trims names, parses the address, checks the
    /// password length.
    ///
    /// # Errors
    ///
    /// Returns the first failing [`UserError`].
    pub fn validate(self) -> Result<ValidatedUser, UserError> {
        let first_name = self.first_name.trim().to_string();
        if first_name.is_empty() {
            return Err(UserError::EmptyFirstName);
        }
        let last_name = self.last_name.trim().to_string();
        if last_name.is_empty() {
            return Err(UserError::EmptyLastName);
        }
        let email = EmailAddress::parse(&self.email)?;
        if self.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(UserError::PasswordTooShort);
        }
        Ok(ValidatedUser {
            first_name,
            last_name,
            email,
            password: self.password,
        })
    }
}

/// A draft that passed validation. The password is still in the clear; the
/// service layer hashes it before the account is materialized.
#[derive(Debug, Clone)]
pub struct ValidatedUser {
    first_name: String,
    last_name: String,
    email: EmailAddress,
    password: String,
}

impl ValidatedUser {
    #[must_use]
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    #[must_use]
    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    #[must_use]
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Materializes the account with registration defaults: role `user`,
    /// unverified, not banned, zeroed progress, default settings, empty
    /// onboarding record.
    #[must_use]
    pub fn into_user(
        self,
        id: UserId,
        username: Username,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> User {
        User {
            id,
            email: self.email,
            password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            username,
            avatar: String::new(),
            role: UserRole::User,
            admin_permissions: None,
            is_verified: false,
            is_banned: false,
            created_at: now,
            last_login: now,
            personal_info: PersonalInfo::empty(),
            progress: UserProgress::new(),
            settings: UserSettings::default(),
            following_count: 0,
            followers_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn sample_user() -> User {
        UserDraft {
            first_name: "Sara".to_string(),
            last_name: "Haddad".to_string(),
            email: "sara@example.com".to_string(),
            password: "secret1".to_string(),
        }
        .validate()
        .unwrap()
        .into_user(
            UserId::generate(),
            Username::with_suffix("Sara", "Haddad", 42),
            "hash".to_string(),
            fixed_now(),
        )
    }

    fn completed_info() -> PersonalInfo {
        PersonalInfo {
            birth_date: NaiveDate::from_ymd_opt(1999, 1, 2),
            country: "Italia".to_string(),
            state: "Lazio".to_string(),
            gender: Some(crate::model::Gender::Male),
            phone: "3350000000".to_string(),
            phone_country_code: "+39".to_string(),
            italian_level: Some(crate::model::ItalianLevel::Weak),
            is_completed: false,
        }
    }

    // ─── EmailAddress ──────────────────────────────────────────────────────

    #[test]
    fn test_email_accepts_and_normalizes() {
        let email = EmailAddress::parse("  User@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "user@example.com");
    }

    #[test]
    fn test_email_rejects_malformed() {
        for raw in [
            "",
            "plain",
            "@example.com",
            "user@",
            "user@example",
            "user@.com",
            "user@com.",
            "two@at@example.com",
            "spaced user@example.com",
            "user@exam ple.com",
        ] {
            assert_eq!(
                EmailAddress::parse(raw),
                Err(UserError::InvalidEmail),
                "accepted {raw:?}"
            );
        }
    }

    #[test]
    fn test_email_accepts_subdomains() {
        assert!(EmailAddress::parse("a@mail.example.co.uk").is_ok());
    }

    // ─── Username ──────────────────────────────────────────────────────────

    #[test]
    fn test_username_from_latin_names() {
        let username = Username::with_suffix("Marco", "De Luca", 7);
        assert_eq!(username.as_str(), "marcodeluca0007");
    }

    #[test]
    fn test_username_from_arabic_names_is_digits_only() {
        let username = Username::with_suffix("أحمد", "خالد", 123);
        assert_eq!(username.as_str(), "0123");
    }

    #[test]
    fn test_username_suffix_wraps_at_four_digits() {
        let username = Username::with_suffix("a", "b", 9_999);
        assert_eq!(username.as_str(), "ab9999");
    }

    #[test]
    fn test_username_parse_rejects_uppercase() {
        assert_eq!(Username::parse("Marco1"), Err(UserError::InvalidUsername));
        assert_eq!(Username::parse(""), Err(UserError::InvalidUsername));
        assert!(Username::parse("marco1").is_ok());
    }

    // ─── Draft validation ──────────────────────────────────────────────────

    #[test]
    fn test_draft_trims_names() {
        let validated = UserDraft {
            first_name: " Sara ".to_string(),
            last_name: " Haddad ".to_string(),
            email: "sara@example.com".to_string(),
            password: "secret1".to_string(),
        }
        .validate()
        .unwrap();
        assert_eq!(validated.first_name(), "Sara");
        assert_eq!(validated.last_name(), "Haddad");
    }

    #[test]
    fn test_draft_rejects_blank_names() {
        let draft = UserDraft {
            first_name: "  ".to_string(),
            last_name: "Haddad".to_string(),
            email: "sara@example.com".to_string(),
            password: "secret1".to_string(),
        };
        assert_eq!(draft.validate().unwrap_err(), UserError::EmptyFirstName);
    }

    #[test]
    fn test_draft_rejects_short_password() {
        let draft = UserDraft {
            first_name: "Sara".to_string(),
            last_name: "Haddad".to_string(),
            email: "sara@example.com".to_string(),
            password: "12345".to_string(),
        };
        assert_eq!(draft.validate().unwrap_err(), UserError::PasswordTooShort);
    }

    #[test]
    fn test_into_user_applies_registration_defaults() {
        let user = sample_user();
        assert_eq!(user.role, UserRole::User);
        assert!(!user.is_verified);
        assert!(!user.is_banned);
        assert_eq!(user.progress, UserProgress::new());
        assert_eq!(user.settings, UserSettings::default());
        assert!(!user.personal_info.is_completed);
        assert_eq!(user.avatar, "");
        assert_eq!(user.display_name(), "Sara Haddad");
    }

    // ─── Derived state ─────────────────────────────────────────────────────

    #[test]
    fn test_quiz_before_onboarding_locks_account() {
        let mut user = sample_user();
        user.record_quiz(7, 3, fixed_now().date_naive());
        assert!(user.is_locked());
        assert!(user.progress.first_quiz_completed);
        assert!(user.progress.exam_readiness > 0);
    }

    #[test]
    fn test_completing_info_unlocks() {
        let mut user = sample_user();
        user.record_quiz(7, 3, fixed_now().date_naive());
        assert!(user.is_locked());
        assert!(user.update_personal_info(completed_info()));
        assert!(!user.is_locked());
        assert!(user.personal_info.is_completed);
    }

    #[test]
    fn test_refresh_content_lock_reports_change_only_once() {
        let mut user = sample_user();
        user.progress.mark_activity(ActivityKind::Quiz);
        assert_eq!(user.refresh_content_lock(), Some(LockState::Locked));
        assert_eq!(user.refresh_content_lock(), None);
    }

    #[test]
    fn test_activity_after_onboarding_never_locks() {
        let mut user = sample_user();
        user.update_personal_info(completed_info());
        user.record_quiz(10, 0, fixed_now().date_naive());
        assert!(!user.is_locked());
    }

    #[test]
    fn test_profile_omits_password_hash() {
        let user = sample_user();
        let profile = user.profile();
        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("hash"));
        assert!(json.contains("\"firstName\":\"Sara\""));
        assert_eq!(profile.id, user.id);
    }

    #[test]
    fn test_permits_delegates_to_role() {
        let mut user = sample_user();
        assert!(!user.permits(Permission::ManagePosts));
        user.role = UserRole::Admin;
        assert!(user.permits(Permission::ManagePosts));
    }
}
