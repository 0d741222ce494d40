//! Study progress, exam readiness, and the content lock.

use std::sync::Arc;

use serde::Serialize;

use patente_core::Clock;
use patente_core::model::{ActivityKind, LessonId, PersonalInfo, TopicId, User, UserProgress};
use patente_core::readiness::{self, ReadinessBreakdown};
use storage::repository::{TokenRepository, UserRepository};

use crate::auth::resolve_user;
use crate::error::ProgressServiceError;

/// Readiness score with the factors behind it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessReport {
    pub score: u8,
    pub breakdown: ReadinessBreakdown,
}

/// Use-case layer for everything the learner's practice writes back to the
/// account: quiz results, completions, the onboarding record, and the derived
/// readiness/lock fields.
///
/// Every operation re-derives `exam_readiness` and `content_locked` through
/// the domain model and persists the account once.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn TokenRepository>,
    ) -> Self {
        Self {
            clock,
            users,
            tokens,
        }
    }

    /// Records one quiz result and returns the updated statistics.
    ///
    /// # Errors
    ///
    /// Returns an authorization error or storage errors.
    pub async fn record_quiz(
        &self,
        token: &str,
        correct: u32,
        wrong: u32,
    ) -> Result<UserProgress, ProgressServiceError> {
        let mut user = self.resolve(token).await?;
        user.record_quiz(correct, wrong, self.clock.today());
        self.users.put_user(&user).await?;
        Ok(user.progress)
    }

    /// Marks a lesson as completed. Returns false when it already was; the
    /// repeat writes nothing.
    ///
    /// # Errors
    ///
    /// Returns an authorization error or storage errors.
    pub async fn complete_lesson(
        &self,
        token: &str,
        lesson: LessonId,
    ) -> Result<bool, ProgressServiceError> {
        let mut user = self.resolve(token).await?;
        let inserted = user.complete_lesson(lesson, self.clock.today());
        if inserted {
            self.users.put_user(&user).await?;
        }
        Ok(inserted)
    }

    /// Marks a training topic as completed. Returns false when it already
    /// was; the repeat writes nothing.
    ///
    /// # Errors
    ///
    /// Returns an authorization error or storage errors.
    pub async fn complete_topic(
        &self,
        token: &str,
        topic: TopicId,
    ) -> Result<bool, ProgressServiceError> {
        let mut user = self.resolve(token).await?;
        let inserted = user.complete_topic(topic, self.clock.today());
        if inserted {
            self.users.put_user(&user).await?;
        }
        Ok(inserted)
    }

    /// Sets one first-activity flag and re-evaluates the lock.
    ///
    /// # Errors
    ///
    /// Returns an authorization error or storage errors.
    pub async fn mark_first_activity(
        &self,
        token: &str,
        kind: ActivityKind,
    ) -> Result<(), ProgressServiceError> {
        let mut user = self.resolve(token).await?;
        user.mark_activity(kind);
        self.users.put_user(&user).await?;
        Ok(())
    }

    /// Replaces the onboarding record and returns it as stored, with its
    /// completion flag recomputed. Completing the record lifts the lock.
    ///
    /// # Errors
    ///
    /// Returns an authorization error or storage errors.
    pub async fn update_personal_info(
        &self,
        token: &str,
        info: PersonalInfo,
    ) -> Result<PersonalInfo, ProgressServiceError> {
        let mut user = self.resolve(token).await?;
        user.update_personal_info(info);
        self.users.put_user(&user).await?;
        Ok(user.personal_info)
    }

    /// Re-evaluates the lock invariant and reports whether the app should
    /// lock. The account is written only when the stored flag changed.
    ///
    /// # Errors
    ///
    /// Returns an authorization error or storage errors.
    pub async fn check_content_lock(&self, token: &str) -> Result<bool, ProgressServiceError> {
        let mut user = self.resolve(token).await?;
        if user.refresh_content_lock().is_some() {
            self.users.put_user(&user).await?;
        }
        Ok(user.is_locked())
    }

    /// Recomputes and persists the readiness score, returning it with the
    /// factor breakdown.
    ///
    /// # Errors
    ///
    /// Returns an authorization error or storage errors.
    pub async fn refresh_readiness(
        &self,
        token: &str,
    ) -> Result<ReadinessReport, ProgressServiceError> {
        let mut user = self.resolve(token).await?;
        let score = user.refresh_readiness();
        self.users.put_user(&user).await?;
        Ok(ReadinessReport {
            score,
            breakdown: readiness::breakdown(&user.progress),
        })
    }

    async fn resolve(&self, token: &str) -> Result<User, ProgressServiceError> {
        let user = resolve_user(
            self.users.as_ref(),
            self.tokens.as_ref(),
            token,
            self.clock.now(),
        )
        .await?;
        Ok(user)
    }
}
