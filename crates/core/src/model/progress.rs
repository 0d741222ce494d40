use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::ids::{LessonId, TopicId};

/// The learning activity that can trip the content lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Lesson,
    Quiz,
    Training,
}

/// Practice statistics for one account.
///
/// `exam_readiness` and `content_locked` are derived values; they are kept on
/// the record so the stored document always carries the last evaluation, and
/// are refreshed through [`crate::model::User`] whenever an input changes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub total_quizzes: u32,
    pub correct_answers: u32,
    pub wrong_answers: u32,
    pub completed_lessons: BTreeSet<LessonId>,
    pub completed_topics: BTreeSet<TopicId>,
    pub current_streak: u32,
    pub best_streak: u32,
    pub last_study_date: Option<NaiveDate>,
    pub exam_readiness: u8,
    pub first_lesson_completed: bool,
    pub first_quiz_completed: bool,
    pub first_training_completed: bool,
    pub content_locked: bool,
}

impl UserProgress {
    /// Zeroed statistics for a freshly registered account.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True once any first-activity flag is set.
    #[must_use]
    pub fn activity_started(&self) -> bool {
        self.first_lesson_completed || self.first_quiz_completed || self.first_training_completed
    }

    /// Sets the first-activity flag for `kind`.
    pub fn mark_activity(&mut self, kind: ActivityKind) {
        match kind {
            ActivityKind::Lesson => self.first_lesson_completed = true,
            ActivityKind::Quiz => self.first_quiz_completed = true,
            ActivityKind::Training => self.first_training_completed = true,
        }
    }

    /// Maintains the study streak for activity on `today`.
    ///
    /// Same calendar day leaves the streak unchanged, the next day extends
    /// it, and any longer gap resets it to 1. `best_streak` tracks the
    /// running maximum.
    pub fn record_study_day(&mut self, today: NaiveDate) {
        match self.last_study_date {
            Some(last) if last == today => {}
            Some(last) if today.signed_duration_since(last).num_days() == 1 => {
                self.current_streak = self.current_streak.saturating_add(1);
            }
            _ => self.current_streak = 1,
        }
        self.best_streak = self.best_streak.max(self.current_streak);
        self.last_study_date = Some(today);
    }

    /// Adds one quiz result and touches the streak.
    pub fn record_quiz(&mut self, correct: u32, wrong: u32, today: NaiveDate) {
        self.total_quizzes = self.total_quizzes.saturating_add(1);
        self.correct_answers = self.correct_answers.saturating_add(correct);
        self.wrong_answers = self.wrong_answers.saturating_add(wrong);
        self.first_quiz_completed = true;
        self.record_study_day(today);
    }

    /// Records a lesson completion. Returns false (and changes nothing) when
    /// the lesson was already in the completed set.
    pub fn complete_lesson(&mut self, lesson: LessonId, today: NaiveDate) -> bool {
        let inserted = self.completed_lessons.insert(lesson);
        if inserted {
            self.first_lesson_completed = true;
            self.record_study_day(today);
        }
        inserted
    }

    /// Records a topic completion. Returns false (and changes nothing) when
    /// the topic was already in the completed set.
    pub fn complete_topic(&mut self, topic: TopicId, today: NaiveDate) -> bool {
        let inserted = self.completed_topics.insert(topic);
        if inserted {
            self.first_training_completed = true;
            self.record_study_day(today);
        }
        inserted
    }
}
