//! Exam-readiness scoring.
//!
//! Maps practice statistics to a 0–100 estimate of how prepared the learner
//! is for the theory exam. The score is the rounded, clamped sum of six
//! independently capped factors; it is pure and deterministic so the stored
//! value can be recomputed at any time.

use serde::Serialize;

use crate::model::UserProgress;

/// Upper bound of the readiness score.
pub const MAX_SCORE: u8 = 100;

const QUIZ_VOLUME_TARGET: f64 = 50.0;
const QUIZ_VOLUME_WEIGHT: f64 = 30.0;
const ACCURACY_WEIGHT: f64 = 25.0;
const LESSONS_TARGET: f64 = 30.0;
const LESSONS_WEIGHT: f64 = 20.0;
const TOPICS_TARGET: f64 = 10.0;
const TOPICS_WEIGHT: f64 = 15.0;
const HEAVY_MISTAKE_THRESHOLD: f64 = 5.0;
const HEAVY_MISTAKE_PENALTY: f64 = 10.0;
const MILD_MISTAKE_THRESHOLD: f64 = 3.0;
const MILD_MISTAKE_PENALTY: f64 = 5.0;
const STREAK_WEIGHT: f64 = 2.0;
const STREAK_CAP: f64 = 10.0;

/// The six factors that make up the score, for display next to the total.
///
/// `mistake_penalty` is zero or negative; every other factor is capped at its
/// weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessBreakdown {
    pub quiz_volume: f64,
    pub accuracy: f64,
    pub lessons: f64,
    pub topics: f64,
    pub mistake_penalty: f64,
    pub consistency: f64,
}

impl ReadinessBreakdown {
    /// Sums the factors, rounds, and clamps to `[0, MAX_SCORE]`.
    #[must_use]
    pub fn score(&self) -> u8 {
        let sum = self.quiz_volume
            + self.accuracy
            + self.lessons
            + self.topics
            + self.mistake_penalty
            + self.consistency;
        sum.round().clamp(0.0, f64::from(MAX_SCORE)) as u8
    }
}

/// Computes the per-factor breakdown for a progress record.
///
/// - Quiz volume: full weight (30) at 50 quizzes.
/// - Accuracy: share of correct answers, weight 25; zero before any answer.
/// - Lessons: full weight (20) at 30 completed lessons.
/// - Topics: full weight (15) at 10 completed topics.
/// - Mistake penalty: −10 above 5 average wrong answers per quiz, −5 above 3.
/// - Consistency: 2 points per day of the current streak, capped at 10.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn breakdown(progress: &UserProgress) -> ReadinessBreakdown {
    let total_quizzes = f64::from(progress.total_quizzes);
    let correct = f64::from(progress.correct_answers);
    let wrong = f64::from(progress.wrong_answers);

    let quiz_volume = (total_quizzes / QUIZ_VOLUME_TARGET * QUIZ_VOLUME_WEIGHT)
        .min(QUIZ_VOLUME_WEIGHT);

    let answered = correct + wrong;
    let accuracy = if answered > 0.0 {
        correct / answered * ACCURACY_WEIGHT
    } else {
        0.0
    };

    let lessons = (progress.completed_lessons.len() as f64 / LESSONS_TARGET * LESSONS_WEIGHT)
        .min(LESSONS_WEIGHT);
    let topics = (progress.completed_topics.len() as f64 / TOPICS_TARGET * TOPICS_WEIGHT)
        .min(TOPICS_WEIGHT);

    let average_mistakes = wrong / total_quizzes.max(1.0);
    let mistake_penalty = if average_mistakes > HEAVY_MISTAKE_THRESHOLD {
        -HEAVY_MISTAKE_PENALTY
    } else if average_mistakes > MILD_MISTAKE_THRESHOLD {
        -MILD_MISTAKE_PENALTY
    } else {
        0.0
    };

    let consistency = (f64::from(progress.current_streak) * STREAK_WEIGHT).min(STREAK_CAP);

    ReadinessBreakdown {
        quiz_volume,
        accuracy,
        lessons,
        topics,
        mistake_penalty,
        consistency,
    }
}

/// Computes the final 0–100 score for a progress record.
#[must_use]
pub fn score(progress: &UserProgress) -> u8 {
    breakdown(progress).score()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LessonId, TopicId};

    fn progress(
        total_quizzes: u32,
        correct: u32,
        wrong: u32,
        lessons: usize,
        topics: usize,
        streak: u32,
    ) -> UserProgress {
        let mut p = UserProgress::new();
        p.total_quizzes = total_quizzes;
        p.correct_answers = correct;
        p.wrong_answers = wrong;
        p.completed_lessons = (0..lessons)
            .map(|i| LessonId::new(format!("lesson-{i}")))
            .collect();
        p.completed_topics = (0..topics)
            .map(|i| TopicId::new(format!("topic-{i}")))
            .collect();
        p.current_streak = streak;
        p
    }

    #[test]
    fn test_untouched_account_scores_zero() {
        assert_eq!(score(&UserProgress::new()), 0);
    }

    #[test]
    fn test_worked_example() {
        // 50 quizzes at 80% accuracy, full lesson and topic coverage,
        // five-day streak: 30 + 20 + 20 + 15 - 0 + 10 = 95.
        let p = progress(50, 40, 10, 30, 10, 5);
        let b = breakdown(&p);
        assert_eq!(b.quiz_volume, 30.0);
        assert_eq!(b.accuracy, 20.0);
        assert_eq!(b.lessons, 20.0);
        assert_eq!(b.topics, 15.0);
        assert_eq!(b.mistake_penalty, 0.0);
        assert_eq!(b.consistency, 10.0);
        assert_eq!(b.score(), 95);
    }

    #[test]
    fn test_factors_cap_at_their_weights() {
        let p = progress(5000, 5000, 0, 300, 100, 400);
        let b = breakdown(&p);
        assert_eq!(b.quiz_volume, 30.0);
        assert_eq!(b.accuracy, 25.0);
        assert_eq!(b.lessons, 20.0);
        assert_eq!(b.topics, 15.0);
        assert_eq!(b.consistency, 10.0);
        assert_eq!(b.score(), 100);
    }

    #[test]
    fn test_accuracy_is_zero_before_any_answer() {
        let p = progress(0, 0, 0, 3, 1, 2);
        assert_eq!(breakdown(&p).accuracy, 0.0);
    }

    #[test]
    fn test_mild_penalty_above_three_average_mistakes() {
        // 10 quizzes, 35 wrong answers: 3.5 average.
        let p = progress(10, 20, 35, 0, 0, 0);
        assert_eq!(breakdown(&p).mistake_penalty, -5.0);
    }

    #[test]
    fn test_heavy_penalty_above_five_average_mistakes() {
        // 10 quizzes, 60 wrong answers: 6.0 average.
        let p = progress(10, 10, 60, 0, 0, 0);
        assert_eq!(breakdown(&p).mistake_penalty, -10.0);
    }

    #[test]
    fn test_penalty_uses_denominator_of_one_without_quizzes() {
        // Wrong answers with zero recorded quizzes still penalize.
        let p = progress(0, 0, 6, 0, 0, 0);
        assert_eq!(breakdown(&p).mistake_penalty, -10.0);
    }

    #[test]
    fn test_score_never_goes_negative() {
        let p = progress(1, 0, 100, 0, 0, 0);
        assert_eq!(score(&p), 0);
    }

    #[test]
    fn test_score_stays_in_bounds_across_grid() {
        for quizzes in [0u32, 1, 10, 50, 200] {
            for wrong in [0u32, 5, 50, 500] {
                for streak in [0u32, 1, 5, 50] {
                    let p = progress(quizzes, quizzes * 10, wrong, 5, 2, streak);
                    let s = score(&p);
                    assert!(s <= MAX_SCORE, "score {s} out of range");
                }
            }
        }
    }

    #[test]
    fn test_monotonic_in_total_quizzes() {
        let mut previous = 0;
        for quizzes in 0..200 {
            let p = progress(quizzes, 40, 10, 5, 2, 3);
            let s = score(&p);
            assert!(s >= previous, "score dropped at {quizzes} quizzes");
            previous = s;
        }
    }

    #[test]
    fn test_monotonic_in_lessons_and_topics() {
        let mut previous = 0;
        for lessons in 0..40 {
            let s = score(&progress(10, 8, 2, lessons, 0, 0));
            assert!(s >= previous);
            previous = s;
        }
        previous = 0;
        for topics in 0..15 {
            let s = score(&progress(10, 8, 2, 0, topics, 0));
            assert!(s >= previous);
            previous = s;
        }
    }

    #[test]
    fn test_monotonic_in_streak() {
        let mut previous = 0;
        for streak in 0..20 {
            let s = score(&progress(10, 8, 2, 5, 2, streak));
            assert!(s >= previous);
            previous = s;
        }
    }

    #[test]
    fn test_breakdown_serializes_camel_case() {
        let json = serde_json::to_string(&breakdown(&UserProgress::new())).unwrap();
        assert!(json.contains("\"quizVolume\":0.0"));
        assert!(json.contains("\"mistakePenalty\":-0.0") || json.contains("\"mistakePenalty\":0.0"));
    }
}
