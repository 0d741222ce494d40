use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Self-assessed Italian proficiency, asked during onboarding because the
/// exam itself is held in Italian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItalianLevel {
    Weak,
    Good,
    VeryGood,
    Native,
}

/// Onboarding record. `is_completed` is derived from field completeness via
/// [`PersonalInfo::refresh_completion`] and gates the content lock.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub birth_date: Option<NaiveDate>,
    pub country: String,
    pub state: String,
    pub gender: Option<Gender>,
    pub phone: String,
    pub phone_country_code: String,
    pub italian_level: Option<ItalianLevel>,
    pub is_completed: bool,
}

impl PersonalInfo {
    /// A blank record, as stored for freshly registered accounts.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            phone_country_code: "+39".to_string(),
            ..Self::default()
        }
    }

    /// True when every onboarding field the lock cares about is filled in.
    #[must_use]
    pub fn all_required_filled(&self) -> bool {
        self.birth_date.is_some()
            && !self.country.trim().is_empty()
            && !self.state.trim().is_empty()
            && self.gender.is_some()
            && !self.phone.trim().is_empty()
            && self.italian_level.is_some()
    }

    /// Recomputes `is_completed` from field contents and returns it.
    pub fn refresh_completion(&mut self) -> bool {
        self.is_completed = self.all_required_filled();
        self.is_completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> PersonalInfo {
        PersonalInfo {
            birth_date: NaiveDate::from_ymd_opt(1995, 4, 12),
            country: "Italia".to_string(),
            state: "Lombardia".to_string(),
            gender: Some(Gender::Female),
            phone: "3331234567".to_string(),
            phone_country_code: "+39".to_string(),
            italian_level: Some(ItalianLevel::Good),
            is_completed: false,
        }
    }

    #[test]
    fn test_empty_record_is_incomplete() {
        let mut info = PersonalInfo::empty();
        assert!(!info.all_required_filled());
        assert!(!info.refresh_completion());
    }

    #[test]
    fn test_filled_record_completes() {
        let mut info = filled();
        assert!(info.refresh_completion());
        assert!(info.is_completed);
    }

    #[test]
    fn test_blank_country_blocks_completion() {
        let mut info = filled();
        info.country = "   ".to_string();
        assert!(!info.refresh_completion());
    }

    #[test]
    fn test_country_code_not_required() {
        let mut info = filled();
        info.phone_country_code = String::new();
        assert!(info.refresh_completion());
    }

    #[test]
    fn test_refresh_can_revoke_stale_flag() {
        let mut info = filled();
        info.is_completed = true;
        info.gender = None;
        assert!(!info.refresh_completion());
        assert!(!info.is_completed);
    }

    #[test]
    fn test_italian_level_serializes_snake_case() {
        let json = serde_json::to_string(&ItalianLevel::VeryGood).unwrap();
        assert_eq!(json, "\"very_good\"");
    }
}
