//! User model

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// A registered user, keyed by phone number
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,

    /// Phone number (unique)
    pub phone_number: String,

    /// Display nickname
    pub nickname: String,

    /// Self-reported gender
    pub gender: Option<String>,

    /// Birth year for demographics
    pub birth_year: Option<i32>,

    /// Self-reported region
    pub region: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Approximate age derived from birth year
    pub fn age(&self) -> Option<i32> {
        self.birth_year.map(|year| (Utc::now().year() - year).max(0))
    }
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: 0,
            phone_number: String::new(),
            nickname: String::new(),
            gender: None,
            birth_year: None,
            region: None,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_from_birth_year() {
        let mut user = User::default();
        assert_eq!(user.age(), None);

        user.birth_year = Some(Utc::now().year() - 30);
        assert_eq!(user.age(), Some(30));
    }
}
