//! Chat listing and user DTOs
//!
//! Chats have no table of their own; a chat is a pair of numbers that has
//! exchanged messages, aggregated on read.

use chibi_core::models::User;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One chat pair in the listing
#[derive(Debug, Clone, Serialize)]
pub struct ChatPairResponse {
    /// Lexicographically smaller number of the pair
    pub number_a: String,

    /// Lexicographically larger number of the pair
    pub number_b: String,

    /// Messages exchanged between the pair
    pub message_count: i64,

    /// Timestamp of the most recent message
    pub last_message_at: DateTime<Utc>,
}

/// User as returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub phone_number: String,
    pub nickname: String,
    pub gender: Option<String>,
    pub birth_year: Option<i32>,
    pub region: Option<String>,
    pub age: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let age = user.age();
        Self {
            id: user.id,
            phone_number: user.phone_number,
            nickname: user.nickname,
            gender: user.gender,
            birth_year: user.birth_year,
            region: user.region,
            age,
            created_at: user.created_at,
        }
    }
}
