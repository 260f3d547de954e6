use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A buyer-seller thread about one property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub property_id: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: u32,
    /// Display name of the seller, as seen by the local buyer
    pub other_party_name: String,
    pub property_title: String,
    pub property_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Whether `user_id` is one of the two parties
    pub fn involves(&self, user_id: &str) -> bool {
        self.buyer_id == user_id || self.seller_id == user_id
    }

    /// The party on the other side of `user_id`
    pub fn counterpart_of(&self, user_id: &str) -> &str {
        if self.buyer_id == user_id {
            &self.seller_id
        } else {
            &self.buyer_id
        }
    }

    /// Timestamp used to order the conversation list
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_message_at.unwrap_or(self.created_at)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub property_id: String,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
