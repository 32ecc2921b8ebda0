use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_ACCEPTED: &str = "accepted";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Interest {
    pub id: i32,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub status: String,
    pub message: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendInterestRequest {
    pub receiver_id: Uuid,
    #[validate(length(max = 500))]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterestDirection {
    #[default]
    Received,
    Sent,
}

#[derive(Debug, Default, Deserialize)]
pub struct InterestListParams {
    #[serde(default)]
    pub direction: InterestDirection,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_length_is_validated() {
        let ok: SendInterestRequest = serde_json::from_value(json!({
            "receiverId": Uuid::nil(),
            "message": "Hello"
        }))
        .expect("request");
        assert!(ok.validate().is_ok());

        let too_long = SendInterestRequest {
            receiver_id: Uuid::nil(),
            message: Some("x".repeat(501)),
        };
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn direction_defaults_to_received() {
        let params: InterestListParams = serde_json::from_value(json!({})).expect("params");
        assert_eq!(params.direction, InterestDirection::Received);
        let params: InterestListParams =
            serde_json::from_value(json!({ "direction": "sent" })).expect("params");
        assert_eq!(params.direction, InterestDirection::Sent);
    }
}
