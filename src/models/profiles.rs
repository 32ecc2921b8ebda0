use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn opposite(self) -> Self {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            _ => Err(format!("unknown gender: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaritalStatus {
    #[serde(rename = "Never Married")]
    NeverMarried,
    Divorced,
    Widowed,
    #[serde(rename = "Awaiting Divorce")]
    AwaitingDivorce,
    Annulled,
}

impl MaritalStatus {
    pub const ALL: [MaritalStatus; 5] = [
        MaritalStatus::NeverMarried,
        MaritalStatus::Divorced,
        MaritalStatus::Widowed,
        MaritalStatus::AwaitingDivorce,
        MaritalStatus::Annulled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MaritalStatus::NeverMarried => "Never Married",
            MaritalStatus::Divorced => "Divorced",
            MaritalStatus::Widowed => "Widowed",
            MaritalStatus::AwaitingDivorce => "Awaiting Divorce",
            MaritalStatus::Annulled => "Annulled",
        }
    }

    /// Case- and spacing-insensitive match against the display names.
    pub fn parse(value: &str) -> Option<Self> {
        let wanted: String = value
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().to_ascii_lowercase() == wanted)
    }
}

/// A profile joined with its reference names and one photo, as read by the
/// search and profile queries.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub height_cm: Option<i32>,
    pub marital_status: Option<String>,
    pub religion_id: Option<i32>,
    pub religion_name: Option<String>,
    pub caste_id: Option<i32>,
    pub caste_name: Option<String>,
    pub mother_tongue_id: Option<i32>,
    pub mother_tongue_name: Option<String>,
    pub country_id: Option<i32>,
    pub country_name: Option<String>,
    pub state_id: Option<i32>,
    pub state_name: Option<String>,
    pub city_id: Option<i32>,
    pub city_name: Option<String>,
    pub education_id: Option<i32>,
    pub education_name: Option<String>,
    pub profession_id: Option<i32>,
    pub profession_name: Option<String>,
    pub photo_path: Option<String>,
}

/// Flat display record returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub age: Option<i32>,
    pub height_cm: Option<i32>,
    pub height_label: Option<String>,
    pub marital_status: Option<String>,
    pub religion_id: Option<i32>,
    pub religion_name: Option<String>,
    pub caste_id: Option<i32>,
    pub caste_name: Option<String>,
    pub mother_tongue_id: Option<i32>,
    pub mother_tongue_name: Option<String>,
    pub country_id: Option<i32>,
    pub country_name: Option<String>,
    pub state_id: Option<i32>,
    pub state_name: Option<String>,
    pub city_id: Option<i32>,
    pub city_name: Option<String>,
    pub education_id: Option<i32>,
    pub education_name: Option<String>,
    pub profession_id: Option<i32>,
    pub profession_name: Option<String>,
    pub location: Option<String>,
    pub photo_url: Option<String>,
}

/// Data for the public profile card page.
#[derive(Debug, Clone)]
pub struct ProfileCardData {
    pub user_id: Uuid,
    pub display_name: String,
    pub age: Option<i32>,
    pub height_label: Option<String>,
    pub location: Option<String>,
    pub photo_url: Option<String>,
}
