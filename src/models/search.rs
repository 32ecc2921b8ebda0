use crate::models::common::{
    deserialize_lenient_i64, deserialize_lenient_id, deserialize_lenient_id_list,
    deserialize_lenient_string, deserialize_lenient_string_list,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse<T> {
    pub page: i64,
    pub limit: i64,
    pub count: i64,
    pub results: Vec<T>,
}

/// Body of `POST /api/search`. Every key is optional, and malformed values
/// deserialize to "no constraint".
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub age_min: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub age_max: Option<i64>,

    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub height_min_label: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub height_max_label: Option<String>,

    #[serde(default, deserialize_with = "deserialize_lenient_string_list")]
    pub marital_statuses: Vec<String>,

    #[serde(default, deserialize_with = "deserialize_lenient_id")]
    pub religion_id: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_lenient_id")]
    pub mother_tongue_id: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_lenient_id")]
    pub caste_id: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_lenient_id")]
    pub country_id: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_lenient_id_list")]
    pub state_ids: Vec<i32>,
    #[serde(default, deserialize_with = "deserialize_lenient_id")]
    pub city_id: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_lenient_id")]
    pub education_id: Option<i32>,

    // Free-text match on first/last name
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub limit: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub page: Option<i64>,
}
