use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::common::deserialize_lenient_id;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LookupItem {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupParams {
    #[serde(default, deserialize_with = "deserialize_lenient_id")]
    pub parent_id: Option<i32>,
}

/// Reference tables exposed through `/api/lookups/:kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Religions,
    Castes,
    Countries,
    States,
    Cities,
    Educations,
    Languages,
    Professions,
}

impl LookupKind {
    pub fn table(self) -> &'static str {
        match self {
            LookupKind::Religions => "religions",
            LookupKind::Castes => "castes",
            LookupKind::Countries => "countries",
            LookupKind::States => "states",
            LookupKind::Cities => "cities",
            LookupKind::Educations => "educations",
            LookupKind::Languages => "languages",
            LookupKind::Professions => "professions",
        }
    }

    /// Column holding the parent id for hierarchical lookups.
    pub fn parent_column(self) -> Option<&'static str> {
        match self {
            LookupKind::Castes => Some("religion_id"),
            LookupKind::States => Some("country_id"),
            LookupKind::Cities => Some("state_id"),
            _ => None,
        }
    }
}

impl std::str::FromStr for LookupKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "religions" => Ok(LookupKind::Religions),
            "castes" => Ok(LookupKind::Castes),
            "countries" => Ok(LookupKind::Countries),
            "states" => Ok(LookupKind::States),
            "cities" => Ok(LookupKind::Cities),
            "educations" => Ok(LookupKind::Educations),
            "languages" | "mother-tongues" => Ok(LookupKind::Languages),
            "professions" => Ok(LookupKind::Professions),
            _ => Err(format!("unknown lookup: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_kinds() {
        assert_eq!("castes".parse::<LookupKind>(), Ok(LookupKind::Castes));
        assert_eq!("mother-tongues".parse::<LookupKind>(), Ok(LookupKind::Languages));
        assert_eq!(LookupKind::Cities.parent_column(), Some("state_id"));
        assert_eq!(LookupKind::Religions.parent_column(), None);
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!("users".parse::<LookupKind>().is_err());
        assert!("Religions".parse::<LookupKind>().is_err());
    }
}
