//! Turns joined profile rows into flat display records.

use chrono::{Datelike, NaiveDate};

use crate::models::{ProfileCardData, ProfileRow, ProfileSummary};
use crate::units;

pub fn shape_profile(row: ProfileRow, today: NaiveDate) -> ProfileSummary {
    let full_name = full_name(&row.first_name, &row.last_name);
    let location = location(
        row.city_name.as_deref(),
        row.state_name.as_deref(),
        row.country_name.as_deref(),
    );

    ProfileSummary {
        user_id: row.user_id,
        full_name,
        gender: row.gender,
        age: row.date_of_birth.and_then(|dob| age_on(dob, today)),
        date_of_birth: row.date_of_birth,
        height_label: row.height_cm.and_then(|cm| units::cm_to_label(f64::from(cm))),
        height_cm: row.height_cm,
        marital_status: row.marital_status,
        religion_id: row.religion_id,
        religion_name: row.religion_name,
        caste_id: row.caste_id,
        caste_name: row.caste_name,
        mother_tongue_id: row.mother_tongue_id,
        mother_tongue_name: row.mother_tongue_name,
        country_id: row.country_id,
        country_name: row.country_name,
        state_id: row.state_id,
        state_name: row.state_name,
        city_id: row.city_id,
        city_name: row.city_name,
        education_id: row.education_id,
        education_name: row.education_name,
        profession_id: row.profession_id,
        profession_name: row.profession_name,
        location,
        photo_url: row.photo_path.as_deref().and_then(normalize_photo_path),
        first_name: row.first_name,
        last_name: row.last_name,
    }
}

pub fn card_data(summary: &ProfileSummary) -> ProfileCardData {
    let display_name = if summary.full_name.is_empty() {
        "Member".to_string()
    } else {
        summary.full_name.clone()
    };

    ProfileCardData {
        user_id: summary.user_id,
        display_name,
        age: summary.age,
        height_label: summary.height_label.clone(),
        location: summary.location.clone(),
        photo_url: summary.photo_url.clone(),
    }
}

/// Absolute http(s) URLs and protocol-relative ones with a dotted host
/// (`//cdn.example.com/...`) pass through;
/// anything else gets exactly one leading slash.
pub fn normalize_photo_path(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = url::Url::parse(trimmed) {
        if matches!(parsed.scheme(), "http" | "https") {
            return Some(trimmed.to_string());
        }
    }

    if is_protocol_relative(trimmed) {
        return Some(trimmed.to_string());
    }

    let relative = trimmed.trim_start_matches(['/', '\\']);
    if relative.is_empty() {
        return None;
    }
    Some(format!("/{relative}"))
}

fn is_protocol_relative(path: &str) -> bool {
    let Some(rest) = path.strip_prefix("//") else {
        return false;
    };
    if rest.starts_with('/') {
        return false;
    }
    url::Url::parse(&format!("https:{path}"))
        .ok()
        .and_then(|parsed| parsed.host_str().map(|host| host.contains('.')))
        .unwrap_or(false)
}

pub fn full_name(first: &str, last: &str) -> String {
    [first.trim(), last.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn location(city: Option<&str>, state: Option<&str>, country: Option<&str>) -> Option<String> {
    let parts: Vec<&str> = [city, state, country]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

/// Completed years between `dob` and `today`.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> Option<i32> {
    if dob > today {
        return None;
    }
    let mut years = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    Some(years)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn row() -> ProfileRow {
        ProfileRow {
            user_id: Uuid::nil(),
            first_name: " Anu ".into(),
            last_name: "Sharma".into(),
            gender: Some("Female".into()),
            date_of_birth: Some(date(1995, 8, 20)),
            height_cm: Some(163),
            marital_status: Some("Never Married".into()),
            religion_id: Some(1),
            religion_name: Some("Hindu".into()),
            caste_id: None,
            caste_name: None,
            mother_tongue_id: Some(4),
            mother_tongue_name: Some("Marathi".into()),
            country_id: Some(1),
            country_name: Some("India".into()),
            state_id: Some(2),
            state_name: Some("Maharashtra".into()),
            city_id: Some(3),
            city_name: Some("  ".into()),
            education_id: Some(5),
            education_name: Some("B.Tech".into()),
            profession_id: None,
            profession_name: None,
            photo_path: Some("uploads/a.jpg".into()),
        }
    }

    #[rstest]
    #[case("uploads/a.jpg", Some("/uploads/a.jpg"))]
    #[case("/uploads/a.jpg", Some("/uploads/a.jpg"))]
    #[case("///uploads/a.jpg", Some("/uploads/a.jpg"))]
    #[case(" https://cdn.example.com/a.jpg ", Some("https://cdn.example.com/a.jpg"))]
    #[case("http://cdn.example.com//a.jpg", Some("http://cdn.example.com//a.jpg"))]
    #[case("//cdn.example.com/a.jpg", Some("//cdn.example.com/a.jpg"))]
    #[case("//uploads/a.jpg", Some("/uploads/a.jpg"))]
    #[case("", None)]
    #[case("/", None)]
    fn normalizes_photo_paths(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(normalize_photo_path(raw).as_deref(), expected);
    }

    #[rstest]
    #[case(" Anu ", " Sharma", "Anu Sharma")]
    #[case("Anu", "", "Anu")]
    #[case("", "Sharma", "Sharma")]
    #[case(" ", " ", "")]
    fn joins_full_name(#[case] first: &str, #[case] last: &str, #[case] expected: &str) {
        assert_eq!(full_name(first, last), expected);
    }

    #[test]
    fn location_skips_empty_parts() {
        assert_eq!(
            location(Some("Pune"), Some("Maharashtra"), Some("India")).as_deref(),
            Some("Pune, Maharashtra, India")
        );
        assert_eq!(
            location(Some(""), None, Some("India")).as_deref(),
            Some("India")
        );
        assert_eq!(location(None, Some(" "), None), None);
    }

    #[rstest]
    #[case(date(1995, 8, 20), date(2024, 8, 19), Some(28))]
    #[case(date(1995, 8, 20), date(2024, 8, 20), Some(29))]
    #[case(date(2000, 2, 29), date(2024, 2, 28), Some(23))]
    #[case(date(2030, 1, 1), date(2024, 1, 1), None)]
    fn computes_age(#[case] dob: NaiveDate, #[case] today: NaiveDate, #[case] expected: Option<i32>) {
        assert_eq!(age_on(dob, today), expected);
    }

    #[test]
    fn shapes_joined_row() {
        let summary = shape_profile(row(), date(2024, 6, 15));

        assert_eq!(summary.full_name, "Anu Sharma");
        assert_eq!(summary.first_name, " Anu ");
        assert_eq!(summary.age, Some(28));
        assert_eq!(summary.height_label.as_deref(), Some("5 ft 4 in"));
        assert_eq!(summary.location.as_deref(), Some("Maharashtra, India"));
        assert_eq!(summary.photo_url.as_deref(), Some("/uploads/a.jpg"));
        assert_eq!(summary.religion_name.as_deref(), Some("Hindu"));

        let json = serde_json::to_value(&summary).expect("serializes");
        assert_eq!(json["fullName"], "Anu Sharma");
        assert_eq!(json["heightLabel"], "5 ft 4 in");
    }

    #[test]
    fn card_falls_back_to_member_name() {
        let mut blank = row();
        blank.first_name = String::new();
        blank.last_name = String::new();
        let card = card_data(&shape_profile(blank, date(2024, 6, 15)));
        assert_eq!(card.display_name, "Member");
    }
}
