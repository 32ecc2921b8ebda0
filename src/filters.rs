//! Profile search predicates.
//!
//! A [`SearchFilters`] request is first turned into a list of [`Filter`]
//! variants and then compiled in one place into a [`WhereClause`]. Every
//! predicate binds exactly one value, and the compiler numbers placeholders
//! from a single running counter, so predicate `k` always refers to `$k`.

use chrono::{Months, NaiveDate};
use sqlx::{postgres::PgArguments, Arguments};

use crate::models::{Gender, MaritalStatus, SearchFilters};
use crate::units;

const MAX_NAME_TOKENS: usize = 5;
const MAX_NAME_TOKEN_CHARS: usize = 50;
const MAX_AGE_YEARS: i64 = 120;

/// A value bound to one placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(i32),
    IntList(Vec<i32>),
    Text(String),
    TextList(Vec<String>),
    Date(NaiveDate),
}

/// Array value for `= ANY(...)`; only list types can be matched this way.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlList {
    Int(Vec<i32>),
    Text(Vec<String>),
}

impl SqlList {
    fn is_empty(&self) -> bool {
        match self {
            SqlList::Int(values) => values.is_empty(),
            SqlList::Text(values) => values.is_empty(),
        }
    }
}

impl From<SqlList> for SqlValue {
    fn from(list: SqlList) -> Self {
        match list {
            SqlList::Int(values) => SqlValue::IntList(values),
            SqlList::Text(values) => SqlValue::TextList(values),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq {
        column: &'static str,
        value: SqlValue,
    },
    /// Omitted from the clause when the list is empty.
    In {
        column: &'static str,
        values: SqlList,
    },
    /// Inclusive on both ends; either end may be open.
    Range {
        column: &'static str,
        min: Option<SqlValue>,
        max: Option<SqlValue>,
    },
    /// `%token%` pattern matched against first, last and full name.
    NameToken { pattern: String },
}

/// The gender search results are restricted to, resolved from the caller's
/// own profile before the filters are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetGender(Gender);

impl TargetGender {
    pub fn opposite_of(caller: Gender) -> Self {
        TargetGender(caller.opposite())
    }

    pub fn gender(self) -> Gender {
        self.0
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct WhereClause {
    predicates: Vec<String>,
    params: Vec<SqlValue>,
}

impl WhereClause {
    fn push(&mut self, render: impl FnOnce(&str) -> String, value: SqlValue) {
        self.params.push(value);
        let placeholder = format!("${}", self.params.len());
        self.predicates.push(render(&placeholder));
    }

    pub fn predicates(&self) -> &[String] {
        &self.predicates
    }

    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Index the next placeholder appended after this clause would take.
    pub fn next_placeholder(&self) -> usize {
        self.params.len() + 1
    }

    /// Predicates joined with `AND`, or `TRUE` when there are none.
    pub fn sql(&self) -> String {
        if self.predicates.is_empty() {
            "TRUE".to_string()
        } else {
            self.predicates.join(" AND ")
        }
    }

    pub fn arguments(&self) -> Result<PgArguments, sqlx::Error> {
        let mut args = PgArguments::default();
        for value in &self.params {
            let added = match value.clone() {
                SqlValue::Int(v) => args.add(v),
                SqlValue::IntList(v) => args.add(v),
                SqlValue::Text(v) => args.add(v),
                SqlValue::TextList(v) => args.add(v),
                SqlValue::Date(v) => args.add(v),
            };
            added.map_err(sqlx::Error::Encode)?;
        }
        Ok(args)
    }
}

pub fn compile(filters: &[Filter]) -> WhereClause {
    let mut clause = WhereClause::default();

    for filter in filters {
        match filter {
            Filter::Eq { column, value } => {
                clause.push(|p| format!("{column} = {p}"), value.clone());
            }
            Filter::In { column, values } => {
                if !values.is_empty() {
                    clause.push(|p| format!("{column} = ANY({p})"), values.clone().into());
                }
            }
            Filter::Range { column, min, max } => {
                if let Some(min) = min {
                    clause.push(|p| format!("{column} >= {p}"), min.clone());
                }
                if let Some(max) = max {
                    clause.push(|p| format!("{column} <= {p}"), max.clone());
                }
            }
            Filter::NameToken { pattern } => {
                clause.push(
                    |p| {
                        format!(
                            "(p.first_name ILIKE {p} OR p.last_name ILIKE {p} \
                             OR concat_ws(' ', p.first_name, p.last_name) ILIKE {p})"
                        )
                    },
                    SqlValue::Text(pattern.clone()),
                );
            }
        }
    }

    clause
}

/// Translate a search request into filters. The gender restriction is always
/// first; every other filter is present only when its input is usable.
pub fn build_filters(request: &SearchFilters, target: TargetGender, today: NaiveDate) -> Vec<Filter> {
    let mut filters = vec![Filter::Eq {
        column: "p.gender",
        value: SqlValue::Text(target.gender().as_str().to_string()),
    }];

    if let Some(range) = age_range(request.age_min, request.age_max, today) {
        filters.push(range);
    }

    let height_min = request.height_min_label.as_deref().and_then(units::label_to_cm);
    let height_max = request.height_max_label.as_deref().and_then(units::label_to_cm);
    if height_min.is_some() || height_max.is_some() {
        filters.push(Filter::Range {
            column: "p.height_cm",
            min: height_min.map(SqlValue::Int),
            max: height_max.map(SqlValue::Int),
        });
    }

    let mut statuses: Vec<String> = Vec::new();
    for status in request.marital_statuses.iter().filter_map(|s| MaritalStatus::parse(s)) {
        let name = status.as_str().to_string();
        if !statuses.contains(&name) {
            statuses.push(name);
        }
    }
    if !statuses.is_empty() {
        filters.push(Filter::In {
            column: "p.marital_status",
            values: SqlList::Text(statuses),
        });
    }

    let id_filters = [
        ("p.religion_id", request.religion_id),
        ("p.caste_id", request.caste_id),
        ("p.mother_tongue_id", request.mother_tongue_id),
        ("p.country_id", request.country_id),
        ("p.city_id", request.city_id),
        ("p.education_id", request.education_id),
    ];
    for (column, value) in id_filters {
        if let Some(id) = value.filter(|id| *id > 0) {
            filters.push(Filter::Eq {
                column,
                value: SqlValue::Int(id),
            });
        }
    }

    let mut state_ids: Vec<i32> = request.state_ids.iter().copied().filter(|id| *id > 0).collect();
    state_ids.sort_unstable();
    state_ids.dedup();
    if !state_ids.is_empty() {
        filters.push(Filter::In {
            column: "p.state_id",
            values: SqlList::Int(state_ids),
        });
    }

    if let Some(name) = request.name.as_deref() {
        filters.extend(
            name.split_whitespace()
                .take(MAX_NAME_TOKENS)
                .map(|token| {
                    let token: String = token.chars().take(MAX_NAME_TOKEN_CHARS).collect();
                    Filter::NameToken {
                        pattern: format!("%{}%", escape_like(&token)),
                    }
                }),
        );
    }

    filters
}

/// Age bounds become a date-of-birth range. Someone is at least `min` years
/// old when born on or before `today - min years`, and at most `max` years
/// old when born after `today - (max + 1) years`.
fn age_range(age_min: Option<i64>, age_max: Option<i64>, today: NaiveDate) -> Option<Filter> {
    let usable = |age: Option<i64>| age.filter(|a| (0..=MAX_AGE_YEARS).contains(a));
    let (min, max) = match (usable(age_min), usable(age_max)) {
        (Some(lo), Some(hi)) if lo > hi => (Some(hi), Some(lo)),
        bounds => bounds,
    };

    let latest_birth = min.and_then(|years| years_before(today, years));
    let earliest_birth = max
        .and_then(|years| years_before(today, years + 1))
        .and_then(|date| date.succ_opt());

    if latest_birth.is_none() && earliest_birth.is_none() {
        return None;
    }

    Some(Filter::Range {
        column: "p.date_of_birth",
        min: earliest_birth.map(SqlValue::Date),
        max: latest_birth.map(SqlValue::Date),
    })
}

fn years_before(date: NaiveDate, years: i64) -> Option<NaiveDate> {
    let months = u32::try_from(years).ok()?.checked_mul(12)?;
    date.checked_sub_months(Months::new(months))
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
