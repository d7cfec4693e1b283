// Wire and domain types for the hh.ru API

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// Fixed page size used for every paginated request
pub const PAGE_SIZE: u32 = 100;

/// hh refuses to page past this many results of one query
pub const MAX_REACHABLE_RESULTS: u32 = 2000;

/// Minimal vacancy record returned by search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
}

impl SearchResult {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// One page of `GET /vacancies`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub items: Vec<SearchResult>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub pages: u32,
    /// Authoritative total across all pages
    #[serde(default)]
    pub found: u32,
}

/// Full vacancy as returned by `GET /vacancies/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawDetail")]
pub struct VacancyDetail {
    pub id: String,
    pub name: String,
    pub skills: BTreeSet<String>,
    pub experience_id: String,
    pub experience_name: String,
    pub description: String,
    pub salary_from: Option<f64>,
    pub salary_to: Option<f64>,
    pub created_at: DateTime<FixedOffset>,
    pub archived: bool,
    pub url: String,
}

#[derive(Deserialize)]
struct RawDetail {
    #[serde(default)]
    id: String,
    name: String,
    #[serde(default)]
    key_skills: Vec<Named>,
    #[serde(default)]
    experience: Option<RawExperience>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    salary: Option<RawSalary>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    created_at: DateTime<FixedOffset>,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    alternate_url: String,
}

#[derive(Deserialize)]
struct Named {
    name: String,
}

#[derive(Deserialize)]
struct RawExperience {
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct RawSalary {
    from: Option<f64>,
    to: Option<f64>,
}

impl From<RawDetail> for VacancyDetail {
    fn from(raw: RawDetail) -> Self {
        let (experience_id, experience_name) = raw
            .experience
            .map(|e| (e.id, e.name))
            .unwrap_or_default();
        let (salary_from, salary_to) = raw
            .salary
            .map(|s| (s.from, s.to))
            .unwrap_or((None, None));

        Self {
            id: raw.id,
            name: raw.name,
            skills: raw.key_skills.into_iter().map(|s| s.name).collect(),
            experience_id,
            experience_name,
            description: raw.description,
            salary_from,
            salary_to,
            created_at: raw.created_at,
            archived: raw.archived,
            url: raw.alternate_url,
        }
    }
}

// hh sends `2024-01-15T10:30:00+0300`; RFC 3339 is accepted as well
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resume {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResumeList {
    #[serde(default)]
    pub items: Vec<Resume>,
}

/// An application already submitted by the user
#[derive(Debug, Clone, Deserialize)]
pub struct Negotiation {
    pub id: String,
    /// Absent when the vacancy has been removed
    #[serde(default)]
    pub vacancy: Option<SearchResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NegotiationPage {
    #[serde(default)]
    pub items: Vec<Negotiation>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub pages: u32,
}

/// Bearer access token of one user, passed explicitly on every authorized call
#[derive(Clone)]
pub struct Credentials {
    access_token: String,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .finish()
    }
}
