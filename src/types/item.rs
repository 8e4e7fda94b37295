use crate::error::TrackerError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

pub const DESCRIPTION_MAX_CHARS: usize = 1000;

/// A persisted inventory record as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub purchase_value: Option<f64>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied field set for create, upsert and update.
///
/// `id` only matters for save (upsert); update takes the id from the path.
/// Server-owned keys such as `createdAt` are ignored on input.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDraft {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub purchase_value: Option<f64>,
    #[serde(default, deserialize_with = "purchase_date_opt")]
    pub purchase_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "tag_set")]
    pub tags: BTreeSet<String>,
}

impl ItemDraft {
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
            ..Default::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.name.trim().is_empty() {
            return Err(TrackerError::Validation("name must not be blank".to_string()));
        }
        if self.status.trim().is_empty() {
            return Err(TrackerError::Validation(
                "status must not be blank".to_string(),
            ));
        }
        if let Some(description) = self.description.as_deref()
            && description.chars().count() > DESCRIPTION_MAX_CHARS
        {
            return Err(TrackerError::Validation(format!(
                "description must be at most {DESCRIPTION_MAX_CHARS} characters"
            )));
        }
        if let Some(value) = self.purchase_value
            && !value.is_finite()
        {
            return Err(TrackerError::Validation(
                "purchaseValue must be a finite number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse a purchase date given either as RFC 3339 or as a bare `YYYY-MM-DD`
/// calendar date, which maps to midnight UTC.
pub fn parse_purchase_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn purchase_date_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_purchase_date(&raw).map(Some).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid purchaseDate `{raw}`; expected RFC 3339 or YYYY-MM-DD"
            ))
        }),
    }
}

fn tag_set<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeSet<String>>::deserialize(deserializer)?.unwrap_or_default())
}
