//! Persisted record shapes, response shapes, and request bodies.
//!
//! Row structs map tables one-to-one and serialize directly as response
//! bodies. The `*With*` wrappers add eager-loaded relations via serde
//! flattening, matching the shapes the list and get endpoints return.
//!
//! Request bodies are explicit schemas rather than free-form maps: unknown
//! fields are rejected at the boundary, and update bodies distinguish an
//! absent field (keep the stored value) from an explicit `null` (clear a
//! nullable column) through [`Patch`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Rows
// ============================================================================

/// A persisted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub location: Option<String>,
    pub forecast: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub budget: Option<f64>,
}

/// A persisted artist, booked for exactly one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub surname: Option<String>,
    pub genre: Option<String>,
    pub contact_info: Option<String>,
    pub available_date: Option<String>,
    pub event_id: i64,
}

/// A persisted resource, rented for exactly one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Resource {
    pub id: i64,
    pub name: String,
    pub rented: bool,
    pub quantity: Option<i64>,
    pub event_id: i64,
}

// ============================================================================
// Eager-loaded response shapes
// ============================================================================

/// An event together with its artists and resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventWithRelations {
    #[serde(flatten)]
    pub event: Event,
    pub artists: Vec<Artist>,
    pub resources: Vec<Resource>,
}

/// An artist together with its parent event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistWithEvent {
    #[serde(flatten)]
    pub artist: Artist,
    pub event: Event,
}

/// A resource together with its parent event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceWithEvent {
    #[serde(flatten)]
    pub resource: Resource,
    pub event: Event,
}

// ============================================================================
// Partial-update field state
// ============================================================================

/// Tri-state wrapper for a nullable column in an update body.
///
/// Distinguishes the three JSON cases a partial update can express:
/// - field absent: keep the stored value ([`Patch::Missing`])
/// - field present as `null`: clear the column ([`Patch::Null`])
/// - field present with a value: overwrite ([`Patch::Value`])
///
/// Fields of this type need `#[serde(default)]` so an absent field maps to
/// `Missing` instead of a deserialization error.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    /// Field was not present in the request body.
    Missing,

    /// Field was explicitly `null`.
    Null,

    /// Field carried a value.
    Value(T),
}

impl<T> Patch<T> {
    /// Applies the patch to the stored value.
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Self::Missing => current,
            Self::Null => None,
            Self::Value(value) => Some(value),
        }
    }

    /// Returns `true` if the field was absent from the request body.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Self::Missing
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Only called when the field is present; absence is handled by
        // #[serde(default)] on the containing struct.
        Option::<T>::deserialize(deserializer).map(|opt| match opt {
            Some(value) => Self::Value(value),
            None => Self::Null,
        })
    }
}

// ============================================================================
// Timestamps
// ============================================================================

/// Parses a request timestamp.
///
/// Accepts RFC 3339 (`2024-01-01T20:00:00Z`), a naive datetime
/// (`2024-01-01T20:00:00`, taken as UTC), or a bare date (`2024-01-01`,
/// taken as midnight UTC).
pub(crate) fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Ok(datetime.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    }

    Err(format!(
        "invalid timestamp '{raw}', expected RFC 3339 or YYYY-MM-DD"
    ))
}

fn deserialize_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_datetime(&raw).map_err(serde::de::Error::custom)
}

fn deserialize_datetime_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    // A null timestamp clears nothing; the columns are NOT NULL, so it is
    // treated the same as an absent field.
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_datetime(&raw)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

// ============================================================================
// Request bodies
// ============================================================================

/// Body for `POST /events`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateEvent {
    pub name: String,
    pub location: Option<String>,
    pub forecast: Option<String>,
    #[serde(deserialize_with = "deserialize_datetime")]
    pub start_date: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_datetime")]
    pub end_date: DateTime<Utc>,
    pub budget: Option<f64>,
}

/// Body for `PUT /events/{id}`. Absent fields keep their stored values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateEvent {
    pub name: Option<String>,
    #[serde(default)]
    pub location: Patch<String>,
    #[serde(default)]
    pub forecast: Patch<String>,
    #[serde(default, deserialize_with = "deserialize_datetime_opt")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_datetime_opt")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub budget: Patch<f64>,
}

/// Body for `POST /artists`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateArtist {
    pub name: String,
    pub surname: Option<String>,
    pub genre: Option<String>,
    pub contact_info: Option<String>,
    pub available_date: Option<String>,
    pub event_id: i64,
}

/// Body for `PUT /artists/{id}`. Absent fields keep their stored values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateArtist {
    pub name: Option<String>,
    #[serde(default)]
    pub surname: Patch<String>,
    #[serde(default)]
    pub genre: Patch<String>,
    #[serde(default)]
    pub contact_info: Patch<String>,
    #[serde(default)]
    pub available_date: Patch<String>,
    pub event_id: Option<i64>,
}

/// Body for `POST /resources`. `rented` is required on the standalone
/// collection, unlike the event-scoped create.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateResource {
    pub name: String,
    pub rented: bool,
    pub quantity: Option<i64>,
    pub event_id: i64,
}

/// Body for `POST /events/{id}/resources`.
///
/// The parent event id comes from the path, never from the body, and
/// `rented` defaults to false when absent.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateEventResource {
    pub name: String,
    #[serde(default)]
    pub rented: bool,
    pub quantity: Option<i64>,
}

/// Body for `PUT /resources/{id}`. Absent fields keep their stored values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateResource {
    pub name: Option<String>,
    pub rented: Option<bool>,
    #[serde(default)]
    pub quantity: Patch<i64>,
    pub event_id: Option<i64>,
}
