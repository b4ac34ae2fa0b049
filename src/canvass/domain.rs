use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a canvass assignment.
    AssignmentId
);
string_id!(AreaId);
string_id!(PlaceId);
string_id!(HouseholdId);
string_id!(VisitId);
string_id!(MetricId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub u64);

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportingLevel {
    Household,
    Place,
}

impl ReportingLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Household => "Household",
            Self::Place => "Place",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Boolean,
    Scale5,
}

impl MetricKind {
    /// Response values in bucket order.
    pub const fn buckets(self) -> &'static [&'static str] {
        match self {
            Self::Boolean => &["yes", "no"],
            Self::Scale5 => &["1", "2", "3", "4", "5"],
        }
    }

    pub fn bucket_of(self, response: &str) -> Option<usize> {
        self.buckets().iter().position(|bucket| *bucket == response)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub id: MetricId,
    pub question: String,
    #[serde(default)]
    pub description: String,
    pub kind: MetricKind,
    #[serde(default)]
    pub defines_done: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    #[serde(rename = "organization")]
    pub org_id: OrgId,
    #[serde(rename = "campaign")]
    pub campaign_id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub reporting_level: ReportingLevel,
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

impl Assignment {
    /// The metric whose "yes" answer marks a successful visit, if configured.
    pub fn done_metric(&self) -> Option<&Metric> {
        self.metrics.iter().find(|metric| metric.defines_done)
    }
}

/// Binds one assignee to one area under one assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub assignment_id: AssignmentId,
    pub area_id: AreaId,
    pub person_id: PersonId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaId,
    #[serde(rename = "organization")]
    pub org_id: OrgId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "point_pairs")]
    pub points: Vec<GeoPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: PlaceId,
    pub org_id: OrgId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub position: GeoPoint,
    #[serde(default)]
    pub households: Vec<Household>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub id: HouseholdId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub floor: Option<i32>,
    #[serde(default)]
    pub visits: Vec<Visit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: VisitId,
    pub canvass_ass_id: Option<AssignmentId>,
    #[serde(default)]
    pub person_id: Option<PersonId>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub note_to_official: Option<String>,
    #[serde(default)]
    pub responses: Vec<MetricResponse>,
}

impl Visit {
    pub fn belongs_to(&self, assignment_id: &AssignmentId) -> bool {
        self.canvass_ass_id.as_ref() == Some(assignment_id)
    }

    pub fn responses_to<'a>(&'a self, metric_id: &'a MetricId) -> impl Iterator<Item = &'a str> {
        self.responses
            .iter()
            .filter(move |response| &response.metric_id == metric_id)
            .map(|response| response.response.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricResponse {
    pub metric_id: MetricId,
    pub response: String,
}

/// A visit recorded at place granularity with aggregate response counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceVisit {
    pub id: VisitId,
    pub canvass_ass_id: AssignmentId,
    pub place_id: PlaceId,
    #[serde(default)]
    pub person_id: Option<PersonId>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub responses: Vec<MetricResponseCounts>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricResponseCounts {
    pub metric_id: MetricId,
    pub response_counts: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub first_name: String,
    pub last_name: String,
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Polygons travel as `[[lat, lng], ...]`.
mod point_pairs {
    use super::GeoPoint;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(points: &[GeoPoint], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let pairs: Vec<[f64; 2]> = points.iter().map(|point| [point.lat, point.lng]).collect();
        pairs.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<GeoPoint>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let pairs = Vec::<[f64; 2]>::deserialize(deserializer)?;
        Ok(pairs
            .into_iter()
            .map(|[lat, lng]| GeoPoint::new(lat, lng))
            .collect())
    }
}
