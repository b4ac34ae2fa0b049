//! Canvass assignment statistics: which places fall inside which areas, and
//! how the recorded visits roll up per area and per assignment.

pub mod cache;
pub mod cancel;
pub mod domain;
pub mod geometry;
pub mod membership;
pub mod repository;
pub mod service;
pub mod stats;
pub mod visits;
mod warning;

#[cfg(test)]
mod tests;

pub use cache::StatsCache;
pub use cancel::{CancellationToken, Interrupt};
pub use domain::{
    Area, AreaId, Assignment, AssignmentId, GeoPoint, Household, HouseholdId, Metric, MetricId,
    MetricKind, MetricResponse, MetricResponseCounts, OrgId, Person, PersonId, Place, PlaceId,
    PlaceVisit, ReportingLevel, Session, Visit, VisitId,
};
pub use geometry::{point_in_polygon, Bounds};
pub use membership::{resolve_membership, AreaMembership};
pub use repository::{
    CanvassDataset, CanvassRepository, DatasetError, PersonDirectory, RepositoryError,
};
pub use service::{AreaStatsService, EngineOptions, SessionView, StatsServiceError};
pub use stats::{
    AreaActivity, AreaStats, AssignmentAreaStats, AssignmentStatsSummary, MetricDistribution,
    OutsideAreaStats, PlaceProgress,
};
pub use visits::{fold_household, HouseholdOutcome, ProgressState};
pub use warning::StatsWarning;
