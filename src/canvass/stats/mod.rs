mod accumulator;
mod distribution;
mod graph;
pub mod views;

pub use accumulator::{
    accumulate, area_stats, place_progress, totals, AreaStats, AssignmentReporting,
    AssignmentTotals, HouseholdReporting, OutsideAreaStats, PlaceProgress, PlaceReporting,
    PlaceTally, StatsContribution,
};
pub use distribution::{metric_distribution, MetricDistribution};
pub use graph::{area_activity, ActivityPoint, AreaActivity, AreaRef};
pub use views::{AreaStatsBody, AssignmentAreaStats, AssignmentStatsSummary};
