//! Area statistics for canvassing assignments.
//!
//! Record-in, stats-out: callers hand over assignments, sessions, areas and
//! places through [`canvass::CanvassRepository`] and receive per-area and
//! per-assignment rollups from [`canvass::AreaStatsService`].

pub mod canvass;
pub mod config;
pub mod error;
pub mod telemetry;
