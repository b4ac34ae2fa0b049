use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;

use super::super::domain::{AreaId, Assignment, AssignmentId, ReportingLevel};
use super::super::warning::StatsWarning;
use super::accumulator::{AreaStats, AssignmentTotals, OutsideAreaStats};
use super::distribution::MetricDistribution;

/// Column names of the per-area CSV export, in `AreaStats` field order.
const AREA_STATS_COLUMNS: [&str; 7] = [
    "areaId",
    "num_households",
    "num_places",
    "num_successful_visited_households",
    "num_visited_households",
    "num_visited_places",
    "num_visits",
];

/// Assignment-level summary driving the progress dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentStatsSummary {
    #[serde(flatten)]
    pub totals: AssignmentTotals,
    pub num_visited_households_outside_areas: u64,
    pub num_visited_places_outside_areas: u64,
    pub metrics: Vec<MetricDistribution>,
}

/// Everything computed for one assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentAreaStats {
    pub assignment_id: AssignmentId,
    pub reporting_level: ReportingLevel,
    /// Keyed by area id; one entry per unique session area.
    pub areas: BTreeMap<AreaId, AreaStats>,
    pub summary: AssignmentStatsSummary,
    pub outside_areas: OutsideAreaStats,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<StatsWarning>,
}

impl AssignmentAreaStats {
    /// All counters zero; what an assignment without sessions, areas or places yields.
    pub fn empty(assignment: &Assignment, metrics: Vec<MetricDistribution>) -> Self {
        Self {
            assignment_id: assignment.id.clone(),
            reporting_level: assignment.reporting_level,
            areas: BTreeMap::new(),
            summary: AssignmentStatsSummary {
                totals: AssignmentTotals::default(),
                num_visited_households_outside_areas: 0,
                num_visited_places_outside_areas: 0,
                metrics,
            },
            outside_areas: OutsideAreaStats::default(),
            warnings: Vec::new(),
        }
    }

    pub fn area(&self, area_id: &AreaId) -> Option<&AreaStats> {
        self.areas.get(area_id)
    }

    /// The `{ "stats": [...] }` body served to the area stats endpoint.
    pub fn area_stats_body(&self) -> AreaStatsBody<'_> {
        AreaStatsBody {
            stats: self.areas.values().collect(),
        }
    }

    /// One CSV row per area, header included even when there are no areas.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        if self.areas.is_empty() {
            csv_writer.write_record(AREA_STATS_COLUMNS)?;
        }
        for stats in self.areas.values() {
            csv_writer.serialize(stats)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AreaStatsBody<'a> {
    pub stats: Vec<&'a AreaStats>,
}
