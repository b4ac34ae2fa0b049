use serde::Serialize;
use std::fmt;

use super::domain::{AreaId, AssignmentId};

/// Recoverable data anomalies observed while computing stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatsWarning {
    /// Area polygon has fewer than three vertices and matches no place.
    InvalidGeometry { area_id: AreaId, vertices: usize },
    /// No metric defines done; successful counts are reported as zero.
    MissingDoneMetric { assignment_id: AssignmentId },
    /// A session references an area the store could not find.
    MissingArea { area_id: AreaId },
}

impl fmt::Display for StatsWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatsWarning::InvalidGeometry { area_id, vertices } => write!(
                f,
                "area {} has {} vertices; treated as empty",
                area_id, vertices
            ),
            StatsWarning::MissingDoneMetric { assignment_id } => write!(
                f,
                "assignment {} has no metric defining done",
                assignment_id
            ),
            StatsWarning::MissingArea { area_id } => {
                write!(f, "session area {} not found", area_id)
            }
        }
    }
}
