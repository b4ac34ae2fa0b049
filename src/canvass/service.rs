use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::cancel::{CancellationToken, Interrupt};
use super::domain::{Area, AreaId, Assignment, AssignmentId, Person, Place, PlaceVisit};
use super::membership::{resolve_membership, AreaMembership};
use super::repository::{CanvassRepository, PersonDirectory, RepositoryError};
use super::stats::{
    area_activity, area_stats, metric_distribution, place_progress, totals,
    AreaActivity, AreaStats, AssignmentAreaStats, AssignmentReporting, AssignmentStatsSummary,
    PlaceProgress,
};
use super::warning::StatsWarning;

/// Tuning knobs for the aggregation engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Fan areas out over the rayon pool; ignored without the `parallel` feature.
    pub parallel: bool,
    /// Applied on top of any deadline carried by the caller's token.
    pub deadline: Option<Duration>,
}

/// A session with its area and assignee resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub assignment_id: AssignmentId,
    pub area: Area,
    pub assignee: Person,
}

/// Records fetched for one assignment.
struct LoadedAssignment {
    assignment: Assignment,
    areas: Vec<Area>,
    places: Vec<Place>,
    place_visits: Vec<PlaceVisit>,
    warnings: Vec<StatsWarning>,
}

/// Composes the data-access layer with membership resolution and stats folding.
pub struct AreaStatsService<R, P> {
    repository: Arc<R>,
    people: Arc<P>,
    options: EngineOptions,
}

impl<R, P> AreaStatsService<R, P>
where
    R: CanvassRepository + 'static,
    P: PersonDirectory + 'static,
{
    pub fn new(repository: Arc<R>, people: Arc<P>) -> Self {
        Self::with_options(repository, people, EngineOptions::default())
    }

    pub fn with_options(repository: Arc<R>, people: Arc<P>, options: EngineOptions) -> Self {
        Self {
            repository,
            people,
            options,
        }
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Computes per-area and assignment-level stats.
    ///
    /// An unknown assignment is an error; an assignment without sessions,
    /// areas or places yields all-zero counters.
    pub fn compute(
        &self,
        assignment_id: &AssignmentId,
        token: &CancellationToken,
    ) -> Result<AssignmentAreaStats, StatsServiceError> {
        let token = match self.options.deadline {
            Some(deadline) => token.clone().with_timeout(deadline),
            None => token.clone(),
        };

        let loaded = self.load(assignment_id)?;
        let LoadedAssignment {
            assignment,
            areas,
            places,
            place_visits,
            mut warnings,
        } = loaded;

        if assignment.done_metric().is_none() {
            warn!(
                assignment_id = %assignment.id,
                "no metric defines done; successful visits stay at zero"
            );
            warnings.push(StatsWarning::MissingDoneMetric {
                assignment_id: assignment.id.clone(),
            });
        }

        if areas.is_empty() {
            debug!(assignment_id = %assignment.id, "assignment has no resolvable areas");
            let metrics = metric_distribution(&assignment, &[], &[]);
            let mut stats = AssignmentAreaStats::empty(&assignment, metrics);
            stats.warnings = warnings;
            return Ok(stats);
        }

        let metrics = metric_distribution(&assignment, &places, &place_visits);

        let membership = resolve_membership(&areas, &places, &token)
            .map_err(|interrupt| StatsServiceError::interrupted(interrupt, 0))?;
        warnings.extend(membership.warnings().iter().cloned());

        let reporting = AssignmentReporting::new(&assignment, &place_visits);
        let per_area = self.accumulate_areas(&reporting, &membership, &places, &token)?;
        token
            .check()
            .map_err(|interrupt| StatsServiceError::interrupted(interrupt, per_area.len()))?;
        let (assignment_totals, outside_areas) =
            totals(&reporting, &membership, &places, &per_area);

        info!(
            assignment_id = %assignment.id,
            reporting_level = assignment.reporting_level.label(),
            areas = per_area.len(),
            places = places.len(),
            visited_households = assignment_totals.num_visited_households,
            outside_visited_places = outside_areas.num_visited_places,
            "computed area stats"
        );

        Ok(AssignmentAreaStats {
            assignment_id: assignment.id.clone(),
            reporting_level: assignment.reporting_level,
            areas: per_area,
            summary: AssignmentStatsSummary {
                totals: assignment_totals,
                num_visited_households_outside_areas: outside_areas.num_visited_households,
                num_visited_places_outside_areas: outside_areas.num_visited_places,
                metrics,
            },
            outside_areas,
            warnings,
        })
    }

    /// Hour-bucketed activity per unique session area.
    pub fn activity(
        &self,
        assignment_id: &AssignmentId,
    ) -> Result<Vec<AreaActivity>, StatsServiceError> {
        let loaded = self.load(assignment_id)?;
        let membership =
            resolve_membership(&loaded.areas, &loaded.places, &CancellationToken::new())
                .map_err(|interrupt| StatsServiceError::interrupted(interrupt, 0))?;
        let reporting = AssignmentReporting::new(&loaded.assignment, &loaded.place_visits);
        Ok(area_activity(
            &reporting,
            &membership,
            &loaded.areas,
            &loaded.places,
        ))
    }

    /// Marker states for every place of the assignment's organization.
    pub fn place_progress(
        &self,
        assignment_id: &AssignmentId,
    ) -> Result<Vec<PlaceProgress>, StatsServiceError> {
        let loaded = self.load(assignment_id)?;
        let reporting = AssignmentReporting::new(&loaded.assignment, &loaded.place_visits);
        Ok(loaded
            .places
            .iter()
            .map(|place| place_progress(&reporting, place))
            .collect())
    }

    /// Sessions decorated with area and assignee, ordered by (area, assignee).
    ///
    /// Sessions whose area or assignee cannot be found are left out.
    pub fn sessions(
        &self,
        assignment_id: &AssignmentId,
    ) -> Result<Vec<SessionView>, StatsServiceError> {
        let assignment = self.assignment(assignment_id)?;
        let mut views = Vec::new();

        for session in self.repository.sessions(assignment_id)? {
            let Some(area) = self.repository.area(&session.area_id)? else {
                debug!(area_id = %session.area_id, "skipping session without area");
                continue;
            };
            let Some(assignee) = self.people.person(assignment.org_id, session.person_id)? else {
                debug!(person_id = %session.person_id, "skipping session without assignee");
                continue;
            };
            views.push(SessionView {
                assignment_id: session.assignment_id,
                area,
                assignee,
            });
        }

        views.sort_by(|a, b| {
            a.area
                .id
                .cmp(&b.area.id)
                .then(a.assignee.id.cmp(&b.assignee.id))
        });
        Ok(views)
    }

    fn assignment(&self, assignment_id: &AssignmentId) -> Result<Assignment, StatsServiceError> {
        self.repository
            .assignment(assignment_id)?
            .ok_or_else(|| StatsServiceError::AssignmentNotFound(assignment_id.clone()))
    }

    fn load(&self, assignment_id: &AssignmentId) -> Result<LoadedAssignment, StatsServiceError> {
        let assignment = self.assignment(assignment_id)?;
        let sessions = self.repository.sessions(assignment_id)?;

        // Sorted set: arrival order of sessions must not affect the result.
        let area_ids: BTreeSet<AreaId> = sessions
            .into_iter()
            .map(|session| session.area_id)
            .collect();

        let mut areas = Vec::with_capacity(area_ids.len());
        let mut warnings = Vec::new();
        for area_id in area_ids {
            match self.repository.area(&area_id) {
                Ok(Some(area)) => areas.push(area),
                Ok(None) | Err(RepositoryError::NotFound) => {
                    warn!(area_id = %area_id, "session area not found; counted as empty");
                    warnings.push(StatsWarning::MissingArea { area_id });
                }
                Err(err) => return Err(err.into()),
            }
        }

        let places = self.repository.places(assignment.org_id)?;
        let place_visits = self.repository.place_visits(assignment_id)?;

        Ok(LoadedAssignment {
            assignment,
            areas,
            places,
            place_visits,
            warnings,
        })
    }

    pub(super) fn accumulate_areas(
        &self,
        reporting: &AssignmentReporting<'_>,
        membership: &AreaMembership,
        places: &[Place],
        token: &CancellationToken,
    ) -> Result<BTreeMap<AreaId, AreaStats>, StatsServiceError> {
        #[cfg(feature = "parallel")]
        if self.options.parallel {
            use rayon::prelude::*;
            use std::sync::atomic::{AtomicUsize, Ordering};

            debug!("accumulating areas on the rayon pool");
            let areas: Vec<(&AreaId, &[usize])> = membership.areas().collect();
            let completed = AtomicUsize::new(0);
            return areas
                .par_iter()
                .map(|(area_id, members)| {
                    token.check().map_err(|interrupt| {
                        StatsServiceError::interrupted(
                            interrupt,
                            completed.load(Ordering::Relaxed),
                        )
                    })?;
                    let stats = area_stats(reporting, area_id, members, places);
                    completed.fetch_add(1, Ordering::Relaxed);
                    Ok(((*area_id).clone(), stats))
                })
                .collect();
        }

        let mut per_area = BTreeMap::new();
        for (area_id, members) in membership.areas() {
            token
                .check()
                .map_err(|interrupt| StatsServiceError::interrupted(interrupt, per_area.len()))?;
            per_area.insert(
                area_id.clone(),
                area_stats(reporting, area_id, members, places),
            );
        }
        Ok(per_area)
    }
}

/// Error raised by the area stats service.
#[derive(Debug, thiserror::Error)]
pub enum StatsServiceError {
    #[error("assignment {0} not found")]
    AssignmentNotFound(AssignmentId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("computation cancelled after {completed_areas} areas")]
    Cancelled { completed_areas: usize },
    #[error("deadline exceeded after {completed_areas} areas")]
    DeadlineExceeded { completed_areas: usize },
}

impl StatsServiceError {
    fn interrupted(interrupt: Interrupt, completed_areas: usize) -> Self {
        match interrupt {
            Interrupt::Cancelled => Self::Cancelled { completed_areas },
            Interrupt::DeadlineExceeded => Self::DeadlineExceeded { completed_areas },
        }
    }
}
