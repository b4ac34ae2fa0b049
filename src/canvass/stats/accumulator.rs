use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::super::domain::{
    AreaId, Assignment, AssignmentId, Metric, Place, PlaceId, PlaceVisit, ReportingLevel,
};
use super::super::membership::AreaMembership;
use super::super::visits::{fold_household, fold_place_visits, ProgressState};

/// What a single place contributes to the counters of any area containing it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaceTally {
    pub households: u64,
    pub visited: bool,
    pub visited_households: u64,
    pub successful_households: u64,
    pub visits: u64,
}

/// Shared interface of the reporting-level variants.
pub trait StatsContribution {
    fn contribute(&self, place: &Place) -> PlaceTally;
}

/// Household-level reporting: every visit names its household.
#[derive(Debug, Clone)]
pub struct HouseholdReporting<'a> {
    assignment_id: &'a AssignmentId,
    done_metric: Option<&'a Metric>,
}

impl StatsContribution for HouseholdReporting<'_> {
    fn contribute(&self, place: &Place) -> PlaceTally {
        let mut tally = PlaceTally {
            households: place.households.len() as u64,
            ..PlaceTally::default()
        };

        for household in &place.households {
            let outcome = fold_household(
                household,
                self.assignment_id,
                self.done_metric.map(|metric| &metric.id),
            );
            if outcome.visited {
                tally.visited = true;
                tally.visited_households += 1;
            }
            if outcome.successful {
                tally.successful_households += 1;
            }
            tally.visits += outcome.visits as u64;
        }

        tally
    }
}

/// Place-level reporting: visits carry response counts for the whole place.
#[derive(Debug, Clone)]
pub struct PlaceReporting<'a> {
    household: HouseholdReporting<'a>,
    visits_by_place: HashMap<&'a PlaceId, Vec<&'a PlaceVisit>>,
}

impl StatsContribution for PlaceReporting<'_> {
    fn contribute(&self, place: &Place) -> PlaceTally {
        let individual = self.household.contribute(place);
        let estimate = fold_place_visits(
            self.visits_by_place
                .get(&place.id)
                .into_iter()
                .flatten()
                .copied(),
            self.household.assignment_id,
            self.household.done_metric,
        );

        // Individually recorded households and place-level estimates describe
        // the same doors, so the larger of the two wins.
        PlaceTally {
            households: individual.households,
            visited: individual.visited || estimate.visits > 0,
            visited_households: individual
                .visited_households
                .max(u64::from(estimate.visited_households)),
            successful_households: individual
                .successful_households
                .max(u64::from(estimate.successful_households)),
            visits: individual.visits + estimate.visits as u64,
        }
    }
}

/// An assignment specialised by its reporting level.
#[derive(Debug, Clone)]
pub enum AssignmentReporting<'a> {
    Household(HouseholdReporting<'a>),
    Place(PlaceReporting<'a>),
}

impl<'a> AssignmentReporting<'a> {
    /// Place visits of other assignments are ignored by the fold.
    pub fn new(assignment: &'a Assignment, place_visits: &'a [PlaceVisit]) -> Self {
        let household = HouseholdReporting {
            assignment_id: &assignment.id,
            done_metric: assignment.done_metric(),
        };

        match assignment.reporting_level {
            ReportingLevel::Household => Self::Household(household),
            ReportingLevel::Place => {
                let mut visits_by_place: HashMap<&PlaceId, Vec<&PlaceVisit>> = HashMap::new();
                for visit in place_visits {
                    visits_by_place
                        .entry(&visit.place_id)
                        .or_default()
                        .push(visit);
                }
                Self::Place(PlaceReporting {
                    household,
                    visits_by_place,
                })
            }
        }
    }

    pub fn assignment_id(&self) -> &'a AssignmentId {
        match self {
            Self::Household(reporting) => reporting.assignment_id,
            Self::Place(reporting) => reporting.household.assignment_id,
        }
    }

    pub fn done_metric(&self) -> Option<&'a Metric> {
        match self {
            Self::Household(reporting) => reporting.done_metric,
            Self::Place(reporting) => reporting.household.done_metric,
        }
    }

    /// Place-level visits recorded for a place; always empty for household reporting.
    pub fn place_visits(&self, place_id: &PlaceId) -> &[&'a PlaceVisit] {
        match self {
            Self::Household(_) => &[],
            Self::Place(reporting) => reporting
                .visits_by_place
                .get(place_id)
                .map(Vec::as_slice)
                .unwrap_or_default(),
        }
    }
}

impl StatsContribution for AssignmentReporting<'_> {
    fn contribute(&self, place: &Place) -> PlaceTally {
        match self {
            Self::Household(reporting) => reporting.contribute(place),
            Self::Place(reporting) => reporting.contribute(place),
        }
    }
}

/// Per-area counters, serialized as one row of the area stats response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AreaStats {
    #[serde(rename = "areaId")]
    pub area_id: AreaId,
    pub num_households: u64,
    pub num_places: u64,
    pub num_successful_visited_households: u64,
    pub num_visited_households: u64,
    pub num_visited_places: u64,
    pub num_visits: u64,
}

impl AreaStats {
    pub fn new(area_id: AreaId) -> Self {
        Self {
            area_id,
            num_households: 0,
            num_places: 0,
            num_successful_visited_households: 0,
            num_visited_households: 0,
            num_visited_places: 0,
            num_visits: 0,
        }
    }

    /// A place is counted once no matter how many of its households were visited.
    pub fn add(&mut self, tally: &PlaceTally) {
        self.num_places += 1;
        self.num_households += tally.households;
        if tally.visited {
            self.num_visited_places += 1;
        }
        self.num_visited_households += tally.visited_households;
        self.num_successful_visited_households += tally.successful_households;
        self.num_visits += tally.visits;
    }
}

/// Folds the member places of one area.
pub fn area_stats<C>(
    reporting: &C,
    area_id: &AreaId,
    members: &[usize],
    places: &[Place],
) -> AreaStats
where
    C: StatsContribution + ?Sized,
{
    let mut stats = AreaStats::new(area_id.clone());
    for place in members.iter().filter_map(|index| places.get(*index)) {
        stats.add(&reporting.contribute(place));
    }
    stats
}

/// Folds every resolved area. `places` must be the slice the membership
/// index was built from.
pub fn accumulate<C>(
    reporting: &C,
    membership: &AreaMembership,
    places: &[Place],
) -> BTreeMap<AreaId, AreaStats>
where
    C: StatsContribution + ?Sized,
{
    membership
        .areas()
        .map(|(area_id, members)| {
            (
                area_id.clone(),
                area_stats(reporting, area_id, members, places),
            )
        })
        .collect()
}

/// Visited places that fall inside none of the assignment's areas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutsideAreaStats {
    pub num_visited_places: u64,
    pub num_visited_households: u64,
    pub num_successful_visited_households: u64,
    pub num_visits: u64,
}

/// Assignment-wide totals. Places inside overlapping areas count once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssignmentTotals {
    pub num_areas: u64,
    pub num_visited_areas: u64,
    pub num_places: u64,
    pub num_households: u64,
    pub num_visited_places: u64,
    pub num_visited_households: u64,
    pub num_successful_visited_households: u64,
    pub num_visits: u64,
}

pub fn totals<C>(
    reporting: &C,
    membership: &AreaMembership,
    places: &[Place],
    per_area: &BTreeMap<AreaId, AreaStats>,
) -> (AssignmentTotals, OutsideAreaStats)
where
    C: StatsContribution + ?Sized,
{
    let mut totals = AssignmentTotals {
        num_areas: per_area.values().filter(|stats| stats.num_places > 0).count() as u64,
        num_visited_areas: per_area
            .values()
            .filter(|stats| stats.num_visited_places > 0)
            .count() as u64,
        ..AssignmentTotals::default()
    };

    for place in membership.matched().filter_map(|index| places.get(index)) {
        let tally = reporting.contribute(place);
        totals.num_places += 1;
        totals.num_households += tally.households;
        if tally.visited {
            totals.num_visited_places += 1;
        }
        totals.num_visited_households += tally.visited_households;
        totals.num_successful_visited_households += tally.successful_households;
        totals.num_visits += tally.visits;
    }

    let mut outside = OutsideAreaStats::default();
    for place in membership.unmatched().filter_map(|index| places.get(index)) {
        let tally = reporting.contribute(place);
        if !tally.visited {
            continue;
        }
        outside.num_visited_places += 1;
        outside.num_visited_households += tally.visited_households;
        outside.num_successful_visited_households += tally.successful_households;
        outside.num_visits += tally.visits;
    }

    (totals, outside)
}

/// Marker state of one place for the "visited" and "done" map views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceProgress {
    pub place_id: PlaceId,
    pub visited: ProgressState,
    pub done: ProgressState,
}

pub fn place_progress<C>(reporting: &C, place: &Place) -> PlaceProgress
where
    C: StatsContribution + ?Sized,
{
    let tally = reporting.contribute(place);
    // Place-level estimates may exceed the registered households.
    let total = tally.households.max(tally.visited_households) as usize;

    PlaceProgress {
        place_id: place.id.clone(),
        visited: ProgressState::from_counts(tally.visited_households as usize, total),
        done: ProgressState::from_counts(tally.successful_households as usize, total),
    }
}
