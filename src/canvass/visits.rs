use serde::Serialize;

use super::domain::{AssignmentId, Household, Metric, MetricId, PlaceVisit};

/// Literal response value that marks a done-metric answer as affirmative.
pub const DONE_RESPONSE: &str = "yes";

/// What one household contributes to an assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HouseholdOutcome {
    pub visited: bool,
    pub successful: bool,
    /// Matching visit records, re-visits included.
    pub visits: usize,
}

/// Folds a household's visits for one assignment.
///
/// `successful` is existential over all matching visits: any "yes" to the
/// done metric counts, regardless of visit order.
pub fn fold_household(
    household: &Household,
    assignment_id: &AssignmentId,
    done_metric: Option<&MetricId>,
) -> HouseholdOutcome {
    let mut outcome = HouseholdOutcome::default();

    for visit in household
        .visits
        .iter()
        .filter(|visit| visit.belongs_to(assignment_id))
    {
        outcome.visited = true;
        outcome.visits += 1;

        if let Some(metric_id) = done_metric {
            if visit
                .responses_to(metric_id)
                .any(|response| response == DONE_RESPONSE)
            {
                outcome.successful = true;
            }
        }
    }

    outcome
}

/// Households reached by a single place visit: the largest response count
/// across its metrics.
pub fn place_visit_estimate(visit: &PlaceVisit) -> u32 {
    visit
        .responses
        .iter()
        .flat_map(|entry| entry.response_counts.iter().copied())
        .max()
        .unwrap_or(0)
}

/// Affirmative done-metric answers recorded by a single place visit.
///
/// Reads the count of the metric's "yes" bucket; metric kinds without one
/// record no successes.
pub fn place_visit_successes(visit: &PlaceVisit, done_metric: Option<&Metric>) -> u32 {
    let Some(metric) = done_metric else {
        return 0;
    };
    let Some(bucket) = metric.kind.bucket_of(DONE_RESPONSE) else {
        return 0;
    };

    visit
        .responses
        .iter()
        .filter(|entry| entry.metric_id == metric.id)
        .filter_map(|entry| entry.response_counts.get(bucket).copied())
        .max()
        .unwrap_or(0)
}

/// Place-level fold across every place visit recorded for one place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaceVisitEstimate {
    pub visits: usize,
    pub visited_households: u32,
    pub successful_households: u32,
}

/// Takes the largest single-visit estimate rather than a sum, since repeated
/// place visits typically cover the same doors.
pub fn fold_place_visits<'a, I>(
    visits: I,
    assignment_id: &AssignmentId,
    done_metric: Option<&Metric>,
) -> PlaceVisitEstimate
where
    I: IntoIterator<Item = &'a PlaceVisit>,
{
    visits
        .into_iter()
        .filter(|visit| &visit.canvass_ass_id == assignment_id)
        .fold(PlaceVisitEstimate::default(), |mut acc, visit| {
            acc.visits += 1;
            acc.visited_households = acc.visited_households.max(place_visit_estimate(visit));
            acc.successful_households = acc
                .successful_households
                .max(place_visit_successes(visit, done_metric));
            acc
        })
}

/// Marker colouring state for a place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressState {
    None,
    Some,
    All,
}

impl ProgressState {
    pub fn from_counts(reached: usize, total: usize) -> Self {
        if reached == 0 || total == 0 {
            Self::None
        } else if reached >= total {
            Self::All
        } else {
            Self::Some
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Some => "Some",
            Self::All => "All",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvass::domain::{
        HouseholdId, MetricKind, MetricResponse, MetricResponseCounts, PlaceId, Visit, VisitId,
    };
    use chrono::{TimeZone, Utc};

    fn visit(id: &str, assignment: &str, done: Option<&str>) -> Visit {
        Visit {
            id: VisitId::new(id),
            canvass_ass_id: Some(AssignmentId::new(assignment)),
            person_id: None,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 4, 10, 30, 0).unwrap(),
            note_to_official: None,
            responses: done
                .map(|answer| {
                    vec![MetricResponse {
                        metric_id: MetricId::new("done"),
                        response: answer.to_string(),
                    }]
                })
                .unwrap_or_default(),
        }
    }

    fn household(visits: Vec<Visit>) -> Household {
        Household {
            id: HouseholdId::new("h1"),
            title: "1A".to_string(),
            floor: Some(1),
            visits,
        }
    }

    fn place_visit(assignment: &str, counts: &[&[u32]]) -> PlaceVisit {
        PlaceVisit {
            id: VisitId::new("pv"),
            canvass_ass_id: AssignmentId::new(assignment),
            place_id: PlaceId::new("p1"),
            person_id: None,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 4, 10, 0, 0).unwrap(),
            responses: counts
                .iter()
                .enumerate()
                .map(|(index, counts)| MetricResponseCounts {
                    metric_id: MetricId::new(if index == 0 { "done" } else { "other" }),
                    response_counts: counts.to_vec(),
                })
                .collect(),
        }
    }

    fn done_metric(kind: MetricKind) -> Metric {
        Metric {
            id: MetricId::new("done"),
            question: "Done?".to_string(),
            description: String::new(),
            kind,
            defines_done: true,
        }
    }

    #[test]
    fn visits_from_other_assignments_are_ignored() {
        let household = household(vec![visit("v1", "other", Some("yes"))]);
        let outcome = fold_household(
            &household,
            &AssignmentId::new("ass"),
            Some(&MetricId::new("done")),
        );
        assert_eq!(outcome, HouseholdOutcome::default());
    }

    #[test]
    fn any_yes_across_revisits_counts_as_success() {
        let household = household(vec![
            visit("v1", "ass", Some("yes")),
            visit("v2", "ass", Some("no")),
        ]);
        let outcome = fold_household(
            &household,
            &AssignmentId::new("ass"),
            Some(&MetricId::new("done")),
        );
        assert!(outcome.visited);
        assert!(outcome.successful);
        assert_eq!(outcome.visits, 2);
    }

    #[test]
    fn missing_done_metric_never_succeeds() {
        let household = household(vec![visit("v1", "ass", Some("yes"))]);
        let outcome = fold_household(&household, &AssignmentId::new("ass"), None);
        assert!(outcome.visited);
        assert!(!outcome.successful);
    }

    #[test]
    fn place_visit_estimate_uses_max_count() {
        let visit = place_visit("ass", &[&[5, 0], &[5, 2]]);
        assert_eq!(place_visit_estimate(&visit), 5);
        assert_eq!(
            place_visit_successes(&visit, Some(&done_metric(MetricKind::Boolean))),
            5
        );
    }

    #[test]
    fn scale_done_metric_has_no_yes_bucket() {
        let visit = place_visit("ass", &[&[4, 0, 0, 0, 0]]);
        assert_eq!(
            place_visit_successes(&visit, Some(&done_metric(MetricKind::Scale5))),
            0
        );
        assert_eq!(place_visit_successes(&visit, None), 0);
    }

    #[test]
    fn repeated_place_visits_are_not_summed() {
        let visits = vec![
            place_visit("ass", &[&[3, 1]]),
            place_visit("ass", &[&[2, 4]]),
            place_visit("elsewhere", &[&[9, 9]]),
        ];
        let done = done_metric(MetricKind::Boolean);
        let estimate = fold_place_visits(&visits, &AssignmentId::new("ass"), Some(&done));
        assert_eq!(estimate.visits, 2);
        assert_eq!(estimate.visited_households, 4);
        assert_eq!(estimate.successful_households, 3);
    }

    #[test]
    fn progress_state_thresholds() {
        assert_eq!(ProgressState::from_counts(0, 4), ProgressState::None);
        assert_eq!(ProgressState::from_counts(2, 4), ProgressState::Some);
        assert_eq!(ProgressState::from_counts(4, 4), ProgressState::All);
        assert_eq!(ProgressState::from_counts(3, 0), ProgressState::None);
    }
}
