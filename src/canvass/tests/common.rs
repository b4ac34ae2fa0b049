use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::canvass::cancel::CancellationToken;
use crate::canvass::domain::{
    Area, AreaId, Assignment, AssignmentId, GeoPoint, Household, HouseholdId, Metric, MetricId,
    MetricKind, MetricResponse, MetricResponseCounts, OrgId, Person, PersonId, Place, PlaceId,
    PlaceVisit, ReportingLevel, Session, Visit, VisitId,
};
use crate::canvass::repository::{
    CanvassDataset, CanvassRepository, PersonDirectory, RepositoryError,
};
use crate::canvass::membership::{resolve_membership, AreaMembership};
use crate::canvass::service::AreaStatsService;

pub(super) const ASSIGNMENT: &str = "ass-1";
pub(super) const ORG: u64 = 1;

pub(super) fn assignment_id() -> AssignmentId {
    AssignmentId::new(ASSIGNMENT)
}

pub(super) fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 14, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn metrics(with_done: bool) -> Vec<Metric> {
    vec![
        Metric {
            id: MetricId::new("home"),
            question: "Did anyone open the door?".to_string(),
            description: String::new(),
            kind: MetricKind::Boolean,
            defines_done: with_done,
        },
        Metric {
            id: MetricId::new("mood"),
            question: "How was the conversation?".to_string(),
            description: String::new(),
            kind: MetricKind::Scale5,
            defines_done: false,
        },
    ]
}

pub(super) fn assignment(reporting_level: ReportingLevel, with_done: bool) -> Assignment {
    Assignment {
        id: assignment_id(),
        org_id: OrgId(ORG),
        campaign_id: 3,
        title: Some("Autumn doors".to_string()),
        start_date: None,
        end_date: None,
        reporting_level,
        metrics: metrics(with_done),
    }
}

pub(super) fn area(id: &str, points: &[(f64, f64)]) -> Area {
    Area {
        id: AreaId::new(id),
        org_id: OrgId(ORG),
        title: Some(format!("Area {id}")),
        description: None,
        points: points
            .iter()
            .map(|(lat, lng)| GeoPoint::new(*lat, *lng))
            .collect(),
    }
}

pub(super) fn triangle(id: &str) -> Area {
    area(id, &[(0.0, 0.0), (0.0, 10.0), (10.0, 0.0)])
}

pub(super) fn visit(id: &str, assignment: &str, home: Option<&str>) -> Visit {
    visit_at(id, assignment, home, at(10, 15))
}

pub(super) fn visit_at(
    id: &str,
    assignment: &str,
    home: Option<&str>,
    timestamp: DateTime<Utc>,
) -> Visit {
    let mut responses = Vec::new();
    if let Some(answer) = home {
        responses.push(MetricResponse {
            metric_id: MetricId::new("home"),
            response: answer.to_string(),
        });
    }
    Visit {
        id: VisitId::new(id),
        canvass_ass_id: Some(AssignmentId::new(assignment)),
        person_id: Some(PersonId(7)),
        timestamp,
        note_to_official: None,
        responses,
    }
}

pub(super) fn household(id: &str, visits: Vec<Visit>) -> Household {
    Household {
        id: HouseholdId::new(id),
        title: id.to_uppercase(),
        floor: None,
        visits,
    }
}

pub(super) fn place(id: &str, lat: f64, lng: f64, households: Vec<Household>) -> Place {
    Place {
        id: PlaceId::new(id),
        org_id: OrgId(ORG),
        title: Some(format!("Place {id}")),
        description: None,
        position: GeoPoint::new(lat, lng),
        households,
    }
}

pub(super) fn place_visit(id: &str, place_id: &str, home_counts: &[u32]) -> PlaceVisit {
    PlaceVisit {
        id: VisitId::new(id),
        canvass_ass_id: assignment_id(),
        place_id: PlaceId::new(place_id),
        person_id: Some(PersonId(7)),
        timestamp: at(11, 0),
        responses: vec![MetricResponseCounts {
            metric_id: MetricId::new("home"),
            response_counts: home_counts.to_vec(),
        }],
    }
}

pub(super) fn session(area_id: &str, person: u64) -> Session {
    Session {
        assignment_id: assignment_id(),
        area_id: AreaId::new(area_id),
        person_id: PersonId(person),
    }
}

pub(super) fn person(id: u64, first_name: &str) -> Person {
    Person {
        id: PersonId(id),
        first_name: first_name.to_string(),
        last_name: "Canvasser".to_string(),
    }
}

/// The triangle scenario: one place inside with a successful and an unvisited
/// household, one visited place far outside.
pub(super) fn triangle_dataset() -> CanvassDataset {
    CanvassDataset {
        assignments: vec![assignment(ReportingLevel::Household, true)],
        sessions: vec![session("tri", 7)],
        areas: vec![triangle("tri")],
        places: vec![
            place(
                "inside",
                1.0,
                1.0,
                vec![
                    household("h1", vec![visit("v1", ASSIGNMENT, Some("yes"))]),
                    household("h2", Vec::new()),
                ],
            ),
            place(
                "outside",
                100.0,
                100.0,
                vec![household("h3", vec![visit("v2", ASSIGNMENT, Some("no"))])],
            ),
        ],
        place_visits: Vec::new(),
        people: vec![person(7, "Alex"), person(8, "Sam")],
    }
}

pub(super) fn resolve(areas: &[Area], places: &[Place]) -> AreaMembership {
    resolve_membership(areas, places, &CancellationToken::new()).expect("fresh token never fires")
}

pub(super) fn service_for(
    dataset: CanvassDataset,
) -> AreaStatsService<CanvassDataset, CanvassDataset> {
    let dataset = Arc::new(dataset);
    AreaStatsService::new(dataset.clone(), dataset)
}

/// Delegates to a dataset but fails place lookups.
pub(super) struct UnavailablePlaces(pub(super) CanvassDataset);

impl CanvassRepository for UnavailablePlaces {
    fn assignment(&self, id: &AssignmentId) -> Result<Option<Assignment>, RepositoryError> {
        self.0.assignment(id)
    }

    fn sessions(&self, assignment_id: &AssignmentId) -> Result<Vec<Session>, RepositoryError> {
        self.0.sessions(assignment_id)
    }

    fn area(&self, id: &AreaId) -> Result<Option<Area>, RepositoryError> {
        self.0.area(id)
    }

    fn places(&self, _org_id: OrgId) -> Result<Vec<Place>, RepositoryError> {
        Err(RepositoryError::Unavailable("place store offline".to_string()))
    }

    fn place_visits(
        &self,
        assignment_id: &AssignmentId,
    ) -> Result<Vec<PlaceVisit>, RepositoryError> {
        self.0.place_visits(assignment_id)
    }
}

/// Counts area lookups so deduplication can be asserted.
#[derive(Default)]
pub(super) struct CountingAreas {
    pub(super) inner: CanvassDataset,
    pub(super) area_lookups: AtomicUsize,
}

impl CountingAreas {
    pub(super) fn lookups(&self) -> usize {
        self.area_lookups.load(Ordering::Relaxed)
    }
}

impl CanvassRepository for CountingAreas {
    fn assignment(&self, id: &AssignmentId) -> Result<Option<Assignment>, RepositoryError> {
        self.inner.assignment(id)
    }

    fn sessions(&self, assignment_id: &AssignmentId) -> Result<Vec<Session>, RepositoryError> {
        self.inner.sessions(assignment_id)
    }

    fn area(&self, id: &AreaId) -> Result<Option<Area>, RepositoryError> {
        self.area_lookups.fetch_add(1, Ordering::Relaxed);
        self.inner.area(id)
    }

    fn places(&self, org_id: OrgId) -> Result<Vec<Place>, RepositoryError> {
        self.inner.places(org_id)
    }

    fn place_visits(
        &self,
        assignment_id: &AssignmentId,
    ) -> Result<Vec<PlaceVisit>, RepositoryError> {
        self.inner.place_visits(assignment_id)
    }
}

impl PersonDirectory for CountingAreas {
    fn person(&self, org_id: OrgId, id: PersonId) -> Result<Option<Person>, RepositoryError> {
        self.inner.person(org_id, id)
    }
}
