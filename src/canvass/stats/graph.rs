use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::Serialize;

use super::super::domain::{Area, AreaId, Place};
use super::super::membership::AreaMembership;
use super::super::visits::{place_visit_estimate, place_visit_successes, DONE_RESPONSE};
use super::accumulator::AssignmentReporting;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AreaRef {
    pub id: AreaId,
    pub title: Option<String>,
}

/// Visit activity in one UTC hour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPoint {
    pub date: String,
    pub hour: String,
    pub household_visits: u64,
    pub successful_visits: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AreaActivity {
    pub area: AreaRef,
    pub data: Vec<ActivityPoint>,
}

#[derive(Debug, Default)]
struct Bucket {
    household_visits: u64,
    successful_visits: u64,
}

fn bucket_key(timestamp: &DateTime<Utc>) -> (NaiveDate, u32) {
    (timestamp.date_naive(), timestamp.hour())
}

/// Hour-bucketed visit activity for every resolved area, in area id order.
pub fn area_activity(
    reporting: &AssignmentReporting<'_>,
    membership: &AreaMembership,
    areas: &[Area],
    places: &[Place],
) -> Vec<AreaActivity> {
    let assignment_id = reporting.assignment_id();
    let done_metric = reporting.done_metric();

    membership
        .areas()
        .map(|(area_id, members)| {
            let mut buckets: BTreeMap<(NaiveDate, u32), Bucket> = BTreeMap::new();

            for place in members.iter().filter_map(|index| places.get(*index)) {
                let household_visits = place
                    .households
                    .iter()
                    .flat_map(|household| household.visits.iter())
                    .filter(|visit| visit.belongs_to(assignment_id));

                for visit in household_visits {
                    let bucket = buckets.entry(bucket_key(&visit.timestamp)).or_default();
                    bucket.household_visits += 1;
                    let successful = done_metric.is_some_and(|metric| {
                        visit
                            .responses_to(&metric.id)
                            .any(|response| response == DONE_RESPONSE)
                    });
                    if successful {
                        bucket.successful_visits += 1;
                    }
                }

                for visit in reporting
                    .place_visits(&place.id)
                    .iter()
                    .filter(|visit| &visit.canvass_ass_id == assignment_id)
                {
                    let bucket = buckets.entry(bucket_key(&visit.timestamp)).or_default();
                    bucket.household_visits += u64::from(place_visit_estimate(visit));
                    bucket.successful_visits +=
                        u64::from(place_visit_successes(visit, done_metric));
                }
            }

            let title = areas
                .iter()
                .find(|area| &area.id == area_id)
                .and_then(|area| area.title.clone());

            AreaActivity {
                area: AreaRef {
                    id: area_id.clone(),
                    title,
                },
                data: buckets
                    .into_iter()
                    .map(|((date, hour), bucket)| ActivityPoint {
                        date: date.format("%Y-%m-%d").to_string(),
                        hour: format!("{hour:02}"),
                        household_visits: bucket.household_visits,
                        successful_visits: bucket.successful_visits,
                    })
                    .collect(),
            }
        })
        .collect()
}
