use serde::Serialize;

use super::super::domain::{Assignment, Metric, Place, PlaceVisit};

/// Response histogram for one configured metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDistribution {
    pub metric: Metric,
    /// `[yes, no]` for boolean metrics, `[1, 2, 3, 4, 5]` for scale metrics.
    pub values: Vec<u64>,
}

/// Counts every response given under `assignment`, inside or outside its areas.
pub fn metric_distribution(
    assignment: &Assignment,
    places: &[Place],
    place_visits: &[PlaceVisit],
) -> Vec<MetricDistribution> {
    let mut distributions: Vec<MetricDistribution> = assignment
        .metrics
        .iter()
        .map(|metric| MetricDistribution {
            metric: metric.clone(),
            values: vec![0; metric.kind.buckets().len()],
        })
        .collect();

    let household_visits = places
        .iter()
        .flat_map(|place| place.households.iter())
        .flat_map(|household| household.visits.iter())
        .filter(|visit| visit.belongs_to(&assignment.id));

    for visit in household_visits {
        for response in &visit.responses {
            let Some(entry) = distributions
                .iter_mut()
                .find(|entry| entry.metric.id == response.metric_id)
            else {
                continue;
            };
            if let Some(bucket) = entry.metric.kind.bucket_of(&response.response) {
                entry.values[bucket] += 1;
            }
        }
    }

    for visit in place_visits
        .iter()
        .filter(|visit| visit.canvass_ass_id == assignment.id)
    {
        for counts in &visit.responses {
            let Some(entry) = distributions
                .iter_mut()
                .find(|entry| entry.metric.id == counts.metric_id)
            else {
                continue;
            };
            for (slot, count) in entry.values.iter_mut().zip(&counts.response_counts) {
                *slot += u64::from(*count);
            }
        }
    }

    distributions
}
