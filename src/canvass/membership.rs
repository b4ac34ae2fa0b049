use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use super::cancel::{CancellationToken, Interrupt};
use super::domain::{Area, AreaId, Place};
use super::geometry::{point_in_polygon, Bounds};
use super::warning::StatsWarning;

/// Area polygon with its bounding box precomputed.
///
/// The bounding box rejects most places before the ray cast; a spatial index
/// over these boxes can replace the linear scan without changing results.
#[derive(Debug, Clone)]
struct AreaShape<'a> {
    area: &'a Area,
    bounds: Option<Bounds>,
}

impl<'a> AreaShape<'a> {
    fn new(area: &'a Area) -> Self {
        Self {
            area,
            bounds: Bounds::from_points(&area.points),
        }
    }

    fn contains(&self, place: &Place) -> bool {
        if place.org_id != self.area.org_id {
            return false;
        }
        match &self.bounds {
            Some(bounds) if bounds.contains(&place.position) => {
                point_in_polygon(&place.position, &self.area.points)
            }
            _ => false,
        }
    }
}

/// Area → member place index. Places are referenced by their position in the
/// slice handed to [`resolve_membership`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AreaMembership {
    members: BTreeMap<AreaId, Vec<usize>>,
    matched: BTreeSet<usize>,
    place_count: usize,
    warnings: Vec<StatsWarning>,
}

impl AreaMembership {
    pub fn members(&self, area_id: &AreaId) -> &[usize] {
        self.members
            .get(area_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every resolved area in identifier order, including those with no places.
    pub fn areas(&self) -> impl Iterator<Item = (&AreaId, &[usize])> {
        self.members
            .iter()
            .map(|(area_id, places)| (area_id, places.as_slice()))
    }

    /// Indices of places inside at least one area, ascending.
    pub fn matched(&self) -> impl Iterator<Item = usize> + '_ {
        self.matched.iter().copied()
    }

    /// Indices of places inside no area, ascending.
    pub fn unmatched(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.place_count).filter(move |index| !self.matched.contains(index))
    }

    pub fn warnings(&self) -> &[StatsWarning] {
        &self.warnings
    }
}

/// Tests every (area, place) pair of the same organization.
///
/// Areas are expected to be unique by identifier; a duplicate identifier
/// replaces the earlier entry instead of adding to it. Overlapping areas each
/// receive the places they contain.
///
/// The token is checked before each area, so an interrupt stops the scan
/// without testing the remaining areas.
pub fn resolve_membership(
    areas: &[Area],
    places: &[Place],
    token: &CancellationToken,
) -> Result<AreaMembership, Interrupt> {
    let mut membership = AreaMembership {
        place_count: places.len(),
        ..AreaMembership::default()
    };

    for area in areas {
        token.check()?;

        if area.points.len() < 3 {
            warn!(
                area_id = %area.id,
                vertices = area.points.len(),
                "area polygon is degenerate; no places will match"
            );
            membership.warnings.push(StatsWarning::InvalidGeometry {
                area_id: area.id.clone(),
                vertices: area.points.len(),
            });
        }

        let shape = AreaShape::new(area);
        let inside: Vec<usize> = places
            .iter()
            .enumerate()
            .filter(|(_, place)| shape.contains(place))
            .map(|(index, _)| index)
            .collect();

        membership.matched.extend(inside.iter().copied());
        membership.members.insert(area.id.clone(), inside);
    }

    Ok(membership)
}
