use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::domain::{
    Area, AreaId, Assignment, AssignmentId, OrgId, Person, PersonId, Place, PlaceVisit, Session,
};

/// Read-only access to the stored canvassing records.
///
/// Every method is an independent, idempotent read; callers may issue them
/// concurrently and in any order.
pub trait CanvassRepository: Send + Sync {
    fn assignment(&self, id: &AssignmentId) -> Result<Option<Assignment>, RepositoryError>;
    fn sessions(&self, assignment_id: &AssignmentId) -> Result<Vec<Session>, RepositoryError>;
    fn area(&self, id: &AreaId) -> Result<Option<Area>, RepositoryError>;
    /// All places of an organization, households and visits included.
    fn places(&self, org_id: OrgId) -> Result<Vec<Place>, RepositoryError>;
    fn place_visits(&self, assignment_id: &AssignmentId)
        -> Result<Vec<PlaceVisit>, RepositoryError>;
}

/// Person lookups used to decorate sessions with assignee details.
pub trait PersonDirectory: Send + Sync {
    fn person(&self, org_id: OrgId, id: PersonId) -> Result<Option<Person>, RepositoryError>;
}

/// Error enumeration for data-access failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Failure to load a dataset file.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid dataset JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A self-contained snapshot of canvassing records, as exported by the
/// surrounding platform. Serves both repository traits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanvassDataset {
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub areas: Vec<Area>,
    #[serde(default)]
    pub places: Vec<Place>,
    #[serde(default)]
    pub place_visits: Vec<PlaceVisit>,
    /// People are keyed by id alone; organization scoping is left to the export.
    #[serde(default)]
    pub people: Vec<Person>,
}

impl CanvassDataset {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        Ok(serde_json::from_reader(reader)?)
    }
}

impl CanvassRepository for CanvassDataset {
    fn assignment(&self, id: &AssignmentId) -> Result<Option<Assignment>, RepositoryError> {
        Ok(self
            .assignments
            .iter()
            .find(|assignment| &assignment.id == id)
            .cloned())
    }

    fn sessions(&self, assignment_id: &AssignmentId) -> Result<Vec<Session>, RepositoryError> {
        Ok(self
            .sessions
            .iter()
            .filter(|session| &session.assignment_id == assignment_id)
            .cloned()
            .collect())
    }

    fn area(&self, id: &AreaId) -> Result<Option<Area>, RepositoryError> {
        Ok(self.areas.iter().find(|area| &area.id == id).cloned())
    }

    fn places(&self, org_id: OrgId) -> Result<Vec<Place>, RepositoryError> {
        Ok(self
            .places
            .iter()
            .filter(|place| place.org_id == org_id)
            .cloned()
            .collect())
    }

    fn place_visits(
        &self,
        assignment_id: &AssignmentId,
    ) -> Result<Vec<PlaceVisit>, RepositoryError> {
        Ok(self
            .place_visits
            .iter()
            .filter(|visit| &visit.canvass_ass_id == assignment_id)
            .cloned()
            .collect())
    }
}

impl PersonDirectory for CanvassDataset {
    fn person(&self, _org_id: OrgId, id: PersonId) -> Result<Option<Person>, RepositoryError> {
        Ok(self.people.iter().find(|person| person.id == id).cloned())
    }
}
