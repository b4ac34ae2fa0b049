use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::cancel::CancellationToken;
use super::domain::AssignmentId;
use super::repository::{CanvassRepository, PersonDirectory};
use super::service::{AreaStatsService, StatsServiceError};
use super::stats::AssignmentAreaStats;

#[derive(Debug, Default)]
struct CacheEntry {
    generation: u64,
    snapshot: Option<(u64, Arc<AssignmentAreaStats>)>,
}

/// Stats snapshots keyed by assignment, invalidated by bumping a generation
/// counter whenever an underlying visit, session or place changes.
#[derive(Debug, Default)]
pub struct StatsCache {
    entries: Mutex<HashMap<AssignmentId, CacheEntry>>,
}

impl StatsCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<AssignmentId, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn generation(&self, assignment_id: &AssignmentId) -> u64 {
        self.lock()
            .get(assignment_id)
            .map(|entry| entry.generation)
            .unwrap_or(0)
    }

    /// Marks every snapshot of the assignment stale; returns the new generation.
    pub fn invalidate(&self, assignment_id: &AssignmentId) -> u64 {
        let mut entries = self.lock();
        let entry = entries.entry(assignment_id.clone()).or_default();
        entry.generation += 1;
        entry.generation
    }

    /// The cached snapshot, if it was stored at the current generation.
    pub fn get(&self, assignment_id: &AssignmentId) -> Option<Arc<AssignmentAreaStats>> {
        let entries = self.lock();
        let entry = entries.get(assignment_id)?;
        match &entry.snapshot {
            Some((generation, snapshot)) if *generation == entry.generation => {
                Some(Arc::clone(snapshot))
            }
            _ => None,
        }
    }

    /// Stores a snapshot computed against `generation`. Returns false, and
    /// keeps nothing, when the assignment was invalidated in the meantime.
    pub fn store(
        &self,
        assignment_id: &AssignmentId,
        generation: u64,
        snapshot: Arc<AssignmentAreaStats>,
    ) -> bool {
        let mut entries = self.lock();
        let entry = entries.entry(assignment_id.clone()).or_default();
        if entry.generation != generation {
            return false;
        }
        entry.snapshot = Some((generation, snapshot));
        true
    }

    pub fn get_or_compute<R, P>(
        &self,
        service: &AreaStatsService<R, P>,
        assignment_id: &AssignmentId,
        token: &CancellationToken,
    ) -> Result<Arc<AssignmentAreaStats>, StatsServiceError>
    where
        R: CanvassRepository + 'static,
        P: PersonDirectory + 'static,
    {
        if let Some(snapshot) = self.get(assignment_id) {
            debug!(assignment_id = %assignment_id, "stats cache hit");
            return Ok(snapshot);
        }

        let generation = self.generation(assignment_id);
        let snapshot = Arc::new(service.compute(assignment_id, token)?);
        if !self.store(assignment_id, generation, Arc::clone(&snapshot)) {
            debug!(assignment_id = %assignment_id, "stats invalidated during computation");
        }
        Ok(snapshot)
    }
}
