use std::ops::Deref;
use std::sync::Arc;
use std::time::SystemTime;

use log::{info, warn};

use crate::core::errors::AdminError;
use crate::filter::{CompiledFilter, FilterEngine, FilterRow, FilterSpec};

/// The last full fetch of one resource listing. Immutable; clones share rows.
#[derive(Debug)]
pub struct ResourceSnapshot<R> {
    rows: Arc<[R]>,
    fetched_at: SystemTime,
}

impl<R> Clone for ResourceSnapshot<R> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
            fetched_at: self.fetched_at,
        }
    }
}

impl<R> ResourceSnapshot<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            rows: rows.into(),
            fetched_at: SystemTime::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn fetched_at(&self) -> SystemTime {
        self.fetched_at
    }
}

impl<R> Deref for ResourceSnapshot<R> {
    type Target = [R];

    fn deref(&self) -> &[R] {
        &self.rows
    }
}

/// A snapshot plus the filter currently applied to it.
///
/// The snapshot is only ever replaced whole, and a failed fetch or a
/// rejected filter leaves both the snapshot and the visible rows unchanged.
pub struct ResourceView<R: FilterRow> {
    snapshot: ResourceSnapshot<R>,
    filter: CompiledFilter<R>,
    visible: Vec<usize>,
}

impl<R: FilterRow> Default for ResourceView<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: FilterRow> ResourceView<R> {
    pub fn new() -> Self {
        Self {
            snapshot: ResourceSnapshot::empty(),
            filter: CompiledFilter::pass_through(),
            visible: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> &ResourceSnapshot<R> {
        &self.snapshot
    }

    /// Installs a fresh snapshot and re-applies the active filter to it.
    pub fn replace_snapshot(&mut self, snapshot: ResourceSnapshot<R>) {
        self.visible = self.filter.matching_indices(&snapshot);
        self.snapshot = snapshot;
        info!(
            "Snapshot replaced: {} rows, {} visible",
            self.snapshot.len(),
            self.visible.len()
        );
    }

    /// Installs the result of a fetch. On error the previous snapshot stays.
    pub fn apply_fetch(
        &mut self,
        fetched: Result<ResourceSnapshot<R>, AdminError>,
    ) -> Result<usize, AdminError> {
        match fetched {
            Ok(snapshot) => {
                let total = snapshot.len();
                self.replace_snapshot(snapshot);
                Ok(total)
            }
            Err(e) => {
                warn!(
                    "Fetch failed, keeping previous snapshot of {} rows: {e}",
                    self.snapshot.len()
                );
                Err(e)
            }
        }
    }

    /// Compiles and applies `spec`. An invalid spec is reported and the
    /// current filter and visible rows are kept.
    pub fn set_filter(&mut self, spec: &FilterSpec<R>) -> Result<usize, AdminError> {
        let compiled = FilterEngine::compile(spec).map_err(|e| {
            warn!("Filter rejected: {e}");
            e
        })?;
        self.visible = compiled.matching_indices(&self.snapshot);
        self.filter = compiled;
        Ok(self.visible.len())
    }

    pub fn clear_filter(&mut self) {
        self.filter = CompiledFilter::pass_through();
        self.visible = (0..self.snapshot.len()).collect();
    }

    pub fn is_filtered(&self) -> bool {
        !self.filter.is_pass_through()
    }

    /// Visible rows, in snapshot order.
    pub fn rows(&self) -> impl Iterator<Item = &R> + '_ {
        self.visible.iter().map(move |&i| &self.snapshot[i])
    }

    /// `(shown, total)` for a "found X of Y" status line.
    pub fn counts(&self) -> (usize, usize) {
        (self.visible.len(), self.snapshot.len())
    }
}
