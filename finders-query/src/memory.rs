use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use finders_core::CoreResult;
use finders_protocol::alert::SortDirection;
use parking_lot::RwLock;

use crate::relation::{Order, QueryPlan, Record, RecordSource};

/// In-memory record source. Rows keep insertion order unless a plan orders them.
pub struct MemorySource<E> {
    rows: Arc<RwLock<Vec<E>>>,
}

impl<E> Clone for MemorySource<E> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
        }
    }
}

impl<E: Record> Default for MemorySource<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Record> MemorySource<E> {
    /// Creates a new empty source.
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn with_rows(rows: impl IntoIterator<Item = E>) -> Self {
        Self {
            rows: Arc::new(RwLock::new(rows.into_iter().collect())),
        }
    }

    pub fn insert(&self, row: E) {
        self.rows.write().push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// Shares this source behind the trait object relations hold.
    pub fn into_source(self) -> Arc<dyn RecordSource<E>> {
        Arc::new(self)
    }

    fn evaluate(&self, plan: &QueryPlan) -> Vec<E> {
        if plan.is_none() {
            return Vec::new();
        }

        let rows = self.rows.read();
        let mut matched: Vec<E> = rows
            .iter()
            .filter(|row| plan.filters().iter().all(|filter| filter.matches(*row)))
            .cloned()
            .collect();
        drop(rows);

        if !plan.order().is_empty() {
            matched.sort_by(|left, right| compare(left, right, plan.order()));
        }

        let offset = plan.offset().unwrap_or(0);
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = plan
            .limit()
            .map(|limit| usize::try_from(limit).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        matched.into_iter().skip(offset).take(limit).collect()
    }

    /// Counts the plan's window without cloning or ordering rows; the scan
    /// stops once the window is full.
    fn count_window(&self, plan: &QueryPlan) -> u64 {
        if plan.is_none() {
            return 0;
        }

        let offset = usize::try_from(plan.offset().unwrap_or(0)).unwrap_or(usize::MAX);
        let limit = plan
            .limit()
            .map(|limit| usize::try_from(limit).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        let rows = self.rows.read();
        let matched = rows
            .iter()
            .filter(|row| plan.filters().iter().all(|filter| filter.matches(*row)))
            .take(offset.saturating_add(limit))
            .count();

        matched.saturating_sub(offset).min(limit) as u64
    }
}

fn compare<E: Record>(left: &E, right: &E, order: &[Order]) -> Ordering {
    order
        .iter()
        .map(|term| {
            let ordering = left.field(term.field).cmp(&right.field(term.field));
            match term.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

#[async_trait]
impl<E: Record> RecordSource<E> for MemorySource<E> {
    async fn fetch(&self, plan: &QueryPlan) -> CoreResult<Vec<E>> {
        Ok(self.evaluate(plan))
    }

    async fn count(&self, plan: &QueryPlan) -> CoreResult<u64> {
        Ok(self.count_window(plan))
    }
}
