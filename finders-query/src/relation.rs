use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use finders_core::CoreResult;
use finders_protocol::alert::SortDirection;
use finders_protocol::page::Page;

use crate::fuzzy;

/// Comparable column value used by filters and orderings.
///
/// `Null` sorts after every other value, matching Postgres' default
/// `NULLS LAST` for ascending and `NULLS FIRST` for descending order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldValue {
    Int(i64),
    Text(String),
    Time(DateTime<Utc>),
    Null,
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i16> for FieldValue {
    fn from(value: i16) -> Self {
        FieldValue::Int(i64::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Time(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Row type a [`Relation`] can be built over.
pub trait Record: Clone + Send + Sync + 'static {
    /// Backing table name.
    const TABLE: &'static str;
    /// Columns selected when loading a row, in row order.
    const COLUMNS: &'static [&'static str];
    const PRIMARY_KEY: &'static str = "id";

    /// Value of the named column; unknown names yield [`FieldValue::Null`].
    fn field(&self, name: &str) -> FieldValue;
}

/// Single predicate of a query plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Eq {
        field: &'static str,
        value: FieldValue,
    },
    In {
        field: &'static str,
        values: Vec<FieldValue>,
    },
    Any(Vec<Filter>),
    All(Vec<Filter>),
    /// Fuzzy, case-insensitive match of `query` against `columns`.
    Search {
        columns: &'static [&'static str],
        query: String,
    },
}

impl Filter {
    pub fn eq(field: &'static str, value: impl Into<FieldValue>) -> Self {
        Filter::Eq {
            field,
            value: value.into(),
        }
    }

    pub fn is_in<V: Into<FieldValue>>(
        field: &'static str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Filter::In {
            field,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Evaluates the predicate against an in-memory record.
    pub fn matches<E: Record>(&self, record: &E) -> bool {
        match self {
            Filter::Eq { field, value } => record.field(field) == *value,
            Filter::In { field, values } => {
                let actual = record.field(field);
                values.iter().any(|value| *value == actual)
            }
            Filter::Any(filters) => filters.iter().any(|filter| filter.matches(record)),
            Filter::All(filters) => filters.iter().all(|filter| filter.matches(record)),
            Filter::Search { columns, query } => columns.iter().any(|column| {
                record
                    .field(column)
                    .as_text()
                    .map(|text| fuzzy::matches(text, query))
                    .unwrap_or(false)
            }),
        }
    }
}

/// Ordering term of a query plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub field: &'static str,
    pub direction: SortDirection,
}

/// Declarative description of a query. Sources turn it into rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPlan {
    none: bool,
    filters: Vec<Filter>,
    order: Vec<Order>,
    offset: Option<u64>,
    limit: Option<u64>,
}

impl QueryPlan {
    /// Whether the plan is known to match nothing.
    pub fn is_none(&self) -> bool {
        self.none
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn order(&self) -> &[Order] {
        &self.order
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Whether the plan restricts the number or position of returned rows.
    pub fn is_windowed(&self) -> bool {
        self.offset.is_some() || self.limit.is_some()
    }
}

/// Executes query plans against a concrete data store.
///
/// Failures are returned unchanged; sources never retry.
#[async_trait]
pub trait RecordSource<E: Record>: Send + Sync {
    async fn fetch(&self, plan: &QueryPlan) -> CoreResult<Vec<E>>;

    /// Number of rows the plan selects, honouring its offset and limit.
    async fn count(&self, plan: &QueryPlan) -> CoreResult<u64>;
}

struct EmptySource<E>(PhantomData<fn() -> E>);

#[async_trait]
impl<E: Record> RecordSource<E> for EmptySource<E> {
    async fn fetch(&self, _plan: &QueryPlan) -> CoreResult<Vec<E>> {
        Ok(Vec::new())
    }

    async fn count(&self, _plan: &QueryPlan) -> CoreResult<u64> {
        Ok(0)
    }
}

/// Lazy query handle.
///
/// Chaining only extends the [`QueryPlan`]; the source is reached by the
/// terminal operations [`Relation::load`], [`Relation::count`] and
/// [`Relation::first`].
pub struct Relation<E: Record> {
    source: Arc<dyn RecordSource<E>>,
    plan: QueryPlan,
}

impl<E: Record> Clone for Relation<E> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            plan: self.plan.clone(),
        }
    }
}

impl<E: Record> fmt::Debug for Relation<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("table", &E::TABLE)
            .field("plan", &self.plan)
            .finish()
    }
}

impl<E: Record> Relation<E> {
    pub fn new(source: Arc<dyn RecordSource<E>>) -> Self {
        Self {
            source,
            plan: QueryPlan::default(),
        }
    }

    /// Relation that yields nothing and never reaches a data store.
    pub fn none() -> Self {
        Self {
            source: Arc::new(EmptySource(PhantomData)),
            plan: QueryPlan {
                none: true,
                ..QueryPlan::default()
            },
        }
    }

    pub fn plan(&self) -> &QueryPlan {
        &self.plan
    }

    pub fn is_none(&self) -> bool {
        self.plan.none
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.plan.filters.push(filter);
        self
    }

    pub fn where_eq(self, field: &'static str, value: impl Into<FieldValue>) -> Self {
        self.filter(Filter::eq(field, value))
    }

    pub fn where_in<V: Into<FieldValue>>(
        self,
        field: &'static str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.filter(Filter::is_in(field, values))
    }

    /// Fuzzy full-text match; a blank query leaves the relation untouched.
    pub fn search(self, columns: &'static [&'static str], query: &str) -> Self {
        let query = query.trim();
        if query.is_empty() {
            return self;
        }
        self.filter(Filter::Search {
            columns,
            query: query.to_string(),
        })
    }

    /// Appends an ordering term.
    pub fn order_by(mut self, field: &'static str, direction: SortDirection) -> Self {
        self.plan.order.push(Order { field, direction });
        self
    }

    /// Replaces any existing ordering.
    pub fn reorder(mut self, field: &'static str, direction: SortDirection) -> Self {
        self.plan.order.clear();
        self.order_by(field, direction)
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.plan.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.plan.offset = Some(offset);
        self
    }

    /// Restricts the relation to one page of results.
    pub fn page(self, page: Page) -> Self {
        self.offset(page.offset()).limit(u64::from(page.per_page()))
    }

    pub async fn load(&self) -> CoreResult<Vec<E>> {
        if self.plan.none {
            return Ok(Vec::new());
        }
        self.source.fetch(&self.plan).await
    }

    pub async fn count(&self) -> CoreResult<u64> {
        if self.plan.none {
            return Ok(0);
        }
        self.source.count(&self.plan).await
    }

    pub async fn first(&self) -> CoreResult<Option<E>> {
        let rows = self.clone().limit(1).load().await?;
        Ok(rows.into_iter().next())
    }
}
