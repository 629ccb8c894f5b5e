use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use finders_core::db::DatabasePool;
use finders_core::CoreResult;
use finders_protocol::alert::{Alert, AlertSeverity, AlertStatus, SortDirection};
use finders_protocol::snippet::{Snippet, SnippetVisibility};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Postgres, QueryBuilder};

use crate::fuzzy::{self, SearchTerms};
use crate::relation::{FieldValue, Filter, QueryPlan, Record, RecordSource};

/// Record that can be decoded from a Postgres row.
pub trait PgRecord: Record {
    type Row: for<'r> FromRow<'r, PgRow> + Send + Unpin;

    fn from_row(row: Self::Row) -> CoreResult<Self>;
}

/// Record source backed by a Postgres table.
pub struct PgSource<E> {
    pool: DatabasePool,
    _record: PhantomData<fn() -> E>,
}

impl<E> Clone for PgSource<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _record: PhantomData,
        }
    }
}

impl<E: PgRecord> PgSource<E> {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }
}

#[async_trait]
impl<E: PgRecord> RecordSource<E> for PgSource<E> {
    async fn fetch(&self, plan: &QueryPlan) -> CoreResult<Vec<E>> {
        let mut builder = select_query::<E>(plan);
        let rows = builder
            .build_query_as::<E::Row>()
            .fetch_all(self.pool.inner())
            .await?;

        rows.into_iter().map(E::from_row).collect()
    }

    async fn count(&self, plan: &QueryPlan) -> CoreResult<u64> {
        let mut builder = count_query::<E>(plan);
        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(self.pool.inner())
            .await?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}

/// Renders the row query for a plan.
pub fn select_query<E: Record>(plan: &QueryPlan) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!(
        "SELECT {} FROM {}",
        E::COLUMNS.join(", "),
        E::TABLE
    ));
    push_conditions(&mut builder, plan);
    push_order::<E>(&mut builder, plan);
    push_window(&mut builder, plan);
    builder
}

/// Renders the count query for a plan. Windowed plans are counted through a
/// limited subquery so the scan stops at the window's end.
pub fn count_query<E: Record>(plan: &QueryPlan) -> QueryBuilder<'static, Postgres> {
    if !plan.is_windowed() {
        let mut builder = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", E::TABLE));
        push_conditions(&mut builder, plan);
        return builder;
    }

    let mut builder = QueryBuilder::new(format!("SELECT COUNT(*) FROM (SELECT 1 FROM {}", E::TABLE));
    push_conditions(&mut builder, plan);
    push_window(&mut builder, plan);
    builder.push(") AS limited");
    builder
}

fn push_conditions(builder: &mut QueryBuilder<'static, Postgres>, plan: &QueryPlan) {
    builder.push(" WHERE 1=1");
    if plan.is_none() {
        builder.push(" AND 1=0");
    }
    for filter in plan.filters() {
        builder.push(" AND ");
        push_filter(builder, filter);
    }
}

fn push_filter(builder: &mut QueryBuilder<'static, Postgres>, filter: &Filter) {
    match filter {
        Filter::Eq {
            field,
            value: FieldValue::Null,
        } => {
            builder.push(*field).push(" IS NULL");
        }
        Filter::Eq { field, value } => {
            builder.push(*field).push(" = ");
            push_value(builder, value);
        }
        Filter::In { values, .. } if values.is_empty() => {
            builder.push("1=0");
        }
        Filter::In { field, values } => {
            builder.push(*field).push(" IN (");
            for (index, value) in values.iter().enumerate() {
                if index > 0 {
                    builder.push(", ");
                }
                push_value(builder, value);
            }
            builder.push(")");
        }
        Filter::Any(filters) => push_group(builder, filters, " OR ", "1=0"),
        Filter::All(filters) => push_group(builder, filters, " AND ", "1=1"),
        Filter::Search { columns, query } => push_search(builder, columns, query),
    }
}

fn push_group(
    builder: &mut QueryBuilder<'static, Postgres>,
    filters: &[Filter],
    separator: &str,
    empty: &str,
) {
    if filters.is_empty() {
        builder.push(empty);
        return;
    }
    builder.push("(");
    for (index, filter) in filters.iter().enumerate() {
        if index > 0 {
            builder.push(separator);
        }
        push_filter(builder, filter);
    }
    builder.push(")");
}

fn push_search(builder: &mut QueryBuilder<'static, Postgres>, columns: &[&'static str], query: &str) {
    if columns.is_empty() {
        builder.push("1=0");
        return;
    }

    let patterns: Vec<String> = match fuzzy::terms(query) {
        SearchTerms::Words(words) => words
            .iter()
            .map(|word| format!("%{}%", fuzzy::sanitize_like(word)))
            .collect(),
        SearchTerms::Exact(query) => vec![fuzzy::sanitize_like(&query)],
    };

    builder.push("(");
    for (column_index, column) in columns.iter().enumerate() {
        if column_index > 0 {
            builder.push(" OR ");
        }
        builder.push("(");
        for (pattern_index, pattern) in patterns.iter().enumerate() {
            if pattern_index > 0 {
                builder.push(" AND ");
            }
            builder.push(*column).push(" ILIKE ");
            builder.push_bind(pattern.clone());
        }
        builder.push(")");
    }
    builder.push(")");
}

fn push_value(builder: &mut QueryBuilder<'static, Postgres>, value: &FieldValue) {
    match value {
        FieldValue::Int(value) => {
            builder.push_bind(*value);
        }
        FieldValue::Text(value) => {
            builder.push_bind(value.clone());
        }
        FieldValue::Time(value) => {
            builder.push_bind(*value);
        }
        FieldValue::Null => {
            builder.push("NULL");
        }
    }
}

fn push_order<E: Record>(builder: &mut QueryBuilder<'static, Postgres>, plan: &QueryPlan) {
    builder.push(" ORDER BY ");
    for term in plan.order() {
        let direction = match term.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        builder.push(term.field).push(" ").push(direction).push(", ");
    }
    // Primary key keeps pages stable across equal sort values.
    builder.push(E::PRIMARY_KEY).push(" ASC");
}

fn push_window(builder: &mut QueryBuilder<'static, Postgres>, plan: &QueryPlan) {
    if let Some(limit) = plan.limit() {
        builder.push(" LIMIT ");
        builder.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }
    if let Some(offset) = plan.offset() {
        builder.push(" OFFSET ");
        builder.push_bind(i64::try_from(offset).unwrap_or(i64::MAX));
    }
}

fn decode_error(message: String) -> sqlx::Error {
    sqlx::Error::Decode(message.into())
}

#[derive(FromRow)]
pub struct AlertRow {
    id: i64,
    iid: i64,
    project_id: i64,
    title: String,
    status: i16,
    severity: i16,
    events: i64,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PgRecord for Alert {
    type Row = AlertRow;

    fn from_row(row: AlertRow) -> CoreResult<Self> {
        let status = AlertStatus::from_code(row.status)
            .ok_or_else(|| decode_error(format!("unknown alert status code {}", row.status)))?;
        let severity = AlertSeverity::from_code(row.severity)
            .ok_or_else(|| decode_error(format!("unknown alert severity code {}", row.severity)))?;

        Ok(Alert {
            id: row.id,
            iid: row.iid,
            project_id: row.project_id,
            title: row.title,
            status,
            severity,
            events: row.events,
            started_at: row.started_at,
            ended_at: row.ended_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
pub struct SnippetRow {
    id: i64,
    title: String,
    description: Option<String>,
    file_name: String,
    content: String,
    author_id: i64,
    project_id: Option<i64>,
    visibility_level: i16,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PgRecord for Snippet {
    type Row = SnippetRow;

    fn from_row(row: SnippetRow) -> CoreResult<Self> {
        let visibility = SnippetVisibility::from_level(row.visibility_level).ok_or_else(|| {
            decode_error(format!(
                "unknown snippet visibility level {}",
                row.visibility_level
            ))
        })?;

        Ok(Snippet {
            id: row.id,
            title: row.title,
            description: row.description,
            file_name: row.file_name,
            content: row.content,
            author_id: row.author_id,
            project_id: row.project_id,
            visibility,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::Relation;
    use finders_core::FinderError;
    use finders_protocol::page::Page;

    const ALERT_COLUMNS: &str = "id, iid, project_id, title, status, severity, events, \
         started_at, ended_at, created_at, updated_at";

    #[test]
    fn renders_filters_order_and_window() {
        let relation = Relation::new(crate::memory::MemorySource::<Alert>::new().into_source())
            .where_eq("project_id", 7_i64)
            .where_in("status", [0_i16, 1])
            .where_eq("iid", 5_i64)
            .order_by("created_at", SortDirection::Desc)
            .page(Page::new(2, 20));

        let builder = select_query::<Alert>(relation.plan());
        assert_eq!(
            builder.sql(),
            format!(
                "SELECT {ALERT_COLUMNS} FROM alert_management_alerts WHERE 1=1 \
                 AND project_id = $1 AND status IN ($2, $3) AND iid = $4 \
                 ORDER BY created_at DESC, id ASC LIMIT $5 OFFSET $6"
            )
        );
    }

    #[test]
    fn default_order_is_primary_key() {
        let plan = QueryPlan::default();
        let builder = select_query::<Alert>(&plan);
        assert_eq!(
            builder.sql(),
            format!("SELECT {ALERT_COLUMNS} FROM alert_management_alerts WHERE 1=1 ORDER BY id ASC")
        );
    }

    #[test]
    fn limited_counts_use_a_subquery() {
        let relation = Relation::new(crate::memory::MemorySource::<Snippet>::new().into_source())
            .where_eq("author_id", 3_i64)
            .limit(100);

        let builder = count_query::<Snippet>(relation.plan());
        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM (SELECT 1 FROM snippets WHERE 1=1 AND author_id = $1 LIMIT $2) AS limited"
        );

        let unbounded = count_query::<Snippet>(&QueryPlan::default());
        assert_eq!(unbounded.sql(), "SELECT COUNT(*) FROM snippets WHERE 1=1");
    }

    #[test]
    fn renders_search_and_visibility_groups() {
        let relation = Relation::new(crate::memory::MemorySource::<Snippet>::new().into_source())
            .filter(Filter::Any(vec![
                Filter::All(vec![
                    Filter::eq("author_id", 3_i64),
                    Filter::eq("project_id", None::<i64>),
                ]),
                Filter::is_in("project_id", Vec::<i64>::new()),
            ]))
            .search(&["title", "file_name"], "deploy script");

        let builder = count_query::<Snippet>(relation.plan());
        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM snippets WHERE 1=1 \
             AND ((author_id = $1 AND project_id IS NULL) OR 1=0) \
             AND ((title ILIKE $2 AND title ILIKE $3) OR (file_name ILIKE $4 AND file_name ILIKE $5))"
        );
    }

    #[test]
    fn unknown_codes_surface_as_store_errors() {
        let now = Utc::now();
        let row = SnippetRow {
            id: 1,
            title: "t".into(),
            description: None,
            file_name: "f".into(),
            content: String::new(),
            author_id: 1,
            project_id: None,
            visibility_level: 7,
            created_at: now,
            updated_at: now,
        };

        let err = Snippet::from_row(row).unwrap_err();
        assert!(matches!(err, FinderError::Store(sqlx::Error::Decode(_))));
    }
}
