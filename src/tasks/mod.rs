// tasks — domain types for the per-user to-do list.
//
// The query/mutation logic itself lives in `tasks::storage`; this module holds
// the types shared between the REST layer and storage: the priority rank
// table, sort parameters, row shapes, and the PATCH-style update struct.

pub mod storage;

pub use storage::TaskStorage;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
/// Hard cap on a single page, mirroring the list cap used elsewhere in the
/// daemon. Keeps a hostile `limit=999999` from materializing the whole table.
pub const MAX_PAGE_SIZE: i64 = 500;

// ─── Priority ────────────────────────────────────────────────────────────────

/// Task priority. Sorting uses the fixed rank table below, not the lexical
/// order of the labels — string sort would put "high" before "low" ascending
/// for the wrong reason and "medium" last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Rank table: high < medium < low < anything else.
    /// Must stay in sync with the SQL CASE in `storage::page_query`.
    pub fn rank(self) -> i64 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    /// Rank for a raw label as stored in the database. Unrecognized labels
    /// sort last.
    pub fn rank_label(label: &str) -> i64 {
        match Self::parse(label) {
            Some(p) => p.rank(),
            None => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

// ─── Sort parameters ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    DueDate,
    Priority,
    Alphabetical,
}

impl SortKey {
    /// Lenient parse: unrecognized values fall back to the due-date default
    /// rather than erroring, matching how the query string is coerced.
    pub fn parse(s: &str) -> Self {
        match s {
            "priority" => SortKey::Priority,
            "alphabetical" => SortKey::Alphabetical,
            _ => SortKey::DueDate,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Anything other than exactly "desc" is ascending.
    pub fn parse(s: &str) -> Self {
        if s == "desc" {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }
}

/// Normalized query-engine input. Page and limit are coerced and defensively
/// clamped to positive values; sort parameters fall back to their defaults.
#[derive(Debug, Clone, Copy)]
pub struct TaskQuery {
    /// 1-based page number.
    pub page: i64,
    pub limit: i64,
    pub sort: SortKey,
    pub direction: SortDirection,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            sort: SortKey::default(),
            direction: SortDirection::default(),
        }
    }
}

impl TaskQuery {
    pub fn from_params(
        page: Option<&str>,
        limit: Option<&str>,
        sort: Option<&str>,
        direction: Option<&str>,
    ) -> Self {
        let page = page
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(1)
            .max(1);
        let limit = limit
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        Self {
            page,
            limit,
            sort: SortKey::parse(sort.unwrap_or("")),
            direction: SortDirection::parse(direction.unwrap_or("")),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

// ─── Rows and pages ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TaskRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub completed: bool,
    /// Stored label; normally one of the `Priority` variants but read back
    /// as raw text so legacy/unknown labels still sort (last) instead of
    /// failing to decode.
    pub priority: String,
    /// Due timestamp, unix epoch milliseconds UTC.
    pub due_date: Option<i64>,
    pub created_at: String,
}

impl TaskRow {
    /// Client JSON shape; `dueDate` is rendered back as RFC 3339.
    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "userId": self.user_id,
            "title": self.title,
            "completed": self.completed,
            "priority": self.priority,
            "dueDate": self
                .due_date
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            "createdAt": self.created_at,
        })
    }
}

/// One page of a user's tasks plus the dashboard counters.
#[derive(Debug)]
pub struct TaskPage {
    pub tasks: Vec<TaskRow>,
    pub page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub completed_count: i64,
    pub high_priority_count: i64,
    pub due_today_count: i64,
}

impl TaskPage {
    pub fn to_json(&self) -> Value {
        json!({
            "tasks": self.tasks.iter().map(TaskRow::to_json).collect::<Vec<_>>(),
            "page": self.page,
            "totalPages": self.total_pages,
            "totalItems": self.total_items,
            "completedCount": self.completed_count,
            "highPriorityCount": self.high_priority_count,
            "dueTodayCount": self.due_today_count,
        })
    }
}

// ─── Partial updates ─────────────────────────────────────────────────────────

/// Wire-level PATCH body. Each field is explicitly present or absent — an
/// absent field is never written, so a partial update cannot overwrite
/// untouched columns.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    /// RFC 3339 timestamp or bare `YYYY-MM-DD` date.
    pub due_date: Option<String>,
}

/// Resolved update ready for storage: the due date parsed to epoch millis.
#[derive(Debug, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub due_date: Option<i64>,
}

impl TaskPatch {
    /// Validate and convert to a storage-level update.
    /// Err holds a client-safe validation message.
    pub fn resolve(self) -> Result<TaskUpdate, String> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err("title must not be empty".to_string());
            }
        }
        let due_date = match &self.due_date {
            Some(s) => Some(
                parse_due_date(s).ok_or_else(|| format!("invalid dueDate: {s:?}"))?,
            ),
            None => None,
        };
        Ok(TaskUpdate {
            title: self.title,
            completed: self.completed,
            priority: self.priority,
            due_date,
        })
    }
}

/// Parse a client-supplied due date to epoch milliseconds.
/// Accepts RFC 3339 timestamps and bare dates (midnight UTC).
pub fn parse_due_date(s: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).timestamp_millis());
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(date.and_time(NaiveTime::MIN).and_utc().timestamp_millis())
}

/// Inclusive `[start, end]` millisecond bounds of the UTC calendar day
/// containing `now`: 00:00:00.000 through 23:59:59.999.
pub fn utc_day_bounds(now: DateTime<Utc>) -> (i64, i64) {
    let start = now
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_utc()
        .timestamp_millis();
    (start, start + 86_400_000 - 1)
}
