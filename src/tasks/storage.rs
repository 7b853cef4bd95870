// tasks/storage.rs — task query engine and mutation handlers.
//
// Every operation takes the caller's user id as an explicit argument and
// scopes its SQL by `user_id`; there is no ambient current-user state. A
// mutation that matches no (id, user_id) pair reports not-found without
// revealing whether the id exists under a different owner.

use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::storage::with_timeout;

use super::{utc_day_bounds, Priority, SortDirection, SortKey, TaskPage, TaskQuery, TaskRow, TaskUpdate};

/// Page query for each (sort key, direction) pair. Six constant strings —
/// caller input selects between them through the typed enums and is never
/// spliced into SQL. The priority CASE is the rank table from
/// `Priority::rank`; `id` breaks ties so pagination stays stable.
///
/// SQLite sorts NULL as smallest, so the due-date arms order on
/// `due_date IS NULL` first: undated tasks go last ascending, first
/// descending.
fn page_query(sort: SortKey, direction: SortDirection) -> &'static str {
    match (sort, direction) {
        (SortKey::DueDate, SortDirection::Asc) => {
            "SELECT * FROM tasks WHERE user_id = ?
             ORDER BY due_date IS NULL, due_date ASC, id ASC LIMIT ? OFFSET ?"
        }
        (SortKey::DueDate, SortDirection::Desc) => {
            "SELECT * FROM tasks WHERE user_id = ?
             ORDER BY due_date IS NULL DESC, due_date DESC, id ASC LIMIT ? OFFSET ?"
        }
        (SortKey::Alphabetical, SortDirection::Asc) => {
            "SELECT * FROM tasks WHERE user_id = ?
             ORDER BY title COLLATE NOCASE ASC, id ASC LIMIT ? OFFSET ?"
        }
        (SortKey::Alphabetical, SortDirection::Desc) => {
            "SELECT * FROM tasks WHERE user_id = ?
             ORDER BY title COLLATE NOCASE DESC, id ASC LIMIT ? OFFSET ?"
        }
        (SortKey::Priority, SortDirection::Asc) => {
            "SELECT * FROM tasks WHERE user_id = ?
             ORDER BY CASE priority
               WHEN 'high' THEN 1 WHEN 'medium' THEN 2 WHEN 'low' THEN 3 ELSE 4
             END ASC, id ASC LIMIT ? OFFSET ?"
        }
        (SortKey::Priority, SortDirection::Desc) => {
            "SELECT * FROM tasks WHERE user_id = ?
             ORDER BY CASE priority
               WHEN 'high' THEN 1 WHEN 'medium' THEN 2 WHEN 'low' THEN 3 ELSE 4
             END DESC, id ASC LIMIT ? OFFSET ?"
        }
    }
}

#[derive(Clone)]
pub struct TaskStorage {
    pool: SqlitePool,
}

impl TaskStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ─── Query engine ─────────────────────────────────────────────────────────

    /// One page of the caller's tasks plus the dashboard counters.
    ///
    /// The counts and the page are independent reads, not a single
    /// transaction — counters may lag the page by a concurrent mutation,
    /// which is accepted. A page past the end returns empty `tasks` with
    /// the counters intact; pulling back to a valid page is caller policy.
    pub async fn list_page(&self, user_id: i64, query: &TaskQuery) -> Result<TaskPage> {
        let tasks: Vec<TaskRow> = with_timeout(async {
            Ok(sqlx::query_as(page_query(query.sort, query.direction))
                .bind(user_id)
                .bind(query.limit)
                .bind(query.offset())
                .fetch_all(&self.pool)
                .await?)
        })
        .await?;

        let total_items = self.count_all(user_id).await?;
        let completed_count = self.count_completed(user_id).await?;
        let high_priority_count = self.count_high_priority(user_id).await?;
        let due_today_count = self.count_due_today(user_id).await?;

        // ceil(total / limit); limit is clamped to >= 1 upstream.
        let total_pages = (total_items + query.limit - 1) / query.limit;

        Ok(TaskPage {
            tasks,
            page: query.page,
            total_pages,
            total_items,
            completed_count,
            high_priority_count,
            due_today_count,
        })
    }

    async fn count_all(&self, user_id: i64) -> Result<i64> {
        let row: (i64,) = with_timeout(async {
            Ok(sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?)
        })
        .await?;
        Ok(row.0)
    }

    async fn count_completed(&self, user_id: i64) -> Result<i64> {
        let row: (i64,) = with_timeout(async {
            Ok(
                sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE user_id = ? AND completed = 1")
                    .bind(user_id)
                    .fetch_one(&self.pool)
                    .await?,
            )
        })
        .await?;
        Ok(row.0)
    }

    async fn count_high_priority(&self, user_id: i64) -> Result<i64> {
        let row: (i64,) = with_timeout(async {
            Ok(
                sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE user_id = ? AND priority = ?")
                    .bind(user_id)
                    .bind(Priority::High.as_str())
                    .fetch_one(&self.pool)
                    .await?,
            )
        })
        .await?;
        Ok(row.0)
    }

    async fn count_due_today(&self, user_id: i64) -> Result<i64> {
        let (start, end) = utc_day_bounds(Utc::now());
        let row: (i64,) = with_timeout(async {
            Ok(sqlx::query_as(
                "SELECT COUNT(*) FROM tasks WHERE user_id = ? AND due_date BETWEEN ? AND ?",
            )
            .bind(user_id)
            .bind(start)
            .bind(end)
            .fetch_one(&self.pool)
            .await?)
        })
        .await?;
        Ok(row.0)
    }

    // ─── Mutations ────────────────────────────────────────────────────────────

    /// Create a task with defaults: not completed, low priority, no due date.
    /// Title validation (non-empty) happens at the REST boundary.
    pub async fn create_task(&self, user_id: i64, title: &str) -> Result<TaskRow> {
        let now = Utc::now().to_rfc3339();
        let result = with_timeout(async {
            Ok(sqlx::query(
                "INSERT INTO tasks (user_id, title, completed, priority, created_at)
                 VALUES (?, ?, 0, ?, ?)",
            )
            .bind(user_id)
            .bind(title)
            .bind(Priority::Low.as_str())
            .bind(&now)
            .execute(&self.pool)
            .await?)
        })
        .await?;
        self.get_task(user_id, result.last_insert_rowid())
            .await?
            .ok_or_else(|| anyhow::anyhow!("task not found after insert"))
    }

    /// Fetch one task, scoped by owner.
    pub async fn get_task(&self, user_id: i64, id: i64) -> Result<Option<TaskRow>> {
        with_timeout(async {
            Ok(
                sqlx::query_as("SELECT * FROM tasks WHERE id = ? AND user_id = ?")
                    .bind(id)
                    .bind(user_id)
                    .fetch_optional(&self.pool)
                    .await?,
            )
        })
        .await
    }

    /// PATCH-style update: COALESCE keeps columns whose patch field is absent.
    /// Returns `false` when no task matches (id, user_id) — wrong id and
    /// wrong owner are indistinguishable to the caller.
    pub async fn update_task(&self, user_id: i64, id: i64, update: &TaskUpdate) -> Result<bool> {
        let result = with_timeout(async {
            Ok(sqlx::query(
                "UPDATE tasks SET
                   title = COALESCE(?, title),
                   completed = COALESCE(?, completed),
                   priority = COALESCE(?, priority),
                   due_date = COALESCE(?, due_date)
                 WHERE id = ? AND user_id = ?",
            )
            .bind(&update.title)
            .bind(update.completed)
            .bind(update.priority.map(Priority::as_str))
            .bind(update.due_date)
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?)
        })
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete outright (no soft delete). Idempotent at the protocol level:
    /// a repeat delete simply reports `false`.
    pub async fn delete_task(&self, user_id: i64, id: i64) -> Result<bool> {
        let result = with_timeout(async {
            Ok(sqlx::query("DELETE FROM tasks WHERE id = ? AND user_id = ?")
                .bind(id)
                .bind(user_id)
                .execute(&self.pool)
                .await?)
        })
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
