//! End-to-end REST tests: bind the router to an ephemeral port and drive it
//! over HTTP with reqwest — registration, login, bearer auth, task CRUD, and
//! the not-found behavior for foreign-owned tasks.

use serde_json::{json, Value};
use std::sync::Arc;
use taskd::{
    auth::TokenKeys, config::DaemonConfig, rest, storage::Storage, tasks::TaskStorage, AppContext,
};
use tempfile::TempDir;

async fn spawn_server() -> (TempDir, String, reqwest::Client) {
    let dir = TempDir::new().unwrap();
    let config = Arc::new(DaemonConfig::new(
        None,
        Some(dir.path().to_path_buf()),
        Some("error".to_string()),
        None,
    ));
    let storage = Arc::new(Storage::new(dir.path()).await.unwrap());
    let tasks = Arc::new(TaskStorage::new(storage.pool()));
    let tokens = Arc::new(TokenKeys::new("test-secret", 3600));
    let ctx = Arc::new(AppContext {
        config,
        storage,
        tasks,
        tokens,
        started_at: std::time::Instant::now(),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, rest::build_router(ctx)).await.unwrap();
    });

    (dir, format!("http://{addr}"), reqwest::Client::new())
}

async fn register_and_login(base: &str, client: &reqwest::Client, email: &str) -> String {
    let res = client
        .post(format!("{base}/api/auth/register"))
        .json(&json!({ "name": "Test User", "email": email, "password": "hunter2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 201);

    let res = client
        .post(format!("{base}/api/auth/login"))
        .json(&json!({ "email": email, "password": "hunter2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let body: Value = res.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let (_dir, base, client) = spawn_server().await;

    let res = client.get(format!("{base}/api/health")).send().await.unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn register_login_and_profile_flow() {
    let (_dir, base, client) = spawn_server().await;
    let token = register_and_login(&base, &client, "ada@test").await;

    // Duplicate registration short-circuits with 400.
    let res = client
        .post(format!("{base}/api/auth/register"))
        .json(&json!({ "name": "Dup", "email": "ada@test", "password": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);

    // Wrong password and unknown email both 401.
    for body in [
        json!({ "email": "ada@test", "password": "wrong" }),
        json!({ "email": "nobody@test", "password": "hunter2" }),
    ] {
        let res = client
            .post(format!("{base}/api/auth/login"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 401);
    }

    // Profile round trip.
    let res = client
        .get(format!("{base}/api/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let profile: Value = res.json().await.unwrap();
    assert_eq!(profile["email"], "ada@test");
    assert_eq!(profile["name"], "Test User");
    assert_eq!(profile["language"], "en");
    assert_eq!(profile["isActive"], true);

    let res = client
        .put(format!("{base}/api/me"))
        .bearer_auth(&token)
        .json(&json!({ "language": "es" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);

    let res = client
        .get(format!("{base}/api/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let profile: Value = res.json().await.unwrap();
    assert_eq!(profile["language"], "es");
    assert_eq!(profile["name"], "Test User", "absent field untouched");
}

#[tokio::test]
async fn missing_or_invalid_token_is_unauthorized() {
    let (_dir, base, client) = spawn_server().await;

    let res = client.get(format!("{base}/api/tasks")).send().await.unwrap();
    assert_eq!(res.status().as_u16(), 401);

    let res = client
        .get(format!("{base}/api/tasks"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 401);
}

#[tokio::test]
async fn task_crud_over_http() {
    let (_dir, base, client) = spawn_server().await;
    let token = register_and_login(&base, &client, "crud@test").await;

    // Missing title rejected.
    let res = client
        .post(format!("{base}/api/tasks"))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);

    // Create with defaults.
    let res = client
        .post(format!("{base}/api/tasks"))
        .bearer_auth(&token)
        .json(&json!({ "title": "Buy milk" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 201);
    let task: Value = res.json().await.unwrap();
    assert_eq!(task["title"], "Buy milk");
    assert_eq!(task["completed"], false);
    assert_eq!(task["priority"], "low");
    assert!(task["dueDate"].is_null());
    let id = task["id"].as_i64().unwrap();

    // Patch completion + due date.
    let res = client
        .put(format!("{base}/api/tasks/{id}"))
        .bearer_auth(&token)
        .json(&json!({ "completed": true, "dueDate": "2026-09-01" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);

    // Unparseable due date rejected.
    let res = client
        .put(format!("{base}/api/tasks/{id}"))
        .bearer_auth(&token)
        .json(&json!({ "dueDate": "whenever" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);

    let res = client
        .get(format!("{base}/api/tasks"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let page: Value = res.json().await.unwrap();
    assert_eq!(page["totalItems"], 1);
    assert_eq!(page["completedCount"], 1);
    assert_eq!(page["tasks"][0]["title"], "Buy milk");
    assert_eq!(page["tasks"][0]["dueDate"], "2026-09-01T00:00:00.000Z");

    // Unknown id → 404.
    let res = client
        .put(format!("{base}/api/tasks/999999"))
        .bearer_auth(&token)
        .json(&json!({ "completed": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 404);

    // Delete, then delete again.
    let res = client
        .delete(format!("{base}/api/tasks/{id}"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let res = client
        .delete(format!("{base}/api/tasks/{id}"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 404);
}

#[tokio::test]
async fn foreign_tasks_are_invisible_and_immutable() {
    let (_dir, base, client) = spawn_server().await;
    let alice = register_and_login(&base, &client, "alice@test").await;
    let bob = register_and_login(&base, &client, "bob@test").await;

    let res = client
        .post(format!("{base}/api/tasks"))
        .bearer_auth(&alice)
        .json(&json!({ "title": "Alice's secret" }))
        .send()
        .await
        .unwrap();
    let id = res.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    // Bob's listing is empty.
    let res = client
        .get(format!("{base}/api/tasks"))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    let page: Value = res.json().await.unwrap();
    assert_eq!(page["totalItems"], 0);

    // Bob's update/delete of Alice's id are indistinguishable from a
    // missing id.
    let res = client
        .put(format!("{base}/api/tasks/{id}"))
        .bearer_auth(&bob)
        .json(&json!({ "completed": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 404);
    let res = client
        .delete(format!("{base}/api/tasks/{id}"))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 404);
}

#[tokio::test]
async fn list_respects_sort_and_pagination_params() {
    let (_dir, base, client) = spawn_server().await;
    let token = register_and_login(&base, &client, "sort@test").await;

    for (title, priority) in [("A", "low"), ("B", "high"), ("C", "medium")] {
        let res = client
            .post(format!("{base}/api/tasks"))
            .bearer_auth(&token)
            .json(&json!({ "title": title }))
            .send()
            .await
            .unwrap();
        let id = res.json::<Value>().await.unwrap()["id"].as_i64().unwrap();
        let res = client
            .put(format!("{base}/api/tasks/{id}"))
            .bearer_auth(&token)
            .json(&json!({ "priority": priority }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 200);
    }

    let res = client
        .get(format!("{base}/api/tasks?sort=priority&sortDirection=asc&page=1&limit=10"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let page: Value = res.json().await.unwrap();
    let titles: Vec<&str> = page["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["B", "C", "A"]);
    assert_eq!(page["highPriorityCount"], 1);

    // Tiny pages: limit=2 over 3 items → 2 pages.
    let res = client
        .get(format!("{base}/api/tasks?limit=2&page=2"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let page: Value = res.json().await.unwrap();
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["page"], 2);
    assert_eq!(page["tasks"].as_array().unwrap().len(), 1);
}
