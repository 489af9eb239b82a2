/// End-to-end tests of the HTTP surface
///
/// Each test drives the real router with `oneshot` over the in-memory store.
mod common;

use axum::http::{header, Method, StatusCode};
use common::{empty, json, multipart, TestContext, PASSWORD};
use serde_json::json as body;
use tower::ServiceExt;
use uuid::Uuid;

#[tokio::test]
async fn test_health_reports_connected_store() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.send(empty(Method::GET, "/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_register_creates_user_without_exposing_hash() {
    let ctx = TestContext::new().await;

    let (status, user) = ctx
        .send(json(
            Method::POST,
            "/api/auth/register",
            None,
            body!({
                "username": "carol",
                "email": "carol@example.com",
                "password": "winter is coming",
                "password2": "winter is coming",
                "first_name": "Carol"
            }),
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED, "{}", user);
    assert_eq!(user["username"], "carol");
    assert_eq!(user["first_name"], "Carol");
    assert!(user.get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_rejects_bad_input() {
    let ctx = TestContext::new().await;
    let register = |username: &str, password: &str, password2: &str| {
        json(
            Method::POST,
            "/api/auth/register",
            None,
            body!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": password,
                "password2": password2,
            }),
        )
    };

    let (status, err) = ctx.send(register("dave", "winter is coming", "summer")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["details"][0]["field"], "password");

    let (status, _) = ctx.send(register("dave", "12345678", "12345678")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, err) = ctx.send(register("alice", "winter is coming", "winter is coming")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"], "conflict");
}

#[tokio::test]
async fn test_login_and_refresh() {
    let ctx = TestContext::new().await;

    let (status, tokens) = ctx
        .send(json(
            Method::POST,
            "/api/auth/login",
            None,
            body!({ "username": "alice", "password": PASSWORD }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tokens["user_id"], ctx.alice.id.to_string());

    let access = tokens["access_token"].as_str().unwrap();
    let (status, _) = ctx.send(empty(Method::GET, "/api/projects", Some(access))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, refreshed) = ctx
        .send(json(
            Method::POST,
            "/api/auth/refresh",
            None,
            body!({ "refresh_token": tokens["refresh_token"] }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(refreshed["access_token"].is_string());

    // An access token is not a refresh token
    let (status, _) = ctx
        .send(json(
            Method::POST,
            "/api/auth/refresh",
            None,
            body!({ "refresh_token": access }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let ctx = TestContext::new().await;

    let (status, err) = ctx
        .send(json(
            Method::POST,
            "/api/auth/login",
            None,
            body!({ "username": "alice", "password": "not the password" }),
        ))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(err["error"], "unauthorized");
}

#[tokio::test]
async fn test_resources_require_bearer_token() {
    let ctx = TestContext::new().await;

    let (status, _) = ctx.send(empty(Method::GET, "/api/projects", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .send(empty(Method::GET, "/api/projects", Some("not-a-jwt")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_projects_are_private_to_their_owner() {
    let ctx = TestContext::new().await;
    let project = ctx.project(&ctx.alice_token, "Thesis").await;
    let uri = format!("/api/projects/{}", project);

    let (_, mine) = ctx
        .send(empty(Method::GET, "/api/projects", Some(&ctx.alice_token)))
        .await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
    assert_eq!(mine[0]["owner"], "alice");
    assert_eq!(mine[0]["owner_id"], ctx.alice.id.to_string());

    let (_, theirs) = ctx
        .send(empty(Method::GET, "/api/projects", Some(&ctx.bob_token)))
        .await;
    assert!(theirs.as_array().unwrap().is_empty());

    let (status, _) = ctx.send(empty(Method::GET, &uri, Some(&ctx.bob_token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send(json(Method::PATCH, &uri, Some(&ctx.bob_token), body!({ "name": "Mine now" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.send(empty(Method::DELETE, &uri, Some(&ctx.bob_token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, still) = ctx.send(empty(Method::GET, &uri, Some(&ctx.alice_token))).await;
    assert_eq!(still["name"], "Thesis");

    let missing = format!("/api/projects/{}", Uuid::new_v4());
    let (status, err) = ctx.send(empty(Method::GET, &missing, Some(&ctx.alice_token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"], "not_found");
}

#[tokio::test]
async fn test_project_update_is_partial_for_put_and_patch() {
    let ctx = TestContext::new().await;
    let project = ctx.project(&ctx.alice_token, "Draft").await;
    let uri = format!("/api/projects/{}", project);

    let (status, updated) = ctx
        .send(json(Method::PUT, &uri, Some(&ctx.alice_token), body!({ "description": "notes" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Draft");
    assert_eq!(updated["description"], "notes");

    let (status, err) = ctx
        .send(json(Method::PATCH, &uri, Some(&ctx.alice_token), body!({ "name": "" })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["details"][0]["field"], "name");
}

#[tokio::test]
async fn test_task_under_foreign_project_is_forbidden() {
    let ctx = TestContext::new().await;
    let project = ctx.project(&ctx.alice_token, "Alice's").await;
    let tasks = format!("/api/projects/{}/tasks", project);

    let (status, _) = ctx
        .send(json(Method::POST, &tasks, Some(&ctx.bob_token), body!({ "title": "sneaky" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, list) = ctx.send(empty(Method::GET, &tasks, Some(&ctx.alice_token))).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_task_parent_comes_from_path() {
    let ctx = TestContext::new().await;
    let first = ctx.project(&ctx.alice_token, "First").await;
    let second = ctx.project(&ctx.alice_token, "Second").await;

    let (status, task) = ctx
        .send(json(
            Method::POST,
            &format!("/api/projects/{}/tasks", first),
            Some(&ctx.alice_token),
            body!({ "title": "t", "project_id": second, "priority": "High" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["project_id"], first);
    assert_eq!(task["priority"], "High");
    assert_eq!(task["is_completed"], false);
    assert_eq!(task["documents_count"], 0);

    let wrong_parent = format!("/api/projects/{}/tasks/{}", second, task["id"].as_str().unwrap());
    let (status, _) = ctx.send(empty(Method::GET, &wrong_parent, Some(&ctx.alice_token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_task_due_date_can_be_cleared() {
    let ctx = TestContext::new().await;
    let project = ctx.project(&ctx.alice_token, "p").await;
    let (status, task) = ctx
        .send(json(
            Method::POST,
            &format!("/api/projects/{}/tasks", project),
            Some(&ctx.alice_token),
            body!({ "title": "t", "due_date": "2030-01-01T12:00:00Z" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(task["due_date"].is_string());

    let uri = format!("/api/projects/{}/tasks/{}", project, task["id"].as_str().unwrap());

    let (_, kept) = ctx
        .send(json(Method::PATCH, &uri, Some(&ctx.alice_token), body!({ "is_completed": true })))
        .await;
    assert!(kept["due_date"].is_string());
    assert_eq!(kept["is_completed"], true);

    let (_, cleared) = ctx
        .send(json(Method::PATCH, &uri, Some(&ctx.alice_token), body!({ "due_date": null })))
        .await;
    assert!(cleared["due_date"].is_null());
}

#[tokio::test]
async fn test_document_upload_download_replace_delete() {
    let ctx = TestContext::new().await;
    let project = ctx.project(&ctx.alice_token, "p").await;
    let task = ctx.task(&ctx.alice_token, &project, "t").await;
    let documents = format!("/api/projects/{}/tasks/{}/documents", project, task);

    let (status, doc) = ctx
        .send(multipart(
            Method::POST,
            &documents,
            &ctx.alice_token,
            Some(("draft.txt", "first version")),
            Some("Draft"),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", doc);
    assert_eq!(doc["file_name"], "Draft");
    let doc_uri = format!("{}/{}", documents, doc["id"].as_str().unwrap());
    assert_eq!(doc["file_url"], format!("{}/download", doc_uri));

    let response = ctx
        .app
        .clone()
        .oneshot(empty(Method::GET, &format!("{}/download", doc_uri), Some(&ctx.alice_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Draft\""
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"first version");

    let (status, replaced) = ctx
        .send(multipart(
            Method::PATCH,
            &doc_uri,
            &ctx.alice_token,
            Some(("final.txt", "second version")),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", replaced);
    assert_ne!(replaced["storage_path"], doc["storage_path"]);

    let files = ctx.stored_files();
    assert_eq!(files.len(), 1);
    assert_eq!(std::fs::read(&files[0]).unwrap(), b"second version");

    let (status, _) = ctx
        .send(multipart(Method::PUT, &doc_uri, &ctx.alice_token, None, Some("Renamed")))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, task_view) = ctx
        .send(empty(
            Method::GET,
            &format!("/api/projects/{}/tasks/{}", project, task),
            Some(&ctx.alice_token),
        ))
        .await;
    assert_eq!(task_view["documents_count"], 1);
    assert_eq!(task_view["documents"][0]["file_name"], "Renamed");

    let (status, _) = ctx.send(empty(Method::DELETE, &doc_uri, Some(&ctx.alice_token))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(ctx.stored_files().is_empty());

    let (status, _) = ctx.send(empty(Method::GET, &doc_uri, Some(&ctx.alice_token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_requires_file_part() {
    let ctx = TestContext::new().await;
    let project = ctx.project(&ctx.alice_token, "p").await;
    let task = ctx.task(&ctx.alice_token, &project, "t").await;
    let documents = format!("/api/projects/{}/tasks/{}/documents", project, task);

    let (status, err) = ctx
        .send(multipart(Method::POST, &documents, &ctx.alice_token, None, Some("name only")))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["details"][0]["field"], "file");
    assert!(ctx.stored_files().is_empty());
}

#[tokio::test]
async fn test_foreign_documents_are_forbidden() {
    let ctx = TestContext::new().await;
    let project = ctx.project(&ctx.alice_token, "p").await;
    let task = ctx.task(&ctx.alice_token, &project, "t").await;
    let documents = format!("/api/projects/{}/tasks/{}/documents", project, task);

    let (status, _) = ctx
        .send(multipart(
            Method::POST,
            &documents,
            &ctx.bob_token,
            Some(("x.txt", "x")),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(ctx.stored_files().is_empty());

    let (_, doc) = ctx
        .send(multipart(
            Method::POST,
            &documents,
            &ctx.alice_token,
            Some(("a.txt", "a")),
            None,
        ))
        .await;
    let download = format!("{}/{}/download", documents, doc["id"].as_str().unwrap());

    let (status, _) = ctx.send(empty(Method::GET, &download, Some(&ctx.bob_token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_project_delete_removes_all_stored_files() {
    let ctx = TestContext::new().await;
    let project = ctx.project(&ctx.alice_token, "Doomed").await;

    for title in ["one", "two"] {
        let task = ctx.task(&ctx.alice_token, &project, title).await;
        let documents = format!("/api/projects/{}/tasks/{}/documents", project, task);
        let (status, _) = ctx
            .send(multipart(
                Method::POST,
                &documents,
                &ctx.alice_token,
                Some(("notes.md", "# notes")),
                None,
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    assert_eq!(ctx.stored_files().len(), 2);

    let (status, _) = ctx
        .send(empty(
            Method::DELETE,
            &format!("/api/projects/{}", project),
            Some(&ctx.alice_token),
        ))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(ctx.stored_files().is_empty());

    let (_, list) = ctx
        .send(empty(Method::GET, "/api/projects", Some(&ctx.alice_token)))
        .await;
    assert!(list.as_array().unwrap().is_empty());
}
