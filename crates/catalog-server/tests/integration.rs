use axum::http::StatusCode;
use catalog_core::config::CatalogConfig;
use catalog_core::Catalog;
use http_body_util::BodyExt;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn agent_doc(name: &str, tools: &str) -> String {
    let filler: String = (0..20).map(|i| format!("Guideline {i}.\n")).collect();
    format!(
        "---\nname: {name}\ndescription: {name} helper\ntools: {tools}\n---\n\
         # {name}\n## Description\nBuilds {name} things.\n\
         ## MCP Tool Suite\n- **{tools}**\n\
         ## Communication Protocol\nYou are a senior engineer specializing in {name}.\n\
         {filler}"
    )
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Lay out a source checkout with two valid definitions and one README.
fn init_catalog(dir: &TempDir) -> axum::Router {
    let src = dir.path().join("subagents");
    write(
        &src,
        "categories/01-core-development/api-designer.md",
        &agent_doc("api-designer", "React, Node.js"),
    );
    write(
        &src,
        "categories/03-infrastructure/devops-engineer.md",
        &agent_doc("devops-engineer", "Docker, Kubernetes"),
    );
    write(&src, "categories/01-core-development/README.md", "# readme");

    let config = CatalogConfig::default().rooted(dir.path());
    let catalog = Catalog::open(config).unwrap();
    catalog_server::build_router(Arc::new(catalog))
}

async fn send(
    app: axum::Router,
    method: &str,
    uri: &str,
) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let req = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, body.to_vec())
}

/// Send a request via `oneshot` and return (status, parsed JSON body).
async fn request(app: axum::Router, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, _, body) = send(app, method, uri).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    request(app, "GET", uri).await
}

async fn post(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    request(app, "POST", uri).await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reads_before_refresh_are_503() {
    let dir = TempDir::new().unwrap();
    let app = init_catalog(&dir);

    for uri in ["/api/subagents", "/api/index", "/api/categories", "/api/technologies"] {
        let (status, json) = get(app.clone(), uri).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{uri}");
        assert_eq!(json["code"], "index_unavailable");
        assert!(json["error"].is_string());
    }
}

#[tokio::test]
async fn health_reports_empty_then_ok() {
    let dir = TempDir::new().unwrap();
    let app = init_catalog(&dir);

    let (status, json) = get(app.clone(), "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "empty");
    assert_eq!(json["cache"]["hasIndex"], false);

    let (status, json) = post(app.clone(), "/api/refresh?commit=abc123").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["indexed"], 2);
    assert_eq!(json["invalid"], 1);
    assert_eq!(json["commit"], "abc123");

    let (_, json) = get(app, "/api/health").await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["lastCommit"], "abc123");
    assert_eq!(json["cache"]["indexSize"], 2);
}

#[tokio::test]
async fn list_filters_by_technology_and_category() {
    let dir = TempDir::new().unwrap();
    let app = init_catalog(&dir);
    post(app.clone(), "/api/refresh").await;

    let (status, json) = get(app.clone(), "/api/subagents").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 2);
    assert_eq!(json["page"], 1);
    assert_eq!(json["limit"], 20);
    assert_eq!(json["hasMore"], false);

    let (_, json) = get(app.clone(), "/api/subagents?technologies=react,kubernetes").await;
    assert_eq!(json["total"], 2);

    let (_, json) = get(app.clone(), "/api/subagents?category=03-infrastructure").await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["subagents"][0]["id"], "devops-engineer");

    let (_, json) = get(app, "/api/subagents?limit=1&sort_by=name&sort_order=desc").await;
    assert_eq!(json["subagents"][0]["id"], "devops-engineer");
    assert_eq!(json["totalPages"], 2);
    assert_eq!(json["hasMore"], true);
}

#[tokio::test]
async fn zero_matches_is_200_with_empty_list() {
    let dir = TempDir::new().unwrap();
    let app = init_catalog(&dir);
    post(app.clone(), "/api/refresh").await;

    let (status, json) = get(app, "/api/subagents?search=no-such-thing").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 0);
    assert_eq!(json["subagents"], serde_json::json!([]));
}

#[tokio::test]
async fn bad_filter_values_are_400() {
    let dir = TempDir::new().unwrap();
    let app = init_catalog(&dir);
    post(app.clone(), "/api/refresh").await;

    let (status, json) = get(app.clone(), "/api/subagents?experience_level=wizard").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "invalid_filter");

    let (status, _) = get(app.clone(), "/api/subagents?sort_by=random").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = get(app, "/api/subagents?category=gardening").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "invalid_filter");
}

#[tokio::test]
async fn get_subagent_and_content() {
    let dir = TempDir::new().unwrap();
    let app = init_catalog(&dir);
    post(app.clone(), "/api/refresh").await;

    let (status, json) = get(app.clone(), "/api/subagents/api-designer").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], "api-designer");
    assert_eq!(json["technologies"], serde_json::json!(["React", "Node.js"]));
    assert_eq!(json["category"]["id"], "core-development");

    let (status, headers, body) = send(app.clone(), "GET", "/api/subagents/api-designer/content").await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers["content-type"].to_str().unwrap().starts_with("text/markdown"));
    assert!(String::from_utf8(body).unwrap().contains("name: api-designer"));

    let (status, json) = get(app.clone(), "/api/subagents/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "not_found");

    let (status, _) = get(app, "/api/subagents/nope/content").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn content_of_removed_file_is_404_after_refresh() {
    let dir = TempDir::new().unwrap();
    let app = init_catalog(&dir);
    post(app.clone(), "/api/refresh").await;

    std::fs::remove_file(
        dir.path().join("subagents/categories/03-infrastructure/devops-engineer.md"),
    )
    .unwrap();
    post(app.clone(), "/api/refresh").await;

    let (status, json) = get(app, "/api/subagents/devops-engineer/content").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "not_found");
}

#[tokio::test]
async fn summaries_and_index() {
    let dir = TempDir::new().unwrap();
    let app = init_catalog(&dir);
    post(app.clone(), "/api/refresh").await;

    let (status, json) = get(app.clone(), "/api/categories").await;
    assert_eq!(status, StatusCode::OK);
    let cats = json.as_array().unwrap();
    assert_eq!(cats.len(), 10);
    assert_eq!(cats[0]["id"], "core-development");
    assert_eq!(cats[0]["count"], 1);

    let (_, json) = get(app.clone(), "/api/technologies").await;
    assert_eq!(json.as_array().unwrap().len(), 4);

    let (status, json) = get(app, "/api/index").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["subagents"].as_array().unwrap().len(), 2);
    assert!(json["lastUpdate"].is_string());
}

#[tokio::test]
async fn cache_cleanup_and_clear() {
    let dir = TempDir::new().unwrap();
    let app = init_catalog(&dir);
    post(app.clone(), "/api/refresh").await;
    get(app.clone(), "/api/subagents").await;

    let (status, json) = post(app.clone(), "/api/cache/cleanup").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["removed"], 0);

    let (status, json) = request(app.clone(), "DELETE", "/api/cache").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cleared"], true);

    let (status, _) = get(app, "/api/index").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn refresh_without_source_is_503() {
    let dir = TempDir::new().unwrap();
    let catalog = Catalog::open(CatalogConfig::default().rooted(dir.path())).unwrap();
    let app = catalog_server::build_router(Arc::new(catalog));

    let (status, json) = post(app, "/api/refresh").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "source_unavailable");
}
