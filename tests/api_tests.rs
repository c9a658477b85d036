use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use ladle::config::Config;
use serde_json::{Value, json};
use tower::ServiceExt;

const BOUNDARY: &str = "ladle-test-boundary";

async fn spawn_app() -> Router {
    let id = uuid::Uuid::new_v4();
    let mut config = Config::default();
    config.general.database_path = format!(
        "sqlite:{}",
        std::env::temp_dir()
            .join(format!("ladle-api-test-{id}.db"))
            .display()
    );
    config.storage.root_path = std::env::temp_dir()
        .join(format!("ladle-api-images-{id}"))
        .display()
        .to_string();

    let state = ladle::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    ladle::api::router(state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_request(uri: &str, recipe: Option<&Value>, image: (&str, &[u8])) -> Request<Body> {
    let mut body = Vec::new();

    if let Some(recipe) = recipe {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"recipe\"\r\n\r\n{recipe}\r\n"
            )
            .as_bytes(),
        );
    }

    let (filename, bytes) = image;
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn recipe_body(title: &str, difficulty: &str, category_ids: &[&str], tag_ids: &[&str]) -> Value {
    json!({
        "title": title,
        "description": "A test recipe",
        "ingredients": [{ "name": "rice", "amount": 1.5, "unit": "cup" }],
        "instructions": ["Rinse", "Simmer"],
        "cooking_time": 20,
        "servings": 2,
        "difficulty": difficulty,
        "category_ids": category_ids,
        "tag_ids": tag_ids,
    })
}

async fn create(app: &Router, uri: &str, body: Value) -> Value {
    let (status, json) = send(app, json_request("POST", uri, &body)).await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["data"].clone()
}

fn titles(json: &Value) -> Vec<String> {
    json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = spawn_app().await;

    let (status, json) = send(&app, get("/api/system/health/live")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "alive");

    let (status, json) = send(&app, get("/api/system/health/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["ready"], true);
    assert_eq!(json["data"]["checks"]["database"], true);
}

#[tokio::test]
async fn test_reference_data_endpoints() {
    let app = spawn_app().await;

    create(&app, "/api/categories", json!({ "name": "Soup" })).await;
    let breakfast = create(
        &app,
        "/api/categories",
        json!({ "name": "Breakfast", "description": "Morning" }),
    )
    .await;
    assert_eq!(breakfast["description"], "Morning");

    let (status, json) = send(
        &app,
        json_request("POST", "/api/categories", &json!({ "name": "soup" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["success"], false);

    let (status, json) = send(&app, get("/api/categories")).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Breakfast", "Soup"]);

    create(&app, "/api/tags", json!({ "name": "vegan" })).await;
    let (status, _) = send(
        &app,
        json_request("POST", "/api/tags", &json!({ "name": " " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, json) = send(&app, get("/api/tags")).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_recipe_lifecycle() {
    let app = spawn_app().await;

    let created = create(
        &app,
        "/api/recipes",
        recipe_body("Risotto", "hard", &[], &[]),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["difficulty"], "hard");
    assert_eq!(created["categories"], json!([]));
    assert!(created["created_at"].is_string());

    let (status, json) = send(&app, get(&format!("/api/recipes/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["title"], "Risotto");
    assert_eq!(json["data"]["ingredients"][0]["unit"], "cup");

    let (status, json) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/recipes/{id}"),
            &recipe_body("Mushroom Risotto", "medium", &[], &[]),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["title"], "Mushroom Risotto");
    assert_eq!(json["data"]["created_at"], created["created_at"]);

    let (status, json) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/api/recipes/{id}"),
            &json!({ "servings": 3 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["servings"], 3);
    assert_eq!(json["data"]["title"], "Mushroom Risotto");
    assert_eq!(json["data"]["cooking_time"], 20);
    assert_eq!(json["data"]["ingredients"][0]["name"], "rice");

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/recipes/{id}"),
            &json!({ "titel": "typo" }),
        ),
    )
    .await;
    assert!(status.is_client_error());

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/recipes/{id}"))
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["id"], id);

    let (status, json) = send(&app, get(&format!("/api/recipes/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_create_rejects_invalid_payloads() {
    let app = spawn_app().await;

    let (status, json) = send(
        &app,
        json_request("POST", "/api/recipes", &recipe_body("", "easy", &[], &[])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Title"));

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/recipes",
            &recipe_body("Toast", "easy", &["no-such-category"], &[]),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            "/api/recipes/missing",
            &recipe_body("Toast", "easy", &[], &[]),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_filters() {
    let app = spawn_app().await;

    let dinner = create(&app, "/api/categories", json!({ "name": "Dinner" })).await;
    let italian = create(&app, "/api/categories", json!({ "name": "Italian" })).await;
    let quick = create(&app, "/api/tags", json!({ "name": "quick" })).await;
    let dinner = dinner["id"].as_str().unwrap();
    let italian = italian["id"].as_str().unwrap();
    let quick = quick["id"].as_str().unwrap();

    create(
        &app,
        "/api/recipes",
        recipe_body("Lasagna", "hard", &[dinner, italian], &[]),
    )
    .await;
    create(
        &app,
        "/api/recipes",
        recipe_body("Chili", "medium", &[dinner], &[quick]),
    )
    .await;
    create(
        &app,
        "/api/recipes",
        recipe_body("Bruschetta", "easy", &[italian], &[quick]),
    )
    .await;

    let (status, json) = send(&app, get("/api/recipes")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&json), vec!["Bruschetta", "Chili", "Lasagna"]);

    let (_, json) = send(&app, get("/api/recipes?q=LAS")).await;
    assert_eq!(titles(&json), vec!["Lasagna"]);

    let (_, json) = send(
        &app,
        get(&format!("/api/recipes?categories={dinner},{italian}")),
    )
    .await;
    assert_eq!(titles(&json), vec!["Lasagna"]);

    let (_, json) = send(
        &app,
        get(&format!("/api/recipes?categories={dinner}&tags={quick}")),
    )
    .await;
    assert_eq!(titles(&json), vec!["Chili"]);

    let (_, json) = send(&app, get("/api/recipes?difficulty=easy")).await;
    assert_eq!(titles(&json), vec!["Bruschetta"]);

    let (status, json) = send(&app, get("/api/recipes?difficulty=")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&json).len(), 3);

    let (status, _) = send(&app, get("/api/recipes?difficulty=extreme")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_image_upload_endpoints() {
    let app = spawn_app().await;

    let form = recipe_body("Pancakes", "easy", &[], &[]);
    let (status, json) = send(
        &app,
        multipart_request(
            "/api/recipes/with-image",
            Some(&form),
            ("stack.png", b"\x89PNG pancakes"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    let id = json["data"]["id"].as_str().unwrap().to_string();
    let first_url = json["data"]["image_url"].as_str().unwrap().to_string();
    assert!(first_url.starts_with("/images/"));

    let (status, bytes) = {
        let response = app.clone().oneshot(get(&first_url)).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body)
    };
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&bytes[..], b"\x89PNG pancakes");

    let (status, json) = send(
        &app,
        multipart_request(
            &format!("/api/recipes/{id}/image"),
            None,
            ("better.jpg", b"jpeg bytes"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    let second_url = json["data"]["image_url"].as_str().unwrap();
    assert_ne!(second_url, first_url);
    assert!(second_url.ends_with(".jpg"));

    let response = app.clone().oneshot(get(&first_url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        multipart_request(
            &format!("/api/recipes/{id}/image"),
            None,
            ("notes.txt", b"not an image"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        multipart_request("/api/recipes/missing/image", None, ("a.png", b"png")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sweep_task_endpoint() {
    let app = spawn_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/system/tasks/sweep")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["scanned"], 0);
    assert_eq!(json["data"]["deleted"], 0);
}

#[tokio::test]
async fn test_metrics_endpoint_without_recorder() {
    let app = spawn_app().await;

    let response = app.clone().oneshot(get("/api/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("Metrics not enabled"));
}
