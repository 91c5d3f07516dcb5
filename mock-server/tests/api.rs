use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::app;
use serde_json::Value;
use tower::{Service, ServiceExt};

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str, token: Option<&str>) -> Request<String> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body.to_string()).unwrap()
}

fn authed(method: &str, uri: &str, token: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::ACCEPT, "application/json")
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .body(String::new())
        .unwrap()
}

fn multipart_request(folder_id: &str, files: &[(&str, &str)], token: &str) -> Request<String> {
    let mut body = format!(
        "--BOUNDARY\r\nContent-Disposition: form-data; name=\"folder_id\"\r\n\r\n{folder_id}\r\n"
    );
    for (name, contents) in files {
        body.push_str(&format!(
            "--BOUNDARY\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: text/plain\r\n\r\n{contents}\r\n"
        ));
    }
    body.push_str("--BOUNDARY--\r\n");
    Request::builder()
        .method("POST")
        .uri("/files/upload")
        .header(http::header::CONTENT_TYPE, "multipart/form-data; boundary=BOUNDARY")
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .body(body)
        .unwrap()
}

const SIGNUP: &str = r#"{"email":"ada@farm.example","password":"Harvest2025","full_name":"Ada Farmer"}"#;
const LOGIN: &str = r#"{"email":"ada@farm.example","password":"Harvest2025"}"#;

/// Drive several requests through one app instance so state persists.
async fn call(app: &mut axum::routing::RouterIntoService<String>, request: Request<String>) -> axum::response::Response {
    ServiceExt::ready(app).await.unwrap().call(request).await.unwrap()
}

// --- auth ---

#[tokio::test]
async fn signup_returns_201_without_password() {
    let resp = app()
        .oneshot(json_request("POST", "/auth/signup", SIGNUP, None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["user"]["email"], "ada@farm.example");
    assert!(body["user"].get("password").is_none());
    assert!(body["verification_token"].is_string());
}

#[tokio::test]
async fn signup_invalid_email_uses_validation_shape() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/auth/signup",
            r#"{"email":"ada.farm.example","password":"Harvest2025","full_name":"Ada"}"#,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(resp).await;
    assert_eq!(body["error_code"], "VALIDATION_ERROR");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("value is not a valid email address"));
}

#[tokio::test]
async fn duplicate_signup_returns_409() {
    let mut app = app().into_service();
    let resp = call(&mut app, json_request("POST", "/auth/signup", SIGNUP, None)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = call(&mut app, json_request("POST", "/auth/signup", SIGNUP, None)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "EMAIL_EXISTS");
}

#[tokio::test]
async fn wrong_password_returns_nested_401() {
    let mut app = app().into_service();
    call(&mut app, json_request("POST", "/auth/signup", SIGNUP, None)).await;

    let resp = call(
        &mut app,
        json_request(
            "POST",
            "/auth/login",
            r#"{"email":"ada@farm.example","password":"wrong-password"}"#,
            None,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["detail"]["error"]["message"], "Invalid email or password");
}

#[tokio::test]
async fn folders_require_bearer() {
    let resp = app()
        .oneshot(Request::builder().uri("/folders").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["message"], "Not authenticated");
}

#[tokio::test]
async fn unknown_token_is_rejected() {
    let resp = app().oneshot(authed("GET", "/folders", "nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_reset_flow() {
    let mut app = app().into_service();
    call(&mut app, json_request("POST", "/auth/signup", SIGNUP, None)).await;

    let resp = call(
        &mut app,
        json_request("POST", "/auth/forgot-password", r#"{"email":"ada@farm.example"}"#, None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let reset_token = body_json(resp).await["reset_token"].as_str().unwrap().to_string();

    let resp = call(
        &mut app,
        json_request(
            "POST",
            "/auth/reset-password",
            &format!(r#"{{"token":"{reset_token}","new_password":"NewHarvest2026"}}"#),
            None,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = call(&mut app, json_request("POST", "/auth/login", LOGIN, None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = call(
        &mut app,
        json_request(
            "POST",
            "/auth/login",
            r#"{"email":"ada@farm.example","password":"NewHarvest2026"}"#,
            None,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

// --- full folder/file lifecycle ---

#[tokio::test]
async fn folder_and_file_lifecycle() {
    let mut app = app().into_service();

    let resp = call(&mut app, json_request("POST", "/auth/signup", SIGNUP, None)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = call(&mut app, json_request("POST", "/auth/login", LOGIN, None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let token = body_json(resp).await["access_token"].as_str().unwrap().to_string();

    // create
    let resp = call(
        &mut app,
        json_request("POST", "/folders/proj-1", r#"{"name":"Poultry"}"#, Some(&token)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let folder = body_json(resp).await;
    assert_eq!(folder["name"], "Poultry");
    let folder_id = folder["id"].as_str().unwrap().to_string();

    // blank names are validation errors
    let resp = call(
        &mut app,
        json_request("POST", "/folders/proj-1", r#"{"name":"  "}"#, Some(&token)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // list by project and overall
    let resp = call(&mut app, authed("GET", "/folders/proj-1", &token)).await;
    assert_eq!(body_json(resp).await["folders"].as_array().unwrap().len(), 1);
    let resp = call(&mut app, authed("GET", "/folders/other", &token)).await;
    assert!(body_json(resp).await["folders"].as_array().unwrap().is_empty());
    let resp = call(&mut app, authed("GET", "/folders", &token)).await;
    assert_eq!(body_json(resp).await["folders"].as_array().unwrap().len(), 1);

    // upload
    let resp = call(
        &mut app,
        multipart_request(&folder_id, &[("eggs.txt", "120 eggs"), ("feed.txt", "40kg")], &token),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let uploaded = body_json(resp).await["uploaded"].as_array().unwrap().clone();
    assert_eq!(uploaded.len(), 2);
    assert_eq!(uploaded[0]["file_name"], "eggs.txt");
    assert_eq!(uploaded[0]["size"], 8);
    let file_id = uploaded[0]["id"].as_str().unwrap().to_string();

    // folder files
    let resp = call(&mut app, authed("GET", &format!("/files/folder/{folder_id}"), &token)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["files"].as_array().unwrap().len(), 2);

    // preview and download
    let resp = call(&mut app, authed("GET", &format!("/files/{file_id}"), &token)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_json(resp).await["preview_url"].as_str().unwrap().contains(&file_id));

    let resp = call(&mut app, authed("GET", &format!("/files/download/{file_id}"), &token)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_json(resp).await["download_url"].as_str().unwrap().ends_with("eggs.txt"));

    // delete, then it is gone
    let resp = call(&mut app, authed("DELETE", &format!("/files/{file_id}"), &token)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = call(&mut app, authed("GET", &format!("/files/{file_id}"), &token)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert_eq!(body["detail"]["error"]["message"], "File not found");

    // logout revokes the token
    let resp = call(&mut app, json_request("POST", "/auth/logout", "{}", Some(&token))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = call(&mut app, authed("GET", "/folders", &token)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn upload_to_unknown_folder_is_404() {
    let mut app = app().into_service();
    call(&mut app, json_request("POST", "/auth/signup", SIGNUP, None)).await;
    let resp = call(&mut app, json_request("POST", "/auth/login", LOGIN, None)).await;
    let token = body_json(resp).await["access_token"].as_str().unwrap().to_string();

    let resp = call(
        &mut app,
        multipart_request("00000000-0000-0000-0000-000000000000", &[("a.txt", "a")], &token),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
