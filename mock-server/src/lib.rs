use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Clone, Debug, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub email_verified: bool,
    #[serde(skip)]
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Folder {
    pub id: Uuid,
    pub project_id: String,
    pub name: String,
    #[serde(skip)]
    pub owner: Uuid,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: Uuid,
    pub folder_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub size: usize,
}

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone_number: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

#[derive(Deserialize)]
pub struct CreateFolderRequest {
    pub name: String,
}

/// In-memory backend state. Tokens map to the email of their owner.
#[derive(Default)]
pub struct Backend {
    users: HashMap<String, User>,
    access_tokens: HashMap<String, String>,
    refresh_tokens: HashMap<String, String>,
    verify_tokens: HashMap<String, String>,
    reset_tokens: HashMap<String, String>,
    folders: HashMap<Uuid, Folder>,
    files: HashMap<Uuid, StoredFile>,
}

pub type Db = Arc<RwLock<Backend>>;

/// Failures rendered in the inconsistent body shapes the real backend uses.
#[derive(Debug)]
pub enum Failure {
    Validation(String),
    InvalidCredentials,
    InvalidToken(&'static str),
    Unauthenticated,
    EmailTaken,
    NotFound(&'static str),
    BadRequest(String),
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Failure::Validation(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({"error_code": "VALIDATION_ERROR", "message": message}),
            ),
            Failure::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                json!({"detail": {"error": {"code": "INVALID_CREDENTIALS", "message": "Invalid email or password"}}}),
            ),
            Failure::InvalidToken(message) => (
                StatusCode::UNAUTHORIZED,
                json!({"detail": {"error": {"code": "INVALID_TOKEN", "message": message}}}),
            ),
            Failure::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                json!({"error": {"code": "UNAUTHORIZED", "message": "Not authenticated"}}),
            ),
            Failure::EmailTaken => (
                StatusCode::CONFLICT,
                json!({"error": {"code": "EMAIL_EXISTS", "message": "An account with this email already exists"}}),
            ),
            Failure::NotFound(what) => (
                StatusCode::NOT_FOUND,
                json!({"detail": {"error": {"code": "NOT_FOUND", "message": format!("{what} not found")}}}),
            ),
            Failure::BadRequest(message) => (StatusCode::BAD_REQUEST, json!({"message": message})),
        };
        (status, Json(body)).into_response()
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Backend::default()));
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
        .route("/auth/verify-email", post(verify_email))
        .route("/folders", get(list_folders))
        .route("/folders/{project_id}", get(project_folders).post(create_folder))
        .route("/files/upload", post(upload_files))
        .route("/files/folder/{folder_id}", get(folder_files))
        .route("/files/download/{file_id}", get(download_url))
        .route("/files/{file_id}", get(preview_url).delete(delete_file))
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn new_token() -> String {
    Uuid::new_v4().simple().to_string()
}

fn validate_email(email: &str) -> Result<(), Failure> {
    let reason = match email.split_once('@') {
        None => Some("An email address must have an @-sign."),
        Some((_, domain)) if domain.contains('@') => Some("An email address must have exactly one @-sign."),
        Some((local, _)) if local.is_empty() => Some("There must be something before the @-sign."),
        Some((_, domain)) if !domain.contains('.') => Some("The part after the @-sign is not valid."),
        Some(_) => None,
    };
    match reason {
        Some(reason) => Err(Failure::Validation(format!(
            "body.email: value is not a valid email address: {reason}"
        ))),
        None => Ok(()),
    }
}

fn validate_password(password: &str, field: &str) -> Result<(), Failure> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Failure::Validation(format!(
            "body.{field}: String should have at least {MIN_PASSWORD_LEN} characters (password too short)"
        )));
    }
    Ok(())
}

fn validate_phone(phone: Option<&str>) -> Result<(), Failure> {
    match phone {
        Some(p) if !p.trim_start_matches('+').chars().all(|c| c.is_ascii_digit()) || p.len() < 7 => Err(
            Failure::Validation("body.phone_number: invalid phone number format".to_string()),
        ),
        _ => Ok(()),
    }
}

/// The user owning the bearer token in `headers`.
fn authenticate(db: &Backend, headers: &HeaderMap) -> Result<User, Failure> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(Failure::Unauthenticated)?;
    db.access_tokens
        .get(token)
        .and_then(|email| db.users.get(email))
        .cloned()
        .ok_or(Failure::InvalidToken("Token is invalid or expired"))
}

fn owned_folder(db: &Backend, user: &User, folder_id: Uuid) -> Result<Folder, Failure> {
    db.folders
        .get(&folder_id)
        .filter(|f| f.owner == user.id)
        .cloned()
        .ok_or(Failure::NotFound("Folder"))
}

fn owned_file(db: &Backend, user: &User, file_id: Uuid) -> Result<StoredFile, Failure> {
    let file = db.files.get(&file_id).cloned().ok_or(Failure::NotFound("File"))?;
    owned_folder(db, user, file.folder_id).map_err(|_| Failure::NotFound("File"))?;
    Ok(file)
}

fn parse_id(raw: &str, what: &'static str) -> Result<Uuid, Failure> {
    raw.parse().map_err(|_| Failure::NotFound(what))
}

fn issue_tokens(db: &mut Backend, email: &str) -> Value {
    let access = new_token();
    let refresh = new_token();
    db.access_tokens.insert(access.clone(), email.to_string());
    db.refresh_tokens.insert(refresh.clone(), email.to_string());
    json!({"access_token": access, "refresh_token": refresh, "token_type": "bearer"})
}

// --- auth ---

async fn signup(
    State(db): State<Db>,
    Json(input): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Value>), Failure> {
    validate_email(&input.email)?;
    validate_password(&input.password, "password")?;
    validate_phone(input.phone_number.as_deref())?;

    let mut db = db.write().await;
    let email = input.email.to_lowercase();
    if db.users.contains_key(&email) {
        return Err(Failure::EmailTaken);
    }
    let user = User {
        id: Uuid::new_v4(),
        email: email.clone(),
        full_name: input.full_name,
        phone_number: input.phone_number,
        email_verified: false,
        password: input.password,
    };
    let verification_token = new_token();
    db.verify_tokens.insert(verification_token.clone(), email.clone());
    db.users.insert(email, user.clone());
    info!(user_id = %user.id, "account created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Account created. Check your email to verify your account.",
            "user": user,
            "verification_token": verification_token,
        })),
    ))
}

async fn login(State(db): State<Db>, Json(input): Json<LoginRequest>) -> Result<Json<Value>, Failure> {
    let mut db = db.write().await;
    let email = input.email.to_lowercase();
    let user = db
        .users
        .get(&email)
        .filter(|u| u.password == input.password)
        .cloned()
        .ok_or(Failure::InvalidCredentials)?;
    let mut body = issue_tokens(&mut db, &email);
    body["user"] = json!(user);
    info!(user_id = %user.id, "login");
    Ok(Json(body))
}

async fn refresh(State(db): State<Db>, Json(input): Json<RefreshRequest>) -> Result<Json<Value>, Failure> {
    let mut db = db.write().await;
    let email = db
        .refresh_tokens
        .remove(&input.refresh_token)
        .ok_or(Failure::InvalidToken("Invalid refresh token"))?;
    Ok(Json(issue_tokens(&mut db, &email)))
}

async fn logout(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Value>, Failure> {
    let mut db = db.write().await;
    let user = authenticate(&db, &headers)?;
    db.access_tokens.retain(|_, email| *email != user.email);
    db.refresh_tokens.retain(|_, email| *email != user.email);
    Ok(Json(json!({"message": "Logged out successfully"})))
}

async fn forgot_password(
    State(db): State<Db>,
    Json(input): Json<ForgotPasswordRequest>,
) -> Result<Json<Value>, Failure> {
    validate_email(&input.email)?;
    let mut db = db.write().await;
    let email = input.email.to_lowercase();
    let mut body = json!({"message": "If the account exists, a password reset link has been sent"});
    if db.users.contains_key(&email) {
        let token = new_token();
        db.reset_tokens.insert(token.clone(), email);
        body["reset_token"] = json!(token);
    }
    Ok(Json(body))
}

async fn reset_password(
    State(db): State<Db>,
    Json(input): Json<ResetPasswordRequest>,
) -> Result<Json<Value>, Failure> {
    validate_password(&input.new_password, "new_password")?;
    let mut db = db.write().await;
    let email = db
        .reset_tokens
        .remove(&input.token)
        .ok_or_else(|| Failure::BadRequest("Reset token is invalid or has expired".to_string()))?;
    if let Some(user) = db.users.get_mut(&email) {
        user.password = input.new_password;
    }
    db.access_tokens.retain(|_, owner| *owner != email);
    Ok(Json(json!({"message": "Password has been reset"})))
}

async fn verify_email(
    State(db): State<Db>,
    Json(input): Json<VerifyEmailRequest>,
) -> Result<Json<Value>, Failure> {
    let mut db = db.write().await;
    let email = db
        .verify_tokens
        .remove(&input.token)
        .ok_or_else(|| Failure::BadRequest("Verification token is invalid".to_string()))?;
    if let Some(user) = db.users.get_mut(&email) {
        user.email_verified = true;
    }
    Ok(Json(json!({"message": "Email verified"})))
}

// --- folders ---

async fn list_folders(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Value>, Failure> {
    let db = db.read().await;
    let user = authenticate(&db, &headers)?;
    let folders: Vec<&Folder> = db.folders.values().filter(|f| f.owner == user.id).collect();
    Ok(Json(json!({"folders": folders})))
}

async fn project_folders(
    State(db): State<Db>,
    Path(project_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, Failure> {
    let db = db.read().await;
    let user = authenticate(&db, &headers)?;
    let folders: Vec<&Folder> = db
        .folders
        .values()
        .filter(|f| f.owner == user.id && f.project_id == project_id)
        .collect();
    Ok(Json(json!({"project_id": project_id, "folders": folders})))
}

async fn create_folder(
    State(db): State<Db>,
    Path(project_id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<Folder>), Failure> {
    let mut db = db.write().await;
    let user = authenticate(&db, &headers)?;
    let name = input.name.trim();
    if name.is_empty() {
        return Err(Failure::Validation(
            "body.name: String should have at least 1 character".to_string(),
        ));
    }
    let folder = Folder {
        id: Uuid::new_v4(),
        project_id,
        name: name.to_string(),
        owner: user.id,
    };
    db.folders.insert(folder.id, folder.clone());
    Ok((StatusCode::CREATED, Json(folder)))
}

// --- files ---

async fn upload_files(
    State(db): State<Db>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), Failure> {
    let user = {
        let db = db.read().await;
        authenticate(&db, &headers)?
    };

    let mut folder_id = None;
    let mut uploads = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Failure::BadRequest(e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("folder_id") => {
                let raw = field.text().await.map_err(|e| Failure::BadRequest(e.to_string()))?;
                folder_id = Some(parse_id(&raw, "Folder")?);
            }
            Some("files") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(|e| Failure::BadRequest(e.to_string()))?;
                uploads.push((file_name, content_type, bytes.len()));
            }
            _ => {}
        }
    }

    let folder_id = folder_id.ok_or_else(|| Failure::Validation("body.folder_id: Field required".to_string()))?;
    if uploads.is_empty() {
        return Err(Failure::Validation("body.files: Field required".to_string()));
    }

    let mut db = db.write().await;
    owned_folder(&db, &user, folder_id)?;
    let stored: Vec<StoredFile> = uploads
        .into_iter()
        .map(|(file_name, content_type, size)| StoredFile {
            id: Uuid::new_v4(),
            folder_id,
            file_name,
            content_type,
            size,
        })
        .collect();
    for file in &stored {
        db.files.insert(file.id, file.clone());
    }
    info!(%folder_id, count = stored.len(), "files uploaded");
    Ok((StatusCode::CREATED, Json(json!({"uploaded": stored}))))
}

async fn folder_files(
    State(db): State<Db>,
    Path(folder_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, Failure> {
    let db = db.read().await;
    let user = authenticate(&db, &headers)?;
    let folder = owned_folder(&db, &user, parse_id(&folder_id, "Folder")?)?;
    let files: Vec<&StoredFile> = db.files.values().filter(|f| f.folder_id == folder.id).collect();
    Ok(Json(json!({"folder": folder, "files": files})))
}

async fn preview_url(
    State(db): State<Db>,
    Path(file_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, Failure> {
    let db = db.read().await;
    let user = authenticate(&db, &headers)?;
    let file = owned_file(&db, &user, parse_id(&file_id, "File")?)?;
    Ok(Json(json!({
        "file": file,
        "preview_url": format!("https://storage.agri-wealth.test/preview/{}", file.id),
    })))
}

async fn download_url(
    State(db): State<Db>,
    Path(file_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, Failure> {
    let db = db.read().await;
    let user = authenticate(&db, &headers)?;
    let file = owned_file(&db, &user, parse_id(&file_id, "File")?)?;
    Ok(Json(json!({
        "download_url": format!("https://storage.agri-wealth.test/files/{}/{}", file.id, file.file_name),
        "expires_in": 3600,
    })))
}

async fn delete_file(
    State(db): State<Db>,
    Path(file_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, Failure> {
    let mut db = db.write().await;
    let user = authenticate(&db, &headers)?;
    let file = owned_file(&db, &user, parse_id(&file_id, "File")?)?;
    db.files.remove(&file.id);
    Ok(Json(json!({"message": "File deleted", "id": file.id})))
}
