//! Stateless HTTP request builder for the Agri-Wealth API.
//!
//! # Design
//! `AgriClient` holds only its configuration and carries no mutable state
//! between calls. Each operation is a `build_*` method that produces an
//! `HttpRequest`; the response goes through `parse`, which returns the JSON
//! body unchanged or a normalized `ApiError`. The caller (or `ApiClient`)
//! executes the round-trip in between, keeping this layer deterministic.
//!
//! Authenticated operations take an explicit `&Session`.

use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::decode;
use crate::endpoints;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::multipart::{MultipartForm, UploadFile};
use crate::session::Session;
use crate::types::{
    CreateFolderRequest, ForgotPasswordRequest, LoginRequest, RefreshRequest, ResetPasswordRequest,
    SignupRequest, VerifyEmailRequest,
};

const JSON: &str = "application/json";

#[derive(Debug, Clone)]
pub struct AgriClient {
    config: ClientConfig,
}

impl AgriClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_config(ClientConfig::new(base_url))
    }

    pub fn with_config(config: ClientConfig) -> Result<Self, ApiError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.config.normalized_base_url())
    }

    // -- generic ----------------------------------------------------------

    /// JSON POST without authentication.
    pub fn build_post<P: Serialize + ?Sized>(&self, endpoint: &str, payload: &P) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_vec(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.url(endpoint),
            headers: vec![("Content-Type".to_string(), JSON.to_string())],
            body: Some(body),
            timeout: self.config.timeout(),
        })
    }

    /// GET with a bearer header when a session is given.
    pub fn build_get(&self, endpoint: &str, session: Option<&Session>) -> HttpRequest {
        let mut headers = vec![("Content-Type".to_string(), JSON.to_string())];
        if let Some(session) = session {
            headers.push(("Authorization".to_string(), session.bearer()));
        }
        HttpRequest {
            method: HttpMethod::Get,
            url: self.url(endpoint),
            headers,
            body: None,
            timeout: self.config.timeout(),
        }
    }

    /// Decode any response from this client.
    pub fn parse(&self, response: HttpResponse) -> Result<Value, ApiError> {
        decode::decode_response(response)
    }

    // -- auth -------------------------------------------------------------

    pub fn build_signup(&self, input: &SignupRequest) -> Result<HttpRequest, ApiError> {
        self.build_post(endpoints::SIGNUP, input)
    }

    pub fn build_login(&self, input: &LoginRequest) -> Result<HttpRequest, ApiError> {
        self.build_post(endpoints::LOGIN, input)
    }

    pub fn build_refresh(&self, input: &RefreshRequest) -> Result<HttpRequest, ApiError> {
        self.build_post(endpoints::REFRESH, input)
    }

    pub fn build_forgot_password(&self, input: &ForgotPasswordRequest) -> Result<HttpRequest, ApiError> {
        self.build_post(endpoints::FORGOT_PASSWORD, input)
    }

    pub fn build_reset_password(&self, input: &ResetPasswordRequest) -> Result<HttpRequest, ApiError> {
        self.build_post(endpoints::RESET_PASSWORD, input)
    }

    pub fn build_verify_email(&self, input: &VerifyEmailRequest) -> Result<HttpRequest, ApiError> {
        self.build_post(endpoints::VERIFY_EMAIL, input)
    }

    /// Logout is the one auth POST that carries the bearer header.
    pub fn build_logout(&self, session: &Session) -> HttpRequest {
        let mut request = self.authed(HttpMethod::Post, endpoints::LOGOUT, session);
        request.headers.push(("Content-Type".to_string(), JSON.to_string()));
        request.body = Some(b"{}".to_vec());
        request
    }

    // -- folders and files ------------------------------------------------

    pub fn build_create_folder(&self, project_id: &str, name: &str, session: &Session) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_vec(&CreateFolderRequest { name: name.to_string() })
            .map_err(|e| ApiError::Serialization(e.to_string()))?;
        let mut request = self.authed(HttpMethod::Post, &endpoints::project_folders(project_id), session);
        request.headers.push(("Content-Type".to_string(), JSON.to_string()));
        request.body = Some(body);
        Ok(request)
    }

    pub fn build_get_folders(&self, project_id: &str, session: &Session) -> HttpRequest {
        self.authed(HttpMethod::Get, &endpoints::project_folders(project_id), session)
    }

    /// Every folder visible to the session, across projects.
    pub fn build_list_folders(&self, session: &Session) -> HttpRequest {
        self.authed(HttpMethod::Get, endpoints::FOLDERS, session)
    }

    /// Multipart upload of `files` into `folder_id`, on the upload timeout.
    pub fn build_upload_files(&self, folder_id: &str, files: &[UploadFile], session: &Session) -> HttpRequest {
        let form = files
            .iter()
            .fold(MultipartForm::new().text("folder_id", folder_id), |form, file| {
                form.file("files", file)
            });
        let mut request = self.authed(HttpMethod::Post, endpoints::FILE_UPLOAD, session);
        request.headers.push(("Content-Type".to_string(), form.content_type()));
        request.body = Some(form.finish());
        request.timeout = self.config.upload_timeout();
        request
    }

    pub fn build_get_folder_files(&self, folder_id: &str, session: &Session) -> HttpRequest {
        self.authed(HttpMethod::Get, &endpoints::folder_files(folder_id), session)
    }

    pub fn build_delete_file(&self, file_id: &str, session: &Session) -> HttpRequest {
        self.authed(HttpMethod::Delete, &endpoints::file(file_id), session)
    }

    pub fn build_get_file_download_url(&self, file_id: &str, session: &Session) -> HttpRequest {
        self.authed(HttpMethod::Get, &endpoints::file_download(file_id), session)
    }

    pub fn build_get_file_preview_url(&self, file_id: &str, session: &Session) -> HttpRequest {
        self.authed(HttpMethod::Get, &endpoints::file(file_id), session)
    }

    fn authed(&self, method: HttpMethod, endpoint: &str, session: &Session) -> HttpRequest {
        HttpRequest {
            method,
            url: self.url(endpoint),
            headers: vec![
                ("accept".to_string(), JSON.to_string()),
                ("Authorization".to_string(), session.bearer()),
            ],
            body: None,
            timeout: self.config.timeout(),
        }
    }
}
