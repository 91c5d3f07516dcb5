//! One-call-per-operation client: build, execute, decode.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::client::AgriClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::multipart::UploadFile;
use crate::session::{Session, SessionStore, TokenStore};
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    ForgotPasswordRequest, LoginRequest, RefreshRequest, ResetPasswordRequest, SignupRequest,
    VerifyEmailRequest,
};

/// `AgriClient` paired with a `Transport`.
///
/// Calls share no mutable state, so one `ApiClient` can serve several
/// threads at once; each call is bounded by its own timeout.
#[derive(Clone)]
pub struct ApiClient<T: Transport = UreqTransport> {
    client: AgriClient,
    transport: T,
}

impl ApiClient<UreqTransport> {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        Ok(Self::with_transport(AgriClient::with_config(config)?, UreqTransport::new()))
    }

    /// Configuration from `AGRI_API_*` environment variables.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::new(ClientConfig::from_env()?)
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn with_transport(client: AgriClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn requests(&self) -> &AgriClient {
        &self.client
    }

    fn send(&self, request: HttpRequest) -> Result<Value, ApiError> {
        let response = self.transport.execute(request)?;
        self.client.parse(response)
    }

    pub fn post<P: Serialize + ?Sized>(&self, endpoint: &str, payload: &P) -> Result<Value, ApiError> {
        self.send(self.client.build_post(endpoint, payload)?)
    }

    pub fn get(&self, endpoint: &str, session: Option<&Session>) -> Result<Value, ApiError> {
        self.send(self.client.build_get(endpoint, session))
    }

    pub fn signup(&self, input: &SignupRequest) -> Result<Value, ApiError> {
        self.send(self.client.build_signup(input)?)
    }

    pub fn login(&self, input: &LoginRequest) -> Result<Value, ApiError> {
        self.send(self.client.build_login(input)?)
    }

    /// Log in and persist the returned access token.
    pub fn login_and_store<S: TokenStore>(
        &self,
        input: &LoginRequest,
        sessions: &SessionStore<S>,
    ) -> Result<Session, ApiError> {
        let body = self.login(input)?;
        let session = Session::from_login_response(&body)
            .ok_or_else(|| ApiError::Deserialization("login response has no access_token".to_string()))?;
        sessions.save(&session)?;
        Ok(session)
    }

    pub fn refresh(&self, input: &RefreshRequest) -> Result<Value, ApiError> {
        self.send(self.client.build_refresh(input)?)
    }

    pub fn forgot_password(&self, input: &ForgotPasswordRequest) -> Result<Value, ApiError> {
        self.send(self.client.build_forgot_password(input)?)
    }

    pub fn reset_password(&self, input: &ResetPasswordRequest) -> Result<Value, ApiError> {
        self.send(self.client.build_reset_password(input)?)
    }

    pub fn verify_email(&self, input: &VerifyEmailRequest) -> Result<Value, ApiError> {
        self.send(self.client.build_verify_email(input)?)
    }

    /// Revoke the session server-side, then remove the stored token.
    ///
    /// The token is removed whatever the server answers. A server failure
    /// wins over a storage failure; otherwise a token that could not be
    /// removed is reported as `ApiError::Storage`.
    pub fn logout<S: TokenStore>(&self, session: &Session, sessions: &SessionStore<S>) -> Result<Value, ApiError> {
        let result = self.send(self.client.build_logout(session));
        match (result, sessions.clear()) {
            (result, Ok(())) => result,
            (Ok(_), Err(e)) => Err(ApiError::Storage(e)),
            (Err(err), Err(e)) => {
                warn!(error = %e, "failed to remove stored token on logout");
                Err(err)
            }
        }
    }

    pub fn create_folder(&self, project_id: &str, name: &str, session: &Session) -> Result<Value, ApiError> {
        self.send(self.client.build_create_folder(project_id, name, session)?)
    }

    pub fn get_folders(&self, project_id: &str, session: &Session) -> Result<Value, ApiError> {
        self.send(self.client.build_get_folders(project_id, session))
    }

    pub fn list_folders(&self, session: &Session) -> Result<Value, ApiError> {
        self.send(self.client.build_list_folders(session))
    }

    pub fn upload_files(&self, folder_id: &str, files: &[UploadFile], session: &Session) -> Result<Value, ApiError> {
        self.send(self.client.build_upload_files(folder_id, files, session))
    }

    pub fn get_folder_files(&self, folder_id: &str, session: &Session) -> Result<Value, ApiError> {
        self.send(self.client.build_get_folder_files(folder_id, session))
    }

    pub fn delete_file(&self, file_id: &str, session: &Session) -> Result<Value, ApiError> {
        self.send(self.client.build_delete_file(file_id, session))
    }

    pub fn get_file_download_url(&self, file_id: &str, session: &Session) -> Result<Value, ApiError> {
        self.send(self.client.build_get_file_download_url(file_id, session))
    }

    pub fn get_file_preview_url(&self, file_id: &str, session: &Session) -> Result<Value, ApiError> {
        self.send(self.client.build_get_file_preview_url(file_id, session))
    }
}
