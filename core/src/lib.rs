//! Client core for the Agri-Wealth record-keeping API.
//!
//! # Overview
//! Two independent pieces sharing only the session token:
//! - `router`: the UI route table and the navigation guard that redirects
//!   based on whether a token is stored.
//! - the API client: `client` builds `HttpRequest` values, `transport`
//!   executes them, and `decode` turns responses into JSON payloads or a
//!   normalized `ApiError`. `api::ApiClient` chains the three.
//!
//! # Design
//! - `AgriClient` is stateless apart from its configuration; every
//!   authenticated operation takes an explicit `&Session`.
//! - Requests carry their own timeout, so concurrent calls never share a
//!   timer or any other mutable state.
//! - Payload types are defined independently from the mock-server crate;
//!   integration tests catch schema drift.

pub mod api;
pub mod client;
pub mod config;
pub mod decode;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod multipart;
pub mod router;
pub mod session;
pub mod transport;
pub mod types;

pub use api::ApiClient;
pub use client::AgriClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use multipart::UploadFile;
pub use router::{guard, resolve, NavigationDecision, Navigator, RouteDescriptor, View, ROUTES};
pub use session::{MemoryTokenStore, Session, SessionStore, StorageError, TokenStore};
pub use transport::{Transport, UreqTransport};
pub use types::{
    CreateFolderRequest, ForgotPasswordRequest, LoginRequest, RefreshRequest, ResetPasswordRequest,
    SignupRequest, VerifyEmailRequest,
};
