//! Google Drive session.
//!
//! A [`DriveSession`] is created by [`DriveSession::initialize`], which checks
//! the bearer token against the Drive `about` endpoint and validates the
//! account profile. Every upload goes through the session handle the caller
//! holds; nothing is cached process-wide. HTTP is behind [`DriveTransport`]
//! so the session logic runs against an in-memory transport in tests.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::config::DriveConfig;
use crate::models::DocumentKind;

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
const BOUNDARY_BASE: &str = "rfp-report-part";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("Drive is not configured: {0}")]
    NotConfigured(String),

    #[error("Drive rejected the credentials ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("Drive request failed ({status}): {message}")]
    Http { status: u16, message: String },

    #[error("Drive transport error: {0}")]
    Transport(String),

    #[error("invalid Drive profile: {0}")]
    InvalidProfile(String),

    #[error("unexpected Drive response: {0}")]
    Decode(String),

    #[error("cannot read {path}: {message}")]
    File { path: String, message: String },
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Sends one HTTP request. Implementations must not retry.
pub trait DriveTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, DriveError>;
}

/// Blocking `reqwest` transport with a per-request timeout.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, DriveError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rfp-report/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DriveError::Transport(e.to_string()))?;
        Ok(ReqwestTransport { client })
    }
}

impl DriveTransport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, DriveError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let response = builder
            .send()
            .map_err(|e| DriveError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| DriveError::Transport(e.to_string()))?
            .to_vec();
        Ok(HttpResponse { status, body })
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// The signed-in Drive account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveProfile {
    pub id: String,
    pub display_name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
struct AboutResponse {
    user: Option<AboutUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AboutUser {
    permission_id: Option<String>,
    display_name: Option<String>,
    email_address: Option<String>,
}

impl DriveProfile {
    fn from_about(about: AboutResponse) -> Result<Self, DriveError> {
        let user = about
            .user
            .ok_or_else(|| DriveError::InvalidProfile("response has no user".into()))?;

        let id = user.permission_id.unwrap_or_default();
        if id.trim().is_empty() {
            return Err(DriveError::InvalidProfile("missing account id".into()));
        }
        let email = user.email_address.unwrap_or_default();
        if !is_plausible_email(&email) {
            return Err(DriveError::InvalidProfile(format!("bad email address {email:?}")));
        }
        let display_name = match user.display_name {
            Some(name) if !name.trim().is_empty() => name,
            _ => email.clone(),
        };
        Ok(DriveProfile {
            id,
            display_name,
            email,
        })
    }
}

fn is_plausible_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !s.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}

/// An authenticated Drive handle.
pub struct DriveSession<T: DriveTransport> {
    transport: T,
    token: String,
    folder_id: String,
    api_base: String,
    upload_base: String,
    profile: DriveProfile,
}

impl<T: DriveTransport> DriveSession<T> {
    /// Verifies the configured token and returns a session for its account.
    pub fn initialize(config: &DriveConfig, transport: T) -> Result<Self, DriveError> {
        let token = config
            .access_token
            .clone()
            .ok_or_else(|| DriveError::NotConfigured("set RFP_DRIVE_ACCESS_TOKEN".into()))?;

        let api_base = config.api_base.trim_end_matches('/').to_string();
        let upload_base = config.upload_base.trim_end_matches('/').to_string();

        let response = transport.send(HttpRequest {
            method: Method::Get,
            url: format!("{api_base}/about?fields=user"),
            headers: vec![auth_header(&token)],
            body: None,
        })?;
        let about: AboutResponse = decode(response)?;
        let profile = DriveProfile::from_about(about)?;
        log::info!("signed in to Drive as {} <{}>", profile.display_name, profile.email);

        Ok(DriveSession {
            transport,
            token,
            folder_id: config.folder_id.clone(),
            api_base,
            upload_base,
            profile,
        })
    }

    pub fn profile(&self) -> &DriveProfile {
        &self.profile
    }

    /// Default parent folder for new files.
    pub fn folder_id(&self) -> &str {
        &self.folder_id
    }

    /// Uploads a local file into the default folder. Returns the new file id.
    pub fn upload_file(&self, path: &Path) -> Result<String, DriveError> {
        let data = fs::read(path).map_err(|e| DriveError::File {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| DriveError::File {
                path: path.display().to_string(),
                message: "not a file".into(),
            })?;
        let mime = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "html" | "htm" => Some("text/html"),
                "json" => Some("application/json"),
                other => DocumentKind::from_extension(other).map(|k| k.mime_type()),
            })
            .unwrap_or("application/octet-stream");
        self.upload(&name, mime, &data, &self.folder_id)
    }

    /// Saves in-memory text (e.g. a rendered report) as a Drive file.
    pub fn save_text_file(
        &self,
        content: &str,
        file_name: &str,
        mime: &str,
    ) -> Result<String, DriveError> {
        self.upload(file_name, mime, content.as_bytes(), &self.folder_id)
    }

    /// Creates a folder under `parent`, or under the default folder.
    pub fn create_folder(&self, name: &str, parent: Option<&str>) -> Result<String, DriveError> {
        let metadata = json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE,
            "parents": [parent.unwrap_or(&self.folder_id)],
        });
        let response = self.transport.send(HttpRequest {
            method: Method::Post,
            url: format!("{}/files?fields=id", self.api_base),
            headers: vec![
                auth_header(&self.token),
                ("Content-Type".into(), "application/json; charset=UTF-8".into()),
            ],
            body: Some(metadata.to_string().into_bytes()),
        })?;
        let created: CreatedFile = decode(response)?;
        log::debug!("created Drive folder {name:?} -> {}", created.id);
        Ok(created.id)
    }

    /// Releases the session handle. The access token is left valid, since it
    /// belongs to the caller and is reused by later commands.
    pub fn sign_out(self) {
        log::info!("signed out of Drive ({})", self.profile.email);
    }

    fn upload(
        &self,
        name: &str,
        mime: &str,
        data: &[u8],
        parent: &str,
    ) -> Result<String, DriveError> {
        let metadata = json!({ "name": name, "parents": [parent] }).to_string();
        let boundary = choose_boundary(data);
        let body = multipart_related(&boundary, &metadata, mime, data);

        let response = self.transport.send(HttpRequest {
            method: Method::Post,
            url: format!("{}/files?uploadType=multipart&fields=id", self.upload_base),
            headers: vec![
                auth_header(&self.token),
                (
                    "Content-Type".into(),
                    format!("multipart/related; boundary={boundary}"),
                ),
            ],
            body: Some(body),
        })?;
        let created: CreatedFile = decode(response)?;
        log::debug!("uploaded {name:?} ({} bytes) -> {}", data.len(), created.id);
        Ok(created.id)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn auth_header(token: &str) -> (String, String) {
    ("Authorization".into(), format!("Bearer {token}"))
}

/// Parses a JSON body on 2xx, or maps the Drive error payload otherwise.
fn decode<D: serde::de::DeserializeOwned>(response: HttpResponse) -> Result<D, DriveError> {
    if !(200..300).contains(&response.status) {
        let message = error_message(&response.body);
        return Err(match response.status {
            401 | 403 => DriveError::Unauthorized {
                status: response.status,
                message,
            },
            status => DriveError::Http { status, message },
        });
    }
    serde_json::from_slice(&response.body).map_err(|e| DriveError::Decode(e.to_string()))
}

fn error_message(body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string())
}

/// Picks a boundary that does not occur in the payload.
fn choose_boundary(data: &[u8]) -> String {
    let mut n = 0u32;
    loop {
        let candidate = format!("{BOUNDARY_BASE}-{n}");
        let needle = candidate.as_bytes();
        if !data.windows(needle.len()).any(|w| w == needle) {
            return candidate;
        }
        n += 1;
    }
}

/// Builds a `multipart/related` body: JSON metadata part, then the content part.
fn multipart_related(boundary: &str, metadata: &str, mime: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + metadata.len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.as_bytes());
    body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Type: {mime}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    struct FakeTransport {
        responses: RefCell<VecDeque<HttpResponse>>,
        sent: RefCell<Vec<HttpRequest>>,
    }

    impl FakeTransport {
        fn new(responses: Vec<(u16, &str)>) -> Self {
            FakeTransport {
                responses: RefCell::new(
                    responses
                        .into_iter()
                        .map(|(status, body)| HttpResponse {
                            status,
                            body: body.as_bytes().to_vec(),
                        })
                        .collect(),
                ),
                sent: RefCell::new(Vec::new()),
            }
        }
    }

    impl DriveTransport for &FakeTransport {
        fn send(&self, request: HttpRequest) -> Result<HttpResponse, DriveError> {
            self.sent.borrow_mut().push(request);
            self.responses
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| DriveError::Transport("no scripted response".into()))
        }
    }

    const ABOUT_OK: &str = r#"{"user":{"permissionId":"0123","displayName":"Dana Analyst","emailAddress":"dana@example.com"}}"#;

    fn config() -> DriveConfig {
        DriveConfig {
            folder_id: "folder-1".into(),
            api_base: "https://drive.test/v3/".into(),
            upload_base: "https://upload.drive.test/v3".into(),
            timeout_secs: 5,
            access_token: Some("tok".into()),
        }
    }

    fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
        req.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn initialize_requires_token() {
        let fake = FakeTransport::new(vec![]);
        let cfg = DriveConfig {
            access_token: None,
            ..config()
        };
        let err = DriveSession::initialize(&cfg, &fake).err().unwrap();
        assert!(matches!(err, DriveError::NotConfigured(_)));
        assert!(fake.sent.borrow().is_empty());
    }

    #[test]
    fn initialize_fetches_and_validates_profile() {
        let fake = FakeTransport::new(vec![(200, ABOUT_OK)]);
        let session = DriveSession::initialize(&config(), &fake).unwrap();
        assert_eq!(
            session.profile(),
            &DriveProfile {
                id: "0123".into(),
                display_name: "Dana Analyst".into(),
                email: "dana@example.com".into(),
            }
        );
        let sent = fake.sent.borrow();
        assert_eq!(sent[0].url, "https://drive.test/v3/about?fields=user");
        assert_eq!(header(&sent[0], "Authorization"), Some("Bearer tok"));
    }

    #[test]
    fn profile_without_display_name_falls_back_to_email() {
        let fake = FakeTransport::new(vec![(
            200,
            r#"{"user":{"permissionId":"9","emailAddress":"a@b.io"}}"#,
        )]);
        let session = DriveSession::initialize(&config(), &fake).unwrap();
        assert_eq!(session.profile().display_name, "a@b.io");
    }

    #[test]
    fn profile_with_bad_email_is_rejected() {
        let fake = FakeTransport::new(vec![(
            200,
            r#"{"user":{"permissionId":"9","emailAddress":"not-an-email"}}"#,
        )]);
        let err = DriveSession::initialize(&config(), &fake).err().unwrap();
        assert!(matches!(err, DriveError::InvalidProfile(_)));
    }

    #[test]
    fn unauthorized_maps_error_message() {
        let fake = FakeTransport::new(vec![(
            401,
            r#"{"error":{"code":401,"message":"Invalid Credentials"}}"#,
        )]);
        let err = DriveSession::initialize(&config(), &fake).err().unwrap();
        assert_eq!(
            err.to_string(),
            "Drive rejected the credentials (401): Invalid Credentials"
        );
    }

    #[test]
    fn save_text_file_sends_multipart_upload() {
        let fake = FakeTransport::new(vec![(200, ABOUT_OK), (200, r#"{"id":"file-9"}"#)]);
        let session = DriveSession::initialize(&config(), &fake).unwrap();
        let id = session
            .save_text_file("<html></html>", "report.html", "text/html")
            .unwrap();
        assert_eq!(id, "file-9");

        let sent = fake.sent.borrow();
        let upload = &sent[1];
        assert_eq!(upload.method, Method::Post);
        assert_eq!(
            upload.url,
            "https://upload.drive.test/v3/files?uploadType=multipart&fields=id"
        );
        assert_eq!(
            header(upload, "Content-Type"),
            Some("multipart/related; boundary=rfp-report-part-0")
        );
        let body = String::from_utf8(upload.body.clone().unwrap()).unwrap();
        assert!(body.starts_with("--rfp-report-part-0\r\n"));
        assert!(body.contains(r#"{"name":"report.html","parents":["folder-1"]}"#));
        assert!(body.contains("Content-Type: text/html\r\n\r\n<html></html>\r\n"));
        assert!(body.ends_with("--rfp-report-part-0--\r\n"));
    }

    #[test]
    fn create_folder_uses_explicit_parent() {
        let fake = FakeTransport::new(vec![(200, ABOUT_OK), (200, r#"{"id":"dir-1"}"#)]);
        let session = DriveSession::initialize(&config(), &fake).unwrap();
        let id = session.create_folder("Q3 bids", Some("parent-7")).unwrap();
        assert_eq!(id, "dir-1");

        let sent = fake.sent.borrow();
        let body: serde_json::Value =
            serde_json::from_slice(sent[1].body.as_ref().unwrap()).unwrap();
        assert_eq!(body["mimeType"], FOLDER_MIME_TYPE);
        assert_eq!(body["parents"][0], "parent-7");
        assert_eq!(sent[1].url, "https://drive.test/v3/files?fields=id");
    }

    #[test]
    fn upload_file_detects_document_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rfp.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();

        let fake = FakeTransport::new(vec![(200, ABOUT_OK), (200, r#"{"id":"pdf-1"}"#)]);
        let session = DriveSession::initialize(&config(), &fake).unwrap();
        assert_eq!(session.upload_file(&path).unwrap(), "pdf-1");

        let sent = fake.sent.borrow();
        let body = String::from_utf8_lossy(sent[1].body.as_ref().unwrap()).into_owned();
        assert!(body.contains("Content-Type: application/pdf\r\n\r\n%PDF-1.7"));
    }

    #[test]
    fn server_error_is_reported_once() {
        let fake = FakeTransport::new(vec![(200, ABOUT_OK), (500, "backend down")]);
        let session = DriveSession::initialize(&config(), &fake).unwrap();
        let err = session.save_text_file("x", "x.txt", "text/plain").unwrap_err();
        assert_eq!(err.to_string(), "Drive request failed (500): backend down");
        assert_eq!(fake.sent.borrow().len(), 2);
    }

    #[test]
    fn sign_out_sends_no_requests() {
        let fake = FakeTransport::new(vec![(200, ABOUT_OK)]);
        let session = DriveSession::initialize(&config(), &fake).unwrap();
        session.sign_out();
        assert_eq!(fake.sent.borrow().len(), 1);
    }

    #[test]
    fn boundary_avoids_payload_collision() {
        assert_eq!(choose_boundary(b"plain"), "rfp-report-part-0");
        assert_eq!(choose_boundary(b"x rfp-report-part-0 y"), "rfp-report-part-1");
    }

    #[test]
    fn email_plausibility() {
        assert!(is_plausible_email("a@b.co"));
        assert!(!is_plausible_email("@b.co"));
        assert!(!is_plausible_email("a@localhost"));
        assert!(!is_plausible_email("a b@c.de"));
    }
}
