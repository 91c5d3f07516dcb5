//! Backend resource paths.

pub const SIGNUP: &str = "/auth/signup";
pub const LOGIN: &str = "/auth/login";
pub const REFRESH: &str = "/auth/refresh";
pub const LOGOUT: &str = "/auth/logout";
pub const FORGOT_PASSWORD: &str = "/auth/forgot-password";
pub const RESET_PASSWORD: &str = "/auth/reset-password";
pub const VERIFY_EMAIL: &str = "/auth/verify-email";

pub const FOLDERS: &str = "/folders";
pub const FILE_UPLOAD: &str = "/files/upload";

pub fn project_folders(project_id: &str) -> String {
    format!("{FOLDERS}/{}", encode_segment(project_id))
}

pub fn folder_files(folder_id: &str) -> String {
    format!("/files/folder/{}", encode_segment(folder_id))
}

pub fn file(file_id: &str) -> String {
    format!("/files/{}", encode_segment(file_id))
}

pub fn file_download(file_id: &str) -> String {
    format!("/files/download/{}", encode_segment(file_id))
}

/// Percent-encode everything outside RFC 3986 unreserved characters so an
/// identifier always stays a single path segment.
pub fn encode_segment(segment: &str) -> String {
    // Dot segments would be collapsed by URL normalization.
    match segment {
        "." => return "%2E".to_string(),
        ".." => return "%2E%2E".to_string(),
        _ => {}
    }
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_paths() {
        assert_eq!(project_folders("p1"), "/folders/p1");
        assert_eq!(folder_files("f1"), "/files/folder/f1");
        assert_eq!(file("x"), "/files/x");
        assert_eq!(file_download("x"), "/files/download/x");
    }

    #[test]
    fn identifiers_cannot_escape_their_segment() {
        assert_eq!(file("../admin"), "/files/..%2Fadmin");
        assert_eq!(file(".."), "/files/%2E%2E");
        assert_eq!(folder_files("."), "/files/folder/%2E");
        assert_eq!(file("v1.2"), "/files/v1.2");
        assert_eq!(encode_segment("a b?c"), "a%20b%3Fc");
        assert_eq!(encode_segment("crème"), "cr%C3%A8me");
    }
}
