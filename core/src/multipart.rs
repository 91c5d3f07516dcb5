//! `multipart/form-data` body encoding for file uploads.

use uuid::Uuid;

/// One file to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub contents: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            contents,
        }
    }
}

/// A form body under construction.
#[derive(Debug)]
pub struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::with_boundary(format!("agri-{}", Uuid::new_v4().simple()))
    }

    pub fn with_boundary(boundary: String) -> Self {
        Self {
            boundary,
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.open_part(&format!("Content-Disposition: form-data; name=\"{}\"", escape(name)));
        self.body.extend_from_slice(value.as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn file(mut self, name: &str, file: &UploadFile) -> Self {
        self.open_part(&format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}",
            escape(name),
            escape(&file.file_name),
            header_value(&file.content_type)
        ));
        self.body.extend_from_slice(&file.contents);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn open_part(&mut self, headers: &str) {
        self.body.extend_from_slice(format!("--{}\r\n{headers}\r\n\r\n", self.boundary).as_bytes());
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Close the form and return its bytes.
    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.body
    }
}

/// Quotes and line breaks would end the quoted header parameter early.
/// Backslashes pass through, as browsers send them.
fn escape(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Unquoted header values cannot carry line breaks.
fn header_value(value: &str) -> String {
    value.chars().filter(|c| !matches!(c, '\r' | '\n')).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_fields_and_files() {
        let file = UploadFile::new("yield.csv", "text/csv", b"crop,kg\nmaize,120".to_vec());
        let form = MultipartForm::with_boundary("XYZ".to_string())
            .text("folder_id", "f-1")
            .file("files", &file);
        assert_eq!(form.content_type(), "multipart/form-data; boundary=XYZ");

        let body = String::from_utf8(form.finish()).unwrap();
        let expected = "--XYZ\r\n\
            Content-Disposition: form-data; name=\"folder_id\"\r\n\r\n\
            f-1\r\n\
            --XYZ\r\n\
            Content-Disposition: form-data; name=\"files\"; filename=\"yield.csv\"\r\n\
            Content-Type: text/csv\r\n\r\n\
            crop,kg\nmaize,120\r\n\
            --XYZ--\r\n";
        assert_eq!(body, expected);
    }

    #[test]
    fn filename_quotes_are_escaped() {
        let file = UploadFile::new("a\"b.txt", "text/plain", Vec::new());
        let body = MultipartForm::with_boundary("B".to_string()).file("files", &file).finish();
        let body = String::from_utf8(body).unwrap();
        assert!(body.contains("filename=\"a%22b.txt\""));
    }

    #[test]
    fn filename_backslashes_are_kept() {
        let file = UploadFile::new("C:\\farm\\herd.csv", "text/csv", Vec::new());
        let body = MultipartForm::with_boundary("B".to_string()).file("files", &file).finish();
        let body = String::from_utf8(body).unwrap();
        assert!(body.contains("filename=\"C:\\farm\\herd.csv\""));
    }

    #[test]
    fn content_type_cannot_add_headers() {
        let file = UploadFile::new("a.txt", "text/plain\r\nX-Injected: 1", b"hi".to_vec());
        let body = MultipartForm::with_boundary("B".to_string()).file("files", &file).finish();
        let body = String::from_utf8(body).unwrap();
        assert!(body.contains("Content-Type: text/plainX-Injected: 1\r\n\r\nhi\r\n"));
        assert!(!body.contains("\r\nX-Injected"));
    }

    #[test]
    fn generated_boundaries_differ() {
        assert_ne!(MultipartForm::new().content_type(), MultipartForm::new().content_type());
    }
}
