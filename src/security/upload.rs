//! Image upload validation and storage.
//!
//! # Responsibilities
//! - Reject malformed descriptors and failed transfers
//! - Enforce the size limit and the extension allow-list
//! - Detect the real content type from magic bytes
//! - Cross-check detected type against the declared extension
//! - Generate a fresh storage name and move the file into the upload directory
//!
//! # Design Decisions
//! - The client's filename and content type are never trusted for storage
//! - Every rejection is a value with a user-presentable reason
//! - Rejected files are never moved out of their temporary location

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

use crate::config::UploadConfig;

/// Bytes read from the start of a file to detect its type.
const SNIFF_LEN: usize = 16;

/// Image formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ImageType {
    pub fn mime(self) -> &'static str {
        match self {
            ImageType::Jpeg => "image/jpeg",
            ImageType::Png => "image/png",
            ImageType::Gif => "image/gif",
            ImageType::Webp => "image/webp",
        }
    }

    /// Conventional file extensions for this type.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            ImageType::Jpeg => &["jpg", "jpeg"],
            ImageType::Png => &["png"],
            ImageType::Gif => &["gif"],
            ImageType::Webp => &["webp"],
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        [ImageType::Jpeg, ImageType::Png, ImageType::Gif, ImageType::Webp]
            .into_iter()
            .find(|t| t.extensions().contains(&ext.as_str()))
    }

    /// Identify an image from its leading bytes.
    pub fn detect(head: &[u8]) -> Option<Self> {
        if head.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageType::Jpeg)
        } else if head.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(ImageType::Png)
        } else if head.starts_with(b"GIF87a") || head.starts_with(b"GIF89a") {
            Some(ImageType::Gif)
        } else if head.len() >= 12 && &head[..4] == b"RIFF" && &head[8..12] == b"WEBP" {
            Some(ImageType::Webp)
        } else {
            None
        }
    }
}

/// Transfer status reported by the multipart layer for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadErrorCode {
    Ok,
    /// Exceeded the server-wide upload limit.
    IniSize,
    /// Exceeded the limit declared by the form.
    FormSize,
    Partial,
    NoFile,
    NoTmpDir,
    CantWrite,
    Extension,
}

/// Metadata describing one submitted file.
///
/// Every field is optional because it comes straight from the client.
#[derive(Debug, Clone, Default)]
pub struct UploadDescriptor {
    pub name: Option<String>,
    pub size: Option<u64>,
    pub temp_path: Option<PathBuf>,
    pub error: Option<UploadErrorCode>,
}

/// Why an upload was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("Invalid upload.")]
    Invalid,
    #[error("No file was uploaded.")]
    NoFile,
    #[error("File exceeds the maximum allowed size of {max_bytes} bytes.")]
    TooLarge { max_bytes: u64 },
    #[error("File upload failed. Please try again.")]
    Failed,
    #[error("Files of type .{0} are not allowed.")]
    ExtensionNotAllowed(String),
    #[error("File content is not a supported image.")]
    UnsupportedContent,
    #[error("File extension .{extension} does not match its content ({mime}).")]
    Mismatch {
        extension: String,
        mime: &'static str,
    },
    #[error("The uploaded file could not be saved.")]
    Storage,
}

/// An upload that passed every check and is ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUpload {
    /// Generated storage name.
    pub filename: String,
    pub image_type: ImageType,
    pub size: u64,
    pub temp_path: PathBuf,
}

/// Lower-cased extension of a declared filename.
fn declared_extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

fn read_head(path: &Path) -> io::Result<Vec<u8>> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    fs::File::open(path)?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)?;
    Ok(head)
}

/// New storage name: random token plus the validated extension.
pub fn generate_filename(extension: &str) -> String {
    format!("img_{}.{}", Uuid::new_v4().simple(), extension)
}

/// Run every check against one descriptor.
pub fn validate_upload(
    descriptor: &UploadDescriptor,
    allowed_extensions: &[String],
    max_size_bytes: u64,
) -> Result<ValidatedUpload, UploadRejection> {
    let (Some(name), Some(size), Some(temp_path), Some(code)) = (
        descriptor.name.as_deref(),
        descriptor.size,
        descriptor.temp_path.as_ref(),
        descriptor.error,
    ) else {
        return Err(UploadRejection::Invalid);
    };

    match code {
        UploadErrorCode::Ok => {}
        UploadErrorCode::NoFile => return Err(UploadRejection::NoFile),
        UploadErrorCode::IniSize | UploadErrorCode::FormSize => {
            return Err(UploadRejection::TooLarge {
                max_bytes: max_size_bytes,
            })
        }
        _ => return Err(UploadRejection::Failed),
    }

    if size > max_size_bytes {
        return Err(UploadRejection::TooLarge {
            max_bytes: max_size_bytes,
        });
    }

    let extension = declared_extension(name).unwrap_or_default();
    if !allowed_extensions
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(&extension))
    {
        return Err(UploadRejection::ExtensionNotAllowed(extension));
    }

    let head = read_head(temp_path).map_err(|e| {
        tracing::warn!(path = %temp_path.display(), error = %e, "Could not read uploaded file");
        UploadRejection::Failed
    })?;
    let image_type = ImageType::detect(&head).ok_or(UploadRejection::UnsupportedContent)?;

    if !image_type.extensions().contains(&extension.as_str()) {
        return Err(UploadRejection::Mismatch {
            extension,
            mime: image_type.mime(),
        });
    }

    Ok(ValidatedUpload {
        filename: generate_filename(&extension),
        image_type,
        size,
        temp_path: temp_path.clone(),
    })
}

/// Validator bound to the configured limits and upload directory.
#[derive(Debug, Clone)]
pub struct UploadValidator {
    allowed_extensions: Vec<String>,
    max_size_bytes: u64,
    directory: PathBuf,
}

impl UploadValidator {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            allowed_extensions: config.allowed_extensions.clone(),
            max_size_bytes: config.max_size_bytes,
            directory: PathBuf::from(&config.directory),
        }
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn validate(&self, descriptor: &UploadDescriptor) -> Result<ValidatedUpload, UploadRejection> {
        validate_upload(descriptor, &self.allowed_extensions, self.max_size_bytes)
    }

    /// Move a validated file into the upload directory as owner-rw, world-r.
    pub fn store(&self, upload: &ValidatedUpload) -> Result<PathBuf, UploadRejection> {
        self.move_into_place(upload).map_err(|e| {
            tracing::error!(
                filename = %upload.filename,
                directory = %self.directory.display(),
                error = %e,
                "Failed to store upload"
            );
            UploadRejection::Storage
        })
    }

    fn move_into_place(&self, upload: &ValidatedUpload) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.directory)?;
        let destination = self.directory.join(&upload.filename);

        // rename fails across filesystems; fall back to copy + remove.
        if fs::rename(&upload.temp_path, &destination).is_err() {
            fs::copy(&upload.temp_path, &destination)?;
            fs::remove_file(&upload.temp_path)?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&destination, fs::Permissions::from_mode(0o644))?;
        }

        Ok(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];
    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";

    struct TempFile(PathBuf);

    impl TempFile {
        fn with(content: &[u8]) -> Self {
            let path = std::env::temp_dir().join(format!("upload-test-{}", Uuid::new_v4()));
            fs::write(&path, content).unwrap();
            Self(path)
        }
    }

    impl Drop for TempFile {
        fn drop(&mut self) {
            let _ = fs::remove_file(&self.0);
        }
    }

    fn allowed() -> Vec<String> {
        UploadConfig::default().allowed_extensions
    }

    fn descriptor(name: &str, size: u64, file: &TempFile) -> UploadDescriptor {
        UploadDescriptor {
            name: Some(name.to_string()),
            size: Some(size),
            temp_path: Some(file.0.clone()),
            error: Some(UploadErrorCode::Ok),
        }
    }

    #[test]
    fn test_accepts_valid_jpeg() {
        let file = TempFile::with(JPEG);
        let result = validate_upload(&descriptor("Site Photo.JPG", 2048, &file), &allowed(), 4096).unwrap();

        assert_eq!(result.image_type, ImageType::Jpeg);
        assert!(result.filename.starts_with("img_"));
        assert!(result.filename.ends_with(".jpg"));
        assert!(!result.filename.contains("Site"));
    }

    #[test]
    fn test_malformed_descriptor() {
        let file = TempFile::with(JPEG);
        let mut d = descriptor("a.jpg", 10, &file);
        d.temp_path = None;
        assert_eq!(validate_upload(&d, &allowed(), 100), Err(UploadRejection::Invalid));

        assert_eq!(
            validate_upload(&UploadDescriptor::default(), &allowed(), 100),
            Err(UploadRejection::Invalid)
        );
    }

    #[test]
    fn test_error_codes_map_to_reasons() {
        let file = TempFile::with(JPEG);
        let with_code = |code| UploadDescriptor {
            error: Some(code),
            ..descriptor("a.jpg", 10, &file)
        };

        assert_eq!(
            validate_upload(&with_code(UploadErrorCode::NoFile), &allowed(), 100),
            Err(UploadRejection::NoFile)
        );
        assert_eq!(
            validate_upload(&with_code(UploadErrorCode::IniSize), &allowed(), 100),
            Err(UploadRejection::TooLarge { max_bytes: 100 })
        );
        assert_eq!(
            validate_upload(&with_code(UploadErrorCode::FormSize), &allowed(), 100),
            Err(UploadRejection::TooLarge { max_bytes: 100 })
        );
        assert_eq!(
            validate_upload(&with_code(UploadErrorCode::Partial), &allowed(), 100),
            Err(UploadRejection::Failed)
        );
        assert_eq!(
            validate_upload(&with_code(UploadErrorCode::CantWrite), &allowed(), 100),
            Err(UploadRejection::Failed)
        );
    }

    #[test]
    fn test_size_boundary() {
        let file = TempFile::with(JPEG);
        assert!(validate_upload(&descriptor("a.jpg", 1000, &file), &allowed(), 1000).is_ok());
        assert_eq!(
            validate_upload(&descriptor("a.jpg", 1001, &file), &allowed(), 1000),
            Err(UploadRejection::TooLarge { max_bytes: 1000 })
        );
    }

    #[test]
    fn test_extension_not_allowed() {
        let file = TempFile::with(JPEG);
        assert_eq!(
            validate_upload(&descriptor("shell.php", 10, &file), &allowed(), 100),
            Err(UploadRejection::ExtensionNotAllowed("php".into()))
        );
        assert_eq!(
            validate_upload(&descriptor("noextension", 10, &file), &allowed(), 100),
            Err(UploadRejection::ExtensionNotAllowed(String::new()))
        );
    }

    #[test]
    fn test_spoofed_content_rejected() {
        let file = TempFile::with(b"<?php system($_GET['c']); ?>");
        assert_eq!(
            validate_upload(&descriptor("shell.php.jpg", 10, &file), &allowed(), 100),
            Err(UploadRejection::UnsupportedContent)
        );
    }

    #[test]
    fn test_real_jpeg_with_inner_php_extension_accepted() {
        // Only the last extension counts, and the stored name is generated.
        let file = TempFile::with(JPEG);
        let upload = validate_upload(&descriptor("shell.php.jpg", 10, &file), &allowed(), 100)
            .unwrap();

        assert_eq!(upload.image_type, ImageType::Jpeg);
        assert!(upload.filename.starts_with("img_"));
        assert!(upload.filename.ends_with(".jpg"));
        assert!(!upload.filename.contains("php"));
    }

    #[test]
    fn test_jpeg_content_with_php_extension_rejected() {
        // Even if an allow-list mistakenly includes php, JPEG bytes cannot carry it.
        let file = TempFile::with(JPEG);
        let mut list = allowed();
        list.push("php".into());

        assert_eq!(
            validate_upload(&descriptor("shell.jpg.php", 10, &file), &list, 100),
            Err(UploadRejection::Mismatch {
                extension: "php".into(),
                mime: "image/jpeg"
            })
        );
    }

    #[test]
    fn test_png_named_as_gif_rejected() {
        let file = TempFile::with(PNG);
        assert_eq!(
            validate_upload(&descriptor("logo.gif", 10, &file), &allowed(), 100),
            Err(UploadRejection::Mismatch {
                extension: "gif".into(),
                mime: "image/png"
            })
        );
    }

    #[test]
    fn test_detects_all_formats() {
        assert_eq!(ImageType::detect(JPEG), Some(ImageType::Jpeg));
        assert_eq!(ImageType::detect(PNG), Some(ImageType::Png));
        assert_eq!(ImageType::detect(b"GIF89a\x01\x00"), Some(ImageType::Gif));
        assert_eq!(ImageType::detect(b"RIFF\x24\x00\x00\x00WEBPVP8 "), Some(ImageType::Webp));
        assert_eq!(ImageType::detect(b"RIFF\x24\x00\x00\x00WAVE"), None);
        assert_eq!(ImageType::detect(b""), None);
    }

    #[test]
    fn test_generated_filenames_are_unique() {
        let names: HashSet<String> = (0..10_000).map(|_| generate_filename("png")).collect();
        assert_eq!(names.len(), 10_000);
    }

    #[test]
    fn test_store_moves_file_and_sets_permissions() {
        let dir = std::env::temp_dir().join(format!("uploads-{}", Uuid::new_v4()));
        let config = UploadConfig {
            directory: dir.to_string_lossy().into_owned(),
            max_size_bytes: 100,
            ..Default::default()
        };
        let validator = UploadValidator::new(&config);

        let file = TempFile::with(PNG);
        let upload = validator.validate(&descriptor("plan.png", 16, &file)).unwrap();
        let stored = validator.store(&upload).unwrap();

        assert_eq!(stored, dir.join(&upload.filename));
        assert!(stored.exists());
        assert!(!file.0.exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&stored).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o644);
        }

        fs::remove_dir_all(&dir).unwrap_or_default();
    }

    #[test]
    fn test_rejected_upload_is_not_moved() {
        let dir = std::env::temp_dir().join(format!("uploads-{}", Uuid::new_v4()));
        let config = UploadConfig {
            directory: dir.to_string_lossy().into_owned(),
            max_size_bytes: 100,
            ..Default::default()
        };
        let validator = UploadValidator::new(&config);

        let file = TempFile::with(b"not an image at all");
        assert!(validator.validate(&descriptor("x.png", 19, &file)).is_err());
        assert!(file.0.exists());
        assert!(!dir.exists());
    }
}
