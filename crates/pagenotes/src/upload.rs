//! Image files picked for upload, and the markup inserted for them.

use std::path::Path;

use crate::error::{Error, Result};

/// A local file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// Original file name, including extension.
    pub file_name: String,
    /// Media type reported for the file, e.g. `image/png`.
    pub media_type: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl ImageFile {
    /// Wrap file contents picked by the host.
    #[must_use]
    pub fn new(
        file_name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, deriving its media type from the extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub async fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let media_type = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or("application/octet-stream", media_type_for_extension);

        Ok(Self::new(file_name, media_type, bytes))
    }

    /// Whether the media type is an image type.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.media_type
            .split_once('/')
            .is_some_and(|(kind, sub)| kind.eq_ignore_ascii_case("image") && !sub.is_empty())
    }

    /// Reject non-images and files over `max_bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMediaType`] or [`Error::FileTooLarge`].
    pub fn validate(&self, max_bytes: Option<usize>) -> Result<()> {
        if !self.is_image() {
            return Err(Error::UnsupportedMediaType {
                file_name: self.file_name.clone(),
                media_type: self.media_type.clone(),
            });
        }
        if let Some(limit) = max_bytes {
            if self.bytes.len() > limit {
                return Err(Error::FileTooLarge {
                    file_name: self.file_name.clone(),
                    size: self.bytes.len(),
                    limit,
                });
            }
        }
        Ok(())
    }

    /// A fresh, globally unique object name keeping the original extension.
    #[must_use]
    pub fn object_name(&self) -> String {
        let id = uuid::Uuid::new_v4();
        match self.extension() {
            Some(ext) => format!("{id}.{ext}"),
            None => id.to_string(),
        }
    }

    fn extension(&self) -> Option<String> {
        let from_name = Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let from_type = || {
            self.media_type
                .split_once('/')
                .map(|(_, sub)| sub.split('+').next().unwrap_or(sub).to_ascii_lowercase())
        };

        from_name
            .or_else(from_type)
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
    }
}

/// Media type for a file extension.
#[must_use]
pub fn media_type_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "avif" => "image/avif",
        "ico" => "image/x-icon",
        "tif" | "tiff" => "image/tiff",
        "txt" | "md" => "text/plain",
        "html" | "htm" => "text/html",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Markup appended for an uploaded image: the image, then an empty
/// paragraph so typing can continue below it.
#[must_use]
pub fn image_markup(url: &str, alt: &str) -> String {
    format!(
        "<img src=\"{}\" alt=\"{}\"><p><br></p>",
        escape_attr(url),
        escape_attr(alt)
    )
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_image() {
        assert!(ImageFile::new("a.png", "image/png", vec![]).is_image());
        assert!(ImageFile::new("a.svg", "IMAGE/svg+xml", vec![]).is_image());
        assert!(!ImageFile::new("a.txt", "text/plain", vec![]).is_image());
        assert!(!ImageFile::new("a", "image/", vec![]).is_image());
        assert!(!ImageFile::new("a", "", vec![]).is_image());
    }

    #[test]
    fn test_validate() {
        let file = ImageFile::new("a.png", "image/png", vec![0; 10]);
        assert!(file.validate(None).is_ok());
        assert!(file.validate(Some(10)).is_ok());
        assert!(matches!(
            file.validate(Some(9)),
            Err(Error::FileTooLarge { size: 10, limit: 9, .. })
        ));

        let text = ImageFile::new("a.txt", "text/plain", vec![]);
        assert!(matches!(
            text.validate(None),
            Err(Error::UnsupportedMediaType { .. })
        ));
    }

    #[test]
    fn test_object_name_keeps_extension() {
        let file = ImageFile::new("Holiday Photo.JPG", "image/jpeg", vec![]);
        let name = file.object_name();
        assert!(name.ends_with(".jpg"));
        assert_ne!(name, file.object_name());
    }

    #[test]
    fn test_object_name_from_media_type() {
        let file = ImageFile::new("clipboard", "image/svg+xml", vec![]);
        assert!(file.object_name().ends_with(".svg"));
    }

    #[test]
    fn test_object_name_without_usable_extension() {
        let file = ImageFile::new("weird.p/ng", "image/", vec![]);
        assert!(!file.object_name().contains('.'));
    }

    #[test]
    fn test_media_type_for_extension() {
        assert_eq!(media_type_for_extension("PNG"), "image/png");
        assert_eq!(media_type_for_extension("jpeg"), "image/jpeg");
        assert_eq!(media_type_for_extension("txt"), "text/plain");
        assert_eq!(media_type_for_extension("xyz"), "application/octet-stream");
    }

    #[test]
    fn test_image_markup() {
        assert_eq!(
            image_markup("https://x/u/a.png", "a.png"),
            "<img src=\"https://x/u/a.png\" alt=\"a.png\"><p><br></p>"
        );
    }

    #[test]
    fn test_image_markup_escapes_attributes() {
        let markup = image_markup("https://x/?a=1&b=\"2\"", "<cat>");
        assert!(markup.contains("a=1&amp;b=&quot;2&quot;"));
        assert!(markup.contains("alt=\"&lt;cat&gt;\""));
    }

    #[tokio::test]
    async fn test_read_from_disk() {
        let path = std::env::temp_dir().join(format!(
            "pagenotes_upload_test_{}_{}.png",
            std::process::id(),
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&path, b"\x89PNG").unwrap();

        let file = ImageFile::read(&path).await.unwrap();
        assert_eq!(file.media_type, "image/png");
        assert_eq!(file.bytes, b"\x89PNG");
        assert!(file.file_name.ends_with(".png"));

        let _ = std::fs::remove_file(&path);
    }
}
