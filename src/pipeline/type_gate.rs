//! Extension allow-list applied to uploads before they are staged.
//!
//! The check only looks at the declared file name. A renamed executable
//! passes as long as its name ends in an allowed extension; content is
//! never sniffed.

use std::fmt;
use std::path::Path;

/// Extensions accepted for extraction, lower-cased with the leading dot.
pub const ALLOWED_EXTENSIONS: &[&str] = &[".pdf", ".txt", ".doc", ".docx", ".jpg", ".jpeg", ".png"];

/// Why an upload was kept out of the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    MissingFileName,
    MissingExtension,
    UnsupportedExtension(String),
    TooLarge { size: usize, limit: usize },
    TooManyFiles { limit: usize },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFileName => write!(f, "Missing file name"),
            Self::MissingExtension => write!(f, "Invalid file type: no extension"),
            Self::UnsupportedExtension(ext) => write!(f, "Invalid file type: {ext}"),
            Self::TooLarge { size, limit } => {
                write!(f, "File too large ({size} bytes, limit {limit} bytes)")
            }
            Self::TooManyFiles { limit } => write!(f, "Maximum file count ({limit}) exceeded"),
        }
    }
}

/// Lower-cased extension of `file_name` including the leading dot.
///
/// Names without a stem (".pdf") or without a dot have no extension.
pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext.to_lowercase()))
}

/// Accept `file_name` if its extension is on the allow-list.
///
/// Returns the normalized extension used for staging.
pub fn check(file_name: &str) -> Result<String, Rejection> {
    if file_name.trim().is_empty() {
        return Err(Rejection::MissingFileName);
    }
    let ext = extension_of(file_name).ok_or(Rejection::MissingExtension)?;
    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(Rejection::UnsupportedExtension(ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_allowed_extensions() {
        for name in ["a.pdf", "b.txt", "c.doc", "d.docx", "e.jpg", "f.jpeg", "g.png"] {
            assert!(check(name).is_ok(), "{name} should pass");
        }
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(check("Report.PDF").unwrap(), ".pdf");
        assert_eq!(check("scan.JpEg").unwrap(), ".jpeg");
    }

    #[test]
    fn test_rejects_executable() {
        assert_eq!(
            check("b.exe"),
            Err(Rejection::UnsupportedExtension(".exe".to_string()))
        );
    }

    #[test]
    fn test_uses_last_extension_only() {
        assert_eq!(check("archive.pdf.exe"), Err(Rejection::UnsupportedExtension(".exe".to_string())));
        assert_eq!(check("notes.final.txt").unwrap(), ".txt");
    }

    #[test]
    fn test_missing_extension() {
        assert_eq!(check("README"), Err(Rejection::MissingExtension));
        assert_eq!(check(".pdf"), Err(Rejection::MissingExtension));
        assert_eq!(check("trailing."), Err(Rejection::MissingExtension));
    }

    #[test]
    fn test_missing_name() {
        assert_eq!(check(""), Err(Rejection::MissingFileName));
    }

    #[test]
    fn test_rejection_messages() {
        assert_eq!(
            Rejection::UnsupportedExtension(".exe".to_string()).to_string(),
            "Invalid file type: .exe"
        );
        assert_eq!(
            Rejection::TooManyFiles { limit: 2 }.to_string(),
            "Maximum file count (2) exceeded"
        );
    }
}
