use std::fmt::Write;
use std::path::PathBuf;

use chrono::{NaiveDate, Utc};

#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error("failed to write certificate {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Produces a completion artifact for a student and returns where it was written.
pub trait CertificateIssuer: Send + Sync {
    fn render(&self, name: &str, code: &str) -> Result<PathBuf, CertificateError>;
}

/// Plain-text certificates written to a directory, one file per student code.
pub struct TextCertificateIssuer {
    out_dir: PathBuf,
}

impl TextCertificateIssuer {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }
}

pub fn certificate_text(name: &str, code: &str, issued_on: NaiveDate) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "PHOTEX MEDIA ACADEMY");
    let _ = writeln!(output, "Certificate of Completion");
    let _ = writeln!(output);
    let _ = writeln!(output, "Awarded to: {name}");
    let _ = writeln!(output, "Student Code: {code}");
    let _ = writeln!(output);
    let _ = writeln!(output, "Completed Advanced Training • {issued_on}");
    output
}

impl CertificateIssuer for TextCertificateIssuer {
    fn render(&self, name: &str, code: &str) -> Result<PathBuf, CertificateError> {
        let path = self.out_dir.join(format!("certificate_{code}.txt"));
        std::fs::create_dir_all(&self.out_dir)
            .and_then(|()| {
                std::fs::write(&path, certificate_text(name, code, Utc::now().date_naive()))
            })
            .map_err(|source| CertificateError::Write {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}
