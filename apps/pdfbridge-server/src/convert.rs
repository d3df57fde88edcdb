//! External conversion engine adapter.
//!
//! Wraps a headless LibreOffice invocation:
//!
//! ```text
//! soffice --headless --convert-to <ext> --outdir <staging dir> <input>
//! ```
//!
//! The adapter contributes nothing beyond byte marshaling, error translation,
//! and a hard timeout. The child is spawned with `kill_on_drop` so an expired
//! conversion is reaped instead of holding the request open.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Failed to launch conversion engine '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("Conversion engine failed: {0}")]
    Engine(String),

    #[error("Conversion timed out after {0}ms")]
    Timeout(u64),

    #[error("Conversion engine produced no output for '{0}'")]
    MissingOutput(String),

    #[error("I/O error during conversion: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle to the external conversion engine.
#[derive(Debug, Clone)]
pub struct Converter {
    command: String,
    outdir: PathBuf,
    timeout: Duration,
}

impl Converter {
    pub fn new(command: impl Into<String>, outdir: impl Into<PathBuf>, timeout_ms: u64) -> Self {
        Self {
            command: command.into(),
            outdir: outdir.into(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// Convert the staged input file to `target_ext` and return the output
    /// bytes. The engine's output file is removed after reading.
    pub async fn convert(&self, input: &Path, target_ext: &str) -> Result<Vec<u8>, ConvertError> {
        let child = Command::new(&self.command)
            .arg("--headless")
            .arg("--convert-to")
            .arg(target_ext)
            .arg("--outdir")
            .arg(&self.outdir)
            .arg(input)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ConvertError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        let produced = self.output_path(input, target_ext)?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(input = %input.display(), timeout_ms = self.timeout.as_millis() as u64,
                    "conversion engine timed out");
                // The engine may have written its output before hanging.
                discard_output(&produced).await;
                return Err(ConvertError::Timeout(self.timeout.as_millis() as u64));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // A partial output file must not outlive the failed request.
            discard_output(&produced).await;
            return Err(ConvertError::Engine(format!(
                "exit status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let bytes = tokio::fs::read(&produced)
            .await
            .map_err(|_| ConvertError::MissingOutput(produced.display().to_string()))?;
        debug!(input = %input.display(), output = %produced.display(), size = bytes.len(),
            "conversion complete");

        discard_output(&produced).await;
        Ok(bytes)
    }

    /// The engine writes `<outdir>/<input stem>.<ext>`.
    fn output_path(&self, input: &Path, target_ext: &str) -> Result<PathBuf, ConvertError> {
        let stem = input
            .file_stem()
            .ok_or_else(|| ConvertError::MissingOutput(input.display().to_string()))?;
        Ok(self.outdir.join(stem).with_extension(target_ext))
    }
}

/// Remove an engine output file if it exists, with the same log-and-swallow
/// policy staging cleanup uses.
async fn discard_output(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove engine output"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_swaps_extension() {
        let converter = Converter::new("soffice", "/tmp/stage", 60_000);
        let out = converter
            .output_path(Path::new("/tmp/stage/123-abc.pdf"), "docx")
            .unwrap();
        assert_eq!(out, PathBuf::from("/tmp/stage/123-abc.docx"));
    }

    #[tokio::test]
    async fn missing_engine_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let converter = Converter::new("/nonexistent/soffice", dir.path(), 1_000);

        let input = dir.path().join("in.pdf");
        tokio::fs::write(&input, b"%PDF-1.5").await.unwrap();

        let err = converter.convert(&input, "docx").await.unwrap_err();
        assert!(matches!(err, ConvertError::Spawn { .. }));
    }

    #[tokio::test]
    async fn hung_engine_times_out() {
        let dir = tempfile::tempdir().unwrap();
        // A stand-in engine that writes its output, then hangs.
        let script = dir.path().join("hang.sh");
        let body = format!(
            "#!/bin/sh\nprintf 'partial' > {}/in.docx\nsleep 30\n",
            dir.path().display()
        );
        tokio::fs::write(&script, body).await.unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = tokio::fs::metadata(&script).await.unwrap().permissions();
            perms.set_mode(0o755);
            tokio::fs::set_permissions(&script, perms).await.unwrap();
        }

        let converter = Converter::new(script.display().to_string(), dir.path(), 200);
        let input = dir.path().join("in.pdf");
        tokio::fs::write(&input, b"%PDF-1.5").await.unwrap();

        let err = converter.convert(&input, "docx").await.unwrap_err();
        assert!(matches!(err, ConvertError::Timeout(200)));
        assert!(!dir.path().join("in.docx").exists());
    }

    #[tokio::test]
    async fn failing_engine_surfaces_stderr_and_discards_output() {
        let dir = tempfile::tempdir().unwrap();
        // Writes a partial output file, then fails.
        let script = dir.path().join("fail.sh");
        let body = format!(
            "#!/bin/sh\nprintf 'partial' > {}/in.docx\necho 'bad document' >&2\nexit 1\n",
            dir.path().display()
        );
        tokio::fs::write(&script, body).await.unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = tokio::fs::metadata(&script).await.unwrap().permissions();
            perms.set_mode(0o755);
            tokio::fs::set_permissions(&script, perms).await.unwrap();
        }

        let converter = Converter::new(script.display().to_string(), dir.path(), 5_000);
        let input = dir.path().join("in.pdf");
        tokio::fs::write(&input, b"%PDF-1.5").await.unwrap();

        let err = converter.convert(&input, "docx").await.unwrap_err();
        match err {
            ConvertError::Engine(msg) => assert!(msg.contains("bad document")),
            other => panic!("expected engine error, got {:?}", other),
        }
        // The partial output must not outlive the failed conversion.
        assert!(!dir.path().join("in.docx").exists());
    }

    #[tokio::test]
    async fn fake_engine_output_is_read_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        // A stand-in engine that writes the expected output file.
        let script = dir.path().join("fake.sh");
        let body = format!(
            "#!/bin/sh\nprintf 'converted bytes' > {}/in.docx\n",
            dir.path().display()
        );
        tokio::fs::write(&script, body).await.unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = tokio::fs::metadata(&script).await.unwrap().permissions();
            perms.set_mode(0o755);
            tokio::fs::set_permissions(&script, perms).await.unwrap();
        }

        let converter = Converter::new(script.display().to_string(), dir.path(), 5_000);
        let input = dir.path().join("in.pdf");
        tokio::fs::write(&input, b"%PDF-1.5").await.unwrap();

        let bytes = converter.convert(&input, "docx").await.unwrap();
        assert_eq!(bytes, b"converted bytes");
        assert!(!dir.path().join("in.docx").exists());
    }
}
