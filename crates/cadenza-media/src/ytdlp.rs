//! `yt-dlp` subprocess resolver

use async_trait::async_trait;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

use crate::config::MediaConfig;
use crate::error::{truncate_chars, AcquisitionError, Stage};
use crate::metadata::VideoMetadata;
use crate::resolver::MediaResolver;

/// Resolver backed by the `yt-dlp` command-line tool
#[derive(Debug, Clone)]
pub struct YtDlp {
    config: MediaConfig,
}

impl YtDlp {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    fn metadata_args(url: &str) -> Vec<String> {
        vec![
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            url.to_string(),
        ]
    }

    fn download_args(&self, url: &str, dest: &Path) -> Vec<String> {
        vec![
            "-f".to_string(),
            "bestaudio".to_string(),
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            self.config.audio_format.clone(),
            "--no-playlist".to_string(),
            "-o".to_string(),
            dest.to_string_lossy().into_owned(),
            url.to_string(),
        ]
    }

    /// Run the tool to completion, killing it once `timeout_secs` elapse
    async fn run(
        &self,
        stage: Stage,
        args: Vec<String>,
        timeout_secs: u64,
    ) -> Result<Output, AcquisitionError> {
        let program = &self.config.tool_path;
        log::debug!("Running {} {:?} (timeout {}s)", program, args, timeout_secs);

        let child = Command::new(program)
            .args(&self.config.tool_args)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(Duration::from_secs(timeout_secs), child).await {
            Ok(result) => result.map_err(|source| AcquisitionError::Io {
                program: program.clone(),
                source,
            })?,
            Err(_) => {
                log::error!("{} timed out after {}s", stage, timeout_secs);
                return Err(AcquisitionError::Timeout {
                    stage,
                    seconds: timeout_secs,
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            log::error!(
                "{} failed (exit code {:?}): {}",
                stage,
                output.status.code(),
                stderr
            );
            return Err(AcquisitionError::ToolFailed {
                stage,
                code: output.status.code(),
                stderr: truncate_chars(&stderr, self.config.stderr_limit),
            });
        }

        Ok(output)
    }
}

#[async_trait]
impl MediaResolver for YtDlp {
    async fn resolve_metadata(&self, url: &str) -> Result<VideoMetadata, AcquisitionError> {
        log::info!("Fetching video info for {}", url);
        let output = self
            .run(
                Stage::Metadata,
                Self::metadata_args(url),
                self.config.metadata_timeout_secs,
            )
            .await?;

        let payload = String::from_utf8_lossy(&output.stdout);
        let metadata = VideoMetadata::from_json(&payload, url).map_err(|e| {
            log::error!("Could not parse video info for {}: {}", url, e);
            AcquisitionError::MalformedMetadata(e)
        })?;

        log::info!("Resolved '{}' ({}s)", metadata.title, metadata.duration);
        Ok(metadata)
    }

    async fn download_audio(&self, url: &str, dest: &Path) -> Result<(), AcquisitionError> {
        self.run(
            Stage::Download,
            self.download_args(url, dest),
            self.config.download_timeout_secs,
        )
        .await?;

        log::info!("Download complete: {}", dest.display());
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const URL: &str = "https://www.youtube.com/watch?v=abc123";

    /// Resolver that runs `script` through `/bin/sh` instead of the real tool
    fn scripted(dir: &TempDir, script: &str, config: MediaConfig) -> YtDlp {
        let path = dir.path().join("fake-ytdlp.sh");
        fs::write(&path, script).unwrap();
        YtDlp::new(MediaConfig {
            tool_path: "/bin/sh".to_string(),
            tool_args: vec![path.to_string_lossy().into_owned()],
            ..config
        })
    }

    #[tokio::test]
    async fn test_metadata_success() {
        let dir = TempDir::new().unwrap();
        let script = r#"
[ "$1" = "--dump-json" ] && [ "$2" = "--no-playlist" ] || exit 3
printf '%s' '{"id":"abc123","title":"Song","duration":42,"uploader":"Band"}'
"#;
        let resolver = scripted(&dir, script, MediaConfig::default());

        let meta = resolver.resolve_metadata(URL).await.unwrap();
        assert_eq!(meta.title, "Song");
        assert_eq!(meta.duration, 42.0);
        assert_eq!(meta.author, "Band");
        assert_eq!(meta.url, URL);
    }

    #[tokio::test]
    async fn test_metadata_failure_keeps_stderr() {
        let dir = TempDir::new().unwrap();
        let script = "echo 'ERROR: Video unavailable' >&2\nexit 1\n";
        let resolver = scripted(&dir, script, MediaConfig::default());

        match resolver.resolve_metadata(URL).await.unwrap_err() {
            AcquisitionError::ToolFailed {
                stage,
                code,
                stderr,
            } => {
                assert_eq!(stage, Stage::Metadata);
                assert_eq!(code, Some(1));
                assert!(stderr.contains("Video unavailable"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_stderr_is_truncated() {
        let dir = TempDir::new().unwrap();
        let script = "head -c 2000 /dev/zero | tr '\\000' x >&2\nexit 2\n";
        let resolver = scripted(&dir, script, MediaConfig::default());

        match resolver
            .download_audio(URL, &dir.path().join("out.mp3"))
            .await
            .unwrap_err()
        {
            AcquisitionError::ToolFailed { stage, stderr, .. } => {
                assert_eq!(stage, Stage::Download);
                assert_eq!(stderr.chars().count(), 500);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_metadata() {
        let dir = TempDir::new().unwrap();
        let resolver = scripted(&dir, "echo 'not json'\n", MediaConfig::default());

        let err = resolver.resolve_metadata(URL).await.unwrap_err();
        assert!(matches!(err, AcquisitionError::MalformedMetadata(_)));
    }

    #[tokio::test]
    async fn test_timeout_kills_tool() {
        let dir = TempDir::new().unwrap();
        let config = MediaConfig {
            metadata_timeout_secs: 1,
            ..Default::default()
        };
        let resolver = scripted(&dir, "exec sleep 10\n", config);

        let started = std::time::Instant::now();
        let err = resolver.resolve_metadata(URL).await.unwrap_err();
        assert!(err.is_timeout());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_download_writes_destination() {
        let dir = TempDir::new().unwrap();
        // -o <dest> lands at positions 7 and 8
        let script = r#"
[ "$1" = "-f" ] && [ "$2" = "bestaudio" ] && [ "$5" = "mp3" ] && [ "$7" = "-o" ] || exit 3
printf 'ID3' > "$8"
"#;
        let resolver = scripted(&dir, script, MediaConfig::default());
        let dest = dir.path().join("audio_req.mp3");

        resolver.download_audio(URL, &dest).await.unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"ID3");
    }

    #[tokio::test]
    async fn test_missing_tool() {
        let resolver = YtDlp::new(MediaConfig {
            tool_path: "/nonexistent/yt-dlp".to_string(),
            ..Default::default()
        });

        let err = resolver.resolve_metadata(URL).await.unwrap_err();
        assert!(matches!(err, AcquisitionError::Io { .. }));
    }
}
