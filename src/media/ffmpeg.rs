use async_trait::async_trait;
use log::{debug, warn};
use std::path::Path;
use std::process::{ExitStatus, Output, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};

use crate::app_config::ToolsConfig;
use crate::encoder::ffmpeg_progress_seconds;
use crate::errors::MediaError;
use crate::media::{MediaBackend, ProgressFn};

// @const: stderr lines kept for the failure message
const MAX_ERROR_LINES: usize = 12;

/// Media backend running the real ffmpeg tool chain
#[derive(Debug, Clone)]
pub struct SystemMedia {
    tools: ToolsConfig,
}

impl SystemMedia {
    pub fn new(tools: ToolsConfig) -> Self {
        Self { tools }
    }

    /// Run a short-lived tool and capture its output, giving up after the probe timeout
    async fn run_captured(&self, program: &str, args: &[&str]) -> Result<Output, MediaError> {
        let future = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let timeout_secs = self.tools.probe_timeout_secs;
        tokio::select! {
            result = future => result.map_err(|e| spawn_error(program, e)),
            _ = tokio::time::sleep(Duration::from_secs(timeout_secs)) => {
                Err(MediaError::Timeout { tool: program.to_string(), secs: timeout_secs })
            }
        }
    }
}

fn spawn_error(program: &str, error: std::io::Error) -> MediaError {
    if error.kind() == std::io::ErrorKind::NotFound {
        MediaError::MissingDependency(program.to_string())
    } else {
        MediaError::Spawn {
            tool: program.to_string(),
            message: error.to_string(),
        }
    }
}

/// What was learned from an ffmpeg stderr stream
#[derive(Debug, Default)]
struct StderrSummary {
    last_line: String,
    error_lines: Vec<String>,
}

impl StderrSummary {
    fn message(&self) -> String {
        if self.error_lines.is_empty() {
            self.last_line.trim().to_string()
        } else {
            self.error_lines.join("\n")
        }
    }
}

fn looks_like_error(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("error")
        || lower.contains("invalid")
        || lower.contains("no such file")
        || lower.contains("not found")
        || lower.contains("unable to")
}

/// Consume ffmpeg's stderr. Status lines end with `\r`, messages with `\n`, so
/// both terminate a line.
async fn read_ffmpeg_stderr<R: AsyncRead + Unpin>(
    mut stderr: R,
    total_secs: Option<f64>,
    on_progress: ProgressFn<'_>,
) -> Result<StderrSummary, MediaError> {
    let mut summary = StderrSummary::default();
    let mut buffer = [0u8; 4096];
    let mut pending = String::new();

    loop {
        let read = stderr.read(&mut buffer).await.map_err(|e| MediaError::Output {
            tool: "ffmpeg".to_string(),
            message: e.to_string(),
        })?;
        if read == 0 {
            break;
        }
        pending.push_str(&String::from_utf8_lossy(&buffer[..read]));

        while let Some(pos) = pending.find(['\r', '\n']) {
            let line: String = pending.drain(..=pos).collect();
            let line = line.trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() {
                continue;
            }

            if let (Some(total), Some(current)) = (total_secs, ffmpeg_progress_seconds(line)) {
                if total > 0.0 {
                    on_progress((current / total).clamp(0.0, 1.0));
                }
            } else {
                debug!("ffmpeg: {}", line);
            }

            if looks_like_error(line) {
                summary.error_lines.push(line.to_string());
                if summary.error_lines.len() > MAX_ERROR_LINES {
                    summary.error_lines.remove(0);
                }
            }
            summary.last_line = line.to_string();
        }
    }

    if !pending.trim().is_empty() {
        summary.last_line = pending.trim().to_string();
    }

    Ok(summary)
}

/// Wait for `child` while consuming its piped stderr
async fn wait_with_stderr(child: &mut Child, tool: &str) -> Result<(ExitStatus, StderrSummary), MediaError> {
    let ignore_progress = |_: f64| {};
    let stderr = child.stderr.take();
    let reader = async {
        match stderr {
            Some(stderr) => read_ffmpeg_stderr(stderr, None, &ignore_progress).await,
            None => Ok(StderrSummary::default()),
        }
    };

    let (summary, status) = tokio::join!(reader, child.wait());
    let status = status.map_err(|e| MediaError::Spawn {
        tool: tool.to_string(),
        message: e.to_string(),
    })?;
    Ok((status, summary?))
}

#[async_trait]
impl MediaBackend for SystemMedia {
    async fn probe_duration(&self, video: &Path) -> Result<Option<f64>, MediaError> {
        let video_arg = video.to_string_lossy();
        let output = self
            .run_captured(
                &self.tools.ffprobe,
                &[
                    "-v", "error",
                    "-show_entries", "format=duration",
                    "-of", "default=noprint_wrappers=1:nokey=1",
                    &video_arg,
                ],
            )
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("ffprobe could not read {:?}: {}", video, stderr.trim());
            return Ok(None);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d > 0.0))
    }

    async fn list_encoders(&self) -> Result<String, MediaError> {
        let output = self
            .run_captured(&self.tools.ffmpeg, &["-hide_banner", "-encoders"])
            .await?;

        if !output.status.success() {
            return Err(MediaError::Failed {
                tool: self.tools.ffmpeg.clone(),
                code: output.status.code(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn font_families(&self) -> Result<Vec<String>, MediaError> {
        let output = self.run_captured(&self.tools.fc_list, &[":", "family"]).await?;

        if !output.status.success() {
            return Err(MediaError::Failed {
                tool: self.tools.fc_list.clone(),
                code: output.status.code(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let mut families: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .flat_map(|line| line.split(','))
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        families.sort();
        families.dedup();
        Ok(families)
    }

    async fn encode(&self, args: &[String], total_secs: Option<f64>, on_progress: ProgressFn<'_>) -> Result<(), MediaError> {
        let program = self.tools.ffmpeg.as_str();
        debug!("{} {}", program, args.join(" "));

        let mut child = Command::new(program)
            .args(["-hide_banner", "-nostdin"])
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(program, e))?;

        let stderr = child.stderr.take().ok_or_else(|| MediaError::Output {
            tool: program.to_string(),
            message: "stderr was not captured".to_string(),
        })?;

        let reader = read_ffmpeg_stderr(stderr, total_secs, on_progress);
        tokio::pin!(reader);

        let summary = tokio::select! {
            summary = &mut reader => summary?,
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, stopping {}", program);
                let _ = child.kill().await;
                return Err(MediaError::Cancelled);
            }
        };

        let status = child.wait().await.map_err(|e| MediaError::Spawn {
            tool: program.to_string(),
            message: e.to_string(),
        })?;

        if !status.success() {
            return Err(MediaError::Failed {
                tool: program.to_string(),
                code: status.code(),
                message: summary.message(),
            });
        }

        on_progress(1.0);
        Ok(())
    }

    async fn play(&self, args: &[String]) -> Result<(), MediaError> {
        let program = self.tools.ffplay.as_str();
        debug!("{} {}", program, args.join(" "));

        let mut child = Command::new(program)
            .args(["-hide_banner", "-loglevel", "error"])
            .args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(program, e))?;

        let (status, summary) = tokio::select! {
            finished = wait_with_stderr(&mut child, program) => finished?,
            _ = tokio::signal::ctrl_c() => {
                let _ = child.kill().await;
                return Ok(());
            }
        };

        if !status.success() {
            return Err(MediaError::Failed {
                tool: program.to_string(),
                code: status.code(),
                message: summary.message(),
            });
        }

        Ok(())
    }
}
