//! Video transform engine: ffprobe metadata, bounded ffmpeg transcodes,
//! and representative-frame extraction.
//!
//! All operations shell out to the configured binaries; a missing binary
//! surfaces as a processing failure, never a panic.

use anyhow::{anyhow, Context, Result};
use mediad_core::models::VideoOptions;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Technical metadata extracted from a video container.
#[derive(Debug, Clone, Serialize)]
pub struct VideoMetadata {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub codec: String,
    pub bitrate: Option<u64>,
    pub container_size: Option<u64>,
}

/// Validate that a path doesn't contain shell metacharacters or dangerous sequences
fn validate_path(path: &str) -> Result<()> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(anyhow!("Path contains dangerous characters: {}", path));
    }

    if path.contains("..") {
        return Err(anyhow!("Path contains directory traversal: {}", path));
    }

    Ok(())
}

/// Validate and canonicalize a file path to prevent directory traversal
fn validate_and_canonicalize_path(path: &Path) -> Result<PathBuf> {
    let path_str = path.to_string_lossy();
    validate_path(&path_str)?;

    if path.exists() {
        path.canonicalize()
            .map_err(|e| anyhow!("Failed to canonicalize path: {}", e))
    } else {
        if let Some(parent) = path.parent() {
            parent
                .canonicalize()
                .map_err(|e| anyhow!("Failed to canonicalize parent path: {}", e))?;
        }
        Ok(path.to_path_buf())
    }
}

pub struct VideoEngine {
    ffmpeg_path: String,
    ffprobe_path: String,
    transcode_timeout: Duration,
}

impl VideoEngine {
    pub fn new(
        ffmpeg_path: String,
        ffprobe_path: String,
        transcode_timeout: Duration,
    ) -> Result<Self> {
        validate_path(&ffmpeg_path).context("Invalid ffmpeg_path")?;
        validate_path(&ffprobe_path).context("Invalid ffprobe_path")?;

        Ok(Self {
            ffmpeg_path,
            ffprobe_path,
            transcode_timeout,
        })
    }

    /// Read-only inspection of a video file; never mutates the source.
    #[tracing::instrument(skip(self))]
    pub async fn probe(&self, video_path: &Path) -> Result<VideoMetadata> {
        let start = std::time::Instant::now();

        let validated_path =
            validate_and_canonicalize_path(video_path).context("Invalid video path")?;

        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(&validated_path)
            .output()
            .await
            .context("Failed to execute ffprobe")?;

        if !output.status.success() {
            return Err(anyhow!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            ));
        }

        let probe_data: serde_json::Value =
            serde_json::from_slice(&output.stdout).context("Failed to parse ffprobe output")?;
        let metadata = parse_probe_output(&probe_data)?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis() as u64,
            video_duration = metadata.duration,
            width = metadata.width,
            height = metadata.height,
            codec = %metadata.codec,
            "Video probe completed"
        );

        Ok(metadata)
    }

    /// Transcode to bounded resolution/bitrate/container. Completes or
    /// fails as a unit: on any failure (including timeout) the output file
    /// is removed.
    #[tracing::instrument(skip(self, input_path, output_path))]
    pub async fn transcode(
        &self,
        input_path: &Path,
        output_path: &Path,
        opts: &VideoOptions,
    ) -> Result<()> {
        let input = validate_and_canonicalize_path(input_path).context("Invalid input path")?;
        let output = validate_and_canonicalize_path(output_path).context("Invalid output path")?;

        let (video_codec, audio_codec) = match opts.output_format.as_str() {
            "webm" => ("libvpx-vp9", "libopus"),
            _ => ("libx264", "aac"),
        };

        let scale = format!(
            "scale=w={}:h={}:force_original_aspect_ratio=decrease:force_divisible_by=2",
            opts.target_width, opts.target_height
        );

        let mut args: Vec<String> = vec![
            "-y".into(),
            "-i".into(),
            input.to_string_lossy().into_owned(),
            "-c:v".into(),
            video_codec.into(),
            "-vf".into(),
            scale,
            "-b:v".into(),
            format!("{}k", opts.target_bitrate_kbps),
            "-maxrate".into(),
            format!("{}k", (opts.target_bitrate_kbps as f32 * 1.2) as u32),
            "-bufsize".into(),
            format!("{}k", opts.target_bitrate_kbps * 2),
            "-c:a".into(),
            audio_codec.into(),
            "-b:a".into(),
            "128k".into(),
        ];
        if video_codec == "libx264" {
            args.extend_from_slice(&[
                "-preset".into(),
                "fast".into(),
                "-movflags".into(),
                "+faststart".into(),
            ]);
        }
        args.push(output.to_string_lossy().into_owned());

        let start = std::time::Instant::now();
        let run = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let result = tokio::time::timeout(self.transcode_timeout, run).await;

        match result {
            Err(_) => {
                let _ = tokio::fs::remove_file(&output).await;
                Err(anyhow!(
                    "Transcode exceeded timeout of {}s",
                    self.transcode_timeout.as_secs()
                ))
            }
            Ok(Err(e)) => {
                let _ = tokio::fs::remove_file(&output).await;
                Err(anyhow!("Failed to execute ffmpeg: {}", e))
            }
            Ok(Ok(out)) if !out.status.success() => {
                let _ = tokio::fs::remove_file(&output).await;
                Err(anyhow!(
                    "FFmpeg failed: {}",
                    String::from_utf8_lossy(&out.stderr)
                ))
            }
            Ok(Ok(_)) => {
                tracing::info!(
                    duration_ms = start.elapsed().as_millis() as u64,
                    output = %output.display(),
                    "Transcode completed"
                );
                Ok(())
            }
        }
    }

    /// Extract one frame near `at_fraction` of playback (10% by default
    /// upstream, which avoids black leading frames), scaled and cropped to
    /// a `size`×`size` square.
    #[tracing::instrument(skip(self, input_path, output_path))]
    pub async fn extract_frame(
        &self,
        input_path: &Path,
        output_path: &Path,
        at_fraction: f64,
        size: u32,
    ) -> Result<()> {
        let input = validate_and_canonicalize_path(input_path).context("Invalid input path")?;
        let output = validate_and_canonicalize_path(output_path).context("Invalid output path")?;

        let metadata = self.probe(&input).await?;
        let timestamp = (metadata.duration * at_fraction).max(0.0);

        let filter = format!(
            "scale={size}:{size}:force_original_aspect_ratio=increase,crop={size}:{size}",
        );

        let args: Vec<String> = vec![
            "-y".into(),
            "-ss".into(),
            format!("{:.3}", timestamp),
            "-i".into(),
            input.to_string_lossy().into_owned(),
            "-frames:v".into(),
            "1".into(),
            "-vf".into(),
            filter,
            "-q:v".into(),
            "4".into(),
            output.to_string_lossy().into_owned(),
        ];

        let out = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .context("Failed to execute ffmpeg")?;

        if !out.status.success() {
            let _ = tokio::fs::remove_file(&output).await;
            return Err(anyhow!(
                "FFmpeg frame extraction failed: {}",
                String::from_utf8_lossy(&out.stderr)
            ));
        }

        Ok(())
    }
}

fn parse_probe_output(probe_data: &serde_json::Value) -> Result<VideoMetadata> {
    let stream = probe_data["streams"]
        .get(0)
        .ok_or_else(|| anyhow!("No video stream found"))?;
    let format = &probe_data["format"];

    let duration = format["duration"]
        .as_str()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| anyhow!("Could not parse duration"))?;

    let width = stream["width"]
        .as_u64()
        .ok_or_else(|| anyhow!("Could not parse width"))? as u32;

    let height = stream["height"]
        .as_u64()
        .ok_or_else(|| anyhow!("Could not parse height"))? as u32;

    let codec = stream["codec_name"]
        .as_str()
        .unwrap_or("unknown")
        .to_string();

    let bitrate = format["bit_rate"]
        .as_str()
        .and_then(|b| b.parse::<u64>().ok());

    let container_size = format["size"].as_str().and_then(|s| s.parse::<u64>().ok());

    Ok(VideoMetadata {
        duration,
        width,
        height,
        codec,
        bitrate,
        container_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path_rejects_metacharacters() {
        assert!(validate_path("/usr/bin/ffmpeg").is_ok());
        assert!(validate_path("ffmpeg; rm -rf /").is_err());
        assert!(validate_path("ffmpeg`id`").is_err());
        assert!(validate_path("../ffmpeg").is_err());
    }

    #[test]
    fn test_engine_rejects_dangerous_binary_paths() {
        assert!(VideoEngine::new(
            "ffmpeg|cat".into(),
            "ffprobe".into(),
            Duration::from_secs(60)
        )
        .is_err());
        assert!(VideoEngine::new(
            "ffmpeg".into(),
            "ffprobe".into(),
            Duration::from_secs(60)
        )
        .is_ok());
    }

    #[test]
    fn test_parse_probe_output() {
        let json = serde_json::json!({
            "streams": [{
                "width": 1920,
                "height": 1080,
                "codec_name": "h264"
            }],
            "format": {
                "duration": "12.480000",
                "bit_rate": "2500000",
                "size": "3900000"
            }
        });

        let meta = parse_probe_output(&json).unwrap();
        assert_eq!(meta.width, 1920);
        assert_eq!(meta.height, 1080);
        assert_eq!(meta.codec, "h264");
        assert!((meta.duration - 12.48).abs() < 1e-9);
        assert_eq!(meta.bitrate, Some(2_500_000));
        assert_eq!(meta.container_size, Some(3_900_000));
    }

    #[test]
    fn test_parse_probe_output_missing_stream() {
        let json = serde_json::json!({ "streams": [], "format": {} });
        assert!(parse_probe_output(&json).is_err());
    }

    #[tokio::test]
    async fn test_probe_nonexistent_binary_is_an_error() {
        let engine = VideoEngine::new(
            "ffmpeg-does-not-exist".into(),
            "ffprobe-does-not-exist".into(),
            Duration::from_secs(5),
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        tokio::fs::write(&path, b"not a real video").await.unwrap();

        assert!(engine.probe(&path).await.is_err());
    }
}
