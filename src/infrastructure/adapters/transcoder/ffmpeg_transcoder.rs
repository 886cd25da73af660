//! FFmpeg Transcoder - 调用外部 ffmpeg 进程
//!
//! 参数构造与进程执行分离，参数部分可单独测试。

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::application::ports::{MediaTranscoderPort, TranscodeError};

/// 错误信息中保留的 stderr 尾部长度
const DIAGNOSTIC_TAIL: usize = 2000;

/// FFmpeg 转码器
pub struct FfmpegTranscoder {
    binary: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn trim_args(input: &Path, output: &Path, offset_secs: f64) -> Vec<OsString> {
        let mut args = base_args();
        args.push("-ss".into());
        args.push(offset_secs.to_string().into());
        args.push("-i".into());
        args.push(input.into());
        args.extend(
            ["-c:v", "libx264", "-c:a", "aac", "-movflags", "+faststart"]
                .iter()
                .map(OsString::from),
        );
        args.push(output.into());
        args
    }

    fn concat_args(list_file: &Path, output: &Path) -> Vec<OsString> {
        let mut args = base_args();
        args.extend(["-f", "concat", "-safe", "0"].iter().map(OsString::from));
        args.push("-i".into());
        args.push(list_file.into());
        args.push("-c".into());
        args.push("copy".into());
        args.push(output.into());
        args
    }

    fn mix_args(video: &Path, music: &Path, output: &Path, music_volume: f64) -> Vec<OsString> {
        let filter = format!(
            "[1:a]volume={}[bgm];[0:a][bgm]amix=inputs=2:duration=first:dropout_transition=2[aout]",
            music_volume
        );
        let mut args = base_args();
        args.push("-i".into());
        args.push(video.into());
        args.push("-i".into());
        args.push(music.into());
        args.push("-filter_complex".into());
        args.push(filter.into());
        args.extend(
            ["-map", "0:v", "-map", "[aout]", "-c:v", "copy", "-c:a", "aac"]
                .iter()
                .map(OsString::from),
        );
        args.push(output.into());
        args
    }

    /// 执行 ffmpeg，退出码非 0 或输出文件不存在都视为失败
    async fn run(
        &self,
        operation: &'static str,
        args: Vec<OsString>,
        output: &Path,
    ) -> Result<(), TranscodeError> {
        tracing::debug!(operation, binary = %self.binary.display(), args = ?args, "Running ffmpeg");

        let result = Command::new(&self.binary)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| TranscodeError::Spawn(format!("{}: {}", self.binary.display(), e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            tracing::error!(operation, status = %result.status, "ffmpeg failed");
            return Err(TranscodeError::ProcessFailed {
                operation,
                status: result.status.to_string(),
                diagnostic: tail(&stderr, DIAGNOSTIC_TAIL),
            });
        }

        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(TranscodeError::MissingOutput {
                operation,
                path: output.to_path_buf(),
            });
        }

        tracing::debug!(operation, output = %output.display(), "ffmpeg finished");
        Ok(())
    }
}

/// 覆盖输出、关闭交互
fn base_args() -> Vec<OsString> {
    ["-y", "-hide_banner", "-nostdin"]
        .iter()
        .map(OsString::from)
        .collect()
}

/// 保留末尾若干字符（按字符边界）
fn tail(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        return text.trim().to_string();
    }
    text.chars().skip(count - max_chars).collect::<String>().trim().to_string()
}

#[async_trait]
impl MediaTranscoderPort for FfmpegTranscoder {
    async fn trim_reencode(
        &self,
        input: &Path,
        output: &Path,
        offset_secs: f64,
    ) -> Result<(), TranscodeError> {
        self.run("trim", Self::trim_args(input, output, offset_secs), output)
            .await
    }

    async fn concat(&self, list_file: &Path, output: &Path) -> Result<(), TranscodeError> {
        self.run("concat", Self::concat_args(list_file, output), output)
            .await
    }

    async fn mix_background(
        &self,
        video: &Path,
        music: &Path,
        output: &Path,
        music_volume: f64,
    ) -> Result<(), TranscodeError> {
        self.run(
            "mix",
            Self::mix_args(video, music, output, music_volume),
            output,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_trim_args() {
        let args = strings(&FfmpegTranscoder::trim_args(
            Path::new("/v/temp_3_x.mp4"),
            Path::new("/v/3.mp4"),
            0.1,
        ));
        let ss = args.iter().position(|a| a == "-ss").unwrap();
        let input = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[ss + 1], "0.1");
        assert!(ss < input, "seek must precede input");
        assert!(args.windows(2).any(|w| w == ["-c:v", "libx264"]));
        assert!(args.windows(2).any(|w| w == ["-c:a", "aac"]));
        assert_eq!(args.last().unwrap(), "/v/3.mp4");
    }

    #[test]
    fn test_concat_args() {
        let args = strings(&FfmpegTranscoder::concat_args(
            Path::new("/v/mylist.txt"),
            Path::new("/v/temp_combined.mp4"),
        ));
        assert!(args.windows(2).any(|w| w == ["-f", "concat"]));
        assert!(args.windows(2).any(|w| w == ["-safe", "0"]));
        assert!(args.windows(2).any(|w| w == ["-c", "copy"]));
        assert_eq!(args.last().unwrap(), "/v/temp_combined.mp4");
    }

    #[test]
    fn test_mix_args() {
        let args = strings(&FfmpegTranscoder::mix_args(
            Path::new("/v/temp_combined.mp4"),
            Path::new("/v/bgm.mp3"),
            Path::new("/v/output.mp4"),
            0.7,
        ));
        let filter = args
            .iter()
            .position(|a| a == "-filter_complex")
            .map(|i| args[i + 1].clone())
            .unwrap();
        assert_eq!(
            filter,
            "[1:a]volume=0.7[bgm];[0:a][bgm]amix=inputs=2:duration=first:dropout_transition=2[aout]"
        );
        assert!(args.windows(2).any(|w| w == ["-map", "0:v"]));
        assert!(args.windows(2).any(|w| w == ["-map", "[aout]"]));
        assert!(args.windows(2).any(|w| w == ["-c:v", "copy"]));
    }

    #[test]
    fn test_tail_keeps_end() {
        assert_eq!(tail("  short \n", 10), "short");
        assert_eq!(tail("abcdef", 3), "def");
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let transcoder = FfmpegTranscoder::new("/nonexistent/ffmpeg-binary");
        let err = transcoder
            .concat(Path::new("/tmp/list.txt"), Path::new("/tmp/out.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranscodeError::Spawn(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_process_failure() {
        let transcoder = FfmpegTranscoder::new("false");
        let err = transcoder
            .concat(Path::new("/tmp/list.txt"), Path::new("/tmp/out.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranscodeError::ProcessFailed { operation: "concat", .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_success_without_output_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let transcoder = FfmpegTranscoder::new("true");
        let err = transcoder
            .concat(&dir.path().join("list.txt"), &dir.path().join("out.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranscodeError::MissingOutput { .. }));
    }
}
