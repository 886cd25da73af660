//! WAV 容器读写
//!
//! 以字段方式暴露采样率、声道数、位深与数据长度，
//! 合并时只拼接 data 块，头部按最终长度重新生成。

use thiserror::Error;

/// 分镜尾部静音时长（毫秒）
pub const SHOT_TRAILER_MS: u32 = 500;

const WAVE_FORMAT_PCM: u16 = 1;

/// WAV 解析错误
#[derive(Debug, Error)]
pub enum WavError {
    #[error("Invalid WAV: {0}")]
    InvalidInput(String),

    #[error("Unsupported WAV: {0}")]
    Unsupported(String),
}

/// 采样格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    /// 格式标签（1 = PCM，3 = IEEE float）
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl WavFormat {
    /// 16 位 PCM
    pub fn pcm16(sample_rate: u32, channels: u16) -> Self {
        Self {
            audio_format: WAVE_FORMAT_PCM,
            channels,
            sample_rate,
            bits_per_sample: 16,
        }
    }

    /// 帧长与字节率；任一超出头部字段宽度时返回 None
    pub fn checked_layout(&self) -> Option<(u16, u32)> {
        let bytes_per_sample = (u32::from(self.bits_per_sample) + 7) / 8;
        let block_align = u32::from(self.channels).checked_mul(bytes_per_sample)?;
        let block_align = u16::try_from(block_align).ok()?;
        let byte_rate = self.sample_rate.checked_mul(u32::from(block_align))?;
        Some((block_align, byte_rate))
    }

    /// 仅对通过 `checked_layout` 的格式精确，越界时饱和
    pub fn block_align(&self) -> u16 {
        self.checked_layout().map_or(u16::MAX, |(align, _)| align)
    }

    pub fn byte_rate(&self) -> u32 {
        self.checked_layout().map_or(u32::MAX, |(_, rate)| rate)
    }

    /// 指定时长对应的字节数（按帧对齐）
    pub fn bytes_for_duration(&self, duration_ms: u32) -> usize {
        let frames = u64::from(self.sample_rate) * u64::from(duration_ms) / 1000;
        let bytes = frames.saturating_mul(u64::from(self.block_align()));
        usize::try_from(bytes).unwrap_or(usize::MAX)
    }
}

/// 一段 WAV 音频
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavClip {
    format: WavFormat,
    data: Vec<u8>,
}

impl WavClip {
    pub fn new(format: WavFormat, data: Vec<u8>) -> Self {
        Self { format, data }
    }

    /// 静音片段（8 位 PCM 的静音值为 0x80）
    pub fn silence(format: WavFormat, duration_ms: u32) -> Self {
        let fill = if format.audio_format == WAVE_FORMAT_PCM && format.bits_per_sample == 8 {
            0x80
        } else {
            0
        };
        Self {
            format,
            data: vec![fill; format.bytes_for_duration(duration_ms)],
        }
    }

    /// 解析 RIFF/WAVE 字节流
    ///
    /// data 块声明长度超过实际字节时（流式输出常见），以实际长度为准。
    pub fn parse(bytes: &[u8]) -> Result<Self, WavError> {
        if bytes.len() < 12 {
            return Err(WavError::InvalidInput("data too short".to_string()));
        }
        if &bytes[0..4] != b"RIFF" {
            return Err(WavError::InvalidInput("missing RIFF header".to_string()));
        }
        if &bytes[8..12] != b"WAVE" {
            return Err(WavError::InvalidInput("missing WAVE identifier".to_string()));
        }

        let mut pos = 12;
        let mut format: Option<WavFormat> = None;
        let mut data: Option<&[u8]> = None;

        while pos + 8 <= bytes.len() {
            let chunk_id = &bytes[pos..pos + 4];
            let chunk_size = read_u32(bytes, pos + 4) as usize;
            let body_start = pos + 8;

            match chunk_id {
                b"fmt " => {
                    if chunk_size < 16 || body_start + 16 > bytes.len() {
                        return Err(WavError::InvalidInput("truncated fmt chunk".to_string()));
                    }
                    format = Some(WavFormat {
                        audio_format: read_u16(bytes, body_start),
                        channels: read_u16(bytes, body_start + 2),
                        sample_rate: read_u32(bytes, body_start + 4),
                        bits_per_sample: read_u16(bytes, body_start + 14),
                    });
                }
                b"data" => {
                    let end = body_start.saturating_add(chunk_size).min(bytes.len());
                    data = Some(&bytes[body_start..end]);
                    break;
                }
                _ => {}
            }

            pos = body_start.saturating_add(chunk_size);
            if chunk_size % 2 != 0 {
                pos = pos.saturating_add(1);
            }
        }

        let format =
            format.ok_or_else(|| WavError::InvalidInput("missing fmt chunk".to_string()))?;
        let data = data.ok_or_else(|| WavError::InvalidInput("missing data chunk".to_string()))?;

        if format.channels == 0
            || format.sample_rate == 0
            || format.bits_per_sample == 0
            || format.checked_layout().is_none()
        {
            return Err(WavError::Unsupported(format!(
                "channels={}, sample_rate={}, bits_per_sample={}",
                format.channels, format.sample_rate, format.bits_per_sample
            )));
        }

        Ok(Self {
            format,
            data: data.to_vec(),
        })
    }

    pub fn format(&self) -> WavFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    pub fn duration_ms(&self) -> u64 {
        let byte_rate = self.format.byte_rate() as u64;
        if byte_rate == 0 {
            return 0;
        }
        self.data.len() as u64 * 1000 / byte_rate
    }

    /// 追加另一段的采样数据（不含头部）
    pub fn append(&mut self, other: &WavClip) {
        self.data.extend_from_slice(&other.data);
    }

    /// 编码为标准 44 字节头的 WAV
    pub fn to_bytes(&self) -> Vec<u8> {
        let data_size = self.data.len() as u32;
        let mut wav = Vec::with_capacity(44 + self.data.len());

        // RIFF header
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(36 + data_size).to_le_bytes());
        wav.extend_from_slice(b"WAVE");

        // fmt chunk
        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&self.format.audio_format.to_le_bytes());
        wav.extend_from_slice(&self.format.channels.to_le_bytes());
        wav.extend_from_slice(&self.format.sample_rate.to_le_bytes());
        wav.extend_from_slice(&self.format.byte_rate().to_le_bytes());
        wav.extend_from_slice(&self.format.block_align().to_le_bytes());
        wav.extend_from_slice(&self.format.bits_per_sample.to_le_bytes());

        // data chunk
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&data_size.to_le_bytes());
        wav.extend_from_slice(&self.data);

        wav
    }
}

/// 按顺序合并片段并追加静音尾巴
///
/// 输出格式继承第一段；空输入返回 None。
pub fn merge_with_trailer(clips: &[WavClip], trailer_ms: u32) -> Option<WavClip> {
    let (first, rest) = clips.split_first()?;
    let mut merged = first.clone();

    for clip in rest {
        if clip.format != first.format {
            tracing::warn!(
                expected = ?first.format,
                actual = ?clip.format,
                "Merging clip with mismatched format"
            );
        }
        merged.append(clip);
    }

    merged.append(&WavClip::silence(first.format, trailer_ms));
    Some(merged)
}

fn read_u16(bytes: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([bytes[pos], bytes[pos + 1]])
}

fn read_u32(bytes: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(format: WavFormat, duration_ms: u32, value: u8) -> WavClip {
        WavClip::new(format, vec![value; format.bytes_for_duration(duration_ms)])
    }

    #[test]
    fn test_parse_canonical_wav() {
        let format = WavFormat::pcm16(16000, 1);
        let bytes = tone(format, 1000, 7).to_bytes();
        assert_eq!(bytes.len(), 44 + 32000);

        let clip = WavClip::parse(&bytes).unwrap();
        assert_eq!(clip.format(), format);
        assert_eq!(clip.data_len(), 32000);
        assert_eq!(clip.duration_ms(), 1000);
    }

    #[test]
    fn test_parse_skips_extra_chunks() {
        let format = WavFormat::pcm16(22050, 2);
        let canonical = tone(format, 100, 1).to_bytes();

        // fmt 之后插入奇数长度的 LIST 块
        let mut bytes = canonical[..36].to_vec();
        bytes.extend_from_slice(b"LIST");
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(&[1, 2, 3, 0]);
        bytes.extend_from_slice(&canonical[36..]);

        let clip = WavClip::parse(&bytes).unwrap();
        assert_eq!(clip.format(), format);
        assert_eq!(clip.data_len(), format.bytes_for_duration(100));
    }

    #[test]
    fn test_parse_clamps_streaming_data_size() {
        let format = WavFormat::pcm16(16000, 1);
        let mut bytes = tone(format, 50, 3).to_bytes();
        bytes[40..44].copy_from_slice(&u32::MAX.to_le_bytes());

        let clip = WavClip::parse(&bytes).unwrap();
        assert_eq!(clip.data_len(), 1600);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(WavClip::parse(b"not a wav").is_err());
        assert!(WavClip::parse(b"RIFF\0\0\0\0WAVEdata\0\0\0\0").is_err());
    }

    #[test]
    fn test_parse_rejects_oversized_frame_layout() {
        let mut bytes = tone(WavFormat::pcm16(16000, 1), 10, 1).to_bytes();
        bytes[22..24].copy_from_slice(&u16::MAX.to_le_bytes());
        assert!(matches!(WavClip::parse(&bytes), Err(WavError::Unsupported(_))));

        // 帧长合法但字节率超出 u32
        let mut bytes = tone(WavFormat::pcm16(16000, 1), 10, 1).to_bytes();
        bytes[22..24].copy_from_slice(&8u16.to_le_bytes());
        bytes[24..28].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(WavClip::parse(&bytes), Err(WavError::Unsupported(_))));
    }

    #[test]
    fn test_unchecked_format_does_not_overflow() {
        let format = WavFormat {
            audio_format: 1,
            channels: u16::MAX,
            sample_rate: 48000,
            bits_per_sample: 32,
        };
        assert!(format.checked_layout().is_none());
        assert_eq!(format.block_align(), u16::MAX);
        assert_eq!(format.byte_rate(), u32::MAX);
        assert!(format.bytes_for_duration(1) > 0);
    }

    #[test]
    fn test_merge_duration_is_sum_plus_trailer() {
        let format = WavFormat::pcm16(32000, 1);
        let clips = vec![tone(format, 1200, 1), tone(format, 300, 2), tone(format, 750, 3)];

        let merged = merge_with_trailer(&clips, SHOT_TRAILER_MS).unwrap();
        assert_eq!(merged.duration_ms(), 1200 + 300 + 750 + 500);

        let reparsed = WavClip::parse(&merged.to_bytes()).unwrap();
        assert_eq!(reparsed, merged);
    }

    #[test]
    fn test_merge_keeps_order_and_drops_inner_headers() {
        let format = WavFormat::pcm16(8000, 1);
        let clips = vec![tone(format, 10, 0xAA), tone(format, 10, 0xBB)];

        let merged = merge_with_trailer(&clips, SHOT_TRAILER_MS).unwrap();
        let data = merged.data();
        assert_eq!(data[0], 0xAA);
        assert_eq!(data[160], 0xBB);
        assert!(!data.windows(4).any(|w| w == b"RIFF"));
        assert!(data[320..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_single_clip_still_gets_trailer() {
        let format = WavFormat::pcm16(24000, 1);
        let merged = merge_with_trailer(&[tone(format, 200, 5)], SHOT_TRAILER_MS).unwrap();
        assert_eq!(merged.duration_ms(), 700);
    }

    #[test]
    fn test_merge_inherits_first_format() {
        let first = WavFormat::pcm16(16000, 1);
        let second = WavFormat::pcm16(44100, 2);
        let merged =
            merge_with_trailer(&[tone(first, 100, 1), tone(second, 100, 1)], 0).unwrap();
        assert_eq!(merged.format(), first);
    }

    #[test]
    fn test_merge_empty_is_none() {
        assert!(merge_with_trailer(&[], SHOT_TRAILER_MS).is_none());
    }

    #[test]
    fn test_silence_for_8bit_pcm() {
        let format = WavFormat {
            audio_format: 1,
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 8,
        };
        let silence = WavClip::silence(format, 500);
        assert_eq!(silence.data_len(), 4000);
        assert!(silence.data().iter().all(|&b| b == 0x80));
    }
}
