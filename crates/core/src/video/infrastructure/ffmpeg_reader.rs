use std::path::Path;

use ffmpeg_next::format::context::Input;
use ffmpeg_next::software::scaling;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::{ReadError, VideoReader};

/// Decodes video frames via ffmpeg-next (libavformat + libavcodec).
///
/// The decoder and the RGB24 scaler are built once in `open`; `frames`
/// then streams converted frames without buffering the whole video.
pub struct FfmpegReader {
    session: Option<DecodeSession>,
}

struct DecodeSession {
    input: Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
}

// Safety: FfmpegReader is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegReader {}

impl FfmpegReader {
    pub fn new() -> Self {
        Self { session: None }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

fn open_error(path: &Path, e: impl std::fmt::Display) -> ReadError {
    ReadError::Open {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, ReadError> {
        self.close();
        ffmpeg_next::init().map_err(|e| open_error(path, e))?;

        let input = ffmpeg_next::format::input(path).map_err(|e| open_error(path, e))?;

        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or(ReadError::NoVideoStream)?;
        let stream_index = stream.index();

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| open_error(path, e))?;
        let decoder = codec_ctx.decoder().video().map_err(|e| open_error(path, e))?;

        let rate = stream.rate();
        let rate = if rate.denominator() != 0 && rate.numerator() != 0 {
            rate
        } else {
            stream.avg_frame_rate()
        };
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let width = decoder.width();
        let height = decoder.height();
        let metadata = VideoMetadata {
            width,
            height,
            fps,
            total_frames: stream.frames().max(0) as usize,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source_path: Some(path.to_path_buf()),
        };

        let scaler = scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            scaling::Flags::BILINEAR,
        )
        .map_err(|e| open_error(path, e))?;

        log::debug!(
            "Opened {} ({}x{}, {:.2} fps, {} frames, {})",
            path.display(),
            width,
            height,
            fps,
            metadata.total_frames,
            metadata.codec
        );

        self.session = Some(DecodeSession {
            input,
            decoder,
            scaler,
            stream_index,
            width,
            height,
        });

        Ok(metadata)
    }

    fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, ReadError>> + '_> {
        match self.session.as_mut() {
            Some(session) => Box::new(FfmpegFrameIter {
                session,
                frame_index: 0,
                flushing: false,
                done: false,
            }),
            None => Box::new(std::iter::once(Err(ReadError::NotOpened))),
        }
    }

    fn close(&mut self) {
        self.session = None;
    }
}

/// Lazy iterator that decodes one frame per `next` call.
struct FfmpegFrameIter<'a> {
    session: &'a mut DecodeSession,
    frame_index: usize,
    flushing: bool,
    done: bool,
}

impl FfmpegFrameIter<'_> {
    fn try_receive(&mut self) -> Option<Result<Frame, ReadError>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.session.decoder.receive_frame(&mut decoded).is_err() {
            return None;
        }

        let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
        if let Err(e) = self.session.scaler.run(&decoded, &mut rgb) {
            self.done = true;
            return Some(Err(ReadError::Decode {
                index: self.frame_index,
                reason: e.to_string(),
            }));
        }

        let pixels = packed_rgb_pixels(&rgb, self.session.width, self.session.height);
        let frame = Frame::new(
            pixels,
            self.session.width,
            self.session.height,
            self.frame_index,
        );
        self.frame_index += 1;
        Some(Ok(frame))
    }
}

impl Iterator for FfmpegFrameIter<'_> {
    type Item = Result<Frame, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if let Some(result) = self.try_receive() {
            return Some(result);
        }

        if self.flushing {
            self.done = true;
            return None;
        }

        loop {
            let Some((stream, packet)) = self.session.input.packets().next() else {
                let _ = self.session.decoder.send_eof();
                self.flushing = true;
                if let Some(result) = self.try_receive() {
                    return Some(result);
                }
                self.done = true;
                return None;
            };

            if stream.index() != self.session.stream_index {
                continue;
            }

            // Corrupt packets are skipped; the decoder resyncs on the next keyframe.
            if let Err(e) = self.session.decoder.send_packet(&packet) {
                log::debug!("Skipping undecodable packet: {e}");
                continue;
            }

            if let Some(result) = self.try_receive() {
                return Some(result);
            }
        }
    }
}

/// Copies an RGB24 ffmpeg frame into a tightly packed buffer, dropping the
/// per-row stride padding.
fn packed_rgb_pixels(
    rgb: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb.stride(0);
    let data = rgb.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_bytes]);
    }
    pixels
}
