//! Capture Source
//!
//! Where the Capture Worker reads frames from: a live camera (nokhwa,
//! generalizing the teacher's `CameraCapture`), or a video file/network
//! stream (ffmpeg, since nokhwa only speaks to camera devices) — the
//! three `cv2.VideoCapture` branches the reference capture UI offered
//! interactively (webcam / video file / IP camera stream). `FrameSampler`
//! wraps whichever decoder is in use with the Nth-frame throttle (§4.1).

use std::path::PathBuf;

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::input;
use ffmpeg::format::Pixel;
use ffmpeg::media::Type;
use ffmpeg::software::scaling::{context::Context as ScalingContext, flag::Flags};
use ffmpeg::util::frame::video::Video as FfmpegVideoFrame;
use image::{ImageBuffer, Rgb};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use tracing::debug;

/// Where the Capture Worker reads frames from.
#[derive(Debug, Clone)]
pub enum CaptureSource {
    /// A local camera device, by nokhwa index.
    Camera(u32),
    /// A video file on disk.
    File(PathBuf),
    /// A network stream URL (e.g. an RTSP or MJPEG IP camera feed).
    Stream(String),
}

/// One decoded RGB8 frame, ready to PNG-encode.
pub struct DecodedFrame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// A source of decoded frames, camera or file/stream.
pub trait FrameDecoder: Send {
    /// Blocks until the next frame is available, or returns `Ok(None)` at
    /// end of stream (file sources only; camera and network streams never
    /// end on their own).
    fn next_frame(&mut self) -> anyhow::Result<Option<DecodedFrame>>;
}

/// Live camera decoder. One blocking `next_frame` call per frame, driven
/// by the worker's own sampling loop rather than a background thread —
/// unlike the teacher's `CameraCapture`, there is no broadcast fan-out
/// because exactly one consumer (the Capture Worker's use case) reads it.
pub struct CameraDecoder {
    camera: Camera,
}

impl CameraDecoder {
    pub fn open(device_index: u32) -> anyhow::Result<Self> {
        let index = CameraIndex::Index(device_index);
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);
        let mut camera = Camera::new(index, requested)?;
        camera.open_stream()?;
        Ok(Self { camera })
    }
}

impl FrameDecoder for CameraDecoder {
    fn next_frame(&mut self) -> anyhow::Result<Option<DecodedFrame>> {
        let resolution = self.camera.resolution();
        let buffer = self.camera.frame()?;
        let decoded = buffer.decode_image::<RgbFormat>()?;
        Ok(Some(DecodedFrame {
            width: resolution.width(),
            height: resolution.height(),
            rgb: decoded.into_raw(),
        }))
    }
}

/// File/stream decoder backed by ffmpeg, covering the two branches nokhwa
/// cannot: a video file on disk, or a network camera stream URL.
pub struct FfmpegDecoder {
    input: ffmpeg::format::context::Input,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: ScalingContext,
    video_stream_index: usize,
}

impl FfmpegDecoder {
    pub fn open(location: &str) -> anyhow::Result<Self> {
        ffmpeg::init()?;
        let input = input(&location)?;
        let stream = input
            .streams()
            .best(Type::Video)
            .ok_or_else(|| anyhow::anyhow!("no video stream found in {location}"))?;
        let video_stream_index = stream.index();

        let context = ffmpeg::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = context.decoder().video()?;

        let scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            Flags::BILINEAR,
        )?;

        Ok(Self {
            input,
            decoder,
            scaler,
            video_stream_index,
        })
    }
}

impl FrameDecoder for FfmpegDecoder {
    fn next_frame(&mut self) -> anyhow::Result<Option<DecodedFrame>> {
        for (stream, packet) in self.input.packets() {
            if stream.index() != self.video_stream_index {
                continue;
            }

            self.decoder.send_packet(&packet)?;

            let mut decoded = FfmpegVideoFrame::empty();
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                let mut rgb_frame = FfmpegVideoFrame::empty();
                self.scaler.run(&decoded, &mut rgb_frame)?;

                let width = rgb_frame.width();
                let height = rgb_frame.height();
                let stride = rgb_frame.stride(0);
                let data = rgb_frame.data(0);

                let mut rgb = Vec::with_capacity((width * height * 3) as usize);
                for row in 0..height as usize {
                    let start = row * stride;
                    rgb.extend_from_slice(&data[start..start + width as usize * 3]);
                }

                return Ok(Some(DecodedFrame { width, height, rgb }));
            }
        }

        Ok(None)
    }
}

/// Opens the decoder matching `source`.
pub fn open_decoder(source: &CaptureSource) -> anyhow::Result<Box<dyn FrameDecoder>> {
    match source {
        CaptureSource::Camera(index) => Ok(Box::new(CameraDecoder::open(*index)?)),
        CaptureSource::File(path) => Ok(Box::new(FfmpegDecoder::open(&path.to_string_lossy())?)),
        CaptureSource::Stream(url) => Ok(Box::new(FfmpegDecoder::open(url)?)),
    }
}

/// PNG-encodes a decoded frame, matching the reference capture flow's
/// `cv2.imencode(".png", frame)` step.
pub fn encode_png(frame: &DecodedFrame) -> anyhow::Result<Vec<u8>> {
    let buffer: ImageBuffer<Rgb<u8>, _> = ImageBuffer::from_raw(frame.width, frame.height, frame.rgb.clone())
        .ok_or_else(|| anyhow::anyhow!("decoded frame buffer size does not match its dimensions"))?;

    let mut bytes = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut bytes);
    buffer.write_to(&mut cursor, image::ImageOutputFormat::Png)?;
    Ok(bytes)
}

/// Applies the Capture Worker's 1-in-N sampling (§4.1) over whichever
/// `FrameDecoder` is in use: a frame is decoded and discarded for every
/// `frame_skip - 1` frames between kept ones.
pub struct FrameSampler {
    decoder: Box<dyn FrameDecoder>,
    frame_skip: u64,
    frame_counter: u64,
}

impl FrameSampler {
    pub fn new(decoder: Box<dyn FrameDecoder>, frame_skip: u32) -> Self {
        Self {
            decoder,
            frame_skip: frame_skip.max(1) as u64,
            frame_counter: 0,
        }
    }

    /// Advances through decoded frames until the next one due for upload,
    /// or `Ok(None)` once the source is exhausted.
    pub fn next_sampled(&mut self) -> anyhow::Result<Option<DecodedFrame>> {
        loop {
            match self.decoder.next_frame()? {
                None => return Ok(None),
                Some(frame) => {
                    self.frame_counter += 1;
                    if self.frame_counter % self.frame_skip == 0 {
                        return Ok(Some(frame));
                    }
                    debug!(frame_counter = self.frame_counter, "frame skipped by sampler");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct FakeDecoder {
        remaining: VecDeque<u32>,
    }

    impl FakeDecoder {
        fn new(count: u32) -> Self {
            Self {
                remaining: (1..=count).collect(),
            }
        }
    }

    impl FrameDecoder for FakeDecoder {
        fn next_frame(&mut self) -> anyhow::Result<Option<DecodedFrame>> {
            Ok(self.remaining.pop_front().map(|n| DecodedFrame {
                width: 1,
                height: 1,
                rgb: vec![n as u8, 0, 0],
            }))
        }
    }

    #[test]
    fn keeps_every_nth_frame() {
        let mut sampler = FrameSampler::new(Box::new(FakeDecoder::new(9)), 3);

        let mut kept = Vec::new();
        while let Some(frame) = sampler.next_sampled().unwrap() {
            kept.push(frame.rgb[0]);
        }

        assert_eq!(kept, vec![3, 6, 9]);
    }

    #[test]
    fn zero_frame_skip_is_clamped_to_one() {
        let mut sampler = FrameSampler::new(Box::new(FakeDecoder::new(3)), 0);

        let mut kept = Vec::new();
        while let Some(frame) = sampler.next_sampled().unwrap() {
            kept.push(frame.rgb[0]);
        }

        assert_eq!(kept, vec![1, 2, 3]);
    }

    #[test]
    fn exhausted_source_returns_none() {
        let mut sampler = FrameSampler::new(Box::new(FakeDecoder::new(0)), 1);
        assert!(sampler.next_sampled().unwrap().is_none());
    }

    #[test]
    fn encode_png_round_trips_through_image_decoder() {
        let frame = DecodedFrame {
            width: 2,
            height: 1,
            rgb: vec![255, 0, 0, 0, 255, 0],
        };
        let bytes = encode_png(&frame).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 2);
        assert_eq!(decoded.height(), 1);
    }
}
