//! Default input device published into the room as the user's voice.

use cpal::Sample;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use livekit::options::TrackPublishOptions;
use livekit::prelude::{LocalAudioTrack, LocalTrack, Room, TrackSource};
use livekit::webrtc::audio_frame::AudioFrame;
use livekit::webrtc::audio_source::native::NativeAudioSource;
use livekit::webrtc::audio_source::{AudioSourceOptions, RtcAudioSource};
use mozart_core::SessionError;
use std::borrow::Cow;
use std::sync::mpsc as std_mpsc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Mono PCM16 blocks captured from the input device.
type Captured = mpsc::UnboundedSender<Vec<i16>>;

/// A running capture. The cpal stream lives on its own thread because it is
/// not `Send`; dropping the stop sender ends that thread.
pub struct Microphone {
    stop: Option<std_mpsc::Sender<()>>,
    forward: JoinHandle<()>,
}

impl Microphone {
    /// Opens the default input device and publishes it as a microphone track.
    pub async fn publish(room: &Room) -> Result<Self, SessionError> {
        let (captured_tx, mut captured_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = std_mpsc::channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        std::thread::Builder::new()
            .name("microphone".to_string())
            .spawn(move || run_capture(captured_tx, stop_rx, ready_tx))
            .map_err(|e| SessionError::Start(format!("Could not start microphone: {e}")))?;

        let sample_rate = ready_rx
            .await
            .map_err(|_| SessionError::Start("Microphone thread exited".to_string()))?
            .map_err(SessionError::Start)?;

        let source = NativeAudioSource::new(AudioSourceOptions::default(), sample_rate, 1);
        let track = LocalAudioTrack::create_audio_track(
            "microphone",
            RtcAudioSource::Native(source.clone()),
        );
        room.local_participant()
            .publish_track(
                LocalTrack::Audio(track),
                TrackPublishOptions {
                    source: TrackSource::Microphone,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| SessionError::Start(e.to_string()))?;
        info!(sample_rate, "Microphone published");

        let forward = tokio::spawn(async move {
            while let Some(samples) = captured_rx.recv().await {
                let samples_per_channel = samples.len() as u32;
                let frame = AudioFrame {
                    data: Cow::Owned(samples),
                    sample_rate,
                    num_channels: 1,
                    samples_per_channel,
                };
                if let Err(e) = source.capture_frame(&frame).await {
                    warn!(error = %e, "Failed to push microphone audio");
                }
            }
        });

        Ok(Self {
            stop: Some(stop_tx),
            forward,
        })
    }

    pub fn stop(&mut self) {
        self.stop.take();
        self.forward.abort();
    }
}

/// Owns the cpal input stream until told to stop. Reports the device sample
/// rate, or why the device could not be opened, through `ready`.
fn run_capture(
    captured: Captured,
    stop: std_mpsc::Receiver<()>,
    ready: oneshot::Sender<Result<u32, String>>,
) {
    let stream = match open_input(captured) {
        Ok((stream, sample_rate)) => {
            let _ = ready.send(Ok(sample_rate));
            stream
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    // Blocks until the sender is dropped.
    let _ = stop.recv();
    drop(stream);
}

fn open_input(captured: Captured) -> Result<(cpal::Stream, u32), String> {
    let device = cpal::default_host()
        .default_input_device()
        .ok_or_else(|| "No input device available".to_string())?;
    let supported = device.default_input_config().map_err(|e| e.to_string())?;
    let config: cpal::StreamConfig = supported.config();

    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => build_input::<f32>(&device, &config, captured),
        cpal::SampleFormat::I16 => build_input::<i16>(&device, &config, captured),
        cpal::SampleFormat::U16 => build_input::<u16>(&device, &config, captured),
        other => return Err(format!("Unsupported input sample format {other:?}")),
    }
    .map_err(|e| e.to_string())?;
    stream.play().map_err(|e| e.to_string())?;

    Ok((stream, config.sample_rate.0))
}

/// Keeps the first channel of every input frame.
fn build_input<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    captured: Captured,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample,
    i16: cpal::FromSample<T>,
{
    let channels = config.channels.max(1) as usize;
    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let mono: Vec<i16> = data
                .chunks(channels)
                .map(|frame| frame[0].to_sample::<i16>())
                .collect();
            let _ = captured.send(mono);
        },
        |err| error!(error = %err, "Microphone stream error"),
        None,
    )
}
