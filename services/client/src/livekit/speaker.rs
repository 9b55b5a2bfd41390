//! Speaker playback for the agent's voice.

use anyhow::{Context, anyhow};
use cpal::Sample;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use futures::StreamExt;
use mozart_core::{AudioFormat, InboundStream, MediaSink};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::{Arc, Mutex, mpsc as std_mpsc};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Half a second of buffered audio at most; incoming samples are dropped while the ring is full.
const BUFFER_SECONDS: f32 = 0.5;

/// The default output device, fed through a ring buffer.
///
/// Only the most recently attached stream plays. The device stays open
/// across sessions.
pub struct SpeakerSink {
    format: AudioFormat,
    producer: Arc<Mutex<HeapProd<f32>>>,
    pump: Mutex<Option<JoinHandle<()>>>,
    _stop: std_mpsc::Sender<()>,
}

impl SpeakerSink {
    pub async fn open() -> anyhow::Result<Self> {
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();
        let (ready_tx, ready_rx) = oneshot::channel();

        std::thread::Builder::new()
            .name("speaker".to_string())
            .spawn(move || {
                match open_output() {
                    Ok((stream, format, producer)) => {
                        let _ = ready_tx.send(Ok((format, producer)));
                        // Blocks until the sink is dropped.
                        let _ = stop_rx.recv();
                        drop(stream);
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                    }
                }
            })
            .context("Failed to spawn speaker thread")?;

        let (format, producer) = ready_rx
            .await
            .context("Speaker thread exited before opening the device")??;
        info!(
            sample_rate = format.sample_rate,
            channels = format.channels,
            "Speaker opened"
        );

        Ok(Self {
            format,
            producer: Arc::new(Mutex::new(producer)),
            pump: Mutex::new(None),
            _stop: stop_tx,
        })
    }
}

impl MediaSink for SpeakerSink {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn attach(&self, stream: InboundStream) {
        debug!(track_id = stream.track_id(), "Speaker source replaced");
        let producer = self.producer.clone();
        let mut frames = stream.into_frames();
        let pump = tokio::spawn(async move {
            while let Some(frame) = frames.next().await {
                let Ok(mut ring) = producer.lock() else {
                    break;
                };
                let dropped = queue_samples(&mut *ring, &frame.samples);
                if dropped > 0 {
                    debug!(dropped, "Speaker buffer full");
                }
            }
        });

        if let Ok(mut slot) = self.pump.lock() {
            if let Some(previous) = slot.replace(pump) {
                previous.abort();
            }
        }
    }
}

impl Drop for SpeakerSink {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.pump.lock() {
            if let Some(pump) = slot.take() {
                pump.abort();
            }
        }
    }
}

/// Pushes `samples` into the ring, returning how many did not fit.
fn queue_samples<P>(ring: &mut P, samples: &[i16]) -> usize
where
    P: Producer<Item = f32>,
{
    samples
        .iter()
        .filter(|&&sample| ring.try_push(sample.to_sample::<f32>()).is_err())
        .count()
}

type Opened = (cpal::Stream, AudioFormat, HeapProd<f32>);

fn open_output() -> anyhow::Result<Opened> {
    let device = cpal::default_host()
        .default_output_device()
        .ok_or_else(|| anyhow!("No output device available"))?;
    let supported = device.default_output_config()?;
    let config: cpal::StreamConfig = supported.config();
    let format = AudioFormat {
        sample_rate: config.sample_rate.0,
        channels: config.channels as u32,
    };

    let capacity = (format.sample_rate as f32 * format.channels as f32 * BUFFER_SECONDS) as usize;
    let (producer, consumer) = HeapRb::<f32>::new(capacity.max(1)).split();

    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => build_output::<f32>(&device, &config, consumer)?,
        cpal::SampleFormat::I16 => build_output::<i16>(&device, &config, consumer)?,
        cpal::SampleFormat::U16 => build_output::<u16>(&device, &config, consumer)?,
        other => return Err(anyhow!("Unsupported output sample format {other:?}")),
    };
    stream.play()?;

    Ok((stream, format, producer))
}

/// Plays silence whenever the ring runs dry.
fn build_output<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut consumer: HeapCons<f32>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            for sample in data.iter_mut() {
                *sample = T::from_sample(consumer.try_pop().unwrap_or(0.0));
            }
        },
        |err| error!(error = %err, "Speaker stream error"),
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::traits::Observer;

    #[test]
    fn test_queue_samples_keeps_buffered_audio_when_full() {
        let (mut producer, mut consumer) = HeapRb::<f32>::new(4).split();

        let dropped = queue_samples(&mut producer, &[0, 16384, -16384, 0, 8192, 8192]);

        assert_eq!(dropped, 2);
        let played: Vec<f32> = std::iter::from_fn(|| consumer.try_pop()).collect();
        assert_eq!(played, vec![0.0, 0.5, -0.5, 0.0]);
    }

    #[test]
    fn test_queue_samples_accepts_everything_with_room() {
        let (mut producer, consumer) = HeapRb::<f32>::new(8).split();

        assert_eq!(queue_samples(&mut producer, &[1, 2, 3]), 0);
        assert_eq!(consumer.occupied_len(), 3);
    }
}
