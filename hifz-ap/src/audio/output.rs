//! Audio output using cpal
//!
//! Each started clip gets its own output thread: `cpal::Stream` is not
//! `Send`, so the stream is built, played and dropped on that thread and
//! controlled through a std channel.
//!
//! Speed is a live playback-rate multiplier read by the callback on every
//! buffer. The callback walks the decoded clip with a fractional cursor and
//! linear interpolation, which also covers sample-rate conversion to the
//! device rate.

use crate::audio::backend::EndNotifier;
use crate::audio::decoder::DecodedAudio;
use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// Messages to the output thread
enum OutputSignal {
    /// Stop immediately without reporting an end
    Halt,
    /// The callback ran past the last frame
    Drained,
    /// The stream reported an error
    Failed(String),
}

/// Handle to a running output thread
pub struct OutputHandle {
    control: Option<std_mpsc::Sender<OutputSignal>>,
}

impl OutputHandle {
    /// Stop output; the end notifier is dropped without a value
    pub fn halt(&mut self) {
        if let Some(control) = self.control.take() {
            let _ = control.send(OutputSignal::Halt);
        }
    }
}

impl Drop for OutputHandle {
    fn drop(&mut self) {
        self.halt();
    }
}

/// Spawn an output thread playing `audio`
///
/// `ready` resolves once the stream is playing (or failed to open). `done`
/// receives the natural end or a stream failure; it is dropped unsent when
/// the handle is halted.
pub fn spawn_output(
    device_name: Option<String>,
    audio: DecodedAudio,
    speed: Arc<AtomicU64>,
    done: EndNotifier,
    ready: oneshot::Sender<Result<()>>,
) -> Result<OutputHandle> {
    let (tx, rx) = std_mpsc::channel();
    let control = tx.clone();

    std::thread::Builder::new()
        .name("hifz-audio-out".to_string())
        .spawn(move || {
            let stream = match open_stream(device_name.as_deref(), audio, speed, tx) {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready.send(Err(e));
                    return;
                }
            };
            if let Err(e) = stream.play() {
                let _ = ready.send(Err(Error::AudioOutput(format!(
                    "Failed to start stream: {}",
                    e
                ))));
                return;
            }
            let _ = ready.send(Ok(()));

            let outcome = match rx.recv() {
                Ok(OutputSignal::Drained) => Some(Ok(())),
                Ok(OutputSignal::Failed(reason)) => Some(Err(reason)),
                Ok(OutputSignal::Halt) | Err(_) => None,
            };
            drop(stream);
            if let Some(outcome) = outcome {
                let _ = done.send(outcome);
            }
            debug!("Audio output thread exiting");
        })
        .map_err(|e| Error::AudioOutput(format!("Failed to spawn output thread: {}", e)))?;

    Ok(OutputHandle {
        control: Some(control),
    })
}

/// Find the named output device, falling back to the default device
fn select_device(device_name: Option<&str>) -> Result<Device> {
    let host = cpal::default_host();

    if let Some(name) = device_name {
        let mut devices = host
            .output_devices()
            .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?;
        if let Some(device) = devices.find(|d| d.name().ok().as_deref() == Some(name)) {
            return Ok(device);
        }
        warn!("Requested device '{}' not found, falling back to default device", name);
    }

    host.default_output_device()
        .ok_or_else(|| Error::AudioOutput("No default output device found".to_string()))
}

fn open_stream(
    device_name: Option<&str>,
    audio: DecodedAudio,
    speed: Arc<AtomicU64>,
    signals: std_mpsc::Sender<OutputSignal>,
) -> Result<Stream> {
    let device = select_device(device_name)?;
    let supported = device
        .default_output_config()
        .map_err(|e| Error::AudioOutput(format!("Failed to get default config: {}", e)))?;
    let sample_format = supported.sample_format();
    let config: StreamConfig = supported.config();

    info!(
        "Audio output: {} at {} Hz, {} channel(s), {:?}",
        device.name().unwrap_or_else(|_| "Unknown".to_string()),
        config.sample_rate.0,
        config.channels,
        sample_format
    );

    let renderer = Renderer::new(audio, config.sample_rate.0, speed, signals.clone());
    match sample_format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, renderer, signals),
        SampleFormat::I16 => build_stream::<i16>(&device, &config, renderer, signals),
        SampleFormat::U16 => build_stream::<u16>(&device, &config, renderer, signals),
        other => Err(Error::AudioOutput(format!(
            "Unsupported sample format: {:?}",
            other
        ))),
    }
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    mut renderer: Renderer,
    signals: std_mpsc::Sender<OutputSignal>,
) -> Result<Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = usize::from(config.channels);
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                renderer.refresh_step();
                for frame in data.chunks_mut(channels) {
                    renderer.render_frame(frame);
                }
            },
            move |err| {
                error!("Audio stream error: {}", err);
                let _ = signals.send(OutputSignal::Failed(err.to_string()));
            },
            None,
        )
        .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))
}

/// Reads the decoded clip at a variable rate
struct Renderer {
    audio: DecodedAudio,
    device_rate: u32,
    /// Fractional source frame position
    position: f64,
    step: f64,
    speed: Arc<AtomicU64>,
    drained: bool,
    signals: std_mpsc::Sender<OutputSignal>,
}

impl Renderer {
    fn new(
        audio: DecodedAudio,
        device_rate: u32,
        speed: Arc<AtomicU64>,
        signals: std_mpsc::Sender<OutputSignal>,
    ) -> Self {
        let mut renderer = Self {
            audio,
            device_rate,
            position: 0.0,
            step: 1.0,
            speed,
            drained: false,
            signals,
        };
        renderer.refresh_step();
        renderer
    }

    fn refresh_step(&mut self) {
        let speed = f64::from_bits(self.speed.load(Ordering::Relaxed));
        self.step = source_step(speed, self.audio.sample_rate, self.device_rate);
    }

    fn render_frame<T: Sample + FromSample<f32>>(&mut self, frame: &mut [T]) {
        let channels = self.audio.channels;
        let index = self.position as usize;
        if channels == 0 || index + 1 >= self.audio.frames() {
            if !self.drained {
                self.drained = true;
                let _ = self.signals.send(OutputSignal::Drained);
            }
            frame.fill(T::EQUILIBRIUM);
            return;
        }

        let frac = (self.position - index as f64) as f32;
        let current = &self.audio.samples[index * channels..(index + 1) * channels];
        let next = &self.audio.samples[(index + 1) * channels..(index + 2) * channels];
        for (ch, out) in frame.iter_mut().enumerate() {
            let src = ch.min(channels - 1);
            let value = current[src] + (next[src] - current[src]) * frac;
            *out = T::from_sample(value.clamp(-1.0, 1.0));
        }
        self.position += self.step;
    }
}

/// Source frames consumed per device frame
fn source_step(speed: f64, source_rate: u32, device_rate: u32) -> f64 {
    if device_rate == 0 || !speed.is_finite() || speed <= 0.0 {
        return 1.0;
    }
    speed * f64::from(source_rate) / f64::from(device_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize) -> DecodedAudio {
        DecodedAudio {
            samples: (0..frames).map(|i| i as f32 / frames as f32).collect(),
            sample_rate: 8_000,
            channels: 1,
        }
    }

    fn renderer(audio: DecodedAudio, speed: f64) -> (Renderer, std_mpsc::Receiver<OutputSignal>) {
        let (tx, rx) = std_mpsc::channel();
        let speed = Arc::new(AtomicU64::new(speed.to_bits()));
        (Renderer::new(audio, 8_000, speed, tx), rx)
    }

    #[test]
    fn test_source_step() {
        assert_eq!(source_step(1.0, 44_100, 44_100), 1.0);
        assert_eq!(source_step(2.0, 22_050, 44_100), 1.0);
        assert_eq!(source_step(0.5, 48_000, 48_000), 0.5);
        assert_eq!(source_step(f64::NAN, 48_000, 48_000), 1.0);
    }

    #[test]
    fn test_double_speed_drains_in_half_the_frames() {
        let (mut r, rx) = renderer(ramp(100), 2.0);
        let mut frame = [0.0f32; 2];
        let mut rendered = 0;
        while !r.drained {
            r.render_frame(&mut frame);
            rendered += 1;
        }
        // Last rendered frame is silence
        assert_eq!(rendered, 51);
        assert!(matches!(rx.try_recv(), Ok(OutputSignal::Drained)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_mono_is_copied_to_every_channel() {
        let (mut r, _rx) = renderer(ramp(10), 1.0);
        r.position = 2.5;
        let mut frame = [0.0f32; 2];
        r.render_frame(&mut frame);
        assert!((frame[0] - 0.25).abs() < 1e-6);
        assert_eq!(frame[0], frame[1]);
    }

    #[test]
    fn test_speed_change_applies_on_refresh() {
        let (mut r, _rx) = renderer(ramp(10), 1.0);
        r.speed.store(1.5f64.to_bits(), Ordering::Relaxed);
        assert_eq!(r.step, 1.0);
        r.refresh_step();
        assert_eq!(r.step, 1.5);
    }
}
