//! Audio device handling and stream processing

use crate::analyser::Analyser;
use crate::constants::audio::{BUFFER_SIZE, DEFAULT_CHANNELS, FFT_SIZE};
use crate::error::{AppError, AppResult};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};

/// Source of capture streams, one per listening session
pub trait AudioBackend {
    type Capture: CaptureStream;

    /// Open the microphone and start delivering samples
    fn acquire(&mut self) -> AppResult<Self::Capture>;
}

/// A live input stream the meter pulls frames from
pub trait CaptureStream {
    /// Samples per time-domain frame
    fn frame_len(&self) -> usize;
    /// Bins per frequency snapshot
    fn bin_count(&self) -> usize;
    /// Fill `out` with the latest time-domain samples in `[-1, 1]`
    fn time_domain(&mut self, out: &mut [f32]);
    /// Fill `out` with the latest byte-scaled magnitudes
    fn frequency_data(&mut self, out: &mut [u8]);
    /// Stop the stream and hand the device back
    fn release(self);
}

/// Audio configuration and device information
pub struct AudioConfig {
    pub device_name: String,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Find and configure an audio input device
pub fn setup_audio_device(device_name: Option<&str>) -> AppResult<(cpal::Device, AudioConfig)> {
    let host = cpal::default_host();

    let device = if let Some(name) = device_name {
        host.input_devices()?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| AppError::CapabilityDenied(format!("input device '{}' not found", name)))?
    } else {
        host.default_input_device()
            .ok_or_else(|| AppError::CapabilityDenied("no default input device available".to_string()))?
    };

    let device_name = device.name()?;

    let mut supported_configs = device.supported_input_configs()?;
    let config_range = supported_configs
        .next()
        .ok_or_else(|| AppError::AudioDevice("No supported input configs found".to_string()))?;

    // Prefer 44.1kHz when the device supports it
    let sample_rate = if config_range.min_sample_rate().0 <= 44100 && config_range.max_sample_rate().0 >= 44100 {
        44100
    } else {
        config_range.min_sample_rate().0
    };

    let channels = if config_range.channels() >= DEFAULT_CHANNELS {
        DEFAULT_CHANNELS
    } else {
        config_range.channels()
    };

    let audio_config = AudioConfig {
        device_name,
        sample_rate,
        channels,
    };

    Ok((device, audio_config))
}

/// Build an audio input stream with the given callback
pub fn build_audio_stream<F>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    data_callback: F,
) -> AppResult<cpal::Stream>
where
    F: FnMut(&[f32], &cpal::InputCallbackInfo) + Send + 'static,
{
    let stream = device.build_input_stream(
        config,
        data_callback,
        |err| tracing::error!("Audio stream error: {}", err),
        None,
    )?;

    Ok(stream)
}

/// Audio callback that feeds captured samples into the shared analyser
pub fn create_audio_callback(
    analyser: Arc<Mutex<Analyser>>,
    channels: usize,
) -> impl FnMut(&[f32], &cpal::InputCallbackInfo) + Send + 'static {
    move |data: &[f32], _: &cpal::InputCallbackInfo| {
        if let Ok(mut analyser) = analyser.lock() {
            analyser.push_interleaved(data, channels);
        }
    }
}

/// Opens the system microphone through cpal
pub struct CpalBackend {
    device_name: Option<String>,
}

impl CpalBackend {
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }
}

impl AudioBackend for CpalBackend {
    type Capture = CpalCapture;

    fn acquire(&mut self) -> AppResult<CpalCapture> {
        let (device, audio_config) = setup_audio_device(self.device_name.as_deref())?;

        let analyser = Arc::new(Mutex::new(Analyser::new(FFT_SIZE)));
        let callback = create_audio_callback(Arc::clone(&analyser), audio_config.channels as usize);

        let config = cpal::StreamConfig {
            channels: audio_config.channels,
            sample_rate: cpal::SampleRate(audio_config.sample_rate),
            buffer_size: BUFFER_SIZE,
        };

        let stream = build_audio_stream(&device, &config, callback)?;
        stream.play()?;

        tracing::info!(
            device = %audio_config.device_name,
            sample_rate = audio_config.sample_rate,
            channels = audio_config.channels,
            "microphone stream started"
        );

        Ok(CpalCapture {
            stream,
            analyser,
            device_name: audio_config.device_name,
        })
    }
}

/// A running cpal input stream and the analyser it writes into
pub struct CpalCapture {
    stream: cpal::Stream,
    analyser: Arc<Mutex<Analyser>>,
    device_name: String,
}

impl CaptureStream for CpalCapture {
    fn frame_len(&self) -> usize {
        FFT_SIZE
    }

    fn bin_count(&self) -> usize {
        FFT_SIZE / 2
    }

    fn time_domain(&mut self, out: &mut [f32]) {
        match self.analyser.lock() {
            Ok(analyser) => analyser.time_domain(out),
            Err(_) => out.fill(0.0),
        }
    }

    fn frequency_data(&mut self, out: &mut [u8]) {
        match self.analyser.lock() {
            Ok(mut analyser) => analyser.byte_frequency_data(out),
            Err(_) => out.fill(0),
        }
    }

    fn release(self) {
        if let Err(e) = self.stream.pause() {
            tracing::warn!("Failed to pause input stream: {}", e);
        }
        tracing::info!(device = %self.device_name, "microphone stream released");
    }
}

/// Names of every input device the default host can see
pub fn input_device_names() -> AppResult<Vec<String>> {
    let host = cpal::default_host();
    let devices = host.input_devices()?;
    Ok(devices.filter_map(|d| d.name().ok()).collect())
}
