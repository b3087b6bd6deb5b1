use crate::config::AudioConfig;
use crate::error::{RangerError, Result};
use audio_thread_priority::RtPriorityHandle;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;

pub struct AudioCapture {
    stream: cpal::Stream,
    _rt_handle: Option<RtPriorityHandle>,
}

impl AudioCapture {
    /// Open a mono input stream and start shipping sample chunks to `tx`.
    ///
    /// With `device_name` set, the first input device whose description
    /// contains the string is used; otherwise the host default.
    pub fn new(config: &AudioConfig, tx: Sender<Vec<f32>>, device_name: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();

        let device = match device_name {
            Some(name) => find_input_device(&host, name)?,
            None => host
                .default_input_device()
                .ok_or_else(|| RangerError::AudioDevice("No input device found".into()))?,
        };

        match device.description() {
            Ok(desc) => log::info!("Input device: {:?}", desc),
            Err(_) => log::info!("Input device: Unknown"),
        }

        let stream_config = cpal::StreamConfig {
            channels: config.channels,
            sample_rate: config.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(config.frame_size as u32),
        };

        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Send audio data to processing thread
                    if tx.send(data.to_vec()).is_err() {
                        log::warn!("Audio receiver dropped");
                    }
                },
                |err| eprintln!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| RangerError::AudioStream(format!("{}", e)))?;

        // Attempt to promote to real-time priority
        let rt_handle = audio_thread_priority::promote_current_thread_to_real_time(
            config.frame_size as u32,
            config.sample_rate,
        );

        let rt_handle = match rt_handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("Could not set real-time priority: {}", e);
                None
            }
        };

        stream
            .play()
            .map_err(|e| RangerError::AudioStream(format!("{}", e)))?;

        Ok(Self {
            stream,
            _rt_handle: rt_handle,
        })
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        let _ = self.stream.pause();
    }
}

fn find_input_device(host: &cpal::Host, name: &str) -> Result<cpal::Device> {
    let devices = host
        .input_devices()
        .map_err(|e| RangerError::AudioDevice(format!("{}", e)))?;

    for device in devices {
        if let Ok(desc) = device.description() {
            if format!("{:?}", desc).contains(name) {
                return Ok(device);
            }
        }
    }

    Err(RangerError::AudioDevice(format!(
        "No input device matching '{name}'"
    )))
}

/// Descriptions of all input devices the host exposes.
pub fn list_input_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .map_err(|e| RangerError::AudioDevice(format!("{}", e)))?;

    Ok(devices
        .filter_map(|d| d.description().ok().map(|desc| format!("{:?}", desc)))
        .collect())
}
