use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info};

use crate::{
    engine::{context::AudioContext, processor::Processor},
    error::EngineError,
    MAX_BLOCK_SIZE,
};

/*
Device Output
=============

The cpal callback asks the processor for mono audio and copies each sample
to every channel of the device frame:

  processor.render(mono[..n])          n ≤ MAX_BLOCK_SIZE
        │
        ▼
  [ s0 s0 | s1 s1 | s2 s2 | ... ]      interleaved, one frame per sample

The processor sits behind a mutex shared with graph assembly. The callback
only ever `try_lock`s it; if the control side holds the lock the block is
silent rather than late.
*/

/// A running cpal output stream driving one `AudioContext`.
pub struct OutputStream {
    _stream: cpal::Stream,
    device_name: String,
    channels: usize,
    sample_rate: u32,
}

impl OutputStream {
    /// Open the default output device and create a context at its rate.
    pub fn open_default() -> Result<(Self, AudioContext), EngineError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(EngineError::NoOutputDevice)?;
        let device_name = device.name()?;
        let supported = device.default_output_config()?;

        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        let sample_rate = config.sample_rate.0;
        let channels = config.channels as usize;

        let context = AudioContext::new(sample_rate as f32);
        let processor = context.processor();

        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, processor)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, processor)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, processor)?,
            other => return Err(EngineError::UnsupportedSampleFormat(other)),
        };
        stream.play()?;

        info!(
            device = %device_name,
            sample_rate,
            channels,
            format = ?sample_format,
            "output stream started"
        );

        Ok((
            Self {
                _stream: stream,
                device_name,
                channels,
                sample_rate,
            },
            context,
        ))
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    processor: Arc<Mutex<Processor>>,
) -> Result<cpal::Stream, EngineError>
where
    T: cpal::Sample + cpal::FromSample<f32> + cpal::SizedSample + Send + 'static,
{
    let channels = config.channels as usize;
    let mut mono = vec![0.0f32; MAX_BLOCK_SIZE];

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _| {
            for frames in data.chunks_mut(MAX_BLOCK_SIZE * channels) {
                let block = &mut mono[..frames.len() / channels];
                match processor.try_lock() {
                    Ok(mut processor) => processor.render(block),
                    Err(_) => block.fill(0.0),
                }

                for (frame, &sample) in frames.chunks_mut(channels).zip(block.iter()) {
                    let value = T::from_sample(sample.clamp(-1.0, 1.0));
                    frame.fill(value);
                }
            }
        },
        |err| error!(%err, "output stream error"),
        None,
    )?;

    Ok(stream)
}
