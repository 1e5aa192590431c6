//! Polyphonic synth on the default output device

use super::sink::TriggerSink;
use super::voice::Voice;
use anyhow::{anyhow, Result};
use codechord_core::types::settings::{db_to_gain, DEFAULT_VOLUME_DB};
use codechord_core::types::{AdsrParams, PitchName, Waveform};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use crossbeam_channel::{bounded, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Level of a single voice before the master gain, leaving headroom for
/// six-note chords
const VOICE_LEVEL: f32 = 0.15;

/// State shared between the handle and the audio callback
pub struct SynthState {
    pub voices: Vec<Voice>,
    pub sample_rate: f32,
    pub gain: f32,
    pub waveform: Waveform,
    pub envelope: AdsrParams,
}

impl SynthState {
    fn new(sample_rate: f32) -> Self {
        Self {
            voices: Vec::new(),
            sample_rate,
            gain: db_to_gain(DEFAULT_VOLUME_DB),
            waveform: Waveform::default(),
            envelope: AdsrParams::default(),
        }
    }

    /// Mix one mono sample and drop voices that have rung out
    fn next_sample(&mut self) -> f32 {
        let mut mixed = 0.0;
        for voice in &mut self.voices {
            mixed += voice.next_sample();
        }
        self.voices.retain(|v| !v.is_finished());
        (mixed * VOICE_LEVEL * self.gain).clamp(-1.0, 1.0)
    }
}

/// Handle to the synth. The cpal stream lives on its own thread because it
/// cannot be moved between threads on every platform.
pub struct AudioPlayerHandle {
    state: Arc<Mutex<SynthState>>,
    shutdown_tx: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl AudioPlayerHandle {
    /// Open the default output device and start the stream
    pub fn new() -> Result<Self> {
        let (ready_tx, ready_rx) = bounded::<Result<Arc<Mutex<SynthState>>>>(1);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

        let thread = thread::Builder::new()
            .name("codechord-audio".into())
            .spawn(move || match open_stream() {
                Ok((stream, state)) => {
                    let _ = ready_tx.send(Ok(state));
                    // Keep the stream alive until the handle drops
                    let _ = shutdown_rx.recv();
                    drop(stream);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })?;

        let state = ready_rx
            .recv()
            .map_err(|_| anyhow!("Audio thread exited during setup"))??;
        log::info!("Audio output ready");

        Ok(Self {
            state,
            shutdown_tx,
            thread: Some(thread),
        })
    }

    pub fn set_waveform(&self, waveform: Waveform) -> Result<()> {
        self.lock()?.waveform = waveform;
        Ok(())
    }

    pub fn set_envelope(&self, envelope: AdsrParams) -> Result<()> {
        self.lock()?.envelope = envelope;
        Ok(())
    }

    /// Number of voices still sounding or waiting to start
    pub fn active_voices(&self) -> usize {
        self.lock().map(|s| s.voices.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, SynthState>> {
        self.state
            .lock()
            .map_err(|e| anyhow!("Failed to lock audio state: {}", e))
    }
}

impl TriggerSink for AudioPlayerHandle {
    fn trigger(&self, pitches: &[PitchName], duration: Duration, delay: Duration) {
        let mut state = match self.lock() {
            Ok(state) => state,
            Err(e) => {
                log::error!("{}", e);
                return;
            }
        };

        for pitch in pitches {
            match pitch.frequency() {
                Some(frequency) => {
                    let voice = Voice::new(
                        frequency,
                        state.sample_rate,
                        state.waveform,
                        state.envelope,
                        delay.as_secs_f32(),
                        duration.as_secs_f32(),
                    );
                    state.voices.push(voice);
                }
                None => log::debug!("Skipping {}: no frequency", pitch),
            }
        }
    }

    fn set_volume_db(&self, db: f32) {
        if let Ok(mut state) = self.lock() {
            state.gain = db_to_gain(db);
        }
    }

    fn silence(&self) {
        if let Ok(mut state) = self.lock() {
            // Voices that have not started yet are dropped outright
            state.voices.retain(|v| !v.is_pending());
            for voice in &mut state.voices {
                voice.release();
            }
        }
    }
}

impl Drop for AudioPlayerHandle {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn open_stream() -> Result<(Stream, Arc<Mutex<SynthState>>)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow!("No output device available"))?;
    let config = device.default_output_config()?;

    let sample_format = config.sample_format();
    let config: StreamConfig = config.into();
    let state = Arc::new(Mutex::new(SynthState::new(config.sample_rate.0 as f32)));

    let stream = match sample_format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, state.clone())?,
        SampleFormat::I16 => build_stream::<i16>(&device, &config, state.clone())?,
        SampleFormat::U16 => build_stream::<u16>(&device, &config, state.clone())?,
        _ => return Err(anyhow!("Unsupported sample format: {:?}", sample_format)),
    };
    stream
        .play()
        .map_err(|e| anyhow!("Failed to play stream: {}", e))?;

    Ok((stream, state))
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    state: Arc<Mutex<SynthState>>,
) -> Result<Stream>
where
    T: Sample + SizedSample + Send + 'static + cpal::FromSample<f32>,
{
    let channels = config.channels as usize;
    let err_fn = |err| log::error!("Audio stream error: {}", err);

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let mut state = match state.lock() {
                    Ok(state) => state,
                    Err(_) => {
                        data.fill(T::EQUILIBRIUM);
                        return;
                    }
                };
                for frame in data.chunks_mut(channels) {
                    let value: T = T::from_sample(state.next_sample());
                    frame.fill(value);
                }
            },
            err_fn,
            None,
        )
        .map_err(|e| anyhow!("Failed to build output stream: {}", e))?;

    Ok(stream)
}
