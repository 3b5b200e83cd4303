//! The AudioSystem that owns the playback thread and the channel table.
//!
//! Uses std::thread (NOT a tokio task) for real-time audio I/O to avoid
//! contention with async network tasks.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use anyhow::Result;

use super::alsa_device;
use super::channel_table::ChannelTable;
use super::playback;

/// Audio output configuration.
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// ALSA playback device name (e.g. "default", a multichannel loopback)
    pub playback_device: String,
    /// Desired sample rate (may be negotiated by hardware)
    pub sample_rate: u32,
    /// Desired number of output channels = max simultaneous speakers
    pub max_channels: u32,
    /// Desired period size in frames (0 = let ALSA decide)
    pub period_size: usize,
    /// Per-slot ring capacity, in periods of buffered audio
    pub buffer_periods: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            playback_device: "default".to_string(),
            sample_rate: 48000,
            max_channels: 16,
            period_size: 128,
            buffer_periods: 1024,
        }
    }
}

/// Owns the playback thread plus the channel table it drains.
///
/// The table is sized from the parameters the hardware actually negotiated,
/// not the requested ones, so it is created here and handed out as an `Arc`
/// for the ingest and control sides.
pub struct AudioSystem {
    running: Arc<AtomicBool>,
    table: Arc<ChannelTable>,
    play_handle: Option<JoinHandle<()>>,
}

impl AudioSystem {
    /// Open the playback device and start the periodic output thread.
    pub fn start(config: &AudioConfig) -> Result<Self> {
        let period_size_opt = if config.period_size > 0 {
            Some(config.period_size)
        } else {
            None
        };
        let (pcm, params) = alsa_device::open_playback(
            &config.playback_device,
            config.sample_rate,
            config.max_channels,
            period_size_opt,
        )?;

        let table = Arc::new(ChannelTable::new(
            params.channels as usize,
            params.period_size * config.buffer_periods,
        ));

        log::info!(
            "AudioSystem starting — device: \"{}\", {} channels, ring of {} periods per channel",
            config.playback_device,
            params.channels,
            config.buffer_periods,
        );

        let running = Arc::new(AtomicBool::new(true));
        let play_handle = {
            let running = running.clone();
            let table = table.clone();
            thread::Builder::new().name("audio-play".into()).spawn(move || {
                if let Err(e) = playback::play_thread(pcm, &params, table, &running) {
                    log::error!("Playback thread error: {}", e);
                }
            })?
        };

        Ok(Self {
            running,
            table,
            play_handle: Some(play_handle),
        })
    }

    /// Shared handle to the channel assignment table.
    pub fn table(&self) -> Arc<ChannelTable> {
        self.table.clone()
    }

    /// Signal the playback thread to stop and wait for it to finish.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(h) = self.play_handle.take() {
            let _ = h.join();
        }
    }
}

impl Drop for AudioSystem {
    fn drop(&mut self) {
        self.stop();
    }
}
