use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use alsa::pcm::PCM;
use anyhow::Result;

use super::alsa_device::AlsaParams;
use super::channel_table::ChannelTable;
use super::route;

/// Drive the sound card: one table render per hardware period.
///
/// Each pass drains every slot's ring into its channel plane, interleaves
/// into the ALSA access layout, and writes one period. `writei` blocks until
/// the device has room, which is what paces this loop to the hardware clock.
/// Underruns are recovered with `prepare`, with a retry fuse so a wedged
/// device cannot dead-loop us.
pub fn play_thread(
    pcm: PCM,
    params: &AlsaParams,
    table: Arc<ChannelTable>,
    running: &AtomicBool,
) -> Result<()> {
    let channels = params.channels as usize;
    let frames = params.period_size;

    let io = pcm.io_i16()?;

    // All buffers for the real-time loop are allocated up front.
    let mut planes = vec![0i16; channels * frames];
    let mut interleaved = vec![0i16; channels * frames];

    log::info!(
        "Playback started: rate={}, channels={}, period={}",
        params.sample_rate,
        channels,
        frames,
    );

    while running.load(Ordering::Relaxed) {
        // One period per channel, silence where a slot has nothing buffered.
        route::render(&table, &mut planes, frames);

        for frame in 0..frames {
            for ch in 0..channels {
                interleaved[frame * channels + ch] = planes[ch * frames + frame];
            }
        }

        let mut frames_written = 0;
        let mut retry_count = 0u32;
        while frames_written < frames {
            let offset = frames_written * channels;
            match io.writei(&interleaved[offset..]) {
                Ok(n) => {
                    frames_written += n;
                    retry_count = 0;
                }
                Err(e) => {
                    log::warn!("ALSA XRUN or error: {}, recovering...", e);
                    retry_count += 1;

                    if let Err(e2) = pcm.prepare() {
                        log::error!("Failed to recover PCM playback: {}", e2);
                        return Err(e2.into());
                    }

                    if retry_count >= 3 {
                        log::error!(
                            "Max recovery retries ({}) reached. Dropping {} unwritten frames of this period.",
                            retry_count,
                            frames - frames_written
                        );
                        break;
                    }
                }
            }
        }
    }

    log::info!("Playback stopped");
    Ok(())
}
