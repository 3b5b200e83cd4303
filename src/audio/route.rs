//! The real-time data path between the voice session and the sound card.
//!
//! `ingest` runs on the session side whenever a burst of a participant's
//! audio arrives; `render` runs on the audio thread exactly once per hardware
//! period. They meet only at the per-slot ring buffers, and every failure
//! mode here (no free channel, ring full, ring empty) degrades to dropped or
//! silent audio rather than an error — the playback cadence must never stall
//! because the network did something odd.

use super::channel_table::{ChannelTable, UserId};

/// Average one interleaved stereo i16 burst down to mono.
///
/// Plain `(l + r) / 2` in i32: truncation toward zero, so positive and
/// negative sums round the same way. A trailing unpaired sample is ignored.
pub fn downmix_stereo(stereo: &[i16]) -> Vec<i16> {
    stereo
        .chunks_exact(2)
        .map(|pair| ((pair[0] as i32 + pair[1] as i32) / 2) as i16)
        .collect()
}

/// Route one inbound burst of interleaved stereo samples for `user`.
///
/// Resolves the speaker's channel, claiming the first free one on first
/// contact. With every channel taken the burst is dropped — admission
/// control, not an error, and the sender is never back-pressured. Likewise a
/// full ring drops the whole burst.
pub fn ingest(table: &ChannelTable, user: UserId, stereo: &[i16]) {
    let index = match table
        .find_claimed_slot(user)
        .or_else(|| table.claim_first_free(user))
    {
        Some(index) => index,
        None => {
            log::debug!("Dropping burst from user {}: all channels claimed", user);
            return;
        }
    };

    let mono = downmix_stereo(stereo);
    if mono.is_empty() {
        return;
    }
    if table.slots()[index].write_samples(&mono) == 0 {
        log::debug!(
            "Dropping {} samples for channel {}: ring full",
            mono.len(),
            index
        );
    }
}

/// Fill one hardware period of non-interleaved multichannel output.
///
/// `planes` is one contiguous `frames`-sample region per channel, in channel
/// order. Every slot is drained whether claimed or not; unclaimed or starved
/// slots come out as silence. Runs on the real-time thread: no allocation,
/// and each slot lock is held only for one bounded period copy.
pub fn render(table: &ChannelTable, planes: &mut [i16], frames: usize) {
    debug_assert_eq!(planes.len(), table.len() * frames);
    for (slot, region) in table.slots().iter().zip(planes.chunks_exact_mut(frames)) {
        slot.read_into(region);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Interleave a mono sequence as identical left/right pairs.
    fn as_stereo(mono: &[i16]) -> Vec<i16> {
        mono.iter().flat_map(|&s| [s, s]).collect()
    }

    #[test]
    fn downmix_averages_both_channels() {
        assert_eq!(downmix_stereo(&[100, 200, -100, -200]), vec![150, -150]);
    }

    #[test]
    fn downmix_rounds_negative_sums_toward_zero() {
        // (-3 + -4) / 2 is -3, not the -4 an arithmetic shift would give.
        assert_eq!(downmix_stereo(&[-3, -4]), vec![-3]);
        assert_eq!(downmix_stereo(&[3, 4]), vec![3]);
    }

    #[test]
    fn downmix_ignores_trailing_unpaired_sample() {
        assert_eq!(downmix_stereo(&[10, 20, 7]), vec![15]);
    }

    #[test]
    fn first_burst_claims_a_channel() {
        let table = ChannelTable::new(4, 8);
        ingest(&table, 42, &as_stereo(&[1, 2]));
        assert_eq!(table.find_claimed_slot(42), Some(0));
        assert_eq!(table.slots()[0].buffered(), 2);
    }

    #[test]
    fn periodic_drain_of_one_speaker() {
        // 4 channels, 8-sample rings, 2-frame hardware period.
        let table = ChannelTable::new(4, 8);
        ingest(&table, 42, &as_stereo(&[1, 2, 3, 4, 5, 6]));

        let frames = 2;
        let mut planes = vec![0i16; table.len() * frames];

        render(&table, &mut planes, frames);
        assert_eq!(planes[..2], [1, 2]);

        render(&table, &mut planes, frames);
        assert_eq!(planes[..2], [3, 4]);

        assert_eq!(table.slots()[0].buffered(), 2);
    }

    #[test]
    fn unclaimed_channels_render_silence() {
        let table = ChannelTable::new(3, 8);
        ingest(&table, 42, &as_stereo(&[9, 9]));

        let frames = 2;
        let mut planes = vec![-1i16; table.len() * frames];
        render(&table, &mut planes, frames);

        assert_eq!(planes, vec![9, 9, 0, 0, 0, 0]);
    }

    #[test]
    fn speakers_stay_on_their_own_channels() {
        let table = ChannelTable::new(4, 8);
        ingest(&table, 1, &as_stereo(&[11, 12]));
        ingest(&table, 2, &as_stereo(&[21, 22]));
        ingest(&table, 1, &as_stereo(&[13]));
        ingest(&table, 2, &as_stereo(&[23]));

        let frames = 3;
        let mut planes = vec![0i16; table.len() * frames];
        render(&table, &mut planes, frames);

        assert_eq!(planes[..3], [11, 12, 13]);
        assert_eq!(planes[3..6], [21, 22, 23]);
    }

    #[test]
    fn burst_dropped_when_all_channels_claimed() {
        let table = ChannelTable::new(2, 8);
        table.claim_first_free(1);
        table.claim_first_free(2);

        ingest(&table, 3, &as_stereo(&[5, 5]));
        assert_eq!(table.find_claimed_slot(3), None);
        assert_eq!(table.slots()[0].buffered(), 0);
        assert_eq!(table.slots()[1].buffered(), 0);
    }

    #[test]
    fn burst_dropped_when_ring_is_full() {
        let table = ChannelTable::new(1, 4);
        ingest(&table, 7, &as_stereo(&[1, 2, 3]));
        assert_eq!(table.slots()[0].buffered(), 3);

        // 3 + 2 > 4: whole burst dropped, earlier audio intact.
        ingest(&table, 7, &as_stereo(&[8, 9]));
        assert_eq!(table.slots()[0].buffered(), 3);

        let frames = 3;
        let mut plane = vec![0i16; frames];
        render(&table, &mut plane, frames);
        assert_eq!(plane, vec![1, 2, 3]);
    }
}
