//! Channel assignment table: maps speakers to physical output channels.
//!
//! A fixed array of slots, one per hardware output channel, each owning the
//! ring buffer for that channel. Slots are claimed on a speaker's first burst
//! and released on session events; the table never grows or shrinks after
//! startup. Lookup is a linear scan, which is fine at the handful-of-channels
//! scale this runs at.

use std::sync::Mutex;

use super::ring_buffer::RingBuffer;

/// Stable participant identity from the voice session. 0 means "nobody".
pub type UserId = u64;

#[derive(Debug, Clone, Copy)]
struct Binding {
    user: UserId,
    claimed: bool,
}

/// One output channel: a participant binding plus its dedicated buffer.
///
/// The binding and the buffer are guarded separately: ingest and the control
/// side contend on the binding, while ingest and the playback thread contend
/// on the buffer. Both locks are only ever held for one bounded copy or a
/// field update, never across a blocking call.
///
/// A released slot keeps its last occupant's id so that `release_user` on a
/// stale id stays a no-op match; `claimed` alone decides whether the slot
/// routes audio.
pub struct ChannelSlot {
    index: usize,
    binding: Mutex<Binding>,
    buffer: Mutex<RingBuffer<i16>>,
}

impl ChannelSlot {
    fn new(index: usize, buffer_capacity: usize) -> Self {
        Self {
            index,
            binding: Mutex::new(Binding {
                user: 0,
                claimed: false,
            }),
            buffer: Mutex::new(RingBuffer::new(buffer_capacity)),
        }
    }

    #[cfg(test)]
    pub(crate) fn is_claimed(&self) -> bool {
        self.binding.lock().unwrap().claimed
    }

    fn holds_claimed(&self, user: UserId) -> bool {
        let b = self.binding.lock().unwrap();
        b.claimed && b.user == user
    }

    /// Bind `user` to this slot and flush any leftover audio from the
    /// previous occupant.
    fn claim(&self, user: UserId) {
        {
            let mut b = self.binding.lock().unwrap();
            b.user = user;
            b.claimed = true;
        }
        self.buffer.lock().unwrap().flush();
    }

    /// Unbind without clearing the buffer; the next claim flushes it.
    fn release(&self) {
        self.binding.lock().unwrap().claimed = false;
    }

    /// Buffer write for the ingest path. Returns elements written (all or 0).
    pub(crate) fn write_samples(&self, samples: &[i16]) -> usize {
        self.buffer.lock().unwrap().write(samples)
    }

    /// Buffer drain for the playback path; zero-pads a shortfall.
    pub(crate) fn read_into(&self, out: &mut [i16]) -> usize {
        self.buffer.lock().unwrap().read(out)
    }

    #[cfg(test)]
    pub(crate) fn buffered(&self) -> usize {
        self.buffer.lock().unwrap().readable()
    }
}

/// The fixed set of output channel slots, indexed 0..N-1.
pub struct ChannelTable {
    slots: Vec<ChannelSlot>,
}

impl ChannelTable {
    /// Allocate `channels` slots, each with a ring of `buffer_capacity` mono
    /// samples. All slots start unclaimed.
    pub fn new(channels: usize, buffer_capacity: usize) -> Self {
        let slots = (0..channels)
            .map(|i| ChannelSlot::new(i, buffer_capacity))
            .collect();
        Self { slots }
    }

    /// Number of output channels.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn slots(&self) -> &[ChannelSlot] {
        &self.slots
    }

    /// Find the slot currently claimed by `user`.
    ///
    /// Identity alone is not enough: a released slot still remembers its last
    /// occupant, so only a slot with `claimed` set counts as a match.
    pub fn find_claimed_slot(&self, user: UserId) -> Option<usize> {
        self.slots
            .iter()
            .find(|s| s.holds_claimed(user))
            .map(|s| s.index)
    }

    /// Claim the lowest-index free slot for `user`.
    ///
    /// Returns the slot index, or `None` when every channel is taken
    /// (admission control: the caller drops the audio, nothing breaks).
    pub fn claim_first_free(&self, user: UserId) -> Option<usize> {
        for slot in &self.slots {
            let mut b = slot.binding.lock().unwrap();
            if !b.claimed {
                b.user = user;
                b.claimed = true;
                drop(b);
                slot.buffer.lock().unwrap().flush();
                log::info!("Claimed channel {} for user {}", slot.index, user);
                return Some(slot.index);
            }
        }
        log::warn!("No free channel for user {}", user);
        None
    }

    /// Bind `user` to a specific channel, evicting whoever held it.
    ///
    /// This is the operator override; it does not check that the slot was
    /// free. Fails only on an out-of-range index.
    pub fn claim_specific(&self, user: UserId, index: usize) -> Option<usize> {
        let slot = self.slots.get(index)?;
        slot.claim(user);
        log::info!("Assigned channel {} to user {}", index, user);
        Some(index)
    }

    /// Release every slot claimed by `user` (defensive against duplicates).
    pub fn release_user(&self, user: UserId) {
        for slot in &self.slots {
            let mut b = slot.binding.lock().unwrap();
            if b.claimed && b.user == user {
                b.claimed = false;
                log::info!("Released channel {} (user {})", slot.index, user);
            }
        }
    }

    /// Release the slot at `index`; out-of-range is a no-op.
    pub fn release_index(&self, index: usize) {
        if let Some(slot) = self.slots.get(index) {
            slot.release();
        }
    }

    /// Release every slot. Buffers are cleared lazily on the next claim.
    pub fn release_all(&self) {
        for slot in &self.slots {
            slot.release();
        }
        log::info!("Released all channels");
    }
}
