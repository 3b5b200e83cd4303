//! Fixed-capacity circular sample buffer.
//!
//! One instance backs each output channel slot. Writes are rejected wholesale
//! when they would overflow (the inbound burst is dropped, never partially
//! written); reads that exceed the buffered amount are padded with zeros,
//! which is silence for audio data. Capacity is fixed at construction and
//! there is no resize.

/// A bounded circular buffer with bulk read/write.
///
/// Not synchronized itself; the enclosing slot wraps it in a short-held lock
/// (see `channel_table`).
pub struct RingBuffer<T> {
    buf: Box<[T]>,
    read_pos: usize,
    write_pos: usize,
    readable: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Create a buffer holding up to `capacity` elements.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be non-zero");
        Self {
            buf: vec![T::default(); capacity].into_boxed_slice(),
            read_pos: 0,
            write_pos: 0,
            readable: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Number of buffered, unread elements.
    pub fn readable(&self) -> usize {
        self.readable
    }

    /// Append `values`, wrapping at the end of the backing store.
    ///
    /// Returns the number of elements written: either `values.len()` or 0.
    /// A write that would push the readable count past capacity is rejected
    /// outright and leaves the buffer untouched.
    pub fn write(&mut self, values: &[T]) -> usize {
        if self.readable + values.len() > self.buf.len() {
            return 0;
        }
        let len = self.buf.len();
        for (i, &v) in values.iter().enumerate() {
            self.buf[(self.write_pos + i) % len] = v;
        }
        self.write_pos = (self.write_pos + values.len()) % len;
        self.readable += values.len();
        values.len()
    }

    /// Fill `out` from the buffer, zero-padding any shortfall.
    ///
    /// Copies `min(out.len(), readable)` elements and clears the rest of
    /// `out` to the default value (silence). The read cursor advances by the
    /// number of elements actually copied, so buffered audio is never skipped
    /// over after an underrun. Returns the number of real elements copied.
    pub fn read(&mut self, out: &mut [T]) -> usize {
        let len = self.buf.len();
        let copied = out.len().min(self.readable);
        for (i, slot) in out.iter_mut().take(copied).enumerate() {
            *slot = self.buf[(self.read_pos + i) % len];
        }
        for slot in out.iter_mut().skip(copied) {
            *slot = T::default();
        }
        self.read_pos = (self.read_pos + copied) % len;
        self.readable -= copied;
        copied
    }

    /// Reset cursors and count; backing store contents are left as-is.
    pub fn reset(&mut self) {
        self.read_pos = 0;
        self.write_pos = 0;
        self.readable = 0;
    }

    /// Zero the backing store and reset.
    pub fn flush(&mut self) {
        self.buf.fill(T::default());
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_in_order() {
        let mut rb = RingBuffer::<i16>::new(8);
        assert_eq!(rb.write(&[1, 2, 3]), 3);
        assert_eq!(rb.write(&[4, 5]), 2);

        let mut out = [0i16; 5];
        assert_eq!(rb.read(&mut out), 5);
        assert_eq!(out, [1, 2, 3, 4, 5]);
        assert_eq!(rb.readable(), 0);
    }

    #[test]
    fn write_wraps_around() {
        let mut rb = RingBuffer::<i16>::new(4);
        assert_eq!(rb.write(&[1, 2, 3]), 3);
        let mut out = [0i16; 3];
        rb.read(&mut out);

        // Cursors now sit at index 3; this write wraps.
        assert_eq!(rb.write(&[4, 5, 6]), 3);
        assert_eq!(rb.read(&mut out), 3);
        assert_eq!(out, [4, 5, 6]);
    }

    #[test]
    fn overflow_rejected_whole() {
        let mut rb = RingBuffer::<i16>::new(4);
        assert_eq!(rb.write(&[1, 2, 3]), 3);
        // 3 + 2 > 4: rejected, nothing partial.
        assert_eq!(rb.write(&[8, 9]), 0);
        assert_eq!(rb.readable(), 3);

        let mut out = [0i16; 3];
        rb.read(&mut out);
        assert_eq!(out, [1, 2, 3]);
    }

    #[test]
    fn underrun_zero_pads() {
        let mut rb = RingBuffer::<i16>::new(8);
        rb.write(&[7, 7]);

        let mut out = [-1i16; 5];
        assert_eq!(rb.read(&mut out), 2);
        assert_eq!(out, [7, 7, 0, 0, 0]);
        assert_eq!(rb.readable(), 0);
    }

    #[test]
    fn underrun_does_not_skip_later_data() {
        let mut rb = RingBuffer::<i16>::new(8);
        rb.write(&[1]);

        let mut out = [0i16; 4];
        assert_eq!(rb.read(&mut out), 1);

        // Data written after the underrun must come out from the front.
        rb.write(&[2, 3]);
        assert_eq!(rb.read(&mut out), 2);
        assert_eq!(out[..2], [2, 3]);
    }

    #[test]
    fn read_from_empty_is_silence() {
        let mut rb = RingBuffer::<i16>::new(4);
        let mut out = [5i16; 4];
        assert_eq!(rb.read(&mut out), 0);
        assert_eq!(out, [0, 0, 0, 0]);
    }

    #[test]
    fn flush_then_read_is_all_zeros() {
        let mut rb = RingBuffer::<i16>::new(4);
        rb.write(&[1, 2, 3, 4]);
        rb.flush();
        assert_eq!(rb.readable(), 0);

        let mut out = [9i16; 4];
        assert_eq!(rb.read(&mut out), 0);
        assert_eq!(out, [0, 0, 0, 0]);
    }

    #[test]
    fn reset_keeps_capacity() {
        let mut rb = RingBuffer::<i16>::new(4);
        rb.write(&[1, 2, 3, 4]);
        rb.reset();
        assert_eq!(rb.readable(), 0);
        assert_eq!(rb.capacity(), 4);
        // Full capacity is writable again.
        assert_eq!(rb.write(&[5, 6, 7, 8]), 4);
    }
}
