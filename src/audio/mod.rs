//! audio - Multichannel routing and ALSA playback library
//!
//! Each speaking participant is bound to one output channel of the playback
//! device, with a dedicated ring buffer decoupling the bursty network ingest
//! from the strictly periodic hardware drain.

mod alsa_device;
mod audio_system;
pub mod channel_table;
mod playback;
pub mod ring_buffer;
pub mod route;

pub use audio_system::{AudioConfig, AudioSystem};
pub use channel_table::{ChannelTable, UserId};
