//! Wire formats for the voice session.
//!
//! Signaling is JSON text frames; audio arrives as binary frames carrying one
//! burst per speaker: an 8-byte big-endian user id followed by interleaved
//! stereo 16-bit little-endian PCM.

use anyhow::{Result, bail};
use bytes::Buf;
use serde::Deserialize;

use crate::audio::UserId;

/// One parsed signaling message from the server.
///
/// Unknown types are tolerated and logged by the controller; only the fields
/// a given type uses are present.
#[derive(Deserialize, Debug, Clone)]
pub struct ServerMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub state: Option<String>,
    pub user: Option<UserId>,
    pub channel: Option<usize>,
    pub session_id: Option<String>,
    pub text: Option<String>,
}

/// One inbound voice burst: which participant spoke, and their samples.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceFrame {
    pub user: UserId,
    /// Interleaved stereo samples, L/R pairs.
    pub pcm: Vec<i16>,
}

impl VoiceFrame {
    /// Parse a binary frame from the session socket.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < 8 {
            bail!("voice frame too short: {} bytes", data.len());
        }
        if (data.len() - 8) % 2 != 0 {
            bail!("voice frame payload has odd length: {} bytes", data.len() - 8);
        }

        let mut buf = data;
        let user = buf.get_u64();
        let mut pcm = Vec::with_capacity(buf.remaining() / 2);
        while buf.remaining() >= 2 {
            pcm.push(buf.get_i16_le());
        }
        Ok(Self { user, pcm })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(user: u64, samples: &[i16]) -> Vec<u8> {
        let mut data = user.to_be_bytes().to_vec();
        for s in samples {
            data.extend_from_slice(&s.to_le_bytes());
        }
        data
    }

    #[test]
    fn decodes_user_and_samples() {
        let data = frame(0xAABB, &[100, -100, 32767, -32768]);
        let vf = VoiceFrame::decode(&data).unwrap();
        assert_eq!(vf.user, 0xAABB);
        assert_eq!(vf.pcm, vec![100, -100, 32767, -32768]);
    }

    #[test]
    fn empty_payload_is_valid() {
        let vf = VoiceFrame::decode(&frame(7, &[])).unwrap();
        assert_eq!(vf.user, 7);
        assert!(vf.pcm.is_empty());
    }

    #[test]
    fn short_frame_is_rejected() {
        assert!(VoiceFrame::decode(&[1, 2, 3]).is_err());
    }

    #[test]
    fn odd_payload_is_rejected() {
        let mut data = frame(7, &[1]);
        data.push(0xFF);
        assert!(VoiceFrame::decode(&data).is_err());
    }

    #[test]
    fn server_message_ignores_extra_fields() {
        let msg: ServerMessage = serde_json::from_str(
            r#"{"type":"assign","user":42,"channel":3,"mode":"manual"}"#,
        )
        .unwrap();
        assert_eq!(msg.msg_type, "assign");
        assert_eq!(msg.user, Some(42));
        assert_eq!(msg.channel, Some(3));
        assert_eq!(msg.state, None);
    }
}
