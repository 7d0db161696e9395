use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DuckingError;

/// Class of audio stream a ducking session targets.
///
/// Discriminants are the platform's numeric stream types and are passed across the
/// native boundary unchanged.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamCategory {
    Media = 0,
    System = 1,
    Alarm = 2,
    Notification = 3,
    Emergency = 4,
    VoiceInformation = 5,
    VoiceRecognition = 6,
    RingtoneVoip = 7,
    Voip = 8,
    MediaExternalOnly = 9,
}

impl StreamCategory {
    pub const ALL: [StreamCategory; 10] = [
        Self::Media,
        Self::System,
        Self::Alarm,
        Self::Notification,
        Self::Emergency,
        Self::VoiceInformation,
        Self::VoiceRecognition,
        Self::RingtoneVoip,
        Self::Voip,
        Self::MediaExternalOnly,
    ];

    #[inline]
    pub const fn as_raw(self) -> i32 {
        self as i32
    }

    pub fn from_raw(raw: i32) -> Result<Self, DuckingError> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_raw() == raw)
            .ok_or_else(|| DuckingError::InvalidArgument {
                name: "stream_category",
                value: raw.to_string(),
            })
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Media => "media",
            Self::System => "system",
            Self::Alarm => "alarm",
            Self::Notification => "notification",
            Self::Emergency => "emergency",
            Self::VoiceInformation => "voice_information",
            Self::VoiceRecognition => "voice_recognition",
            Self::RingtoneVoip => "ringtone_voip",
            Self::Voip => "voip",
            Self::MediaExternalOnly => "media_external_only",
        }
    }
}

impl TryFrom<i32> for StreamCategory {
    type Error = DuckingError;

    #[inline]
    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        Self::from_raw(raw)
    }
}

impl FromStr for StreamCategory {
    type Err = DuckingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| DuckingError::InvalidArgument {
                name: "stream_category",
                value: format!("{needle:?}"),
            })
    }
}

impl fmt::Display for StreamCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
