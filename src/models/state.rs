use serde::{Deserialize, Serialize};

/// Where the current vote stands. Serialized as 0, 1 or 2.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum VoteStatus {
    #[default]
    None,
    InProgress,
    Complete,
}

impl From<VoteStatus> for u8 {
    fn from(status: VoteStatus) -> Self {
        match status {
            VoteStatus::None => 0,
            VoteStatus::InProgress => 1,
            VoteStatus::Complete => 2,
        }
    }
}

impl TryFrom<u8> for VoteStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(VoteStatus::None),
            1 => Ok(VoteStatus::InProgress),
            2 => Ok(VoteStatus::Complete),
            other => Err(format!("invalid vote status: {other}")),
        }
    }
}
