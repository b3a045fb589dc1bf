use serde::{Deserialize, Serialize};

use super::session::{Voter, UNSURE_VOTE};
use super::state::VoteStatus;

/// Sentinel for "no average".
pub const NO_AVERAGE: i32 = -1;

/// Snapshot broadcast to every connected voter after a state change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerUpdate {
    pub message: String,
    #[serde(rename = "voteStatus")]
    pub vote_status: VoteStatus,
    #[serde(rename = "averageVote")]
    pub average_vote: i32,
    pub voters: Vec<Voter>,
}

impl ServerUpdate {
    /// Build an update; `voters` is sorted by name here.
    pub fn new(message: impl Into<String>, vote_status: VoteStatus, mut voters: Vec<Voter>) -> Self {
        voters.sort_by(|a, b| a.name().cmp(b.name()));
        let average_vote = average_vote(vote_status, &voters);

        ServerUpdate {
            message: message.into(),
            vote_status,
            average_vote,
            voters,
        }
    }
}

/// Rounded (half up) mean of the cast, non-"?" votes once a vote is complete.
fn average_vote(vote_status: VoteStatus, voters: &[Voter]) -> i32 {
    if vote_status != VoteStatus::Complete {
        return NO_AVERAGE;
    }

    let (sum, count) = voters
        .iter()
        .filter(|voter| voter.has_voted() && voter.vote() != UNSURE_VOTE)
        .fold((0i64, 0i64), |(sum, count), voter| {
            (sum + voter.vote() as i64, count + 1)
        });

    if count == 0 {
        return NO_AVERAGE;
    }

    ((2 * sum + count) / (2 * count)) as i32
}
