use serde::{Deserialize, Serialize};

/// Highest card index: ?, .5, 1, 2, 3, 5, 8, 13, 20, 40, 100.
pub const MAX_VOTE: i32 = 10;

/// Sentinel for "has not voted".
pub const NO_VOTE: i32 = -1;

/// The "?" card. Counted as a vote, left out of the average.
pub const UNSURE_VOTE: i32 = 0;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    name: String,
    #[serde(rename = "hasVoted")]
    has_voted: bool,
    vote: i32,
}

impl Voter {
    pub fn new(name: impl Into<String>) -> Self {
        Voter {
            name: name.into(),
            has_voted: false,
            vote: NO_VOTE,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_voted(&self) -> bool {
        self.has_voted
    }

    pub fn vote(&self) -> i32 {
        self.vote
    }

    pub fn set_vote(&mut self, vote: i32) {
        self.vote = vote;
        self.has_voted = vote != NO_VOTE;
    }

    pub fn clear_vote(&mut self) {
        self.set_vote(NO_VOTE);
    }
}
