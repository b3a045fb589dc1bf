use serde::{Deserialize, Serialize};

use super::session::{MAX_VOTE, NO_VOTE};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    #[serde(rename = "join")]
    Join,
    #[serde(rename = "startVote")]
    StartVote,
    #[serde(rename = "vote")]
    Vote,
    #[serde(rename = "endVote")]
    EndVote,
    #[serde(rename = "cancelVote")]
    CancelVote,
    #[serde(rename = "refresh")]
    Refresh,
    #[serde(rename = "leave")]
    Leave,
    #[serde(rename = "dropVoter")]
    DropVoter,
}

/// A request POSTed by a client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRequest {
    #[serde(rename = "requestType")]
    pub request_type: RequestType,
    #[serde(rename = "voterName", default)]
    pub voter_name: String,
    #[serde(default)]
    pub vote: i32,
    /// Free-form, e.g. the name of the voter to drop.
    #[serde(default)]
    pub info: String,
}

impl ClientRequest {
    pub fn new(request_type: RequestType, voter_name: impl Into<String>) -> Self {
        ClientRequest {
            request_type,
            voter_name: voter_name.into(),
            vote: 0,
            info: String::new(),
        }
    }

    /// Check the request shape. The error lists every problem found.
    pub fn validate(&self) -> Result<(), String> {
        let mut problems = Vec::new();

        if self.voter_name.trim().is_empty() {
            problems.push("The voter is blank.".to_owned());
        }

        if !(NO_VOTE..=MAX_VOTE).contains(&self.vote) {
            problems.push(format!(
                "The vote value is not between {NO_VOTE} and {MAX_VOTE}: {}",
                self.vote
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems.join("\n"))
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerResponse {
    pub error: bool,
    pub message: String,
}

impl ServerResponse {
    pub fn ok() -> Self {
        ServerResponse {
            error: false,
            message: "OK".to_owned(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerResponse {
            error: true,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error
    }
}
