//! The voting session state machine.
//!
//! One instance per process, owned by the engine task and only touched from
//! there. Every state change is published as an [`Event`] on the channel
//! handed to [`Model::new`]; the engine drains it after each operation.

use std::collections::HashMap;
use std::sync::mpsc::Sender;

use log::{debug, info};

use crate::models::{Event, ServerResponse, ServerUpdate, VoteStatus, Voter, MAX_VOTE, NO_VOTE};

const UNKNOWN_VOTER: &str = "Unknown voter: ";

pub struct Model {
    voters: HashMap<String, Voter>,
    vote_status: VoteStatus,
    events: Sender<Event>,
}

impl Model {
    pub fn new(events: Sender<Event>) -> Self {
        Model {
            voters: HashMap::new(),
            vote_status: VoteStatus::None,
            events,
        }
    }

    pub fn vote_status(&self) -> VoteStatus {
        self.vote_status
    }

    pub fn voter(&self, name: &str) -> Option<&Voter> {
        self.voters.get(name)
    }

    pub fn voter_count(&self) -> usize {
        self.voters.len()
    }

    /// Reserve a name, step 1 of 2. The voter is announced by
    /// [`Model::connected`] once their WebSocket is up.
    pub fn join(&mut self, name: &str) -> ServerResponse {
        if name.trim().is_empty() {
            return ServerResponse::error("The voter name is blank.");
        }

        if self.voters.contains_key(name) {
            return ServerResponse::error(format!("Voter name is already in use: {name}"));
        }

        self.voters.insert(name.to_owned(), Voter::new(name));
        info!("Voter joined: {name}");
        self.emit(Event::VoterJoined(name.to_owned()));

        ServerResponse::ok()
    }

    /// Announce a joined voter, step 2 of 2.
    pub fn connected(&mut self, name: &str) -> ServerResponse {
        if !self.is_joined(name) {
            return unknown_voter(name);
        }

        self.publish(format!("A new voter joined: {name}"));
        ServerResponse::ok()
    }

    pub fn leave(&mut self, name: &str) -> ServerResponse {
        if !self.is_joined(name) {
            return unknown_voter(name);
        }

        self.voters.remove(name);
        info!("Voter left: {name}");
        self.emit(Event::VoterLeft(name.to_owned()));
        self.publish(format!("A voter left: {name}"));

        ServerResponse::ok()
    }

    pub fn start_vote(&mut self, name: &str) -> ServerResponse {
        if !self.is_joined(name) {
            return unknown_voter(name);
        }

        self.vote_status = VoteStatus::InProgress;
        self.clear_votes();
        self.publish(format!("Vote started by: {name}"));

        ServerResponse::ok()
    }

    /// Record a vote. Ends the vote automatically once everyone has voted.
    ///
    /// `NO_VOTE` withdraws the voter's card rather than being refused. After
    /// the vote has completed, a withdrawal leaves the status at complete
    /// with that voter no longer counted in the average.
    pub fn vote(&mut self, name: &str, vote: i32) -> ServerResponse {
        if !self.is_joined(name) {
            return unknown_voter(name);
        }

        if vote != NO_VOTE && !(0..=MAX_VOTE).contains(&vote) {
            return ServerResponse::error(format!("Invalid vote: {vote}"));
        }

        if let Some(voter) = self.voters.get_mut(name) {
            voter.set_vote(vote);
        }
        self.publish(format!("Vote by: {name}"));

        if self.voters.values().all(Voter::has_voted) {
            debug!("Every voter has voted, ending the vote");
            return self.end_vote(name);
        }

        ServerResponse::ok()
    }

    pub fn end_vote(&mut self, name: &str) -> ServerResponse {
        if !self.is_joined(name) {
            return unknown_voter(name);
        }

        self.vote_status = VoteStatus::Complete;
        self.publish(format!("Vote ended by: {name}"));

        ServerResponse::ok()
    }

    pub fn cancel_vote(&mut self, name: &str) -> ServerResponse {
        if !self.is_joined(name) {
            return unknown_voter(name);
        }

        self.vote_status = VoteStatus::None;
        self.clear_votes();
        self.publish(format!("Vote canceled by: {name}"));

        ServerResponse::ok()
    }

    pub fn refresh(&mut self, name: &str) -> ServerResponse {
        if !self.is_joined(name) {
            return unknown_voter(name);
        }

        self.vote_status = VoteStatus::None;
        self.clear_votes();
        self.publish(format!("Refresh requested by: {name}"));

        ServerResponse::ok()
    }

    /// Remove `target` on behalf of `name`. Dropping an absent voter is not
    /// an error and changes nothing.
    pub fn drop_voter(&mut self, name: &str, target: &str) -> ServerResponse {
        if !self.is_joined(name) {
            return unknown_voter(name);
        }

        if self.voters.remove(target).is_some() {
            info!("Voter {target} dropped by {name}");
            self.emit(Event::VoterLeft(target.to_owned()));
            self.publish(format!("A voter was dropped: {target}"));
        }

        ServerResponse::ok()
    }

    /// Remove a voter whose connection failed.
    pub fn remove_voter(&mut self, target: &str) {
        self.voters.remove(target);
        info!("Voter removed after communication errors: {target}");
        self.publish(format!("A voter dropped because of comm errors: {target}"));
    }

    fn is_joined(&self, name: &str) -> bool {
        !name.trim().is_empty() && self.voters.contains_key(name)
    }

    fn clear_votes(&mut self) {
        for voter in self.voters.values_mut() {
            voter.clear_vote();
        }
    }

    fn publish(&self, message: String) {
        let update = ServerUpdate::new(
            message,
            self.vote_status,
            self.voters.values().cloned().collect(),
        );
        self.emit(Event::Update(update));
    }

    fn emit(&self, event: Event) {
        if self.events.send(event).is_err() {
            debug!("Event receiver is gone, event discarded");
        }
    }
}

fn unknown_voter(name: &str) -> ServerResponse {
    ServerResponse::error(format!("{UNKNOWN_VOTER}{name}"))
}
