use log::debug;

use crate::model::Model;
use crate::models::{ClientRequest, RequestType, ServerResponse};

/// Route a validated client request to its session model operation.
pub fn dispatch(model: &mut Model, request: &ClientRequest) -> ServerResponse {
    let name = request.voter_name.as_str();
    debug!("Request {:?} from {name}", request.request_type);

    match request.request_type {
        RequestType::Join => model.join(name),
        RequestType::StartVote => model.start_vote(name),
        RequestType::Vote => model.vote(name, request.vote),
        RequestType::EndVote => model.end_vote(name),
        RequestType::CancelVote => model.cancel_vote(name),
        RequestType::Refresh => model.refresh(name),
        RequestType::Leave => model.leave(name),
        RequestType::DropVoter => model.drop_voter(name, &request.info),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Event, VoteStatus};
    use std::sync::mpsc::channel;

    #[test]
    fn routes_each_request_type() {
        let (sender, receiver) = channel();
        let mut model = Model::new(sender);

        let mut request = ClientRequest::new(RequestType::Join, "Alice");
        assert!(!dispatch(&mut model, &request).is_error());
        assert!(!dispatch(&mut model, &ClientRequest::new(RequestType::Join, "Bob")).is_error());

        request.request_type = RequestType::StartVote;
        dispatch(&mut model, &request);
        assert_eq!(model.vote_status(), VoteStatus::InProgress);

        request.request_type = RequestType::Vote;
        request.vote = 7;
        dispatch(&mut model, &request);
        assert_eq!(model.voter("Alice").unwrap().vote(), 7);

        request.request_type = RequestType::EndVote;
        dispatch(&mut model, &request);
        assert_eq!(model.vote_status(), VoteStatus::Complete);

        request.request_type = RequestType::Refresh;
        dispatch(&mut model, &request);
        assert_eq!(model.vote_status(), VoteStatus::None);

        request.request_type = RequestType::DropVoter;
        request.info = "Bob".to_owned();
        dispatch(&mut model, &request);
        assert!(model.voter("Bob").is_none());

        request.request_type = RequestType::Leave;
        dispatch(&mut model, &request);
        assert_eq!(model.voter_count(), 0);

        let left: Vec<Event> = receiver
            .try_iter()
            .filter(|event| matches!(event, Event::VoterLeft(_)))
            .collect();
        assert_eq!(
            left,
            vec![
                Event::VoterLeft("Bob".to_owned()),
                Event::VoterLeft("Alice".to_owned())
            ]
        );
    }

    #[test]
    fn cancel_vote_goes_to_model() {
        let (sender, _receiver) = channel();
        let mut model = Model::new(sender);

        let response = dispatch(&mut model, &ClientRequest::new(RequestType::CancelVote, "Zed"));

        assert_eq!(response, ServerResponse::error("Unknown voter: Zed"));
    }
}
