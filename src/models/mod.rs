pub mod events;
pub mod request;
pub mod session;
pub mod state;
pub mod websocket;

pub use events::Event;
pub use request::{ClientRequest, RequestType, ServerResponse};
pub use session::{Voter, MAX_VOTE, NO_VOTE};
pub use state::VoteStatus;
pub use websocket::ServerUpdate;
