pub mod user;
pub mod event;
pub mod event_type;

pub use user::{PartyRef, Role, User, UserProfile};
pub use event::{Event, EventDetails, EventStatus, Location, ProposedDates, Transition};
pub use event_type::{EventType, EventTypeDetails, EventTypeRef};
