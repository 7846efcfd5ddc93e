//! Linkup domain: entities, ports, and the matching coordinator.
//!
//! Nothing in here knows about HTTP or SQL. Inbound adapters call the driving
//! ports in [`ports`]; outbound adapters implement the driven ones.

pub mod candidate_selector;
pub mod deadline;
pub mod error;
pub mod geo;
pub mod invite_fanout;
pub mod linkup;
pub mod linkup_service;
pub mod ports;
pub mod trace_id;
pub mod user;
pub mod user_location_service;

pub use self::candidate_selector::{CandidateSelector, FANOUT_CAP};
pub use self::deadline::{Deadline, DeadlineError};
pub use self::error::{Error, ErrorCode};
pub use self::geo::{
    Coordinate, CoordinateError, DEFAULT_NEARBY_RADIUS_METERS, DEFAULT_SEARCH_RADIUS_METERS,
    MAX_SEARCH_RADIUS_METERS, SearchRadius,
};
pub use self::invite_fanout::{
    FanoutReport, FanoutSummary, InviteFanout, InviteOutcome, InviteResult,
};
pub use self::linkup::{
    AttendanceStatus, Candidate, Invitation, Linkup, LinkupId, LinkupRole, LinkupStatus,
    NearbyLinkup, PlaceRef, UserLinkup,
};
pub use self::linkup_service::{
    DEFAULT_PLACE_TIMEOUT, DEFAULT_STORE_TIMEOUT, LinkupCommandService, LinkupQueryService,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{UserId, UserIdError};
pub use self::user_location_service::UserLocationService;
