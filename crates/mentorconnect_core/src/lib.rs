pub mod domain;
pub mod lifecycle;
pub mod ports;
pub mod rating;
pub mod service;
pub mod slots;

pub use domain::{
    CategoryRatings, Feedback, FeedbackUpdate, Identity, MentorProfile, Notification,
    NotificationKind, Page, PageRequest, Pagination, ParticipantRole, Role, Session,
    SessionFilter, SessionSort, SessionStatus, SortOrder, User, UserCredentials,
};
pub use lifecycle::ReviewEligibility;
pub use ports::{DatabaseService, NotificationService, PortError, PortResult};
pub use rating::FeedbackStats;
pub use service::{BookingRequest, CreateFeedbackRequest, MentorshipService, MySessionsQuery};
pub use slots::Slot;
