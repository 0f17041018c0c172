//! crates/mentorconnect_core/src/service.rs
//!
//! `MentorshipService` runs the booking, lifecycle and feedback flows over the
//! ports. Handlers pass in the caller's `Identity` and the current time; the
//! service holds no ambient state of its own.
//!
//! Multi-step flows are not transactional. When a side effect fails after the
//! primary write (the rating recompute, the session counter, a notification),
//! the failure is logged and the primary write stands.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{
    CategoryRatings, Feedback, FeedbackUpdate, Identity, MentorProfile, NewFeedback, NewSession,
    Notification, NotificationKind, Page, PageRequest, Pagination, ParticipantRole, Role,
    Session, SessionFilter, SessionSort, SessionStatus, SortOrder,
};
use crate::lifecycle::{self, ReviewEligibility};
use crate::ports::{DatabaseService, NotificationService, PortError, PortResult};
use crate::rating::{self, FeedbackStats};
use crate::slots::{self, Slot};

//=========================================================================================
// Requests
//=========================================================================================

/// A booking request as received on the wire; dates and times are unparsed.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub mentor_id: Uuid,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub topic: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MySessionsQuery {
    pub status: Option<SessionStatus>,
    pub side: Option<ParticipantRole>,
    pub sort: SessionSort,
    pub order: SortOrder,
    pub page: PageRequest,
}

impl Default for MySessionsQuery {
    fn default() -> Self {
        Self {
            status: None,
            side: None,
            sort: SessionSort::Date,
            order: SortOrder::Desc,
            page: PageRequest::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateFeedbackRequest {
    pub session_id: Uuid,
    pub mentor_id: Uuid,
    pub rating: i16,
    pub comment: String,
    pub categories: CategoryRatings,
    pub is_public: bool,
}

//=========================================================================================
// The Service
//=========================================================================================

#[derive(Clone)]
pub struct MentorshipService {
    db: Arc<dyn DatabaseService>,
    notifier: Arc<dyn NotificationService>,
}

impl MentorshipService {
    pub fn new(db: Arc<dyn DatabaseService>, notifier: Arc<dyn NotificationService>) -> Self {
        Self { db, notifier }
    }

    // --- Booking & availability ---

    /// Creates a pending session for the calling student.
    pub async fn book_session(
        &self,
        actor: &Identity,
        request: BookingRequest,
        now: DateTime<Utc>,
    ) -> PortResult<Session> {
        if actor.role != Role::Student {
            return Err(PortError::Forbidden("Only students may book sessions".to_string()));
        }
        if actor.user_id == request.mentor_id {
            return Err(PortError::Validation("Cannot book a session with yourself".to_string()));
        }
        let topic = request.topic.trim();
        if topic.is_empty() {
            return Err(PortError::Validation("topic is required".to_string()));
        }
        let date = slots::parse_date(&request.date)?;
        let start_time = slots::parse_time(&request.start_time)?;
        let end_time = slots::parse_time(&request.end_time)?;
        slots::validate_window(start_time, end_time)?;

        // Ensures the mentor exists before looking at their calendar.
        self.db.get_mentor_profile(request.mentor_id).await?;

        let occupied = self.booked_slots(request.mentor_id, date).await?;
        if occupied.contains(&start_time) {
            return Err(PortError::Conflict(format!(
                "The {} slot on {} is already booked",
                slots::format_time(start_time),
                slots::format_date(date)
            )));
        }
        if slots::is_past(date, start_time, now) {
            return Err(PortError::Validation(
                "Cannot book a slot that has already started".to_string(),
            ));
        }

        // The storage layer enforces slot uniqueness, so a racing booking that
        // passed the check above still fails here with `Conflict`.
        let session = self
            .db
            .insert_session(NewSession {
                student_id: actor.user_id,
                mentor_id: request.mentor_id,
                date,
                start_time,
                end_time,
                topic: topic.to_string(),
                notes: request
                    .notes
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty()),
            })
            .await?;

        info!(session_id = %session.id, mentor_id = %session.mentor_id, "Session booked");
        self.emit(
            session.mentor_id,
            NotificationKind::SessionBooked,
            &session,
            format!(
                "New session request for {} at {}: {}",
                slots::format_date(session.date),
                slots::format_time(session.start_time),
                session.topic
            ),
        )
        .await;
        Ok(session)
    }

    /// Start times held by the mentor's pending or confirmed sessions on `date`.
    pub async fn booked_slots(
        &self,
        mentor_id: Uuid,
        date: NaiveDate,
    ) -> PortResult<Vec<NaiveTime>> {
        let sessions = self.db.sessions_for_mentor_on(mentor_id, date).await?;
        Ok(slots::occupied_start_times(&sessions, mentor_id, date)
            .into_iter()
            .collect())
    }

    pub async fn availability(
        &self,
        mentor_id: Uuid,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> PortResult<Vec<Slot>> {
        let sessions = self.db.sessions_for_mentor_on(mentor_id, date).await?;
        let occupied = slots::occupied_start_times(&sessions, mentor_id, date);
        Ok(slots::availability(date, &occupied, now))
    }

    // --- Reading sessions ---

    pub async fn get_session(&self, actor: &Identity, session_id: Uuid) -> PortResult<Session> {
        let session = self.db.get_session(session_id).await?;
        if actor.role != Role::Admin && !session.is_participant(actor.user_id) {
            return Err(PortError::Forbidden(format!(
                "Not a participant of session {session_id}"
            )));
        }
        Ok(session)
    }

    pub async fn my_sessions(
        &self,
        actor: &Identity,
        query: MySessionsQuery,
    ) -> PortResult<Page<Session>> {
        let side = query.side.unwrap_or(match actor.role {
            Role::Student => ParticipantRole::Student,
            Role::Mentor => ParticipantRole::Mentor,
            Role::Admin => ParticipantRole::Either,
        });
        let filter = SessionFilter {
            user_id: actor.user_id,
            side,
            status: query.status,
            sort: query.sort,
            order: query.order,
            page: query.page,
        };
        let (items, total) = self.db.list_sessions(&filter).await?;
        Ok(Page {
            items,
            pagination: Pagination::new(query.page, total),
        })
    }

    /// The caller's pending or confirmed sessions from today on, soonest first.
    pub async fn upcoming_sessions(
        &self,
        actor: &Identity,
        now: DateTime<Utc>,
    ) -> PortResult<Vec<Session>> {
        let today = now.date_naive();
        let mut sessions: Vec<Session> = self
            .db
            .sessions_for_user(actor.user_id)
            .await?
            .into_iter()
            .filter(|s| s.status.is_active() && s.date >= today)
            .collect();
        sessions.sort_by_key(|s| (s.date, s.start_time));
        Ok(sessions)
    }

    /// Sessions that are reviewable, or that are over but still await completion.
    pub async fn pending_reviews(
        &self,
        actor: &Identity,
        now: DateTime<Utc>,
    ) -> PortResult<Vec<(Session, ReviewEligibility)>> {
        let sessions = self.db.sessions_for_user(actor.user_id).await?;
        let reviewed: HashSet<Uuid> = self
            .db
            .reviewed_session_ids(actor.user_id)
            .await?
            .into_iter()
            .collect();

        let mut pending: Vec<(Session, ReviewEligibility)> = sessions
            .into_iter()
            .filter_map(|s| {
                let eligibility = lifecycle::review_eligibility(&s, reviewed.contains(&s.id), now);
                // A mentor only acts on sessions awaiting completion.
                let relevant = if s.mentor_id == actor.user_id {
                    eligibility == ReviewEligibility::AwaitingCompletion
                } else {
                    eligibility.needs_attention()
                };
                relevant.then_some((s, eligibility))
            })
            .collect();
        pending.sort_by_key(|(s, _)| (s.date, s.start_time));
        Ok(pending)
    }

    // --- Lifecycle ---

    /// Moves a session along the state machine on behalf of `actor`.
    pub async fn update_status(
        &self,
        actor: &Identity,
        session_id: Uuid,
        target: SessionStatus,
    ) -> PortResult<Session> {
        let session = self.db.get_session(session_id).await?;
        lifecycle::authorize_transition(&session, actor, target)?;
        self.apply_transition(actor, session, target).await
    }

    /// Cancels a pending or confirmed session; never deletes it.
    pub async fn cancel_session(&self, actor: &Identity, session_id: Uuid) -> PortResult<Session> {
        let session = self.db.get_session(session_id).await?;
        lifecycle::authorize_cancel(&session, actor)?;
        self.apply_transition(actor, session, SessionStatus::Cancelled)
            .await
    }

    async fn apply_transition(
        &self,
        actor: &Identity,
        session: Session,
        target: SessionStatus,
    ) -> PortResult<Session> {
        let from = session.status;
        let updated = self
            .db
            .update_session_status(session.id, from, target)
            .await?;
        info!(session_id = %updated.id, %from, to = %target, actor = %actor.user_id, "Session status changed");

        match target {
            SessionStatus::Confirmed => {
                self.emit(
                    updated.student_id,
                    NotificationKind::SessionConfirmed,
                    &updated,
                    format!("Your session \"{}\" was confirmed", updated.topic),
                )
                .await;
            }
            SessionStatus::Completed => {
                if let Err(e) = self.db.increment_mentor_sessions(updated.mentor_id).await {
                    error!(mentor_id = %updated.mentor_id, error = %e, "Failed to increment total sessions");
                }
                self.emit(
                    updated.student_id,
                    NotificationKind::ReviewReminder,
                    &updated,
                    format!("How was \"{}\"? Leave your mentor a review", updated.topic),
                )
                .await;
            }
            SessionStatus::Cancelled => {
                if let Some(other) = updated.counterpart(actor.user_id) {
                    self.emit(
                        other,
                        NotificationKind::SessionCancelled,
                        &updated,
                        format!("Session \"{}\" was cancelled", updated.topic),
                    )
                    .await;
                }
            }
            SessionStatus::Pending => {}
        }
        Ok(updated)
    }

    pub async fn set_meeting_link(
        &self,
        actor: &Identity,
        session_id: Uuid,
        link: &str,
    ) -> PortResult<Session> {
        let link = link.trim();
        if link.is_empty() {
            return Err(PortError::Validation("meetingLink is required".to_string()));
        }
        let session = self.db.get_session(session_id).await?;
        lifecycle::authorize_meeting_link(&session, actor)?;
        self.db.set_meeting_link(session_id, link).await
    }

    /// Stores the inline rating on a completed session.
    ///
    /// The mentor aggregate is driven by the feedback collection alone, so this
    /// does not recompute it.
    pub async fn rate_session(
        &self,
        actor: &Identity,
        session_id: Uuid,
        rating: i16,
        feedback: Option<String>,
    ) -> PortResult<Session> {
        rating::validate_rating(rating, "rating")?;
        let session = self.db.get_session(session_id).await?;
        lifecycle::authorize_review(&session, actor)?;
        if session.rating.is_some() {
            return Err(PortError::Conflict(format!(
                "Session {session_id} has already been rated"
            )));
        }
        let feedback = feedback.map(|f| f.trim().to_string()).filter(|f| !f.is_empty());
        self.db
            .set_session_rating(session_id, rating, feedback.as_deref())
            .await
    }

    // --- Feedback ---

    pub async fn create_feedback(
        &self,
        actor: &Identity,
        request: CreateFeedbackRequest,
    ) -> PortResult<Feedback> {
        rating::validate_rating(request.rating, "rating")?;
        rating::validate_categories(&request.categories)?;

        let session = self.db.get_session(request.session_id).await?;
        lifecycle::authorize_review(&session, actor)?;
        if request.mentor_id != session.mentor_id {
            return Err(PortError::Validation(
                "mentorId does not match the session's mentor".to_string(),
            ));
        }
        if self.db.get_feedback_for_session(session.id).await?.is_some() {
            return Err(PortError::Conflict(format!(
                "Feedback already exists for session {}",
                session.id
            )));
        }

        let feedback = self
            .db
            .insert_feedback(NewFeedback {
                session_id: session.id,
                student_id: actor.user_id,
                mentor_id: session.mentor_id,
                rating: request.rating,
                comment: request.comment.trim().to_string(),
                categories: request.categories,
                is_public: request.is_public,
            })
            .await?;
        info!(feedback_id = %feedback.id, mentor_id = %feedback.mentor_id, "Feedback created");

        self.refresh_rating(feedback.mentor_id).await;
        self.emit(
            feedback.mentor_id,
            NotificationKind::FeedbackReceived,
            &session,
            format!("You received a {}-star review", feedback.rating),
        )
        .await;
        Ok(feedback)
    }

    pub async fn update_feedback(
        &self,
        actor: &Identity,
        feedback_id: Uuid,
        update: FeedbackUpdate,
    ) -> PortResult<Feedback> {
        let mut feedback = self.owned_feedback(actor, feedback_id).await?;

        if let Some(r) = update.rating {
            rating::validate_rating(r, "rating")?;
            feedback.rating = r;
        }
        if let Some(categories) = update.categories {
            rating::validate_categories(&categories)?;
            feedback.categories = categories;
        }
        if let Some(comment) = update.comment {
            feedback.comment = comment.trim().to_string();
        }
        if let Some(is_public) = update.is_public {
            feedback.is_public = is_public;
        }

        let updated = self.db.update_feedback(&feedback).await?;
        self.refresh_rating(updated.mentor_id).await;
        Ok(updated)
    }

    pub async fn delete_feedback(&self, actor: &Identity, feedback_id: Uuid) -> PortResult<()> {
        let feedback = self.owned_feedback(actor, feedback_id).await?;
        self.db.delete_feedback(feedback.id).await?;
        info!(feedback_id = %feedback.id, "Feedback deleted");
        self.refresh_rating(feedback.mentor_id).await;
        Ok(())
    }

    pub async fn feedback_for_session(
        &self,
        actor: &Identity,
        session_id: Uuid,
    ) -> PortResult<Feedback> {
        let session = self.get_session(actor, session_id).await?;
        self.db
            .get_feedback_for_session(session.id)
            .await?
            .ok_or_else(|| PortError::NotFound(format!("No feedback for session {session_id}")))
    }

    pub async fn mentor_feedback(
        &self,
        mentor_id: Uuid,
        min_rating: Option<i16>,
        page: PageRequest,
    ) -> PortResult<Page<Feedback>> {
        if let Some(min) = min_rating {
            rating::validate_rating(min, "minRating")?;
        }
        let (items, total) = self
            .db
            .list_public_feedback(mentor_id, min_rating, page)
            .await?;
        Ok(Page {
            items,
            pagination: Pagination::new(page, total),
        })
    }

    pub async fn feedback_stats(&self, mentor_id: Uuid) -> PortResult<FeedbackStats> {
        self.db.get_mentor_profile(mentor_id).await?;
        let feedback = self.db.feedback_for_mentor(mentor_id).await?;
        Ok(rating::feedback_stats(&feedback))
    }

    pub async fn mentor_profile(&self, mentor_id: Uuid) -> PortResult<MentorProfile> {
        self.db.get_mentor_profile(mentor_id).await
    }

    /// Reads every feedback for the mentor, reduces it and writes the result.
    pub async fn recompute_mentor_rating(&self, mentor_id: Uuid) -> PortResult<f64> {
        let feedback = self.db.feedback_for_mentor(mentor_id).await?;
        let rating = rating::aggregate_rating(feedback.iter().map(|f| f.rating));
        self.db.set_mentor_rating(mentor_id, rating).await?;
        Ok(rating)
    }

    // --- Helpers ---

    async fn owned_feedback(&self, actor: &Identity, feedback_id: Uuid) -> PortResult<Feedback> {
        let feedback = self.db.get_feedback(feedback_id).await?;
        if feedback.student_id != actor.user_id {
            return Err(PortError::Forbidden(
                "Only the author may change this feedback".to_string(),
            ));
        }
        Ok(feedback)
    }

    async fn refresh_rating(&self, mentor_id: Uuid) {
        match self.recompute_mentor_rating(mentor_id).await {
            Ok(rating) => info!(%mentor_id, rating, "Mentor rating recomputed"),
            Err(e) => error!(%mentor_id, error = %e, "Mentor rating is stale"),
        }
    }

    async fn emit(
        &self,
        recipient_id: Uuid,
        kind: NotificationKind,
        session: &Session,
        message: String,
    ) {
        let notification = Notification {
            recipient_id,
            kind,
            session_id: session.id,
            message,
        };
        if let Err(e) = self.notifier.notify(&notification).await {
            warn!(kind = kind.as_str(), %recipient_id, error = %e, "Failed to queue notification");
        }
    }
}
