//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the core ports, selected with
//! `STORAGE_BACKEND=memory`. It keeps the same uniqueness rules as the
//! PostgreSQL schema: one live booking per mentor slot, one feedback per
//! session, and compare-and-swap status writes.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use mentorconnect_core::domain::{
    Feedback, Identity, MentorProfile, NewFeedback, NewMentorProfile, NewSession, Notification,
    PageRequest,
    ParticipantRole, Role, Session, SessionFilter, SessionSort, SessionStatus, SortOrder, User,
    UserCredentials,
};
use mentorconnect_core::ports::{DatabaseService, NotificationService, PortError, PortResult};
use tokio::sync::Mutex;
use uuid::Uuid;

struct StoredUser {
    user: User,
    hashed_password: String,
}

struct StoredProfile {
    bio: Option<String>,
    hourly_rate: Option<f64>,
    rating: f64,
    total_sessions: i64,
}

#[derive(Default)]
struct Store {
    users: HashMap<Uuid, StoredUser>,
    auth_sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
    profiles: HashMap<Uuid, StoredProfile>,
    sessions: HashMap<Uuid, Session>,
    feedback: HashMap<Uuid, Feedback>,
    notifications: Vec<Notification>,
}

impl Store {
    fn session(&self, session_id: Uuid) -> PortResult<&Session> {
        self.sessions
            .get(&session_id)
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))
    }

    fn session_mut(&mut self, session_id: Uuid) -> PortResult<&mut Session> {
        self.sessions
            .get_mut(&session_id)
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))
    }

    fn profile(&self, mentor_id: Uuid) -> PortResult<MentorProfile> {
        let profile = self
            .profiles
            .get(&mentor_id)
            .ok_or_else(|| PortError::NotFound(format!("Mentor {} not found", mentor_id)))?;
        let name = self
            .users
            .get(&mentor_id)
            .map(|u| u.user.name.clone())
            .unwrap_or_default();
        Ok(MentorProfile {
            user_id: mentor_id,
            name,
            bio: profile.bio.clone(),
            hourly_rate: profile.hourly_rate,
            rating: profile.rating,
            total_sessions: profile.total_sessions,
        })
    }
}

/// Paginates an already filtered and sorted list.
fn page_of<T>(items: Vec<T>, page: PageRequest) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    let page_items = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit as usize)
        .collect();
    (page_items, total)
}

#[derive(Default)]
pub struct InMemoryAdapter {
    store: Mutex<Store>,
}

impl InMemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification queued so far, oldest first.
    pub async fn notifications(&self) -> Vec<Notification> {
        self.store.lock().await.notifications.clone()
    }
}

#[async_trait]
impl DatabaseService for InMemoryAdapter {
    async fn create_user(
        &self,
        email: &str,
        name: &str,
        role: Role,
        hashed_password: &str,
        profile: Option<&NewMentorProfile>,
    ) -> PortResult<User> {
        let mut store = self.store.lock().await;
        if store.users.values().any(|u| u.user.email == email) {
            return Err(PortError::Conflict("Email is already registered".to_string()));
        }
        let user = User {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.to_string(),
            role,
        };
        store.users.insert(
            user.user_id,
            StoredUser {
                user: user.clone(),
                hashed_password: hashed_password.to_string(),
            },
        );
        if let Some(profile) = profile {
            store.profiles.insert(
                user.user_id,
                StoredProfile {
                    bio: profile.bio.clone(),
                    hourly_rate: profile.hourly_rate,
                    rating: 0.0,
                    total_sessions: 0,
                },
            );
        }
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let store = self.store.lock().await;
        store
            .users
            .values()
            .find(|u| u.user.email == email)
            .map(|u| UserCredentials {
                user_id: u.user.user_id,
                email: u.user.email.clone(),
                role: u.user.role,
                hashed_password: u.hashed_password.clone(),
            })
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut store = self.store.lock().await;
        store
            .auth_sessions
            .insert(session_id.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Identity> {
        let store = self.store.lock().await;
        let (user_id, expires_at) = store
            .auth_sessions
            .get(session_id)
            .copied()
            .ok_or(PortError::Unauthorized)?;
        if expires_at <= Utc::now() {
            return Err(PortError::Unauthorized);
        }
        let user = store.users.get(&user_id).ok_or(PortError::Unauthorized)?;
        Ok(Identity {
            user_id,
            role: user.user.role,
        })
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.store.lock().await.auth_sessions.remove(session_id);
        Ok(())
    }

    async fn get_mentor_profile(&self, mentor_id: Uuid) -> PortResult<MentorProfile> {
        self.store.lock().await.profile(mentor_id)
    }

    async fn set_mentor_rating(&self, mentor_id: Uuid, rating: f64) -> PortResult<()> {
        let mut store = self.store.lock().await;
        let profile = store
            .profiles
            .get_mut(&mentor_id)
            .ok_or_else(|| PortError::NotFound(format!("Mentor {} not found", mentor_id)))?;
        profile.rating = rating;
        Ok(())
    }

    async fn increment_mentor_sessions(&self, mentor_id: Uuid) -> PortResult<()> {
        let mut store = self.store.lock().await;
        let profile = store
            .profiles
            .get_mut(&mentor_id)
            .ok_or_else(|| PortError::NotFound(format!("Mentor {} not found", mentor_id)))?;
        profile.total_sessions += 1;
        Ok(())
    }

    async fn insert_session(&self, new_session: NewSession) -> PortResult<Session> {
        let mut store = self.store.lock().await;
        let taken = store.sessions.values().any(|s| {
            s.mentor_id == new_session.mentor_id
                && s.date == new_session.date
                && s.start_time == new_session.start_time
                && s.status.is_active()
        });
        if taken {
            return Err(PortError::Conflict("This slot is already booked".to_string()));
        }
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            student_id: new_session.student_id,
            mentor_id: new_session.mentor_id,
            date: new_session.date,
            start_time: new_session.start_time,
            end_time: new_session.end_time,
            status: SessionStatus::Pending,
            topic: new_session.topic,
            notes: new_session.notes,
            meeting_link: None,
            rating: None,
            feedback: None,
            created_at: now,
            updated_at: now,
        };
        store.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn get_session(&self, session_id: Uuid) -> PortResult<Session> {
        self.store.lock().await.session(session_id).cloned()
    }

    async fn sessions_for_mentor_on(
        &self,
        mentor_id: Uuid,
        date: NaiveDate,
    ) -> PortResult<Vec<Session>> {
        let store = self.store.lock().await;
        let mut sessions: Vec<Session> = store
            .sessions
            .values()
            .filter(|s| s.mentor_id == mentor_id && s.date == date)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.start_time);
        Ok(sessions)
    }

    async fn list_sessions(&self, filter: &SessionFilter) -> PortResult<(Vec<Session>, u64)> {
        let store = self.store.lock().await;
        let mut sessions: Vec<Session> = store
            .sessions
            .values()
            .filter(|s| match filter.side {
                ParticipantRole::Student => s.student_id == filter.user_id,
                ParticipantRole::Mentor => s.mentor_id == filter.user_id,
                ParticipantRole::Either => s.is_participant(filter.user_id),
            })
            .filter(|s| filter.status.map_or(true, |status| s.status == status))
            .cloned()
            .collect();

        sessions.sort_by(|a, b| {
            let ordering = match filter.sort {
                SessionSort::Date => (a.date, a.start_time).cmp(&(b.date, b.start_time)),
                SessionSort::CreatedAt => a.created_at.cmp(&b.created_at),
                SessionSort::Status => (a.status.as_str(), a.date, a.start_time)
                    .cmp(&(b.status.as_str(), b.date, b.start_time)),
            };
            match filter.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
        Ok(page_of(sessions, filter.page))
    }

    async fn sessions_for_user(&self, user_id: Uuid) -> PortResult<Vec<Session>> {
        let store = self.store.lock().await;
        let mut sessions: Vec<Session> = store
            .sessions
            .values()
            .filter(|s| s.is_participant(user_id))
            .cloned()
            .collect();
        sessions.sort_by_key(|s| (s.date, s.start_time));
        Ok(sessions)
    }

    async fn update_session_status(
        &self,
        session_id: Uuid,
        from: SessionStatus,
        to: SessionStatus,
    ) -> PortResult<Session> {
        let mut store = self.store.lock().await;
        let session = store.session_mut(session_id)?;
        if session.status != from {
            return Err(PortError::Conflict(format!(
                "Session {} is now {}, expected {}",
                session_id, session.status, from
            )));
        }
        session.status = to;
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    async fn set_meeting_link(&self, session_id: Uuid, link: &str) -> PortResult<Session> {
        let mut store = self.store.lock().await;
        let session = store.session_mut(session_id)?;
        session.meeting_link = Some(link.to_string());
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    async fn set_session_rating(
        &self,
        session_id: Uuid,
        rating: i16,
        feedback: Option<&str>,
    ) -> PortResult<Session> {
        let mut store = self.store.lock().await;
        let session = store.session_mut(session_id)?;
        if session.rating.is_some() || session.status != SessionStatus::Completed {
            return Err(PortError::Conflict(format!(
                "Session {} cannot be rated",
                session_id
            )));
        }
        session.rating = Some(rating);
        session.feedback = feedback.map(str::to_string);
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    async fn insert_feedback(&self, new_feedback: NewFeedback) -> PortResult<Feedback> {
        let mut store = self.store.lock().await;
        if store
            .feedback
            .values()
            .any(|f| f.session_id == new_feedback.session_id)
        {
            return Err(PortError::Conflict(
                "Feedback already exists for this session".to_string(),
            ));
        }
        let now = Utc::now();
        let feedback = Feedback {
            id: Uuid::new_v4(),
            session_id: new_feedback.session_id,
            student_id: new_feedback.student_id,
            mentor_id: new_feedback.mentor_id,
            rating: new_feedback.rating,
            comment: new_feedback.comment,
            categories: new_feedback.categories,
            is_public: new_feedback.is_public,
            created_at: now,
            updated_at: now,
        };
        store.feedback.insert(feedback.id, feedback.clone());
        Ok(feedback)
    }

    async fn get_feedback(&self, feedback_id: Uuid) -> PortResult<Feedback> {
        self.store
            .lock()
            .await
            .feedback
            .get(&feedback_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Feedback {} not found", feedback_id)))
    }

    async fn get_feedback_for_session(&self, session_id: Uuid) -> PortResult<Option<Feedback>> {
        let store = self.store.lock().await;
        Ok(store
            .feedback
            .values()
            .find(|f| f.session_id == session_id)
            .cloned())
    }

    async fn update_feedback(&self, feedback: &Feedback) -> PortResult<Feedback> {
        let mut store = self.store.lock().await;
        let stored = store
            .feedback
            .get_mut(&feedback.id)
            .ok_or_else(|| PortError::NotFound(format!("Feedback {} not found", feedback.id)))?;
        stored.rating = feedback.rating;
        stored.comment = feedback.comment.clone();
        stored.categories = feedback.categories;
        stored.is_public = feedback.is_public;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete_feedback(&self, feedback_id: Uuid) -> PortResult<()> {
        self.store
            .lock()
            .await
            .feedback
            .remove(&feedback_id)
            .map(|_| ())
            .ok_or_else(|| PortError::NotFound(format!("Feedback {} not found", feedback_id)))
    }

    async fn feedback_for_mentor(&self, mentor_id: Uuid) -> PortResult<Vec<Feedback>> {
        let store = self.store.lock().await;
        Ok(store
            .feedback
            .values()
            .filter(|f| f.mentor_id == mentor_id)
            .cloned()
            .collect())
    }

    async fn list_public_feedback(
        &self,
        mentor_id: Uuid,
        min_rating: Option<i16>,
        page: PageRequest,
    ) -> PortResult<(Vec<Feedback>, u64)> {
        let store = self.store.lock().await;
        let min_rating = min_rating.unwrap_or(1);
        let mut feedback: Vec<Feedback> = store
            .feedback
            .values()
            .filter(|f| f.mentor_id == mentor_id && f.is_public && f.rating >= min_rating)
            .cloned()
            .collect();
        feedback.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page_of(feedback, page))
    }

    async fn reviewed_session_ids(&self, student_id: Uuid) -> PortResult<Vec<Uuid>> {
        let store = self.store.lock().await;
        Ok(store
            .feedback
            .values()
            .filter(|f| f.student_id == student_id)
            .map(|f| f.session_id)
            .collect())
    }
}

#[async_trait]
impl NotificationService for InMemoryAdapter {
    async fn notify(&self, notification: &Notification) -> PortResult<()> {
        self.store
            .lock()
            .await
            .notifications
            .push(notification.clone());
        Ok(())
    }
}
