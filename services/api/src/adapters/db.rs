//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` and `NotificationService` ports from the `core` crate.
//! It handles all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use mentorconnect_core::domain::{
    CategoryRatings, Feedback, Identity, MentorProfile, NewFeedback, NewMentorProfile, NewSession,
    Notification,
    PageRequest, ParticipantRole, Role, Session, SessionFilter, SessionSort, SessionStatus,
    SortOrder, User, UserCredentials,
};
use mentorconnect_core::ports::{DatabaseService, NotificationService, PortError, PortResult};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the core ports on PostgreSQL.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Maps a driver error onto the port taxonomy.
///
/// Unique violations (SQLSTATE 23505) become `Conflict`; the `uq_` constraint
/// name tells the caller which rule was hit.
fn map_err(e: sqlx::Error, what: impl FnOnce() -> String) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what()),
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            let message = match db_err.constraint() {
                Some("uq_sessions_active_slot") => "This slot is already booked".to_string(),
                Some("uq_feedback_session") => {
                    "Feedback already exists for this session".to_string()
                }
                Some("uq_users_email") => "Email is already registered".to_string(),
                other => format!("Duplicate value violates {}", other.unwrap_or("a constraint")),
            };
            PortError::Conflict(message)
        }
        other => PortError::Unexpected(other.to_string()),
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: String,
    name: String,
    role: String,
}
impl UserRecord {
    fn to_domain(self) -> PortResult<User> {
        Ok(User {
            user_id: self.user_id,
            email: self.email,
            name: self.name,
            role: self.role.parse()?,
        })
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    role: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> PortResult<UserCredentials> {
        Ok(UserCredentials {
            user_id: self.user_id,
            email: self.email,
            role: self.role.parse()?,
            hashed_password: self.hashed_password,
        })
    }
}

#[derive(FromRow)]
struct IdentityRecord {
    user_id: Uuid,
    role: String,
}

#[derive(FromRow)]
struct MentorProfileRecord {
    user_id: Uuid,
    name: String,
    bio: Option<String>,
    hourly_rate: Option<f64>,
    rating: f64,
    total_sessions: i64,
}
impl MentorProfileRecord {
    fn to_domain(self) -> MentorProfile {
        MentorProfile {
            user_id: self.user_id,
            name: self.name,
            bio: self.bio,
            hourly_rate: self.hourly_rate,
            rating: self.rating,
            total_sessions: self.total_sessions,
        }
    }
}

const SESSION_COLUMNS: &str = "id, student_id, mentor_id, session_date, start_time, end_time, \
     status, topic, notes, meeting_link, rating, feedback, created_at, updated_at";

#[derive(FromRow)]
struct SessionRecord {
    id: Uuid,
    student_id: Uuid,
    mentor_id: Uuid,
    session_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    status: String,
    topic: String,
    notes: Option<String>,
    meeting_link: Option<String>,
    rating: Option<i16>,
    feedback: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl SessionRecord {
    fn to_domain(self) -> PortResult<Session> {
        Ok(Session {
            id: self.id,
            student_id: self.student_id,
            mentor_id: self.mentor_id,
            date: self.session_date,
            start_time: self.start_time,
            end_time: self.end_time,
            status: self.status.parse()?,
            topic: self.topic,
            notes: self.notes,
            meeting_link: self.meeting_link,
            rating: self.rating,
            feedback: self.feedback,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn sessions_to_domain(records: Vec<SessionRecord>) -> PortResult<Vec<Session>> {
    records.into_iter().map(SessionRecord::to_domain).collect()
}

const FEEDBACK_COLUMNS: &str = "id, session_id, student_id, mentor_id, rating, comment, \
     communication_rating, knowledge_rating, helpfulness_rating, professionalism_rating, \
     is_public, created_at, updated_at";

#[derive(FromRow)]
struct FeedbackRecord {
    id: Uuid,
    session_id: Uuid,
    student_id: Uuid,
    mentor_id: Uuid,
    rating: i16,
    comment: String,
    communication_rating: Option<i16>,
    knowledge_rating: Option<i16>,
    helpfulness_rating: Option<i16>,
    professionalism_rating: Option<i16>,
    is_public: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl FeedbackRecord {
    fn to_domain(self) -> Feedback {
        Feedback {
            id: self.id,
            session_id: self.session_id,
            student_id: self.student_id,
            mentor_id: self.mentor_id,
            rating: self.rating,
            comment: self.comment,
            categories: CategoryRatings {
                communication: self.communication_rating,
                knowledge: self.knowledge_rating,
                helpfulness: self.helpfulness_rating,
                professionalism: self.professionalism_rating,
            },
            is_public: self.is_public,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn push_session_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &SessionFilter) {
    match filter.side {
        ParticipantRole::Student => {
            qb.push("student_id = ").push_bind(filter.user_id);
        }
        ParticipantRole::Mentor => {
            qb.push("mentor_id = ").push_bind(filter.user_id);
        }
        ParticipantRole::Either => {
            qb.push("(student_id = ")
                .push_bind(filter.user_id)
                .push(" OR mentor_id = ")
                .push_bind(filter.user_id)
                .push(")");
        }
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
}

fn session_order_clause(sort: SessionSort, order: SortOrder) -> String {
    let dir = match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    match sort {
        SessionSort::Date => format!(" ORDER BY session_date {dir}, start_time {dir}"),
        SessionSort::CreatedAt => format!(" ORDER BY created_at {dir}"),
        SessionSort::Status => {
            format!(" ORDER BY status {dir}, session_date {dir}, start_time {dir}")
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(
        &self,
        email: &str,
        name: &str,
        role: Role,
        hashed_password: &str,
        profile: Option<&NewMentorProfile>,
    ) -> PortResult<User> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, name, role, hashed_password) \
             VALUES ($1, $2, $3, $4, $5) RETURNING user_id, email, name, role",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(name)
        .bind(role.as_str())
        .bind(hashed_password)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_err(e, || "User not created".to_string()))?;

        if let Some(profile) = profile {
            sqlx::query(
                "INSERT INTO mentor_profiles (user_id, bio, hourly_rate) VALUES ($1, $2, $3)",
            )
            .bind(record.user_id)
            .bind(profile.bio.as_deref())
            .bind(profile.hourly_rate)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }

        // Dropping `tx` on an early return rolls the user row back.
        tx.commit().await.map_err(unexpected)?;
        record.to_domain()
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, role, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_err(e, || format!("User {} not found", email)))?;
        record.to_domain()
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Identity> {
        let record = sqlx::query_as::<_, IdentityRecord>(
            "SELECT u.user_id, u.role FROM auth_sessions a \
             JOIN users u ON u.user_id = a.user_id \
             WHERE a.id = $1 AND a.expires_at > now()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or(PortError::Unauthorized)?;
        Ok(Identity {
            user_id: record.user_id,
            role: record.role.parse()?,
        })
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn get_mentor_profile(&self, mentor_id: Uuid) -> PortResult<MentorProfile> {
        let record = sqlx::query_as::<_, MentorProfileRecord>(
            "SELECT p.user_id, u.name, p.bio, p.hourly_rate, p.rating, p.total_sessions \
             FROM mentor_profiles p JOIN users u ON u.user_id = p.user_id \
             WHERE p.user_id = $1",
        )
        .bind(mentor_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_err(e, || format!("Mentor {} not found", mentor_id)))?;
        Ok(record.to_domain())
    }

    async fn set_mentor_rating(&self, mentor_id: Uuid, rating: f64) -> PortResult<()> {
        let result = sqlx::query("UPDATE mentor_profiles SET rating = $1 WHERE user_id = $2")
            .bind(rating)
            .bind(mentor_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Mentor {} not found", mentor_id)));
        }
        Ok(())
    }

    async fn increment_mentor_sessions(&self, mentor_id: Uuid) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE mentor_profiles SET total_sessions = total_sessions + 1 WHERE user_id = $1",
        )
        .bind(mentor_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Mentor {} not found", mentor_id)));
        }
        Ok(())
    }

    async fn insert_session(&self, new_session: NewSession) -> PortResult<Session> {
        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            "INSERT INTO sessions \
             (id, student_id, mentor_id, session_date, start_time, end_time, topic, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {SESSION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new_session.student_id)
        .bind(new_session.mentor_id)
        .bind(new_session.date)
        .bind(new_session.start_time)
        .bind(new_session.end_time)
        .bind(&new_session.topic)
        .bind(&new_session.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_err(e, || "Session not created".to_string()))?;
        record.to_domain()
    }

    async fn get_session(&self, session_id: Uuid) -> PortResult<Session> {
        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1"
        ))
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_err(e, || format!("Session {} not found", session_id)))?;
        record.to_domain()
    }

    async fn sessions_for_mentor_on(
        &self,
        mentor_id: Uuid,
        date: NaiveDate,
    ) -> PortResult<Vec<Session>> {
        let records = sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions \
             WHERE mentor_id = $1 AND session_date = $2 ORDER BY start_time ASC"
        ))
        .bind(mentor_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        sessions_to_domain(records)
    }

    async fn list_sessions(&self, filter: &SessionFilter) -> PortResult<(Vec<Session>, u64)> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM sessions WHERE ");
        push_session_filter(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;

        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE "));
        push_session_filter(&mut qb, filter);
        qb.push(session_order_clause(filter.sort, filter.order));
        qb.push(" LIMIT ")
            .push_bind(i64::from(filter.page.limit))
            .push(" OFFSET ")
            .push_bind(filter.page.offset() as i64);

        let records = qb
            .build_query_as::<SessionRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok((sessions_to_domain(records)?, total.max(0) as u64))
    }

    async fn sessions_for_user(&self, user_id: Uuid) -> PortResult<Vec<Session>> {
        let records = sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions \
             WHERE student_id = $1 OR mentor_id = $1 \
             ORDER BY session_date ASC, start_time ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        sessions_to_domain(records)
    }

    async fn update_session_status(
        &self,
        session_id: Uuid,
        from: SessionStatus,
        to: SessionStatus,
    ) -> PortResult<Session> {
        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            "UPDATE sessions SET status = $1, updated_at = now() \
             WHERE id = $2 AND status = $3 RETURNING {SESSION_COLUMNS}"
        ))
        .bind(to.as_str())
        .bind(session_id)
        .bind(from.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_err(e, || format!("Session {} not found", session_id)))?;

        match record {
            Some(record) => record.to_domain(),
            None => {
                let current = self.get_session(session_id).await?;
                Err(PortError::Conflict(format!(
                    "Session {} is now {}, expected {}",
                    session_id, current.status, from
                )))
            }
        }
    }

    async fn set_meeting_link(&self, session_id: Uuid, link: &str) -> PortResult<Session> {
        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            "UPDATE sessions SET meeting_link = $1, updated_at = now() \
             WHERE id = $2 RETURNING {SESSION_COLUMNS}"
        ))
        .bind(link)
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_err(e, || format!("Session {} not found", session_id)))?;
        record.to_domain()
    }

    async fn set_session_rating(
        &self,
        session_id: Uuid,
        rating: i16,
        feedback: Option<&str>,
    ) -> PortResult<Session> {
        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            "UPDATE sessions SET rating = $1, feedback = $2, updated_at = now() \
             WHERE id = $3 AND rating IS NULL AND status = 'completed' \
             RETURNING {SESSION_COLUMNS}"
        ))
        .bind(rating)
        .bind(feedback)
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        match record {
            Some(record) => record.to_domain(),
            None => Err(PortError::Conflict(format!(
                "Session {} cannot be rated",
                session_id
            ))),
        }
    }

    async fn insert_feedback(&self, new_feedback: NewFeedback) -> PortResult<Feedback> {
        let c = new_feedback.categories;
        let record = sqlx::query_as::<_, FeedbackRecord>(&format!(
            "INSERT INTO feedback (id, session_id, student_id, mentor_id, rating, comment, \
             communication_rating, knowledge_rating, helpfulness_rating, professionalism_rating, \
             is_public) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {FEEDBACK_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new_feedback.session_id)
        .bind(new_feedback.student_id)
        .bind(new_feedback.mentor_id)
        .bind(new_feedback.rating)
        .bind(&new_feedback.comment)
        .bind(c.communication)
        .bind(c.knowledge)
        .bind(c.helpfulness)
        .bind(c.professionalism)
        .bind(new_feedback.is_public)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_err(e, || "Feedback not created".to_string()))?;
        Ok(record.to_domain())
    }

    async fn get_feedback(&self, feedback_id: Uuid) -> PortResult<Feedback> {
        let record = sqlx::query_as::<_, FeedbackRecord>(&format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE id = $1"
        ))
        .bind(feedback_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_err(e, || format!("Feedback {} not found", feedback_id)))?;
        Ok(record.to_domain())
    }

    async fn get_feedback_for_session(&self, session_id: Uuid) -> PortResult<Option<Feedback>> {
        let record = sqlx::query_as::<_, FeedbackRecord>(&format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE session_id = $1"
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(FeedbackRecord::to_domain))
    }

    async fn update_feedback(&self, feedback: &Feedback) -> PortResult<Feedback> {
        let c = feedback.categories;
        let record = sqlx::query_as::<_, FeedbackRecord>(&format!(
            "UPDATE feedback SET rating = $1, comment = $2, communication_rating = $3, \
             knowledge_rating = $4, helpfulness_rating = $5, professionalism_rating = $6, \
             is_public = $7, updated_at = now() \
             WHERE id = $8 RETURNING {FEEDBACK_COLUMNS}"
        ))
        .bind(feedback.rating)
        .bind(&feedback.comment)
        .bind(c.communication)
        .bind(c.knowledge)
        .bind(c.helpfulness)
        .bind(c.professionalism)
        .bind(feedback.is_public)
        .bind(feedback.id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_err(e, || format!("Feedback {} not found", feedback.id)))?;
        Ok(record.to_domain())
    }

    async fn delete_feedback(&self, feedback_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM feedback WHERE id = $1")
            .bind(feedback_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Feedback {} not found", feedback_id)));
        }
        Ok(())
    }

    async fn feedback_for_mentor(&self, mentor_id: Uuid) -> PortResult<Vec<Feedback>> {
        let records = sqlx::query_as::<_, FeedbackRecord>(&format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE mentor_id = $1"
        ))
        .bind(mentor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(FeedbackRecord::to_domain).collect())
    }

    async fn list_public_feedback(
        &self,
        mentor_id: Uuid,
        min_rating: Option<i16>,
        page: PageRequest,
    ) -> PortResult<(Vec<Feedback>, u64)> {
        let min_rating = min_rating.unwrap_or(1);
        let total: i64 = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM feedback WHERE mentor_id = $1 AND is_public AND rating >= $2",
        )
        .bind(mentor_id)
        .bind(min_rating)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        let records = sqlx::query_as::<_, FeedbackRecord>(&format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback \
             WHERE mentor_id = $1 AND is_public AND rating >= $2 \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4"
        ))
        .bind(mentor_id)
        .bind(min_rating)
        .bind(i64::from(page.limit))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let feedback = records.into_iter().map(FeedbackRecord::to_domain).collect();
        Ok((feedback, total.max(0) as u64))
    }

    async fn reviewed_session_ids(&self, student_id: Uuid) -> PortResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>("SELECT session_id FROM feedback WHERE student_id = $1")
            .bind(student_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)
    }
}

//=========================================================================================
// `NotificationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl NotificationService for DbAdapter {
    /// Appends the event to the `notifications` mailbox table.
    async fn notify(&self, notification: &Notification) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO notifications (id, recipient_id, kind, session_id, message) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(notification.recipient_id)
        .bind(notification.kind.as_str())
        .bind(notification.session_id)
        .bind(&notification.message)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }
}
