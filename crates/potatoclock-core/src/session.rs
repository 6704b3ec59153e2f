//! Session records: immutable logs of elapsed timer activity.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::activity::MAX_DURATION_MINUTES;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionType {
    Work,
    Break,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionStatus {
    Completed,
    Interrupted,
    /// Operator-entered backfill.
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "SessionRecord")]
pub struct Session {
    pub id: String,
    /// Back-reference to the source activity, if any. Not an ownership link.
    pub task_id: Option<String>,
    /// Title at the time the session was recorded.
    pub task_title: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end_time: DateTime<Utc>,
    pub duration_minutes: u32,
    #[serde(rename = "type")]
    pub session_type: SessionType,
    pub status: SessionStatus,
    #[serde(default)]
    pub interruption_reason: Option<String>,
}

impl Session {
    /// Record produced by the timer. `start_time` is derived from the
    /// elapsed minutes so the record always spans a whole number of minutes.
    pub(crate) fn from_timer(
        task_id: Option<String>,
        task_title: String,
        session_type: SessionType,
        status: SessionStatus,
        elapsed_minutes: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            task_id,
            task_title,
            start_time: now - Duration::minutes(i64::from(elapsed_minutes)),
            end_time: now,
            duration_minutes: elapsed_minutes,
            session_type,
            status,
            interruption_reason: None,
        }
    }

    /// Backfilled session entered by hand.
    ///
    /// The duration defaults to the whole minutes between start and end.
    /// Equal start and end are accepted only with an explicit duration of
    /// at least one minute.
    pub fn manual(
        task_id: Option<String>,
        task_title: impl Into<String>,
        session_type: SessionType,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        duration_minutes: Option<u32>,
    ) -> Result<Self, ValidationError> {
        let task_title = task_title.into().trim().to_string();
        if task_title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if end_time < start_time {
            return Err(ValidationError::InvalidTimeRange {
                start: start_time,
                end: end_time,
            });
        }
        let span = u32::try_from((end_time - start_time).num_minutes()).unwrap_or(u32::MAX);
        let duration_minutes = duration_minutes.unwrap_or(span);
        if duration_minutes < 1 {
            return Err(ValidationError::invalid(
                "durationMinutes",
                "must be at least one minute",
            ));
        }
        if duration_minutes > MAX_DURATION_MINUTES {
            return Err(ValidationError::invalid(
                "durationMinutes",
                format!("must be at most {MAX_DURATION_MINUTES} minutes"),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            task_id,
            task_title,
            start_time,
            end_time,
            duration_minutes,
            session_type,
            status: SessionStatus::Manual,
            interruption_reason: None,
        })
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.interruption_reason = Some(reason.into());
        self
    }

    pub fn is_work(&self) -> bool {
        self.session_type == SessionType::Work
    }
}

/// Stored shape of a session. Older records may carry a null `endTime`,
/// which is rebuilt from the start and the duration.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionRecord {
    id: String,
    task_id: Option<String>,
    task_title: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    start_time: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    end_time: Option<DateTime<Utc>>,
    duration_minutes: u32,
    #[serde(rename = "type")]
    session_type: SessionType,
    status: SessionStatus,
    #[serde(default)]
    interruption_reason: Option<String>,
}

impl From<SessionRecord> for Session {
    fn from(r: SessionRecord) -> Self {
        let end_time = r.end_time.unwrap_or_else(|| {
            r.start_time
                .checked_add_signed(Duration::minutes(i64::from(r.duration_minutes)))
                .unwrap_or(r.start_time)
        });
        Self {
            id: r.id,
            task_id: r.task_id,
            task_title: r.task_title,
            start_time: r.start_time,
            end_time,
            duration_minutes: r.duration_minutes,
            session_type: r.session_type,
            status: r.status,
            interruption_reason: r.interruption_reason,
        }
    }
}

/// Destination for sessions produced by the timer.
///
/// Implemented by [`crate::ActivityStore`]; tests can collect into a `Vec`.
pub trait SessionSink {
    fn append_session(&mut self, session: Session);
}

impl SessionSink for Vec<Session> {
    fn append_session(&mut self, session: Session) {
        self.push(session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 3, h, m, 0).unwrap()
    }

    #[test]
    fn timer_session_spans_elapsed_minutes() {
        let s = Session::from_timer(
            None,
            "Deep work".into(),
            SessionType::Work,
            SessionStatus::Completed,
            25,
            at(10, 25),
        );
        assert_eq!(s.start_time, at(10, 0));
        assert_eq!(s.end_time, at(10, 25));
        assert!(s.end_time >= s.start_time);
    }

    #[test]
    fn manual_session_computes_duration() {
        let s = Session::manual(None, "Reading", SessionType::Work, at(9, 0), at(9, 40), None)
            .unwrap();
        assert_eq!(s.duration_minutes, 40);
        assert_eq!(s.status, SessionStatus::Manual);
    }

    #[test]
    fn manual_session_rejects_reversed_range() {
        let err = Session::manual(None, "Oops", SessionType::Work, at(9, 30), at(9, 0), None)
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidTimeRange { .. }));
    }

    #[test]
    fn manual_session_equal_times_need_explicit_duration() {
        assert!(
            Session::manual(None, "Call", SessionType::Break, at(9, 0), at(9, 0), None).is_err()
        );
        let s = Session::manual(None, "Call", SessionType::Break, at(9, 0), at(9, 0), Some(5))
            .unwrap();
        assert_eq!(s.duration_minutes, 5);
    }

    #[test]
    fn manual_session_is_bounded_to_one_day() {
        let next_day = at(9, 0) + Duration::days(1);
        assert!(
            Session::manual(None, "Hike", SessionType::Work, at(9, 0), at(9, 0), Some(u32::MAX))
                .is_err()
        );
        assert!(
            Session::manual(None, "Hike", SessionType::Work, at(9, 0), next_day, None).is_ok()
        );
        assert!(Session::manual(
            None,
            "Hike",
            SessionType::Work,
            at(9, 0),
            next_day + Duration::minutes(1),
            None
        )
        .is_err());
    }

    #[test]
    fn null_end_time_is_rebuilt_from_duration() {
        let json = serde_json::json!({
            "id": "s1",
            "taskId": null,
            "taskTitle": "Reading",
            "startTime": at(9, 0).timestamp_millis(),
            "endTime": null,
            "durationMinutes": 40,
            "type": "WORK",
            "status": "MANUAL"
        });
        let s: Session = serde_json::from_value(json).unwrap();
        assert_eq!(s.end_time, at(9, 40));
        assert_eq!(s.interruption_reason, None);
    }

    #[test]
    fn wire_shape() {
        let s = Session::from_timer(
            Some("t1".into()),
            "Write".into(),
            SessionType::Break,
            SessionStatus::Completed,
            5,
            at(11, 0),
        );
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["type"], "BREAK");
        assert_eq!(json["status"], "COMPLETED");
        assert_eq!(json["taskId"], "t1");
        assert!(json["interruptionReason"].is_null());
        assert_eq!(json["endTime"], at(11, 0).timestamp_millis());
    }
}
