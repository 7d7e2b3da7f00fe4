//! Work request records and their state machine.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A queued work request.
///
/// Jobs are created `NotStarted`; the dispatcher marks them `InProgress`
/// before routing to a processor and `Completed` or `Failed` on return.
/// Failed jobs carry the error class and message in `error`.
#[derive(Debug, Clone, FromRow)]
pub struct Job {
    pub id: i64,
    pub submitted: DateTime<Utc>,
    pub user_id: String,
    #[sqlx(rename = "job_type")]
    pub job_type: JobType,
    pub state: JobState,
    /// Serialized descriptor, JSON schema per job type
    pub descriptor: String,
    /// Error class and message recorded on failure
    pub error: Option<String>,
}

/// Job type, routing key for the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    MapsCreate,
    MapsUpdate,
    MapsDelete,
    TransformationSet,
    TransformationProcess,
    MosaicMapCreate,
    MosaicMapDelete,
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::MapsCreate => "MAPS_CREATE",
            Self::MapsUpdate => "MAPS_UPDATE",
            Self::MapsDelete => "MAPS_DELETE",
            Self::TransformationSet => "TRANSFORMATION_SET",
            Self::TransformationProcess => "TRANSFORMATION_PROCESS",
            Self::MosaicMapCreate => "MOSAIC_MAP_CREATE",
            Self::MosaicMapDelete => "MOSAIC_MAP_DELETE",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MAPS_CREATE" => Ok(Self::MapsCreate),
            "MAPS_UPDATE" => Ok(Self::MapsUpdate),
            "MAPS_DELETE" => Ok(Self::MapsDelete),
            "TRANSFORMATION_SET" => Ok(Self::TransformationSet),
            "TRANSFORMATION_PROCESS" => Ok(Self::TransformationProcess),
            "MOSAIC_MAP_CREATE" => Ok(Self::MosaicMapCreate),
            "MOSAIC_MAP_DELETE" => Ok(Self::MosaicMapDelete),
            other => Err(format!("unknown job type: {}", other)),
        }
    }
}

/// Job lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NotStarted => "NOT_STARTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_job_type_roundtrip() {
        for job_type in [
            JobType::MapsCreate,
            JobType::MapsUpdate,
            JobType::MapsDelete,
            JobType::TransformationSet,
            JobType::TransformationProcess,
            JobType::MosaicMapCreate,
            JobType::MosaicMapDelete,
        ] {
            let name = job_type.to_string();
            assert_eq!(JobType::from_str(&name).expect("parse"), job_type);
        }
    }

    #[test]
    fn test_unknown_job_type_rejected() {
        assert!(JobType::from_str("MAPS_EXPLODE").is_err());
    }

    #[test]
    fn test_state_names() {
        assert_eq!(JobState::NotStarted.to_string(), "NOT_STARTED");
        assert_eq!(JobState::Failed.to_string(), "FAILED");
    }
}
