use serde_json::Value;
use tracing::{debug, error};

use crate::error::PollError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HomeworkStatus {
    Approved,
    Reviewing,
    Rejected,
}

impl HomeworkStatus {
    pub const ALL: [HomeworkStatus; 3] = [
        HomeworkStatus::Approved,
        HomeworkStatus::Reviewing,
        HomeworkStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HomeworkStatus::Approved => "approved",
            HomeworkStatus::Reviewing => "reviewing",
            HomeworkStatus::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == raw)
    }

    /// Reviewer verdict shown to the user.
    pub fn verdict(&self) -> &'static str {
        match self {
            HomeworkStatus::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            HomeworkStatus::Reviewing => "Работа взята на проверку ревьюером.",
            HomeworkStatus::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }
}

/// A homework record whose status and name have been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Homework {
    pub name: String,
    pub status: HomeworkStatus,
}

impl Homework {
    /// Status is checked before the name so an unknown status wins.
    pub fn from_record(record: &Value) -> Result<Self, PollError> {
        let raw_status = record.get("status").and_then(Value::as_str);
        let status = match raw_status.and_then(HomeworkStatus::parse) {
            Some(status) => status,
            None => {
                error!(status = ?raw_status, "unknown homework status");
                return Err(PollError::UnknownStatus(raw_status.map(str::to_owned)));
            }
        };
        let name = match record.get("homework_name").and_then(Value::as_str) {
            Some(name) => name.to_owned(),
            None => {
                error!("homework record has no homework_name");
                return Err(PollError::MissingHomeworkName);
            }
        };
        Ok(Self { name, status })
    }

    pub fn message(&self) -> String {
        format!(
            "Изменился статус проверки работы \"{}\". {}",
            self.name,
            self.status.verdict()
        )
    }
}

/// Translate a raw homework record into the notification text.
pub fn parse_status(record: &Value) -> Result<String, PollError> {
    let homework = Homework::from_record(record)?;
    debug!(name = %homework.name, status = homework.status.as_str(), "homework status parsed");
    Ok(homework.message())
}
