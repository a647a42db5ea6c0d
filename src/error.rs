use reqwest::StatusCode;
use thiserror::Error;

/// Violations of the documented homework statuses response shape.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("API response is not a JSON object")]
    NotAnObject,
    #[error("API response has no \"homeworks\" key")]
    MissingHomeworks,
    #[error("\"homeworks\" in API response is not a list")]
    HomeworksNotAList,
}

/// Everything that can abandon a single polling iteration.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("homework API is unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("homework API returned {0}, expected 200")]
    UnexpectedStatus(StatusCode),
    #[error("API response does not match documentation: {0}")]
    Shape(#[from] ShapeError),
    #[error("unknown homework status: {0:?}")]
    UnknownStatus(Option<String>),
    #[error("homework record has no \"homework_name\"")]
    MissingHomeworkName,
    #[error("API response has no integer \"current_date\"")]
    MissingCurrentDate,
}
