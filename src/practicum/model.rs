use serde_json::Value;
use tracing::{debug, error};

use crate::error::ShapeError;

/// Homework statuses response after shape validation.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusesResponse {
    /// Raw records, newest first; each is checked only when it is consulted.
    pub homeworks: Vec<Value>,
    pub current_date: Option<i64>,
}

impl StatusesResponse {
    pub fn latest(&self) -> Option<&Value> {
        self.homeworks.first()
    }
}

/// Check that a decoded body looks like the documented statuses response.
pub fn check_response(response: &Value) -> Result<StatusesResponse, ShapeError> {
    let Some(object) = response.as_object() else {
        error!(%response, "API response is not a JSON object");
        return Err(ShapeError::NotAnObject);
    };
    let Some(homeworks) = object.get("homeworks") else {
        error!("API response has no homeworks key");
        return Err(ShapeError::MissingHomeworks);
    };
    let Some(homeworks) = homeworks.as_array() else {
        error!(%homeworks, "homeworks in API response is not a list");
        return Err(ShapeError::HomeworksNotAList);
    };
    debug!(count = homeworks.len(), "API response matches documentation");
    Ok(StatusesResponse {
        homeworks: homeworks.clone(),
        current_date: object.get("current_date").and_then(Value::as_i64),
    })
}
