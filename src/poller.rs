use chrono::Utc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

use crate::config::App;
use crate::error::PollError;
use crate::model::parse_status;
use crate::notifier::{send_message, Notifier};
use crate::practicum::{check_response, HomeworkApi};

/// Result of one successful polling iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The latest homework changed status; carries the text that was sent.
    Notified(String),
    NoChange,
}

pub struct Poller<A, N> {
    api: A,
    notifier: N,
    cursor: i64,
    retry_period: Duration,
    alert_on_error: bool,
    last_error: Option<String>,
}

impl<A: HomeworkApi, N: Notifier> Poller<A, N> {
    /// Start one retry period in the past so the first poll covers recent changes.
    pub fn new(api: A, notifier: N, app: &App) -> Self {
        let retry_period = app.retry_period();
        let back = i64::try_from(retry_period.as_secs()).unwrap_or(i64::MAX);
        let cursor = Utc::now().timestamp().saturating_sub(back);
        Self {
            api,
            notifier,
            cursor,
            retry_period,
            alert_on_error: app.alert_on_error,
            last_error: None,
        }
    }

    pub fn with_cursor(mut self, cursor: i64) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Rendered text of the last failure that was alerted, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Fetch, validate, notify about the latest homework, then advance the cursor.
    /// The cursor only moves when every earlier step succeeded.
    #[instrument(skip_all, fields(from_date = self.cursor))]
    pub async fn poll_once(&mut self) -> Result<Outcome, PollError> {
        let body = self.api.fetch(self.cursor).await?;
        let response = check_response(&body)?;

        let outcome = match response.latest() {
            Some(record) => {
                let message = parse_status(record)?;
                send_message(&self.notifier, &message).await;
                Outcome::Notified(message)
            }
            None => {
                debug!("homework status has not changed");
                Outcome::NoChange
            }
        };

        self.cursor = response.current_date.ok_or_else(|| {
            error!("API response has no current_date");
            PollError::MissingCurrentDate
        })?;
        Ok(outcome)
    }

    /// One iteration with failure handling: errors are logged and, when
    /// enabled, alerted once until a different error or a success occurs.
    pub async fn tick(&mut self) -> Result<Outcome, PollError> {
        let result = self.poll_once().await;
        match &result {
            Ok(_) => {
                self.last_error = None;
            }
            Err(err) => {
                let rendered = err.to_string();
                error!(error = %rendered, cursor = self.cursor, "polling iteration failed");
                if self.alert_on_error && self.last_error.as_deref() != Some(rendered.as_str()) {
                    let alert = format!("Сбой в работе программы: {rendered}");
                    send_message(&self.notifier, &alert).await;
                    self.last_error = Some(rendered);
                }
            }
        }
        result
    }

    /// Poll forever, sleeping one retry period after every iteration.
    pub async fn run(mut self) {
        info!(
            cursor = self.cursor,
            retry_period_secs = self.retry_period.as_secs(),
            "starting homework status polling"
        );
        loop {
            let _ = self.tick().await;
            tokio::time::sleep(self.retry_period).await;
        }
    }
}
