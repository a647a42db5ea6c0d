use anyhow::{anyhow, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

use homework_bot::config::App;
use homework_bot::error::{PollError, ShapeError};
use homework_bot::notifier::Notifier;
use homework_bot::poller::{Outcome, Poller};
use homework_bot::practicum::HomeworkApi;

const APPROVED_HW1: &str =
    "Изменился статус проверки работы \"HW1\". Работа проверена: ревьюеру всё понравилось. Ура!";

#[derive(Clone, Default)]
struct ScriptedApi {
    responses: Arc<Mutex<VecDeque<Result<Value, PollError>>>>,
    requested: Arc<Mutex<Vec<i64>>>,
}

impl ScriptedApi {
    fn with_responses(responses: Vec<Result<Value, PollError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            ..Default::default()
        }
    }

    async fn requested(&self) -> Vec<i64> {
        self.requested.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl HomeworkApi for ScriptedApi {
    async fn fetch(&self, from_date: i64) -> Result<Value, PollError> {
        self.requested.lock().await.push(from_date);
        let mut guard = self.responses.lock().await;
        guard
            .pop_front()
            .unwrap_or_else(|| Ok(json!({"homeworks": [], "current_date": from_date})))
    }
}

#[derive(Clone, Default)]
struct RecordingNotifier {
    sent: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingNotifier {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    async fn sent(&self) -> Vec<String> {
        self.sent.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        self.sent.lock().await.push(text.to_string());
        if self.fail {
            return Err(anyhow!("chat not found"));
        }
        Ok(())
    }
}

fn app(alert_on_error: bool) -> App {
    App {
        retry_period_secs: 600,
        alert_on_error,
    }
}

fn poller(
    responses: Vec<Result<Value, PollError>>,
    alert_on_error: bool,
) -> (Poller<ScriptedApi, RecordingNotifier>, ScriptedApi, RecordingNotifier) {
    let api = ScriptedApi::with_responses(responses);
    let notifier = RecordingNotifier::default();
    let poller = Poller::new(api.clone(), notifier.clone(), &app(alert_on_error)).with_cursor(900);
    (poller, api, notifier)
}

#[tokio::test]
async fn empty_homeworks_advance_cursor_without_notification() {
    let (mut poller, api, notifier) =
        poller(vec![Ok(json!({"homeworks": [], "current_date": 1000}))], true);

    let outcome = poller.tick().await.unwrap();

    assert_eq!(outcome, Outcome::NoChange);
    assert_eq!(poller.cursor(), 1000);
    assert_eq!(api.requested().await, vec![900]);
    assert!(notifier.sent().await.is_empty());
}

#[tokio::test]
async fn status_change_is_notified_and_cursor_advances() {
    let (mut poller, api, notifier) = poller(
        vec![
            Ok(json!({"homeworks": [], "current_date": 1000})),
            Ok(json!({
                "homeworks": [{"status": "approved", "homework_name": "HW1", "id": 1}],
                "current_date": 1010
            })),
        ],
        true,
    );

    poller.tick().await.unwrap();
    let outcome = poller.tick().await.unwrap();

    assert_eq!(outcome, Outcome::Notified(APPROVED_HW1.to_string()));
    assert_eq!(poller.cursor(), 1010);
    assert_eq!(api.requested().await, vec![900, 1000]);
    assert_eq!(notifier.sent().await, vec![APPROVED_HW1.to_string()]);
}

#[tokio::test]
async fn unknown_status_keeps_cursor_and_alerts() {
    let (mut poller, _api, notifier) = poller(
        vec![Ok(json!({
            "homeworks": [{"status": "lost", "homework_name": "HW1"}],
            "current_date": 1010
        }))],
        true,
    );

    let err = poller.tick().await.unwrap_err();

    assert!(matches!(err, PollError::UnknownStatus(Some(ref s)) if s == "lost"));
    assert_eq!(poller.cursor(), 900);
    let sent = notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].starts_with("Сбой в работе программы: unknown homework status"));
}

#[tokio::test]
async fn shape_violations_never_send_status_messages() {
    let bodies = vec![
        json!([{"homeworks": []}]),
        json!({"current_date": 1000}),
        json!({"homeworks": "none", "current_date": 1000}),
    ];
    let expected = [
        ShapeError::NotAnObject,
        ShapeError::MissingHomeworks,
        ShapeError::HomeworksNotAList,
    ];
    let (mut poller, _api, notifier) = poller(bodies.into_iter().map(Ok).collect(), false);

    for shape in expected {
        let err = poller.tick().await.unwrap_err();
        assert!(matches!(err, PollError::Shape(ref s) if *s == shape));
        assert_eq!(poller.cursor(), 900);
    }
    assert!(notifier.sent().await.is_empty());
}

#[tokio::test]
async fn transport_failure_keeps_cursor() {
    let (mut poller, _api, notifier) = poller(
        vec![Err(PollError::UnexpectedStatus(StatusCode::SERVICE_UNAVAILABLE))],
        false,
    );

    let err = poller.tick().await.unwrap_err();

    assert!(matches!(err, PollError::UnexpectedStatus(code) if code == StatusCode::SERVICE_UNAVAILABLE));
    assert_eq!(poller.cursor(), 900);
    assert!(notifier.sent().await.is_empty());
}

#[tokio::test]
async fn repeated_errors_alert_once_until_recovery() {
    let outage = || -> Result<Value, PollError> {
        Err(PollError::UnexpectedStatus(StatusCode::BAD_GATEWAY))
    };
    let (mut poller, _api, notifier) = poller(
        vec![
            outage(),
            outage(),
            Err(PollError::UnexpectedStatus(StatusCode::UNAUTHORIZED)),
            Ok(json!({"homeworks": [], "current_date": 1000})),
            outage(),
        ],
        true,
    );
    assert_eq!(poller.last_error(), None);

    for _ in 0..5 {
        let _ = poller.tick().await;
    }

    let sent = notifier.sent().await;
    assert_eq!(sent.len(), 3, "alerts: {sent:?}");
    assert!(sent[0].contains("502"));
    assert!(sent[1].contains("401"));
    assert!(sent[2].contains("502"));
    assert!(poller.last_error().unwrap().contains("502"));
    assert_eq!(poller.cursor(), 1000);
}

#[tokio::test]
async fn only_first_homework_is_reported_on_replay() {
    let body = json!({
        "homeworks": [
            {"status": "rejected", "homework_name": "HW2"},
            {"status": "approved", "homework_name": "HW1"},
            {"status": "bogus", "homework_name": "HW0"}
        ],
        "current_date": 900
    });
    let (mut poller, api, notifier) = poller(vec![Ok(body.clone()), Ok(body)], true);

    poller.tick().await.unwrap();
    poller.tick().await.unwrap();

    assert_eq!(api.requested().await, vec![900, 900]);
    let sent = notifier.sent().await;
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|m| m.contains("\"HW2\"")));
}

#[tokio::test]
async fn missing_current_date_fails_after_delivery() {
    let (mut poller, _api, notifier) = poller(
        vec![Ok(json!({"homeworks": [{"status": "reviewing", "homework_name": "HW3"}]}))],
        false,
    );

    let err = poller.tick().await.unwrap_err();

    assert!(matches!(err, PollError::MissingCurrentDate));
    assert_eq!(poller.cursor(), 900);
    assert_eq!(
        notifier.sent().await,
        vec!["Изменился статус проверки работы \"HW3\". Работа взята на проверку ревьюером.".to_string()]
    );
}

#[tokio::test]
async fn delivery_failure_does_not_stop_iteration() {
    let api = ScriptedApi::with_responses(vec![Ok(json!({
        "homeworks": [{"status": "approved", "homework_name": "HW1"}],
        "current_date": 1010
    }))]);
    let notifier = RecordingNotifier::failing();
    let mut poller = Poller::new(api, notifier.clone(), &app(true)).with_cursor(900);

    let outcome = poller.tick().await.unwrap();

    assert_eq!(outcome, Outcome::Notified(APPROVED_HW1.to_string()));
    assert_eq!(poller.cursor(), 1010);
    assert_eq!(notifier.sent().await.len(), 1);
}

#[tokio::test]
async fn initial_cursor_is_one_retry_period_back() {
    let before = chrono::Utc::now().timestamp();
    let poller = Poller::new(
        ScriptedApi::default(),
        RecordingNotifier::default(),
        &App {
            retry_period_secs: 120,
            alert_on_error: true,
        },
    );
    let after = chrono::Utc::now().timestamp();

    assert!(poller.cursor() >= before - 120);
    assert!(poller.cursor() <= after - 120);
}

#[tokio::test]
async fn huge_retry_period_saturates_initial_cursor() {
    let poller = Poller::new(
        ScriptedApi::default(),
        RecordingNotifier::default(),
        &App {
            retry_period_secs: u64::MAX,
            alert_on_error: true,
        },
    );

    assert!(poller.cursor() <= 0);
}
