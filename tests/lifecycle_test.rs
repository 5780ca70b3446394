//! Lifecycle controller tests against a fake platform
//! Run with: cargo test --test lifecycle_test

mod common;

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use biblebot::application::errors::{BotError, StartupError};
use biblebot::application::lifecycle::{Controller, LifecycleState};
use biblebot::domain::entities::{MessageEvent, Reply, User};
use biblebot::domain::traits::{
    Bot, BotInfo, Connector, Context, EventHandler, Messenger, SessionSettings,
};

const SELF_ID: &str = "100";

#[derive(Default)]
struct Recorder {
    connects: AtomicUsize,
    opens: AtomicUsize,
    closes: AtomicUsize,
    tokens: Mutex<Vec<String>>,
    handler: Mutex<Option<Arc<dyn EventHandler>>>,
    sent: Mutex<Vec<Reply>>,
}

struct FakeMessenger(Arc<Recorder>);

#[async_trait]
impl Messenger for FakeMessenger {
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String, BotError> {
        self.0.sent.lock().unwrap().push(Reply::new(channel_id, text));
        Ok("1".to_string())
    }
}

struct FakeBot {
    recorder: Arc<Recorder>,
    fail_open: bool,
    ping_outside_running: bool,
    handler: Option<Arc<dyn EventHandler>>,
}

impl FakeBot {
    /// Push a `+ping` straight into the registered handler
    async fn ping_now(&self, channel: &str) {
        if let Some(handler) = &self.handler {
            let ctx = Context::new(self.messenger(), SELF_ID);
            handler.message(ctx, MessageEvent::new(channel, User::new("200"), "+ping")).await;
        }
    }
}

#[async_trait]
impl Bot for FakeBot {
    fn on_message(&mut self, handler: Arc<dyn EventHandler>) {
        self.handler = Some(handler);
    }

    async fn open(&mut self) -> Result<(), BotError> {
        self.recorder.opens.fetch_add(1, Ordering::SeqCst);
        if self.ping_outside_running {
            self.ping_now("while-connecting").await;
        }
        if self.fail_open {
            return Err(BotError::Gateway("connection refused".into()));
        }
        *self.recorder.handler.lock().unwrap() = self.handler.clone();
        Ok(())
    }

    async fn close(&mut self) {
        self.recorder.closes.fetch_add(1, Ordering::SeqCst);
        if self.ping_outside_running {
            self.ping_now("while-closing").await;
        }
    }

    fn messenger(&self) -> Arc<dyn Messenger> {
        Arc::new(FakeMessenger(self.recorder.clone()))
    }

    fn bot_info(&self) -> BotInfo {
        BotInfo {
            id: SELF_ID.to_string(),
            name: "BibleBot".to_string(),
        }
    }
}

#[derive(Default)]
struct FakeConnector {
    recorder: Arc<Recorder>,
    fail_connect: bool,
    fail_open: bool,
    ping_outside_running: bool,
}

#[async_trait]
impl Connector for FakeConnector {
    type Bot = FakeBot;

    async fn connect(&self, settings: &SessionSettings) -> Result<FakeBot, BotError> {
        self.recorder.connects.fetch_add(1, Ordering::SeqCst);
        self.recorder.tokens.lock().unwrap().push(settings.token.clone());
        if self.fail_connect {
            return Err(BotError::Auth("401 Unauthorized".into()));
        }
        Ok(FakeBot {
            recorder: self.recorder.clone(),
            fail_open: self.fail_open,
            ping_outside_running: self.ping_outside_running,
            handler: None,
        })
    }
}

/// Deliver `event` to whatever handler the bot registered, as the platform would
async fn deliver(recorder: &Arc<Recorder>, event: MessageEvent) {
    let handler = recorder.handler.lock().unwrap().clone().expect("handler registered");
    let ctx = Context::new(Arc::new(FakeMessenger(recorder.clone())), SELF_ID);
    handler.message(ctx, event).await;
}

#[tokio::test]
async fn missing_config_exits_1_without_connecting() {
    common::ensure_init();
    let dir = tempfile::tempdir().unwrap();
    let connector = FakeConnector::default();
    let recorder = connector.recorder.clone();

    let mut controller = Controller::new(connector);
    let err = controller.run(&dir.path().join("config.yaml"), async {}).await.unwrap_err();

    assert!(matches!(err, StartupError::Config(_)));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(recorder.connects.load(Ordering::SeqCst), 0);
    assert_eq!(controller.state(), LifecycleState::Configuring);
}

#[tokio::test]
async fn failed_authentication_exits_2() {
    common::ensure_init();
    let config = common::config_file("abc", None);
    let connector = FakeConnector {
        fail_connect: true,
        ..Default::default()
    };
    let recorder = connector.recorder.clone();

    let err = Controller::new(connector).run(config.path(), async {}).await.unwrap_err();

    assert!(matches!(err, StartupError::Client(BotError::Auth(_))));
    assert_eq!(err.exit_code(), 2);
    assert_eq!(recorder.opens.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_open_exits_3() {
    common::ensure_init();
    let config = common::config_file("abc", None);
    let connector = FakeConnector {
        fail_open: true,
        ..Default::default()
    };
    let recorder = connector.recorder.clone();

    let mut controller = Controller::new(connector);
    let err = controller.run(config.path(), async {}).await.unwrap_err();

    assert!(matches!(err, StartupError::Connect(_)));
    assert_eq!(err.exit_code(), 3);
    assert_eq!(recorder.opens.load(Ordering::SeqCst), 1);
    assert_eq!(controller.state(), LifecycleState::Connecting);
}

#[tokio::test]
async fn signal_closes_connection_once_and_stops() {
    common::ensure_init();
    let config = common::config_file("abc", None);
    let connector = FakeConnector::default();
    let recorder = connector.recorder.clone();

    let mut controller = Controller::new(connector);
    let recorder_in_run = recorder.clone();
    controller
        .run(config.path(), async move {
            // Still running: nothing closed yet
            assert_eq!(recorder_in_run.closes.load(Ordering::SeqCst), 0);
        })
        .await
        .unwrap();

    assert_eq!(recorder.opens.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.closes.load(Ordering::SeqCst), 1);
    assert_eq!(controller.state(), LifecycleState::Stopped);
}

#[tokio::test]
async fn ping_while_running_replies_pong_in_channel() {
    common::ensure_init();
    let config = common::config_file("abc", None);
    let connector = FakeConnector::default();
    let recorder = connector.recorder.clone();

    let traffic = recorder.clone();
    Controller::new(connector)
        .run(config.path(), async move {
            deliver(&traffic, MessageEvent::new("C1", User::new("200"), "+ping")).await;
            deliver(&traffic, MessageEvent::new("C1", User::new(SELF_ID), "+ping")).await;
            deliver(&traffic, MessageEvent::new("C2", User::new("200"), "+ping now")).await;
        })
        .await
        .unwrap();

    assert_eq!(*recorder.sent.lock().unwrap(), vec![Reply::new("C1", "pong")]);
}

#[tokio::test]
async fn events_outside_running_get_no_reply() {
    common::ensure_init();
    let config = common::config_file("abc", None);
    let connector = FakeConnector {
        ping_outside_running: true,
        ..Default::default()
    };
    let recorder = connector.recorder.clone();

    let traffic = recorder.clone();
    Controller::new(connector)
        .run(config.path(), async move {
            deliver(&traffic, MessageEvent::new("while-running", User::new("200"), "+ping")).await;
        })
        .await
        .unwrap();

    assert_eq!(*recorder.sent.lock().unwrap(), vec![Reply::new("while-running", "pong")]);
}

#[tokio::test]
async fn token_override_replaces_config_token() {
    common::ensure_init();
    let config = common::config_file("from-file", None);
    let connector = FakeConnector::default();
    let recorder = connector.recorder.clone();

    Controller::new(connector)
        .with_token(Some("from-cli".to_string()))
        .run(config.path(), async {})
        .await
        .unwrap();

    assert_eq!(*recorder.tokens.lock().unwrap(), vec!["from-cli".to_string()]);
}

#[tokio::test]
async fn controller_runs_only_once() {
    common::ensure_init();
    let config = common::config_file("abc", None);
    let mut controller = Controller::new(FakeConnector::default());

    controller.run(config.path(), async {}).await.unwrap();
    let err = controller.run(config.path(), async {}).await.unwrap_err();

    assert!(matches!(err, StartupError::Internal(_)));
}
