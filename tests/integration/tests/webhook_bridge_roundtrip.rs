use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use httpmock::prelude::*;
use kiro_bridge::{BridgeConfig, BridgeController, ScriptDelays, TurnStatus};
use kiro_bridge_server::build_webhook_router;
use kiro_telegram::{TelegramApiClient, TelegramClientConfig};
use kiro_terminal::{ControlKey, Keystrokes, TerminalHost};
use serde_json::json;
use tempfile::tempdir;
use tower::ServiceExt;

const TOKEN: &str = "555:integration";

struct ScriptedTmux {
    exists: AtomicBool,
    injected: Mutex<Vec<Keystrokes>>,
}

impl ScriptedTmux {
    fn new(exists: bool) -> Self {
        Self {
            exists: AtomicBool::new(exists),
            injected: Mutex::new(Vec::new()),
        }
    }

    fn injections(&self) -> Vec<Keystrokes> {
        self.injected.lock().expect("injected lock").clone()
    }
}

#[async_trait]
impl TerminalHost for ScriptedTmux {
    async fn session_exists(&self, _session: &str) -> Result<bool> {
        Ok(self.exists.load(Ordering::SeqCst))
    }

    async fn inject(&self, _session: &str, keystrokes: &Keystrokes) -> Result<()> {
        self.injected
            .lock()
            .expect("injected lock")
            .push(keystrokes.clone());
        Ok(())
    }
}

struct Harness {
    app: Router,
    controller: BridgeController,
    tmux: Arc<ScriptedTmux>,
}

fn harness(server: &MockServer, state_dir: &Path, session_exists: bool) -> Harness {
    let telegram = TelegramApiClient::new(TelegramClientConfig {
        api_base: server.base_url(),
        bot_token: TOKEN.to_string(),
        request_timeout_ms: 2_000,
    })
    .expect("telegram client");
    let mut config = BridgeConfig::new("kiro", state_dir);
    config.delays = ScriptDelays::zero();
    config.typing_interval = Duration::from_secs(60);
    let tmux = Arc::new(ScriptedTmux::new(session_exists));
    let controller =
        BridgeController::new(config, tmux.clone(), Arc::new(telegram)).expect("controller");
    Harness {
        app: build_webhook_router(controller.clone()),
        controller,
        tmux,
    }
}

fn api_path(method: &str) -> String {
    format!("/bot{TOKEN}/{method}")
}

async fn post_update(app: &Router, body: String) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

fn message_update(chat_id: i64, message_id: i64, text: &str) -> String {
    json!({
        "update_id": message_id,
        "message": {"message_id": message_id, "chat": {"id": chat_id}, "text": text}
    })
    .to_string()
}

#[tokio::test]
async fn integration_free_form_message_reacts_and_types_into_session() {
    let server = MockServer::start();
    let reaction = server.mock(|when, then| {
        when.method(POST)
            .path(api_path("setMessageReaction"))
            .body_includes("\"message_id\":31");
        then.status(200).json_body(json!({"ok": true, "result": true}));
    });
    let typing = server.mock(|when, then| {
        when.method(POST).path(api_path("sendChatAction"));
        then.status(200).json_body(json!({"ok": true, "result": true}));
    });
    let temp = tempdir().expect("tempdir");
    let harness = harness(&server, temp.path(), true);

    let body = post_update(&harness.app, message_update(42, 31, "hello")).await;

    assert_eq!(body, "OK");
    assert_eq!(
        harness.tmux.injections(),
        vec![
            Keystrokes::literal("hello"),
            Keystrokes::Control(ControlKey::Enter),
        ]
    );
    assert!(matches!(harness.controller.turn_status(), TurnStatus::Pending(_)));
    assert!(temp.path().join("telegram_pending").exists());
    assert_eq!(
        std::fs::read_to_string(temp.path().join("telegram_chat_id")).expect("chat id"),
        "42"
    );

    tokio::time::sleep(Duration::from_millis(200)).await;
    reaction.assert();
    typing.assert();
    harness.controller.shutdown();
}

#[tokio::test]
async fn integration_resume_offer_and_selection_restart_agent() {
    let server = MockServer::start();
    let prompt = server.mock(|when, then| {
        when.method(POST)
            .path(api_path("sendMessage"))
            .body_includes("Select resume option:")
            .body_includes("\"callback_data\":\"picker\"");
        then.status(200).json_body(json!({"ok": true, "result": {}}));
    });
    let answer = server.mock(|when, then| {
        when.method(POST)
            .path(api_path("answerCallbackQuery"))
            .body_includes("\"callback_query_id\":\"cbq-1\"");
        then.status(200).json_body(json!({"ok": true, "result": true}));
    });
    let confirmation = server.mock(|when, then| {
        when.method(POST)
            .path(api_path("sendMessage"))
            .body_includes("Opening session picker...");
        then.status(200).json_body(json!({"ok": true, "result": {}}));
    });
    let temp = tempdir().expect("tempdir");
    let harness = harness(&server, temp.path(), true);

    post_update(&harness.app, message_update(42, 50, "/resume")).await;
    prompt.assert();
    assert!(harness.tmux.injections().is_empty());

    let callback = json!({
        "update_id": 51,
        "callback_query": {
            "id": "cbq-1",
            "data": "picker",
            "message": {"message_id": 52, "chat": {"id": 42}}
        }
    });
    post_update(&harness.app, callback.to_string()).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    answer.assert();
    confirmation.assert();
    let injected = harness.tmux.injections();
    let quit = injected
        .iter()
        .position(|keys| *keys == Keystrokes::literal("/quit"))
        .expect("quit injected");
    let launch = injected
        .iter()
        .position(|keys| {
            *keys
                == Keystrokes::literal("kiro-cli chat --resume-picker --trust-all-tools")
        })
        .expect("relaunch injected");
    assert!(quit < launch);
}

#[tokio::test]
async fn integration_missing_session_reports_tmux_not_found_and_clears_turn() {
    let server = MockServer::start();
    let reaction = server.mock(|when, then| {
        when.method(POST).path(api_path("setMessageReaction"));
        then.status(200).json_body(json!({"ok": true, "result": true}));
    });
    let not_found = server.mock(|when, then| {
        when.method(POST)
            .path(api_path("sendMessage"))
            .body_includes("tmux not found");
        then.status(200).json_body(json!({"ok": true, "result": {}}));
    });
    let temp = tempdir().expect("tempdir");
    let harness = harness(&server, temp.path(), false);

    post_update(&harness.app, message_update(7, 1, "deploy please")).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    reaction.assert();
    not_found.assert_calls(1);
    assert!(harness.tmux.injections().is_empty());
    assert_eq!(harness.controller.turn_status(), TurnStatus::Idle);
    assert!(!temp.path().join("telegram_pending").exists());
}

#[tokio::test]
async fn integration_telegram_outage_does_not_block_keystrokes() {
    let server = MockServer::start();
    let failing = server.mock(|when, then| {
        when.method(POST);
        then.status(502).body("bad gateway");
    });
    let temp = tempdir().expect("tempdir");
    let harness = harness(&server, temp.path(), true);

    let body = post_update(&harness.app, message_update(9, 4, "still there?")).await;
    assert_eq!(harness.tmux.injections().len(), 2);
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(body, "OK");
    assert!(failing.calls() >= 1);
    harness.controller.shutdown();
}

#[tokio::test]
async fn integration_malformed_update_makes_no_api_calls() {
    let server = MockServer::start();
    let any_call = server.mock(|when, then| {
        when.method(POST);
        then.status(200).json_body(json!({"ok": true, "result": true}));
    });
    let temp = tempdir().expect("tempdir");
    let harness = harness(&server, temp.path(), true);

    let body = post_update(&harness.app, "[1, 2, 3".to_string()).await;
    post_update(&harness.app, json!({"update_id": 3, "edited_message": {}}).to_string()).await;

    assert_eq!(body, "OK");
    any_call.assert_calls(0);
    assert!(harness.tmux.injections().is_empty());
}
