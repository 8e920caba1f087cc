//! Webhook trigger lifecycle against a stubbed API.

mod common;

use cloudconvert_node::api::WebhookEvent;
use cloudconvert_node::state::{
    NodeStaticData, StaticDataStore, WebhookRegistration, WEBHOOK_ID_KEY, WEBHOOK_SECRET_KEY,
};
use cloudconvert_node::trigger::{
    sign, CloudConvertTrigger, HookContext, TriggerSettings, WebhookLifecycle, WebhookRequest,
};
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOOK_URL: &str = "https://hooks.example.com/webhook";

fn trigger(server: &MockServer, settings: TriggerSettings) -> CloudConvertTrigger {
    CloudConvertTrigger::new(common::client(server), settings)
}

#[tokio::test]
async fn test_check_exists_adopts_matching_subscription() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/users/me/webhooks"))
        .and(query_param("filter[url]", HOOK_URL))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": 41, "url": "https://other.example.com", "signing_secret": "nope" },
                { "id": 42, "url": HOOK_URL, "signing_secret": "s3cret" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let data = NodeStaticData::in_memory();
    let ctx = HookContext::new(HOOK_URL, &data);
    assert!(trigger(&server, TriggerSettings::default())
        .check_exists(&ctx)
        .await
        .unwrap());

    assert_eq!(data.get(WEBHOOK_ID_KEY), Some(json!("42")));
    assert_eq!(data.get(WEBHOOK_SECRET_KEY), Some(json!("s3cret")));
}

#[tokio::test]
async fn test_check_exists_without_match() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/users/me/webhooks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    let data = NodeStaticData::in_memory();
    let ctx = HookContext::new(HOOK_URL, &data);
    assert!(!trigger(&server, TriggerSettings::default())
        .check_exists(&ctx)
        .await
        .unwrap());
    assert!(data.snapshot().is_empty());
}

#[tokio::test]
async fn test_create_registers_configured_events() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/webhooks"))
        .and(body_json(json!({ "url": HOOK_URL, "events": ["job.created", "job.failed"] })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": {
                "id": "wh-7",
                "url": HOOK_URL,
                "events": ["job.created", "job.failed"],
                "signing_secret": "fresh"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let data = NodeStaticData::in_memory();
    let ctx = HookContext::new(HOOK_URL, &data);
    let settings = TriggerSettings {
        events: vec![WebhookEvent::JobCreated, WebhookEvent::JobFailed],
        ..TriggerSettings::default()
    };

    assert!(trigger(&server, settings).create(&ctx).await.unwrap());
    assert_eq!(
        WebhookRegistration::load(&data),
        Some(WebhookRegistration::new("wh-7", Some("fresh".to_string())))
    );
}

#[tokio::test]
async fn test_create_without_id_reports_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/webhooks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
        .mount(&server)
        .await;

    let data = NodeStaticData::in_memory();
    let ctx = HookContext::new(HOOK_URL, &data);
    assert!(!trigger(&server, TriggerSettings::default())
        .create(&ctx)
        .await
        .unwrap());
    assert!(data.get(WEBHOOK_ID_KEY).is_none());
}

#[tokio::test]
async fn test_activate_creates_when_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/users/me/webhooks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/webhooks"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": "wh-1", "url": HOOK_URL }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let data = NodeStaticData::in_memory();
    let ctx = HookContext::new(HOOK_URL, &data);
    assert!(trigger(&server, TriggerSettings::default())
        .activate(&ctx)
        .await
        .unwrap());
    assert_eq!(data.get(WEBHOOK_ID_KEY), Some(json!("wh-1")));
    assert!(data.get(WEBHOOK_SECRET_KEY).is_none());
}

#[tokio::test]
async fn test_delete_clears_state() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v2/webhooks/wh-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let data = NodeStaticData::in_memory();
    WebhookRegistration::new("wh-1", Some("s".to_string()))
        .save(&data)
        .unwrap();
    let ctx = HookContext::new(HOOK_URL, &data);

    assert!(trigger(&server, TriggerSettings::default())
        .delete(&ctx)
        .await
        .unwrap());
    assert!(data.snapshot().is_empty());
}

#[tokio::test]
async fn test_delete_clears_state_even_when_upstream_fails() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v2/webhooks/wh-1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let data = NodeStaticData::in_memory();
    WebhookRegistration::new("wh-1", Some("s".to_string()))
        .save(&data)
        .unwrap();
    let ctx = HookContext::new(HOOK_URL, &data);

    assert!(!trigger(&server, TriggerSettings::default())
        .delete(&ctx)
        .await
        .unwrap());
    assert!(data.get(WEBHOOK_ID_KEY).is_none());
    assert!(data.get(WEBHOOK_SECRET_KEY).is_none());
}

#[tokio::test]
async fn test_registration_survives_restart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/webhooks"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": "wh-9", "url": HOOK_URL, "signing_secret": "kept" }
        })))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let state_file = dir.path().join("state.json");

    {
        let data = NodeStaticData::persistent(state_file.clone());
        let ctx = HookContext::new(HOOK_URL, &data);
        assert!(trigger(&server, TriggerSettings::default())
            .create(&ctx)
            .await
            .unwrap());
    }

    let reloaded = NodeStaticData::persistent(state_file);
    assert_eq!(
        WebhookRegistration::load(&reloaded),
        Some(WebhookRegistration::new("wh-9", Some("kept".to_string())))
    );
}

#[tokio::test]
async fn test_signed_delivery_is_accepted_and_forged_one_dropped() {
    let server = MockServer::start().await;
    let data = NodeStaticData::in_memory();
    WebhookRegistration::new("wh-1", Some("s3cret".to_string()))
        .save(&data)
        .unwrap();
    let ctx = HookContext::new(HOOK_URL, &data);
    let trigger = trigger(
        &server,
        TriggerSettings {
            verify: true,
            ..TriggerSettings::default()
        },
    );

    let body = r#"{"event":"job.failed","job":{"id":"j1","status":"error"}}"#;

    let accepted = trigger
        .webhook(
            &ctx,
            WebhookRequest::new(body).with_signature(sign("s3cret", body.as_bytes())),
        )
        .await
        .unwrap();
    assert_eq!(accepted.items.len(), 1);
    assert_eq!(accepted.items[0].json["event"], "job.failed");

    let forged = trigger
        .webhook(
            &ctx,
            WebhookRequest::new(body).with_signature(sign("wrong", body.as_bytes())),
        )
        .await
        .unwrap();
    assert!(forged.is_dropped());

    let uppercase = trigger
        .webhook(
            &ctx,
            WebhookRequest::new(body).with_signature(sign("s3cret", body.as_bytes()).to_uppercase()),
        )
        .await
        .unwrap();
    assert!(uppercase.is_dropped());
}

#[tokio::test]
async fn test_finished_delivery_downloads_exports() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/result.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"pdf".to_vec(), "application/pdf"))
        .expect(1)
        .mount(&server)
        .await;

    let job = common::finished_job(&server, &[("export-1", vec![("result.pdf", "/files/result.pdf")])]);
    let body = json!({ "event": "job.finished", "job": job }).to_string();

    let data = NodeStaticData::in_memory();
    let ctx = HookContext::new(HOOK_URL, &data);
    let response = trigger(
        &server,
        TriggerSettings {
            download: true,
            ..TriggerSettings::default()
        },
    )
    .webhook(&ctx, WebhookRequest::new(body))
    .await
    .unwrap();

    let item = &response.items[0];
    assert_eq!(item.json["job"]["id"], "job-1");
    assert_eq!(item.binary["export-1_0"].data, b"pdf");
    assert_eq!(item.binary["export-1_0"].file_name.as_deref(), Some("result.pdf"));
}

#[tokio::test]
async fn test_other_events_skip_download() {
    let server = MockServer::start().await;
    let job = common::finished_job(&server, &[("export-1", vec![("result.pdf", "/files/result.pdf")])]);
    let body = json!({ "event": "job.failed", "job": job }).to_string();

    let data = NodeStaticData::in_memory();
    let ctx = HookContext::new(HOOK_URL, &data);
    let response = trigger(
        &server,
        TriggerSettings {
            download: true,
            ..TriggerSettings::default()
        },
    )
    .webhook(&ctx, WebhookRequest::new(body))
    .await
    .unwrap();

    assert!(!response.items[0].has_binary());
    assert!(server.received_requests().await.unwrap().is_empty());
}
