mod common;

use std::time::Duration;

use crm_backend_fake::{Failure, FakeBackend, fixtures};
use crm_client::FieldType;
use crm_meta::{FieldOptions, SaveOutcome};
use serde_json::json;

use common::{cache, doc};

const LEAD: &str = "CRM Lead";

// ── Loading ─────────────────────────────────────────────────────

#[tokio::test]
async fn load_caches_parent_and_child_tables() {
    let (cache, backend, _) = cache(FakeBackend::with_fixtures());
    let lead = cache.meta(LEAD);

    assert!(lead.load().await);
    assert!(lead.grid_settings().is_some());
    assert!(cache.doctype_meta("CRM Products").is_some_and(|m| m.istable));
    assert_eq!(backend.calls(fixtures::GET_DOCTYPE), 1);
    assert_eq!(
        backend.params(fixtures::GET_DOCTYPE)[0],
        json!({ "doctype": LEAD, "with_parent": 1, "cached_timestamp": null })
    );

    // cached child table does not trigger its own fetch
    let products = cache.meta("CRM Products");
    assert!(!products.loading());
    assert!(products.load().await);
    assert_eq!(backend.calls(fixtures::GET_DOCTYPE), 1);
}

#[tokio::test]
async fn first_access_starts_background_fetch() {
    let (cache, backend, _) =
        cache(FakeBackend::with_fixtures().with_delay(Duration::from_millis(20)));

    let lead = cache.meta(LEAD);
    assert!(lead.loading());
    assert!(lead.fields(None).is_none());

    assert!(lead.load().await);
    assert!(!lead.loading());
    assert!(lead.fields(None).is_some());
    assert_eq!(backend.calls(fixtures::GET_DOCTYPE), 1);
}

#[tokio::test]
async fn concurrent_loads_share_one_fetch() {
    let (cache, backend, _) =
        cache(FakeBackend::with_fixtures().with_delay(Duration::from_millis(20)));

    let (a, b, c) = tokio::join!(cache.load(LEAD), cache.load(LEAD), cache.load(LEAD));
    assert!(a && b && c);
    assert_eq!(backend.calls(fixtures::GET_DOCTYPE), 1);

    assert!(cache.reload(LEAD).await);
    assert_eq!(backend.calls(fixtures::GET_DOCTYPE), 2);
}

#[test]
fn handle_outside_runtime_does_not_fetch() {
    let (cache, backend, _) = cache(FakeBackend::with_fixtures());
    let lead = cache.meta(LEAD);
    assert!(!lead.loading());
    assert!(lead.fields(None).is_none());
    assert_eq!(lead.formatted_float("probability", &doc(json!({ "probability": 5 }))), "5.00");
    assert_eq!(backend.total_calls(), 0);
}

#[tokio::test]
async fn response_after_reset_is_dropped() {
    let (cache, _, _) =
        cache(FakeBackend::with_fixtures().with_delay(Duration::from_millis(50)));

    let pending = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.load(LEAD).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    cache.reset();

    assert!(!pending.await.unwrap());
    assert!(!cache.is_cached(LEAD));
    assert!(cache.user_settings(LEAD).is_empty());
}

#[tokio::test]
async fn auth_failure_requires_login() {
    let backend = FakeBackend::new();
    backend.fail(fixtures::GET_DOCTYPE, Failure::Auth);
    let (cache, _, reporter) = cache(backend);

    assert!(!cache.meta(LEAD).load().await);
    assert!(reporter.login_required());
}

#[tokio::test]
async fn server_failure_keeps_state() {
    let backend = FakeBackend::new();
    backend.fail(fixtures::GET_DOCTYPE, Failure::Status(500, "boom".into()));
    let (cache, _, reporter) = cache(backend);

    assert!(!cache.meta(LEAD).load().await);
    assert!(!reporter.login_required());
    assert!(!cache.is_cached(LEAD));
}

// ── Fields ──────────────────────────────────────────────────────

#[tokio::test]
async fn select_fields_get_one_blank_option_every_time() {
    let (cache, _, _) = cache(FakeBackend::with_fixtures());
    let lead = cache.meta(LEAD);
    lead.load().await;

    let first = lead.fields(None).unwrap();
    let second = lead.fields(None).unwrap();
    assert_eq!(first, second);

    let status = first.iter().find(|f| f.fieldname() == "status").unwrap();
    let blanks = status.choices().iter().filter(|c| c.value.is_empty()).count();
    assert_eq!(blanks, 1);
    assert_eq!(status.choices()[0].value, "");
    assert_eq!(status.choices().len(), 7);

    // the cached descriptor keeps its raw options
    let raw = lead.field("status").unwrap();
    assert!(raw.options.unwrap().starts_with("New\n"));
}

#[tokio::test]
async fn link_to_user_is_normalized() {
    let (cache, _, _) = cache(FakeBackend::with_fixtures());
    let lead = cache.meta(LEAD);
    lead.load().await;

    let fields = lead.fields(None).unwrap();
    let owner = fields.iter().find(|f| f.fieldname() == "lead_owner").unwrap();
    assert_eq!(owner.fieldtype, FieldType::User);

    let org = fields.iter().find(|f| f.fieldname() == "organization").unwrap();
    assert_eq!(org.fieldtype, FieldType::Link);
    assert_eq!(org.options, FieldOptions::Target("CRM Organization".into()));

    let products = lead.fields(Some("CRM Products")).unwrap();
    assert_eq!(products.len(), 3);
    assert!(lead.fields(Some("CRM Deal")).is_none());
}

// ── Formatting ──────────────────────────────────────────────────

#[tokio::test]
async fn currency_from_doc_parent_or_default() {
    let (cache, _, _) = cache(FakeBackend::with_fixtures());
    let lead = cache.meta(LEAD);
    lead.load().await;

    let d = doc(json!({ "annual_revenue": 1000, "currency": "EUR", "org_revenue": 123456.7 }));
    let parent = doc(json!({ "currency": "INR" }));

    assert_eq!(lead.formatted_currency("annual_revenue", &d, Some(&parent)), "€ 1.000,00");
    // options with a colon never look at the document
    assert_eq!(lead.formatted_currency("org_revenue", &d, Some(&parent)), "$ 123,457");

    let child = doc(json!({ "rate": 250 }));
    let products = cache.meta("CRM Products");
    assert_eq!(products.formatted_currency("rate", &child, Some(&parent)), "₹ 250.00");
    assert_eq!(products.formatted_currency("rate", &child, None), "$ 250.00");
}

#[tokio::test]
async fn float_and_percent_use_declared_precision() {
    let (cache, _, _) = cache(FakeBackend::with_fixtures());
    let lead = cache.meta(LEAD);
    lead.load().await;

    let d = doc(json!({ "probability": "42.46" }));
    assert_eq!(lead.formatted_percent("probability", &d), "42.5%");
    assert_eq!(lead.float_with_precision("probability", &d), 42.5);

    let products = cache.meta("CRM Products");
    let row = doc(json!({ "qty": 1234.5, "rate": 99 }));
    assert_eq!(products.formatted_float("qty", &row), "1,234.500");
    assert_eq!(products.currency_with_precision("rate", &row), "99.00");
}

#[tokio::test]
async fn depends_on_controls_visibility() {
    let (cache, _, _) = cache(FakeBackend::with_fixtures());
    let lead = cache.meta(LEAD);
    lead.load().await;

    assert!(!lead.is_visible("lost_reason", &doc(json!({ "status": "New" }))));
    assert!(lead.is_visible("lost_reason", &doc(json!({ "status": "Unqualified" }))));
    assert!(lead.is_visible("lead_name", &doc(json!({}))));
    assert!(lead.is_visible("no_such_field", &doc(json!({}))));
}

// ── User settings ───────────────────────────────────────────────

#[tokio::test]
async fn grid_view_settings_from_parent() {
    let (cache, _, _) = cache(FakeBackend::with_fixtures());
    let lead = cache.meta(LEAD);
    lead.load().await;

    assert_eq!(
        lead.grid_view_settings(LEAD, Some("CRM Products")),
        json!({ "qty": { "width": 80 } })
    );
    assert_eq!(
        cache.meta("CRM Products").grid_view_settings(LEAD, None),
        json!({ "qty": { "width": 80 } })
    );
    assert_eq!(lead.grid_view_settings(LEAD, None), json!({}));
}

#[tokio::test]
async fn malformed_user_settings_are_empty() {
    let backend = FakeBackend::new().with_response(
        fixtures::GET_DOCTYPE,
        json!({ "docs": [{ "name": LEAD, "fields": [] }], "user_settings": "{not json" }),
    );
    let (cache, _, _) = cache(backend);
    let lead = cache.meta(LEAD);

    assert!(lead.load().await);
    assert!(cache.user_settings(LEAD).is_empty());
    assert_eq!(lead.grid_view_settings(LEAD, None), json!({}));
}

#[tokio::test]
async fn repeated_save_hits_server_once() {
    let (cache, backend, _) = cache(FakeBackend::with_fixtures());
    cache.load(LEAD).await;
    let products = cache.meta("CRM Products");

    let value = json!({ "qty": { "width": 120 } });
    let first = products.save_user_settings(LEAD, "GridView", value.clone()).await.unwrap();
    let second = products.save_user_settings(LEAD, "GridView", value.clone()).await.unwrap();

    assert_eq!(first, SaveOutcome::Saved);
    assert_eq!(second, SaveOutcome::Unchanged);
    assert_eq!(backend.calls(fixtures::SAVE_USER_SETTINGS), 1);
    assert_eq!(products.grid_view_settings(LEAD, None), value);

    let params = &backend.params(fixtures::SAVE_USER_SETTINGS)[0];
    assert_eq!(params["doctype"], json!(LEAD));
    let sent: serde_json::Value =
        serde_json::from_str(params["user_settings"].as_str().unwrap()).unwrap();
    assert_eq!(sent["GridView"]["CRM Products"], value);
}

#[tokio::test]
async fn failed_save_leaves_settings_untouched() {
    let backend = FakeBackend::with_fixtures();
    backend.fail(fixtures::SAVE_USER_SETTINGS, Failure::Auth);
    let (cache, _, reporter) = cache(backend);
    cache.load(LEAD).await;
    let products = cache.meta("CRM Products");

    let err = products
        .save_user_settings(LEAD, "GridView", json!({ "rate": { "width": 10 } }))
        .await
        .unwrap_err();
    assert!(err.is_auth());
    assert!(reporter.login_required());
    assert_eq!(products.grid_view_settings(LEAD, None), json!({ "qty": { "width": 80 } }));
}
