//! Integration tests for the nested form component
//!
//! Drives a `NestedForm` end to end through the in-memory collaborators.

use futures_util::future::join_all;
use nested_form::prelude::*;
use nested_form::testing::{FakeRenderer, StaticLoader, StaticRoot};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn roots() -> ApiRoots {
    ApiRoots::new("https://api.example.com", "https://intake.example.com")
}

fn definition() -> FormDefinition {
    FormDefinition::new(
        "Applicant",
        vec![
            json!({ "type": "textfield", "key": "name" }),
            json!({ "type": "button", "key": "submit", "action": "submit" }),
        ],
    )
}

fn submission(value: serde_json::Value) -> Submission {
    serde_json::from_value(value).expect("Failed to parse submission")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_loads_share_one_fetch() {
    let (loader, gate) = StaticLoader::new(definition()).gated();
    let loader = Arc::new(loader);
    let renderer = Arc::new(FakeRenderer::new());
    let field = NestedForm::builder(
        NestedFormSchema::for_form("applicant", "abc"),
        loader.clone(),
        renderer.clone(),
    )
    .roots(roots())
    .build();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let field = field.clone();
            tokio::spawn(async move { field.ensure_loaded() })
        })
        .collect();

    let signals: Vec<ReadySignal> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("Failed to join load request"))
        .collect();
    assert!(signals.iter().all(|signal| signal.ptr_eq(&signals[0])));

    gate.open();
    for outcome in join_all(signals.iter().map(ReadySignal::wait)).await {
        let child = outcome.expect("Failed to load nested form");
        assert!(child.is_some());
    }

    assert_eq!(loader.calls(), 1);
    assert_eq!(loader.requested(), vec!["https://intake.example.com/form/abc".to_string()]);
    assert_eq!(loader.queries(), vec![LoadQuery::live()]);
    assert_eq!(renderer.render_count(), 1);
    assert_eq!(field.load_state(), LoadState::Ready);
}

#[tokio::test]
async fn test_value_set_during_load_is_replayed() {
    let (loader, gate) = StaticLoader::new(definition()).gated();
    let renderer = Arc::new(FakeRenderer::new());
    let field = NestedForm::builder(
        NestedFormSchema::for_form("applicant", "abc"),
        Arc::new(loader),
        renderer.clone(),
    )
    .roots(roots())
    .build();

    let ready = field.ensure_loaded();
    let change = field.set_value(submission(json!({ "data": { "a": 1 } })), ValueFlags::default());
    assert!(change.changed());
    assert_eq!(field.value(), submission(json!({ "data": { "a": 1 } })));

    gate.open();
    change.settled().await.expect("Failed to settle value");
    assert!(ready.is_settled());

    let child = renderer.last_child().expect("Child should be rendered");
    assert_eq!(child.value(), submission(json!({ "data": { "a": 1 } })));
    assert_eq!(field.value(), child.value());
}

#[tokio::test]
async fn test_submitted_reference_short_circuits_final_submit() {
    let loader = Arc::new(StaticLoader::new(definition()));
    let renderer = Arc::new(FakeRenderer::new());
    let field = NestedForm::builder(
        NestedFormSchema::for_form("applicant", "abc"),
        loader.clone(),
        renderer.clone(),
    )
    .roots(roots())
    .value(Submission::reference("X", "Y"))
    .build();

    let value = field.before_submit().await.expect("Failed to submit");

    assert_eq!(value, Submission::reference("X", "Y"));
    assert_eq!(
        serde_json::to_value(field.data_value()).expect("Failed to serialize value"),
        json!({ "_id": "X", "form": "Y" })
    );
    assert_eq!(loader.calls(), 0);
    assert_eq!(renderer.render_count(), 0);
}

#[tokio::test]
async fn test_reference_mode_submits_once_and_collapses() {
    let submitted = submission(json!({
        "_id": "s1",
        "form": "f1",
        "owner": "u1",
        "data": { "name": "Ada" }
    }));
    let renderer = Arc::new(FakeRenderer::new().with_submit_result(Ok(submitted)));
    let field = NestedForm::builder(
        NestedFormSchema::for_form("applicant", "abc"),
        Arc::new(StaticLoader::new(definition())),
        renderer.clone(),
    )
    .roots(roots())
    .build();

    let value = field.before_submit().await.expect("Failed to submit");
    assert_eq!(
        serde_json::to_value(&value).expect("Failed to serialize value"),
        json!({ "_id": "s1", "form": "f1" })
    );

    // A second final submit sees the reference and does not resubmit
    field.before_submit().await.expect("Failed to submit again");
    let child = renderer.last_child().expect("Child should be rendered");
    assert_eq!(child.submit_calls(), 1);
}

#[tokio::test]
async fn test_destroy_tears_down_child_and_anchor() {
    let renderer = Arc::new(FakeRenderer::new());
    let field = NestedForm::builder(
        NestedFormSchema::for_form("applicant", "abc"),
        Arc::new(StaticLoader::new(definition())),
        renderer.clone(),
    )
    .roots(roots())
    .build();
    field.ensure_loaded().wait().await.expect("Failed to load");
    assert!(!field.anchor().is_empty());

    field.destroy();

    let child = renderer.last_child().expect("Child should be rendered");
    assert_eq!(child.destroy_calls(), 1);
    assert!(field.anchor().is_empty());
    assert!(field.child().is_none());

    // The field can be loaded again
    field.ensure_loaded().wait().await.expect("Failed to reload");
    assert_eq!(renderer.render_count(), 2);

    field.events().emit("form.nosubmit", json!(true));
    let reloaded = renderer.last_child().expect("Child should be rendered again");
    assert!(reloaded.nosubmit());
}

#[tokio::test]
async fn test_load_finishing_after_destroy_is_discarded() {
    let (loader, gate) = StaticLoader::new(definition()).gated();
    let renderer = Arc::new(FakeRenderer::new());
    let field = NestedForm::builder(
        NestedFormSchema::for_form("applicant", "abc"),
        Arc::new(loader),
        renderer.clone(),
    )
    .roots(roots())
    .build();

    let stale = field.ensure_loaded();
    tokio::task::yield_now().await;
    field.destroy();

    assert_eq!(
        stale.wait().await.err().expect("Stale signal should be rejected"),
        FormError::NotLoaded
    );

    gate.open();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let late = renderer.last_child().expect("Late child should still be rendered");
    assert_eq!(late.destroy_calls(), 1);
    assert!(field.child().is_none());
    assert_eq!(field.load_state(), LoadState::NotLoaded);
}

#[tokio::test]
async fn test_child_events_filtered_on_parent_bus() {
    let bus = Emitter::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    for name in ["form.submitDone", "form.customEvent", "form.change"] {
        let log = Arc::clone(&seen);
        bus.on(name, move |event| log.lock().push(event.name.clone()));
    }

    let renderer = Arc::new(FakeRenderer::new());
    let field = NestedForm::builder(
        NestedFormSchema::for_form("applicant", "abc"),
        Arc::new(StaticLoader::new(definition())),
        renderer.clone(),
    )
    .roots(roots())
    .events(bus.clone())
    .build();
    field.ensure_loaded().wait().await.expect("Failed to load");
    let child = renderer.last_child().expect("Child should be rendered");

    child.emit("form.submitDone", json!({}));
    child.emit("form.customEvent", json!({ "action": "approve" }));
    child.change(json!({ "name": "Ada" }));

    assert_eq!(
        *seen.lock(),
        vec!["form.customEvent".to_string(), "form.change".to_string()]
    );
    assert_eq!(field.data_value().data_value(), json!({ "name": "Ada" }));
}

#[tokio::test]
async fn test_nosubmit_reaches_child_from_root_and_bus() {
    let bus = Emitter::new();
    let renderer = Arc::new(FakeRenderer::new());
    let field = NestedForm::builder(
        NestedFormSchema::for_form("applicant", "abc"),
        Arc::new(StaticLoader::new(definition())),
        renderer.clone(),
    )
    .roots(roots())
    .events(bus.clone())
    .build();

    let root: Arc<dyn FormRoot> = Arc::new(StaticRoot::new(true));
    field.set_root(&root);
    field.ensure_loaded().wait().await.expect("Failed to load");

    let child = renderer.last_child().expect("Child should be rendered");
    assert!(child.nosubmit());

    bus.emit("form.nosubmit", json!(false));
    assert!(!child.nosubmit());
    assert!(!field.nosubmit());
}

#[tokio::test]
async fn test_submit_buttons_hidden_and_options_forwarded() {
    let renderer = Arc::new(FakeRenderer::new());
    let options = HostOptions {
        read_only: true,
        language: Some("fr".into()),
        ..HostOptions::default()
    };
    let field = NestedForm::builder(
        NestedFormSchema {
            project: Some("intake".into()),
            ..NestedFormSchema::for_form("applicant", "abc")
        },
        Arc::new(StaticLoader::new(definition())),
        renderer.clone(),
    )
    .roots(roots())
    .options(options)
    .build();
    field.ensure_loaded().wait().await.expect("Failed to load");

    let child = renderer.last_child().expect("Child should be rendered");
    assert_eq!(child.definition().components[1]["hidden"], json!(true));
    assert_eq!(child.urls(), vec!["https://api.example.com/intake/form/abc".to_string()]);

    let forwarded = child.options();
    assert!(forwarded.read_only);
    assert_eq!(forwarded.language.as_deref(), Some("fr"));
    assert_eq!(forwarded.project.as_deref(), Some("https://api.example.com/intake"));
}
