use super::*;

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use serde_json::{json, Value};
use shared::domain::PointType;
use tokio::sync::oneshot;

use crate::steps::Step;

struct Response {
    body: Result<Value, u16>,
    gate: Option<oneshot::Receiver<()>>,
}

/// Answers each resource from a queue of canned responses, optionally held
/// back until a gate is released.
#[derive(Default)]
struct ScriptedSource {
    responses: Mutex<HashMap<String, VecDeque<Response>>>,
}

impl ScriptedSource {
    fn respond(self, resource: &str, body: Value) -> Self {
        self.push(resource, Ok(body), None);
        self
    }

    fn fail(self, resource: &str, status: u16) -> Self {
        self.push(resource, Err(status), None);
        self
    }

    fn respond_gated(self, resource: &str, body: Value) -> (Self, oneshot::Sender<()>) {
        let (release, gate) = oneshot::channel();
        self.push(resource, Ok(body), Some(gate));
        (self, release)
    }

    fn push(&self, resource: &str, body: Result<Value, u16>, gate: Option<oneshot::Receiver<()>>) {
        self.responses
            .lock()
            .expect("responses lock")
            .entry(resource.to_owned())
            .or_default()
            .push_back(Response { body, gate });
    }
}

#[async_trait]
impl DataSource for ScriptedSource {
    async fn fetch(&self, resource: &str) -> Result<Value, DataSourceError> {
        let next = self
            .responses
            .lock()
            .expect("responses lock")
            .get_mut(resource)
            .and_then(VecDeque::pop_front);
        let Some(response) = next else {
            return Err(DataSourceError::Status {
                resource: resource.to_owned(),
                status: 404,
            });
        };

        if let Some(gate) = response.gate {
            let _ = gate.await;
        }
        response.body.map_err(|status| DataSourceError::Status {
            resource: resource.to_owned(),
            status,
        })
    }
}

/// Panics when asked for `resource`, answers everything else from `inner`.
struct PanicsOn {
    resource: &'static str,
    inner: ScriptedSource,
}

#[async_trait]
impl DataSource for PanicsOn {
    async fn fetch(&self, resource: &str) -> Result<Value, DataSourceError> {
        if resource == self.resource {
            panic!("{resource} source crashed");
        }
        self.inner.fetch(resource).await
    }
}

fn controller_types() -> Value {
    json!([
        { "id": 1, "controllerName": "C300-01" },
        { "id": 2, "controllerName": "C300-02" }
    ])
}

fn available_points(session: &CutoverSession) -> Vec<String> {
    session
        .workflow()
        .state()
        .points()
        .available()
        .iter()
        .map(|point| point.name.clone())
        .collect()
}

async fn started<S: DataSource + 'static>(source: S) -> CutoverSession {
    let mut session = CutoverSession::new(Arc::new(source), WorkflowOptions::default());
    session.start();
    session.settle().await;
    session
}

#[tokio::test]
async fn start_loads_controller_list() {
    let source = ScriptedSource::default().respond("ControllerTypes", controller_types());
    let session = started(source).await;

    let names: Vec<_> = session
        .workflow()
        .state()
        .controllers()
        .available()
        .iter()
        .map(|controller| controller.name.as_str())
        .collect();
    assert_eq!(names, vec!["C300-01", "C300-02"]);
    assert_eq!(session.pending_fetches(), 0);
}

#[tokio::test]
async fn walks_every_step_to_the_report() {
    let source = ScriptedSource::default()
        .respond("ControllerTypes", controller_types())
        .respond("LoopSelection", json!(["TPS-1", { "controllerName": "TPS-2" }]))
        .respond("CutoutoverContent", json!([{ "controllerName": "A" }, "B"]))
        .respond(
            "ReferenceBlocks",
            json!({ "controllers": [{
                "controllerName": "A",
                "referenceNames": ["R1", "R2"],
                "IOChannels": { "input": [1], "output": [2] }
            }]}),
        );
    let mut session = started(source).await;

    session.workflow_mut().add_controller("C300-01").expect("controller");
    assert!(matches!(session.next(), Transition::Moved { to: Step::Configure, .. }));
    session.settle().await;
    assert_eq!(available_points(&session), vec!["TPS-1", "TPS-2"]);

    let workflow = session.workflow_mut();
    workflow.set_point_type(PointType::All);
    workflow.add_point("TPS-2").expect("point");
    session.next();
    session.settle().await;

    session.workflow_mut().add_module("B").expect("module");
    session.workflow_mut().add_module("A").expect("module");
    session.next();
    session.settle().await;

    let rows = session.workflow().report().expect("report");
    let rendered: Vec<_> = rows
        .iter()
        .map(|row| {
            (
                row.module.as_str(),
                row.reference_name.as_str(),
                row.io_channel.as_str(),
            )
        })
        .collect();
    assert_eq!(
        rendered,
        vec![("B", "N/A", "N/A"), ("A", "R1", "[1]"), ("A", "R2", "[2]")]
    );
}

#[tokio::test]
async fn stale_point_fetch_does_not_overwrite_fresh_one() {
    let (source, release) = ScriptedSource::default()
        .respond("ControllerTypes", controller_types())
        .respond_gated("LoopSelection", json!(["OLD-1"]));
    let source = source.respond("LoopSelection", json!(["NEW-1", "NEW-2"]));
    let mut session = started(source).await;

    session.workflow_mut().add_controller("C300-01").expect("controller");
    session.next();
    assert!(session.is_loading(Dataset::LoopSelection));
    // Let the first fetch pick up the gated response before moving on.
    tokio::task::yield_now().await;
    session.back();
    session.next();

    let fresh = session.completions_rx.recv().await.expect("fresh completion");
    session.complete(fresh);
    assert_eq!(available_points(&session), vec!["NEW-1", "NEW-2"]);

    release.send(()).expect("release gate");
    session.settle().await;

    assert_eq!(available_points(&session), vec!["NEW-1", "NEW-2"]);
    assert!(!session.is_loading(Dataset::LoopSelection));
}

#[tokio::test]
async fn failed_fetch_keeps_previous_pool() {
    let source = ScriptedSource::default()
        .respond("ControllerTypes", controller_types())
        .respond("LoopSelection", json!(["P1", "P2"]))
        .fail("LoopSelection", 503);
    let mut session = started(source).await;

    session.workflow_mut().add_controller("C300-02").expect("controller");
    session.next();
    session.settle().await;
    assert_eq!(available_points(&session), vec!["P1", "P2"]);

    session.back();
    session.next();
    session.settle().await;

    assert_eq!(session.workflow().step(), Step::Configure);
    assert_eq!(available_points(&session), vec!["P1", "P2"]);
}

#[tokio::test]
async fn failed_controller_fetch_leaves_workflow_usable() {
    let mut session = started(ScriptedSource::default().fail("ControllerTypes", 500)).await;

    assert!(session.workflow().state().controllers().available().is_empty());
    assert!(matches!(session.next(), Transition::Blocked(_)));
}

#[tokio::test]
async fn malformed_reference_envelope_reports_placeholders() {
    let source = ScriptedSource::default()
        .respond("ControllerTypes", controller_types())
        .respond("LoopSelection", json!(["P1"]))
        .respond("CutoutoverContent", json!(["A"]))
        .respond("ReferenceBlocks", json!({ "blocks": [] }));
    let mut session = started(source).await;

    session.workflow_mut().add_controller("C300-01").expect("controller");
    session.next();
    session.settle().await;
    session.workflow_mut().set_point_type(PointType::Point2);
    session.workflow_mut().add_point("P1").expect("point");
    session.next();
    session.settle().await;
    session.workflow_mut().add_module("A").expect("module");
    session.next();
    session.settle().await;

    assert_eq!(session.workflow().step(), Step::Report);
    let rows = session.workflow().report().expect("report");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].io_channel, "N/A");
}

#[tokio::test]
async fn pump_applies_only_arrived_results() {
    let (source, release) = ScriptedSource::default()
        .respond_gated("ControllerTypes", controller_types());
    let mut session = CutoverSession::new(Arc::new(source), WorkflowOptions::default());
    session.start();

    assert_eq!(session.pump(), 0);
    assert!(session.is_loading(Dataset::ControllerTypes));

    release.send(()).expect("release gate");
    session.settle().await;
    assert_eq!(session.pump(), 0);
    assert_eq!(session.workflow().state().controllers().available().len(), 2);
}

#[tokio::test]
async fn panicked_fetch_still_settles() {
    let source = PanicsOn {
        resource: "ControllerTypes",
        inner: ScriptedSource::default(),
    };
    let mut session = CutoverSession::new(Arc::new(source), WorkflowOptions::default());
    session.start();

    tokio::time::timeout(Duration::from_secs(3), session.settle())
        .await
        .expect("settle returns after a panicked fetch");
    assert!(!session.is_loading(Dataset::ControllerTypes));
    assert_eq!(session.pending_fetches(), 0);
    assert!(session.workflow().state().controllers().available().is_empty());
}

#[tokio::test]
async fn panicked_step_fetch_keeps_workflow_usable() {
    let source = PanicsOn {
        resource: "LoopSelection",
        inner: ScriptedSource::default()
            .respond("ControllerTypes", controller_types())
            .respond("CutoutoverContent", json!(["A"])),
    };
    let mut session = started(source).await;
    session.workflow_mut().add_controller("C300-01").expect("controller");

    session.next();
    tokio::time::timeout(Duration::from_secs(3), session.settle())
        .await
        .expect("settle returns after a panicked fetch");
    assert_eq!(session.workflow().step(), Step::Configure);
    assert!(!session.is_loading(Dataset::LoopSelection));
    assert!(available_points(&session).is_empty());

    assert!(matches!(session.back(), Transition::Moved { to: Step::Select, .. }));
}

#[tokio::test]
async fn session_transitions_issue_the_entered_step_load() {
    let (source, release) = ScriptedSource::default()
        .respond("ControllerTypes", controller_types())
        .respond_gated("LoopSelection", json!(["P1"]));
    let mut session = started(source).await;
    session.workflow_mut().add_controller("C300-01").expect("controller");

    assert!(matches!(
        session.next(),
        Transition::Moved {
            to: Step::Configure,
            load: Some(_),
            ..
        }
    ));
    assert!(session.is_loading(Dataset::LoopSelection));
    assert_eq!(session.pending_fetches(), 1);

    release.send(()).expect("release gate");
    session.settle().await;
    assert!(!session.is_loading(Dataset::LoopSelection));
    assert_eq!(available_points(&session), vec!["P1"]);
}
