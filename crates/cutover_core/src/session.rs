//! Async driver around [`Workflow`]: issues the load requests produced by
//! transitions and feeds completed fetches back in.

use std::{collections::HashMap, sync::Arc};

use shared::{error::DataSourceError, protocol::Dataset};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error};

use crate::{
    source::{DataSource, DatasetLoader, DatasetPayload},
    workflow::{LoadRequest, Transition, Workflow, WorkflowOptions},
};

#[derive(Debug)]
pub struct FetchCompletion {
    pub request: LoadRequest,
    pub result: Result<DatasetPayload, DataSourceError>,
}

pub struct CutoverSession {
    workflow: Workflow,
    loader: DatasetLoader,
    completions_tx: UnboundedSender<FetchCompletion>,
    completions_rx: UnboundedReceiver<FetchCompletion>,
    in_flight: HashMap<Dataset, usize>,
}

impl CutoverSession {
    pub fn new(source: Arc<dyn DataSource>, options: WorkflowOptions) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            workflow: Workflow::new(options),
            loader: DatasetLoader::new(source),
            completions_tx,
            completions_rx,
            in_flight: HashMap::new(),
        }
    }

    /// Kicks off the one-time controller list fetch. Must run inside a tokio
    /// runtime.
    pub fn start(&mut self) {
        let request = self.workflow.start();
        self.dispatch(request);
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    /// Selection edits go straight to the state machine. Step transitions are
    /// only reachable through [`CutoverSession::next`] and
    /// [`CutoverSession::back`], which issue the step's load.
    pub fn workflow_mut(&mut self) -> &mut Workflow {
        &mut self.workflow
    }

    pub fn next(&mut self) -> Transition {
        let transition = self.workflow.next();
        self.dispatch_for(&transition);
        transition
    }

    pub fn back(&mut self) -> Transition {
        let transition = self.workflow.back();
        self.dispatch_for(&transition);
        transition
    }

    pub fn is_loading(&self, dataset: Dataset) -> bool {
        self.in_flight.get(&dataset).copied().unwrap_or_default() > 0
    }

    pub fn pending_fetches(&self) -> usize {
        self.in_flight.values().sum()
    }

    /// Applies every completion that has already arrived without waiting.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.complete(completion);
            handled += 1;
        }
        handled
    }

    /// Waits until every fetch issued so far has been applied or discarded.
    pub async fn settle(&mut self) {
        while self.pending_fetches() > 0 {
            match self.completions_rx.recv().await {
                Some(completion) => self.complete(completion),
                None => break,
            }
        }
    }

    fn dispatch_for(&mut self, transition: &Transition) {
        if let Transition::Moved {
            load: Some(request),
            ..
        } = transition
        {
            self.dispatch(*request);
        }
    }

    fn dispatch(&mut self, request: LoadRequest) {
        *self.in_flight.entry(request.dataset).or_default() += 1;
        debug!(dataset = %request.dataset, scope = ?request.scope, "dispatching dataset fetch");

        let loader = self.loader.clone();
        let completions_tx = self.completions_tx.clone();
        tokio::spawn(async move {
            // The load runs in its own task so a panic still yields a
            // completion and the in-flight count drops.
            let fetch = tokio::spawn(async move { loader.load(request.dataset).await });
            let result = match fetch.await {
                Ok(result) => result,
                Err(err) => Err(DataSourceError::Interrupted {
                    resource: request.dataset.resource_id().to_owned(),
                    message: err.to_string(),
                }),
            };
            let _ = completions_tx.send(FetchCompletion { request, result });
        });
    }

    fn complete(&mut self, completion: FetchCompletion) {
        let FetchCompletion { request, result } = completion;
        if let Some(count) = self.in_flight.get_mut(&request.dataset) {
            *count = count.saturating_sub(1);
        }

        match result {
            Ok(payload) => {
                self.workflow.apply(request, payload);
            }
            Err(err) => {
                error!(
                    dataset = %request.dataset,
                    kind = ?err.kind(),
                    %err,
                    "dataset fetch failed; keeping previous pool"
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
