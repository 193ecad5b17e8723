use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::model::ModelHandle;
use crate::models::ImageId;
use crate::orchestrator::{Event, Job, Orchestrator};

/// Drives an [`Orchestrator`] on the tokio runtime.
///
/// Every job runs as its own task and reports back through a channel, so a
/// slow job for an old selection can finish after a newer one; the
/// orchestrator drops such results.
pub struct Session<M: ModelHandle> {
    orchestrator: Orchestrator<M>,
    sender: UnboundedSender<Event<M>>,
    receiver: UnboundedReceiver<Event<M>>,
    in_flight: usize,
}

impl<M: ModelHandle> Session<M> {
    /// Start a session and begin loading the model in the background.
    pub fn start<F>(orchestrator: Orchestrator<M>, load: F) -> Self
    where
        F: Future<Output = anyhow::Result<M>> + Send + 'static,
    {
        let mut session = Self::idle(orchestrator);
        let sender = session.sender.clone();
        session.in_flight += 1;
        tokio::spawn(async move {
            let loaded = load.await.map(Arc::new).map_err(|e| format!("{:#}", e));
            let _ = sender.send(Event::ModelLoaded(loaded));
        });
        session
    }

    /// Start a session around a model that is already loaded.
    pub fn with_model(orchestrator: Orchestrator<M>, model: M) -> Self {
        let mut session = Self::idle(orchestrator);
        session.submit(Event::ModelLoaded(Ok(Arc::new(model))));
        session
    }

    fn idle(orchestrator: Orchestrator<M>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            orchestrator,
            sender,
            receiver,
            in_flight: 0,
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator<M> {
        &self.orchestrator
    }

    pub fn orchestrator_mut(&mut self) -> &mut Orchestrator<M> {
        &mut self.orchestrator
    }

    pub fn into_orchestrator(self) -> Orchestrator<M> {
        self.orchestrator
    }

    /// Number of jobs whose completion has not been processed yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Select a file; returns the identity minted for the selection.
    pub fn select_file(&mut self, path: impl Into<PathBuf>) -> Option<ImageId> {
        self.submit(Event::FileSelected(path.into()));
        self.orchestrator.phase().image_id()
    }

    /// Re-run detection on the current image.
    pub fn detect(&mut self) {
        self.submit(Event::DetectRequested);
    }

    /// Hand an event to the orchestrator and spawn the jobs it asks for.
    pub fn submit(&mut self, event: Event<M>) {
        for job in self.orchestrator.handle(event) {
            self.spawn(job);
        }
    }

    fn spawn(&mut self, job: Job<M>) {
        self.in_flight += 1;
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let _ = sender.send(job.run().await);
        });
    }

    /// Wait for one completion and apply it. Returns `false` when nothing is in flight.
    pub async fn next_event(&mut self) -> bool {
        if self.in_flight == 0 {
            return false;
        }
        match self.receiver.recv().await {
            Some(event) => {
                self.in_flight -= 1;
                self.submit(event);
                true
            }
            None => false,
        }
    }

    /// Process completions until no job is left in flight.
    pub async fn settle(&mut self) {
        while self.next_event().await {}
    }
}
