//! Background thread for off-caller pipeline processing.
//!
//! [`PipelineWorker`] owns a dedicated thread holding a
//! [`Pipeline`](retouch_pipeline::Pipeline). Requests travel over an
//! mpsc channel and carry a generation number; responses echo it so the
//! caller can tell which request a result belongs to and drop stale
//! ones.
//!
//! When several requests queue up while the worker is busy, only the
//! newest is processed. Any replacement original carried by a skipped
//! request is still applied, so the newest request always sees the most
//! recent image.

use std::sync::mpsc::{self, Receiver, RecvError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use retouch_pipeline::{Pipeline, PipelineError, PipelineParameters, PixelBuffer};
use tracing::{debug, trace, warn};

use crate::error::IoError;

/// Work sent to the worker thread.
#[derive(Debug)]
struct Request {
    generation: u64,
    params: PipelineParameters,
    original: Option<PixelBuffer>,
}

/// A result produced by the worker thread.
#[derive(Debug)]
pub struct WorkerResult {
    /// Generation of the request this answers.
    pub generation: u64,
    /// Processed buffer, or why the pipeline rejected the request.
    pub result: Result<PixelBuffer, PipelineError>,
}

/// Handle to a pipeline running on its own thread.
///
/// Dropping the handle closes the request channel and joins the thread.
pub struct PipelineWorker {
    requests: Option<Sender<Request>>,
    responses: Receiver<WorkerResult>,
    handle: Option<JoinHandle<()>>,
    latest: u64,
}

impl PipelineWorker {
    /// Start a worker over `original` with identity parameters.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Io`] if the thread cannot be spawned.
    pub fn spawn(original: PixelBuffer) -> Result<Self, IoError> {
        let (request_tx, request_rx) = mpsc::channel::<Request>();
        let (response_tx, response_rx) = mpsc::channel::<WorkerResult>();

        let handle = thread::Builder::new()
            .name("retouch-pipeline".to_owned())
            .spawn(move || run(Pipeline::new(original), &request_rx, &response_tx))?;

        Ok(Self {
            requests: Some(request_tx),
            responses: response_rx,
            handle: Some(handle),
            latest: 0,
        })
    }

    /// Queue a recompute with `params`, optionally replacing the
    /// original first. Returns the generation assigned to the request.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WorkerDisconnected`] if the thread has exited.
    pub fn submit(
        &mut self,
        params: PipelineParameters,
        original: Option<PixelBuffer>,
    ) -> Result<u64, IoError> {
        let generation = self.latest + 1;
        self.requests
            .as_ref()
            .ok_or(IoError::WorkerDisconnected)?
            .send(Request {
                generation,
                params,
                original,
            })
            .map_err(|_| IoError::WorkerDisconnected)?;
        self.latest = generation;
        trace!(generation, "request submitted");
        Ok(generation)
    }

    /// Generation of the most recently submitted request.
    #[must_use]
    pub const fn latest_generation(&self) -> u64 {
        self.latest
    }

    /// `true` if `generation` belongs to the newest request.
    #[must_use]
    pub const fn is_current(&self, generation: u64) -> bool {
        generation == self.latest
    }

    /// Block for the next response, current or stale.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WorkerDisconnected`] if the thread has exited.
    pub fn recv(&self) -> Result<WorkerResult, IoError> {
        self.responses
            .recv()
            .map_err(|RecvError| IoError::WorkerDisconnected)
    }

    /// Return a response if one is ready.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WorkerDisconnected`] if the thread has exited
    /// and nothing is left to read.
    pub fn try_recv(&self) -> Result<Option<WorkerResult>, IoError> {
        match self.responses.try_recv() {
            Ok(response) => Ok(Some(response)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(IoError::WorkerDisconnected),
        }
    }

    /// Block until the response to the newest request arrives,
    /// discarding stale ones.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WorkerDisconnected`] if the thread has exited,
    /// or [`IoError::Pipeline`] if the pipeline rejected the request.
    pub fn wait_latest(&self) -> Result<PixelBuffer, IoError> {
        loop {
            let response = self.recv()?;
            if self.is_current(response.generation) {
                return Ok(response.result?);
            }
            debug!(
                generation = response.generation,
                latest = self.latest,
                "discarding stale result"
            );
        }
    }
}

impl Drop for PipelineWorker {
    fn drop(&mut self) {
        drop(self.requests.take());
        if let Some(handle) = self.handle.take() {
            join_worker(handle);
        }
    }
}

/// Join the worker thread, logging instead of propagating a panic.
///
/// Returns `true` if the thread exited normally.
fn join_worker(handle: JoinHandle<()>) -> bool {
    let name = handle.thread().name().unwrap_or("worker").to_owned();
    match handle.join() {
        Ok(()) => true,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
                .unwrap_or("unknown panic");
            warn!(thread = %name, reason, "pipeline worker thread panicked");
            false
        }
    }
}

/// Worker thread body: serve requests until the sender hangs up.
fn run(mut pipeline: Pipeline, requests: &Receiver<Request>, responses: &Sender<WorkerResult>) {
    while let Ok(mut request) = requests.recv() {
        let mut original = request.original.take();

        // Coalesce a backlog down to its newest entry.
        while let Ok(mut newer) = requests.try_recv() {
            trace!(skipped = request.generation, "coalescing request");
            if let Some(replacement) = newer.original.take() {
                original = Some(replacement);
            }
            request = newer;
        }

        let result = process(&mut pipeline, request.params, original);
        let response = WorkerResult {
            generation: request.generation,
            result,
        };
        if responses.send(response).is_err() {
            break;
        }
    }
    debug!("pipeline worker exiting");
}

fn process(
    pipeline: &mut Pipeline,
    params: PipelineParameters,
    original: Option<PixelBuffer>,
) -> Result<PixelBuffer, PipelineError> {
    // A fresh session starts at identity, so the new original is only
    // processed once, with the requested parameters.
    if let Some(original) = original {
        *pipeline = Pipeline::new(original);
    }
    Ok(pipeline.set_params(params)?.clone())
}
