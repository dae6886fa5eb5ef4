use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;

use crate::domain::{
    BatchRequest, DEFAULT_MAX_EDGE, FetchedImage, ImageDimensions, ImageError,
};

use super::ImageFetchService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotJobState {
    #[default]
    Loading,
    Succeeded,
    Failed,
}

/// One observable transition of one slot, tagged with its batch id so
/// updates from superseded batches can be recognized and dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotUpdate {
    pub batch_id: u64,
    pub slot_index: usize,
    pub state: SlotJobState,
    pub image: Option<FetchedImage>,
    pub error: Option<ImageError>,
}

impl SlotUpdate {
    fn loading(batch_id: u64, slot_index: usize) -> Self {
        Self {
            batch_id,
            slot_index,
            state: SlotJobState::Loading,
            image: None,
            error: None,
        }
    }

    fn succeeded(batch_id: u64, slot_index: usize, image: FetchedImage) -> Self {
        Self {
            batch_id,
            slot_index,
            state: SlotJobState::Succeeded,
            image: Some(image),
            error: None,
        }
    }

    fn failed(batch_id: u64, slot_index: usize, error: ImageError) -> Self {
        Self {
            batch_id,
            slot_index,
            state: SlotJobState::Failed,
            image: None,
            error: Some(error),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, SlotJobState::Succeeded | SlotJobState::Failed)
    }
}

/// Launches one worker thread per slot of a batch, all fire-and-forget:
/// there is no join barrier and no ordering between slots. Slots of a
/// superseded batch are never cancelled; they run to their terminal state
/// and their completions are discarded by batch id.
pub struct BatchJobManager {
    next_batch_id: AtomicU64,
    max_edge: u32,
    command_tx: mpsc::Sender<WorkerMessage>,
    shared: Arc<Mutex<SharedState>>,
    shutdown: Arc<AtomicBool>,
    worker_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl BatchJobManager {
    pub fn new(service: ImageFetchService) -> Result<Self, ImageError> {
        Self::with_max_edge(service, DEFAULT_MAX_EDGE)
    }

    pub fn with_max_edge(service: ImageFetchService, max_edge: u32) -> Result<Self, ImageError> {
        if max_edge == 0 {
            return Err(ImageError::validation("max edge must be greater than 0"));
        }

        let shared = Arc::new(Mutex::new(SharedState::default()));
        let shutdown = Arc::new(AtomicBool::new(false));
        let (command_tx, command_rx) = mpsc::channel();
        let worker_tx = command_tx.clone();
        let worker_shared = Arc::clone(&shared);
        let worker_shutdown = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name("pictor-batch-coordinator".to_string())
            .spawn(move || worker_loop(service, command_rx, worker_tx, worker_shared, worker_shutdown))
            .map_err(|error| {
                ImageError::internal(format!(
                    "failed to start batch coordinator thread: {error}"
                ))
            })?;

        Ok(Self {
            next_batch_id: AtomicU64::new(1),
            max_edge,
            command_tx,
            shared,
            shutdown,
            worker_handle: Mutex::new(Some(handle)),
        })
    }

    /// Validates the request, resolves the batch dimensions once, and hands
    /// the batch to the coordinator. Returns the batch id the caller must
    /// compare subsequent updates against.
    pub fn submit_batch(&self, request: BatchRequest) -> Result<u64, ImageError> {
        request.validate()?;
        let dimensions = request.aspect_ratio.dimensions(self.max_edge);
        dimensions.validate()?;

        let batch_id = self.next_batch_id.fetch_add(1, Ordering::SeqCst);
        self.command_tx
            .send(WorkerMessage::Start {
                batch_id,
                request,
                dimensions,
            })
            .map_err(|error| {
                ImageError::internal(format!(
                    "failed to submit batch to coordinator queue: {error}"
                ))
            })?;
        Ok(batch_id)
    }

    pub fn drain_updates(&self) -> Vec<SlotUpdate> {
        let mut shared = self.shared.lock().expect("batch state lock poisoned");
        shared.updates.drain(..).collect()
    }
}

impl Drop for BatchJobManager {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = self.command_tx.send(WorkerMessage::Shutdown);

        if let Some(handle) = self
            .worker_handle
            .lock()
            .expect("batch worker handle lock poisoned")
            .take()
        {
            let _ = handle.join();
        }
    }
}

#[derive(Default)]
struct SharedState {
    updates: VecDeque<SlotUpdate>,
}

enum WorkerMessage {
    Start {
        batch_id: u64,
        request: BatchRequest,
        dimensions: ImageDimensions,
    },
    SlotCompletion {
        batch_id: u64,
        slot_index: usize,
        result: Result<FetchedImage, ImageError>,
    },
    Shutdown,
}

fn worker_loop(
    service: ImageFetchService,
    command_rx: mpsc::Receiver<WorkerMessage>,
    command_tx: mpsc::Sender<WorkerMessage>,
    shared: Arc<Mutex<SharedState>>,
    shutdown: Arc<AtomicBool>,
) {
    let mut current_batch_id: Option<u64> = None;
    let mut slot_handles: HashMap<(u64, usize), thread::JoinHandle<()>> = HashMap::new();
    let mut shutdown_requested = false;

    while let Ok(message) = command_rx.recv() {
        match message {
            WorkerMessage::Start {
                batch_id,
                request,
                dimensions,
            } => {
                if shutdown_requested {
                    continue;
                }

                // A new batch supersedes the previous one wholesale. Old
                // slot threads keep running; their completions are dropped.
                current_batch_id = Some(batch_id);

                for slot_index in 0..usize::from(request.image_count) {
                    push_update(&shared, SlotUpdate::loading(batch_id, slot_index));
                    let handle = spawn_slot_job(
                        &service,
                        &command_tx,
                        &shutdown,
                        batch_id,
                        slot_index,
                        request.prompt.clone(),
                        dimensions,
                    );
                    slot_handles.insert((batch_id, slot_index), handle);
                }
            }
            WorkerMessage::SlotCompletion {
                batch_id,
                slot_index,
                result,
            } => {
                if let Some(handle) = slot_handles.remove(&(batch_id, slot_index)) {
                    let _ = handle.join();
                }

                if !shutdown_requested && current_batch_id == Some(batch_id) {
                    match result {
                        Ok(image) => {
                            push_update(&shared, SlotUpdate::succeeded(batch_id, slot_index, image));
                        }
                        Err(error) => {
                            push_update(&shared, SlotUpdate::failed(batch_id, slot_index, error));
                        }
                    }
                }

                if shutdown_requested && slot_handles.is_empty() {
                    break;
                }
            }
            WorkerMessage::Shutdown => {
                shutdown_requested = true;
                if slot_handles.is_empty() {
                    break;
                }
            }
        }
    }
}

fn spawn_slot_job(
    service: &ImageFetchService,
    command_tx: &mpsc::Sender<WorkerMessage>,
    shutdown: &Arc<AtomicBool>,
    batch_id: u64,
    slot_index: usize,
    prompt: String,
    dimensions: ImageDimensions,
) -> thread::JoinHandle<()> {
    let service = service.clone();
    let tx = command_tx.clone();
    let shutdown = Arc::clone(shutdown);

    thread::spawn(move || {
        let result = service.fetch_slot_with_cancel(slot_index, &prompt, dimensions, || {
            shutdown.load(Ordering::SeqCst)
        });
        let _ = tx.send(WorkerMessage::SlotCompletion {
            batch_id,
            slot_index,
            result,
        });
    })
}

fn push_update(shared: &Arc<Mutex<SharedState>>, update: SlotUpdate) {
    let mut shared = shared
        .lock()
        .expect("batch state lock poisoned during update");
    shared.updates.push_back(update);
}
