//! Background model loading.
//!
//! [`AssetLoader::load`] reads and parses a model on a worker thread. The
//! returned [`LoadHandle`] is polled from the event loop and yields
//! [`LoadEvent`]s: any number of `Progress` events followed by exactly one
//! terminal `Success` or `Failure`. Nothing is delivered after the terminal
//! event.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use tracing::{debug, info};

use crate::error::LoadError;
use crate::import::{LoadedScene, ModelFormat, import_bytes};

/// Bytes read between progress reports.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Notification from a load in flight.
#[derive(Debug)]
pub enum LoadEvent {
    /// Cumulative bytes read so far. `loaded` never decreases.
    Progress { loaded: u64, total: u64 },
    Success(Box<LoadedScene>),
    Failure(LoadError),
}

impl LoadEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoadEvent::Progress { .. })
    }

    /// Progress as a percentage, if this is a progress event.
    pub fn percent(&self) -> Option<f64> {
        match *self {
            LoadEvent::Progress { loaded, total } if total > 0 => {
                Some(loaded as f64 / total as f64 * 100.0)
            }
            LoadEvent::Progress { .. } => Some(100.0),
            _ => None,
        }
    }
}

/// Spawns load workers.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssetLoader;

impl AssetLoader {
    pub fn new() -> Self {
        Self
    }

    /// Start loading `path` in the background.
    pub fn load(&self, path: impl AsRef<Path>) -> LoadHandle {
        let path = path.as_ref().to_path_buf();
        let (sender, receiver) = mpsc::channel();

        let worker_path = path.clone();
        let thread = thread::Builder::new()
            .name("vitrine-loader".to_string())
            .spawn(move || {
                let outcome = match read_with_progress(&worker_path, &sender) {
                    Ok(scene) => LoadEvent::Success(Box::new(scene)),
                    Err(error) => LoadEvent::Failure(error),
                };
                // The handle may already be gone; nobody is left to notify.
                let _ = sender.send(outcome);
            });

        // A failed spawn drops the sender, which surfaces as `Disconnected`.
        let thread = match thread {
            Ok(handle) => Some(handle),
            Err(error) => {
                tracing::error!(%error, "Failed to spawn loader thread");
                None
            }
        };
        info!(path = %path.display(), "Loading model");

        LoadHandle {
            path,
            receiver,
            finished: false,
            _thread: thread,
        }
    }
}

fn read_with_progress(path: &Path, sender: &Sender<LoadEvent>) -> Result<LoadedScene, LoadError> {
    let format = ModelFormat::from_path(path)?;
    let mut file = File::open(path)?;
    let total = file.metadata().map(|m| m.len()).unwrap_or(0);

    let mut bytes = Vec::with_capacity(total as usize);
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        let read = file.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..read]);
        let loaded = bytes.len() as u64;
        let _ = sender.send(LoadEvent::Progress {
            loaded,
            total: total.max(loaded),
        });
    }
    debug!(path = %path.display(), bytes = bytes.len(), ?format, "Model read; parsing");

    import_bytes(&bytes, format, path.parent())
}

/// Receiving end of a load started by [`AssetLoader::load`].
#[derive(Debug)]
pub struct LoadHandle {
    path: PathBuf,
    receiver: Receiver<LoadEvent>,
    finished: bool,
    _thread: Option<JoinHandle<()>>,
}

impl LoadHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the terminal event has been delivered.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Next pending event without blocking.
    pub fn poll(&mut self) -> Option<LoadEvent> {
        if self.finished {
            return None;
        }
        let event = match self.receiver.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => LoadEvent::Failure(LoadError::Disconnected),
        };
        self.finished = event.is_terminal();
        Some(event)
    }

    /// Hand every pending event to `handler`, in order.
    pub fn drain(&mut self, mut handler: impl FnMut(LoadEvent)) {
        while let Some(event) = self.poll() {
            handler(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::tests::sample_glb;

    fn temp_file(name: &str, contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("vitrine-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn collect(handle: &mut LoadHandle) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        while !handle.is_finished() {
            match handle.poll() {
                Some(event) => events.push(event),
                None => std::thread::sleep(std::time::Duration::from_millis(1)),
            }
        }
        events
    }

    #[test]
    fn success_is_delivered_exactly_once_after_progress() {
        let path = temp_file("ok.glb", &sample_glb());
        let mut handle = AssetLoader::new().load(&path);
        let events = collect(&mut handle);

        let (terminal, progress) = events.split_last().unwrap();
        assert!(matches!(terminal, LoadEvent::Success(_)));
        assert!(!progress.is_empty());
        assert!(progress.iter().all(|e| !e.is_terminal()));

        let mut last = 0;
        for event in progress {
            let LoadEvent::Progress { loaded, total } = *event else {
                unreachable!()
            };
            assert!(loaded >= last);
            assert!(loaded <= total);
            last = loaded;
        }
        assert_eq!(progress.last().and_then(LoadEvent::percent), Some(100.0));

        assert!(handle.is_finished());
        assert!(handle.poll().is_none());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn missing_file_fails_once() {
        let path = std::env::temp_dir().join("vitrine-definitely-missing.glb");
        let mut handle = AssetLoader::new().load(&path);
        let events = collect(&mut handle);

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], LoadEvent::Failure(LoadError::Io(_))));
    }

    #[test]
    fn unknown_extension_fails() {
        let path = temp_file("model.fbx", b"whatever");
        let mut handle = AssetLoader::new().load(&path);
        let events = collect(&mut handle);

        assert!(matches!(
            events.as_slice(),
            [LoadEvent::Failure(LoadError::UnknownFormat(_))]
        ));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn corrupt_model_fails_after_progress() {
        let path = temp_file("broken.glb", b"glTF but not really");
        let mut handle = AssetLoader::new().load(&path);
        let events = collect(&mut handle);

        assert!(matches!(events.first(), Some(LoadEvent::Progress { .. })));
        assert!(matches!(events.last(), Some(LoadEvent::Failure(_))));
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn drain_hands_over_events_in_order() {
        let path = temp_file("drain.glb", &sample_glb());
        let mut handle = AssetLoader::new().load(&path);

        let mut seen = Vec::new();
        while !handle.is_finished() {
            handle.drain(|event| seen.push(event.is_terminal()));
            std::thread::yield_now();
        }
        assert_eq!(seen.last(), Some(&true));
        assert_eq!(seen.iter().filter(|t| **t).count(), 1);
        std::fs::remove_file(path).ok();
    }
}
