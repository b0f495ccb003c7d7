use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::catalog::CatalogLoader;
use crate::domain::{CatalogId, CatalogItem, SortOption};
use crate::error::GuideError;
use crate::listing;
use crate::store::FoundStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenterState {
    Empty,
    Loading,
    Loaded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Publication {
    Items(Vec<CatalogItem>),
    ItemChanged(CatalogItem),
    LoadFailed,
}

struct LoadReply {
    generation: u64,
    result: Result<Vec<CatalogItem>, GuideError>,
}

enum Applied {
    Stale,
    Loaded,
    Failed(GuideError),
}

/// `load` parses on a worker thread; its reply only takes effect when the
/// owner calls [`Presenter::pump`] or [`Presenter::wait`]. Every load is
/// tagged with a generation number and replies from superseded loads are
/// dropped.
pub struct Presenter<S: FoundStore + 'static> {
    catalog: CatalogId,
    loader: CatalogLoader,
    store: Arc<S>,
    state: PresenterState,
    loaded_once: bool,
    items: Vec<CatalogItem>,
    generation: u64,
    replies_tx: Sender<LoadReply>,
    replies_rx: Receiver<LoadReply>,
    subscribers: Vec<Sender<Publication>>,
}

impl<S: FoundStore + 'static> Presenter<S> {
    pub fn new(catalog: CatalogId, loader: CatalogLoader, store: Arc<S>) -> Self {
        let (replies_tx, replies_rx) = mpsc::channel();
        Self {
            catalog,
            loader,
            store,
            state: PresenterState::Empty,
            loaded_once: false,
            items: Vec::new(),
            generation: 0,
            replies_tx,
            replies_rx,
            subscribers: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &CatalogId {
        &self.catalog
    }

    pub fn state(&self) -> PresenterState {
        self.state
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn subscribe(&mut self) -> Receiver<Publication> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn load(&mut self) -> u64 {
        self.generation += 1;
        self.state = PresenterState::Loading;
        let generation = self.generation;
        let catalog = self.catalog.clone();
        let loader = self.loader.clone();
        let store = Arc::clone(&self.store);
        let replies = self.replies_tx.clone();
        debug!(catalog = %catalog, generation, "dispatching load");
        thread::spawn(move || {
            let result = loader.load(&catalog, store.as_ref());
            // The presenter may be gone by now.
            let _ = replies.send(LoadReply { generation, result });
        });
        generation
    }

    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.replies_rx.try_recv() {
                Ok(reply) => {
                    if !matches!(self.apply(reply), Applied::Stale) {
                        applied += 1;
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        applied
    }

    /// Blocks until the current load settles and returns the loader's error
    /// if it failed.
    pub fn wait(&mut self, timeout: Duration) -> Result<(), GuideError> {
        let deadline = Instant::now() + timeout;
        while self.state == PresenterState::Loading {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.replies_rx.recv_timeout(remaining) {
                Ok(reply) => match self.apply(reply) {
                    Applied::Loaded => return Ok(()),
                    Applied::Failed(err) => return Err(err),
                    Applied::Stale => {}
                },
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return Err(GuideError::LoadTimeout(self.catalog.to_string()));
                }
            }
        }
        Ok(())
    }

    fn apply(&mut self, reply: LoadReply) -> Applied {
        if reply.generation != self.generation {
            debug!(
                catalog = %self.catalog,
                generation = reply.generation,
                current = self.generation,
                "discarding stale load"
            );
            return Applied::Stale;
        }
        match reply.result {
            Ok(items) => {
                info!(catalog = %self.catalog, count = items.len(), "catalog loaded");
                self.state = PresenterState::Loaded;
                self.loaded_once = true;
                self.replace(items);
                Applied::Loaded
            }
            Err(err) => {
                warn!(catalog = %self.catalog, error = %err, "catalog load failed");
                self.state = if self.loaded_once {
                    PresenterState::Loaded
                } else {
                    PresenterState::Empty
                };
                self.publish(Publication::LoadFailed);
                Applied::Failed(err)
            }
        }
    }

    pub fn sort(&mut self, items: &[CatalogItem], key: SortOption) {
        let sorted = listing::sort_items(items.to_vec(), key);
        self.settle();
        self.replace(sorted);
    }

    pub fn filter(&mut self, items: &[CatalogItem], hide_found: bool) {
        if !hide_found {
            self.load();
            return;
        }
        let visible = listing::hide_found(items);
        self.settle();
        self.replace(visible);
    }

    pub fn search<'a>(&self, items: &'a [CatalogItem], term: &str) -> Vec<&'a CatalogItem> {
        listing::search(items, term)
    }

    /// Nothing is re-read from the store, so two views toggling the same item
    /// can disagree until the next load.
    pub fn toggle_found(&mut self, item: &mut CatalogItem) -> bool {
        let found = !item.found;
        self.store.set_found(&item.name, found);
        item.found = found;

        let changed = item.clone();
        self.items = self
            .items
            .iter()
            .map(|current| {
                if current.name == changed.name {
                    changed.clone()
                } else {
                    current.clone()
                }
            })
            .collect();
        self.publish(Publication::ItemChanged(changed));
        found
    }

    fn settle(&mut self) {
        if self.state == PresenterState::Empty {
            self.state = PresenterState::Loaded;
        }
    }

    fn replace(&mut self, items: Vec<CatalogItem>) {
        self.items = items;
        self.publish(Publication::Items(self.items.clone()));
    }

    fn publish(&mut self, publication: Publication) {
        self.subscribers
            .retain(|subscriber| subscriber.send(publication.clone()).is_ok());
    }
}
