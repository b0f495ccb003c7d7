use std::sync::Arc;
use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use critter_guide::catalog::{CatalogLoader, RecordSource};
use critter_guide::domain::{CatalogId, CatalogItem, SortOption};
use critter_guide::error::GuideError;
use critter_guide::presenter::{Presenter, PresenterState, Publication};
use critter_guide::store::{FoundStore, MemoryStore};

const TIMEOUT: Duration = Duration::from_secs(10);

const BUGS: &str = "\
Name,Seasonality,Location,Time,Price
Tarantula,November - April,On the ground,7 PM - 4 AM,8000
Ant,All year,On rotten food,All day,10
Bee,March - July,Flying,8 AM - 5 PM,200
";

struct Fixture {
    temp: tempfile::TempDir,
    loader: CatalogLoader,
}

impl Fixture {
    fn new(bugs: &str) -> Self {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("bugs.csv"), bugs).unwrap();
        let dir = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        Self {
            temp,
            loader: CatalogLoader::new(RecordSource::Directory(dir)),
        }
    }

    fn rewrite(&self, bugs: &str) {
        std::fs::write(self.temp.path().join("bugs.csv"), bugs).unwrap();
    }

    fn presenter<S: FoundStore + 'static>(&self, store: Arc<S>) -> Presenter<S> {
        Presenter::new(CatalogId::bugs(), self.loader.clone(), store)
    }
}

fn names(items: &[CatalogItem]) -> Vec<&str> {
    items.iter().map(|item| item.name.as_str()).collect()
}

fn drain(updates: &Receiver<Publication>) -> Vec<Publication> {
    updates.try_iter().collect()
}

#[test]
fn tarantula_ant_bee_walkthrough() {
    let fixture = Fixture::new(BUGS);
    let store = Arc::new(MemoryStore::new());
    let mut presenter = fixture.presenter(Arc::clone(&store));
    assert_eq!(presenter.state(), PresenterState::Empty);

    presenter.load();
    assert_eq!(presenter.state(), PresenterState::Loading);
    presenter.wait(TIMEOUT).unwrap();
    assert_eq!(presenter.state(), PresenterState::Loaded);
    assert_eq!(names(presenter.items()), ["Tarantula", "Ant", "Bee"]);
    assert!(presenter.items().iter().all(|item| !item.found));

    let current = presenter.items().to_vec();
    presenter.sort(&current, SortOption::Price);
    assert_eq!(names(presenter.items()), ["Tarantula", "Bee", "Ant"]);
    let prices: Vec<_> = presenter.items().iter().map(|item| item.price).collect();
    assert_eq!(prices, [8000, 200, 10]);

    let current = presenter.items().to_vec();
    presenter.sort(&current, SortOption::AToZ);
    assert_eq!(names(presenter.items()), ["Ant", "Bee", "Tarantula"]);

    let mut ant = presenter.items()[0].clone();
    assert!(presenter.toggle_found(&mut ant));
    assert!(ant.found);
    assert!(store.is_found("Ant"));

    // Filtering keeps the order it is given.
    let current = presenter.items().to_vec();
    presenter.filter(&current, true);
    assert_eq!(names(presenter.items()), ["Bee", "Tarantula"]);

    // From file order, as after a fresh load.
    presenter.load();
    presenter.wait(TIMEOUT).unwrap();
    assert!(presenter.items()[1].found);
    let current = presenter.items().to_vec();
    presenter.filter(&current, true);
    assert_eq!(names(presenter.items()), ["Tarantula", "Bee"]);
    assert!(presenter.items().iter().all(|item| !item.found));
}

#[test]
fn every_operation_publishes_a_full_sequence() {
    let fixture = Fixture::new(BUGS);
    let mut presenter = fixture.presenter(Arc::new(MemoryStore::new()));
    let updates = presenter.subscribe();

    presenter.load();
    presenter.wait(TIMEOUT).unwrap();
    let current = presenter.items().to_vec();
    presenter.sort(&current, SortOption::Price);

    let published = drain(&updates);
    assert_eq!(published.len(), 2);
    assert_matches!(&published[0], Publication::Items(items) if names(items) == ["Tarantula", "Ant", "Bee"]);
    assert_matches!(&published[1], Publication::Items(items) if names(items) == ["Tarantula", "Bee", "Ant"]);
}

#[test]
fn toggle_publishes_the_changed_item_only() {
    let fixture = Fixture::new(BUGS);
    let mut presenter = fixture.presenter(Arc::new(MemoryStore::new()));
    presenter.load();
    presenter.wait(TIMEOUT).unwrap();
    let updates = presenter.subscribe();

    let mut bee = presenter.items()[2].clone();
    presenter.toggle_found(&mut bee);

    let published = drain(&updates);
    assert_eq!(published, [Publication::ItemChanged(bee.clone())]);
    assert!(presenter.items()[2].found);
    assert_eq!(names(presenter.items()), ["Tarantula", "Ant", "Bee"]);
}

#[test]
fn toggling_twice_restores_store_and_item() {
    let fixture = Fixture::new(BUGS);
    let store = Arc::new(MemoryStore::new());
    let mut presenter = fixture.presenter(Arc::clone(&store));
    presenter.load();
    presenter.wait(TIMEOUT).unwrap();

    let mut tarantula = presenter.items()[0].clone();
    presenter.toggle_found(&mut tarantula);
    presenter.toggle_found(&mut tarantula);
    assert!(!tarantula.found);
    assert!(!store.is_found("Tarantula"));
}

#[test]
fn reload_picks_up_found_flags_from_the_store() {
    let fixture = Fixture::new(BUGS);
    let store = Arc::new(MemoryStore::new());
    let mut presenter = fixture.presenter(Arc::clone(&store));
    presenter.load();
    presenter.wait(TIMEOUT).unwrap();

    // Written behind the presenter's back, as another view would.
    store.set_found("Bee", true);
    assert!(!presenter.items()[2].found);

    presenter.load();
    presenter.wait(TIMEOUT).unwrap();
    assert!(presenter.items()[2].found);
}

#[test]
fn unhiding_reloads_and_drops_the_sort() {
    let fixture = Fixture::new(BUGS);
    let mut presenter = fixture.presenter(Arc::new(MemoryStore::new()));
    presenter.load();
    presenter.wait(TIMEOUT).unwrap();

    let current = presenter.items().to_vec();
    presenter.sort(&current, SortOption::AToZ);
    let current = presenter.items().to_vec();
    presenter.filter(&current, true);
    assert_eq!(presenter.state(), PresenterState::Loaded);

    let current = presenter.items().to_vec();
    presenter.filter(&current, false);
    assert_eq!(presenter.state(), PresenterState::Loading);
    presenter.wait(TIMEOUT).unwrap();
    assert_eq!(names(presenter.items()), ["Tarantula", "Ant", "Bee"]);
}

#[test]
fn failed_reload_keeps_the_previous_sequence() {
    let fixture = Fixture::new(BUGS);
    let mut presenter = fixture.presenter(Arc::new(MemoryStore::new()));
    let updates = presenter.subscribe();
    presenter.load();
    presenter.wait(TIMEOUT).unwrap();

    fixture.rewrite("Name,Seasonality,Location,Time,Price\nAnt,All year,Food,All day,ten\n");
    presenter.load();
    let err = presenter.wait(TIMEOUT).unwrap_err();
    assert_matches!(err, GuideError::Parse { message, .. } if message.contains("line 2"));
    assert_eq!(presenter.state(), PresenterState::Loaded);
    assert_eq!(names(presenter.items()), ["Tarantula", "Ant", "Bee"]);

    let published = drain(&updates);
    assert_matches!(published.last(), Some(Publication::LoadFailed));
}

#[test]
fn failed_first_load_stays_empty() {
    let fixture = Fixture::new("Name,Price\nAnt,10\n");
    let mut presenter = fixture.presenter(Arc::new(MemoryStore::new()));
    presenter.load();
    assert_matches!(presenter.wait(TIMEOUT), Err(GuideError::Parse { .. }));
    assert_eq!(presenter.state(), PresenterState::Empty);
    assert!(presenter.items().is_empty());
}

/// Blocks the first `is_found` call until released.
struct GateStore {
    entered: Mutex<Option<Sender<()>>>,
    release: Mutex<Option<Receiver<()>>>,
}

impl FoundStore for GateStore {
    fn is_found(&self, _name: &str) -> bool {
        let release = self.release.lock().unwrap().take();
        if let Some(release) = release {
            if let Some(entered) = self.entered.lock().unwrap().take() {
                let _ = entered.send(());
            }
            let _ = release.recv();
        }
        false
    }

    fn set_found(&self, _name: &str, _found: bool) {}
}

#[test]
fn superseded_load_is_discarded() {
    let fixture = Fixture::new(BUGS);
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let store = Arc::new(GateStore {
        entered: Mutex::new(Some(entered_tx)),
        release: Mutex::new(Some(release_rx)),
    });
    let mut presenter = fixture.presenter(store);

    let first = presenter.load();
    entered_rx.recv_timeout(TIMEOUT).unwrap();

    fixture.rewrite("Name,Seasonality,Location,Time,Price\nWasp,All year,Trees,All day,2500\n");
    let second = presenter.load();
    assert!(second > first);
    presenter.wait(TIMEOUT).unwrap();
    assert_eq!(names(presenter.items()), ["Wasp"]);

    release_tx.send(()).unwrap();
    std::thread::sleep(Duration::from_millis(200));
    assert_eq!(presenter.pump(), 0);
    assert_eq!(names(presenter.items()), ["Wasp"]);
    assert_eq!(presenter.state(), PresenterState::Loaded);
}

#[test]
fn pump_applies_finished_loads() {
    let fixture = Fixture::new(BUGS);
    let mut presenter = fixture.presenter(Arc::new(MemoryStore::new()));
    let updates = presenter.subscribe();
    presenter.load();

    let deadline = std::time::Instant::now() + TIMEOUT;
    while presenter.pump() == 0 {
        assert!(std::time::Instant::now() < deadline, "load never finished");
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(presenter.state(), PresenterState::Loaded);
    assert_eq!(drain(&updates).len(), 1);
}

#[test]
fn search_leaves_presenter_state_alone() {
    let fixture = Fixture::new(BUGS);
    let mut presenter = fixture.presenter(Arc::new(MemoryStore::new()));
    let updates = presenter.subscribe();
    presenter.load();
    presenter.wait(TIMEOUT).unwrap();
    drain(&updates);

    let matches = presenter.search(presenter.items(), "TAR");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].name, "Tarantula");
    assert_eq!(presenter.items().len(), 3);
    assert!(drain(&updates).is_empty());
}

#[test]
fn dropped_subscribers_are_forgotten() {
    let fixture = Fixture::new(BUGS);
    let mut presenter = fixture.presenter(Arc::new(MemoryStore::new()));
    drop(presenter.subscribe());
    let kept = presenter.subscribe();

    presenter.load();
    presenter.wait(TIMEOUT).unwrap();
    assert_eq!(drain(&kept).len(), 1);
}
