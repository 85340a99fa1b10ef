//! Multi-context behavior: several clients sharing one store converge, and a
//! client's poll ticks never overlap.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tabsync::core::{NullNotifier, StoreResult};
use tabsync::prelude::*;

fn obj(value: Value) -> SharedObject {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

fn settings(store: Arc<dyn Store>, delay_ms: u64) -> Settings {
    Settings::builder()
        .delay(Duration::from_millis(delay_ms))
        .storage(store)
        .build()
        .unwrap()
}

/// Wait until `check` holds, polling every few milliseconds.
async fn eventually(what: &str, mut check: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !check() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[test]
fn manual_ticks_propagate_between_contexts() {
    let store = Arc::new(CookieStore::new());
    let a = SyncClient::new(settings(store.clone(), 100), Arc::new(NullNotifier));
    let b = SyncClient::new(settings(store, 100), Arc::new(NullNotifier));

    a.write(&json!({"a": 1, "b": 2}));
    a.tick().unwrap();
    b.tick().unwrap();
    assert_eq!(b.read(), obj(json!({"a": 1, "b": 2})));

    b.delete("a");
    b.tick().unwrap();
    a.tick().unwrap();
    assert_eq!(a.read(), obj(json!({"b": 2})));

    a.write(&Value::Null);
    a.tick().unwrap();
    b.tick().unwrap();
    assert!(b.read().is_empty());
}

#[test]
fn remote_change_fires_key_and_aggregate_events_once() {
    let store = Arc::new(MemoryStore::new());
    let writer = SyncClient::new(settings(store.clone(), 100), Arc::new(NullNotifier));

    let bus = Arc::new(EventBus::new());
    let events = Arc::new(Mutex::new(Vec::new()));
    for name in ["sync", "sync:x", "sync:y"] {
        let events = events.clone();
        bus.subscribe(name, move |v| events.lock().push((name, v.cloned())));
    }
    let reader = SyncClient::new(settings(store, 100), bus);
    reader.tick().unwrap();

    writer.tick().unwrap();
    writer.write(&json!({"x": 1, "y": [2]}));
    writer.tick().unwrap();
    reader.tick().unwrap();

    assert_eq!(
        *events.lock(),
        vec![
            ("sync:x", Some(json!(1))),
            ("sync:y", Some(json!([2]))),
            ("sync", Some(json!({"x": 1, "y": [2]}))),
        ]
    );
}

#[test]
fn concurrent_edit_resolves_to_local_value() {
    let store = Arc::new(MemoryStore::new());
    let a = SyncClient::new(settings(store.clone(), 100), Arc::new(NullNotifier));
    let b = SyncClient::new(settings(store.clone(), 100), Arc::new(NullNotifier));

    a.set("a", 1);
    a.tick().unwrap();
    b.tick().unwrap();

    // Both edit before either polls: `a` writes first, `b` wins locally and
    // its write is the last one.
    a.set("a", 3);
    b.set("a", 2);
    a.tick().unwrap();
    b.tick().unwrap();
    assert_eq!(b.get("a"), Some(json!(2)));
    assert_eq!(store.slot("sync").as_deref(), Some(r#"{"a":2}"#));

    a.tick().unwrap();
    assert_eq!(a.get("a"), Some(json!(2)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn spawned_contexts_converge() {
    let store = Arc::new(MemoryStore::new());
    let clients: Vec<SyncClient> = (0..3)
        .map(|_| SyncClient::spawn(settings(store.clone(), 5), Arc::new(NullNotifier)))
        .collect();

    // One writer at a time: concurrent writers are last-writer-wins and may
    // drop each other's keys.
    let mut expected = SharedObject::new();
    for (i, client) in clients.iter().enumerate() {
        let key = format!("from{i}");
        client.set(&key, i);
        expected.insert(key, json!(i));
        eventually("convergence", || clients.iter().all(|c| c.read() == expected)).await;
    }
    assert_eq!(expected.len(), 3);

    for client in clients {
        client.shutdown().await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn file_store_contexts_converge() {
    let dir = tempfile::tempdir().unwrap();
    let left = SyncClient::spawn(
        settings(Arc::new(FileStore::new(dir.path())), 5),
        Arc::new(NullNotifier),
    );
    let right = SyncClient::spawn(
        settings(Arc::new(FileStore::new(dir.path())), 5),
        Arc::new(NullNotifier),
    );

    left.set("page", "/home");
    eventually("right to see left", || right.get("page") == Some(json!("/home"))).await;

    right.set("page", Value::Null);
    eventually("left to see delete", || !left.contains("page")).await;

    left.shutdown().await;
    right.shutdown().await;
}

/// Store that records how many calls are in flight and when each read starts.
struct ProbeStore {
    inner: MemoryStore,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    read_starts: Mutex<Vec<Instant>>,
}

impl ProbeStore {
    fn new(latency: Duration) -> Self {
        Self {
            inner: MemoryStore::new(),
            latency,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            read_starts: Mutex::new(Vec::new()),
        }
    }

    fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(self.latency);
    }

    fn exit(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Store for ProbeStore {
    fn backend_name(&self) -> &'static str {
        "probe"
    }

    fn get(&self, settings: &Settings) -> StoreResult<Option<String>> {
        self.read_starts.lock().push(Instant::now());
        self.enter();
        let result = self.inner.get(settings);
        self.exit();
        result
    }

    fn set(&self, settings: &Settings, blob: &str) -> StoreResult<()> {
        self.enter();
        let result = self.inner.set(settings, blob);
        self.exit();
        result
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn slow_store_ticks_never_overlap() {
    let latency = Duration::from_millis(10);
    let delay = Duration::from_millis(20);
    let probe = Arc::new(ProbeStore::new(latency));

    let client = SyncClient::spawn(
        settings(probe.clone(), delay.as_millis() as u64),
        Arc::new(NullNotifier),
    );
    for i in 0..5 {
        client.set("n", i);
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    eventually("several ticks", || probe.read_starts.lock().len() >= 5).await;
    client.shutdown().await;

    assert_eq!(probe.max_in_flight.load(Ordering::SeqCst), 1);

    // Each tick starts no sooner than the previous read plus the delay.
    let starts = probe.read_starts.lock().clone();
    for pair in starts.windows(2) {
        assert!(pair[1] - pair[0] >= latency + delay);
    }
}
