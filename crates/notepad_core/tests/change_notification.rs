use notepad_core::{ChangeObserver, NoteQuery, NoteStore, NoteUri, NoteValues, Selection, StoreConfig};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct RecordingObserver {
    seen: Mutex<Vec<NoteUri>>,
}

impl RecordingObserver {
    fn take(&self) -> Vec<NoteUri> {
        std::mem::take(&mut *self.seen.lock().unwrap())
    }
}

impl ChangeObserver for RecordingObserver {
    fn on_change(&self, uri: &NoteUri) {
        self.seen.lock().unwrap().push(uri.clone());
    }
}

fn open_store() -> NoteStore {
    NoteStore::open_in_memory(StoreConfig::default()).unwrap()
}

#[test]
fn every_mutation_notifies_exactly_once() {
    let store = open_store();
    let routes = store.routes().clone();
    let recorder = Arc::new(RecordingObserver::default());
    store.subscribe(routes.collection_uri(), true, recorder.clone());

    let id = store.insert(&routes.collection_uri(), NoteValues::new()).unwrap();
    let item = routes.item_uri(id);
    assert_eq!(recorder.take(), vec![item.clone()]);

    store.update(&item, &NoteValues::new().title("x"), None).unwrap();
    assert_eq!(recorder.take(), vec![item.clone()]);

    let nothing = Selection::new("title = ?").arg("missing".to_string());
    let changed = store
        .update(&routes.collection_uri(), &NoteValues::new().body("y"), Some(&nothing))
        .unwrap();
    assert_eq!(changed, 0);
    assert_eq!(recorder.take(), vec![routes.collection_uri()]);

    assert_eq!(store.delete(&routes.item_uri(id + 100), None).unwrap(), 0);
    assert_eq!(recorder.take(), vec![routes.item_uri(id + 100)]);

    store.delete(&routes.collection_uri(), None).unwrap();
    assert_eq!(recorder.take(), vec![routes.collection_uri()]);
}

#[test]
fn failed_mutations_do_not_notify() {
    let store = open_store();
    let routes = store.routes().clone();
    let recorder = Arc::new(RecordingObserver::default());
    store.subscribe(routes.collection_uri(), true, recorder.clone());

    assert!(store.insert(&routes.item_uri(1), NoteValues::new()).is_err());
    assert!(store.update(&routes.item_uri(1), &NoteValues::new(), None).is_err());
    assert!(store
        .delete(&routes.collection_uri(), Some(&Selection::new("bogus(")))
        .is_err());
    assert!(recorder.take().is_empty());
}

#[test]
fn item_subscriber_hears_item_and_bulk_changes_only() {
    let store = open_store();
    let routes = store.routes().clone();
    let first = store.insert(&routes.collection_uri(), NoteValues::new()).unwrap();
    let second = store.insert(&routes.collection_uri(), NoteValues::new()).unwrap();

    let recorder = Arc::new(RecordingObserver::default());
    store.subscribe(routes.item_uri(first), false, recorder.clone());

    store.update(&routes.item_uri(second), &NoteValues::new().title("b"), None).unwrap();
    assert!(recorder.take().is_empty());

    store.update(&routes.item_uri(first), &NoteValues::new().title("a"), None).unwrap();
    store.update(&routes.collection_uri(), &NoteValues::new().body("all"), None).unwrap();
    assert_eq!(recorder.take(), vec![routes.item_uri(first), routes.collection_uri()]);
}

#[test]
fn collection_subscriber_without_descendants_misses_item_writes() {
    let store = open_store();
    let routes = store.routes().clone();
    let recorder = Arc::new(RecordingObserver::default());
    store.subscribe(routes.collection_uri(), false, recorder.clone());

    let id = store.insert(&routes.collection_uri(), NoteValues::new()).unwrap();
    store.delete(&routes.item_uri(id), None).unwrap();
    assert!(recorder.take().is_empty());

    store.delete(&routes.collection_uri(), None).unwrap();
    assert_eq!(recorder.take(), vec![routes.collection_uri()]);
}

#[test]
fn unsubscribe_stops_delivery_and_channels_receive_changes() {
    let store = open_store();
    let routes = store.routes().clone();
    let recorder = Arc::new(RecordingObserver::default());
    let subscription = store.subscribe(routes.collection_uri(), true, recorder.clone());
    let (_channel_id, changes) = store.subscribe_channel(routes.collection_uri(), true);
    assert_eq!(store.observers().len(), 2);

    assert!(store.unsubscribe(subscription));
    assert!(!store.unsubscribe(subscription));

    let id = store.insert(&routes.collection_uri(), NoteValues::new()).unwrap();
    assert!(recorder.take().is_empty());
    assert_eq!(
        changes.recv_timeout(Duration::from_secs(1)).unwrap(),
        routes.item_uri(id)
    );
}

#[test]
fn closure_observers_can_requery_the_store() {
    let store = Arc::new(open_store());
    let routes = store.routes().clone();
    let counts = Arc::new(Mutex::new(Vec::new()));

    let weak = Arc::downgrade(&store);
    let sink = counts.clone();
    let collection = routes.collection_uri();
    store.subscribe(
        routes.collection_uri(),
        true,
        Arc::new(move |_: &NoteUri| {
            if let Some(store) = weak.upgrade() {
                let rows = store.query(&collection, &NoteQuery::new()).unwrap();
                sink.lock().unwrap().push(rows.len());
            }
        }),
    );

    store.insert(&routes.collection_uri(), NoteValues::new()).unwrap();
    store.insert(&routes.collection_uri(), NoteValues::new()).unwrap();
    assert_eq!(*counts.lock().unwrap(), vec![1, 2]);
}

#[test]
fn result_sets_carry_their_address_for_invalidation() {
    let store = open_store();
    let routes = store.routes().clone();
    let id = store.insert(&routes.collection_uri(), NoteValues::new()).unwrap();

    let listing = store.query(&routes.collection_uri(), &NoteQuery::new()).unwrap();
    let single = store.query(&routes.item_uri(id), &NoteQuery::new()).unwrap();
    assert_eq!(listing.notification_uri(), &routes.collection_uri());
    assert_eq!(single.notification_uri(), &routes.item_uri(id));

    assert!(listing.is_invalidated_by(&routes.item_uri(id)));
    assert!(single.is_invalidated_by(&routes.collection_uri()));
    assert!(!single.is_invalidated_by(&routes.item_uri(id + 1)));
}

#[test]
fn view_result_sets_depend_on_the_collection() {
    let store = open_store();
    let routes = store.routes().clone();
    let id = store
        .insert(&routes.collection_uri(), NoteValues::new().title("t"))
        .unwrap();

    let live = store.query(&routes.live_folder_uri(), &NoteQuery::new()).unwrap();
    let search = store
        .query(
            &routes.search_uri(),
            &NoteQuery::new().selection(Selection::new("title = ?").arg("t".to_string())),
        )
        .unwrap();

    for rows in [&live, &search] {
        assert_eq!(rows.notification_uri(), &routes.collection_uri());
        assert!(rows.is_invalidated_by(&routes.item_uri(id)));
        assert!(rows.is_invalidated_by(&routes.item_uri(id + 1)));
        assert!(rows.is_invalidated_by(&routes.collection_uri()));
    }
}

#[test]
fn live_folder_subscribers_follow_collection_changes() {
    let store = open_store();
    let routes = store.routes().clone();
    let (_live_id, live_changes) = store.subscribe_channel(routes.live_folder_uri(), false);
    let (_search_id, search_changes) = store.subscribe_channel(routes.search_uri(), false);

    let id = store.insert(&routes.collection_uri(), NoteValues::new()).unwrap();
    store
        .update(&routes.item_uri(id), &NoteValues::new().title("x"), None)
        .unwrap();
    store.delete(&routes.collection_uri(), None).unwrap();

    let expected = vec![routes.item_uri(id), routes.item_uri(id), routes.collection_uri()];
    assert_eq!(live_changes.try_iter().collect::<Vec<_>>(), expected);
    assert_eq!(search_changes.try_iter().collect::<Vec<_>>(), expected);
}

#[test]
fn item_changes_are_notified_under_the_canonical_address() {
    let store = open_store();
    let routes = store.routes().clone();
    let id = store.insert(&routes.collection_uri(), NoteValues::new()).unwrap();
    assert_eq!(id, 1);

    let recorder = Arc::new(RecordingObserver::default());
    store.subscribe(routes.item_uri(1), false, recorder.clone());
    let padded: NoteUri = format!("content://{}/notes/007", routes.authority())
        .parse()
        .unwrap();
    let padded_one: NoteUri = format!("content://{}/notes/001", routes.authority())
        .parse()
        .unwrap();

    store.update(&padded_one, &NoteValues::new().title("x"), None).unwrap();
    store.delete(&padded_one, None).unwrap();
    store.delete(&padded, None).unwrap();
    assert_eq!(recorder.take(), vec![routes.item_uri(1), routes.item_uri(1)]);

    let padded_watch = Arc::new(RecordingObserver::default());
    store.subscribe(padded, false, padded_watch.clone());
    store.delete(&routes.item_uri(7), None).unwrap();
    assert_eq!(padded_watch.take(), vec![routes.item_uri(7)]);
}
