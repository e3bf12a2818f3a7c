use super::*;
use std::sync::Arc;

fn cap(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

fn recording(n: usize) -> (BoundedLru<u32, &'static str>, Arc<Mutex<Vec<u32>>>) {
    let evicted = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&evicted);
    let map = BoundedLru::new(cap(n)).with_eviction(move |k, _v| sink.lock().push(k));
    (map, evicted)
}

#[test]
fn size_never_exceeds_capacity() {
    let (map, evicted) = recording(3);
    for i in 0..10 {
        map.put(i, "v");
        assert!(map.len() <= 3);
    }
    assert_eq!(map.len(), 3);
    assert_eq!(map.capacity(), 3);
    assert_eq!(*evicted.lock(), vec![0, 1, 2, 3, 4, 5, 6]);
}

#[test]
fn eviction_follows_access_not_insertion() {
    let (map, evicted) = recording(2);
    map.put(1, "a");
    map.put(2, "b");
    // Reading 1 makes 2 the least-recently-used entry.
    assert_eq!(map.get(&1), Some("a"));
    map.put(3, "c");

    assert_eq!(*evicted.lock(), vec![2]);
    assert_eq!(map.get(&2), None);
    assert_eq!(map.keys(), vec![3, 1]);
}

#[test]
fn overwrite_returns_previous_value_without_evicting() {
    let (map, evicted) = recording(2);
    map.put(1, "a");
    map.put(2, "b");
    assert_eq!(map.put(1, "a2"), Some("a"));
    assert!(evicted.lock().is_empty());
    assert_eq!(map.len(), 2);
    // The overwrite refreshed 1, so 2 goes first.
    map.put(3, "c");
    assert_eq!(*evicted.lock(), vec![2]);
}

#[test]
fn rejected_entries_behave_as_absent_and_are_dropped() {
    let (map, evicted) = recording(4);
    map.put(7, "stale");
    assert_eq!(map.get_if(&7, |_| false), None);
    assert_eq!(map.len(), 0);
    assert_eq!(*evicted.lock(), vec![7]);

    // A miss never reaches the predicate.
    assert_eq!(map.get_if(&8, |_| panic!("predicate called on a miss")), None);
}

#[test]
fn works_without_a_callback() {
    let map: BoundedLru<&str, u8> = BoundedLru::new(cap(1));
    assert!(map.is_empty());
    map.put("x", 1);
    map.put("y", 2);
    assert_eq!(map.get(&"x"), None);
    assert_eq!(map.get(&"y"), Some(2));
}

#[test]
fn debug_reports_size_and_capacity() {
    let map: BoundedLru<String, u32> = BoundedLru::new(cap(3));
    map.put("a".to_string(), 1);
    let text = format!("{map:?}");
    assert!(text.contains("len: 1"), "{text}");
    assert!(text.contains("capacity: 3"), "{text}");
}
