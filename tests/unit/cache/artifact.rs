use super::*;
use std::path::Path;

fn write_artifact(dir: &Path, text: &str, kind: Mode) -> Artifact {
    let key = CacheKey::from_text(text);
    let path = dir.join(format!("{}.bin", key.short()));
    std::fs::write(&path, text.as_bytes()).unwrap();
    Artifact::new(key, kind, path)
}

#[test]
fn zero_capacity_is_rejected() {
    assert!(ArtifactCache::new(Mode::Image, 0, None).is_err());
}

#[test]
fn hit_returns_the_stored_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ArtifactCache::new(Mode::Image, 4, None).unwrap();
    let a = write_artifact(dir.path(), "hello world", Mode::Image);
    cache.put(a.clone());

    assert_eq!(cache.get(&a.key), Some(a));
    assert_eq!(cache.get(&CacheKey::from_text("other")), None);
}

#[test]
fn externally_deleted_file_reads_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ArtifactCache::new(Mode::Image, 4, None).unwrap();
    let a = write_artifact(dir.path(), "gone soon", Mode::Image);
    cache.put(a.clone());

    std::fs::remove_file(&a.path).unwrap();
    assert_eq!(cache.get(&a.key), None);
    assert_eq!(cache.len(), 0);
    // Repeated lookups stay quiet.
    assert_eq!(cache.get(&a.key), None);
}

#[test]
fn eviction_removes_the_backing_file() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ArtifactCache::new(Mode::Video, 2, None).unwrap();
    let a = write_artifact(dir.path(), "a", Mode::Video);
    let b = write_artifact(dir.path(), "b", Mode::Video);
    let c = write_artifact(dir.path(), "c", Mode::Video);

    cache.put(a.clone());
    cache.put(b.clone());
    assert!(cache.get(&a.key).is_some());
    cache.put(c.clone());

    assert_eq!(cache.len(), 2);
    assert!(!b.path.exists(), "least-recently-used file should be deleted");
    assert!(a.path.exists());
    assert!(c.path.exists());
    assert_eq!(cache.keys(), vec![c.key, a.key]);
}

#[test]
fn eviction_tolerates_already_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ArtifactCache::new(Mode::Image, 1, None).unwrap();
    let a = write_artifact(dir.path(), "a", Mode::Image);
    let b = write_artifact(dir.path(), "b", Mode::Image);
    cache.put(a.clone());
    std::fs::remove_file(&a.path).unwrap();
    cache.put(b.clone());
    assert_eq!(cache.get(&b.key), Some(b));
}

#[test]
fn overwrite_with_new_path_removes_old_file() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ArtifactCache::new(Mode::Image, 2, None).unwrap();
    let first = write_artifact(dir.path(), "same", Mode::Image);
    let second_path = dir.path().join("second.bin");
    std::fs::write(&second_path, b"x").unwrap();
    let second = Artifact::new(first.key.clone(), Mode::Image, &second_path);

    cache.put(first.clone());
    cache.put(second.clone());
    assert!(!first.path.exists());
    assert_eq!(cache.get(&first.key), Some(second));
    assert_eq!(cache.len(), 1);
}

#[test]
fn overwrite_with_same_path_keeps_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ArtifactCache::new(Mode::Image, 2, None).unwrap();
    let a = write_artifact(dir.path(), "same", Mode::Image);
    cache.put(a.clone());
    cache.put(a.clone());
    assert!(a.path.exists());
    assert!(cache.get(&a.key).is_some());
}

#[test]
fn expired_entries_read_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ArtifactCache::new(Mode::Image, 2, Some(Duration::from_secs(60))).unwrap();

    let mut old = write_artifact(dir.path(), "old", Mode::Image);
    old.created_at = SystemTime::now() - Duration::from_secs(3600);
    let fresh = write_artifact(dir.path(), "fresh", Mode::Image);
    cache.put(old.clone());
    cache.put(fresh.clone());

    assert_eq!(cache.get(&old.key), None);
    assert!(!old.path.exists(), "expired artifact file should be removed");
    assert_eq!(cache.get(&fresh.key), Some(fresh));
}

async fn wait_until_gone(path: &Path) -> bool {
    for _ in 0..200 {
        if !path.exists() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn eviction_on_a_runtime_deletes_off_the_calling_task() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ArtifactCache::new(Mode::Image, 1, None).unwrap();
    let a = write_artifact(dir.path(), "a", Mode::Image);
    let b = write_artifact(dir.path(), "b", Mode::Image);

    cache.put(a.clone());
    cache.put(b.clone());

    assert_eq!(cache.keys(), vec![b.key.clone()]);
    assert!(wait_until_gone(&a.path).await, "evicted file was never deleted");
    assert!(b.path.exists());
}

#[tokio::test]
async fn overwrite_on_a_runtime_deletes_the_old_file() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ArtifactCache::new(Mode::Image, 4, None).unwrap();
    let old = write_artifact(dir.path(), "same", Mode::Image);
    let newer_path = dir.path().join("newer.png");
    std::fs::write(&newer_path, b"newer").unwrap();

    cache.put(old.clone());
    cache.put(Artifact::new(old.key.clone(), Mode::Image, newer_path.clone()));

    assert!(wait_until_gone(&old.path).await);
    assert!(newer_path.exists());
}

#[test]
fn debug_shows_kind_and_entries() {
    let cache = ArtifactCache::new(Mode::Video, 2, None).unwrap();
    let text = format!("{cache:?}");
    assert!(text.contains("Video"), "{text}");
    assert!(text.contains("BoundedLru"), "{text}");
}
