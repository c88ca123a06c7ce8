use sketch_slideshow::store::LastFolderStore;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn remembers_last_folder() {
    let tmp = tempdir().unwrap();
    let store = LastFolderStore::new(tmp.path().join("state/last-folder.json"));
    assert!(store.load().unwrap().is_none());

    let saved = store.save(&PathBuf::from("/refs/hands")).unwrap();
    let loaded = store.load().unwrap().expect("saved folder");
    assert_eq!(loaded, saved);
    assert_eq!(loaded.path, PathBuf::from("/refs/hands"));

    store.save(&PathBuf::from("/refs/feet")).unwrap();
    assert_eq!(
        store.load().unwrap().map(|f| f.path),
        Some(PathBuf::from("/refs/feet"))
    );

    store.clear().unwrap();
    assert!(store.load().unwrap().is_none());
    store.clear().unwrap();
}

#[test]
fn corrupt_state_is_an_error() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("last-folder.json");
    std::fs::write(&path, "{not json").unwrap();
    assert!(LastFolderStore::new(&path).load().is_err());
}
