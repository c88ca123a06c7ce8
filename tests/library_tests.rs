use sketch_slideshow::error::LibraryError;
use sketch_slideshow::library::{ImageCollection, is_supported_image};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[test]
fn folder_scan_keeps_only_visible_images() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    fs::write(root.join("b.JPG"), vec![0u8; 2048]).unwrap();
    fs::write(root.join("a.png"), vec![0u8; 1024]).unwrap();
    fs::write(root.join("notes.txt"), b"hands").unwrap();
    fs::write(root.join(".hidden.png"), b"x").unwrap();
    fs::create_dir(root.join("nested")).unwrap();
    fs::write(root.join("nested/c.png"), b"x").unwrap();

    let images = ImageCollection::from_folder(root).unwrap();
    let names: Vec<_> = images
        .iter()
        .map(|e| e.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.png", "b.JPG"]);
    assert_eq!(images.folder(), Some(root));

    let summary = images.summary();
    assert_eq!(summary.items, 2);
    assert_eq!(summary.total_size, 3072);
    assert!(summary.to_string().ends_with("(2 items, 3 KB)"), "{summary}");
}

#[test]
fn empty_folder_has_no_images() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("readme.md"), b"#").unwrap();
    assert!(matches!(
        ImageCollection::from_folder(tmp.path()),
        Err(LibraryError::NoImages(_))
    ));
}

#[test]
fn missing_folder_is_rejected() {
    let tmp = tempdir().unwrap();
    assert!(matches!(
        ImageCollection::from_folder(&tmp.path().join("gone")),
        Err(LibraryError::BadDir(_))
    ));
}

#[test]
fn file_list_keeps_order_and_drops_unusable_entries() {
    let tmp = tempdir().unwrap();
    let z = tmp.path().join("z.webp");
    let a = tmp.path().join("a.jpeg");
    fs::write(&z, b"z").unwrap();
    fs::write(&a, b"a").unwrap();
    let txt = tmp.path().join("list.txt");
    fs::write(&txt, b"t").unwrap();

    let images = ImageCollection::from_files(
        "picked",
        vec![z.clone(), txt, tmp.path().join("missing.png"), a.clone()],
    )
    .unwrap();
    assert_eq!(images.name(), "picked");
    assert_eq!(images.folder(), None);
    assert_eq!(images.len(), 2);
    assert_eq!(images.get(0).unwrap().path, z);
    assert_eq!(images.get(1).unwrap().path, a);
}

#[test]
fn supported_extensions() {
    assert!(is_supported_image(Path::new("x.jpg")));
    assert!(is_supported_image(Path::new("x.TIFF")));
    assert!(!is_supported_image(Path::new("x.psd")));
    assert!(!is_supported_image(Path::new("jpg")));
}
