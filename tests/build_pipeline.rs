//! End-to-end builds against the real filesystem.

use snapsite::config::SiteConfig;
use snapsite::read::ReadError;
use snapsite::storage::OsStorage;
use snapsite::write::WriteError;
use snapsite::{BuildError, FileCollection, FileRecord, Pipeline, stage_fn};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

/// Sorted relative paths of every file under `root`.
fn tree(root: &Path) -> Vec<String> {
    let mut out = Vec::new();
    collect(root, root, &mut out);
    out.sort();
    out
}

fn collect(root: &Path, dir: &Path, out: &mut Vec<String>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect(root, &path, out);
        } else {
            let rel = path.strip_prefix(root).unwrap();
            out.push(rel.to_string_lossy().replace('\\', "/"));
        }
    }
}

fn setup() -> (TempDir, PathBuf, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("source");
    let destination = tmp.path().join("public");
    fs::create_dir_all(&source).unwrap();
    (tmp, source, destination)
}

// =========================================================================
// Round trip
// =========================================================================

#[test]
fn round_trip_is_byte_identical() {
    let (_tmp, source, destination) = setup();
    let binary: Vec<u8> = (0..=255u8).collect();
    write(&source, "index.html", b"<h1>home</h1>\n");
    write(&source, "img/bytes.bin", &binary);
    write(&source, "a/d/e/e/p/file.go", b"hi\ndeep\nbye\n");

    let report = Pipeline::with_os_storage()
        .source(&source)
        .destination(&destination)
        .build()
        .unwrap();

    assert_eq!(report.files_read, 3);
    assert_eq!(tree(&destination), tree(&source));
    for rel in tree(&source) {
        assert_eq!(
            fs::read(destination.join(&rel)).unwrap(),
            fs::read(source.join(&rel)).unwrap(),
            "{rel}"
        );
    }
}

#[test]
fn frontmatter_removed_from_written_file() {
    let (_tmp, source, destination) = setup();
    write(&source, "page.txt", b"---\nkey: value\n---\nbody");

    let mut pipeline = Pipeline::with_os_storage()
        .source(&source)
        .destination(&destination);
    pipeline.build().unwrap();

    assert_eq!(fs::read(destination.join("page.txt")).unwrap(), b"body");
    let meta = pipeline.files().get("page.txt").unwrap().meta("key").unwrap();
    assert_eq!(meta.as_str(), Some("value"));
}

#[cfg(unix)]
#[test]
fn symlinked_directory_is_read() {
    let (tmp, source, destination) = setup();
    write(&source, "index.html", b"<h1>home</h1>");
    write(tmp.path(), "shared/style.css", b"body{}");
    std::os::unix::fs::symlink("../shared", source.join("css")).unwrap();

    let report = Pipeline::with_os_storage()
        .source(&source)
        .destination(&destination)
        .build()
        .unwrap();

    assert_eq!(report.files_read, 2);
    assert_eq!(tree(&destination), vec!["css/style.css", "index.html"]);
    assert_eq!(fs::read(destination.join("css/style.css")).unwrap(), b"body{}");
}

#[cfg(target_os = "linux")]
#[test]
fn non_utf8_file_names_fail_the_read() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let (_tmp, source, destination) = setup();
    fs::write(source.join(OsStr::from_bytes(b"a\xff.txt")), b"one").unwrap();
    fs::write(source.join(OsStr::from_bytes(b"a\xfe.txt")), b"two").unwrap();

    let err = Pipeline::with_os_storage()
        .source(&source)
        .destination(&destination)
        .build()
        .unwrap_err();

    match err {
        BuildError::Read(ReadError::NonUtf8Path { path }) => {
            assert!(path.starts_with(&source));
        }
        other => panic!("expected non-UTF-8 path error, got {other:?}"),
    }
    assert!(!destination.exists());
}

// =========================================================================
// Clean
// =========================================================================

#[test]
fn clean_builds_are_idempotent() {
    let (_tmp, source, destination) = setup();
    write(&source, "keep.txt", b"keep");
    write(&destination, "stale/old.txt", b"old");

    let mut pipeline = Pipeline::with_os_storage()
        .source(&source)
        .destination(&destination)
        .clean(true);

    pipeline.build().unwrap();
    let first = tree(&destination);
    pipeline.build().unwrap();

    assert_eq!(first, vec!["keep.txt"]);
    assert_eq!(tree(&destination), first);
    assert!(!destination.join("stale").exists());
}

#[test]
fn clean_requires_existing_destination() {
    let (_tmp, source, destination) = setup();
    write(&source, "a.txt", b"a");

    let err = Pipeline::with_os_storage()
        .source(&source)
        .destination(&destination)
        .clean(true)
        .build()
        .unwrap_err();

    assert_eq!(err.to_string(), "failed writing files");
    assert!(!destination.exists());
}

#[test]
fn clean_refuses_file_destination() {
    let (_tmp, source, destination) = setup();
    write(&source, "a.txt", b"a");
    fs::write(&destination, b"not a directory").unwrap();

    let err = Pipeline::with_os_storage()
        .source(&source)
        .destination(&destination)
        .clean(true)
        .build()
        .unwrap_err();

    match err {
        BuildError::Write(WriteError::Clean { path, .. }) => assert_eq!(path, destination),
        other => panic!("expected clean failure, got {other:?}"),
    }
    assert_eq!(fs::read(&destination).unwrap(), b"not a directory");
}

// =========================================================================
// Permissions
// =========================================================================

#[cfg(unix)]
fn mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).unwrap().permissions().mode() & 0o7777
}

#[cfg(unix)]
#[test]
fn source_mode_propagates() {
    use std::os::unix::fs::PermissionsExt;

    let (_tmp, source, destination) = setup();
    let script = write(&source, "run.sh", b"#!/bin/sh\n");
    fs::set_permissions(&script, fs::Permissions::from_mode(0o777)).unwrap();
    let private = write(&source, "private.txt", b"p");
    fs::set_permissions(&private, fs::Permissions::from_mode(0o600)).unwrap();

    Pipeline::with_os_storage()
        .source(&source)
        .destination(&destination)
        .build()
        .unwrap();

    assert_eq!(mode(&destination.join("run.sh")), 0o777);
    assert_eq!(mode(&destination.join("private.txt")), 0o600);
}

#[cfg(unix)]
#[test]
fn rebuild_over_read_only_output() {
    use std::os::unix::fs::PermissionsExt;

    let (_tmp, source, destination) = setup();
    let page = write(&source, "locked.txt", b"first");
    fs::set_permissions(&page, fs::Permissions::from_mode(0o444)).unwrap();

    let mut pipeline = Pipeline::with_os_storage()
        .source(&source)
        .destination(&destination);
    pipeline.build().unwrap();

    fs::set_permissions(&page, fs::Permissions::from_mode(0o644)).unwrap();
    fs::write(&page, b"second").unwrap();
    fs::set_permissions(&page, fs::Permissions::from_mode(0o444)).unwrap();
    pipeline.build().unwrap();

    let out = destination.join("locked.txt");
    assert_eq!(fs::read(&out).unwrap(), b"second");
    assert_eq!(mode(&out), 0o444);
}

#[cfg(unix)]
#[test]
fn synthesized_file_gets_default_mode() {
    let (_tmp, source, destination) = setup();
    write(&source, "a.txt", b"a");

    let mut pipeline = Pipeline::with_os_storage()
        .source(&source)
        .destination(&destination);
    pipeline.use_stage(stage_fn("sitemap", |files: &mut FileCollection| {
        let listing = files.paths().collect::<Vec<_>>().join("\n");
        files.insert("sitemap.txt", FileRecord::new(listing));
        Ok(())
    }));
    pipeline.build().unwrap();

    assert_eq!(fs::read(destination.join("sitemap.txt")).unwrap(), b"a.txt");
    assert_eq!(mode(&destination.join("sitemap.txt")), 0o644);
}

// =========================================================================
// Failures
// =========================================================================

#[test]
fn stage_failure_writes_nothing() {
    let (_tmp, source, destination) = setup();
    write(&source, "a.txt", b"a");

    let mut pipeline = Pipeline::with_os_storage()
        .source(&source)
        .destination(&destination);
    pipeline
        .use_stage(stage_fn("ok", |_: &mut FileCollection| Ok(())))
        .use_stage(stage_fn("broken", |_: &mut FileCollection| {
            Err("cannot continue".into())
        }));

    let err = pipeline.build().unwrap_err();
    match err {
        BuildError::Stages(stage) => assert_eq!(stage.stage, "broken"),
        other => panic!("expected stage failure, got {other:?}"),
    }
    assert!(!destination.exists());
}

#[test]
fn malformed_frontmatter_writes_nothing() {
    let (_tmp, source, destination) = setup();
    write(&source, "good.txt", b"fine");
    write(&source, "bad.md", b"---\ntitle: never closed\n");

    let mut pipeline = Pipeline::with_os_storage()
        .source(&source)
        .destination(&destination);
    let err = pipeline.build().unwrap_err();

    assert_eq!(err.to_string(), "failed at read step");
    assert!(pipeline.files().is_empty());
    assert!(!destination.exists());
}

// =========================================================================
// Config-driven build
// =========================================================================

#[test]
fn configured_site_build() {
    let (_tmp, source, destination) = setup();
    write(&source, "about.md", b"---\ntitle: About\n---\nHello *there*.");
    write(&source, ".git/HEAD", b"ref: refs/heads/main");
    write(&source, "notes.md", b"---\ndraft: true\n---\nsecret");
    write(&source, "hello.txt", b"---\ntemplate: true\nname: World\n---\nHello, {{ name }}!");
    write(&source, "css/site.css", b"/* theme */\nbody {\n  margin: 0;\n}\n");
    write(&source, "css/raw.css", b"---\nminify: false\n---\nbody { margin: 0; }\n");

    let config = SiteConfig {
        source: source.clone(),
        destination: destination.clone(),
        ignore: vec![PathBuf::from(".git")],
        ..SiteConfig::default()
    };
    config.pipeline(OsStorage).unwrap().build().unwrap();

    assert_eq!(
        tree(&destination),
        vec!["about.html", "css/raw.css", "css/site.css", "hello.txt"]
    );
    assert_eq!(fs::read(destination.join("hello.txt")).unwrap(), b"Hello, World!");
    let css = fs::read_to_string(destination.join("css/site.css")).unwrap();
    assert!(css.starts_with("body{margin:0"), "{css}");
    assert_eq!(
        fs::read(destination.join("css/raw.css")).unwrap(),
        b"body { margin: 0; }\n"
    );
    let html = fs::read_to_string(destination.join("about.html")).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>About</title>"));
    assert!(html.contains("<em>there</em>"));
}
