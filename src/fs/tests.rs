use std::future::IntoFuture;
use std::io;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures::future::join_all;
use tempfile::TempDir;

use super::*;
use crate::dual::DualCall;
use crate::options::Encoding;

/// Runs the same call blocking, then suspending.
async fn both<A, T>(call: impl Fn() -> DualCall<A, T>) -> (io::Result<T>, io::Result<T>)
where
    A: Send + 'static,
    T: Send + 'static,
{
    let blocking = call().sync();
    let suspending = call().await;
    (blocking, suspending)
}

fn assert_same_error<T: std::fmt::Debug>(blocking: io::Result<T>, suspending: io::Result<T>) -> io::Error {
    let blocking = blocking.unwrap_err();
    let suspending = suspending.unwrap_err();
    assert_eq!(blocking.kind(), suspending.kind());
    assert_eq!(blocking.raw_os_error(), suspending.raw_os_error());
    blocking
}

fn current_ids() -> (u32, u32) {
    (
        rustix::process::getuid().as_raw(),
        rustix::process::getgid().as_raw(),
    )
}

#[tokio::test]
async fn test_read_file_text_matches() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("notes.txt");
    std::fs::write(&path, "line one\nline two\n").unwrap();

    let (blocking, suspending) = both(|| read_file(&path, Encoding::Utf8)).await;
    let blocking = blocking.unwrap();
    assert_eq!(blocking, suspending.unwrap());
    assert_eq!(blocking.as_text(), Some("line one\nline two\n"));

    let (blocking, suspending) = both(|| read_file(&path, ReadOptions::default())).await;
    assert_eq!(blocking.unwrap(), FileContents::Bytes(b"line one\nline two\n".to_vec()));
    assert_eq!(suspending.unwrap(), FileContents::Bytes(b"line one\nline two\n".to_vec()));
}

#[tokio::test]
async fn test_read_file_missing_fails_alike() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent");

    let (blocking, suspending) = both(|| read_file(&path, Encoding::Utf8)).await;
    let err = assert_same_error(blocking, suspending);
    assert_eq!(err.kind(), io::ErrorKind::NotFound);
}

#[tokio::test]
async fn test_write_then_read_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let sync_path = temp_dir.path().join("sync.bin");
    let async_path = temp_dir.path().join("async.bin");

    write_file(&sync_path, "cafe00ff", Encoding::Hex).sync().unwrap();
    write_file(&async_path, "cafe00ff", Encoding::Hex).await.unwrap();

    assert_eq!(std::fs::read(&sync_path).unwrap(), vec![0xca, 0xfe, 0x00, 0xff]);
    assert_eq!(std::fs::read(&sync_path).unwrap(), std::fs::read(&async_path).unwrap());

    let text = read_file(&async_path, Encoding::Hex).await.unwrap();
    assert_eq!(text.as_text(), Some("cafe00ff"));
}

#[tokio::test]
async fn test_write_exclusive_flag() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("once");
    std::fs::write(&path, b"first").unwrap();

    let options = WriteOptions::default().with_flag(OpenFlag::WriteExclusive);
    let (blocking, suspending) = both(|| write_file(&path, "second", options)).await;
    let err = assert_same_error(blocking, suspending);
    assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    assert_eq!(std::fs::read(&path).unwrap(), b"first");
}

#[tokio::test]
async fn test_write_invalid_text_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("never");

    let (blocking, suspending) = both(|| write_file(&path, "xyz", Encoding::Hex)).await;
    let err = assert_same_error(blocking, suspending);
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_append_file_composed() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("log");

    append_file(&path, "a", WriteOptions::default()).sync().unwrap();
    append_file(&path, "b", WriteOptions::default()).await.unwrap();
    append_file(&path, b"c", WriteOptions::default()).sync().unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "abc");
}

#[tokio::test]
async fn test_append_file_keeps_append_flag() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("log");
    std::fs::write(&path, b"old").unwrap();

    let exclusive = WriteOptions::default().with_flag(OpenFlag::AppendExclusive);
    let (blocking, suspending) = both(|| append_file(&path, "new", exclusive)).await;
    assert_eq!(assert_same_error(blocking, suspending).kind(), io::ErrorKind::AlreadyExists);
    assert_eq!(std::fs::read(&path).unwrap(), b"old");

    // A non-append flag still appends.
    let truncating = WriteOptions::default().with_flag(OpenFlag::Write);
    append_file(&path, "!", truncating).sync().unwrap();
    append_file(&path, "?", truncating).await.unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"old!?");

    let synced = WriteOptions::default().with_flag(OpenFlag::AppendSync);
    append_file(&path, ".", synced).await.unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"old!?.");
}

#[tokio::test]
async fn test_unlink() {
    let temp_dir = TempDir::new().unwrap();
    let first = temp_dir.path().join("first");
    let second = temp_dir.path().join("second");
    std::fs::write(&first, b"").unwrap();
    std::fs::write(&second, b"").unwrap();

    unlink(&first).sync().unwrap();
    unlink(&second).await.unwrap();
    assert!(!first.exists() && !second.exists());

    let (blocking, suspending) = both(|| unlink(&first)).await;
    assert_eq!(assert_same_error(blocking, suspending).kind(), io::ErrorKind::NotFound);

    let (blocking, suspending) = both(|| unlink(temp_dir.path())).await;
    assert_same_error(blocking, suspending);
}

#[tokio::test]
async fn test_access() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("present");
    std::fs::write(&path, b"x").unwrap();

    let (blocking, suspending) = both(|| access(&path, AccessMode::EXISTS)).await;
    assert!(blocking.is_ok());
    assert!(suspending.is_ok());

    let (blocking, suspending) = both(|| access(&path, None)).await;
    assert!(blocking.is_ok() && suspending.is_ok());

    // Repeatable without side effects.
    for _ in 0..3 {
        access(&path, AccessMode::READ_OK).sync().unwrap();
        access(&path, AccessMode::READ_OK).await.unwrap();
    }

    let missing = temp_dir.path().join("missing");
    let (blocking, suspending) = both(|| access(&missing, AccessMode::EXISTS)).await;
    assert_eq!(assert_same_error(blocking, suspending).kind(), io::ErrorKind::NotFound);
}

#[tokio::test]
async fn test_exists_composed() {
    let temp_dir = TempDir::new().unwrap();
    let (blocking, suspending) = both(|| exists(temp_dir.path())).await;
    assert!(blocking.unwrap());
    assert!(suspending.unwrap());

    let missing = temp_dir.path().join("missing");
    assert!(!exists(&missing).sync().unwrap());
    assert!(!exists(&missing).await.unwrap());
}

#[test]
fn test_blocking_calls_need_no_runtime() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("plain");

    write_file(&path, "outside tokio", WriteOptions::default()).sync().unwrap();
    assert!(exists(&path).sync().unwrap());
    append_file(&path, "!", WriteOptions::default()).sync().unwrap();
    let contents = read_file(&path, Encoding::Utf8).sync().unwrap();
    assert_eq!(contents.as_text(), Some("outside tokio!"));
}

#[tokio::test]
async fn test_stat_and_lstat() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("target");
    let link = temp_dir.path().join("link");
    std::fs::write(&target, b"1234").unwrap();
    std::os::unix::fs::symlink(&target, &link).unwrap();

    let (blocking, suspending) = both(|| stat(&link)).await;
    let blocking = blocking.unwrap();
    assert_eq!(blocking, suspending.unwrap());
    assert!(blocking.is_file());
    assert_eq!(blocking.size, 4);

    let (blocking, suspending) = both(|| lstat(&link)).await;
    let blocking = blocking.unwrap();
    assert_eq!(blocking, suspending.unwrap());
    assert!(blocking.is_symlink());

    // Read-only and repeatable.
    assert_eq!(stat(&link).sync().unwrap(), stat(&link).await.unwrap());
}

#[tokio::test]
async fn test_copy_file() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    std::fs::write(&src, b"copy me").unwrap();

    copy_file(&src, temp_dir.path().join("a"), CopyMode::empty()).sync().unwrap();
    cp(&src, temp_dir.path().join("b"), CopyMode::EXCL).await.unwrap();
    assert_eq!(std::fs::read(temp_dir.path().join("a")).unwrap(), b"copy me");
    assert_eq!(std::fs::read(temp_dir.path().join("b")).unwrap(), b"copy me");

    let dest = temp_dir.path().join("a");
    let (blocking, suspending) = both(|| copy_file(&src, &dest, CopyMode::EXCL)).await;
    assert_eq!(assert_same_error(blocking, suspending).kind(), io::ErrorKind::AlreadyExists);

    let missing = temp_dir.path().join("missing");
    let (blocking, suspending) = both(|| copy_file(&missing, &dest, CopyMode::empty())).await;
    assert_eq!(assert_same_error(blocking, suspending).kind(), io::ErrorKind::NotFound);
}

#[tokio::test]
async fn test_copy_file_onto_itself_keeps_contents() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("precious");
    let link = temp_dir.path().join("precious-link");
    std::fs::write(&path, b"precious").unwrap();
    std::os::unix::fs::symlink(&path, &link).unwrap();

    let (blocking, suspending) = both(|| copy_file(&path, &path, CopyMode::empty())).await;
    assert!(blocking.is_ok() && suspending.is_ok());
    assert_eq!(std::fs::read(&path).unwrap(), b"precious");

    let (blocking, suspending) = both(|| copy_file(&path, &link, CopyMode::FICLONE)).await;
    assert!(blocking.is_ok() && suspending.is_ok());
    assert_eq!(std::fs::read(&path).unwrap(), b"precious");

    let (blocking, suspending) = both(|| copy_file(&path, &path, CopyMode::FICLONE_FORCE)).await;
    assert!(blocking.is_ok() && suspending.is_ok());
    assert_eq!(std::fs::read(&path).unwrap(), b"precious");

    let (blocking, suspending) = both(|| copy_file(&path, &path, CopyMode::EXCL)).await;
    assert_eq!(assert_same_error(blocking, suspending).kind(), io::ErrorKind::AlreadyExists);
    assert_eq!(std::fs::read(&path).unwrap(), b"precious");
}

#[tokio::test]
async fn test_rm() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("tree");
    std::fs::create_dir_all(dir.join("inner")).unwrap();
    std::fs::write(dir.join("inner/leaf"), b"").unwrap();

    let (blocking, suspending) = both(|| rm(&dir, RmOptions::default())).await;
    assert_eq!(assert_same_error(blocking, suspending).raw_os_error(), Some(libc::EISDIR));

    rm(&dir, RmOptions::recursive()).await.unwrap();
    assert!(!dir.exists());

    let (blocking, suspending) = both(|| rm(&dir, RmOptions::default().force())).await;
    assert!(blocking.is_ok() && suspending.is_ok());
}

#[tokio::test]
async fn test_mkdir() {
    let temp_dir = TempDir::new().unwrap();

    let sync_first = mkdir(temp_dir.path().join("s/t/u"), MkdirOptions::recursive()).sync().unwrap();
    let async_first = mkdir(temp_dir.path().join("a/b/c"), MkdirOptions::recursive()).await.unwrap();
    assert_eq!(sync_first, Some(temp_dir.path().join("s")));
    assert_eq!(async_first, Some(temp_dir.path().join("a")));

    let existing = temp_dir.path().join("a/b");
    let (blocking, suspending) = both(|| mkdir(&existing, MkdirOptions::recursive())).await;
    assert_eq!(blocking.unwrap(), None);
    assert_eq!(suspending.unwrap(), None);

    let (blocking, suspending) = both(|| mkdir(&existing, MkdirOptions::default())).await;
    assert_eq!(assert_same_error(blocking, suspending).kind(), io::ErrorKind::AlreadyExists);

    let orphan = temp_dir.path().join("missing/child");
    let (blocking, suspending) = both(|| mkdir(&orphan, MkdirOptions::default())).await;
    assert_eq!(assert_same_error(blocking, suspending).kind(), io::ErrorKind::NotFound);

    let private = temp_dir.path().join("private");
    mkdir(&private, MkdirOptions::default().with_mode(0o700)).await.unwrap();
    assert_eq!(stat(&private).sync().unwrap().permissions(), 0o700);
}

#[tokio::test]
async fn test_rename() {
    let temp_dir = TempDir::new().unwrap();
    let a = temp_dir.path().join("a");
    let b = temp_dir.path().join("b");
    let c = temp_dir.path().join("c");
    std::fs::write(&a, b"moving").unwrap();

    rename(&a, &b).sync().unwrap();
    rename(&b, &c).await.unwrap();
    assert_eq!(std::fs::read(&c).unwrap(), b"moving");

    let (blocking, suspending) = both(|| rename(&a, &b)).await;
    assert_eq!(assert_same_error(blocking, suspending).kind(), io::ErrorKind::NotFound);
}

#[tokio::test]
async fn test_readdir_single_entry() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("index.test.ts"), b"").unwrap();

    let (blocking, suspending) = both(|| readdir(temp_dir.path(), ReaddirOptions::default())).await;
    let expected = Listing::Names(vec!["index.test.ts".to_string()]);
    assert_eq!(blocking.unwrap(), expected);
    assert_eq!(suspending.unwrap(), expected);
}

#[tokio::test]
async fn test_readdir_recursive_and_typed() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::create_dir_all(temp_dir.path().join("src/nested")).unwrap();
    std::fs::write(temp_dir.path().join("src/nested/deep.rs"), b"").unwrap();
    std::fs::write(temp_dir.path().join("top.rs"), b"").unwrap();

    let options = ReaddirOptions::default().recursive();
    let (blocking, suspending) = both(|| readdir(temp_dir.path(), options)).await;
    let blocking = blocking.unwrap();
    assert_eq!(blocking, suspending.unwrap());
    match &blocking {
        Listing::Names(names) => {
            let mut names = names.clone();
            names.sort();
            assert_eq!(names, vec!["src", "src/nested", "src/nested/deep.rs", "top.rs"]);
        }
        other => panic!("unexpected listing {:?}", other),
    }

    let options = ReaddirOptions::default().with_file_types();
    let (blocking, suspending) = both(|| readdir(temp_dir.path(), options)).await;
    let blocking = blocking.unwrap();
    assert_eq!(blocking, suspending.unwrap());
    match blocking {
        Listing::Entries(entries) => {
            assert_eq!(entries.len(), 2);
            let src = entries.iter().find(|e| e.name == "src").unwrap();
            assert!(src.is_dir());
            assert_eq!(src.parent_path, temp_dir.path());
        }
        other => panic!("unexpected listing {:?}", other),
    }

    let options = ReaddirOptions::default().with_file_types().recursive();
    let (blocking, suspending) = both(|| readdir(temp_dir.path(), options)).await;
    let blocking = blocking.unwrap();
    assert_eq!(blocking, suspending.unwrap());
    match blocking {
        Listing::Entries(entries) => {
            assert_eq!(entries.len(), 4);
            let deep = entries.iter().find(|e| e.name == "deep.rs").unwrap();
            assert!(deep.is_file());
            assert_eq!(deep.parent_path, temp_dir.path().join("src/nested"));
            assert_eq!(deep.path(), temp_dir.path().join("src/nested/deep.rs"));
            let nested = entries.iter().find(|e| e.name == "nested").unwrap();
            assert_eq!(nested.parent_path, temp_dir.path().join("src"));
        }
        other => panic!("unexpected listing {:?}", other),
    }

    let (blocking, suspending) = both(|| readdir(temp_dir.path().join("top.rs"), ReaddirOptions::default())).await;
    assert_same_error(blocking, suspending);
}

#[tokio::test]
async fn test_realpath_follows_links() {
    let temp_dir = TempDir::new().unwrap();
    let real = temp_dir.path().join("real");
    std::fs::create_dir(&real).unwrap();
    let link = temp_dir.path().join("alias");
    std::os::unix::fs::symlink(&real, &link).unwrap();

    let (blocking, suspending) = both(|| realpath(link.join("."))).await;
    let blocking = blocking.unwrap();
    assert_eq!(blocking, suspending.unwrap());
    assert_eq!(blocking, std::fs::canonicalize(&real).unwrap());
}

#[tokio::test]
async fn test_symlink_and_readlink() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("target.txt");
    std::fs::write(&target, b"").unwrap();

    let sync_link = temp_dir.path().join("sync-link");
    let async_link = temp_dir.path().join("async-link");
    symlink(&target, &sync_link, None).sync().unwrap();
    symlink("target.txt", &async_link, Some(SymlinkType::File)).await.unwrap();

    assert_eq!(readlink(&sync_link).sync().unwrap(), target);
    assert_eq!(readlink(&sync_link).await.unwrap(), target);
    assert_eq!(readlink(&async_link).await.unwrap(), PathBuf::from("target.txt"));

    let (blocking, suspending) = both(|| readlink(&target)).await;
    assert_eq!(assert_same_error(blocking, suspending).raw_os_error(), Some(libc::EINVAL));

    let (blocking, suspending) = both(|| symlink(&target, &sync_link, None)).await;
    assert_eq!(assert_same_error(blocking, suspending).kind(), io::ErrorKind::AlreadyExists);
}

#[tokio::test]
async fn test_chmod() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("script.sh");
    std::fs::write(&path, b"#!/bin/sh\n").unwrap();

    chmod(&path, 0o755).sync().unwrap();
    assert_eq!(stat(&path).sync().unwrap().permissions(), 0o755);
    chmod(&path, 0o600).await.unwrap();
    assert_eq!(stat(&path).await.unwrap().permissions(), 0o600);

    let missing = temp_dir.path().join("missing");
    let (blocking, suspending) = both(|| chmod(&missing, 0o644)).await;
    assert_eq!(assert_same_error(blocking, suspending).kind(), io::ErrorKind::NotFound);
}

#[tokio::test]
async fn test_chown_and_lchown_to_self() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("owned");
    let link = temp_dir.path().join("owned-link");
    std::fs::write(&path, b"").unwrap();
    std::os::unix::fs::symlink(&path, &link).unwrap();
    let (uid, gid) = current_ids();

    let (blocking, suspending) = both(|| chown(&path, uid, gid)).await;
    assert!(blocking.is_ok() && suspending.is_ok());
    let (blocking, suspending) = both(|| lchown(&link, uid, gid)).await;
    assert!(blocking.is_ok() && suspending.is_ok());

    let stats = stat(&path).await.unwrap();
    assert_eq!((stats.uid, stats.gid), (uid, gid));

    let missing = temp_dir.path().join("missing");
    let (blocking, suspending) = both(|| chown(&missing, uid, gid)).await;
    assert_eq!(assert_same_error(blocking, suspending).kind(), io::ErrorKind::NotFound);
}

#[tokio::test]
async fn test_utimes_and_lutimes() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("dated");
    let link = temp_dir.path().join("dated-link");
    std::fs::write(&path, b"").unwrap();
    std::os::unix::fs::symlink(&path, &link).unwrap();

    let then = UNIX_EPOCH + Duration::from_secs(1_000_000_000);
    let later = then + Duration::from_secs(86_400);
    let secs = |t: SystemTime| t.duration_since(UNIX_EPOCH).unwrap().as_secs();

    utimes(&path, then, then).sync().unwrap();
    assert_eq!(secs(stat(&path).sync().unwrap().mtime), 1_000_000_000);

    utimes(&path, later, later).await.unwrap();
    assert_eq!(secs(stat(&path).await.unwrap().mtime), 1_000_086_400);

    lutimes(&link, then, then).await.unwrap();
    assert_eq!(secs(lstat(&link).await.unwrap().mtime), 1_000_000_000);
    assert_eq!(secs(stat(&path).sync().unwrap().mtime), 1_000_086_400);

    let missing = temp_dir.path().join("missing");
    let (blocking, suspending) = both(|| utimes(&missing, then, then)).await;
    assert_eq!(assert_same_error(blocking, suspending).kind(), io::ErrorKind::NotFound);
}

#[tokio::test]
async fn test_mkdtemp() {
    let temp_dir = TempDir::new().unwrap();
    let prefix = temp_dir.path().join("job-");

    let (blocking, suspending) = both(|| mkdtemp(&prefix)).await;
    let blocking = blocking.unwrap();
    let suspending = suspending.unwrap();
    assert_ne!(blocking, suspending);
    for created in [&blocking, &suspending] {
        assert!(created.is_dir());
        let name = created.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("job-"));
        assert_eq!(name.len(), 10);
    }

    let orphan = temp_dir.path().join("missing/job-");
    let (blocking, suspending) = both(|| mkdtemp(&orphan)).await;
    assert_eq!(assert_same_error(blocking, suspending).kind(), io::ErrorKind::NotFound);
}

#[tokio::test]
async fn test_independent_suspending_calls() {
    let temp_dir = TempDir::new().unwrap();
    let paths: Vec<PathBuf> = (0..16).map(|i| temp_dir.path().join(format!("f{}", i))).collect();

    let writes = paths
        .iter()
        .enumerate()
        .map(|(i, path)| write_file(path, format!("{}", i), WriteOptions::default()).into_future());
    for result in join_all(writes).await {
        result.unwrap();
    }

    let reads = paths.iter().map(|path| read_file(path, Encoding::Utf8).into_future());
    let contents = join_all(reads).await;
    for (i, content) in contents.into_iter().enumerate() {
        assert_eq!(content.unwrap().as_text(), Some(i.to_string().as_str()));
    }

    match readdir(temp_dir.path(), ReaddirOptions::default()).sync().unwrap() {
        Listing::Names(names) => assert_eq!(names.len(), 16),
        other => panic!("unexpected listing {:?}", other),
    }
}
