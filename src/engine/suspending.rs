//! Suspending engine: every call is a future driven by tokio.
//!
//! Calls `tokio::fs` provides are used directly. The rest are offloaded with
//! [`spawn_blocking`], the same way `tokio::fs` is built.

use std::fs::Permissions;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::time::SystemTime;

use tokio::fs::{self, DirBuilder, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::task::spawn_blocking;
use tracing::debug;

use super::{blocking, decode_contents, encode_data, forgive_missing, plan_rm, same_file, RmAction, Walk};
use crate::error::{DualError, Result};
use crate::fs::{FileContents, FileKind, Listing, Stats};
use crate::options::{
    AccessMode, CopyMode, Data, MkdirOptions, OpenFlag, ReadOptions, ReaddirOptions, RmOptions, SymlinkType,
    WriteOptions,
};

async fn asyncify<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) => Err(DualError::Background(e).into()),
    }
}

pub async fn read_file(path: PathBuf, options: ReadOptions) -> Result<FileContents> {
    let mut file = OpenOptions::from(options.flag.open_options(0o666)).open(&path).await?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).await?;
    Ok(decode_contents(bytes, options.encoding))
}

pub async fn write_file(path: PathBuf, data: Data, options: WriteOptions) -> Result<()> {
    let bytes = encode_data(&data, options.encoding)?;
    let mut file = OpenOptions::from(options.flag.open_options(options.mode)).open(&path).await?;
    file.write_all(&bytes).await?;
    // tokio files finish writes in the background; surface their errors here.
    file.flush().await
}

pub async fn unlink(path: PathBuf) -> Result<()> {
    fs::remove_file(path).await
}

pub async fn access(path: PathBuf, mode: AccessMode) -> Result<()> {
    asyncify(move || blocking::access(&path, mode)).await
}

pub async fn stat(path: PathBuf) -> Result<Stats> {
    fs::metadata(path).await.map(Stats::from)
}

pub async fn lstat(path: PathBuf) -> Result<Stats> {
    fs::symlink_metadata(path).await.map(Stats::from)
}

pub async fn copy_file(src: PathBuf, dest: PathBuf, mode: CopyMode) -> Result<()> {
    let source = fs::metadata(&src).await?;
    if !mode.contains(CopyMode::EXCL) && same_file(&source, fs::metadata(&dest).await) {
        debug!("copyFile: {:?} and {:?} are the same file", src, dest);
        return Ok(());
    }
    if mode.contains(CopyMode::FICLONE_FORCE) {
        return asyncify(move || blocking::copy_file(&src, &dest, mode)).await;
    }
    if mode.contains(CopyMode::EXCL) {
        let mut source = fs::File::open(&src).await?;
        let permissions = source.metadata().await?.permissions();
        let mut target = OpenOptions::from(OpenFlag::WriteExclusive.open_options(0o666))
            .open(&dest)
            .await?;
        tokio::io::copy(&mut source, &mut target).await?;
        target.flush().await?;
        return target.set_permissions(permissions).await;
    }
    fs::copy(src, dest).await.map(|_| ())
}

pub async fn rm(path: PathBuf, options: RmOptions) -> Result<()> {
    let kind = fs::symlink_metadata(&path)
        .await
        .map(|m| FileKind::from(m.file_type()));
    match plan_rm(kind, options)? {
        RmAction::Nothing => Ok(()),
        RmAction::RemoveFile => forgive_missing(fs::remove_file(&path).await, options),
        RmAction::RemoveTree => forgive_missing(fs::remove_dir_all(&path).await, options),
    }
}

pub async fn mkdir(path: PathBuf, options: MkdirOptions) -> Result<Option<PathBuf>> {
    let mut builder = DirBuilder::new();
    builder.mode(options.mode);
    if !options.recursive {
        builder.create(&path).await?;
        return Ok(None);
    }
    let first = first_missing(path.clone()).await?;
    builder.recursive(true).create(&path).await?;
    Ok(first)
}

async fn first_missing(path: PathBuf) -> Result<Option<PathBuf>> {
    let mut first = None;
    for ancestor in path.ancestors().filter(|a| !a.as_os_str().is_empty()) {
        match fs::metadata(ancestor).await {
            Ok(_) => break,
            Err(e) if e.kind() == io::ErrorKind::NotFound => first = Some(ancestor.to_path_buf()),
            Err(e) => return Err(e),
        }
    }
    Ok(first)
}

pub async fn rename(from: PathBuf, to: PathBuf) -> Result<()> {
    fs::rename(from, to).await
}

pub async fn readdir(path: PathBuf, options: ReaddirOptions) -> Result<Listing> {
    let mut walk = Walk::new(&path, options);
    while let Some((dir, relative)) = walk.next_dir() {
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let kind = FileKind::from(entry.file_type().await?);
            walk.push(&dir, &relative, entry.file_name(), kind);
        }
    }
    Ok(walk.finish())
}

pub async fn realpath(path: PathBuf) -> Result<PathBuf> {
    fs::canonicalize(path).await
}

pub async fn readlink(path: PathBuf) -> Result<PathBuf> {
    fs::read_link(path).await
}

pub async fn symlink(target: PathBuf, path: PathBuf, _kind: Option<SymlinkType>) -> Result<()> {
    fs::symlink(target, path).await
}

pub async fn chown(path: PathBuf, uid: u32, gid: u32) -> Result<()> {
    asyncify(move || blocking::chown(&path, uid, gid)).await
}

pub async fn lchown(path: PathBuf, uid: u32, gid: u32) -> Result<()> {
    asyncify(move || blocking::lchown(&path, uid, gid)).await
}

pub async fn chmod(path: PathBuf, mode: u32) -> Result<()> {
    fs::set_permissions(path, Permissions::from_mode(mode)).await
}

pub async fn utimes(path: PathBuf, atime: SystemTime, mtime: SystemTime) -> Result<()> {
    asyncify(move || blocking::utimes(&path, atime, mtime)).await
}

pub async fn lutimes(path: PathBuf, atime: SystemTime, mtime: SystemTime) -> Result<()> {
    asyncify(move || blocking::lutimes(&path, atime, mtime)).await
}

pub async fn mkdtemp(prefix: PathBuf) -> Result<PathBuf> {
    asyncify(move || blocking::mkdtemp(&prefix)).await
}
