//! Blocking engine: every call completes on the calling thread.

use std::fs::{self, DirBuilder, File, Permissions};
use std::io::{self, Read, Write};
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use rustix::fs::{AtFlags, CWD};
use tracing::debug;

use super::{
    decode_contents, encode_data, forgive_missing, plan_rm, same_file, split_temp_prefix, temp_dir_path,
    timestamps, RmAction, Walk,
};
use crate::error::Result;
use crate::fs::{FileContents, FileKind, Listing, Stats};
use crate::options::{
    AccessMode, CopyMode, Data, MkdirOptions, OpenFlag, ReadOptions, ReaddirOptions, RmOptions, SymlinkType,
    WriteOptions,
};

pub fn read_file(path: &Path, options: ReadOptions) -> Result<FileContents> {
    let mut file = options.flag.open_options(0o666).open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(decode_contents(bytes, options.encoding))
}

pub fn write_file(path: &Path, data: &Data, options: WriteOptions) -> Result<()> {
    let bytes = encode_data(data, options.encoding)?;
    let mut file = options.flag.open_options(options.mode).open(path)?;
    file.write_all(&bytes)
}

pub fn unlink(path: &Path) -> Result<()> {
    fs::remove_file(path)
}

pub fn access(path: &Path, mode: AccessMode) -> Result<()> {
    rustix::fs::access(path, mode).map_err(Into::into)
}

pub fn stat(path: &Path) -> Result<Stats> {
    fs::metadata(path).map(Stats::from)
}

pub fn lstat(path: &Path) -> Result<Stats> {
    fs::symlink_metadata(path).map(Stats::from)
}

pub fn copy_file(src: &Path, dest: &Path, mode: CopyMode) -> Result<()> {
    let source = fs::metadata(src)?;
    // With EXCL the exclusive open below reports the existing destination.
    if !mode.contains(CopyMode::EXCL) && same_file(&source, fs::metadata(dest)) {
        debug!("copyFile: {:?} and {:?} are the same file", src, dest);
        return Ok(());
    }
    if mode.contains(CopyMode::FICLONE_FORCE) {
        return clone_file(src, dest, mode);
    }
    if mode.contains(CopyMode::EXCL) {
        let mut source = File::open(src)?;
        let permissions = source.metadata()?.permissions();
        let mut target = OpenFlag::WriteExclusive.open_options(0o666).open(dest)?;
        io::copy(&mut source, &mut target)?;
        return target.set_permissions(permissions);
    }
    fs::copy(src, dest).map(|_| ())
}

#[cfg(target_os = "linux")]
fn clone_file(src: &Path, dest: &Path, mode: CopyMode) -> Result<()> {
    let source = File::open(src)?;
    let flag = if mode.contains(CopyMode::EXCL) {
        OpenFlag::WriteExclusive
    } else {
        OpenFlag::Write
    };
    let target = flag.open_options(0o666).open(dest)?;
    rustix::fs::ioctl_ficlone(&target, &source)?;
    target.set_permissions(source.metadata()?.permissions())
}

#[cfg(not(target_os = "linux"))]
fn clone_file(_src: &Path, _dest: &Path, _mode: CopyMode) -> Result<()> {
    Err(io::Error::from_raw_os_error(libc::ENOTSUP))
}

pub fn rm(path: &Path, options: RmOptions) -> Result<()> {
    let kind = fs::symlink_metadata(path).map(|m| FileKind::from(m.file_type()));
    match plan_rm(kind, options)? {
        RmAction::Nothing => Ok(()),
        RmAction::RemoveFile => forgive_missing(fs::remove_file(path), options),
        RmAction::RemoveTree => forgive_missing(fs::remove_dir_all(path), options),
    }
}

pub fn mkdir(path: &Path, options: MkdirOptions) -> Result<Option<PathBuf>> {
    let mut builder = DirBuilder::new();
    builder.mode(options.mode);
    if !options.recursive {
        builder.create(path)?;
        return Ok(None);
    }
    let first = first_missing(path)?;
    builder.recursive(true).create(path)?;
    Ok(first)
}

/// The outermost ancestor of `path` (itself included) that does not exist yet.
fn first_missing(path: &Path) -> Result<Option<PathBuf>> {
    let mut first = None;
    for ancestor in path.ancestors().filter(|a| !a.as_os_str().is_empty()) {
        match fs::metadata(ancestor) {
            Ok(_) => break,
            Err(e) if e.kind() == io::ErrorKind::NotFound => first = Some(ancestor.to_path_buf()),
            Err(e) => return Err(e),
        }
    }
    Ok(first)
}

pub fn rename(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to)
}

pub fn readdir(path: &Path, options: ReaddirOptions) -> Result<Listing> {
    let mut walk = Walk::new(path, options);
    while let Some((dir, relative)) = walk.next_dir() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let kind = FileKind::from(entry.file_type()?);
            walk.push(&dir, &relative, entry.file_name(), kind);
        }
    }
    Ok(walk.finish())
}

pub fn realpath(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path)
}

pub fn readlink(path: &Path) -> Result<PathBuf> {
    fs::read_link(path)
}

pub fn symlink(target: &Path, path: &Path, _kind: Option<SymlinkType>) -> Result<()> {
    std::os::unix::fs::symlink(target, path)
}

pub fn chown(path: &Path, uid: u32, gid: u32) -> Result<()> {
    std::os::unix::fs::chown(path, Some(uid), Some(gid))
}

pub fn lchown(path: &Path, uid: u32, gid: u32) -> Result<()> {
    std::os::unix::fs::lchown(path, Some(uid), Some(gid))
}

pub fn chmod(path: &Path, mode: u32) -> Result<()> {
    fs::set_permissions(path, Permissions::from_mode(mode))
}

pub fn utimes(path: &Path, atime: SystemTime, mtime: SystemTime) -> Result<()> {
    rustix::fs::utimensat(CWD, path, &timestamps(atime, mtime), AtFlags::empty()).map_err(Into::into)
}

pub fn lutimes(path: &Path, atime: SystemTime, mtime: SystemTime) -> Result<()> {
    rustix::fs::utimensat(CWD, path, &timestamps(atime, mtime), AtFlags::SYMLINK_NOFOLLOW).map_err(Into::into)
}

pub fn mkdtemp(prefix: &Path) -> Result<PathBuf> {
    let (dir, stem) = split_temp_prefix(prefix);
    let created = tempfile::Builder::new()
        .prefix(&stem)
        .rand_bytes(6)
        .tempdir_in(&dir)?
        .keep();
    debug!("mkdtemp: created {:?}", created);
    Ok(temp_dir_path(prefix, &stem, &created))
}
