//! The two engines every catalog entry delegates to.
//!
//! [`blocking`] runs on the calling thread (`std::fs`, `rustix`);
//! [`suspending`] runs on tokio (`tokio::fs`, `spawn_blocking` for the calls
//! tokio does not wrap). Argument interpretation that does not touch the
//! filesystem lives here so both engines share it.

pub mod blocking;
pub mod suspending;

use std::borrow::Cow;
use std::collections::VecDeque;
use std::ffi::{OsStr, OsString};
use std::fs::Metadata;
use std::io;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rustix::fs::Timestamps;
use rustix::time::Timespec;
use tracing::debug;

use crate::error::Result;
use crate::fs::{Dirent, FileContents, FileKind, Listing};
use crate::options::{Data, Encoding, ReaddirOptions, RmOptions};

pub(crate) fn decode_contents(bytes: Vec<u8>, encoding: Option<Encoding>) -> FileContents {
    match encoding {
        Some(encoding) => FileContents::Text(encoding.decode(&bytes)),
        None => FileContents::Bytes(bytes),
    }
}

pub(crate) fn encode_data(data: &Data, encoding: Encoding) -> Result<Cow<'_, [u8]>> {
    match data {
        Data::Bytes(bytes) => Ok(Cow::Borrowed(bytes.as_slice())),
        Data::Text(text) => Ok(Cow::Owned(encoding.encode(text)?)),
    }
}

/// Whether `dest` names the same inode as `src`.
///
/// Copying a file onto itself is a no-op; opening the destination first would
/// truncate the source.
pub(crate) fn same_file(src: &Metadata, dest: io::Result<Metadata>) -> bool {
    dest.is_ok_and(|dest| dest.dev() == src.dev() && dest.ino() == src.ino())
}

/// What `rm` should do once the target has been `lstat`ed.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum RmAction {
    Nothing,
    RemoveFile,
    RemoveTree,
}

pub(crate) fn plan_rm(kind: io::Result<FileKind>, options: RmOptions) -> Result<RmAction> {
    match kind {
        Ok(FileKind::Dir) if options.recursive => Ok(RmAction::RemoveTree),
        Ok(FileKind::Dir) => Err(io::Error::from_raw_os_error(libc::EISDIR)),
        Ok(_) => Ok(RmAction::RemoveFile),
        Err(e) if options.force && e.kind() == io::ErrorKind::NotFound => Ok(RmAction::Nothing),
        Err(e) => Err(e),
    }
}

/// Treats a vanished path as success under `force`.
pub(crate) fn forgive_missing(result: io::Result<()>, options: RmOptions) -> Result<()> {
    match result {
        Err(e) if options.force && e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[derive(Debug)]
struct WalkEntry {
    relative: PathBuf,
    parent: PathBuf,
    name: OsString,
    kind: FileKind,
}

/// Breadth-first directory traversal state shared by both engines' `readdir`.
///
/// Entries keep OS enumeration order within each directory; subdirectories
/// are visited in the order they were found. Symlinks are never descended.
#[derive(Debug)]
pub(crate) struct Walk {
    root: PathBuf,
    options: ReaddirOptions,
    pending: VecDeque<PathBuf>,
    entries: Vec<WalkEntry>,
}

impl Walk {
    pub(crate) fn new(root: &Path, options: ReaddirOptions) -> Self {
        let mut pending = VecDeque::new();
        pending.push_back(PathBuf::new());
        Self {
            root: root.to_path_buf(),
            options,
            pending,
            entries: Vec::new(),
        }
    }

    /// Next directory to list: its full path and its path relative to the root.
    pub(crate) fn next_dir(&mut self) -> Option<(PathBuf, PathBuf)> {
        let relative = self.pending.pop_front()?;
        let full = if relative.as_os_str().is_empty() {
            self.root.clone()
        } else {
            debug!("readdir: descending into {:?}", relative);
            self.root.join(&relative)
        };
        Some((full, relative))
    }

    pub(crate) fn push(&mut self, dir: &Path, relative_dir: &Path, name: OsString, kind: FileKind) {
        let relative = relative_dir.join(&name);
        if self.options.recursive && kind == FileKind::Dir {
            self.pending.push_back(relative.clone());
        }
        self.entries.push(WalkEntry {
            relative,
            parent: dir.to_path_buf(),
            name,
            kind,
        });
    }

    pub(crate) fn finish(self) -> Listing {
        if self.options.with_file_types {
            return Listing::Entries(
                self.entries
                    .into_iter()
                    .map(|entry| Dirent {
                        name: entry.name,
                        parent_path: entry.parent,
                        kind: entry.kind,
                    })
                    .collect(),
            );
        }
        match self.options.encoding {
            Some(encoding) => Listing::Names(
                self.entries
                    .iter()
                    .map(|entry| encoding.decode(entry.relative.as_os_str().as_bytes()))
                    .collect(),
            ),
            None => Listing::Raw(
                self.entries
                    .into_iter()
                    .map(|entry| entry.relative.into_os_string().into_vec())
                    .collect(),
            ),
        }
    }
}

/// Splits a `mkdtemp` prefix into the directory to create in and the name stem.
///
/// `"/tmp/foo-"` gives `("/tmp/", "foo-")`; `"foo-"` gives `(".", "foo-")`.
pub(crate) fn split_temp_prefix(prefix: &Path) -> (PathBuf, OsString) {
    let bytes = prefix.as_os_str().as_bytes();
    match bytes.iter().rposition(|&b| b == b'/') {
        Some(idx) => (
            PathBuf::from(OsStr::from_bytes(&bytes[..=idx])),
            OsStr::from_bytes(&bytes[idx + 1..]).to_os_string(),
        ),
        None => (PathBuf::from("."), prefix.as_os_str().to_os_string()),
    }
}

/// The path `mkdtemp` reports: the prefix as given plus the random suffix.
pub(crate) fn temp_dir_path(prefix: &Path, stem: &OsStr, created: &Path) -> PathBuf {
    let created_name = created.file_name().map(OsStr::as_bytes).unwrap_or_default();
    let suffix = created_name.strip_prefix(stem.as_bytes()).unwrap_or(created_name);
    let mut path = prefix.as_os_str().to_os_string();
    path.push(OsStr::from_bytes(suffix));
    PathBuf::from(path)
}

pub(crate) fn timestamps(atime: SystemTime, mtime: SystemTime) -> Timestamps {
    Timestamps {
        last_access: timespec(atime),
        last_modification: timespec(mtime),
    }
}

fn timespec(time: SystemTime) -> Timespec {
    match time.duration_since(UNIX_EPOCH) {
        Ok(since) => Timespec {
            tv_sec: since.as_secs() as _,
            tv_nsec: since.subsec_nanos() as _,
        },
        Err(err) => {
            // Before the epoch: floor the seconds, keep nanoseconds positive.
            let before = err.duration();
            let mut secs = -(before.as_secs() as i64);
            let mut nanos = i64::from(before.subsec_nanos());
            if nanos > 0 {
                secs -= 1;
                nanos = 1_000_000_000 - nanos;
            }
            Timespec {
                tv_sec: secs as _,
                tv_nsec: nanos as _,
            }
        }
    }
}
