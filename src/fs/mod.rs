//! The operation catalog.
//!
//! Every operation exists twice: as a `static` [`DualFn`] taking an argument
//! tuple, and as a function with ordinary arguments returning a [`DualCall`].
//! Await the call to run it on tokio, or call `.sync()` to run it on the
//! current thread:
//!
//! ```no_run
//! # async fn demo() -> std::io::Result<()> {
//! use dualfs::fs;
//! use dualfs::options::{MkdirOptions, WriteOptions};
//!
//! fs::mkdir("out/logs", MkdirOptions::recursive()).await?;
//! fs::write_file("out/logs/today", "started", WriteOptions::default()).sync()?;
//! fs::access("out/logs/today", None).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Both forms reach the host filesystem with the same arguments and report
//! its errors unchanged.

mod metadata;
#[cfg(test)]
mod tests;

pub use metadata::{Dirent, FileContents, FileKind, Listing, Stats};

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use futures::future::FutureExt;

use crate::dual::{DualCall, DualFn, Impls};
use crate::engine::{blocking, suspending};
use crate::options::{
    AccessMode, CopyMode, Data, MkdirOptions, OpenFlag, ReadOptions, ReaddirOptions, RmOptions, SymlinkType,
    WriteOptions,
};

pub type PathArgs = (PathBuf,);
pub type ReadFileArgs = (PathBuf, ReadOptions);
pub type WriteFileArgs = (PathBuf, Data, WriteOptions);
pub type AccessArgs = (PathBuf, AccessMode);
pub type CopyFileArgs = (PathBuf, PathBuf, CopyMode);
pub type RmArgs = (PathBuf, RmOptions);
pub type MkdirArgs = (PathBuf, MkdirOptions);
pub type RenameArgs = (PathBuf, PathBuf);
pub type ReaddirArgs = (PathBuf, ReaddirOptions);
pub type SymlinkArgs = (PathBuf, PathBuf, Option<SymlinkType>);
pub type ChownArgs = (PathBuf, u32, u32);
pub type ChmodArgs = (PathBuf, u32);
pub type UtimesArgs = (PathBuf, SystemTime, SystemTime);

/// Reads a whole file. Returns text if an encoding is given, bytes otherwise.
pub static READ_FILE: DualFn<ReadFileArgs, FileContents> = DualFn::new(
    "readFile",
    Impls {
        blocking: |(path, options): ReadFileArgs| blocking::read_file(&path, options),
        suspending: |(path, options): ReadFileArgs| suspending::read_file(path, options).boxed(),
    },
);

/// Writes bytes or text, creating or truncating the file per the open flag.
pub static WRITE_FILE: DualFn<WriteFileArgs, ()> = DualFn::new(
    "writeFile",
    Impls {
        blocking: |(path, data, options): WriteFileArgs| blocking::write_file(&path, &data, options),
        suspending: |(path, data, options): WriteFileArgs| suspending::write_file(path, data, options).boxed(),
    },
);

pub static UNLINK: DualFn<PathArgs, ()> = DualFn::new(
    "unlink",
    Impls {
        blocking: |(path,): PathArgs| blocking::unlink(&path),
        suspending: |(path,): PathArgs| suspending::unlink(path).boxed(),
    },
);

/// Succeeds if the path exists and the caller has the requested permissions.
pub static ACCESS: DualFn<AccessArgs, ()> = DualFn::new(
    "access",
    Impls {
        blocking: |(path, mode): AccessArgs| blocking::access(&path, mode),
        suspending: |(path, mode): AccessArgs| suspending::access(path, mode).boxed(),
    },
);

pub static STAT: DualFn<PathArgs, Stats> = DualFn::new(
    "stat",
    Impls {
        blocking: |(path,): PathArgs| blocking::stat(&path),
        suspending: |(path,): PathArgs| suspending::stat(path).boxed(),
    },
);

/// Like [`STAT`], but describes a trailing symlink itself.
pub static LSTAT: DualFn<PathArgs, Stats> = DualFn::new(
    "lstat",
    Impls {
        blocking: |(path,): PathArgs| blocking::lstat(&path),
        suspending: |(path,): PathArgs| suspending::lstat(path).boxed(),
    },
);

pub static COPY_FILE: DualFn<CopyFileArgs, ()> = DualFn::new(
    "copyFile",
    Impls {
        blocking: |(src, dest, mode): CopyFileArgs| blocking::copy_file(&src, &dest, mode),
        suspending: |(src, dest, mode): CopyFileArgs| suspending::copy_file(src, dest, mode).boxed(),
    },
);

pub static RM: DualFn<RmArgs, ()> = DualFn::new(
    "rm",
    Impls {
        blocking: |(path, options): RmArgs| blocking::rm(&path, options),
        suspending: |(path, options): RmArgs| suspending::rm(path, options).boxed(),
    },
);

/// Creates a directory. When recursive, yields the first directory created.
pub static MKDIR: DualFn<MkdirArgs, Option<PathBuf>> = DualFn::new(
    "mkdir",
    Impls {
        blocking: |(path, options): MkdirArgs| blocking::mkdir(&path, options),
        suspending: |(path, options): MkdirArgs| suspending::mkdir(path, options).boxed(),
    },
);

pub static RENAME: DualFn<RenameArgs, ()> = DualFn::new(
    "rename",
    Impls {
        blocking: |(from, to): RenameArgs| blocking::rename(&from, &to),
        suspending: |(from, to): RenameArgs| suspending::rename(from, to).boxed(),
    },
);

pub static READDIR: DualFn<ReaddirArgs, Listing> = DualFn::new(
    "readdir",
    Impls {
        blocking: |(path, options): ReaddirArgs| blocking::readdir(&path, options),
        suspending: |(path, options): ReaddirArgs| suspending::readdir(path, options).boxed(),
    },
);

pub static REALPATH: DualFn<PathArgs, PathBuf> = DualFn::new(
    "realpath",
    Impls {
        blocking: |(path,): PathArgs| blocking::realpath(&path),
        suspending: |(path,): PathArgs| suspending::realpath(path).boxed(),
    },
);

pub static READLINK: DualFn<PathArgs, PathBuf> = DualFn::new(
    "readlink",
    Impls {
        blocking: |(path,): PathArgs| blocking::readlink(&path),
        suspending: |(path,): PathArgs| suspending::readlink(path).boxed(),
    },
);

pub static SYMLINK: DualFn<SymlinkArgs, ()> = DualFn::new(
    "symlink",
    Impls {
        blocking: |(target, path, kind): SymlinkArgs| blocking::symlink(&target, &path, kind),
        suspending: |(target, path, kind): SymlinkArgs| suspending::symlink(target, path, kind).boxed(),
    },
);

pub static CHOWN: DualFn<ChownArgs, ()> = DualFn::new(
    "chown",
    Impls {
        blocking: |(path, uid, gid): ChownArgs| blocking::chown(&path, uid, gid),
        suspending: |(path, uid, gid): ChownArgs| suspending::chown(path, uid, gid).boxed(),
    },
);

pub static LCHOWN: DualFn<ChownArgs, ()> = DualFn::new(
    "lchown",
    Impls {
        blocking: |(path, uid, gid): ChownArgs| blocking::lchown(&path, uid, gid),
        suspending: |(path, uid, gid): ChownArgs| suspending::lchown(path, uid, gid).boxed(),
    },
);

pub static CHMOD: DualFn<ChmodArgs, ()> = DualFn::new(
    "chmod",
    Impls {
        blocking: |(path, mode): ChmodArgs| blocking::chmod(&path, mode),
        suspending: |(path, mode): ChmodArgs| suspending::chmod(path, mode).boxed(),
    },
);

pub static UTIMES: DualFn<UtimesArgs, ()> = DualFn::new(
    "utimes",
    Impls {
        blocking: |(path, atime, mtime): UtimesArgs| blocking::utimes(&path, atime, mtime),
        suspending: |(path, atime, mtime): UtimesArgs| suspending::utimes(path, atime, mtime).boxed(),
    },
);

pub static LUTIMES: DualFn<UtimesArgs, ()> = DualFn::new(
    "lutimes",
    Impls {
        blocking: |(path, atime, mtime): UtimesArgs| blocking::lutimes(&path, atime, mtime),
        suspending: |(path, atime, mtime): UtimesArgs| suspending::lutimes(path, atime, mtime).boxed(),
    },
);

/// Creates `<prefix>XXXXXX` with six random characters and returns its path.
pub static MKDTEMP: DualFn<PathArgs, PathBuf> = DualFn::new(
    "mkdtemp",
    Impls {
        blocking: |(prefix,): PathArgs| blocking::mkdtemp(&prefix),
        suspending: |(prefix,): PathArgs| suspending::mkdtemp(prefix).boxed(),
    },
);

/// Whether the path exists. Never fails: any error from `access` means no.
pub static EXISTS: DualFn<PathArgs, bool> = DualFn::compose("exists", |mode, (path,): PathArgs| {
    async move { Ok(access(path, AccessMode::EXISTS).run(mode).await.is_ok()) }.boxed()
});

/// Appends to a file, creating it if needed.
///
/// An append flag in the options (`ax`, `as`, `a+`, ...) is kept; any other
/// flag becomes `a`.
pub static APPEND_FILE: DualFn<WriteFileArgs, ()> =
    DualFn::compose("appendFile", |mode, (path, data, options): WriteFileArgs| {
        let options = if options.flag.is_append() {
            options
        } else {
            options.with_flag(OpenFlag::Append)
        };
        WRITE_FILE.bind((path, data, options)).run(mode)
    });

pub fn read_file(path: impl AsRef<Path>, options: impl Into<ReadOptions>) -> DualCall<ReadFileArgs, FileContents> {
    READ_FILE.bind((path.as_ref().to_path_buf(), options.into()))
}

pub fn write_file(
    path: impl AsRef<Path>,
    data: impl Into<Data>,
    options: impl Into<WriteOptions>,
) -> DualCall<WriteFileArgs, ()> {
    WRITE_FILE.bind((path.as_ref().to_path_buf(), data.into(), options.into()))
}

pub fn append_file(
    path: impl AsRef<Path>,
    data: impl Into<Data>,
    options: impl Into<WriteOptions>,
) -> DualCall<WriteFileArgs, ()> {
    APPEND_FILE.bind((path.as_ref().to_path_buf(), data.into(), options.into()))
}

pub fn unlink(path: impl AsRef<Path>) -> DualCall<PathArgs, ()> {
    UNLINK.bind((path.as_ref().to_path_buf(),))
}

/// Checks `path` against `mode`; `None` only checks that it exists.
pub fn access(path: impl AsRef<Path>, mode: impl Into<Option<AccessMode>>) -> DualCall<AccessArgs, ()> {
    let mode = mode.into().unwrap_or(AccessMode::EXISTS);
    ACCESS.bind((path.as_ref().to_path_buf(), mode))
}

pub fn exists(path: impl AsRef<Path>) -> DualCall<PathArgs, bool> {
    EXISTS.bind((path.as_ref().to_path_buf(),))
}

pub fn stat(path: impl AsRef<Path>) -> DualCall<PathArgs, Stats> {
    STAT.bind((path.as_ref().to_path_buf(),))
}

pub fn lstat(path: impl AsRef<Path>) -> DualCall<PathArgs, Stats> {
    LSTAT.bind((path.as_ref().to_path_buf(),))
}

pub fn copy_file(src: impl AsRef<Path>, dest: impl AsRef<Path>, mode: CopyMode) -> DualCall<CopyFileArgs, ()> {
    COPY_FILE.bind((src.as_ref().to_path_buf(), dest.as_ref().to_path_buf(), mode))
}

pub use self::copy_file as cp;

pub fn rm(path: impl AsRef<Path>, options: RmOptions) -> DualCall<RmArgs, ()> {
    RM.bind((path.as_ref().to_path_buf(), options))
}

pub fn mkdir(path: impl AsRef<Path>, options: MkdirOptions) -> DualCall<MkdirArgs, Option<PathBuf>> {
    MKDIR.bind((path.as_ref().to_path_buf(), options))
}

pub fn rename(from: impl AsRef<Path>, to: impl AsRef<Path>) -> DualCall<RenameArgs, ()> {
    RENAME.bind((from.as_ref().to_path_buf(), to.as_ref().to_path_buf()))
}

pub fn readdir(path: impl AsRef<Path>, options: impl Into<ReaddirOptions>) -> DualCall<ReaddirArgs, Listing> {
    READDIR.bind((path.as_ref().to_path_buf(), options.into()))
}

pub fn realpath(path: impl AsRef<Path>) -> DualCall<PathArgs, PathBuf> {
    REALPATH.bind((path.as_ref().to_path_buf(),))
}

pub fn readlink(path: impl AsRef<Path>) -> DualCall<PathArgs, PathBuf> {
    READLINK.bind((path.as_ref().to_path_buf(),))
}

/// Creates `path` as a symlink pointing at `target`.
pub fn symlink(
    target: impl AsRef<Path>,
    path: impl AsRef<Path>,
    kind: Option<SymlinkType>,
) -> DualCall<SymlinkArgs, ()> {
    SYMLINK.bind((target.as_ref().to_path_buf(), path.as_ref().to_path_buf(), kind))
}

pub fn chown(path: impl AsRef<Path>, uid: u32, gid: u32) -> DualCall<ChownArgs, ()> {
    CHOWN.bind((path.as_ref().to_path_buf(), uid, gid))
}

pub fn lchown(path: impl AsRef<Path>, uid: u32, gid: u32) -> DualCall<ChownArgs, ()> {
    LCHOWN.bind((path.as_ref().to_path_buf(), uid, gid))
}

pub fn chmod(path: impl AsRef<Path>, mode: u32) -> DualCall<ChmodArgs, ()> {
    CHMOD.bind((path.as_ref().to_path_buf(), mode))
}

pub fn utimes(path: impl AsRef<Path>, atime: SystemTime, mtime: SystemTime) -> DualCall<UtimesArgs, ()> {
    UTIMES.bind((path.as_ref().to_path_buf(), atime, mtime))
}

pub fn lutimes(path: impl AsRef<Path>, atime: SystemTime, mtime: SystemTime) -> DualCall<UtimesArgs, ()> {
    LUTIMES.bind((path.as_ref().to_path_buf(), atime, mtime))
}

pub fn mkdtemp(prefix: impl AsRef<Path>) -> DualCall<PathArgs, PathBuf> {
    MKDTEMP.bind((prefix.as_ref().to_path_buf(),))
}
