use std::ffi::OsString;
use std::fs::{FileType, Metadata};
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    File,
    Dir,
    Symlink,
    BlockDevice,
    CharDevice,
    Fifo,
    Socket,
    Unknown,
}

impl From<FileType> for FileKind {
    fn from(file_type: FileType) -> Self {
        if file_type.is_file() {
            FileKind::File
        } else if file_type.is_dir() {
            FileKind::Dir
        } else if file_type.is_symlink() {
            FileKind::Symlink
        } else if file_type.is_block_device() {
            FileKind::BlockDevice
        } else if file_type.is_char_device() {
            FileKind::CharDevice
        } else if file_type.is_fifo() {
            FileKind::Fifo
        } else if file_type.is_socket() {
            FileKind::Socket
        } else {
            FileKind::Unknown
        }
    }
}

/// Metadata snapshot returned by `stat` and `lstat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    pub dev: u64,
    pub ino: u64,
    /// File type and permission bits, as in `st_mode`.
    pub mode: u32,
    pub nlink: u64,
    pub uid: u32,
    pub gid: u32,
    pub rdev: u64,
    pub size: u64,
    pub blksize: u64,
    pub blocks: u64,
    pub atime: SystemTime,
    pub mtime: SystemTime,
    pub ctime: SystemTime,
    /// `None` where the filesystem does not record creation time.
    pub birthtime: Option<SystemTime>,
    pub kind: FileKind,
}

impl Stats {
    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Dir
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == FileKind::Symlink
    }

    pub fn is_block_device(&self) -> bool {
        self.kind == FileKind::BlockDevice
    }

    pub fn is_char_device(&self) -> bool {
        self.kind == FileKind::CharDevice
    }

    pub fn is_fifo(&self) -> bool {
        self.kind == FileKind::Fifo
    }

    pub fn is_socket(&self) -> bool {
        self.kind == FileKind::Socket
    }

    /// Permission bits only.
    pub fn permissions(&self) -> u32 {
        self.mode & 0o7777
    }
}

impl From<Metadata> for Stats {
    fn from(metadata: Metadata) -> Self {
        Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
            mode: metadata.mode(),
            nlink: metadata.nlink(),
            uid: metadata.uid(),
            gid: metadata.gid(),
            rdev: metadata.rdev(),
            size: metadata.size(),
            blksize: metadata.blksize(),
            blocks: metadata.blocks(),
            atime: timestamp(metadata.atime(), metadata.atime_nsec()),
            mtime: timestamp(metadata.mtime(), metadata.mtime_nsec()),
            ctime: timestamp(metadata.ctime(), metadata.ctime_nsec()),
            birthtime: metadata.created().ok(),
            kind: metadata.file_type().into(),
        }
    }
}

fn timestamp(secs: i64, nsec: i64) -> SystemTime {
    let nanos = Duration::from_nanos(nsec.clamp(0, 999_999_999) as u64);
    if secs >= 0 {
        UNIX_EPOCH + Duration::from_secs(secs as u64) + nanos
    } else {
        UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs()) + nanos
    }
}

/// A typed directory entry, returned when listing `with_file_types`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dirent {
    pub name: OsString,
    /// Directory that was listed to find this entry.
    pub parent_path: PathBuf,
    pub kind: FileKind,
}

impl Dirent {
    pub fn path(&self) -> PathBuf {
        self.parent_path.join(&self.name)
    }

    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Dir
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == FileKind::Symlink
    }
}

/// Result of `read_file`: text when an encoding was requested, bytes otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContents {
    Bytes(Vec<u8>),
    Text(String),
}

impl FileContents {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FileContents::Bytes(bytes) => bytes,
            FileContents::Text(text) => text.as_bytes(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FileContents::Text(text) => Some(text),
            FileContents::Bytes(_) => None,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            FileContents::Bytes(bytes) => bytes,
            FileContents::Text(text) => text.into_bytes(),
        }
    }
}

/// Result of `readdir`, shaped by its options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    Names(Vec<String>),
    /// Names as raw bytes, when no encoding was requested.
    Raw(Vec<Vec<u8>>),
    Entries(Vec<Dirent>),
}

impl Listing {
    pub fn len(&self) -> usize {
        match self {
            Listing::Names(names) => names.len(),
            Listing::Raw(names) => names.len(),
            Listing::Entries(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
