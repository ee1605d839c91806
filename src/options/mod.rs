//! Argument shapes shared by both engines.
//!
//! These are passed through unchanged to whichever engine runs the call.

mod encoding;
mod flags;

pub use encoding::Encoding;
pub use flags::OpenFlag;
pub use rustix::fs::Access as AccessMode;

use bitflags::bitflags;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// `None` returns raw bytes.
    pub encoding: Option<Encoding>,
    pub flag: OpenFlag,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            encoding: None,
            flag: OpenFlag::Read,
        }
    }
}

impl From<Encoding> for ReadOptions {
    fn from(encoding: Encoding) -> Self {
        Self {
            encoding: Some(encoding),
            ..Self::default()
        }
    }
}

impl From<Option<Encoding>> for ReadOptions {
    fn from(encoding: Option<Encoding>) -> Self {
        Self {
            encoding,
            ..Self::default()
        }
    }
}

/// What `write_file` writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Data {
    Bytes(Vec<u8>),
    /// Encoded with [`WriteOptions::encoding`] before writing.
    Text(String),
}

impl From<Vec<u8>> for Data {
    fn from(bytes: Vec<u8>) -> Self {
        Data::Bytes(bytes)
    }
}

impl From<&[u8]> for Data {
    fn from(bytes: &[u8]) -> Self {
        Data::Bytes(bytes.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Data {
    fn from(bytes: &[u8; N]) -> Self {
        Data::Bytes(bytes.to_vec())
    }
}

impl From<String> for Data {
    fn from(text: String) -> Self {
        Data::Text(text)
    }
}

impl From<&str> for Data {
    fn from(text: &str) -> Self {
        Data::Text(text.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    pub encoding: Encoding,
    /// Permission bits for a newly created file, before umask.
    pub mode: u32,
    pub flag: OpenFlag,
}

impl WriteOptions {
    pub fn with_flag(mut self, flag: OpenFlag) -> Self {
        self.flag = flag;
        self
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            encoding: Encoding::Utf8,
            mode: 0o666,
            flag: OpenFlag::Write,
        }
    }
}

impl From<Encoding> for WriteOptions {
    fn from(encoding: Encoding) -> Self {
        Self {
            encoding,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RmOptions {
    /// Remove directories and their contents.
    pub recursive: bool,
    /// Succeed when the path does not exist.
    pub force: bool,
}

impl RmOptions {
    pub fn recursive() -> Self {
        Self {
            recursive: true,
            force: false,
        }
    }

    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MkdirOptions {
    pub recursive: bool,
    pub mode: u32,
}

impl MkdirOptions {
    pub fn recursive() -> Self {
        Self {
            recursive: true,
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }
}

impl Default for MkdirOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            mode: 0o777,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaddirOptions {
    /// Encoding of returned names; `None` returns raw name bytes.
    /// Ignored when `with_file_types` is set.
    pub encoding: Option<Encoding>,
    pub with_file_types: bool,
    pub recursive: bool,
}

impl ReaddirOptions {
    pub fn with_file_types(mut self) -> Self {
        self.with_file_types = true;
        self
    }

    pub fn recursive(mut self) -> Self {
        self.recursive = true;
        self
    }
}

impl Default for ReaddirOptions {
    fn default() -> Self {
        Self {
            encoding: Some(Encoding::Utf8),
            with_file_types: false,
            recursive: false,
        }
    }
}

impl From<Option<Encoding>> for ReaddirOptions {
    fn from(encoding: Option<Encoding>) -> Self {
        Self {
            encoding,
            ..Self::default()
        }
    }
}

impl From<Encoding> for ReaddirOptions {
    fn from(encoding: Encoding) -> Self {
        Some(encoding).into()
    }
}

bitflags! {
    /// Behaviour of `copy_file`.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct CopyMode: u32 {
        /// Fail if the destination already exists.
        const EXCL = 1;
        /// Try a copy-on-write clone; copying normally is fine.
        const FICLONE = 2;
        /// Require a copy-on-write clone.
        const FICLONE_FORCE = 4;
    }
}

/// Link kind hint for `symlink`. Only meaningful on Windows; ignored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymlinkType {
    File,
    Dir,
    Junction,
}
