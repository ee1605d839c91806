use std::fmt;
use std::fs::OpenOptions;
use std::os::unix::fs::OpenOptionsExt;
use std::str::FromStr;

use crate::error::DualError;

/// How a file is opened, in the string-flag vocabulary (`"r"`, `"wx"`, `"a+"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenFlag {
    /// `r`
    Read,
    /// `rs`
    ReadSync,
    /// `r+`
    ReadWrite,
    /// `rs+`
    ReadWriteSync,
    /// `w`
    Write,
    /// `wx`
    WriteExclusive,
    /// `w+`
    WriteRead,
    /// `wx+`
    WriteReadExclusive,
    /// `a`
    Append,
    /// `ax`
    AppendExclusive,
    /// `as`
    AppendSync,
    /// `a+`
    AppendRead,
    /// `ax+`
    AppendReadExclusive,
    /// `as+`
    AppendReadSync,
}

impl OpenFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            OpenFlag::Read => "r",
            OpenFlag::ReadSync => "rs",
            OpenFlag::ReadWrite => "r+",
            OpenFlag::ReadWriteSync => "rs+",
            OpenFlag::Write => "w",
            OpenFlag::WriteExclusive => "wx",
            OpenFlag::WriteRead => "w+",
            OpenFlag::WriteReadExclusive => "wx+",
            OpenFlag::Append => "a",
            OpenFlag::AppendExclusive => "ax",
            OpenFlag::AppendSync => "as",
            OpenFlag::AppendRead => "a+",
            OpenFlag::AppendReadExclusive => "ax+",
            OpenFlag::AppendReadSync => "as+",
        }
    }

    pub fn is_append(self) -> bool {
        use OpenFlag::*;

        matches!(
            self,
            Append | AppendExclusive | AppendSync | AppendRead | AppendReadExclusive | AppendReadSync
        )
    }

    /// Open options for this flag, creating new files with `mode`.
    ///
    /// Both engines start from these: tokio's `OpenOptions` converts from std's.
    pub fn open_options(self, mode: u32) -> OpenOptions {
        use OpenFlag::*;

        let mut options = OpenOptions::new();
        options.mode(mode);
        match self {
            Read | ReadSync => {
                options.read(true);
            }
            ReadWrite | ReadWriteSync => {
                options.read(true).write(true);
            }
            Write | WriteExclusive | WriteRead | WriteReadExclusive => {
                options.write(true).truncate(true).create(true);
            }
            Append | AppendExclusive | AppendSync | AppendRead | AppendReadExclusive | AppendReadSync => {
                options.append(true).create(true);
            }
        }
        if matches!(self, WriteRead | WriteReadExclusive | AppendRead | AppendReadExclusive | AppendReadSync) {
            options.read(true);
        }
        if matches!(self, WriteExclusive | WriteReadExclusive | AppendExclusive | AppendReadExclusive) {
            options.create_new(true);
        }
        if matches!(self, ReadSync | ReadWriteSync | AppendSync | AppendReadSync) {
            options.custom_flags(libc::O_SYNC);
        }
        options
    }
}

impl Default for OpenFlag {
    fn default() -> Self {
        OpenFlag::Read
    }
}

impl fmt::Display for OpenFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OpenFlag {
    type Err = DualError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let flag = match s {
            "r" => OpenFlag::Read,
            "rs" | "sr" => OpenFlag::ReadSync,
            "r+" => OpenFlag::ReadWrite,
            "rs+" | "sr+" => OpenFlag::ReadWriteSync,
            "w" => OpenFlag::Write,
            "wx" | "xw" => OpenFlag::WriteExclusive,
            "w+" => OpenFlag::WriteRead,
            "wx+" | "xw+" => OpenFlag::WriteReadExclusive,
            "a" => OpenFlag::Append,
            "ax" | "xa" => OpenFlag::AppendExclusive,
            "as" | "sa" => OpenFlag::AppendSync,
            "a+" => OpenFlag::AppendRead,
            "ax+" | "xa+" => OpenFlag::AppendReadExclusive,
            "as+" | "sa+" => OpenFlag::AppendReadSync,
            _ => return Err(DualError::UnknownFlag(s.to_string())),
        };
        Ok(flag)
    }
}
