use std::fmt;

/// Operating system families the descriptor knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    MacOs,
    Linux,
}

impl OsFamily {
    /// Parse a host-reported OS name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "macos" | "darwin" | "osx" => Some(Self::MacOs),
            "linux" => Some(Self::Linux),
            _ => None,
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MacOs => write!(f, "macos"),
            Self::Linux => write!(f, "linux"),
        }
    }
}

/// CPU architecture families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86_64,
    Arm,
}

impl Arch {
    /// Parse a host-reported architecture name (case-insensitive).
    ///
    /// Returns the family plus the word size the name implies, if any:
    /// `aarch64` is a 64-bit arm, `armv7l` a 32-bit one.
    pub fn parse(s: &str) -> Option<(Self, Option<Bits>)> {
        match s.trim().to_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Some((Self::X86_64, Some(Bits::B64))),
            "aarch64" | "arm64" => Some((Self::Arm, Some(Bits::B64))),
            "arm" | "armv6l" | "armv7" | "armv7l" => Some((Self::Arm, Some(Bits::B32))),
            _ => None,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X86_64 => write!(f, "x86_64"),
            Self::Arm => write!(f, "arm"),
        }
    }
}

/// Word size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bits {
    B32,
    B64,
}

impl Bits {
    pub fn from_u8(bits: u8) -> Option<Self> {
        match bits {
            32 => Some(Self::B32),
            64 => Some(Self::B64),
            _ => None,
        }
    }
}

impl fmt::Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::B32 => write!(f, "32"),
            Self::B64 => write!(f, "64"),
        }
    }
}

/// Lookup key of one descriptor entry.
///
/// `bits: None` means the entry accepts any word size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlatformKey {
    pub os: OsFamily,
    pub arch: Arch,
    pub bits: Option<Bits>,
}

impl PlatformKey {
    pub const fn new(os: OsFamily, arch: Arch, bits: Option<Bits>) -> Self {
        Self { os, arch, bits }
    }

    /// Whether a concrete platform falls under this key
    pub fn matches(&self, os: OsFamily, arch: Arch, bits: Option<Bits>) -> bool {
        if self.os != os || self.arch != arch {
            return false;
        }
        match self.bits {
            None => true,
            Some(required) => bits == Some(required),
        }
    }

    /// Whether some concrete platform would match both keys
    pub fn overlaps(&self, other: &PlatformKey) -> bool {
        if self.os != other.os || self.arch != other.arch {
            return false;
        }
        match (self.bits, other.bits) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bits {
            Some(bits) => write!(f, "{}/{} ({}-bit)", self.os, self.arch, bits),
            None => write!(f, "{}/{}", self.os, self.arch),
        }
    }
}
