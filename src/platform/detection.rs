use std::fmt;

/// Host platform as reported by the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
    pub bits: Option<u8>,
}

impl Platform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>, bits: Option<u8>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
            bits,
        }
    }

    /// Detect the current platform
    pub fn detect() -> Self {
        Self {
            os: Self::detect_os(),
            arch: Self::detect_arch(),
            bits: Self::detect_bits(),
        }
    }

    /// Replace detected values with explicit ones where given
    pub fn with_overrides(
        mut self,
        os: Option<String>,
        arch: Option<String>,
        bits: Option<u8>,
    ) -> Self {
        if let Some(os) = os {
            self.os = os;
        }
        if let Some(arch) = arch {
            self.arch = arch;
            // The host word size says nothing about another architecture
            self.bits = None;
        }
        if bits.is_some() {
            self.bits = bits;
        }
        self
    }

    fn detect_os() -> String {
        #[cfg(target_os = "macos")]
        {
            "macos".to_string()
        }
        #[cfg(target_os = "linux")]
        {
            "linux".to_string()
        }
        #[cfg(target_os = "windows")]
        {
            "windows".to_string()
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            std::env::consts::OS.to_string()
        }
    }

    fn detect_arch() -> String {
        #[cfg(target_arch = "x86_64")]
        {
            "x86_64".to_string()
        }
        #[cfg(target_arch = "aarch64")]
        {
            "aarch64".to_string()
        }
        #[cfg(target_arch = "arm")]
        {
            "arm".to_string()
        }
        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64", target_arch = "arm")))]
        {
            std::env::consts::ARCH.to_string()
        }
    }

    fn detect_bits() -> Option<u8> {
        #[cfg(target_pointer_width = "64")]
        {
            Some(64)
        }
        #[cfg(target_pointer_width = "32")]
        {
            Some(32)
        }
        #[cfg(not(any(target_pointer_width = "64", target_pointer_width = "32")))]
        {
            None
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bits {
            Some(bits) => write!(f, "{}/{} ({}-bit)", self.os, self.arch, bits),
            None => write!(f, "{}/{}", self.os, self.arch),
        }
    }
}

/// Trait for platform detection (useful for testing)
pub trait PlatformDetector: Send + Sync {
    fn detect(&self) -> Platform;
}

/// Default platform detector using compile-time detection
pub struct DefaultPlatformDetector;

impl PlatformDetector for DefaultPlatformDetector {
    fn detect(&self) -> Platform {
        Platform::detect()
    }
}
