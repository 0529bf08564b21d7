//! Driver descriptors.
//!
//! A driver names a format and states which operations `geoshp` can perform on
//! it: inspecting a dataset's schema (info), reading features (read), or
//! writing features (write).

use std::fmt;

/// Support status for a specific driver operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportStatus {
    /// The operation is implemented.
    Supported,
    /// The operation is not supported by the driver.
    NotSupported,
    /// The operation is planned for a future release.
    Planned,
}

impl SupportStatus {
    /// Returns `true` if the operation is implemented.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        matches!(self, SupportStatus::Supported)
    }

    /// Returns `true` if the operation is supported or planned.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self, SupportStatus::NotSupported)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            SupportStatus::Supported => "Supported",
            SupportStatus::NotSupported => "Not Supported",
            SupportStatus::Planned => "Planned",
        }
    }
}

/// Operation a driver may be asked to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Info,
    Read,
    Write,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Info => "info",
            Operation::Read => "reading",
            Operation::Write => "writing",
        })
    }
}

/// Per-operation support of a driver.
#[derive(Debug, Clone, Copy)]
pub struct DriverCapabilities {
    pub info: SupportStatus,
    pub read: SupportStatus,
    pub write: SupportStatus,
}

impl DriverCapabilities {
    #[must_use]
    pub fn status(&self, operation: Operation) -> SupportStatus {
        match operation {
            Operation::Info => self.info,
            Operation::Read => self.read,
            Operation::Write => self.write,
        }
    }

    /// Returns `true` if at least one operation is supported or planned.
    #[must_use]
    pub fn has_any_support(&self) -> bool {
        self.info.is_available() || self.read.is_available() || self.write.is_available()
    }

    /// Returns `true` if at least one operation is implemented.
    #[must_use]
    pub fn has_supported_operation(&self) -> bool {
        self.info.is_supported() || self.read.is_supported() || self.write.is_supported()
    }
}

/// Format driver definition.
#[derive(Debug, Clone)]
pub struct Driver {
    /// Short name used on the command line (e.g. `"GeoJSON"`).
    pub short_name: &'static str,
    /// Descriptive name for display.
    pub long_name: &'static str,
    pub capabilities: DriverCapabilities,
}

impl Driver {
    #[must_use]
    pub const fn new(
        short_name: &'static str,
        long_name: &'static str,
        info: SupportStatus,
        read: SupportStatus,
        write: SupportStatus,
    ) -> Self {
        Self {
            short_name,
            long_name,
            capabilities: DriverCapabilities { info, read, write },
        }
    }

    #[must_use]
    pub fn supports(&self, operation: Operation) -> bool {
        self.capabilities.status(operation).is_supported()
    }
}
