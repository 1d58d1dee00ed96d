//! Interest masks for readiness registration.

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign};

/// Which readiness conditions a registration asks to be told about.
///
/// Masks combine with `|`:
///
/// ```
/// use crosswire_core::poll::Interest;
///
/// let interest = Interest::READABLE | Interest::WRITABLE;
/// assert!(interest.is_readable());
/// assert!(interest.is_writable());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Interest(u8);

impl Interest {
    /// Empty mask.
    pub const NONE: Self = Self(0);

    /// Read readiness.
    pub const READABLE: Self = Self(1 << 0);

    /// Write readiness.
    pub const WRITABLE: Self = Self(1 << 1);

    /// Error conditions on the handle.
    pub const ERROR: Self = Self(1 << 2);

    /// Peer hangup.
    pub const HUP: Self = Self(1 << 3);

    /// The usual mask for a connected socket.
    pub const SOCKET: Self =
        Self(Self::READABLE.0 | Self::WRITABLE.0 | Self::ERROR.0 | Self::HUP.0);

    /// True if this mask includes every flag of `other`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// True for the empty mask.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if read readiness is requested.
    #[must_use]
    pub const fn is_readable(self) -> bool {
        self.contains(Self::READABLE)
    }

    /// True if write readiness is requested.
    #[must_use]
    pub const fn is_writable(self) -> bool {
        self.contains(Self::WRITABLE)
    }

    /// True if error conditions are requested.
    #[must_use]
    pub const fn is_error(self) -> bool {
        self.contains(Self::ERROR)
    }

    /// True if peer hangup is requested.
    #[must_use]
    pub const fn is_hup(self) -> bool {
        self.contains(Self::HUP)
    }
}

impl BitOr for Interest {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Interest {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Interest {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for Interest {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl fmt::Display for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (flag, name) in [
            (Self::READABLE, "READABLE"),
            (Self::WRITABLE, "WRITABLE"),
            (Self::ERROR, "ERROR"),
            (Self::HUP, "HUP"),
        ] {
            if self.contains(flag) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        if first {
            write!(f, "NONE")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_and_query() {
        let both = Interest::READABLE | Interest::WRITABLE;
        assert!(both.is_readable());
        assert!(both.is_writable());
        assert!(!both.is_hup());
        assert!(both.contains(Interest::READABLE));
        assert!(!both.contains(Interest::SOCKET));
    }

    #[test]
    fn test_empty_mask() {
        assert!(Interest::NONE.is_empty());
        assert!(!Interest::READABLE.is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            (Interest::READABLE | Interest::HUP).to_string(),
            "READABLE|HUP"
        );
        assert_eq!(Interest::NONE.to_string(), "NONE");
    }
}
