//! Per-deposit status codes as reported by the chains.

use std::fmt;

/// Status byte stored for each deposit of a [`TransferBatch`](crate::batch::TransferBatch).
///
/// Statuses travel as raw bytes so that unknown codes reported by a chain survive a round trip
/// through the relayer untouched. This enum names the codes the relayer reasons about.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepositStatus {
    /// No status has been recorded yet.
    None = 0,
    /// The deposit is waiting to be included in a batch.
    Pending = 1,
    /// The deposit is part of a batch that is being transferred.
    InProgress = 2,
    /// The deposit was executed on the destination chain.
    Executed = 3,
    /// The deposit was rejected and must be refunded on the chain it originated from.
    Rejected = 4,
}

impl DepositStatus {
    /// Returns the raw byte for this status.
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

impl From<DepositStatus> for u8 {
    fn from(value: DepositStatus) -> Self {
        value.as_byte()
    }
}

impl TryFrom<u8> for DepositStatus {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Pending),
            2 => Ok(Self::InProgress),
            3 => Ok(Self::Executed),
            4 => Ok(Self::Rejected),
            other => Err(other),
        }
    }
}

impl fmt::Display for DepositStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Executed => "executed",
            Self::Rejected => "rejected",
        };

        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_byte_conversion() {
        for status in [
            DepositStatus::None,
            DepositStatus::Pending,
            DepositStatus::InProgress,
            DepositStatus::Executed,
            DepositStatus::Rejected,
        ] {
            assert_eq!(DepositStatus::try_from(status.as_byte()), Ok(status));
        }

        assert_eq!(DepositStatus::Executed.as_byte(), 3);
        assert_eq!(DepositStatus::Rejected.as_byte(), 4);
        assert_eq!(DepositStatus::try_from(42), Err(42));
    }
}
