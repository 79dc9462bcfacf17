//! Order fulfillment status.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Fulfillment status of an order.
///
/// `pending -> processing -> shipped -> delivered`, with `cancelled` reachable
/// only before shipment. `delivered` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Orders can be cancelled until they ship.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    /// Online payment is only taken before shipment, never after cancellation.
    #[must_use]
    pub const fn accepts_online_payment(self) -> bool {
        self.is_cancellable()
    }

    /// Shipped and delivered orders may only be deleted by an admin.
    #[must_use]
    pub const fn is_fulfilled(self) -> bool {
        matches!(self, Self::Shipped | Self::Delivered)
    }

    const fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Processing => 1,
            Self::Shipped => 2,
            Self::Delivered => 3,
            Self::Cancelled => 4,
        }
    }

    /// Whether an admin may move an order from `self` to `next`.
    ///
    /// Forward moves may skip states. Re-setting the current status is allowed
    /// so the tracking number can be changed on its own.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        if self.rank() == next.rank() {
            return !matches!(self, Self::Cancelled);
        }

        if self.is_terminal() {
            return false;
        }

        match next {
            Self::Cancelled => self.is_cancellable(),
            _ => next.rank() > self.rank(),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown order status `{0}`")]
pub struct UnknownOrderStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownOrderStatus(s.to_string()))
    }
}
