//! Status enums for various entities.
//!
//! Payment codes and order statuses are backend-defined string enums that grow
//! over time, so both carry an `Other` variant instead of failing to decode.

use serde::{Deserialize, Serialize};

/// Settlement code reported by the backend's payment status endpoint.
///
/// Anything the client does not recognise decodes to [`PaymentCode::Other`]
/// and is treated as a failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentCode {
    Success,
    Pending,
    Failed,
    Other(String),
}

impl PaymentCode {
    /// The wire representation of this code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "PAYMENT_SUCCESS",
            Self::Pending => "PAYMENT_PENDING",
            Self::Failed => "PAYMENT_FAILED",
            Self::Other(code) => code,
        }
    }
}

impl From<String> for PaymentCode {
    fn from(code: String) -> Self {
        match code.as_str() {
            "PAYMENT_SUCCESS" => Self::Success,
            "PAYMENT_PENDING" => Self::Pending,
            "PAYMENT_FAILED" => Self::Failed,
            _ => Self::Other(code),
        }
    }
}

impl From<PaymentCode> for String {
    fn from(code: PaymentCode) -> Self {
        code.as_str().to_owned()
    }
}

impl std::fmt::Display for PaymentCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an order record.
///
/// Early statuses mirror the payment outcome (`PENDING`, `SUCCESS`, `FAILED`);
/// later ones track kitchen and delivery progress.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Pending,
    Success,
    Failed,
    Confirmed,
    Preparing,
    Shipped,
    Other(String),
}

impl OrderStatus {
    /// The wire representation of this status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Confirmed => "CONFIRMED",
            Self::Preparing => "PREPARING",
            Self::Shipped => "SHIPPED",
            Self::Other(status) => status,
        }
    }
}

impl From<String> for OrderStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "PENDING" => Self::Pending,
            "SUCCESS" => Self::Success,
            "FAILED" => Self::Failed,
            "CONFIRMED" => Self::Confirmed,
            "PREPARING" => Self::Preparing,
            "SHIPPED" => Self::Shipped,
            _ => Self::Other(status),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_owned()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role attached to a backend user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Owner,
    #[default]
    Customer,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Owner => write!(f, "owner"),
            Self::Customer => write!(f, "customer"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "customer" => Ok(Self::Customer),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatSender {
    /// The customer.
    User,
    /// The ordering assistant.
    Agent,
    /// A member of restaurant staff replying to an escalated chat.
    Human,
}

/// Status of a stored chat thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChatStatus {
    #[default]
    Open,
    Closed,
    Escalated,
}
