//! User-facing notifications.
//!
//! Every cart operation ends in exactly one [`Notification`]. The store hands
//! it to a [`Notifier`]; what the user sees is decided here, in
//! [`Notification::for_outcome`], so the store itself only deals in typed
//! results.
//!
//! Messages are the storefront's own (Portuguese) toast texts.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::error::CartError;
use crate::store::{CartChange, CartOperation};

/// Toast texts shown to the user.
pub mod messages {
    pub const PRODUCT_ADDED: &str = "Produto adicionado com sucesso!";
    pub const ADD_FAILED: &str = "Erro na adição do produto";
    pub const PRODUCT_REMOVED: &str = "Produto removido com sucesso!";
    pub const REMOVE_FAILED: &str = "Erro na remoção do produto";
    pub const AMOUNT_CHANGED: &str = "Quantidade alterada no carrinho!";
    pub const UPDATE_FAILED: &str = "Erro na alteração de quantidade do produto";
    pub const OUT_OF_STOCK: &str = "Quantidade solicitada fora de estoque";
}

/// How a notification should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Whether this severity reports a failed operation.
    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Error)
    }

    /// Lowercase label, e.g. for log fields or CLI output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub severity: Severity,
    pub message: &'static str,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Create a notification stamped with the current time.
    #[must_use]
    pub fn new(severity: Severity, message: &'static str) -> Self {
        Self {
            severity,
            message,
            created_at: Utc::now(),
        }
    }

    /// Translate an operation's outcome into what the user is told.
    ///
    /// `operation` is the operation that produced the result. When adding a
    /// product already in the cart the store reports the outcome as
    /// [`CartOperation::UpdateAmount`], since that path decided it.
    #[must_use]
    pub fn for_outcome(operation: CartOperation, outcome: &Result<CartChange, CartError>) -> Self {
        match outcome {
            Ok(CartChange::Added { .. }) => Self::new(Severity::Success, messages::PRODUCT_ADDED),
            Ok(CartChange::Removed { .. }) => {
                Self::new(Severity::Warning, messages::PRODUCT_REMOVED)
            }
            Ok(CartChange::AmountChanged { .. }) => {
                Self::new(Severity::Info, messages::AMOUNT_CHANGED)
            }
            Err(CartError::OutOfStock { .. }) => Self::new(Severity::Error, messages::OUT_OF_STOCK),
            Err(_) => Self::new(
                Severity::Error,
                match operation {
                    CartOperation::Add => messages::ADD_FAILED,
                    CartOperation::Remove => messages::REMOVE_FAILED,
                    CartOperation::UpdateAmount => messages::UPDATE_FAILED,
                },
            ),
        }
    }
}

/// Receives notifications. Fire-and-forget: implementations must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Fans notifications out to any number of subscribers.
///
/// Subscribers only see notifications sent after they subscribe. Sending
/// with no subscribers drops the notification.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: broadcast::Sender<Notification>,
}

impl ChannelNotifier {
    /// Create a notifier whose subscribers can lag by up to `capacity`
    /// notifications before missing some.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Receive every notification sent from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for ChannelNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        // Err only means nobody is listening
        let _ = self.sender.send(notification);
    }
}
