//! Error types for the invalidation router.

use crate::domain::route::SubscriberId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    #[error("Subscriber {0} is not connected")]
    UnknownSubscriber(SubscriberId),

    #[error("Subscriber {0} disconnected")]
    SinkClosed(SubscriberId),
}

pub type RouterResult<T> = Result<T, RouterError>;
