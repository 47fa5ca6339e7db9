//! # Framework Errors
//!
//! Errors raised by the plumbing between a [`ResourceClient`](crate::ResourceClient)
//! and its [`ResourceActor`](crate::ResourceActor). Entity-level failures travel
//! inside [`FrameworkError::EntityError`] and can be recovered with
//! [`FrameworkError::entity_error`].

/// Errors that can occur within the resource framework itself.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Entity error: {0}")]
    EntityError(Box<dyn std::error::Error + Send + Sync>),
}

impl FrameworkError {
    /// Downcasts an [`FrameworkError::EntityError`] to the entity's concrete error type.
    ///
    /// Returns `None` for plumbing errors or when the boxed error has another type.
    pub fn entity_error<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            FrameworkError::EntityError(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error, PartialEq)]
    #[error("out of stock")]
    struct OutOfStock;

    #[test]
    fn test_entity_error_downcast() {
        let err = FrameworkError::EntityError(Box::new(OutOfStock));
        assert_eq!(err.entity_error::<OutOfStock>(), Some(&OutOfStock));
        assert!(err.entity_error::<std::io::Error>().is_none());
        assert!(FrameworkError::ActorClosed.entity_error::<OutOfStock>().is_none());
    }
}
