//! # ECS Error Types
//!
//! All errors that can occur in the world, its queries and its scheduler.
//!
//! Every failing operation leaves the world consistent: liveness and
//! component presence are checked before any storage is touched.

use thiserror::Error;

use crate::ecs::Entity;

/// Boxed error type returned by system `update` implementations.
///
/// Any [`EcsError`] converts into it, so systems can use `?` on world calls.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in the ECS core.
#[derive(Error, Debug)]
pub enum EcsError {
    /// The handle's index/generation pair does not name a live entity.
    ///
    /// Covers never-issued handles as well as use-after-destroy.
    #[error("stale or invalid entity {entity}")]
    StaleHandle {
        /// The rejected handle.
        entity: Entity,
    },

    /// The entity is live but does not carry the requested component.
    #[error("entity {entity} does not have component {component}")]
    ComponentNotFound {
        /// The entity that was queried.
        entity: Entity,
        /// Type name of the missing component.
        component: &'static str,
    },

    /// A view was requested without naming any component type.
    #[error("a query must name at least one component type")]
    InvalidQuery,

    /// A system failed during a tick.
    ///
    /// Deferred destructions requested earlier in the tick have already been
    /// applied when this surfaces.
    #[error("system {system} failed: {source}")]
    System {
        /// Name of the failing system.
        system: String,
        /// The error the system returned.
        #[source]
        source: BoxError,
    },

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EcsError {
    /// Returns true for [`EcsError::StaleHandle`].
    #[must_use]
    pub const fn is_stale_handle(&self) -> bool {
        matches!(self, Self::StaleHandle { .. })
    }

    /// Returns true for [`EcsError::ComponentNotFound`].
    #[must_use]
    pub const fn is_component_not_found(&self) -> bool {
        matches!(self, Self::ComponentNotFound { .. })
    }
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;

/// Result type returned by system hooks.
pub type SystemResult = Result<(), BoxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let entity = Entity::new(3, 7);
        let stale = EcsError::StaleHandle { entity };
        assert_eq!(stale.to_string(), "stale or invalid entity 3v7");
        assert!(stale.is_stale_handle());

        let missing = EcsError::ComponentNotFound { entity, component: "Health" };
        assert_eq!(missing.to_string(), "entity 3v7 does not have component Health");
        assert!(missing.is_component_not_found());
    }

    #[test]
    fn test_system_error_keeps_source() {
        let source: BoxError = "boom".into();
        let err = EcsError::System { system: "Physics".to_string(), source };
        assert_eq!(err.to_string(), "system Physics failed: boom");
        assert!(std::error::Error::source(&err).is_some());
    }
}
