//! # Systems
//!
//! Per-tick logic. Two flavors:
//! - [`System`]: synchronous, gets `&mut World`
//! - [`AsyncSystem`]: returns a boxed future, gets `&SharedWorld`
//!
//! Higher `priority` runs first. Ties run in registration order.

use std::any::{type_name, Any};

use futures::future::BoxFuture;

use crate::ecs::World;
use crate::error::SystemResult;
use crate::sync::SharedWorld;

/// Per-tick information handed to every system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickContext {
    /// 1-based tick counter of the world.
    pub tick: u64,
    /// Seconds elapsed since the previous tick, as passed by the caller.
    pub delta_time: f32,
}

/// Last path segment of a type name, without generic arguments.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Synchronous per-tick logic.
///
/// # Example
///
/// ```rust,ignore
/// struct Movement;
///
/// impl System for Movement {
///     fn priority(&self) -> i32 {
///         10
///     }
///
///     fn update(&mut self, world: &mut World, tick: TickContext) -> SystemResult {
///         for (_, (pos, vel)) in world.iter_view_mut::<Position>() { ... }
///         Ok(())
///     }
/// }
/// ```
pub trait System: Send + 'static {
    /// Name used for timings and error reports.
    fn name(&self) -> &str {
        short_type_name::<Self>()
    }

    /// Default priority used by `World::add_system`.
    fn priority(&self) -> i32 {
        0
    }

    /// Runs once, when the system is added to a world.
    fn setup(&mut self, world: &mut World) {
        let _ = world;
    }

    /// Runs once per tick.
    ///
    /// # Errors
    ///
    /// Any error aborts the rest of the tick.
    fn update(&mut self, world: &mut World, tick: TickContext) -> SystemResult;
}

/// Asynchronous per-tick logic.
///
/// Lock the world only around each mutation; the guard cannot be held across
/// an `.await` because the returned future must be `Send`.
///
/// # Example
///
/// ```rust,ignore
/// struct Fetcher;
///
/// impl AsyncSystem for Fetcher {
///     fn update<'a>(&'a mut self, world: &'a SharedWorld, _tick: TickContext) -> BoxFuture<'a, SystemResult> {
///         Box::pin(async move {
///             let reply = fetch_remote().await?;
///             world.lock().create_entity((reply,));
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait AsyncSystem: Send + 'static {
    /// Name used for timings and error reports.
    fn name(&self) -> &str {
        short_type_name::<Self>()
    }

    /// Default priority used by `World::add_async_system`.
    fn priority(&self) -> i32 {
        0
    }

    /// Runs once, before the first async tick that includes this system.
    fn setup<'a>(&'a mut self, world: &'a SharedWorld) -> BoxFuture<'a, ()> {
        let _ = world;
        Box::pin(async {})
    }

    /// Runs once per async tick.
    fn update<'a>(&'a mut self, world: &'a SharedWorld, tick: TickContext) -> BoxFuture<'a, SystemResult>;
}

/// Object-safe [`System`] with downcasting, for `World::get_system`.
pub(crate) trait AnySystem: System {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<S: System> AnySystem for S {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Object-safe [`AsyncSystem`] with downcasting.
pub(crate) trait AnyAsyncSystem: AsyncSystem {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<S: AsyncSystem> AnyAsyncSystem for S {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
