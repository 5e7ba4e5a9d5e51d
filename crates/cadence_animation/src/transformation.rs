//! Animation transformations and animatable properties
//!
//! Transformations are plain closures. The scheduler stores every flavour
//! behind the same boxed, fallible signature.

use crate::status::AnimationStatus;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Failure reported by a fallible transformation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransformError(String);

impl TransformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A stateful transformation: `(old value, status) -> new value`
pub trait AnimationTransformation<T>: FnMut(T, &AnimationStatus) -> T + Send {}

impl<T, F> AnimationTransformation<T> for F where F: FnMut(T, &AnimationStatus) -> T + Send {}

pub(crate) type Transformation =
    Box<dyn FnMut(&AnimationStatus) -> Result<(), TransformError> + Send>;
pub(crate) type Predicate = Box<dyn FnMut(&AnimationStatus) -> bool + Send>;
pub(crate) type FinishHook = Box<dyn FnOnce(&AnimationStatus) + Send>;
pub(crate) type ValidityCheck = Box<dyn Fn() -> bool + Send>;

/// A value holder an animation reads from and writes to
///
/// This is the seam to the host's observable/property system.
pub trait Property<T>: Send + Sync {
    fn get(&self) -> T;
    fn set(&self, value: T);
}

impl<T: Clone + Send> Property<T> for Mutex<T> {
    fn get(&self) -> T {
        self.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set(&self, value: T) {
        *self.lock().unwrap_or_else(PoisonError::into_inner) = value;
    }
}

/// Turn a stateful transformation over a property into a tick callback
pub(crate) fn bind_property<T, P, F>(property: Arc<P>, mut transformation: F) -> Transformation
where
    T: 'static,
    P: Property<T> + ?Sized + 'static,
    F: AnimationTransformation<T> + 'static,
{
    Box::new(move |status: &AnimationStatus| {
        let next = transformation(property.get(), status);
        property.set(next);
        Ok(())
    })
}

/// Combine two continuation predicates; both must hold
pub(crate) fn both(mut first: Predicate, mut second: Predicate) -> Predicate {
    Box::new(move |status: &AnimationStatus| first(status) && second(status))
}
