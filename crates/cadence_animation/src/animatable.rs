//! Property animations bundled as values
//!
//! An [`Animatable`] describes how a property should move without saying
//! which property. Widgets can hand them around as data and apply them to
//! a concrete [`Property`] later.

use crate::error::Result;
use crate::lifetime::LifeTime;
use crate::scheduler::SchedulerHandle;
use crate::status::AnimationStatus;
use crate::task::AnimationHandle;
use crate::transformation::{AnimationTransformation, Property};
use std::fmt;
use std::sync::Arc;

type BoxedTransformation<T> = Box<dyn FnMut(T, &AnimationStatus) -> T + Send>;

/// A lifetime, an optional starting value and a transformation
pub struct Animatable<T> {
    life: LifeTime,
    initial: Option<T>,
    transformation: BoxedTransformation<T>,
}

impl<T: Send + 'static> Animatable<T> {
    /// An animation that leaves the property untouched
    pub fn none() -> Self {
        Self {
            life: LifeTime::none(),
            initial: None,
            transformation: Box::new(|value: T, _: &AnimationStatus| value),
        }
    }

    /// Set the property to `value` once, on the next tick
    pub fn of(value: T) -> Self {
        Self {
            initial: Some(value),
            ..Self::none()
        }
    }

    /// Start from `value` and animate it with `transformation`
    pub fn with<F>(life: LifeTime, value: T, transformation: F) -> Self
    where
        F: AnimationTransformation<T> + 'static,
    {
        Self {
            life,
            initial: Some(value),
            transformation: Box::new(transformation),
        }
    }

    /// Animate from whatever the property holds when the animation starts
    pub fn from_life<F>(life: LifeTime, transformation: F) -> Self
    where
        F: AnimationTransformation<T> + 'static,
    {
        Self {
            life,
            initial: None,
            transformation: Box::new(transformation),
        }
    }

    pub fn life_time(&self) -> LifeTime {
        self.life
    }

    pub fn initial_state(&self) -> Option<&T> {
        self.initial.as_ref()
    }

    /// Register this animation against `property`
    ///
    /// The initial value, if any, is written on the first tick right before
    /// the transformation sees it.
    pub fn animate<P>(self, scheduler: &SchedulerHandle, property: &Arc<P>) -> Result<AnimationHandle>
    where
        P: Property<T> + ?Sized + 'static,
    {
        let Self {
            life,
            mut initial,
            mut transformation,
        } = self;

        scheduler
            .animate_for(life)
            .go_on(property, move |value: T, status: &AnimationStatus| {
                let value = initial.take().unwrap_or(value);
                transformation(value, status)
            })
    }
}

impl<T: Send + 'static> Default for Animatable<T> {
    fn default() -> Self {
        Self::none()
    }
}

impl<T: fmt::Debug> fmt::Debug for Animatable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animatable")
            .field("life", &self.life)
            .field("initial", &self.initial)
            .finish_non_exhaustive()
    }
}
