//! Reusable scratch buffers for integrators.
//!
//! Every integrator keeps the temporary matrices and vectors of its quadrature loop in a
//! [`Scratch`]. Whether those buffers persist between calls is governed by a [`ScratchPolicy`].
use crate::Real;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::fmt::{Debug, Formatter};
use thread_local::ThreadLocal;

/// Determines how an integrator obtains its scratch buffers.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScratchPolicy {
    /// Buffers are owned by the integrator and reused (and resized on demand) across calls.
    ///
    /// Each thread gets its own set of buffers, so a shared integrator may still be used
    /// concurrently from several threads.
    #[default]
    Reuse,
    /// Fresh buffers are allocated for every call.
    Fresh,
}

/// Buffers that can be created in an empty state.
pub trait EmptyBuffer {
    fn empty() -> Self;
}

impl<T: Real> EmptyBuffer for DMatrix<T> {
    fn empty() -> Self {
        DMatrix::zeros(0, 0)
    }
}

impl<T: Real> EmptyBuffer for DVector<T> {
    fn empty() -> Self {
        DVector::zeros(0)
    }
}

/// Defines a struct of scratch buffers with a `Default` impl that creates empty buffers.
///
/// Every field must be a `DMatrix` or `DVector` over the scalar type `T`.
#[macro_export]
macro_rules! define_workspace {
    ($(#[$meta:meta])* $vis:vis struct $name:ident { $($field:ident : $kind:ident),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug)]
        $vis struct $name<T: $crate::Real> {
            $($field: $crate::nalgebra::$kind<T>,)*
        }

        impl<T: $crate::Real> Default for $name<T> {
            fn default() -> Self {
                Self {
                    $($field: $crate::workspace::EmptyBuffer::empty(),)*
                }
            }
        }
    };
}

/// Scratch buffers of type `W`, handed out according to a [`ScratchPolicy`].
pub struct Scratch<W: Send> {
    policy: ScratchPolicy,
    buffers: ThreadLocal<RefCell<W>>,
}

impl<W: Send> Debug for Scratch<W> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scratch")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<W: Send + Default> Default for Scratch<W> {
    fn default() -> Self {
        Self::with_policy(ScratchPolicy::default())
    }
}

impl<W: Send + Default> Scratch<W> {
    pub fn with_policy(policy: ScratchPolicy) -> Self {
        Self {
            policy,
            buffers: ThreadLocal::new(),
        }
    }

    pub fn policy(&self) -> ScratchPolicy {
        self.policy
    }

    /// Changes the policy, releasing any buffers held so far.
    pub fn set_policy(&mut self, policy: ScratchPolicy) {
        self.policy = policy;
        self.buffers.clear();
    }

    /// Runs `f` with exclusive access to a set of scratch buffers.
    ///
    /// With [`ScratchPolicy::Reuse`] the calling thread's buffers are used. If they are already
    /// borrowed further up the call stack (an integrator that ends up calling itself), temporary
    /// buffers are used instead.
    pub fn with<R>(&self, f: impl FnOnce(&mut W) -> R) -> R {
        match self.policy {
            ScratchPolicy::Fresh => f(&mut W::default()),
            ScratchPolicy::Reuse => {
                let cell = self.buffers.get_or_default();
                match cell.try_borrow_mut() {
                    Ok(mut ws) => f(&mut ws),
                    Err(_) => f(&mut W::default()),
                }
            }
        }
    }
}
