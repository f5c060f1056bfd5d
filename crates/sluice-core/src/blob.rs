//! Type-erased named storage cells.
//!
//! A blob holds at most one value of a caller-chosen concrete type. Blobs
//! are owned by the [`crate::Workspace`]; operators hold shared handles
//! resolved at construction time and access payloads through the typed
//! guards below. Type confusion is an explicit, checked error, never
//! undefined behavior.

use crate::{Error, Result};
use std::any::Any;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A blob shared between the workspace and the operators bound to it.
///
/// The workspace keeps blobs alive for the whole execution scope; the
/// handle guarantees the "resolved pointer stays valid for the operator's
/// lifetime" invariant without raw pointers.
pub type SharedBlob = Arc<RwLock<Blob>>;

/// Type-erased mutable container holding exactly one value, or nothing.
#[derive(Default)]
pub struct Blob {
    value: Option<Box<dyn Any + Send + Sync>>,
    type_name: Option<&'static str>,
}

impl Blob {
    /// Create an empty blob.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether the blob currently holds no value.
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// Runtime type test; false for an empty blob.
    pub fn is_type<T: 'static>(&self) -> bool {
        matches!(&self.value, Some(v) if v.is::<T>())
    }

    /// The type name of the stored payload, for diagnostics.
    pub fn stored_type_name(&self) -> &'static str {
        self.type_name.unwrap_or("<empty>")
    }

    /// Borrow the contained value as `T`.
    ///
    /// Fails with a type-mismatch error naming the stored type when the
    /// payload is not a `T` (or the blob is empty).
    pub fn get<T: 'static>(&self) -> Result<&T> {
        self.value
            .as_ref()
            .and_then(|v| v.downcast_ref::<T>())
            .ok_or_else(|| {
                Error::type_mismatch(format!(
                    "blob holds {} but {} was requested",
                    self.stored_type_name(),
                    std::any::type_name::<T>()
                ))
            })
    }

    /// Typed mutable access, allocating a default `T` if the blob does not
    /// already hold one. An existing payload of a different type is
    /// replaced.
    pub fn get_mut_or_default<T: Default + Send + Sync + 'static>(&mut self) -> &mut T {
        if !self.is_type::<T>() {
            let boxed: Box<dyn Any + Send + Sync> = Box::new(T::default());
            self.value = Some(boxed);
            self.type_name = Some(std::any::type_name::<T>());
        }
        self.value
            .as_mut()
            .and_then(|v| v.downcast_mut::<T>())
            .expect("payload checked or replaced above")
    }

    /// Replace the payload with `value`.
    pub fn set<T: Send + Sync + 'static>(&mut self, value: T) -> &mut T {
        let boxed: Box<dyn Any + Send + Sync> = Box::new(value);
        self.value = Some(boxed);
        self.type_name = Some(std::any::type_name::<T>());
        self.value
            .as_mut()
            .and_then(|v| v.downcast_mut::<T>())
            .expect("payload just stored")
    }
}

/// Read guard exposing a shared blob's payload as `&T`.
///
/// The payload type is verified while the lock is first held, so `Deref`
/// cannot fail afterwards.
pub struct BlobReadGuard<'a, T: 'static> {
    guard: RwLockReadGuard<'a, Blob>,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: 'static> BlobReadGuard<'a, T> {
    pub(crate) fn new(guard: RwLockReadGuard<'a, Blob>) -> Result<Self> {
        guard.get::<T>()?;
        Ok(Self {
            guard,
            _marker: PhantomData,
        })
    }
}

impl<T: 'static> Deref for BlobReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.guard
            .get::<T>()
            .expect("type checked when the guard was taken")
    }
}

/// Write guard exposing a shared blob's payload as `&mut T`,
/// allocating-or-reusing the payload on construction.
pub struct BlobWriteGuard<'a, T: Default + Send + Sync + 'static> {
    guard: RwLockWriteGuard<'a, Blob>,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Default + Send + Sync + 'static> BlobWriteGuard<'a, T> {
    pub(crate) fn new(mut guard: RwLockWriteGuard<'a, Blob>) -> Self {
        guard.get_mut_or_default::<T>();
        Self {
            guard,
            _marker: PhantomData,
        }
    }
}

impl<T: Default + Send + Sync + 'static> Deref for BlobWriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.guard
            .get::<T>()
            .expect("payload installed when the guard was taken")
    }
}

impl<T: Default + Send + Sync + 'static> DerefMut for BlobWriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.guard.get_mut_or_default::<T>()
    }
}
