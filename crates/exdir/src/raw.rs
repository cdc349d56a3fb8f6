//! Handles to unmanaged ("raw") directories.

use std::ops::Deref;

use crate::object::Object;

/// A handle to a plain directory that has opted out of the typed-object
/// conventions: no metadata record, no attributes, no payload. Raw
/// directories are unmanaged blob space under a store.
#[derive(Clone, Debug)]
pub struct Raw {
    object: Object,
}

impl Raw {
    pub(crate) fn new(object: Object) -> Self {
        Self { object }
    }
}

impl Deref for Raw {
    type Target = Object;

    fn deref(&self) -> &Object {
        &self.object
    }
}
