use std::any::Any;
use std::sync::Arc;

/// Opaque schema descriptors for a backend.
///
/// The provisioner never looks inside; the value travels verbatim to the
/// driver (for schema synchronization) and to the scratch database handle,
/// where the storage service can downcast it back.
#[derive(Clone, Default)]
pub struct Entities(Option<Arc<dyn Any + Send + Sync>>);

impl Entities {
    pub fn new<T: Any + Send + Sync>(entities: T) -> Self {
        Self(Some(Arc::new(entities)))
    }

    pub fn none() -> Self {
        Self(None)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_deref()?.downcast_ref()
    }
}

impl core::fmt::Debug for Entities {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Entities(..)"),
            None => f.write_str("Entities(None)"),
        }
    }
}
