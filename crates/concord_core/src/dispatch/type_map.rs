//! Heterogeneous map keyed by the stored value's type.

use std::any::{Any, TypeId};
use std::collections::HashMap;

/// At most one value per type.
#[derive(Default)]
pub(crate) struct TypeMap {
    entries: HashMap<TypeId, Box<dyn Any + Send>>,
}

impl TypeMap {
    pub(crate) fn get<V: Any>(&self) -> Option<&V> {
        self.entries
            .get(&TypeId::of::<V>())
            .and_then(|entry| entry.downcast_ref())
    }

    pub(crate) fn get_mut<V: Any>(&mut self) -> Option<&mut V> {
        self.entries
            .get_mut(&TypeId::of::<V>())
            .and_then(|entry| entry.downcast_mut())
    }

    pub(crate) fn get_or_default<V: Any + Send + Default>(&mut self) -> &mut V {
        self.entries
            .entry(TypeId::of::<V>())
            .or_insert_with(|| Box::new(V::default()))
            .downcast_mut()
            .expect("entries are keyed by the TypeId of their own value")
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
