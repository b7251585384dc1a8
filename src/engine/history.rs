use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use crate::graph::screen_model::ScreenNr;

/// Run-scoped context threaded through detection and actions.
///
/// Created when a run starts and mutated every cycle. `past_screens` grows
/// by one entry per screen the runner acted on, and survives a failed run
/// as a trace of how far it got.
pub struct History {
    pub app_name: String,
    pub version: String,
    pub overwrite: bool,
    pub past_screens: Vec<ScreenNr>,
    extensions: Extensions,
}

impl History {
    pub fn new(app_name: &str, version: &str, overwrite: bool) -> Self {
        Self {
            app_name: app_name.to_string(),
            version: version.to_string(),
            overwrite,
            past_screens: Vec::new(),
            extensions: Extensions::default(),
        }
    }

    pub fn record_screen(&mut self, screen_nr: ScreenNr) {
        self.past_screens.push(screen_nr);
    }

    pub fn has_visited(&self, screen_nr: ScreenNr) -> bool {
        self.past_screens.contains(&screen_nr)
    }

    pub fn last_screen(&self) -> Option<ScreenNr> {
        self.past_screens.last().copied()
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("app_name", &self.app_name)
            .field("version", &self.version)
            .field("overwrite", &self.overwrite)
            .field("past_screens", &self.past_screens)
            .field("extensions", &self.extensions.len())
            .finish()
    }
}

/// Action-specific context, one value per Rust type.
#[derive(Default)]
pub struct Extensions {
    values: HashMap<TypeId, Box<dyn Any>>,
}

impl Extensions {
    /// Store a value, returning the previous value of the same type.
    pub fn insert<T: Any>(&mut self, value: T) -> Option<T> {
        self.values
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    pub fn get<T: Any>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.values
            .get_mut(&TypeId::of::<T>())
            .and_then(|value| value.downcast_mut::<T>())
    }

    /// Get the value of type `T`, inserting `T::default()` first if absent.
    pub fn get_or_default<T: Any + Default>(&mut self) -> &mut T {
        self.values
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(T::default()))
            .downcast_mut::<T>()
            .expect("extension stored under its own TypeId")
    }

    pub fn remove<T: Any>(&mut self) -> Option<T> {
        self.values
            .remove(&TypeId::of::<T>())
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

