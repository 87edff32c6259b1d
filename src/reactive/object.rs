//! Reactive objects - string-keyed state whose fields are signals.
//!
//! Every field of a [`ReactiveObject`] is a spark-signals `Signal`, so reading a
//! field inside an effect subscribes that effect, and writing the field
//! re-runs it. A separate shape signal tracks key addition and removal, which
//! is what `has()`, `keys()` and lookups of missing keys depend on.
//!
//! Two wrapping depths exist:
//! - [`reactive`] (deep): nested JSON objects become nested reactive objects,
//!   so a write to `state.user.name` notifies readers of `state.user`.
//! - [`shallow_reactive`]: only top-level replacement is tracked. Nested
//!   values are stored as plain JSON.
//!
//! Arrays are stored as plain values in both modes. Replace the whole array
//! to trigger an update.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use spark_signals::{signal, Signal};

// =============================================================================
// Types
// =============================================================================

/// How far down a reactive object wraps its values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Depth {
    Deep,
    Shallow,
}

/// A single field: either a plain value or a nested reactive object (deep mode).
#[derive(Clone, PartialEq)]
enum Field {
    Value(Value),
    Object(ReactiveObject),
}

impl Field {
    fn wrap(value: Value, depth: Depth) -> Self {
        match (depth, value) {
            (Depth::Deep, Value::Object(map)) => {
                Field::Object(ReactiveObject::from_map(map, Depth::Deep))
            }
            (_, value) => Field::Value(value),
        }
    }

    fn into_value(self) -> Value {
        match self {
            Field::Value(value) => value,
            Field::Object(object) => object.to_value(),
        }
    }
}

/// A reactive, insertion-ordered, string-keyed object.
///
/// Cloning is cheap and yields a handle to the same object.
#[derive(Clone)]
pub struct ReactiveObject {
    inner: Rc<ObjectInner>,
}

struct ObjectInner {
    depth: Depth,
    fields: RefCell<IndexMap<String, Signal<Field>>>,
    shape: Signal<u64>,
    shape_version: Cell<u64>,
}

/// Wrap a map as a deeply reactive object.
pub fn reactive(map: Map<String, Value>) -> ReactiveObject {
    ReactiveObject::from_map(map, Depth::Deep)
}

/// Wrap a map as a shallow reactive object.
pub fn shallow_reactive(map: Map<String, Value>) -> ReactiveObject {
    ReactiveObject::from_map(map, Depth::Shallow)
}

// =============================================================================
// ReactiveObject
// =============================================================================

impl ReactiveObject {
    /// Build a reactive object from a JSON map.
    pub fn from_map(map: Map<String, Value>, depth: Depth) -> Self {
        let fields = map
            .into_iter()
            .map(|(key, value)| (key, signal(Field::wrap(value, depth))))
            .collect();

        Self {
            inner: Rc::new(ObjectInner {
                depth,
                fields: RefCell::new(fields),
                shape: signal(0),
                shape_version: Cell::new(0),
            }),
        }
    }

    /// Wrapping depth of this object.
    pub fn depth(&self) -> Depth {
        self.inner.depth
    }

    /// Whether `key` exists. Tracks key addition and removal.
    pub fn has(&self, key: &str) -> bool {
        self.track_shape();
        self.inner.fields.borrow().contains_key(key)
    }

    /// Read a field as a JSON value.
    ///
    /// Nested reactive objects are snapshotted, which subscribes to every
    /// nested field.
    pub fn get(&self, key: &str) -> Option<Value> {
        let Some(field) = self.field(key) else {
            self.track_shape();
            return None;
        };
        Some(field.get().into_value())
    }

    /// Get the nested reactive object stored at `key`.
    ///
    /// Returns `None` for missing keys, for non-object values, and for every
    /// key of a shallow object.
    pub fn get_object(&self, key: &str) -> Option<ReactiveObject> {
        let Some(field) = self.field(key) else {
            self.track_shape();
            return None;
        };
        match field.get() {
            Field::Object(object) => Some(object),
            Field::Value(_) => None,
        }
    }

    /// Write a field, inserting it if missing.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let field = Field::wrap(value.into(), self.inner.depth);

        // Borrow is released before the write so effects re-run by it can read us
        if let Some(existing) = self.field(key) {
            existing.set(field);
            return;
        }

        self.inner
            .fields
            .borrow_mut()
            .insert(key.to_string(), signal(field));
        self.bump_shape();
    }

    /// Remove a field. Returns whether it existed.
    pub fn remove(&self, key: &str) -> bool {
        let removed = self.inner.fields.borrow_mut().shift_remove(key);
        let Some(removed) = removed else {
            return false;
        };

        // Readers of the old field re-run and find the key gone
        removed.set(Field::Value(Value::Null));
        self.bump_shape();
        true
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.track_shape();
        self.inner.fields.borrow().keys().cloned().collect()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.track_shape();
        self.inner.fields.borrow().len()
    }

    /// Whether the object has no fields.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot the whole object (recursively) as a JSON value.
    pub fn to_value(&self) -> Value {
        self.track_shape();
        let fields: Vec<(String, Signal<Field>)> = self
            .inner
            .fields
            .borrow()
            .iter()
            .map(|(key, field)| (key.clone(), field.clone()))
            .collect();

        Value::Object(
            fields
                .into_iter()
                .map(|(key, field)| (key, field.get().into_value()))
                .collect(),
        )
    }

    /// Whether two handles point at the same object.
    pub fn ptr_eq(&self, other: &ReactiveObject) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn field(&self, key: &str) -> Option<Signal<Field>> {
        self.inner.fields.borrow().get(key).cloned()
    }

    fn track_shape(&self) {
        let _ = self.inner.shape.get();
    }

    fn bump_shape(&self) {
        let version = self.inner.shape_version.get() + 1;
        self.inner.shape_version.set(version);
        self.inner.shape.set(version);
    }
}

impl PartialEq for ReactiveObject {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ReactiveObject {
    // Untracked: only the key list is read, never a field signal.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveObject")
            .field("depth", &self.inner.depth)
            .field("keys", &self.inner.fields.borrow().keys().collect::<Vec<_>>())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
