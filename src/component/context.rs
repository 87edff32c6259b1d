//! Render Context - one read/write view over a component's state and props.
//!
//! Lookup precedence is fixed: state shadows props. Failures are soft:
//!
//! | Access            | Key in state | Key in props only     | Key nowhere     |
//! |-------------------|--------------|-----------------------|-----------------|
//! | `get`             | state value  | prop value            | warn, `None`    |
//! | `set`             | write state  | warn, write dropped   | warn, no write  |
//!
//! Attrs never pass through the context.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::warn;

use crate::reactive::ReactiveObject;

/// Result of a write through the render context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetOutcome {
    /// The state field was written.
    Written,
    /// The key is a parent-owned prop; nothing was written.
    RejectedProp,
    /// The key exists neither in state nor in props; nothing was written.
    Missing,
}

/// Execution context handed to render functions and lifecycle hooks.
///
/// Reads go through reactive objects, so a read inside a render job makes
/// the job depend on that key.
#[derive(Clone)]
pub struct RenderContext {
    component: Rc<str>,
    state: ReactiveObject,
    props: ReactiveObject,
}

impl RenderContext {
    pub(crate) fn new(component: Rc<str>, state: ReactiveObject, props: ReactiveObject) -> Self {
        Self { component, state, props }
    }

    /// Look `key` up in state, then in props.
    pub fn get(&self, key: &str) -> Option<Value> {
        if self.state.has(key) {
            return self.state.get(key);
        }
        if self.props.has(key) {
            return self.props.get(key);
        }

        warn!(component = %self.component, key, "property does not exist on render context");
        None
    }

    /// Write `key` in state. Props are read-only from here.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> SetOutcome {
        if self.state.has(key) {
            self.state.set(key, value);
            return SetOutcome::Written;
        }
        if self.props.has(key) {
            warn!(
                component = %self.component,
                key,
                "child component cannot mutate parent-owned prop"
            );
            return SetOutcome::RejectedProp;
        }

        warn!(component = %self.component, key, "property does not exist on render context");
        SetOutcome::Missing
    }

    /// Whether `key` resolves through the context.
    pub fn has(&self, key: &str) -> bool {
        self.state.has(key) || self.props.has(key)
    }

    pub fn component_name(&self) -> &str {
        &self.component
    }
}

impl fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("component", &self.component)
            .field("state", &self.state)
            .field("props", &self.props)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{reactive, shallow_reactive};
    use serde_json::{json, Map};

    fn context(state: Value, props: Value) -> RenderContext {
        let as_map = |value: Value| value.as_object().cloned().unwrap_or_else(Map::new);
        RenderContext::new(
            Rc::from("Badge"),
            reactive(as_map(state)),
            shallow_reactive(as_map(props)),
        )
    }

    #[test]
    fn test_state_shadows_props() {
        let ctx = context(json!({ "title": "from state" }), json!({ "title": "from props" }));
        assert_eq!(ctx.get("title"), Some(json!("from state")));

        assert_eq!(ctx.set("title", "changed"), SetOutcome::Written);
        assert_eq!(ctx.get("title"), Some(json!("changed")));
    }

    #[test]
    fn test_prop_read_falls_through() {
        let ctx = context(json!({ "count": 0 }), json!({ "msg": "hi" }));
        assert_eq!(ctx.get("msg"), Some(json!("hi")));
        assert!(ctx.has("msg"));
    }

    #[test]
    fn test_prop_write_is_rejected() {
        let ctx = context(json!({}), json!({ "msg": "hi" }));

        assert_eq!(ctx.set("msg", "x"), SetOutcome::RejectedProp);
        assert_eq!(ctx.get("msg"), Some(json!("hi")));
    }

    #[test]
    fn test_unknown_key_is_soft() {
        let ctx = context(json!({ "count": 0 }), json!({ "msg": "hi" }));

        assert_eq!(ctx.get("nope"), None);
        assert_eq!(ctx.set("nope", 1), SetOutcome::Missing);

        // Nothing was added anywhere
        assert!(!ctx.has("nope"));
        assert_eq!(ctx.get("count"), Some(json!(0)));
        assert_eq!(ctx.get("msg"), Some(json!("hi")));
    }

    #[test]
    fn test_null_state_value_still_shadows() {
        let ctx = context(json!({ "msg": null }), json!({ "msg": "hi" }));
        assert_eq!(ctx.get("msg"), Some(Value::Null));
    }
}
