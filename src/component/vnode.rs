//! Mount vnodes - what to mount, with which incoming properties.

use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};

use super::descriptor::ComponentDescriptor;
use super::instance::ComponentInstance;

/// Caller-provided description of a component to mount.
///
/// `component` is filled in by the mounter and is how callers reach the live
/// instance afterwards.
pub struct MountVNode<N: 'static> {
    pub component_type: Rc<ComponentDescriptor<N>>,
    pub props: Option<Map<String, Value>>,
    pub component: Option<Rc<ComponentInstance<N>>>,
}

impl<N: 'static> MountVNode<N> {
    pub fn new(component_type: Rc<ComponentDescriptor<N>>) -> Self {
        Self {
            component_type,
            props: None,
            component: None,
        }
    }

    /// Attach incoming properties. Anything but a JSON object means "no props".
    pub fn with_props(mut self, props: Value) -> Self {
        self.props = match props {
            Value::Object(map) => Some(map),
            _ => None,
        };
        self
    }

    /// Whether the vnode has been mounted.
    pub fn is_mounted(&self) -> bool {
        self.component
            .as_ref()
            .is_some_and(|instance| instance.is_mounted())
    }
}

impl<N: 'static> fmt::Debug for MountVNode<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountVNode")
            .field("component_type", &self.component_type.display_name())
            .field("props", &self.props)
            .field("component", &self.component.is_some())
            .finish()
    }
}
