//! Component descriptors - render function, state factory, hooks, props schema.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use super::context::RenderContext;
use super::props::PropsSchema;
use crate::reactive::ReactiveObject;

// =============================================================================
// Callback Types
// =============================================================================

/// Render function: context and state in, output tree out.
pub type RenderFn<N> = Rc<dyn Fn(&RenderContext, &ReactiveObject) -> N>;

/// Initial-state factory. Expected to return a JSON object.
pub type DataFn = Rc<dyn Fn() -> Value>;

/// Lifecycle hook that runs with the render context.
pub type Hook = Rc<dyn Fn(&RenderContext)>;

/// `before_create` runs before any state exists, so it gets no context.
pub type BeforeCreateHook = Rc<dyn Fn()>;

/// One optional callback per lifecycle stage.
#[derive(Clone, Default)]
pub struct LifecycleHooks {
    pub before_create: Option<BeforeCreateHook>,
    pub created: Option<Hook>,
    pub before_mount: Option<Hook>,
    pub mounted: Option<Hook>,
    pub before_update: Option<Hook>,
    pub updated: Option<Hook>,
}

impl fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHooks")
            .field("before_create", &self.before_create.is_some())
            .field("created", &self.created.is_some())
            .field("before_mount", &self.before_mount.is_some())
            .field("mounted", &self.mounted.is_some())
            .field("before_update", &self.before_update.is_some())
            .field("updated", &self.updated.is_some())
            .finish()
    }
}

// =============================================================================
// Component Descriptor
// =============================================================================

/// Immutable component definition, generic over the output tree type `N`.
///
/// # Example
///
/// ```ignore
/// use serde_json::json;
/// use spark_mount::component::ComponentDescriptor;
///
/// let counter = ComponentDescriptor::new(|ctx, _state| {
///     let label = ctx.get("label").unwrap_or_default();
///     Frame::text(format!("{label}: {}", ctx.get("count").unwrap_or_default()))
/// })
/// .with_name("Counter")
/// .with_data(|| json!({ "count": 0 }))
/// .with_prop("label", json!({ "type": "string" }))
/// .on_mounted(|ctx| tracing::info!(count = ?ctx.get("count"), "counter mounted"));
/// ```
pub struct ComponentDescriptor<N> {
    pub name: Option<String>,
    pub render: RenderFn<N>,
    pub data: Option<DataFn>,
    pub props: PropsSchema,
    pub hooks: LifecycleHooks,
}

impl<N: 'static> ComponentDescriptor<N> {
    pub fn new(render: impl Fn(&RenderContext, &ReactiveObject) -> N + 'static) -> Self {
        Self {
            name: None,
            render: Rc::new(render),
            data: None,
            props: PropsSchema::new(),
            hooks: LifecycleHooks::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_data(mut self, data: impl Fn() -> Value + 'static) -> Self {
        self.data = Some(Rc::new(data));
        self
    }

    /// Declare one prop. `schema` is stored but not interpreted.
    pub fn with_prop(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.props.insert(name.into(), schema);
        self
    }

    /// Replace the whole props schema.
    pub fn with_props(mut self, schema: PropsSchema) -> Self {
        self.props = schema;
        self
    }

    pub fn on_before_create(mut self, hook: impl Fn() + 'static) -> Self {
        self.hooks.before_create = Some(Rc::new(hook));
        self
    }

    pub fn on_created(mut self, hook: impl Fn(&RenderContext) + 'static) -> Self {
        self.hooks.created = Some(Rc::new(hook));
        self
    }

    pub fn on_before_mount(mut self, hook: impl Fn(&RenderContext) + 'static) -> Self {
        self.hooks.before_mount = Some(Rc::new(hook));
        self
    }

    pub fn on_mounted(mut self, hook: impl Fn(&RenderContext) + 'static) -> Self {
        self.hooks.mounted = Some(Rc::new(hook));
        self
    }

    pub fn on_before_update(mut self, hook: impl Fn(&RenderContext) + 'static) -> Self {
        self.hooks.before_update = Some(Rc::new(hook));
        self
    }

    pub fn on_updated(mut self, hook: impl Fn(&RenderContext) + 'static) -> Self {
        self.hooks.updated = Some(Rc::new(hook));
        self
    }

    /// Name used in diagnostics.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Anonymous")
    }

    /// Whether `key` is a declared prop.
    pub fn declares_prop(&self, key: &str) -> bool {
        self.props.contains_key(key)
    }
}

impl<N> fmt::Debug for ComponentDescriptor<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("name", &self.name)
            .field("data", &self.data.is_some())
            .field("props", &self.props.keys().collect::<Vec<_>>())
            .field("hooks", &self.hooks)
            .finish()
    }
}
