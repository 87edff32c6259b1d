//! Counter Demo - a component that re-renders on a timer
//!
//! Mounts a counter into the terminal and bumps its state a few times.
//! Every bump is a state write; nothing is redrawn until the scheduler ticks,
//! and then only the changed line is rewritten.
//!
//! Run with: RUST_LOG=spark_mount=debug cargo run --example counter

use std::error::Error;
use std::io::{self, Write};
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use serde_json::json;
use spark_mount::{
    ComponentDescriptor, Frame, MountVNode, Mounter, Scheduler, TerminalRenderer, Viewport,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let counter = ComponentDescriptor::new(|ctx, _state| {
        let count = ctx.get("count").and_then(|v| v.as_i64()).unwrap_or_default();
        let label =
            ctx.get("label").and_then(|v| v.as_str().map(str::to_owned)).unwrap_or_default();
        Frame::new([
            format!("┌─ {label} ─┐"),
            format!("  count: {count}"),
            format!("  {}", "█".repeat(count as usize)),
        ])
    })
    .with_name("Counter")
    .with_data(|| json!({ "count": 0 }))
    .with_prop("label", json!({ "type": "string" }))
    .on_mounted(|ctx| tracing::info!(count = ?ctx.get("count"), "counter mounted"))
    .on_updated(|ctx| tracing::debug!(count = ?ctx.get("count"), "counter updated"));

    execute!(io::stdout(), Clear(ClearType::All), Hide)?;

    let scheduler = Scheduler::new();
    let mounter = Mounter::new(Rc::new(TerminalRenderer::stdout()), scheduler.clone());
    let mut vnode =
        MountVNode::new(Rc::new(counter)).with_props(json!({ "label": "clicks", "id": "demo" }));

    let attrs = mounter.mount_component(&mut vnode, Viewport::at(1, 2), None)?;
    tracing::info!(?attrs, "attrs passed through");

    let Some(instance) = vnode.component.clone() else {
        return Ok(());
    };

    for step in 1..=10 {
        thread::sleep(Duration::from_millis(300));

        // Two writes per step, one redraw
        instance.state().set("count", step);
        instance.state().set("count", step);
        scheduler.tick()?;
    }

    let mut stdout = io::stdout();
    execute!(stdout, MoveTo(0, 6), Show)?;
    writeln!(stdout, "updates: {}", instance.update_count())?;
    Ok(())
}
