//! The bundled panel application: a clock, a volume control, and a small menu.

use anyhow::{bail, Result};
use irpanel::config::Layout;
use irpanel::{AppBuilder, HandlerContext, PanelApp, PanelHandle};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const DEFAULT_LAYOUT: &str = include_str!("default_layout.yaml");
const REQUIRED_FIELDS: &[&str] = &["title", "clock", "volume", "menu", "status"];
const MENU_ITEMS: &[&str] = &["Brightness", "Inputs", "About"];
const MAX_VOLUME: u8 = 20;
const CLOCK_TICK: Duration = Duration::from_secs(1);

pub(crate) fn default_layout() -> Result<Layout> {
    Layout::parse(DEFAULT_LAYOUT)
}

/// A custom layout may move fields around but must place every one of them.
pub(crate) fn check_layout(layout: &Layout) -> Result<()> {
    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|name| !layout.has_field(name))
        .collect();
    if !missing.is_empty() {
        bail!("layout is missing fields: {}", missing.join(", "));
    }
    Ok(())
}

pub(crate) fn build(layout: &Layout) -> AppBuilder {
    let volume = Arc::new(AtomicU8::new(MAX_VOLUME / 2));
    let selected = Arc::new(AtomicUsize::new(0));
    let vol_up = Arc::clone(&volume);
    let vol_down = Arc::clone(&volume);
    let menu_next = Arc::clone(&selected);
    let menu_prev = Arc::clone(&selected);
    let menu_ok = Arc::clone(&selected);

    PanelApp::builder()
        .layout(layout)
        .context("menu")
        .key("down", move |ctx| {
            let idx = (menu_next.load(Ordering::Relaxed) + 1) % MENU_ITEMS.len();
            menu_next.store(idx, Ordering::Relaxed);
            show_menu(ctx, idx)
        })
        .key("up", move |ctx| {
            let idx = (menu_prev.load(Ordering::Relaxed) + MENU_ITEMS.len() - 1) % MENU_ITEMS.len();
            menu_prev.store(idx, Ordering::Relaxed);
            show_menu(ctx, idx)
        })
        .key("ok", move |ctx| {
            let item = MENU_ITEMS[menu_ok.load(Ordering::Relaxed) % MENU_ITEMS.len()];
            ctx.update("status", format!("{item:<20}"))?;
            Ok(())
        })
        .key("back", |ctx| {
            ctx.set_context("main")?;
            ctx.update("menu", " ".repeat(20))?;
            ctx.update("status", format!("{:<20}", "Ready"))?;
            Ok(())
        })
        .context("main")
        .key("up", move |ctx| show_volume(ctx, nudge(&vol_up, true)))
        .key("down", move |ctx| show_volume(ctx, nudge(&vol_down, false)))
        .key("menu", move |ctx| {
            ctx.set_context("menu")?;
            show_menu(ctx, selected.load(Ordering::Relaxed))
        })
        .setup(move |ctx| {
            ctx.update("title", "irpanel")?;
            ctx.update("status", format!("{:<20}", "Ready"))?;
            show_volume(ctx, volume.load(Ordering::Relaxed))
        })
        .task("clock", run_clock)
}

/// Move the volume one step and return the new level.
fn nudge(volume: &AtomicU8, up: bool) -> u8 {
    let step = |v: u8| {
        if up {
            v.saturating_add(1).min(MAX_VOLUME)
        } else {
            v.saturating_sub(1)
        }
    };
    let prev = volume
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| Some(step(v)))
        .unwrap_or_else(|v| v);
    step(prev)
}

fn show_volume(ctx: &mut HandlerContext<'_>, level: u8) -> Result<()> {
    let filled = usize::from(level) * 12 / usize::from(MAX_VOLUME);
    let bar = format!("{}{}", "#".repeat(filled), "-".repeat(12 - filled));
    ctx.update("volume", format!("Vol {bar} {level:>2}"))?;
    Ok(())
}

fn show_menu(ctx: &mut HandlerContext<'_>, idx: usize) -> Result<()> {
    let item = MENU_ITEMS[idx % MENU_ITEMS.len()];
    ctx.update("menu", format!("> {item:<18}"))?;
    Ok(())
}

fn run_clock(panel: PanelHandle) -> Result<()> {
    loop {
        panel.update("clock", clock_text(SystemTime::now()))?;
        thread::sleep(CLOCK_TICK);
    }
}

/// `HH:MM:SS` in UTC.
fn clock_text(now: SystemTime) -> String {
    let secs = now
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
        % 86_400;
    format!("{:02}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
}
