//! Fish lake runner (default binary).
//!
//! Runs all four nodes on one in-process bus and shows their displays as a
//! single lake in the terminal. With `FISH_HEADLESS=1` the terminal is left
//! alone and display traffic is logged instead.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use log::{debug, info, warn};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;

use fish_lake::adapter::{
    start_node, LocalBus, NodeAddress, NodeConfig, NodeHandle, SystemClock, Transport,
    DEFAULT_BASE,
};
use fish_lake::term::{FrameBuffer, LakeDisplay, LakeView, TerminalRenderer, Viewport};
use fish_lake::types::NodeId;

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn main() -> Result<()> {
    let headless = env_flag("FISH_HEADLESS");
    let default_filter = if headless { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let base = std::env::var("FISH_BASE_PREFIX").unwrap_or_else(|_| DEFAULT_BASE.to_string());
    let configs: Vec<NodeConfig> = NodeId::ALL
        .iter()
        .map(|&node| NodeConfig::from_env(NodeAddress::new(&base, node).prefix()))
        .collect();
    let grid = configs[0].topology()?;

    let rt = Runtime::new().context("creating tokio runtime")?;
    let bus = Arc::new(LocalBus::new());
    let display = Arc::new(Mutex::new(LakeDisplay::new(grid)));

    let (sinks, nodes) = rt.block_on(async {
        let sinks = spawn_display_sinks(&base, bus.as_ref(), &display, headless)?;
        let mut nodes = Vec::with_capacity(configs.len());
        for config in &configs {
            nodes.push(start_node(config, bus.clone(), Arc::new(SystemClock))?);
        }
        anyhow::Ok((sinks, nodes))
    })?;
    info!("lake running with {} nodes under {}", nodes.len(), base);

    let result = if headless {
        rt.block_on(async {
            tokio::signal::ctrl_c().await?;
            info!("interrupted");
            anyhow::Ok(())
        })
    } else {
        let mut term = TerminalRenderer::new();
        term.enter()?;
        let result = draw_loop(&mut term, &display);
        // Always try to restore terminal state.
        let _ = term.exit();
        result
    };

    rt.block_on(shutdown(nodes, sinks));
    result
}

/// Subscribe every node's `display` and `display/merge` topics and feed them
/// into `display`.
fn spawn_display_sinks(
    base: &str,
    bus: &LocalBus,
    display: &Arc<Mutex<LakeDisplay>>,
    headless: bool,
) -> Result<Vec<JoinHandle<()>>> {
    let mut sinks = Vec::new();
    for node in NodeId::ALL {
        let addr = NodeAddress::new(base, node);
        for merge in [false, true] {
            let topic = if merge { addr.merge() } else { addr.display() };
            let sub = bus.subscribe(&topic)?;
            let display = display.clone();
            sinks.push(tokio::spawn(async move {
                while let Some(request) = sub.recv().await {
                    let mut display = display.lock().unwrap_or_else(PoisonError::into_inner);
                    let applied = if merge {
                        display.apply_merge(node, &request.payload)
                    } else {
                        display.apply_display(node, &request.payload).map(|()| 1)
                    };
                    match applied {
                        Ok(frames) if headless => {
                            info!("display {} applied {} frames", node, frames);
                            let screen = display.screen(node);
                            for y in 0..screen.height() {
                                debug!("display {} |{}|", node, screen.row(y));
                            }
                        }
                        Ok(_) => {}
                        Err(e) => warn!("display {} rejected {}: {}", node, request.topic, e),
                    }
                }
            }));
        }
    }
    Ok(sinks)
}

fn draw_loop(term: &mut TerminalRenderer, display: &Mutex<LakeDisplay>) -> Result<()> {
    let view = LakeView::default();
    let mut fb = FrameBuffer::new(0, 0);
    let mut drawn: Option<(u64, Viewport)> = None;

    loop {
        let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
        let viewport = Viewport::new(w, h);
        {
            let display = display.lock().unwrap_or_else(PoisonError::into_inner);
            let state = (display.generation(), viewport);
            if drawn != Some(state) {
                let status = format!(
                    "fish-lake  {} frames merged  q to quit",
                    display.merged_frames()
                );
                view.render_into(&display, &status, viewport, &mut fb);
                term.draw_swap(&mut fb)?;
                drawn = Some(state);
            }
        }

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    let ctrl_c = key.modifiers.contains(KeyModifiers::CONTROL)
                        && key.code == KeyCode::Char('c');
                    if ctrl_c || matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                        return Ok(());
                    }
                }
                Event::Resize(..) => {
                    term.invalidate();
                    drawn = None;
                }
                _ => {}
            }
        }
    }
}

async fn shutdown(nodes: Vec<NodeHandle>, sinks: Vec<JoinHandle<()>>) {
    for node in nodes {
        node.shutdown().await;
    }
    for sink in sinks {
        sink.abort();
        let _ = sink.await;
    }
}
