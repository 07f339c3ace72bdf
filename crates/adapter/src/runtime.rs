//! Node runtime.
//!
//! Bridges the synchronous [`NodeRouter`] handlers with the async transport:
//! every topic of a node gets a pool of tokio workers sharing one
//! subscription.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use log::{debug, error};
use tokio::task::JoinHandle;

use crate::clock::Clock;
use crate::config::NodeConfig;
use crate::core::Lake;
use crate::router::{NodeRouter, RouterError};
use crate::topic::NodeAddress;
use crate::transport::{Subscription, Transport};
use crate::types::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Lake,
    Hatchery,
    View,
}

impl Role {
    fn name(self) -> &'static str {
        match self {
            Role::Lake => "lake",
            Role::Hatchery => "hatchery",
            Role::View => "view",
        }
    }
}

/// Running node instance.
pub struct NodeHandle {
    router: Arc<NodeRouter>,
    workers: Vec<JoinHandle<()>>,
}

impl NodeHandle {
    pub fn node(&self) -> NodeId {
        self.router.node()
    }

    pub fn address(&self) -> &NodeAddress {
        self.router.address()
    }

    pub fn lake(&self) -> &Arc<Lake> {
        self.router.lake()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stop every worker without waiting for it.
    pub fn abort(&self) {
        for worker in &self.workers {
            worker.abort();
        }
    }

    /// Stop every worker and wait until they are gone.
    pub async fn shutdown(self) {
        self.abort();
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

/// Subscribe a node's topics, spawn its workers and seed its messages.
///
/// Must be called from within a tokio runtime.
pub fn start_node(
    config: &NodeConfig,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
) -> Result<NodeHandle> {
    let addr = NodeAddress::parse(&config.prefix)?;
    let grid = config.topology()?;
    let lake = Arc::new(Lake::new(addr.node(), grid).with_rules(config.moves));

    let pools = [
        (Role::View, addr.view(), config.view_workers),
        (Role::Hatchery, addr.hatchery(), config.hatchery_workers),
        (Role::Lake, addr.lake(), config.lake_workers),
    ];
    let mut subscriptions = Vec::with_capacity(pools.len());
    for (role, topic, count) in pools {
        let sub = transport
            .subscribe(&topic)
            .with_context(|| format!("subscribing {topic}"))?;
        subscriptions.push((role, sub, count.max(1)));
    }

    let router = Arc::new(NodeRouter::new(
        addr,
        lake,
        config.hatch,
        transport,
        clock,
    ));

    let mut workers = Vec::new();
    for (role, sub, count) in subscriptions {
        for _ in 0..count {
            workers.push(tokio::spawn(run_worker(role, sub.clone(), router.clone())));
        }
    }

    router
        .bootstrap()
        .with_context(|| format!("bootstrapping node {}", router.node()))?;

    Ok(NodeHandle { router, workers })
}

async fn run_worker(role: Role, sub: Subscription, router: Arc<NodeRouter>) {
    let node = router.node();
    while let Some(request) = sub.recv().await {
        let received = Instant::now();
        let result = {
            let mut rng = rand::rng();
            match role {
                Role::Lake => router.on_lake(&request, &mut rng),
                Role::Hatchery => router.on_hatchery(&request, &mut rng),
                Role::View => router.on_view(&request),
            }
        };

        let reply = match result {
            Ok(reply) => reply,
            Err(RouterError::Protocol(e)) => {
                error!("node {} dropped {} message: {}", node, role.name(), e);
                continue;
            }
            Err(RouterError::Transport(e)) => {
                error!("node {} {} worker stopping: {}", node, role.name(), e);
                break;
            }
        };

        if !reply.pause.is_zero() {
            tokio::time::sleep(reply.pause).await;
        }
        if let Some(outbound) = reply.then {
            if let Err(e) = router.emit(outbound, received.elapsed()) {
                error!("node {} {} worker stopping: {}", node, role.name(), e);
                break;
            }
        }
    }
    debug!("node {} {} worker exited", node, role.name());
}
