//! Message handlers of one node.
//!
//! Each handler is synchronous: it decodes the state in the message, runs the
//! core rules, sends whatever must go out immediately (new fish, merge
//! batches) and returns a [`Reply`] telling the worker how long to pause and
//! what to post afterwards.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use rand::Rng;
use thiserror::Error;

use crate::clock::Clock;
use crate::core::{
    blank_display, encode_batch, Fish, HatchRules, Hatchery, Lake, Movement, Pacer,
};
use crate::protocol::{decode_fish, decode_hatchery, encode_fish, encode_hatchery, ProtocolError};
use crate::topic::NodeAddress;
use crate::transport::{Request, TransId, Transport, TransportError};
use crate::types::NodeId;

pub const VIEW_TIMEOUT_MS: u32 = 5_000;
pub const HATCHERY_TIMEOUT_MS: u32 = 60_000;
pub const MERGE_TIMEOUT_MS: u32 = 10_000;
pub const DISPLAY_TIMEOUT_MS: u32 = 10_000;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Message to post once the handler's pause is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Send {
        topic: String,
        payload: Vec<u8>,
        timeout_ms: u32,
    },
    /// Keeps the correlation id; the timeout shrinks by the time spent holding
    /// the message.
    Forward {
        topic: String,
        payload: Vec<u8>,
        timeout_ms: u32,
        trans_id: TransId,
    },
}

impl Outbound {
    pub fn topic(&self) -> &str {
        match self {
            Outbound::Send { topic, .. } | Outbound::Forward { topic, .. } => topic,
        }
    }

    pub fn payload(&self) -> &[u8] {
        match self {
            Outbound::Send { payload, .. } | Outbound::Forward { payload, .. } => payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub pause: Duration,
    pub then: Option<Outbound>,
}

pub struct NodeRouter {
    addr: NodeAddress,
    lake: Arc<Lake>,
    hatch: HatchRules,
    pacer: Pacer,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
}

impl NodeRouter {
    pub fn new(
        addr: NodeAddress,
        lake: Arc<Lake>,
        hatch: HatchRules,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            addr,
            lake,
            hatch,
            pacer: Pacer::default(),
            transport,
            clock,
        }
    }

    pub fn with_pacer(mut self, pacer: Pacer) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn node(&self) -> NodeId {
        self.addr.node()
    }

    pub fn address(&self) -> &NodeAddress {
        &self.addr
    }

    pub fn lake(&self) -> &Arc<Lake> {
        &self.lake
    }

    /// Seed the node's circulating messages and blank its display.
    pub fn bootstrap(&self) -> Result<(), RouterError> {
        self.to_display(
            &self.addr.display(),
            blank_display(self.lake.grid()),
            DISPLAY_TIMEOUT_MS,
        );
        self.transport
            .send(&self.addr.view(), Vec::new(), VIEW_TIMEOUT_MS)?;
        let hatchery = Hatchery::new(self.clock.now_ms());
        self.transport.send(
            &self.addr.hatchery(),
            encode_hatchery(&hatchery)?,
            HATCHERY_TIMEOUT_MS,
        )?;
        info!("node {} started at {}", self.node(), self.addr);
        Ok(())
    }

    /// Advance one fish and pass it to whichever node owns it next.
    pub fn on_lake<R: Rng + ?Sized>(
        &self,
        request: &Request,
        rng: &mut R,
    ) -> Result<Reply, RouterError> {
        let mut fish = decode_fish(&request.payload)?;
        let here = self.node();
        let movement = fish.tick(&self.lake, request.timeout_ms, self.clock.now_ms(), rng);

        let pause = match movement {
            Movement::Idle => Duration::from_millis(self.lake.rules().idle_yield_ms),
            _ => Duration::ZERO,
        };
        let then = match movement.next_owner(here) {
            None => None,
            Some(owner) => {
                if owner != here {
                    debug!("node {} passes fish to node {}", here, owner);
                }
                Some(Outbound::Forward {
                    topic: self.addr.peer(owner).lake(),
                    payload: encode_fish(&fish)?,
                    timeout_ms: request.timeout_ms,
                    trans_id: request.trans_id,
                })
            }
        };
        Ok(Reply { pause, then })
    }

    /// Hatch any fish owed and re-post the hatchery record.
    pub fn on_hatchery<R: Rng + ?Sized>(
        &self,
        request: &Request,
        rng: &mut R,
    ) -> Result<Reply, RouterError> {
        let started = self.clock.now_ms();
        let mut hatchery = decode_hatchery(&request.payload)?.unwrap_or_else(|| {
            debug!("node {}: new hatchery", self.node());
            Hatchery::new(started)
        });

        let due = hatchery.due(&self.hatch, started);
        for _ in 0..due {
            let fish = Fish::hatch(&self.lake, self.clock.now_ms(), rng);
            let lifespan_ms = self.hatch.lifespan_ms(rng);
            info!(
                "node {} hatched {} at ({}, {}) to live {} s",
                self.node(),
                fish.kind.as_str(),
                fish.x,
                fish.y,
                lifespan_ms / 1000
            );
            self.transport
                .send(&self.addr.lake(), encode_fish(&fish)?, lifespan_ms)?;
        }

        Ok(Reply {
            pause: self.pacer.remaining(started, self.clock.now_ms()),
            then: Some(Outbound::Send {
                topic: self.addr.hatchery(),
                payload: encode_hatchery(&hatchery)?,
                timeout_ms: HATCHERY_TIMEOUT_MS,
            }),
        })
    }

    /// Flush pending frames and re-post the view tick.
    pub fn on_view(&self, _request: &Request) -> Result<Reply, RouterError> {
        let started = self.clock.now_ms();
        self.flush();
        Ok(Reply {
            pause: self.pacer.remaining(started, self.clock.now_ms()),
            then: Some(Outbound::Send {
                topic: self.addr.view(),
                payload: Vec::new(),
                timeout_ms: VIEW_TIMEOUT_MS,
            }),
        })
    }

    /// Send every node's pending frames to that node's merge topic.
    ///
    /// Returns the nodes a batch went to.
    pub fn flush(&self) -> Vec<NodeId> {
        let here = self.node();
        let mut sent = Vec::new();
        for node in NodeId::ALL {
            let frames = self.lake.frames().drain(node);
            if frames.is_empty() {
                continue;
            }
            let batch = encode_batch(here, &frames);
            if self.to_display(&self.addr.peer(node).merge(), batch, MERGE_TIMEOUT_MS) {
                sent.push(node);
            }
        }
        if !sent.is_empty() {
            info!("node {} sent frames to {:?}", here, sent);
        }
        sent
    }

    /// Display topics are optional sinks; a missing display loses the frames.
    fn to_display(&self, topic: &str, payload: Vec<u8>, timeout_ms: u32) -> bool {
        match self.transport.send(topic, payload, timeout_ms) {
            Ok(_) => true,
            Err(e) => {
                warn!("node {}: display dropped: {}", self.node(), e);
                false
            }
        }
    }

    /// Post a handler's follow-up message, `held` after it was received.
    pub fn emit(&self, outbound: Outbound, held: Duration) -> Result<(), TransportError> {
        match outbound {
            Outbound::Send {
                topic,
                payload,
                timeout_ms,
            } => self.transport.send(&topic, payload, timeout_ms).map(|_| ()),
            Outbound::Forward {
                topic,
                payload,
                timeout_ms,
                trans_id,
            } => {
                let held_ms = held.as_millis().min(u32::MAX as u128) as u32;
                self.transport
                    .forward(&topic, payload, timeout_ms.saturating_sub(held_ms), trans_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::core::{decode_batch, GridTopology, MoveRules};
    use crate::transport::LocalBus;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const BASE: &str = "/odroid/fish/";
    const T0: u64 = 1_700_000_000_000;

    fn router(id: u8, bus: &Arc<LocalBus>, clock: &Arc<ManualClock>) -> NodeRouter {
        let node = NodeId::new(id).unwrap();
        let lake = Lake::new(node, GridTopology::default()).with_rules(MoveRules {
            y_chance: 0.0,
            ..MoveRules::default()
        });
        NodeRouter::new(
            NodeAddress::new(BASE, node),
            Arc::new(lake),
            HatchRules::default(),
            bus.clone(),
            clock.clone(),
        )
    }

    fn request(topic: String, payload: Vec<u8>, timeout_ms: u32) -> Request {
        Request {
            topic,
            payload,
            timeout_ms,
            trans_id: 7,
        }
    }

    #[test]
    fn idle_fish_is_reposted_locally_after_a_yield() {
        let bus = Arc::new(LocalBus::new());
        let clock = Arc::new(ManualClock::new(T0));
        let r = router(0, &bus, &clock);
        let mut rng = Pcg32::seed_from_u64(1);

        let fish = Fish::hatch(r.lake(), T0, &mut rng);
        let payload = encode_fish(&fish).unwrap();
        let reply = r
            .on_lake(&request(r.address().lake(), payload.clone(), 30_000), &mut rng)
            .unwrap();

        assert_eq!(reply.pause, Duration::from_millis(100));
        let then = reply.then.unwrap();
        assert_eq!(then.topic(), "/odroid/fish/0/lake");
        assert_eq!(then.payload(), &payload[..]);
        assert!(matches!(then, Outbound::Forward { trans_id: 7, timeout_ms: 30_000, .. }));
    }

    #[test]
    fn dying_fish_is_not_reposted() {
        let bus = Arc::new(LocalBus::new());
        let clock = Arc::new(ManualClock::new(T0));
        let r = router(1, &bus, &clock);
        let mut rng = Pcg32::seed_from_u64(1);

        let fish = Fish::hatch(r.lake(), T0, &mut rng);
        let reply = r
            .on_lake(
                &request(r.address().lake(), encode_fish(&fish).unwrap(), 1_500),
                &mut rng,
            )
            .unwrap();
        assert_eq!(reply.then, None);
        assert_eq!(reply.pause, Duration::ZERO);
        assert_eq!(r.lake().frames().pending(NodeId::new(1).unwrap()), 1);
    }

    #[test]
    fn corrupt_fish_is_a_protocol_error() {
        let bus = Arc::new(LocalBus::new());
        let clock = Arc::new(ManualClock::new(T0));
        let r = router(0, &bus, &clock);
        let mut rng = Pcg32::seed_from_u64(1);
        let err = r
            .on_lake(&request(r.address().lake(), b"{".to_vec(), 30_000), &mut rng)
            .unwrap_err();
        assert!(matches!(err, RouterError::Protocol(_)));
    }

    #[test]
    fn fish_far_outside_the_lake_is_dropped_without_moving() {
        let bus = Arc::new(LocalBus::new());
        let clock = Arc::new(ManualClock::new(T0 + 1_000));
        let r = router(0, &bus, &clock);
        let mut rng = Pcg32::seed_from_u64(1);

        let mut fish = Fish::hatch(r.lake(), T0, &mut rng);
        fish.facing_min = false;
        fish.x = i32::MAX;
        let err = r
            .on_lake(
                &request(r.address().lake(), encode_fish(&fish).unwrap(), 30_000),
                &mut rng,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            RouterError::Protocol(ProtocolError::OutOfRange { .. })
        ));
        assert!(r.lake().frames().is_empty());
    }

    #[test]
    fn hatchery_spawns_owed_fish_on_the_local_lake() {
        let bus = Arc::new(LocalBus::new());
        let clock = Arc::new(ManualClock::new(T0));
        let r = router(3, &bus, &clock);
        let lake_sub = bus.subscribe(&r.address().lake()).unwrap();
        let mut rng = Pcg32::seed_from_u64(5);

        let state = encode_hatchery(&Hatchery::new(T0 - 200_000)).unwrap();
        let reply = r
            .on_hatchery(&request(r.address().hatchery(), state, 60_000), &mut rng)
            .unwrap();

        let mut spawned = 0;
        while let Some(msg) = lake_sub.try_recv() {
            let fish = decode_fish(&msg.payload).unwrap();
            assert_eq!(fish.spawn_node.get(), 3);
            assert!(msg.timeout_ms > 110_000 && msg.timeout_ms <= 240_000);
            spawned += 1;
        }
        assert_eq!(spawned, 4);

        assert_eq!(reply.pause, Duration::from_millis(1000));
        let then = reply.then.unwrap();
        assert_eq!(then.topic(), "/odroid/fish/3/hatchery");
        let h = decode_hatchery(then.payload()).unwrap().unwrap();
        assert_eq!(h.spawn_count, 4);
    }

    #[test]
    fn empty_hatchery_payload_starts_fresh() {
        let bus = Arc::new(LocalBus::new());
        let clock = Arc::new(ManualClock::new(T0));
        let r = router(2, &bus, &clock);
        let mut rng = Pcg32::seed_from_u64(5);

        let reply = r
            .on_hatchery(&request(r.address().hatchery(), Vec::new(), 60_000), &mut rng)
            .unwrap();
        let then = reply.then.unwrap();
        let h = decode_hatchery(then.payload()).unwrap().unwrap();
        assert_eq!(h, Hatchery::new(T0));
    }

    #[test]
    fn view_flushes_pending_frames_to_merge_topics() {
        let bus = Arc::new(LocalBus::new());
        let clock = Arc::new(ManualClock::new(T0));
        let r = router(0, &bus, &clock);
        let merge0 = bus.subscribe("/odroid/fish/0/display/merge").unwrap();
        let merge2 = bus.subscribe("/odroid/fish/2/display/merge").unwrap();

        let n0 = NodeId::new(0).unwrap();
        let n2 = NodeId::new(2).unwrap();
        r.lake().frames().append(n0, b"a".to_vec());
        r.lake().frames().append(n0, b"b".to_vec());
        r.lake().frames().append(n2, b"c".to_vec());

        let reply = r
            .on_view(&request(r.address().view(), Vec::new(), 5_000))
            .unwrap();
        assert!(r.lake().frames().is_empty());
        assert_eq!(reply.then.unwrap().topic(), "/odroid/fish/0/view");

        let batch = merge0.try_recv().unwrap();
        let frames = decode_batch(&batch.payload).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].mask, 1);
        assert_eq!(frames[1].bytes, b"b");
        assert!(merge0.try_recv().is_none());

        let batch = merge2.try_recv().unwrap();
        let frames = decode_batch(&batch.payload).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].bytes, b"c");
    }

    #[test]
    fn missing_display_only_loses_frames() {
        let bus = Arc::new(LocalBus::new());
        let clock = Arc::new(ManualClock::new(T0));
        let r = router(0, &bus, &clock);
        r.lake().frames().append(NodeId::new(1).unwrap(), b"x".to_vec());
        assert!(r.flush().is_empty());
        assert!(r.lake().frames().is_empty());
    }

    #[test]
    fn bootstrap_seeds_view_and_hatchery() {
        let bus = Arc::new(LocalBus::new());
        let clock = Arc::new(ManualClock::new(T0));
        let r = router(1, &bus, &clock);
        let view = bus.subscribe(&r.address().view()).unwrap();
        let hatchery = bus.subscribe(&r.address().hatchery()).unwrap();
        let display = bus.subscribe(&r.address().display()).unwrap();

        r.bootstrap().unwrap();

        assert!(view.try_recv().unwrap().payload.is_empty());
        let h = decode_hatchery(&hatchery.try_recv().unwrap().payload)
            .unwrap()
            .unwrap();
        assert_eq!(h, Hatchery::new(T0));
        let blank = display.try_recv().unwrap().payload;
        assert_eq!(&blank[..3], &[0xff, 0, 0]);
        assert_eq!(blank.len(), 3 + 32);
    }

    #[test]
    fn forward_deducts_the_time_held() {
        let bus = Arc::new(LocalBus::new());
        let clock = Arc::new(ManualClock::new(T0));
        let r = router(0, &bus, &clock);
        let lake = bus.subscribe(&r.address().lake()).unwrap();

        r.emit(
            Outbound::Forward {
                topic: r.address().lake(),
                payload: b"f".to_vec(),
                timeout_ms: 10_000,
                trans_id: 42,
            },
            Duration::from_millis(4_000),
        )
        .unwrap();
        let msg = lake.try_recv().unwrap();
        assert_eq!(msg.trans_id, 42);
        assert!(msg.timeout_ms <= 6_000 && msg.timeout_ms > 5_000);
    }
}
