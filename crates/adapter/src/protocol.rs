//! Protocol module - JSON records carried by `lake` and `hatchery` messages
//!
//! Records are wrapped in a single-key object naming the record type:
//!
//! ```text
//! {"fish":{"version":1,"spawn_node":0,"kind":"carp","facing_min":false,...}}
//! {"hatchery":{"epoch_start_ms":1700000000000,"spawn_count":3}}
//! ```
//!
//! Decoding is tolerant: unknown keys are ignored and optional keys fall back
//! to defaults, so records written by newer nodes still load.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{Fish, Hatchery};
use crate::types::{FishKind, NodeId, MAX_GLYPH_WIDTH};

/// Version written into every fish record.
pub const RECORD_VERSION: u32 = 1;

/// Largest coordinate magnitude a fish record may carry. Covers the widest
/// lake a `u16` topology can describe plus a glyph's width on either side.
pub const COORD_LIMIT: i32 = 2 * u16::MAX as i32 + MAX_GLYPH_WIDTH as i32;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("record names node {0}, expected 0..=3")]
    InvalidNode(u8),
    #[error("move interval must be positive")]
    ZeroInterval,
    #[error("view {view:?} is {actual} chars wide, record says {declared}")]
    ViewWidth {
        view: String,
        declared: u16,
        actual: usize,
    },
    #[error("position ({x}, {y}) is outside any lake")]
    OutOfRange { x: i32, y: i32 },
}

/// Fish kind on the wire (case-insensitive name).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindName(pub FishKind);

impl<'de> Deserialize<'de> for KindName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        FishKind::from_str(&s)
            .map(KindName)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown fish kind {s:?}")))
    }
}

impl Serialize for KindName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

fn current_version() -> u32 {
    RECORD_VERSION
}

/// Wire form of [`Fish`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FishRecord {
    #[serde(default = "current_version")]
    pub version: u32,
    pub spawn_node: u8,
    pub kind: KindName,
    pub facing_min: bool,
    pub view: String,
    pub view_width: u16,
    pub view_center: u16,
    pub x: i32,
    pub y: i32,
    pub move_interval_ms: u32,
    #[serde(default)]
    pub move_epoch_ms: Option<u64>,
    #[serde(default)]
    pub move_steps: u64,
    #[serde(default)]
    pub drift_min: bool,
}

impl From<&Fish> for FishRecord {
    fn from(fish: &Fish) -> Self {
        Self {
            version: RECORD_VERSION,
            spawn_node: fish.spawn_node.get(),
            kind: KindName(fish.kind),
            facing_min: fish.facing_min,
            view: fish.view.clone(),
            view_width: fish.view_width,
            view_center: fish.view_center,
            x: fish.x,
            y: fish.y,
            move_interval_ms: fish.move_interval_ms,
            move_epoch_ms: fish.move_epoch_ms,
            move_steps: fish.move_steps,
            drift_min: fish.drift_min,
        }
    }
}

impl TryFrom<FishRecord> for Fish {
    type Error = ProtocolError;

    fn try_from(r: FishRecord) -> Result<Self, Self::Error> {
        let spawn_node = NodeId::try_from(r.spawn_node).map_err(ProtocolError::InvalidNode)?;
        if r.move_interval_ms == 0 {
            return Err(ProtocolError::ZeroInterval);
        }
        let actual = r.view.chars().count();
        if actual != r.view_width as usize {
            return Err(ProtocolError::ViewWidth {
                view: r.view,
                declared: r.view_width,
                actual,
            });
        }
        let span = -COORD_LIMIT..=COORD_LIMIT;
        if !span.contains(&r.x) || !span.contains(&r.y) {
            return Err(ProtocolError::OutOfRange { x: r.x, y: r.y });
        }
        Ok(Fish {
            spawn_node,
            kind: r.kind.0,
            facing_min: r.facing_min,
            view: r.view,
            view_width: r.view_width,
            view_center: r.view_center,
            x: r.x,
            y: r.y,
            move_interval_ms: r.move_interval_ms,
            move_epoch_ms: r.move_epoch_ms,
            move_steps: r.move_steps,
            drift_min: r.drift_min,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FishEnvelope {
    fish: FishRecord,
}

/// Wire form of [`Hatchery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HatcheryRecord {
    pub epoch_start_ms: u64,
    #[serde(default)]
    pub spawn_count: u64,
}

impl From<&Hatchery> for HatcheryRecord {
    fn from(h: &Hatchery) -> Self {
        Self {
            epoch_start_ms: h.epoch_start_ms,
            spawn_count: h.spawn_count,
        }
    }
}

impl From<HatcheryRecord> for Hatchery {
    fn from(r: HatcheryRecord) -> Self {
        Self {
            epoch_start_ms: r.epoch_start_ms,
            spawn_count: r.spawn_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct HatcheryEnvelope {
    hatchery: HatcheryRecord,
}

pub fn encode_fish(fish: &Fish) -> Result<Vec<u8>, ProtocolError> {
    let envelope = FishEnvelope {
        fish: FishRecord::from(fish),
    };
    Ok(serde_json::to_vec(&envelope)?)
}

pub fn decode_fish(bytes: &[u8]) -> Result<Fish, ProtocolError> {
    let envelope: FishEnvelope = serde_json::from_slice(bytes)?;
    Fish::try_from(envelope.fish)
}

pub fn encode_hatchery(hatchery: &Hatchery) -> Result<Vec<u8>, ProtocolError> {
    let envelope = HatcheryEnvelope {
        hatchery: HatcheryRecord::from(hatchery),
    };
    Ok(serde_json::to_vec(&envelope)?)
}

/// Decode a hatchery record; an empty payload means no hatchery exists yet.
pub fn decode_hatchery(bytes: &[u8]) -> Result<Option<Hatchery>, ProtocolError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let envelope: HatcheryEnvelope = serde_json::from_slice(bytes)?;
    Ok(Some(envelope.hatchery.into()))
}
