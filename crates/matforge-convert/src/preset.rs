//! Content-addressable preset overrides.
//!
//! A preset store maps material fingerprints to curated shader settings.
//! The store itself lives with the host application; this module only
//! defines the lookup interface, the record shape, and the merge policies
//! that fold a found record into a converted material.

use std::collections::HashMap;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use matforge_ir::node::{NodeKind, TextureNode, ValueDomain};
use matforge_ir::{default_fingerprint, Channel, Diagnostic, DiagnosticCode, Material, MaterialKind, Rgb};

/// One curated shader record, keyed by fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetRecord {
    pub fingerprint_id: String,
    pub kind: MaterialKind,
    /// Channel payload: channel key → `{ "color": [r, g, b] }` objects.
    pub payload: Value,
    /// Id of the preset set this record belongs to.
    pub set_id: String,
    /// True for records keyed by the texture-free default fingerprint.
    pub is_default: bool,
    /// When set, the record only changes the material kind, and only for
    /// bags whose `source` tag is named here.
    pub type_only: Option<String>,
}

/// Store lookups can fail without failing the conversion; every error is
/// downgraded to a miss by the pipeline.
#[derive(Debug, Error)]
pub enum PresetError {
    #[error("preset store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("corrupt preset payload: {0}")]
    CorruptPayload(String),
}

/// Read-only preset lookup interface. Writing records is a host concern.
pub trait PresetStore {
    fn find(&self, fingerprint_id: &str) -> Result<Option<PresetRecord>, PresetError>;

    /// Fallback lookup with the texture-free fingerprint, matching a preset
    /// to an object regardless of which textures are currently applied.
    fn find_default(
        &self,
        geometry_file: &str,
        material_name: &str,
    ) -> Result<Option<PresetRecord>, PresetError> {
        self.find(&default_fingerprint(geometry_file, material_name))
    }
}

/// In-memory store, used by tests and by hosts that preload their records.
#[derive(Debug, Default)]
pub struct InMemoryPresetStore {
    records: HashMap<String, PresetRecord>,
}

impl InMemoryPresetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: PresetRecord) {
        self.records.insert(record.fingerprint_id.clone(), record);
    }
}

impl PresetStore for InMemoryPresetStore {
    fn find(&self, fingerprint_id: &str) -> Result<Option<PresetRecord>, PresetError> {
        Ok(self.records.get(fingerprint_id).cloned())
    }
}

/// How a preset record folds into an already-converted material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// The record wins wholesale: kind and every channel it defines.
    Replace,
    /// Only fills channels the material left empty.
    Keep,
    /// Default-preset overlay: a channel is overwritten only when it is
    /// empty, holds a flat constant, or the record's kind is Glass.
    ShallowReplace,
}

/// Folds `record` into `material` under `policy`. Problems with the payload
/// are reported as diagnostics and leave the material unchanged where the
/// payload could not be understood.
pub fn apply_preset(
    material: &mut Material,
    record: &PresetRecord,
    policy: MergePolicy,
    diags: &mut Vec<Diagnostic>,
) {
    material.kind = record.kind.clone();
    material.preset_set_id = Some(record.set_id.clone());

    let channels = match &record.payload {
        Value::Null => return,
        Value::Object(map) => map,
        _ => {
            warn!(
                "preset {} carries a non-object payload",
                record.fingerprint_id
            );
            diags.push(Diagnostic::for_material(
                DiagnosticCode::PresetLookupFailure,
                "preset payload is not an object",
                material.unique_name(),
            ));
            return;
        }
    };

    for (key, entry) in channels {
        let Some(channel) = Channel::from_key(key) else {
            continue;
        };
        if !may_overwrite(material, channel, record, policy) {
            continue;
        }
        let color = entry
            .get("color")
            .map(Rgb::from_float_list)
            .unwrap_or_default();
        let node_name = format!("{}_{}_preset", material.name, key);
        material.pool.insert(TextureNode::new(
            &node_name,
            ValueDomain::Color,
            NodeKind::Constant { color },
        ));
        material.set_channel(channel, node_name);
    }
}

fn may_overwrite(
    material: &Material,
    channel: Channel,
    record: &PresetRecord,
    policy: MergePolicy,
) -> bool {
    let existing = material.channel_node(channel);
    match policy {
        MergePolicy::Replace => true,
        MergePolicy::Keep => existing.is_none(),
        MergePolicy::ShallowReplace => match existing {
            None => true,
            Some(id) => {
                matches!(material.pool.get(id).kind, NodeKind::Constant { .. })
                    || matches!(record.kind, MaterialKind::Glass { .. })
            }
        },
    }
}
