//! Signal Conventions and Port System
//!
//! This module defines the signal types, port definitions, and the type-erased
//! module interface the host runtime drives once per audio sample. Ports are
//! polyphonic: a connected port carries one voltage per active channel.

use crate::StdMap;
use serde::{Deserialize, Serialize};

/// Unique identifier for a port within a module
pub type PortId = u32;

/// Unique identifier for a parameter within a module
pub type ParamId = u32;

/// Maximum polyphonic channels a single port can carry
pub const MAX_CHANNELS: usize = 16;

/// Semantic signal classification following hardware modular conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// Audio signal, AC-coupled, typically ±5V peak
    Audio,

    /// Bipolar control voltage, ±5V (LFO, pitch bend, modulation)
    CvBipolar,

    /// Unipolar control voltage, 0–10V (envelope, velocity, expression)
    CvUnipolar,

    /// Gate signal, binary state: 0V (low) or +5V (high)
    Gate,

    /// Trigger signal, short pulse at +5V for instantaneous events
    Trigger,

    /// Clock signal, regular trigger pulses at tempo
    Clock,
}

impl SignalKind {
    /// Returns the typical voltage range (min, max) for this signal type
    pub fn voltage_range(&self) -> (f64, f64) {
        match self {
            SignalKind::Audio => (-5.0, 5.0),
            SignalKind::CvBipolar => (-5.0, 5.0),
            SignalKind::CvUnipolar => (0.0, 10.0),
            SignalKind::Gate => (0.0, 5.0),
            SignalKind::Trigger => (0.0, 5.0),
            SignalKind::Clock => (0.0, 5.0),
        }
    }

    /// Whether this kind is read through a hysteretic edge detector
    pub fn is_event(&self) -> bool {
        matches!(
            self,
            SignalKind::Gate | SignalKind::Trigger | SignalKind::Clock
        )
    }
}

/// Definition of a single port (input or output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortDef {
    /// Unique identifier within the module
    pub id: PortId,

    /// Human-readable name (e.g., "audio", "clock", "gain")
    pub name: String,

    /// Signal type for validation and UI hints
    pub kind: SignalKind,
}

impl PortDef {
    pub fn new(id: PortId, name: impl Into<String>, kind: SignalKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
        }
    }
}

/// Specification of all ports for a module
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortSpec {
    pub inputs: Vec<PortDef>,
    pub outputs: Vec<PortDef>,
}

impl PortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input_by_name(&self, name: &str) -> Option<&PortDef> {
        self.inputs.iter().find(|p| p.name == name)
    }

    pub fn output_by_name(&self, name: &str) -> Option<&PortDef> {
        self.outputs.iter().find(|p| p.name == name)
    }

    pub fn input_by_id(&self, id: PortId) -> Option<&PortDef> {
        self.inputs.iter().find(|p| p.id == id)
    }

    pub fn output_by_id(&self, id: PortId) -> Option<&PortDef> {
        self.outputs.iter().find(|p| p.id == id)
    }
}

/// Runtime port values container.
///
/// An entry models a connected cable: a port with no entry reads as
/// disconnected and yields 0V on every channel. Each entry holds one voltage
/// per active polyphonic channel (at least one).
#[derive(Debug, Clone, Default)]
pub struct PortValues {
    values: StdMap<PortId, Vec<f64>>,
}

impl PortValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a cable is patched into this port
    pub fn is_connected(&self, id: PortId) -> bool {
        self.values.contains_key(&id)
    }

    /// Number of active channels (0 when disconnected)
    pub fn channels(&self, id: PortId) -> usize {
        self.values.get(&id).map_or(0, |v| v.len())
    }

    /// Voltage on a given channel; 0V when disconnected or out of range
    pub fn voltage(&self, id: PortId, channel: usize) -> f64 {
        self.values
            .get(&id)
            .and_then(|v| v.get(channel))
            .copied()
            .unwrap_or(0.0)
    }

    /// First-channel voltage, if connected
    pub fn get(&self, id: PortId) -> Option<f64> {
        self.values.get(&id).and_then(|v| v.first()).copied()
    }

    /// First-channel voltage with a fallback for disconnected ports
    pub fn get_or(&self, id: PortId, default: f64) -> f64 {
        self.get(id).unwrap_or(default)
    }

    /// Sum of all channel voltages (mono summing read)
    pub fn sum(&self, id: PortId) -> f64 {
        self.values.get(&id).map_or(0.0, |v| v.iter().sum())
    }

    /// Connect a port as mono and set its voltage
    pub fn set(&mut self, id: PortId, voltage: f64) {
        let entry = self.values.entry(id).or_default();
        entry.clear();
        entry.push(voltage);
    }

    /// Connect a port and set all channel voltages at once
    pub fn set_poly(&mut self, id: PortId, voltages: &[f64]) {
        let entry = self.values.entry(id).or_default();
        entry.clear();
        entry.extend_from_slice(&voltages[..voltages.len().min(MAX_CHANNELS)]);
    }

    /// Resize a port to `channels` active channels, zero-filling new ones
    pub fn set_channels(&mut self, id: PortId, channels: usize) {
        let entry = self.values.entry(id).or_default();
        entry.resize(channels.clamp(1, MAX_CHANNELS), 0.0);
    }

    /// Write one channel's voltage; the port must already span the channel
    pub fn set_voltage(&mut self, id: PortId, channel: usize, voltage: f64) {
        if let Some(v) = self.values.get_mut(&id) {
            if let Some(slot) = v.get_mut(channel) {
                *slot = voltage;
            }
        }
    }

    /// Unpatch a port
    pub fn disconnect(&mut self, id: PortId) {
        self.values.remove(&id);
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// Parameter definition: a panel knob or switch with a declared range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDef {
    pub id: ParamId,
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

impl ParamDef {
    pub fn new(id: ParamId, name: impl Into<String>, min: f64, max: f64, default: f64) -> Self {
        Self {
            id,
            name: name.into(),
            min,
            max,
            default,
        }
    }
}

/// Type-erased module interface for graph-based patching
pub trait GraphModule: Send + Sync {
    /// Returns the module's port specification
    fn port_spec(&self) -> &PortSpec;

    /// Process one sample given port values
    fn tick(&mut self, inputs: &PortValues, outputs: &mut PortValues);

    /// Reset internal state.
    ///
    /// This is the explicit, user-initiated module reset. It is distinct from
    /// any reset *input* port the module may have, and must leave persisted
    /// configuration untouched.
    fn reset(&mut self);

    /// Set sample rate
    fn set_sample_rate(&mut self, sample_rate: f64);

    /// Get parameter definitions for UI binding
    fn params(&self) -> &[ParamDef] {
        &[]
    }

    /// Get a parameter value
    fn get_param(&self, _id: ParamId) -> Option<f64> {
        None
    }

    /// Set a parameter value, clamped to the declared range
    fn set_param(&mut self, _id: ParamId, _value: f64) {}

    /// Get module type identifier for serialization
    fn type_id(&self) -> &'static str {
        "unknown"
    }

    /// Serialize module-specific state the host persists verbatim
    fn serialize_state(&self) -> Option<serde_json::Value> {
        None
    }

    /// Restore module-specific state. Absent keys leave defaults unchanged.
    fn deserialize_state(&mut self, _state: &serde_json::Value) -> Result<(), String> {
        Ok(())
    }
}
