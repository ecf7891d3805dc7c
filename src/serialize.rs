//! Serialization and Persistence
//!
//! The host owns the patch container format; this module provides the pieces
//! it consumes: a serializable per-module definition carrying the module's
//! opaque state value, and a registry that instantiates and restores the
//! built-in module types.

use crate::modules::{BitCrusher, ClipLimiter, ClockDivider, WaveFolder};
use crate::port::{GraphModule, PortSpec};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Serializable module definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDef {
    /// Unique instance name
    pub name: String,

    /// Module type identifier
    pub module_type: String,

    /// Module-specific state, persisted verbatim
    pub state: Option<serde_json::Value>,
}

impl ModuleDef {
    pub fn new(name: impl Into<String>, module_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module_type: module_type.into(),
            state: None,
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Module factory function type
pub type ModuleFactory = Box<dyn Fn(f64) -> Box<dyn GraphModule> + Send + Sync>;

/// Metadata about a registered module type
#[derive(Debug, Clone)]
pub struct ModuleMetadata {
    pub type_id: String,
    pub name: String,
    pub description: String,
    pub port_spec: PortSpec,
}

/// Error raised when restoring a module definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreError {
    /// The definition names a type this registry does not know
    UnknownType(String),
    /// The module rejected its persisted state
    InvalidState(String),
}

impl std::fmt::Display for RestoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestoreError::UnknownType(t) => write!(f, "unknown module type: {}", t),
            RestoreError::InvalidState(msg) => write!(f, "invalid module state: {}", msg),
        }
    }
}

impl std::error::Error for RestoreError {}

/// Registry of available module types for instantiation
pub struct ModuleRegistry {
    factories: HashMap<String, ModuleFactory>,
    metadata: HashMap<String, ModuleMetadata>,
}

impl ModuleRegistry {
    /// Create a registry with the built-in modules registered
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
            metadata: HashMap::new(),
        };
        registry.register_builtin();
        registry
    }

    fn register_builtin(&mut self) {
        self.register_factory(
            "bit_crusher",
            "Bit Crusher",
            "Sample-rate and bit-depth reducer with bitwise mangling",
            |sr| Box::new(BitCrusher::new(sr)),
        );
        self.register_factory(
            "clip_limiter",
            "Clip Limiter",
            "Push/pull dead-zone shaper with outer hard limiter",
            |_| Box::new(ClipLimiter::new()),
        );
        self.register_factory(
            "clock_divider",
            "Clock Divider",
            "16-tap clock divider and one-hot sequencer",
            |_| Box::new(ClockDivider::new()),
        );
        self.register_factory(
            "wave_folder",
            "Wave Folder",
            "Modulo wave folder with feedback and shape blend",
            |_| Box::new(WaveFolder::new()),
        );
    }

    /// Register a module factory together with its metadata
    pub fn register_factory(
        &mut self,
        type_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        factory: impl Fn(f64) -> Box<dyn GraphModule> + Send + Sync + 'static,
    ) {
        let type_id = type_id.into();
        // Probe one instance for its port spec
        let probe = factory(44100.0);
        self.metadata.insert(
            type_id.clone(),
            ModuleMetadata {
                type_id: type_id.clone(),
                name: name.into(),
                description: description.into(),
                port_spec: probe.port_spec().clone(),
            },
        );
        self.factories.insert(type_id, Box::new(factory));
    }

    /// Instantiate a module by type id
    pub fn instantiate(
        &self,
        type_id: &str,
        sample_rate: f64,
    ) -> Result<Box<dyn GraphModule>, RestoreError> {
        self.factories
            .get(type_id)
            .map(|f| f(sample_rate))
            .ok_or_else(|| RestoreError::UnknownType(type_id.into()))
    }

    /// Capture a module instance into a definition the host can persist
    pub fn save(&self, name: impl Into<String>, module: &dyn GraphModule) -> ModuleDef {
        let mut def = ModuleDef::new(name, module.type_id());
        def.state = module.serialize_state();
        def
    }

    /// Rebuild a module from a persisted definition, re-applying its state
    pub fn restore(
        &self,
        def: &ModuleDef,
        sample_rate: f64,
    ) -> Result<Box<dyn GraphModule>, RestoreError> {
        let mut module = self.instantiate(&def.module_type, sample_rate)?;
        if let Some(state) = &def.state {
            module
                .deserialize_state(state)
                .map_err(RestoreError::InvalidState)?;
        }
        Ok(module)
    }

    /// Metadata for a registered type
    pub fn metadata(&self, type_id: &str) -> Option<&ModuleMetadata> {
        self.metadata.get(type_id)
    }

    /// All registered type ids
    pub fn type_ids(&self) -> Vec<&str> {
        self.metadata.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PortValues;

    #[test]
    fn test_registry_instantiates_builtins() {
        let registry = ModuleRegistry::new();
        for type_id in ["bit_crusher", "clip_limiter", "clock_divider", "wave_folder"] {
            let module = registry.instantiate(type_id, 48000.0).unwrap();
            assert_eq!(module.type_id(), type_id);
            assert!(!module.port_spec().outputs.is_empty());
        }
        assert!(matches!(
            registry.instantiate("reverb", 48000.0),
            Err(RestoreError::UnknownType(_))
        ));
    }

    #[test]
    fn test_registry_metadata() {
        let registry = ModuleRegistry::new();
        let meta = registry.metadata("clock_divider").unwrap();
        assert_eq!(meta.name, "Clock Divider");
        assert_eq!(meta.port_spec.outputs.len(), 16);
        assert_eq!(registry.type_ids().len(), 4);
    }

    #[test]
    fn test_clock_divider_flags_survive_save_restore() {
        let registry = ModuleRegistry::new();

        let mut div = ClockDivider::new();
        div.set_divide_by_one(true);
        div.set_first_tick(true);

        let def = registry.save("div1", &div);
        let json = def.to_json().unwrap();
        let def = ModuleDef::from_json(&json).unwrap();

        let restored = registry.restore(&def, 48000.0).unwrap();
        let state = restored.serialize_state().unwrap();
        assert_eq!(state["divide_by_one"], serde_json::json!(true));
        assert_eq!(state["first_tick"], serde_json::json!(true));
    }

    #[test]
    fn test_stateless_module_saves_without_state() {
        let registry = ModuleRegistry::new();
        let clip = ClipLimiter::new();
        let def = registry.save("clip1", &clip);
        assert!(def.state.is_none());

        // Round-trips fine and ticks after restore
        let mut restored = registry.restore(&def, 48000.0).unwrap();
        let mut inputs = PortValues::new();
        let mut outputs = PortValues::new();
        inputs.set(ClipLimiter::IN_AUDIO, 2.0);
        restored.tick(&inputs, &mut outputs);
        assert!(outputs.is_connected(ClipLimiter::OUT_AUDIO));
    }
}
