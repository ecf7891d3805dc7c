//! # Grit: Lo-Fi Signal-Mangling Modules
//!
//! `grit` is a Rust library of audio-rate signal processors for modular
//! synthesis environments: a bit-depth/sample-rate reducer, a push/pull clip
//! limiter, a 16-tap clock divider/sequencer, and a feedback wave folder.
//!
//! ## Architecture
//!
//! The library is organized in three layers:
//!
//! - **Port System** - Signal conventions, polyphonic port values, and the
//!   type-erased module interface the host drives once per audio sample
//! - **DSP Modules** - The four per-sample processing state machines
//! - **Persistence** - Module definitions and a registry for save/restore
//!
//! Modules share no state and never call one another; composition happens in
//! the host's signal graph by patching one module's output port values into
//! another's inputs. The per-sample path never blocks, locks, or fails: all
//! degenerate inputs are handled by clamping and flooring.
//!
//! ## Quick Start
//!
//! ```rust
//! use grit::prelude::*;
//!
//! let mut crush = BitCrusher::new(44100.0);
//! let mut inputs = PortValues::new();
//! let mut outputs = PortValues::new();
//!
//! // Patch a signal into the audio input and lower the resolution
//! inputs.set(BitCrusher::IN_AUDIO, 3.7);
//! crush.set_param(BitCrusher::PARAM_RES, 1.0);
//!
//! crush.tick(&inputs, &mut outputs);
//! let crushed = outputs.voltage(BitCrusher::OUT_AUDIO, 0);
//! assert!(crushed.abs() <= 5.0);
//! ```

pub mod modules;
pub mod port;
pub mod serialize;
pub mod trigger;

/// Ordered map used for port value storage (deterministic iteration)
pub(crate) type StdMap<K, V> = std::collections::BTreeMap<K, V>;

/// Prelude module for convenient imports
pub mod prelude {
    // Port System
    pub use crate::port::{
        GraphModule, ParamDef, ParamId, PortDef, PortId, PortSpec, PortValues, SignalKind,
        MAX_CHANNELS,
    };

    // DSP Modules
    pub use crate::modules::{crossfade, BitCrusher, ClipLimiter, ClockDivider, WaveFolder};

    // Edge Detection
    pub use crate::trigger::SchmittTrigger;

    // Serialization
    pub use crate::serialize::{ModuleDef, ModuleMetadata, ModuleRegistry, RestoreError};
}

// Re-export key types at crate root for convenience
pub use prelude::*;
