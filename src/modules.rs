//! Signal-Mangling Modules
//!
//! The four processing modules: a bit-depth/sample-rate reducer, a push/pull
//! clip limiter, a 16-tap clock divider/sequencer, and a feedback wave
//! folder. Each is an independent state machine driven once per audio sample
//! through [`GraphModule::tick`]; modules share no state and compose only
//! through the host's patch graph.

use crate::port::{
    GraphModule, ParamDef, ParamId, PortDef, PortId, PortSpec, PortValues, SignalKind,
    MAX_CHANNELS,
};
use crate::trigger::SchmittTrigger;

/// Linear crossfade between `a` and `b`, `t` in [0, 1]
pub fn crossfade(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// Bit Crusher
///
/// Downsamples and bit-quantizes an audio signal, with optional bitwise
/// mangling driven by auxiliary control inputs.
///
/// The output only updates on a hold event: a rising edge of the clock-hold
/// input when patched, otherwise a free-running software clock whose rate is
/// set by the `rate` knob plus CV. Between events the previous output is
/// replayed per channel (zero-order hold). On an update, each channel is
/// normalized to ±1, quantized to `amp_res` steps, run through whichever bit
/// operations have a cable present, and rescaled to ±5V.
pub struct BitCrusher {
    rate: f64,
    res: f64,
    sample_rate: f64,
    held_sample_time: f64,
    hold_trigger: SchmittTrigger,
    held: [f64; MAX_CHANNELS],
    held_channels: usize,
    spec: PortSpec,
    params: Vec<ParamDef>,
}

impl BitCrusher {
    pub const IN_AUDIO: PortId = 0;
    pub const IN_RATE_CV: PortId = 1;
    pub const IN_CLOCK_HOLD: PortId = 2;
    pub const IN_RES_CV: PortId = 3;
    pub const IN_GAIN: PortId = 4;
    pub const IN_SHIFT_LEFT: PortId = 5;
    pub const IN_SHIFT_RIGHT: PortId = 6;
    pub const IN_AND: PortId = 7;
    pub const IN_OR: PortId = 8;
    pub const IN_XOR: PortId = 9;
    pub const IN_NOT: PortId = 10;
    pub const OUT_AUDIO: PortId = 20;

    pub const PARAM_RATE: ParamId = 0;
    pub const PARAM_RES: ParamId = 1;

    /// Scale factor from the resolution control to quantization steps
    pub const MAX_RES: f64 = 12.8;

    pub fn new(sample_rate: f64) -> Self {
        Self {
            rate: 1.0,
            res: 10.0,
            sample_rate,
            held_sample_time: 0.0,
            hold_trigger: SchmittTrigger::new(),
            held: [0.0; MAX_CHANNELS],
            held_channels: 1,
            spec: PortSpec {
                inputs: vec![
                    PortDef::new(Self::IN_AUDIO, "audio", SignalKind::Audio),
                    PortDef::new(Self::IN_RATE_CV, "rate", SignalKind::CvUnipolar),
                    PortDef::new(Self::IN_CLOCK_HOLD, "clock", SignalKind::Clock),
                    PortDef::new(Self::IN_RES_CV, "res", SignalKind::CvUnipolar),
                    PortDef::new(Self::IN_GAIN, "gain", SignalKind::CvBipolar),
                    PortDef::new(Self::IN_SHIFT_LEFT, "shl", SignalKind::CvBipolar),
                    PortDef::new(Self::IN_SHIFT_RIGHT, "shr", SignalKind::CvBipolar),
                    PortDef::new(Self::IN_AND, "and", SignalKind::CvBipolar),
                    PortDef::new(Self::IN_OR, "or", SignalKind::CvBipolar),
                    PortDef::new(Self::IN_XOR, "xor", SignalKind::CvBipolar),
                    PortDef::new(Self::IN_NOT, "not", SignalKind::Gate),
                ],
                outputs: vec![PortDef::new(Self::OUT_AUDIO, "audio", SignalKind::Audio)],
            },
            params: vec![
                ParamDef::new(Self::PARAM_RATE, "sample rate", 0.0, 1.0, 1.0),
                ParamDef::new(Self::PARAM_RES, "resolution", 0.0, 10.0, 10.0),
            ],
        }
    }

    /// Whether this sample is a hold event (output update due)
    fn hold_event(&mut self, inputs: &PortValues) -> bool {
        if inputs.is_connected(Self::IN_CLOCK_HOLD) {
            // Update output on clock edges only
            self.hold_trigger
                .process(inputs.voltage(Self::IN_CLOCK_HOLD, 0))
        } else {
            // Free-run: accumulate time according to the rate control. The
            // floor of 100 keeps the module ticking when the knob is closed.
            let step = (self.rate + inputs.voltage(Self::IN_RATE_CV, 0) / 10.0) * self.sample_rate;
            self.held_sample_time += step.clamp(100.0, self.sample_rate);
            if self.held_sample_time >= self.sample_rate {
                self.held_sample_time -= self.sample_rate;
                true
            } else {
                false
            }
        }
    }

    fn crush_channel(&self, inputs: &PortValues, c: usize) -> f64 {
        // Resolution floor of 1 avoids divide by zero
        let amp_res =
            ((self.res + inputs.voltage(Self::IN_RES_CV, c)) * Self::MAX_RES).max(1.0);

        let mut audio = inputs.voltage(Self::IN_AUDIO, c) / 5.0;
        if inputs.is_connected(Self::IN_GAIN) {
            audio *= inputs.voltage(Self::IN_GAIN, c) / 5.0;
        }

        // Quantize, then mangle in fixed order: shl, shr, and, or, xor, not
        let mut quant = (audio * amp_res) as i32;
        if inputs.is_connected(Self::IN_SHIFT_LEFT) {
            let amount = ((inputs.voltage(Self::IN_SHIFT_LEFT, c) / 100.0).abs() * amp_res) as i32;
            quant = quant.wrapping_shl(amount.min(31) as u32);
        }
        if inputs.is_connected(Self::IN_SHIFT_RIGHT) {
            let amount = ((inputs.voltage(Self::IN_SHIFT_RIGHT, c) / 100.0) * amp_res) as i32;
            quant = quant.wrapping_shr(amount.clamp(0, 31) as u32);
        }
        if inputs.is_connected(Self::IN_AND) {
            quant &= ((inputs.voltage(Self::IN_AND, c) / 10.0) * amp_res) as i32;
        }
        if inputs.is_connected(Self::IN_OR) {
            quant |= ((inputs.voltage(Self::IN_OR, c) / 10.0) * amp_res) as i32;
        }
        if inputs.is_connected(Self::IN_XOR) {
            quant ^= ((inputs.voltage(Self::IN_XOR, c) / 10.0) * amp_res) as i32;
        }
        // NOT is a binary gate, not a continuous control; 1V exactly is off
        if inputs.is_connected(Self::IN_NOT) && inputs.voltage(Self::IN_NOT, c).abs() > 1.0 {
            quant = !quant;
        }

        (quant as f64 / amp_res) * 5.0
    }
}

impl Default for BitCrusher {
    fn default() -> Self {
        Self::new(44100.0)
    }
}

impl GraphModule for BitCrusher {
    fn port_spec(&self) -> &PortSpec {
        &self.spec
    }

    fn tick(&mut self, inputs: &PortValues, outputs: &mut PortValues) {
        if self.hold_event(inputs) {
            let channels = inputs.channels(Self::IN_AUDIO).clamp(1, MAX_CHANNELS);
            for c in 0..channels {
                self.held[c] = self.crush_channel(inputs, c);
            }
            self.held_channels = channels;
        }

        // Zero-order hold between events
        outputs.set_channels(Self::OUT_AUDIO, self.held_channels);
        for c in 0..self.held_channels {
            outputs.set_voltage(Self::OUT_AUDIO, c, self.held[c]);
        }
    }

    fn reset(&mut self) {
        self.held_sample_time = 0.0;
        self.hold_trigger.reset();
        self.held = [0.0; MAX_CHANNELS];
        self.held_channels = 1;
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
    }

    fn params(&self) -> &[ParamDef] {
        &self.params
    }

    fn get_param(&self, id: ParamId) -> Option<f64> {
        match id {
            Self::PARAM_RATE => Some(self.rate),
            Self::PARAM_RES => Some(self.res),
            _ => None,
        }
    }

    fn set_param(&mut self, id: ParamId, value: f64) {
        match id {
            Self::PARAM_RATE => self.rate = value.clamp(0.0, 1.0),
            Self::PARAM_RES => self.res = value.clamp(0.0, 10.0),
            _ => {}
        }
    }

    fn type_id(&self) -> &'static str {
        "bit_crusher"
    }
}

/// Clip Limiter
///
/// A stateless per-sample transform with two stages. The push stage defines
/// a dead zone around a movable center: signal landing inside the zone is
/// pushed out to the nearer boundary, or silenced entirely in pull mode. The
/// optional limit stage hard-clamps the result to a window around its own
/// center. All four zone quantities read their CV per channel.
pub struct ClipLimiter {
    pull: f64,
    limit_enable: f64,
    gain: f64,
    push: f64,
    limit: f64,
    spec: PortSpec,
    params: Vec<ParamDef>,
}

impl ClipLimiter {
    pub const IN_AUDIO: PortId = 0;
    pub const IN_GAIN: PortId = 1;
    pub const IN_PUSH_SIZE: PortId = 2;
    pub const IN_PUSH_POS: PortId = 3;
    pub const IN_LIMIT_SIZE: PortId = 4;
    pub const IN_LIMIT_POS: PortId = 5;
    pub const OUT_AUDIO: PortId = 10;

    pub const PARAM_PULL: ParamId = 0;
    pub const PARAM_LIMIT_ENABLE: ParamId = 1;
    pub const PARAM_GAIN: ParamId = 2;
    pub const PARAM_PUSH: ParamId = 3;
    pub const PARAM_LIMIT: ParamId = 4;

    pub fn new() -> Self {
        Self {
            pull: 0.0,
            limit_enable: 1.0,
            gain: 1.0,
            push: 0.0,
            limit: 1.0,
            spec: PortSpec {
                inputs: vec![
                    PortDef::new(Self::IN_AUDIO, "audio", SignalKind::Audio),
                    PortDef::new(Self::IN_GAIN, "gain", SignalKind::CvUnipolar),
                    PortDef::new(Self::IN_PUSH_SIZE, "push_size", SignalKind::CvUnipolar),
                    PortDef::new(Self::IN_PUSH_POS, "push_pos", SignalKind::CvBipolar),
                    PortDef::new(Self::IN_LIMIT_SIZE, "limit_size", SignalKind::CvUnipolar),
                    PortDef::new(Self::IN_LIMIT_POS, "limit_pos", SignalKind::CvBipolar),
                ],
                outputs: vec![PortDef::new(Self::OUT_AUDIO, "audio", SignalKind::Audio)],
            },
            params: vec![
                ParamDef::new(Self::PARAM_PULL, "pull", 0.0, 1.0, 0.0),
                ParamDef::new(Self::PARAM_LIMIT_ENABLE, "enable limit", 0.0, 1.0, 1.0),
                ParamDef::new(Self::PARAM_GAIN, "gain", 0.0, 2.0, 1.0),
                ParamDef::new(Self::PARAM_PUSH, "push", 0.0, 2.0, 0.0),
                ParamDef::new(Self::PARAM_LIMIT, "limit", 0.0, 2.0, 1.0),
            ],
        }
    }

    fn clip_channel(&self, inputs: &PortValues, c: usize) -> f64 {
        let mut audio = inputs.voltage(Self::IN_AUDIO, c) / 5.0;
        audio *= self.gain + inputs.voltage(Self::IN_GAIN, c) / 10.0;

        let push_size = self.push + inputs.voltage(Self::IN_PUSH_SIZE, c) / 10.0;
        let push_center = inputs.voltage(Self::IN_PUSH_POS, c) / 5.0;
        let push_hi = push_center + push_size;
        let push_lo = push_center - push_size;

        // Push out of the dead zone, or silence it in pull mode
        if audio <= push_hi && audio >= push_lo {
            audio = if self.pull >= 1.0 {
                0.0
            } else if audio > 0.0 {
                push_hi
            } else {
                push_lo
            };
        }

        if self.limit_enable >= 1.0 {
            // CV can drag the window width negative; treat that as closed
            let limit =
                (self.limit + inputs.voltage(Self::IN_LIMIT_SIZE, c) / 10.0).max(0.0);
            let limit_center = inputs.voltage(Self::IN_LIMIT_POS, c) / 5.0;
            audio = audio.clamp(limit_center - limit, limit_center + limit);
        }

        audio * 5.0
    }
}

impl Default for ClipLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphModule for ClipLimiter {
    fn port_spec(&self) -> &PortSpec {
        &self.spec
    }

    fn tick(&mut self, inputs: &PortValues, outputs: &mut PortValues) {
        let channels = inputs.channels(Self::IN_AUDIO).clamp(1, MAX_CHANNELS);
        outputs.set_channels(Self::OUT_AUDIO, channels);
        for c in 0..channels {
            outputs.set_voltage(Self::OUT_AUDIO, c, self.clip_channel(inputs, c));
        }
    }

    fn reset(&mut self) {}

    fn set_sample_rate(&mut self, _: f64) {}

    fn params(&self) -> &[ParamDef] {
        &self.params
    }

    fn get_param(&self, id: ParamId) -> Option<f64> {
        match id {
            Self::PARAM_PULL => Some(self.pull),
            Self::PARAM_LIMIT_ENABLE => Some(self.limit_enable),
            Self::PARAM_GAIN => Some(self.gain),
            Self::PARAM_PUSH => Some(self.push),
            Self::PARAM_LIMIT => Some(self.limit),
            _ => None,
        }
    }

    fn set_param(&mut self, id: ParamId, value: f64) {
        match id {
            Self::PARAM_PULL => self.pull = value.clamp(0.0, 1.0),
            Self::PARAM_LIMIT_ENABLE => self.limit_enable = value.clamp(0.0, 1.0),
            Self::PARAM_GAIN => self.gain = value.clamp(0.0, 2.0),
            Self::PARAM_PUSH => self.push = value.clamp(0.0, 2.0),
            Self::PARAM_LIMIT => self.limit = value.clamp(0.0, 2.0),
            _ => {}
        }
    }

    fn type_id(&self) -> &'static str {
        "clip_limiter"
    }
}

/// Clock Divider / Sequencer
///
/// Counts clock edges through a 16-tick cycle and drives 16 outputs that are
/// either integer-division taps or a one-hot sequence. Outputs are
/// pulse-shaped: they all rest at 0V whenever the clock is low, and active
/// taps carry the clock voltage itself (or the seq input's voltage when that
/// port is patched) while the clock is high.
///
/// A reset-input edge is deferred: it arms `reset_pending`, which snaps the
/// counter back to tick 1 atomically with the next clock edge. The two
/// configuration flags ([`divide_by_one`](Self::divide_by_one) and
/// [`first_tick`](Self::first_tick)) persist through save/restore.
pub struct ClockDivider {
    seq_mode: f64,
    tick_index: u32,
    reset_pending: bool,
    clock_trigger: SchmittTrigger,
    reset_trigger: SchmittTrigger,
    divide_by_one: bool,
    first_tick: bool,
    spec: PortSpec,
    params: Vec<ParamDef>,
}

impl ClockDivider {
    pub const IN_CLOCK: PortId = 0;
    pub const IN_RESET: PortId = 1;
    pub const IN_SEQ: PortId = 2;
    /// First of 16 consecutive output ids; tap `d` divides by `d + 1`
    pub const OUT_DIV: PortId = 10;

    pub const PARAM_SEQ_MODE: ParamId = 0;

    /// Length of the divider cycle
    pub const NUM_TICKS: u32 = 16;

    pub fn new() -> Self {
        let outputs = (0..Self::NUM_TICKS)
            .map(|d| {
                PortDef::new(Self::OUT_DIV + d, format!("div{}", d + 1), SignalKind::Clock)
            })
            .collect();

        Self {
            seq_mode: 0.0,
            tick_index: 1,
            reset_pending: false,
            clock_trigger: SchmittTrigger::new(),
            reset_trigger: SchmittTrigger::new(),
            divide_by_one: false,
            first_tick: false,
            spec: PortSpec {
                inputs: vec![
                    PortDef::new(Self::IN_CLOCK, "clock", SignalKind::Clock),
                    PortDef::new(Self::IN_RESET, "reset", SignalKind::Trigger),
                    PortDef::new(Self::IN_SEQ, "seq", SignalKind::CvBipolar),
                ],
                outputs,
            },
            params: vec![ParamDef::new(
                Self::PARAM_SEQ_MODE,
                "sequencer mode",
                0.0,
                1.0,
                0.0,
            )],
        }
    }

    /// Current position in the 16-tick cycle, in [1, 16]
    pub fn tick_index(&self) -> u32 {
        self.tick_index
    }

    pub fn divide_by_one(&self) -> bool {
        self.divide_by_one
    }

    /// When enabled, tick 1 drives all 16 outputs simultaneously
    pub fn set_divide_by_one(&mut self, enabled: bool) {
        self.divide_by_one = enabled;
    }

    pub fn first_tick(&self) -> bool {
        self.first_tick
    }

    /// When enabled, tap 1 pulses only on tick 1 (first-tick marker)
    pub fn set_first_tick(&mut self, enabled: bool) {
        self.first_tick = enabled;
    }

    /// Whether division tap `d` (0-indexed) is active at the current tick
    fn division_active(&self, d: u32) -> bool {
        if self.tick_index == 1 {
            self.divide_by_one || d == 0
        } else if d == 0 {
            !self.first_tick
        } else {
            self.tick_index % (d + 1) == 0
        }
    }
}

impl Default for ClockDivider {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphModule for ClockDivider {
    fn port_spec(&self) -> &PortSpec {
        &self.spec
    }

    fn tick(&mut self, inputs: &PortValues, outputs: &mut PortValues) {
        let clock_v = inputs.voltage(Self::IN_CLOCK, 0);

        // The reset input only requests; the next clock edge applies
        if self.reset_trigger.process(inputs.voltage(Self::IN_RESET, 0)) {
            self.reset_pending = true;
        }

        if inputs.is_connected(Self::IN_CLOCK) && self.clock_trigger.process(clock_v) {
            self.tick_index += 1;
            if self.reset_pending || self.tick_index > Self::NUM_TICKS {
                self.tick_index = 1;
                self.reset_pending = false;
            }
        }

        // Pulse-shaped outputs: everything rests at 0V while the clock is low
        if !self.clock_trigger.is_high() {
            for d in 0..Self::NUM_TICKS {
                outputs.set(Self::OUT_DIV + d, 0.0);
            }
            return;
        }

        // The seq input substitutes the value driven onto active outputs
        let out_v = if inputs.is_connected(Self::IN_SEQ) {
            inputs.voltage(Self::IN_SEQ, 0)
        } else {
            clock_v
        };

        if self.seq_mode >= 1.0 {
            // One-hot sequence
            for d in 0..Self::NUM_TICKS {
                let v = if d == self.tick_index - 1 { out_v } else { 0.0 };
                outputs.set(Self::OUT_DIV + d, v);
            }
        } else {
            for d in 0..Self::NUM_TICKS {
                let v = if self.division_active(d) { out_v } else { 0.0 };
                outputs.set(Self::OUT_DIV + d, v);
            }
        }
    }

    fn reset(&mut self) {
        self.tick_index = 1;
        self.reset_pending = false;
        self.clock_trigger.reset();
        self.reset_trigger.reset();
        // Configuration flags survive an explicit reset
    }

    fn set_sample_rate(&mut self, _: f64) {}

    fn params(&self) -> &[ParamDef] {
        &self.params
    }

    fn get_param(&self, id: ParamId) -> Option<f64> {
        match id {
            Self::PARAM_SEQ_MODE => Some(self.seq_mode),
            _ => None,
        }
    }

    fn set_param(&mut self, id: ParamId, value: f64) {
        if id == Self::PARAM_SEQ_MODE {
            self.seq_mode = value.clamp(0.0, 1.0);
        }
    }

    fn type_id(&self) -> &'static str {
        "clock_divider"
    }

    fn serialize_state(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "first_tick": self.first_tick,
            "divide_by_one": self.divide_by_one,
        }))
    }

    fn deserialize_state(&mut self, state: &serde_json::Value) -> Result<(), String> {
        if let Some(first) = state.get("first_tick").and_then(|v| v.as_bool()) {
            self.first_tick = first;
        }
        if let Some(div_one) = state.get("divide_by_one").and_then(|v| v.as_bool()) {
            self.divide_by_one = div_one;
        }
        Ok(())
    }
}

/// Wave Folder
///
/// Modulo-based wave folding with one-sample feedback, a shape blend between
/// two fold kernels, and dry/wet mixing. The input is channel-summed to mono.
///
/// Folding subtracts a quantized copy of the signal from itself: the first
/// kernel truncates toward zero (one-sided fold), the second rounds against a
/// doubled divisor (symmetric fold), and `shape` crossfades between them.
/// When the effective divisor collapses below 0.01 the fold stage is
/// bypassed and the wet signal is 0.
pub struct WaveFolder {
    gain: f64,
    feedback: f64,
    shape: f64,
    mix: f64,
    fold: f64,
    gain_cv: f64,
    feedback_cv: f64,
    shape_cv: f64,
    mix_cv: f64,
    last_wet: f64,
    spec: PortSpec,
    params: Vec<ParamDef>,
}

impl WaveFolder {
    pub const IN_AUDIO: PortId = 0;
    pub const IN_GAIN: PortId = 1;
    pub const IN_FEEDBACK: PortId = 2;
    pub const IN_SHAPE: PortId = 3;
    pub const IN_MIX: PortId = 4;
    pub const IN_FOLD: PortId = 5;
    pub const OUT_AUDIO: PortId = 10;

    pub const PARAM_GAIN: ParamId = 0;
    pub const PARAM_FEEDBACK: ParamId = 1;
    pub const PARAM_SHAPE: ParamId = 2;
    pub const PARAM_MIX: ParamId = 3;
    pub const PARAM_FOLD: ParamId = 4;
    pub const PARAM_GAIN_CV: ParamId = 5;
    pub const PARAM_FEEDBACK_CV: ParamId = 6;
    pub const PARAM_SHAPE_CV: ParamId = 7;
    pub const PARAM_MIX_CV: ParamId = 8;

    pub fn new() -> Self {
        Self {
            gain: 1.0,
            feedback: 0.0,
            shape: 0.0,
            mix: 1.0,
            fold: 5.0,
            gain_cv: 0.0,
            feedback_cv: 0.0,
            shape_cv: 0.0,
            mix_cv: 0.0,
            last_wet: 0.0,
            spec: PortSpec {
                inputs: vec![
                    PortDef::new(Self::IN_AUDIO, "audio", SignalKind::Audio),
                    PortDef::new(Self::IN_GAIN, "gain", SignalKind::CvBipolar),
                    PortDef::new(Self::IN_FEEDBACK, "feedback", SignalKind::CvBipolar),
                    PortDef::new(Self::IN_SHAPE, "shape", SignalKind::CvBipolar),
                    PortDef::new(Self::IN_MIX, "mix", SignalKind::CvBipolar),
                    PortDef::new(Self::IN_FOLD, "fold", SignalKind::CvBipolar),
                ],
                outputs: vec![PortDef::new(Self::OUT_AUDIO, "audio", SignalKind::Audio)],
            },
            params: vec![
                ParamDef::new(Self::PARAM_GAIN, "gain", 0.0, 10.0, 1.0),
                ParamDef::new(Self::PARAM_FEEDBACK, "feedback", 0.0, 2.0, 0.0),
                ParamDef::new(Self::PARAM_SHAPE, "shape", 0.0, 1.0, 0.0),
                ParamDef::new(Self::PARAM_MIX, "mix", 0.0, 1.0, 1.0),
                ParamDef::new(Self::PARAM_FOLD, "fold position", 0.0, 10.0, 5.0),
                ParamDef::new(Self::PARAM_GAIN_CV, "gain cv", -1.0, 1.0, 0.0),
                ParamDef::new(Self::PARAM_FEEDBACK_CV, "feedback cv", -1.0, 1.0, 0.0),
                ParamDef::new(Self::PARAM_SHAPE_CV, "shape cv", -1.0, 1.0, 0.0),
                ParamDef::new(Self::PARAM_MIX_CV, "mix cv", -1.0, 1.0, 0.0),
            ],
        }
    }
}

impl Default for WaveFolder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphModule for WaveFolder {
    fn port_spec(&self) -> &PortSpec {
        &self.spec
    }

    fn tick(&mut self, inputs: &PortValues, outputs: &mut PortValues) {
        let dry = inputs.sum(Self::IN_AUDIO);
        let gain = self.gain + self.gain_cv * inputs.voltage(Self::IN_GAIN, 0);
        let mut divisor = self.fold + inputs.voltage(Self::IN_FOLD, 0);

        let feedback =
            self.feedback + self.feedback_cv * inputs.voltage(Self::IN_FEEDBACK, 0) / 10.0;
        let input = dry * gain + self.last_wet * feedback;

        let mut wet = 0.0;
        // A near-zero divisor would fold everything away; bypass instead
        if divisor.abs() > 0.01 {
            let shape = (self.shape + self.shape_cv * inputs.voltage(Self::IN_SHAPE, 0) / 10.0)
                .clamp(0.0, 1.0);

            let folded = (input / divisor).trunc() * divisor;
            divisor *= 2.0;
            let folded_signed = (input / divisor).round() * divisor;

            wet = input - crossfade(folded, folded_signed, shape);
        }
        self.last_wet = wet;

        let mix = (self.mix + self.mix_cv * inputs.voltage(Self::IN_MIX, 0) / 10.0)
            .clamp(0.0, 1.0);
        outputs.set(Self::OUT_AUDIO, crossfade(dry, wet, mix));
    }

    fn reset(&mut self) {
        self.last_wet = 0.0;
    }

    fn set_sample_rate(&mut self, _: f64) {}

    fn params(&self) -> &[ParamDef] {
        &self.params
    }

    fn get_param(&self, id: ParamId) -> Option<f64> {
        match id {
            Self::PARAM_GAIN => Some(self.gain),
            Self::PARAM_FEEDBACK => Some(self.feedback),
            Self::PARAM_SHAPE => Some(self.shape),
            Self::PARAM_MIX => Some(self.mix),
            Self::PARAM_FOLD => Some(self.fold),
            Self::PARAM_GAIN_CV => Some(self.gain_cv),
            Self::PARAM_FEEDBACK_CV => Some(self.feedback_cv),
            Self::PARAM_SHAPE_CV => Some(self.shape_cv),
            Self::PARAM_MIX_CV => Some(self.mix_cv),
            _ => None,
        }
    }

    fn set_param(&mut self, id: ParamId, value: f64) {
        match id {
            Self::PARAM_GAIN => self.gain = value.clamp(0.0, 10.0),
            Self::PARAM_FEEDBACK => self.feedback = value.clamp(0.0, 2.0),
            Self::PARAM_SHAPE => self.shape = value.clamp(0.0, 1.0),
            Self::PARAM_MIX => self.mix = value.clamp(0.0, 1.0),
            Self::PARAM_FOLD => self.fold = value.clamp(0.0, 10.0),
            Self::PARAM_GAIN_CV => self.gain_cv = value.clamp(-1.0, 1.0),
            Self::PARAM_FEEDBACK_CV => self.feedback_cv = value.clamp(-1.0, 1.0),
            Self::PARAM_SHAPE_CV => self.shape_cv = value.clamp(-1.0, 1.0),
            Self::PARAM_MIX_CV => self.mix_cv = value.clamp(-1.0, 1.0),
            _ => {}
        }
    }

    fn type_id(&self) -> &'static str {
        "wave_folder"
    }
}
