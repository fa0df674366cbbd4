//! Frame plans: the ordered steps one AA technique needs for a frame.
//!
//! Drivers only describe the frame. `frame::FrameOrchestrator` validates a
//! plan against the history state and encodes it; nothing here touches wgpu,
//! so every technique's sequencing is testable without a GPU.

use aastudio_gpu_shared::config::Technique;
use thiserror::Error;

/// Every texture a plan can read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    SceneColor,
    MsaaColor,
    Resolve,
    Edges,
    BlendWeights,
    HistoryCurrent,
    HistoryPrevious,
    TaaOutput,
    AreaLookup,
    SearchLookup,
    /// The surface texture acquired for this frame.
    Display,
}

impl Slot {
    /// Viewport-sized off-screen targets owned by `RenderTargets`.
    pub const TARGETS: [Slot; 8] = [
        Slot::SceneColor,
        Slot::MsaaColor,
        Slot::Resolve,
        Slot::Edges,
        Slot::BlendWeights,
        Slot::HistoryCurrent,
        Slot::HistoryPrevious,
        Slot::TaaOutput,
    ];

    /// Contents survive from one frame to the next.
    pub fn is_history(self) -> bool {
        matches!(self, Slot::HistoryCurrent | Slot::HistoryPrevious)
    }

    /// Uploaded once at startup, always readable.
    pub fn is_lookup(self) -> bool {
        matches!(self, Slot::AreaLookup | Slot::SearchLookup)
    }

    pub fn label(self) -> &'static str {
        match self {
            Slot::SceneColor => "Scene Color",
            Slot::MsaaColor => "MSAA Color",
            Slot::Resolve => "MSAA Resolve",
            Slot::Edges => "SMAA Edges",
            Slot::BlendWeights => "SMAA Blend Weights",
            Slot::HistoryCurrent => "History Current",
            Slot::HistoryPrevious => "History Previous",
            Slot::TaaOutput => "TAA Output",
            Slot::AreaLookup => "SMAA Area Lookup",
            Slot::SearchLookup => "SMAA Search Lookup",
            Slot::Display => "Display",
        }
    }
}

/// Full-screen fragment programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    Blit,
    Fxaa,
    SmaaEdge,
    SmaaWeight,
    SmaaBlend,
    Taa,
}

impl Effect {
    pub const ALL: [Effect; 6] = [
        Effect::Blit,
        Effect::Fxaa,
        Effect::SmaaEdge,
        Effect::SmaaWeight,
        Effect::SmaaBlend,
        Effect::Taa,
    ];

    /// Number of texture units the shader samples.
    pub fn texture_units(self) -> usize {
        match self {
            Effect::Blit | Effect::Fxaa | Effect::SmaaEdge => 1,
            Effect::SmaaBlend | Effect::Taa => 2,
            Effect::SmaaWeight => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Effect::Blit => "Pass-through",
            Effect::Fxaa => "FXAA",
            Effect::SmaaEdge => "SMAA Edge Detection",
            Effect::SmaaWeight => "SMAA Blend Weights",
            Effect::SmaaBlend => "SMAA Neighborhood Blend",
            Effect::Taa => "TAA Resolve",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStep {
    /// Clear `target` and draw the active scene into it.
    Scene { target: Slot },
    /// Collapse a multisample target into a single-sample one.
    Resolve { src: Slot, dst: Slot },
    /// Whole-texture GPU copy.
    Copy { src: Slot, dst: Slot },
    /// Draw the shared quad with `effect`, sampling `inputs` as texture units 0.. in order.
    Fullscreen {
        effect: Effect,
        inputs: &'static [Slot],
        output: Slot,
    },
    /// End of the frame's GPU work.
    Present,
}

impl FrameStep {
    pub fn reads(&self) -> &[Slot] {
        match self {
            FrameStep::Resolve { src, .. } | FrameStep::Copy { src, .. } => std::slice::from_ref(src),
            FrameStep::Fullscreen { inputs, .. } => *inputs,
            FrameStep::Scene { .. } | FrameStep::Present => &[],
        }
    }

    pub fn writes(&self) -> Option<Slot> {
        match *self {
            FrameStep::Scene { target } => Some(target),
            FrameStep::Resolve { dst, .. } | FrameStep::Copy { dst, .. } => Some(dst),
            FrameStep::Fullscreen { output, .. } => Some(output),
            FrameStep::Present => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("step {step} reads {slot:?} before anything wrote it")]
    UninitializedRead { step: usize, slot: Slot },

    #[error("plan does not end with a present step")]
    MissingPresent,

    #[error("plan must begin with the scene pass")]
    SceneNotFirst,

    #[error("nothing writes the display before present")]
    DisplayNotWritten,

    #[error("{effect:?} samples {expected} texture(s) but step {step} binds {actual}")]
    InputCount {
        step: usize,
        effect: Effect,
        expected: usize,
        actual: usize,
    },

    #[error("step {step} reads and writes {slot:?}")]
    Feedback { step: usize, slot: Slot },
}

/// Which history slots hold data written since they were last (re)created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryState {
    current: bool,
    previous: bool,
}

impl HistoryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_written(&self, slot: Slot) -> bool {
        match slot {
            Slot::HistoryCurrent => self.current,
            Slot::HistoryPrevious => self.previous,
            _ => false,
        }
    }

    pub fn mark_written(&mut self, slot: Slot) {
        match slot {
            Slot::HistoryCurrent => self.current = true,
            Slot::HistoryPrevious => self.previous = true,
            _ => {}
        }
    }

    /// Targets were recreated; their contents are undefined.
    pub fn invalidate(&mut self) {
        *self = Self::default();
    }

    /// Record the history writes of a plan that was submitted.
    pub fn record(&mut self, plan: &FramePlan) {
        for slot in plan.steps().iter().filter_map(FrameStep::writes) {
            self.mark_written(slot);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePlan {
    technique: Technique,
    steps: Vec<FrameStep>,
}

impl FramePlan {
    /// Start a plan whose first step draws the scene into `scene_target`.
    pub fn begin(technique: Technique, scene_target: Slot) -> Self {
        Self {
            technique,
            steps: vec![FrameStep::Scene {
                target: scene_target,
            }],
        }
    }

    /// Build from raw steps. Used for plans assembled outside a driver.
    pub fn from_steps(technique: Technique, steps: Vec<FrameStep>) -> Self {
        Self { technique, steps }
    }

    pub fn push(&mut self, step: FrameStep) -> &mut Self {
        self.steps.push(step);
        self
    }

    pub fn copy(&mut self, src: Slot, dst: Slot) -> &mut Self {
        self.push(FrameStep::Copy { src, dst })
    }

    pub fn fullscreen(&mut self, effect: Effect, inputs: &'static [Slot], output: Slot) -> &mut Self {
        self.push(FrameStep::Fullscreen {
            effect,
            inputs,
            output,
        })
    }

    pub fn finish(mut self) -> Self {
        self.steps.push(FrameStep::Present);
        self
    }

    pub fn technique(&self) -> Technique {
        self.technique
    }

    pub fn steps(&self) -> &[FrameStep] {
        &self.steps
    }

    pub fn scene_target(&self) -> Option<Slot> {
        match self.steps.first() {
            Some(FrameStep::Scene { target }) => Some(*target),
            _ => None,
        }
    }

    /// Walk the steps in order and reject reads of slots that hold no data
    /// for this frame.
    ///
    /// Transient targets are only readable after an earlier step of the same
    /// plan wrote them. History slots are also readable when `history` says
    /// a previous frame wrote them. Lookup textures are always readable and
    /// the display never is.
    pub fn validate(&self, history: &HistoryState) -> Result<(), PlanError> {
        if !matches!(self.steps.first(), Some(FrameStep::Scene { .. })) {
            return Err(PlanError::SceneNotFirst);
        }
        if self.steps.last() != Some(&FrameStep::Present) {
            return Err(PlanError::MissingPresent);
        }

        let mut written: Vec<Slot> = Vec::with_capacity(self.steps.len());
        for (step_index, step) in self.steps.iter().enumerate() {
            if step_index > 0 && matches!(step, FrameStep::Scene { .. }) {
                return Err(PlanError::SceneNotFirst);
            }
            if step_index + 1 < self.steps.len() && *step == FrameStep::Present {
                return Err(PlanError::MissingPresent);
            }

            if let FrameStep::Fullscreen { effect, inputs, .. } = step {
                if inputs.len() != effect.texture_units() {
                    return Err(PlanError::InputCount {
                        step: step_index,
                        effect: *effect,
                        expected: effect.texture_units(),
                        actual: inputs.len(),
                    });
                }
            }

            for &slot in step.reads() {
                let readable = slot.is_lookup()
                    || written.contains(&slot)
                    || (slot.is_history() && history.is_written(slot));
                if !readable {
                    return Err(PlanError::UninitializedRead {
                        step: step_index,
                        slot,
                    });
                }
            }

            if let Some(out) = step.writes() {
                if step.reads().contains(&out) {
                    return Err(PlanError::Feedback {
                        step: step_index,
                        slot: out,
                    });
                }
                written.push(out);
            }
        }

        if !written.contains(&Slot::Display) {
            return Err(PlanError::DisplayNotWritten);
        }
        Ok(())
    }
}

/// One implementation per technique. The orchestrator picks the driver for
/// the configured technique every frame.
pub trait AaDriver {
    fn technique(&self) -> Technique;

    /// Where the scene pass draws.
    fn scene_target(&self) -> Slot;

    fn plan(&self, history: &HistoryState) -> FramePlan;

    /// Whether the projection should be sub-pixel jittered.
    fn jitters_projection(&self) -> bool {
        false
    }
}

pub struct NoAa;
pub struct MsaaDriver;
pub struct FxaaDriver;
pub struct SmaaDriver;
pub struct TaaDriver;

impl AaDriver for NoAa {
    fn technique(&self) -> Technique {
        Technique::None
    }

    fn scene_target(&self) -> Slot {
        Slot::Display
    }

    fn plan(&self, _history: &HistoryState) -> FramePlan {
        FramePlan::begin(self.technique(), self.scene_target()).finish()
    }
}

impl AaDriver for MsaaDriver {
    fn technique(&self) -> Technique {
        Technique::Msaa
    }

    fn scene_target(&self) -> Slot {
        Slot::MsaaColor
    }

    fn plan(&self, _history: &HistoryState) -> FramePlan {
        let mut plan = FramePlan::begin(self.technique(), self.scene_target());
        plan.push(FrameStep::Resolve {
            src: Slot::MsaaColor,
            dst: Slot::Resolve,
        })
        .copy(Slot::Resolve, Slot::HistoryCurrent)
        .fullscreen(Effect::Blit, &[Slot::Resolve], Slot::Display)
        .copy(Slot::Resolve, Slot::HistoryPrevious);
        plan.finish()
    }
}

impl AaDriver for FxaaDriver {
    fn technique(&self) -> Technique {
        Technique::Fxaa
    }

    fn scene_target(&self) -> Slot {
        Slot::SceneColor
    }

    fn plan(&self, _history: &HistoryState) -> FramePlan {
        let mut plan = FramePlan::begin(self.technique(), self.scene_target());
        plan.copy(Slot::SceneColor, Slot::HistoryCurrent)
            .fullscreen(Effect::Fxaa, &[Slot::SceneColor], Slot::Display)
            .copy(Slot::SceneColor, Slot::HistoryPrevious);
        plan.finish()
    }
}

impl AaDriver for SmaaDriver {
    fn technique(&self) -> Technique {
        Technique::Smaa
    }

    fn scene_target(&self) -> Slot {
        Slot::SceneColor
    }

    fn plan(&self, _history: &HistoryState) -> FramePlan {
        let mut plan = FramePlan::begin(self.technique(), self.scene_target());
        plan.copy(Slot::SceneColor, Slot::HistoryCurrent)
            .fullscreen(Effect::SmaaEdge, &[Slot::SceneColor], Slot::Edges)
            .fullscreen(
                Effect::SmaaWeight,
                &[Slot::Edges, Slot::AreaLookup, Slot::SearchLookup],
                Slot::BlendWeights,
            )
            .fullscreen(
                Effect::SmaaBlend,
                &[Slot::SceneColor, Slot::BlendWeights],
                Slot::Display,
            )
            .copy(Slot::SceneColor, Slot::HistoryPrevious);
        plan.finish()
    }
}

impl AaDriver for TaaDriver {
    fn technique(&self) -> Technique {
        Technique::Taa
    }

    fn scene_target(&self) -> Slot {
        Slot::SceneColor
    }

    fn plan(&self, history: &HistoryState) -> FramePlan {
        let mut plan = FramePlan::begin(self.technique(), self.scene_target());
        plan.copy(Slot::SceneColor, Slot::HistoryCurrent);
        if !history.is_written(Slot::HistoryPrevious) {
            plan.copy(Slot::HistoryCurrent, Slot::HistoryPrevious);
        }
        plan.fullscreen(
            Effect::Taa,
            &[Slot::HistoryCurrent, Slot::HistoryPrevious],
            Slot::TaaOutput,
        )
        .copy(Slot::TaaOutput, Slot::HistoryPrevious)
        .fullscreen(Effect::Blit, &[Slot::TaaOutput], Slot::Display);
        plan.finish()
    }

    fn jitters_projection(&self) -> bool {
        true
    }
}

pub fn driver_for(technique: Technique) -> &'static dyn AaDriver {
    match technique {
        Technique::None => &NoAa,
        Technique::Msaa => &MsaaDriver,
        Technique::Fxaa => &FxaaDriver,
        Technique::Smaa => &SmaaDriver,
        Technique::Taa => &TaaDriver,
    }
}
