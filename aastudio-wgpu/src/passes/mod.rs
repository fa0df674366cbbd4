//! Render pass encoders for the AA pipeline.

pub mod forward;
pub mod history;
pub mod postprocess;
pub mod resolve;
