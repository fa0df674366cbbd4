pub mod overlay;
pub mod panel;

pub use overlay::{EguiOverlay, UiFrame};
pub use panel::{FrameStats, PanelAction, PanelView};
