use crate::events::Event;

/// Published once per rendered frame, after the world and before the HUD.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOverlaysEvent {
    pub frame: u64,
    pub partial_ticks: f32,
}

impl Event for RenderOverlaysEvent {}
