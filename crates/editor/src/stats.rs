/// Counters maintained by the frame orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub ticks: u64,
    pub editing_ticks: u64,
    pub scene_passes: u64,
    pub pick_passes: u64,
    pub script_dispatches: u64,
    pub draws: u64,
    pub requests: u64,
}
