//! Renderer: GPU resource lifecycle, the frame loop, and the wgpu backend
//! both run against.

pub mod backend;
pub mod frame;
pub mod gpu;
pub mod resources;

#[cfg(test)]
mod testing;

pub use backend::{DrawSlot, GpuBackend, POSITION_SLOT, TEXCOORD_SLOT};
pub use frame::{ExitSignals, FrameScheduler, LoopState};
pub use gpu::WgpuBackend;
pub use resources::{ResourceManager, SlotId, TextureId};
