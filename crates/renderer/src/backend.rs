//! The seam between resource/frame bookkeeping and an actual graphics API.

use asset::{ShaderSources, TextureData};
use corelib::{Mat4, ViewerResult};

/// Vertex buffer slot (and shader location) holding positions.
pub const POSITION_SLOT: u32 = 0;
/// Vertex buffer slot (and shader location) holding texture coordinates.
pub const TEXCOORD_SLOT: u32 = 1;

/// One material slot to draw: both attribute streams plus its texture.
pub struct DrawSlot<'a, Buf, Tex> {
    pub positions: &'a Buf,
    pub texcoords: &'a Buf,
    pub texture: &'a Tex,
    pub vertex_count: u32,
}

/// Device object factory and command sink.
///
/// Every handle returned by a `create_*` call is handed back to the matching
/// `destroy_*` call exactly once by [`crate::ResourceManager`].
pub trait GpuBackend {
    type Buffer;
    type Texture;
    type Program;
    type Frame;

    /// Vertex buffer sized exactly to `data`, uploaded in one go.
    fn create_vertex_buffer(&mut self, label: &str, data: &[f32]) -> ViewerResult<Self::Buffer>;

    /// 2D texture with nearest filtering and a single mip level.
    fn create_texture(&mut self, label: &str, texture: &TextureData) -> ViewerResult<Self::Texture>;

    /// Compile both stages and link them into one program with an MVP uniform.
    fn create_program(&mut self, sources: &ShaderSources) -> ViewerResult<Self::Program>;

    fn destroy_buffer(&mut self, buffer: Self::Buffer);
    fn destroy_texture(&mut self, texture: Self::Texture);
    fn destroy_program(&mut self, program: Self::Program);

    /// Acquire the next frame. `Ok(None)` means the surface had to be
    /// reconfigured and nothing should be drawn this iteration.
    fn begin_frame(&mut self) -> ViewerResult<Option<Self::Frame>>;

    fn upload_mvp(&mut self, program: &Self::Program, mvp: Mat4);

    /// Clear colour and depth, bind `program`, then draw every slot as a
    /// non-indexed triangle list. Attribute bindings end with the pass.
    fn draw<'a, I>(&mut self, frame: &mut Self::Frame, program: &Self::Program, slots: I)
    where
        I: IntoIterator<Item = DrawSlot<'a, Self::Buffer, Self::Texture>>,
        Self::Buffer: 'a,
        Self::Texture: 'a;

    /// Submit and present; blocks on vsync.
    fn present(&mut self, frame: Self::Frame);
}
