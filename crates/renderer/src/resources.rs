//! Ownership of every device object the viewer creates.

use asset::{Mesh, ModelData, ShaderSources, TextureData, ViewerAssets};
use corelib::{Mat4, ViewerError, ViewerResult};

use crate::backend::{DrawSlot, GpuBackend};

/// Index of an uploaded texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureId(usize);

/// Index of an uploaded mesh slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotId(usize);

struct MeshSlot<Buf> {
    positions: Buf,
    texcoords: Buf,
    texture: TextureId,
    vertex_count: u32,
}

/// Owns a backend plus every buffer, texture and program created through it.
///
/// Handles are destroyed exactly once, by [`ResourceManager::release`] or on
/// drop, whichever comes first. The backend itself (surface, device, window)
/// is dropped only after that.
pub struct ResourceManager<B: GpuBackend> {
    program: Option<B::Program>,
    textures: Vec<B::Texture>,
    slots: Vec<MeshSlot<B::Buffer>>,
    backend: B,
}

impl<B: GpuBackend> ResourceManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            program: None,
            textures: Vec::new(),
            slots: Vec::new(),
            backend,
        }
    }

    /// Upload everything one model needs: a texture per used material (plus a
    /// shared white texture for untextured shapes), the program, then one
    /// position/texcoord buffer pair per shape.
    ///
    /// On error, whatever was already created is released before returning.
    pub fn setup(backend: B, assets: &ViewerAssets) -> ViewerResult<Self> {
        let mut resources = Self::new(backend);
        let bindings = resources.upload_textures(assets)?;
        resources.load_program(&assets.shaders)?;
        resources.upload_model(&assets.model, &bindings)?;
        log::info!(
            "GPU resources ready: {} slot(s), {} texture(s), {} vertices",
            resources.slots.len(),
            resources.textures.len(),
            resources.vertex_count()
        );
        Ok(resources)
    }

    /// Uploads textures for the materials the shapes reference and returns
    /// the texture each shape should be drawn with.
    fn upload_textures(&mut self, assets: &ViewerAssets) -> ViewerResult<Vec<TextureId>> {
        let mut by_material: Vec<Option<TextureId>> = vec![None; assets.textures.len()];
        let mut fallback: Option<TextureId> = None;
        let mut bindings = Vec::with_capacity(assets.model.parts.len());

        for part in &assets.model.parts {
            let id = match (part.material, assets.texture_for(part.material)) {
                (Some(m), Some(texture)) => match by_material[m] {
                    Some(id) => id,
                    None => {
                        let label = assets
                            .model
                            .materials
                            .get(m)
                            .map_or("material", |mat| mat.name.as_str());
                        let id = self.upload_texture(label, texture)?;
                        by_material[m] = Some(id);
                        id
                    }
                },
                _ => match fallback {
                    Some(id) => id,
                    None => {
                        log::warn!("Shape '{}' has no diffuse texture, drawing it white", part.name);
                        let id = self.upload_texture("fallback white", &TextureData::white())?;
                        fallback = Some(id);
                        id
                    }
                },
            };
            bindings.push(id);
        }
        Ok(bindings)
    }

    fn upload_model(&mut self, model: &ModelData, textures: &[TextureId]) -> ViewerResult<()> {
        for (part, &texture) in model.parts.iter().zip(textures) {
            self.upload_mesh(&part.name, &part.mesh, texture)?;
        }
        Ok(())
    }

    pub fn upload_texture(&mut self, label: &str, texture: &TextureData) -> ViewerResult<TextureId> {
        let handle = self.backend.create_texture(label, texture)?;
        self.textures.push(handle);
        log::debug!("Uploaded texture '{}' ({}x{})", label, texture.width, texture.height);
        Ok(TextureId(self.textures.len() - 1))
    }

    /// Copy a flattened mesh into two exactly-sized vertex buffers.
    pub fn upload_mesh(&mut self, label: &str, mesh: &Mesh, texture: TextureId) -> ViewerResult<SlotId> {
        if !mesh.is_valid() {
            return Err(ViewerError::asset(
                label,
                format!(
                    "mesh is not a whole triangle list ({} position floats, {} texcoord floats)",
                    mesh.positions.len(),
                    mesh.texcoords.len()
                ),
            ));
        }
        if texture.0 >= self.textures.len() {
            return Err(ViewerError::asset(label, "mesh references an unknown texture"));
        }
        let vertex_count = u32::try_from(mesh.vertex_count())
            .map_err(|_| ViewerError::asset(label, format!("too many vertices (>{})", u32::MAX)))?;

        let positions = self
            .backend
            .create_vertex_buffer(&format!("{label} positions"), &mesh.positions)?;
        let texcoords = match self
            .backend
            .create_vertex_buffer(&format!("{label} texcoords"), &mesh.texcoords)
        {
            Ok(buffer) => buffer,
            Err(e) => {
                self.backend.destroy_buffer(positions);
                return Err(e);
            }
        };

        self.slots.push(MeshSlot {
            positions,
            texcoords,
            texture,
            vertex_count,
        });
        Ok(SlotId(self.slots.len() - 1))
    }

    /// Compile and link the program; replaces (and destroys) any previous one.
    pub fn load_program(&mut self, sources: &ShaderSources) -> ViewerResult<()> {
        let program = self.backend.create_program(sources)?;
        if let Some(old) = self.program.replace(program) {
            self.backend.destroy_program(old);
        }
        Ok(())
    }

    /// Program loaded and at least one slot to draw.
    pub fn is_ready(&self) -> bool {
        self.program.is_some() && !self.slots.is_empty()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn vertex_count(&self) -> u64 {
        self.slots.iter().map(|s| u64::from(s.vertex_count)).sum()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Acquire, draw every slot with `mvp`, present. Returns `false` when the
    /// backend skipped the frame.
    pub fn draw_frame(&mut self, mvp: Mat4) -> ViewerResult<bool> {
        let Some(program) = self.program.as_ref() else {
            return Err(ViewerError::Context("draw requested before a program was loaded".into()));
        };
        let Some(mut frame) = self.backend.begin_frame()? else {
            return Ok(false);
        };

        self.backend.upload_mvp(program, mvp);
        let textures = &self.textures;
        let slots = self.slots.iter().map(|slot| DrawSlot {
            positions: &slot.positions,
            texcoords: &slot.texcoords,
            texture: &textures[slot.texture.0],
            vertex_count: slot.vertex_count,
        });
        self.backend.draw(&mut frame, program, slots);
        self.backend.present(frame);
        Ok(true)
    }

    /// Destroy every handle. Safe to call more than once.
    pub fn release(&mut self) {
        let (slots, textures) = (self.slots.len(), self.textures.len());
        let had_program = self.program.is_some();

        for slot in self.slots.drain(..) {
            self.backend.destroy_buffer(slot.positions);
            self.backend.destroy_buffer(slot.texcoords);
        }
        for texture in self.textures.drain(..) {
            self.backend.destroy_texture(texture);
        }
        if let Some(program) = self.program.take() {
            self.backend.destroy_program(program);
        }

        if slots > 0 || textures > 0 || had_program {
            log::info!(
                "Released {} buffer(s), {} texture(s), {} program(s)",
                slots * 2,
                textures,
                usize::from(had_program)
            );
        }
    }
}

impl<B: GpuBackend> Drop for ResourceManager<B> {
    fn drop(&mut self) {
        self.release();
    }
}
