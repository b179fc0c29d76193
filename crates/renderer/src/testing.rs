//! Recording backend double for GPU-free tests.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use asset::{MaterialInfo, Mesh, MeshPart, ModelData, ShaderSources, TextureData, TextureFormat, ViewerAssets};
use corelib::{Mat4, ShaderStage, ViewerError, ViewerResult};

use crate::backend::{DrawSlot, GpuBackend};

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    CreateBuffer { id: u32, floats: usize },
    CreateTexture { id: u32, width: u32, height: u32 },
    CreateProgram { id: u32 },
    DestroyBuffer(u32),
    DestroyTexture(u32),
    DestroyProgram(u32),
    BeginFrame,
    SkipFrame,
    UploadMvp(Mat4),
    /// (position buffer, texcoord buffer, texture, vertex count) per slot.
    Draw { program: u32, slots: Vec<(u32, u32, u32, u32)> },
    Present,
}

/// Shared view of everything a [`RecordingBackend`] was asked to do.
#[derive(Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<Event>>>);

impl EventLog {
    fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.0.borrow().iter().filter(|e| pred(e)).count()
    }

    pub fn buffer_sizes(&self) -> Vec<usize> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::CreateBuffer { floats, .. } => Some(*floats),
                _ => None,
            })
            .collect()
    }

    pub fn draws(&self) -> Vec<Vec<u32>> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Draw { slots, .. } => Some(slots.iter().map(|s| s.3).collect()),
                _ => None,
            })
            .collect()
    }

    pub fn mvps(&self) -> Vec<Mat4> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::UploadMvp(m) => Some(*m),
                _ => None,
            })
            .collect()
    }

    pub fn destroyed(&self) -> usize {
        self.count(|e| {
            matches!(
                e,
                Event::DestroyBuffer(_) | Event::DestroyTexture(_) | Event::DestroyProgram(_)
            )
        })
    }

    /// Every created handle destroyed exactly once, nothing else destroyed.
    pub fn assert_balanced(&self) {
        let events = self.0.borrow();
        let mut live: HashSet<(char, u32)> = HashSet::new();
        for e in events.iter() {
            let (created, key) = match e {
                Event::CreateBuffer { id, .. } => (true, ('b', *id)),
                Event::CreateTexture { id, .. } => (true, ('t', *id)),
                Event::CreateProgram { id } => (true, ('p', *id)),
                Event::DestroyBuffer(id) => (false, ('b', *id)),
                Event::DestroyTexture(id) => (false, ('t', *id)),
                Event::DestroyProgram(id) => (false, ('p', *id)),
                _ => continue,
            };
            if created {
                assert!(live.insert(key), "handle {key:?} created twice");
            } else {
                assert!(live.remove(&key), "handle {key:?} destroyed without a live creation");
            }
        }
        assert!(live.is_empty(), "leaked handles: {live:?}");
    }
}

pub struct RecBuffer(u32);
pub struct RecTexture(u32);
pub struct RecProgram(u32);
pub struct RecFrame;

pub struct RecordingBackend {
    log: EventLog,
    next_id: u32,
    buffers_created: usize,
    frames_begun: usize,
    pub fail_program: Option<ShaderStage>,
    /// Fail buffer creation once this many buffers exist.
    pub fail_buffer_after: Option<usize>,
    /// Frame indices (0-based) for which the surface reports "reconfigured".
    pub skip_frames: HashSet<usize>,
}

impl RecordingBackend {
    pub fn new() -> (Self, EventLog) {
        let log = EventLog::default();
        let backend = Self {
            log: log.clone(),
            next_id: 0,
            buffers_created: 0,
            frames_begun: 0,
            fail_program: None,
            fail_buffer_after: None,
            skip_frames: HashSet::new(),
        };
        (backend, log)
    }

    fn id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl GpuBackend for RecordingBackend {
    type Buffer = RecBuffer;
    type Texture = RecTexture;
    type Program = RecProgram;
    type Frame = RecFrame;

    fn create_vertex_buffer(&mut self, label: &str, data: &[f32]) -> ViewerResult<RecBuffer> {
        if self.fail_buffer_after == Some(self.buffers_created) {
            return Err(ViewerError::Context(format!("out of device memory for {label}")));
        }
        self.buffers_created += 1;
        let id = self.id();
        self.log.push(Event::CreateBuffer { id, floats: data.len() });
        Ok(RecBuffer(id))
    }

    fn create_texture(&mut self, _label: &str, texture: &TextureData) -> ViewerResult<RecTexture> {
        let id = self.id();
        self.log.push(Event::CreateTexture {
            id,
            width: texture.width,
            height: texture.height,
        });
        Ok(RecTexture(id))
    }

    fn create_program(&mut self, _sources: &ShaderSources) -> ViewerResult<RecProgram> {
        if let Some(stage) = self.fail_program {
            return Err(ViewerError::shader(stage, "rejected by test backend"));
        }
        let id = self.id();
        self.log.push(Event::CreateProgram { id });
        Ok(RecProgram(id))
    }

    fn destroy_buffer(&mut self, buffer: RecBuffer) {
        self.log.push(Event::DestroyBuffer(buffer.0));
    }

    fn destroy_texture(&mut self, texture: RecTexture) {
        self.log.push(Event::DestroyTexture(texture.0));
    }

    fn destroy_program(&mut self, program: RecProgram) {
        self.log.push(Event::DestroyProgram(program.0));
    }

    fn begin_frame(&mut self) -> ViewerResult<Option<RecFrame>> {
        let index = self.frames_begun;
        self.frames_begun += 1;
        if self.skip_frames.contains(&index) {
            self.log.push(Event::SkipFrame);
            return Ok(None);
        }
        self.log.push(Event::BeginFrame);
        Ok(Some(RecFrame))
    }

    fn upload_mvp(&mut self, _program: &RecProgram, mvp: Mat4) {
        self.log.push(Event::UploadMvp(mvp));
    }

    fn draw<'a, I>(&mut self, _frame: &mut RecFrame, program: &RecProgram, slots: I)
    where
        I: IntoIterator<Item = DrawSlot<'a, RecBuffer, RecTexture>>,
    {
        let slots = slots
            .into_iter()
            .map(|s| (s.positions.0, s.texcoords.0, s.texture.0, s.vertex_count))
            .collect();
        self.log.push(Event::Draw {
            program: program.0,
            slots,
        });
    }

    fn present(&mut self, _frame: RecFrame) {
        self.log.push(Event::Present);
    }
}

/// Unit cube: 8 corners, 12 triangles, flattened to 36 vertices.
pub fn cube_mesh() -> Mesh {
    const CORNERS: [[f32; 3]; 8] = [
        [-1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0],
        [1.0, 1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [1.0, -1.0, 1.0],
        [1.0, 1.0, 1.0],
        [-1.0, 1.0, 1.0],
    ];
    const TRIANGLES: [[usize; 3]; 12] = [
        [4, 5, 6], [4, 6, 7],
        [0, 2, 1], [0, 3, 2],
        [3, 2, 6], [3, 6, 7],
        [0, 5, 1], [0, 4, 5],
        [0, 3, 7], [0, 7, 4],
        [1, 2, 6], [1, 6, 5],
    ];
    const UVS: [[f32; 2]; 3] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]];

    let mut mesh = Mesh::with_capacity(36);
    for tri in TRIANGLES {
        for (corner, &v) in tri.iter().enumerate() {
            mesh.push_vertex(CORNERS[v], UVS[corner]);
        }
    }
    mesh
}

/// 2x2 solid-colour RGB texture.
pub fn solid_texture(color: [u8; 3]) -> TextureData {
    TextureData {
        data: color.repeat(4),
        width: 2,
        height: 2,
        format: TextureFormat::Rgb8,
    }
}

/// Textured unit cube with placeholder shader text.
pub fn cube_assets() -> ViewerAssets {
    ViewerAssets {
        model: ModelData {
            parts: vec![MeshPart {
                name: "Cube".into(),
                mesh: cube_mesh(),
                material: Some(0),
            }],
            materials: vec![MaterialInfo {
                name: "Crate".into(),
                diffuse_texture: Some("crate.png".into()),
            }],
        },
        textures: vec![Some(solid_texture([180, 120, 60]))],
        shaders: ShaderSources::from_strings("// vertex", "// fragment"),
    }
}
