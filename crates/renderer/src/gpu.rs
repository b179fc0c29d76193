//! wgpu implementation of [`GpuBackend`]: surface, device, MSAA/depth
//! targets, program (pipeline + MVP uniform) and per-frame command recording.
//! wgpu = 26.x, winit = 0.30.x

use std::num::NonZeroU64;
use std::sync::Arc;

use asset::{ShaderSources, TextureData};
use bytemuck::{Pod, Zeroable};
use corelib::{GraphicsBackend, Mat4, ShaderStage, ViewerConfig, ViewerError, ViewerResult};
use wgpu::{
    util::DeviceExt,
    AddressMode, BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry,
    BindingType, BlendState, Buffer, BufferBindingType, BufferUsages, ColorTargetState,
    ColorWrites, CommandEncoder, CommandEncoderDescriptor, DepthBiasState, DepthStencilState,
    Device, DeviceDescriptor, ErrorFilter, Extent3d, Features, FilterMode, FragmentState,
    Instance, InstanceDescriptor, Limits, LoadOp, MultisampleState, Operations,
    PipelineLayoutDescriptor, PowerPreference, PresentMode, Queue, RenderPassColorAttachment,
    RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor, Sampler, SamplerBindingType,
    SamplerDescriptor, ShaderModule, ShaderModuleDescriptor, ShaderSource, ShaderStages,
    StoreOp, Surface, SurfaceConfiguration, SurfaceError, SurfaceTexture, TextureDescriptor,
    TextureDimension, TextureFormat, TextureSampleType, TextureUsages, TextureView,
    TextureViewDescriptor, TextureViewDimension, VertexBufferLayout, VertexState,
    VertexStepMode,
};
use winit::{dpi::PhysicalSize, window::Window};

use crate::backend::{DrawSlot, GpuBackend, POSITION_SLOT, TEXCOORD_SLOT};

/// Vertex stream 0: tightly packed positions.
const POSITION_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: std::mem::size_of::<[f32; 3]>() as u64,
    step_mode: VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![POSITION_SLOT => Float32x3],
};

/// Vertex stream 1: tightly packed texture coordinates.
const TEXCOORD_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: std::mem::size_of::<[f32; 2]>() as u64,
    step_mode: VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![TEXCOORD_SLOT => Float32x2],
};

/// MVP uniform (16-byte aligned).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct CameraUniform {
    mvp: [[f32; 4]; 4],
}

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;
const TEXTURE_FORMAT: TextureFormat = TextureFormat::Rgba8UnormSrgb;
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.4,
    a: 1.0,
};

/// Uploaded texture with its fragment-stage bind group.
pub struct GpuTexture {
    texture: wgpu::Texture,
    bind_group: BindGroup,
}

/// Linked pipeline plus the uniform buffer holding its MVP.
pub struct GpuProgram {
    pipeline: RenderPipeline,
    mvp_buf: Buffer,
    mvp_bg: BindGroup,
}

pub struct GpuFrame {
    surface_texture: SurfaceTexture,
    view: TextureView,
    encoder: CommandEncoder,
}

pub struct WgpuBackend {
    // Surface
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,

    // Device/queue
    device: Device,
    queue: Queue,

    // Render targets
    sample_count: u32,
    depth_view: TextureView,
    msaa_view: Option<TextureView>,

    // Shared layouts
    camera_bgl: BindGroupLayout,
    texture_bgl: BindGroupLayout,
    sampler: Sampler,

    // Dropped last: the surface borrows it.
    window: Arc<Window>,
}

fn backends(backend: GraphicsBackend) -> wgpu::Backends {
    match backend {
        GraphicsBackend::Auto => wgpu::Backends::all(),
        GraphicsBackend::Vulkan => wgpu::Backends::VULKAN,
        GraphicsBackend::Dx12 => wgpu::Backends::DX12,
        GraphicsBackend::Metal => wgpu::Backends::METAL,
        GraphicsBackend::Gl => wgpu::Backends::GL,
    }
}

/// Validation errors often carry a multi-line source excerpt; fold them
/// into one diagnostic line.
fn one_line(err: &wgpu::Error) -> String {
    err.to_string()
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

impl WgpuBackend {
    /// Acquire surface, adapter and device for `window`.
    pub fn new(window: Arc<Window>, config: &ViewerConfig) -> ViewerResult<Self> {
        pollster::block_on(Self::new_async(window, config))
    }

    async fn new_async(window: Arc<Window>, config: &ViewerConfig) -> ViewerResult<Self> {
        let PhysicalSize { width, height } = window.inner_size();
        let width = width.max(1);
        let height = height.max(1);

        // Instance & surface
        let instance = Instance::new(&InstanceDescriptor {
            backends: backends(config.backend),
            ..Default::default()
        });
        let surface: Surface<'static> = instance
            .create_surface(window.clone())
            .map_err(|e| ViewerError::Context(format!("create_surface failed: {e}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| ViewerError::Context(format!("no suitable GPU adapter: {e}")))?;
        let info = adapter.get_info();
        log::info!("Adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("ModelViewer Device"),
                required_features: Features::empty(),
                required_limits: Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                ..Default::default()
            })
            .await
            .map_err(|e| ViewerError::Context(format!("request_device failed: {e}")))?;

        // Surface format (prefer sRGB)
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| ViewerError::Context("surface reports no formats".into()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let sample_count = {
            let color_ok = adapter
                .get_texture_format_features(surface_format)
                .flags
                .sample_count_supported(config.msaa_samples);
            let depth_ok = adapter
                .get_texture_format_features(DEPTH_FORMAT)
                .flags
                .sample_count_supported(config.msaa_samples);
            if color_ok && depth_ok {
                config.msaa_samples
            } else {
                log::warn!(
                    "{}x MSAA unsupported for {:?}, rendering without multisampling",
                    config.msaa_samples,
                    surface_format
                );
                1
            }
        };

        let depth_view = create_depth_view(&device, &surface_config, sample_count);
        let msaa_view = create_msaa_view(&device, &surface_config, sample_count);

        // Group 0: MVP (vertex stage)
        let camera_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Camera BGL"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<CameraUniform>() as u64),
                },
                count: None,
            }],
        });

        // Group 1: diffuse texture + sampler (fragment stage)
        let texture_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Diffuse BGL"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: true },
                        view_dimension: TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        // Nearest in both directions, no mipmaps.
        let sampler = device.create_sampler(&SamplerDescriptor {
            label: Some("Diffuse Sampler"),
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::Repeat,
            mag_filter: FilterMode::Nearest,
            min_filter: FilterMode::Nearest,
            ..Default::default()
        });

        log::info!(
            "Context ready: {}x{} {:?}, {}x MSAA, {:?}",
            width,
            height,
            surface_format,
            sample_count,
            surface_config.present_mode
        );

        Ok(Self {
            surface,
            surface_config,
            device,
            queue,
            sample_count,
            depth_view,
            msaa_view,
            camera_bgl,
            texture_bgl,
            sampler,
            window,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn is_surface_lost(err: &SurfaceError) -> bool {
        matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
    }

    /// Reconfigure the surface at the current size and rebuild the targets.
    pub fn recreate_surface(&mut self) {
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.device, &self.surface_config, self.sample_count);
        self.msaa_view = create_msaa_view(&self.device, &self.surface_config, self.sample_count);
    }

    /// Runs `create` inside a validation error scope.
    fn scoped<T>(&self, stage: ShaderStage, create: impl FnOnce(&Device) -> T) -> ViewerResult<T> {
        self.device.push_error_scope(ErrorFilter::Validation);
        let value = create(&self.device);
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(ViewerError::shader(stage, one_line(&err))),
            None => Ok(value),
        }
    }

    fn shader_module(&self, stage: ShaderStage, label: &str, source: &str) -> ViewerResult<ShaderModule> {
        self.scoped(stage, |device| {
            device.create_shader_module(ShaderModuleDescriptor {
                label: Some(label),
                source: ShaderSource::Wgsl(source.into()),
            })
        })
    }
}

impl GpuBackend for WgpuBackend {
    type Buffer = Buffer;
    type Texture = GpuTexture;
    type Program = GpuProgram;
    type Frame = GpuFrame;

    fn create_vertex_buffer(&mut self, label: &str, data: &[f32]) -> ViewerResult<Buffer> {
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(data),
            usage: BufferUsages::VERTEX,
        });
        log::debug!("Vertex buffer '{}': {} bytes", label, buffer.size());
        Ok(buffer)
    }

    fn create_texture(&mut self, label: &str, texture: &TextureData) -> ViewerResult<GpuTexture> {
        if !texture.is_valid() {
            return Err(ViewerError::asset(label, "texture data does not match its dimensions"));
        }
        let max = self.device.limits().max_texture_dimension_2d;
        if texture.width > max || texture.height > max {
            return Err(ViewerError::asset(
                label,
                format!(
                    "{}x{} exceeds the device limit of {}",
                    texture.width, texture.height, max
                ),
            ));
        }

        let size = Extent3d {
            width: texture.width,
            height: texture.height,
            depth_or_array_layers: 1,
        };
        let gpu_texture = self.device.create_texture(&TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });

        // No 24-bit texture formats in wgpu; expand RGB to RGBA.
        let rgba = texture.to_rgba8();
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &gpu_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * texture.width),
                rows_per_image: Some(texture.height),
            },
            size,
        );

        let view = gpu_texture.create_view(&TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.texture_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        Ok(GpuTexture {
            texture: gpu_texture,
            bind_group,
        })
    }

    fn create_program(&mut self, sources: &ShaderSources) -> ViewerResult<GpuProgram> {
        let vs_label = sources.vertex_path.display().to_string();
        let fs_label = sources.fragment_path.display().to_string();
        let vs = self.shader_module(ShaderStage::Vertex, &vs_label, &sources.vertex)?;
        let fs = self.shader_module(ShaderStage::Fragment, &fs_label, &sources.fragment)?;

        let sample_count = self.sample_count;
        let surface_format = self.surface_config.format;
        let camera_bgl = &self.camera_bgl;
        let texture_bgl = &self.texture_bgl;

        let pipeline = self.scoped(ShaderStage::Link, |device| {
            let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some("Model PipelineLayout"),
                bind_group_layouts: &[camera_bgl, texture_bgl],
                push_constant_ranges: &[],
            });
            device.create_render_pipeline(&RenderPipelineDescriptor {
                label: Some("Model Pipeline"),
                layout: Some(&layout),
                vertex: VertexState {
                    module: &vs,
                    entry_point: Some("vs_main"),
                    buffers: &[POSITION_LAYOUT, TEXCOORD_LAYOUT],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(FragmentState {
                    module: &fs,
                    entry_point: Some("fs_main"),
                    targets: &[Some(ColorTargetState {
                        format: surface_format,
                        blend: Some(BlendState::REPLACE),
                        write_mask: ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: Some(DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: DepthBiasState::default(),
                }),
                multisample: MultisampleState {
                    count: sample_count,
                    ..Default::default()
                },
                multiview: None,
                cache: None,
            })
        })?;

        let mvp_init = CameraUniform {
            mvp: Mat4::IDENTITY.to_cols_array_2d(),
        };
        let mvp_buf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("MVP UBO"),
            contents: bytemuck::bytes_of(&mvp_init),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let mvp_bg = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("MVP BG"),
            layout: &self.camera_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: mvp_buf.as_entire_binding(),
            }],
        });

        log::info!("Program linked from {} and {}", vs_label, fs_label);
        Ok(GpuProgram {
            pipeline,
            mvp_buf,
            mvp_bg,
        })
    }

    fn destroy_buffer(&mut self, buffer: Buffer) {
        buffer.destroy();
    }

    fn destroy_texture(&mut self, texture: GpuTexture) {
        texture.texture.destroy();
    }

    fn destroy_program(&mut self, program: GpuProgram) {
        program.mvp_buf.destroy();
    }

    fn begin_frame(&mut self) -> ViewerResult<Option<GpuFrame>> {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(err) if Self::is_surface_lost(&err) => {
                log::warn!("Surface {err}; reconfiguring");
                self.recreate_surface();
                return Ok(None);
            }
            Err(SurfaceError::Timeout) => {
                log::warn!("Surface acquire timed out; skipping frame");
                return Ok(None);
            }
            Err(err) => return Err(ViewerError::Surface(err.to_string())),
        };
        let view = surface_texture
            .texture
            .create_view(&TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("MainEncoder"),
            });
        Ok(Some(GpuFrame {
            surface_texture,
            view,
            encoder,
        }))
    }

    fn upload_mvp(&mut self, program: &GpuProgram, mvp: Mat4) {
        let uniform = CameraUniform {
            mvp: mvp.to_cols_array_2d(),
        };
        self.queue
            .write_buffer(&program.mvp_buf, 0, bytemuck::bytes_of(&uniform));
    }

    fn draw<'a, I>(&mut self, frame: &mut GpuFrame, program: &GpuProgram, slots: I)
    where
        I: IntoIterator<Item = DrawSlot<'a, Buffer, GpuTexture>>,
    {
        // With MSAA the pass renders into the multisampled target and
        // resolves into the swapchain image.
        let (color_view, resolve_target) = match &self.msaa_view {
            Some(msaa) => (msaa, Some(&frame.view)),
            None => (&frame.view, None),
        };

        let mut rpass = frame.encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("MainPass"),
            color_attachments: &[Some(RenderPassColorAttachment {
                view: color_view,
                depth_slice: None,
                resolve_target,
                ops: Operations {
                    load: LoadOp::Clear(CLEAR_COLOR),
                    store: StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(Operations {
                    load: LoadOp::Clear(1.0),
                    store: StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        rpass.set_pipeline(&program.pipeline);
        rpass.set_bind_group(0, &program.mvp_bg, &[]);
        for slot in slots {
            rpass.set_vertex_buffer(POSITION_SLOT, slot.positions.slice(..));
            rpass.set_vertex_buffer(TEXCOORD_SLOT, slot.texcoords.slice(..));
            rpass.set_bind_group(1, &slot.texture.bind_group, &[]);
            rpass.draw(0..slot.vertex_count, 0..1);
        }
    }

    fn present(&mut self, frame: GpuFrame) {
        self.queue.submit(Some(frame.encoder.finish()));
        self.window.pre_present_notify();
        frame.surface_texture.present();
    }
}

/// Create a depth texture view matching the surface config.
fn create_depth_view(device: &Device, sc: &SurfaceConfiguration, sample_count: u32) -> TextureView {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some("DepthTex"),
        size: Extent3d {
            width: sc.width.max(1),
            height: sc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&TextureViewDescriptor::default())
}

/// Multisampled colour target, `None` when rendering single-sampled.
fn create_msaa_view(
    device: &Device,
    sc: &SurfaceConfiguration,
    sample_count: u32,
) -> Option<TextureView> {
    if sample_count <= 1 {
        return None;
    }
    let tex = device.create_texture(&TextureDescriptor {
        label: Some("MsaaColorTex"),
        size: Extent3d {
            width: sc.width.max(1),
            height: sc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: TextureDimension::D2,
        format: sc.format,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    Some(tex.create_view(&TextureViewDescriptor::default()))
}
