use wgpu::*;

use crate::controller::FrameRenderer;
use crate::model::{Camera, Scene};
use crate::utils::{create_plane_mesh, MeshBuffer, Vertex};
use super::GpuContext;

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

const ATMOSPHERE_WGSL: &str = include_str!("shaders/atmosphere.wgsl");
const SKY_WGSL: &str = include_str!("shaders/sky.wgsl");
const WATER_WGSL: &str = include_str!("shaders/water.wgsl");

/// Prepends the shared atmosphere code (uniforms, sky radiance, tone mapping)
pub fn shader_source(body: &str) -> String {
    format!("{ATMOSPHERE_WGSL}\n{body}")
}

/// Per-frame uniform shared by the sky and water shaders.
/// Layout matches `Frame` in atmosphere.wgsl.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub inv_view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub time: f32,
    pub sun_direction: [f32; 3],
    pub exposure: f32,
    pub sun_color: [f32; 3],
    pub distortion_scale: f32,
    pub water_color: [f32; 3],
    pub water_alpha: f32,
    pub sky_params: [f32; 4],
}

impl FrameUniform {
    pub fn new(scene: &Scene, camera: &Camera, exposure: f32) -> Self {
        let view_proj = camera.view_proj();
        let water = &scene.water;
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            inv_view_proj: view_proj.inverse().to_cols_array_2d(),
            camera_pos: camera.eye.to_array(),
            time: water.time as f32,
            sun_direction: scene.sky.sun_position.to_array(),
            exposure,
            sun_color: water.sun_color.to_array(),
            distortion_scale: water.distortion_scale,
            water_color: water.water_color.to_array(),
            water_alpha: water.alpha,
            sky_params: scene.sky.params(),
        }
    }
}

/// Tessellated egui output waiting for the next frame
pub struct OverlayFrame {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

pub fn create_depth_texture(device: &Device, width: u32, height: u32) -> (Texture, TextureView) {
    let depth_texture = device.create_texture(&TextureDescriptor {
        label: Some("depth_texture"),
        size: Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

struct FrameResources {
    buffer: Buffer,
    bind_group_layout: BindGroupLayout,
    bind_group: BindGroup,
}

fn create_frame_resources(device: &Device) -> FrameResources {
    let buffer = device.create_buffer(&BufferDescriptor {
        label: Some("frame_uniform_buffer"),
        size: std::mem::size_of::<FrameUniform>() as BufferAddress,
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("frame_bind_group_layout"),
        entries: &[BindGroupLayoutEntry {
            binding: 0,
            visibility: ShaderStages::VERTEX | ShaderStages::FRAGMENT,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: BufferSize::new(std::mem::size_of::<FrameUniform>() as u64),
            },
            count: None,
        }],
    });

    let bind_group = device.create_bind_group(&BindGroupDescriptor {
        label: Some("frame_bind_group"),
        layout: &bind_group_layout,
        entries: &[BindGroupEntry { binding: 0, resource: buffer.as_entire_binding() }],
    });

    FrameResources { buffer, bind_group_layout, bind_group }
}

fn create_sky_pipeline(device: &Device, format: TextureFormat, layout: &PipelineLayout) -> RenderPipeline {
    let shader = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("sky_shader"),
        source: ShaderSource::Wgsl(shader_source(SKY_WGSL).into()),
    });

    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("sky_pipeline"),
        layout: Some(layout),
        vertex: VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState { format, blend: Some(BlendState::REPLACE), write_mask: ColorWrites::ALL })],
            compilation_options: Default::default(),
        }),
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        // Background: never tested, never written
        depth_stencil: Some(DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: CompareFunction::Always,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

fn create_water_pipeline(device: &Device, format: TextureFormat, layout: &PipelineLayout) -> RenderPipeline {
    let shader = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("water_shader"),
        source: ShaderSource::Wgsl(shader_source(WATER_WGSL).into()),
    });

    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("water_pipeline"),
        layout: Some(layout),
        vertex: VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as BufferAddress,
                step_mode: VertexStepMode::Vertex,
                attributes: &[
                    VertexAttribute { offset: 0, shader_location: 0, format: VertexFormat::Float32x3 },
                    VertexAttribute { offset: 12, shader_location: 1, format: VertexFormat::Float32x2 },
                ],
            }],
            compilation_options: Default::default(),
        },
        fragment: Some(FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState { format, blend: Some(BlendState::ALPHA_BLENDING), write_mask: ColorWrites::ALL })],
            compilation_options: Default::default(),
        }),
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

///////////////////////////////////////////////////////////////////////////////

/// Owns the GPU and draws sky, water and the egui overlay
pub struct SceneRenderer {
    gpu: GpuContext,
    exposure: f32,

    depth_view: TextureView,

    frame_buffer: Buffer,
    frame_bind_group: BindGroup,
    sky_pipeline: RenderPipeline,
    water_pipeline: RenderPipeline,
    water_mesh: MeshBuffer,

    egui_renderer: egui_wgpu::Renderer,
    overlay: Option<OverlayFrame>,
}

impl SceneRenderer {
    pub fn new(gpu: GpuContext, scene: &Scene, exposure: f32) -> Self {
        let device = gpu.device.as_ref();
        let (_, depth_view) = create_depth_texture(device, gpu.config.width, gpu.config.height);

        let frame = create_frame_resources(device);
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&frame.bind_group_layout],
            push_constant_ranges: &[],
        });
        let sky_pipeline = create_sky_pipeline(device, gpu.format, &pipeline_layout);
        let water_pipeline = create_water_pipeline(device, gpu.format, &pipeline_layout);
        let water_mesh = create_plane_mesh(scene.water.size).upload(device);

        let egui_renderer = egui_wgpu::Renderer::new(device, gpu.format, egui_wgpu::RendererOptions::default());

        tracing::info!(
            width = gpu.config.width,
            height = gpu.config.height,
            water_size = scene.water.size,
            "scene renderer ready"
        );

        Self {
            gpu,
            exposure,
            depth_view,
            frame_buffer: frame.buffer,
            frame_bind_group: frame.bind_group,
            sky_pipeline,
            water_pipeline,
            water_mesh,
            egui_renderer,
            overlay: None,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.gpu.config.width, self.gpu.config.height)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || (width, height) == self.size() {
            return;
        }
        self.gpu.resize(width, height);
        let (_, depth_view) = create_depth_texture(&self.gpu.device, width, height);
        self.depth_view = depth_view;
        tracing::debug!(width, height, "resized");
    }

    /// Decide what to do about a failed frame. Returns true when the error is fatal.
    pub fn handle_surface_error(&mut self, err: &SurfaceError) -> bool {
        match err {
            SurfaceError::Lost | SurfaceError::Outdated => {
                tracing::warn!(?err, "surface needs reconfiguring");
                self.gpu.reconfigure();
                false
            }
            SurfaceError::OutOfMemory => {
                tracing::error!("surface out of memory");
                true
            }
            other => {
                tracing::warn!(err = ?other, "frame skipped");
                false
            }
        }
    }

    /// Tessellate egui output for the next `render`
    pub fn prepare_overlay(&mut self, egui_ctx: &egui::Context, output: egui::FullOutput) {
        let pixels_per_point = output.pixels_per_point;
        let primitives = egui_ctx.tessellate(output.shapes, pixels_per_point);
        self.overlay = Some(OverlayFrame {
            primitives,
            textures_delta: output.textures_delta,
            pixels_per_point,
        });
    }

    fn draw_overlay(&mut self, encoder: &mut CommandEncoder, view: &TextureView, overlay: &OverlayFrame) {
        let device = self.gpu.device.as_ref();
        let queue = self.gpu.queue.as_ref();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.config.width, self.gpu.config.height],
            pixels_per_point: overlay.pixels_per_point,
        };

        for (id, image_delta) in &overlay.textures_delta.set {
            self.egui_renderer.update_texture(device, queue, *id, image_delta);
        }
        self.egui_renderer
            .update_buffers(device, queue, encoder, &overlay.primitives, &screen_descriptor);

        {
            let egui_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("egui_render_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Load,
                        store: StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.egui_renderer
                .render(&mut egui_pass.forget_lifetime(), &overlay.primitives, &screen_descriptor);
        }

        for id in &overlay.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

impl FrameRenderer for SceneRenderer {
    type Error = SurfaceError;

    fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<(), SurfaceError> {
        let uniform = FrameUniform::new(scene, camera, self.exposure);
        self.gpu.queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&uniform));

        let frame = self.gpu.surface.get_current_texture()?;
        let view = frame.texture.create_view(&TextureViewDescriptor::default());
        let mut encoder = self.gpu.device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("encoder"),
        });

        {
            let mut rp = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("scene_render_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(Color::BLACK),
                        store: StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rp.set_bind_group(0, &self.frame_bind_group, &[]);

            // Sky
            rp.set_pipeline(&self.sky_pipeline);
            rp.draw(0..3, 0..1);

            // Water
            rp.set_pipeline(&self.water_pipeline);
            rp.set_vertex_buffer(0, self.water_mesh.vertex_buffer.slice(..));
            rp.set_index_buffer(self.water_mesh.index_buffer.slice(..), IndexFormat::Uint32);
            rp.draw_indexed(0..self.water_mesh.index_count, 0, 0..1);
        }

        if let Some(overlay) = self.overlay.take() {
            self.draw_overlay(&mut encoder, &view, &overlay);
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;

    #[test]
    fn uniform_layout_matches_wgsl() {
        // mat4 + mat4 + five 16-byte rows
        assert_eq!(std::mem::size_of::<FrameUniform>(), 208);
        assert_eq!(std::mem::size_of::<FrameUniform>() % 16, 0);
    }

    #[test]
    fn uniform_carries_scene_state() {
        let config = SceneConfig::default();
        let mut scene = Scene::new(&config);
        scene.water.advance(0.5);
        let camera = Camera::from_config(&config.camera, 1280, 720);

        let u = FrameUniform::new(&scene, &camera, config.exposure);
        assert_eq!(u.time, 0.5);
        assert_eq!(u.sun_direction, scene.sky.sun_position.to_array());
        assert_eq!(u.exposure, 0.5);
        assert_eq!(u.camera_pos, [2.0, 4.0, 10.0]);
        assert_eq!(u.distortion_scale, 3.7);
        assert_eq!(u.sky_params, [2.0, 1.0, 0.005, 0.8]);

        let vp = glam::Mat4::from_cols_array_2d(&u.view_proj);
        let inv = glam::Mat4::from_cols_array_2d(&u.inv_view_proj);
        assert!((vp * inv).abs_diff_eq(glam::Mat4::IDENTITY, 1e-3));
    }

    #[test]
    fn shaders_share_the_atmosphere_prelude() {
        for body in [SKY_WGSL, WATER_WGSL] {
            let src = shader_source(body);
            assert!(src.starts_with(ATMOSPHERE_WGSL));
            assert!(src.contains("fn vs_main"));
            assert!(src.contains("fn fs_main"));
        }
        assert!(ATMOSPHERE_WGSL.contains("fn sky_radiance"));
    }
}
