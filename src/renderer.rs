// renderer.rs — wgpu backend: panorama texture, slice quads, egui overlay

use crate::error::RendererError;
use crate::loader::SourceImage;
use crate::viewer::Frame;
use std::borrow::Cow;
use wgpu::util::DeviceExt;
use winit::window::Window;

/// A frame never needs more than the slice plus its wrapped remainder.
const MAX_SLICES: usize = 2;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
struct SliceInstance {
    uv_rect: [f32; 4],
    ndc_rect: [f32; 4],
}

impl SliceInstance {
    const ATTRIBS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x4, 1 => Float32x4];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SliceInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Blits in pixel space → UV / NDC instances.
fn slice_instances(frame: &Frame) -> Vec<SliceInstance> {
    let img_w = frame.image.width as f64;
    let img_h = frame.image.height as f64;
    let out_w = frame.output.width as f64;
    let out_h = frame.output.height as f64;
    if img_w <= 0.0 || img_h <= 0.0 || out_w <= 0.0 || out_h <= 0.0 {
        return Vec::new();
    }

    frame
        .blits
        .iter()
        .take(MAX_SLICES)
        .map(|b| {
            let (s0, s1) = (b.src.min, b.src.max());
            let (d0, d1) = (b.dst.min, b.dst.max());
            SliceInstance {
                uv_rect: [
                    (s0.x / img_w) as f32,
                    (s0.y / img_h) as f32,
                    (s1.x / img_w) as f32,
                    (s1.y / img_h) as f32,
                ],
                ndc_rect: [
                    (d0.x / out_w * 2.0 - 1.0) as f32,
                    (1.0 - d0.y / out_h * 2.0) as f32,
                    (d1.x / out_w * 2.0 - 1.0) as f32,
                    (1.0 - d1.y / out_h * 2.0) as f32,
                ],
            }
        })
        .collect()
}

pub struct Renderer {
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,
    render_pipeline: wgpu::RenderPipeline,

    texture_bind_group_layout: wgpu::BindGroupLayout,
    panorama_bind_group: Option<wgpu::BindGroup>,
    sampler: wgpu::Sampler,
    instance_buffer: wgpu::Buffer,

    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub async fn new(window: &Window) -> Result<Self, RendererError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // SAFETY: the window outlives the renderer; both live until the event loop exits.
        let surface = unsafe { instance.create_surface(window) }?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RendererError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    features: wgpu::Features::empty(),
                    limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    label: None,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        // seams are split on the CPU, so no wrap sampling is needed
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let texture_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
            label: Some("panorama_bind_group_layout"),
        });

        let empty = [SliceInstance {
            uv_rect: [0.0; 4],
            ndc_rect: [0.0; 4],
        }; MAX_SLICES];
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Slice Instances"),
            contents: bytemuck::cast_slice(&empty),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("slice_shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shader_slice.wgsl"))),
        });
        let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Slice Pipeline Layout"),
            bind_group_layouts: &[&texture_bind_group_layout],
            push_constant_ranges: &[],
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Slice Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[SliceInstance::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // corner order differs between the two triangles
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        let egui_ctx = egui::Context::default();
        crate::fonts::setup_egui_fonts(&egui_ctx, &crate::i18n::current_lang());

        let mut egui_state = egui_winit::State::new(window);
        // high-DPI displays: egui works in points, the surface in pixels
        egui_state.set_pixels_per_point(window.scale_factor() as f32);

        let egui_renderer = egui_wgpu::Renderer::new(&device, config.format, None, 1);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            render_pipeline,
            texture_bind_group_layout,
            panorama_bind_group: None,
            sampler,
            instance_buffer,
            egui_ctx,
            egui_state,
            egui_renderer,
        })
    }

    /// Zero-sized windows are ignored; the last good configuration stays.
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn refresh_fonts(&self, lang: &str) {
        crate::fonts::setup_egui_fonts(&self.egui_ctx, lang);
    }

    /// Uploads the panorama, downscaling when it exceeds the GPU texture limit.
    pub fn load_panorama(&mut self, source: &SourceImage) {
        let max_dim = self.device.limits().max_texture_dimension_2d;
        let (src_w, src_h) = (source.width(), source.height());

        let scaled;
        let img = if src_w > max_dim || src_h > max_dim {
            let scale = (max_dim as f32 / src_w.max(src_h) as f32).min(1.0);
            let new_w = ((src_w as f32 * scale) as u32).max(1);
            let new_h = ((src_h as f32 * scale) as u32).max(1);
            log::warn!("panorama {src_w}x{src_h} exceeds GPU limit {max_dim}, scaling to {new_w}x{new_h}");
            scaled = image::imageops::resize(
                source.pixels(),
                new_w,
                new_h,
                image::imageops::FilterType::Lanczos3,
            );
            &scaled
        } else {
            source.pixels()
        };

        let (width, height) = img.dimensions();
        let texture_size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            size: texture_size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            label: Some("panorama_texture"),
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            img.as_raw(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            texture_size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.panorama_bind_group = Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.texture_bind_group_layout,
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
            label: Some("panorama_bind_group"),
        }));
        log::debug!("uploaded panorama texture {width}x{height}");
    }

    /// Drops the panorama texture (image changed or viewer closed).
    pub fn clear_panorama(&mut self) {
        self.panorama_bind_group = None;
    }

    pub fn render_with_ui(
        &mut self,
        window: &Window,
        frame: Option<&Frame>,
        run_ui: impl FnOnce(&egui::Context),
    ) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        let instances = frame.map(slice_instances).unwrap_or_default();
        if !instances.is_empty() {
            self.queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        // 1. panorama slices
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Slice Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.05,
                            g: 0.05,
                            b: 0.07,
                            a: 1.0,
                        }),
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });

            let bind_group = self.panorama_bind_group.as_ref().filter(|_| !instances.is_empty());
            if let Some(bind_group) = bind_group {
                render_pass.set_pipeline(&self.render_pipeline);
                render_pass.set_bind_group(0, bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
                render_pass.draw(0..6, 0..instances.len() as u32);
            }
        }

        // 2. UI
        let raw_input = self.egui_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, run_ui);

        self.egui_state
            .handle_platform_output(window, &self.egui_ctx, full_output.platform_output);
        let clipped_primitives = self.egui_ctx.tessellate(full_output.shapes);

        let screen_descriptor = egui_wgpu::renderer::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        for (id, delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, delta);
        }

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });
            self.egui_renderer
                .render(&mut render_pass, &clipped_primitives, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
