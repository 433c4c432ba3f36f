//! Forward renderer for the scene graph.
//!
//! Two passes per frame: a depth-only pass from the spot light into the
//! shadow map, then the lit scene pass into the swapchain. Meshes are
//! uploaded on first sight by [`MeshCache`]; per-draw uniforms live in a
//! pool that grows with the number of drawables.

pub mod mesh_cache;
pub mod uniforms;

use bytemuck::Zeroable;

use self::mesh_cache::{MeshCache, Vertex};
use self::uniforms::{
    clear_color, spot_view_proj, DrawUniform, LightsUniform, ShadowUniform,
};
use crate::camera::{CameraUniform, PerspectiveCamera};
use crate::gpu::pipeline_helpers::{
    comparison_sampler, create_uniform_buffer, depth_stencil_state,
    depth_texture_2d, single_uniform_layout, uniform_bind_group,
    uniform_buffer,
};
use crate::gpu::render_context::RenderContext;
use crate::gpu::texture::{DepthTarget, ShadowMap};
use crate::options::RendererOptions;
use crate::scene::{Drawable, Light, SceneGraph};

const SCENE_SHADER: &str = include_str!("../../assets/shaders/scene.wgsl");
const SHADOW_SHADER: &str = include_str!("../../assets/shaders/shadow.wgsl");

/// A uniform buffer + bind group for one draw.
struct DrawSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// GPU state for drawing a [`SceneGraph`].
pub struct SceneRenderer {
    options: RendererOptions,
    opaque_pipeline: wgpu::RenderPipeline,
    /// Same as `opaque_pipeline` but leaves depth untouched.
    overlay_pipeline: wgpu::RenderPipeline,
    shadow_pipeline: wgpu::RenderPipeline,

    camera_buffer: wgpu::Buffer,
    lights_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    shadow_buffer: wgpu::Buffer,
    shadow_bind_group: wgpu::BindGroup,

    draw_layout: wgpu::BindGroupLayout,
    draw_slots: Vec<DrawSlot>,

    depth: DepthTarget,
    shadow_map: ShadowMap,
    meshes: MeshCache,
}

impl SceneRenderer {
    /// Build pipelines and fixed resources for the surface in `context`.
    pub fn new(context: &RenderContext, options: &RendererOptions) -> Self {
        let device = &context.device;
        let (width, height) = context.size();

        let frame_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Frame Layout"),
                entries: &[
                    uniform_buffer(0),
                    uniform_buffer(1),
                    depth_texture_2d(2),
                    comparison_sampler(3),
                ],
            });
        let draw_layout = single_uniform_layout(device, "Draw Layout");
        let shadow_layout = single_uniform_layout(device, "Shadow Layout");

        let scene_shader =
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Scene Shader"),
                source: wgpu::ShaderSource::Wgsl(SCENE_SHADER.into()),
            });
        let shadow_shader =
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Shadow Shader"),
                source: wgpu::ShaderSource::Wgsl(SHADOW_SHADER.into()),
            });

        let scene_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Scene Pipeline Layout"),
                bind_group_layouts: &[&frame_layout, &draw_layout],
                push_constant_ranges: &[],
            });
        let opaque_pipeline = create_scene_pipeline(
            device,
            "Scene Opaque",
            &scene_layout,
            &scene_shader,
            context.format(),
            true,
        );
        let overlay_pipeline = create_scene_pipeline(
            device,
            "Scene No Depth Write",
            &scene_layout,
            &scene_shader,
            context.format(),
            false,
        );

        let shadow_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Shadow Pipeline Layout"),
                bind_group_layouts: &[&shadow_layout, &draw_layout],
                push_constant_ranges: &[],
            });
        let shadow_pipeline = create_shadow_pipeline(
            device,
            &shadow_pipeline_layout,
            &shadow_shader,
        );

        let shadow_size = if options.shadows {
            options.shadow_map_size
        } else {
            1
        };
        let shadow_map = ShadowMap::new(device, shadow_size);

        let camera_buffer = create_uniform_buffer(
            device,
            "Camera Uniform",
            &CameraUniform::zeroed(),
        );
        let lights_buffer = create_uniform_buffer(
            device,
            "Lights Uniform",
            &LightsUniform::from_lights(&[], options),
        );
        let frame_bind_group =
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Frame Bind Group"),
                layout: &frame_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: camera_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: lights_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(
                            &shadow_map.target.view,
                        ),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::Sampler(
                            &shadow_map.sampler,
                        ),
                    },
                ],
            });
        let (shadow_buffer, shadow_bind_group) = uniform_bind_group(
            device,
            "Shadow Uniform",
            &shadow_layout,
            &ShadowUniform {
                view_proj: glam::Mat4::IDENTITY.to_cols_array_2d(),
            },
        );

        log::debug!(
            "scene renderer ready: shadow map {}px, tone mapping {:?}",
            shadow_map.size,
            options.tone_mapping
        );

        Self {
            options: options.clone(),
            opaque_pipeline,
            overlay_pipeline,
            shadow_pipeline,
            camera_buffer,
            lights_buffer,
            frame_bind_group,
            shadow_buffer,
            shadow_bind_group,
            draw_layout,
            draw_slots: Vec::new(),
            depth: DepthTarget::new(device, width, height),
            shadow_map,
            meshes: MeshCache::default(),
        }
    }

    /// Recreate the depth buffer for a new surface size.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.depth = DepthTarget::new(device, width, height);
        }
    }

    /// Number of meshes uploaded so far.
    pub fn uploaded_meshes(&self) -> usize {
        self.meshes.len()
    }

    /// Draw `scene` from `camera` into `target`.
    pub fn render(
        &mut self,
        context: &RenderContext,
        target: &wgpu::TextureView,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
    ) {
        let device = &context.device;
        let queue = &context.queue;

        self.meshes.sync(device, scene.meshes());

        let lights = scene.lights();
        let lights_uniform = LightsUniform::from_lights(&lights, &self.options);
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&CameraUniform::from_camera(camera)),
        );
        queue.write_buffer(
            &self.lights_buffer,
            0,
            bytemuck::bytes_of(&lights_uniform),
        );

        let drawables = scene.drawables();
        self.ensure_draw_slots(device, drawables.len());
        for (slot, drawable) in self.draw_slots.iter().zip(&drawables) {
            let uniform = DrawUniform::new(
                drawable.world,
                &drawable.instance.material,
                drawable.instance.receive_shadow,
            );
            queue.write_buffer(&slot.buffer, 0, bytemuck::bytes_of(&uniform));
        }

        let mut encoder = context.create_encoder();

        if lights_uniform.shadow_enabled != 0 {
            let spot = lights.iter().find_map(|l| match l.light {
                Light::Spot(s) => Some((s, l.world.w_axis.truncate())),
                Light::Point(_) => None,
            });
            if let Some((spot, position)) = spot {
                let shadow = ShadowUniform {
                    view_proj: spot_view_proj(&spot, position).to_cols_array_2d(),
                };
                queue.write_buffer(
                    &self.shadow_buffer,
                    0,
                    bytemuck::bytes_of(&shadow),
                );
                self.shadow_pass(&mut encoder, &drawables);
            }
        }

        self.scene_pass(&mut encoder, target, &drawables);
        context.submit(encoder);
    }

    fn ensure_draw_slots(&mut self, device: &wgpu::Device, count: usize) {
        while self.draw_slots.len() < count {
            let index = self.draw_slots.len();
            let (buffer, bind_group) = uniform_bind_group(
                device,
                &format!("Draw {index}"),
                &self.draw_layout,
                &DrawUniform::new(
                    glam::Mat4::IDENTITY,
                    &crate::scene::Material::default(),
                    false,
                ),
            );
            self.draw_slots.push(DrawSlot { buffer, bind_group });
        }
    }

    fn shadow_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        drawables: &[Drawable],
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(
                wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_map.target.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                },
            ),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.shadow_pipeline);
        pass.set_bind_group(0, &self.shadow_bind_group, &[]);
        for (slot, drawable) in self.draw_slots.iter().zip(drawables) {
            if !drawable.instance.cast_shadow {
                continue;
            }
            let Some(mesh) = self.meshes.get(drawable.instance.mesh) else {
                continue;
            };
            pass.set_bind_group(1, &slot.bind_group, &[]);
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(
                mesh.index_buffer.slice(..),
                wgpu::IndexFormat::Uint32,
            );
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }

    fn scene_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        drawables: &[Drawable],
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color(&self.options)),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(
                wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                },
            ),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_bind_group(0, &self.frame_bind_group, &[]);
        for (slot, drawable) in self.draw_slots.iter().zip(drawables) {
            let Some(mesh) = self.meshes.get(drawable.instance.mesh) else {
                continue;
            };
            let pipeline = if drawable.instance.material.depth_write {
                &self.opaque_pipeline
            } else {
                &self.overlay_pipeline
            };
            pass.set_pipeline(pipeline);
            pass.set_bind_group(1, &slot.bind_group, &[]);
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(
                mesh.index_buffer.slice(..),
                wgpu::IndexFormat::Uint32,
            );
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

fn create_scene_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    depth_write: bool,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(depth_stencil_state(
            depth_write,
            wgpu::DepthBiasState::default(),
        )),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn create_shadow_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Shadow"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::position_layout()],
            compilation_options: Default::default(),
        },
        fragment: None,
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(depth_stencil_state(
            true,
            wgpu::DepthBiasState {
                constant: 2,
                slope_scale: 2.0,
                clamp: 0.0,
            },
        )),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
