use super::frame::FrameTarget;
use super::gpu::GpuContext;
use super::shaders::{workgroups, Pass, ENTRY_POINT};
use crate::error::RenderError;
use crate::params::{FrameParameters, FrameUniforms};

/// Intermediate layers use half floats so the gamma-corrected colors keep
/// their precision until the composite.
const LAYER_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

struct PassPipeline {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

/// Background and foreground layers, sized to the current frame target.
struct Layers {
    width: u32,
    height: u32,
    #[cfg_attr(not(test), allow(dead_code))]
    background: wgpu::Texture,
    #[cfg_attr(not(test), allow(dead_code))]
    foreground: wgpu::Texture,
    background_view: wgpu::TextureView,
    foreground_view: wgpu::TextureView,
    background_bind_group: wgpu::BindGroup,
    foreground_bind_group: wgpu::BindGroup,
}

/// Compiled programs and GPU resources for the three fractal passes.
pub struct FractalPipeline {
    background: PassPipeline,
    foreground: PassPipeline,
    composite: PassPipeline,
    uniform_buffer: wgpu::Buffer,
    layers: Option<Layers>,
}

impl FractalPipeline {
    pub fn new(device: &wgpu::Device) -> Result<Self, RenderError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let background = PassPipeline::new(device, Pass::Background, &layer_writer_entries());
        let foreground = PassPipeline::new(device, Pass::Foreground, &layer_writer_entries());
        let composite = PassPipeline::new(device, Pass::Composite, &composite_entries());

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::PipelineInitFailed(err.to_string()));
        }

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame_uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        log::info!("Compiled fractal passes: background, foreground, composite");

        Ok(Self {
            background,
            foreground,
            composite,
            uniform_buffer,
            layers: None,
        })
    }

    /// Record and submit background, foreground and composite for one frame.
    /// All three passes share one encoder, which orders the layer writes
    /// before the composite reads them.
    pub fn dispatch(
        &mut self,
        gpu: &GpuContext,
        params: &FrameParameters,
        target: &FrameTarget,
    ) -> Result<(), RenderError> {
        self.dispatch_passes(gpu, params, target, &Pass::ALL)
    }

    fn dispatch_passes(
        &mut self,
        gpu: &GpuContext,
        params: &FrameParameters,
        target: &FrameTarget,
        passes: &[Pass],
    ) -> Result<(), RenderError> {
        let device = &gpu.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        self.ensure_layers(device, target.width, target.height);
        let Some(layers) = self.layers.as_ref() else {
            let _ = pollster::block_on(device.pop_error_scope());
            return Err(RenderError::DispatchSkipped("intermediate layers missing".into()));
        };

        let uniforms = params.to_uniforms(target.width, target.height);
        gpu.queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let composite_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("composite_bind_group"),
            layout: &self.composite.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&layers.background_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&layers.foreground_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&target.view),
                },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("fractal_encoder"),
        });

        let (groups_x, groups_y) = (workgroups(target.width), workgroups(target.height));
        for (pass, pipeline, bind_group) in [
            (Pass::Background, &self.background, &layers.background_bind_group),
            (Pass::Foreground, &self.foreground, &layers.foreground_bind_group),
            (Pass::Composite, &self.composite, &composite_bind_group),
        ] {
            if !passes.contains(&pass) {
                continue;
            }
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(pass.label()),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&pipeline.pipeline);
            compute_pass.set_bind_group(0, bind_group, &[]);
            compute_pass.dispatch_workgroups(groups_x, groups_y, 1);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));

        match pollster::block_on(device.pop_error_scope()) {
            Some(err) => Err(RenderError::DispatchSkipped(err.to_string())),
            None => Ok(()),
        }
    }

    fn ensure_layers(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if self.layers.as_ref().is_some_and(|l| l.width == width && l.height == height) {
            return;
        }

        let make_layer = |label: &str| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: LAYER_FORMAT,
                usage: wgpu::TextureUsages::STORAGE_BINDING
                    | wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            })
        };

        let background = make_layer("background_layer");
        let foreground = make_layer("foreground_layer");
        let background_view = background.create_view(&Default::default());
        let foreground_view = foreground.create_view(&Default::default());

        let writer_bind_group = |label: &str, layout: &wgpu::BindGroupLayout, view: &wgpu::TextureView| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: self.uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                ],
            })
        };

        let background_bind_group =
            writer_bind_group("background_bind_group", &self.background.bind_group_layout, &background_view);
        let foreground_bind_group =
            writer_bind_group("foreground_bind_group", &self.foreground.bind_group_layout, &foreground_view);

        log::debug!("Allocated {}x{} fractal layers", width, height);

        self.layers = Some(Layers {
            width,
            height,
            background,
            foreground,
            background_view,
            foreground_view,
            background_bind_group,
            foreground_bind_group,
        });
    }
}

impl PassPipeline {
    fn new(device: &wgpu::Device, pass: Pass, entries: &[wgpu::BindGroupLayoutEntry]) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(pass.label()),
            source: wgpu::ShaderSource::Wgsl(pass.source().into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(pass.label()),
            entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(pass.label()),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(pass.label()),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some(ENTRY_POINT),
            compilation_options: Default::default(),
            cache: None,
        });

        Self {
            pipeline,
            bind_group_layout,
        }
    }
}

fn uniform_entry() -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn storage_entry(binding: u32, format: wgpu::TextureFormat) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::StorageTexture {
            access: wgpu::StorageTextureAccess::WriteOnly,
            format,
            view_dimension: wgpu::TextureViewDimension::D2,
        },
        count: None,
    }
}

fn layer_read_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

// @binding(0) uniforms, @binding(1) layer output
fn layer_writer_entries() -> [wgpu::BindGroupLayoutEntry; 2] {
    [uniform_entry(), storage_entry(1, LAYER_FORMAT)]
}

// @binding(0) uniforms, @binding(1..2) layers, @binding(3) frame output
fn composite_entries() -> [wgpu::BindGroupLayoutEntry; 4] {
    [
        uniform_entry(),
        layer_read_entry(1),
        layer_read_entry(2),
        storage_entry(3, super::frame::FRAME_FORMAT),
    ]
}
