//! wgpu implementation of the executor backend
//!
//! Scripts carry SPIR-V shaders and pipeline state written against a lower-level API,
//! so this backend translates what wgpu can express and rejects the rest with
//! [`WgpuError::UnsupportedState`]. Window textures and pipelines are created inside
//! error scopes so that a bad framebuffer or shader fails the script instead of
//! aborting the process.

pub mod capabilities;
pub mod formats;
pub mod state;

use crate::config::{BackendName, PowerPreference, RunnerConfig};
use crate::executor::Backend;
use capabilities::FeatureSupport;
use std::borrow::Cow;
use thiserror::Error;
use vkscript_config::features::{BaseFeatures, FeatureChain};
use vkscript_config::requirements::DeviceCapabilities;
use vkscript_config::{PipelineKind, PipelineSet, Requirements, Script, Stage, VertexSource, WindowFormat};
use wgpu::util::DeviceExt;

/// Texture usage flags for the color attachment
pub const COLOR_USAGE: wgpu::TextureUsages = wgpu::TextureUsages::RENDER_ATTACHMENT.union(wgpu::TextureUsages::COPY_SRC);

/// Texture usage flags for the depth/stencil attachment
pub const DEPTH_STENCIL_USAGE: wgpu::TextureUsages = wgpu::TextureUsages::RENDER_ATTACHMENT;

#[derive(Debug, Error)]
pub enum WgpuError {
    #[error("No adapter satisfies the requirements: {0}")]
    NoSuitableAdapter(String),
    #[error("Adapter {0} does not exist")]
    NoSuchAdapter(usize),
    #[error("Failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("Format {0} is not supported")]
    UnsupportedFormat(&'static str),
    #[error("Unsupported pipeline state: {0}")]
    UnsupportedState(String),
    #[error("Missing {0} shader")]
    MissingShader(Stage),
    #[error("Window size {width}x{height} exceeds the device limit of {max}")]
    WindowSize { width: usize, height: usize, max: u32 },
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Failed to wait for the device: {0}")]
    Poll(#[from] wgpu::PollError),
}

/// wgpu backends enabled by a configuration
pub fn backends(names: &[BackendName]) -> wgpu::Backends {
    names.iter().fold(wgpu::Backends::empty(), |all, name| {
        all | match name {
            BackendName::Vulkan => wgpu::Backends::VULKAN,
            BackendName::Metal => wgpu::Backends::METAL,
            BackendName::Dx12 => wgpu::Backends::DX12,
            BackendName::Gl => wgpu::Backends::GL,
        }
    })
}

/// Search order of an adapter type, lower first
fn adapter_rank(device_type: wgpu::DeviceType, preference: PowerPreference) -> u8 {
    match (device_type, preference) {
        (wgpu::DeviceType::DiscreteGpu, PowerPreference::HighPerformance) | (wgpu::DeviceType::IntegratedGpu, PowerPreference::LowPower) => 0,
        (wgpu::DeviceType::DiscreteGpu | wgpu::DeviceType::IntegratedGpu, _) => 1,
        (wgpu::DeviceType::VirtualGpu, _) => 2,
        (wgpu::DeviceType::Other, _) => 3,
        (wgpu::DeviceType::Cpu, _) => 4,
    }
}

/// A device created by the caller
pub struct ExternalDevice {
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl DeviceCapabilities for ExternalDevice {
    fn base_features(&self) -> BaseFeatures {
        FeatureSupport::new(self.device.features()).base_features()
    }

    fn extension_names(&self) -> Vec<String> {
        FeatureSupport::new(self.device.features()).extension_names()
    }

    fn chained_features(&self, request: &FeatureChain) -> Option<FeatureChain> {
        FeatureSupport::new(self.device.features()).chained_features(request)
    }
}

pub struct WgpuContext {
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

/// Offscreen framebuffer
pub struct WgpuWindow {
    pub color_texture: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    pub color_format: wgpu::TextureFormat,
    pub depth_stencil: Option<(wgpu::Texture, wgpu::TextureView)>,
    pub depth_stencil_format: Option<wgpu::TextureFormat>,
}

pub enum BuiltPipeline {
    Graphics { pipeline: wgpu::RenderPipeline, vertex_source: VertexSource },
    Compute(wgpu::ComputePipeline),
}

/// Pipelines of one script, indexed like the keys of its pipeline set
pub struct WgpuPipelines {
    pub pipelines: Vec<BuiltPipeline>,
    rectangle_buffer: wgpu::Buffer,
    vertex_buffer: Option<(wgpu::Buffer, u32)>,
}

/// Creates a 2D texture with a single mip level and sample
fn create_texture(device: &wgpu::Device, label: &str, format: &WindowFormat, texture_format: wgpu::TextureFormat, usage: wgpu::TextureUsages) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: format.width as u32,
            height: format.height as u32,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: texture_format,
        usage,
        view_formats: &[],
    })
}

/// Checks that a window attachment can be created before touching the device
///
/// # Arguments
/// * `format` - The requested window, for its size
/// * `name` - Name of the attachment's format, for the error
/// * `features` - What the adapter supports for the attachment's texture format
/// * `usage` - Usages the attachment is created with
/// * `max_dimension` - The device's 2D texture size limit
fn check_attachment(format: &WindowFormat, name: &'static str, features: wgpu::TextureFormatFeatures, usage: wgpu::TextureUsages, max_dimension: u32) -> Result<(), WgpuError> {
    if format.width == 0 || format.height == 0 || format.width > max_dimension as usize || format.height > max_dimension as usize {
        return Err(WgpuError::WindowSize {
            width: format.width,
            height: format.height,
            max: max_dimension,
        });
    }
    if !features.allowed_usages.contains(usage) {
        return Err(WgpuError::UnsupportedFormat(name));
    }
    Ok(())
}

pub struct WgpuBackend {
    instance: wgpu::Instance,
    config: RunnerConfig,
}

impl WgpuBackend {
    pub fn new(config: RunnerConfig) -> Self {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: backends(&config.backends),
            ..Default::default()
        });

        Self { instance, config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Adapters to try, in search order
    fn candidate_adapters(&self) -> Result<Vec<wgpu::Adapter>, WgpuError> {
        let mut adapters = self.instance.enumerate_adapters(backends(&self.config.backends));

        if let Some(device_id) = self.config.device_id {
            if device_id >= adapters.len() {
                return Err(WgpuError::NoSuchAdapter(device_id));
            }
            return Ok(vec![adapters.swap_remove(device_id)]);
        }

        adapters.sort_by_key(|adapter| adapter_rank(adapter.get_info().device_type, self.config.power_preference));
        Ok(adapters)
    }

    fn open(adapter: wgpu::Adapter, requirements: &Requirements) -> Result<WgpuContext, WgpuError> {
        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Script Device"),
            required_features: capabilities::required_features(requirements),
            required_limits: adapter.limits(),
            memory_hints: wgpu::MemoryHints::default(),
            trace: Default::default(),
        }))?;

        Ok(WgpuContext { adapter, device, queue })
    }

    fn create_pipelines(context: &WgpuContext, window: &WgpuWindow, script: &Script, pipeline_set: &PipelineSet) -> Result<Vec<BuiltPipeline>, WgpuError> {
        let device = &context.device;

        let mut modules: [Option<wgpu::ShaderModule>; vkscript_config::stage::N_STAGES] = Default::default();
        for shader in script.shaders() {
            modules[shader.stage.index()] = Some(device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(shader.stage.name()),
                source: wgpu::ShaderSource::SpirV(Cow::Borrowed(&shader.words)),
            }));
        }
        let module = |stage: Stage| modules[stage.index()].as_ref().ok_or(WgpuError::MissingShader(stage));

        let mut pipelines = Vec::with_capacity(pipeline_set.len());
        for key in pipeline_set.keys() {
            let built = match key.kind() {
                PipelineKind::Graphics => {
                    let state = key.materialize(pipeline_set.stages(), 1);
                    if let Some((stage, _)) = state.entry_points.iter().find(|(stage, _)| matches!(stage, Stage::TessCtrl | Stage::TessEval | Stage::Geometry)) {
                        return Err(WgpuError::UnsupportedState(format!("{stage} shaders")));
                    }

                    let vertex_layout = state::vertex_layout(state.vertex_source, script.vertex_data())?;
                    let targets = state::color_target_states(&state, window.color_format)?;
                    let fragment = modules[Stage::Fragment.index()].as_ref().map(|fragment_module| wgpu::FragmentState {
                        module: fragment_module,
                        entry_point: Some(key.entrypoint(Stage::Fragment)),
                        compilation_options: Default::default(),
                        targets: &targets,
                    });

                    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                        label: Some("Script Graphics Pipeline"),
                        layout: None,
                        vertex: wgpu::VertexState {
                            module: module(Stage::Vertex)?,
                            entry_point: Some(key.entrypoint(Stage::Vertex)),
                            compilation_options: Default::default(),
                            buffers: &[vertex_layout.buffer_layout()],
                        },
                        primitive: state::primitive_state(&state)?,
                        depth_stencil: state::depth_stencil_state(&state, window.depth_stencil_format)?,
                        multisample: wgpu::MultisampleState::default(),
                        fragment,
                        multiview: None,
                        cache: None,
                    });

                    BuiltPipeline::Graphics {
                        pipeline,
                        vertex_source: state.vertex_source,
                    }
                }
                PipelineKind::Compute => BuiltPipeline::Compute(device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                    label: Some("Script Compute Pipeline"),
                    layout: None,
                    module: module(Stage::Compute)?,
                    entry_point: Some(key.entrypoint(Stage::Compute)),
                    compilation_options: Default::default(),
                    cache: None,
                })),
            };
            pipelines.push(built);
        }

        Ok(pipelines)
    }
}

impl Backend for WgpuBackend {
    type External = ExternalDevice;
    type Context = WgpuContext;
    type Window = WgpuWindow;
    type Pipelines = WgpuPipelines;
    type Error = WgpuError;

    fn create_context(&mut self, requirements: &Requirements) -> Result<WgpuContext, WgpuError> {
        let mut last_error = None;

        for adapter in self.candidate_adapters()? {
            let info = adapter.get_info();
            match requirements.check(&FeatureSupport::from_adapter(&adapter)) {
                Ok(()) => {
                    tracing::info!(adapter = %info.name, backend = ?info.backend, "Using adapter");
                    return Self::open(adapter, requirements);
                }
                Err(e) => {
                    tracing::debug!(adapter = %info.name, "Adapter rejected: {e}");
                    last_error = Some(e.to_string());
                }
            }
        }

        Err(WgpuError::NoSuitableAdapter(last_error.unwrap_or_else(|| "no adapters found".to_string())))
    }

    fn wrap_external(&mut self, device: &ExternalDevice, _requirements: &Requirements) -> Result<WgpuContext, WgpuError> {
        Ok(WgpuContext {
            adapter: device.adapter.clone(),
            device: device.device.clone(),
            queue: device.queue.clone(),
        })
    }

    fn create_window(&mut self, context: &WgpuContext, format: &WindowFormat) -> Result<WgpuWindow, WgpuError> {
        let max_dimension = context.device.limits().max_texture_dimension_2d;

        let color_format = formats::texture_format(format.color_format).ok_or(WgpuError::UnsupportedFormat(format.color_format.name))?;
        check_attachment(format, format.color_format.name, context.adapter.get_texture_format_features(color_format), COLOR_USAGE, max_dimension)?;

        let depth_stencil_format = match format.depth_stencil_format {
            Some(depth_format) => {
                let texture_format = formats::texture_format(depth_format).ok_or(WgpuError::UnsupportedFormat(depth_format.name))?;
                check_attachment(format, depth_format.name, context.adapter.get_texture_format_features(texture_format), DEPTH_STENCIL_USAGE, max_dimension)?;
                Some(texture_format)
            }
            None => None,
        };

        let device = &context.device;
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let color_texture = create_texture(device, "Color Attachment", format, color_format, COLOR_USAGE);
        let color_view = color_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_stencil = depth_stencil_format.map(|texture_format| {
            let texture = create_texture(device, "Depth/Stencil Attachment", format, texture_format, DEPTH_STENCIL_USAGE);
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            (texture, view)
        });

        let validation_error = pollster::block_on(device.pop_error_scope());
        let memory_error = pollster::block_on(device.pop_error_scope());
        if let Some(error) = validation_error.or(memory_error) {
            return Err(WgpuError::Validation(error.to_string()));
        }

        tracing::debug!("Created {}x{} window with {:?} / {:?}", format.width, format.height, color_format, depth_stencil_format);

        Ok(WgpuWindow {
            color_texture,
            color_view,
            color_format,
            depth_stencil,
            depth_stencil_format,
        })
    }

    fn build_pipelines(&mut self, context: &WgpuContext, window: &WgpuWindow, script: &Script, pipeline_set: &PipelineSet) -> Result<WgpuPipelines, WgpuError> {
        let device = &context.device;

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipelines = Self::create_pipelines(context, window, script, pipeline_set);
        let scope_error = pollster::block_on(device.pop_error_scope());

        let pipelines = pipelines?;
        if let Some(error) = scope_error {
            return Err(WgpuError::Validation(error.to_string()));
        }

        let rectangle_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Rectangle Vertices"),
            contents: bytemuck::cast_slice(&state::RECTANGLE_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let vertex_buffer = script.vertex_data().filter(|vbo| vbo.num_rows() > 0).map(|vbo| {
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Script Vertex Data"),
                contents: vbo.raw_data(),
                usage: wgpu::BufferUsages::VERTEX,
            });
            (buffer, vbo.num_rows() as u32)
        });

        Ok(WgpuPipelines {
            pipelines,
            rectangle_buffer,
            vertex_buffer,
        })
    }
}

/// Runs every pipeline of a script once against the window and waits for completion
///
/// Graphics pipelines draw their whole vertex source, compute pipelines dispatch a
/// single workgroup.
pub fn render_all(context: &WgpuContext, window: &WgpuWindow, pipelines: &WgpuPipelines) -> Result<(), WgpuError> {
    let device = &context.device;
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Script Encoder") });
    let mut cleared = false;

    for built in &pipelines.pipelines {
        match built {
            BuiltPipeline::Graphics { pipeline, vertex_source } => {
                let (buffer, vertex_count) = match vertex_source {
                    VertexSource::Rectangle => (&pipelines.rectangle_buffer, state::RECTANGLE_VERTICES.len() as u32),
                    VertexSource::VertexData => match &pipelines.vertex_buffer {
                        Some((buffer, rows)) => (buffer, *rows),
                        None => continue,
                    },
                };

                // The first render pass clears the attachments, later ones accumulate
                let (color_load, depth_load, stencil_load) = if cleared {
                    (wgpu::LoadOp::Load, wgpu::LoadOp::Load, wgpu::LoadOp::Load)
                } else {
                    (wgpu::LoadOp::Clear(wgpu::Color::BLACK), wgpu::LoadOp::Clear(1.0), wgpu::LoadOp::Clear(0))
                };
                cleared = true;

                let depth_stencil_attachment = window.depth_stencil.as_ref().zip(window.depth_stencil_format).map(|((_, view), format)| wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: format.has_depth_aspect().then_some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: format.has_stencil_aspect().then_some(wgpu::Operations {
                        load: stencil_load,
                        store: wgpu::StoreOp::Store,
                    }),
                });

                let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Script Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &window.color_view,
                        depth_slice: None,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: color_load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                render_pass.set_pipeline(pipeline);
                render_pass.set_vertex_buffer(0, buffer.slice(..));
                render_pass.draw(0..vertex_count, 0..1);
            }
            BuiltPipeline::Compute(pipeline) => {
                let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some("Script Compute Pass"),
                    timestamp_writes: None,
                });
                compute_pass.set_pipeline(pipeline);
                compute_pass.dispatch_workgroups(1, 1, 1);
            }
        }
    }

    context.queue.submit(Some(encoder.finish()));
    device.poll(wgpu::PollType::Wait)?;

    if let Some(error) = pollster::block_on(device.pop_error_scope()) {
        return Err(WgpuError::Validation(error.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backends() {
        assert_eq!(backends(&[BackendName::Vulkan]), wgpu::Backends::VULKAN);
        assert_eq!(backends(&[BackendName::Metal, BackendName::Gl]), wgpu::Backends::METAL | wgpu::Backends::GL);
        assert_eq!(backends(&[]), wgpu::Backends::empty());
    }

    #[test]
    fn test_adapter_rank() {
        let high = PowerPreference::HighPerformance;
        let low = PowerPreference::LowPower;

        assert!(adapter_rank(wgpu::DeviceType::DiscreteGpu, high) < adapter_rank(wgpu::DeviceType::IntegratedGpu, high));
        assert!(adapter_rank(wgpu::DeviceType::IntegratedGpu, low) < adapter_rank(wgpu::DeviceType::DiscreteGpu, low));
        assert!(adapter_rank(wgpu::DeviceType::IntegratedGpu, high) < adapter_rank(wgpu::DeviceType::Cpu, high));
    }

    fn window(width: usize, height: usize, color: &str) -> WindowFormat {
        WindowFormat {
            color_format: vkscript_config::Format::lookup_by_name(color).unwrap(),
            depth_stencil_format: None,
            width,
            height,
        }
    }

    fn check(window: &WindowFormat, texture_format: wgpu::TextureFormat, usage: wgpu::TextureUsages) -> Result<(), WgpuError> {
        let features = texture_format.guaranteed_format_features(wgpu::Features::empty());
        check_attachment(window, window.color_format.name, features, usage, 8192)
    }

    #[test]
    fn test_window_attachment_checks() {
        assert!(check(&window(250, 250, "B8G8R8A8_UNORM"), wgpu::TextureFormat::Bgra8Unorm, COLOR_USAGE).is_ok());
        assert!(check(&window(8192, 1, "B8G8R8A8_UNORM"), wgpu::TextureFormat::Bgra8Unorm, COLOR_USAGE).is_ok());
        assert!(check(&window(250, 250, "D32_SFLOAT"), wgpu::TextureFormat::Depth32Float, DEPTH_STENCIL_USAGE).is_ok());
    }

    #[test]
    fn test_oversized_window_is_an_error() {
        let error = check(&window(100_000, 250, "B8G8R8A8_UNORM"), wgpu::TextureFormat::Bgra8Unorm, COLOR_USAGE).unwrap_err();
        assert!(matches!(error, WgpuError::WindowSize { width: 100_000, height: 250, max: 8192 }));
        assert!(matches!(check(&window(250, 8193, "B8G8R8A8_UNORM"), wgpu::TextureFormat::Bgra8Unorm, COLOR_USAGE), Err(WgpuError::WindowSize { .. })));
    }

    #[test]
    fn test_unrenderable_color_format_is_an_error() {
        let error = check(&window(250, 250, "R8G8B8A8_SNORM"), wgpu::TextureFormat::Rgba8Snorm, COLOR_USAGE).unwrap_err();
        assert!(matches!(error, WgpuError::UnsupportedFormat("R8G8B8A8_SNORM")));
    }

    #[test]
    fn test_rectangle_covers_framebuffer() {
        let xs: Vec<f32> = state::RECTANGLE_VERTICES.iter().map(|v| v[0]).collect();
        let ys: Vec<f32> = state::RECTANGLE_VERTICES.iter().map(|v| v[1]).collect();
        assert!(xs.contains(&-1.0) && xs.contains(&1.0));
        assert!(ys.contains(&-1.0) && ys.contains(&1.0));
        assert_eq!(std::mem::size_of_val(&state::RECTANGLE_VERTICES[0]) as u64, state::RECTANGLE_STRIDE);
    }
}
