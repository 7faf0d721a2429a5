use crate::error::RenderError;

pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    pub fn new() -> Result<Self, RenderError> {
        pollster::block_on(Self::init_async(false))
    }

    /// Hardware adapter if there is one, else the software fallback.
    #[cfg(test)]
    pub(crate) fn for_tests() -> Option<Self> {
        Self::new()
            .or_else(|_| pollster::block_on(Self::init_async(true)))
            .ok()
    }

    async fn init_async(force_fallback_adapter: bool) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::METAL | wgpu::Backends::VULKAN | wgpu::Backends::DX12,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter,
            })
            .await
            .ok_or_else(|| RenderError::PipelineInitFailed("no suitable GPU adapter".into()))?;

        log::info!("Using GPU: {}", adapter.get_info().name);
        log::info!("Backend: {:?}", adapter.get_info().backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("fractalis_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    ..Default::default()
                },
                None,
            )
            .await
            .map_err(|e| RenderError::PipelineInitFailed(format!("failed to create GPU device: {}", e)))?;

        Ok(Self { device, queue })
    }

    /// Block until all submitted work has finished.
    pub fn drain(&self) {
        let _ = self.device.poll(wgpu::Maintain::Wait);
    }
}
