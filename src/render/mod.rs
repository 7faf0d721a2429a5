pub mod frame;
pub mod gpu;
pub mod pipeline;
#[cfg(test)]
mod reference;
pub mod shaders;

use crate::error::RenderError;
use crate::params::FrameParameters;
use frame::FrameTarget;
use gpu::GpuContext;
use pipeline::FractalPipeline;

/// Owns the device and the compiled passes for the lifetime of a session.
/// Simulation state is never stored here; each frame arrives as a
/// [`FrameParameters`] value.
pub struct FractalRenderer {
    gpu: GpuContext,
    pipeline: Option<FractalPipeline>,
}

impl FractalRenderer {
    pub fn new(gpu: GpuContext) -> Self {
        Self { gpu, pipeline: None }
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    pub fn is_initialized(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Compile the three passes. Runs once; later calls only warn.
    pub fn initialize(&mut self) -> Result<(), RenderError> {
        if self.pipeline.is_some() {
            log::warn!("Fractal pipeline already initialized, ignoring");
            return Ok(());
        }
        self.pipeline = Some(FractalPipeline::new(&self.gpu.device)?);
        Ok(())
    }

    /// Fails with `UnsupportedTargetSize` when a side is zero or above the
    /// device's texture limit.
    pub fn create_target(&self, width: u32, height: u32) -> Result<FrameTarget, RenderError> {
        FrameTarget::new(&self.gpu.device, width, height)
    }

    /// Dispatch background, foreground and composite into `target`.
    pub fn render(&mut self, params: &FrameParameters, target: &FrameTarget) -> Result<(), RenderError> {
        let Some(pipeline) = self.pipeline.as_mut() else {
            return Err(RenderError::DispatchSkipped("pipeline not initialized".into()));
        };
        pipeline.dispatch(&self.gpu, params, target)
    }

    pub fn read_frame(&self, target: &FrameTarget) -> Result<Vec<u8>, RenderError> {
        target.read_pixels(&self.gpu)
    }

    /// Wait for in-flight GPU work before the device is dropped.
    pub fn shutdown(self) {
        self.gpu.drain();
        log::debug!("GPU queue drained");
    }
}
