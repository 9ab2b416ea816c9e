//! Headless GPU device initialization and capability probing.

/// Failures while bringing up the GPU backend.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("no GPU adapter available for offscreen rendering")]
    NoAdapter,

    #[error("GPU device request rejected: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
}

/// Owns the wgpu instance, adapter, device and queue. No surface: frames are
/// rendered into an offscreen canvas.
pub struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    pub async fn new_headless() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
        {
            Ok(adapter) => adapter,
            Err(_) => return Err(GpuError::NoAdapter),
        };

        let info = adapter.get_info();
        log::info!(
            "Offscreen adapter: {} ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("griffith-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }

    /// Whether `Depth32Float` can be rendered to and sampled.
    pub fn supports_depth_texture(&self) -> bool {
        let features = self
            .adapter
            .get_texture_format_features(wgpu::TextureFormat::Depth32Float);
        depth_usages_supported(features.allowed_usages)
    }

    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }
}

/// Blocking wrapper around [`GpuContext::new_headless`].
pub fn init_headless_blocking() -> Result<GpuContext, GpuError> {
    pollster::block_on(GpuContext::new_headless())
}

fn depth_usages_supported(usages: wgpu::TextureUsages) -> bool {
    usages.contains(wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_requires_both_usages() {
        assert!(depth_usages_supported(
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
        ));
        assert!(!depth_usages_supported(wgpu::TextureUsages::RENDER_ATTACHMENT));
        assert!(!depth_usages_supported(wgpu::TextureUsages::TEXTURE_BINDING));
    }

    #[test]
    fn test_headless_context_reports_limits() {
        let Ok(ctx) = init_headless_blocking() else {
            return;
        };
        assert!(ctx.max_texture_dimension() >= 2048);
    }
}
