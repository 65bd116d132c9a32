use std::fmt;
use std::str::FromStr;

use super::error::RenderError;

/// Which native graphics API the device is created on.
///
/// Parsed from the `--backend` flag. The `dawn_*` spellings of older
/// benchmark scripts are accepted as aliases.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum BackendSelector {
    /// Let the adapter request pick the best available API.
    #[default]
    Auto,
    Vulkan,
    Metal,
    D3d12,
    OpenGl,
}

impl BackendSelector {
    pub const ALL: [BackendSelector; 5] = [
        BackendSelector::Auto,
        BackendSelector::Vulkan,
        BackendSelector::Metal,
        BackendSelector::D3d12,
        BackendSelector::OpenGl,
    ];

    pub fn backends(self) -> wgpu::Backends {
        match self {
            BackendSelector::Auto => wgpu::Backends::PRIMARY,
            BackendSelector::Vulkan => wgpu::Backends::VULKAN,
            BackendSelector::Metal => wgpu::Backends::METAL,
            BackendSelector::D3d12 => wgpu::Backends::DX12,
            BackendSelector::OpenGl => wgpu::Backends::GL,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BackendSelector::Auto => "auto",
            BackendSelector::Vulkan => "vulkan",
            BackendSelector::Metal => "metal",
            BackendSelector::D3d12 => "d3d12",
            BackendSelector::OpenGl => "opengl",
        }
    }
}

impl fmt::Display for BackendSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendSelector {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let name = lower.strip_prefix("dawn_").unwrap_or(&lower);

        match name {
            "auto" | "default" => Ok(BackendSelector::Auto),
            "vulkan" | "vk" => Ok(BackendSelector::Vulkan),
            "metal" | "mtl" => Ok(BackendSelector::Metal),
            "d3d12" | "dx12" => Ok(BackendSelector::D3d12),
            "opengl" | "gl" => Ok(BackendSelector::OpenGl),
            _ => Err(RenderError::UnknownBackend(s.to_owned())),
        }
    }
}
