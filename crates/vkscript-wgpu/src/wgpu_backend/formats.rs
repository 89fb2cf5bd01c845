//! Translation of table formats into wgpu texture and vertex formats

use vkscript_config::Format;

/// Texture format for a framebuffer attachment, if wgpu has one
pub fn texture_format(format: &Format) -> Option<wgpu::TextureFormat> {
    use wgpu::TextureFormat as T;

    let texture_format = match format.name {
        "R8_UNORM" => T::R8Unorm,
        "R8_SNORM" => T::R8Snorm,
        "R8_UINT" => T::R8Uint,
        "R8_SINT" => T::R8Sint,
        "R8G8_UNORM" => T::Rg8Unorm,
        "R8G8_SNORM" => T::Rg8Snorm,
        "R8G8_UINT" => T::Rg8Uint,
        "R8G8_SINT" => T::Rg8Sint,
        "R8G8B8A8_UNORM" => T::Rgba8Unorm,
        "R8G8B8A8_SRGB" => T::Rgba8UnormSrgb,
        "R8G8B8A8_SNORM" => T::Rgba8Snorm,
        "R8G8B8A8_UINT" => T::Rgba8Uint,
        "R8G8B8A8_SINT" => T::Rgba8Sint,
        "B8G8R8A8_UNORM" => T::Bgra8Unorm,
        "B8G8R8A8_SRGB" => T::Bgra8UnormSrgb,
        "A2B10G10R10_UNORM_PACK32" => T::Rgb10a2Unorm,
        "A2B10G10R10_UINT_PACK32" => T::Rgb10a2Uint,
        "B10G11R11_UFLOAT_PACK32" => T::Rg11b10Ufloat,
        "R16_UNORM" => T::R16Unorm,
        "R16_SNORM" => T::R16Snorm,
        "R16_UINT" => T::R16Uint,
        "R16_SINT" => T::R16Sint,
        "R16_SFLOAT" => T::R16Float,
        "R16G16_UNORM" => T::Rg16Unorm,
        "R16G16_SNORM" => T::Rg16Snorm,
        "R16G16_UINT" => T::Rg16Uint,
        "R16G16_SINT" => T::Rg16Sint,
        "R16G16_SFLOAT" => T::Rg16Float,
        "R16G16B16A16_UNORM" => T::Rgba16Unorm,
        "R16G16B16A16_SNORM" => T::Rgba16Snorm,
        "R16G16B16A16_UINT" => T::Rgba16Uint,
        "R16G16B16A16_SINT" => T::Rgba16Sint,
        "R16G16B16A16_SFLOAT" => T::Rgba16Float,
        "R32_UINT" => T::R32Uint,
        "R32_SINT" => T::R32Sint,
        "R32_SFLOAT" => T::R32Float,
        "R32G32_UINT" => T::Rg32Uint,
        "R32G32_SINT" => T::Rg32Sint,
        "R32G32_SFLOAT" => T::Rg32Float,
        "R32G32B32A32_UINT" => T::Rgba32Uint,
        "R32G32B32A32_SINT" => T::Rgba32Sint,
        "R32G32B32A32_SFLOAT" => T::Rgba32Float,
        "D16_UNORM" => T::Depth16Unorm,
        "X8_D24_UNORM_PACK32" => T::Depth24Plus,
        "D32_SFLOAT" => T::Depth32Float,
        "S8_UINT" => T::Stencil8,
        "D24_UNORM_S8_UINT" => T::Depth24PlusStencil8,
        "D32_SFLOAT_S8_UINT" => T::Depth32FloatStencil8,
        _ => return None,
    };

    Some(texture_format)
}

/// Vertex attribute format for a vertex data column, if wgpu has one
pub fn vertex_format(format: &Format) -> Option<wgpu::VertexFormat> {
    use wgpu::VertexFormat as V;

    let vertex_format = match format.name {
        "R8_UINT" => V::Uint8,
        "R8_SINT" => V::Sint8,
        "R8_UNORM" => V::Unorm8,
        "R8_SNORM" => V::Snorm8,
        "R8G8_UINT" => V::Uint8x2,
        "R8G8_SINT" => V::Sint8x2,
        "R8G8_UNORM" => V::Unorm8x2,
        "R8G8_SNORM" => V::Snorm8x2,
        "R8G8B8A8_UINT" => V::Uint8x4,
        "R8G8B8A8_SINT" => V::Sint8x4,
        "R8G8B8A8_UNORM" => V::Unorm8x4,
        "R8G8B8A8_SNORM" => V::Snorm8x4,
        "B8G8R8A8_UNORM" => V::Unorm8x4Bgra,
        "R16_UINT" => V::Uint16,
        "R16_SINT" => V::Sint16,
        "R16_UNORM" => V::Unorm16,
        "R16_SNORM" => V::Snorm16,
        "R16_SFLOAT" => V::Float16,
        "R16G16_UINT" => V::Uint16x2,
        "R16G16_SINT" => V::Sint16x2,
        "R16G16_UNORM" => V::Unorm16x2,
        "R16G16_SNORM" => V::Snorm16x2,
        "R16G16_SFLOAT" => V::Float16x2,
        "R16G16B16A16_UINT" => V::Uint16x4,
        "R16G16B16A16_SINT" => V::Sint16x4,
        "R16G16B16A16_UNORM" => V::Unorm16x4,
        "R16G16B16A16_SNORM" => V::Snorm16x4,
        "R16G16B16A16_SFLOAT" => V::Float16x4,
        "R32_UINT" => V::Uint32,
        "R32_SINT" => V::Sint32,
        "R32_SFLOAT" => V::Float32,
        "R32G32_UINT" => V::Uint32x2,
        "R32G32_SINT" => V::Sint32x2,
        "R32G32_SFLOAT" => V::Float32x2,
        "R32G32B32_UINT" => V::Uint32x3,
        "R32G32B32_SINT" => V::Sint32x3,
        "R32G32B32_SFLOAT" => V::Float32x3,
        "R32G32B32A32_UINT" => V::Uint32x4,
        "R32G32B32A32_SINT" => V::Sint32x4,
        "R32G32B32A32_SFLOAT" => V::Float32x4,
        "R64_SFLOAT" => V::Float64,
        "R64G64_SFLOAT" => V::Float64x2,
        "R64G64B64_SFLOAT" => V::Float64x3,
        "R64G64B64A64_SFLOAT" => V::Float64x4,
        "A2B10G10R10_UNORM_PACK32" => V::Unorm10_10_10_2,
        _ => return None,
    };

    Some(vertex_format)
}
