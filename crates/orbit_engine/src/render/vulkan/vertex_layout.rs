//! Vulkan vertex input state derived from a backend-agnostic [`VertexLayout`]

use ash::vk;

use super::context::{VulkanError, VulkanResult};
use crate::render::primitives::VertexLayout;

/// Binding and attribute descriptions for one interleaved vertex buffer
#[derive(Debug, Clone)]
pub struct VulkanVertexLayout {
    binding: vk::VertexInputBindingDescription,
    attributes: Vec<vk::VertexInputAttributeDescription>,
}

impl VulkanVertexLayout {
    /// Translate `layout` for vertex buffer binding 0
    pub fn from_layout(layout: &VertexLayout) -> VulkanResult<Self> {
        let attributes = layout
            .attributes
            .iter()
            .map(|attribute| {
                Ok(vk::VertexInputAttributeDescription {
                    binding: 0,
                    location: attribute.location,
                    format: float_format(attribute.components)?,
                    offset: attribute.offset,
                })
            })
            .collect::<VulkanResult<Vec<_>>>()?;

        Ok(Self {
            binding: vk::VertexInputBindingDescription {
                binding: 0,
                stride: layout.stride,
                input_rate: vk::VertexInputRate::VERTEX,
            },
            attributes,
        })
    }

    /// Binding description
    pub fn binding(&self) -> &vk::VertexInputBindingDescription {
        &self.binding
    }

    /// Attribute descriptions
    pub fn attributes(&self) -> &[vk::VertexInputAttributeDescription] {
        &self.attributes
    }
}

fn float_format(components: u32) -> VulkanResult<vk::Format> {
    match components {
        1 => Ok(vk::Format::R32_SFLOAT),
        2 => Ok(vk::Format::R32G32_SFLOAT),
        3 => Ok(vk::Format::R32G32B32_SFLOAT),
        4 => Ok(vk::Format::R32G32B32A32_SFLOAT),
        n => Err(VulkanError::InvalidOperation {
            reason: format!("unsupported vertex attribute width {n}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Vertex;

    #[test]
    fn test_vertex_layout_translation() {
        let layout = VulkanVertexLayout::from_layout(&Vertex::layout()).expect("valid layout");

        assert_eq!(layout.binding().stride, 20);
        assert_eq!(layout.binding().input_rate, vk::VertexInputRate::VERTEX);

        let attributes = layout.attributes();
        assert_eq!(attributes.len(), 2);
        assert_eq!((attributes[0].location, attributes[0].format, attributes[0].offset), (0, vk::Format::R32G32B32_SFLOAT, 0));
        assert_eq!((attributes[1].location, attributes[1].format, attributes[1].offset), (1, vk::Format::R32G32_SFLOAT, 12));
    }

    #[test]
    fn test_rejects_wide_attribute() {
        assert!(float_format(5).is_err());
    }
}
