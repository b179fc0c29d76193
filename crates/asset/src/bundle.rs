//! Everything read from disk before the window opens.

use corelib::{ViewerConfig, ViewerResult};

use crate::{ModelData, ShaderSources, TextureData, obj};

/// Parsed model, decoded textures and shader text for one viewer run.
#[derive(Clone, Debug)]
pub struct ViewerAssets {
    pub model: ModelData,
    /// Decoded diffuse texture per material, `None` when the material has none.
    pub textures: Vec<Option<TextureData>>,
    pub shaders: ShaderSources,
}

impl ViewerAssets {
    pub fn load(config: &ViewerConfig) -> ViewerResult<Self> {
        let model = obj::load_model(&config.asset_path, &config.material_dir)?;
        let textures = load_textures(&model, config)?;
        let shaders = ShaderSources::load(&config.vertex_shader_path, &config.fragment_shader_path)?;
        Ok(Self {
            model,
            textures,
            shaders,
        })
    }

    /// Decoded texture for a shape's material, if any.
    pub fn texture_for(&self, material: Option<usize>) -> Option<&TextureData> {
        material.and_then(|m| self.textures.get(m)).and_then(Option::as_ref)
    }
}

/// Decode the diffuse texture of every material some shape uses. Unused
/// materials stay `None` and their files are never opened.
fn load_textures(model: &ModelData, config: &ViewerConfig) -> ViewerResult<Vec<Option<TextureData>>> {
    let mut textures = vec![None; model.materials.len()];
    for part in &model.parts {
        let Some(m) = part.material else { continue };
        let Some(material) = model.materials.get(m) else { continue };
        if textures[m].is_some() {
            continue;
        }
        match &material.diffuse_texture {
            Some(name) => textures[m] = Some(TextureData::load_rgb8(config.texture_path(name))?),
            None => log::warn!("Material '{}' has no diffuse texture", material.name),
        }
    }
    Ok(textures)
}
