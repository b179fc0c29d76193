//! Texture decoding and CPU-side pixel data.

use std::path::Path;

use corelib::{ViewerError, ViewerResult};

/// Texture data in CPU-friendly format before GPU upload.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Supported pixel layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureFormat {
    Rgb8,
    Rgba8,
}

impl TextureFormat {
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            TextureFormat::Rgb8 => 3,
            TextureFormat::Rgba8 => 4,
        }
    }
}

impl TextureData {
    /// Wrap raw pixels, checking the buffer length against the dimensions.
    pub fn new(width: u32, height: u32, format: TextureFormat, data: Vec<u8>) -> ViewerResult<Self> {
        let texture = Self {
            data,
            width,
            height,
            format,
        };
        if !texture.is_valid() {
            return Err(ViewerError::asset(
                "<pixels>",
                format!(
                    "{} bytes do not match a {}x{} {:?} image",
                    texture.data.len(),
                    width,
                    height,
                    format
                ),
            ));
        }
        Ok(texture)
    }

    /// Decode an image file into tightly packed RGB8.
    pub fn load_rgb8<P: AsRef<Path>>(path: P) -> ViewerResult<Self> {
        let path = path.as_ref();
        log::info!("Loading texture from {:?}", path);

        let bytes = std::fs::read(path).map_err(|e| ViewerError::asset(path, e))?;
        let texture = Self::decode_rgb8(&bytes, path)?;

        log::info!(
            "Loaded texture {}x{} with {} bytes",
            texture.width,
            texture.height,
            texture.data.len()
        );
        Ok(texture)
    }

    /// Decode an encoded image (PNG, JPEG, ...) into RGB8. The format is
    /// sniffed from the bytes; `origin` only names the source in errors.
    pub fn decode_rgb8(bytes: &[u8], origin: &Path) -> ViewerResult<Self> {
        let img = image::load_from_memory(bytes).map_err(|e| ViewerError::asset(origin, e))?;
        Ok(Self::from_image(img))
    }

    fn from_image(img: image::DynamicImage) -> Self {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        Self {
            data: rgb.into_raw(),
            width,
            height,
            format: TextureFormat::Rgb8,
        }
    }

    /// 1x1 opaque white, bound to shapes whose material has no texture.
    pub fn white() -> Self {
        Self {
            data: vec![255, 255, 255],
            width: 1,
            height: 1,
            format: TextureFormat::Rgb8,
        }
    }

    /// Pixels expanded to RGBA8 (alpha = 255) for formats without a 24-bit
    /// GPU equivalent.
    pub fn to_rgba8(&self) -> Vec<u8> {
        match self.format {
            TextureFormat::Rgba8 => self.data.clone(),
            TextureFormat::Rgb8 => {
                let mut out = Vec::with_capacity(self.data.len() / 3 * 4);
                for px in self.data.chunks_exact(3) {
                    out.extend_from_slice(px);
                    out.push(255);
                }
                out
            }
        }
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        self.format.bytes_per_pixel()
    }

    /// Check if the texture data is valid.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && self.expected_len() == Some(self.data.len())
    }

    /// Byte length implied by the dimensions, `None` if it overflows.
    fn expected_len(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.bytes_per_pixel() as usize)
    }
}
