use std::path::Path;

use crate::AssetError;

/// Face order expected by [`CubeTextureData::from_faces`]: +X, -X, +Y, -Y, +Z, -Z.
pub const CUBE_FACE_ORDER: [&str; 6] = ["px", "nx", "py", "ny", "pz", "nz"];

/// Decoded RGBA8 image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextureData {
    /// Wrap raw RGBA8 pixels, checking the buffer length.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, AssetError> {
        if width == 0 || height == 0 {
            return Err(AssetError::InvalidTexture(format!(
                "dimensions must be non-zero, got {width}x{height}"
            )));
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(AssetError::InvalidTexture(format!(
                "expected {expected} bytes for {width}x{height}, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A 1x1 texture of a single colour.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: rgba.to_vec(),
        }
    }

    /// Decode PNG or JPEG bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, AssetError> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = img.dimensions();
        Self::from_rgba(width, height, img.into_raw())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::decode(&bytes)
    }

    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }
}

/// Six square faces of equal size forming a cube map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubeTextureData {
    pub size: u32,
    pub faces: Vec<TextureData>,
}

impl CubeTextureData {
    /// Assemble a cube map from faces in [`CUBE_FACE_ORDER`].
    pub fn from_faces(faces: Vec<TextureData>) -> Result<Self, AssetError> {
        if faces.len() != 6 {
            return Err(AssetError::InvalidTexture(format!(
                "cube map needs 6 faces, got {}",
                faces.len()
            )));
        }
        let size = faces[0].width;
        for (face, name) in faces.iter().zip(CUBE_FACE_ORDER) {
            if face.width != size || face.height != size {
                return Err(AssetError::InvalidTexture(format!(
                    "cube face {name} is {}x{}, expected {size}x{size}",
                    face.width, face.height
                )));
            }
        }
        Ok(Self { size, faces })
    }

    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self, AssetError> {
        let faces = paths
            .iter()
            .map(TextureData::load)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_faces(faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn decode_png() {
        let tex = TextureData::decode(&png_bytes(4, 2, [10, 20, 30, 255])).unwrap();
        assert_eq!((tex.width, tex.height), (4, 2));
        assert_eq!(tex.byte_len(), 32);
        assert_eq!(&tex.pixels[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn reject_wrong_buffer_length() {
        assert!(TextureData::from_rgba(2, 2, vec![0; 15]).is_err());
        assert!(TextureData::from_rgba(0, 2, vec![]).is_err());
    }

    #[test]
    fn reject_garbage_bytes() {
        assert!(TextureData::decode(b"definitely not an image").is_err());
    }

    #[test]
    fn cube_requires_six_equal_square_faces() {
        let face = TextureData::solid([255, 255, 255, 255]);
        let cube = CubeTextureData::from_faces(vec![face.clone(); 6]).unwrap();
        assert_eq!(cube.size, 1);

        assert!(CubeTextureData::from_faces(vec![face.clone(); 5]).is_err());

        let mut faces = vec![face; 6];
        faces[3] = TextureData::from_rgba(2, 1, vec![0; 8]).unwrap();
        let err = CubeTextureData::from_faces(faces).unwrap_err();
        assert!(err.to_string().contains("ny"));
    }

    #[test]
    fn load_cube_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<_> = CUBE_FACE_ORDER
            .iter()
            .map(|name| {
                let p = dir.path().join(format!("{name}.png"));
                std::fs::write(&p, png_bytes(8, 8, [0, 0, 64, 255])).unwrap();
                p
            })
            .collect();
        let cube = CubeTextureData::load(&paths).unwrap();
        assert_eq!(cube.size, 8);
        assert_eq!(cube.faces.len(), 6);
    }
}
