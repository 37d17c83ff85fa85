//! Image loading for texture data
//!
//! Every format the `image` crate decodes is expanded to tightly packed RGBA8,
//! rows top to bottom as stored in the file.

use std::path::Path;

use crate::assets::AssetError;

/// Loaded image data ready for GPU upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Raw RGBA pixel data
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Number of color channels (always 4 after loading)
    pub channels: u8,
}

impl ImageData {
    /// Load an image from a file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path_ref = path.as_ref();
        let display = path_ref.display().to_string();

        if !path_ref.exists() {
            return Err(AssetError::NotFound { path: display });
        }

        log::debug!("Loading image from: {:?}", path_ref);

        let img = image::open(path_ref).map_err(|e| AssetError::LoadFailed {
            path: display.clone(),
            reason: e.to_string(),
        })?;

        let rgba_img = img.to_rgba8();
        let (width, height) = rgba_img.dimensions();
        if width == 0 || height == 0 {
            return Err(AssetError::InvalidData {
                path: display,
                reason: "image has no pixels".to_string(),
            });
        }

        log::info!("Loaded image {}x{} from {:?}", width, height, path_ref);

        Ok(Self {
            data: rgba_img.into_raw(),
            width,
            height,
            channels: 4,
        })
    }

    /// Create a solid color image
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = (width * height) as usize;
        Self {
            data: color.repeat(pixel_count),
            width,
            height,
            channels: 4,
        }
    }

    /// Reverse the row order so the first row in memory is the image's bottom row
    ///
    /// Sphere texcoords put v = 0 at the south pole, which should sample the
    /// bottom of a conventionally stored map.
    #[must_use]
    pub fn flip_vertically(mut self) -> Self {
        let row_len = self.row_len();
        if row_len == 0 {
            return self;
        }

        let rows = self.data.len() / row_len;
        for top in 0..rows / 2 {
            let bottom = rows - 1 - top;
            let (head, tail) = self.data.split_at_mut(bottom * row_len);
            head[top * row_len..(top + 1) * row_len].swap_with_slice(&mut tail[..row_len]);
        }
        self
    }

    /// Bytes per row
    pub fn row_len(&self) -> usize {
        self.width as usize * self.channels as usize
    }

    /// Get the size of the image data in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Number of levels in a full mip chain for this image
    pub fn mip_levels(&self) -> u32 {
        32 - self.width.max(self.height).max(1).leading_zeros()
    }
}

/// Six square faces of a cube map in +X, -X, +Y, -Y, +Z, -Z order
#[derive(Debug, Clone)]
pub struct CubeMapImages {
    faces: [ImageData; 6],
}

impl CubeMapImages {
    /// Load and validate six face images
    ///
    /// Faces are used as stored; cube map sampling has its own orientation
    /// convention, so they are not flipped.
    pub fn from_files<P: AsRef<Path>>(paths: &[P; 6]) -> Result<Self, AssetError> {
        let mut faces = Vec::with_capacity(6);
        for path in paths {
            faces.push(ImageData::from_file(path)?);
        }

        let label = paths[0].as_ref().display().to_string();
        let faces: [ImageData; 6] = faces.try_into().map_err(|_| AssetError::InvalidData {
            path: label.clone(),
            reason: "expected six cube map faces".to_string(),
        })?;

        Self::from_faces(faces, &label)
    }

    /// Validate already decoded faces
    ///
    /// `label` names the cube map in errors.
    pub fn from_faces(faces: [ImageData; 6], label: &str) -> Result<Self, AssetError> {
        let size = faces[0].width;
        for (index, face) in faces.iter().enumerate() {
            if face.width != face.height {
                return Err(AssetError::InvalidData {
                    path: label.to_string(),
                    reason: format!("face {index} is {}x{}, not square", face.width, face.height),
                });
            }
            if face.width != size {
                return Err(AssetError::InvalidData {
                    path: label.to_string(),
                    reason: format!("face {index} is {} pixels wide, expected {size}", face.width),
                });
            }
        }

        Ok(Self { faces })
    }

    /// Edge length of each face in pixels
    pub fn face_size(&self) -> u32 {
        self.faces[0].width
    }

    /// Face images in layer order
    pub fn faces(&self) -> &[ImageData; 6] {
        &self.faces
    }

    /// Bytes in a single face
    pub fn face_bytes(&self) -> usize {
        self.faces[0].size_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn striped(width: u32, height: u32) -> ImageData {
        let mut image = ImageData::solid_color(width, height, [0, 0, 0, 255]);
        let row_len = image.row_len();
        for (row, chunk) in image.data.chunks_mut(row_len).enumerate() {
            for pixel in chunk.chunks_mut(4) {
                pixel[0] = row as u8;
            }
        }
        image
    }

    #[test]
    fn test_solid_color_image() {
        let img = ImageData::solid_color(4, 4, [255, 0, 0, 255]);
        assert_eq!(img.width, 4);
        assert_eq!(img.height, 4);
        assert_eq!(img.channels, 4);
        assert_eq!(img.size_bytes(), 4 * 4 * 4);
        assert_eq!(&img.data[0..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_flip_reverses_rows() {
        let flipped = striped(3, 5).flip_vertically();
        let rows: Vec<u8> = flipped.data.chunks(flipped.row_len()).map(|row| row[0]).collect();
        assert_eq!(rows, vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_flip_twice_is_identity() {
        let original = striped(2, 4);
        assert_eq!(original.clone().flip_vertically().flip_vertically(), original);
    }

    #[test]
    fn test_mip_levels() {
        assert_eq!(ImageData::solid_color(1, 1, [0; 4]).mip_levels(), 1);
        assert_eq!(ImageData::solid_color(256, 128, [0; 4]).mip_levels(), 9);
        assert_eq!(ImageData::solid_color(300, 10, [0; 4]).mip_levels(), 9);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let result = ImageData::from_file("no/such/texture.bmp");
        match result {
            Err(err @ AssetError::NotFound { .. }) => {
                assert_eq!(err.path(), "no/such/texture.bmp");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_corrupt_file_is_load_failure() {
        let path = std::env::temp_dir().join(format!("orbit_engine_{}_corrupt.png", std::process::id()));
        std::fs::write(&path, b"definitely not a png").expect("write temp file");

        let result = ImageData::from_file(&path);
        let _ = std::fs::remove_file(&path);

        assert!(matches!(result, Err(AssetError::LoadFailed { .. })));
    }

    #[test]
    fn test_png_loads_as_rgba() {
        let path = std::env::temp_dir().join(format!("orbit_engine_{}_rgb.png", std::process::id()));
        let rgb = image::RgbImage::from_pixel(2, 3, image::Rgb([10, 20, 30]));
        rgb.save(&path).expect("write temp png");

        let result = ImageData::from_file(&path);
        let _ = std::fs::remove_file(&path);

        let loaded = result.expect("png should load");
        assert_eq!((loaded.width, loaded.height, loaded.channels), (2, 3, 4));
        assert_eq!(&loaded.data[0..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_cube_map_requires_square_equal_faces() {
        let square = || ImageData::solid_color(8, 8, [0; 4]);

        let ok = CubeMapImages::from_faces(
            [square(), square(), square(), square(), square(), square()],
            "sky",
        )
        .expect("matching faces are valid");
        assert_eq!(ok.face_size(), 8);
        assert_eq!(ok.face_bytes(), 8 * 8 * 4);

        let not_square = CubeMapImages::from_faces(
            [square(), ImageData::solid_color(8, 4, [0; 4]), square(), square(), square(), square()],
            "sky",
        );
        assert!(matches!(not_square, Err(AssetError::InvalidData { .. })));

        let mismatched = CubeMapImages::from_faces(
            [square(), square(), square(), square(), square(), ImageData::solid_color(16, 16, [0; 4])],
            "sky",
        );
        assert!(matches!(mismatched, Err(AssetError::InvalidData { .. })));
    }
}
