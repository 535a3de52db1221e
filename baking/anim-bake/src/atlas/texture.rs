//! The shared bone texture

use crate::atlas::packer::Rect;
use crate::error::{BakeError, Result};
use crate::texel::{TEXEL_SIZE, Texel, ZERO_TEXEL};

/// Sampling filter the texture must be created with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Nearest texel; the only mode that keeps bone rows apart
    Point,
    Bilinear,
}

/// Addressing outside `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    Clamp,
    Repeat,
}

/// RGBA16F texel buffer shared by all clips, stored row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atlas {
    width: u32,
    height: u32,
    texels: Vec<Texel>,
}

impl Atlas {
    /// Zero-filled atlas
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            texels: vec![ZERO_TEXEL; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn filter_mode(&self) -> FilterMode {
        FilterMode::Point
    }

    pub fn address_mode(&self) -> AddressMode {
        AddressMode::Clamp
    }

    pub fn texels(&self) -> &[Texel] {
        &self.texels
    }

    pub fn texel(&self, x: u32, y: u32) -> Option<Texel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.texels.get(self.offset(x, y)).copied()
    }

    /// Copy of the texels inside `rect`, row-major
    pub fn region(&self, rect: &Rect) -> Option<Vec<Texel>> {
        if !rect.fits_within(self.width, self.height) {
            return None;
        }
        let mut out = Vec::with_capacity(rect.area() as usize);
        for y in rect.y..rect.bottom() {
            let start = self.offset(rect.x, y);
            out.extend_from_slice(&self.texels[start..start + rect.width as usize]);
        }
        Some(out)
    }

    /// Copy a row-major block of texels into `rect`
    pub fn write_region(&mut self, rect: &Rect, texels: &[Texel]) -> Result<()> {
        if !rect.fits_within(self.width, self.height) {
            return Err(BakeError::InternalError(format!(
                "region {:?} lies outside a {}x{} atlas",
                rect, self.width, self.height
            )));
        }
        if texels.len() as u64 != rect.area() {
            return Err(BakeError::InternalError(format!(
                "{} texels supplied for a {}x{} region",
                texels.len(),
                rect.width,
                rect.height
            )));
        }

        let row_len = rect.width as usize;
        for (row, source) in texels.chunks_exact(row_len.max(1)).enumerate() {
            let start = self.offset(rect.x, rect.y + row as u32);
            self.texels[start..start + row_len].copy_from_slice(source);
        }
        Ok(())
    }

    /// Size of the serialized texel data
    pub fn byte_len(&self) -> usize {
        self.texels.len() * TEXEL_SIZE
    }

    /// Little-endian RGBA16F bytes, row-major from the first row
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.byte_len());
        for texel in &self.texels {
            for channel in texel {
                bytes.extend_from_slice(&channel.to_le_bytes());
            }
        }
        bytes
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texel(value: u16) -> Texel {
        [value, value + 1, value + 2, value + 3]
    }

    #[test]
    fn test_new_is_zeroed() {
        let atlas = Atlas::new(3, 2);
        assert_eq!(atlas.texels().len(), 6);
        assert_eq!(atlas.texel(2, 1), Some(ZERO_TEXEL));
        assert_eq!(atlas.texel(3, 0), None);
        assert_eq!(atlas.filter_mode(), FilterMode::Point);
        assert_eq!(atlas.address_mode(), AddressMode::Clamp);
    }

    #[test]
    fn test_write_and_read_region() {
        let mut atlas = Atlas::new(4, 4);
        let rect = Rect::new(1, 2, 2, 2);
        let block = vec![texel(0), texel(10), texel(20), texel(30)];
        atlas.write_region(&rect, &block).unwrap();

        assert_eq!(atlas.texel(1, 2), Some(texel(0)));
        assert_eq!(atlas.texel(2, 2), Some(texel(10)));
        assert_eq!(atlas.texel(1, 3), Some(texel(20)));
        assert_eq!(atlas.texel(0, 2), Some(ZERO_TEXEL));
        assert_eq!(atlas.region(&rect), Some(block));
    }

    #[test]
    fn test_write_outside_is_internal_error() {
        let mut atlas = Atlas::new(4, 4);
        let err = atlas
            .write_region(&Rect::new(3, 0, 2, 1), &[ZERO_TEXEL; 2])
            .unwrap_err();
        assert!(matches!(err, BakeError::InternalError(_)));

        let err = atlas
            .write_region(&Rect::new(0, 0, 2, 1), &[ZERO_TEXEL; 3])
            .unwrap_err();
        assert!(matches!(err, BakeError::InternalError(_)));
    }

    #[test]
    fn test_le_bytes() {
        let mut atlas = Atlas::new(1, 1);
        atlas
            .write_region(&Rect::new(0, 0, 1, 1), &[[0x3c00, 0x0102, 0, 0xffff]])
            .unwrap();
        assert_eq!(
            atlas.to_le_bytes(),
            vec![0x00, 0x3c, 0x02, 0x01, 0x00, 0x00, 0xff, 0xff]
        );
        assert_eq!(atlas.byte_len(), 8);
    }
}
