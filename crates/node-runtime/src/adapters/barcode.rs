//! # Barcode Codec Adapter
//!
//! [`TokenCodec`] backed by `rxing` for detection and rendering and `image`
//! for pixel I/O.
//!
//! ## Leading Zero Convention
//!
//! A UPC-A symbol read by an EAN-13 capable reader comes back with an extra
//! leading `0`. Results in the UPC/EAN family lose exactly one leading zero;
//! every other format is returned verbatim. Rendering uses Code 128, which
//! carries the token unchanged, so render-then-decode is lossless.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use rxing::{BarcodeFormat, MultiFormatWriter, Writer};

use relay_engine::{CodecError, TokenCodec};

/// Rendered image width in pixels.
pub const RENDER_WIDTH: u32 = 400;

/// Rendered image height in pixels.
pub const RENDER_HEIGHT: u32 = 120;

/// rxing-based barcode codec.
#[derive(Debug, Clone)]
pub struct BarcodeCodec {
    width: u32,
    height: u32,
}

impl BarcodeCodec {
    pub fn new() -> Self {
        Self::with_size(RENDER_WIDTH, RENDER_HEIGHT)
    }

    /// Codec rendering images of the given size.
    pub fn with_size(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for BarcodeCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCodec for BarcodeCodec {
    fn decode(&self, image: &[u8]) -> Result<String, CodecError> {
        let luma = image::load_from_memory(image)
            .map_err(|e| CodecError::Decode(e.to_string()))?
            .to_luma8();
        let (width, height) = luma.dimensions();

        let result = rxing::helpers::detect_in_luma(luma.into_raw(), width, height, None)
            .map_err(|e| CodecError::Decode(e.to_string()))?;

        let upc_family = matches!(
            result.getBarcodeFormat(),
            BarcodeFormat::EAN_13 | BarcodeFormat::UPC_A
        );
        Ok(strip_upc_padding(result.getText(), upc_family))
    }

    fn encode(&self, token: &str) -> Result<Vec<u8>, CodecError> {
        let matrix = MultiFormatWriter::default()
            .encode(
                token,
                &BarcodeFormat::CODE_128,
                self.width as i32,
                self.height as i32,
            )
            .map_err(|e| CodecError::Encode(e.to_string()))?;

        let pixels = GrayImage::from_fn(matrix.getWidth(), matrix.getHeight(), |x, y| {
            if matrix.get(x, y) {
                Luma([0u8])
            } else {
                Luma([255u8])
            }
        });

        let mut jpeg = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(pixels)
            .write_to(&mut jpeg, ImageFormat::Jpeg)
            .map_err(|e| CodecError::Encode(e.to_string()))?;
        Ok(jpeg.into_inner())
    }
}

fn strip_upc_padding(text: &str, upc_family: bool) -> String {
    if upc_family {
        text.strip_prefix('0').unwrap_or(text).to_string()
    } else {
        text.to_string()
    }
}
