use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::shared::error::DecodeError;
use crate::shared::frame::Frame;

/// Decode a base64 image payload into an RGB [`Frame`].
///
/// A `data:<mime>;base64,` style prefix is stripped first: everything up to
/// and including the first `,` is discarded, matching what browser capture
/// APIs emit. Payloads without a prefix decode unchanged.
pub fn decode_payload(payload: &str) -> Result<Frame, DecodeError> {
    let encoded = match payload.split_once(',') {
        Some((_, rest)) => rest,
        None => payload,
    };
    let bytes = STANDARD.decode(encoded.trim())?;
    decode_bytes(&bytes)
}

/// Decode raw encoded image bytes (PNG, JPEG, ...) into an RGB [`Frame`].
///
/// The output channel order is always RGB; formats with a different native
/// order are reordered by the `image` crate during conversion.
pub fn decode_bytes(bytes: &[u8]) -> Result<Frame, DecodeError> {
    let img = image::load_from_memory(bytes)?.to_rgb8();
    let (width, height) = img.dimensions();
    Ok(Frame::new(img.into_raw(), width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_plain_base64_decodes() {
        let payload = STANDARD.encode(png_bytes(8, 6, [10, 200, 30]));
        let frame = decode_payload(&payload).unwrap();
        assert_eq!(frame.width(), 8);
        assert_eq!(frame.height(), 6);
        assert_eq!(&frame.data()[..3], &[10, 200, 30]);
    }

    #[test]
    fn test_data_url_prefix_is_stripped() {
        let encoded = STANDARD.encode(png_bytes(4, 4, [1, 2, 3]));
        let payload = format!("data:image/png;base64,{encoded}");
        let frame = decode_payload(&payload).unwrap();
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 4);
    }

    #[test]
    fn test_invalid_base64_is_decode_error() {
        let err = decode_payload("not-base64!!!").unwrap_err();
        assert!(matches!(err, DecodeError::Base64(_)));
    }

    #[test]
    fn test_valid_base64_of_garbage_is_image_error() {
        let payload = STANDARD.encode(b"definitely not an image");
        let err = decode_payload(&payload).unwrap_err();
        assert!(matches!(err, DecodeError::Image(_)));
    }
}
