use ndarray::Array2;

use crate::shared::constants::CLASSIFIER_INPUT_SIZE;
use crate::shared::frame::Frame;
use crate::shared::region::FaceRegion;

/// Convert one face region into the 48x48 normalized grayscale tensor the
/// classifier expects.
///
/// Steps: crop, Rec.601 luminance, bilinear resize, scale to [0,1]. Every
/// step allocates; the input frame is never touched. The caller is
/// responsible for the minimum-size policy — this function assumes the
/// region already passed it.
pub fn preprocess_face(frame: &Frame, region: &FaceRegion) -> Array2<f32> {
    let gray = crop_to_gray(frame, region);
    let resized = resize_bilinear(&gray, CLASSIFIER_INPUT_SIZE, CLASSIFIER_INPUT_SIZE);
    resized / 255.0
}

/// Crop `region` out of the frame and collapse RGB to luminance.
///
/// Output values stay in the [0,255] range as floats; scaling happens after
/// the resize so interpolation works on the full-precision luma.
fn crop_to_gray(frame: &Frame, region: &FaceRegion) -> Array2<f32> {
    let src = frame.as_ndarray();
    let h = region.height() as usize;
    let w = region.width() as usize;
    let top = region.top as usize;
    let left = region.left as usize;

    Array2::from_shape_fn((h, w), |(y, x)| {
        let r = src[[top + y, left + x, 0]] as f32;
        let g = src[[top + y, left + x, 1]] as f32;
        let b = src[[top + y, left + x, 2]] as f32;
        0.299 * r + 0.587 * g + 0.114 * b
    })
}

/// Bilinear resampling with half-pixel centers and edge clamping.
fn resize_bilinear(src: &Array2<f32>, out_h: usize, out_w: usize) -> Array2<f32> {
    let (src_h, src_w) = src.dim();
    let scale_y = src_h as f32 / out_h as f32;
    let scale_x = src_w as f32 / out_w as f32;

    Array2::from_shape_fn((out_h, out_w), |(y, x)| {
        let fy = ((y as f32 + 0.5) * scale_y - 0.5).max(0.0);
        let fx = ((x as f32 + 0.5) * scale_x - 0.5).max(0.0);

        let y0 = (fy as usize).min(src_h - 1);
        let x0 = (fx as usize).min(src_w - 1);
        let y1 = (y0 + 1).min(src_h - 1);
        let x1 = (x0 + 1).min(src_w - 1);
        let dy = fy - y0 as f32;
        let dx = fx - x0 as f32;

        let top = src[[y0, x0]] * (1.0 - dx) + src[[y0, x1]] * dx;
        let bottom = src[[y1, x0]] * (1.0 - dx) + src[[y1, x1]] * dx;
        top * (1.0 - dy) + bottom * dy
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn solid_frame(w: u32, h: u32, rgb: [u8; 3]) -> Frame {
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for _ in 0..w * h {
            data.extend_from_slice(&rgb);
        }
        Frame::new(data, w, h)
    }

    #[rstest]
    #[case::exact_size(48, 48)]
    #[case::larger(100, 80)]
    #[case::smaller_than_target(25, 30)]
    fn test_output_is_always_48x48_in_unit_range(#[case] w: u32, #[case] h: u32) {
        let frame = solid_frame(w + 10, h + 10, [200, 100, 50]);
        let region = FaceRegion::new(5, 5 + w, 5 + h, 5);
        let tensor = preprocess_face(&frame, &region);
        assert_eq!(tensor.dim(), (48, 48));
        for &v in tensor.iter() {
            assert!((0.0..=1.0).contains(&v), "value {v} outside [0,1]");
        }
    }

    #[test]
    fn test_uniform_input_gives_uniform_luminance() {
        let frame = solid_frame(60, 60, [100, 100, 100]);
        let region = FaceRegion::new(0, 60, 60, 0);
        let tensor = preprocess_face(&frame, &region);
        for &v in tensor.iter() {
            assert_relative_eq!(v, 100.0 / 255.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_luminance_weights_are_rec601() {
        let red = solid_frame(48, 48, [255, 0, 0]);
        let region = FaceRegion::new(0, 48, 48, 0);
        let tensor = preprocess_face(&red, &region);
        assert_relative_eq!(tensor[[0, 0]], 0.299, epsilon = 1e-5);

        let green = solid_frame(48, 48, [0, 255, 0]);
        let tensor = preprocess_face(&green, &region);
        assert_relative_eq!(tensor[[0, 0]], 0.587, epsilon = 1e-5);
    }

    #[test]
    fn test_deterministic_for_identical_input() {
        let mut data = Vec::new();
        for i in 0..(64 * 64 * 3) {
            data.push((i * 31 % 251) as u8);
        }
        let frame = Frame::new(data, 64, 64);
        let region = FaceRegion::new(4, 60, 60, 4);
        let a = preprocess_face(&frame, &region);
        let b = preprocess_face(&frame, &region);
        assert_eq!(a, b);
    }

    #[test]
    fn test_crop_respects_region_offsets() {
        // Frame split: left half black, right half white
        let w = 40u32;
        let h = 20u32;
        let mut data = Vec::new();
        for _y in 0..h {
            for x in 0..w {
                let v = if x < w / 2 { 0u8 } else { 255u8 };
                data.extend_from_slice(&[v, v, v]);
            }
        }
        let frame = Frame::new(data, w, h);

        let right_half = FaceRegion::new(0, 40, 20, 20);
        let tensor = preprocess_face(&frame, &right_half);
        assert_relative_eq!(tensor[[24, 24]], 1.0, epsilon = 1e-5);
    }
}
