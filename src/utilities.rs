//! Internal helpers shared by the FFmpeg-facing modules.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy plane 0 of a packed video frame into a tightly-packed buffer.
///
/// FFmpeg rows often carry padding (stride > width × bytes per pixel); the
/// result has none, so it can go straight into `ImageBuffer::from_raw`.
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_bytes = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == row_bytes {
        data[..row_bytes * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_bytes * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
        }
        buffer
    }
}

/// Convert an FFmpeg rational to `f64`, or `None` when the denominator or
/// numerator is zero.
pub(crate) fn rational_to_f64(value: Rational) -> Option<f64> {
    if value.denominator() == 0 || value.numerator() == 0 {
        None
    } else {
        Some(value.numerator() as f64 / value.denominator() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rational_conversion() {
        assert_eq!(rational_to_f64(Rational::new(30000, 1001)).map(|v| v.trunc()), Some(29.0));
        assert_eq!(rational_to_f64(Rational::new(25, 1)), Some(25.0));
        assert_eq!(rational_to_f64(Rational::new(0, 1)), None);
        assert_eq!(rational_to_f64(Rational::new(1, 0)), None);
    }
}
