//! TIFF horizontal differencing predictor (Predictor = 2)

use crate::io::byte_order::ByteOrderHandler;

/// Reverses horizontal differencing in place on a decoded block
///
/// Each sample (other than the first of a row) was stored as the
/// difference to the sample `samples_per_pixel` positions before it.
/// Integer arithmetic wraps at the sample width, so the raw bits are
/// accumulated and masked rather than interpreted as signed values.
///
/// # Arguments
/// * `data` - Decompressed block bytes, modified in place
/// * `block_width` - Block width in pixels
/// * `samples_per_pixel` - Interleaved samples per pixel
/// * `bytes_per_sample` - Sample width (1, 2, 4 or 8)
/// * `handler` - Byte order of the file
pub fn undo_horizontal_differencing(
    data: &mut [u8],
    block_width: usize,
    samples_per_pixel: usize,
    bytes_per_sample: usize,
    handler: &dyn ByteOrderHandler,
) {
    let row_samples = block_width * samples_per_pixel;
    let row_bytes = row_samples * bytes_per_sample;
    if row_bytes == 0 {
        return;
    }
    let mask = if bytes_per_sample >= 8 { u64::MAX } else { (1u64 << (bytes_per_sample * 8)) - 1 };

    for row in data.chunks_mut(row_bytes) {
        let samples_in_row = row.len() / bytes_per_sample;
        for i in samples_per_pixel..samples_in_row {
            let prev_start = (i - samples_per_pixel) * bytes_per_sample;
            let start = i * bytes_per_sample;
            let prev = handler.sample_bits(&row[prev_start..prev_start + bytes_per_sample], bytes_per_sample);
            let diff = handler.sample_bits(&row[start..start + bytes_per_sample], bytes_per_sample);
            let value = prev.wrapping_add(diff) & mask;
            handler.write_sample_bits(&mut row[start..start + bytes_per_sample], value);
        }
    }
}
