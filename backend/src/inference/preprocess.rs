use image::imageops::FilterType;
use ndarray::Array3;

#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    #[error("Unsupported image format")]
    UnsupportedFormat,
    #[error("Failed to decode image: {0}")]
    Decode(String),
}

/// Decodes an upload into an RGB tensor of shape `[height, width, 3]` with
/// values scaled to `[0, 1]`.
pub fn preprocess(image_data: &[u8], (height, width): (u32, u32)) -> Result<Array3<f32>, PreprocessError> {
    image::guess_format(image_data).map_err(|_| PreprocessError::UnsupportedFormat)?;
    let decoded = image::load_from_memory(image_data)
        .map_err(|e| PreprocessError::Decode(e.to_string()))?;
    let rgb = decoded
        .resize_exact(width, height, FilterType::Triangle)
        .to_rgb8();

    Ok(Array3::from_shape_fn(
        (height as usize, width as usize, 3),
        |(y, x, c)| rgb.get_pixel(x as u32, y as u32)[c] as f32 / 255.0,
    ))
}

/// Nested `[row][col][channel]` form expected by the model server's JSON API.
pub fn to_instance(tensor: &Array3<f32>) -> Vec<Vec<[f32; 3]>> {
    tensor
        .outer_iter()
        .map(|row| {
            row.outer_iter()
                .map(|px| [px[0], px[1], px[2]])
                .collect()
        })
        .collect()
}

#[cfg(test)]
pub(crate) fn encode_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}
