use tcv_core::Error;

/// Fixed coefficient tables for the small kernel sizes, matching the values
/// widely used across vision libraries so low-precision outputs stay
/// bit-compatible. Sizes outside the table are always computed.
const SMALL_GAUSSIAN_TAB: [&[f32]; 4] = [
    &[1.0],
    &[0.25, 0.5, 0.25],
    &[0.0625, 0.25, 0.375, 0.25, 0.0625],
    &[
        0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125,
    ],
];

/// Standard sigma heuristic for a non-positive requested sigma.
pub fn default_sigma(size: usize) -> f64 {
    0.3 * ((size - 1) as f64 * 0.5 - 1.0) + 0.8
}

/// Builds a normalized 1D Gaussian coefficient vector of odd length `size`.
///
/// `sigma <= 0` selects [`default_sigma`] and, for sizes 1/3/5/7, the fixed
/// small-kernel tables.
pub fn gaussian_kernel(size: usize, sigma: f64) -> Result<Vec<f32>, Error> {
    if size == 0 || size % 2 == 0 {
        return Err(Error::KernelSizeNotOdd { size });
    }

    if sigma <= 0.0 && size <= 7 {
        return Ok(SMALL_GAUSSIAN_TAB[size / 2].to_vec());
    }

    let sigma = if sigma > 0.0 {
        sigma
    } else {
        default_sigma(size)
    };

    let center = (size / 2) as f64;
    let scale = -0.5 / (sigma * sigma);
    let mut weights = Vec::with_capacity(size);
    let mut sum = 0.0f64;
    for k in 0..size {
        let x = k as f64 - center;
        let w = (x * x * scale).exp();
        weights.push(w);
        sum += w;
    }

    Ok(weights.iter().map(|&w| (w / sum) as f32).collect())
}

/// Builds the `(row, col)` kernel pair for a `kh x kw` blur. The row kernel
/// (length `kw`) is applied horizontally with `sigma_x`, the column kernel
/// (length `kh`) vertically with `sigma_y`; a non-positive `sigma_y` inherits
/// `sigma_x`.
pub fn gaussian_kernel_pair(
    kh: usize,
    kw: usize,
    sigma_y: f64,
    sigma_x: f64,
) -> Result<(Vec<f32>, Vec<f32>), Error> {
    let row = gaussian_kernel(kw, sigma_x)?;
    let sigma_y = if sigma_y > 0.0 { sigma_y } else { sigma_x };
    let col = if kh == kw && sigma_y == sigma_x {
        row.clone()
    } else {
        gaussian_kernel(kh, sigma_y)?
    };
    Ok((row, col))
}
