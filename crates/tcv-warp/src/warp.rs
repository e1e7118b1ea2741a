use tcv_core::{
    map_index, saturate_u8, BorderMode, DType, Dispatcher, DisjointWriter, Error, ImageView, Mat3,
    PixelCast, TensorRef, TensorRefMut, TensorView, TensorViewMut,
};

use crate::interp::{InterpTable, INTER_REMAP_COEF_BITS};
use crate::tile::{TileGrid, TileRect, BLOCK_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpMode {
    Nearest,
    Linear,
}

/// Recognized options of the warp operator. `block_size` bounds per-task
/// coordinate scratch and exists mainly so callers can verify tiling
/// invariance; output must not depend on it.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpConfig {
    pub interp: InterpMode,
    pub border: BorderMode,
    pub border_value: f32,
    pub block_size: usize,
}

impl Default for WarpConfig {
    fn default() -> Self {
        Self {
            interp: InterpMode::Linear,
            border: BorderMode::Constant,
            border_value: 0.0,
            block_size: BLOCK_SIZE,
        }
    }
}

/// Element pipeline of the resampler: construction of the border fill value
/// and the four-tap blend against the shared interpolation table.
pub trait WarpPixel: Copy + Send + Sync {
    fn from_border(value: f32) -> Self;
    fn blend(table: &InterpTable, alpha: u16, taps: [Self; 4]) -> Self;
}

impl WarpPixel for u8 {
    #[inline]
    fn from_border(value: f32) -> u8 {
        u8::from_f32(value)
    }

    #[inline]
    fn blend(table: &InterpTable, alpha: u16, taps: [u8; 4]) -> u8 {
        let w = table.lookup_int(alpha);
        let acc = w[0] * taps[0] as i32
            + w[1] * taps[1] as i32
            + w[2] * taps[2] as i32
            + w[3] * taps[3] as i32;
        saturate_u8((acc + (1 << (INTER_REMAP_COEF_BITS - 1))) >> INTER_REMAP_COEF_BITS)
    }
}

impl WarpPixel for f32 {
    #[inline]
    fn from_border(value: f32) -> f32 {
        value
    }

    #[inline]
    fn blend(table: &InterpTable, alpha: u16, taps: [f32; 4]) -> f32 {
        let w = table.lookup_float(alpha);
        w[0] * taps[0] + w[1] * taps[1] + w[2] * taps[2] + w[3] * taps[3]
    }
}

/// Warps every image of `src` into `dst` under its own destination-to-source
/// transform, one dispatch task per destination tile.
///
/// Each destination pixel is inverse-mapped through the projective matrix
/// with the homogeneous divide (`W == 0` collapses the coordinate to zero
/// rather than producing non-finite values) and sampled per `cfg.interp`.
pub fn warp_perspective(
    src: &TensorRef<'_>,
    trans: &[Mat3],
    dst: &mut TensorRefMut<'_>,
    cfg: &WarpConfig,
    dispatcher: &dyn Dispatcher,
) -> Result<(), Error> {
    if src.dtype() != dst.dtype() {
        return Err(Error::DtypeMismatch {
            src: src.dtype(),
            dst: dst.dtype(),
        });
    }

    let (sb, _, _, sc) = src.dims();
    let (db, _, _, dc) = dst.dims();
    if sb != db {
        return Err(Error::SizeMismatch {
            expected: sb,
            actual: db,
        });
    }
    if sc != dc {
        return Err(Error::SizeMismatch {
            expected: sc,
            actual: dc,
        });
    }
    if !(1..=3).contains(&sc) {
        return Err(Error::UnsupportedChannelCount { channels: sc });
    }
    if trans.len() != sb {
        return Err(Error::SizeMismatch {
            expected: sb,
            actual: trans.len(),
        });
    }
    if matches!(cfg.border, BorderMode::Isolated) {
        return Err(Error::UnsupportedBorderMode { mode: cfg.border });
    }

    let (src_dtype, dst_dtype) = (src.dtype(), dst.dtype());
    match (src, dst) {
        (TensorRef::U8(s), TensorRefMut::U8(d)) => warp_typed(s, trans, d, cfg, dispatcher),
        (TensorRef::F32(s), TensorRefMut::F32(d)) => warp_typed(s, trans, d, cfg, dispatcher),
        (TensorRef::U16(_), _) => Err(Error::UnsupportedDtype { dtype: DType::U16 }),
        _ => Err(Error::DtypeMismatch {
            src: src_dtype,
            dst: dst_dtype,
        }),
    }
}

fn warp_typed<T: WarpPixel>(
    src: &TensorView<'_, T>,
    trans: &[Mat3],
    dst: &mut TensorViewMut<'_, T>,
    cfg: &WarpConfig,
    dispatcher: &dyn Dispatcher,
) -> Result<(), Error> {
    let (batch, height, width, channels) = dst.dims();
    let grid = TileGrid::new(height, width, cfg.block_size);
    let tiles = grid.task_count();
    if batch == 0 || tiles == 0 {
        return Ok(());
    }

    let img_len = height * width * channels;
    let table = InterpTable::shared();
    let writer = DisjointWriter::new(dst.data_mut());

    match channels {
        1 => warp_tiles::<T, 1>(src, trans, &writer, img_len, width, grid, cfg, table, dispatcher),
        2 => warp_tiles::<T, 2>(src, trans, &writer, img_len, width, grid, cfg, table, dispatcher),
        3 => warp_tiles::<T, 3>(src, trans, &writer, img_len, width, grid, cfg, table, dispatcher),
        n => return Err(Error::UnsupportedChannelCount { channels: n }),
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn warp_tiles<T: WarpPixel, const CH: usize>(
    src: &TensorView<'_, T>,
    trans: &[Mat3],
    writer: &DisjointWriter<'_, T>,
    img_len: usize,
    dst_width: usize,
    grid: TileGrid,
    cfg: &WarpConfig,
    table: &InterpTable,
    dispatcher: &dyn Dispatcher,
) {
    let tiles = grid.task_count();
    dispatcher.dispatch(src.batch() * tiles, &|index, _thread_id| {
        let b = index / tiles;
        let tile = grid.tile(index % tiles);
        let src_img = src.image(b);
        warp_tile::<T, CH>(
            &src_img,
            &trans[b],
            writer,
            b * img_len,
            dst_width,
            tile,
            cfg,
            table,
        );
    });
}

#[allow(clippy::too_many_arguments)]
fn warp_tile<T: WarpPixel, const CH: usize>(
    src: &ImageView<'_, T>,
    m: &Mat3,
    writer: &DisjointWriter<'_, T>,
    img_base: usize,
    dst_width: usize,
    tile: TileRect,
    cfg: &WarpConfig,
    table: &InterpTable,
) {
    let (bw, bh) = (tile.width, tile.height);
    let m = &m.m;

    // Coordinate phase: integer source coordinates, plus the quantized
    // fractional bin index for the linear path.
    let mut xy = vec![(0i32, 0i32); bw * bh];
    let mut alpha = Vec::new();
    let tab_size = table.tab_size();
    let tab_bits = tab_size.trailing_zeros();
    let tab_mask = (tab_size - 1) as i32;

    if cfg.interp == InterpMode::Linear {
        alpha.resize(bw * bh, 0u16);
    }

    for y1 in 0..bh {
        let yd = (tile.y + y1) as f64;
        let xd = tile.x as f64;
        let x0 = m[0] * xd + m[1] * yd + m[2];
        let y0 = m[3] * xd + m[4] * yd + m[5];
        let w0 = m[6] * xd + m[7] * yd + m[8];

        match cfg.interp {
            InterpMode::Nearest => {
                for x1 in 0..bw {
                    let w = w0 + m[6] * x1 as f64;
                    let w = if w != 0.0 { 1.0 / w } else { 0.0 };
                    let fx = (x0 + m[0] * x1 as f64) * w;
                    let fy = (y0 + m[3] * x1 as f64) * w;
                    xy[y1 * bw + x1] = (fx.round() as i32, fy.round() as i32);
                }
            }
            InterpMode::Linear => {
                for x1 in 0..bw {
                    let w = w0 + m[6] * x1 as f64;
                    let w = if w != 0.0 { tab_size as f64 / w } else { 0.0 };
                    let xi = ((x0 + m[0] * x1 as f64) * w).round() as i32;
                    let yi = ((y0 + m[3] * x1 as f64) * w).round() as i32;
                    xy[y1 * bw + x1] = (xi >> tab_bits, yi >> tab_bits);
                    alpha[y1 * bw + x1] =
                        ((yi & tab_mask) * tab_size as i32 + (xi & tab_mask)) as u16;
                }
            }
        }
    }

    match cfg.interp {
        InterpMode::Nearest => {
            remap_nearest::<T, CH>(src, writer, img_base, dst_width, tile, &xy, cfg)
        }
        InterpMode::Linear => remap_linear::<T, CH>(
            src, writer, img_base, dst_width, tile, &xy, &alpha, cfg, table,
        ),
    }
}

fn remap_nearest<T: WarpPixel, const CH: usize>(
    src: &ImageView<'_, T>,
    writer: &DisjointWriter<'_, T>,
    img_base: usize,
    dst_width: usize,
    tile: TileRect,
    xy: &[(i32, i32)],
    cfg: &WarpConfig,
) {
    let sw = src.width();
    let sh = src.height();
    let bval = T::from_border(cfg.border_value);

    for y1 in 0..tile.height {
        let row_off = img_base + ((tile.y + y1) * dst_width + tile.x) * CH;
        // SAFETY: tiles are disjoint destination rectangles; no other task
        // touches this row span.
        let out = unsafe { writer.slice_mut(row_off, tile.width * CH) };
        for x1 in 0..tile.width {
            let (sx, sy) = xy[y1 * tile.width + x1];
            let dst_px = &mut out[x1 * CH..(x1 + 1) * CH];

            if sx >= 0 && sy >= 0 && (sx as usize) < sw && (sy as usize) < sh {
                let (ux, uy) = (sx as usize, sy as usize);
                for (c, d) in dst_px.iter_mut().enumerate() {
                    // SAFETY: bounds established above; c < CH == channels.
                    *d = unsafe { *src.get_unchecked(ux, uy, c) };
                }
                continue;
            }

            match cfg.border {
                BorderMode::Transparent => {}
                BorderMode::Constant => dst_px.fill(bval),
                mode => {
                    match (map_index(sx as isize, sw, mode), map_index(sy as isize, sh, mode)) {
                        (Some(ux), Some(uy)) => {
                            for (c, d) in dst_px.iter_mut().enumerate() {
                                // SAFETY: map_index returns in-range indices.
                                *d = unsafe { *src.get_unchecked(ux, uy, c) };
                            }
                        }
                        // Empty source extent: fall back to the fill value.
                        _ => dst_px.fill(bval),
                    }
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn remap_linear<T: WarpPixel, const CH: usize>(
    src: &ImageView<'_, T>,
    writer: &DisjointWriter<'_, T>,
    img_base: usize,
    dst_width: usize,
    tile: TileRect,
    xy: &[(i32, i32)],
    alpha: &[u16],
    cfg: &WarpConfig,
    table: &InterpTable,
) {
    let sw = src.width() as i32;
    let sh = src.height() as i32;
    let bval = T::from_border(cfg.border_value);

    for y1 in 0..tile.height {
        let row_off = img_base + ((tile.y + y1) * dst_width + tile.x) * CH;
        // SAFETY: tiles are disjoint destination rectangles; no other task
        // touches this row span.
        let out = unsafe { writer.slice_mut(row_off, tile.width * CH) };
        for x1 in 0..tile.width {
            let i = y1 * tile.width + x1;
            let (sx, sy) = xy[i];
            let a = alpha[i];
            let dst_px = &mut out[x1 * CH..(x1 + 1) * CH];

            if sx >= 0 && sy >= 0 && sx + 1 < sw && sy + 1 < sh {
                let (ux, uy) = (sx as usize, sy as usize);
                for (c, d) in dst_px.iter_mut().enumerate() {
                    // SAFETY: the full 2x2 footprint is in bounds; c < CH.
                    let taps = unsafe {
                        [
                            *src.get_unchecked(ux, uy, c),
                            *src.get_unchecked(ux + 1, uy, c),
                            *src.get_unchecked(ux, uy + 1, c),
                            *src.get_unchecked(ux + 1, uy + 1, c),
                        ]
                    };
                    *d = T::blend(table, a, taps);
                }
                continue;
            }

            match cfg.border {
                BorderMode::Transparent => {}
                BorderMode::Constant => {
                    for (c, d) in dst_px.iter_mut().enumerate() {
                        let taps = [
                            tap_or(src, sx, sy, c, bval),
                            tap_or(src, sx + 1, sy, c, bval),
                            tap_or(src, sx, sy + 1, c, bval),
                            tap_or(src, sx + 1, sy + 1, c, bval),
                        ];
                        *d = T::blend(table, a, taps);
                    }
                }
                mode => {
                    let x0 = map_index(sx as isize, src.width(), mode);
                    let x1m = map_index(sx as isize + 1, src.width(), mode);
                    let y0 = map_index(sy as isize, src.height(), mode);
                    let y1m = map_index(sy as isize + 1, src.height(), mode);
                    match (x0, x1m, y0, y1m) {
                        (Some(x0), Some(x1m), Some(y0), Some(y1m)) => {
                            for (c, d) in dst_px.iter_mut().enumerate() {
                                // SAFETY: map_index returns in-range indices.
                                let taps = unsafe {
                                    [
                                        *src.get_unchecked(x0, y0, c),
                                        *src.get_unchecked(x1m, y0, c),
                                        *src.get_unchecked(x0, y1m, c),
                                        *src.get_unchecked(x1m, y1m, c),
                                    ]
                                };
                                *d = T::blend(table, a, taps);
                            }
                        }
                        // Empty source extent: fall back to the fill value.
                        _ => dst_px.fill(bval),
                    }
                }
            }
        }
    }
}

#[inline]
fn tap_or<T: WarpPixel>(src: &ImageView<'_, T>, x: i32, y: i32, c: usize, fallback: T) -> T {
    if x >= 0 && y >= 0 && (x as usize) < src.width() && (y as usize) < src.height() {
        // SAFETY: bounds checked above.
        unsafe { *src.get_unchecked(x as usize, y as usize, c) }
    } else {
        fallback
    }
}
