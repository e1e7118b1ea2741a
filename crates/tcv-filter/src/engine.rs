use tcv_core::{map_index, saturate_u8, BorderMode, Error, ImageView, ImageViewMut, PixelCast};

/// Quantization width of the 8-bit fixed-point pipeline. Row and column
/// kernels are each scaled by `2^FIXED_POINT_BITS`; the combined store shift
/// is twice that.
pub const FIXED_POINT_BITS: u32 = 8;

/// Scales filter taps into fixed-point integers with round-to-nearest.
pub fn quantize_kernel(kernel: &[f32], bits: u32) -> Vec<i32> {
    let scale = (1i64 << bits) as f64;
    kernel
        .iter()
        .map(|&k| (k as f64 * scale).round() as i32)
        .collect()
}

/// Border-aware two-pass separable filter.
///
/// The row kernel is applied horizontally over a pre-expanded bordered row,
/// then the column kernel vertically over a sliding window of intermediate
/// rows. Taps are applied without flipping (correlation). Intermediate
/// precision is `f32` for the float path and `i32` for the 8-bit fixed-point
/// path; both paths share the same pass structure and border handling.
#[derive(Debug, Clone)]
pub struct SeparableFilter {
    row_kernel: Vec<f32>,
    col_kernel: Vec<f32>,
    border: BorderMode,
    border_value: f32,
}

impl SeparableFilter {
    pub fn new(
        row_kernel: &[f32],
        col_kernel: &[f32],
        border: BorderMode,
        border_value: f32,
    ) -> Result<Self, Error> {
        if row_kernel.is_empty() || row_kernel.len() % 2 == 0 {
            return Err(Error::KernelSizeNotOdd {
                size: row_kernel.len(),
            });
        }
        if col_kernel.is_empty() || col_kernel.len() % 2 == 0 {
            return Err(Error::KernelSizeNotOdd {
                size: col_kernel.len(),
            });
        }
        if matches!(border, BorderMode::Isolated | BorderMode::Transparent) {
            return Err(Error::UnsupportedBorderMode { mode: border });
        }

        Ok(Self {
            row_kernel: row_kernel.to_vec(),
            col_kernel: col_kernel.to_vec(),
            border,
            border_value,
        })
    }

    pub fn apply_f32(
        &self,
        src: &ImageView<'_, f32>,
        dst: &mut ImageViewMut<'_, f32>,
    ) -> Result<(), Error> {
        check_same_shape(src, dst)?;
        let pipe = FloatPipeline {
            row: &self.row_kernel,
            col: &self.col_kernel,
            channels: src.channels(),
            fill: self.border_value,
        };
        run(&pipe, src, dst, self.border);
        Ok(())
    }

    pub fn apply_u8(
        &self,
        src: &ImageView<'_, u8>,
        dst: &mut ImageViewMut<'_, u8>,
    ) -> Result<(), Error> {
        check_same_shape(src, dst)?;
        let pipe = FixedPipeline {
            row: quantize_kernel(&self.row_kernel, FIXED_POINT_BITS),
            col: quantize_kernel(&self.col_kernel, FIXED_POINT_BITS),
            channels: src.channels(),
            fill: u8::from_f32(self.border_value),
        };
        run(&pipe, src, dst, self.border);
        Ok(())
    }
}

fn check_same_shape<S, D>(src: &ImageView<'_, S>, dst: &ImageViewMut<'_, D>) -> Result<(), Error> {
    if src.width() != dst.width()
        || src.height() != dst.height()
        || src.channels() != dst.channels()
    {
        return Err(Error::SizeMismatch {
            expected: src.width() * src.height() * src.channels(),
            actual: dst.width() * dst.height() * dst.channels(),
        });
    }
    Ok(())
}

/// One numeric pipeline of the engine: the row pass widens source elements
/// into the intermediate type, the column pass narrows back with the final
/// rounding/saturation.
trait Pipeline {
    type Src: Copy;
    type Mid: Copy + Default;

    fn channels(&self) -> usize;
    fn ksize(&self) -> (usize, usize);
    fn fill(&self) -> Self::Src;
    fn row_filter(&self, bordered: &[Self::Src], out: &mut [Self::Mid]);
    fn col_filter(&self, window: &[&[Self::Mid]], out: &mut [Self::Src]);
}

struct FloatPipeline<'k> {
    row: &'k [f32],
    col: &'k [f32],
    channels: usize,
    fill: f32,
}

impl Pipeline for FloatPipeline<'_> {
    type Src = f32;
    type Mid = f32;

    fn channels(&self) -> usize {
        self.channels
    }

    fn ksize(&self) -> (usize, usize) {
        (self.col.len(), self.row.len())
    }

    fn fill(&self) -> f32 {
        self.fill
    }

    fn row_filter(&self, bordered: &[f32], out: &mut [f32]) {
        let ch = self.channels;
        for (i, o) in out.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (k, &kv) in self.row.iter().enumerate() {
                acc += bordered[i + k * ch] * kv;
            }
            *o = acc;
        }
    }

    fn col_filter(&self, window: &[&[f32]], out: &mut [f32]) {
        for (i, o) in out.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (k, &kv) in self.col.iter().enumerate() {
                acc += window[k][i] * kv;
            }
            *o = acc;
        }
    }
}

struct FixedPipeline {
    row: Vec<i32>,
    col: Vec<i32>,
    channels: usize,
    fill: u8,
}

impl Pipeline for FixedPipeline {
    type Src = u8;
    type Mid = i32;

    fn channels(&self) -> usize {
        self.channels
    }

    fn ksize(&self) -> (usize, usize) {
        (self.col.len(), self.row.len())
    }

    fn fill(&self) -> u8 {
        self.fill
    }

    fn row_filter(&self, bordered: &[u8], out: &mut [i32]) {
        let ch = self.channels;
        for (i, o) in out.iter_mut().enumerate() {
            let mut acc = 0i32;
            for (k, &kv) in self.row.iter().enumerate() {
                acc += bordered[i + k * ch] as i32 * kv;
            }
            *o = acc;
        }
    }

    fn col_filter(&self, window: &[&[i32]], out: &mut [u8]) {
        const SHIFT: u32 = 2 * FIXED_POINT_BITS;
        const ROUND: i32 = 1 << (SHIFT - 1);
        for (i, o) in out.iter_mut().enumerate() {
            let mut acc = 0i32;
            for (k, &kv) in self.col.iter().enumerate() {
                acc += window[k][i] * kv;
            }
            *o = saturate_u8((acc + ROUND) >> SHIFT);
        }
    }
}

fn run<P: Pipeline>(
    pipe: &P,
    src: &ImageView<'_, P::Src>,
    dst: &mut ImageViewMut<'_, P::Src>,
    border: BorderMode,
) {
    let width = src.width();
    let height = src.height();
    let ch = pipe.channels();
    if width == 0 || height == 0 || ch == 0 {
        return;
    }

    let (kh, kw) = pipe.ksize();
    let ax = (kw - 1) / 2;
    let ay = (kh - 1) as isize / 2;

    // Border column maps, resolved once per call rather than per tap.
    let left: Vec<Option<usize>> = (0..ax)
        .map(|j| map_index(j as isize - ax as isize, width, border))
        .collect();
    let right: Vec<Option<usize>> = (0..ax)
        .map(|j| map_index((width + j) as isize, width, border))
        .collect();

    let row_len = width * ch;
    let mut bordered = vec![pipe.fill(); row_len + (kw - 1) * ch];
    let mut ring: Vec<Vec<P::Mid>> = (0..kh).map(|_| vec![P::Mid::default(); row_len]).collect();

    // Under a constant border every out-of-range source row filters to the
    // same intermediate row; compute it once.
    let const_mid: Option<Vec<P::Mid>> = if border == BorderMode::Constant {
        let const_bordered = vec![pipe.fill(); row_len + (kw - 1) * ch];
        let mut out = vec![P::Mid::default(); row_len];
        pipe.row_filter(&const_bordered, &mut out);
        Some(out)
    } else {
        None
    };

    let khi = kh as isize;
    let produce = |r: isize, ring: &mut Vec<Vec<P::Mid>>, bordered: &mut Vec<P::Src>| {
        let slot = r.rem_euclid(khi) as usize;
        match map_index(r, height, border) {
            Some(sy) => {
                fill_bordered(src.row(sy), bordered, &left, &right, ch, pipe.fill());
                pipe.row_filter(bordered, &mut ring[slot]);
            }
            None => {
                let cm = const_mid.as_ref().expect("constant border mid row");
                ring[slot].copy_from_slice(cm);
            }
        }
    };

    // Prime the window above the first output row, then slide one source row
    // per output row.
    for r in -ay..ay {
        produce(r, &mut ring, &mut bordered);
    }

    for yd in 0..height {
        produce(yd as isize + ay, &mut ring, &mut bordered);
        let base = yd as isize - ay;
        let window: Vec<&[P::Mid]> = (0..khi)
            .map(|k| ring[(base + k).rem_euclid(khi) as usize].as_slice())
            .collect();
        pipe.col_filter(&window, dst.row_mut(yd));
    }
}

fn fill_bordered<S: Copy>(
    src_row: &[S],
    out: &mut [S],
    left: &[Option<usize>],
    right: &[Option<usize>],
    ch: usize,
    fill: S,
) {
    let ax = left.len();
    for (j, li) in left.iter().enumerate() {
        let dst_px = &mut out[j * ch..(j + 1) * ch];
        match li {
            Some(sx) => dst_px.copy_from_slice(&src_row[sx * ch..(sx + 1) * ch]),
            None => dst_px.fill(fill),
        }
    }

    out[ax * ch..ax * ch + src_row.len()].copy_from_slice(src_row);

    let base = ax * ch + src_row.len();
    for (j, ri) in right.iter().enumerate() {
        let dst_px = &mut out[base + j * ch..base + (j + 1) * ch];
        match ri {
            Some(sx) => dst_px.copy_from_slice(&src_row[sx * ch..(sx + 1) * ch]),
            None => dst_px.fill(fill),
        }
    }
}
