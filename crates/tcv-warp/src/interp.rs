use std::sync::OnceLock;

/// Sub-pixel precision of the coordinate phase: fractional positions are
/// quantized into `INTER_TAB_SIZE` bins per axis.
pub const INTER_BITS: u32 = 5;
pub const INTER_TAB_SIZE: usize = 1 << INTER_BITS;

/// Fixed-point width of the integer blending weights.
pub const INTER_REMAP_COEF_BITS: u32 = 15;
pub const INTER_REMAP_COEF_SCALE: i32 = 1 << INTER_REMAP_COEF_BITS;

/// Precomputed bilinear weight table indexed by quantized fractional
/// position. Built once, immutable, shared read-only by every warp task.
///
/// Weight order matches the tap order `(x, y)`, `(x+1, y)`, `(x, y+1)`,
/// `(x+1, y+1)`. Integer quadruples sum exactly to
/// [`INTER_REMAP_COEF_SCALE`]; the largest tap absorbs the rounding residual.
#[derive(Debug, Clone)]
pub struct InterpTable {
    tab_size: usize,
    float_weights: Vec<[f32; 4]>,
    int_weights: Vec<[i32; 4]>,
}

impl InterpTable {
    pub fn new(tab_size: usize) -> Self {
        assert!(
            tab_size.is_power_of_two() && tab_size <= 256,
            "tab size must be a power of two within the alpha index range"
        );

        let inv = 1.0 / tab_size as f32;
        let mut float_weights = Vec::with_capacity(tab_size * tab_size);
        let mut int_weights = Vec::with_capacity(tab_size * tab_size);

        for fy in 0..tab_size {
            let dy = fy as f32 * inv;
            for fx in 0..tab_size {
                let dx = fx as f32 * inv;
                let w = [
                    (1.0 - dx) * (1.0 - dy),
                    dx * (1.0 - dy),
                    (1.0 - dx) * dy,
                    dx * dy,
                ];

                let mut wi = [0i32; 4];
                let mut sum = 0i32;
                for (dst, &wv) in wi.iter_mut().zip(w.iter()) {
                    *dst = (wv * INTER_REMAP_COEF_SCALE as f32).round() as i32;
                    sum += *dst;
                }
                let mut imax = 0;
                for t in 1..4 {
                    if wi[t] > wi[imax] {
                        imax = t;
                    }
                }
                wi[imax] += INTER_REMAP_COEF_SCALE - sum;

                float_weights.push(w);
                int_weights.push(wi);
            }
        }

        Self {
            tab_size,
            float_weights,
            int_weights,
        }
    }

    /// The table at [`INTER_TAB_SIZE`], built on first use.
    pub fn shared() -> &'static InterpTable {
        static TABLE: OnceLock<InterpTable> = OnceLock::new();
        TABLE.get_or_init(|| InterpTable::new(INTER_TAB_SIZE))
    }

    pub fn tab_size(&self) -> usize {
        self.tab_size
    }

    #[inline]
    pub fn lookup_float(&self, alpha: u16) -> &[f32; 4] {
        &self.float_weights[alpha as usize]
    }

    #[inline]
    pub fn lookup_int(&self, alpha: u16) -> &[i32; 4] {
        &self.int_weights[alpha as usize]
    }
}
