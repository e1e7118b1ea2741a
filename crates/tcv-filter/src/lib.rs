//! Border-aware separable filtering for tensorcv.
//!
//! The engine applies a horizontal then a vertical 1D kernel over an image,
//! synthesizing out-of-range samples per the border policy. Low-precision
//! inputs run an integer fixed-point pipeline that tracks the float pipeline
//! within quantization error; both sit behind one pass structure.
//!
//! [`gaussian_blur`] is the operator surface: it validates tensor layouts,
//! synthesizes the kernel pair, and fans one task per batch image out to the
//! dispatch seam.

mod engine;
mod gaussian;

pub use engine::{quantize_kernel, SeparableFilter, FIXED_POINT_BITS};
pub use gaussian::{default_sigma, gaussian_kernel, gaussian_kernel_pair};

use tcv_core::{
    BorderMode, DType, Dispatcher, DisjointWriter, Error, ImageView, ImageViewMut, TensorRef,
    TensorRefMut, TensorView, TensorViewMut,
};

/// Recognized options of the Gaussian blur operator. Non-positive sigmas
/// select the per-size default; `border_value` only matters for
/// [`BorderMode::Constant`].
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianBlurConfig {
    pub kernel_height: usize,
    pub kernel_width: usize,
    pub sigma_x: f64,
    pub sigma_y: f64,
    pub border_mode: BorderMode,
    pub border_value: f32,
}

impl Default for GaussianBlurConfig {
    fn default() -> Self {
        Self {
            kernel_height: 3,
            kernel_width: 3,
            sigma_x: 0.0,
            sigma_y: 0.0,
            border_mode: BorderMode::Reflect101,
            border_value: 0.0,
        }
    }
}

/// Blurs every image of `src` into `dst`, one dispatch task per batch image.
///
/// Supported dtypes are `f32` and `u8` (the latter through the fixed-point
/// pipeline); everything else fails with `UnsupportedDtype` before any work.
pub fn gaussian_blur(
    src: &TensorRef<'_>,
    dst: &mut TensorRefMut<'_>,
    cfg: &GaussianBlurConfig,
    dispatcher: &dyn Dispatcher,
) -> Result<(), Error> {
    if src.dtype() != dst.dtype() {
        return Err(Error::DtypeMismatch {
            src: src.dtype(),
            dst: dst.dtype(),
        });
    }
    if src.dims() != dst.dims() {
        let (b, h, w, c) = src.dims();
        let (db, dh, dw, dc) = dst.dims();
        return Err(Error::SizeMismatch {
            expected: b * h * w * c,
            actual: db * dh * dw * dc,
        });
    }

    let (row_kernel, col_kernel) = gaussian_kernel_pair(
        cfg.kernel_height,
        cfg.kernel_width,
        cfg.sigma_y,
        cfg.sigma_x,
    )?;
    let filter = SeparableFilter::new(&row_kernel, &col_kernel, cfg.border_mode, cfg.border_value)?;

    let (src_dtype, dst_dtype) = (src.dtype(), dst.dtype());
    match (src, dst) {
        (TensorRef::F32(s), TensorRefMut::F32(d)) => {
            blur_batch(s, d, dispatcher, &|src_img, dst_img| {
                filter
                    .apply_f32(src_img, dst_img)
                    .expect("validated layouts");
            });
            Ok(())
        }
        (TensorRef::U8(s), TensorRefMut::U8(d)) => {
            blur_batch(s, d, dispatcher, &|src_img, dst_img| {
                filter.apply_u8(src_img, dst_img).expect("validated layouts");
            });
            Ok(())
        }
        (TensorRef::U16(_), _) => Err(Error::UnsupportedDtype { dtype: DType::U16 }),
        _ => Err(Error::DtypeMismatch {
            src: src_dtype,
            dst: dst_dtype,
        }),
    }
}

fn blur_batch<T>(
    src: &TensorView<'_, T>,
    dst: &mut TensorViewMut<'_, T>,
    dispatcher: &dyn Dispatcher,
    apply: &(dyn Fn(&ImageView<'_, T>, &mut ImageViewMut<'_, T>) + Sync),
) where
    T: Copy + Send + Sync,
{
    let (batch, height, width, channels) = src.dims();
    let img_len = height * width * channels;
    if batch == 0 || img_len == 0 {
        return;
    }

    let writer = DisjointWriter::new(dst.data_mut());
    dispatcher.dispatch(batch, &|b, _thread_id| {
        let src_img = src.image(b);
        // SAFETY: each task owns image `b`'s destination slice exclusively;
        // batch slices are disjoint by construction.
        let dst_slice = unsafe { writer.slice_mut(b * img_len, img_len) };
        let mut dst_img =
            ImageViewMut::from_slice_mut(width, height, channels, width * channels, dst_slice)
                .expect("batch slice matches image layout");
        apply(&src_img, &mut dst_img);
    });
}

#[cfg(test)]
mod tests {
    use tcv_core::{
        BorderMode, Error, SerialDispatcher, TensorRef, TensorRefMut, TensorView, TensorViewMut,
    };

    use super::{gaussian_blur, GaussianBlurConfig};

    fn cfg_3x3() -> GaussianBlurConfig {
        GaussianBlurConfig::default()
    }

    #[test]
    fn blur_smooths_impulse_u8() {
        let mut data = vec![0u8; 25];
        data[12] = 255;
        let src = TensorView::from_slice(1, 5, 5, 1, &data).expect("valid tensor");
        let mut out = vec![0u8; 25];
        let mut dst = TensorRefMut::U8(
            TensorViewMut::from_slice_mut(1, 5, 5, 1, &mut out).expect("valid tensor"),
        );

        gaussian_blur(&TensorRef::U8(src), &mut dst, &cfg_3x3(), &SerialDispatcher)
            .expect("blur");

        // 3x3 table is [64,128,64]/256 per axis: center 255*(128/256)^2 ~ 64.
        assert_eq!(out[12], 64);
        assert_eq!(out[7], 32);
        assert_eq!(out[6], 16);
        assert_eq!(out[0], 0);
    }

    #[test]
    fn blur_batches_are_independent() {
        let mut data = vec![0u8; 2 * 16];
        data[5] = 200; // image 0
        let src = TensorView::from_slice(2, 4, 4, 1, &data).expect("valid tensor");
        let mut out = vec![0u8; 2 * 16];
        let mut dst = TensorRefMut::U8(
            TensorViewMut::from_slice_mut(2, 4, 4, 1, &mut out).expect("valid tensor"),
        );

        gaussian_blur(&TensorRef::U8(src), &mut dst, &cfg_3x3(), &SerialDispatcher)
            .expect("blur");

        assert!(out[..16].iter().any(|&v| v != 0));
        assert!(out[16..].iter().all(|&v| v == 0));
    }

    #[test]
    fn rejects_u16_and_mismatched_dtypes() {
        let data16 = [0u16; 4];
        let src = TensorRef::U16(TensorView::from_slice(1, 2, 2, 1, &data16).expect("valid"));
        let mut out16 = [0u16; 4];
        let mut dst = TensorRefMut::U16(
            TensorViewMut::from_slice_mut(1, 2, 2, 1, &mut out16).expect("valid"),
        );
        assert!(matches!(
            gaussian_blur(&src, &mut dst, &cfg_3x3(), &SerialDispatcher),
            Err(Error::UnsupportedDtype { .. })
        ));

        let data8 = [0u8; 4];
        let src = TensorRef::U8(TensorView::from_slice(1, 2, 2, 1, &data8).expect("valid"));
        let mut outf = [0.0f32; 4];
        let mut dst = TensorRefMut::F32(
            TensorViewMut::from_slice_mut(1, 2, 2, 1, &mut outf).expect("valid"),
        );
        assert!(matches!(
            gaussian_blur(&src, &mut dst, &cfg_3x3(), &SerialDispatcher),
            Err(Error::DtypeMismatch { .. })
        ));
    }

    #[test]
    fn rejects_isolated_border_before_work() {
        let data = [0u8; 4];
        let src = TensorRef::U8(TensorView::from_slice(1, 2, 2, 1, &data).expect("valid"));
        let mut out = [1u8; 4];
        let mut dst = TensorRefMut::U8(
            TensorViewMut::from_slice_mut(1, 2, 2, 1, &mut out).expect("valid"),
        );
        let cfg = GaussianBlurConfig {
            border_mode: BorderMode::Isolated,
            ..GaussianBlurConfig::default()
        };
        assert!(matches!(
            gaussian_blur(&src, &mut dst, &cfg, &SerialDispatcher),
            Err(Error::UnsupportedBorderMode { .. })
        ));
        assert_eq!(out, [1u8; 4]);
    }
}
