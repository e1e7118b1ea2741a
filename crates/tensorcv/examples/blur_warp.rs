//! Minimal end-to-end usage: blur a synthetic gradient, then rotate it.

use tensorcv::{
    gaussian_blur, warp_perspective, BorderMode, GaussianBlurConfig, Mat3, SerialDispatcher,
    TensorRef, TensorRefMut, TensorView, TensorViewMut, WarpConfig,
};

fn main() {
    let (h, w) = (64usize, 64usize);
    let input: Vec<u8> = (0..h * w).map(|i| ((i % w) * 4 % 256) as u8).collect();

    let src = TensorView::from_slice(1, h, w, 1, &input).expect("valid tensor");
    let mut blurred = vec![0u8; input.len()];
    {
        let mut dst = TensorRefMut::U8(
            TensorViewMut::from_slice_mut(1, h, w, 1, &mut blurred).expect("valid tensor"),
        );
        let cfg = GaussianBlurConfig {
            kernel_height: 7,
            kernel_width: 7,
            ..GaussianBlurConfig::default()
        };
        gaussian_blur(&TensorRef::U8(src), &mut dst, &cfg, &SerialDispatcher).expect("blur");
    }

    let blurred_t = TensorView::from_slice(1, h, w, 1, &blurred).expect("valid tensor");
    let mut warped = vec![0u8; input.len()];
    let mut dst = TensorRefMut::U8(
        TensorViewMut::from_slice_mut(1, h, w, 1, &mut warped).expect("valid tensor"),
    );
    let m = Mat3::rotation_deg(-20.0, w as f64 / 2.0, h as f64 / 2.0);
    warp_perspective(
        &TensorRef::U8(blurred_t),
        &[m],
        &mut dst,
        &WarpConfig {
            border: BorderMode::Replicate,
            ..WarpConfig::default()
        },
        &SerialDispatcher,
    )
    .expect("warp");

    let mean = warped.iter().map(|&v| v as u32).sum::<u32>() / (h * w) as u32;
    println!("blurred+rotated {w}x{h}, mean intensity {mean}");
}
