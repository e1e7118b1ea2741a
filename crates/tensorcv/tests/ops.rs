use tensorcv::{
    gaussian_blur, warp_perspective, BorderMode, GaussianBlurConfig, Mat3, RayonDispatcher,
    SerialDispatcher, TensorRef, TensorRefMut, TensorView, TensorViewMut, WarpConfig,
};

fn checkerboard(batch: usize, h: usize, w: usize, c: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(batch * h * w * c);
    for b in 0..batch {
        for y in 0..h {
            for x in 0..w {
                for ch in 0..c {
                    let v = if (x / 4 + y / 4) % 2 == 0 { 220 } else { 30 };
                    data.push((v + b * 5 + ch) as u8);
                }
            }
        }
    }
    data
}

#[test]
fn blur_then_warp_pipeline_runs_end_to_end() {
    let (b, h, w, c) = (2usize, 24usize, 32usize, 3usize);
    let input = checkerboard(b, h, w, c);

    let src = TensorView::from_slice(b, h, w, c, &input).expect("valid tensor");
    let mut blurred = vec![0u8; input.len()];
    {
        let mut dst = TensorRefMut::U8(
            TensorViewMut::from_slice_mut(b, h, w, c, &mut blurred).expect("valid tensor"),
        );
        let cfg = GaussianBlurConfig {
            kernel_height: 5,
            kernel_width: 5,
            border_mode: BorderMode::Replicate,
            ..GaussianBlurConfig::default()
        };
        gaussian_blur(&TensorRef::U8(src), &mut dst, &cfg, &SerialDispatcher).expect("blur");
    }

    // Blur must reduce the checkerboard contrast.
    let range = |d: &[u8]| {
        let min = *d.iter().min().expect("nonempty");
        let max = *d.iter().max().expect("nonempty");
        (max - min) as i32
    };
    assert!(range(&blurred) < range(&input));

    let blurred_t = TensorView::from_slice(b, h, w, c, &blurred).expect("valid tensor");
    let mut warped = vec![0u8; input.len()];
    let mut dst = TensorRefMut::U8(
        TensorViewMut::from_slice_mut(b, h, w, c, &mut warped).expect("valid tensor"),
    );
    let m = Mat3::rotation_deg(-12.0, w as f64 / 2.0, h as f64 / 2.0);
    warp_perspective(
        &TensorRef::U8(blurred_t),
        &[m, m],
        &mut dst,
        &WarpConfig {
            border: BorderMode::Reflect101,
            ..WarpConfig::default()
        },
        &SerialDispatcher,
    )
    .expect("warp");

    assert!(warped.iter().any(|&v| v != 0));
}

#[test]
fn rayon_and_serial_dispatch_agree() {
    let (b, h, w, c) = (3usize, 37usize, 29usize, 2usize);
    let input = checkerboard(b, h, w, c);
    let src = TensorView::from_slice(b, h, w, c, &input).expect("valid tensor");
    let m = Mat3::rotation_deg(25.0, 14.0, 18.0);
    let trans = vec![m; b];
    let cfg = WarpConfig {
        border: BorderMode::Replicate,
        block_size: 16,
        ..WarpConfig::default()
    };

    let mut serial = vec![0u8; input.len()];
    {
        let mut dst = TensorRefMut::U8(
            TensorViewMut::from_slice_mut(b, h, w, c, &mut serial).expect("valid tensor"),
        );
        warp_perspective(&TensorRef::U8(src), &trans, &mut dst, &cfg, &SerialDispatcher)
            .expect("warp");
    }

    let mut parallel = vec![0u8; input.len()];
    {
        let mut dst = TensorRefMut::U8(
            TensorViewMut::from_slice_mut(b, h, w, c, &mut parallel).expect("valid tensor"),
        );
        warp_perspective(&TensorRef::U8(src), &trans, &mut dst, &cfg, &RayonDispatcher)
            .expect("warp");
    }

    assert_eq!(serial, parallel);

    let blur_cfg = GaussianBlurConfig::default();
    let mut blur_serial = vec![0u8; input.len()];
    {
        let mut dst = TensorRefMut::U8(
            TensorViewMut::from_slice_mut(b, h, w, c, &mut blur_serial).expect("valid tensor"),
        );
        gaussian_blur(&TensorRef::U8(src), &mut dst, &blur_cfg, &SerialDispatcher).expect("blur");
    }
    let mut blur_parallel = vec![0u8; input.len()];
    {
        let mut dst = TensorRefMut::U8(
            TensorViewMut::from_slice_mut(b, h, w, c, &mut blur_parallel).expect("valid tensor"),
        );
        gaussian_blur(&TensorRef::U8(src), &mut dst, &blur_cfg, &RayonDispatcher).expect("blur");
    }
    assert_eq!(blur_serial, blur_parallel);
}

#[test]
fn f32_and_u8_blur_agree_within_quantization() {
    let (b, h, w, c) = (1usize, 20usize, 20usize, 1usize);
    let input = checkerboard(b, h, w, c);
    let input_f: Vec<f32> = input.iter().map(|&v| v as f32).collect();

    let cfg = GaussianBlurConfig {
        kernel_height: 5,
        kernel_width: 5,
        border_mode: BorderMode::Reflect101,
        ..GaussianBlurConfig::default()
    };

    let src8 = TensorView::from_slice(b, h, w, c, &input).expect("valid tensor");
    let mut out8 = vec![0u8; input.len()];
    {
        let mut dst = TensorRefMut::U8(
            TensorViewMut::from_slice_mut(b, h, w, c, &mut out8).expect("valid tensor"),
        );
        gaussian_blur(&TensorRef::U8(src8), &mut dst, &cfg, &SerialDispatcher).expect("blur");
    }

    let srcf = TensorView::from_slice(b, h, w, c, &input_f).expect("valid tensor");
    let mut outf = vec![0.0f32; input.len()];
    {
        let mut dst = TensorRefMut::F32(
            TensorViewMut::from_slice_mut(b, h, w, c, &mut outf).expect("valid tensor"),
        );
        gaussian_blur(&TensorRef::F32(srcf), &mut dst, &cfg, &SerialDispatcher).expect("blur");
    }

    for (i, (&q, &f)) in out8.iter().zip(outf.iter()).enumerate() {
        assert!((q as f32 - f).abs() <= 2.0, "element {i}: {q} vs {f}");
    }
}
