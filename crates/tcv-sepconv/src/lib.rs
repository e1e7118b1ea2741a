//! Separable-convolution adapter for tensorcv.
//!
//! Expands a pair of per-channel 1D filter factors into a dense 2D kernel by
//! outer product and hands the result to the external dense convolution
//! operator. No filtering math happens here; the adapter exists to bridge
//! separable-factor inputs to the dense-kernel convolution contract.

use tcv_core::{Error, TensorView, TensorViewMut};

/// Borrowed `[out_channels, in_channels, k]` bank of 1D filter factors, one
/// odd-length tap row per channel pair.
#[derive(Debug, Clone, Copy)]
pub struct FilterBank<'a> {
    out_channels: usize,
    in_channels: usize,
    ksize: usize,
    data: &'a [f32],
}

impl<'a> FilterBank<'a> {
    pub fn from_slice(
        out_channels: usize,
        in_channels: usize,
        ksize: usize,
        data: &'a [f32],
    ) -> Result<Self, Error> {
        if ksize == 0 || ksize % 2 == 0 {
            return Err(Error::KernelSizeNotOdd { size: ksize });
        }
        let expected = out_channels
            .checked_mul(in_channels)
            .and_then(|v| v.checked_mul(ksize))
            .ok_or(Error::SizeMismatch {
                expected: usize::MAX,
                actual: data.len(),
            })?;
        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            out_channels,
            in_channels,
            ksize,
            data,
        })
    }

    pub fn out_channels(&self) -> usize {
        self.out_channels
    }

    pub fn in_channels(&self) -> usize {
        self.in_channels
    }

    pub fn ksize(&self) -> usize {
        self.ksize
    }

    pub fn taps(&self, oc: usize, ic: usize) -> &'a [f32] {
        assert!(
            oc < self.out_channels && ic < self.in_channels,
            "channel pair out of bounds"
        );
        let start = (oc * self.in_channels + ic) * self.ksize;
        &self.data[start..start + self.ksize]
    }
}

/// Dense `[out_channels, in_channels, height, width]` convolution kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel2D {
    out_channels: usize,
    in_channels: usize,
    height: usize,
    width: usize,
    data: Vec<f32>,
}

impl Kernel2D {
    pub fn out_channels(&self) -> usize {
        self.out_channels
    }

    pub fn in_channels(&self) -> usize {
        self.in_channels
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn at(&self, oc: usize, ic: usize, y: usize, x: usize) -> f32 {
        assert!(
            oc < self.out_channels && ic < self.in_channels && y < self.height && x < self.width,
            "kernel index out of bounds"
        );
        self.data[((oc * self.in_channels + ic) * self.height + y) * self.width + x]
    }
}

/// Expands the row/column factor banks into the dense kernel:
/// `kernel[o, i, y, x] = row[o, i][x] * col[o, i][y]`.
pub fn synthesize_kernel2d(
    row_bank: &FilterBank<'_>,
    col_bank: &FilterBank<'_>,
) -> Result<Kernel2D, Error> {
    if row_bank.ksize() != col_bank.ksize() {
        return Err(Error::FilterLenMismatch {
            row: row_bank.ksize(),
            col: col_bank.ksize(),
        });
    }
    if row_bank.out_channels() != col_bank.out_channels()
        || row_bank.in_channels() != col_bank.in_channels()
    {
        return Err(Error::ChannelPairMismatch {
            row: (row_bank.out_channels(), row_bank.in_channels()),
            col: (col_bank.out_channels(), col_bank.in_channels()),
        });
    }

    let k = row_bank.ksize();
    let (oc, ic) = (row_bank.out_channels(), row_bank.in_channels());
    let mut data = Vec::with_capacity(oc * ic * k * k);
    for o in 0..oc {
        for i in 0..ic {
            let row = row_bank.taps(o, i);
            let col = col_bank.taps(o, i);
            for &cv in col {
                for &rv in row {
                    data.push(rv * cv);
                }
            }
        }
    }

    Ok(Kernel2D {
        out_channels: oc,
        in_channels: ic,
        height: k,
        width: k,
        data,
    })
}

/// External dense 2D convolution collaborator.
pub trait Convolution2D {
    fn exec(
        &self,
        src: &TensorView<'_, f32>,
        kernel: &Kernel2D,
        dst: &mut TensorViewMut<'_, f32>,
        workspace: &mut [u8],
    ) -> Result<(), Error>;
}

/// Synthesizes the dense kernel from the separable factors and delegates to
/// `conv` with an empty auxiliary workspace.
pub fn separable_conv(
    conv: &dyn Convolution2D,
    src: &TensorView<'_, f32>,
    row_bank: &FilterBank<'_>,
    col_bank: &FilterBank<'_>,
    dst: &mut TensorViewMut<'_, f32>,
) -> Result<(), Error> {
    let kernel = synthesize_kernel2d(row_bank, col_bank)?;
    conv.exec(src, &kernel, dst, &mut [])
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use tcv_core::{Error, TensorView, TensorViewMut};

    use super::{separable_conv, synthesize_kernel2d, Convolution2D, FilterBank, Kernel2D};

    #[test]
    fn kernel_is_the_outer_product_per_channel_pair() {
        // 2 output x 1 input channels, 3 taps each.
        let rows = [1.0f32, 2.0, 3.0, 0.5, 0.25, 0.125];
        let cols = [4.0f32, 5.0, 6.0, 1.0, 2.0, 4.0];
        let row_bank = FilterBank::from_slice(2, 1, 3, &rows).expect("valid bank");
        let col_bank = FilterBank::from_slice(2, 1, 3, &cols).expect("valid bank");

        let kernel = synthesize_kernel2d(&row_bank, &col_bank).expect("synthesized");
        assert_eq!(kernel.height(), 3);
        assert_eq!(kernel.width(), 3);
        for o in 0..2 {
            for y in 0..3 {
                for x in 0..3 {
                    let expected = row_bank.taps(o, 0)[x] * col_bank.taps(o, 0)[y];
                    assert_eq!(kernel.at(o, 0, y, x), expected, "o={o} y={y} x={x}");
                }
            }
        }
    }

    #[test]
    fn mismatched_factors_are_rejected() {
        let a = [0.0f32; 3];
        let b = [0.0f32; 5];
        let bank3 = FilterBank::from_slice(1, 1, 3, &a).expect("valid bank");
        let bank5 = FilterBank::from_slice(1, 1, 5, &b).expect("valid bank");
        assert!(matches!(
            synthesize_kernel2d(&bank3, &bank5),
            Err(Error::FilterLenMismatch { row: 3, col: 5 })
        ));

        let c = [0.0f32; 6];
        let bank_pair = FilterBank::from_slice(2, 1, 3, &c).expect("valid bank");
        assert!(matches!(
            synthesize_kernel2d(&bank3, &bank_pair),
            Err(Error::ChannelPairMismatch { .. })
        ));

        assert!(FilterBank::from_slice(1, 1, 4, &[0.0; 4]).is_err());
        assert!(FilterBank::from_slice(1, 1, 3, &[0.0; 4]).is_err());
    }

    struct RecordingConv {
        seen: RefCell<Option<(Kernel2D, usize)>>,
    }

    impl Convolution2D for RecordingConv {
        fn exec(
            &self,
            _src: &TensorView<'_, f32>,
            kernel: &Kernel2D,
            _dst: &mut TensorViewMut<'_, f32>,
            workspace: &mut [u8],
        ) -> Result<(), Error> {
            *self.seen.borrow_mut() = Some((kernel.clone(), workspace.len()));
            Ok(())
        }
    }

    #[test]
    fn adapter_delegates_synthesized_kernel_with_empty_workspace() {
        let src_data = [0.0f32; 16];
        let src = TensorView::from_slice(1, 4, 4, 1, &src_data).expect("valid tensor");
        let mut dst_data = [0.0f32; 16];
        let mut dst =
            TensorViewMut::from_slice_mut(1, 4, 4, 1, &mut dst_data).expect("valid tensor");

        let rows = [0.25f32, 0.5, 0.25];
        let cols = [0.5f32, 1.0, 0.5];
        let row_bank = FilterBank::from_slice(1, 1, 3, &rows).expect("valid bank");
        let col_bank = FilterBank::from_slice(1, 1, 3, &cols).expect("valid bank");

        let conv = RecordingConv {
            seen: RefCell::new(None),
        };
        separable_conv(&conv, &src, &row_bank, &col_bank, &mut dst).expect("delegated");

        let (kernel, ws_len) = conv.seen.borrow().clone().expect("collaborator invoked");
        assert_eq!(ws_len, 0);
        assert_eq!(
            kernel.data(),
            &[
                0.125, 0.25, 0.125, //
                0.25, 0.5, 0.25, //
                0.125, 0.25, 0.125, //
            ]
        );
    }
}
