use core::fmt;

use crate::image::{ImageView, ImageViewMut};
use crate::Error;

/// Element type tag for dtype-erased operator arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    U8,
    U16,
    F32,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U8 => write!(f, "u8"),
            Self::U16 => write!(f, "u16"),
            Self::F32 => write!(f, "f32"),
        }
    }
}

/// Borrowed `[batch, height, width, channel]` tensor over a contiguous,
/// caller-owned interleaved buffer.
#[derive(Debug, Clone, Copy)]
pub struct TensorView<'a, T> {
    batch: usize,
    height: usize,
    width: usize,
    channels: usize,
    data: &'a [T],
}

impl<'a, T> TensorView<'a, T> {
    pub fn from_slice(
        batch: usize,
        height: usize,
        width: usize,
        channels: usize,
        data: &'a [T],
    ) -> Result<Self, Error> {
        let expected = tensor_len(batch, height, width, channels, data.len())?;
        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            batch,
            height,
            width,
            channels,
            data,
        })
    }

    pub fn dims(&self) -> (usize, usize, usize, usize) {
        (self.batch, self.height, self.width, self.channels)
    }

    pub fn batch(&self) -> usize {
        self.batch
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn data(&self) -> &'a [T] {
        self.data
    }

    pub fn image(&self, b: usize) -> ImageView<'a, T> {
        assert!(b < self.batch, "batch index out of bounds");
        let img_len = self.height * self.width * self.channels;
        let start = b * img_len;
        ImageView::raw(
            self.width,
            self.height,
            self.channels,
            self.width * self.channels,
            &self.data[start..start + img_len],
        )
    }
}

/// Mutable counterpart of [`TensorView`].
#[derive(Debug)]
pub struct TensorViewMut<'a, T> {
    batch: usize,
    height: usize,
    width: usize,
    channels: usize,
    data: &'a mut [T],
}

impl<'a, T> TensorViewMut<'a, T> {
    pub fn from_slice_mut(
        batch: usize,
        height: usize,
        width: usize,
        channels: usize,
        data: &'a mut [T],
    ) -> Result<Self, Error> {
        let expected = tensor_len(batch, height, width, channels, data.len())?;
        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            batch,
            height,
            width,
            channels,
            data,
        })
    }

    pub fn dims(&self) -> (usize, usize, usize, usize) {
        (self.batch, self.height, self.width, self.channels)
    }

    pub fn batch(&self) -> usize {
        self.batch
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn data(&self) -> &[T] {
        self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        self.data
    }

    pub fn image_mut(&mut self, b: usize) -> ImageViewMut<'_, T> {
        assert!(b < self.batch, "batch index out of bounds");
        let img_len = self.height * self.width * self.channels;
        let start = b * img_len;
        ImageViewMut::from_slice_mut(
            self.width,
            self.height,
            self.channels,
            self.width * self.channels,
            &mut self.data[start..start + img_len],
        )
        .expect("batch slice matches image layout")
    }
}

fn tensor_len(
    batch: usize,
    height: usize,
    width: usize,
    channels: usize,
    actual: usize,
) -> Result<usize, Error> {
    batch
        .checked_mul(height)
        .and_then(|v| v.checked_mul(width))
        .and_then(|v| v.checked_mul(channels))
        .ok_or(Error::SizeMismatch {
            expected: usize::MAX,
            actual,
        })
}

/// Dtype-erased operator input, mirroring runtime dtype dispatch at the
/// operator boundary.
#[derive(Debug, Clone, Copy)]
pub enum TensorRef<'a> {
    U8(TensorView<'a, u8>),
    U16(TensorView<'a, u16>),
    F32(TensorView<'a, f32>),
}

impl TensorRef<'_> {
    pub fn dtype(&self) -> DType {
        match self {
            Self::U8(_) => DType::U8,
            Self::U16(_) => DType::U16,
            Self::F32(_) => DType::F32,
        }
    }

    pub fn dims(&self) -> (usize, usize, usize, usize) {
        match self {
            Self::U8(t) => t.dims(),
            Self::U16(t) => t.dims(),
            Self::F32(t) => t.dims(),
        }
    }
}

/// Dtype-erased operator output.
#[derive(Debug)]
pub enum TensorRefMut<'a> {
    U8(TensorViewMut<'a, u8>),
    U16(TensorViewMut<'a, u16>),
    F32(TensorViewMut<'a, f32>),
}

impl TensorRefMut<'_> {
    pub fn dtype(&self) -> DType {
        match self {
            Self::U8(_) => DType::U8,
            Self::U16(_) => DType::U16,
            Self::F32(_) => DType::F32,
        }
    }

    pub fn dims(&self) -> (usize, usize, usize, usize) {
        match self {
            Self::U8(t) => t.dims(),
            Self::U16(t) => t.dims(),
            Self::F32(t) => t.dims(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TensorRef, TensorView, TensorViewMut};

    #[test]
    fn tensor_view_per_image_access() {
        // 2 images of 2x3x1.
        let data: Vec<u8> = (0..12).collect();
        let t = TensorView::from_slice(2, 2, 3, 1, &data).expect("valid tensor");

        assert_eq!(t.image(0).row(0), &[0, 1, 2]);
        assert_eq!(t.image(0).row(1), &[3, 4, 5]);
        assert_eq!(t.image(1).row(0), &[6, 7, 8]);
        assert_eq!(t.image(1).row(1), &[9, 10, 11]);
    }

    #[test]
    fn tensor_view_rejects_wrong_length() {
        let data = [0u8; 10];
        assert!(TensorView::from_slice(1, 2, 2, 2, &data).is_err());
    }

    #[test]
    fn tensor_ref_reports_dtype_and_dims() {
        let data = [0.0f32; 8];
        let t = TensorView::from_slice(1, 2, 2, 2, &data).expect("valid tensor");
        let r = TensorRef::F32(t);
        assert_eq!(r.dims(), (1, 2, 2, 2));

        let mut buf = [0u8; 8];
        let mut tm = TensorViewMut::from_slice_mut(2, 2, 2, 1, &mut buf).expect("valid tensor");
        tm.image_mut(1).row_mut(0)[0] = 9;
        assert_eq!(tm.data()[4], 9);
    }
}
