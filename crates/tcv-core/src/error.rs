use core::fmt;

use crate::border::BorderMode;
use crate::tensor::DType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    SizeMismatch { expected: usize, actual: usize },
    InvalidStride,
    OutOfBounds,
    KernelSizeNotOdd { size: usize },
    FilterLenMismatch { row: usize, col: usize },
    ChannelPairMismatch { row: (usize, usize), col: (usize, usize) },
    UnsupportedDtype { dtype: DType },
    DtypeMismatch { src: DType, dst: DType },
    UnsupportedBorderMode { mode: BorderMode },
    UnsupportedChannelCount { channels: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch { expected, actual } => {
                write!(f, "size mismatch: expected {expected}, got {actual}")
            }
            Self::InvalidStride => write!(f, "invalid stride"),
            Self::OutOfBounds => write!(f, "out of bounds"),
            Self::KernelSizeNotOdd { size } => {
                write!(f, "kernel size must be odd and positive, got {size}")
            }
            Self::FilterLenMismatch { row, col } => {
                write!(f, "filter length mismatch: row {row}, col {col}")
            }
            Self::ChannelPairMismatch { row, col } => {
                write!(
                    f,
                    "filter channel pair mismatch: row {}x{}, col {}x{}",
                    row.0, row.1, col.0, col.1
                )
            }
            Self::UnsupportedDtype { dtype } => write!(f, "unsupported dtype {dtype}"),
            Self::DtypeMismatch { src, dst } => {
                write!(f, "dtype mismatch: src {src}, dst {dst}")
            }
            Self::UnsupportedBorderMode { mode } => {
                write!(f, "unsupported border mode {mode:?}")
            }
            Self::UnsupportedChannelCount { channels } => {
                write!(f, "unsupported channel count {channels}, expected 1, 2 or 3")
            }
        }
    }
}

impl std::error::Error for Error {}
