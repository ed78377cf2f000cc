//! Image views, owned buffers and raw camera frames.
//!
//! `ImageView` is a borrowed 2D view into a 1D buffer with an explicit
//! stride. ROI slices are zero-copy views into the same backing slice and
//! retain the original stride. `Frame` is the ephemeral pixel buffer handed
//! over by a frame source; it is never retained beyond one processing step.

use crate::util::{TrackError, TrackResult};

pub mod filter;
#[cfg(feature = "image-io")]
pub mod io;

/// Borrowed 2D image view with an explicit stride.
#[derive(Copy, Clone)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> TrackResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(data: &'a [T], width: usize, height: usize, stride: usize) -> TrackResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(TrackError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the backing slice including any row padding.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.stride + x)
    }

    /// Returns a contiguous slice for row `y` with length `width`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.stride;
        self.data.get(start..start + self.width)
    }

    /// Returns a zero-copy ROI view into the same backing buffer.
    pub fn roi(&self, x: usize, y: usize, width: usize, height: usize) -> TrackResult<Self> {
        if width == 0 || height == 0 {
            return Err(TrackError::InvalidDimensions { width, height });
        }
        let oob = TrackError::RoiOutOfBounds {
            x,
            y,
            width,
            height,
            img_width: self.width,
            img_height: self.height,
        };
        let end_x = x.checked_add(width).ok_or_else(|| oob.clone())?;
        let end_y = y.checked_add(height).ok_or_else(|| oob.clone())?;
        if end_x > self.width || end_y > self.height {
            return Err(oob);
        }
        ImageView::new(&self.data[y * self.stride + x..], width, height, self.stride)
    }
}

fn required_len(width: usize, height: usize, stride: usize) -> TrackResult<usize> {
    if width == 0 || height == 0 {
        return Err(TrackError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(TrackError::InvalidStride { width, stride });
    }
    (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or(TrackError::InvalidDimensions { width, height })
}

/// Owned contiguous grayscale image buffer.
#[derive(Clone)]
pub struct OwnedImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl OwnedImage {
    /// Creates an owned image from a contiguous grayscale buffer.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> TrackResult<Self> {
        if width == 0 || height == 0 {
            return Err(TrackError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .ok_or(TrackError::InvalidDimensions { width, height })?;
        if data.len() != needed {
            return Err(TrackError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Copies a view into a new contiguous owned image.
    pub fn from_view(view: ImageView<'_, u8>) -> TrackResult<Self> {
        let width = view.width();
        let height = view.height();
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            let row = view.row(y).ok_or(TrackError::BufferTooSmall {
                needed: y * view.stride() + width,
                got: view.as_slice().len(),
            })?;
            data.extend_from_slice(row);
        }
        Self::new(data, width, height)
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> ImageView<'_, u8> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the raw pixel data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Pixel layout of a raw camera frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// Single-channel intensity.
    Luma8,
    /// Interleaved 8-bit RGB.
    Rgb8,
    /// Interleaved 8-bit RGBA; alpha is ignored.
    Rgba8,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Luma8 => 1,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// Borrowed raw frame as delivered by a frame source.
///
/// Frames are read-only to the core and live only for the duration of one
/// capture or tracking tick.
#[derive(Copy, Clone)]
pub struct Frame<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    format: PixelFormat,
}

impl<'a> Frame<'a> {
    /// Wraps a raw interleaved pixel buffer.
    ///
    /// Zero-dimension frames are representable (a stream that has not
    /// produced metadata yet); they fail later at capture time instead.
    pub fn new(
        data: &'a [u8],
        width: usize,
        height: usize,
        format: PixelFormat,
    ) -> TrackResult<Self> {
        let needed = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(format.channels()))
            .ok_or(TrackError::InvalidDimensions { width, height })?;
        if data.len() < needed {
            return Err(TrackError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            format,
        })
    }

    /// Returns the frame width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the frame height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the pixel layout.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// True when either dimension is zero (stream not ready).
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Converts the frame to single-channel intensity.
    ///
    /// Color frames use Rec.601 luma weights with fixed-point arithmetic, so
    /// the conversion is deterministic for identical pixel input.
    pub fn to_luma(&self) -> TrackResult<OwnedImage> {
        if self.is_empty() {
            return Err(TrackError::InvalidFrame);
        }
        let pixels = self.width * self.height;
        let data = match self.format {
            PixelFormat::Luma8 => self.data[..pixels].to_vec(),
            PixelFormat::Rgb8 | PixelFormat::Rgba8 => {
                let step = self.format.channels();
                let mut out = Vec::with_capacity(pixels);
                for px in self.data[..pixels * step].chunks_exact(step) {
                    out.push(luma_rec601(px[0], px[1], px[2]));
                }
                out
            }
        };
        OwnedImage::new(data, self.width, self.height)
    }
}

// 77/150/29 sum to 256, matching the usual 0.299/0.587/0.114 weights.
fn luma_rec601(r: u8, g: u8, b: u8) -> u8 {
    let sum = 77 * u32::from(r) + 150 * u32::from(g) + 29 * u32::from(b);
    ((sum + 128) >> 8) as u8
}
