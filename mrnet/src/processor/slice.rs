//! The per-slice image preprocessor.

use crate::common::*;

/// The additive term that keeps min-max normalization finite on constant images.
pub const NORMALIZE_EPSILON: f32 = 1e-8;

/// The default side length of output images.
pub const DEFAULT_IMAGE_SIZE: usize = 299;

/// The default number of output channels.
pub const DEFAULT_CHANNELS: usize = 3;

/// The resampling filter used to resize slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl Default for ResizeFilter {
    fn default() -> Self {
        Self::Triangle
    }
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Turns a grayscale slice into a normalized multi-channel image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlicePreprocessor {
    height: usize,
    width: usize,
    channels: usize,
    filter: ResizeFilter,
}

impl Default for SlicePreprocessor {
    fn default() -> Self {
        Self {
            height: DEFAULT_IMAGE_SIZE,
            width: DEFAULT_IMAGE_SIZE,
            channels: DEFAULT_CHANNELS,
            filter: ResizeFilter::default(),
        }
    }
}

impl SlicePreprocessor {
    /// Build a new slice preprocessor.
    ///
    /// * `height`, `width` - The output image size in pixels.
    /// * `channels` - The number of times the grayscale channel is replicated.
    /// * `filter` - The resampling filter. The filter support widens when down-sampling.
    pub fn new(height: usize, width: usize, channels: usize, filter: ResizeFilter) -> Result<Self> {
        ensure!(height > 0 && width > 0, "image size must be positive");
        ensure!(channels > 0, "channels must be positive");
        ensure!(
            u32::try_from(height).is_ok() && u32::try_from(width).is_ok(),
            "image size {}x{} is too large",
            height,
            width
        );

        Ok(Self {
            height,
            width,
            channels,
            filter,
        })
    }

    /// Build a preprocessor producing `image_size`x`image_size` images.
    pub fn square(image_size: usize, channels: usize, filter: ResizeFilter) -> Result<Self> {
        Self::new(image_size, image_size, channels, filter)
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

    /// The `(height, width, channels)` shape of processed images.
    pub fn output_shape(&self) -> (usize, usize, usize) {
        (self.height, self.width, self.channels)
    }

    /// Resize, min-max normalize and replicate a 2D slice into a `(height, width, channels)` image.
    ///
    /// The intensities are mapped to [0, 1] before resampling so that the
    /// resampler works on a bounded range. For filters with non-negative
    /// weights (`Nearest`, `Triangle`, `Gaussian`) the result equals
    /// normalizing after resizing. `CatmullRom` and `Lanczos3` overshoot, and
    /// the overshoot is clamped to [0, 1] by the resampler before the final
    /// normalization.
    pub fn process(&self, slice: ArrayView2<f32>) -> Result<Array3<f32>> {
        let (orig_h, orig_w) = slice.dim();
        ensure!(orig_h > 0 && orig_w > 0, "cannot process an empty slice");
        ensure!(
            slice.iter().all(|value| value.is_finite()),
            "the slice contains non-finite values"
        );

        let scaled = normalize(slice.iter().copied());
        let resized = {
            let buffer: ImageBuffer<Luma<f32>, Vec<f32>> =
                ImageBuffer::from_raw(orig_w as u32, orig_h as u32, scaled)
                    .ok_or_else(|| format_err!("slice buffer does not match its size"))?;
            image::imageops::resize(
                &buffer,
                self.width as u32,
                self.height as u32,
                self.filter.into(),
            )
        };
        let normalized = normalize(resized.into_raw());

        let Self {
            width, channels, ..
        } = *self;
        let output = Array3::from_shape_fn(self.output_shape(), |(row, col, _)| {
            normalized[row * width + col]
        });
        debug_assert_eq!(output.len(), self.height * width * channels);

        Ok(output)
    }
}

/// Min-max normalize values to [0, 1] with an epsilon-guarded denominator.
fn normalize(values: impl IntoIterator<Item = f32>) -> Vec<f32> {
    let values: Vec<f32> = values.into_iter().collect();
    let (min, max) = values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), &value| {
            (min.min(value), max.max(value))
        });
    let scale = max - min + NORMALIZE_EPSILON;

    values.into_iter().map(|value| (value - min) / scale).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(height: usize, width: usize) -> Array2<f32> {
        Array2::from_shape_fn((height, width), |(row, col)| (row * width + col) as f32)
    }

    #[test]
    fn output_shape_and_range() -> Result<()> {
        let processor = SlicePreprocessor::default();
        let image = processor.process(gradient(256, 256).view())?;

        assert_eq!(image.dim(), (299, 299, 3));
        let min = image.iter().copied().fold(f32::INFINITY, f32::min);
        let max = image.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        assert_abs_diff_eq!(min, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(max, 1.0, epsilon = 1e-4);
        Ok(())
    }

    #[test]
    fn channels_are_identical() -> Result<()> {
        let processor = SlicePreprocessor::square(32, 3, ResizeFilter::Triangle)?;
        let image = processor.process(gradient(64, 48).view())?;

        let first = image.index_axis(Axis(2), 0);
        for channel in 1..3 {
            assert_eq!(image.index_axis(Axis(2), channel), first);
        }
        Ok(())
    }

    #[test]
    fn constant_slice_does_not_divide_by_zero() -> Result<()> {
        let processor = SlicePreprocessor::square(16, 3, ResizeFilter::Triangle)?;
        let image = processor.process(Array2::from_elem((20, 20), 117.0).view())?;

        assert!(image.iter().all(|&value| value.is_finite()));
        assert!(image.iter().all(|&value| (0.0..=1.0).contains(&value)));
        assert!(image.iter().all(|&value| value == 0.0));
        Ok(())
    }

    #[test]
    fn normalization_is_affine_invariant() -> Result<()> {
        let processor = SlicePreprocessor::square(24, 1, ResizeFilter::Triangle)?;
        let slice = gradient(40, 40);
        let shifted = slice.mapv(|value| value * 3.0 - 50.0);

        let lhs = processor.process(slice.view())?;
        let rhs = processor.process(shifted.view())?;
        for (&lhs, &rhs) in lhs.iter().zip(rhs.iter()) {
            assert_abs_diff_eq!(lhs, rhs, epsilon = 1e-5);
        }
        Ok(())
    }

    #[test]
    fn overshooting_filters_stay_in_range() -> Result<()> {
        let step = Array2::from_shape_fn((40, 40), |(_, col)| if col < 20 { 0.0 } else { 1000.0 });

        for filter in [ResizeFilter::CatmullRom, ResizeFilter::Lanczos3] {
            let processor = SlicePreprocessor::square(64, 1, filter)?;
            let image = processor.process(step.view())?;
            assert!(image.iter().all(|&value| (0.0..=1.0).contains(&value)));
        }
        Ok(())
    }

    #[test]
    fn deterministic() -> Result<()> {
        let processor = SlicePreprocessor::square(50, 3, ResizeFilter::Lanczos3)?;
        let slice = gradient(64, 64);
        assert_eq!(processor.process(slice.view())?, processor.process(slice.view())?);
        Ok(())
    }

    #[test]
    fn reject_invalid_input() {
        let processor = SlicePreprocessor::square(8, 3, ResizeFilter::Nearest).unwrap();
        assert!(processor.process(Array2::<f32>::zeros((0, 4)).view()).is_err());

        let mut slice = gradient(4, 4);
        slice[[1, 1]] = f32::NAN;
        assert!(processor.process(slice.view()).is_err());

        assert!(SlicePreprocessor::square(0, 3, ResizeFilter::Nearest).is_err());
        assert!(SlicePreprocessor::square(8, 0, ResizeFilter::Nearest).is_err());
    }
}
