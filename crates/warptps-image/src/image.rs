use crate::error::ImageError;

/// Image size in pixels
///
/// A struct to represent the size of an image in pixels.
///
/// # Examples
///
/// ```
/// use warptps_image::ImageSize;
///
/// let image_size = ImageSize {
///   width: 10,
///   height: 20,
/// };
///
/// assert_eq!(image_size.width, 10);
/// assert_eq!(image_size.height, 20);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageSize {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
}

impl ImageSize {
    /// Number of pixels covered by the size.
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "ImageSize {{ width: {}, height: {} }}",
            self.width, self.height
        )
    }
}

impl From<[usize; 2]> for ImageSize {
    fn from(size: [usize; 2]) -> Self {
        ImageSize {
            width: size[0],
            height: size[1],
        }
    }
}

/// Runtime tag for the numeric type of an image sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleType {
    /// Unsigned 8-bit integer samples.
    U8,
    /// Unsigned 16-bit integer samples.
    U16,
    /// 32-bit floating point samples.
    F32,
    /// 64-bit floating point samples.
    F64,
}

impl SampleType {
    /// Whether the samples are integers and need rounding on output.
    pub fn is_integer(&self) -> bool {
        matches!(self, SampleType::U8 | SampleType::U16)
    }
}

/// Trait for image sample types.
///
/// Resampling accumulates in `f64`, which is wider than every implementor,
/// and converts back with [`ImageDtype::from_f64`]. Integer types round to
/// nearest and saturate at the type range.
pub trait ImageDtype: Copy + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// The runtime tag of this sample type.
    const SAMPLE_TYPE: SampleType;

    /// Widen the sample to `f64`.
    fn as_f64(self) -> f64;

    /// Convert an accumulated `f64` value back to the sample type.
    fn from_f64(x: f64) -> Self;
}

impl ImageDtype for u8 {
    const SAMPLE_TYPE: SampleType = SampleType::U8;

    fn as_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(x: f64) -> Self {
        x.round().clamp(0.0, u8::MAX as f64) as u8
    }
}

impl ImageDtype for u16 {
    const SAMPLE_TYPE: SampleType = SampleType::U16;

    fn as_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(x: f64) -> Self {
        x.round().clamp(0.0, u16::MAX as f64) as u16
    }
}

impl ImageDtype for f32 {
    const SAMPLE_TYPE: SampleType = SampleType::F32;

    fn as_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(x: f64) -> Self {
        x as f32
    }
}

impl ImageDtype for f64 {
    const SAMPLE_TYPE: SampleType = SampleType::F64;

    fn as_f64(self) -> f64 {
        self
    }

    fn from_f64(x: f64) -> Self {
        x
    }
}

/// Represents an image with pixel data.
///
/// The pixel data is stored row-major and channel-interleaved (`HWC`) in a
/// single contiguous buffer: the sample at column `x`, row `y` and channel
/// `c` lives at index `(y * width + x) * CHANNELS + c`.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<T, const CHANNELS: usize> {
    size: ImageSize,
    data: Vec<T>,
}

impl<T, const CHANNELS: usize> Image<T, CHANNELS> {
    /// Create a new image from pixel data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `data` - The pixel data of the image.
    ///
    /// # Errors
    ///
    /// If the length of the pixel data does not match the image size, an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use warptps_image::{Image, ImageSize};
    ///
    /// let image = Image::<u8, 3>::new(
    ///    ImageSize {
    ///       width: 10,
    ///       height: 20,
    ///    },
    ///    vec![0u8; 10 * 20 * 3],
    /// ).unwrap();
    ///
    /// assert_eq!(image.size().width, 10);
    /// assert_eq!(image.size().height, 20);
    /// assert_eq!(image.num_channels(), 3);
    /// ```
    pub fn new(size: ImageSize, data: Vec<T>) -> Result<Self, ImageError> {
        let expected = size.area() * CHANNELS;
        if data.len() != expected {
            return Err(ImageError::InvalidChannelShape(data.len(), expected));
        }

        Ok(Self { size, data })
    }

    /// Create a new image with the given size and default pixel data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `val` - The value every sample is initialised to.
    ///
    /// # Examples
    ///
    /// ```
    /// use warptps_image::{Image, ImageSize};
    ///
    /// let image = Image::<u8, 3>::from_size_val(
    ///   ImageSize {
    ///     width: 10,
    ///     height: 20,
    ///   }, 0u8).unwrap();
    ///
    /// assert_eq!(image.size().width, 10);
    /// assert_eq!(image.num_channels(), 3);
    /// ```
    pub fn from_size_val(size: ImageSize, val: T) -> Result<Self, ImageError>
    where
        T: Clone,
    {
        let data = vec![val; size.area() * CHANNELS];
        Image::new(size, data)
    }

    /// Get the size of the image in pixels.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Get the width of the image in pixels.
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Get the height of the image in pixels.
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Get the number of columns of the image.
    pub fn cols(&self) -> usize {
        self.width()
    }

    /// Get the number of rows of the image.
    pub fn rows(&self) -> usize {
        self.height()
    }

    /// Get the number of channels in the image.
    pub fn num_channels(&self) -> usize {
        CHANNELS
    }

    /// Whether the image holds no pixels.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The pixel data as a flat slice.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The pixel data as a flat mutable slice.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the image and return its pixel buffer.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Get the samples of a pixel.
    ///
    /// # Errors
    ///
    /// If the coordinates are outside the image, an error is returned.
    pub fn pixel(&self, x: usize, y: usize) -> Result<&[T], ImageError> {
        if x >= self.width() || y >= self.height() {
            return Err(ImageError::PixelIndexOutOfBounds(
                x,
                y,
                self.width(),
                self.height(),
            ));
        }
        let base = (y * self.width() + x) * CHANNELS;
        Ok(&self.data[base..base + CHANNELS])
    }

    /// Get a single sample of a pixel.
    ///
    /// # Arguments
    ///
    /// * `x` - The x-coordinate of the pixel.
    /// * `y` - The y-coordinate of the pixel.
    /// * `ch` - The channel index of the pixel.
    pub fn get_pixel(&self, x: usize, y: usize, ch: usize) -> Result<&T, ImageError> {
        if ch >= CHANNELS {
            return Err(ImageError::ChannelIndexOutOfBounds(ch, CHANNELS));
        }
        Ok(&self.pixel(x, y)?[ch])
    }

    /// Set a single sample of a pixel.
    pub fn set_pixel(&mut self, x: usize, y: usize, ch: usize, val: T) -> Result<(), ImageError> {
        if x >= self.width() || y >= self.height() {
            return Err(ImageError::PixelIndexOutOfBounds(
                x,
                y,
                self.width(),
                self.height(),
            ));
        }
        if ch >= CHANNELS {
            return Err(ImageError::ChannelIndexOutOfBounds(ch, CHANNELS));
        }
        let idx = (y * self.width() + x) * CHANNELS + ch;
        self.data[idx] = val;
        Ok(())
    }

    /// Get a channel of the image.
    ///
    /// # Errors
    ///
    /// If the channel index is out of bounds, an error is returned.
    pub fn channel(&self, channel: usize) -> Result<Image<T, 1>, ImageError>
    where
        T: Copy,
    {
        if channel >= CHANNELS {
            return Err(ImageError::ChannelIndexOutOfBounds(channel, CHANNELS));
        }

        let channel_data = self
            .data
            .chunks_exact(CHANNELS)
            .map(|pixel| pixel[channel])
            .collect();

        Image::new(self.size, channel_data)
    }

    /// Cast the pixel data of the image to a different type.
    ///
    /// # Errors
    ///
    /// If a sample cannot be represented in the target type, an error is returned.
    pub fn cast<U>(&self) -> Result<Image<U, CHANNELS>, ImageError>
    where
        U: num_traits::NumCast,
        T: num_traits::NumCast + Copy,
    {
        let casted_data = self
            .data
            .iter()
            .map(|&x| {
                U::from(x)
                    .ok_or_else(|| ImageError::CastError(std::any::type_name::<U>().to_string()))
            })
            .collect::<Result<Vec<U>, ImageError>>()?;

        Image::new(self.size, casted_data)
    }
}

impl<T: ImageDtype, const CHANNELS: usize> Image<T, CHANNELS> {
    /// The runtime tag of the sample type.
    pub fn sample_type(&self) -> SampleType {
        T::SAMPLE_TYPE
    }
}

#[cfg(test)]
mod tests {
    use crate::image::{Image, ImageDtype, ImageError, ImageSize, SampleType};

    #[test]
    fn image_size() {
        let image_size = ImageSize {
            width: 10,
            height: 20,
        };
        assert_eq!(image_size.width, 10);
        assert_eq!(image_size.height, 20);
        assert_eq!(image_size.area(), 200);
        assert_eq!(ImageSize::from([10, 20]), image_size);
    }

    #[test]
    fn image_smoke() -> Result<(), ImageError> {
        let image = Image::<u8, 3>::new(
            ImageSize {
                width: 10,
                height: 20,
            },
            vec![0u8; 10 * 20 * 3],
        )?;
        assert_eq!(image.size().width, 10);
        assert_eq!(image.size().height, 20);
        assert_eq!(image.num_channels(), 3);
        assert_eq!(image.sample_type(), SampleType::U8);

        Ok(())
    }

    #[test]
    fn image_wrong_length() {
        let res = Image::<f32, 3>::new(
            ImageSize {
                width: 2,
                height: 2,
            },
            vec![0.0; 11],
        );
        assert_eq!(res, Err(ImageError::InvalidChannelShape(11, 12)));
    }

    #[test]
    fn image_layout() -> Result<(), ImageError> {
        let image = Image::<u8, 2>::new(
            ImageSize {
                width: 2,
                height: 2,
            },
            vec![0, 1, 2, 3, 4, 5, 6, 7],
        )?;
        assert_eq!(image.pixel(1, 0)?, &[2, 3]);
        assert_eq!(image.pixel(0, 1)?, &[4, 5]);
        assert_eq!(*image.get_pixel(1, 1, 1)?, 7);
        assert!(image.pixel(2, 0).is_err());
        assert_eq!(
            image.get_pixel(0, 0, 2),
            Err(ImageError::ChannelIndexOutOfBounds(2, 2))
        );

        Ok(())
    }

    #[test]
    fn image_set_pixel() -> Result<(), ImageError> {
        let mut image = Image::<f32, 1>::from_size_val([3, 2].into(), 0.0)?;
        image.set_pixel(2, 1, 0, 4.0)?;
        assert_eq!(image.as_slice()[5], 4.0);
        assert!(image.set_pixel(3, 0, 0, 1.0).is_err());

        Ok(())
    }

    #[test]
    fn image_cast() -> Result<(), ImageError> {
        let image_u8 = Image::<u8, 3>::new(
            ImageSize {
                height: 2,
                width: 1,
            },
            vec![0, 1, 2, 3, 4, 5],
        )?;
        let image_f32: Image<f32, 3> = image_u8.cast()?;
        assert_eq!(*image_f32.get_pixel(0, 1, 2)?, 5.0);
        assert_eq!(image_f32.sample_type(), SampleType::F32);

        let negative = Image::<f32, 1>::new([1, 1].into(), vec![-1.0])?;
        assert!(negative.cast::<u8>().is_err());

        Ok(())
    }

    #[test]
    fn image_channel() -> Result<(), ImageError> {
        let image = Image::<f32, 3>::new(
            ImageSize {
                height: 2,
                width: 1,
            },
            vec![0., 1., 2., 3., 4., 5.],
        )?;

        let channel = image.channel(2)?;
        assert_eq!(channel.as_slice(), &[2.0, 5.0]);
        assert!(image.channel(3).is_err());

        Ok(())
    }

    #[test]
    fn dtype_round_trip() {
        assert_eq!(u8::from_f64(254.6), 255);
        assert_eq!(u8::from_f64(300.0), 255);
        assert_eq!(u8::from_f64(-3.0), 0);
        assert_eq!(u16::from_f64(1000.4), 1000);
        assert_eq!(f32::from_f64(0.25), 0.25f32);
        assert_eq!(200u8.as_f64(), 200.0);
        assert!(SampleType::U16.is_integer());
        assert!(!SampleType::F64.is_integer());
    }
}
