use std::path::Path;

use dfdx::tensor::{AutoDevice, Tensor, TensorFromVec};
use image::{imageops::FilterType, io::Reader as ImageReader, DynamicImage};

use crate::error::Error;

/// CHW image tensor. Height and width depend on the transform.
pub type ImageTensor = Tensor<(usize, usize, usize), f32, AutoDevice>;

pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channels {
    Gray,
    Rgb,
}

impl Channels {
    pub fn count(self) -> usize {
        match self {
            Channels::Gray => 1,
            Channels::Rgb => 3,
        }
    }
}

/// Decode-time pipeline: resize, crop, colour conversion, scaling to
/// `[0, 1]` and per-channel normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTransform {
    resize: Option<u32>,
    center_crop: Option<u32>,
    channels: Channels,
    mean: [f32; 3],
    std: [f32; 3],
}

impl Default for ImageTransform {
    fn default() -> Self {
        Self::imagenet()
    }
}

impl ImageTransform {
    /// Resize shorter side to 256, crop 224x224, ImageNet normalization.
    pub fn office() -> Self {
        Self::imagenet().with_resize(256).with_center_crop(224)
    }

    /// ImageNet normalization at native resolution.
    pub fn imagenet() -> Self {
        Self {
            resize: None,
            center_crop: None,
            channels: Channels::Rgb,
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
        }
    }

    pub fn digits(channels: Channels) -> Self {
        Self {
            resize: None,
            center_crop: None,
            channels,
            mean: [0.5; 3],
            std: [0.5; 3],
        }
    }

    pub fn with_resize(mut self, shorter_side: u32) -> Self {
        self.resize = Some(shorter_side);
        self
    }

    pub fn with_center_crop(mut self, size: u32) -> Self {
        self.center_crop = Some(size);
        self
    }

    pub fn with_channels(mut self, channels: Channels) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_normalization(mut self, mean: [f32; 3], std: [f32; 3]) -> Self {
        self.mean = mean;
        self.std = std;
        self
    }

    pub fn channels(&self) -> Channels {
        self.channels
    }

    /// Runs the pipeline and returns CHW values with their shape.
    pub fn to_values(&self, image: DynamicImage) -> (Vec<f32>, (usize, usize, usize)) {
        let image = match self.resize {
            Some(size) => resize_shorter_side(image, size),
            None => image,
        };
        let image = match self.center_crop {
            Some(size) => center_crop(image, size),
            None => image,
        };

        let (width, height) = (image.width() as usize, image.height() as usize);
        let channels = self.channels.count();
        let raw = match self.channels {
            Channels::Rgb => image.into_rgb8().into_raw(),
            Channels::Gray => image.into_luma8().into_raw(),
        };

        // HWC bytes to normalized CHW floats
        let plane = width * height;
        let mut values = vec![0.0; channels * plane];
        for (i, &byte) in raw.iter().enumerate() {
            let c = i % channels;
            let pixel = i / channels;
            values[c * plane + pixel] = (byte as f32 / 255.0 - self.mean[c]) / self.std[c];
        }
        (values, (channels, height, width))
    }

    pub fn apply(&self, image: DynamicImage, dev: &AutoDevice) -> ImageTensor {
        let (values, shape) = self.to_values(image);
        dev.tensor_from_vec(values, shape)
    }

    pub fn load(&self, path: &Path, dev: &AutoDevice) -> Result<ImageTensor, Error> {
        let image = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| Error::DecodeImage(path.to_owned(), e))?;
        Ok(self.apply(image, dev))
    }
}

fn resize_shorter_side(image: DynamicImage, size: u32) -> DynamicImage {
    let (w, h) = (image.width(), image.height());
    if w == 0 || h == 0 {
        return image;
    }
    let (new_w, new_h) = if w <= h {
        (size, (size as u64 * h as u64 / w as u64) as u32)
    } else {
        ((size as u64 * w as u64 / h as u64) as u32, size)
    };
    image.resize_exact(new_w, new_h, FilterType::Triangle)
}

fn center_crop(image: DynamicImage, size: u32) -> DynamicImage {
    let (w, h) = (image.width(), image.height());
    let crop_w = size.min(w);
    let crop_h = size.min(h);
    let x = (w - crop_w) / 2;
    let y = (h - crop_h) / 2;
    image.crop_imm(x, y, crop_w, crop_h)
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, Luma, Rgb, RgbImage};

    use super::*;

    #[test]
    fn office_transform_yields_224_square() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(320, 240));
        let (values, shape) = ImageTransform::office().to_values(image);
        assert_eq!(shape, (3, 224, 224));
        assert_eq!(values.len(), 3 * 224 * 224);
    }

    #[test]
    fn shorter_side_resize_keeps_aspect() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(100, 50));
        let resized = resize_shorter_side(image, 20);
        assert_eq!((resized.width(), resized.height()), (40, 20));
    }

    #[test]
    fn values_are_laid_out_channel_first() {
        let mut image = RgbImage::new(2, 1);
        image.put_pixel(0, 0, Rgb([255, 0, 0]));
        image.put_pixel(1, 0, Rgb([0, 255, 0]));
        let transform = ImageTransform::imagenet().with_normalization([0.0; 3], [1.0; 3]);
        let (values, shape) = transform.to_values(DynamicImage::ImageRgb8(image));
        assert_eq!(shape, (3, 1, 2));
        assert_eq!(values, vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn digit_gray_normalizes_to_unit_range() {
        let mut image = GrayImage::new(1, 2);
        image.put_pixel(0, 0, Luma([0]));
        image.put_pixel(0, 1, Luma([255]));
        let (values, shape) =
            ImageTransform::digits(Channels::Gray).to_values(DynamicImage::ImageLuma8(image));
        assert_eq!(shape, (1, 2, 1));
        assert_eq!(values, vec![-1.0, 1.0]);
    }

    #[test]
    fn gray_source_expands_to_rgb() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 3, Luma([128])));
        let (values, shape) = ImageTransform::digits(Channels::Rgb).to_values(image);
        assert_eq!(shape, (3, 3, 3));
        assert_eq!(values.len(), 27);
    }
}
