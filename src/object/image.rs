//! Raster images.
//!
//! Images are written as image XObjects. JPEG data is embedded as is, every
//! other image is decoded into 8 or 16 bit samples and compressed, with its
//! alpha channel (if any) split off into a soft mask.

use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use image::{DynamicImage, ImageFormat};
use pdf_writer::{Chunk, Finish, Name, Ref};
use zune_jpeg::JpegDecoder;

use crate::error::{CanvasError, CanvasResult};
use crate::object::{Cacheable, ChunkContainerFn};
use crate::serialize::SerializeContext;
use crate::stream::FilterStreamBuilder;
use crate::util::{hash128, Prehashed};

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
enum BitsPerComponent {
    Eight,
    Sixteen,
}

impl BitsPerComponent {
    fn as_i32(&self) -> i32 {
        match self {
            BitsPerComponent::Eight => 8,
            BitsPerComponent::Sixteen => 16,
        }
    }
}

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
enum ImageColorSpace {
    Luma,
    Rgb,
    Cmyk,
}

impl ImageColorSpace {
    fn to_pdf_name(self) -> Name<'static> {
        match self {
            ImageColorSpace::Luma => Name(b"DeviceGray"),
            ImageColorSpace::Rgb => Name(b"DeviceRGB"),
            ImageColorSpace::Cmyk => Name(b"DeviceCMYK"),
        }
    }
}

struct Repr {
    /// The hash of the data the image was created from.
    source_hash: u128,
    width: u32,
    height: u32,
    image_data: Vec<u8>,
    is_dct_encoded: bool,
    mask_data: Option<Vec<u8>>,
    bits_per_component: BitsPerComponent,
    color_space: ImageColorSpace,
}

impl Hash for Repr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source_hash.hash(state);
    }
}

/// A raster image.
///
/// Two images created from the same bytes are equal and are only embedded
/// once per document. Cloning this type is cheap.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct Image(Arc<Prehashed<Repr>>);

impl Image {
    fn new(repr: Repr) -> Self {
        Self(Arc::new(Prehashed::new(repr)))
    }

    /// Create a new image from PNG data.
    pub fn from_png(data: &[u8]) -> CanvasResult<Self> {
        let decoded = image::load_from_memory_with_format(data, ImageFormat::Png)
            .map_err(|e| CanvasError::Image(format!("failed to decode PNG: {}", e)))?;

        let (width, height) = (decoded.width(), decoded.height());

        let (image_data, mask_data, color_space, bits_per_component) = match decoded {
            DynamicImage::ImageLuma8(i) => {
                let (data, mask) = handle_u8_image(i.into_raw(), 1, false);
                (data, mask, ImageColorSpace::Luma, BitsPerComponent::Eight)
            }
            DynamicImage::ImageLumaA8(i) => {
                let (data, mask) = handle_u8_image(i.into_raw(), 2, true);
                (data, mask, ImageColorSpace::Luma, BitsPerComponent::Eight)
            }
            DynamicImage::ImageRgb8(i) => {
                let (data, mask) = handle_u8_image(i.into_raw(), 3, false);
                (data, mask, ImageColorSpace::Rgb, BitsPerComponent::Eight)
            }
            DynamicImage::ImageRgba8(i) => {
                let (data, mask) = handle_u8_image(i.into_raw(), 4, true);
                (data, mask, ImageColorSpace::Rgb, BitsPerComponent::Eight)
            }
            DynamicImage::ImageLuma16(i) => {
                let (data, mask) = handle_u16_image(i.into_raw(), 1, false);
                (data, mask, ImageColorSpace::Luma, BitsPerComponent::Sixteen)
            }
            DynamicImage::ImageLumaA16(i) => {
                let (data, mask) = handle_u16_image(i.into_raw(), 2, true);
                (data, mask, ImageColorSpace::Luma, BitsPerComponent::Sixteen)
            }
            DynamicImage::ImageRgb16(i) => {
                let (data, mask) = handle_u16_image(i.into_raw(), 3, false);
                (data, mask, ImageColorSpace::Rgb, BitsPerComponent::Sixteen)
            }
            DynamicImage::ImageRgba16(i) => {
                let (data, mask) = handle_u16_image(i.into_raw(), 4, true);
                (data, mask, ImageColorSpace::Rgb, BitsPerComponent::Sixteen)
            }
            other => {
                let (data, mask) = handle_u8_image(other.to_rgba8().into_raw(), 4, true);
                (data, mask, ImageColorSpace::Rgb, BitsPerComponent::Eight)
            }
        };

        Ok(Self::new(Repr {
            source_hash: hash128(data),
            width,
            height,
            image_data,
            is_dct_encoded: false,
            mask_data,
            bits_per_component,
            color_space,
        }))
    }

    /// Create a new image from JPEG data. The data is embedded without being
    /// re-encoded.
    pub fn from_jpeg(data: &[u8]) -> CanvasResult<Self> {
        let mut decoder = JpegDecoder::new(data);
        decoder
            .decode_headers()
            .map_err(|e| CanvasError::Image(format!("failed to decode JPEG: {:?}", e)))?;

        let info = decoder
            .info()
            .ok_or_else(|| CanvasError::Image("JPEG has no image info".to_string()))?;

        let color_space = match info.components {
            1 => ImageColorSpace::Luma,
            3 => ImageColorSpace::Rgb,
            4 => ImageColorSpace::Cmyk,
            n => {
                return Err(CanvasError::Image(format!(
                    "JPEG with {} components is not supported",
                    n
                )))
            }
        };

        Ok(Self::new(Repr {
            source_hash: hash128(data),
            width: info.width as u32,
            height: info.height as u32,
            image_data: data.to_vec(),
            is_dct_encoded: true,
            mask_data: None,
            bits_per_component: BitsPerComponent::Eight,
            color_space,
        }))
    }

    /// Create a new image from straight (not premultiplied) RGBA pixels, row
    /// by row from the top.
    pub fn from_rgba8(width: u32, height: u32, pixels: &[u8]) -> CanvasResult<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(CanvasError::Image(format!(
                "expected {} bytes for a {}x{} image, got {}",
                expected,
                width,
                height,
                pixels.len()
            )));
        }

        let (image_data, mask_data) = handle_u8_image(pixels.to_vec(), 4, true);

        Ok(Self::new(Repr {
            source_hash: hash128(&(width, height, pixels)),
            width,
            height,
            image_data,
            is_dct_encoded: false,
            mask_data,
            bits_per_component: BitsPerComponent::Eight,
            color_space: ImageColorSpace::Rgb,
        }))
    }

    /// The size of the image in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.0.width, self.0.height)
    }

    /// Whether the image has a soft mask.
    pub fn has_alpha(&self) -> bool {
        self.0.mask_data.is_some()
    }
}

impl Debug for Image {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Image {{ {}x{} }}", self.0.width, self.0.height)
    }
}

impl Cacheable for Image {
    fn chunk_container(&self) -> ChunkContainerFn {
        |cc| &mut cc.images
    }

    fn serialize(self, sc: &mut SerializeContext, root_ref: Ref) -> Chunk {
        let mut chunk = Chunk::new();
        let settings = sc.serialize_settings();

        let soft_mask = self.0.mask_data.as_ref().map(|mask_data| {
            let soft_mask_ref = sc.new_ref();
            let mask_stream = FilterStreamBuilder::new_from_binary_data(mask_data).finish(&settings);
            let mut s_mask = chunk.image_xobject(soft_mask_ref, mask_stream.encoded_data());
            mask_stream.write_filters(&mut s_mask);
            s_mask.width(self.0.width as i32);
            s_mask.height(self.0.height as i32);
            // Soft masks are always in DeviceGray.
            s_mask.pair(Name(b"ColorSpace"), ImageColorSpace::Luma.to_pdf_name());
            s_mask.bits_per_component(self.0.bits_per_component.as_i32());
            s_mask.finish();

            soft_mask_ref
        });

        let image_stream = if self.0.is_dct_encoded {
            FilterStreamBuilder::new_from_jpeg_data(&self.0.image_data)
        } else {
            FilterStreamBuilder::new_from_binary_data(&self.0.image_data)
        }
        .finish(&settings);

        let mut image_x_object = chunk.image_xobject(root_ref, image_stream.encoded_data());
        image_stream.write_filters(&mut image_x_object);
        image_x_object.width(self.0.width as i32);
        image_x_object.height(self.0.height as i32);
        image_x_object.pair(Name(b"ColorSpace"), self.0.color_space.to_pdf_name());
        image_x_object.bits_per_component(self.0.bits_per_component.as_i32());
        if let Some(soft_mask_ref) = soft_mask {
            image_x_object.s_mask(soft_mask_ref);
        }
        image_x_object.finish();

        chunk
    }
}

/// Split interleaved samples into color samples and alpha samples. The mask
/// is dropped if every pixel is opaque.
fn handle_u8_image(data: Vec<u8>, channels: usize, has_alpha: bool) -> (Vec<u8>, Option<Vec<u8>>) {
    if !has_alpha {
        return (data, None);
    }

    let mut alphas = Vec::with_capacity(data.len() / channels);
    let mut colors = Vec::with_capacity(data.len() - data.len() / channels);

    for pixel in data.chunks_exact(channels) {
        colors.extend_from_slice(&pixel[..channels - 1]);
        alphas.push(pixel[channels - 1]);
    }

    let mask = if alphas.iter().all(|a| *a == u8::MAX) {
        None
    } else {
        Some(alphas)
    };

    (colors, mask)
}

/// Like [`handle_u8_image`], but for 16 bit samples, which are written in big
/// endian.
fn handle_u16_image(
    data: Vec<u16>,
    channels: usize,
    has_alpha: bool,
) -> (Vec<u8>, Option<Vec<u8>>) {
    if !has_alpha {
        return (data.iter().flat_map(|s| s.to_be_bytes()).collect(), None);
    }

    let mut alphas = vec![];
    let mut colors = vec![];
    let mut opaque = true;

    for pixel in data.chunks_exact(channels) {
        colors.extend(pixel[..channels - 1].iter().flat_map(|s| s.to_be_bytes()));
        let alpha = pixel[channels - 1];
        opaque &= alpha == u16::MAX;
        alphas.extend(alpha.to_be_bytes());
    }

    (colors, if opaque { None } else { Some(alphas) })
}

#[cfg(test)]
mod tests {
    use crate::object::image::{handle_u16_image, handle_u8_image, Image};
    use crate::tests::{jpeg, png, serialize_context};

    fn serialize(image: Image) -> String {
        let mut sc = serialize_context();
        sc.register_cacheable(image);
        sc.chunk_container()
            .images
            .iter()
            .map(|c| String::from_utf8_lossy(c.as_bytes()).to_string())
            .collect()
    }

    #[test]
    fn split_alpha() {
        let (colors, mask) = handle_u8_image(vec![1, 2, 3, 4, 5, 6, 7, 8], 4, true);
        assert_eq!(colors, vec![1, 2, 3, 5, 6, 7]);
        assert_eq!(mask, Some(vec![4, 8]));
    }

    #[test]
    fn opaque_alpha_is_dropped() {
        let (colors, mask) = handle_u8_image(vec![9, 255, 10, 255], 2, true);
        assert_eq!(colors, vec![9, 10]);
        assert_eq!(mask, None);
    }

    #[test]
    fn sixteen_bit_is_big_endian() {
        let (colors, mask) = handle_u16_image(vec![0x0102, 0x0304], 2, true);
        assert_eq!(colors, vec![1, 2]);
        assert_eq!(mask, Some(vec![3, 4]));
    }

    #[test]
    fn png_with_alpha() {
        let image = Image::from_png(&png(3, 2, 128)).unwrap();
        assert_eq!(image.size(), (3, 2));
        assert!(image.has_alpha());

        let written = serialize(image);
        assert!(written.contains("/SMask"));
        assert!(written.contains("/ColorSpace /DeviceGray"));
        assert!(written.contains("/ColorSpace /DeviceRGB"));
        assert!(written.contains("/Filter /FlateDecode"));
    }

    #[test]
    fn opaque_png() {
        let image = Image::from_png(&png(2, 2, 255)).unwrap();
        assert!(!image.has_alpha());
        assert!(!serialize(image).contains("/SMask"));
    }

    #[test]
    fn jpeg_is_passed_through() {
        let data = jpeg(4, 3);
        let image = Image::from_jpeg(&data).unwrap();
        assert_eq!(image.size(), (4, 3));

        let written = serialize(image);
        assert!(written.contains("/Filter /DCTDecode"));
        assert!(written.contains("/ColorSpace /DeviceRGB"));
    }

    #[test]
    fn invalid_data() {
        assert!(Image::from_png(b"not a png").is_err());
        assert!(Image::from_jpeg(b"not a jpeg").is_err());
        assert!(Image::from_rgba8(2, 2, &[0; 15]).is_err());
    }

    #[test]
    fn same_bytes_same_image() {
        let data = png(2, 2, 10);
        assert_eq!(Image::from_png(&data).unwrap(), Image::from_png(&data).unwrap());
        assert_ne!(
            Image::from_png(&data).unwrap(),
            Image::from_png(&png(2, 2, 11)).unwrap()
        );
    }

    #[test]
    fn rgba8() {
        let image = Image::from_rgba8(1, 2, &[255, 0, 0, 255, 0, 255, 0, 0]).unwrap();
        assert_eq!(image.size(), (1, 2));
        assert!(image.has_alpha());
    }
}
