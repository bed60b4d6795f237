//! Finished content streams and the filters applied to PDF streams.

use std::borrow::Cow;

use pdf_writer::Name;

use crate::resource::ResourceDictionary;
use crate::serialize::SerializeSettings;

/// A finished content stream together with the resources it references.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Stream {
    pub(crate) content: Vec<u8>,
    pub(crate) resource_dictionary: ResourceDictionary,
}

impl Stream {
    pub(crate) fn new(content: Vec<u8>, resource_dictionary: ResourceDictionary) -> Self {
        Self {
            content,
            resource_dictionary,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// A PDF stream filter.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum StreamFilter {
    Flate,
    AsciiHex,
    Dct,
}

impl StreamFilter {
    fn to_name(self) -> Name<'static> {
        match self {
            Self::Flate => Name(b"FlateDecode"),
            Self::AsciiHex => Name(b"ASCIIHexDecode"),
            Self::Dct => Name(b"DCTDecode"),
        }
    }

    fn is_binary(&self) -> bool {
        match self {
            StreamFilter::Flate => true,
            StreamFilter::AsciiHex => false,
            StreamFilter::Dct => true,
        }
    }

    fn apply(&self, content: &[u8]) -> Vec<u8> {
        match self {
            StreamFilter::Flate => deflate_encode(content),
            StreamFilter::AsciiHex => hex_encode(content),
            // JPEG data is passed through as is and never encoded by us.
            StreamFilter::Dct => content.to_vec(),
        }
    }
}

/// Builds the encoded data of a stream, keeping track of the filters that
/// need to be listed in the stream dictionary.
pub(crate) struct FilterStreamBuilder<'a> {
    content: Cow<'a, [u8]>,
    filters: Vec<StreamFilter>,
}

impl<'a> FilterStreamBuilder<'a> {
    fn empty(content: &'a [u8]) -> Self {
        Self {
            content: Cow::Borrowed(content),
            filters: vec![],
        }
    }

    pub(crate) fn new_from_content_stream(
        content: &'a [u8],
        serialize_settings: &SerializeSettings,
    ) -> Self {
        let mut filter_stream = Self::empty(content);

        if serialize_settings.compress_content_streams {
            filter_stream.add_filter(StreamFilter::Flate);
        }

        filter_stream
    }

    pub(crate) fn new_from_binary_data(content: &'a [u8]) -> Self {
        let mut filter_stream = Self::empty(content);
        filter_stream.add_filter(StreamFilter::Flate);

        filter_stream
    }

    #[cfg(feature = "raster-images")]
    pub(crate) fn new_from_jpeg_data(content: &'a [u8]) -> Self {
        let mut filter_stream = Self::empty(content);
        // JPEG data already is DCT encoded.
        filter_stream.filters.push(StreamFilter::Dct);

        filter_stream
    }

    pub(crate) fn finish(mut self, serialize_settings: &SerializeSettings) -> FilterStream<'a> {
        let is_binary = self.filters.last().is_some_and(|f| f.is_binary());

        if serialize_settings.ascii_compatible && is_binary {
            self.add_filter(StreamFilter::AsciiHex);
        }

        FilterStream {
            content: self.content,
            filters: self.filters,
        }
    }

    fn add_filter(&mut self, filter: StreamFilter) {
        self.content = Cow::Owned(filter.apply(&self.content));
        self.filters.push(filter);
    }
}

/// The encoded data of a stream and the filters that decode it.
pub(crate) struct FilterStream<'a> {
    content: Cow<'a, [u8]>,
    filters: Vec<StreamFilter>,
}

impl FilterStream<'_> {
    pub(crate) fn encoded_data(&self) -> &[u8] {
        &self.content
    }

    pub(crate) fn write_filters(&self, stream: &mut pdf_writer::Stream<'_>) {
        match self.filters.as_slice() {
            [] => {}
            [filter] => {
                stream.pair(Name(b"Filter"), filter.to_name());
            }
            // The filter applied last needs to be decoded first.
            filters => {
                stream
                    .insert(Name(b"Filter"))
                    .array()
                    .items(filters.iter().rev().map(|f| f.to_name()));
            }
        }
    }
}

pub(crate) fn deflate_encode(data: &[u8]) -> Vec<u8> {
    const COMPRESSION_LEVEL: u8 = 6;
    miniz_oxide::deflate::compress_to_vec_zlib(data, COMPRESSION_LEVEL)
}

fn hex_encode(data: &[u8]) -> Vec<u8> {
    data.iter()
        .enumerate()
        .map(|(index, byte)| {
            let mut formatted = format!("{:02X}", byte);
            if index % 35 == 34 {
                formatted.push('\n');
            }
            formatted
        })
        .collect::<String>()
        .into_bytes()
}

#[cfg(test)]
mod tests {
    use miniz_oxide::inflate::decompress_to_vec_zlib;

    use crate::serialize::SerializeSettings;
    use crate::stream::{hex_encode, FilterStreamBuilder};

    #[test]
    fn content_stream_is_compressed_by_default() {
        let settings = SerializeSettings::default();
        let stream = FilterStreamBuilder::new_from_content_stream(b"0 0 m\n1 1 l\nS", &settings)
            .finish(&settings);

        let inflated = decompress_to_vec_zlib(stream.encoded_data()).unwrap();
        assert_eq!(inflated, b"0 0 m\n1 1 l\nS");
    }

    #[test]
    fn content_stream_uncompressed() {
        let settings = SerializeSettings {
            compress_content_streams: false,
            ..SerializeSettings::default()
        };
        let stream =
            FilterStreamBuilder::new_from_content_stream(b"q\nQ", &settings).finish(&settings);

        assert_eq!(stream.encoded_data(), b"q\nQ");
    }

    #[test]
    fn ascii_compatible_hex_encodes_binary_data() {
        let settings = SerializeSettings {
            ascii_compatible: true,
            ..SerializeSettings::default()
        };
        let stream = FilterStreamBuilder::new_from_binary_data(&[0, 1, 2]).finish(&settings);

        assert!(stream.encoded_data().iter().all(|b| b.is_ascii()));
    }

    #[test]
    fn hex_encode_wraps_lines() {
        let encoded = hex_encode(&[0xAB; 36]);
        assert_eq!(&encoded[..4], b"ABAB");
        assert_eq!(encoded[70], b'\n');
    }
}
