//! # Value Codecs
//!
//! Mapping between a handler's domain value and the byte payload stored
//! under its topic. A new codec only has to implement [`ValueCodec`].

use crate::{PubKvError, Result};
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::marker::PhantomData;
use tracing::warn;

/// Structured value handled by the dict codec.
pub type DictValue = serde_json::Map<String, serde_json::Value>;

/// Conversion between a domain value and a byte payload.
///
/// `decode` is strict and reports malformed payloads. Handlers read through
/// [`ValueCodec::decode_absent`], which applies one policy for every codec:
/// a missing payload and an undecodable payload both yield `None`.
pub trait ValueCodec: Send + Sync + 'static {
    type Value: Send + 'static;

    /// Short name used in errors and logs.
    fn name(&self) -> &'static str;

    fn encode(&self, value: &Self::Value) -> Result<Bytes>;

    fn decode(&self, payload: &[u8]) -> Result<Self::Value>;

    /// Decode an optional payload, degrading every failure to `None`.
    fn decode_absent(&self, payload: Option<&[u8]>) -> Option<Self::Value> {
        let payload = payload?;
        match self.decode(payload) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(codec = self.name(), "Discarding undecodable payload: {}", e);
                None
            }
        }
    }
}

/// JSON codec for any serde type.
pub struct JsonCodec<T> {
    _value: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        Self {
            _value: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonCodec")
    }
}

impl<T> ValueCodec for JsonCodec<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    type Value = T;

    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, value: &T) -> Result<Bytes> {
        serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(|e| PubKvError::encode(self.name(), e.to_string()))
    }

    fn decode(&self, payload: &[u8]) -> Result<T> {
        serde_json::from_slice(payload).map_err(|e| PubKvError::decode(self.name(), e.to_string()))
    }
}

/// JSON object codec. Payloads that are valid JSON but not an object fail to decode.
pub type DictCodec = JsonCodec<DictValue>;

/// Identity codec for raw bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesCodec;

impl ValueCodec for BytesCodec {
    type Value = Bytes;

    fn name(&self) -> &'static str {
        "bytes"
    }

    fn encode(&self, value: &Bytes) -> Result<Bytes> {
        Ok(value.clone())
    }

    fn decode(&self, payload: &[u8]) -> Result<Bytes> {
        Ok(Bytes::copy_from_slice(payload))
    }
}

/// Compressed format written by [`ImageCodec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageEncoding {
    /// Lossless; decode(encode(img)) == img
    #[default]
    Png,
    /// Lossy, quality in 1..=100
    Jpeg { quality: u8 },
}

/// RGB pixel matrix codec.
///
/// Decoding accepts any format the image crate can sniff from the payload,
/// so a JPEG writer and a PNG writer can share a topic.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec {
    encoding: ImageEncoding,
}

impl ImageCodec {
    pub fn new(encoding: ImageEncoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> ImageEncoding {
        self.encoding
    }
}

impl ValueCodec for ImageCodec {
    type Value = RgbImage;

    fn name(&self) -> &'static str {
        "image"
    }

    fn encode(&self, value: &RgbImage) -> Result<Bytes> {
        let (width, height) = value.dimensions();
        let mut buffer = Vec::new();

        let written = match self.encoding {
            ImageEncoding::Png => PngEncoder::new(&mut buffer).write_image(
                value.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            ),
            ImageEncoding::Jpeg { quality } => JpegEncoder::new_with_quality(&mut buffer, quality)
                .write_image(value.as_raw(), width, height, ExtendedColorType::Rgb8),
        };

        written.map_err(|e| PubKvError::encode(self.name(), e.to_string()))?;
        Ok(Bytes::from(buffer))
    }

    fn decode(&self, payload: &[u8]) -> Result<RgbImage> {
        image::load_from_memory(payload)
            .map(|decoded| decoded.to_rgb8())
            .map_err(|e| PubKvError::decode(self.name(), e.to_string()))
    }
}

/// Compact binary codec for any serde type, using bincode.
pub struct BincodeCodec<T> {
    _value: PhantomData<fn() -> T>,
}

impl<T> BincodeCodec<T> {
    pub fn new() -> Self {
        Self {
            _value: PhantomData,
        }
    }
}

impl<T> Default for BincodeCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BincodeCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for BincodeCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BincodeCodec")
    }
}

impl<T> ValueCodec for BincodeCodec<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    type Value = T;

    fn name(&self) -> &'static str {
        "bincode"
    }

    fn encode(&self, value: &T) -> Result<Bytes> {
        bincode::serialize(value)
            .map(Bytes::from)
            .map_err(|e| PubKvError::encode(self.name(), e.to_string()))
    }

    fn decode(&self, payload: &[u8]) -> Result<T> {
        bincode::deserialize(payload).map_err(|e| PubKvError::decode(self.name(), e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;
    use serde_json::json;

    fn sample_image() -> RgbImage {
        RgbImage::from_fn(8, 5, |x, y| image::Rgb([(x * 30) as u8, (y * 50) as u8, 7]))
    }

    #[test]
    fn test_dict_codec_round_trip() {
        let codec = DictCodec::new();
        let mut value = DictValue::new();
        value.insert("a".to_string(), json!(1));
        value.insert("nested".to_string(), json!({"b": [1, 2, 3]}));

        let payload = codec.encode(&value).unwrap();
        assert_eq!(codec.decode(&payload).unwrap(), value);
    }

    #[test]
    fn test_dict_codec_rejects_non_object() {
        let codec = DictCodec::new();
        assert!(codec.decode(b"[1, 2, 3]").is_err());
        assert!(codec.decode(b"{not json").is_err());
    }

    #[test]
    fn test_decode_absent_policy() {
        let codec = DictCodec::new();
        assert!(codec.decode_absent(None).is_none());
        assert!(codec.decode_absent(Some(&b"{broken"[..])).is_none());
        assert_eq!(
            codec.decode_absent(Some(&br#"{"a":1}"#[..])).unwrap()["a"],
            json!(1)
        );
    }

    #[test]
    fn test_bytes_codec_is_identity() {
        let codec = BytesCodec;
        let value = Bytes::from_static(b"\x01\x02");
        assert_eq!(codec.encode(&value).unwrap(), value);
        assert_eq!(codec.decode(b"\x01\x02").unwrap(), value);
        assert_eq!(codec.decode_absent(Some(&b""[..])).unwrap(), Bytes::new());
    }

    #[test]
    fn test_png_image_round_trip_is_exact() {
        let codec = ImageCodec::default();
        let image = sample_image();

        let payload = codec.encode(&image).unwrap();
        assert_eq!(&payload[1..4], b"PNG");
        assert_eq!(codec.decode(&payload).unwrap(), image);
    }

    #[test]
    fn test_jpeg_image_keeps_dimensions() {
        let codec = ImageCodec::new(ImageEncoding::Jpeg { quality: 90 });
        let image = sample_image();

        let decoded = codec.decode(&codec.encode(&image).unwrap()).unwrap();
        assert_eq!(decoded.dimensions(), image.dimensions());
    }

    #[test]
    fn test_image_codec_rejects_garbage() {
        let codec = ImageCodec::default();
        assert!(codec.decode(b"definitely not an image").is_err());
        assert!(codec.decode_absent(Some(&b"nope"[..])).is_none());
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Reading {
        sensor: String,
        value: f64,
    }

    #[test]
    fn test_typed_codecs() {
        let reading = Reading {
            sensor: "temp".to_string(),
            value: 21.5,
        };

        let json = JsonCodec::<Reading>::new();
        assert_eq!(json.decode(&json.encode(&reading).unwrap()).unwrap(), reading);

        let binary = BincodeCodec::<Reading>::new();
        assert_eq!(
            binary.decode(&binary.encode(&reading).unwrap()).unwrap(),
            reading
        );
        assert!(binary.decode(&[0xff]).is_err());
    }

    proptest! {
        #[test]
        fn prop_bytes_round_trip(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            let codec = BytesCodec;
            let value = Bytes::from(data);
            prop_assert_eq!(codec.decode(&codec.encode(&value).unwrap()).unwrap(), value);
        }

        #[test]
        fn prop_dict_round_trip(
            entries in proptest::collection::hash_map("[a-z]{1,8}", any::<i64>(), 0..16)
        ) {
            let codec = DictCodec::new();
            let value: DictValue = entries
                .into_iter()
                .map(|(k, v)| (k, serde_json::Value::from(v)))
                .collect();
            prop_assert_eq!(codec.decode(&codec.encode(&value).unwrap()).unwrap(), value);
        }
    }
}
