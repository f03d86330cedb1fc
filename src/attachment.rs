//! Image attachments: decode a local image and re-encode it as base64 JPEG.

use std::io::{self, Cursor};
use std::path::Path;

use base64::{engine::general_purpose, Engine as _};
use image::{DynamicImage, ImageFormat, ImageReader};
use tracing::debug;

use crate::client::ClientError;

pub const JPEG_MIME_TYPE: &str = "image/jpeg";

/// Base64 text of a JPEG-encoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    data: String,
}

impl EncodedImage {
    /// The raw base64 payload.
    pub fn base64(&self) -> &str {
        &self.data
    }

    /// `data:image/jpeg;base64,...`, the form vision endpoints accept.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", JPEG_MIME_TYPE, self.data)
    }
}

/// Read the image at `path` and re-encode it as base64 JPEG.
///
/// The format is sniffed from the file contents, falling back to the
/// extension. Alpha channels are dropped since JPEG cannot carry them.
pub fn encode(path: impl AsRef<Path>) -> Result<EncodedImage, ClientError> {
    let path = path.as_ref();

    let reader = ImageReader::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ClientError::AttachmentNotFound(path.to_path_buf()),
        _ => decode_error(path, image::ImageError::IoError(e)),
    })?;

    let image = reader
        .with_guessed_format()
        .map_err(|e| decode_error(path, image::ImageError::IoError(e)))?
        .decode()
        .map_err(|e| decode_error(path, e))?;

    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut jpeg = Cursor::new(Vec::new());
    rgb.write_to(&mut jpeg, ImageFormat::Jpeg)
        .map_err(|e| decode_error(path, e))?;

    let bytes = jpeg.into_inner();
    debug!(
        "Encoded {} ({}x{}) as {} bytes of JPEG",
        path.display(),
        rgb.width(),
        rgb.height(),
        bytes.len()
    );

    Ok(EncodedImage {
        data: general_purpose::STANDARD.encode(&bytes),
    })
}

fn decode_error(path: &Path, source: image::ImageError) -> ClientError {
    ClientError::AttachmentDecode {
        path: path.to_path_buf(),
        source,
    }
}
