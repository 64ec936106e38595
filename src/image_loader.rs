//! Image loading and placement.
//!
//! An image source is one of:
//! - a `data:` URI, whose bytes are embedded as they are;
//! - an `http`/`https`/`file` URL, or a reference relative to the configured
//!   base URL, fetched through an [`ImageFetcher`];
//! - a plain local path, also fetched through the [`ImageFetcher`].
//!
//! Fetched images are decoded and re-encoded as JPEG before embedding.
//! Placement never fails: every error becomes a one-line italic fallback
//! whose wording tells which stage went wrong.

use std::path::PathBuf;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use url::Url;

use crate::error::ImageError;
use crate::pagination::{fit_image, place_fallback, PlacementResult};
use crate::pipeline::PipelineConfig;
use crate::surface::PdfSurface;

/// Raster encoding of an [`EncodedImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormatTag {
    Jpeg,
    Png,
    Gif,
    Webp,
    Bmp,
    Unknown,
}

impl ImageFormatTag {
    pub fn from_mime(mime: &str) -> Self {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Self::Jpeg,
            "image/png" => Self::Png,
            "image/gif" => Self::Gif,
            "image/webp" => Self::Webp,
            "image/bmp" => Self::Bmp,
            _ => Self::Unknown,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
            Self::Bmp => "image/bmp",
            Self::Unknown => "application/octet-stream",
        }
    }
}

/// Image bytes ready to embed, with the decoded pixel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormatTag,
    pub px_width: u32,
    pub px_height: u32,
}

impl EncodedImage {
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime(),
            BASE64_STD.encode(&self.bytes)
        )
    }
}

/// Decoded contents of a `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Parse a `data:<mime>;base64,<data>` URI.
///
/// A malformed header is an [`ImageError::InvalidSource`]; a payload that is
/// not valid base64 is an [`ImageError::Decode`].
pub fn decode_data_uri(src: &str) -> Result<DataUri, ImageError> {
    let rest = src
        .get(..5)
        .filter(|scheme| scheme.eq_ignore_ascii_case("data:"))
        .map(|_| &src[5..])
        .ok_or_else(|| ImageError::InvalidSource("not a data URI".to_string()))?;
    let (header, payload) = rest.split_once(',').ok_or_else(|| {
        ImageError::InvalidSource("data URI is missing the `,` separator".to_string())
    })?;
    let mut parts = header.split(';');
    let mime = parts.next().unwrap_or_default().to_string();
    if !parts.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
        return Err(ImageError::InvalidSource(
            "only base64-encoded data URIs are supported".to_string(),
        ));
    }
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64_STD
        .decode(compact)
        .map_err(|e| ImageError::Decode(format!("base64: {e}")))?;
    Ok(DataUri { mime, bytes })
}

/// Where a non-embedded image lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageLocation {
    Remote(Url),
    Local(PathBuf),
}

impl std::fmt::Display for ImageLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageLocation::Remote(url) => write!(f, "{url}"),
            ImageLocation::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A source after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSource<'a> {
    Embedded(&'a str),
    Fetch(ImageLocation),
}

/// Classify `source`, joining relative references onto `base_url` when one
/// is configured. Relative references without a base are local paths.
pub fn resolve_source<'a>(
    source: &'a str,
    base_url: Option<&str>,
) -> Result<ResolvedSource<'a>, ImageError> {
    let source = source.trim();
    if source.is_empty() {
        return Err(ImageError::InvalidSource("empty image source".to_string()));
    }
    if source
        .get(..5)
        .is_some_and(|s| s.eq_ignore_ascii_case("data:"))
    {
        return Ok(ResolvedSource::Embedded(source));
    }

    let url = match Url::parse(source) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => match base_url {
            Some(base) => Url::parse(base)
                .and_then(|b| b.join(source))
                .map_err(|e| ImageError::InvalidSource(format!("{source}: {e}")))?,
            None => return Ok(ResolvedSource::Fetch(ImageLocation::Local(source.into()))),
        },
        Err(e) => return Err(ImageError::InvalidSource(format!("{source}: {e}"))),
    };

    match url.scheme() {
        "http" | "https" => Ok(ResolvedSource::Fetch(ImageLocation::Remote(url))),
        "file" => url
            .to_file_path()
            .map(|p| ResolvedSource::Fetch(ImageLocation::Local(p)))
            .map_err(|()| ImageError::InvalidSource(format!("invalid file URL {url}"))),
        other => Err(ImageError::InvalidSource(format!(
            "unsupported URL scheme `{other}`"
        ))),
    }
}

/// Retrieves the raw bytes of a non-embedded image.
#[allow(async_fn_in_trait)]
pub trait ImageFetcher {
    async fn fetch(&self, location: &ImageLocation) -> Result<Vec<u8>, ImageError>;
}

/// Fetches remote images over HTTP(S) and local ones from disk.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ImageError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ImageError::Fetch(format!("HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self, ImageError> {
        Self::new(Duration::from_secs(config.fetch_timeout_secs))
    }
}

impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, location: &ImageLocation) -> Result<Vec<u8>, ImageError> {
        match location {
            ImageLocation::Remote(url) => {
                let response = self
                    .client
                    .get(url.clone())
                    .send()
                    .await
                    .map_err(|e| ImageError::Fetch(format!("{url}: {e}")))?;
                if !response.status().is_success() {
                    return Err(ImageError::Fetch(format!(
                        "{url}: status {}",
                        response.status()
                    )));
                }
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| ImageError::Fetch(format!("{url}: {e}")))?;
                Ok(bytes.to_vec())
            }
            ImageLocation::Local(path) => tokio::fs::read(path)
                .await
                .map_err(|e| ImageError::Fetch(format!("{}: {e}", path.display()))),
        }
    }
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    image::load_from_memory(bytes).map_err(|e| ImageError::Decode(e.to_string()))
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, ImageError> {
    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
        encoder
            .encode_image(&rgb)
            .map_err(|e| ImageError::Encode(e.to_string()))?;
    }
    Ok(out)
}

/// Turn `source` into embeddable bytes.
pub async fn load_image<F: ImageFetcher + ?Sized>(
    fetcher: &F,
    source: &str,
    config: &PipelineConfig,
) -> Result<EncodedImage, ImageError> {
    match resolve_source(source, config.base_url.as_deref())? {
        ResolvedSource::Embedded(uri) => {
            let data = decode_data_uri(uri)?;
            let img = decode(&data.bytes)?;
            let format = match ImageFormatTag::from_mime(&data.mime) {
                ImageFormatTag::Unknown => image::guess_format(&data.bytes)
                    .map_or(ImageFormatTag::Unknown, |f| {
                        ImageFormatTag::from_mime(f.to_mime_type())
                    }),
                known => known,
            };
            Ok(EncodedImage {
                px_width: img.width(),
                px_height: img.height(),
                bytes: data.bytes,
                format,
            })
        }
        ResolvedSource::Fetch(location) => {
            log::debug!("Fetching image {location}");
            let bytes = fetcher.fetch(&location).await?;
            let img = decode(&bytes)?;
            Ok(EncodedImage {
                bytes: encode_jpeg(&img, config.jpeg_quality)?,
                format: ImageFormatTag::Jpeg,
                px_width: img.width(),
                px_height: img.height(),
            })
        }
    }
}

/// Load an image and place it at `(x, y)`, or place a fallback line there.
#[allow(clippy::too_many_arguments)]
pub async fn place_image<S, F>(
    surface: &mut S,
    fetcher: &F,
    source: &str,
    alt_text: &str,
    x: f32,
    y: f32,
    max_width: f32,
    config: &PipelineConfig,
) -> PlacementResult
where
    S: PdfSurface + ?Sized,
    F: ImageFetcher + ?Sized,
{
    let image = match load_image(fetcher, source, config).await {
        Ok(image) => image,
        Err(e) => {
            let message = if e.is_pre_load() {
                format!("[Image error: {alt_text}]")
            } else {
                format!("[Image not found: {alt_text}]")
            };
            log::warn!("Image '{alt_text}' replaced by fallback: {e}");
            return place_fallback(surface, &message, x, y, max_width, config);
        }
    };

    let Some((width, height)) = fit_image(
        image.px_width,
        image.px_height,
        max_width,
        config.image_scale,
        config.max_image_height,
    ) else {
        log::warn!(
            "Image '{alt_text}' has degenerate size {}x{}",
            image.px_width,
            image.px_height
        );
        let message = format!("[Image not found: {alt_text}]");
        return place_fallback(surface, &message, x, y, max_width, config);
    };

    match surface.add_image(&image, x, y, width, height) {
        Ok(()) => PlacementResult {
            height: height + config.image_spacing,
            image_size: Some((width, height)),
        },
        Err(e) => {
            log::warn!("Image '{alt_text}' replaced by fallback: {e}");
            let message = format!("[Image: {alt_text}]");
            place_fallback(surface, &message, x, y, max_width, config)
        }
    }
}
