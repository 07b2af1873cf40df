use std::path::PathBuf;

/// Why a panorama could not be turned into a `SourceImage`.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("image url is empty")]
    EmptyUrl,

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("image has zero width or height")]
    EmptyImage,

    #[error("load superseded by a newer request")]
    Superseded,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible GPU adapter found")]
    NoAdapter,

    #[error("failed to request device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}
