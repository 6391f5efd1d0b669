use std::path::Path;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Cannot access {}: {}", .path.display(), .source)]
    Io { path: PathBuf, source: std::io::Error },
    #[error("Card {0} is not in the database")]
    NotFound(String),
    #[error("Artwork {url} is unavailable: {reason}")]
    AssetUnavailable { url: String, reason: String },
    #[error("Card {id} has a malformed pendulum description: {reason}")]
    MalformedDescription { id: u32, reason: &'static str },
    #[error("Something wrong when query card database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{} is not a usable font", .0.display())]
    InvalidFont(PathBuf),
    #[error("Something wrong when process image: {0}")]
    Image(#[from] image::ImageError),
}

/// Wrap an io error with the path it happened on.
pub fn map_io_error<P: AsRef<Path>>(path: P) -> impl FnOnce(std::io::Error) -> Error {
    let path = path.as_ref().to_path_buf();
    move |source| Error::Io { path, source }
}

/// Image errors raised by a missing file are io errors of that file.
pub fn map_image_error<P: AsRef<Path>>(path: P) -> impl FnOnce(image::ImageError) -> Error {
    let path = path.as_ref().to_path_buf();
    move |err| match err {
        image::ImageError::IoError(source) => Error::Io { path, source },
        err => Error::Image(err)
    }
}
