use std::io;
use std::path::PathBuf;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("failed to read scene {path}: {source}")]
    SceneIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed scene: {0}")]
    SceneParse(#[from] serde_json::Error),
    #[error("object transform is singular and cannot be inverted")]
    SingularTransform,
    #[error("script: {0}")]
    Script(String),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("video encoder unavailable: {0}")]
    Encoder(String),
    #[error("asynchronous writer terminated")]
    WriterClosed,
}
