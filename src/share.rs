// Share surface - hand the comic to a native share target or download it

use crate::media::{EncodedImage, ExportFile, MediaEncoder};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// File name used for both sharing and downloading
pub const COMIC_FILENAME: &str = "valentine_comic.png";

/// What gets handed to a share target
#[derive(Debug, Clone)]
pub struct ShareRequest {
    pub file: ExportFile,
    pub title: String,
    pub text: String,
}

/// A platform capability for sharing files
#[async_trait]
pub trait ShareTarget: Send + Sync {
    /// Whether this target can take the request at all
    fn can_share(&self, request: &ShareRequest) -> bool;

    async fn share(&self, request: &ShareRequest) -> Result<(), ShareError>;
}

/// Target for environments with no native sharing
#[derive(Debug, Clone, Default)]
pub struct NoNativeShare;

#[async_trait]
impl ShareTarget for NoNativeShare {
    fn can_share(&self, _request: &ShareRequest) -> bool {
        false
    }

    async fn share(&self, _request: &ShareRequest) -> Result<(), ShareError> {
        Err(ShareError::Unsupported)
    }
}

/// Shares by staging the file and passing its path to an external program
#[derive(Debug, Clone)]
pub struct CommandShareTarget {
    program: String,
    args: Vec<String>,
    staging_dir: PathBuf,
}

impl CommandShareTarget {
    /// `command` is the program followed by its leading arguments; `None` if empty
    pub fn from_command(command: &[String], staging_dir: impl Into<PathBuf>) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            staging_dir: staging_dir.into(),
        })
    }
}

#[async_trait]
impl ShareTarget for CommandShareTarget {
    fn can_share(&self, request: &ShareRequest) -> bool {
        request.file.mime_type.starts_with("image/")
    }

    async fn share(&self, request: &ShareRequest) -> Result<(), ShareError> {
        let path = write_file(&self.staging_dir, &request.file).await?;

        tracing::info!("Sharing {} via {}", path.display(), self.program);

        let status = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(&path)
            .status()
            .await
            .map_err(|e| ShareError::CommandFailed(format!("{}: {}", self.program, e)))?;

        if !status.success() {
            return Err(ShareError::CommandFailed(format!(
                "{} exited with {}",
                self.program, status
            )));
        }

        Ok(())
    }
}

/// Forced-download path: writes the file into a directory
#[derive(Debug, Clone)]
pub struct DownloadFallback {
    dir: PathBuf,
}

impl DownloadFallback {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn download(&self, file: &ExportFile) -> Result<PathBuf, ShareError> {
        write_file(&self.dir, file).await
    }
}

async fn write_file(dir: &Path, file: &ExportFile) -> Result<PathBuf, ShareError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ShareError::Io(format!("{}: {}", dir.display(), e)))?;

    let path = dir.join(&file.filename);
    tokio::fs::write(&path, &file.bytes)
        .await
        .map_err(|e| ShareError::Io(format!("{}: {}", path.display(), e)))?;

    Ok(path)
}

/// How a share action ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    /// The native target accepted the file
    Shared,
    /// The native target was tried and failed; the failure was only logged
    Abandoned,
    /// No native sharing; the file was written here instead
    Downloaded(PathBuf),
    /// There was no comic yet
    NothingToShare,
}

/// Native share with a download fallback
pub struct Sharer {
    target: Box<dyn ShareTarget>,
    fallback: DownloadFallback,
    encoder: MediaEncoder,
    title: String,
    text: String,
}

impl Sharer {
    pub fn new(
        target: Box<dyn ShareTarget>,
        fallback: DownloadFallback,
        title: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            target,
            fallback,
            encoder: MediaEncoder::new(),
            title: title.into(),
            text: text.into(),
        }
    }

    pub fn request_for(&self, image: &EncodedImage) -> ShareRequest {
        ShareRequest {
            file: self.encoder.decode_for_export(image, COMIC_FILENAME),
            title: self.title.clone(),
            text: self.text.clone(),
        }
    }

    pub async fn share(&self, image: &EncodedImage) -> Result<ShareOutcome, ShareError> {
        let request = self.request_for(image);

        if self.target.can_share(&request) {
            return match self.target.share(&request).await {
                Ok(()) => Ok(ShareOutcome::Shared),
                Err(e) => {
                    tracing::warn!("Error sharing: {}", e);
                    Ok(ShareOutcome::Abandoned)
                }
            };
        }

        let path = self.fallback.download(&request.file).await?;
        tracing::info!("Sharing unsupported, downloaded comic to {}", path.display());
        Ok(ShareOutcome::Downloaded(path))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Sharing is not supported here")]
    Unsupported,

    #[error("Share command failed: {0}")]
    CommandFailed(String),
}
