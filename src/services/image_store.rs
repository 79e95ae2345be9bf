//! On-disk storage for recipe images.
//!
//! Each recipe has at most one image, stored flat beneath `base_path` as
//! `{recipe_id}.jpeg` and exposed to clients under `/images/{file}`.

use bson::oid::ObjectId;
use bytes::Bytes;
use futures::{Stream, StreamExt, pin_mut};
use std::{
    io::{self, ErrorKind},
    path::PathBuf,
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

pub const IMAGE_ROUTE_PREFIX: &str = "/images";
const IMAGE_EXTENSION: &str = "jpeg";

#[derive(Clone, Debug)]
pub struct ImageStore {
    /// Directory holding image payloads.
    pub base_path: PathBuf,
}

impl ImageStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn file_name(id: &ObjectId) -> String {
        format!("{}.{}", id.to_hex(), IMAGE_EXTENSION)
    }

    /// Public path stored in `Recipe::image`.
    pub fn public_path(id: &ObjectId) -> String {
        format!("{}/{}", IMAGE_ROUTE_PREFIX, Self::file_name(id))
    }

    /// Only names this store could have produced resolve to a path, which
    /// rules out traversal through the `/images/{file}` route.
    fn resolve(&self, file_name: &str) -> Option<PathBuf> {
        let stem = file_name.strip_suffix(&format!(".{}", IMAGE_EXTENSION))?;
        let id = ObjectId::parse_str(stem).ok()?;
        Some(self.base_path.join(Self::file_name(&id)))
    }

    /// Stream an image to disk, replacing any previous image for `id`.
    ///
    /// Bytes go to a temporary file that is fsynced and then renamed into
    /// place. Returns the number of bytes written; the temp file is removed on
    /// any error.
    pub async fn save_stream<S>(&self, id: &ObjectId, stream: S) -> io::Result<u64>
    where
        S: Stream<Item = io::Result<Bytes>>,
    {
        fs::create_dir_all(&self.base_path).await?;
        let file_path = self.base_path.join(Self::file_name(id));
        let tmp_path = self.base_path.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;

        let mut size_bytes: u64 = 0;
        pin_mut!(stream);
        while let Some(chunk_res) = stream.next().await {
            let chunk = match chunk_res {
                Ok(chunk) => chunk,
                Err(err) => {
                    let _ = fs::remove_file(&tmp_path).await;
                    return Err(err);
                }
            };
            size_bytes += chunk.len() as u64;
            if let Err(err) = file.write_all(&chunk).await {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(err);
            }
        }
        if let Err(err) = file.flush().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err);
        }
        if let Err(err) = file.sync_all().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err);
        }
        drop(file);

        if size_bytes == 0 {
            let _ = fs::remove_file(&tmp_path).await;
            return Ok(0);
        }

        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(&file_path).await?;
                fs::rename(&tmp_path, &file_path).await?;
            } else {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(err);
            }
        }

        debug!("stored image {} ({} bytes)", file_path.display(), size_bytes);
        Ok(size_bytes)
    }

    /// Open a stored image for streaming. Unknown or malformed names are
    /// reported as `NotFound`.
    pub async fn open(&self, file_name: &str) -> io::Result<(File, u64)> {
        let path = self
            .resolve(file_name)
            .ok_or_else(|| io::Error::new(ErrorKind::NotFound, "image not found"))?;
        let file = File::open(&path).await?;
        let len = file.metadata().await?.len();
        Ok((file, len))
    }

    /// Best-effort removal, used when the owning recipe is deleted.
    pub async fn remove(&self, id: &ObjectId) {
        let path = self.base_path.join(Self::file_name(id));
        match fs::remove_file(&path).await {
            Ok(_) => debug!("removed image {}", path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => debug!("failed to remove image {}: {}", path.display(), err),
        }
    }
}
