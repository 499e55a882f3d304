use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use log::{debug, warn};
use tokio::io::AsyncWriteExt;

use crate::error::CardError;

/// Proxy endpoint serving rendered property cards; the parcel id is
/// appended to form the document URL.
pub const CARD_ENDPOINT: &str = "https://maps.indy.gov/AssessorPropertyCards/handler/proxy.ashx?https%3A//maps.indy.gov/AssessorPropertyCards.Reports.Service/Service.svc/PropertyCard/";

/// The upstream service occasionally stalls; without a timeout a single
/// hung request can wedge a worker for the rest of the run.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Transient failures get one more attempt before the parcel is given up.
pub const FETCH_RETRIES: u32 = 1;

/// A fetched document on disk, removed when dropped.
///
/// Extraction happens while the guard is alive; whatever the outcome, the
/// file is gone afterwards so a batch of thousands of parcels never grows
/// the scratch directory.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!("failed to remove scratch file {}: {e}", self.path.display());
            }
        }
    }
}

/// Retrieves one raw property-card document per parcel id.
pub struct DocumentFetcher {
    client: reqwest::Client,
    scratch_dir: PathBuf,
}

impl DocumentFetcher {
    pub fn new(scratch_dir: &Path) -> Result<Self, CardError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(DocumentFetcher {
            client,
            scratch_dir: scratch_dir.to_path_buf(),
        })
    }

    /// Document URL for one parcel.
    pub fn card_url(parcel_id: &str) -> String {
        format!("{CARD_ENDPOINT}{parcel_id}")
    }

    /// Fetch the card for `parcel_id` into the scratch directory,
    /// retrying once on transient failure.
    pub async fn fetch_card(&self, parcel_id: &str) -> Result<ScratchFile, CardError> {
        let mut attempt = 0;
        loop {
            match self.try_fetch(parcel_id).await {
                Ok(file) => return Ok(file),
                Err(err @ CardError::Fetch { .. }) if attempt < FETCH_RETRIES => {
                    attempt += 1;
                    warn!("parcel {parcel_id}: fetch failed ({err}), retry {attempt}/{FETCH_RETRIES}");
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_fetch(&self, parcel_id: &str) -> Result<ScratchFile, CardError> {
        let url = Self::card_url(parcel_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| CardError::Fetch {
                parcel: parcel_id.to_string(),
                source,
            })?;

        let path = self.scratch_dir.join(format!("{parcel_id}.pdf"));
        // Guard created before writing so a partial body is cleaned up too.
        let scratch = ScratchFile { path: path.clone() };

        let mut file = tokio::fs::File::create(&path).await?;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|source| CardError::Fetch {
                parcel: parcel_id.to_string(),
                source,
            })?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        Ok(scratch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_url_embeds_parcel_id() {
        let url = DocumentFetcher::card_url("1018233");
        assert!(url.ends_with("/PropertyCard/1018233"));
        assert!(url.starts_with("https://maps.indy.gov/"));
    }

    #[test]
    fn scratch_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1018233.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let scratch = ScratchFile { path: path.clone() };
        assert!(path.exists());
        drop(scratch);
        assert!(!path.exists());
    }
}
