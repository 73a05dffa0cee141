//! Volume filer: browse and transfer files on an app's volume.

use reqwest::Response;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

use crate::client::DryccClient;
use crate::compat::Checked;
use crate::error::Result;
use crate::pagination::Page;
use crate::time::{TimeParseError, Timestamp};

/// An entry in a volume directory listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilerDirEntry {
    /// Base name of the entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Path of the entry inside the volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Size as reported by the filer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// `file` or `dir`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub entry_type: Option<String>,

    /// Last modification time, as text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl FilerDirEntry {
    /// Check if the entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.entry_type.as_deref() == Some("dir")
    }

    /// Parse the modification time.
    ///
    /// # Errors
    ///
    /// Returns an error if the timestamp is present but unreadable.
    pub fn modified(&self) -> std::result::Result<Option<Timestamp>, TimeParseError> {
        self.timestamp.as_deref().map(Timestamp::parse).transpose()
    }
}

/// Filer endpoint of a volume.
fn client_path(app: &str, volume: &str) -> String {
    format!(
        "/v2/apps/{}/volumes/{}/client/",
        urlencoding::encode(app),
        urlencoding::encode(volume)
    )
}

/// List a directory on an app's volume.
///
/// # Arguments
///
/// * `client` - The Drycc controller client
/// * `app` - The app id
/// * `volume` - The volume name
/// * `path` - Directory inside the volume
/// * `limit` - Maximum number of entries to return
///
/// # Example
///
/// ```ignore
/// let page = list_dir(&client, "example-go", "myvolume", "tmp", 100).await?.into_inner();
/// for entry in &page {
///     println!("{:?}", entry.name);
/// }
/// ```
#[tracing::instrument(skip(client))]
pub async fn list_dir(
    client: &DryccClient,
    app: &str,
    volume: &str,
    path: &str,
    limit: u32,
) -> Result<Checked<Page<FilerDirEntry>>> {
    let endpoint = format!(
        "{}?path={}",
        client_path(app, volume),
        urlencoding::encode(path)
    );
    client.list(&endpoint, limit).await
}

/// Download a file from an app's volume.
///
/// The content is not read; stream it from the returned response.
#[tracing::instrument(skip(client))]
pub async fn get_file(
    client: &DryccClient,
    app: &str,
    volume: &str,
    path: &str,
) -> Result<Checked<Response>> {
    client
        .get(&format!("{}{}", client_path(app, volume), path))
        .await
}

/// Upload a file to a directory on an app's volume.
///
/// # Arguments
///
/// * `client` - The Drycc controller client
/// * `app` - The app id
/// * `volume` - The volume name
/// * `volume_path` - Target directory inside the volume
/// * `file_name` - Name the file gets on the volume
/// * `reader` - File content, streamed while the request is sent
#[tracing::instrument(skip(client, reader))]
pub async fn upload_file<R>(
    client: &DryccClient,
    app: &str,
    volume: &str,
    volume_path: &str,
    file_name: &str,
    reader: R,
) -> Result<Checked<Response>>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    client
        .upload(&client_path(app, volume), volume_path, file_name, reader)
        .await
}

/// Delete a file from an app's volume.
#[tracing::instrument(skip(client))]
pub async fn delete_file(
    client: &DryccClient,
    app: &str,
    volume: &str,
    path: &str,
) -> Result<Checked<Response>> {
    client
        .delete(&format!("{}{}", client_path(app, volume), path))
        .await
}
