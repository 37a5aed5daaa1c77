use dirgrid_core::fs::content::ContentEncoding;
use dirgrid_core::fs::content::epoch_millis;
use dirgrid_core::fs::classify::{classify, folder_icon};
use dirgrid_core::{EntryDescriptor, EntryKind, Listing, PreviewClass};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct RecentResponse {
    pub paths: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SelectWorkspaceRequest {
    /// `None` is a cancelled selection.
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SelectWorkspaceResponse {
    pub granted: bool,
    pub root: Option<String>,
    pub recent: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListDirQuery {
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EntryDto {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
    pub size: Option<u64>,
    #[serde(rename = "type")]
    pub mime_hint: Option<String>,
    pub last_modified: Option<u64>,
    pub preview: PreviewClass,
}

impl From<&EntryDescriptor> for EntryDto {
    fn from(entry: &EntryDescriptor) -> Self {
        let preview = if entry.is_dir() {
            PreviewClass::StaticIcon(folder_icon())
        } else {
            classify(entry.name())
        };
        Self {
            name: entry.name().to_string(),
            path: entry.relative_path().to_string(),
            kind: entry.kind(),
            size: entry.size(),
            mime_hint: entry.mime_hint().map(str::to_string),
            last_modified: entry.last_modified().map(epoch_millis),
            preview,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListDirResponse {
    pub path: String,
    pub directories: Vec<EntryDto>,
    pub files: Vec<EntryDto>,
}

impl From<&Listing> for ListDirResponse {
    fn from(listing: &Listing) -> Self {
        Self {
            path: listing.path.clone(),
            directories: listing.directories.iter().map(EntryDto::from).collect(),
            files: listing.files.iter().map(EntryDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingParam {
    #[default]
    Base64,
    Text,
}

impl From<EncodingParam> for ContentEncoding {
    fn from(param: EncodingParam) -> Self {
        match param {
            EncodingParam::Base64 => ContentEncoding::Base64,
            EncodingParam::Text => ContentEncoding::Text,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FileQuery {
    pub path: String,
    #[serde(default)]
    pub encoding: EncodingParam,
}
