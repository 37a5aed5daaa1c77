//! File-type classification for grid previews.
//!
//! Decides, from the file name alone, whether an entry gets a generated
//! thumbnail or a static icon.

use serde::Serialize;

/// Identifies a static icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IconId {
    Folder,
    Code,
    Text,
    Document,
    Pdf,
    Spreadsheet,
    Presentation,
    Archive,
    Font,
    Audio,
    Video,
    Image,
    Data,
    Unrecognized,
}

impl IconId {
    pub fn as_str(self) -> &'static str {
        match self {
            IconId::Folder => "folder",
            IconId::Code => "code",
            IconId::Text => "text",
            IconId::Document => "document",
            IconId::Pdf => "pdf",
            IconId::Spreadsheet => "spreadsheet",
            IconId::Presentation => "presentation",
            IconId::Archive => "archive",
            IconId::Font => "font",
            IconId::Audio => "audio",
            IconId::Video => "video",
            IconId::Image => "image",
            IconId::Data => "data",
            IconId::Unrecognized => "unrecognized",
        }
    }
}

/// How an entry is shown in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "class", content = "icon", rename_all = "snake_case")]
pub enum PreviewClass {
    StaticIcon(IconId),
    ImageThumbnail,
    VideoThumbnail,
}

impl PreviewClass {
    /// `true` for classes that go through the thumbnail pipeline.
    pub fn is_previewable(self) -> bool {
        !matches!(self, PreviewClass::StaticIcon(_))
    }
}

/// Extensions decoded directly into an image thumbnail.
const IMAGE_THUMBNAIL_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg"];

/// Extensions whose first frame becomes the thumbnail.
const VIDEO_THUMBNAIL_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "wmv"];

/// Returns the lower-cased extension of `name`, including the dot.
///
/// The extension runs from the last `.` to the end; names without a `.`
/// have an empty extension.
pub fn extension(name: &str) -> String {
    name.rfind('.')
        .map(|i| name[i..].to_lowercase())
        .unwrap_or_default()
}

/// Classifies a file by name. Total: every name gets a class.
///
/// Directories never go through this function; see [`folder_icon`].
pub fn classify(name: &str) -> PreviewClass {
    let ext = extension(name);
    let bare = ext.strip_prefix('.').unwrap_or("");

    if IMAGE_THUMBNAIL_EXTENSIONS.contains(&bare) {
        return PreviewClass::ImageThumbnail;
    }
    if VIDEO_THUMBNAIL_EXTENSIONS.contains(&bare) {
        return PreviewClass::VideoThumbnail;
    }
    PreviewClass::StaticIcon(icon_for_extension(&ext).unwrap_or(IconId::Unrecognized))
}

/// The icon every directory gets, whatever its name.
pub fn folder_icon() -> IconId {
    IconId::Folder
}

/// Icon shown for `class` before its thumbnail arrives, or if it never does.
pub fn fallback_icon(class: PreviewClass) -> IconId {
    match class {
        PreviewClass::StaticIcon(icon) => icon,
        PreviewClass::ImageThumbnail => IconId::Image,
        PreviewClass::VideoThumbnail => IconId::Video,
    }
}

fn icon_for_extension(ext: &str) -> Option<IconId> {
    let icon = match ext {
        // Programming languages & markup
        ".rs" | ".py" | ".pyw" | ".js" | ".mjs" | ".cjs" | ".ts" | ".tsx" | ".jsx" | ".go"
        | ".java" | ".kt" | ".c" | ".h" | ".cpp" | ".cc" | ".hpp" | ".cs" | ".rb" | ".php"
        | ".swift" | ".lua" | ".sh" | ".bash" | ".zsh" | ".sql" | ".html" | ".htm" | ".css"
        | ".scss" | ".vue" | ".zig" => IconId::Code,

        // Plain text
        ".txt" | ".md" | ".markdown" | ".log" | ".rst" | ".ini" | ".cfg" | ".conf" => {
            IconId::Text
        }

        // Structured data
        ".json" | ".yaml" | ".yml" | ".toml" | ".xml" | ".csv" | ".tsv" => IconId::Data,

        // Documents
        ".doc" | ".docx" | ".odt" | ".rtf" | ".pages" | ".epub" => IconId::Document,
        ".pdf" => IconId::Pdf,
        ".xls" | ".xlsx" | ".ods" | ".numbers" => IconId::Spreadsheet,
        ".ppt" | ".pptx" | ".odp" | ".key" => IconId::Presentation,

        // Archives
        ".zip" | ".tar" | ".gz" | ".tgz" | ".bz2" | ".xz" | ".7z" | ".rar" | ".zst" => {
            IconId::Archive
        }

        // Fonts
        ".ttf" | ".otf" | ".woff" | ".woff2" | ".eot" => IconId::Font,

        // Audio
        ".mp3" | ".wav" | ".flac" | ".ogg" | ".aac" | ".m4a" | ".opus" => IconId::Audio,

        // Video without a generated thumbnail
        ".avi" | ".webm" | ".flv" | ".m4v" | ".mpg" | ".mpeg" | ".3gp" => IconId::Video,

        // Images without a generated thumbnail
        ".bmp" | ".webp" | ".ico" | ".tif" | ".tiff" | ".heic" | ".psd" | ".raw" => IconId::Image,

        _ => return None,
    };
    Some(icon)
}
