pub mod chat;
pub mod commands;
pub mod preferences;
pub mod settings;

pub use chat::ChatView;
pub use commands::CommandsView;
pub use preferences::PreferencesView;
pub use settings::SettingsView;

use crate::types::ImageAttachment;
use std::path::Path;

/// Read an image file for attachment or avatar upload.
pub(crate) fn read_image(path: &str) -> Result<ImageAttachment, String> {
    let path = Path::new(path.trim());
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    let mime_type = ImageAttachment::mime_for_extension(ext);
    if !mime_type.starts_with("image/") {
        return Err(format!("{} is not a supported image", path.display()));
    }
    let data = std::fs::read(path)
        .map_err(|err| format!("Could not read {}: {err}", path.display()))?;

    let image = ImageAttachment::new(mime_type, data);
    Ok(match path.file_name().and_then(|name| name.to_str()) {
        Some(name) => image.with_file_name(name),
        None => image,
    })
}
