//! Upload validation gate.
//!
//! Decides whether a candidate file may reach the model store. Only the
//! name and size are inspected; the content is opaque here.

/// Extensions accepted by the gate, lowercase and without the dot.
pub const ALLOWED_EXTENSIONS: &[&str] = &["glb", "gltf"];

/// Upload ceiling. Accepted files must be strictly smaller.
pub const MAX_MODEL_SIZE: u64 = 50 * 1024 * 1024;

/// Why a candidate file was rejected. The message is shown to the user as is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationFailure {
    #[error("{}", unsupported_type_message(.extension))]
    UnsupportedType { extension: String },

    #[error("File size must be less than 50MB ({size} bytes exceeds the {limit} byte limit)")]
    TooLarge { size: u64, limit: u64 },
}

fn unsupported_type_message(extension: &str) -> String {
    let supported = ALLOWED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{}", ext))
        .collect::<Vec<_>>()
        .join(", ");

    if extension.is_empty() {
        format!("Please upload a GLB or GLTF file (file has no extension; supported types: {supported})")
    } else {
        format!("Please upload a GLB or GLTF file (.{extension} is not supported; supported types: {supported})")
    }
}

/// Extension of a file name: everything after the last `.`, lowercased.
/// Empty when the name has no `.`.
pub fn file_extension(name: &str) -> String {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Check a candidate file against the allow-list and size ceiling.
pub fn validate_model_file(name: &str, size: u64) -> Result<(), ValidationFailure> {
    let extension = file_extension(name);
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ValidationFailure::UnsupportedType { extension });
    }

    if size >= MAX_MODEL_SIZE {
        return Err(ValidationFailure::TooLarge {
            size,
            limit: MAX_MODEL_SIZE,
        });
    }

    Ok(())
}
