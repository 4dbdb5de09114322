//! Naming helpers shared by the resolvers

/// File name component of an executable path, accepting either separator.
///
/// Returns an empty string for an empty path.
pub fn process_name_from_path(path: &str) -> String {
    path.rsplit(['\\', '/']).next().unwrap_or_default().to_string()
}

/// Human-facing app name: product name, then file description, then the
/// process name without its extension.
pub fn display_name(product: Option<&str>, description: Option<&str>, process_name: &str) -> String {
    [product, description]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| strip_extension(process_name).to_string())
}

fn strip_extension(process_name: &str) -> &str {
    match process_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.eq_ignore_ascii_case("exe") => stem,
        _ => process_name,
    }
}
