//! Path, time, identifier and sample conversion helpers.

use chrono::{Local, SecondsFormat};

/// Join two store paths with exactly one `/` between them.
///
/// An empty `child` returns `parent` unchanged (with a trailing `/` trimmed,
/// except for the root).
pub fn merge_paths(parent: &str, child: &str) -> String {
    let parent = parent.trim_end_matches('/');
    let child = child.trim_start_matches('/');
    match (parent.is_empty(), child.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{child}"),
        (false, true) => parent.to_string(),
        (false, false) => format!("{parent}/{child}"),
    }
}

/// Absolute form of a store path without duplicate or trailing slashes.
pub fn normalize_path(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    if parts.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", parts.join("/"))
    }
}

/// Last component of a store path.
pub fn path_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Parent of a store path; the root is its own parent.
pub fn parent_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(i) => trimmed[..i].to_string(),
    }
}

/// Current local time in ISO 8601 with offset, e.g. `2024-05-01T10:00:00.000000+02:00`.
pub fn current_time() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// A random (version 4) UUID string.
pub fn generate_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Scale samples by `1 / bit_volts` and round them to 16-bit counts,
/// saturating at `±i16::MAX`.
pub fn transform_to_i16(bit_volts: f32, data: &[f32]) -> Vec<i16> {
    let scale = 1.0 / (f64::from(i16::MAX) * f64::from(bit_volts));
    data.iter()
        .map(|&value| {
            let scaled = (f64::from(value) * scale).clamp(-1.0, 1.0);
            (scaled * f64::from(i16::MAX)).round() as i16
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_to_i16_scales_and_saturates() {
        assert_eq!(transform_to_i16(0.5, &[0.0, 1.0, -2.5]), vec![0, 2, -5]);
        assert_eq!(transform_to_i16(1.0, &[1e6, -1e6]), vec![i16::MAX, -i16::MAX]);
    }

    #[test]
    fn merge_paths_normalizes_slashes() {
        assert_eq!(merge_paths("/", "acquisition"), "/acquisition");
        assert_eq!(merge_paths("/acquisition/", "/es"), "/acquisition/es");
        assert_eq!(merge_paths("/acquisition", ""), "/acquisition");
        assert_eq!(merge_paths("", ""), "/");
        assert_eq!(merge_paths("/", ""), "/");
    }

    #[test]
    fn normalize_paths() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("a//b/"), "/a/b");
        assert_eq!(normalize_path("/a/b"), "/a/b");
    }

    #[test]
    fn path_components() {
        assert_eq!(path_name("/general/devices/array"), "array");
        assert_eq!(path_name("/"), "");
        assert_eq!(parent_path("/general/devices"), "/general");
        assert_eq!(parent_path("/general"), "/");
        assert_eq!(parent_path("/"), "/");
    }

    #[test]
    fn uuids_are_unique() {
        let a = generate_uuid();
        assert_eq!(a.len(), 36);
        assert_ne!(a, generate_uuid());
    }

    #[test]
    fn current_time_is_rfc3339() {
        let now = current_time();
        assert!(chrono::DateTime::parse_from_rfc3339(&now).is_ok());
    }
}
