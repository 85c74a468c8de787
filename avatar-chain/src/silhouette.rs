//! Facebook default-silhouette detection.
//!
//! A denylist of markers seen on Facebook's generic "no photo" assets. It is
//! best effort: real photos can be rejected and new silhouette assets can slip
//! through.

/// Images smaller than this are assumed to be the stock silhouette.
pub const MIN_REAL_AVATAR_BYTES: u64 = 3000;

const SILHOUETTE_MARKERS: &[&str] = &[
    "s230x230",
    "p64x64",
    "p50x50",
    "rsrc.php",
    "silhouette",
    "default_avatar",
    "/static.xx.fbcdn.net/",
];

pub fn is_silhouette_url(url: &str) -> bool {
    let url = url.to_ascii_lowercase();
    SILHOUETTE_MARKERS.iter().any(|marker| url.contains(marker))
}

/// `true` when a reported size is known and too small for a real photo.
pub fn is_silhouette_size(content_length: Option<u64>) -> bool {
    content_length.is_some_and(|len| len < MIN_REAL_AVATAR_BYTES)
}
