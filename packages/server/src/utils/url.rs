use std::sync::LazyLock;

use regex::Regex;

static DELIVERY_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(image|video|raw)/(upload|private|authenticated)/")
        .expect("Valid delivery segment regex")
});

/// Strip CDN delivery segments such as `/image/upload/` from a stored URL.
///
/// Filesystem and S3 URLs never contain them and pass through unchanged.
pub fn normalize_download_url(url: &str) -> String {
    DELIVERY_SEGMENT.replace_all(url, "/").into_owned()
}
