use mime::Mime;

use crate::Platform;

/// File extension for an image content type. Unknown or unparsable types
/// fall back to `png`.
pub fn extension_for_mime(content_type: &str) -> &'static str {
    let Ok(mime) = content_type.trim().to_ascii_lowercase().parse::<Mime>() else {
        return "png";
    };
    if mime.type_() != mime::IMAGE {
        return "png";
    }

    match mime.subtype().as_str() {
        "jpeg" | "jpg" | "pjpeg" => "jpg",
        "gif" => "gif",
        "webp" => "webp",
        "svg" if mime.suffix() == Some(mime::XML) => "svg",
        "bmp" => "bmp",
        "tiff" => "tiff",
        _ => "png",
    }
}

/// `{platform}-{username}-avatar.{ext}`
pub fn avatar_file_name(platform: Platform, username: &str, content_type: &str) -> String {
    let username: String = username
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();

    format!(
        "{platform}-{username}-avatar.{}",
        extension_for_mime(content_type)
    )
}
