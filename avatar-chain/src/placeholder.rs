//! Deterministic generated avatars, the terminal step of every chain.
//!
//! Colours are derived from a 32-bit rolling hash of the username so the same
//! name always gets the same background. The bit behaviour of [`name_hash`] is
//! fixed: changing it changes every placeholder colour.

use url::form_urlencoded;

use crate::Platform;

pub(crate) const PLACEHOLDER_BASE_URL: &str = "https://ui-avatars.com/api/";

/// `hash = (hash << 5) - hash + c` over UTF-16 code units, wrapped to `i32`,
/// then made non-negative. `i32::MIN` maps to `2^31`.
pub fn name_hash(username: &str) -> u32 {
    username
        .encode_utf16()
        .fold(0i32, |hash, unit| {
            hash.wrapping_shl(5)
                .wrapping_sub(hash)
                .wrapping_add(i32::from(unit))
        })
        .unsigned_abs()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Band {
    base: u32,
    range: u32,
}

impl Band {
    const fn new(base: u32, range: u32) -> Self {
        Self { base, range }
    }

    fn pick(&self, hash: u32) -> u32 {
        self.base + hash % self.range
    }
}

fn bands(platform: Platform) -> [Band; 3] {
    match platform {
        Platform::Facebook => [Band::new(210, 20), Band::new(55, 20), Band::new(35, 30)],
        // pink to purple
        Platform::Instagram => [Band::new(290, 60), Band::new(60, 25), Band::new(40, 25)],
        Platform::Twitter => [Band::new(195, 20), Band::new(70, 20), Band::new(40, 20)],
    }
}

/// Hue in degrees, saturation and lightness in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsl {
    pub hue: u32,
    pub saturation: u32,
    pub lightness: u32,
}

impl Hsl {
    pub fn for_username(platform: Platform, username: &str) -> Self {
        let hash = name_hash(username);
        let [hue, saturation, lightness] = bands(platform);
        Self {
            hue: hue.pick(hash),
            saturation: saturation.pick(hash),
            lightness: lightness.pick(hash),
        }
    }

    /// Lowercase `rrggbb`, no leading `#`.
    pub fn to_hex(&self) -> String {
        let h = f64::from(self.hue);
        let s = f64::from(self.saturation) / 100.0;
        let l = f64::from(self.lightness) / 100.0;
        let a = s * l.min(1.0 - l);

        let channel = |n: f64| {
            let k = (n + h / 30.0) % 12.0;
            let value = l - a * (k - 3.0).min(9.0 - k).min(1.0).max(-1.0);
            (255.0 * value).round() as u8
        };

        format!("{:02x}{:02x}{:02x}", channel(0.0), channel(8.0), channel(4.0))
    }

    pub fn text_color(&self) -> &'static str {
        if self.lightness > 50 {
            "333333"
        } else {
            "ffffff"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub url: String,
    pub background: String,
    pub text_color: &'static str,
    pub warning: String,
}

impl Placeholder {
    pub fn generate(platform: Platform, username: &str) -> Self {
        let hsl = Hsl::for_username(platform, username);
        let background = hsl.to_hex();
        let text_color = hsl.text_color();
        let name = display_name(platform, username);

        let url = placeholder_url(&[
            ("name", name.as_str()),
            ("background", background.as_str()),
            ("color", text_color),
            ("size", "256"),
            ("bold", "true"),
            ("length", "2"),
        ]);

        Self {
            url,
            background,
            text_color,
            warning: format!(
                "Could not fetch {} avatar. Using generated placeholder.",
                platform.display_name()
            ),
        }
    }
}

/// Username with separator runs collapsed to single spaces, so initials come
/// out right (`john.doe_99` -> `john doe 99`).
pub(crate) fn display_name(platform: Platform, username: &str) -> String {
    let cleaned = username
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if cleaned.is_empty() {
        platform.display_name().to_string()
    } else {
        cleaned
    }
}

pub(crate) fn placeholder_url(params: &[(&str, &str)]) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    format!("{PLACEHOLDER_BASE_URL}?{query}")
}
