//! Canned policies for common third-party services

use crate::directive::DirectiveSet;
use crate::error::CspResult;
use crate::policy::ContentSecurityPolicy;

/// A fixed list of sources allowed for a directive selection.
pub type SourceBundle = &'static [(DirectiveSet, &'static [&'static str])];

/// Google Maps Embed API `<iframe>`
pub const GOOGLE_MAPS_EMBED_API: SourceBundle =
    &[(DirectiveSet::FRAME_SRC, &["https://www.google.com/"])];

/// Google Maps JavaScript API scripts and tiles
pub const GOOGLE_MAPS_JS_API: SourceBundle = &[
    (
        DirectiveSet::SCRIPT_SRC,
        &[
            "https://maps.googleapis.com",
            "https://maps.google.com",
            "https://maps.gstatic.com",
        ],
    ),
    (
        DirectiveSet::IMG_SRC,
        &[
            "data:",
            "https://maps.gstatic.com",
            "https://maps.googleapis.com",
        ],
    ),
];

/// Google Fonts stylesheets and font files
pub const GOOGLE_FONTS: SourceBundle = &[
    (DirectiveSet::STYLE_SRC, &["https://fonts.googleapis.com"]),
    (
        DirectiveSet::IMG_SRC.union(DirectiveSet::FONT_SRC),
        &["https://fonts.gstatic.com"],
    ),
];

/// Google Analytics / Tag Manager scripts, beacons and frames
pub const GOOGLE_ANALYTICS: SourceBundle = &[
    (DirectiveSet::SCRIPT_SRC, &["'self'"]),
    (
        DirectiveSet::IMG_SRC
            .union(DirectiveSet::CONNECT_SRC)
            .union(DirectiveSet::SCRIPT_SRC),
        &[
            "https://www.googletagmanager.com",
            "https://*.google-analytics.com",
            "https://ajax.googleapis.com",
        ],
    ),
    (
        DirectiveSet::IMG_SRC.union(DirectiveSet::CONNECT_SRC),
        &["https://stats.g.doubleclick.net"],
    ),
    (DirectiveSet::FRAME_SRC, &["https://*.fls.doubleclick.net"]),
    (DirectiveSet::IMG_SRC, &["https://www.google.com"]),
];

impl ContentSecurityPolicy {
    /// Allow every source of a bundle
    pub fn allow_bundle(&mut self, bundle: SourceBundle) -> CspResult<&mut Self> {
        for (flags, sources) in bundle {
            self.allow_hosts(*flags, sources.iter())?;
        }
        Ok(self)
    }

    /// Allow the Google Maps Embed API `<iframe>` source
    pub fn allow_google_maps_embed_api(&mut self) -> CspResult<&mut Self> {
        self.allow_bundle(GOOGLE_MAPS_EMBED_API)
    }

    /// Allow Google Maps JS API scripts and images
    pub fn allow_google_maps_js_api(&mut self) -> CspResult<&mut Self> {
        self.allow_bundle(GOOGLE_MAPS_JS_API)
    }

    /// Allow Google Fonts styles, images and font files
    pub fn allow_google_fonts(&mut self) -> CspResult<&mut Self> {
        self.allow_bundle(GOOGLE_FONTS)
    }

    /// Allow Google Analytics scripts, images and connections
    pub fn allow_google_analytics(&mut self) -> CspResult<&mut Self> {
        self.allow_bundle(GOOGLE_ANALYTICS)
    }
}
