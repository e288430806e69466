//! Directive registry
//!
//! Every CSP directive known to this crate has a fixed name and a fixed
//! selector bit. Selector bits are part of the public API: applications
//! persist them (configuration files, database columns), so a bit is never
//! renumbered once assigned. The gaps at `1 << 10`, `1 << 11`, `1 << 13` and
//! `1 << 14` are reserved for `script-src-attr`, `script-src-elem`,
//! `style-src-attr` and `style-src-elem`.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Selector for one or more CSP directives.
    ///
    /// Combine constants with `|` to address several directives in one call:
    ///
    /// ```
    /// use armature_csp::DirectiveSet;
    ///
    /// let scripts_and_styles = DirectiveSet::SCRIPT_SRC | DirectiveSet::STYLE_SRC;
    /// assert_eq!(scripts_and_styles.directives().count(), 2);
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DirectiveSet: u32 {
        /// `child-src`: web workers and nested browsing contexts
        const CHILD_SRC = 1;
        /// `connect-src`: URLs loaded through script interfaces
        const CONNECT_SRC = 1 << 1;
        /// `default-src`: fallback for the other fetch directives
        const DEFAULT_SRC = 1 << 2;
        /// `font-src`: fonts loaded using `@font-face`
        const FONT_SRC = 1 << 3;
        /// `frame-src`: nested browsing contexts (`<frame>`, `<iframe>`)
        const FRAME_SRC = 1 << 4;
        /// `img-src`: images and favicons
        const IMG_SRC = 1 << 5;
        /// `manifest-src`: application manifest files
        const MANIFEST_SRC = 1 << 6;
        /// `media-src`: `<audio>`, `<video>` and `<track>`
        const MEDIA_SRC = 1 << 7;
        /// `object-src`: `<object>`, `<embed>` and `<applet>`
        const OBJECT_SRC = 1 << 8;
        /// `script-src`: JavaScript, including inline handlers
        const SCRIPT_SRC = 1 << 9;
        /// `style-src`: stylesheets
        const STYLE_SRC = 1 << 12;
        /// `base-uri`: URLs usable in `<base>`
        const BASE_URI = 1 << 15;
        /// `plugin-types`: plugin MIME types
        const PLUGIN_TYPES = 1 << 16;
        /// `sandbox`: sandbox flags for the document
        const SANDBOX = 1 << 17;
        /// `form-action`: form submission targets
        const FORM_ACTION = 1 << 18;
        /// `frame-ancestors`: parents allowed to embed the page
        const FRAME_ANCESTORS = 1 << 19;
        /// `navigate-to`: navigation targets
        const NAVIGATE_TO = 1 << 20;
        /// `block-all-mixed-content`
        const BLOCK_ALL_MIXED_CONTENT = 1 << 21;
        /// `upgrade-insecure-requests`
        const UPGRADE_INSECURE_REQUESTS = 1 << 22;

        /// All fetch directives
        const FETCH = Self::CHILD_SRC.bits()
            | Self::CONNECT_SRC.bits()
            | Self::DEFAULT_SRC.bits()
            | Self::FONT_SRC.bits()
            | Self::FRAME_SRC.bits()
            | Self::IMG_SRC.bits()
            | Self::MANIFEST_SRC.bits()
            | Self::MEDIA_SRC.bits()
            | Self::OBJECT_SRC.bits()
            | Self::SCRIPT_SRC.bits()
            | Self::STYLE_SRC.bits();
        /// All document directives
        const DOCUMENT = Self::BASE_URI.bits()
            | Self::PLUGIN_TYPES.bits()
            | Self::SANDBOX.bits();
        /// All navigation directives
        const NAVIGATION = Self::FORM_ACTION.bits()
            | Self::FRAME_ANCESTORS.bits()
            | Self::NAVIGATE_TO.bits();
        /// Mixed content directives
        const OTHER = Self::BLOCK_ALL_MIXED_CONTENT.bits()
            | Self::UPGRADE_INSECURE_REQUESTS.bits();
    }
}

impl DirectiveSet {
    /// Expand the selector into the directives it addresses, in registry order.
    pub fn directives(self) -> impl Iterator<Item = Directive> {
        Directive::ALL
            .iter()
            .copied()
            .filter(move |directive| self.contains(directive.selector()))
    }

    /// Whether the selector addresses exactly one known directive.
    pub fn is_single(self) -> bool {
        self.directives().count() == 1
    }
}

impl From<Directive> for DirectiveSet {
    fn from(directive: Directive) -> Self {
        directive.selector()
    }
}

/// A CSP directive known to this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Directive {
    ChildSrc,
    ConnectSrc,
    DefaultSrc,
    FontSrc,
    FrameSrc,
    ImgSrc,
    ManifestSrc,
    MediaSrc,
    ObjectSrc,
    ScriptSrc,
    StyleSrc,
    BaseUri,
    PluginTypes,
    Sandbox,
    FormAction,
    FrameAncestors,
    NavigateTo,
    BlockAllMixedContent,
    UpgradeInsecureRequests,
}

impl Directive {
    /// Every directive, in registry order.
    pub const ALL: [Directive; 19] = [
        Directive::ChildSrc,
        Directive::ConnectSrc,
        Directive::DefaultSrc,
        Directive::FontSrc,
        Directive::FrameSrc,
        Directive::ImgSrc,
        Directive::ManifestSrc,
        Directive::MediaSrc,
        Directive::ObjectSrc,
        Directive::ScriptSrc,
        Directive::StyleSrc,
        Directive::BaseUri,
        Directive::PluginTypes,
        Directive::Sandbox,
        Directive::FormAction,
        Directive::FrameAncestors,
        Directive::NavigateTo,
        Directive::BlockAllMixedContent,
        Directive::UpgradeInsecureRequests,
    ];

    /// Wire name of the directive.
    pub fn name(self) -> &'static str {
        match self {
            Directive::ChildSrc => "child-src",
            Directive::ConnectSrc => "connect-src",
            Directive::DefaultSrc => "default-src",
            Directive::FontSrc => "font-src",
            Directive::FrameSrc => "frame-src",
            Directive::ImgSrc => "img-src",
            Directive::ManifestSrc => "manifest-src",
            Directive::MediaSrc => "media-src",
            Directive::ObjectSrc => "object-src",
            Directive::ScriptSrc => "script-src",
            Directive::StyleSrc => "style-src",
            Directive::BaseUri => "base-uri",
            Directive::PluginTypes => "plugin-types",
            Directive::Sandbox => "sandbox",
            Directive::FormAction => "form-action",
            Directive::FrameAncestors => "frame-ancestors",
            Directive::NavigateTo => "navigate-to",
            Directive::BlockAllMixedContent => "block-all-mixed-content",
            Directive::UpgradeInsecureRequests => "upgrade-insecure-requests",
        }
    }

    /// Selector bit of the directive.
    pub fn selector(self) -> DirectiveSet {
        match self {
            Directive::ChildSrc => DirectiveSet::CHILD_SRC,
            Directive::ConnectSrc => DirectiveSet::CONNECT_SRC,
            Directive::DefaultSrc => DirectiveSet::DEFAULT_SRC,
            Directive::FontSrc => DirectiveSet::FONT_SRC,
            Directive::FrameSrc => DirectiveSet::FRAME_SRC,
            Directive::ImgSrc => DirectiveSet::IMG_SRC,
            Directive::ManifestSrc => DirectiveSet::MANIFEST_SRC,
            Directive::MediaSrc => DirectiveSet::MEDIA_SRC,
            Directive::ObjectSrc => DirectiveSet::OBJECT_SRC,
            Directive::ScriptSrc => DirectiveSet::SCRIPT_SRC,
            Directive::StyleSrc => DirectiveSet::STYLE_SRC,
            Directive::BaseUri => DirectiveSet::BASE_URI,
            Directive::PluginTypes => DirectiveSet::PLUGIN_TYPES,
            Directive::Sandbox => DirectiveSet::SANDBOX,
            Directive::FormAction => DirectiveSet::FORM_ACTION,
            Directive::FrameAncestors => DirectiveSet::FRAME_ANCESTORS,
            Directive::NavigateTo => DirectiveSet::NAVIGATE_TO,
            Directive::BlockAllMixedContent => DirectiveSet::BLOCK_ALL_MIXED_CONTENT,
            Directive::UpgradeInsecureRequests => DirectiveSet::UPGRADE_INSECURE_REQUESTS,
        }
    }

    /// Look up a directive by wire name (ASCII case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|directive| directive.name().eq_ignore_ascii_case(name))
    }

    /// Look up a directive by selector. Only single-bit selectors resolve.
    pub fn from_selector(selector: DirectiveSet) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|directive| directive.selector() == selector)
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Selector bit for a directive wire name.
pub fn lookup_selector(name: &str) -> Option<DirectiveSet> {
    Directive::from_name(name).map(Directive::selector)
}

/// Wire name for a single-bit selector.
pub fn lookup_name(selector: DirectiveSet) -> Option<&'static str> {
    Directive::from_selector(selector).map(Directive::name)
}

/// All `(name, selector)` pairs, in registry order.
pub fn all_directives() -> impl Iterator<Item = (&'static str, DirectiveSet)> {
    Directive::ALL
        .iter()
        .map(|directive| (directive.name(), directive.selector()))
}
