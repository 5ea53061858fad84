use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Macos,
    Linux,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    X64,
    X86,
    Arm64,
}

impl Platform {
    /// Tab order on the download page.
    pub const ALL: [Platform; 3] = [Platform::Windows, Platform::Macos, Platform::Linux];

    /// Identifier used for translation keys and DOM ids.
    pub fn id(self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Macos => "macos",
            Platform::Linux => "linux",
        }
    }

    /// Name shown on the tabs, also used in the conventional download URL.
    pub fn display_name(self) -> &'static str {
        match self {
            Platform::Windows => "Windows",
            Platform::Macos => "macOS",
            Platform::Linux => "Linux",
        }
    }

    /// Name used in published asset file names.
    pub fn asset_name(self) -> &'static str {
        match self {
            Platform::Windows => "Windows",
            Platform::Macos => "Macos",
            Platform::Linux => "Linux",
        }
    }

    /// Downloadable builds offered per platform, with their display labels.
    pub fn builds(self) -> &'static [(Arch, &'static str)] {
        match self {
            Platform::Windows => &[(Arch::X64, "x64"), (Arch::X86, "x86")],
            Platform::Macos => &[(Arch::Arm64, "Apple Silicon"), (Arch::X64, "Intel")],
            Platform::Linux => &[(Arch::X64, "Debian")],
        }
    }

    /// URL fragment selecting this tab, without the leading `#`.
    pub fn hash(self) -> &'static str {
        match self {
            Platform::Windows => "win",
            Platform::Macos => "macos",
            Platform::Linux => "linux",
        }
    }

    /// Accepts the fragment with or without its leading `#`.
    pub fn from_hash(hash: &str) -> Option<Self> {
        match hash.strip_prefix('#').unwrap_or(hash) {
            "win" => Some(Platform::Windows),
            "macos" => Some(Platform::Macos),
            "linux" => Some(Platform::Linux),
            _ => None,
        }
    }

    /// Best guess at the visitor's OS from a `User-Agent` header. Mobile
    /// agents and anything unrecognized get the Windows tab.
    pub fn detect_from_user_agent(user_agent: Option<&str>) -> Self {
        let Some(ua) = user_agent else {
            return Platform::Windows;
        };
        let ua = ua.to_ascii_lowercase();

        let mobile = ua.contains("iphone") || ua.contains("ipad") || ua.contains("android");
        let windows = ua.contains("windows") || ua.contains("win64") || ua.contains("win32");

        if mobile || windows {
            Platform::Windows
        } else if ua.contains("macintosh") || ua.contains("mac os") {
            Platform::Macos
        } else if ua.contains("linux") || ua.contains("x11") {
            Platform::Linux
        } else {
            Platform::Windows
        }
    }
}

impl Arch {
    pub fn as_str(self) -> &'static str {
        match self {
            Arch::X64 => "x64",
            Arch::X86 => "x86",
            Arch::Arm64 => "arm64",
        }
    }
}
