use std::fmt;

pub const RAW_SUFFIX: &str = "-RAW";
pub const ENGLISH_MARKER: &str = "EN";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    Structured,
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLanguage {
    English,
    /// The frontend's home locale.
    Local,
}

impl OutputLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputLanguage::English => "English",
            OutputLanguage::Local => "Bahasa Indonesia",
        }
    }
}

impl fmt::Display for OutputLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the client asked for, decoded from the `selectedLang` form field.
///
/// Decoding never fails: a value ending in `-RAW` selects raw output, a value
/// containing `EN` (case-sensitive) selects English, and anything else,
/// including an empty selector, falls back to [`RequestMode::StructuredLocal`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestMode {
    #[default]
    StructuredLocal,
    StructuredEnglish,
    RawLocal,
    RawEnglish,
}

impl RequestMode {
    pub fn from_selector(selector: &str) -> Self {
        let raw = selector.ends_with(RAW_SUFFIX);
        let english = selector.contains(ENGLISH_MARKER);

        match (raw, english) {
            (true, true) => RequestMode::RawEnglish,
            (true, false) => RequestMode::RawLocal,
            (false, true) => RequestMode::StructuredEnglish,
            (false, false) => RequestMode::StructuredLocal,
        }
    }

    pub fn shape(&self) -> OutputShape {
        match self {
            RequestMode::RawLocal | RequestMode::RawEnglish => OutputShape::Raw,
            RequestMode::StructuredLocal | RequestMode::StructuredEnglish => {
                OutputShape::Structured
            }
        }
    }

    pub fn language(&self) -> OutputLanguage {
        match self {
            RequestMode::StructuredEnglish | RequestMode::RawEnglish => OutputLanguage::English,
            RequestMode::StructuredLocal | RequestMode::RawLocal => OutputLanguage::Local,
        }
    }

    pub fn is_raw(&self) -> bool {
        self.shape() == OutputShape::Raw
    }
}

/// Free-form aspect ratio such as `16:9`, echoed verbatim into prompts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AspectRatio(pub String);

impl AspectRatio {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
