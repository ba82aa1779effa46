// ════════════════════════════════════════════════════════════════
//  Configuration
// ════════════════════════════════════════════════════════════════

/// What to do with a record whose payload cannot be serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FormatErrorPolicy {
    /// Fail the whole batch before anything is written.
    #[default]
    Abort,
    /// Log the record and leave it out of the file.
    Skip,
}

/// Raw file output settings, as handed over by the pipeline.
///
/// Validation happens in [`crate::FileOutput::configure`], so that a missing
/// `path` is reported by name rather than as a deserialization failure.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct FileOutputConfig {
    /// Output template. A single `*` marks where `{key}_{seq}` goes.
    #[serde(default)]
    pub path: Option<String>,
    /// `gz` or `gzip`. Absent means plain files.
    #[serde(default)]
    pub compress: Option<String>,
    /// Gzip level, 0-9.
    #[serde(default = "default_compress_level")]
    pub compress_level: u32,
    #[serde(default = "default_localtime")]
    pub localtime: bool,
    /// Forces UTC, overriding `localtime`.
    #[serde(default)]
    pub utc: bool,
    /// Fixed offset such as `+09:00`. Overrides `localtime` and `utc`.
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default = "default_max_path_attempts")]
    pub max_path_attempts: u32,
    #[serde(default)]
    pub on_format_error: FormatErrorPolicy,
}

pub(crate) const DEFAULT_COMPRESS_LEVEL: u32 = 6;
pub(crate) const DEFAULT_MAX_PATH_ATTEMPTS: u32 = 10_000;

fn default_compress_level() -> u32 {
    DEFAULT_COMPRESS_LEVEL
}

fn default_localtime() -> bool {
    true
}

fn default_max_path_attempts() -> u32 {
    DEFAULT_MAX_PATH_ATTEMPTS
}

impl FileOutputConfig {
    /// Config with only the output template set; everything else defaulted.
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            compress: None,
            compress_level: DEFAULT_COMPRESS_LEVEL,
            localtime: default_localtime(),
            utc: false,
            timezone: None,
            max_path_attempts: DEFAULT_MAX_PATH_ATTEMPTS,
            on_format_error: FormatErrorPolicy::default(),
        }
    }

    pub fn compress(mut self, algorithm: impl Into<String>) -> Self {
        self.compress = Some(algorithm.into());
        self
    }

    pub fn utc(mut self) -> Self {
        self.utc = true;
        self
    }

    pub fn timezone(mut self, offset: impl Into<String>) -> Self {
        self.timezone = Some(offset.into());
        self
    }

    pub fn on_format_error(mut self, policy: FormatErrorPolicy) -> Self {
        self.on_format_error = policy;
        self
    }

    pub fn max_path_attempts(mut self, attempts: u32) -> Self {
        self.max_path_attempts = attempts;
        self
    }
}
