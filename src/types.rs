use crate::flickr::SizeVariant;
use crate::pool::QueueCapacity;

/// `--size` choices, one per size Flickr serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum VersionSize {
    Square,
    LargeSquare,
    Thumbnail,
    Small,
    #[value(name = "small-320")]
    Small320,
    Medium,
    #[value(name = "medium-640")]
    Medium640,
    #[value(name = "medium-800")]
    Medium800,
    Large,
    Original,
}

impl From<VersionSize> for SizeVariant {
    fn from(size: VersionSize) -> Self {
        match size {
            VersionSize::Square => SizeVariant::Square,
            VersionSize::LargeSquare => SizeVariant::LargeSquare,
            VersionSize::Thumbnail => SizeVariant::Thumbnail,
            VersionSize::Small => SizeVariant::Small,
            VersionSize::Small320 => SizeVariant::Small320,
            VersionSize::Medium => SizeVariant::Medium,
            VersionSize::Medium640 => SizeVariant::Medium640,
            VersionSize::Medium800 => SizeVariant::Medium800,
            VersionSize::Large => SizeVariant::Large,
            VersionSize::Original => SizeVariant::Original,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Parse `--queue-capacity`: `unbounded` or a task count.
pub fn parse_queue_capacity(s: &str) -> Result<QueueCapacity, String> {
    if s.eq_ignore_ascii_case("unbounded") {
        return Ok(QueueCapacity::Unbounded);
    }
    s.parse::<usize>()
        .map(QueueCapacity::Bounded)
        .map_err(|_| format!("expected 'unbounded' or a number of tasks, got '{s}'"))
}
