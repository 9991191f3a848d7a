use std::env;
use std::str::FromStr;
use std::time::Duration;

/// How the execution client talks to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    /// Single blocking request (`wait=true`)
    Wait,
    /// Submit, then poll the token
    Poll,
}

impl FromStr for EngineMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wait" => Ok(EngineMode::Wait),
            "poll" => Ok(EngineMode::Poll),
            other => Err(format!("unknown engine mode: {}", other)),
        }
    }
}

/// External execution engine settings
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub auth_header: String,
    pub mode: EngineMode,
    pub base64_encoded: bool,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:2358".to_string(),
            auth_token: None,
            auth_header: "X-Auth-Token".to_string(),
            mode: EngineMode::Wait,
            base64_encoded: true,
            poll_interval_ms: 500,
            max_poll_attempts: 20,
        }
    }
}

/// Fan-out settings for one submission
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Ceiling on simultaneously in-flight engine calls per submission
    pub max_concurrency: usize,
    /// Hard wall-clock ceiling per case, compile and run included
    pub case_timeout_ms: u64,
    /// Extra attempts allowed for `EngineUnreachable` only
    pub unreachable_retries: u32,
    /// Slack added on top of the outer batch ceiling
    pub batch_slack_ms: u64,
}

/// Waves beyond this count no longer extend the batch ceiling
const MAX_BATCH_WAVES: u32 = 3;

impl DispatchSettings {
    pub fn case_timeout(&self) -> Duration {
        Duration::from_millis(self.case_timeout_ms)
    }

    /// Outer ceiling for a batch of `cases` test cases
    ///
    /// `case_timeout * min(waves, 3) + slack` where a wave is one round of
    /// `max_concurrency` cases. Never below one case ceiling.
    pub fn batch_timeout(&self, cases: usize) -> Duration {
        let concurrency = self.max_concurrency.max(1);
        let waves = cases.max(1).div_ceil(concurrency);
        let waves = u32::try_from(waves)
            .unwrap_or(MAX_BATCH_WAVES)
            .min(MAX_BATCH_WAVES);
        self.case_timeout() * waves + Duration::from_millis(self.batch_slack_ms)
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            case_timeout_ms: 15_000,
            unreachable_retries: 1,
            batch_slack_ms: 2_000,
        }
    }
}

/// Application configuration
/// Provides defaults with environment variable overrides
#[derive(Debug, Clone)]
pub struct Config {
    pub redis_url: String,
    pub problems_path: String,
    pub port: u16,
    pub engine: EngineSettings,
    pub dispatch: DispatchSettings,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let engine_defaults = EngineSettings::default();
        let dispatch_defaults = DispatchSettings::default();

        Self {
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            problems_path: env::var("PROBLEMS_PATH")
                .unwrap_or_else(|_| "config/problems.json".to_string()),
            port: env_or("PORT", 3000),
            engine: EngineSettings {
                base_url: env::var("ENGINE_URL").unwrap_or(engine_defaults.base_url),
                auth_token: env::var("ENGINE_AUTH_TOKEN")
                    .ok()
                    .filter(|token| !token.is_empty()),
                auth_header: env::var("ENGINE_AUTH_HEADER").unwrap_or(engine_defaults.auth_header),
                mode: env_or("ENGINE_MODE", engine_defaults.mode),
                base64_encoded: env_or("ENGINE_BASE64", engine_defaults.base64_encoded),
                poll_interval_ms: env_or("ENGINE_POLL_INTERVAL_MS", engine_defaults.poll_interval_ms),
                max_poll_attempts: env_or("ENGINE_MAX_POLLS", engine_defaults.max_poll_attempts),
            },
            dispatch: DispatchSettings {
                max_concurrency: env_or("MAX_CONCURRENCY", dispatch_defaults.max_concurrency),
                case_timeout_ms: env_or("CASE_TIMEOUT_MS", dispatch_defaults.case_timeout_ms),
                unreachable_retries: env_or("ENGINE_RETRIES", dispatch_defaults.unreachable_retries),
                batch_slack_ms: env_or("BATCH_SLACK_MS", dispatch_defaults.batch_slack_ms),
            },
        }
    }

    pub fn new() -> Self {
        Self::from_env()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
