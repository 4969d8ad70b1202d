use std::env;
use std::path::PathBuf;
use std::time::Duration;

use eyre::{Result, eyre};
use url::Url;

use crate::chat_client::DEFAULT_ENDPOINT;
use crate::cli::chat::context::Theme;

/// Settings resolved from the command line, then the environment, then defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: Url,
    pub timeout: Option<Duration>,
    pub speech_script: Option<PathBuf>,
    pub theme: Theme,
    pub user_name: String,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigArgs {
    pub endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
    pub speech_script: Option<PathBuf>,
    pub light: bool,
    pub user_name: Option<String>,
}

impl Config {
    pub fn resolve(args: ConfigArgs) -> Result<Self> {
        Self::resolve_with(args, |key| env::var(key).ok())
    }

    fn resolve_with(args: ConfigArgs, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let endpoint = args
            .endpoint
            .or_else(|| var("CHAT_ENDPOINT"))
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| eyre!("Invalid chat endpoint '{}': {}", endpoint, e))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(eyre!("Chat endpoint must be http or https: {}", endpoint));
        }

        let timeout_secs = match args.timeout_secs {
            Some(secs) => Some(secs),
            None => var("CHAT_TIMEOUT_SECS")
                .map(|raw| {
                    raw.parse::<u64>()
                        .map_err(|_| eyre!("CHAT_TIMEOUT_SECS must be a whole number of seconds, got '{}'", raw))
                })
                .transpose()?,
        };

        let user_name = args
            .user_name
            .or_else(|| var("CHAT_USER_NAME"))
            .or_else(|| var("USER"))
            .or_else(|| var("USERNAME"))
            .unwrap_or_else(|| "user".to_string());

        Ok(Self {
            endpoint,
            timeout: timeout_secs.map(Duration::from_secs),
            speech_script: args.speech_script,
            theme: if args.light { Theme::Light } else { Theme::Dark },
            user_name,
        })
    }
}
