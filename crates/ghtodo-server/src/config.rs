use std::time::Duration;

use clap::{ArgAction, Args};
use ghtodo_service::github::DEFAULT_API_URL;
use ghtodo_service::GitHubConfig;

#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "GHTODO_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    /// Port to listen on
    #[arg(long, env = "GHTODO_PORT", default_value = "5001")]
    pub port: u16,

    /// Seed the in-memory fallback store with example todos
    #[arg(long, env = "GHTODO_SEED", default_value_t = true, action = ArgAction::Set)]
    pub seed: bool,

    #[command(flatten)]
    pub github: GitHubArgs,
}

#[derive(Debug, Clone, Args)]
pub struct GitHubArgs {
    /// GitHub personal access token. Falls back to REACT_APP_GITHUB_TOKEN.
    #[arg(long = "github-token", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Owner of the repository whose issues hold the todos
    #[arg(long, env = "GHTODO_REPO_OWNER", default_value = "Sunbridger")]
    pub owner: String,

    /// Repository whose issues hold the todos
    #[arg(long, env = "GHTODO_REPO_NAME", default_value = "todoApp")]
    pub repo: String,

    /// GitHub API base URL
    #[arg(long, env = "GHTODO_GITHUB_API", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Timeout for GitHub requests in seconds. Unset keeps the client default.
    #[arg(long, env = "GHTODO_HTTP_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
}

impl GitHubArgs {
    pub fn resolved_token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| std::env::var("REACT_APP_GITHUB_TOKEN").ok())
            .filter(|t| !t.trim().is_empty())
    }

    pub fn to_config(&self) -> GitHubConfig {
        let mut config = GitHubConfig::new(&self.owner, &self.repo, self.resolved_token())
            .with_api_url(&self.api_url);
        config.timeout = self.timeout_secs.map(Duration::from_secs);
        config
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ServerConfig,
    }

    #[test]
    fn flags_override_defaults() {
        let cli = TestCli::parse_from([
            "ghtodo-server",
            "--port",
            "8080",
            "--owner",
            "octo",
            "--repo",
            "todos",
            "--github-token",
            "ghp_test",
            "--api-url",
            "http://127.0.0.1:9999/",
            "--timeout-secs",
            "5",
            "--seed",
            "false",
        ]);
        assert_eq!(cli.config.port, 8080);
        assert!(!cli.config.seed);

        let gh = cli.config.github.to_config();
        assert_eq!(gh.owner, "octo");
        assert_eq!(gh.repo, "todos");
        assert_eq!(gh.token.as_deref(), Some("ghp_test"));
        assert_eq!(gh.api_url, "http://127.0.0.1:9999");
        assert_eq!(gh.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let args = GitHubArgs {
            token: Some("  ".into()),
            owner: "o".into(),
            repo: "r".into(),
            api_url: DEFAULT_API_URL.into(),
            timeout_secs: None,
        };
        assert_eq!(args.resolved_token(), None);
    }
}
