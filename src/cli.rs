use clap::Parser;
use std::path::PathBuf;

/// Ceiling on messages processed in one run.
pub const DEFAULT_MESSAGE_CAP: usize = 2500;

/// Export the subjects and bodies of your sent Gmail messages to a CSV file.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    /// OAuth2 client id from the Google Cloud console.
    #[clap(long, env = "GOOGLE_CLIENT_ID", hide_env_values = true)]
    pub client_id: Option<String>,

    /// OAuth2 client secret.
    #[clap(long, env = "GOOGLE_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Redirect URI registered with the OAuth client.
    #[clap(
        long,
        env = "GOOGLE_REDIRECT_URI",
        default_value = "http://localhost:3000/oauth2callback"
    )]
    pub redirect_uri: String,

    /// Where OAuth tokens are stored between runs.
    #[clap(long, env = "TOKEN_PATH", default_value = "token.json")]
    pub token_path: PathBuf,

    /// Maximum number of sent messages to export.
    #[clap(long, default_value_t = DEFAULT_MESSAGE_CAP)]
    pub max_messages: usize,

    /// Output CSV file, overwritten on every run.
    #[clap(long, default_value = "gmail_data.csv")]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["gmail-export"]);
        assert_eq!(cli.redirect_uri, "http://localhost:3000/oauth2callback");
        assert_eq!(cli.token_path, PathBuf::from("token.json"));
        assert_eq!(cli.max_messages, DEFAULT_MESSAGE_CAP);
        assert_eq!(cli.output, PathBuf::from("gmail_data.csv"));
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "gmail-export",
            "--client-id",
            "id",
            "--client-secret",
            "secret",
            "--max-messages",
            "50",
            "--output",
            "out.csv",
        ]);
        assert_eq!(cli.client_id.as_deref(), Some("id"));
        assert_eq!(cli.client_secret.as_deref(), Some("secret"));
        assert_eq!(cli.max_messages, 50);
        assert_eq!(cli.output, PathBuf::from("out.csv"));
    }
}
