use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal front end for the SmartCloud multi-agent assistant", long_about = None)]
pub struct Args {
    /// Ask one question and exit. Omit to start the interactive chat
    pub query: Option<String>,

    /// Conversation session to load and append to
    #[arg(short, long)]
    pub session: Option<String>,

    /// Inference provider [possible values: groq, openai, openrouter, deepseek, anthropic]
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Model to use (provider-specific)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Disable the shell-command action agent
    #[arg(long)]
    pub no_action: bool,

    /// Skip the confirmation prompt of /run (one-shot suggestions still ask)
    #[arg(short, long)]
    pub yes: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_means_interactive() {
        let args = Args::try_parse_from(["smartcloud"]).unwrap();
        assert!(args.query.is_none());
        assert!(!args.no_action);
    }

    #[test]
    fn parses_flags_and_query() {
        let args = Args::try_parse_from([
            "smartcloud",
            "--session",
            "web_user_1",
            "-p",
            "openai",
            "--no-action",
            "what's my cpu?",
        ])
        .unwrap();
        assert_eq!(args.query.as_deref(), Some("what's my cpu?"));
        assert_eq!(args.session.as_deref(), Some("web_user_1"));
        assert_eq!(args.provider.as_deref(), Some("openai"));
        assert!(args.no_action);
    }
}
