use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use splitmate::cli::{ops, Cli, Commands, GroupCommands, ThemeCommands};
use splitmate::client::ApiClient;
use splitmate::config::SplitmateConfig;
use splitmate::error::SplitmateError;
use splitmate::session::SessionNotifier;
use splitmate::store::CredentialStore;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = SplitmateConfig::load_or_default(&cli.config);

    if let Err(e) = run(cli, config).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: SplitmateConfig) -> Result<(), SplitmateError> {
    std::fs::create_dir_all(&config.storage.data_dir)
        .map_err(|e| SplitmateError::Storage(e.to_string()))?;
    let store = Arc::new(CredentialStore::open(Path::new(&config.storage.data_dir))?);
    let (notifier, _auth_state) = SessionNotifier::new();
    let api = ApiClient::new(
        config.api.base_url.clone(),
        Duration::from_secs(config.api.request_timeout_secs),
        store.clone(),
        notifier,
    )?;
    let probe_timeout = Duration::from_millis(config.api.session_probe_timeout_ms);

    match cli.command {
        Commands::Login { login, password } => ops::login(&api, login, password).await,
        Commands::Signup {
            name,
            email,
            password,
            phone,
        } => ops::signup(&api, name, email, password, phone).await,
        Commands::Logout => ops::logout(&api).await,
        Commands::Whoami => ops::whoami(&api).await,
        Commands::Session => ops::session(&api, probe_timeout).await,
        Commands::Dashboard => ops::dashboard(&api).await,
        Commands::Groups { cmd } => match cmd {
            GroupCommands::List => ops::groups_list(&api).await,
            GroupCommands::Show { id } => ops::group_show(&api, id).await,
            GroupCommands::Create {
                name,
                description,
                members,
            } => ops::group_create(&api, name, description, members).await,
        },
        Commands::Settle {
            group,
            member,
            amount,
            notes,
        } => ops::settle(&api, group, member, amount, notes).await,
        Commands::Theme { cmd } => match cmd {
            ThemeCommands::Get => ops::theme_get(&store),
            ThemeCommands::Set { value } => ops::theme_set(&store, &value),
        },
    }
}
