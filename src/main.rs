use clap::Parser;
use legacyvault::cli::{Cli, Commands, IdentityAction, KeyAction};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // Diagnostics go to stderr so stdout stays clean for blobs and plaintext.
    let env_filter = EnvFilter::try_from_env("LEGACYVAULT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let result = match cli.command {
        Commands::Encrypt {
            ref vault,
            ref input,
            ref output,
        } => legacyvault::cli::commands::encrypt::execute(&cli, vault, input, output.as_deref()),
        Commands::Decrypt {
            ref vault,
            ref input,
            ref output,
        } => legacyvault::cli::commands::decrypt::execute(&cli, vault, input, output.as_deref()),
        Commands::Key { ref action } => match action {
            KeyAction::Status { ref vault } => legacyvault::cli::commands::key::execute_status(&cli, vault),
            KeyAction::List => legacyvault::cli::commands::key::execute_list(&cli),
            KeyAction::Backup {
                ref vault,
                ref output,
            } => legacyvault::cli::commands::key::execute_backup(&cli, vault, output.as_deref()),
            KeyAction::Restore {
                ref vault,
                ref backup,
            } => legacyvault::cli::commands::key::execute_restore(&cli, vault, backup),
            KeyAction::Forget { ref vault, force } => {
                legacyvault::cli::commands::key::execute_forget(&cli, vault, *force)
            }
        },
        Commands::Identity { ref action } => match action {
            IdentityAction::New { ref output } => {
                legacyvault::cli::commands::identity::execute_new(&cli, output.as_deref())
            }
            IdentityAction::Unlock {
                ref user,
                ref backup,
            } => legacyvault::cli::commands::identity::execute_unlock(&cli, user, backup),
            IdentityAction::Show { ref user } => {
                legacyvault::cli::commands::identity::execute_show(&cli, user)
            }
        },
        Commands::Seal {
            ref vault,
            ref recipient,
            ref output,
        } => legacyvault::cli::commands::seal::execute(&cli, vault, recipient, output.as_deref()),
        Commands::Unseal {
            ref vault,
            ref user,
            ref sealed,
        } => legacyvault::cli::commands::unseal::execute(&cli, vault, user, sealed),
        Commands::Recover {
            ref vault,
            ref sealed,
            ref user,
            ref backup,
        } => legacyvault::cli::commands::recover::execute(
            &cli,
            vault,
            sealed.as_deref(),
            user.as_deref(),
            backup.as_deref(),
        ),
        Commands::Version => legacyvault::cli::commands::version::execute(),
    };

    if let Err(e) = result {
        legacyvault::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
