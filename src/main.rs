use clap::Parser;
use healthcmd::assistant::RemoteAssistant;
use healthcmd::cli::{
    run_allergy, run_centers, run_chat, run_condition, run_history, run_profile,
    run_profile_edit, Cli, Commands,
};
use healthcmd::db::Database;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let db = Database::open()?;
    db.bootstrap()?;

    match cli.command {
        Commands::Chat(args) => {
            let assistant = RemoteAssistant::from_env();
            if !assistant.is_configured() {
                println!("Note: HEALTHCMD_API_KEY is not set; the assistant will not answer.");
            }
            run_chat(&db, &assistant, args.reason)?;
        }
        Commands::Profile(args) => {
            if args.edit {
                run_profile_edit(&db)?;
            } else {
                run_profile(&db)?;
            }
        }
        Commands::Allergy(args) => {
            run_allergy(&db, args.command)?;
        }
        Commands::Condition(args) => {
            run_condition(&db, args.command)?;
        }
        Commands::History(args) => {
            run_history(&db, args.show, args.delete)?;
        }
        Commands::Centers(args) => {
            run_centers(&db, args.lat, args.lon, args.limit, args.max_km)?;
        }
    }

    Ok(())
}
