use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use quiz_flow::cli::{Command, TerminalCompletion, TerminalPresenter, parse_command};
use quiz_flow::config::EngineConfig;
use quiz_flow::flow::{Collaborators, FixedUnits, Transition, WizardManager, catalog};
use quiz_flow::store::LibSqlStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = EngineConfig::from_env()?;

    eprintln!("Quiz Flow v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Flow: {}", config.flow);
    eprintln!("   Units: {}", config.unit_system);
    eprintln!("   Database: {}", config.db_path.display());
    eprintln!("   Commands: next, back, restart, units <metric|imperial>, quit\n");

    let store = Arc::new(LibSqlStore::new_local(&config.db_path).await?);
    let registry = Arc::new(catalog::builtin(&config.flow)?);

    let host = Collaborators {
        store,
        presenter: Arc::new(TerminalPresenter),
        units: Arc::new(FixedUnits(config.unit_system)),
        completion: Arc::new(TerminalCompletion),
    };
    let manager = WizardManager::new(registry, host, &config);
    if manager.start().await.complete {
        if let Some(profile) = manager.profile().await {
            println!("\n{}\n", profile.to_summary());
        }
        eprintln!("This questionnaire is already complete. Type `restart` to take it again.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Error reading stdin: {}", e);
                break;
            }
        };

        let view = manager.view().await;
        let command = match parse_command(&line, &view) {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{e}");
                eprint!("> ");
                continue;
            }
        };

        let outcome = match command {
            Command::Quit => break,
            Command::Next => manager.go_next().await.map(|_| ()),
            Command::Back => {
                if manager.go_back().await == Transition::Exited {
                    eprintln!("Left the questionnaire. Run again to pick it back up.");
                    break;
                }
                Ok(())
            }
            Command::Restart => {
                manager.restart().await;
                Ok(())
            }
            Command::Units(units) => {
                manager.set_unit_system(units).await;
                Ok(())
            }
            Command::Answer { step_id, answer } => {
                manager.submit_answer(&step_id, answer).await.map(|_| ())
            }
        };
        if let Err(e) = outcome {
            eprintln!("{e}");
            eprint!("> ");
        }

        if manager.is_complete().await {
            break;
        }
    }

    manager.shutdown().await;
    Ok(())
}
