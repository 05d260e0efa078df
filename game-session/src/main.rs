use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{error, info, warn};

use game_core::RankingTable;
use game_persistence::{Stores, connection::connect_and_migrate};
use game_session::console::{Command, ConsoleRenderer, HELP, describe_game};
use game_session::{Config, DeepLink, MultiplayerSession, RefreshTrigger, SessionError, SyncHub};
use game_types::{ActionRejection, InvitationResponse, Side};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting Weatherguessr multiplayer session...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let rankings = match RankingTable::from_file(&config.rankings_path) {
        Ok(rankings) => {
            info!(
                "Loaded rankings for {} states from {}",
                rankings.state_count(),
                config.rankings_path
            );
            Arc::new(rankings)
        }
        Err(e) => {
            error!("Failed to load rankings from '{}': {:#}", config.rankings_path, e);
            error!("Set RANKINGS_PATH to point at a rankings JSON document.");
            std::process::exit(1);
        }
    };

    // Initialize database connection and run migrations
    let db = match connect_and_migrate(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database and run migrations: {}", e);
            std::process::exit(1);
        }
    };

    let mut args = std::env::args().skip(1);
    let username = args.next();
    let link = args.next().unwrap_or_else(|| config.app_base_url.clone());
    let location = match DeepLink::parse(&link) {
        Ok(location) => location,
        Err(e) => {
            error!("Invalid link '{}': {}", link, e);
            std::process::exit(1);
        }
    };

    let session = MultiplayerSession::new(
        &config,
        Stores::sea_orm(db),
        Arc::new(SyncHub::new()),
        rankings,
        location,
    );
    session.add_handler(Box::new(ConsoleRenderer::stdout()));
    session.init();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let username = match username {
        Some(username) => username,
        None => {
            println!("Username:");
            match lines.next_line().await {
                Ok(Some(line)) => line,
                _ => {
                    error!("No username given");
                    std::process::exit(1);
                }
            }
        }
    };

    if let Err(e) = session.go_online(&username).await {
        error!("Failed to go online as '{}': {}", username, e);
        session.dispose().await;
        std::process::exit(1);
    }
    println!("Type 'help' for commands.");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Failed to read input: {}", e);
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                let command = match line.parse::<Command>() {
                    Ok(command) => command,
                    Err(e) => {
                        println!("{} (try 'help')", e);
                        continue;
                    }
                };
                match run_command(&session, command).await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => println!("{}", e),
                }
            }
        }
    }

    session.dispose().await;
    info!("Session closed.");
}

/// Run one console command. Returns false when the player asked to quit.
async fn run_command(session: &MultiplayerSession, command: Command) -> Result<bool, SessionError> {
    match command {
        Command::Players => {
            session.refresh(RefreshTrigger::Manual).await?;
            for player in session.snapshot().await.online_players {
                println!("  {}", player.username);
            }
        }
        Command::Invites => {
            session.refresh(RefreshTrigger::Manual).await?;
            for invitation in session.snapshot().await.pending_invitations {
                println!("  #{} from {}", invitation.id, invitation.from_username);
            }
        }
        Command::Refresh => session.refresh(RefreshTrigger::Manual).await?,
        Command::Invite(to) => {
            session.send_invitation(&to).await?;
        }
        Command::InviteLink(to) => println!("{}", session.copy_invite_link(&to).await?),
        Command::GameLink => println!("{}", session.create_game_link().await?),
        Command::Accept(id) => {
            session
                .respond_to_invitation(id, InvitationResponse::Accepted)
                .await?;
        }
        Command::Decline(id) => {
            session
                .respond_to_invitation(id, InvitationResponse::Declined)
                .await?;
        }
        Command::Roll => {
            let state = session.roll_state(my_side(session).await?).await?;
            let flag = session.rankings().flag(&state).unwrap_or("");
            println!("You rolled {} {}", state, flag);
        }
        Command::Pick(category) => {
            let outcome = session
                .select_category(my_side(session).await?, &category)
                .await?;
            println!("+{} points", outcome.score());
        }
        Command::Ready => {
            let ready = session.toggle_pre_ready(my_side(session).await?).await?;
            println!("{}", if ready { "Ready" } else { "Not ready" });
        }
        Command::Next => {
            session.next_round().await?;
        }
        Command::Game => match session.current_game().await {
            Some(game) => println!("{}", describe_game(&game)),
            None => println!("Not in a game"),
        },
        Command::Rooms => {
            for room in session.list_rooms().await? {
                println!("  {} [{}]", room.name, room.status);
            }
        }
        Command::Join(room) => session.join_room(&room).await?,
        Command::Leave(room) => session.leave_room(&room).await?,
        Command::Help => println!("{}", HELP),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

async fn my_side(session: &MultiplayerSession) -> Result<Side, SessionError> {
    let username = session.username().await.ok_or(SessionError::NotOnline)?;
    let game = session
        .current_game()
        .await
        .ok_or(ActionRejection::NoActiveGame)?;
    game.side_of(&username)
        .ok_or_else(|| ActionRejection::NotAParticipant { game_id: game.id }.into())
}

async fn shutdown_signal() {
    // Wait for SIGINT (Ctrl+C) or SIGTERM
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down gracefully..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully..."),
                }
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                let _ = signal::ctrl_c().await;
                info!("Received Ctrl+C, shutting down gracefully...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down gracefully...");
        } else {
            std::future::pending::<()>().await;
        }
    }
}
