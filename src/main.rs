use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::io::{AsyncBufReadExt, BufReader};

use naval_battle::command::{parse_command, Command};
use naval_battle::protocol::PeerHealth;
use naval_battle::session::{Click, Outcome, Session, Update};
use naval_battle::ui;
use naval_battle::{
    init_logging, ClientConfig, HttpEngine, Transition, UpdateOrdering, WsPushSource,
    DEFAULT_API_URL, DEFAULT_GAME_ID,
};

#[derive(Parser)]
#[command(author, version, about = "Terminal client for a two-peer naval battle engine", long_about = None)]
struct Cli {
    /// Base URL of the local game engine.
    #[arg(long, default_value = DEFAULT_API_URL)]
    api_url: String,
    /// Push endpoint root; derived from --api-url when omitted.
    #[arg(long)]
    ws_url: Option<String>,
    /// Local game id, used both as defender and as attacker.
    #[arg(long, default_value = DEFAULT_GAME_ID)]
    game_id: String,
    /// Defense status poll interval in milliseconds.
    #[arg(long, default_value_t = 2000)]
    poll_ms: u64,
    /// How competing defense updates are reconciled: last-write-wins or sequenced.
    #[arg(long, default_value = "last-write-wins")]
    ordering: UpdateOrdering,
    #[arg(long, help = "Fix RNG seed for reproducible auto-placement (e.g., --seed 12345)")]
    seed: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = ClientConfig::new(cli.api_url)
        .with_game_id(cli.game_id)
        .with_poll_interval(Duration::from_millis(cli.poll_ms.max(1)))
        .with_ordering(cli.ordering);
    if let Some(ws_url) = cli.ws_url {
        config.ws_url = ws_url;
    }

    let mut rng = if let Some(s) = cli.seed {
        println!("Using fixed seed: {} (auto-placement will be reproducible)", s);
        SmallRng::seed_from_u64(s)
    } else {
        let mut seed_rng = rand::rng();
        SmallRng::from_rng(&mut seed_rng)
    };

    let engine = HttpEngine::new(config.api_url.clone())?;
    let push = WsPushSource::new(config.ws_url.clone());
    log::info!(
        "Engine at {}, push channel at {}, ordering {:?}",
        config.api_url,
        config.ws_url,
        config.ordering
    );
    let mut session = Session::new(config, Arc::new(engine), Arc::new(push));

    println!("{}", ui::render(&session));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            event = session.next_event() => {
                if let Some(update) = session.handle(event) {
                    report_update(&session, update);
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => run_command(&mut session, command, &mut rng),
                    Err(msg) => println!("{}", msg),
                }
            }
        }
    }
    session.leave_to_menu();
    Ok(())
}

/// Apply one user command. Engine requests are only issued here; their
/// results are reported by [`report_update`] as they arrive.
fn run_command(session: &mut Session, command: Command, rng: &mut SmallRng) {
    match command {
        Command::Defense => report_transition(session.enter_defense()),
        Command::Attack => report_transition(session.enter_attack()),
        Command::Menu => report_transition(session.leave_to_menu()),
        Command::Ship(ship) => session.select_ship_type(ship),
        Command::Click(position) => {
            if session.click(position) == Click::Ignored {
                println!("{} ignored in the current view.", position);
            }
        }
        Command::Auto => {
            if let Err(declined) = session.auto_place(rng) {
                println!("{}", declined);
            }
        }
        Command::Clear => {
            if let Err(declined) = session.clear_ship() {
                println!("{}", declined);
            }
        }
        Command::Commit => match session.commit_fleet() {
            Outcome::Sent => println!("Submitting fleet..."),
            Outcome::Declined(declined) => println!("{}", declined),
        },
        Command::Target {
            host,
            port,
            game_id,
        } => session.set_target(&host, port, &game_id),
        Command::Probe => {
            session.probe_target();
            println!("Checking {}:{}...", session.target().host, session.target().port);
            return;
        }
        Command::Fire => match session.submit_attack() {
            Outcome::Sent => println!("Firing..."),
            Outcome::Declined(declined) => println!("{}", declined),
        },
        Command::GameId(game_id) => {
            if !session.set_game_id(&game_id) {
                println!("Game id unchanged.");
            }
        }
        Command::Help => {
            println!("{}", ui::HELP);
            return;
        }
        Command::Show | Command::Quit => {}
    }
    println!("{}", ui::render(session));
}

fn report_update(session: &Session, update: Update) {
    match update {
        Update::PushDegraded(err) => {
            println!("Live updates interrupted ({}); falling back to polling.", err);
            return;
        }
        Update::Probed { host, port, health } => {
            match health {
                PeerHealth::Healthy => println!("{}:{} is reachable.", host, port),
                PeerHealth::ErrorStatus(status) => {
                    println!("{}:{} answered with HTTP {}.", host, port, status)
                }
                PeerHealth::Unreachable(err) => println!("Cannot reach {}:{}: {}", host, port, err),
            }
            return;
        }
        Update::FleetAccepted => println!("Fleet submitted."),
        Update::FleetRejected(err) => println!("Error setting up fleet: {}", err),
        Update::AttackReady => return,
        Update::AttackInitFailed(err) => println!("Error initializing attack: {}", err),
        Update::AttackSent(position) => println!("Attack on {} sent.", position),
        Update::AttackFailed(position, err) => {
            println!("Error sending attack on {}: {}", position, err)
        }
        Update::Defense | Update::Attack => {}
    }
    println!("{}", ui::render(session));
}

fn report_transition(transition: Transition) {
    if transition == Transition::Ignored {
        println!("Return to the menu first.");
    }
}
