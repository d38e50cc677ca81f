//! Line commands accepted by the interactive front-end.

use crate::grid::Position;
use crate::ship::ShipType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Defense,
    Attack,
    Menu,
    Ship(ShipType),
    Click(Position),
    Auto,
    Clear,
    Commit,
    Target {
        host: String,
        port: u16,
        game_id: String,
    },
    Probe,
    Fire,
    GameId(String),
    Show,
    Help,
    Quit,
}

/// Parse one input line. A bare cell such as `B3` is shorthand for `click B3`.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err("empty command".to_string());
    };
    let args: Vec<&str> = words.collect();
    let command = match (head.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("defense" | "d", []) => Command::Defense,
        ("attack" | "a", []) => Command::Attack,
        ("menu" | "m" | "back", []) => Command::Menu,
        ("ship", [ship]) => Command::Ship(ship.parse()?),
        ("click", [cell]) => Command::Click(cell.parse::<Position>().map_err(|e| e.to_string())?),
        ("auto", []) => Command::Auto,
        ("clear", []) => Command::Clear,
        ("commit", []) => Command::Commit,
        ("target", [host, port, game_id]) => Command::Target {
            host: host.to_string(),
            port: parse_port(port)?,
            game_id: game_id.to_string(),
        },
        ("probe", []) => Command::Probe,
        ("fire", []) => Command::Fire,
        ("id", [game_id]) => Command::GameId(game_id.to_string()),
        ("show", []) => Command::Show,
        ("help" | "?", []) => Command::Help,
        ("quit" | "exit" | "q", []) => Command::Quit,
        (_, []) => match head.parse::<Position>() {
            Ok(position) => Command::Click(position),
            Err(_) => return Err(format!("unknown command '{}' - type 'help'", head)),
        },
        (other, _) => return Err(format!("wrong arguments for '{}' - type 'help'", other)),
    };
    Ok(command)
}

fn parse_port(text: &str) -> Result<u16, String> {
    match text.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(format!("invalid port '{}'", text)),
    }
}
