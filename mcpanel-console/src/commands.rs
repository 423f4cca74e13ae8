//! Operator command parsing.
//!
//! One command per line. Parse errors are returned as plain strings and
//! printed by the caller; nothing here is fatal.

use mcpanel_core::{ConfigType, UserAction};

pub const HELP: &str = "\
commands:
  refresh                     refresh running server processes
  connect <name>              attach the console to a process
  exec <command...>           run a console command
  terminate                   detach the console (server keeps running)
  search                      scan installed servers
  use <name>                  select a server locally (no request)
  select <name>               select a server and load its configuration
  start                       start the selected server
  save <type> <data>          save config; type = version|properties|start_script
                              version/properties take a JSON object
  components [name]           list components of the selected server
  delete <schematic>          delete a schematic from the selected server
  status                      request a telemetry refresh
  endpoint <host> <port>      reconnect to another peer
  help                        show this text
  quit                        exit";

/// A parsed operator line.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Action(UserAction),
    Help,
    Quit,
    Empty,
}

pub fn parse_line(input: &str) -> Result<Line, String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(Line::Empty);
    }
    let (word, rest) = match input.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (input, ""),
    };

    let action = match word {
        "help" | "?" => return Ok(Line::Help),
        "quit" | "exit" => return Ok(Line::Quit),
        "refresh" => UserAction::RefreshServers,
        "connect" => UserAction::Connect {
            server_name: required(rest, "connect requires a server name")?,
        },
        "exec" => UserAction::Execute {
            command: required(rest, "exec requires a command")?,
        },
        "terminate" => UserAction::Terminate,
        "search" => UserAction::SearchServers,
        "use" => UserAction::Select {
            server_name: required(rest, "use requires a server name")?,
        },
        "select" => UserAction::LoadConfig {
            server_name: optional(rest),
        },
        "start" => UserAction::StartServer,
        "save" => parse_save(rest)?,
        "components" => UserAction::GetComponents {
            server_name: optional(rest),
        },
        "delete" => UserAction::DeleteSchematic {
            schematic_name: required(rest, "delete requires a schematic name")?,
        },
        "status" => UserAction::RefreshStatus,
        "endpoint" => {
            let mut parts = rest.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some(host), Some(port), None) => UserAction::Reconfigure {
                    host: host.to_string(),
                    port: port.to_string(),
                },
                _ => return Err("endpoint requires <host> <port>".to_string()),
            }
        }
        other => return Err(format!("unknown command: '{other}' (try 'help')")),
    };
    Ok(Line::Action(action))
}

fn required(rest: &str, message: &str) -> Result<String, String> {
    if rest.is_empty() {
        Err(message.to_string())
    } else {
        Ok(rest.to_string())
    }
}

fn optional(rest: &str) -> Option<String> {
    (!rest.is_empty()).then(|| rest.to_string())
}

fn parse_save(rest: &str) -> Result<UserAction, String> {
    let (kind, data) = rest
        .split_once(char::is_whitespace)
        .ok_or("save requires <type> <data>")?;
    let config_type: ConfigType = kind.parse().map_err(|e| format!("{e}"))?;
    let data = data.trim();

    let data = match config_type {
        ConfigType::StartScript => serde_json::Value::String(data.to_string()),
        ConfigType::Version | ConfigType::Properties => {
            let value: serde_json::Value =
                serde_json::from_str(data).map_err(|e| format!("invalid JSON: {e}"))?;
            if !value.is_object() {
                return Err(format!("{config_type} data must be a JSON object"));
            }
            value
        }
    };
    Ok(UserAction::SaveConfig { config_type, data })
}
