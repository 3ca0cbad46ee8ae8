//! Wire protocol shared by the relay server and its clients.
//!
//! Frames are newline-free UTF-8 text with `|`-separated fields; field 0
//! is the command name. There is no escaping, so a player name containing
//! `|` corrupts framing (known limitation). Numeric fields that fail to
//! parse become NaN and are carried through unmodified rather than
//! rejected.

use std::fmt;

pub const FIELD_SEPARATOR: char = '|';

/// Literal reply sent back to a client that pinged us.
pub const HEARTBEAT_FRAME: &str = "heartbeat";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    fn wire_fields(&self) -> String {
        format!("{}|{}|{}", self.x, self.y, self.z)
    }
}

/// Rotation as sent with `shoot` frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quat {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quat {
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }
}

/// State announced by a connection via `spawn` and mutated by `update` /
/// `update_username`. The id is client-supplied and lives in a separate
/// namespace from connection ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub position: Vec3,
    pub rotation: Vec3,
}

impl Player {
    pub fn new(id: String, name: String, position: Vec3, rotation: Vec3) -> Self {
        Self {
            id,
            name,
            position,
            rotation,
        }
    }

    fn snapshot_fields(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.id,
            self.name,
            self.position.wire_fields(),
            self.rotation.wire_fields()
        )
    }
}

/// Errors surfaced while decoding an inbound frame. None of these are
/// fatal to a connection; the frame is dropped and logged.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolError {
    UnknownCommand(String),
    MissingFields {
        command: &'static str,
        expected: usize,
        got: usize,
    },
    BadConnectionId {
        command: &'static str,
        field: String,
    },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommand(cmd) => write!(f, "unknown command: {:?}", cmd),
            Self::MissingFields {
                command,
                expected,
                got,
            } => write!(
                f,
                "{} expects {} fields after the command, got {}",
                command, expected, got
            ),
            Self::BadConnectionId { command, field } => {
                write!(f, "{} target {:?} is not a connection id", command, field)
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

/// One decoded inbound frame. Decoding happens once, in [`Command::parse`];
/// handlers dispatch on the variant instead of re-matching strings.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Spawn {
        player_id: String,
        name: String,
        position: Vec3,
        rotation: Vec3,
    },
    Update {
        player_id: String,
        position: Vec3,
        rotation: Vec3,
    },
    UpdateUsername {
        conn_id: u32,
        name: String,
    },
    Disconnect {
        conn_id: u32,
    },
    Shoot {
        player_id: String,
        position: Vec3,
        rotation: Quat,
    },
    Hit {
        shooter_id: String,
        target_id: String,
    },
    Death {
        player_id: String,
        killer_id: String,
    },
    Heartbeat,
}

impl Command {
    /// Decodes a raw frame. Field counts are validated before any
    /// indexing; extra trailing fields are ignored.
    pub fn parse(frame: &str) -> Result<Command, ProtocolError> {
        let parts: Vec<&str> = frame.split(FIELD_SEPARATOR).collect();

        match parts[0] {
            "spawn" => {
                require_fields(&parts, "spawn", 8)?;
                Ok(Command::Spawn {
                    player_id: parts[1].to_owned(),
                    name: parts[2].to_owned(),
                    position: parse_vec3(&parts[3..6]),
                    rotation: parse_vec3(&parts[6..9]),
                })
            }
            "update" => {
                require_fields(&parts, "update", 7)?;
                Ok(Command::Update {
                    player_id: parts[1].to_owned(),
                    position: parse_vec3(&parts[2..5]),
                    rotation: parse_vec3(&parts[5..8]),
                })
            }
            "update_username" => {
                require_fields(&parts, "update_username", 2)?;
                Ok(Command::UpdateUsername {
                    conn_id: parse_conn_id(parts[1], "update_username")?,
                    name: parts[2].to_owned(),
                })
            }
            "disconnect" => {
                require_fields(&parts, "disconnect", 1)?;
                Ok(Command::Disconnect {
                    conn_id: parse_conn_id(parts[1], "disconnect")?,
                })
            }
            "shoot" => {
                require_fields(&parts, "shoot", 8)?;
                Ok(Command::Shoot {
                    player_id: parts[1].to_owned(),
                    position: parse_vec3(&parts[2..5]),
                    rotation: Quat::new(
                        parse_float(parts[5]),
                        parse_float(parts[6]),
                        parse_float(parts[7]),
                        parse_float(parts[8]),
                    ),
                })
            }
            "hit" => {
                require_fields(&parts, "hit", 2)?;
                Ok(Command::Hit {
                    shooter_id: parts[1].to_owned(),
                    target_id: parts[2].to_owned(),
                })
            }
            "death" => {
                require_fields(&parts, "death", 2)?;
                Ok(Command::Death {
                    player_id: parts[1].to_owned(),
                    killer_id: parts[2].to_owned(),
                })
            }
            "heartbeat" => Ok(Command::Heartbeat),
            other => Err(ProtocolError::UnknownCommand(other.to_owned())),
        }
    }
}

fn require_fields(
    parts: &[&str],
    command: &'static str,
    expected: usize,
) -> Result<(), ProtocolError> {
    if parts.len() < expected + 1 {
        Err(ProtocolError::MissingFields {
            command,
            expected,
            got: parts.len() - 1,
        })
    } else {
        Ok(())
    }
}

fn parse_conn_id(field: &str, command: &'static str) -> Result<u32, ProtocolError> {
    field.parse().map_err(|_| ProtocolError::BadConnectionId {
        command,
        field: field.to_owned(),
    })
}

// Parse failures deliberately become NaN instead of rejecting the frame.
fn parse_float(field: &str) -> f64 {
    field.parse().unwrap_or(f64::NAN)
}

fn parse_vec3(fields: &[&str]) -> Vec3 {
    Vec3::new(
        parse_float(fields[0]),
        parse_float(fields[1]),
        parse_float(fields[2]),
    )
}

/// First handshake frame: the connection id the server just assigned.
pub fn handshake_frame(conn_id: u32) -> String {
    format!("playerId|{}", conn_id)
}

/// Full directory snapshot. An empty directory yields `players|0|`,
/// trailing separator included.
pub fn players_frame<'a, I>(players: I) -> String
where
    I: IntoIterator<Item = &'a Player>,
{
    let fields: Vec<String> = players.into_iter().map(Player::snapshot_fields).collect();
    format!("players|{}|{}", fields.len(), fields.join("|"))
}

pub fn disconnect_frame(id: &str) -> String {
    format!("disconnect|{}", id)
}

pub fn update_username_frame(conn_id: u32, name: &str) -> String {
    format!("update_username|{}|{}", conn_id, name)
}

/// Canonical `shoot` relay frame, rebuilt from the parsed fields rather
/// than echoing the inbound text.
pub fn shoot_frame(player_id: &str, position: Vec3, rotation: Quat) -> String {
    format!(
        "shoot|{}|{}|{}|{}|{}|{}|{}|{}",
        player_id,
        position.x,
        position.y,
        position.z,
        rotation.x,
        rotation.y,
        rotation.z,
        rotation.w
    )
}

pub fn hit_frame(shooter_id: &str, target_id: &str) -> String {
    format!("hit|{}|{}", shooter_id, target_id)
}

pub fn death_frame(player_id: &str, killer_id: &str) -> String {
    format!("death|{}|{}", player_id, killer_id)
}
