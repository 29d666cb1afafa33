//! Line-oriented edit scripts.
//!
//! One command per line. A `#` at the start of a line, or a `#` followed by
//! whitespace, starts a comment; `#3` (an object id) and `#ff8800` (a color)
//! are values.

use std::path::PathBuf;

use sceneforge_core::math::vec3;
use sceneforge_core::{ObjectId, PropertyValue, Reconstruction, ShapeKind, Vec3};

/// Which part of a transform a command sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Position,
    Rotation,
    Scale,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Create(Reconstruction),
    Delete(ObjectId),
    Transform {
        id: ObjectId,
        channel: Channel,
        value: Vec3,
    },
    Set {
        id: ObjectId,
        key: String,
        value: PropertyValue,
    },
    /// Interactive drag to `to` in `steps` increments, coalesced into one undo.
    Drag {
        id: ObjectId,
        to: Vec3,
        steps: u32,
    },
    Begin(String),
    Commit,
    Undo,
    Redo,
    Clear,
    Save(PathBuf),
    Load(PathBuf),
    Print,
}

/// A parsed command with its 1-based source line.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLine {
    pub line: usize,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct ScriptError {
    pub line: usize,
    pub message: String,
}

/// Parses a whole script, stopping at the first bad line.
pub fn parse_script(source: &str) -> Result<Vec<ScriptLine>, ScriptError> {
    let mut commands = Vec::new();
    for (index, text) in source.lines().enumerate() {
        let line = index + 1;
        match parse_command(text) {
            Ok(Some(command)) => commands.push(ScriptLine { line, command }),
            Ok(None) => {}
            Err(message) => return Err(ScriptError { line, message }),
        }
    }
    Ok(commands)
}

/// Parses one line. Returns `Ok(None)` for blank and comment-only lines.
pub fn parse_command(text: &str) -> Result<Option<Command>, String> {
    let text = strip_comment(text).trim();
    if text.is_empty() {
        return Ok(None);
    }
    let mut words = text.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let verb = verb.to_ascii_lowercase();
    let verb = verb.as_str();
    let command = match verb {
        "create" => parse_create(&args)?,
        "delete" => {
            expect_count(verb, &args, 1)?;
            Command::Delete(parse_id(args[0])?)
        }
        "move" | "rotate" | "scale" => {
            expect_count(verb, &args, 4)?;
            let channel = match verb {
                "move" => Channel::Position,
                "rotate" => Channel::Rotation,
                _ => Channel::Scale,
            };
            Command::Transform {
                id: parse_id(args[0])?,
                channel,
                value: parse_vec3(&args[1..4])?,
            }
        }
        "set" => {
            if args.len() < 3 {
                return Err("usage: set <id> <key> <value>".into());
            }
            Command::Set {
                id: parse_id(args[0])?,
                key: args[1].to_owned(),
                value: parse_value(&args[2..].join(" "))?,
            }
        }
        "drag" => {
            expect_count(verb, &args, 5)?;
            let steps: u32 = args[4]
                .parse()
                .map_err(|_| format!("invalid step count '{}'", args[4]))?;
            if steps == 0 {
                return Err("drag needs at least one step".into());
            }
            Command::Drag {
                id: parse_id(args[0])?,
                to: parse_vec3(&args[1..4])?,
                steps,
            }
        }
        "begin" => {
            if args.is_empty() {
                return Err("usage: begin <label>".into());
            }
            Command::Begin(args.join(" "))
        }
        "commit" => no_args(verb, &args, Command::Commit)?,
        "undo" => no_args(verb, &args, Command::Undo)?,
        "redo" => no_args(verb, &args, Command::Redo)?,
        "clear" => no_args(verb, &args, Command::Clear)?,
        "print" => no_args(verb, &args, Command::Print)?,
        "save" => {
            expect_count(verb, &args, 1)?;
            Command::Save(PathBuf::from(args[0]))
        }
        "load" => {
            expect_count(verb, &args, 1)?;
            Command::Load(PathBuf::from(args[0]))
        }
        other => return Err(format!("unknown command '{other}'")),
    };
    Ok(Some(command))
}

fn strip_comment(text: &str) -> &str {
    if text.trim_start().starts_with('#') {
        return "";
    }
    let bytes = text.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'#' && bytes.get(i + 1).is_none_or(|next| next.is_ascii_whitespace()) {
            return &text[..i];
        }
    }
    text
}

fn parse_create(args: &[&str]) -> Result<Command, String> {
    let (Some(kind), rest) = (args.first(), args.get(1..).unwrap_or_default()) else {
        return Err("usage: create <shape|asset|describe> ...".into());
    };
    if rest.is_empty() {
        return Err(format!("create {kind} needs an argument"));
    }
    let reconstruction = match kind.to_ascii_lowercase().as_str() {
        "shape" => Reconstruction::Shape(rest[0].parse::<ShapeKind>()?),
        "asset" => Reconstruction::Asset(rest.join(" ")),
        "describe" => Reconstruction::Description(rest.join(" ")),
        other => return Err(format!("unknown create kind '{other}'")),
    };
    Ok(Command::Create(reconstruction))
}

fn expect_count(verb: &str, args: &[&str], count: usize) -> Result<(), String> {
    if args.len() != count {
        return Err(format!(
            "{verb} takes {count} argument(s), got {}",
            args.len()
        ));
    }
    Ok(())
}

fn no_args(verb: &str, args: &[&str], command: Command) -> Result<Command, String> {
    expect_count(verb, args, 0)?;
    Ok(command)
}

fn parse_id(text: &str) -> Result<ObjectId, String> {
    text.strip_prefix('#')
        .unwrap_or(text)
        .parse::<u64>()
        .map(ObjectId::new)
        .map_err(|_| format!("invalid object id '{text}'"))
}

fn parse_f32(text: &str) -> Result<f32, String> {
    let value: f32 = text
        .parse()
        .map_err(|_| format!("invalid number '{text}'"))?;
    if !value.is_finite() {
        return Err(format!("number '{text}' is not finite"));
    }
    Ok(value)
}

fn parse_vec3(parts: &[&str]) -> Result<Vec3, String> {
    Ok(vec3(
        parse_f32(parts[0])?,
        parse_f32(parts[1])?,
        parse_f32(parts[2])?,
    ))
}

/// `true`/`false`, `none`, `#rrggbb`, a number, `x,y,z`, or free text.
fn parse_value(text: &str) -> Result<PropertyValue, String> {
    match text.to_ascii_lowercase().as_str() {
        "true" => return Ok(PropertyValue::Bool(true)),
        "false" => return Ok(PropertyValue::Bool(false)),
        "none" | "null" => return Ok(PropertyValue::Null),
        _ => {}
    }
    if let Some(hex) = text.strip_prefix('#') {
        if hex.len() != 6 {
            return Err(format!("color '{text}' must be #rrggbb"));
        }
        return u32::from_str_radix(hex, 16)
            .map(PropertyValue::Color)
            .map_err(|_| format!("invalid color '{text}'"));
    }
    if let Ok(number) = text.parse::<f64>() {
        if !number.is_finite() {
            return Err(format!("number '{text}' is not finite"));
        }
        return Ok(PropertyValue::Number(number));
    }
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    if parts.len() == 3 && parts.iter().all(|p| p.parse::<f32>().is_ok()) {
        return parse_vec3(&parts).map(PropertyValue::Vec3);
    }
    Ok(PropertyValue::Text(text.to_owned()))
}
