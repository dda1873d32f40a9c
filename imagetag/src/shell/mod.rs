// This file is part of the product ImageTag.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Headless stand-in for the UI shell: turns command tokens into session
//! events and renders the resulting state as text.

pub(crate) mod parse_utils;

use crate::backend::UploadFile;
use crate::session::{
    GallerySelector, ImageSession, MutationOutcome, SelectOutcome, SessionError, SessionSnapshot,
};
use crate::tagging::{ClickPosition, ViewportRect};
use parse_utils::{next_number, next_value, parse_required_arg};
use std::fmt;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellErrorKind {
    Usage,
    Failed,
}

#[derive(Debug, Clone)]
pub struct ShellError {
    kind: ShellErrorKind,
    message: String,
}

impl ShellError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self {
            kind: ShellErrorKind::Usage,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            kind: ShellErrorKind::Failed,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ShellErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> i32 {
        match self.kind {
            ShellErrorKind::Usage => 2,
            ShellErrorKind::Failed => 1,
        }
    }
}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ShellError {}

impl From<SessionError> for ShellError {
    fn from(error: SessionError) -> Self {
        ShellError::failed(error.to_string())
    }
}

impl From<std::io::Error> for ShellError {
    fn from(error: std::io::Error) -> Self {
        ShellError::failed(format!("Failed to write output: {}", error))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Show {
        id: Option<String>,
    },
    List,
    Tag {
        id: String,
        at: ClickPosition,
        name: String,
    },
    Reset {
        id: String,
    },
    Upload {
        path: PathBuf,
        title: String,
    },
}

pub fn help_text() -> &'static str {
    "Usage: imagetag [-C <root>] <command>\n\
     \n\
     Commands:\n\
     \x20 show [<id>]                              Show an image and its tags (default image when omitted)\n\
     \x20 list                                     List all images by title\n\
     \x20 tag <id> --at <px> <py> --name <name>    Tag the image at a click position in the 600x600 view\n\
     \x20 reset <id>                               Replace the image's tags with the example tag\n\
     \x20 upload <file> --title <title>            Upload a PNG, JPEG or WebP image and show it\n\
     \x20 help                                     Show this help\n\
     \n\
     -C <root> selects the directory holding config.yaml (default: current directory).\n"
}

pub fn parse_command(tokens: &[String]) -> Result<ShellCommand, ShellError> {
    let Some((command, args)) = tokens.split_first() else {
        return Err(ShellError::usage("Missing command"));
    };
    match command.to_ascii_lowercase().as_str() {
        "show" => parse_show(args),
        "list" | "ls" => expect_no_args("list", args).map(|_| ShellCommand::List),
        "tag" => parse_tag(args),
        "reset" => parse_reset(args),
        "upload" => parse_upload(args),
        other => Err(ShellError::usage(format!("Unknown command '{}'", other))),
    }
}

fn expect_no_args(command: &str, args: &[String]) -> Result<(), ShellError> {
    match args.first() {
        Some(extra) => Err(ShellError::usage(format!(
            "Unexpected argument '{}' for {}",
            extra, command
        ))),
        None => Ok(()),
    }
}

fn parse_show(args: &[String]) -> Result<ShellCommand, ShellError> {
    match args {
        [] => Ok(ShellCommand::Show { id: None }),
        [id] => Ok(ShellCommand::Show {
            id: Some(id.clone()),
        }),
        [_, extra, ..] => Err(ShellError::usage(format!(
            "Unexpected argument '{}' for show",
            extra
        ))),
    }
}

fn parse_tag(args: &[String]) -> Result<ShellCommand, ShellError> {
    let (id, rest) = parse_required_arg(args, "image id")?;
    let mut at = None;
    let mut name = None;
    let mut idx = 0;
    while idx < rest.len() {
        let flag = rest[idx].as_str();
        idx += 1;
        match flag {
            "--at" => {
                let x = next_number(rest, &mut idx, "--at")?;
                let y = next_number(rest, &mut idx, "--at")?;
                at = Some(ClickPosition::new(x, y));
            }
            "--name" => name = Some(next_value(rest, &mut idx, "--name")?),
            other => {
                return Err(ShellError::usage(format!(
                    "Unknown option '{}' for tag",
                    other
                )));
            }
        }
    }
    Ok(ShellCommand::Tag {
        id,
        at: at.ok_or_else(|| ShellError::usage("tag requires --at <px> <py>"))?,
        name: name.ok_or_else(|| ShellError::usage("tag requires --name <name>"))?,
    })
}

fn parse_reset(args: &[String]) -> Result<ShellCommand, ShellError> {
    let (id, rest) = parse_required_arg(args, "image id")?;
    expect_no_args("reset", rest)?;
    Ok(ShellCommand::Reset { id })
}

fn parse_upload(args: &[String]) -> Result<ShellCommand, ShellError> {
    let (path, rest) = parse_required_arg(args, "file path")?;
    let mut title = None;
    let mut idx = 0;
    while idx < rest.len() {
        let flag = rest[idx].as_str();
        idx += 1;
        match flag {
            "--title" => title = Some(next_value(rest, &mut idx, "--title")?),
            other => {
                return Err(ShellError::usage(format!(
                    "Unknown option '{}' for upload",
                    other
                )));
            }
        }
    }
    Ok(ShellCommand::Upload {
        path: PathBuf::from(path),
        title: title.unwrap_or_default(),
    })
}

/// Runs one command against the session and writes the result to `out`.
pub async fn run_command(
    session: &ImageSession,
    gallery: &mut GallerySelector,
    command: ShellCommand,
    out: &mut dyn Write,
) -> Result<(), ShellError> {
    match command {
        ShellCommand::Show { id } => {
            match id {
                Some(id) => gallery.choose(session, &id).await?,
                None => session.start().await?,
            };
            render_snapshot(&session.snapshot(), out)?;
        }
        ShellCommand::List => {
            gallery.force_refresh(session).await?;
            if gallery.entries().is_empty() {
                writeln!(out, "No images uploaded yet.")?;
            }
            for entry in gallery.entries() {
                writeln!(out, "{}  {}  {}", entry.id, entry.title, entry.file_url)?;
            }
        }
        ShellCommand::Tag { id, at, name } => {
            ensure_applied(session.select(&id).await?)?;
            let coordinates = session.click(at, ViewportRect::default());
            writeln!(
                out,
                "Clicked position: x: {}, y: {}",
                coordinates.x, coordinates.y
            )?;
            if session.add_tag(&name).await? == MutationOutcome::Skipped {
                writeln!(out, "Tag name is empty; nothing saved.")?;
            }
            render_snapshot(&session.snapshot(), out)?;
        }
        ShellCommand::Reset { id } => {
            ensure_applied(session.select(&id).await?)?;
            session.reset_tags().await?;
            render_snapshot(&session.snapshot(), out)?;
        }
        ShellCommand::Upload { path, title } => {
            let file = UploadFile::from_path(&path)
                .await
                .map_err(SessionError::from)?;
            let record = session.upload(&title, file).await?;
            writeln!(out, "Uploaded {} as record {}", path.display(), record.id)?;
            render_snapshot(&session.snapshot(), out)?;
        }
    }
    Ok(())
}

fn ensure_applied(outcome: SelectOutcome) -> Result<(), ShellError> {
    match outcome {
        SelectOutcome::Applied => Ok(()),
        SelectOutcome::Cleared => Err(ShellError::usage("An image id is required")),
        SelectOutcome::Stale => Err(ShellError::failed("Selection changed while loading")),
    }
}

pub fn render_snapshot(snapshot: &SessionSnapshot, out: &mut dyn Write) -> std::io::Result<()> {
    let Some(record) = &snapshot.record else {
        return writeln!(out, "No image loaded.");
    };
    let title = if record.title.is_empty() {
        "(untitled)"
    } else {
        record.title.as_str()
    };
    writeln!(out, "{} [{}]", title, record.id)?;
    if let Some(file_url) = &snapshot.file_url {
        writeln!(out, "Image: {}", file_url)?;
    }
    writeln!(out, "Image Tags:")?;
    if snapshot.tags.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for tag in &snapshot.tags {
        writeln!(
            out,
            "  {}: (x: {}, y: {})",
            tag.name, tag.coordinates.x, tag.coordinates.y
        )?;
    }
    Ok(())
}
