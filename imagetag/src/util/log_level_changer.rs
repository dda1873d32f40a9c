// This file is part of the product ImageTag.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use env_logger::Logger;
use log::{Level, Log, Metadata, Record, SetLoggerError};

/// Remaps a record from `from` to `to` when its target starts with `prefix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelRule {
    pub prefix: String,
    pub from: Level,
    pub to: Level,
}

impl LevelRule {
    pub fn new(prefix: impl Into<String>, from: Level, to: Level) -> Self {
        Self {
            prefix: prefix.into(),
            from,
            to,
        }
    }
}

/// HTTP client internals are chatty at debug; push them down to trace so
/// `level: debug` shows the session's own decisions.
pub fn http_stack_rules() -> Vec<LevelRule> {
    ["hyper", "hyper_util", "reqwest", "rustls", "h2"]
        .into_iter()
        .map(|prefix| LevelRule::new(prefix, Level::Debug, Level::Trace))
        .collect()
}

fn remap(rules: &[LevelRule], target: &str, level: Level) -> Level {
    rules
        .iter()
        .find(|rule| rule.from == level && target.starts_with(&rule.prefix))
        .map(|rule| rule.to)
        .unwrap_or(level)
}

struct RemappingLogger {
    inner: Logger,
    rules: Vec<LevelRule>,
}

impl Log for RemappingLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let remapped = Metadata::builder()
            .level(remap(&self.rules, metadata.target(), metadata.level()))
            .target(metadata.target())
            .build();
        self.inner.enabled(&remapped)
    }

    fn log(&self, record: &Record) {
        let level = remap(&self.rules, record.target(), record.level());
        self.inner.log(
            &Record::builder()
                .level(level)
                .target(record.target())
                .args(*record.args())
                .module_path(record.module_path())
                .file(record.file())
                .line(record.line())
                .build(),
        );
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

pub fn init_logger(rules: Vec<LevelRule>, logger: Logger) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(RemappingLogger {
        inner: logger,
        rules,
    }))?;
    // Rules may raise a level, so the inner filter decides.
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}
