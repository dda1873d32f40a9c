// This file is part of the product ImageTag.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::ShellError;

pub(crate) fn parse_required_arg<'a>(
    args: &'a [String],
    label: &str,
) -> Result<(String, &'a [String]), ShellError> {
    if args.is_empty() {
        return Err(ShellError::usage(format!("Missing {}", label)));
    }
    Ok((args[0].clone(), &args[1..]))
}

pub(crate) fn next_value(args: &[String], idx: &mut usize, flag: &str) -> Result<String, ShellError> {
    if *idx >= args.len() {
        return Err(ShellError::usage(format!("{} requires a value", flag)));
    }
    let value = args[*idx].clone();
    *idx += 1;
    Ok(value)
}

pub(crate) fn next_number(args: &[String], idx: &mut usize, flag: &str) -> Result<f64, ShellError> {
    let value = next_value(args, idx, flag)?;
    value
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .ok_or_else(|| ShellError::usage(format!("{} expects numbers, got '{}'", flag, value)))
}
