// Callboard
// Copyright (C) 2025 Callboard contributors

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use figment_file_provider_adapter::FileAdapter;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::channels::ChannelRef;
use callboard_common::error::{CallboardError, Result};

/// Runtime configuration, merged from an optional TOML file and `CALLBOARD_*`
/// environment variables (the environment wins). Any variable can also be
/// given as `CALLBOARD_<NAME>_FILE` naming a file that holds the value, for
/// tokens kept in secret files.
///
/// Every field is optional at load time; each subcommand demands what it
/// actually uses through the accessors.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Bot API token.
    pub token: Option<String>,
    /// Channel every user of the bot must be subscribed to, as a numeric id
    /// or a public `@handle`.
    pub required_channel: Option<String>,
    /// Database file. Defaults to the platform data directory.
    pub database: Option<PathBuf>,
    /// Address for the operator socket. Without it the socket stays off.
    pub bind: Option<String>,
    /// Token clients of the operator socket must present.
    pub auth: Option<String>,
}

impl Config {
    pub fn load(file: Option<&Path>) -> Result<Config> {
        let mut figment = Figment::new();
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        let config = figment
            .merge(FileAdapter::wrap(Env::prefixed("CALLBOARD_")))
            .extract()?;
        Ok(config)
    }

    pub fn token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| CallboardError::Config("no bot token configured".to_owned()))
    }

    pub fn required_channel(&self) -> Result<ChannelRef> {
        let raw = self.required_channel.as_deref().ok_or_else(|| {
            CallboardError::Config("no required channel configured".to_owned())
        })?;
        ChannelRef::parse(raw)
            .ok_or_else(|| CallboardError::Config(format!("invalid required_channel {raw:?}")))
    }

    /// The configured database file, or `callboard.db` under the platform
    /// data directory, which is created when missing.
    pub fn database(&self) -> Result<PathBuf> {
        match &self.database {
            Some(path) => Ok(path.clone()),
            None => {
                let dirs = ProjectDirs::from("", "", "callboard").ok_or_else(|| {
                    CallboardError::Directory("could not determine a data directory".to_owned())
                })?;
                fs::create_dir_all(dirs.data_dir())?;
                Ok(dirs.data_dir().join("callboard.db"))
            }
        }
    }
}
