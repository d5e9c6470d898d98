// Copyright 2024, The Tari Project
//
// Redistribution and use in source and binary forms, with or without modification, are permitted provided that the
// following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this list of conditions and the following
// disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice, this list of conditions and the
// following disclaimer in the documentation and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its contributors may be used to endorse or promote
// products derived from this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES,
// INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
// SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
// WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
// USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use std::{fs, path::Path};

use anyhow::Context;

/// Sets up log4rs from the YAML file at `config_file`, writing `default_config` there first if the file does not exist
pub fn initialize_logging(config_file: &Path, default_config: &str) -> anyhow::Result<()> {
    install_default_logfile_config(config_file, default_config)?;
    println!("Initializing logging according to {}", config_file.display());
    log4rs::init_file(config_file, Default::default())
        .with_context(|| format!("Could not load the log configuration in {}", config_file.display()))?;
    Ok(())
}

/// Writes the sample log configuration to `path` unless a file is already there. Returns true if it was written.
pub fn install_default_logfile_config(path: &Path, default_config: &str) -> anyhow::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, default_config)
        .with_context(|| format!("Could not write a sample log configuration to {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sample_is_installed_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("log4rs.yml");
        assert!(install_default_logfile_config(&path, "root: {}").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "root: {}");

        fs::write(&path, "edited").unwrap();
        assert!(!install_default_logfile_config(&path, "root: {}").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "edited");
    }
}
