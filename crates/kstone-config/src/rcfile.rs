// ── openrc files ──
//
// The shell snippets operators source before using the CLI:
//
//     export OS_USERNAME=admin
//     export OS_PASSWORD='secret'
//     OS_AUTH_URL="http://127.0.0.1:5000/v3"
//
// Only `OS_*` assignments are read. Nothing is evaluated.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::ConfigError;
use crate::env::EnvSource;

/// File name looked up in the home directory.
pub const RC_FILE_NAME: &str = "openrc";

/// `OS_*` variables read from an rc-file.
pub type RcVars = HashMap<String, String>;

/// Extract `OS_*` assignments from rc-file text. Later assignments win.
pub fn parse_rc(text: &str) -> RcVars {
    let mut vars = RcVars::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").map_or(line, str::trim_start);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if !key.starts_with("OS_") || key.contains(char::is_whitespace) {
            continue;
        }
        vars.insert(key.to_owned(), unquote(value.trim()).to_owned());
    }
    vars
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// Read and parse an rc-file. A missing file yields no variables.
pub fn read_rc(path: &Path) -> Result<RcVars, ConfigError> {
    match fs::read_to_string(path) {
        Ok(text) => {
            let vars = parse_rc(&text);
            debug!(path = %path.display(), vars = vars.len(), "read rc-file");
            Ok(vars)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(RcVars::new()),
        Err(err) => Err(ConfigError::Io(err)),
    }
}

/// `<home>/openrc`, or `explicit` when a profile names another file.
pub fn rc_path(explicit: Option<&Path>, env: &impl EnvSource) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| env.home_dir().map(|home| home.join(RC_FILE_NAME)))
}
