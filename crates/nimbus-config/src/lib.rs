//! nimbus 設定
//!
//! nimbus.kdl の探索とパース。

pub mod error;
pub mod model;
pub mod parser;

pub use error::*;
pub use model::*;
pub use parser::{DEFAULT_API_TOKEN_ENV, DEFAULT_PROXY_LB_PLAN, parse_config, parse_config_file};

use std::path::PathBuf;

/// 設定ファイルを直接指定する環境変数
pub const CONFIG_PATH_ENV: &str = "NIMBUS_CONFIG_PATH";

const CANDIDATES: [&str; 4] = [
    "nimbus.local.kdl",
    ".nimbus.local.kdl",
    "nimbus.kdl",
    ".nimbus.kdl",
];

/// nimbus のグローバル設定ディレクトリを取得
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("nimbus");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// nimbus.kdl を探す
///
/// 以下の優先順位で設定ファイルを検索:
/// 1. 環境変数 NIMBUS_CONFIG_PATH (直接パス指定)
/// 2. カレントディレクトリ: nimbus.local.kdl, .nimbus.local.kdl, nimbus.kdl, .nimbus.kdl
/// 3. ./.nimbus/ ディレクトリ内: 同様の順序
/// 4. ~/.config/nimbus/nimbus.kdl (グローバル設定)
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(
            "{} points to a missing file: {}",
            CONFIG_PATH_ENV,
            path.display()
        );
    }

    let current_dir = std::env::current_dir()?;

    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    let nimbus_dir = current_dir.join(".nimbus");
    if nimbus_dir.is_dir() {
        for filename in &CANDIDATES {
            let path = nimbus_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("nimbus").join("nimbus.kdl");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

/// 設定ファイルを探してパースする
pub fn load_config() -> Result<(PathBuf, NimbusConfig)> {
    let path = find_config_file()?;
    let config = parse_config_file(&path)?;
    Ok((path, config))
}
