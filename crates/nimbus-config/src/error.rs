use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("設定ディレクトリが見つかりません")]
    ConfigDirNotFound,

    #[error(
        "設定ファイルが見つかりません。以下の場所を確認してください:\n\
        - カレントディレクトリ: nimbus.local.kdl, .nimbus.local.kdl, nimbus.kdl, .nimbus.kdl\n\
        - ./.nimbus/ ディレクトリ\n\
        - ~/.config/nimbus/nimbus.kdl\n\
        または NIMBUS_CONFIG_PATH 環境変数で直接指定できます"
    )]
    ConfigFileNotFound,

    #[error("KDL パースエラー: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error("不正な設定: {0}")]
    InvalidConfig(String),

    #[error("未対応のプロバイダー: {kind} \"{name}\"")]
    UnknownProvider { kind: &'static str, name: String },

    #[error("IO エラー: {path}\n理由: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
