use std::num::ParseIntError;
use thiserror::Error;

pub type PacketResult<T> = Result<T, PacketError>;
pub type CaptureResult<T> = Result<T, CaptureError>;

#[derive(Error, Debug)]
pub enum PacketError {
    // ネットワーク層またはトランスポート層が存在しない
    #[error("無効または破損したパケットです")]
    InvalidPacket,

    #[error("エンドポイントをポート番号として解析できません: {endpoint}")]
    MalformedEndpoint {
        endpoint: String,
        #[source]
        source: ParseIntError,
    },
}

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("キャプチャファイルの入出力エラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("未対応のキャプチャ形式です (マジックナンバー: 0x{0:08x})")]
    UnknownFormat(u32),

    #[error("キャプチャファイルの解析に失敗しました: {0}")]
    Parse(String),

    #[error("未対応のリンクタイプです: {0}")]
    UnsupportedLinkType(i32),
}

#[derive(Error, Debug)]
pub enum InitProcessError {
    #[error("ロガーのセットアップに失敗しました: {0}")]
    LoggerError(String),

    #[error("環境変数ファイルの読み込みに失敗しました: {0}")]
    EnvFileReadError(String),

    #[error("環境変数の取得に失敗しました: {0}")]
    EnvVarError(String),

    #[error("環境変数の解析に失敗しました: {0}")]
    EnvVarParseError(String),

    #[error("キャプチャファイルを開けませんでした: {0}")]
    CaptureOpenError(#[from] CaptureError),
}
