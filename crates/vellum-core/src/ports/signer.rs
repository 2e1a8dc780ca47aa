//! Signer port - バイト列への電子署名
//!
//! # 実装
//! - **KeyFileSigner**: 鍵ファイル + 設定されたアルゴリズムで署名（`impls::key_file_signer`）

use std::path::PathBuf;

use thiserror::Error;

/// Signer は payload に対する署名を作る
///
/// # 設計原則
/// - 戻り値は保存用に base64 エンコード済みの文字列
/// - 失敗時に部分的な署名を返すことはない
/// - ネットワーク I/O はしない（鍵ファイルの読み込みのみ）
/// - 決定性は署名方式に依存する。呼び出し側は決定性を仮定しないこと
pub trait Signer: Send + Sync {
    /// `context` はログ用のファイル名。空なら [`SignError::MissingContext`]
    fn sign(&self, payload: &[u8], context: &str) -> Result<String, SignError>;
}

/// SignError は署名処理の失敗
///
/// 鍵の読み込み・アルゴリズム解決・署名プリミティブのどこで失敗しても
/// このエラーにまとめられ、元の原因を保持します。
#[derive(Debug, Error)]
pub enum SignError {
    /// 呼び出し側の契約違反（I/O の前に検出）
    #[error("sign called without a context name")]
    MissingContext,

    #[error("failed to read private key from {path}")]
    KeyLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode private key: {0}")]
    KeyDecode(String),

    #[error("unsupported key algorithm: {0:?}")]
    UnsupportedKeyAlgorithm(String),

    #[error("unsupported signature algorithm: {0:?}")]
    UnsupportedSignatureAlgorithm(String),

    #[error("signing primitive failed")]
    Primitive(#[source] Box<dyn std::error::Error + Send + Sync>),
}
