//! エラーハンドリング
//!
//! 行インデックス全体で使用されるエラー型を定義
//! 範囲外の引数は呼び出し側の誤り、内部不変条件の破れは実装の欠陥として区別する

use thiserror::Error;

/// 行インデックス操作のエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineIndexError {
    /// 行番号・位置・削除量が有効範囲外（テーブルは変更されない）
    #[error("{argument} {value} is out of range (limit {limit})")]
    OutOfRange {
        argument: &'static str,
        value: usize,
        limit: usize,
    },

    /// 内部状態の不変条件違反（致命的）
    #[error("line table invariant violated: {detail}")]
    InvariantViolation { detail: String },

    /// 以前の不変条件違反によりインデックスが使用不能
    #[error("line index is corrupted by an earlier failure")]
    Corrupted,
}

impl LineIndexError {
    pub(crate) fn out_of_range(argument: &'static str, value: usize, limit: usize) -> Self {
        Self::OutOfRange {
            argument,
            value,
            limit,
        }
    }

    pub(crate) fn violation(detail: impl Into<String>) -> Self {
        Self::InvariantViolation {
            detail: detail.into(),
        }
    }

    /// 回復不能なエラーかどうか
    ///
    /// `OutOfRange` 以外はインデックスの欠陥を示し、同じインスタンスでの再試行は無意味
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::OutOfRange { .. })
    }
}

/// 設定読み込みのエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration file: {path}: {message}")]
    InvalidFile { path: String, message: String },

    #[error("Invalid configuration: {message}")]
    Parse { message: String },
}

/// 行インデックス操作の結果型
pub type Result<T> = std::result::Result<T, LineIndexError>;
