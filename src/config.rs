//! 行インデックスの設定
//!
//! 改行規約は生成時に固定され、以後変更できない

use crate::error::ConfigError;
use crate::lines::EndingConvention;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// インデックス生成時のオプション
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LineIndexConfig {
    /// 改行規約
    pub convention: EndingConvention,
    /// 変更のたびに全不変条件を検査する（デバッグ向け）
    pub verify_invariants: bool,
}

impl LineIndexConfig {
    pub fn new(convention: EndingConvention) -> Self {
        Self {
            convention,
            verify_invariants: false,
        }
    }

    pub fn with_verification(mut self, enabled: bool) -> Self {
        self.verify_invariants = enabled;
        self
    }

    /// JSON 文字列から読み込む（未指定の項目は既定値）
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// JSON ファイルから読み込む
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let config = Self::from_json_str(&content).map_err(|e| ConfigError::InvalidFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        log::debug!(
            "loaded line index config from {}: {:?}",
            path.display(),
            config
        );
        Ok(config)
    }
}
