//! altre-lines - 増分行インデックス
//!
//! 可変な単位列の行分割を CR / LF / CRLF の規約に従って保持し、
//! 位置⇔行・桁の問い合わせに全体の再走査なしで答える

// コアモジュール
pub mod config;
pub mod error;

// データ層
pub mod lines;

// 公開API
pub use config::LineIndexConfig;
pub use error::{ConfigError, LineIndexError, Result};
pub use lines::{
    ByteContent, ByteLineIndex, CharContent, CharLineIndex, ContentBridge, EndingConvention,
    LineEnding, LineIndex, LineSegment, TextLocation,
};
