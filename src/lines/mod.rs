//! 行インデックスモジュール
//!
//! 区画テーブル、問い合わせ、編集、内容ブリッジを提供

pub mod bridge;
pub mod ending;
pub mod index;
pub mod iter;
pub mod segment;
mod writer;

// 公開API
pub use bridge::{ByteContent, CharContent, ContentBridge, Utf16Content};
pub use ending::{EndingConvention, LineEnding, Unit, CARRIAGE_RETURN, LINE_FEED};
pub use index::LineIndex;
pub use iter::{ExtractLines, Lines};
pub use segment::{LineSegment, TextLocation};

/// 文字単位のインデックス
pub type CharLineIndex = LineIndex<CharContent>;
/// バイト単位のインデックス
pub type ByteLineIndex = LineIndex<ByteContent>;
