//! 内容ブリッジ
//!
//! インデックスは内容を保持しない。挿入された単位の意味（CR / LF か否か）と、
//! 行の切り出しに必要な長さ・部分列の取得を外部のバッファ表現に委ねる。

/// 外部バッファとの橋渡し
///
/// 位置と長さはすべて `Item` 単位で数える
pub trait ContentBridge {
    /// インデックスに渡される1単位
    type Item;
    /// 行を切り出す元のバッファ
    type Buffer: ?Sized;

    /// 単位のスカラー値（CR / LF の判定にのみ使用）
    fn scalar_value(item: &Self::Item) -> u32;

    /// バッファの単位数
    fn length_of(buffer: &Self::Buffer) -> usize;

    /// `start` から `length` 単位の部分列
    ///
    /// 呼び出し側は `start + length <= length_of(buffer)` を保証する
    fn slice_of(buffer: &Self::Buffer, start: usize, length: usize) -> &Self::Buffer;
}

/// `char` 単位（位置は文字数）で `str` を扱うブリッジ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CharContent;

impl CharContent {
    fn byte_index(text: &str, char_pos: usize) -> usize {
        text.char_indices()
            .nth(char_pos)
            .map_or(text.len(), |(idx, _)| idx)
    }
}

impl ContentBridge for CharContent {
    type Item = char;
    type Buffer = str;

    fn scalar_value(item: &char) -> u32 {
        u32::from(*item)
    }

    fn length_of(buffer: &str) -> usize {
        buffer.chars().count()
    }

    fn slice_of(buffer: &str, start: usize, length: usize) -> &str {
        let byte_start = Self::byte_index(buffer, start);
        let tail = &buffer[byte_start..];
        let byte_len = Self::byte_index(tail, length);
        &tail[..byte_len]
    }
}

/// バイト単位のブリッジ
///
/// UTF-8 の多バイト列に 0x0D / 0x0A は現れないため、UTF-8 テキストのバイト位置にもそのまま使える
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ByteContent;

impl ContentBridge for ByteContent {
    type Item = u8;
    type Buffer = [u8];

    fn scalar_value(item: &u8) -> u32 {
        u32::from(*item)
    }

    fn length_of(buffer: &[u8]) -> usize {
        buffer.len()
    }

    fn slice_of(buffer: &[u8], start: usize, length: usize) -> &[u8] {
        &buffer[start..start + length]
    }
}

/// UTF-16 コード単位のブリッジ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Utf16Content;

impl ContentBridge for Utf16Content {
    type Item = u16;
    type Buffer = [u16];

    fn scalar_value(item: &u16) -> u32 {
        u32::from(*item)
    }

    fn length_of(buffer: &[u16]) -> usize {
        buffer.len()
    }

    fn slice_of(buffer: &[u16], start: usize, length: usize) -> &[u16] {
        &buffer[start..start + length]
    }
}
