//! 行の列挙

use super::bridge::ContentBridge;
use super::segment::LineSegment;
use std::iter::FusedIterator;
use std::marker::PhantomData;

/// 論理行を昇順に返すイテレータ
///
/// 区画テーブルの借用スナップショット上を走査する。`clone` すれば先頭から再走査できる。
/// `CrLfExact` では同じ行番号を共有する区画を結合して1行として返す。
#[derive(Debug, Clone)]
pub struct Lines<'a> {
    segments: &'a [LineSegment],
    next: usize,
    join: bool,
}

impl<'a> Lines<'a> {
    pub(crate) fn new(segments: &'a [LineSegment], join: bool) -> Self {
        Self {
            segments,
            next: 0,
            join,
        }
    }
}

impl Iterator for Lines<'_> {
    type Item = LineSegment;

    fn next(&mut self) -> Option<LineSegment> {
        let mut line = *self.segments.get(self.next)?;
        self.next += 1;

        if self.join {
            while let Some(segment) = self.segments.get(self.next) {
                if segment.line_number != line.line_number {
                    break;
                }
                line.length += segment.length;
                line.ending = segment.ending;
                self.next += 1;
            }
        }

        Some(line)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.segments.len() - self.next;
        if self.join {
            (usize::from(remaining > 0), Some(remaining))
        } else {
            (remaining, Some(remaining))
        }
    }
}

impl FusedIterator for Lines<'_> {}

/// 各行の内容をバッファから切り出すイテレータ
pub struct ExtractLines<'a, 'b, B: ContentBridge> {
    lines: Lines<'a>,
    buffer: &'b B::Buffer,
    include_ending: bool,
    bridge: PhantomData<fn() -> B>,
}

impl<'a, 'b, B: ContentBridge> ExtractLines<'a, 'b, B> {
    pub(crate) fn new(lines: Lines<'a>, buffer: &'b B::Buffer, include_ending: bool) -> Self {
        Self {
            lines,
            buffer,
            include_ending,
            bridge: PhantomData,
        }
    }
}

impl<'a, 'b, B: ContentBridge> Clone for ExtractLines<'a, 'b, B> {
    fn clone(&self) -> Self {
        Self::new(self.lines.clone(), self.buffer, self.include_ending)
    }
}

impl<'b, B: ContentBridge> Iterator for ExtractLines<'_, 'b, B> {
    type Item = &'b B::Buffer;

    fn next(&mut self) -> Option<&'b B::Buffer> {
        let line = self.lines.next()?;
        Some(slice_line::<B>(self.buffer, &line, self.include_ending))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.lines.size_hint()
    }
}

impl<B: ContentBridge> FusedIterator for ExtractLines<'_, '_, B> {}

/// 行の範囲をバッファから切り出す
///
/// 追跡中の内容より短いバッファは末尾で切り詰める
pub(crate) fn slice_line<'b, B: ContentBridge>(
    buffer: &'b B::Buffer,
    line: &LineSegment,
    include_ending: bool,
) -> &'b B::Buffer {
    let length = if include_ending {
        line.length
    } else {
        line.content_length()
    };

    let available = B::length_of(buffer);
    let start = line.position.min(available);
    let length = length.min(available - start);

    B::slice_of(buffer, start, length)
}
