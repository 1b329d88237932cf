//! 行区画テーブル
//!
//! 1物理行（または終端未確定の部分行）を表す区画を位置順に保持する。
//! インデックスの状態はすべてこのテーブルが所有する。

use super::ending::{EndingConvention, LineEnding};
use crate::error::{LineIndexError, Result};
use serde::{Deserialize, Serialize};

/// 行区画
///
/// `length` は終端の単位数を含む
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LineSegment {
    pub line_number: usize,
    pub position: usize,
    pub length: usize,
    pub ending: LineEnding,
}

impl LineSegment {
    pub const fn new(line_number: usize, position: usize, length: usize, ending: LineEnding) -> Self {
        Self {
            line_number,
            position,
            length,
            ending,
        }
    }

    /// 終端のない長さ0の区画
    pub(crate) const fn open(line_number: usize, position: usize) -> Self {
        Self::new(line_number, position, 0, LineEnding::None)
    }

    /// 区画末尾の次の位置
    pub const fn end(&self) -> usize {
        self.position + self.length
    }

    /// 終端を除いた内容の長さ
    pub const fn content_length(&self) -> usize {
        self.length.saturating_sub(self.ending.size())
    }

    /// 内容を持たない単独の LF 区画か
    pub(crate) fn is_bare_line_feed(&self) -> bool {
        self.ending == LineEnding::Lf && self.length == 1
    }
}

/// 位置・行番号・桁の組
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextLocation {
    pub position: usize,
    pub line: usize,
    pub column: usize,
}

impl TextLocation {
    pub const fn new(position: usize, line: usize, column: usize) -> Self {
        Self {
            position,
            line,
            column,
        }
    }
}

/// 区画の並びと総長
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SegmentTable {
    pub(crate) segments: Vec<LineSegment>,
    pub(crate) length: usize,
}

impl SegmentTable {
    pub(crate) fn new() -> Self {
        Self {
            segments: vec![LineSegment::open(0, 0)],
            length: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_segments(segments: Vec<LineSegment>) -> Self {
        let length = segments.iter().map(|segment| segment.length).sum();
        Self { segments, length }
    }

    pub(crate) fn last_index(&self) -> usize {
        self.segments.len() - 1
    }

    pub(crate) fn last(&self) -> &LineSegment {
        &self.segments[self.last_index()]
    }

    pub(crate) fn line_count(&self) -> usize {
        self.last().line_number + 1
    }

    /// 位置を含む区画の添字（二分探索）
    ///
    /// 総長と等しい位置は最後の区画に解決する
    pub(crate) fn index_from_position(&self, position: usize) -> Option<usize> {
        if position == self.length {
            return Some(self.last_index());
        }

        let index = self
            .segments
            .partition_point(|segment| segment.end() <= position);

        match self.segments.get(index) {
            Some(segment) if segment.position <= position => Some(index),
            _ => None,
        }
    }

    /// 指定行番号を持つ区画の添字（二分探索）
    pub(crate) fn index_from_number(&self, line_number: usize) -> Option<usize> {
        let index = self
            .segments
            .partition_point(|segment| segment.line_number < line_number);

        match self.segments.get(index) {
            Some(segment) if segment.line_number == line_number => Some(index),
            _ => None,
        }
    }

    /// 添字の区画と同じ行番号を持つ連続区画の範囲（両端を含む）
    pub(crate) fn line_span(&self, index: usize) -> (usize, usize) {
        let line_number = self.segments[index].line_number;

        let mut first = index;
        while first > 0 && self.segments[first - 1].line_number == line_number {
            first -= 1;
        }

        let mut last = index;
        while last + 1 < self.segments.len() && self.segments[last + 1].line_number == line_number {
            last += 1;
        }

        (first, last)
    }

    /// 範囲の区画を1つの論理行に結合
    pub(crate) fn join(&self, first: usize, last: usize) -> LineSegment {
        self.segments[first + 1..=last]
            .iter()
            .fold(self.segments[first], |mut line, next| {
                line.length += next.length;
                line.ending = next.ending;
                line
            })
    }

    /// `from` 以降の区画の位置と行番号をずらす
    pub(crate) fn adjust(&mut self, from: usize, lines: isize, positions: isize) -> Result<()> {
        if lines == 0 && positions == 0 {
            return Ok(());
        }

        for (index, segment) in self.segments.iter_mut().enumerate().skip(from) {
            let (Some(line_number), Some(position)) = (
                segment.line_number.checked_add_signed(lines),
                segment.position.checked_add_signed(positions),
            ) else {
                return Err(LineIndexError::violation(format!(
                    "adjusting segment {index} by ({lines}, {positions}) underflows"
                )));
            };
            segment.line_number = line_number;
            segment.position = position;
        }

        Ok(())
    }

    /// 不変条件をすべて検査し、最初の違反を報告する
    pub(crate) fn validate(&self, convention: EndingConvention) -> Result<()> {
        let Some(first) = self.segments.first() else {
            return Err(LineIndexError::violation("segment table is empty"));
        };

        if first.position != 0 || first.line_number != 0 {
            return Err(LineIndexError::violation(format!(
                "first segment starts at line {} position {}",
                first.line_number, first.position
            )));
        }

        let mut total = 0usize;
        for (index, segment) in self.segments.iter().enumerate() {
            if segment.length < segment.ending.size() {
                return Err(LineIndexError::violation(format!(
                    "segment {index} is shorter than its {:?} ending",
                    segment.ending
                )));
            }
            total += segment.length;

            let Some(next) = self.segments.get(index + 1) else {
                break;
            };

            if segment.end() != next.position {
                return Err(LineIndexError::violation(format!(
                    "segment {} starts at {} but segment {index} ends at {}",
                    index + 1,
                    next.position,
                    segment.end()
                )));
            }

            if !segment.ending.is_terminator() {
                return Err(LineIndexError::violation(format!(
                    "unterminated segment {index} is not the last one"
                )));
            }

            let advances = next.line_number == segment.line_number + 1;
            let shares = convention.pairs_crlf()
                && segment.ending == LineEnding::Cr
                && next.line_number == segment.line_number;
            if !advances && !shares {
                return Err(LineIndexError::violation(format!(
                    "segment {} has line {} after line {}",
                    index + 1,
                    next.line_number,
                    segment.line_number
                )));
            }
        }

        if total != self.length {
            return Err(LineIndexError::violation(format!(
                "segments cover {total} units but {} are tracked",
                self.length
            )));
        }

        Ok(())
    }
}
