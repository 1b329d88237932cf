//! 区画書き込み器
//!
//! 分類済みの単位を末尾の開いた区画へ書き込み、終端で区画を閉じる。
//! 追記・挿入・削除のすべてがこの1つの経路を通る。

use super::ending::{EndingConvention, LineEnding, Unit};
use super::segment::LineSegment;

/// 区画列の末尾へ単位を書き込む
///
/// `segments` の最後の要素が書き込み中の開いた区画。
/// 直前の区画が `Cr` で閉じ、開いた区画が空のとき、続く LF はその区画を `CrLf` に格上げする。
pub(crate) struct SegmentWriter<'a> {
    segments: &'a mut Vec<LineSegment>,
    convention: EndingConvention,
}

impl<'a> SegmentWriter<'a> {
    pub(crate) fn new(segments: &'a mut Vec<LineSegment>, convention: EndingConvention) -> Self {
        debug_assert!(!segments.is_empty());
        Self {
            segments,
            convention,
        }
    }

    fn open_index(&self) -> usize {
        self.segments.len() - 1
    }

    fn open_segment(&mut self) -> &mut LineSegment {
        let index = self.open_index();
        &mut self.segments[index]
    }

    /// 直前の CR が LF を待っている状態か
    pub(crate) fn awaits_line_feed(&self) -> bool {
        let open = self.open_index();
        self.convention.pairs_crlf()
            && open > 0
            && self.segments[open].length == 0
            && self.segments[open - 1].ending == LineEnding::Cr
    }

    /// スカラー値を分類して書き込む
    pub(crate) fn write_scalar(&mut self, scalar: u32) {
        let unit = self.convention.classify(scalar);
        self.write(unit);
    }

    pub(crate) fn write(&mut self, unit: Unit) {
        match unit {
            Unit::Cr => self.close(LineEnding::Cr),
            Unit::Lf if self.awaits_line_feed() => {
                let open = self.open_index();
                let closed = &mut self.segments[open - 1];
                closed.length += 1;
                closed.ending = LineEnding::CrLf;
                self.segments[open].position += 1;
            }
            Unit::Lf => self.close(LineEnding::Lf),
            Unit::Other => self.write_others(1),
        }
    }

    /// 終端でない単位をまとめて書き込む
    pub(crate) fn write_others(&mut self, count: usize) {
        self.open_segment().length += count;
    }

    /// 区画の `range`（区画先頭からの桁範囲）にある単位を再生する
    ///
    /// 内容部分は終端でない単位、末尾は終端の単位として書き込む
    pub(crate) fn replay(&mut self, segment: &LineSegment, start: usize, end: usize) {
        let content = segment.content_length();
        let end = end.min(segment.length);
        if start >= end {
            return;
        }

        if start < content {
            self.write_others(end.min(content) - start);
        }

        for (offset, unit) in segment.ending.units().iter().enumerate() {
            let column = content + offset;
            if (start..end).contains(&column) {
                self.write(*unit);
            }
        }
    }

    fn close(&mut self, ending: LineEnding) {
        let segment = self.open_segment();
        segment.length += ending.size();
        segment.ending = ending;
        let next = LineSegment::open(segment.line_number + 1, segment.end());
        self.segments.push(next);
    }
}
