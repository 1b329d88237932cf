//! 増分行インデックス
//!
//! 外部に保持された単位列の行分割を区画テーブルで管理し、
//! 編集のたびに全体を再走査せず位置⇔行・桁の問い合わせに答える。

use super::bridge::{CharContent, ContentBridge};
use super::ending::EndingConvention;
use super::iter::{slice_line, ExtractLines, Lines};
use super::segment::{LineSegment, SegmentTable, TextLocation};
use super::writer::SegmentWriter;
use crate::config::LineIndexConfig;
use crate::error::{LineIndexError, Result};
use std::marker::PhantomData;

/// 再構築中の区画範囲
///
/// `segments` は直前の区画（あれば）と、範囲先頭から書き直す開いた区画で始まる
struct Window {
    first: usize,
    last: usize,
    has_context: bool,
    segments: Vec<LineSegment>,
}

/// 増分行インデックス
///
/// 内容そのものは保持せず、`B` を通して単位の意味を解釈する。
/// 単一スレッドでの利用を前提とし、列挙中の変更は借用規則で禁止される。
#[derive(Debug, Clone)]
pub struct LineIndex<B: ContentBridge = CharContent> {
    table: SegmentTable,
    config: LineIndexConfig,
    corrupted: bool,
    bridge: PhantomData<fn() -> B>,
}

impl<B: ContentBridge> LineIndex<B> {
    /// 指定の改行規約で空のインデックスを作成
    pub fn new(convention: EndingConvention) -> Self {
        Self::with_config(LineIndexConfig::new(convention))
    }

    pub fn with_config(config: LineIndexConfig) -> Self {
        Self {
            table: SegmentTable::new(),
            config,
            corrupted: false,
            bridge: PhantomData,
        }
    }

    /// 初期内容を追記した状態で作成
    pub fn from_items<I>(config: LineIndexConfig, items: I) -> Result<Self>
    where
        I: IntoIterator<Item = B::Item>,
    {
        let mut index = Self::with_config(config);
        index.append(items)?;
        Ok(index)
    }

    pub fn convention(&self) -> EndingConvention {
        self.config.convention
    }

    pub fn config(&self) -> &LineIndexConfig {
        &self.config
    }

    /// 追跡中の単位数
    pub fn len(&self) -> usize {
        self.table.length
    }

    pub fn is_empty(&self) -> bool {
        self.table.length == 0
    }

    /// 物理区画の一覧（結合前）
    pub fn segments(&self) -> &[LineSegment] {
        &self.table.segments
    }

    /// 不変条件違反で使用不能になっているか
    pub fn is_corrupted(&self) -> bool {
        self.corrupted
    }

    /// 不変条件をすべて検査
    pub fn validate(&self) -> Result<()> {
        self.table.validate(self.convention())
    }

    // ---------------------------------------------------------------
    // 問い合わせ
    // ---------------------------------------------------------------

    /// 行数
    pub fn line_count(&self) -> usize {
        self.table.line_count()
    }

    /// 行番号から行を取得
    pub fn line_at(&self, line_number: usize) -> Result<LineSegment> {
        self.ensure_intact()?;

        let count = self.line_count();
        if line_number >= count {
            return Err(LineIndexError::out_of_range("line number", line_number, count));
        }

        let index = self.table.index_from_number(line_number).ok_or_else(|| {
            report(LineIndexError::violation(format!(
                "no segment carries line {line_number} of {count}"
            )))
        })?;

        Ok(self.resolve(index))
    }

    /// 位置を含む行を取得
    ///
    /// 総長と等しい位置は最後の行に解決する
    pub fn line_at_position(&self, position: usize) -> Result<LineSegment> {
        self.ensure_intact()?;

        if position > self.table.length {
            return Err(LineIndexError::out_of_range(
                "position",
                position,
                self.table.length,
            ));
        }

        let index = self.table.index_from_position(position).ok_or_else(|| {
            report(LineIndexError::violation(format!(
                "no segment covers position {position}"
            )))
        })?;

        Ok(self.resolve(index))
    }

    /// 位置を行番号と桁に変換
    pub fn locate(&self, position: usize) -> Result<TextLocation> {
        let line = self.line_at_position(position)?;
        Ok(TextLocation::new(
            position,
            line.line_number,
            position - line.position,
        ))
    }

    /// 位置の行番号（見つからなければ `None`）
    pub fn line_number_at(&self, position: usize) -> Option<usize> {
        self.table
            .index_from_position(position)
            .map(|index| self.table.segments[index].line_number)
    }

    /// 論理行を先頭から列挙
    pub fn lines(&self) -> Lines<'_> {
        Lines::new(&self.table.segments, self.convention().pairs_crlf())
    }

    /// 行の内容をバッファから切り出す
    ///
    /// `include_ending` が偽なら終端の単位を含めない
    pub fn extract_line<'b>(
        &self,
        buffer: &'b B::Buffer,
        line_number: usize,
        include_ending: bool,
    ) -> Result<&'b B::Buffer> {
        let line = self.line_at(line_number)?;
        Ok(slice_line::<B>(buffer, &line, include_ending))
    }

    /// 全行の内容をバッファから順に切り出す
    pub fn extract_lines<'a, 'b>(
        &'a self,
        buffer: &'b B::Buffer,
        include_ending: bool,
    ) -> ExtractLines<'a, 'b, B> {
        ExtractLines::new(self.lines(), buffer, include_ending)
    }

    fn resolve(&self, index: usize) -> LineSegment {
        if self.convention().pairs_crlf() {
            let (first, last) = self.table.line_span(index);
            self.table.join(first, last)
        } else {
            self.table.segments[index]
        }
    }

    // ---------------------------------------------------------------
    // 編集
    // ---------------------------------------------------------------

    /// 末尾に単位列を追記
    pub fn append<I>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = B::Item>,
    {
        self.ensure_intact()?;

        let convention = self.convention();
        let mut writer = SegmentWriter::new(&mut self.table.segments, convention);
        let mut added = 0usize;
        for item in items {
            writer.write_scalar(B::scalar_value(&item));
            added += 1;
        }
        self.table.length += added;

        log::trace!(
            "appended {added} units, now {} units in {} lines",
            self.table.length,
            self.table.line_count()
        );
        self.finish()
    }

    pub fn append_item(&mut self, item: B::Item) -> Result<()> {
        self.append(std::iter::once(item))
    }

    /// 先頭に単位列を挿入
    pub fn prepend<I>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = B::Item>,
    {
        if self.is_empty() {
            self.append(items)
        } else {
            self.insert(0, items)
        }
    }

    pub fn prepend_item(&mut self, item: B::Item) -> Result<()> {
        self.prepend(std::iter::once(item))
    }

    /// 任意の位置に単位列を挿入
    ///
    /// 末尾への挿入は追記として扱う
    pub fn insert<I>(&mut self, position: usize, items: I) -> Result<()>
    where
        I: IntoIterator<Item = B::Item>,
    {
        self.ensure_intact()?;

        let length = self.table.length;
        if position == length {
            return self.append(items);
        }
        if position > length {
            return Err(LineIndexError::out_of_range("position", position, length));
        }

        let Some(index) = self.table.index_from_position(position) else {
            return Err(self.fail(LineIndexError::violation(format!(
                "no segment covers insert position {position}"
            ))));
        };

        let segment = self.table.segments[index];
        let column = position - segment.position;
        let convention = self.convention();

        let mut window = self.open_window(index);
        let mut inserted = 0usize;
        {
            let mut writer = SegmentWriter::new(&mut window.segments, convention);
            writer.replay(&segment, 0, column);
            for item in items {
                writer.write_scalar(B::scalar_value(&item));
                inserted += 1;
            }
            writer.replay(&segment, column, segment.length);
        }

        let delta = signed(inserted, "inserted length")?;
        self.close_window(window, delta)
            .map_err(|error| self.fail(error))?;
        self.finish()
    }

    pub fn insert_item(&mut self, position: usize, item: B::Item) -> Result<()> {
        self.insert(position, std::iter::once(item))
    }

    /// `position` から `amount` 単位を削除
    pub fn remove(&mut self, position: usize, amount: usize) -> Result<()> {
        self.ensure_intact()?;

        let length = self.table.length;
        if position > length {
            return Err(LineIndexError::out_of_range("position", position, length));
        }
        let end = match position.checked_add(amount) {
            Some(end) if end <= length => end,
            _ => {
                return Err(LineIndexError::out_of_range(
                    "amount",
                    amount,
                    length - position,
                ))
            }
        };
        if amount == 0 {
            return Ok(());
        }

        let (Some(first), Some(last)) = (
            self.table.index_from_position(position),
            self.table.index_from_position(end),
        ) else {
            return Err(self.fail(LineIndexError::violation(format!(
                "no segment covers removal range {position}..{end}"
            ))));
        };

        let convention = self.convention();
        let mut window = self.open_window(first);
        window.last = last;
        {
            let mut writer = SegmentWriter::new(&mut window.segments, convention);
            for segment in &self.table.segments[first..=last] {
                let start = position.saturating_sub(segment.position).min(segment.length);
                let stop = end.saturating_sub(segment.position).min(segment.length);
                writer.replay(segment, 0, start);
                writer.replay(segment, stop, segment.length);
            }
        }

        let delta = -signed(amount, "removed length")?;
        self.close_window(window, delta)
            .map_err(|error| self.fail(error))?;
        self.finish()
    }

    /// `first` の区画から書き直すための範囲を用意
    fn open_window(&self, first: usize) -> Window {
        let start = self.table.segments[first];
        let mut segments = Vec::with_capacity(4);
        let has_context = first > 0;
        if has_context {
            segments.push(self.table.segments[first - 1]);
        }
        segments.push(LineSegment::open(start.line_number, start.position));

        Window {
            first,
            last: first,
            has_context,
            segments,
        }
    }

    /// 書き直した範囲をテーブルへ戻し、後続の区画をずらす
    fn close_window(&mut self, mut window: Window, delta: isize) -> Result<()> {
        let convention = self.convention();

        // 範囲末尾の CR と後続の単独 LF を1つの終端に戻す
        while let Some(following) = self.table.segments.get(window.last + 1).copied() {
            let mut writer = SegmentWriter::new(&mut window.segments, convention);
            if !(writer.awaits_line_feed() && following.is_bare_line_feed()) {
                break;
            }
            writer.replay(&following, 0, following.length);
            window.last += 1;
        }

        let mut replacement = window.segments;
        if window.has_context {
            self.table.segments[window.first - 1] = replacement.remove(0);
        }

        let at_tail = window.last == self.table.last_index();
        let (lines, positions) = if at_tail {
            (0, 0)
        } else {
            let following = self.table.segments[window.last + 1];
            let open = replacement
                .pop()
                .ok_or_else(|| LineIndexError::violation("rebuilt window has no open segment"))?;
            if open.length != 0 {
                return Err(LineIndexError::violation(format!(
                    "rebuilt window leaves {} units before segment {}",
                    open.length,
                    window.last + 1
                )));
            }
            (
                signed(open.line_number, "line number")? - signed(following.line_number, "line number")?,
                signed(open.position, "position")? - signed(following.position, "position")?,
            )
        };

        if !at_tail && positions != delta {
            return Err(LineIndexError::violation(format!(
                "segments after the edit move by {positions} instead of {delta}"
            )));
        }

        let count = replacement.len();
        log::trace!(
            "rebuilt segments {}..={} into {count} (lines {lines:+}, positions {positions:+})",
            window.first,
            window.last
        );

        self.table
            .segments
            .splice(window.first..=window.last, replacement);
        self.table.adjust(window.first + count, lines, positions)?;
        self.table.length = self
            .table
            .length
            .checked_add_signed(delta)
            .ok_or_else(|| LineIndexError::violation("tracked length underflows"))?;

        Ok(())
    }

    fn ensure_intact(&self) -> Result<()> {
        if self.corrupted {
            Err(LineIndexError::Corrupted)
        } else {
            Ok(())
        }
    }

    /// 変更後の検査（設定で有効な場合）
    fn finish(&mut self) -> Result<()> {
        if self.config.verify_invariants {
            if let Err(error) = self.table.validate(self.config.convention) {
                return Err(self.fail(error));
            }
        }
        Ok(())
    }

    /// 不変条件違反を記録し、インデックスを使用不能にする
    fn fail(&mut self, error: LineIndexError) -> LineIndexError {
        self.corrupted = true;
        report(error)
    }
}

impl<B: ContentBridge> Default for LineIndex<B> {
    fn default() -> Self {
        Self::with_config(LineIndexConfig::default())
    }
}

impl<'a, B: ContentBridge> IntoIterator for &'a LineIndex<B> {
    type Item = LineSegment;
    type IntoIter = Lines<'a>;

    fn into_iter(self) -> Lines<'a> {
        self.lines()
    }
}

fn report(error: LineIndexError) -> LineIndexError {
    log::error!("{error}");
    error
}

fn signed(value: usize, argument: &'static str) -> Result<isize> {
    isize::try_from(value)
        .map_err(|_| LineIndexError::out_of_range(argument, value, isize::MAX.unsigned_abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lines::bridge::ByteContent;
    use crate::lines::ending::LineEnding;

    fn index_of(convention: EndingConvention, text: &str) -> LineIndex {
        let config = LineIndexConfig::new(convention).with_verification(true);
        LineIndex::from_items(config, text.chars()).unwrap()
    }

    fn lines_of(index: &LineIndex) -> Vec<(usize, usize, usize, LineEnding)> {
        index
            .lines()
            .map(|line| (line.line_number, line.position, line.length, line.ending))
            .collect()
    }

    #[test]
    fn test_empty_index() {
        let index: LineIndex = LineIndex::new(EndingConvention::CrLfExact);
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.len(), 0);
        assert!(index.is_empty());
        assert_eq!(
            index.line_at(0).unwrap(),
            LineSegment::new(0, 0, 0, LineEnding::None)
        );
        assert_eq!(index.locate(0).unwrap(), TextLocation::new(0, 0, 0));
    }

    #[test]
    fn test_append_hello_world() {
        let index = index_of(EndingConvention::CrLfExact, "Hello\rWorld\nMy\r\n");
        assert_eq!(
            lines_of(&index),
            vec![
                (0, 0, 6, LineEnding::Cr),
                (1, 6, 6, LineEnding::Lf),
                (2, 12, 4, LineEnding::CrLf),
                (3, 16, 0, LineEnding::None),
            ]
        );
        assert_eq!(index.line_count(), 4);
    }

    #[test]
    fn test_crlf_across_append_calls() {
        let mut index = index_of(EndingConvention::CrLfExact, "A\r");
        assert_eq!(index.line_count(), 2);
        index.append("\nB".chars()).unwrap();

        let single = index_of(EndingConvention::CrLfExact, "A\r\nB");
        assert_eq!(index.segments(), single.segments());
        assert_eq!(
            index.line_at(0).unwrap(),
            LineSegment::new(0, 0, 3, LineEnding::CrLf)
        );
        assert_eq!(index.line_count(), 2);
    }

    #[test]
    fn test_crlf_across_single_item_appends() {
        let mut index: LineIndex = LineIndex::new(EndingConvention::CrLfExact);
        for ch in "x\r\ny".chars() {
            index.append_item(ch).unwrap();
        }
        assert_eq!(
            lines_of(&index),
            vec![(0, 0, 3, LineEnding::CrLf), (1, 3, 1, LineEnding::None)]
        );
    }

    #[test]
    fn test_insert_upgrades_lone_cr() {
        let mut index = index_of(EndingConvention::CrLfExact, "Hello\rWorld\nMy\r\n");
        index.insert(6, "\n, ".chars()).unwrap();
        assert_eq!(
            lines_of(&index),
            vec![
                (0, 0, 7, LineEnding::CrLf),
                (1, 7, 8, LineEnding::Lf),
                (2, 15, 4, LineEnding::CrLf),
                (3, 19, 0, LineEnding::None),
            ]
        );
        assert_eq!(index.len(), 19);
    }

    #[test]
    fn test_insert_between_cr_and_lf_splits_line() {
        let mut index = index_of(EndingConvention::CrLfExact, "A\r\nB");
        index.insert_item(2, 'x').unwrap();
        assert_eq!(
            lines_of(&index),
            vec![
                (0, 0, 2, LineEnding::Cr),
                (1, 2, 2, LineEnding::Lf),
                (2, 4, 1, LineEnding::None),
            ]
        );
    }

    #[test]
    fn test_insert_cr_before_lf_forms_pair() {
        let mut index = index_of(EndingConvention::CrLfExact, "a\nb");
        index.insert_item(1, '\r').unwrap();
        assert_eq!(
            lines_of(&index),
            vec![(0, 0, 3, LineEnding::CrLf), (1, 3, 1, LineEnding::None)]
        );
    }

    #[test]
    fn test_insert_newlines_shifts_following_lines() {
        let mut index = index_of(EndingConvention::LfOnly, "one\ntwo\nthree");
        index.insert(4, "a\nb\n".chars()).unwrap();
        assert_eq!(index.line_count(), 5);
        assert_eq!(
            index.line_at(4).unwrap(),
            LineSegment::new(4, 12, 5, LineEnding::None)
        );
    }

    #[test]
    fn test_prepend() {
        let mut index = index_of(EndingConvention::LfOnly, "b");
        index.prepend("a\n".chars()).unwrap();
        assert_eq!(
            lines_of(&index),
            vec![(0, 0, 2, LineEnding::Lf), (1, 2, 1, LineEnding::None)]
        );

        let mut empty: LineIndex = LineIndex::new(EndingConvention::LfOnly);
        empty.prepend_item('\n').unwrap();
        assert_eq!(empty.line_count(), 2);
    }

    #[test]
    fn test_remove_lf_of_crlf_leaves_lone_cr() {
        let mut index = index_of(EndingConvention::CrLfExact, "a\r\nb");
        index.remove(2, 1).unwrap();
        assert_eq!(
            lines_of(&index),
            vec![(0, 0, 2, LineEnding::Cr), (1, 2, 1, LineEnding::None)]
        );
    }

    #[test]
    fn test_remove_joins_cr_and_lf() {
        let mut index = index_of(EndingConvention::CrLfExact, "a\rx\nb");
        assert_eq!(index.line_count(), 3);
        index.remove(2, 1).unwrap();
        assert_eq!(
            lines_of(&index),
            vec![(0, 0, 3, LineEnding::CrLf), (1, 3, 1, LineEnding::None)]
        );
    }

    #[test]
    fn test_remove_across_lines_renumbers() {
        let mut index = index_of(EndingConvention::LfOnly, "a\nb\nc\nd");
        index.remove(1, 4).unwrap();
        assert_eq!(
            lines_of(&index),
            vec![(0, 0, 2, LineEnding::Lf), (1, 2, 1, LineEnding::None)]
        );
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_remove_everything() {
        let mut index = index_of(EndingConvention::CrLfExact, "x\r\ny\rz\n");
        index.remove(0, index.len()).unwrap();
        assert_eq!(lines_of(&index), vec![(0, 0, 0, LineEnding::None)]);
        assert!(index.is_empty());
    }

    #[test]
    fn test_range_errors_leave_table_unchanged() {
        let mut index = index_of(EndingConvention::LfOnly, "ab\ncd");
        let before = index.segments().to_vec();

        let err = index.insert(6, "x".chars()).unwrap_err();
        assert_eq!(err, LineIndexError::out_of_range("position", 6, 5));
        assert!(index.remove(4, 2).is_err());
        assert!(index.remove(6, 0).is_err());
        assert!(index.remove(1, usize::MAX).is_err());
        assert!(index.line_at(2).is_err());
        assert!(index.line_at_position(6).is_err());

        assert_eq!(index.segments(), before.as_slice());
        assert!(!index.is_corrupted());
        assert!(index.remove(5, 0).is_ok());
    }

    #[test]
    fn test_locate_and_line_number_at() {
        let index = index_of(EndingConvention::CrLfExact, "ab\r\ncd\ne");
        assert_eq!(index.locate(0).unwrap(), TextLocation::new(0, 0, 0));
        assert_eq!(index.locate(3).unwrap(), TextLocation::new(3, 0, 3));
        assert_eq!(index.locate(4).unwrap(), TextLocation::new(4, 1, 0));
        assert_eq!(index.locate(8).unwrap(), TextLocation::new(8, 2, 1));
        assert_eq!(index.line_number_at(6), Some(1));
        assert_eq!(index.line_number_at(9), None);
    }

    #[test]
    fn test_shared_line_numbers_are_joined() {
        // CR と LF が別区画に記録されたテーブルを直接組み立てる
        let mut index: LineIndex = LineIndex::new(EndingConvention::CrLfExact);
        index.table = SegmentTable::from_segments(vec![
            LineSegment::new(0, 0, 2, LineEnding::Cr),
            LineSegment::new(0, 2, 1, LineEnding::Lf),
            LineSegment::new(1, 3, 1, LineEnding::None),
        ]);
        assert!(index.validate().is_ok());

        let joined = LineSegment::new(0, 0, 3, LineEnding::Lf);
        assert_eq!(index.line_count(), 2);
        assert_eq!(index.line_at(0).unwrap(), joined);
        assert_eq!(index.line_at_position(2).unwrap(), joined);
        assert_eq!(index.locate(2).unwrap(), TextLocation::new(2, 0, 2));
        assert_eq!(index.lines().count(), 2);
    }

    #[test]
    fn test_extract_line() {
        let text = "Hello\rWorld\nMy\r\n";
        let index = index_of(EndingConvention::CrLfExact, text);

        assert_eq!(index.extract_line(text, 0, true).unwrap(), "Hello\r");
        assert_eq!(index.extract_line(text, 0, false).unwrap(), "Hello");
        assert_eq!(index.extract_line(text, 2, true).unwrap(), "My\r\n");
        assert_eq!(index.extract_line(text, 2, false).unwrap(), "My");
        assert_eq!(index.extract_line(text, 3, true).unwrap(), "");
        assert!(index.extract_line(text, 4, true).is_err());

        let lines: Vec<&str> = index.extract_lines(text, false).collect();
        assert_eq!(lines, vec!["Hello", "World", "My", ""]);
    }

    #[test]
    fn test_byte_content_bridge() {
        let text = "é\r\nü".as_bytes();
        let config = LineIndexConfig::new(EndingConvention::CrLfExact);
        let index = LineIndex::<ByteContent>::from_items(config, text.iter().copied()).unwrap();
        assert_eq!(index.len(), 6);
        assert_eq!(index.line_count(), 2);
        assert_eq!(index.extract_line(text, 0, false).unwrap(), "é".as_bytes());
        assert_eq!(index.extract_line(text, 1, true).unwrap(), "ü".as_bytes());
    }

    #[test]
    fn test_raw_convention_is_one_line() {
        let mut index = index_of(EndingConvention::Raw, "a\r\nb\nc\r");
        assert_eq!(index.line_count(), 1);
        index.insert(2, "\n\n".chars()).unwrap();
        index.remove(0, 3).unwrap();
        assert_eq!(lines_of(&index), vec![(0, 0, 6, LineEnding::None)]);
    }

    #[test]
    fn test_corrupted_index_rejects_operations() {
        let mut index = index_of(EndingConvention::LfOnly, "a\nb");
        index.table.segments[1].position += 1;

        let err = index.insert(1, "x".chars()).unwrap_err();
        assert!(err.is_fatal());
        assert!(index.is_corrupted());
        assert_eq!(index.append("y".chars()), Err(LineIndexError::Corrupted));
        assert_eq!(index.line_at(0), Err(LineIndexError::Corrupted));
    }

    #[test]
    fn test_into_iterator_for_reference() {
        let index = index_of(EndingConvention::LfOnly, "a\nb\n");
        let mut count = 0;
        for line in &index {
            assert_eq!(line.line_number, count);
            count += 1;
        }
        assert_eq!(count, 3);
    }
}
