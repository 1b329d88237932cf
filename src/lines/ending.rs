//! 改行コードの種類と判定規則

use serde::{Deserialize, Serialize};

/// 復帰（CR）のスカラー値
pub const CARRIAGE_RETURN: u32 = 0x0D;
/// 改行（LF）のスカラー値
pub const LINE_FEED: u32 = 0x0A;

/// 区画を閉じている行終端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineEnding {
    /// 終端なし（末尾の開いた区画のみ）
    #[default]
    None,
    Cr,
    Lf,
    CrLf,
}

impl LineEnding {
    /// 終端が占める単位数
    pub const fn size(self) -> usize {
        match self {
            LineEnding::None => 0,
            LineEnding::Cr | LineEnding::Lf => 1,
            LineEnding::CrLf => 2,
        }
    }

    /// 実際の終端を持つか
    pub const fn is_terminator(self) -> bool {
        !matches!(self, LineEnding::None)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            LineEnding::None => "",
            LineEnding::Cr => "\r",
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }

    /// 終端を構成する単位の並び
    pub(crate) fn units(self) -> &'static [Unit] {
        match self {
            LineEnding::None => &[],
            LineEnding::Cr => &[Unit::Cr],
            LineEnding::Lf => &[Unit::Lf],
            LineEnding::CrLf => &[Unit::Cr, Unit::Lf],
        }
    }
}

/// 改行規約（インスタンス生成時に固定）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndingConvention {
    /// 改行を認識しない（全体で1行）
    #[default]
    Raw,
    /// LF のみ
    LfOnly,
    /// CR のみ
    CrOnly,
    /// CR LF の並びを1つの終端とし、単独の CR / LF もそれぞれ終端とする
    CrLfExact,
}

impl EndingConvention {
    /// スカラー値を単位の種類に分類する
    pub fn classify(self, scalar: u32) -> Unit {
        match (self, scalar) {
            (EndingConvention::CrOnly | EndingConvention::CrLfExact, CARRIAGE_RETURN) => Unit::Cr,
            (EndingConvention::LfOnly | EndingConvention::CrLfExact, LINE_FEED) => Unit::Lf,
            _ => Unit::Other,
        }
    }

    /// CR と直後の LF を1つの終端にまとめるか
    pub const fn pairs_crlf(self) -> bool {
        matches!(self, EndingConvention::CrLfExact)
    }
}

/// 規約の下で分類した1単位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Cr,
    Lf,
    Other,
}
