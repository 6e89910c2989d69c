//! 行アクションの定義
//!
//! # 文字列表現
//!
//! | 文字列 | アクション |
//! |--------|-----------|
//! | `no action` | [`Action::NoAction`] |
//! | `summarize` | [`Action::Summarize`] |
//! | `custom:<prompt>` | [`Action::Custom`] |
//! | それ以外 | [`Action::NoAction`] |
//!
//! 前後の空白は無視し、大文字小文字は区別しません。
//! ただし `custom:` のプロンプト部分は元の大文字小文字を保持します。

use std::fmt;

use serde::{Deserialize, Serialize};

/// アクション未指定時の文字列
pub const NO_ACTION: &str = "no action";
/// 要約アクションの文字列
pub const SUMMARIZE: &str = "summarize";
/// カスタムプロンプトの接頭辞
pub const CUSTOM_PREFIX: &str = "custom:";

/// 行に対して実行するアクション
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// 何もしない
    NoAction,
    /// 既定の目的で要約する
    Summarize,
    /// 指定されたプロンプトを目的として要約する
    Custom(String),
}

impl Action {
    /// 文字列をアクションに正規化する
    ///
    /// 認識できない文字列は [`Action::NoAction`] になります。
    ///
    /// ```rust
    /// use reg_horizon::model::Action;
    ///
    /// assert_eq!(Action::parse(" Summarize "), Action::Summarize);
    /// assert_eq!(
    ///     Action::parse("custom: focus on Basel III"),
    ///     Action::Custom("focus on Basel III".to_string())
    /// );
    /// assert_eq!(Action::parse("translate"), Action::NoAction);
    /// ```
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();

        if trimmed.eq_ignore_ascii_case(SUMMARIZE) {
            return Action::Summarize;
        }
        if let Some(head) = trimmed.get(..CUSTOM_PREFIX.len())
            && head.eq_ignore_ascii_case(CUSTOM_PREFIX)
        {
            let prompt = trimmed[CUSTOM_PREFIX.len()..].trim();
            return Action::Custom(prompt.to_string());
        }
        Action::NoAction
    }

    /// 文字列が3形式のいずれかとして認識できるか
    pub fn is_recognized(raw: &str) -> bool {
        let trimmed = raw.trim();
        trimmed.eq_ignore_ascii_case(NO_ACTION)
            || !matches!(Action::parse(trimmed), Action::NoAction)
    }

    /// 外部呼び出しが必要なアクションか
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Action::NoAction)
    }

    /// 要約器へ渡す目的（`Custom` で空でない場合のみ）
    pub fn objective(&self) -> Option<&str> {
        match self {
            Action::Custom(prompt) if !prompt.is_empty() => Some(prompt),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::NoAction => f.write_str(NO_ACTION),
            Action::Summarize => f.write_str(SUMMARIZE),
            Action::Custom(prompt) => write!(f, "{CUSTOM_PREFIX}{prompt}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognized_forms() {
        assert_eq!(Action::parse("no action"), Action::NoAction);
        assert_eq!(Action::parse("NO ACTION"), Action::NoAction);
        assert_eq!(Action::parse("summarize"), Action::Summarize);
        assert_eq!(Action::parse("  SUMMARIZE\t"), Action::Summarize);
    }

    #[test]
    fn test_custom_prompt_is_trimmed_and_keeps_case() {
        assert_eq!(
            Action::parse("custom:  focus on liquidity risk  "),
            Action::Custom("focus on liquidity risk".to_string())
        );
        assert_eq!(
            Action::parse("Custom:Impact on CET1"),
            Action::Custom("Impact on CET1".to_string())
        );
    }

    #[test]
    fn test_unrecognized_is_no_action() {
        for raw in ["", "nan", "skip", "summarise", "custom prompt", "please summarize"] {
            assert_eq!(Action::parse(raw), Action::NoAction, "{raw:?}");
            assert!(!Action::is_recognized(raw), "{raw:?}");
        }
        assert!(!Action::is_recognized("custom prompt"));
        assert!(Action::is_recognized("custom:x"));
    }

    #[test]
    fn test_blank_custom_prompt_has_no_objective() {
        let action = Action::parse("custom:   ");
        assert_eq!(action, Action::Custom(String::new()));
        assert!(action.is_actionable());
        assert_eq!(action.objective(), None);
    }

    #[test]
    fn test_display_encoding() {
        assert_eq!(Action::NoAction.to_string(), "no action");
        assert_eq!(Action::Custom("xyz".into()).to_string(), "custom:xyz");
    }
}
