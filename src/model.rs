//! 行・アクション・出力のデータモデル
//!
//! パイプラインの最終ステージが作り、ディスパッチャーが消費する型をまとめます。

pub mod action;
pub mod output;
pub mod record;
pub mod row;

pub use action::Action;
pub use output::RowOutput;
pub use record::UpdateRecord;
pub use row::Row;
