//! 行コレクション（CSV）の読み書き
//!
//! # 責務
//!
//! - ヘッダー付き CSV を [`Row`] の列として読み込む
//! - 読み込んだときの列構成（ヘッダー表記・列順・追加列）のまま書き出す
//!
//! # 列の対応
//!
//! | 列名（大文字小文字無視） | フィールド |
//! |--------------------------|-----------|
//! | `date` | `date` |
//! | `topic` | `topic` |
//! | `context` / `additional_context` | `context` |
//! | `regulator` | `regulator` |
//! | `link` | `link`（必須） |
//! | `action` | `action` |
//! | `output` / `phase2_output` | `output` |
//! | その他 | `extras` |
//!
//! `action` 列がない場合は全行 `no action`、`output` 列がない場合は全行空文字として読み込み、
//! 書き出し時にはそれぞれ末尾に列を追加します。
//!
//! 同じフィールドに対応する列が複数ある場合や、ヘッダーより多いセルを持つ行は
//! 書き出し時に値が失われるため、読み込みエラーにします。

use std::io::{Read, Write};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::SheetError;
use crate::model::row::{REASON_COLUMN, RECOMMENDATION_COLUMN};
use crate::model::{Row, UpdateRecord};

static HYPERLINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^=\s*HYPERLINK\(\s*"([^"]*)""#).expect("valid hyperlink regex")
});

/// 列とフィールドの対応
#[derive(Debug, Clone, PartialEq, Eq)]
enum Field {
    Date,
    Topic,
    Context,
    Regulator,
    Link,
    Action,
    Output,
    Extra(String),
}

impl Field {
    fn from_header(header: &str) -> Self {
        match header.trim().to_ascii_lowercase().as_str() {
            "date" => Field::Date,
            "topic" => Field::Topic,
            "context" | "additional_context" => Field::Context,
            "regulator" => Field::Regulator,
            "link" => Field::Link,
            "action" => Field::Action,
            "output" | "phase2_output" => Field::Output,
            _ => Field::Extra(header.to_string()),
        }
    }

    fn read(&self, row: &Row) -> String {
        match self {
            Field::Date => row.date.clone().unwrap_or_default(),
            Field::Topic => row.topic.clone().unwrap_or_default(),
            Field::Context => row.context.clone().unwrap_or_default(),
            Field::Regulator => row.regulator.clone().unwrap_or_default(),
            Field::Link => row.link.clone(),
            Field::Action => row.action_text().to_string(),
            Field::Output => row.output.clone(),
            Field::Extra(name) => row.extras.get(name).cloned().unwrap_or_default(),
        }
    }

    fn write(&self, row: &mut Row, cell: &str) {
        let optional = || Some(cell.to_string()).filter(|v| !v.trim().is_empty());
        match self {
            Field::Date => row.date = optional(),
            Field::Topic => row.topic = optional(),
            Field::Context => row.context = optional(),
            Field::Regulator => row.regulator = optional(),
            Field::Link => row.link = normalize_link(cell),
            Field::Action => row.set_action(cell),
            Field::Output => row.output = cell.to_string(),
            Field::Extra(name) => {
                row.extras.insert(name.clone(), cell.to_string());
            }
        }
    }
}

/// リンクセルを URL に正規化する
///
/// スプレッドシートの `=HYPERLINK("url", "label")` 数式は URL 部分に置き換え、
/// スキームのない URL には `https://` を補います。
///
/// ```rust
/// use reg_horizon::sheet::normalize_link;
///
/// assert_eq!(
///     normalize_link(r#"=HYPERLINK("www.bis.org/press/p1.htm", "Open Link")"#),
///     "https://www.bis.org/press/p1.htm"
/// );
/// assert_eq!(normalize_link(" http://x.test "), "http://x.test");
/// assert_eq!(normalize_link(""), "");
/// ```
pub fn normalize_link(cell: &str) -> String {
    let trimmed = cell.trim();
    let url = HYPERLINK_RE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map_or(trimmed, |m| m.as_str())
        .trim();

    if url.is_empty() {
        return String::new();
    }
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// 行コレクション
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSet {
    headers: Vec<String>,
    fields: Vec<Field>,
    rows: Vec<Row>,
}

impl RowSet {
    /// 標準の列構成で行コレクションを作る
    ///
    /// 追加列は行に現れた列名の辞書順で、`regulator` と `Link` の間に並べます。
    pub fn new(rows: Vec<Row>) -> Self {
        let mut extras: Vec<String> = Vec::new();
        for row in &rows {
            for name in row.extras.keys() {
                if !extras.contains(name) {
                    extras.push(name.clone());
                }
            }
        }
        extras.sort();
        Self::with_extras(rows, extras)
    }

    /// 抽出レコードから行コレクションを作る（除外判定列付き）
    pub fn from_records(records: Vec<UpdateRecord>) -> Self {
        let rows = records.into_iter().map(Row::from).collect();
        Self::with_extras(
            rows,
            vec![RECOMMENDATION_COLUMN.to_string(), REASON_COLUMN.to_string()],
        )
    }

    fn with_extras(rows: Vec<Row>, extras: Vec<String>) -> Self {
        let mut headers: Vec<String> = ["date", "topic", "additional_context", "regulator"]
            .into_iter()
            .map(str::to_string)
            .collect();
        headers.extend(extras);
        headers.extend(["Link", "action", "output"].into_iter().map(str::to_string));

        let fields = headers.iter().map(|h| Field::from_header(h)).collect();
        Self { headers, fields, rows }
    }

    /// CSV ファイルから読み込む
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SheetError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// CSV を読み込む
    ///
    /// # エラー
    ///
    /// - [`SheetError::MissingColumn`] - `link` 列がない
    /// - [`SheetError::Csv`] - CSV として解釈できない
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SheetError> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let mut headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut fields: Vec<Field> = headers.iter().map(|h| Field::from_header(h)).collect();

        if !fields.contains(&Field::Link) {
            return Err(SheetError::MissingColumn("link".to_string()));
        }
        for (index, field) in fields.iter().enumerate() {
            if fields[..index].contains(field) {
                return Err(SheetError::DuplicateColumn(headers[index].clone()));
            }
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.len() > fields.len() {
                return Err(SheetError::RowTooWide {
                    line: record.position().map_or(0, |p| p.line()),
                    cells: record.len(),
                    columns: fields.len(),
                });
            }
            let mut row = Row::new("");
            for (index, field) in fields.iter().enumerate() {
                field.write(&mut row, record.get(index).unwrap_or_default());
            }
            rows.push(row);
        }

        for (name, field) in [("action", Field::Action), ("output", Field::Output)] {
            if !fields.contains(&field) {
                headers.push(name.to_string());
                fields.push(field);
            }
        }

        Ok(Self { headers, fields, rows })
    }

    /// CSV ファイルへ書き出す（親ディレクトリがなければ作成）
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SheetError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        self.to_writer(file)
    }

    /// CSV を書き出す
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), SheetError> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(self.fields.iter().map(|field| field.read(row)))?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    /// 末尾に行を追加する
    ///
    /// ヘッダーにない追加列（`extras`）は書き出されません。
    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// 指定位置の行を取り除く（範囲外なら `None`）
    pub fn remove_row(&mut self, index: usize) -> Option<Row> {
        (index < self.rows.len()).then(|| self.rows.remove(index))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
