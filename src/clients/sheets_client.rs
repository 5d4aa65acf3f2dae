/// Google Sheets API 客户端
///
/// 只封装本程序用到的三个 REST 调用：读取工作表标题、读取区域、覆盖写一行
use std::time::Duration;

use reqwest::{Client, Response, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::StoreError;

/// 单次请求超时
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Sheets 客户端
pub struct SheetsClient {
    http: Client,
    api_base: String,
    spreadsheet_id: String,
    token: String,
}

impl SheetsClient {
    /// 创建新的 Sheets 客户端
    ///
    /// # 参数
    /// - `api_base`: 例如 `https://sheets.googleapis.com/v4`
    /// - `spreadsheet_id`: 表格 ID
    /// - `token`: bearer 访问令牌
    pub fn new(
        api_base: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Request {
                endpoint: "client".to_string(),
                source: e,
            })?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            token: token.into(),
        })
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// 第一个工作表的标题
    pub async fn first_sheet_title(&self) -> Result<String, StoreError> {
        let mut url = self.spreadsheet_url(&[])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");

        let response = self.send(self.http.get(url.clone()), &url).await?;
        let meta: SpreadsheetMeta = parse_json(response, &url).await?;

        meta.sheets
            .into_iter()
            .next()
            .map(|s| s.properties.title)
            .ok_or_else(|| StoreError::MissingSheet {
                spreadsheet_id: self.spreadsheet_id.clone(),
            })
    }

    /// 读取区域内所有单元格（统一转成字符串）
    pub async fn read_values(&self, range: &str) -> Result<Vec<Vec<String>>, StoreError> {
        let url = self.spreadsheet_url(&["values", range])?;
        debug!("读取区域: {}", range);

        let response = self.send(self.http.get(url.clone()), &url).await?;
        let body: ValueRange = parse_json(response, &url).await?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    /// 从 `range` 起覆盖写一行
    pub async fn write_row(&self, range: &str, values: Vec<String>) -> Result<(), StoreError> {
        let mut url = self.spreadsheet_url(&["values", range])?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        debug!("写入区域: {} ({} 列)", range, values.len());

        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": [values],
        });
        self.send(self.http.put(url.clone()).json(&body), &url)
            .await?;
        Ok(())
    }

    fn spreadsheet_url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let base = format!("{}/spreadsheets", self.api_base);
        let mut url = Url::parse(&base).map_err(|e| StoreError::BadResponse {
            status: 0,
            body: format!("无效的 API 地址 {}: {}", base, e),
        })?;
        url.path_segments_mut()
            .map_err(|_| StoreError::BadResponse {
                status: 0,
                body: format!("无效的 API 地址 {}", base),
            })?
            .push(&self.spreadsheet_id)
            .extend(segments);
        Ok(url)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &Url,
    ) -> Result<Response, StoreError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| StoreError::Request {
                endpoint: url.path().to_string(),
                source: e,
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(StoreError::Auth(format!("{} {}", status.as_u16(), body)));
        }
        Err(StoreError::BadResponse {
            status: status.as_u16(),
            body,
        })
    }
}

async fn parse_json<T: serde::de::DeserializeOwned>(
    response: Response,
    url: &Url,
) -> Result<T, StoreError> {
    response.json::<T>().await.map_err(|e| StoreError::Request {
        endpoint: url.path().to_string(),
        source: e,
    })
}

fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A1 表示法中的工作表名（带引号，内部单引号加倍）
pub fn quote_sheet_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}
