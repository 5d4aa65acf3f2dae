//! 记录存储 - 业务能力层
//!
//! 只负责"读行 / 写行"能力，不关心流程

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::clients::sheets_client::quote_sheet_title;
use crate::clients::{Credentials, IdentityProvider, SheetsClient};
use crate::error::StoreError;
use crate::models::{RecordFields, Row};

/// 行式存储
///
/// 行顺序即处理顺序
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list_rows(&self) -> Result<Vec<Row>, StoreError>;

    /// 持久化一行的当前内容
    async fn save(&self, row: &Row) -> Result<(), StoreError>;
}

/// 存储工厂：凭据 → 已认证的存储
#[async_trait]
pub trait StoreFactory: Send + Sync {
    async fn open(
        &self,
        store_id: &str,
        credentials: &Credentials,
    ) -> Result<Arc<dyn RecordStore>, StoreError>;
}

/// Google 表格的第一个工作表
///
/// 第一行是表头（列名），数据从第二行开始
pub struct SheetsRecordStore {
    client: SheetsClient,
    sheet_range: String,
    required_columns: Vec<String>,
}

impl SheetsRecordStore {
    /// 连接表格并定位第一个工作表
    pub async fn open(client: SheetsClient, fields: &RecordFields) -> Result<Self, StoreError> {
        let title = client.first_sheet_title().await?;
        info!("📊 使用工作表: {}", title);

        Ok(Self {
            client,
            sheet_range: quote_sheet_title(&title),
            required_columns: vec![fields.key_field.clone(), fields.result_field.clone()],
        })
    }
}

#[async_trait]
impl RecordStore for SheetsRecordStore {
    async fn list_rows(&self) -> Result<Vec<Row>, StoreError> {
        let mut values = self.client.read_values(&self.sheet_range).await?.into_iter();
        let headers: Vec<String> = values
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();

        for column in &self.required_columns {
            if !headers.contains(column) {
                return Err(StoreError::MissingColumn(column.clone()));
            }
        }

        let rows: Vec<Row> = values
            .enumerate()
            .map(|(index, cells)| {
                let mut cells = cells.into_iter();
                Row {
                    index,
                    fields: headers
                        .iter()
                        .map(|h| (h.clone(), cells.next().unwrap_or_default()))
                        .collect(),
                }
            })
            .collect();

        debug!("读取到 {} 行数据", rows.len());
        Ok(rows)
    }

    async fn save(&self, row: &Row) -> Result<(), StoreError> {
        // 表头占第 1 行，数据行号从 2 开始
        let range = format!("{}!A{}", self.sheet_range, row.index + 2);
        let values = row.fields.iter().map(|(_, v)| v.clone()).collect();
        self.client.write_row(&range, values).await
    }
}

/// 生产环境的存储工厂
pub struct SheetsStoreFactory {
    api_base: String,
    identity: Arc<dyn IdentityProvider>,
    fields: RecordFields,
}

impl SheetsStoreFactory {
    pub fn new(
        api_base: impl Into<String>,
        identity: Arc<dyn IdentityProvider>,
        fields: RecordFields,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            identity,
            fields,
        }
    }
}

#[async_trait]
impl StoreFactory for SheetsStoreFactory {
    async fn open(
        &self,
        store_id: &str,
        credentials: &Credentials,
    ) -> Result<Arc<dyn RecordStore>, StoreError> {
        let token = self.identity.access_token(credentials).await?;
        let client = SheetsClient::new(&self.api_base, store_id, token)?;
        let store = SheetsRecordStore::open(client, &self.fields).await?;
        Ok(Arc::new(store))
    }
}
