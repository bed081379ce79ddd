//! DynamoDB 响应缓存
//!
//! 表结构：单一字符串分区键 `ID`，预置吞吐量。
//! 记录内容为 `CachedResponse` 序列化后的属性，外加 `ID`。

use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, meta::region::RegionProviderChain};
use aws_sdk_dynamodb::{
    Client,
    client::Waiters,
    error::{DisplayErrorContext, SdkError},
    operation::{create_table::CreateTableError, describe_table::DescribeTableError},
    types::{
        AttributeDefinition, AttributeValue, KeySchemaElement, KeyType, ProvisionedThroughput,
        ScalarAttributeType,
    },
};
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, to_item};
use tracing::{debug, error, info, trace, warn};

use crate::cache::traits::{CacheResult, ResponseCache};
use crate::config::DynamoDbConfig;
use crate::errors::{IpDistanceError, Result};
use crate::models::CachedResponse;

/// 分区键属性名
pub const PARTITION_KEY: &str = "ID";

pub struct DynamoDbResponseCache {
    client: Client,
    table: String,
    read_capacity: i64,
    write_capacity: i64,
    ready_timeout: Duration,
}

impl DynamoDbResponseCache {
    /// 创建客户端
    ///
    /// 配置了 `endpoint_url` 时连接该地址（例如 DynamoDB Local），
    /// 否则使用 `region`，为空时退回到默认的 AWS 区域解析链。
    pub async fn new(config: &DynamoDbConfig) -> Result<Self> {
        let region = (!config.region.is_empty()).then(|| Region::new(config.region.clone()));
        let region_provider = RegionProviderChain::first_try(region).or_default_provider();

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region_provider);
        if let Some(ref endpoint) = config.endpoint_url {
            debug!("DynamoDB endpoint override: {}", endpoint);
            loader = loader.endpoint_url(endpoint.as_str());
        }
        let sdk_config = loader.load().await;

        Ok(Self::with_client(Client::new(&sdk_config), config))
    }

    /// 使用已有客户端构造
    pub fn with_client(client: Client, config: &DynamoDbConfig) -> Self {
        Self {
            client,
            table: config.table.clone(),
            read_capacity: config.read_capacity,
            write_capacity: config.write_capacity,
            ready_timeout: Duration::from_secs(config.ready_timeout_secs),
        }
    }

    async fn table_exists(&self) -> Result<bool> {
        match self
            .client
            .describe_table()
            .table_name(&self.table)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err)
                if matches!(err, SdkError::ServiceError(ref inner)
                    if matches!(inner.err(), DescribeTableError::ResourceNotFoundException(_))) =>
            {
                Ok(false)
            }
            Err(err) => Err(IpDistanceError::provision(format!(
                "describe table '{}' failed: {}",
                self.table,
                DisplayErrorContext(&err)
            ))),
        }
    }

    async fn create_table(&self) -> Result<()> {
        let attribute = AttributeDefinition::builder()
            .attribute_name(PARTITION_KEY)
            .attribute_type(ScalarAttributeType::S)
            .build()
            .map_err(|e| IpDistanceError::provision(format!("attribute definition: {}", e)))?;
        let key_schema = KeySchemaElement::builder()
            .attribute_name(PARTITION_KEY)
            .key_type(KeyType::Hash)
            .build()
            .map_err(|e| IpDistanceError::provision(format!("key schema: {}", e)))?;
        let throughput = ProvisionedThroughput::builder()
            .read_capacity_units(self.read_capacity)
            .write_capacity_units(self.write_capacity)
            .build()
            .map_err(|e| IpDistanceError::provision(format!("provisioned throughput: {}", e)))?;

        match self
            .client
            .create_table()
            .table_name(&self.table)
            .attribute_definitions(attribute)
            .key_schema(key_schema)
            .provisioned_throughput(throughput)
            .send()
            .await
        {
            Ok(_) => {
                info!("Created DynamoDB table '{}'", self.table);
                Ok(())
            }
            // 其他实例同时在建表
            Err(err)
                if matches!(err, SdkError::ServiceError(ref inner)
                    if matches!(inner.err(), CreateTableError::ResourceInUseException(_))) =>
            {
                debug!("DynamoDB table '{}' is already being created", self.table);
                Ok(())
            }
            Err(err) => Err(IpDistanceError::provision(format!(
                "create table '{}' failed: {}",
                self.table,
                DisplayErrorContext(&err)
            ))),
        }
    }

    async fn wait_until_ready(&self) -> Result<()> {
        self.client
            .wait_until_table_exists()
            .table_name(&self.table)
            .wait(self.ready_timeout)
            .await
            .map_err(|e| {
                IpDistanceError::provision(format!(
                    "table '{}' did not become active within {}s: {}",
                    self.table,
                    self.ready_timeout.as_secs(),
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }
}

/// 将响应编码为 DynamoDB item（含分区键）
pub fn encode_item(
    key: &str,
    value: &CachedResponse,
) -> Result<std::collections::HashMap<String, AttributeValue>> {
    let mut item: std::collections::HashMap<String, AttributeValue> = to_item(value)
        .map_err(|e| IpDistanceError::serialization(format!("encode cache item: {}", e)))?;
    item.insert(PARTITION_KEY.to_string(), AttributeValue::S(key.to_string()));
    Ok(item)
}

/// 从 DynamoDB item 解码响应（忽略分区键）
pub fn decode_item(
    mut item: std::collections::HashMap<String, AttributeValue>,
) -> Result<CachedResponse> {
    item.remove(PARTITION_KEY);
    from_item(item).map_err(|e| IpDistanceError::serialization(format!("decode cache item: {}", e)))
}

#[async_trait]
impl ResponseCache for DynamoDbResponseCache {
    async fn ensure_schema(&self) -> Result<()> {
        if self.table_exists().await? {
            debug!("DynamoDB table '{}' already exists", self.table);
        } else {
            warn!("DynamoDB table '{}' not found, creating it", self.table);
            self.create_table().await?;
        }
        // 新建的表需要等待变为 ACTIVE，已存在的表这里会立即返回
        self.wait_until_ready().await
    }

    async fn get(&self, key: &str) -> CacheResult {
        let output = match self
            .client
            .get_item()
            .table_name(&self.table)
            .key(PARTITION_KEY, AttributeValue::S(key.to_string()))
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                error!("DynamoDB GetItem for '{}' failed: {}", key, DisplayErrorContext(&err));
                return CacheResult::Error(format!(
                    "dynamodb get failed: {}",
                    DisplayErrorContext(&err)
                ));
            }
        };

        match output.item {
            Some(item) => match decode_item(item) {
                Ok(response) => {
                    trace!("DynamoDB cache hit: {}", key);
                    CacheResult::Found(response)
                }
                Err(e) => {
                    error!("Undecodable DynamoDB item '{}': {}", key, e);
                    CacheResult::Error(e.message().to_string())
                }
            },
            None => CacheResult::NotFound,
        }
    }

    async fn put(&self, key: &str, value: &CachedResponse) -> Result<()> {
        let item = encode_item(key, value)?;
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|err| {
                IpDistanceError::cache_backend(format!(
                    "dynamodb put for '{}' failed: {}",
                    key,
                    DisplayErrorContext(&err)
                ))
            })?;
        trace!("Stored response in DynamoDB: {}", key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "dynamodb"
    }
}
