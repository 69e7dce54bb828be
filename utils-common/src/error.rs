use thiserror::Error;

use crate::models::ItemId;

/// 目录相关操作的结果类型
pub type Result<T> = std::result::Result<T, CatalogError>;

/// 目录错误类型
#[derive(Debug, Error)]
pub enum CatalogError {
    /// 文件读写失败
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON解析或序列化失败
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 二进制序列化失败
    #[error("序列化失败: {0}")]
    Encode(String),

    /// 二进制反序列化失败
    #[error("反序列化失败: {0}")]
    Decode(String),

    /// 快照数据太短，无法读取头部
    #[error("数据太短，无法解析: {0} 字节")]
    TooShort(usize),

    /// 魔数不匹配
    #[error("无效的文件格式：魔数不匹配")]
    BadMagic,

    /// 快照版本高于支持的最大版本
    #[error("不支持的版本: {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    /// 解压后的大小与头部记录不一致
    #[error("解压后数据大小不匹配: 期望 {expected} 字节, 实际 {actual} 字节")]
    SizeMismatch { expected: usize, actual: usize },

    /// 没有任何期刊或文章
    #[error("无法构建快照: 没有期刊或文章数据")]
    EmptyCatalog,

    /// 查询参数违反调用约定
    #[error("无效的查询参数: {0}")]
    InvalidParams(String),

    /// 期刊不存在
    #[error("期刊不存在: {0}")]
    RevistaNotFound(ItemId),

    /// 文章不存在
    #[error("文章不存在: {0}")]
    ArticuloNotFound(ItemId),
}
