use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::models::ItemId;

/// 目录配置 - 所有字段都有默认值，JSON 中可以只写需要覆盖的部分
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CatalogConfig {
    /// REST API 根地址
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// 期刊列表每页条数
    #[serde(default = "default_revistas_page_size")]
    pub revistas_page_size: usize,
    /// 文章列表每页条数
    #[serde(default = "default_articulos_page_size")]
    pub articulos_page_size: usize,
    /// 首页推荐期刊数量
    #[serde(default = "default_featured_count")]
    pub featured_count: usize,
    /// 缺少封面时使用的图片
    #[serde(default = "default_placeholder_image")]
    pub placeholder_image: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            revistas_page_size: default_revistas_page_size(),
            articulos_page_size: default_articulos_page_size(),
            featured_count: default_featured_count(),
            placeholder_image: default_placeholder_image(),
        }
    }
}

impl CatalogConfig {
    /// 从 JSON 字符串读取配置
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 从 JSON 文件读取配置
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// 替换 API 根地址
    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    fn base(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    /// 期刊列表地址
    pub fn revistas_url(&self) -> String {
        format!("{}/api/revistas/", self.base())
    }

    /// 期刊详情地址
    pub fn revista_url(&self, id: ItemId) -> String {
        format!("{}/api/revistas/{}/", self.base(), id)
    }

    /// 文章列表地址
    pub fn articulos_url(&self) -> String {
        format!("{}/api/articulos/", self.base())
    }

    /// 文章详情地址
    pub fn articulo_url(&self, id: ItemId) -> String {
        format!("{}/api/articulos/{}/", self.base(), id)
    }

    /// 统计地址
    pub fn stats_url(&self) -> String {
        format!("{}/api/stats/", self.base())
    }

    /// 封面图片的完整地址，已经是绝对地址时原样返回
    pub fn cover_image_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        if path.starts_with('/') {
            format!("{}{}", self.base(), path)
        } else {
            format!("{}/{}", self.base(), path)
        }
    }
}

fn default_api_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_revistas_page_size() -> usize {
    20
}

fn default_articulos_page_size() -> usize {
    21
}

fn default_featured_count() -> usize {
    6
}

fn default_placeholder_image() -> String {
    "/placeholder.jpg".to_string()
}
