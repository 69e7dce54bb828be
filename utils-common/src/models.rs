use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 目录条目标识符（REST API 的数字主键）
pub type ItemId = u64;

/// 描述缺失时展示的文本
pub const MISSING_DESCRIPTION: &str = "Sin descripción disponible.";

/// 期刊 - `/api/revistas/` 返回的记录
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Revista {
    /// 期刊唯一标识符
    pub id: ItemId,
    /// 期刊名称
    #[serde(default)]
    pub name: Option<String>,
    /// 出版机构
    #[serde(default)]
    pub publisher: Option<String>,
    /// 期刊简介
    #[serde(default)]
    pub description: Option<String>,
    /// 封面图片路径（相对于 API 根地址）
    #[serde(default)]
    pub cover_image: Option<String>,
    /// 官方网站
    #[serde(default)]
    pub official_url: Option<String>,
    /// 创刊年份
    #[serde(default)]
    pub start_year: Option<i32>,
    /// 最近一次采集时间
    #[serde(default)]
    pub last_harvest_date: Option<String>,
    /// 文章总数
    #[serde(default)]
    pub total_articles: Option<u64>,
    /// 作者总数
    #[serde(default)]
    pub total_authors: Option<u64>,
}

impl Revista {
    /// 创建只有标识符和名称的期刊
    pub fn new(id: ItemId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
            publisher: None,
            description: None,
            cover_image: None,
            official_url: None,
            start_year: None,
            last_harvest_date: None,
            total_articles: None,
            total_authors: None,
        }
    }

    /// 创刊年份的 1 月 1 日
    pub fn published_date(&self) -> Option<NaiveDate> {
        self.start_year.and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
    }

    /// 列表卡片使用的简介摘要
    pub fn excerpt(&self, max_chars: usize) -> String {
        excerpt_of([self.description.as_deref()], max_chars)
    }
}

/// 文章 - `/api/articulos/` 返回的记录
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Articulo {
    /// 文章唯一标识符
    pub id: ItemId,
    /// 文章标题
    #[serde(default)]
    pub title: Option<String>,
    /// 作者
    #[serde(default)]
    pub creator: Option<String>,
    /// 出版机构
    #[serde(default)]
    pub publisher: Option<String>,
    /// 西班牙语摘要
    #[serde(default)]
    pub description_es: Option<String>,
    /// 英语摘要
    #[serde(default)]
    pub description_en: Option<String>,
    /// 学科分类
    #[serde(default)]
    pub subject_es: Option<String>,
    /// 发布日期（原始字符串）
    #[serde(default)]
    pub date_published: Option<String>,
    /// 所属期刊
    #[serde(default)]
    pub fuente: Option<ItemId>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub relation: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    /// 所属期刊的封面，构建快照时填充
    #[serde(default)]
    pub image: Option<String>,
}

impl Articulo {
    /// 创建只有标识符和标题的文章
    pub fn new(id: ItemId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: Some(title.into()),
            creator: None,
            publisher: None,
            description_es: None,
            description_en: None,
            subject_es: None,
            date_published: None,
            fuente: None,
            identifier: None,
            language: None,
            format: None,
            relation: None,
            resource_type: None,
            image: None,
        }
    }

    /// 解析后的发布日期，无法识别的格式视为缺失
    pub fn published_date(&self) -> Option<NaiveDate> {
        self.date_published.as_deref().and_then(parse_published_date)
    }

    /// 列表卡片使用的摘要，优先西班牙语
    pub fn excerpt(&self, max_chars: usize) -> String {
        excerpt_of(
            [self.description_es.as_deref(), self.description_en.as_deref()],
            max_chars,
        )
    }
}

/// 宽松地解析发布日期
///
/// 支持 `YYYY-MM-DD`、RFC 3339 时间戳、以 `YYYY-MM-DD` 开头的字符串和单独的年份。
pub fn parse_published_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.with_timezone(&Utc).date_naive());
    }

    if let Some(prefix) = raw.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(date);
        }
    }

    if raw.len() == 4 && raw.chars().all(|c| c.is_ascii_digit()) {
        return raw
            .parse::<i32>()
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1));
    }

    None
}

// 取第一个非空描述的前 max_chars 个字符
fn excerpt_of<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>, max_chars: usize) -> String {
    candidates
        .into_iter()
        .flatten()
        .find(|text| !text.is_empty())
        .map(|text| text.chars().take(max_chars).collect())
        .unwrap_or_else(|| MISSING_DESCRIPTION.to_string())
}

/// 目录统计 - `/api/stats/` 返回的记录
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CatalogStats {
    /// 期刊总数
    #[serde(default)]
    pub total_revistas: u64,
    /// 文章总数
    #[serde(default)]
    pub total_articulos: u64,
    /// 作者总数
    #[serde(default)]
    pub total_autores: u64,
}

impl CatalogStats {
    /// 在没有统计导出时根据数据计算
    ///
    /// 作者按 `;` 拆分后去重计数。
    pub fn from_collections(revistas: &[Revista], articulos: &[Articulo]) -> Self {
        let autores: HashSet<&str> = articulos
            .iter()
            .filter_map(|articulo| articulo.creator.as_deref())
            .flat_map(|creator| creator.split(';'))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect();

        Self {
            total_revistas: revistas.len() as u64,
            total_articulos: articulos.len() as u64,
            total_autores: autores.len() as u64,
        }
    }
}

/// 目录快照 - 一次视图加载所需的全部数据
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CatalogSnapshot {
    /// 快照格式版本
    pub version: String,
    /// 快照创建时间
    pub created_at: DateTime<Utc>,
    /// 所有期刊，保持 API 返回顺序
    pub revistas: Vec<Revista>,
    /// 所有文章，保持 API 返回顺序
    pub articulos: Vec<Articulo>,
    /// 统计信息
    pub stats: CatalogStats,
}
