use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use utils_common::{CatalogConfig, CatalogError};

/// 筛选维度 - 决定条目的哪个字段作为筛选值
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    /// 出版机构
    #[default]
    Institution,
    /// 学科分类
    Category,
}

/// 列表展示方式
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// 卡片
    #[default]
    Cards,
    /// 列表
    List,
}

impl ViewMode {
    /// 切换到另一种展示方式
    pub fn toggle(self) -> Self {
        match self {
            ViewMode::Cards => ViewMode::List,
            ViewMode::List => ViewMode::Cards,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Cards => "cards",
            ViewMode::List => "list",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "cards" => Ok(ViewMode::Cards),
            "list" => Ok(ViewMode::List),
            other => Err(CatalogError::InvalidParams(format!("未知的展示方式: {}", other))),
        }
    }
}

/// 列表页面类型
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ListingKind {
    /// 全部期刊，按机构筛选
    Revistas,
    /// 单个期刊下的文章，按学科筛选
    RevistaArticulos,
    /// 全部文章，按机构筛选
    Articulos,
}

impl ListingKind {
    /// 该页面的每页条数
    pub fn page_size(self, config: &CatalogConfig) -> usize {
        match self {
            ListingKind::Revistas => config.revistas_page_size,
            ListingKind::RevistaArticulos | ListingKind::Articulos => config.articulos_page_size,
        }
    }

    /// 该页面使用的筛选维度
    pub fn facet(self) -> Facet {
        match self {
            ListingKind::RevistaArticulos => Facet::Category,
            ListingKind::Revistas | ListingKind::Articulos => Facet::Institution,
        }
    }

    /// 页面首次加载时的查询参数
    pub fn default_params(self, config: &CatalogConfig) -> QueryParams {
        QueryParams {
            facet: self.facet(),
            page_size: self.page_size(config),
            ..QueryParams::default()
        }
    }
}

impl FromStr for ListingKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "revistas" => Ok(ListingKind::Revistas),
            "revista-articulos" => Ok(ListingKind::RevistaArticulos),
            "articulos" => Ok(ListingKind::Articulos),
            other => Err(CatalogError::InvalidParams(format!("未知的列表类型: {}", other))),
        }
    }
}

/// 日期范围，两端都可以不设
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    /// 开始日期（含）
    #[serde(default)]
    pub from: Option<NaiveDate>,
    /// 结束日期（含）
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    /// 两端都没有设置
    pub fn is_open(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

/// 解析 "all" 或 "startDate,endDate" 格式的日期范围，任意一端可以留空
impl FromStr for DateRange {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "all" {
            return Ok(DateRange::default());
        }

        let (start, end) = s.split_once(',').unwrap_or((s, ""));
        let parse = |part: &str| -> Result<Option<NaiveDate>, CatalogError> {
            let part = part.trim();
            if part.is_empty() {
                return Ok(None);
            }
            NaiveDate::parse_from_str(part, "%Y-%m-%d")
                .map(Some)
                .map_err(|e| CatalogError::InvalidParams(format!("无效的日期 '{}': {}", part, e)))
        };

        Ok(DateRange::new(parse(start)?, parse(end)?))
    }
}

/// 查询参数 - 视图传入的搜索、筛选和分页意图
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct QueryParams {
    /// 搜索文本（原始输入）
    #[serde(default)]
    pub search_text: String,
    /// 选中的筛选值，为空表示不筛选
    #[serde(default)]
    pub selected_facet_values: HashSet<String>,
    /// 筛选维度
    #[serde(default)]
    pub facet: Facet,
    /// 日期范围
    #[serde(default)]
    pub date_range: Option<DateRange>,
    /// 当前页码，从 1 开始
    #[serde(default = "default_page")]
    pub page: usize,
    /// 每页条数
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// 展示方式
    #[serde(default)]
    pub view_mode: ViewMode,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            selected_facet_values: HashSet::new(),
            facet: Facet::default(),
            date_range: None,
            page: default_page(),
            page_size: default_page_size(),
            view_mode: ViewMode::default(),
        }
    }
}

impl QueryParams {
    /// 检查调用约定：页码和每页条数都必须至少为 1
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.page < 1 {
            return Err(CatalogError::InvalidParams(format!("页码必须从 1 开始: {}", self.page)));
        }
        if self.page_size < 1 {
            return Err(CatalogError::InvalidParams(format!(
                "每页条数必须大于 0: {}",
                self.page_size
            )));
        }
        Ok(())
    }

    /// 单选筛选：选中一个值，空字符串表示全部
    pub fn select_single(&mut self, value: &str) {
        self.selected_facet_values.clear();
        if !value.is_empty() {
            self.selected_facet_values.insert(value.to_string());
        }
    }

    /// 多选筛选：切换一个值的选中状态
    pub fn toggle_facet_value(&mut self, value: &str) {
        if !self.selected_facet_values.remove(value) {
            self.selected_facet_values.insert(value.to_string());
        }
    }
}

/// 查询结果 - 当前页的条目和结果元数据
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct QueryResult<T> {
    /// 当前页条目，保持原始顺序
    pub items: Vec<T>,
    /// 分页前的匹配总数
    pub total_matching: usize,
    /// 总页数，至少为 1
    pub total_pages: usize,
    /// 当前页码
    pub page: usize,
    /// 每页条数
    pub page_size: usize,
    /// 是否有上一页
    pub has_previous: bool,
    /// 是否有下一页
    pub has_next: bool,
    /// 未筛选数据中出现过的非空筛选值，按首次出现顺序
    pub available_facet_values: Vec<String>,
    /// 展示方式
    pub view_mode: ViewMode,
}

/// 把页码限制在 [1, total_pages] 内，由调用方在越界时使用
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// 默认页码
fn default_page() -> usize {
    1
}

/// 默认每页条数
fn default_page_size() -> usize {
    20
}
