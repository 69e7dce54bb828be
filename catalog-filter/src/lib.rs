use wasm_bindgen::prelude::*;
use serde::Serialize;
use std::fmt::Display;
use utils_common::{CatalogConfig, CatalogStats};
use web_sys::console;

// 导出模块
pub mod builder;
pub mod catalog;
pub mod engine;
pub mod item;
pub mod models;

pub use catalog::Catalog;
pub use engine::{available_facet_values, matches_date_range, matches_facet, matches_search, normalize, query};
pub use item::CatalogItem;
pub use models::{clamp_page, DateRange, Facet, ListingKind, QueryParams, QueryResult, ViewMode};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// 初始化函数 - 设置错误处理
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// 版本信息
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// 带耗时的响应
#[derive(Serialize)]
struct Timed<T> {
    #[serde(flatten)]
    result: T,
    /// 查询耗时(毫秒)
    time_ms: f64,
}

fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

// 记录错误并转换为JS错误
fn js_error(context: &str, err: impl Display) -> JsValue {
    let message = format!("{}: {}", context, err);
    console::log_1(&JsValue::from_str(&message));
    JsValue::from_str(&message)
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| js_error("序列化结果失败", e))
}

fn parse_params(params_json: &str) -> Result<QueryParams, JsValue> {
    serde_json::from_str(params_json).map_err(|e| js_error("解析参数失败", e))
}

/// 目录过滤器JS接口 - 提供给JavaScript使用的查询API
#[wasm_bindgen]
pub struct CatalogFilterJS {
    catalog: Catalog,
    config: CatalogConfig,
}

#[wasm_bindgen]
impl CatalogFilterJS {
    /// 创建过滤器，可选传入配置JSON
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<CatalogFilterJS, JsValue> {
        console_error_panic_hook::set_once();

        let config = match config_json {
            Some(json) => CatalogConfig::from_json(&json).map_err(|e| js_error("解析配置失败", e))?,
            None => CatalogConfig::default(),
        };

        Ok(CatalogFilterJS {
            catalog: Catalog::default(),
            config,
        })
    }

    /// 加载压缩快照
    pub fn load_snapshot(&mut self, data: &[u8]) -> Result<(), JsValue> {
        self.catalog = Catalog::from_compressed(data).map_err(|e| js_error("加载快照失败", e))?;
        Ok(())
    }

    /// 加载 `/api/revistas/` 和 `/api/articulos/` 返回的JSON
    pub fn load_json(&mut self, revistas_json: &str, articulos_json: &str) -> Result<(), JsValue> {
        self.catalog = Catalog::from_json(revistas_json, articulos_json, &self.config)
            .map_err(|e| js_error("加载目录数据失败", e))?;
        Ok(())
    }

    /// 使用 `/api/stats/` 返回的统计
    pub fn set_stats(&mut self, stats_json: &str) -> Result<(), JsValue> {
        let stats: CatalogStats =
            serde_json::from_str(stats_json).map_err(|e| js_error("解析统计失败", e))?;
        self.catalog.set_stats(stats);
        Ok(())
    }

    /// 列表页面的初始查询参数
    pub fn default_params(&self, listing: &str) -> Result<JsValue, JsValue> {
        let listing: ListingKind = listing.parse().map_err(|e| js_error("解析列表类型失败", e))?;
        to_js(&listing.default_params(&self.config))
    }

    /// 查询期刊
    pub fn query_revistas(&self, params_json: &str) -> Result<JsValue, JsValue> {
        let start = now_ms();
        let params = parse_params(params_json)?;
        let result = self
            .catalog
            .query_revistas(&params)
            .map_err(|e| js_error("查询期刊失败", e))?;
        to_js(&Timed { result, time_ms: now_ms() - start })
    }

    /// 查询全部文章
    pub fn query_articulos(&self, params_json: &str) -> Result<JsValue, JsValue> {
        let start = now_ms();
        let params = parse_params(params_json)?;
        let result = self
            .catalog
            .query_articulos(&params)
            .map_err(|e| js_error("查询文章失败", e))?;
        to_js(&Timed { result, time_ms: now_ms() - start })
    }

    /// 查询某期刊下的文章
    pub fn query_revista_articulos(&self, revista_id: u32, params_json: &str) -> Result<JsValue, JsValue> {
        let start = now_ms();
        let params = parse_params(params_json)?;
        let result = self
            .catalog
            .query_revista_articulos(u64::from(revista_id), &params)
            .map_err(|e| js_error("查询期刊文章失败", e))?;
        to_js(&Timed { result, time_ms: now_ms() - start })
    }

    /// 期刊详情
    pub fn get_revista(&self, id: u32) -> Result<JsValue, JsValue> {
        let revista = self
            .catalog
            .revista(u64::from(id))
            .map_err(|e| js_error("获取期刊失败", e))?;
        to_js(revista)
    }

    /// 文章详情
    pub fn get_articulo(&self, id: u32) -> Result<JsValue, JsValue> {
        let articulo = self
            .catalog
            .articulo(u64::from(id))
            .map_err(|e| js_error("获取文章失败", e))?;
        to_js(articulo)
    }

    /// 首页推荐期刊
    pub fn featured_revistas(&self) -> Result<JsValue, JsValue> {
        to_js(self.catalog.featured_revistas(self.config.featured_count))
    }

    /// 统计信息
    pub fn stats(&self) -> Result<JsValue, JsValue> {
        to_js(self.catalog.stats())
    }

    /// 列表页面的全部筛选选项，revista-articulos 需要传入期刊 id
    pub fn facet_values(&self, listing: &str, revista_id: Option<u32>) -> Result<JsValue, JsValue> {
        let listing: ListingKind = listing.parse().map_err(|e| js_error("解析列表类型失败", e))?;
        let values = self
            .catalog
            .facet_values(listing, revista_id.map(u64::from))
            .map_err(|e| js_error("获取筛选选项失败", e))?;
        to_js(&values)
    }
}
