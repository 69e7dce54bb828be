use log::debug;
use utils_common::compression::from_compressed;
use utils_common::{Articulo, CatalogConfig, CatalogError, CatalogSnapshot, CatalogStats, ItemId, Revista, Result};

use crate::builder::attach_cover_images;
use crate::engine::{available_facet_values, query};
use crate::item::CatalogItem;
use crate::models::{Facet, ListingKind, QueryParams, QueryResult};

/// 一次视图加载所持有的目录数据
///
/// 数据加载后只读，每次查询都从当前数据和参数重新计算结果。
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    revistas: Vec<Revista>,
    articulos: Vec<Articulo>,
    stats: CatalogStats,
}

impl Catalog {
    pub fn new(revistas: Vec<Revista>, articulos: Vec<Articulo>, stats: CatalogStats) -> Self {
        Self {
            revistas,
            articulos,
            stats,
        }
    }

    /// 从快照创建
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        Self::new(snapshot.revistas, snapshot.articulos, snapshot.stats)
    }

    /// 从压缩快照数据创建
    pub fn from_compressed(data: &[u8]) -> Result<Self> {
        let snapshot: CatalogSnapshot = from_compressed(data)?;
        debug!(
            "快照加载完成: 版本 {}，期刊 {}，文章 {}",
            snapshot.version,
            snapshot.revistas.len(),
            snapshot.articulos.len()
        );
        Ok(Self::from_snapshot(snapshot))
    }

    /// 从 API 返回的 JSON 数组创建，并补全文章封面
    pub fn from_json(revistas_json: &str, articulos_json: &str, config: &CatalogConfig) -> Result<Self> {
        let revistas: Vec<Revista> = serde_json::from_str(revistas_json)?;
        let articulos: Vec<Articulo> = serde_json::from_str(articulos_json)?;
        let articulos = attach_cover_images(&revistas, articulos, config);
        let stats = CatalogStats::from_collections(&revistas, &articulos);
        Ok(Self::new(revistas, articulos, stats))
    }

    /// 替换统计信息（例如来自 `/api/stats/`）
    pub fn set_stats(&mut self, stats: CatalogStats) {
        self.stats = stats;
    }

    pub fn revistas(&self) -> &[Revista] {
        &self.revistas
    }

    pub fn articulos(&self) -> &[Articulo] {
        &self.articulos
    }

    pub fn stats(&self) -> &CatalogStats {
        &self.stats
    }

    /// 期刊详情
    pub fn revista(&self, id: ItemId) -> Result<&Revista> {
        self.revistas
            .iter()
            .find(|revista| revista.item_id() == id)
            .ok_or(CatalogError::RevistaNotFound(id))
    }

    /// 文章详情
    pub fn articulo(&self, id: ItemId) -> Result<&Articulo> {
        self.articulos
            .iter()
            .find(|articulo| articulo.item_id() == id)
            .ok_or(CatalogError::ArticuloNotFound(id))
    }

    /// 首页推荐的前 count 本期刊
    pub fn featured_revistas(&self, count: usize) -> &[Revista] {
        &self.revistas[..count.min(self.revistas.len())]
    }

    /// 某期刊下的全部文章，保持原始顺序
    pub fn articulos_of(&self, revista_id: ItemId) -> Vec<&Articulo> {
        self.articulos
            .iter()
            .filter(|articulo| articulo.fuente == Some(revista_id))
            .collect()
    }

    /// 查询期刊列表
    pub fn query_revistas(&self, params: &QueryParams) -> Result<QueryResult<&Revista>> {
        params.validate()?;
        let source: Vec<&Revista> = self.revistas.iter().collect();
        Ok(query(&source, params))
    }

    /// 查询全部文章
    pub fn query_articulos(&self, params: &QueryParams) -> Result<QueryResult<&Articulo>> {
        params.validate()?;
        let source: Vec<&Articulo> = self.articulos.iter().collect();
        Ok(query(&source, params))
    }

    /// 查询某期刊下的文章，筛选值只取自该期刊的文章
    pub fn query_revista_articulos(
        &self,
        revista_id: ItemId,
        params: &QueryParams,
    ) -> Result<QueryResult<&Articulo>> {
        params.validate()?;
        self.revista(revista_id)?;
        let source = self.articulos_of(revista_id);
        Ok(query(&source, params))
    }

    /// 期刊列表的筛选选项
    pub fn revista_facet_values(&self, facet: Facet) -> Vec<String> {
        available_facet_values(&self.revistas, facet)
    }

    /// 文章列表的筛选选项
    pub fn articulo_facet_values(&self, facet: Facet) -> Vec<String> {
        available_facet_values(&self.articulos, facet)
    }

    /// 列表页面的全部筛选选项，单个期刊的文章列表只取该期刊的文章
    pub fn facet_values(&self, listing: ListingKind, revista_id: Option<ItemId>) -> Result<Vec<String>> {
        match listing {
            ListingKind::Revistas => Ok(self.revista_facet_values(listing.facet())),
            ListingKind::Articulos => Ok(self.articulo_facet_values(listing.facet())),
            ListingKind::RevistaArticulos => {
                let revista_id = revista_id.ok_or_else(|| {
                    CatalogError::InvalidParams("revista-articulos 需要期刊 id".to_string())
                })?;
                self.revista(revista_id)?;
                Ok(available_facet_values(&self.articulos_of(revista_id), listing.facet()))
            }
        }
    }
}
