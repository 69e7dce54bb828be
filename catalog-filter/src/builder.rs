use chrono::Utc;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use utils_common::compression::{to_compressed, SNAPSHOT_VERSION};
use utils_common::{Articulo, CatalogConfig, CatalogError, CatalogSnapshot, CatalogStats, ItemId, Revista, Result};

/// 快照构建器 - 收集期刊和文章，补全封面后生成快照
#[derive(Debug)]
pub struct SnapshotBuilder {
    config: CatalogConfig,
    revistas: Vec<Revista>,
    articulos: Vec<Articulo>,
    stats: Option<CatalogStats>,
}

impl SnapshotBuilder {
    /// 创建新的快照构建器
    pub fn new(config: CatalogConfig) -> Self {
        Self {
            config,
            revistas: Vec::new(),
            articulos: Vec::new(),
            stats: None,
        }
    }

    /// 添加期刊
    pub fn add_revista(&mut self, revista: Revista) {
        self.revistas.push(revista);
    }

    /// 添加文章
    pub fn add_articulo(&mut self, articulo: Articulo) {
        self.articulos.push(articulo);
    }

    pub fn extend_revistas(&mut self, revistas: impl IntoIterator<Item = Revista>) {
        self.revistas.extend(revistas);
    }

    pub fn extend_articulos(&mut self, articulos: impl IntoIterator<Item = Articulo>) {
        self.articulos.extend(articulos);
    }

    /// 使用 API 导出的统计，不设置时根据数据计算
    pub fn set_stats(&mut self, stats: CatalogStats) {
        self.stats = Some(stats);
    }

    pub fn revista_count(&self) -> usize {
        self.revistas.len()
    }

    pub fn articulo_count(&self) -> usize {
        self.articulos.len()
    }

    /// 构建快照
    pub fn build_snapshot(&self) -> Result<CatalogSnapshot> {
        if self.revistas.is_empty() && self.articulos.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }

        info!(
            "开始构建目录快照，期刊数量: {}，文章数量: {}",
            self.revistas.len(),
            self.articulos.len()
        );

        let articulos = attach_cover_images(&self.revistas, self.articulos.clone(), &self.config);
        let stats = self
            .stats
            .clone()
            .unwrap_or_else(|| CatalogStats::from_collections(&self.revistas, &articulos));

        debug!(
            "统计: 期刊 {}，文章 {}，作者 {}",
            stats.total_revistas, stats.total_articulos, stats.total_autores
        );

        Ok(CatalogSnapshot {
            version: format!("{}.{}", SNAPSHOT_VERSION[0], SNAPSHOT_VERSION[1]),
            created_at: Utc::now(),
            revistas: self.revistas.clone(),
            articulos,
            stats,
        })
    }

    /// 保存快照到文件
    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let snapshot = self.build_snapshot()?;
        let compressed_data = to_compressed(&snapshot, SNAPSHOT_VERSION)?;

        let mut file = File::create(path)?;
        file.write_all(&compressed_data)?;

        info!(
            "目录快照已写入文件: {}，大小: {} 字节",
            path.display(),
            compressed_data.len()
        );

        Ok(compressed_data.len())
    }
}

/// 为每篇文章填充所属期刊的封面，找不到期刊或期刊没有封面时使用占位图
pub fn attach_cover_images(
    revistas: &[Revista],
    articulos: Vec<Articulo>,
    config: &CatalogConfig,
) -> Vec<Articulo> {
    let covers: HashMap<ItemId, Option<&str>> = revistas
        .iter()
        .map(|revista| (revista.id, revista.cover_image.as_deref()))
        .collect();

    let mut orphans = 0usize;
    let articulos = articulos
        .into_iter()
        .map(|mut articulo| {
            let cover = articulo.fuente.and_then(|fuente| covers.get(&fuente).copied());
            if cover.is_none() {
                orphans += 1;
            }

            articulo.image = Some(match cover.flatten() {
                Some(path) if !path.is_empty() => config.cover_image_url(path),
                _ => config.placeholder_image.clone(),
            });
            articulo
        })
        .collect();

    if orphans > 0 {
        warn!("{} 篇文章找不到所属期刊，使用占位图", orphans);
    }

    articulos
}
