use chrono::NaiveDate;
use utils_common::{Articulo, ItemId, Revista};

use crate::models::Facet;

/// 可被查询引擎处理的目录条目
pub trait CatalogItem {
    /// 条目标识符
    fn item_id(&self) -> ItemId;

    /// 参与搜索的文本字段，缺失的字段按空字符串处理
    fn search_fields(&self) -> Vec<Option<&str>>;

    /// 指定维度上的筛选值
    fn facet_value(&self, facet: Facet) -> Option<&str>;

    /// 发布日期
    fn published_date(&self) -> Option<NaiveDate>;
}

impl CatalogItem for Revista {
    fn item_id(&self) -> ItemId {
        self.id
    }

    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            self.name.as_deref(),
            self.publisher.as_deref(),
            self.description.as_deref(),
        ]
    }

    fn facet_value(&self, facet: Facet) -> Option<&str> {
        match facet {
            Facet::Institution => self.publisher.as_deref(),
            Facet::Category => None,
        }
    }

    fn published_date(&self) -> Option<NaiveDate> {
        Revista::published_date(self)
    }
}

impl CatalogItem for Articulo {
    fn item_id(&self) -> ItemId {
        self.id
    }

    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            self.title.as_deref(),
            self.publisher.as_deref(),
            self.description_es.as_deref(),
            self.description_en.as_deref(),
            self.creator.as_deref(),
        ]
    }

    fn facet_value(&self, facet: Facet) -> Option<&str> {
        match facet {
            Facet::Institution => self.publisher.as_deref(),
            Facet::Category => self.subject_es.as_deref(),
        }
    }

    fn published_date(&self) -> Option<NaiveDate> {
        Articulo::published_date(self)
    }
}

impl<T: CatalogItem + ?Sized> CatalogItem for &T {
    fn item_id(&self) -> ItemId {
        (**self).item_id()
    }

    fn search_fields(&self) -> Vec<Option<&str>> {
        (**self).search_fields()
    }

    fn facet_value(&self, facet: Facet) -> Option<&str> {
        (**self).facet_value(facet)
    }

    fn published_date(&self) -> Option<NaiveDate> {
        (**self).published_date()
    }
}
