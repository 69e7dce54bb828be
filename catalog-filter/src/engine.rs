//! 目录查询引擎
//!
//! 纯函数：输入原始条目集合和查询参数，输出当前页和结果元数据。
//! 不持有状态，不做 I/O，不修改输入。

use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

use crate::item::CatalogItem;
use crate::models::{DateRange, Facet, QueryParams, QueryResult};

/// 组合附加符号区块 U+0300–U+036F
fn is_combining_diacritic(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

/// 规范化搜索文本：小写、Unicode 分解、去掉重音符号
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_diacritic(*c))
        .collect()
}

/// 条目的任一搜索字段包含已规范化的查询时返回 true，空查询匹配所有条目
pub fn matches_search<T: CatalogItem>(item: &T, normalized_query: &str) -> bool {
    if normalized_query.is_empty() {
        return true;
    }

    item.search_fields()
        .into_iter()
        .any(|field| normalize(field.unwrap_or_default()).contains(normalized_query))
}

/// 没有选中值，或条目的筛选值在选中集合内时返回 true（精确比较）
pub fn matches_facet<T: CatalogItem>(
    item: &T,
    facet: Facet,
    selected_facet_values: &HashSet<String>,
) -> bool {
    if selected_facet_values.is_empty() {
        return true;
    }

    item.facet_value(facet)
        .is_some_and(|value| selected_facet_values.contains(value))
}

/// 日期范围筛选，两端都包含；设置了任一端时，没有日期的条目不匹配
pub fn matches_date_range<T: CatalogItem>(item: &T, date_range: Option<&DateRange>) -> bool {
    let Some(range) = date_range else {
        return true;
    };
    if range.is_open() {
        return true;
    }

    let Some(date) = item.published_date() else {
        return false;
    };

    range.from.map_or(true, |from| date >= from) && range.to.map_or(true, |to| date <= to)
}

/// 未筛选集合中的非空筛选值，去重并保持首次出现的顺序
pub fn available_facet_values<T: CatalogItem>(source_items: &[T], facet: Facet) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut values = Vec::new();

    for value in source_items.iter().filter_map(|item| item.facet_value(facet)) {
        if !value.is_empty() && seen.insert(value) {
            values.push(value.to_string());
        }
    }

    values
}

/// 总页数，至少为 1
pub fn total_pages(total_matching: usize, page_size: usize) -> usize {
    total_matching.div_ceil(page_size.max(1)).max(1)
}

/// 执行查询
///
/// 依次做搜索、筛选值、日期范围三项过滤（逻辑与），保持原始顺序，
/// 然后按页切片。页码越界时返回空页，不做回绕或钳制。
/// `page` 和 `page_size` 必须至少为 1，由调用方保证。
pub fn query<T: CatalogItem + Clone>(source_items: &[T], params: &QueryParams) -> QueryResult<T> {
    debug_assert!(params.page >= 1 && params.page_size >= 1);

    let normalized_query = normalize(&params.search_text);
    let date_range = params.date_range.as_ref();

    let filtered: Vec<&T> = source_items
        .iter()
        .filter(|item| {
            matches_search(*item, &normalized_query)
                && matches_facet(*item, params.facet, &params.selected_facet_values)
                && matches_date_range(*item, date_range)
        })
        .collect();

    let total_matching = filtered.len();
    let total_pages = total_pages(total_matching, params.page_size);
    let start = params.page.saturating_sub(1).saturating_mul(params.page_size);

    let items = filtered
        .into_iter()
        .skip(start)
        .take(params.page_size)
        .cloned()
        .collect();

    QueryResult {
        items,
        total_matching,
        total_pages,
        page: params.page,
        page_size: params.page_size,
        has_previous: params.page > 1,
        has_next: params.page < total_pages,
        available_facet_values: available_facet_values(source_items, params.facet),
        view_mode: params.view_mode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use utils_common::{Articulo, Revista};

    fn date(s: &str) -> Option<NaiveDate> {
        Some(NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap())
    }

    fn revista(id: u64, name: &str, publisher: Option<&str>) -> Revista {
        let mut revista = Revista::new(id, name);
        revista.publisher = publisher.map(str::to_string);
        revista
    }

    fn articulo_on(id: u64, published: Option<&str>) -> Articulo {
        let mut articulo = Articulo::new(id, format!("Artículo {}", id));
        articulo.date_published = published.map(str::to_string);
        articulo
    }

    fn params(page: usize, page_size: usize) -> QueryParams {
        QueryParams {
            page,
            page_size,
            ..QueryParams::default()
        }
    }

    fn selection(values: &[&str]) -> HashSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn normalize_strips_accents_and_case() {
        assert_eq!(normalize("Educación Física"), "educacion fisica");
        assert_eq!(normalize("ÑANDÚ"), "nandu");
        assert_eq!(normalize("Ελληνικά"), "ελληνικα");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("plain text 123"), "plain text 123");
    }

    #[test]
    fn normalize_matches_precomposed_and_decomposed_input() {
        assert_eq!(normalize("caf\u{e9}"), normalize("cafe\u{301}"));
        assert_eq!(normalize("İstanbul"), "istanbul");
    }

    #[test]
    fn accent_insensitive_search_matches_title() {
        let item = Articulo::new(1, "Cafe Review");
        assert!(matches_search(&item, &normalize("café")));
        assert!(matches_search(&item, &normalize("REVIEW")));
        assert!(!matches_search(&item, &normalize("té")));
    }

    #[test]
    fn search_looks_at_every_field_and_tolerates_missing_ones() {
        let mut item = Articulo::new(1, "Sin relación");
        assert!(!matches_search(&item, "garcia"));

        item.creator = Some("García, María".to_string());
        assert!(matches_search(&item, "garcia"));

        let bare = Revista {
            name: None,
            ..Revista::new(2, "")
        };
        assert!(matches_search(&bare, ""));
        assert!(!matches_search(&bare, "x"));
    }

    #[test]
    fn facet_is_exact_or_within_selection() {
        let item = revista(1, "R", Some("Universidad de Costa Rica"));

        assert!(matches_facet(&item, Facet::Institution, &HashSet::new()));
        assert!(matches_facet(
            &item,
            Facet::Institution,
            &selection(&["Otra", "Universidad de Costa Rica"])
        ));
        assert!(!matches_facet(
            &item,
            Facet::Institution,
            &selection(&["universidad de costa rica"])
        ));
        assert!(!matches_facet(&item, Facet::Category, &selection(&["Universidad de Costa Rica"])));
    }

    #[test]
    fn item_without_facet_value_only_passes_empty_selection() {
        let item = revista(1, "R", None);
        assert!(matches_facet(&item, Facet::Institution, &HashSet::new()));
        assert!(!matches_facet(&item, Facet::Institution, &selection(&[""])));
    }

    #[test]
    fn date_range_with_lower_bound() {
        let range = DateRange::new(date("2023-01-01"), None);

        assert!(!matches_date_range(&articulo_on(1, None), Some(&range)));
        assert!(!matches_date_range(&articulo_on(2, Some("2022-12-31")), Some(&range)));
        assert!(matches_date_range(&articulo_on(3, Some("2023-06-01")), Some(&range)));
        assert!(matches_date_range(&articulo_on(4, Some("2023-01-01")), Some(&range)));
    }

    #[test]
    fn date_range_with_upper_and_both_bounds() {
        let upper = DateRange::new(None, date("2020-12-31"));
        assert!(matches_date_range(&articulo_on(1, Some("2020-12-31")), Some(&upper)));
        assert!(!matches_date_range(&articulo_on(2, Some("2021-01-01")), Some(&upper)));
        assert!(!matches_date_range(&articulo_on(3, Some("not a date")), Some(&upper)));

        let both = DateRange::new(date("2020-01-01"), date("2020-12-31"));
        assert!(matches_date_range(&articulo_on(4, Some("2020-07-15")), Some(&both)));
        assert!(!matches_date_range(&articulo_on(5, Some("2019-12-31")), Some(&both)));
        assert!(!matches_date_range(&articulo_on(6, Some("2021-01-01")), Some(&both)));
    }

    #[test]
    fn open_or_absent_range_matches_everything() {
        let undated = articulo_on(1, None);
        assert!(matches_date_range(&undated, None));
        assert!(matches_date_range(&undated, Some(&DateRange::default())));
    }

    #[test]
    fn facet_selection_example() {
        let source: Vec<Revista> = (0..25)
            .map(|i| revista(i, "R", Some(if i % 5 == 0 { "B" } else { "A" })))
            .collect();

        let mut p = params(1, 10);
        p.selected_facet_values = selection(&["B"]);

        let first = query(&source, &p);
        assert_eq!(first.total_matching, 5);
        assert_eq!(first.total_pages, 1);
        assert_eq!(first.items.len(), 5);
        assert!(first.items.iter().all(|r| r.publisher.as_deref() == Some("B")));
        assert!(!first.has_previous);
        assert!(!first.has_next);

        p.page = 2;
        let second = query(&source, &p);
        assert!(second.items.is_empty());
        assert_eq!(second.total_matching, 5);
        assert_eq!(second.total_pages, 1);
    }

    #[test]
    fn filters_combine_with_and() {
        let mut a = articulo_on(1, Some("2023-03-01"));
        a.publisher = Some("UNAM".to_string());
        a.title = Some("Educación rural".to_string());
        let mut b = articulo_on(2, Some("2019-03-01"));
        b.publisher = Some("UNAM".to_string());
        b.title = Some("Educación urbana".to_string());
        let mut c = articulo_on(3, Some("2023-03-01"));
        c.publisher = Some("UBA".to_string());
        c.title = Some("Educación a distancia".to_string());
        let source = vec![a, b, c];

        let p = QueryParams {
            search_text: "educacion".to_string(),
            selected_facet_values: selection(&["UNAM"]),
            date_range: Some(DateRange::new(date("2023-01-01"), None)),
            ..params(1, 10)
        };

        let result = query(&source, &p);
        assert_eq!(result.total_matching, 1);
        assert_eq!(result.items[0].id, 1);
    }

    #[test]
    fn empty_result_has_one_page() {
        let source: Vec<Revista> = Vec::new();
        for page in 1..4 {
            let result = query(&source, &params(page, 20));
            assert_eq!(result.total_matching, 0);
            assert_eq!(result.total_pages, 1);
            assert!(result.items.is_empty());
        }
    }

    #[test]
    fn facet_values_come_from_unfiltered_source() {
        let source = vec![
            revista(1, "Uno", Some("B")),
            revista(2, "Dos", None),
            revista(3, "Tres", Some("A")),
            revista(4, "Cuatro", Some("")),
            revista(5, "Cinco", Some("B")),
        ];

        let p = QueryParams {
            search_text: "uno".to_string(),
            ..params(1, 10)
        };
        let result = query(&source, &p);

        assert_eq!(result.total_matching, 1);
        assert_eq!(result.available_facet_values, vec!["B".to_string(), "A".to_string()]);
    }

    #[test]
    fn pages_slice_in_original_order() {
        let source: Vec<Revista> = (1..=45).map(|i| revista(i, "R", None)).collect();

        let third = query(&source, &params(3, 20));
        assert_eq!(third.total_pages, 3);
        assert_eq!(third.items.iter().map(|r| r.id).collect::<Vec<_>>(), (41..=45).collect::<Vec<u64>>());
        assert!(third.has_previous);
        assert!(!third.has_next);

        let second = query(&source, &params(2, 20));
        assert!(second.has_next);
    }

    #[test]
    fn query_does_not_touch_source() {
        let source = vec![revista(2, "B", Some("X")), revista(1, "A", Some("Y"))];
        let before = source.clone();
        let _ = query(&source, &params(1, 1));
        assert_eq!(source, before);
    }

    #[test]
    fn works_over_borrowed_items() {
        let owned = vec![Articulo::new(1, "Café"), Articulo::new(2, "Té")];
        let borrowed: Vec<&Articulo> = owned.iter().collect();

        let p = QueryParams {
            search_text: "CAFE".to_string(),
            ..params(1, 10)
        };
        let result = query(&borrowed, &p);
        assert_eq!(result.items.len(), 1);
        assert!(std::ptr::eq(result.items[0], &owned[0]));
    }

    fn arb_revistas() -> impl Strategy<Value = Vec<Revista>> {
        prop::collection::vec(
            (
                "[a-zA-ZáéíóúÁÉÍÓÚñÑ ]{0,12}",
                prop::option::of(prop::sample::select(vec!["A", "B", "C", ""])),
            ),
            0..60,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (name, publisher))| revista(i as u64, &name, publisher))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn normalized_text_is_lowercase_without_diacritics(s in "[A-Za-zÀ-ɏͰ-ϿЀ-ӿ0-9 ]{0,48}") {
            let n = normalize(&s);
            prop_assert_eq!(n.to_lowercase(), n.clone());
            prop_assert!(!n.chars().any(is_combining_diacritic));
            prop_assert_eq!(normalize(&n), n);
        }

        #[test]
        fn empty_search_matches_every_item(source in arb_revistas()) {
            prop_assert!(source.iter().all(|item| matches_search(item, &normalize(""))));
        }

        #[test]
        fn pages_reconstruct_the_filtered_set(
            source in arb_revistas(),
            page_size in 1usize..15,
            search in "[a-z]{0,2}",
        ) {
            let base = QueryParams { search_text: search, ..params(1, page_size) };
            let everything = query(&source, &QueryParams { page_size: source.len().max(1), ..base.clone() });
            let first = query(&source, &base);

            let mut collected = Vec::new();
            for page in 1..=first.total_pages {
                let result = query(&source, &QueryParams { page, ..base.clone() });
                prop_assert!(result.items.len() <= page_size);
                collected.extend(result.items.into_iter().map(|r| r.id));
            }

            let expected: Vec<u64> = everything.items.iter().map(|r| r.id).collect();
            prop_assert_eq!(collected, expected);
            prop_assert_eq!(first.total_pages, total_pages(first.total_matching, page_size));

            let beyond = query(&source, &QueryParams { page: first.total_pages + 1, ..base });
            prop_assert!(beyond.items.is_empty());
        }

        #[test]
        fn adding_a_facet_value_never_shrinks_matches(
            source in arb_revistas(),
            first_value in prop::sample::select(vec!["A", "B", "C"]),
            second_value in prop::sample::select(vec!["A", "B", "C"]),
        ) {
            let single = QueryParams {
                selected_facet_values: selection(&[first_value]),
                ..params(1, 10)
            };
            let wider = QueryParams {
                selected_facet_values: selection(&[first_value, second_value]),
                ..params(1, 10)
            };
            let unfiltered = query(&source, &params(1, 10));

            let single_total = query(&source, &single).total_matching;
            let wider_total = query(&source, &wider).total_matching;
            prop_assert!(single_total <= wider_total);
            prop_assert!(wider_total <= unfiltered.total_matching);
            prop_assert_eq!(unfiltered.total_matching, source.len());
        }

        #[test]
        fn narrowing_the_date_range_never_grows_matches(
            years in prop::collection::vec(prop::option::of(1990i32..2030), 0..40),
            from in 1990i32..2030,
            extra in 0i32..10,
        ) {
            let source: Vec<Articulo> = years
                .iter()
                .enumerate()
                .map(|(i, year)| {
                    let published = year.map(|y| format!("{}-06-15", y));
                    articulo_on(i as u64, published.as_deref())
                })
                .collect();

            let wide = QueryParams {
                date_range: Some(DateRange::new(NaiveDate::from_ymd_opt(from, 1, 1), None)),
                ..params(1, 10)
            };
            let narrow = QueryParams {
                date_range: Some(DateRange::new(NaiveDate::from_ymd_opt(from + extra, 1, 1), None)),
                ..params(1, 10)
            };

            prop_assert!(query(&source, &narrow).total_matching <= query(&source, &wide).total_matching);
        }
    }
}
