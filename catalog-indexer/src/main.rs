use std::fs;
use std::path::{Path, PathBuf};
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use walkdir::WalkDir;

use catalog_filter::builder::SnapshotBuilder;
use catalog_filter::{Catalog, DateRange, ListingKind, QueryParams, ViewMode};
use utils_common::{Articulo, CatalogConfig, CatalogError, CatalogStats, Result, Revista};

/// 快照文件名
const SNAPSHOT_FILE: &str = "catalog_snapshot.bin";

// 主函数
fn main() {
    let matches = cli().get_matches();
    init_logging(matches.get_flag("verbose"));

    let result = match matches.subcommand() {
        Some(("build", sub)) => run_build(sub),
        Some(("query", sub)) => run_query(sub),
        _ => Err(CatalogError::InvalidParams("缺少子命令".to_string())),
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

// 命令行定义
fn cli() -> Command {
    Command::new("期刊目录快照工具")
        .version(env!("CARGO_PKG_VERSION"))
        .about("从 API 导出生成目录快照，并在快照上执行查询")
        .subcommand_required(true)
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .help("显示详细信息")
            .global(true)
            .action(ArgAction::SetTrue))
        .arg(Arg::new("config")
            .short('c')
            .long("config")
            .value_name("CONFIG_FILE")
            .help("JSON 配置文件")
            .global(true))
        .arg(Arg::new("api_base_url")
            .long("api-base-url")
            .value_name("URL")
            .help("覆盖配置中的 API 根地址")
            .global(true))
        .subcommand(Command::new("build")
            .about("生成目录快照")
            .arg(Arg::new("source")
                .short('s')
                .long("source")
                .value_name("SOURCE_DIR")
                .help("API 导出目录路径 (revistas*.json, articulos*.json, stats.json)")
                .required(true))
            .arg(Arg::new("output")
                .short('o')
                .long("output")
                .value_name("OUTPUT_DIR")
                .help("快照输出目录路径")
                .required(true)))
        .subcommand(Command::new("query")
            .about("在快照上执行查询")
            .arg(Arg::new("snapshot")
                .long("snapshot")
                .value_name("SNAPSHOT_FILE")
                .help("快照文件路径")
                .required(true))
            .arg(Arg::new("listing")
                .short('l')
                .long("listing")
                .value_name("LISTING")
                .help("列表类型: revistas, articulos, revista-articulos")
                .default_value("revistas"))
            .arg(Arg::new("revista")
                .long("revista")
                .value_name("ID")
                .help("revista-articulos 列表所属的期刊")
                .value_parser(clap::value_parser!(u64)))
            .arg(Arg::new("search")
                .long("search")
                .value_name("TEXT")
                .help("搜索文本"))
            .arg(Arg::new("facet")
                .long("facet")
                .value_name("VALUE")
                .help("筛选值，可以重复")
                .action(ArgAction::Append))
            .arg(Arg::new("date")
                .long("date")
                .value_name("RANGE")
                .help("日期范围: all 或 startDate,endDate"))
            .arg(Arg::new("page")
                .long("page")
                .value_name("N")
                .value_parser(clap::value_parser!(usize)))
            .arg(Arg::new("page_size")
                .long("page-size")
                .value_name("N")
                .value_parser(clap::value_parser!(usize)))
            .arg(Arg::new("view")
                .long("view")
                .value_name("MODE")
                .help("展示方式: cards 或 list")))
}

// 初始化日志，--verbose 时输出调试信息
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

// 读取配置，命令行参数优先
fn load_config(matches: &ArgMatches) -> Result<CatalogConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => CatalogConfig::load(path)?,
        None => CatalogConfig::default(),
    };

    if let Some(url) = matches.get_one::<String>("api_base_url") {
        config = config.with_api_base_url(url.as_str());
    }

    Ok(config)
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| CatalogError::InvalidParams(format!("缺少参数: {}", name)))
}

fn run_build(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;
    let source_dir = Path::new(required(matches, "source")?);
    let output_dir = Path::new(required(matches, "output")?);

    if !source_dir.is_dir() {
        return Err(CatalogError::InvalidParams(format!(
            "源目录不存在或不是有效目录 '{}'",
            source_dir.display()
        )));
    }

    info!("开始生成目录快照...");
    info!("源目录: {}", source_dir.display());
    info!("输出目录: {}", output_dir.display());

    let start_time = std::time::Instant::now();
    let path = generate_snapshot(source_dir, output_dir, config)?;
    info!(
        "快照生成完成: {}，耗时: {:.2}秒",
        path.display(),
        start_time.elapsed().as_secs_f32()
    );

    Ok(())
}

/// API 导出文件：普通数组或带 `results` 的分页对象
#[derive(Deserialize)]
#[serde(untagged)]
enum Export<T> {
    List(Vec<T>),
    Page { results: Vec<T> },
}

impl<T> Export<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            Export::List(items) | Export::Page { results: items } => items,
        }
    }
}

fn read_export<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let json = fs::read_to_string(path)?;
    let export: Export<T> = serde_json::from_str(&json)?;
    Ok(export.into_items())
}

/// 扫描导出目录的结果
#[derive(Debug, Default)]
struct Exports {
    revistas: Vec<Revista>,
    articulos: Vec<Articulo>,
    stats: Option<CatalogStats>,
}

// 扫描导出目录，文件按名称排序以保持 API 顺序
fn scan_exports(source_dir: &Path) -> Result<Exports> {
    let mut exports = Exports::default();

    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| CatalogError::Io(e.into()))?;
        let path = entry.path();

        if !entry.file_type().is_file() || path.extension().map_or(true, |ext| ext != "json") {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_lowercase();
        if name.starts_with("revistas") {
            let revistas: Vec<Revista> = read_export(path)?;
            debug!("{}: {} 本期刊", path.display(), revistas.len());
            exports.revistas.extend(revistas);
        } else if name.starts_with("articulos") {
            let articulos: Vec<Articulo> = read_export(path)?;
            debug!("{}: {} 篇文章", path.display(), articulos.len());
            exports.articulos.extend(articulos);
        } else if name == "stats.json" {
            let json = fs::read_to_string(path)?;
            exports.stats = Some(serde_json::from_str(&json)?);
            debug!("{}: 统计信息", path.display());
        } else {
            warn!("跳过未识别的文件: {}", path.display());
        }
    }

    Ok(exports)
}

// 生成快照并写入输出目录
fn generate_snapshot(source_dir: &Path, output_dir: &Path, config: CatalogConfig) -> Result<PathBuf> {
    let exports = scan_exports(source_dir)?;
    info!(
        "扫描完成。找到 {} 本期刊，{} 篇文章",
        exports.revistas.len(),
        exports.articulos.len()
    );

    let mut builder = SnapshotBuilder::new(config);
    builder.extend_revistas(exports.revistas);
    builder.extend_articulos(exports.articulos);
    if let Some(stats) = exports.stats {
        builder.set_stats(stats);
    }

    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(SNAPSHOT_FILE);
    builder.save_snapshot(&path)?;

    Ok(path)
}

// 根据命令行参数构造查询参数
fn query_params(matches: &ArgMatches, listing: ListingKind, config: &CatalogConfig) -> Result<QueryParams> {
    let mut params = listing.default_params(config);

    if let Some(search) = matches.get_one::<String>("search") {
        params.search_text = search.clone();
    }
    if let Some(values) = matches.get_many::<String>("facet") {
        params.selected_facet_values = values.cloned().collect();
    }
    if let Some(range) = matches.get_one::<String>("date") {
        params.date_range = Some(range.parse::<DateRange>()?);
    }
    if let Some(page) = matches.get_one::<usize>("page") {
        params.page = *page;
    }
    if let Some(page_size) = matches.get_one::<usize>("page_size") {
        params.page_size = *page_size;
    }
    if let Some(view) = matches.get_one::<String>("view") {
        params.view_mode = view.parse::<ViewMode>()?;
    }

    Ok(params)
}

fn run_query(matches: &ArgMatches) -> Result<()> {
    println!("{}", query_to_json(matches)?);
    Ok(())
}

// 执行查询并返回格式化的 JSON
fn query_to_json(matches: &ArgMatches) -> Result<String> {
    let config = load_config(matches)?;
    let data = fs::read(required(matches, "snapshot")?)?;
    let catalog = Catalog::from_compressed(&data)?;

    let listing: ListingKind = required(matches, "listing")?.parse()?;
    let params = query_params(matches, listing, &config)?;
    debug!("查询参数: {:?}", params);

    let json = match listing {
        ListingKind::Revistas => serde_json::to_string_pretty(&catalog.query_revistas(&params)?)?,
        ListingKind::Articulos => serde_json::to_string_pretty(&catalog.query_articulos(&params)?)?,
        ListingKind::RevistaArticulos => {
            let revista_id = matches
                .get_one::<u64>("revista")
                .copied()
                .ok_or_else(|| CatalogError::InvalidParams("revista-articulos 需要 --revista".to_string()))?;
            serde_json::to_string_pretty(&catalog.query_revista_articulos(revista_id, &params)?)?
        }
    };

    Ok(json)
}
