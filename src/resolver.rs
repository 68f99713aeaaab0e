// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 级联文件系统查找模块
//!
//! 框架把应用目录、各模块目录和系统目录叠成一个有序的搜索路径（`SearchPath`）：
//!
//! ```text
//! [app_root, module_1, module_2, ..., system_root]
//!  ^ 优先级最高                        ^ 优先级最低
//! ```
//!
//! 资源以 “目录 + 逻辑名称 + 扩展名” 的方式查找，例如 `views` + `welcome/index` + `html`。
//! - 普通查找：按正序搜索，返回第一个存在的文件。
//! - 聚合查找：`config`、`i18n`、`messages` 三类目录，或调用方显式要求时，按逆序返回
//!   所有命中的文件（低优先级在前），由调用方依次合并，后者覆盖前者。
//!
//! 搜索路径在启动时构建一次，之后只读共享。这里不做结果缓存。

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};

use crate::exception::Exception;
use crate::param::AGGREGATE_DIRS;

/// 有序的根目录列表，至少包含应用根目录与系统根目录。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath {
    roots: Vec<PathBuf>,
}

impl SearchPath {
    /// 构建 `[app_root, ...modules, system_root]`。
    pub fn new(app_root: PathBuf, modules: Vec<PathBuf>, system_root: PathBuf) -> Self {
        let mut roots = Vec::with_capacity(modules.len() + 2);
        roots.push(app_root);
        roots.extend(modules);
        roots.push(system_root);
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// 永远为 false，保留该方法以配合 `len`
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// 一次查找的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedFile {
    /// 优先级最高的单个命中
    Single(PathBuf),
    /// 所有命中，低优先级在前
    All(Vec<PathBuf>),
    NotFound,
}

impl ResolvedFile {
    pub fn is_found(&self) -> bool {
        match self {
            ResolvedFile::Single(_) => true,
            ResolvedFile::All(paths) => !paths.is_empty(),
            ResolvedFile::NotFound => false,
        }
    }

    /// 单个结果；聚合结果取优先级最高的那一个（即最后一个）。
    pub fn into_single(self) -> Option<PathBuf> {
        match self {
            ResolvedFile::Single(path) => Some(path),
            ResolvedFile::All(mut paths) => paths.pop(),
            ResolvedFile::NotFound => None,
        }
    }

    /// 以列表形式取出全部结果。
    pub fn into_all(self) -> Vec<PathBuf> {
        match self {
            ResolvedFile::Single(path) => vec![path],
            ResolvedFile::All(paths) => paths,
            ResolvedFile::NotFound => vec![],
        }
    }
}

/// 在搜索路径上查找资源文件。克隆代价很低，可以在处理器之间共享。
#[derive(Debug, Clone)]
pub struct Resolver {
    search_path: Arc<SearchPath>,
    default_extension: String,
}

impl Resolver {
    pub fn new(search_path: Arc<SearchPath>, default_extension: &str) -> Self {
        Self {
            search_path,
            default_extension: default_extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    pub fn default_extension(&self) -> &str {
        &self.default_extension
    }

    /// 查找 `directory/name.extension`。
    ///
    /// `extension` 为 `None` 时使用默认扩展名，为 `Some("")` 时不追加扩展名。
    pub fn resolve(
        &self,
        directory: &str,
        name: &str,
        extension: Option<&str>,
        want_all: bool,
    ) -> ResolvedFile {
        let relative = match self.relative_path(directory, name, extension) {
            Some(r) => r,
            None => {
                warn!("拒绝解析非法的资源名：{}/{}", directory, name);
                return ResolvedFile::NotFound;
            }
        };

        if want_all || AGGREGATE_DIRS.contains(&directory) {
            let mut found: Vec<PathBuf> = Vec::new();
            for root in self.search_path.roots().iter().rev() {
                let candidate = root.join(&relative);
                if candidate.is_file() && !found.contains(&candidate) {
                    found.push(candidate);
                }
            }
            debug!("聚合查找{}：命中{}个文件", relative.display(), found.len());
            return ResolvedFile::All(found);
        }

        for root in self.search_path.roots() {
            let candidate = root.join(&relative);
            if candidate.is_file() {
                debug!("查找{}：命中{}", relative.display(), candidate.display());
                return ResolvedFile::Single(candidate);
            }
        }
        debug!("查找{}：未命中", relative.display());
        ResolvedFile::NotFound
    }

    /// 正序查找，返回优先级最高的文件。
    pub fn find_file(&self, directory: &str, name: &str, extension: Option<&str>) -> Option<PathBuf> {
        match self.resolve(directory, name, extension, false) {
            ResolvedFile::Single(path) => Some(path),
            // 聚合目录也允许单个查找，取最具体的一层
            other => other.into_single(),
        }
    }

    /// 逆序查找，返回所有命中文件，低优先级在前。
    pub fn find_all(&self, directory: &str, name: &str, extension: Option<&str>) -> Vec<PathBuf> {
        self.resolve(directory, name, extension, true).into_all()
    }

    /// 列出 `directory` 下所有层级中的文件，键为相对搜索根的路径。
    ///
    /// 同名文件只保留优先级最高的那一份。
    pub fn list_files(&self, directory: &str) -> BTreeMap<String, PathBuf> {
        let mut found = BTreeMap::new();
        for root in self.search_path.roots() {
            collect_files(root, &root.join(directory), &mut found);
        }
        found
    }

    /// 读取所有层级的 `directory/name.toml` 并深度合并，高优先级覆盖低优先级。
    pub fn load_group(&self, directory: &str, name: &str) -> Result<toml::Table, Exception> {
        let mut merged = toml::Table::new();
        for path in self.find_all(directory, name, Some("toml")) {
            let text = fs::read_to_string(&path)?;
            let layer: toml::Table = text.parse().map_err(|e: toml::de::Error| {
                Exception::ConfigError(format!("{}：{}", path.display(), e))
            })?;
            merge_table(&mut merged, layer);
        }
        Ok(merged)
    }

    fn relative_path(&self, directory: &str, name: &str, extension: Option<&str>) -> Option<PathBuf> {
        let extension = extension.unwrap_or(&self.default_extension);
        let file_name = if extension.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", name, extension.trim_start_matches('.'))
        };
        let relative = Path::new(directory).join(file_name);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        safe.then_some(relative)
    }
}

fn collect_files(root: &Path, dir: &Path, found: &mut BTreeMap<String, PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return,
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, found);
        } else if path.is_file() {
            let key = match path.strip_prefix(root) {
                Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
                Err(_) => continue,
            };
            found.entry(key).or_insert(path);
        }
    }
}

fn merge_table(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_table(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
