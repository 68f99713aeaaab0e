// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 模块注册表
//!
//! 保存当前启用的模块列表，并据此构建级联文件系统的搜索路径。
//!
//! `configure` 是全有或全无的：先校验全部模块目录，全部存在后才替换搜索路径；
//! 任何一个模块缺失都会返回 `Exception::ModuleNotFound`，原有配置保持不变。

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, error, info};

use crate::config::{Config, ModuleEntry};
use crate::exception::Exception;
use crate::loader::ClassLoader;
use crate::param::MODULE_INIT_FILE;
use crate::resolver::{Resolver, SearchPath};

/// 已注册的模块：名称与绝对路径。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    name: String,
    path: PathBuf,
}

impl Module {
    pub fn new(name: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            path: path.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl From<&ModuleEntry> for Module {
    fn from(entry: &ModuleEntry) -> Self {
        Module::new(&entry.name, &entry.path)
    }
}

#[derive(Debug)]
pub struct ModuleRegistry {
    app_root: PathBuf,
    system_root: PathBuf,
    modules: Vec<Module>,
    search_path: Arc<SearchPath>,
    default_extension: String,
}

impl ModuleRegistry {
    /// 创建一个只包含应用目录与系统目录的注册表。
    pub fn new(app_root: impl Into<PathBuf>, system_root: impl Into<PathBuf>, default_extension: &str) -> Self {
        let app_root = app_root.into();
        let system_root = system_root.into();
        let search_path = Arc::new(SearchPath::new(app_root.clone(), vec![], system_root.clone()));
        Self {
            app_root,
            system_root,
            modules: vec![],
            search_path,
            default_extension: default_extension.to_string(),
        }
    }

    /// 按配置文件构建注册表并应用其中声明的模块。
    pub fn from_config(config: &Config) -> Result<Self, Exception> {
        let mut registry = Self::new(config.app_root(), config.system_root(), config.default_extension());
        let modules: Vec<Module> = config.modules().iter().map(Module::from).collect();
        registry.configure(modules)?;
        Ok(registry)
    }

    /// 替换启用的模块列表并重建搜索路径。
    ///
    /// 校验失败时不修改任何状态，错误中带有第一个缺失模块的名称。
    pub fn configure(&mut self, modules: Vec<Module>) -> Result<&SearchPath, Exception> {
        let mut resolved = Vec::with_capacity(modules.len());
        for module in modules {
            if !module.path.is_dir() {
                error!("模块{}的目录{}不存在", module.name, module.path.display());
                return Err(Exception::ModuleNotFound {
                    name: module.name,
                    path: module.path.to_string_lossy().to_string(),
                });
            }
            let absolute = fs::canonicalize(&module.path)?;
            resolved.push(Module::new(&module.name, absolute));
        }

        let roots = resolved.iter().map(|m| m.path.clone()).collect();
        self.search_path = Arc::new(SearchPath::new(
            self.app_root.clone(),
            roots,
            self.system_root.clone(),
        ));
        self.modules = resolved;
        info!(
            "模块配置完成，搜索路径共{}层：{:?}",
            self.search_path.len(),
            self.search_path.roots()
        );
        Ok(self.search_path.as_ref())
    }

    /// 已启用的模块，按注册顺序排列。
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn search_path(&self) -> Arc<SearchPath> {
        Arc::clone(&self.search_path)
    }

    /// 基于当前搜索路径快照构建查找器。
    pub fn resolver(&self) -> Resolver {
        Resolver::new(self.search_path(), &self.default_extension)
    }

    /// 依注册顺序载入每个模块根目录下可选的初始化文件。
    ///
    /// 文件缺失不是错误；返回实际执行了初始化的模块名。
    pub fn initialize_modules(&self, loader: &mut ClassLoader) -> Result<Vec<String>, Exception> {
        let mut initialized = vec![];
        for module in &self.modules {
            let init = module
                .path
                .join(format!("{}.{}", MODULE_INIT_FILE, self.default_extension));
            if !init.is_file() {
                debug!("模块{}没有初始化文件，跳过", module.name);
                continue;
            }
            loader.include(&init)?;
            info!("模块{}已初始化", module.name);
            initialized.push(module.name.clone());
        }
        Ok(initialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn layout() -> (TempDir, ModuleRegistry) {
        let tmp = TempDir::new().unwrap();
        for dir in ["application", "system", "modules/auth", "modules/blog"] {
            fs::create_dir_all(tmp.path().join(dir)).unwrap();
        }
        let registry = ModuleRegistry::new(
            tmp.path().join("application"),
            tmp.path().join("system"),
            "rs",
        );
        (tmp, registry)
    }

    #[test]
    fn test_initial_search_path_has_two_roots() {
        let (_tmp, registry) = layout();
        assert_eq!(registry.search_path().len(), 2);
        assert!(registry.modules().is_empty());
    }

    #[test]
    fn test_configure_orders_modules_between_roots() {
        let (tmp, mut registry) = layout();
        registry
            .configure(vec![
                Module::new("auth", tmp.path().join("modules/auth")),
                Module::new("blog", tmp.path().join("modules/blog")),
            ])
            .unwrap();

        let sp = registry.search_path();
        assert_eq!(sp.len(), 4);
        assert_eq!(sp.roots()[0], tmp.path().join("application"));
        assert!(sp.roots()[1].ends_with("modules/auth"));
        assert!(sp.roots()[2].ends_with("modules/blog"));
        assert_eq!(sp.roots()[3], tmp.path().join("system"));
        assert_eq!(registry.module("blog").unwrap().name(), "blog");
    }

    #[test]
    fn test_configure_is_atomic() {
        let (tmp, mut registry) = layout();
        registry
            .configure(vec![Module::new("auth", tmp.path().join("modules/auth"))])
            .unwrap();
        let before = registry.search_path();

        let result = registry.configure(vec![
            Module::new("blog", tmp.path().join("modules/blog")),
            Module::new("ghost", tmp.path().join("modules/ghost")),
        ]);

        match result {
            Err(Exception::ModuleNotFound { name, .. }) => assert_eq!(name, "ghost"),
            other => panic!("Expected ModuleNotFound, got {:?}", other),
        }
        assert_eq!(*registry.search_path(), *before);
        assert_eq!(registry.modules().len(), 1);
        assert_eq!(registry.modules()[0].name(), "auth");
    }

    #[test]
    fn test_initialize_modules_skips_missing_init() {
        let (tmp, mut registry) = layout();
        fs::write(tmp.path().join("modules/blog/init.rs"), "// blog init").unwrap();
        registry
            .configure(vec![
                Module::new("auth", tmp.path().join("modules/auth")),
                Module::new("blog", tmp.path().join("modules/blog")),
            ])
            .unwrap();

        let mut loader = ClassLoader::new(registry.resolver());
        let initialized = registry.initialize_modules(&mut loader).unwrap();
        assert_eq!(initialized, vec!["blog".to_string()]);
        assert_eq!(loader.loaded_count(), 1);
    }

    #[test]
    fn test_from_config_reports_missing_module() {
        let tmp = TempDir::new().unwrap();
        let config = Config::new()
            .with_roots(
                tmp.path().join("application").to_str().unwrap(),
                tmp.path().join("system").to_str().unwrap(),
            )
            .with_modules(vec![ModuleEntry {
                name: "missing".to_string(),
                path: tmp.path().join("modules/missing").to_string_lossy().to_string(),
            }]);

        let result = ModuleRegistry::from_config(&config);
        assert!(matches!(result, Err(Exception::ModuleNotFound { .. })));
    }
}
