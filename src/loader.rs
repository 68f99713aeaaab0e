// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 类加载器
//!
//! 把类标识符翻译为 `classes/` 下的相对路径，再交给级联查找器定位并载入。
//!
//! 支持两种命名约定：
//! - 命名空间形式：`App\Model\User` 或 `App::Model::User` → `App/Model/User`
//! - 下划线形式：`Model_User_Profile` → `Model/User/Profile`
//!
//! 同一个文件只会被载入一次，重复载入直接视为成功。

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::exception::Exception;
use crate::param::CLASSES_DIR;
use crate::resolver::Resolver;

/// 结构化的类标识符：若干目录段加一个基础名。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassName {
    segments: Vec<String>,
    base: String,
}

impl ClassName {
    /// 解析类标识符。空标识符或含有空段的标识符返回 `None`。
    pub fn parse(identifier: &str) -> Option<Self> {
        let identifier = identifier.trim_start_matches('\\').trim_start_matches("::");
        let mut parts: Vec<&str> = if identifier.contains('\\') {
            identifier.split('\\').collect()
        } else if identifier.contains("::") {
            identifier.split("::").collect()
        } else {
            identifier.split('_').collect()
        };
        if parts.iter().any(|p| p.is_empty()) {
            return None;
        }
        let base = parts.pop()?.to_string();
        Some(Self {
            segments: parts.into_iter().map(str::to_string).collect(),
            base,
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// 不带扩展名的相对路径，段之间以 `/` 分隔。
    pub fn relative_path(&self) -> String {
        let mut path = self.segments.join("/");
        if !path.is_empty() {
            path.push('/');
        }
        path.push_str(&self.base);
        path
    }

    /// 全小写的相对路径，供大小写敏感的文件系统使用。
    pub fn lowercase_path(&self) -> String {
        self.relative_path().to_lowercase()
    }
}

/// 按需定位并载入类文件。载入的源文本按绝对路径保存。
#[derive(Debug)]
pub struct ClassLoader {
    resolver: Resolver,
    loaded: HashMap<PathBuf, String>,
}

impl ClassLoader {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver,
            loaded: HashMap::new(),
        }
    }

    /// 在 `classes/` 中载入类。
    pub fn load_class(&mut self, identifier: &str) -> Result<bool, Exception> {
        self.load(identifier, CLASSES_DIR)
    }

    /// 在指定目录中查找并载入类。找不到返回 `Ok(false)`，由调用方尝试其他加载器。
    pub fn load(&mut self, identifier: &str, directory: &str) -> Result<bool, Exception> {
        match ClassName::parse(identifier) {
            Some(name) => self.load_path(&name.relative_path(), directory),
            None => Ok(false),
        }
    }

    /// 与 `load` 相同，但使用全小写路径。
    pub fn load_lowercase(&mut self, identifier: &str, directory: &str) -> Result<bool, Exception> {
        match ClassName::parse(identifier) {
            Some(name) => self.load_path(&name.lowercase_path(), directory),
            None => Ok(false),
        }
    }

    fn load_path(&mut self, relative: &str, directory: &str) -> Result<bool, Exception> {
        match self.resolver.find_file(directory, relative, None) {
            Some(path) => {
                self.include(&path)?;
                Ok(true)
            }
            None => {
                debug!("类文件{}/{}未找到", directory, relative);
                Ok(false)
            }
        }
    }

    /// 载入一个已知路径的文件。返回 `true` 表示本次是首次载入。
    pub fn include(&mut self, path: &Path) -> Result<bool, Exception> {
        if self.loaded.contains_key(path) {
            debug!("{}已经载入过，跳过", path.display());
            return Ok(false);
        }
        let source = fs::read_to_string(path)?;
        debug!("载入{}（{} bytes）", path.display(), source.len());
        self.loaded.insert(path.to_path_buf(), source);
        Ok(true)
    }

    pub fn is_loaded(&self, path: &Path) -> bool {
        self.loaded.contains_key(path)
    }

    pub fn source(&self, path: &Path) -> Option<&str> {
        self.loaded.get(path).map(String::as_str)
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::SearchPath;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_parse_namespaced() {
        let name = ClassName::parse("\\App\\Model\\User").unwrap();
        assert_eq!(name.segments(), &["App".to_string(), "Model".to_string()]);
        assert_eq!(name.base(), "User");
        assert_eq!(name.relative_path(), "App/Model/User");
    }

    #[test]
    fn test_parse_path_separator_form() {
        let name = ClassName::parse("app::http::Request_Client").unwrap();
        assert_eq!(name.relative_path(), "app/http/Request_Client");
    }

    #[test]
    fn test_parse_underscore() {
        let name = ClassName::parse("Model_User_Profile").unwrap();
        assert_eq!(name.relative_path(), "Model/User/Profile");
        assert_eq!(name.lowercase_path(), "model/user/profile");
    }

    #[test]
    fn test_parse_single_word() {
        let name = ClassName::parse("Cookie").unwrap();
        assert!(name.segments().is_empty());
        assert_eq!(name.relative_path(), "Cookie");
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        assert!(ClassName::parse("").is_none());
        assert!(ClassName::parse("Model__User").is_none());
        assert!(ClassName::parse("App\\\\User").is_none());
    }

    fn loader_with(files: &[&str]) -> (TempDir, ClassLoader) {
        let tmp = TempDir::new().unwrap();
        let app = tmp.path().join("application");
        let system = tmp.path().join("system");
        fs::create_dir_all(&system).unwrap();
        for f in files {
            let path = app.join(f);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, format!("// {}", f)).unwrap();
        }
        let resolver = Resolver::new(Arc::new(SearchPath::new(app, vec![], system)), "rs");
        (tmp, ClassLoader::new(resolver))
    }

    #[test]
    fn test_load_is_idempotent() {
        let (_tmp, mut loader) = loader_with(&["classes/Model/User.rs"]);
        assert!(loader.load_class("Model_User").unwrap());
        assert!(loader.load_class("Model_User").unwrap());
        assert_eq!(loader.loaded_count(), 1);
    }

    #[test]
    fn test_both_conventions_reach_same_file() {
        let (_tmp, mut loader) = loader_with(&["classes/Model/User.rs"]);
        assert!(loader.load_class("Model\\User").unwrap());
        assert!(loader.load_class("Model_User").unwrap());
        assert_eq!(loader.loaded_count(), 1);
    }

    #[test]
    fn test_missing_class_is_not_an_error() {
        let (_tmp, mut loader) = loader_with(&[]);
        assert!(!loader.load_class("Model_Ghost").unwrap());
        assert!(!loader.load_class("").unwrap());
    }

    #[test]
    fn test_load_lowercase() {
        let (tmp, mut loader) = loader_with(&["classes/controller/welcome.rs"]);
        assert!(!loader.load_class("Controller_Welcome").unwrap());
        assert!(loader.load_lowercase("Controller_Welcome", "classes").unwrap());

        let path = tmp.path().join("application/classes/controller/welcome.rs");
        assert!(loader.is_loaded(&path));
        assert_eq!(loader.source(&path), Some("// classes/controller/welcome.rs"));
    }

    #[test]
    fn test_load_from_custom_directory() {
        let (_tmp, mut loader) = loader_with(&["vendor/Markdown/Parser.rs"]);
        assert!(loader.load("Markdown\\Parser", "vendor").unwrap());
    }

    #[test]
    fn test_include_reports_first_load_only() {
        let (tmp, mut loader) = loader_with(&["classes/Cookie.rs"]);
        let path = tmp.path().join("application/classes/Cookie.rs");
        assert!(loader.include(&path).unwrap());
        assert!(!loader.include(&path).unwrap());
    }
}
