use serde_derive::Deserialize;
use serde_derive::Serialize;

use log::{info, warn};
use std::fs;

use crate::exception::Exception;
use crate::param::{DEFAULT_EXTENSION, DEFAULT_PROTOCOL};

/// 配置文件中的一个模块条目，按出现顺序决定其在搜索路径中的优先级。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ModuleEntry {
    pub name: String,
    pub path: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_app_root")]
    app_root: String,
    #[serde(default = "default_system_root")]
    system_root: String,
    #[serde(default)]
    modules: Vec<ModuleEntry>,
    #[serde(default = "default_extension")]
    default_extension: String,
    #[serde(default = "default_protocol")]
    default_protocol: String,
    #[serde(default = "default_charset")]
    charset: String,
    #[serde(default = "default_content_type")]
    content_type: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_local")]
    local: bool,
    #[serde(default)]
    worker_threads: usize,
    #[serde(default = "default_cache_size")]
    cache_size: usize,
}

fn default_app_root() -> String {
    "application".to_string()
}

fn default_system_root() -> String {
    "system".to_string()
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

fn default_protocol() -> String {
    DEFAULT_PROTOCOL.to_string()
}

fn default_charset() -> String {
    "utf-8".to_string()
}

fn default_content_type() -> String {
    "text/html".to_string()
}

fn default_port() -> u16 {
    7878
}

fn default_local() -> bool {
    true
}

fn default_cache_size() -> usize {
    16
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            app_root: default_app_root(),
            system_root: default_system_root(),
            modules: vec![],
            default_extension: default_extension(),
            default_protocol: default_protocol(),
            charset: default_charset(),
            content_type: default_content_type(),
            port: default_port(),
            local: default_local(),
            worker_threads: num_cpus::get(),
            cache_size: default_cache_size(),
        }
    }

    /// 从 TOML 文本构建配置，并对需要自动推断的字段做修正。
    pub fn from_toml_str(text: &str) -> Result<Self, Exception> {
        let mut raw_config: Config =
            toml::from_str(text).map_err(|e| Exception::ConfigError(e.to_string()))?;
        if raw_config.worker_threads == 0 {
            raw_config.worker_threads = num_cpus::get();
        }
        if raw_config.cache_size == 0 {
            warn!("cache_size被设置为0，但目前尚不支持禁用缓存，因此该值将被改为{}。", default_cache_size());
            raw_config.cache_size = default_cache_size();
        }
        // 扩展名统一以不带点的形式保存
        raw_config.default_extension = raw_config
            .default_extension
            .trim_start_matches('.')
            .to_string();
        Ok(raw_config)
    }

    pub fn from_toml(filename: &str) -> Result<Self, Exception> {
        let text = fs::read_to_string(filename)
            .map_err(|e| Exception::ConfigError(format!("无法读取配置文件{}：{}", filename, e)))?;
        let config = Self::from_toml_str(&text)?;
        info!("配置文件{}已载入，共声明{}个模块", filename, config.modules.len());
        Ok(config)
    }

    pub fn with_roots(mut self, app_root: &str, system_root: &str) -> Self {
        self.app_root = app_root.to_string();
        self.system_root = system_root.to_string();
        self
    }

    pub fn with_modules(mut self, modules: Vec<ModuleEntry>) -> Self {
        self.modules = modules;
        self
    }
}

impl Config {
    pub fn app_root(&self) -> &str {
        &self.app_root
    }

    pub fn system_root(&self) -> &str {
        &self.system_root
    }

    pub fn modules(&self) -> &[ModuleEntry] {
        &self.modules
    }

    pub fn default_extension(&self) -> &str {
        &self.default_extension
    }

    pub fn default_protocol(&self) -> &str {
        &self.default_protocol
    }

    pub fn charset(&self) -> &str {
        &self.charset
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// 渲染响应时注入的默认 `Content-Type`，形如 `text/html; charset=utf-8`
    pub fn default_content_type(&self) -> String {
        format!("{}; charset={}", self.content_type, self.charset)
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn cache_size(&self) -> usize {
        self.cache_size
    }
}
