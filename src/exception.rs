// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了框架在启动配置与请求处理过程中可能产生的各类异常。
//!
//! ## 设计意图
//! - **错误分类**：涵盖启动配置错误、协议解析错误、状态码校验错误以及处理器失败。
//! - **未找到不是错误**：文件与类的查找结果以 `Option` 表示，只有真正的失败才走 `Exception`。
//! - **可读性**：通过实现 `std::fmt::Display`，错误信息可以直接写入日志。

use std::fmt;
use std::io;

/// 框架处理过程中发生的异常类型。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exception {
    /// 模块目录不存在。启动阶段的致命错误，注册表不会保留任何部分状态。
    ModuleNotFound { name: String, path: String },
    /// 试图设置一个不在状态码表中的状态码。
    InvalidStatusCode(u16),
    /// 请求字节流无法解析为合法的 UTF-8 字符串。
    RequestIsNotUtf8,
    /// 请求行格式错误，或使用了框架不支持的 HTTP 方法。
    UnSupportedRequestMethod,
    /// 客户端使用了不支持的 HTTP 协议版本。
    UnsupportedHttpVersion,
    /// 文件在解析之后消失，或读取时已不存在。
    FileNotFound,
    /// 配置文件无法读取或解析。
    ConfigError(String),
    /// 底层 I/O 失败。
    Io(String),
    /// 请求处理器内部失败，会直接向上传播。
    HandlerFailed(String),
}

use Exception::*;

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleNotFound { name, path } => {
                write!(f, "Attempted to load an invalid or missing module '{}' at '{}'", name, path)
            }
            InvalidStatusCode(code) => write!(f, "Unknown status value: {}", code),
            RequestIsNotUtf8 => write!(f, "Request bytes can't be parsed in UTF-8"),
            UnSupportedRequestMethod => write!(f, "Unsupported request method"),
            UnsupportedHttpVersion => write!(f, "Unsupported HTTP version"),
            FileNotFound => write!(f, "File not found (404)"),
            ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            Io(msg) => write!(f, "I/O error: {}", msg),
            HandlerFailed(msg) => write!(f, "Request handler failed: {}", msg),
        }
    }
}

impl std::error::Error for Exception {}

impl From<io::Error> for Exception {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => FileNotFound,
            _ => Io(e.to_string()),
        }
    }
}
