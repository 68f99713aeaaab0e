// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 协议参数与框架常量模块
//!
//! 该模块集中定义框架核心依赖的固定数据：
//! - HTTP 状态码与原因短语表（`Response::set_status` 的校验依据，也是 `render` 输出的来源）。
//! - 文件后缀名到 MIME 类型的映射表（供静态资源处理器使用）。
//! - 级联文件系统中约定俗成的目录名与默认值。

use std::collections::HashMap;
use lazy_static::lazy_static;

/// HTTP 协议规定的换行符（Carriage Return Line Feed）
pub const CRLF: &str = "\r\n";

/// 框架名称标识，用于 `Server` 响应头
pub const SERVER_NAME: &str = "cascade";

/// 默认协议字符串，可被配置覆盖
pub const DEFAULT_PROTOCOL: &str = "HTTP/1.1";

/// 资源文件默认扩展名（不带点），可被配置覆盖
pub const DEFAULT_EXTENSION: &str = "rs";

/// 类文件所在的目录名
pub const CLASSES_DIR: &str = "classes";

/// 模块初始化文件的基础名
pub const MODULE_INIT_FILE: &str = "init";

/// 这些目录的查找需要聚合所有层级的结果（由低优先级到高优先级），
/// 由调用方自行合并。
pub const AGGREGATE_DIRS: [&str; 3] = ["config", "i18n", "messages"];

/// 状态码低于该值视为成功，回退链在此处停止。
pub const ERROR_STATUS_THRESHOLD: u16 = 400;

lazy_static! {
    /// HTTP 状态码与其原因短语映射表。
    ///
    /// 覆盖 RFC 2616 时代注册的 1xx–5xx 状态码，另含非标准的 509。
    pub static ref STATUS_CODES: HashMap<u16, &'static str> = {
        let mut map = HashMap::new();
        // 1xx: 信息响应
        map.insert(100, "Continue");
        map.insert(101, "Switching Protocols");

        // 2xx: 成功
        map.insert(200, "OK");
        map.insert(201, "Created");
        map.insert(202, "Accepted");
        map.insert(203, "Non-Authoritative Information");
        map.insert(204, "No Content");
        map.insert(205, "Reset Content");
        map.insert(206, "Partial Content");
        map.insert(207, "Multi-Status");

        // 3xx: 重定向（306 已弃用）
        map.insert(300, "Multiple Choices");
        map.insert(301, "Moved Permanently");
        map.insert(302, "Found");
        map.insert(303, "See Other");
        map.insert(304, "Not Modified");
        map.insert(305, "Use Proxy");
        map.insert(307, "Temporary Redirect");

        // 4xx: 客户端错误
        map.insert(400, "Bad Request");
        map.insert(401, "Unauthorized");
        map.insert(402, "Payment Required");
        map.insert(403, "Forbidden");
        map.insert(404, "Not Found");
        map.insert(405, "Method Not Allowed");
        map.insert(406, "Not Acceptable");
        map.insert(407, "Proxy Authentication Required");
        map.insert(408, "Request Timeout");
        map.insert(409, "Conflict");
        map.insert(410, "Gone");
        map.insert(411, "Length Required");
        map.insert(412, "Precondition Failed");
        map.insert(413, "Request Entity Too Large");
        map.insert(414, "Request-URI Too Long");
        map.insert(415, "Unsupported Media Type");
        map.insert(416, "Requested Range Not Satisfiable");
        map.insert(417, "Expectation Failed");
        map.insert(422, "Unprocessable Entity");
        map.insert(423, "Locked");
        map.insert(424, "Failed Dependency");

        // 5xx: 服务端错误
        map.insert(500, "Internal Server Error");
        map.insert(501, "Not Implemented");
        map.insert(502, "Bad Gateway");
        map.insert(503, "Service Unavailable");
        map.insert(504, "Gateway Timeout");
        map.insert(505, "HTTP Version Not Supported");
        map.insert(507, "Insufficient Storage");
        map.insert(509, "Bandwidth Limit Exceeded");
        map
    };
}

lazy_static! {
    /// 文件后缀名到 MIME 类型的映射表，用于 `media/` 下静态资源的 `Content-Type`。
    pub static ref MIME_TYPES: HashMap<&'static str, &'static str> = {
        [
            ("avif", "image/avif"),
            ("bmp", "image/bmp"),
            ("css", "text/css;charset=utf-8"),
            ("csv", "text/csv"),
            ("eot", "application/vnd.ms-fontobject"),
            ("gif", "image/gif"),
            ("gz", "application/gzip"),
            ("htm", "text/html;charset=utf-8"),
            ("html", "text/html;charset=utf-8"),
            ("ico", "image/x-icon"),
            ("jpeg", "image/jpeg"),
            ("jpg", "image/jpeg"),
            ("js", "text/javascript;charset=utf-8"),
            ("json", "application/json"),
            ("mjs", "text/javascript"),
            ("mp3", "audio/mpeg"),
            ("mp4", "video/mp4"),
            ("oga", "audio/ogg"),
            ("ogv", "video/ogg"),
            ("otf", "font/otf"),
            ("pdf", "application/pdf"),
            ("png", "image/png"),
            ("svg", "image/svg+xml"),
            ("tar", "application/x-tar"),
            ("toml", "application/toml"),
            ("ttf", "font/ttf"),
            ("txt", "text/plain"),
            ("wasm", "application/wasm"),
            ("wav", "audio/wav"),
            ("webm", "video/webm"),
            ("webp", "image/webp"),
            ("woff", "font/woff"),
            ("woff2", "font/woff2"),
            ("xml", "text/xml"),
            ("zip", "application/zip"),
            ("7z", "application/x-7z-compressed"),
        ]
        .into_iter()
        .collect()
    };
}

/// 支持的 HTTP 请求方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpRequestMethod {
    Get,
    Head,
    Options,
    Post,
    Put,
    Delete,
}

/// 支持的内容编码（压缩）格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpEncoding {
    /// GNU zip 压缩
    Gzip,
    /// zlib 压缩
    Deflate,
    /// Brotli 压缩
    Br,
}

use std::fmt;

impl fmt::Display for HttpRequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpRequestMethod::Get => write!(f, "GET"),
            HttpRequestMethod::Head => write!(f, "HEAD"),
            HttpRequestMethod::Options => write!(f, "OPTIONS"),
            HttpRequestMethod::Post => write!(f, "POST"),
            HttpRequestMethod::Put => write!(f, "PUT"),
            HttpRequestMethod::Delete => write!(f, "DELETE"),
        }
    }
}

impl fmt::Display for HttpEncoding {
    /// 格式化为 `Content-Encoding` 头所使用的标识符
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpEncoding::Gzip => write!(f, "gzip"),
            HttpEncoding::Deflate => write!(f, "deflate"),
            HttpEncoding::Br => write!(f, "br"),
        }
    }
}

impl HttpRequestMethod {
    /// 大小写不敏感地解析方法名
    pub fn parse(method: &str) -> Option<Self> {
        match method.to_uppercase().as_str() {
            "GET" => Some(HttpRequestMethod::Get),
            "HEAD" => Some(HttpRequestMethod::Head),
            "OPTIONS" => Some(HttpRequestMethod::Options),
            "POST" => Some(HttpRequestMethod::Post),
            "PUT" => Some(HttpRequestMethod::Put),
            "DELETE" => Some(HttpRequestMethod::Delete),
            _ => None,
        }
    }
}

/// 根据扩展名查找 MIME 类型，未知扩展名回落到 `application/octet-stream`。
pub fn mime_for(extension: &str) -> &'static str {
    MIME_TYPES
        .get(extension.to_lowercase().as_str())
        .copied()
        .unwrap_or("application/octet-stream")
}
