// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求模块
//!
//! 负责把从 TCP 流中读到的原始字节解析为 `Request`，也可以在测试或子请求中以构建器方式直接创建。
//! 标头按出现顺序保存，名称查找不区分大小写。

use crate::{exception::Exception, param::*};
use log::error;

/// 一次入站请求。
#[derive(Debug, Clone)]
pub struct Request {
    method: HttpRequestMethod,
    /// 请求路径，不含查询字符串
    uri: String,
    query: Option<String>,
    protocol: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl Request {
    pub fn new(method: HttpRequestMethod, target: &str) -> Self {
        let (uri, query) = split_target(target);
        Self {
            method,
            uri,
            query,
            protocol: DEFAULT_PROTOCOL.to_string(),
            headers: vec![],
            body: String::new(),
        }
    }

    /// 追加一个标头，便于链式构建。
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    /// 从原始字节缓冲区构建请求。
    ///
    /// # 逻辑步骤
    /// 1. 验证编码：请求数据必须是合法的 UTF-8。
    /// 2. 解析请求行：方法、目标、协议版本。
    /// 3. 解析标头，直到遇到空行；空行之后是请求体。
    pub fn try_from(buffer: &[u8], id: u128) -> Result<Self, Exception> {
        let request_string = match std::str::from_utf8(buffer) {
            Ok(string) => string.trim_end_matches('\0'),
            Err(_) => {
                error!("[ID{}]无法解析HTTP请求", id);
                return Err(Exception::RequestIsNotUtf8);
            }
        };

        let (head, body) = match request_string.split_once("\r\n\r\n") {
            Some((h, b)) => (h, b),
            None => (request_string, ""),
        };
        let mut lines = head.split(CRLF);

        let request_line = lines.next().unwrap_or_default();
        let parts: Vec<&str> = request_line.split(' ').filter(|p| !p.is_empty()).collect();
        if parts.len() < 3 {
            error!("[ID{}]HTTP请求行格式不正确：{}", id, request_line);
            return Err(Exception::UnSupportedRequestMethod);
        }

        let method = match HttpRequestMethod::parse(parts[0]) {
            Some(m) => m,
            None => {
                error!("[ID{}]不支持的HTTP请求方法：{}", id, parts[0]);
                return Err(Exception::UnSupportedRequestMethod);
            }
        };

        let protocol = parts[parts.len() - 1].to_uppercase();
        if protocol != "HTTP/1.1" && protocol != "HTTP/1.0" {
            error!("[ID{}]不支持的HTTP协议版本：{}", id, protocol);
            return Err(Exception::UnsupportedHttpVersion);
        }

        // 路径中出现空格虽不规范，但仍尝试拼回
        let target = parts[1..parts.len() - 1].join(" ");
        let (uri, query) = split_target(&target);

        let headers = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
            .collect();

        Ok(Self {
            method,
            uri,
            query,
            protocol,
            headers,
            body: body.to_string(),
        })
    }
}

fn split_target(target: &str) -> (String, Option<String>) {
    match target.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (target.to_string(), None),
    }
}

impl Request {
    pub fn method(&self) -> HttpRequestMethod {
        self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// 不区分大小写地获取第一个同名标头
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn user_agent(&self) -> &str {
        self.header("User-Agent").unwrap_or("")
    }

    /// 原始的 `Range` 标头
    pub fn range(&self) -> Option<&str> {
        self.header("Range")
    }

    /// 客户端是否期望 JSON 响应
    pub fn accepts_json(&self) -> bool {
        self.header("Accept")
            .map_or(false, |a| a.contains("application/json"))
    }

    /// 客户端支持的压缩算法列表
    pub fn accept_encoding(&self) -> Vec<HttpEncoding> {
        let mut encodings = vec![];
        if let Some(value) = self.header("Accept-Encoding") {
            for token in value.split(',').map(|t| t.trim().to_lowercase()) {
                let encoding = match token.split(';').next().unwrap_or("") {
                    "gzip" => HttpEncoding::Gzip,
                    "deflate" => HttpEncoding::Deflate,
                    "br" => HttpEncoding::Br,
                    _ => continue,
                };
                if !encodings.contains(&encoding) {
                    encodings.push(encoding);
                }
            }
        }
        encodings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_get_request() {
        let request_str = "GET / HTTP/1.1\r\nHost: localhost:7878\r\nUser-Agent: Test-Browser\r\nAccept-Encoding: gzip, deflate, br\r\n\r\n";
        let request = Request::try_from(request_str.as_bytes(), 0).unwrap();

        assert_eq!(request.method(), HttpRequestMethod::Get);
        assert_eq!(request.uri(), "/");
        assert_eq!(request.user_agent(), "Test-Browser");
        assert_eq!(
            request.accept_encoding(),
            vec![HttpEncoding::Gzip, HttpEncoding::Deflate, HttpEncoding::Br]
        );
    }

    #[test]
    fn test_parse_post_with_body() {
        let request_str =
            "POST /submit HTTP/1.1\r\nHost: localhost:7878\r\nContent-Length: 10\r\n\r\ntest=value";
        let request = Request::try_from(request_str.as_bytes(), 0).unwrap();

        assert_eq!(request.method(), HttpRequestMethod::Post);
        assert_eq!(request.uri(), "/submit");
        assert_eq!(request.body(), "test=value");
        assert_eq!(request.header("content-length"), Some("10"));
    }

    #[test]
    fn test_trailing_zero_padding_ignored() {
        let mut buffer = b"GET /a HTTP/1.1\r\nHost: x\r\n\r\n".to_vec();
        buffer.resize(1024, 0);
        let request = Request::try_from(&buffer, 0).unwrap();
        assert_eq!(request.uri(), "/a");
        assert_eq!(request.body(), "");
    }

    #[test]
    fn test_unsupported_method() {
        let request_str = "PATCH /resource HTTP/1.1\r\nHost: localhost:7878\r\n\r\n";
        let result = Request::try_from(request_str.as_bytes(), 0);
        assert_eq!(result.unwrap_err(), Exception::UnSupportedRequestMethod);
    }

    #[test]
    fn test_unsupported_http_version() {
        let request_str = "GET / HTTP/2.0\r\nHost: localhost:7878\r\n\r\n";
        let result = Request::try_from(request_str.as_bytes(), 0);
        assert_eq!(result.unwrap_err(), Exception::UnsupportedHttpVersion);
    }

    #[test]
    fn test_invalid_utf8() {
        let buffer = vec![0xFF, 0xFE, 0xFD];
        let result = Request::try_from(&buffer, 0);
        assert_eq!(result.unwrap_err(), Exception::RequestIsNotUtf8);
    }

    #[test]
    fn test_case_insensitive_headers() {
        let request_str = "GET / HTTP/1.1\r\nhost: localhost:7878\r\nrange: bytes=0-99\r\n\r\n";
        let request = Request::try_from(request_str.as_bytes(), 0).unwrap();

        assert_eq!(request.header("HOST"), Some("localhost:7878"));
        assert_eq!(request.range(), Some("bytes=0-99"));
    }

    #[test]
    fn test_query_string_split() {
        let request_str = "GET /page?id=123&name=test HTTP/1.1\r\nHost: localhost:7878\r\n\r\n";
        let request = Request::try_from(request_str.as_bytes(), 0).unwrap();

        assert_eq!(request.uri(), "/page");
        assert_eq!(request.query(), Some("id=123&name=test"));
    }

    #[test]
    fn test_builder() {
        let request = Request::new(HttpRequestMethod::Get, "/media/logo.png?v=2")
            .with_header("Accept", "application/json");
        assert_eq!(request.uri(), "/media/logo.png");
        assert_eq!(request.query(), Some("v=2"));
        assert!(request.accepts_json());
        assert_eq!(request.protocol(), "HTTP/1.1");
    }

    #[test]
    fn test_accept_encoding_with_quality() {
        let request = Request::new(HttpRequestMethod::Get, "/")
            .with_header("Accept-Encoding", "br;q=1.0, gzip;q=0.8, identity");
        assert_eq!(request.accept_encoding(), vec![HttpEncoding::Br, HttpEncoding::Gzip]);
    }
}
