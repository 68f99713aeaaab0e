// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 响应模块
//!
//! `Response` 是一个可变的值对象：状态码、有序标头、响应体与协议字符串。
//! 控制器填充它，分发器最后把它渲染为报文。
//!
//! - 设置状态码时会对照 `STATUS_CODES` 校验，未知状态码直接拒绝，不做任何修正。
//! - 标头名称不区分大小写，设置同名标头会原位替换。
//! - `render` 在缺少时注入默认 `Content-Type` 与计算得到的 `Content-Length`。
//! - 支持单段 `Range` 请求，越界值被钳制到 `[0, size-1]`。

use crate::{config::Config, exception::Exception, param::*};

use brotli::enc::{self, backward_references::BrotliEncoderParams};
use bytes::Bytes;
use chrono::prelude::*;
use flate2::{
    write::{DeflateEncoder, GzEncoder},
    Compression,
};
use lazy_static::lazy_static;
use log::{debug, error};
use regex::Regex;

use std::io::{self, Write};

lazy_static! {
    /// 单段字节范围：`bytes=50-200`、`bytes=-500`、`bytes=50-`
    static ref BYTE_RANGE: Regex = Regex::new(r"(-?\d+)(?:-(\d+))?").unwrap();
}

/// 接收状态行与标头的传输端。
pub trait HeaderSink {
    fn status_line(&mut self, line: &str);
    /// `replace` 为真时覆盖此前排队的同名标头
    fn header(&mut self, name: &str, value: &str, replace: bool);
}

/// 在内存中排队的标头，最终一次性写出。
#[derive(Debug, Default, Clone)]
pub struct HeaderQueue {
    status: Option<String>,
    headers: Vec<(String, String)>,
}

impl HeaderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// 状态行 + 标头 + 空行
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::new();
        if let Some(status) = &self.status {
            out.push_str(status);
            out.push_str(CRLF);
        }
        for (name, value) in &self.headers {
            out.push_str(&format!("{}: {}{}", name, value, CRLF));
        }
        out.push_str(CRLF);
        out.into_bytes()
    }
}

impl HeaderSink for HeaderQueue {
    fn status_line(&mut self, line: &str) {
        self.status = Some(line.to_string());
    }

    fn header(&mut self, name: &str, value: &str, replace: bool) {
        if replace {
            self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        }
        self.headers.push((name.to_string(), value.to_string()));
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Bytes,
    protocol: String,
    default_content_type: String,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: vec![],
            body: Bytes::new(),
            protocol: DEFAULT_PROTOCOL.to_string(),
            default_content_type: "text/html; charset=utf-8".to_string(),
        }
    }

    /// 使用配置中的默认协议与内容类型
    pub fn from_config(config: &Config) -> Self {
        Self {
            protocol: config.default_protocol().to_string(),
            default_content_type: config.default_content_type(),
            ..Self::new()
        }
    }

    pub fn with_status(code: u16) -> Result<Self, Exception> {
        Self::new().blank(code)
    }

    /// 以当前响应为模板创建新响应：沿用协议与默认内容类型，标头与响应体为空。
    pub fn blank(&self, code: u16) -> Result<Self, Exception> {
        let mut response = Self {
            status: 200,
            headers: vec![],
            body: Bytes::new(),
            protocol: self.protocol.clone(),
            default_content_type: self.default_content_type.clone(),
        };
        response.set_status(code)?;
        Ok(response)
    }
}

impl Response {
    pub fn status(&self) -> u16 {
        self.status
    }

    /// 设置状态码。不在状态码表中的值返回 `Exception::InvalidStatusCode`。
    pub fn set_status(&mut self, code: u16) -> Result<&mut Self, Exception> {
        if !STATUS_CODES.contains_key(&code) {
            error!("非法的状态码：{}", code);
            return Err(Exception::InvalidStatusCode(code));
        }
        self.status = code;
        Ok(self)
    }

    /// 当前状态码的原因短语
    pub fn reason(&self) -> &'static str {
        STATUS_CODES.get(&self.status).copied().unwrap_or("")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// 设置标头；同名标头（不区分大小写）原位替换。
    pub fn set_header(&mut self, name: &str, value: &str) -> &mut Self {
        match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
        self
    }

    pub fn remove_header(&mut self, name: &str) -> &mut Self {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) -> &mut Self {
        self.body = body.into();
        self
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn set_protocol(&mut self, protocol: &str) -> &mut Self {
        self.protocol = protocol.to_uppercase();
        self
    }

    /// 响应体的字节长度
    pub fn content_length(&self) -> usize {
        self.body.len()
    }

    /// 以 JSON 作为响应体
    pub fn json(&mut self, value: &serde_json::Value) -> Result<&mut Self, Exception> {
        let body = serde_json::to_vec(value).map_err(|e| Exception::HandlerFailed(e.to_string()))?;
        self.set_header("Content-Type", "application/json");
        self.set_body(body);
        Ok(self)
    }

    /// 补上 `Date` 与 `Server` 标头（已存在则保留）
    pub fn stamp(&mut self) -> &mut Self {
        if self.header("Date").is_none() {
            let date = format_date(&Utc::now());
            self.set_header("Date", &date);
        }
        if self.header("Server").is_none() {
            self.set_header("Server", SERVER_NAME);
        }
        self
    }

    fn status_line(&self) -> String {
        format!("{} {} {}", self.protocol, self.status, self.reason())
    }

    /// 实际发送的标头：显式设置的标头加上缺省注入的两项
    fn effective_headers(&self) -> Vec<(String, String)> {
        let mut headers = self.headers.clone();
        if self.header("Content-Type").is_none() {
            headers.push(("Content-Type".to_string(), self.default_content_type.clone()));
        }
        if self.header("Content-Length").is_none() {
            headers.push(("Content-Length".to_string(), self.content_length().to_string()));
        }
        headers
    }

    /// 渲染为完整报文：`PROTOCOL STATUS REASON\r\n` + 标头 + 空行 + 响应体
    pub fn render(&self) -> Vec<u8> {
        let mut header = [self.status_line().as_str(), CRLF].concat();
        for (name, value) in self.effective_headers() {
            header.push_str(&[name.as_str(), ": ", value.as_str(), CRLF].concat());
        }
        header.push_str(CRLF);
        [header.as_bytes(), &self.body[..]].concat()
    }

    /// 把状态行与标头交给传输端
    pub fn send_headers(&self, sink: &mut dyn HeaderSink, replace: bool) {
        sink.status_line(&self.status_line());
        for (name, value) in self.effective_headers() {
            sink.header(&name, &value, replace);
        }
    }
}

impl Response {
    /// 以文件内容构建响应，按 `range` 标头返回完整内容或部分内容（206）。
    pub fn send_file(&mut self, content: Bytes, mime: &str, range: Option<&str>) -> &mut Self {
        let size = content.len() as u64;
        self.set_header("Content-Type", mime);
        self.set_header("Accept-Ranges", "bytes");
        if size == 0 {
            self.set_header("Content-Length", "0");
            self.body = content;
            return self;
        }

        let (start, end) = calculate_byte_range(range, size);
        if start != 0 || end - start + 1 != size {
            // 206 一定在状态码表中
            self.status = 206;
            self.set_header("Content-Range", &format!("bytes {}-{}/{}", start, end, size));
            debug!("部分内容：bytes {}-{}/{}", start, end, size);
        }
        let slice = content.slice(start as usize..=end as usize);
        self.set_header("Content-Length", &slice.len().to_string());
        self.body = slice;
        self
    }

    /// 根据客户端支持的编码压缩响应体。
    ///
    /// 已压缩的媒体类型、部分内容响应和已设置编码的响应保持不变。
    pub fn encode_body(&mut self, accept_encoding: &[HttpEncoding]) -> &mut Self {
        if self.body.is_empty() || self.status == 206 || self.header("Content-Encoding").is_some() {
            return self;
        }
        let mime = self.header("Content-Type").unwrap_or(&self.default_content_type);
        if should_skip_compression(mime) {
            debug!("{}类型跳过压缩", mime);
            return self;
        }
        let encoding = match decide_encoding(accept_encoding) {
            Some(e) => e,
            None => return self,
        };
        match compress(self.body.to_vec(), encoding) {
            Ok(compressed) => {
                self.set_header("Content-Encoding", &encoding.to_string());
                self.remove_header("Content-Length");
                self.body = Bytes::from(compressed);
            }
            Err(e) => error!("压缩响应体失败: {}，返回未压缩内容", e),
        }
        self
    }
}

/// 从 `Range` 标头中取出起始值（可能为负）与可选的结束值。
pub fn parse_byte_range(header: &str) -> Option<(i128, Option<i128>)> {
    let captures = BYTE_RANGE.captures(header)?;
    let start = captures.get(1)?.as_str().parse::<i128>().ok()?;
    let end = match captures.get(2) {
        Some(m) => Some(m.as_str().parse::<i128>().ok()?),
        None => None,
    };
    Some((start, end))
}

/// 计算 `[start, end]` 字节区间（闭区间）。
///
/// 没有或无法解析 `Range` 时返回完整区间；负的起始值表示从末尾倒数；
/// 越界值被钳制到 `[0, size-1]`，起始值超过结束值时从 0 开始。`size` 为 0 时返回 `(0, 0)`。
pub fn calculate_byte_range(header: Option<&str>, size: u64) -> (u64, u64) {
    if size == 0 {
        return (0, 0);
    }
    let size = size as i128;
    let mut start: i128 = 0;
    let mut end: i128 = size - 1;

    if let Some((s, e)) = header.and_then(parse_byte_range) {
        // 负值从末尾倒数，超长的倒数值钳制到 0
        start = if s < 0 { size.saturating_add(s) } else { s };
        if let Some(e) = e {
            end = e;
        }
    }

    let end = end.clamp(0, size - 1);
    let start = start.max(0);
    let start = if end < start { 0 } else { start };
    (start as u64, end as u64)
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn compress(data: Vec<u8>, mode: HttpEncoding) -> io::Result<Vec<u8>> {
    let original_size = data.len();
    let result = match mode {
        HttpEncoding::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&data)?;
            encoder.finish()
        }
        HttpEncoding::Deflate => {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&data)?;
            encoder.finish()
        }
        HttpEncoding::Br => {
            let params = BrotliEncoderParams::default();
            let mut output = Vec::new();
            enc::BrotliCompress(&mut io::Cursor::new(data), &mut output, &params)?;
            Ok(output)
        }
    };
    if let Ok(ref compressed) = result {
        debug!(
            "压缩完成: {}, 原始大小: {} bytes, 压缩后: {} bytes",
            mode,
            original_size,
            compressed.len()
        );
    }
    result
}

fn should_skip_compression(mime_type: &str) -> bool {
    let skip_types = [
        "image/",
        "video/",
        "audio/",
        "application/zip",
        "application/gzip",
        "application/x-7z-compressed",
        "font/woff",
        "application/vnd.ms-fontobject",
    ];
    skip_types
        .iter()
        .any(|&skip_type| mime_type.starts_with(skip_type))
        && !mime_type.starts_with("image/svg")
}

fn decide_encoding(accept_encoding: &[HttpEncoding]) -> Option<HttpEncoding> {
    [HttpEncoding::Gzip, HttpEncoding::Deflate, HttpEncoding::Br]
        .into_iter()
        .find(|e| accept_encoding.contains(e))
}
