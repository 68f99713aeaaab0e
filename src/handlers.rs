// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 内置处理器
//!
//! - `PageHandler`：把 URI 映射到级联文件系统中的 `views/<uri>.html`，通常作为主处理器。
//! - `MediaHandler`：从 `media/` 提供静态文件，支持 `Range` 与压缩，通常作为第一个回退处理器。
//! - `NotFoundHandler`：回退链的最后一环，按 `Accept` 返回 HTML 或 JSON 的 404。
//!
//! 每个处理器持有一个模板响应（见 `with_template`），新响应从模板派生，
//! 以使用配置中的协议与默认内容类型。

use std::path::Path;
use std::sync::Mutex;

use log::{debug, warn};

use crate::cache::FileCache;
use crate::dispatch::Handler;
use crate::exception::Exception;
use crate::param::{mime_for, HttpRequestMethod};
use crate::request::Request;
use crate::resolver::Resolver;
use crate::response::Response;
use crate::util::HtmlBuilder;

/// 只接受 GET 与 HEAD，其余方法返回 405
fn method_not_allowed(request: &Request, template: &Response) -> Result<Option<Response>, Exception> {
    match request.method() {
        HttpRequestMethod::Get | HttpRequestMethod::Head => Ok(None),
        _ => {
            let mut response = template.blank(405)?;
            response.set_header("Allow", "GET, HEAD");
            Ok(Some(response))
        }
    }
}

pub struct PageHandler {
    resolver: Resolver,
    template: Response,
}

impl PageHandler {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver,
            template: Response::new(),
        }
    }

    pub fn with_template(mut self, template: Response) -> Self {
        self.template = template;
        self
    }

    fn view_name(uri: &str) -> String {
        let trimmed = uri.trim_matches('/');
        if trimmed.is_empty() {
            "index".to_string()
        } else {
            trimmed.to_string()
        }
    }
}

impl Handler for PageHandler {
    fn handle(&self, request: &Request) -> Result<Response, Exception> {
        if let Some(response) = method_not_allowed(request, &self.template)? {
            return Ok(response);
        }
        let view = Self::view_name(request.uri());
        match self.resolver.find_file("views", &view, Some("html")) {
            Some(path) => {
                debug!("页面{}对应{}", request.uri(), path.display());
                let html = std::fs::read(&path)?;
                let mut response = self.template.blank(200)?;
                response.set_body(html);
                Ok(response)
            }
            None => self.template.blank(404),
        }
    }
}

pub struct MediaHandler {
    resolver: Resolver,
    prefix: String,
    cache: Mutex<FileCache>,
    template: Response,
}

impl MediaHandler {
    pub fn new(resolver: Resolver, cache_size: usize) -> Self {
        Self {
            resolver,
            prefix: "/media/".to_string(),
            cache: Mutex::new(FileCache::from_capacity(cache_size)),
            template: Response::new(),
        }
    }

    pub fn with_template(mut self, template: Response) -> Self {
        self.template = template;
        self
    }

    fn read_cached(&self, path: &Path) -> Result<bytes::Bytes, Exception> {
        let mut cache = match self.cache.lock() {
            Ok(lock) => lock,
            Err(poisoned) => {
                warn!("缓存锁被污染，恢复并继续");
                poisoned.into_inner()
            }
        };
        cache.read(path)
    }
}

impl Handler for MediaHandler {
    fn handle(&self, request: &Request) -> Result<Response, Exception> {
        let file = match request.uri().strip_prefix(self.prefix.as_str()) {
            Some(f) if !f.is_empty() => f,
            _ => return self.template.blank(404),
        };
        if let Some(response) = method_not_allowed(request, &self.template)? {
            return Ok(response);
        }
        let path = match self.resolver.find_file("media", file, Some("")) {
            Some(p) => p,
            None => return self.template.blank(404),
        };
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let content = self.read_cached(&path)?;

        let mut response = self.template.blank(200)?;
        response
            .send_file(content, mime_for(extension), request.range())
            .encode_body(&request.accept_encoding());
        Ok(response)
    }
}

/// 回退链末端的 404 页面
#[derive(Default)]
pub struct NotFoundHandler {
    template: Response,
}

impl NotFoundHandler {
    pub fn with_template(template: Response) -> Self {
        Self { template }
    }
}

impl Handler for NotFoundHandler {
    fn handle(&self, request: &Request) -> Result<Response, Exception> {
        let mut response = self.template.blank(404)?;
        if request.accepts_json() {
            response.json(&serde_json::json!({
                "status": 404,
                "error": "Not Found",
                "uri": request.uri(),
            }))?;
        } else {
            let note = format!("请求的地址 {} 不存在。", request.uri());
            response.set_body(HtmlBuilder::from_status_code(404, Some(&note)).build());
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::SearchPath;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn resolver(tmp: &TempDir) -> Resolver {
        let app = tmp.path().join("application");
        let system = tmp.path().join("system");
        fs::create_dir_all(app.join("views")).unwrap();
        fs::create_dir_all(app.join("media/css")).unwrap();
        fs::create_dir_all(system.join("views")).unwrap();
        fs::write(app.join("views/index.html"), "<h1>home</h1>").unwrap();
        fs::write(system.join("views/about.html"), "<h1>about</h1>").unwrap();
        fs::write(app.join("media/css/site.css"), "body { color: red; }".repeat(20)).unwrap();
        Resolver::new(Arc::new(SearchPath::new(app, vec![], system)), "rs")
    }

    fn get(uri: &str) -> Request {
        Request::new(HttpRequestMethod::Get, uri)
    }

    #[test]
    fn test_page_root_maps_to_index() {
        let tmp = TempDir::new().unwrap();
        let handler = PageHandler::new(resolver(&tmp));
        let response = handler.handle(&get("/")).unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.body(), b"<h1>home</h1>");
    }

    #[test]
    fn test_page_from_system_layer() {
        let tmp = TempDir::new().unwrap();
        let handler = PageHandler::new(resolver(&tmp));
        let response = handler.handle(&get("/about/")).unwrap();
        assert_eq!(response.body(), b"<h1>about</h1>");
    }

    #[test]
    fn test_page_missing_is_404() {
        let tmp = TempDir::new().unwrap();
        let handler = PageHandler::new(resolver(&tmp));
        assert_eq!(handler.handle(&get("/nope")).unwrap().status(), 404);
    }

    #[test]
    fn test_page_rejects_post() {
        let tmp = TempDir::new().unwrap();
        let handler = PageHandler::new(resolver(&tmp));
        let response = handler.handle(&Request::new(HttpRequestMethod::Post, "/")).unwrap();
        assert_eq!(response.status(), 405);
        assert_eq!(response.header("Allow"), Some("GET, HEAD"));
    }

    #[test]
    fn test_media_full_file() {
        let tmp = TempDir::new().unwrap();
        let handler = MediaHandler::new(resolver(&tmp), 4);
        let response = handler.handle(&get("/media/css/site.css")).unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.header("Content-Type"), Some("text/css;charset=utf-8"));
        assert_eq!(response.content_length(), 400);
    }

    #[test]
    fn test_media_range() {
        let tmp = TempDir::new().unwrap();
        let handler = MediaHandler::new(resolver(&tmp), 4);
        let request = get("/media/css/site.css")
            .with_header("Range", "bytes=-10")
            .with_header("Accept-Encoding", "gzip");
        let response = handler.handle(&request).unwrap();

        assert_eq!(response.status(), 206);
        assert_eq!(response.header("Content-Range"), Some("bytes 390-399/400"));
        assert!(response.header("Content-Encoding").is_none());
        assert_eq!(response.content_length(), 10);
    }

    #[test]
    fn test_media_compressed() {
        let tmp = TempDir::new().unwrap();
        let handler = MediaHandler::new(resolver(&tmp), 4);
        let request = get("/media/css/site.css").with_header("Accept-Encoding", "gzip");
        let response = handler.handle(&request).unwrap();
        assert_eq!(response.header("Content-Encoding"), Some("gzip"));
    }

    #[test]
    fn test_media_outside_prefix_is_404() {
        let tmp = TempDir::new().unwrap();
        let handler = MediaHandler::new(resolver(&tmp), 4);
        assert_eq!(handler.handle(&get("/css/site.css")).unwrap().status(), 404);
        assert_eq!(handler.handle(&get("/media/")).unwrap().status(), 404);
        assert_eq!(handler.handle(&get("/media/../views/index.html")).unwrap().status(), 404);
    }

    #[test]
    fn test_not_found_html_and_json() {
        let handler = NotFoundHandler::default();
        let html = handler.handle(&get("/missing")).unwrap();
        assert_eq!(html.status(), 404);
        assert!(String::from_utf8_lossy(html.body()).contains("/missing"));

        let json = handler
            .handle(&get("/missing").with_header("Accept", "application/json"))
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(json.body()).unwrap();
        assert_eq!(value["status"], 404);
        assert_eq!(value["uri"], "/missing");
    }

    #[test]
    fn test_handlers_use_template_protocol() {
        let tmp = TempDir::new().unwrap();
        let mut template = Response::new();
        template.set_protocol("HTTP/1.0");

        let page = PageHandler::new(resolver(&tmp)).with_template(template.clone());
        assert_eq!(page.handle(&get("/")).unwrap().protocol(), "HTTP/1.0");
        assert_eq!(page.handle(&get("/nope")).unwrap().protocol(), "HTTP/1.0");

        let media = MediaHandler::new(resolver(&tmp), 4).with_template(template.clone());
        assert_eq!(media.handle(&get("/media/css/site.css")).unwrap().protocol(), "HTTP/1.0");

        let missing = NotFoundHandler::with_template(template);
        assert_eq!(missing.handle(&get("/missing")).unwrap().protocol(), "HTTP/1.0");
    }
}
