// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 请求分发器
//!
//! 一次请求经历三个状态：
//!
//! ```text
//! Primary ──(404)──> Fallback ──(状态 < 400 或处理器耗尽)──> Done
//!    └────────(其他状态)───────────────────────────────────────┘
//! ```
//!
//! - Primary：执行主处理器。
//! - Fallback：只有主处理器返回 404 时才进入，按顺序调用子请求处理器，
//!   遇到第一个状态码低于 400 的响应即停止；全部失败时使用最后一个处理器的响应。
//! - Done：把选定响应的标头与响应体写出。
//!
//! 处理器返回的 `Err` 不在这里捕获，直接向调用方传播。

use std::io::Write;

use log::{debug, info};

use crate::exception::Exception;
use crate::param::{HttpRequestMethod, ERROR_STATUS_THRESHOLD};
use crate::request::Request;
use crate::response::{HeaderQueue, Response};

#[cfg(test)]
use mockall::automock;

/// 能够处理一个请求并产生响应的对象。
#[cfg_attr(test, automock)]
pub trait Handler: Send + Sync {
    fn handle(&self, request: &Request) -> Result<Response, Exception>;
}

/// 分发状态机的状态
#[derive(Debug)]
pub enum DispatchState {
    Primary,
    Fallback { next: usize, last: Response },
    Done(Response),
}

pub struct Dispatcher {
    primary: Box<dyn Handler>,
    fallbacks: Vec<Box<dyn Handler>>,
    template: Response,
}

impl Dispatcher {
    pub fn new(primary: Box<dyn Handler>) -> Self {
        Self {
            primary,
            fallbacks: vec![],
            template: Response::new(),
        }
    }

    /// 连接层自行生成的响应（400、500）以此为模板
    pub fn with_template(mut self, template: Response) -> Self {
        self.template = template;
        self
    }

    pub fn template(&self) -> &Response {
        &self.template
    }

    /// 在回退链末尾追加一个子请求处理器
    pub fn with_fallback(mut self, handler: Box<dyn Handler>) -> Self {
        self.fallbacks.push(handler);
        self
    }

    pub fn fallback_count(&self) -> usize {
        self.fallbacks.len()
    }

    /// 执行状态机直到 Done，返回最终选定的响应。
    pub fn execute(&self, request: &Request, id: u128) -> Result<Response, Exception> {
        let mut state = DispatchState::Primary;
        loop {
            state = match state {
                DispatchState::Primary => {
                    let response = self.primary.handle(request)?;
                    debug!("[ID{}]主处理器返回{}", id, response.status());
                    if response.status() == 404 {
                        DispatchState::Fallback { next: 0, last: response }
                    } else {
                        DispatchState::Done(response)
                    }
                }
                DispatchState::Fallback { next, last } => match self.fallbacks.get(next) {
                    None => {
                        debug!("[ID{}]回退链已耗尽，使用最后一个响应（{}）", id, last.status());
                        DispatchState::Done(last)
                    }
                    Some(handler) => {
                        let response = handler.handle(request)?;
                        debug!("[ID{}]第{}个回退处理器返回{}", id, next + 1, response.status());
                        if response.status() < ERROR_STATUS_THRESHOLD {
                            DispatchState::Done(response)
                        } else {
                            DispatchState::Fallback { next: next + 1, last: response }
                        }
                    }
                },
                DispatchState::Done(response) => return Ok(response),
            };
        }
    }

    /// 写出响应的状态行、标头与响应体。HEAD 请求不写响应体。
    pub fn emit(request: &Request, response: &Response, out: &mut impl Write) -> Result<(), Exception> {
        let mut queue = HeaderQueue::new();
        response.send_headers(&mut queue, true);
        out.write_all(&queue.to_bytes())?;
        if request.method() != HttpRequestMethod::Head {
            out.write_all(response.body())?;
        }
        out.flush()?;
        Ok(())
    }

    /// 执行并写出，返回最终的状态码。
    pub fn dispatch(&self, request: &Request, id: u128, out: &mut impl Write) -> Result<u16, Exception> {
        let mut response = self.execute(request, id)?;
        response.stamp();
        Self::emit(request, &response, out)?;
        info!(
            "[ID{}] {}, {}, {}, {} {}, {}",
            id,
            request.protocol(),
            request.method(),
            request.uri(),
            response.status(),
            response.reason(),
            request.user_agent(),
        );
        Ok(response.status())
    }
}
