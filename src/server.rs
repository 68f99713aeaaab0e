// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 连接处理
//!
//! 每个 TCP 连接处理一个请求：读取报文、解析 `Request`、交给 `Dispatcher`、写回响应。
//! 分发器在启动时构建一次，通过 `Arc` 只读共享给所有连接。

use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::dispatch::Dispatcher;
use crate::exception::Exception;
use crate::request::Request;
use crate::response::Response;

const READ_BUFFER_SIZE: usize = 8192;

/// 接受连接的主循环，每个连接在独立任务中处理。
pub async fn serve(listener: TcpListener, dispatcher: Arc<Dispatcher>) -> Result<(), Exception> {
    let mut id: u128 = 0;
    loop {
        let (mut stream, addr) = listener.accept().await?;
        debug!("[ID{}]新的连接：{}", id, addr);
        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(&mut stream, id, &dispatcher).await {
                error!("[ID{}]处理连接失败: {}", id, e);
            }
        });
        id += 1;
    }
}

/// 处理单个连接上的一次请求。
pub async fn handle_connection<S>(stream: &mut S, id: u128, dispatcher: &Dispatcher) -> Result<(), Exception>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buffer = vec![0; READ_BUFFER_SIZE];
    let n = stream.read(&mut buffer).await?;
    if n == 0 {
        debug!("[ID{}]客户端关闭了连接", id);
        return Ok(());
    }

    let request = match Request::try_from(&buffer[..n], id) {
        Ok(req) => req,
        Err(e) => {
            warn!("[ID{}]解析HTTP请求失败: {}，返回400", id, e);
            return write_status(stream, dispatcher.template(), 400).await;
        }
    };

    let mut out = Vec::new();
    match dispatcher.dispatch(&request, id, &mut out) {
        Ok(_) => {
            stream.write_all(&out).await?;
            stream.flush().await?;
            Ok(())
        }
        Err(e) => {
            // 处理器失败对本次请求是致命的，这里只负责告知客户端
            error!("[ID{}]请求{}处理失败: {}", id, request.uri(), e);
            write_status(stream, dispatcher.template(), 500).await
        }
    }
}

async fn write_status<S>(stream: &mut S, template: &Response, code: u16) -> Result<(), Exception>
where
    S: AsyncWrite + Unpin,
{
    let mut response = template.blank(code)?;
    response.set_header("Connection", "close").stamp();
    info!("返回{} {}", response.status(), response.reason());
    stream.write_all(&response.render()).await?;
    stream.flush().await?;
    Ok(())
}
