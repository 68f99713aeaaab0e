// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # cascade 服务入口
//!
//! 启动顺序：
//! 1. 初始化 log4rs 日志。
//! 2. 读取 TOML 配置，按声明顺序注册模块并构建搜索路径（任一模块缺失即终止启动）。
//! 3. 载入各模块的初始化文件。
//! 4. 构建分发器：页面处理器为主，静态资源与 404 页面依次作为回退。
//! 5. 在 Tokio 多线程运行时上监听端口。

use std::{
    net::{Ipv4Addr, SocketAddrV4},
    process,
    sync::Arc,
};

use cascade::{
    server, ClassLoader, Config, Dispatcher, MediaHandler, ModuleRegistry, NotFoundHandler,
    PageHandler, Response,
};
use log::{error, info};
use tokio::{net::TcpListener, runtime::Builder};

const DEFAULT_CONFIG: &str = "config/development.toml";

fn main() {
    if let Err(e) = log4rs::init_file("config/log4rs.yaml", Default::default()) {
        eprintln!("无法初始化日志系统：{}", e);
    }

    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = match Config::from_toml(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let registry = match ModuleRegistry::from_config(&config) {
        Ok(r) => r,
        Err(e) => {
            error!("启动失败：{}", e);
            process::exit(1);
        }
    };

    let mut loader = ClassLoader::new(registry.resolver());
    match registry.initialize_modules(&mut loader) {
        Ok(names) => info!("已初始化模块：{:?}", names),
        Err(e) => {
            error!("模块初始化失败：{}", e);
            process::exit(1);
        }
    }

    let resolver = registry.resolver();
    let template = Response::from_config(&config);
    let dispatcher = Arc::new(
        Dispatcher::new(Box::new(
            PageHandler::new(resolver.clone()).with_template(template.clone()),
        ))
        .with_fallback(Box::new(
            MediaHandler::new(resolver, config.cache_size()).with_template(template.clone()),
        ))
        .with_fallback(Box::new(NotFoundHandler::with_template(template.clone())))
        .with_template(template),
    );

    let runtime = match Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("无法创建运行时：{}", e);
            process::exit(1);
        }
    };

    let address = match config.local() {
        true => Ipv4Addr::new(127, 0, 0, 1),
        false => Ipv4Addr::new(0, 0, 0, 0),
    };
    let socket = SocketAddrV4::new(address, config.port());

    runtime.block_on(async move {
        let listener = match TcpListener::bind(socket).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("无法绑定{}，错误：{}", socket, e);
                process::exit(1);
            }
        };
        info!("服务端在{}上监听Socket连接", socket);
        if let Err(e) = server::serve(listener, dispatcher).await {
            error!("服务端退出：{}", e);
        }
    });
}
