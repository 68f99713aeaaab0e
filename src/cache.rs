use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bytes::Bytes;
use log::debug;
use lru::LruCache;

use crate::exception::Exception;

#[derive(Clone)]
struct CacheEntry {
    content: Bytes,
    modified_time: SystemTime,
}

/// 以解析后的绝对路径为键的文件内容缓存，文件修改时间变化即失效。
pub struct FileCache {
    cache: LruCache<PathBuf, CacheEntry>,
}

impl FileCache {
    // 容量为 0 时按 1 处理
    pub fn from_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
        }
    }

    pub fn push(&mut self, path: &Path, bytes: Bytes, modified_time: SystemTime) {
        let entry = CacheEntry {
            content: bytes,
            modified_time,
        };
        self.cache.put(path.to_path_buf(), entry);
    }

    // 查询有效缓存
    pub fn find(&mut self, path: &Path, current_modified_time: SystemTime) -> Option<Bytes> {
        match self.cache.get(path) {
            Some(entry) if entry.modified_time == current_modified_time => Some(entry.content.clone()),
            _ => None,
        }
    }

    /// 命中则直接返回，否则读取文件并放入缓存
    pub fn read(&mut self, path: &Path) -> Result<Bytes, Exception> {
        let modified_time = fs::metadata(path)?.modified()?;
        if let Some(bytes) = self.find(path, modified_time) {
            debug!("缓存命中：{}", path.display());
            return Ok(bytes);
        }
        let bytes = Bytes::from(fs::read(path)?);
        debug!("缓存未命中，读取{}（{} bytes）", path.display(), bytes.len());
        self.push(path, bytes.clone(), modified_time);
        Ok(bytes)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }
}
