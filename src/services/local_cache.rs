//! 本地进度缓存 - 业务能力层
//!
//! 只负责"按用户读写进度文件"，不关心何时读写。
//! 远端成绩可用时以远端为准，本缓存只是兜底。

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

/// 缓存的进度快照
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// 题目 ID -> 已选选项
    pub answers: BTreeMap<String, String>,
    pub score: u32,
}

/// 本地进度缓存
///
/// 每个用户一个文件：`{cache_dir}/{用户名十六进制}.progress.json`
#[derive(Debug, Clone)]
pub struct LocalProgressCache {
    cache_dir: PathBuf,
}

impl LocalProgressCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    fn path_for(&self, user: &str) -> PathBuf {
        // 十六进制编码是单射，且不含路径字符
        let key: String = user.bytes().map(|b| format!("{:02x}", b)).collect();
        self.cache_dir.join(format!("{}.progress.json", key))
    }

    /// 读取用户快照；文件不存在返回 `None`
    pub async fn load(&self, user: &str) -> AppResult<Option<ProgressSnapshot>> {
        let path = self.path_for(user);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::file_read_failed(path.display().to_string(), e)),
        };
        let snapshot = serde_json::from_str(&content)?;
        debug!("读取本地进度: {}", path.display());
        Ok(Some(snapshot))
    }

    /// 覆盖写入用户快照
    pub async fn save(&self, user: &str, snapshot: &ProgressSnapshot) -> AppResult<()> {
        let path = self.path_for(user);
        fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| AppError::file_write_failed(self.cache_dir.display().to_string(), e))?;

        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(&path, json)
            .await
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;
        debug!("写入本地进度: {} ({} 题)", path.display(), snapshot.answers.len());
        Ok(())
    }

    /// 删除用户快照；不存在时视为成功
    pub async fn clear(&self, user: &str) -> AppResult<()> {
        let path = self.path_for(user);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::File(crate::error::FileError::DeleteFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })),
        }
    }
}
