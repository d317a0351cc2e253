use crate::models::question::Question;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;

/// 离线题目集
///
/// ```toml
/// name = "Rust 基础"
///
/// [[questions]]
/// _id = "q1"
/// question = "Which keyword declares an immutable binding?"
/// options = ["let", "mut", "var", "const"]
/// answer = "let"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionSet {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl QuestionSet {
    /// 解析 TOML 文本，重复 `_id` 的题目只保留第一道
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut set: QuestionSet = toml::from_str(content).context("无法解析题目集")?;

        let mut seen = HashSet::new();
        set.questions.retain(|q| {
            let fresh = seen.insert(q.id.clone());
            if !fresh {
                tracing::warn!("题目 ID 重复，已忽略: {}", q.id);
            }
            fresh
        });

        Ok(set)
    }
}

/// 从 TOML 文件加载题目集
pub async fn load_question_set(toml_file_path: &Path) -> Result<QuestionSet> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let set = QuestionSet::from_toml_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    tracing::info!(
        "成功加载 {} 个题目: {}",
        set.questions.len(),
        toml_file_path.display()
    );

    Ok(set)
}
