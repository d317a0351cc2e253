use serde::{Deserialize, Serialize};

/// 题目
///
/// 字段名与 REST 接口保持一致：`{_id, question, options[], answer}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: String,
    /// 题干
    pub question: String,
    /// 选项，按显示顺序
    #[serde(default)]
    pub options: Vec<String>,
    /// 正确答案（与某个选项的文本相同）
    pub answer: String,
}

impl Question {
    pub fn new(
        id: impl Into<String>,
        question: impl Into<String>,
        options: Vec<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            options,
            answer: answer.into(),
        }
    }

    /// 选项是否为正确答案
    pub fn is_correct(&self, option: &str) -> bool {
        self.answer == option
    }

    /// 选项是否属于本题
    ///
    /// 没有选项列表的题目接受任意作答
    pub fn has_option(&self, option: &str) -> bool {
        self.options.is_empty() || self.options.iter().any(|o| o == option)
    }
}

/// 管理员新建题目时提交的草稿
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

impl QuestionDraft {
    /// 校验草稿
    ///
    /// 题干和答案必填；填写了选项时答案必须是其中之一。
    /// 空白选项会被丢弃。
    pub fn validate(mut self) -> Result<Self, String> {
        self.question = self.question.trim().to_string();
        self.answer = self.answer.trim().to_string();
        self.options = self
            .options
            .into_iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        if self.question.is_empty() {
            return Err("题干不能为空".to_string());
        }
        if self.answer.is_empty() {
            return Err("正确答案不能为空".to_string());
        }
        if !self.options.is_empty() && !self.options.contains(&self.answer) {
            return Err(format!("正确答案 '{}' 不在选项中", self.answer));
        }
        Ok(self)
    }
}
