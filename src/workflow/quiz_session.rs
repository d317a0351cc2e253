//! 答题会话状态机 - 流程层
//!
//! 核心职责：决定一次作答能否被接受、分数如何变化、何时提交成绩。
//!
//! 状态流转：
//! 1. `Loading` → 题目加载完成 → `Ready`（题目为空则 `Empty`）
//! 2. `Ready` → 所有题目都已作答（含之前提交过的） → `Submitted`
//! 3. `Submitted` / `Empty` 为终态，拒绝一切作答
//!
//! 本模块不做任何 IO，由 [`QuizController`](super::QuizController) 驱动。

use crate::models::{Question, ScoreRecord};
use crate::services::ProgressSnapshot;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// 会话阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// 题目尚未加载
    Loading,
    /// 题目列表为空，显示"暂无题目"
    Empty,
    /// 可以作答
    Ready,
    /// 成绩已提交，全部锁定
    Submitted,
}

/// 作答被拒绝的原因
///
/// 属于正常的界面防护路径，不是错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// 题目未加载或为空
    NotReady,
    /// 本次会话已提交
    AlreadySubmitted,
    /// 题目不在本次题目列表中
    UnknownQuestion,
    /// 选项不属于该题
    UnknownOption,
    /// 本次会话已经答过这道题
    AlreadyAnswered,
    /// 该题位置在之前已提交的数量之内
    LockedByPriorAttempt,
}

/// 一次作答的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    Recorded {
        correct: bool,
        score: u32,
        /// 本次作答完成了整套题时，需要提交的成绩
        submission: Option<ScoreRecord>,
    },
    Rejected(RejectReason),
}

impl AnswerOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, AnswerOutcome::Recorded { .. })
    }
}

/// 恢复远端进度的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// 按远端记录锁定了前 `locked` 道题
    Applied { locked: usize, submitted: bool },
    /// 没有历史记录，从零开始
    Fresh,
    /// 会话已有更新的进度，忽略迟到的恢复结果
    Ignored,
}

/// 给展示层用的只读状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub score: u32,
    /// 已锁定题数（之前提交的 + 本次作答的）
    pub answered: usize,
    pub total: usize,
}

impl SessionState {
    pub fn is_submitted(&self) -> bool {
        self.phase == SessionPhase::Submitted
    }
}

/// 答题会话
#[derive(Debug)]
pub struct QuizSession {
    questions: Vec<Question>,
    position: HashMap<String, usize>,
    /// 本次会话的作答，只增不改
    answers: BTreeMap<String, String>,
    score: u32,
    /// 之前已提交过的题数，按位置锁定
    attempted: usize,
    phase: SessionPhase,
    restored: bool,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizSession {
    pub fn new() -> Self {
        Self {
            questions: Vec::new(),
            position: HashMap::new(),
            answers: BTreeMap::new(),
            score: 0,
            attempted: 0,
            phase: SessionPhase::Loading,
            restored: false,
        }
    }

    /// 加载本次会话的完整题目列表
    ///
    /// 重复 ID 的题目只保留第一道。重新加载会丢弃之前的会话状态。
    pub fn load_questions(&mut self, questions: Vec<Question>) -> SessionPhase {
        *self = Self::new();

        for question in questions {
            if self.position.contains_key(&question.id) {
                warn!("题目 ID 重复，已忽略: {}", question.id);
                continue;
            }
            self.position.insert(question.id.clone(), self.questions.len());
            self.questions.push(question);
        }

        self.phase = if self.questions.is_empty() {
            SessionPhase::Empty
        } else {
            SessionPhase::Ready
        };
        self.phase
    }

    /// 应用远端成绩
    ///
    /// `record.total` 之内的题目按位置锁定；覆盖整套题时直接进入 `Submitted`。
    /// 会话里已经有作答、已提交或已经恢复过时，忽略本次结果。
    pub fn apply_restore(&mut self, record: Option<ScoreRecord>) -> RestoreOutcome {
        if self.phase != SessionPhase::Ready || !self.answers.is_empty() || self.restored {
            debug!("忽略迟到的进度恢复 (阶段: {:?})", self.phase);
            return RestoreOutcome::Ignored;
        }

        let Some(record) = record else {
            return RestoreOutcome::Fresh;
        };

        if record.score > record.total {
            warn!(
                "远端成绩不合法 ({}/{})，按新会话处理",
                record.score, record.total
            );
            return RestoreOutcome::Fresh;
        }

        self.restored = true;
        self.attempted = (record.total as usize).min(self.questions.len());
        self.score = record.score.min(self.attempted as u32);

        let submitted = self.attempted >= self.questions.len();
        if submitted {
            self.phase = SessionPhase::Submitted;
        }

        RestoreOutcome::Applied {
            locked: self.attempted,
            submitted,
        }
    }

    /// 应用本地缓存的进度
    ///
    /// 只在没有远端记录且本次尚未作答时生效；分数按当前题目的答案重新计算。
    /// 返回恢复的题数，之后应调用 [`check_completion`](Self::check_completion)。
    pub fn apply_snapshot(&mut self, snapshot: &ProgressSnapshot) -> usize {
        if self.phase != SessionPhase::Ready
            || !self.answers.is_empty()
            || self.restored
            || self.attempted > 0
        {
            return 0;
        }

        for (id, option) in &snapshot.answers {
            let Some(&idx) = self.position.get(id) else {
                continue;
            };
            let question = &self.questions[idx];
            if !question.has_option(option) {
                continue;
            }
            if question.is_correct(option) {
                self.score += 1;
            }
            self.answers.insert(id.clone(), option.clone());
        }

        self.restored = !self.answers.is_empty();
        self.answers.len()
    }

    /// 选择答案
    ///
    /// 每道题只接受第一次作答；答对加一分；答完整套题时返回要提交的成绩。
    pub fn select_answer(&mut self, question_id: &str, option: &str) -> AnswerOutcome {
        let reject = |reason: RejectReason| {
            debug!("拒绝作答 {}: {:?}", question_id, reason);
            AnswerOutcome::Rejected(reason)
        };

        match self.phase {
            SessionPhase::Loading | SessionPhase::Empty => return reject(RejectReason::NotReady),
            SessionPhase::Submitted => return reject(RejectReason::AlreadySubmitted),
            SessionPhase::Ready => {}
        }

        let Some(&idx) = self.position.get(question_id) else {
            return reject(RejectReason::UnknownQuestion);
        };
        if self.answers.contains_key(question_id) {
            return reject(RejectReason::AlreadyAnswered);
        }
        if idx < self.attempted {
            return reject(RejectReason::LockedByPriorAttempt);
        }

        let question = &self.questions[idx];
        if !question.has_option(option) {
            return reject(RejectReason::UnknownOption);
        }

        let correct = question.is_correct(option);
        if correct {
            self.score += 1;
        }
        self.answers
            .insert(question_id.to_string(), option.to_string());

        AnswerOutcome::Recorded {
            correct,
            score: self.score,
            submission: self.check_completion(),
        }
    }

    /// 检查是否答完
    ///
    /// 第一次检测到答完时切换为 `Submitted` 并返回要提交的成绩，之后再调用都返回 `None`。
    pub fn check_completion(&mut self) -> Option<ScoreRecord> {
        if self.phase != SessionPhase::Ready {
            return None;
        }
        if self.answered_count() < self.questions.len() {
            return None;
        }

        self.phase = SessionPhase::Submitted;
        Some(ScoreRecord::new(self.score, self.questions.len() as u32))
    }

    /// 丢弃全部会话状态
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    // ========== 查询 ==========

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn answered_count(&self) -> usize {
        self.attempted + self.answers.len()
    }

    pub fn is_submitted(&self) -> bool {
        self.phase == SessionPhase::Submitted
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// 本次会话对该题的作答
    pub fn selected_option(&self, question_id: &str) -> Option<&str> {
        self.answers.get(question_id).map(String::as_str)
    }

    /// 该题是否已不可作答
    pub fn is_locked(&self, question_id: &str) -> bool {
        match self.position.get(question_id) {
            Some(&idx) => {
                self.phase != SessionPhase::Ready
                    || idx < self.attempted
                    || self.answers.contains_key(question_id)
            }
            None => true,
        }
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            phase: self.phase,
            score: self.score,
            answered: self.answered_count(),
            total: self.questions.len(),
        }
    }

    /// 本次会话作答的快照，用于本地缓存
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            answers: self.answers.clone(),
            score: self.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(id: &str, answer: &str) -> Question {
        Question::new(
            id,
            format!("question {}", id),
            vec!["A".into(), "B".into(), "C".into(), "X".into()],
            answer,
        )
    }

    fn abc_session() -> QuizSession {
        let mut session = QuizSession::new();
        session.load_questions(vec![q("q1", "A"), q("q2", "B"), q("q3", "C")]);
        session
    }

    #[test]
    fn test_three_questions_two_correct() {
        let mut session = abc_session();

        assert!(session.select_answer("q1", "A").is_recorded());
        assert!(session.select_answer("q2", "X").is_recorded());
        let last = session.select_answer("q3", "C");

        assert_eq!(
            last,
            AnswerOutcome::Recorded {
                correct: true,
                score: 2,
                submission: Some(ScoreRecord::new(2, 3)),
            }
        );
        assert!(session.is_submitted());
        for id in ["q1", "q2", "q3"] {
            assert!(session.is_locked(id));
        }
    }

    #[test]
    fn test_first_answer_is_final() {
        let mut session = abc_session();

        session.select_answer("q1", "B");
        assert_eq!(
            session.select_answer("q1", "A"),
            AnswerOutcome::Rejected(RejectReason::AlreadyAnswered)
        );
        assert_eq!(session.score(), 0);
        assert_eq!(session.selected_option("q1"), Some("B"));
    }

    #[test]
    fn test_score_counts_matches_over_any_order() {
        let mut session = QuizSession::new();
        let questions: Vec<Question> = (0..6)
            .map(|i| q(&format!("q{}", i), if i % 2 == 0 { "A" } else { "B" }))
            .collect();
        session.load_questions(questions);

        let picks = [("q5", "B"), ("q0", "A"), ("q3", "A"), ("q2", "A"), ("q1", "C")];
        let mut expected = 0;
        for (id, option) in picks {
            let correct = session.questions()[session.position[id]].is_correct(option);
            if correct {
                expected += 1;
            }
            session.select_answer(id, option);
        }

        assert_eq!(session.score(), expected);
        assert_eq!(session.answered_count(), 5);
        assert!(!session.is_submitted());
    }

    #[test]
    fn test_completion_fires_once() {
        let mut session = abc_session();
        session.select_answer("q1", "A");
        session.select_answer("q2", "B");
        let outcome = session.select_answer("q3", "C");
        assert!(matches!(
            outcome,
            AnswerOutcome::Recorded {
                submission: Some(_),
                ..
            }
        ));

        assert_eq!(session.check_completion(), None);
        assert_eq!(session.check_completion(), None);
        assert_eq!(
            session.select_answer("q3", "A"),
            AnswerOutcome::Rejected(RejectReason::AlreadySubmitted)
        );
    }

    #[test]
    fn test_restore_full_set_locks_everything() {
        let mut session = abc_session();
        let outcome = session.apply_restore(Some(ScoreRecord::new(2, 3)));

        assert_eq!(
            outcome,
            RestoreOutcome::Applied {
                locked: 3,
                submitted: true
            }
        );
        for id in ["q1", "q2", "q3"] {
            assert!(session.is_locked(id));
            assert!(!session.select_answer(id, "A").is_recorded());
        }
        assert_eq!(session.score(), 2);
        assert_eq!(session.check_completion(), None);
    }

    #[test]
    fn test_restore_partial_locks_by_position() {
        let mut session = abc_session();
        session.apply_restore(Some(ScoreRecord::new(1, 1)));

        assert!(session.is_locked("q1"));
        assert!(!session.is_locked("q2"));
        assert_eq!(
            session.select_answer("q1", "A"),
            AnswerOutcome::Rejected(RejectReason::LockedByPriorAttempt)
        );

        assert_eq!(
            session.select_answer("q2", "B"),
            AnswerOutcome::Recorded {
                correct: true,
                score: 2,
                submission: None,
            }
        );
        match session.select_answer("q3", "A") {
            AnswerOutcome::Recorded {
                submission: Some(record),
                ..
            } => {
                assert_eq!(record.total, 3);
                assert!(record.score <= 3);
                assert_eq!(record.score, 2);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_restore_larger_than_bank_is_submitted() {
        let mut session = abc_session();
        let outcome = session.apply_restore(Some(ScoreRecord::new(4, 5)));
        assert_eq!(
            outcome,
            RestoreOutcome::Applied {
                locked: 3,
                submitted: true
            }
        );
        assert_eq!(session.score(), 3);
    }

    #[test]
    fn test_restore_malformed_record_is_fresh() {
        let mut session = abc_session();
        assert_eq!(
            session.apply_restore(Some(ScoreRecord::new(3, 1))),
            RestoreOutcome::Fresh
        );
        assert_eq!(session.score(), 0);
        assert!(!session.is_locked("q1"));
    }

    #[test]
    fn test_late_restore_does_not_override_session() {
        let mut session = abc_session();
        session.select_answer("q1", "A");

        assert_eq!(
            session.apply_restore(Some(ScoreRecord::new(0, 3))),
            RestoreOutcome::Ignored
        );
        assert_eq!(session.score(), 1);
        assert!(!session.is_submitted());
    }

    #[test]
    fn test_second_restore_is_ignored() {
        let mut session = abc_session();
        session.apply_restore(Some(ScoreRecord::new(1, 1)));
        assert_eq!(session.apply_restore(None), RestoreOutcome::Ignored);
        assert_eq!(session.answered_count(), 1);
    }

    #[test]
    fn test_empty_list_never_submits() {
        let mut session = QuizSession::new();
        assert_eq!(session.load_questions(Vec::new()), SessionPhase::Empty);
        assert_eq!(session.check_completion(), None);
        assert_eq!(
            session.select_answer("q1", "A"),
            AnswerOutcome::Rejected(RejectReason::NotReady)
        );
        assert_eq!(session.apply_restore(None), RestoreOutcome::Ignored);
    }

    #[test]
    fn test_answers_before_load_are_rejected() {
        let mut session = QuizSession::new();
        assert_eq!(
            session.select_answer("q1", "A"),
            AnswerOutcome::Rejected(RejectReason::NotReady)
        );
    }

    #[test]
    fn test_unknown_question_and_option() {
        let mut session = abc_session();
        assert_eq!(
            session.select_answer("nope", "A"),
            AnswerOutcome::Rejected(RejectReason::UnknownQuestion)
        );
        assert_eq!(
            session.select_answer("q1", "Z"),
            AnswerOutcome::Rejected(RejectReason::UnknownOption)
        );
        assert_eq!(session.answered_count(), 0);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let mut session = QuizSession::new();
        session.load_questions(vec![q("q1", "A"), q("q1", "B"), q("q2", "C")]);
        assert_eq!(session.total(), 2);
        assert!(session.select_answer("q1", "A").is_recorded());
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn test_snapshot_recomputes_score() {
        let mut snapshot = ProgressSnapshot::default();
        snapshot.answers.insert("q1".into(), "A".into());
        snapshot.answers.insert("q2".into(), "A".into());
        snapshot.answers.insert("gone".into(), "A".into());
        snapshot.score = 99;

        let mut session = abc_session();
        assert_eq!(session.apply_snapshot(&snapshot), 2);
        assert_eq!(session.score(), 1);
        assert!(session.is_locked("q1"));
        assert_eq!(session.check_completion(), None);

        // 快照生效后远端迟到的空结果不会清掉进度
        assert_eq!(session.apply_restore(None), RestoreOutcome::Ignored);
        assert_eq!(session.snapshot().answers.len(), 2);
    }

    #[test]
    fn test_snapshot_ignored_after_remote_restore() {
        let mut snapshot = ProgressSnapshot::default();
        snapshot.answers.insert("q2".into(), "B".into());

        let mut session = abc_session();
        session.apply_restore(Some(ScoreRecord::new(1, 1)));
        assert_eq!(session.apply_snapshot(&snapshot), 0);
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn test_reload_resets_state() {
        let mut session = abc_session();
        session.select_answer("q1", "A");
        session.load_questions(vec![q("q9", "A")]);
        assert_eq!(session.score(), 0);
        assert_eq!(session.answered_count(), 0);
        assert_eq!(session.phase(), SessionPhase::Ready);
    }
}
