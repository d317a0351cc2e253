use crate::clients::QuizApiClient;
use crate::config::Config;
use crate::models::{load_question_set, Question};
use crate::services::{AdminService, AuthService, HttpScoreStore, LocalProgressCache};
use crate::utils::logging;
use crate::workflow::{AnswerOutcome, DeliveryPolicy, QuizController, SessionPhase};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    client: QuizApiClient,
    controller: QuizController,
}

impl App {
    /// 初始化应用：登录、加载题目、恢复进度
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)?;
        logging::log_startup(&config.api_base_url, config.submit_retries);

        let client = QuizApiClient::new(&config)?;

        let email = Config::require_env("QUIZ_EMAIL")?;
        let password = Config::require_env("QUIZ_PASSWORD")?;
        let session = AuthService::new(client.clone())
            .login(&email, &password)
            .await
            .context("登录失败")?;

        let authed = client.with_session(&session);
        let questions = load_questions(&config, &authed).await?;

        let mut controller =
            QuizController::new(session, Arc::new(HttpScoreStore::new(authed.clone())))
                .with_policy(DeliveryPolicy::from_config(&config));
        if config.local_cache_enabled {
            controller = controller.with_cache(LocalProgressCache::new(&config.cache_dir));
        }

        controller.load_questions(questions);
        // 恢复完成前不展示题目
        controller.restore_progress().await;

        Ok(Self {
            config,
            client: authed,
            controller,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(self) -> Result<()> {
        if self.controller.context().is_admin() {
            self.show_admin_overview().await?;
            self.controller.logout().await;
            return Ok(());
        }

        let state = self.controller.state();
        if state.phase == SessionPhase::Empty {
            println!("暂无题目");
            self.controller.logout().await;
            return Ok(());
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        for (index, (question, locked)) in self.controller.questions().into_iter().enumerate() {
            if locked {
                println!("第 {} 题已作答", index + 1);
                continue;
            }
            if !self.ask(index, &question, &mut lines).await? {
                info!("用户退出答题");
                break;
            }
        }

        let state = self.controller.state();
        println!("得分: {}/{}", state.score, state.total);

        if let Some(false) = self.controller.wait_for_submission().await {
            warn!("⚠️ 成绩未能保存到服务器，本地结果仍然有效");
        }
        logging::log_session_summary(
            self.controller.context().name(),
            state.score,
            state.total,
            &self.config.output_log_file,
        );

        self.controller.logout().await;
        Ok(())
    }

    /// 展示一道题并读取作答，返回 `false` 表示用户退出
    async fn ask(
        &self,
        index: usize,
        question: &Question,
        lines: &mut Lines<BufReader<Stdin>>,
    ) -> Result<bool> {
        println!("\n第 {} 题: {}", index + 1, question.question);
        for (i, option) in question.options.iter().enumerate() {
            println!("  {}. {}", i + 1, option);
        }

        loop {
            println!("请输入选项编号 (q 退出):");
            let Some(line) = lines.next_line().await? else {
                return Ok(false);
            };
            let input = line.trim();
            if input.eq_ignore_ascii_case("q") {
                return Ok(false);
            }

            let Some(option) = pick_option(question, input) else {
                println!("无效输入: {}", input);
                continue;
            };

            match self.controller.select_answer(&question.id, &option).await {
                AnswerOutcome::Recorded { correct, .. } => {
                    println!("{}", if correct { "回答正确" } else { "回答错误" });
                    return Ok(true);
                }
                AnswerOutcome::Rejected(reason) => {
                    println!("本题不可作答 ({:?})", reason);
                    return Ok(true);
                }
            }
        }
    }

    async fn show_admin_overview(&self) -> Result<()> {
        let admin = AdminService::new(&self.client, self.controller.context())?;

        let questions = admin.list_questions().await?;
        println!("题库共 {} 道题:", questions.len());
        for q in &questions {
            println!("  [{}] {}", q.id, logging::truncate_text(&q.question, 60));
        }

        let scores = admin.list_scores().await?;
        println!("\n用户成绩:");
        for s in &scores {
            let date = s
                .date
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            println!("  {:<16} {:>3}/{:<3} {}", s.user_name, s.score, s.total, date);
        }
        Ok(())
    }
}

/// 加载题目：配置了离线文件时读文件，否则请求接口；请求失败按空题库处理
async fn load_questions(config: &Config, client: &QuizApiClient) -> Result<Vec<Question>> {
    if let Some(path) = &config.questions_toml {
        info!("\n📁 正在加载离线题目...");
        let set = load_question_set(Path::new(path)).await?;
        return Ok(set.questions);
    }

    info!("\n📥 正在获取题目...");
    match client.fetch_questions().await {
        Ok(questions) => Ok(questions),
        Err(e) => {
            warn!("⚠️ 获取题目失败: {}", e);
            Ok(Vec::new())
        }
    }
}

/// 把输入的编号转换为选项文本；没有选项的题目直接使用输入
fn pick_option(question: &Question, input: &str) -> Option<String> {
    if input.is_empty() {
        return None;
    }
    if question.options.is_empty() {
        return Some(input.to_string());
    }
    let n: usize = input.parse().ok()?;
    question.options.get(n.checked_sub(1)?).cloned()
}
