use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use tokio::io::AsyncReadExt;

use qz_core::domain::history::{HistoryList, HISTORY_CAPACITY};
use qz_core::domain::settings::AppSettings;
use qz_core::domain::tone::Tone;
use qz_core::infra::metrics::Metrics;
use qz_core::infra::output::ClipboardOutput;
use qz_core::infra::rewriter::credentials::EnvCredentials;
use qz_core::infra::rewriter::prompts;
use qz_core::infra::rewriter::ParaphraseClient;
use qz_core::infra::storage::{load_settings, save_settings, HistoryStore, SqliteStore};
use qz_core::usecase::InteractionController;

use crate::config::{self, Overrides};

/// 1 回の起動で共有する依存一式
pub struct Context {
    store: Arc<SqliteStore>,
    settings: AppSettings,
    metrics: Arc<Metrics>,
}

impl Context {
    pub fn open(db: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let path = db
            .map(Path::to_path_buf)
            .unwrap_or_else(SqliteStore::default_path);
        log::debug!("DB: {}", path.display());

        let store = SqliteStore::open_default(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let stored = load_settings(&store)?;
        let settings = config::resolve(stored, overrides);
        log::info!(
            "provider={} models={}",
            settings.provider.as_str(),
            settings.model_candidates().join(",")
        );

        Ok(Self {
            store: Arc::new(store),
            settings,
            metrics: Arc::new(Metrics::new()),
        })
    }

    pub fn controller(&self) -> Result<InteractionController> {
        let client = ParaphraseClient::from_settings(&self.settings, Arc::new(EnvCredentials))?
            .with_metrics(self.metrics.clone());

        Ok(InteractionController::new(
            Arc::new(client),
            HistoryStore::load(self.store.clone()),
            Arc::new(ClipboardOutput::new()),
            self.metrics.clone(),
        ))
    }
}

/// `restore` の引数: 一覧の番号（1 始まり）か履歴 id
#[derive(Debug, PartialEq, Eq)]
pub enum RestoreTarget {
    Index(usize),
    Id(String),
}

impl RestoreTarget {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<usize>() {
            Ok(n) if (1..=HISTORY_CAPACITY).contains(&n) => RestoreTarget::Index(n - 1),
            _ => RestoreTarget::Id(raw.to_string()),
        }
    }
}

pub fn restore(controller: &mut InteractionController, raw: &str) -> Result<()> {
    match RestoreTarget::parse(raw) {
        RestoreTarget::Index(i) => controller.restore_by_index(i)?,
        RestoreTarget::Id(id) => controller.restore_by_id(&id)?,
    };
    Ok(())
}

pub async fn run_paraphrase(ctx: &Context, text: Option<String>, tone: Tone, copy: bool) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("failed to read stdin")?;
            buf
        }
    };

    let mut controller = ctx.controller()?;
    controller.set_input(text)?;
    controller.set_tone(tone)?;
    let output = controller.submit().await?;
    println!("{output}");

    if copy {
        controller.copy()?;
        eprintln!("{}", controller.copy_label());
    }
    Ok(())
}

pub fn run_history(ctx: &Context, json: bool) -> Result<()> {
    let history = HistoryStore::load(ctx.store.clone());
    if json {
        println!("{}", serde_json::to_string_pretty(history.entries())?);
    } else {
        print_history(history.entries());
    }
    Ok(())
}

pub fn run_restore(ctx: &Context, target: &str, copy: bool) -> Result<()> {
    let mut controller = ctx.controller()?;
    restore(&mut controller, target)?;

    let state = controller.state();
    println!("Tone: {}", state.tone());
    println!("Original:\n{}\n", state.input());
    println!("Paraphrased:\n{}", state.output());

    if copy {
        controller.copy()?;
        eprintln!("{}", controller.copy_label());
    }
    Ok(())
}

pub fn run_tones() {
    for tone in Tone::ALL {
        println!("{:<9} {}", tone.display_name(), prompts::tone_guidance(tone));
    }
}

pub fn run_clear_history(ctx: &Context) -> Result<()> {
    let mut history = HistoryStore::load(ctx.store.clone());
    let removed = history.entries().len();
    history.clear()?;
    eprintln!("Removed {removed} history entries.");
    Ok(())
}

pub fn run_settings_show(ctx: &Context) -> Result<()> {
    let mut shown = ctx.settings.clone();
    shown.models = ctx.settings.model_candidates();
    println!("{}", serde_json::to_string_pretty(&shown)?);
    Ok(())
}

/// 保存済み設定に対して変更する（フラグによる一時的な上書きは保存しない）
pub fn run_settings_set(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let mut stored = load_settings(ctx.store.as_ref())?;
    config::apply(&mut stored, key, value)?;
    save_settings(ctx.store.as_ref(), &stored)?;
    log::info!("設定を保存: {key}");
    println!("{}", serde_json::to_string_pretty(&stored)?);
    Ok(())
}

pub fn print_history(list: &HistoryList) {
    if list.is_empty() {
        println!("No history yet.");
        return;
    }
    for (i, entry) in list.iter().enumerate() {
        println!(
            "{:>2}. [{}] {}  {}",
            i + 1,
            entry.tone,
            format_timestamp(entry.timestamp),
            entry.preview(60)
        );
        println!("    id: {}", entry.id);
    }
}

fn format_timestamp(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|t| {
            t.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|| ms.to_string())
}
