use anyhow::Result;
use batch_mcq_extract::models::{list_documents, ResumePoint, TextDocumentOpener};
use batch_mcq_extract::utils::logging;
use batch_mcq_extract::{
    BatchOrchestrator, Config, OutputWriter, ProgressEvent, RequestClient, RunOptions,
    RunOutcome, StateStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = match std::env::var("CONFIG_FILE") {
        Ok(path) => Config::from_file(path)?,
        Err(_) => Config::from_env(),
    };

    // 初始化日志
    logging::init(config.verbose_logging);
    config.validate()?;
    logging::init_log_file(&config.output_log_file)?;
    logging::log_startup(&config);

    info!("\n📁 正在扫描待处理的文档...");
    let documents = list_documents(&config.document_folder).await?;
    if documents.is_empty() {
        warn!("⚠️ 没有找到待处理的文档，程序结束");
        return Ok(());
    }

    let state = StateStore::new(&config.state_file);
    let mut options = RunOptions::from_config(&config, documents)?;
    if config.resume_from_state {
        match state.load().await {
            Some(position) => {
                info!("📍 从断点继续: {}", position.summary());
                options = options.with_resume(ResumePoint::after(&position));
            }
            None => info!("📍 没有可用的断点，从头开始"),
        }
    }

    let total = options.documents.len();
    let selected = (1..=total).filter(|&i| options.is_selected(i)).count();
    logging::log_documents_loaded(total, selected);

    let client = Arc::new(RequestClient::new(&config)?);
    let opener = Arc::new(TextDocumentOpener::new(config.mids_percentage));
    let writer = OutputWriter::new(config.organized_output_dir.as_ref().map(PathBuf::from));

    let orchestrator = BatchOrchestrator::new(Arc::clone(&client), opener, writer, state, options);
    let (mut task, mut events, handle) = orchestrator.start();

    // Ctrl-C：当前批次结束后保存并停止
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.stop();
        }
    });

    // 工作任务结束（包括 panic）时退出循环，Ctrl-C 任务仍持有事件发送端
    let summary = loop {
        tokio::select! {
            biased;
            Some(event) = events.recv() => handle_event(&config.output_log_file, event),
            joined = &mut task => break joined?,
        }
    };
    while let Ok(event) = events.try_recv() {
        handle_event(&config.output_log_file, event);
    }

    logging::print_final_stats(&summary, &client.repair_stats(), &config.output_log_file);

    if let RunOutcome::Failed(message) = summary.outcome {
        anyhow::bail!(message);
    }
    Ok(())
}

/// 日志事件写入日志文件，其余事件只做控制台记录
fn handle_event(log_file: &str, event: ProgressEvent) {
    match event {
        ProgressEvent::Log { message, level } => {
            if let Err(e) = logging::append_log_line(log_file, level, &message) {
                debug!("日志文件写入失败: {}", e);
            }
        }
        ProgressEvent::Position(position) => debug!("📍 {}", position.summary()),
        ProgressEvent::Finished { success, message } => {
            info!("{} {}", if success { "🏁" } else { "⛔" }, message);
        }
        ProgressEvent::Progress { .. } | ProgressEvent::CurrentDocument { .. } => {}
    }
}
