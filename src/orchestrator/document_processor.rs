//! 单个文档处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责处理单个文档的所有部分和批次，是文档级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **开启会话**：每个文档开始前重置会话和请求计数
//! 2. **遍历批次**：按部分、按批次顺序调用 `BatchFlow`
//! 3. **断点记录**：每个成功批次后保存位置
//! 4. **节奏控制**：批次之间等待，批次边界检查停止 / 暂停
//! 5. **部分保存**：部分完成后写出 JSON；停止时自动保存

use crate::clients::GenerationBackend;
use crate::error::AppResult;
use crate::models::accumulator::AccumulatedOutput;
use crate::models::batch::Section;
use crate::models::document::{DocumentOpener, DocumentSource};
use crate::models::event::EventSink;
use crate::models::position::{ProcessingPosition, ResumePoint};
use crate::orchestrator::control::RunControl;
use crate::orchestrator::options::RunOptions;
use crate::services::{OutputWriter, StateStore};
use crate::workflow::{BatchCtx, BatchFlow, BatchOutcome};
use std::path::Path;

/// 单个文档的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOutcome {
    Completed { records_saved: usize },
    /// 用户停止，已自动保存
    Stopped { records_saved: usize },
}

/// 处理文档所需的能力，均由批量处理器持有
pub struct DocumentEnv<'a, B: GenerationBackend + ?Sized> {
    pub flow: &'a mut BatchFlow<B>,
    pub opener: &'a dyn DocumentOpener,
    pub writer: &'a OutputWriter,
    pub state: &'a StateStore,
    pub control: &'a RunControl,
    pub options: &'a RunOptions,
    pub sink: &'a EventSink,
}

/// 正在处理的文档
struct OpenDocument<'p> {
    path: &'p Path,
    index: usize,
    file_name: String,
    source: Box<dyn DocumentSource>,
    output: AccumulatedOutput,
    records_saved: usize,
}

/// 处理单个文档
///
/// 打开失败或写文件失败时返回错误，由调用方计为失败文档
pub async fn process_document<B: GenerationBackend + ?Sized>(
    env: &mut DocumentEnv<'_, B>,
    path: &Path,
    index: usize,
    total: usize,
    start: ResumePoint,
) -> AppResult<DocumentOutcome> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    env.sink.current_document(&file_name, index, total);
    log_document_start(env.sink, index, total, &file_name);

    env.flow.start_document(env.sink).await;

    let source = env.opener.open(path).await?;
    let mut doc = OpenDocument {
        path,
        index,
        file_name,
        source,
        output: AccumulatedOutput::new(),
        records_saved: 0,
    };

    let options = env.options;
    for &section in &options.sections {
        if env.control.is_stopped() {
            return stop_with_autosave(env, &mut doc).await;
        }
        if !process_section(env, &mut doc, section, start.start_batch(section)).await? {
            return stop_with_autosave(env, &mut doc).await;
        }
    }

    Ok(DocumentOutcome::Completed {
        records_saved: doc.records_saved,
    })
}

/// 处理一个部分；收到停止请求时返回 false
async fn process_section<B: GenerationBackend + ?Sized>(
    env: &mut DocumentEnv<'_, B>,
    doc: &mut OpenDocument<'_>,
    section: Section,
    start_batch: usize,
) -> AppResult<bool> {
    let label = section.as_str().to_uppercase();
    let batches = doc
        .source
        .batches_for_section(section, env.options.pages_per_batch);
    let total_batches = batches.len();

    env.sink.info(format!("📚 处理 {} 部分", label));
    match doc.source.section_page_range(section) {
        Some((first, last)) => env.sink.info(format!("   页码: {}-{}", first, last)),
        None => env.sink.warning("   该部分没有页面"),
    }
    env.sink.info(format!("   批次总数: {}", total_batches));

    for batch in &batches {
        let ctx = BatchCtx::new(
            doc.index,
            doc.source.name(),
            section,
            batch.batch_number,
            total_batches,
        );

        if env.control.is_stopped() {
            return Ok(false);
        }

        if batch.batch_number < start_batch {
            env.sink.info(format!(
                "⏭️  跳过 {} 批次 {}/{}",
                section, batch.batch_number, total_batches
            ));
            env.sink.progress(batch.batch_number, total_batches);
            continue;
        }

        env.control
            .wait_while_paused(env.options.pause_poll_interval, env.sink)
            .await;
        if env.control.is_stopped() {
            return Ok(false);
        }

        env.sink.info(format!(
            "📦 批次 {}/{} (第 {}-{} 页, 共 {} 页)",
            batch.batch_number, total_batches, batch.start_page, batch.end_page, batch.page_count
        ));

        match env.flow.run(&ctx, batch, env.sink).await {
            BatchOutcome::Recorded(records) => {
                doc.output.extend(section, records);
                record_position(env, doc, section, batch.batch_number).await;

                if !ctx.is_last() && !env.options.delay.is_zero() {
                    env.sink.info(format!(
                        "   ⏱️  等待 {:.1}s 后发送下一个请求...",
                        env.options.delay.as_secs_f64()
                    ));
                    env.control
                        .sleep(env.options.delay, env.options.pause_poll_interval)
                        .await;
                }
            }
            BatchOutcome::Skipped(_) => {}
        }

        env.sink.progress(batch.batch_number, total_batches);
    }

    save_section(env, doc, section).await?;
    Ok(true)
}

/// 保存断点并通知调用方；保存失败只记录警告
async fn record_position<B: GenerationBackend + ?Sized>(
    env: &DocumentEnv<'_, B>,
    doc: &OpenDocument<'_>,
    section: Section,
    batch_index: usize,
) {
    let position = ProcessingPosition::now(
        doc.path.display().to_string(),
        doc.index,
        doc.file_name.clone(),
        section,
        batch_index,
    );
    if let Err(e) = env.state.save(&position).await {
        env.sink.warning(format!("⚠️  断点保存失败: {}", e));
    }
    env.sink.position(position);
}

async fn save_section<B: GenerationBackend + ?Sized>(
    env: &DocumentEnv<'_, B>,
    doc: &mut OpenDocument<'_>,
    section: Section,
) -> AppResult<()> {
    let records = doc.output.take(section);
    let count = records.len();
    let saved = env
        .writer
        .save_section(
            doc.source.name(),
            doc.path,
            section,
            env.options.content_kind,
            records,
        )
        .await?;

    if let Some(path) = saved {
        doc.records_saved += count;
        env.sink
            .success(format!("   ✓ 已保存到: {}", path.display()));
    }
    Ok(())
}

/// 停止前保存已累积但未写出的记录
async fn stop_with_autosave<B: GenerationBackend + ?Sized>(
    env: &DocumentEnv<'_, B>,
    doc: &mut OpenDocument<'_>,
) -> AppResult<DocumentOutcome> {
    if !doc.output.is_empty() {
        env.sink.info("💾 停止前自动保存进度...");
        for section in Section::ALL {
            if doc.output.len(section) == 0 {
                continue;
            }
            let records = doc.output.take(section);
            let count = records.len();
            match env
                .writer
                .save_section(
                    doc.source.name(),
                    doc.path,
                    section,
                    env.options.content_kind,
                    records,
                )
                .await
            {
                Ok(Some(path)) => {
                    doc.records_saved += count;
                    env.sink.success(format!(
                        "   ✓ 已自动保存 {}: {}",
                        section,
                        path.display()
                    ));
                }
                Ok(None) => {}
                Err(e) => env.sink.warning(format!("   ⚠️ 自动保存失败: {}", e)),
            }
        }
    }

    Ok(DocumentOutcome::Stopped {
        records_saved: doc.records_saved,
    })
}

fn log_document_start(sink: &EventSink, index: usize, total: usize, file_name: &str) {
    sink.info("");
    sink.info("=".repeat(60));
    sink.info(format!("📄 处理文档 {}/{}: {}", index, total, file_name));
    sink.info("=".repeat(60));
}
