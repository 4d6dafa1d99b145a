//! Prints component state as it changes. The controller never prints.

use client_core::{
    command::StatusReport,
    notify::Toast,
    progress::ProgressState,
    visualization::{StageState, VisualizationEvent, VisualizationSnapshot},
    OperationController, TextView,
};
use tokio::{
    sync::{broadcast::error::RecvError, watch},
    task::JoinHandle,
};

const BAR_WIDTH: usize = 20;
const CONTENT_PREVIEW_CHARS: usize = 72;

pub struct Renderer {
    tasks: Vec<JoinHandle<()>>,
}

impl Drop for Renderer {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

pub fn spawn(controller: &OperationController) -> Renderer {
    let mut progress = controller.subscribe_progress();
    let mut toasts = controller.subscribe_posted_toasts();
    let mut events = controller.subscribe_visualization_events();
    let snapshots = controller.subscribe_visualization();

    let progress_task = tokio::spawn(async move {
        let mut last_line = String::new();
        while progress.changed().await.is_ok() {
            let state = progress.borrow_and_update().clone();
            if !state.visible {
                continue;
            }
            let line = progress_line(&state);
            if line != last_line {
                println!("{line}");
                last_line = line;
            }
        }
    });

    let toast_task = tokio::spawn(async move {
        loop {
            match toasts.recv().await {
                Ok(toast) => println!("{}", toast_line(&toast)),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    let stage_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(line) = event_line(&event, &snapshots) {
                        println!("{line}");
                    }
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    Renderer {
        tasks: vec![progress_task, toast_task, stage_task],
    }
}

pub fn progress_line(state: &ProgressState) -> String {
    let percent = state.rounded_percent();
    let filled = usize::from(percent) * BAR_WIDTH / 100;
    format!(
        "{} [{}{}] {:>3}% {}",
        state.title,
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent,
        state.status
    )
}

pub fn toast_line(toast: &Toast) -> String {
    format!("{} {}: {}", toast.kind.icon(), toast.title, toast.message)
}

fn event_line(
    event: &VisualizationEvent,
    snapshots: &watch::Receiver<VisualizationSnapshot>,
) -> Option<String> {
    let snapshot = snapshots.borrow();
    match event {
        VisualizationEvent::Started { algorithm, .. } => {
            let details = snapshot.details?;
            Some(format!(
                "== {algorithm} pipeline (key {}, block {}, {}) ==",
                details.key_size, details.block_size, details.mode
            ))
        }
        VisualizationEvent::StageActivated { .. } => None,
        VisualizationEvent::StageCompleted { stage, .. } => {
            let pipeline = snapshot.pipeline.as_ref()?;
            let state = pipeline.stages().iter().find(|s| s.stage == *stage)?;
            Some(stage_line(state, stage.label(pipeline.family())))
        }
        VisualizationEvent::Finished { summary, .. } => Some(format!(
            "== finished in {} using {} ==",
            summary.elapsed_label(),
            summary.algorithm
        )),
        VisualizationEvent::Aborted { .. } => Some("== pipeline aborted ==".to_string()),
    }
}

pub fn stage_line(state: &StageState, label: &str) -> String {
    let mut content: String = state.content.chars().take(CONTENT_PREVIEW_CHARS).collect();
    if state.content.chars().count() > CONTENT_PREVIEW_CHARS {
        content.push_str("...");
    }
    format!("  ✓ {label:<24} {content}")
}

pub fn text_panel(view: &TextView) -> String {
    let mut out = format!("input: {}\noutput: {}", view.char_count_label(), view.output);
    if let Some(stats) = view.stats {
        out.push_str(&format!(
            "\n  {} -> {} bytes ({})",
            stats.input_length,
            stats.output_length,
            stats.label()
        ));
    }
    out
}

pub fn status_report(report: &StatusReport) -> String {
    let session = &report.session;
    let mut lines = vec![format!(
        "session: {} ({} attempts left)",
        if session.authenticated {
            "authenticated"
        } else if session.locked_out() {
            "locked out"
        } else {
            "signed out"
        },
        session.remaining_attempts
    )];
    match &report.selected_file {
        Some(file) => lines.push(format!(
            "file: {} {} ({}, {})",
            file.icon.glyph(),
            file.name,
            file.display_size(),
            file.display_mime()
        )),
        None => lines.push("file: none".to_string()),
    }
    lines.push(format!("text: {}", report.text.char_count_label()));
    if let Some(last) = &report.last_operation {
        lines.push(format!(
            "last result: {}/{} ({})",
            last.folder().as_str(),
            last.filename,
            last.algorithm
        ));
    }
    lines.join("\n")
}
