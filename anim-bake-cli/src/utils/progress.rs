//! Progress bar utilities

use anim_bake::{BakeStage, ProgressSink};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

const BAR_TEMPLATE: &str = "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}";

/// Create a standard progress bar
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    pb.set_message(message.to_string());
    pb
}

/// One bar per bake stage, fed by the baker's progress reports
///
/// Clones drive the same bars.
#[derive(Clone)]
pub struct BakeProgress {
    multi: MultiProgress,
    meshes: ProgressBar,
    animations: ProgressBar,
}

impl BakeProgress {
    pub fn new(mesh_count: usize, clip_count: usize) -> Self {
        let multi = MultiProgress::new();
        let meshes = multi.add(create_progress_bar(mesh_count as u64, "meshes"));
        let animations = multi.add(create_progress_bar(clip_count as u64, "animations"));
        Self {
            multi,
            meshes,
            animations,
        }
    }

    /// Bars that accept reports but never draw
    pub fn hidden() -> Self {
        let progress = Self::new(0, 0);
        progress.multi.set_draw_target(ProgressDrawTarget::hidden());
        progress
    }

    fn bar(&self, stage: BakeStage) -> &ProgressBar {
        match stage {
            BakeStage::Meshes => &self.meshes,
            BakeStage::Animations => &self.animations,
        }
    }

    /// Leave both bars on screen in their final state
    pub fn finish(&self) {
        self.meshes.finish();
        self.animations.finish();
    }

    /// Remove both bars, e.g. after a failed bake
    pub fn clear(&self) {
        self.meshes.finish_and_clear();
        self.animations.finish_and_clear();
    }
}

impl ProgressSink for BakeProgress {
    fn report(&self, stage: BakeStage, current: usize, total: usize, label: &str) {
        let bar = self.bar(stage);
        bar.set_length(total as u64);
        bar.set_position(current as u64);
        bar.set_message(format!("{stage}: {label}"));
    }
}
