/*!
 * Rendering of the Reveal.js deck to one image per slide.
 *
 * A headless Chromium is driven from the command line: `--dump-dom` is polled
 * until Reveal.js marks its root element ready, the top-level `<section>`
 * elements of the `.slides` container are counted, and every slide is captured
 * with `--screenshot` by navigating to its `#/<index>` fragment.
 */

use async_trait::async_trait;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use url::Url;

use crate::app_config::RendererConfig;
use crate::errors::StageError;
use crate::policy::run_with_policy;
use crate::tools::run_tool;

static CLASS_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bclass\s*=\s*["']([^"']*)["']"#).expect("valid class regex")
});

static STRUCTURE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<(/?)(div|section)\b([^>]*)>").expect("valid tag regex")
});

const INITIAL_BUDGET_MS: u64 = 2000;

/// Slide images in presentation order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlideImageSequence(Vec<PathBuf>);

impl SlideImageSequence {
    pub fn new(images: Vec<PathBuf>) -> Self {
        Self(images)
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Renders a slide deck to ordered images
#[async_trait]
pub trait SlideRenderer: Send + Sync {
    /// Capture every top-level slide of `markup` into `slides_dir`
    async fn render(
        &self,
        markup: &Path,
        slides_dir: &Path,
    ) -> Result<SlideImageSequence, StageError>;
}

/// Slide renderer driving a headless Chromium
#[derive(Debug, Clone)]
pub struct HeadlessBrowserRenderer {
    config: RendererConfig,
}

impl HeadlessBrowserRenderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    fn base_args(&self, budget_ms: u64) -> Vec<String> {
        vec![
            "--headless".to_string(),
            "--disable-gpu".to_string(),
            "--hide-scrollbars".to_string(),
            "--allow-file-access-from-files".to_string(),
            format!(
                "--window-size={},{}",
                self.config.viewport_width, self.config.viewport_height
            ),
            format!("--virtual-time-budget={}", budget_ms),
        ]
    }

    async fn dump_dom(&self, url: &Url, budget_ms: u64) -> Result<String, StageError> {
        let mut args = self.base_args(budget_ms);
        args.push("--dump-dom".to_string());
        args.push(url.to_string());

        let program = self.config.browser.as_str();
        let args = &args;
        let output = run_with_policy(
            &self.config.policy,
            "browser DOM dump",
            StageError::Rendering,
            || async move { run_tool(program, args).await.map_err(StageError::Rendering) },
        )
        .await?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Poll the deck until Reveal.js reports ready and return the final DOM
    async fn wait_until_ready(&self, url: &Url) -> Result<String, StageError> {
        let deadline = Duration::from_secs(self.config.ready_timeout_secs);
        let started = Instant::now();
        let mut budget_ms = INITIAL_BUDGET_MS;

        loop {
            let dom = self.dump_dom(url, budget_ms).await?;
            if is_reveal_ready(&dom) {
                debug!("Reveal.js ready after {:?}", started.elapsed());
                return Ok(dom);
            }
            if started.elapsed() >= deadline {
                return Err(StageError::Rendering(format!(
                    "Reveal.js did not become ready within {}s",
                    self.config.ready_timeout_secs
                )));
            }
            budget_ms = budget_ms.saturating_mul(2);
        }
    }

    async fn capture(&self, url: &Url, image: &Path) -> Result<(), StageError> {
        let budget_ms = INITIAL_BUDGET_MS + self.config.transition_delay_ms;
        let mut args = self.base_args(budget_ms);
        args.push(format!("--screenshot={}", image.display()));
        args.push(url.to_string());

        let program = self.config.browser.as_str();
        let args = &args;
        run_with_policy(
            &self.config.policy,
            "slide screenshot",
            StageError::Rendering,
            || async move { run_tool(program, args).await.map_err(StageError::Rendering) },
        )
        .await?;

        if !image.is_file() {
            return Err(StageError::Rendering(format!(
                "Browser did not write slide image {:?}",
                image
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SlideRenderer for HeadlessBrowserRenderer {
    async fn render(
        &self,
        markup: &Path,
        slides_dir: &Path,
    ) -> Result<SlideImageSequence, StageError> {
        let absolute = std::path::absolute(markup)
            .map_err(|e| StageError::Rendering(format!("Invalid deck path {:?}: {}", markup, e)))?;
        let url = Url::from_file_path(&absolute)
            .map_err(|_| StageError::Rendering(format!("Invalid deck path {:?}", absolute)))?;

        let dom = self.wait_until_ready(&url).await?;
        let slide_count = count_top_level_sections(&dom);
        if slide_count == 0 {
            return Err(StageError::Rendering(
                "No slides found in the Reveal.js presentation.".to_string(),
            ));
        }

        info!("Rendering {} slides", slide_count);
        let mut images = Vec::with_capacity(slide_count);
        for index in 0..slide_count {
            let mut slide_url = url.clone();
            slide_url.set_fragment(Some(&format!("/{}", index)));

            let image = slides_dir.join(slide_image_name(index));
            self.capture(&slide_url, &image).await?;
            debug!("Captured slide {} to {:?}", index, image);
            images.push(image);
        }

        Ok(SlideImageSequence::new(images))
    }
}

/// Zero-padded so that images sort in slide order
pub fn slide_image_name(index: usize) -> String {
    format!("slide_{:03}.png", index)
}

/// Whether the Reveal.js root element carries its `ready` class
pub fn is_reveal_ready(dom: &str) -> bool {
    CLASS_ATTR.captures_iter(dom).any(|caps| {
        let classes: Vec<&str> = caps[1].split_whitespace().collect();
        classes.contains(&"reveal") && classes.contains(&"ready")
    })
}

/// Count the direct `<section>` children of the `.slides` container.
///
/// Nested sections (vertical stacks) count once, through their parent.
pub fn count_top_level_sections(dom: &str) -> usize {
    let mut inside_slides = false;
    let mut div_depth = 0usize;
    let mut section_depth = 0usize;
    let mut count = 0;

    for caps in STRUCTURE_TAG.captures_iter(dom) {
        let closing = !caps[1].is_empty();
        let tag = caps[2].to_ascii_lowercase();
        let attrs = &caps[3];

        if !inside_slides {
            if !closing && tag == "div" && has_class(attrs, "slides") {
                inside_slides = true;
            }
            continue;
        }

        match (tag.as_str(), closing) {
            ("section", false) => {
                if section_depth == 0 && div_depth == 0 {
                    count += 1;
                }
                section_depth += 1;
            }
            ("section", true) => section_depth = section_depth.saturating_sub(1),
            ("div", false) => div_depth += 1,
            ("div", true) => {
                if div_depth == 0 && section_depth == 0 {
                    break;
                }
                div_depth = div_depth.saturating_sub(1);
            }
            _ => {}
        }
    }

    count
}

fn has_class(attrs: &str, class: &str) -> bool {
    CLASS_ATTR
        .captures(attrs)
        .map(|caps| caps[1].split_whitespace().any(|c| c == class))
        .unwrap_or(false)
}
