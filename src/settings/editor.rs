/// Settings form controller
///
/// Working copy of the home settings form. Text fields and the image list
/// are edited in memory; `submit` freezes them into a layout plus file batch
/// and hands both to the save action. While a submit is in flight every edit
/// is refused.
use crate::{
    blob_store::PendingFile,
    config::UploadLimits,
    error::{SiteError, SiteResult},
    settings::{HomeSettings, HomeSettingsAction, HomeSettingsSubmission, ImageSubmission, LayoutEntry},
};
use base64::{engine::general_purpose::STANDARD, Engine};

/// Direction of a single-step image move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    /// Earlier in display order
    Left,
    /// Later in display order
    Right,
}

/// One entry of the image list being edited
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSlot {
    id: u64,
    url: String,
    file: Option<PendingFile>,
}

impl ImageSlot {
    /// Synthetic id, stable across moves, never persisted
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stored URL, or a `data:` preview for a pending file
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn file(&self) -> Option<&PendingFile> {
        self.file.as_ref()
    }

    /// True until the file has been uploaded and reloaded as a URL
    pub fn is_new(&self) -> bool {
        self.file.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Idle,
    Submitting,
}

/// User-visible outcome of the last submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Saved,
    Failed(String),
}

/// Home settings form controller
#[derive(Debug, Clone)]
pub struct SettingsEditor {
    hero_headline: String,
    hero_subheadline: String,
    show_products_section: bool,
    slots: Vec<ImageSlot>,
    limits: UploadLimits,
    state: EditorState,
    notice: Option<Notice>,
    next_slot_id: u64,
}

impl SettingsEditor {
    /// Build the working copy from the stored settings
    pub fn load(settings: Option<&HomeSettings>, limits: UploadLimits) -> Self {
        let mut editor = Self {
            hero_headline: String::new(),
            hero_subheadline: String::new(),
            show_products_section: true,
            slots: Vec::new(),
            limits,
            state: EditorState::Idle,
            notice: None,
            next_slot_id: 0,
        };

        if let Some(settings) = settings {
            editor.hero_headline = settings.hero_headline.clone();
            editor.hero_subheadline = settings.hero_subheadline.clone();
            editor.show_products_section = settings.show_products_section;
            for url in &settings.hero_images {
                let id = editor.allocate_id();
                editor.slots.push(ImageSlot {
                    id,
                    url: url.clone(),
                    file: None,
                });
            }
        }

        editor
    }

    pub fn hero_headline(&self) -> &str {
        &self.hero_headline
    }

    pub fn hero_subheadline(&self) -> &str {
        &self.hero_subheadline
    }

    pub fn show_products_section(&self) -> bool {
        self.show_products_section
    }

    pub fn slots(&self) -> &[ImageSlot] {
        &self.slots
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn set_hero_headline(&mut self, value: impl Into<String>) -> SiteResult<()> {
        self.ensure_idle()?;
        self.hero_headline = value.into();
        Ok(())
    }

    pub fn set_hero_subheadline(&mut self, value: impl Into<String>) -> SiteResult<()> {
        self.ensure_idle()?;
        self.hero_subheadline = value.into();
        Ok(())
    }

    pub fn set_show_products_section(&mut self, value: bool) -> SiteResult<()> {
        self.ensure_idle()?;
        self.show_products_section = value;
        Ok(())
    }

    /// Attach a file as a new slot at the end of the list
    ///
    /// Returns the new slot's id.
    pub fn add_image(&mut self, file: PendingFile) -> SiteResult<u64> {
        self.ensure_idle()?;
        self.limits.check(file.size(), &file.content_type)?;

        let id = self.allocate_id();
        self.slots.push(ImageSlot {
            id,
            url: preview_data_uri(&file),
            file: Some(file),
        });

        Ok(id)
    }

    /// Remove the slot at `index`; out-of-range indices are ignored
    ///
    /// A pending slot's preview and file buffer are released with it.
    pub fn remove_image(&mut self, index: usize) -> SiteResult<()> {
        self.ensure_idle()?;
        if index < self.slots.len() {
            self.slots.remove(index);
        }
        Ok(())
    }

    /// Swap the slot at `index` with its neighbour
    ///
    /// Moving the first slot left or the last slot right does nothing.
    pub fn move_image(&mut self, index: usize, direction: MoveDirection) -> SiteResult<()> {
        self.ensure_idle()?;

        let target = match direction {
            MoveDirection::Left => index.checked_sub(1),
            MoveDirection::Right => index.checked_add(1),
        };

        if let Some(target) = target {
            if index < self.slots.len() && target < self.slots.len() {
                self.slots.swap(index, target);
            }
        }

        Ok(())
    }

    /// Freeze the working copy into a submission and enter `Submitting`
    ///
    /// Pending files are numbered in list order, so placeholder `k` always
    /// names the k-th file of the batch. The working copy itself is kept so
    /// a failed save can be retried as-is.
    pub fn begin_submit(&mut self) -> SiteResult<HomeSettingsSubmission> {
        self.ensure_idle()?;

        let mut layout = Vec::with_capacity(self.slots.len());
        let mut files = Vec::new();

        for slot in &self.slots {
            match &slot.file {
                Some(file) => {
                    layout.push(LayoutEntry::pending(files.len()));
                    files.push(file.clone());
                }
                None => layout.push(LayoutEntry::existing(slot.url.clone())),
            }
        }

        self.state = EditorState::Submitting;
        self.notice = None;

        Ok(HomeSettingsSubmission {
            hero_headline: self.hero_headline.clone(),
            hero_subheadline: self.hero_subheadline.clone(),
            show_products_section: Some(self.show_products_section),
            expected_version: None,
            images: ImageSubmission::Layout(layout),
            files,
        })
    }

    /// Leave `Submitting` and record the outcome
    ///
    /// The working copy is not rebuilt from the response; server state shows
    /// up on the next `load`.
    pub fn finish_submit(&mut self, outcome: &SiteResult<HomeSettings>) {
        self.state = EditorState::Idle;
        self.notice = Some(match outcome {
            Ok(_) => Notice::Saved,
            Err(e) => {
                tracing::warn!("Saving home settings failed: {}", e);
                Notice::Failed("Saving failed. Please try again.".to_string())
            }
        });
    }

    /// Submit through `action`, suspending edits for the round trip
    pub async fn submit<A>(&mut self, action: &A) -> SiteResult<HomeSettings>
    where
        A: HomeSettingsAction + ?Sized,
    {
        let submission = self.begin_submit()?;
        let mut guard = SubmitGuard { editor: self };
        let outcome = action.update_home_settings(submission).await;
        guard.editor.finish_submit(&outcome);
        outcome
    }

    /// Abandon an in-flight submit without recording an outcome
    ///
    /// The working copy is untouched. Does nothing when idle.
    pub fn cancel_submit(&mut self) {
        if self.state == EditorState::Submitting {
            tracing::debug!("Home settings submit abandoned");
            self.state = EditorState::Idle;
        }
    }

    fn ensure_idle(&self) -> SiteResult<()> {
        match self.state {
            EditorState::Idle => Ok(()),
            EditorState::Submitting => Err(SiteError::EditorBusy),
        }
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_slot_id;
        self.next_slot_id += 1;
        id
    }
}

/// Returns the editor to `Idle` if a submit future is dropped mid-flight
struct SubmitGuard<'a> {
    editor: &'a mut SettingsEditor,
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.editor.cancel_submit();
    }
}

fn preview_data_uri(file: &PendingFile) -> String {
    format!("data:{};base64,{}", file.content_type, STANDARD.encode(&file.data))
}
