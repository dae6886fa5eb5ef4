use std::sync::Arc;
use std::time::Duration;

use gpui::{
    Context, Entity, IntoElement, Render, SharedString, Subscription, Task, Timer, Window, div,
    img, prelude::*, px,
};
use gpui_component::{
    Disableable,
    button::{Button, ButtonVariants as _},
    input::{Input, InputEvent, InputState},
    label::Label,
    scroll::ScrollableElement,
};
use rand::Rng;

use pictor::app::{
    BatchJobManager, DownloadJobManager, DownloadUpdate, SlotJobState, SlotUpdate, ThemeController,
};
use pictor::domain::AspectRatio;

use super::backend::build_gallery_backend;
use super::request::BatchSubmissionModel;
use super::state::{GallerySlot, GallerySlotState, gallery_status_label, render_image_source};
use super::theme::{PictorTheme, apply_theme_mode};
use super::utils::{
    display_file_name_from_path, log_batch_submission, log_download_failure, log_download_saved,
    log_slot_failure,
};
use super::{
    ASPECT_RATIO_CHOICES, DOWNLOAD_FAILED_NOTICE, EXAMPLE_PROMPTS, GALLERY_SLOT_WIDTH_PX,
    GENERATE_REENABLE_MS, IMAGE_COUNT_CHOICES, JOB_UPDATE_POLL_INTERVAL_MS, NOTICE_DISMISS_MS,
    PROMPT_PLACEHOLDER, PROMPT_TYPING_INTERVAL_MS, SLOT_FAILED_GLYPH, SLOT_LOADING_MESSAGE,
};

pub(super) struct PictorMainWindow {
    prompt_input: Entity<InputState>,
    _prompt_input_subscription: Subscription,
    submission_model: BatchSubmissionModel,
    batch_manager: Arc<BatchJobManager>,
    download_manager: Arc<DownloadJobManager>,
    theme_controller: ThemeController,
    slots: Vec<GallerySlot>,
    active_batch_id: Option<u64>,
    batch_aspect_ratio: AspectRatio,
    generate_locked: bool,
    prompt_typing_active: bool,
    pending_downloads: usize,
    validation_error: Option<String>,
    notice: Option<String>,
    notice_serial: u64,
    startup_notice: Option<String>,
    _update_poll_task: Task<()>,
    _generate_unlock_task: Task<()>,
    _prompt_typing_task: Task<()>,
    _notice_dismiss_task: Task<()>,
}

impl PictorMainWindow {
    pub(super) fn new(
        theme_controller: ThemeController,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let prompt_input =
            cx.new(|cx| InputState::new(window, cx).placeholder(PROMPT_PLACEHOLDER));
        let prompt_input_subscription =
            cx.subscribe_in(&prompt_input, window, Self::on_prompt_input_event);

        let backend = build_gallery_backend();

        Self {
            prompt_input,
            _prompt_input_subscription: prompt_input_subscription,
            submission_model: BatchSubmissionModel::new(),
            batch_manager: backend.batch_manager,
            download_manager: backend.download_manager,
            theme_controller,
            slots: Vec::new(),
            active_batch_id: None,
            batch_aspect_ratio: AspectRatio::square(),
            generate_locked: false,
            prompt_typing_active: false,
            pending_downloads: 0,
            validation_error: None,
            notice: None,
            notice_serial: 0,
            startup_notice: backend.startup_notice,
            _update_poll_task: Task::ready(()),
            _generate_unlock_task: Task::ready(()),
            _prompt_typing_task: Task::ready(()),
            _notice_dismiss_task: Task::ready(()),
        }
    }

    fn on_prompt_input_event(
        &mut self,
        _state: &Entity<InputState>,
        event: &InputEvent,
        _window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        if matches!(event, InputEvent::Change) && self.validation_error.take().is_some() {
            cx.notify();
        }
    }

    fn on_generate_clicked(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        if self.generate_locked {
            return;
        }
        self.validation_error = None;

        let prompt = self.prompt_input.read(cx).value().to_string();
        let request = match self.submission_model.prepare_request(&prompt) {
            Ok(request) => request,
            Err(error) => {
                self.validation_error = Some(error.user_message());
                self.prompt_input
                    .update(cx, |input, cx| input.focus(window, cx));
                cx.notify();
                return;
            }
        };

        let aspect_ratio = request.aspect_ratio;
        let image_count = usize::from(request.image_count);
        log_batch_submission(&request);

        match self.batch_manager.submit_batch(request) {
            Ok(batch_id) => {
                // The whole gallery is replaced atomically before any update
                // from the new batch can arrive.
                self.active_batch_id = Some(batch_id);
                self.batch_aspect_ratio = aspect_ratio;
                self.slots = (0..image_count).map(GallerySlot::loading).collect();
                self.lock_generate_for_issuance(window, cx);
                self.start_update_polling(window, cx);
            }
            Err(error) => {
                self.validation_error = Some(error.user_message());
            }
        }

        cx.notify();
    }

    /// The submit control stays disabled for a fixed window from batch
    /// launch; slots may still be loading or retrying after it re-enables.
    fn lock_generate_for_issuance(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.generate_locked = true;
        self._generate_unlock_task = cx.spawn_in(window, async move |view, window| {
            Timer::after(Duration::from_millis(GENERATE_REENABLE_MS)).await;
            let _ = view.update_in(window, |view, _window, cx| {
                view.generate_locked = false;
                cx.notify();
            });
        });
    }

    fn start_update_polling(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self._update_poll_task = cx.spawn_in(window, async move |view, window| {
            loop {
                Timer::after(Duration::from_millis(JOB_UPDATE_POLL_INTERVAL_MS)).await;
                let keep_polling =
                    match view.update_in(window, |view, window, cx| view.poll_updates(window, cx)) {
                        Ok(keep_polling) => keep_polling,
                        Err(_) => break,
                    };

                if !keep_polling {
                    break;
                }
            }
        });
    }

    fn poll_updates(&mut self, window: &mut Window, cx: &mut Context<Self>) -> bool {
        let mut changed = false;

        for update in self.batch_manager.drain_updates() {
            changed |= self.apply_slot_update(update);
        }
        for update in self.download_manager.drain_updates() {
            self.apply_download_update(update, window, cx);
            changed = true;
        }

        if changed {
            cx.notify();
        }

        self.slots.iter().any(|slot| !slot.is_terminal()) || self.pending_downloads > 0
    }

    fn apply_slot_update(&mut self, update: SlotUpdate) -> bool {
        // Updates tagged with a superseded batch id are orphans and no-op.
        if self.active_batch_id != Some(update.batch_id) {
            return false;
        }
        let Some(slot) = self.slots.get_mut(update.slot_index) else {
            return false;
        };
        if slot.is_terminal() {
            return false;
        }

        match update.state {
            SlotJobState::Loading => false,
            SlotJobState::Succeeded => {
                let Some(image) = update.image else {
                    return false;
                };
                slot.state = GallerySlotState::Succeeded {
                    image: render_image_source(&image),
                    image_url: image.url,
                };
                true
            }
            SlotJobState::Failed => {
                log_slot_failure(update.slot_index, update.error.as_ref());
                *slot = GallerySlot::failed(update.slot_index);
                true
            }
        }
    }

    fn apply_download_update(
        &mut self,
        update: DownloadUpdate,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        self.pending_downloads = self.pending_downloads.saturating_sub(1);
        match update.outcome {
            Ok(path) => {
                log_download_saved(&path);
                self.show_notice(
                    format!("Saved {}", display_file_name_from_path(&path)),
                    window,
                    cx,
                );
            }
            Err(error) => {
                log_download_failure(&update.label, &error);
                self.show_notice(DOWNLOAD_FAILED_NOTICE.to_string(), window, cx);
            }
        }
    }

    fn on_download_clicked(&mut self, index: usize, window: &mut Window, cx: &mut Context<Self>) {
        let Some(slot) = self.slots.get(index) else {
            return;
        };
        let GallerySlotState::Succeeded { image_url, .. } = &slot.state else {
            return;
        };

        let label = self.prompt_input.read(cx).value().to_string();
        match self
            .download_manager
            .submit_download(image_url.clone(), label)
        {
            Ok(()) => {
                self.pending_downloads += 1;
                self.start_update_polling(window, cx);
            }
            Err(error) => {
                log_download_failure("download submission", &error);
                self.show_notice(DOWNLOAD_FAILED_NOTICE.to_string(), window, cx);
            }
        }
        cx.notify();
    }

    fn on_random_prompt_clicked(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        if self.prompt_typing_active {
            return;
        }

        let prompt =
            EXAMPLE_PROMPTS[rand::thread_rng().gen_range(0..EXAMPLE_PROMPTS.len())].to_string();

        self.prompt_typing_active = true;
        self.prompt_input.update(cx, |input, cx| {
            input.set_value("", window, cx);
            input.focus(window, cx);
        });

        self._prompt_typing_task = cx.spawn_in(window, async move |view, window| {
            let mut typed = String::new();
            for ch in prompt.chars() {
                Timer::after(Duration::from_millis(PROMPT_TYPING_INTERVAL_MS)).await;
                typed.push(ch);
                let text = typed.clone();
                let updated = view.update_in(window, |view, window, cx| {
                    view.prompt_input
                        .update(cx, |input, cx| input.set_value(text, window, cx));
                });
                if updated.is_err() {
                    return;
                }
            }

            let _ = view.update_in(window, |view, _window, cx| {
                view.prompt_typing_active = false;
                cx.notify();
            });
        });
        cx.notify();
    }

    fn on_theme_toggle_clicked(&mut self, cx: &mut Context<Self>) {
        let mode = self.theme_controller.toggle();
        apply_theme_mode(mode, cx);
        cx.notify();
    }

    fn on_image_count_selected(&mut self, count: u8, cx: &mut Context<Self>) {
        if self.submission_model.image_count() != count {
            self.submission_model.set_image_count(count);
            cx.notify();
        }
    }

    fn on_aspect_ratio_selected(&mut self, choice: &'static str, cx: &mut Context<Self>) {
        if self.submission_model.aspect_ratio_choice() != choice {
            self.submission_model.set_aspect_ratio(choice);
            cx.notify();
        }
    }

    fn show_notice(&mut self, message: String, window: &mut Window, cx: &mut Context<Self>) {
        self.notice = Some(message);
        self.notice_serial = self.notice_serial.wrapping_add(1);
        let serial = self.notice_serial;
        self._notice_dismiss_task = cx.spawn_in(window, async move |view, window| {
            Timer::after(Duration::from_millis(NOTICE_DISMISS_MS)).await;
            let _ = view.update_in(window, |view, _window, cx| {
                if view.notice_serial == serial && view.notice.take().is_some() {
                    cx.notify();
                }
            });
        });
    }

    fn image_count_button_id(count: u8) -> &'static str {
        match count {
            1 => "image-count-1",
            2 => "image-count-2",
            3 => "image-count-3",
            4 => "image-count-4",
            _ => "image-count",
        }
    }

    fn aspect_ratio_button_id(choice: &str) -> &'static str {
        match choice {
            "1/1" => "aspect-ratio-1-1",
            "16/9" => "aspect-ratio-16-9",
            "9/16" => "aspect-ratio-9-16",
            "3/2" => "aspect-ratio-3-2",
            "4/3" => "aspect-ratio-4-3",
            _ => "aspect-ratio",
        }
    }

    fn image_count_button(&self, count: u8, cx: &mut Context<Self>) -> Button {
        let button = Button::new(Self::image_count_button_id(count))
            .label(count.to_string())
            .on_click(cx.listener(move |this, _, _window, cx| {
                this.on_image_count_selected(count, cx)
            }));
        if self.submission_model.image_count() == count {
            button.primary()
        } else {
            button
        }
    }

    fn aspect_ratio_button(&self, choice: &'static str, cx: &mut Context<Self>) -> Button {
        let button = Button::new(Self::aspect_ratio_button_id(choice))
            .label(choice)
            .on_click(cx.listener(move |this, _, _window, cx| {
                this.on_aspect_ratio_selected(choice, cx)
            }));
        if self.submission_model.aspect_ratio_choice() == choice {
            button.primary()
        } else {
            button
        }
    }

    fn slot_image_height(&self) -> f32 {
        GALLERY_SLOT_WIDTH_PX * self.batch_aspect_ratio.height() as f32
            / self.batch_aspect_ratio.width() as f32
    }

    fn render_gallery_slot(
        &self,
        slot: &GallerySlot,
        theme: &PictorTheme,
        cx: &mut Context<Self>,
    ) -> impl IntoElement + use<> {
        let colors = theme.colors;
        let image_height = self.slot_image_height();
        let index = slot.index;

        let body = match &slot.state {
            GallerySlotState::Loading => div()
                .w_full()
                .h(px(image_height))
                .flex()
                .items_center()
                .justify_center()
                .bg(colors.input_background)
                .child(
                    div()
                        .text_color(colors.muted_foreground)
                        .child(SLOT_LOADING_MESSAGE),
                ),
            GallerySlotState::Succeeded { image, .. } => div()
                .w_full()
                .h(px(image_height))
                .overflow_hidden()
                .child(img(image.clone()).w_full().h_full()),
            GallerySlotState::Failed { message } => div()
                .w_full()
                .h(px(image_height))
                .flex()
                .flex_col()
                .items_center()
                .justify_center()
                .gap_1()
                .bg(colors.input_background)
                .child(
                    div()
                        .text_color(colors.warning_foreground)
                        .child(SLOT_FAILED_GLYPH),
                )
                .child(div().text_color(colors.error_foreground).child(message.clone())),
        };

        let footer = div()
            .flex()
            .items_center()
            .justify_between()
            .p_2()
            .child(
                div()
                    .text_color(colors.muted_foreground)
                    .child(format!("Image {}", index + 1)),
            )
            .children(
                matches!(slot.state, GallerySlotState::Succeeded { .. }).then(|| {
                    Button::new(SharedString::from(format!("slot-download-{index}")))
                        .label("Download")
                        .on_click(cx.listener(move |this, _, window, cx| {
                            this.on_download_clicked(index, window, cx)
                        }))
                }),
            );

        div()
            .w(px(GALLERY_SLOT_WIDTH_PX))
            .flex()
            .flex_col()
            .border_1()
            .border_color(colors.panel_border)
            .bg(colors.panel_background)
            .child(body)
            .child(footer)
    }
}

impl Render for PictorMainWindow {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.global::<PictorTheme>().clone();
        let colors = theme.colors;
        let generating = self.generate_locked;
        let dark = self.theme_controller.mode().is_dark();
        let status_line = gallery_status_label(&self.slots);

        let count_buttons: Vec<Button> = IMAGE_COUNT_CHOICES
            .iter()
            .map(|count| self.image_count_button(*count, cx))
            .collect();
        let ratio_buttons: Vec<Button> = ASPECT_RATIO_CHOICES
            .iter()
            .map(|choice| self.aspect_ratio_button(*choice, cx))
            .collect();
        let gallery_slots: Vec<_> = self
            .slots
            .iter()
            .map(|slot| self.render_gallery_slot(slot, &theme, cx))
            .collect();

        div()
            .size_full()
            .overflow_y_scrollbar()
            .overflow_x_hidden()
            .flex()
            .flex_col()
            .gap(theme.spacing.section_gap)
            .p(theme.spacing.window_padding)
            .bg(colors.surface_background)
            .text_color(colors.surface_foreground)
            .child(
                div()
                    .flex()
                    .items_center()
                    .justify_between()
                    .child(Label::new("Pictor AI Image Studio"))
                    .child(
                        Button::new("theme-toggle-button")
                            .label(if dark { "Light Mode" } else { "Dark Mode" })
                            .on_click(cx.listener(|this, _, _window, cx| {
                                this.on_theme_toggle_clicked(cx)
                            })),
                    ),
            )
            .child(Label::new("Prompt"))
            .child(
                div()
                    .flex()
                    .items_center()
                    .gap_2()
                    .child(div().flex_grow().child(Input::new(&self.prompt_input)))
                    .child(
                        Button::new("prompt-suggestion-button")
                            .label("Surprise Me")
                            .disabled(self.prompt_typing_active)
                            .on_click(cx.listener(|this, _, window, cx| {
                                this.on_random_prompt_clicked(window, cx)
                            })),
                    ),
            )
            .child(
                div()
                    .flex()
                    .flex_col()
                    .gap_2()
                    .p(theme.spacing.panel_padding)
                    .border_1()
                    .border_color(colors.panel_border)
                    .bg(colors.panel_background)
                    .child(
                        div()
                            .flex()
                            .items_center()
                            .gap_2()
                            .child(div().text_color(colors.muted_foreground).child("Images"))
                            .children(count_buttons),
                    )
                    .child(
                        div()
                            .flex()
                            .items_center()
                            .gap_2()
                            .child(
                                div()
                                    .text_color(colors.muted_foreground)
                                    .child("Aspect Ratio"),
                            )
                            .children(ratio_buttons),
                    ),
            )
            .child(
                div()
                    .flex()
                    .items_center()
                    .justify_between()
                    .gap_3()
                    .child(
                        Button::new("generate-button")
                            .primary()
                            .label(if generating {
                                "Generating..."
                            } else {
                                "Generate Images"
                            })
                            .loading(generating)
                            .disabled(generating)
                            .on_click(cx.listener(|this, _, window, cx| {
                                this.on_generate_clicked(window, cx)
                            })),
                    )
                    .children(status_line.map(|status| {
                        div().text_color(colors.accent_foreground).child(status)
                    })),
            )
            .children(self.validation_error.iter().map(|message| {
                div()
                    .text_color(colors.error_foreground)
                    .child(format!("Validation: {message}"))
            }))
            .children(self.notice.iter().map(|message| {
                div()
                    .text_color(colors.warning_foreground)
                    .child(message.clone())
            }))
            .children(self.startup_notice.iter().map(|notice| {
                div()
                    .text_color(colors.accent_foreground)
                    .child(format!("Backend: {notice}"))
            }))
            .child(
                div()
                    .flex()
                    .flex_row()
                    .flex_wrap()
                    .gap_3()
                    .children(gallery_slots),
            )
    }
}
