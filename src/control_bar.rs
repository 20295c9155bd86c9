use egui::{
    pos2, vec2, Align2, Color32, CornerRadius, FontId, Rect, Response, Sense, Shape, Stroke, Ui,
};
use std::cell::RefCell;
use std::rc::Rc;

use crate::draggable::{DragOptions, Draggable, MoveResponse};
use crate::surface::{Element, Surface};
use crate::time::format_time;

/// Notifications from the host video, in the order they happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoEvent {
    /// The duration became known or changed
    DurationChange,
    /// The playback position moved
    TimeUpdate,
    /// Playback started
    Play,
    /// Playback paused
    Pause,
}

/// The video a [`VideoControlBar`] controls.
pub trait Playback {
    /// Start playback. Hosts may refuse, e.g. when autoplay is blocked.
    fn play(&mut self) -> anyhow::Result<()>;

    fn pause(&mut self);

    /// Playback position in seconds
    fn current_time(&self) -> f64;

    /// Seek to a position in seconds
    fn set_current_time(&mut self, seconds: f64);

    /// Length in seconds, NaN while unknown
    fn duration(&self) -> f64;

    /// Pop the next pending [`VideoEvent`]
    fn poll_event(&mut self) -> Option<VideoEvent>;
}

/// Configurable look of a [`VideoControlBar`].
#[derive(Debug, Clone)]
pub struct ControlBarOptions {
    /// Distance from the left, right and bottom edges of the frame
    pub margin: f32,
    /// Bar height
    pub height: f32,
    /// Bar fill
    pub background: Color32,
    /// Corner rounding of the bar
    pub corner_radius: u8,
    /// Time labels and play glyph
    pub text_color: Color32,
    /// Size of the time labels
    pub font_size: f32,
    /// Width of the play/pause button
    pub play_control_width: f32,
    /// Width of the elapsed time label
    pub current_time_width: f32,
    /// Width of the duration label
    pub duration_width: f32,
    /// Unplayed part of the progress track
    pub track_color: Color32,
    /// Played part of the progress track and the knob
    pub fill_color: Color32,
    /// Thickness of the progress track
    pub track_height: f32,
    /// Radius of the progress knob
    pub knob_radius: f32,
}

impl Default for ControlBarOptions {
    fn default() -> Self {
        Self {
            margin: 20.,
            height: 40.,
            background: Color32::from_black_alpha(128),
            corner_radius: 2,
            text_color: Color32::WHITE,
            font_size: 14.,
            play_control_width: 40.,
            current_time_width: 50.,
            duration_width: 60.,
            track_color: Color32::from_rgb(0x81, 0x8a, 0x95),
            fill_color: Color32::WHITE,
            track_height: 2.,
            knob_radius: 5.,
        }
    }
}

/// What the bar shows.
#[derive(Debug, Clone, PartialEq)]
pub struct BarState {
    /// Whether the play glyph is shown
    pub paused: bool,
    /// Elapsed time label
    pub current_time: String,
    /// Duration label
    pub total_time: String,
    /// Played fraction, 0 to 1
    pub progress: f64,
    /// A drag moved the progress since the last press
    pub dragged: bool,
}

impl Default for BarState {
    fn default() -> Self {
        Self {
            paused: true,
            current_time: format_time(0.),
            total_time: format_time(0.),
            progress: 0.,
            dragged: false,
        }
    }
}

impl BarState {
    /// Update from one video event, given the video's position and duration
    /// at the time it is handled.
    pub fn apply(&mut self, event: VideoEvent, current_time: f64, duration: f64) {
        match event {
            VideoEvent::DurationChange => self.total_time = format_time(duration),
            VideoEvent::TimeUpdate => {
                self.current_time = format_time(current_time);
                self.progress = if duration.is_finite() && duration > 0. {
                    (current_time / duration).clamp(0., 1.)
                } else {
                    0.
                };
            }
            VideoEvent::Play => self.paused = false,
            VideoEvent::Pause => self.paused = true,
        }
    }

    /// Move the progress by a horizontal drag of `delta_x` over a track
    /// `width` wide. Returns the new progress.
    pub fn drag_progress(&mut self, delta_x: f32, width: f32) -> Option<f64> {
        if !(width.is_finite() && width > 0.) {
            return None;
        }
        self.progress = (self.progress + f64::from(delta_x / width)).clamp(0., 1.);
        self.dragged = true;
        Some(self.progress)
    }

    /// Jump to a click `click_x` from the left of a track `width` wide.
    /// Ignored right after a drag.
    pub fn jump_progress(&mut self, click_x: f32, width: f32) -> Option<f64> {
        if self.dragged || !(width.is_finite() && width > 0.) {
            return None;
        }
        self.progress = f64::from(click_x / width).clamp(0., 1.);
        Some(self.progress)
    }
}

fn seek(video: &mut impl Playback, progress: f64) {
    let duration = video.duration();
    if duration.is_finite() && duration > 0. {
        video.set_current_time(progress * duration);
    } else {
        log::debug!("seek to {} ignored, duration unknown", progress);
    }
}

/// Play/pause toggle, elapsed and total time, and a progress track that can
/// be clicked or dragged to seek.
pub struct VideoControlBar<V: Playback + 'static> {
    video: Rc<RefCell<V>>,
    state: Rc<RefCell<BarState>>,
    /// Hit area of the progress track
    progress: Element,
    draggable: Option<Draggable>,
    options: ControlBarOptions,
}

impl<V: Playback + 'static> VideoControlBar<V> {
    /// Create the bar's elements on `surface` and start listening for drags
    /// on the progress track.
    pub fn mount(surface: &Surface, video: Rc<RefCell<V>>) -> Self {
        let state = Rc::new(RefCell::new(BarState::default()));
        let progress = surface.create_element(Rect::NOTHING);

        let start_state = state.clone();
        let move_state = state.clone();
        let move_video = video.clone();
        let track = progress.clone();
        let draggable = Draggable::new(
            &progress,
            DragOptions::default()
                .with_on_start(move |_| start_state.borrow_mut().dragged = false)
                .with_on_moving(move |m| {
                    let width = track.rect().width();
                    let progress = move_state.borrow_mut().drag_progress(m.delta.x, width);
                    if let Some(progress) = progress {
                        seek(&mut *move_video.borrow_mut(), progress);
                    }
                    // the track itself never moves
                    MoveResponse::Veto
                }),
        );
        log::debug!("control bar mounted, progress track {:?}", progress);

        Self {
            video,
            state,
            progress,
            draggable: Some(draggable),
            options: ControlBarOptions::default(),
        }
    }

    /// Replace the default look.
    pub fn with_options(mut self, options: ControlBarOptions) -> Self {
        self.options = options;
        self
    }

    /// The current look.
    pub fn options(&self) -> &ControlBarOptions {
        &self.options
    }

    /// Snapshot of what the bar currently shows.
    pub fn state(&self) -> BarState {
        self.state.borrow().clone()
    }

    /// The controlled video.
    pub fn video(&self) -> &Rc<RefCell<V>> {
        &self.video
    }

    /// The element covering the progress track.
    pub fn progress_element(&self) -> &Element {
        &self.progress
    }

    /// Drain pending video events into the bar state.
    pub fn process_events(&self) {
        loop {
            let event = self.video.borrow_mut().poll_event();
            let Some(event) = event else {
                break;
            };
            let (current_time, duration) = {
                let video = self.video.borrow();
                (video.current_time(), video.duration())
            };
            self.state.borrow_mut().apply(event, current_time, duration);
        }
    }

    /// Play when paused, pause otherwise. The displayed state follows once
    /// the video reports [`VideoEvent::Play`] or [`VideoEvent::Pause`].
    pub fn toggle_playback(&self) {
        let paused = self.state.borrow().paused;
        let mut video = self.video.borrow_mut();
        if paused {
            if let Err(e) = video.play() {
                log::warn!("failed to start playback: {:#}", e);
            }
        } else {
            video.pause();
        }
    }

    /// Seek to the position under a click at horizontal screen position `x`.
    pub fn jump_to(&self, x: f32) {
        let track = self.progress.rect();
        let progress = self
            .state
            .borrow_mut()
            .jump_progress(x - track.left(), track.width());
        if let Some(progress) = progress {
            seek(&mut *self.video.borrow_mut(), progress);
        }
    }

    /// Lay out and paint the bar along the bottom of `frame_rect`.
    ///
    /// Pointer drags on the track arrive through the [`Surface`] the bar was
    /// mounted on, so feed it input before calling this.
    pub fn ui(&mut self, ui: &mut Ui, frame_rect: Rect) -> Response {
        self.process_events();

        let o = &self.options;
        let bar_rect = Rect::from_min_max(
            pos2(frame_rect.left() + o.margin, frame_rect.bottom() - o.margin - o.height),
            pos2(frame_rect.right() - o.margin, frame_rect.bottom() - o.margin),
        );
        let play_rect = Rect::from_min_size(bar_rect.min, vec2(o.play_control_width, o.height));
        let current_rect =
            Rect::from_min_size(play_rect.right_top(), vec2(o.current_time_width, o.height));
        let duration_rect =
            Rect::from_min_max(pos2(bar_rect.right() - o.duration_width, bar_rect.top()), bar_rect.max);
        let progress_rect = Rect::from_min_max(current_rect.right_top(), duration_rect.left_bottom());
        self.progress.set_rect(progress_rect);

        let id = ui.id().with(("video_control_bar", self.progress.id()));
        let bar_response = ui.interact(bar_rect, id, Sense::hover());
        let play_response = ui.interact(play_rect, id.with("play_control"), Sense::click());
        let progress_response = ui.interact(progress_rect, id.with("progress"), Sense::click());

        if play_response.clicked() {
            self.toggle_playback();
        }
        if progress_response.clicked() {
            if let Some(pos) = progress_response.interact_pointer_pos() {
                self.jump_to(pos.x);
            }
        }

        self.paint(ui, bar_rect, play_rect, current_rect, progress_rect, duration_rect);
        bar_response
    }

    fn paint(
        &self,
        ui: &Ui,
        bar_rect: Rect,
        play_rect: Rect,
        current_rect: Rect,
        progress_rect: Rect,
        duration_rect: Rect,
    ) {
        let o = &self.options;
        let state = self.state.borrow();
        let painter = ui.painter();
        let rounding = CornerRadius::same(o.corner_radius);
        let font_id = FontId::proportional(o.font_size);

        painter.rect_filled(bar_rect, rounding, o.background);

        let c = play_rect.center();
        if state.paused {
            painter.add(Shape::convex_polygon(
                vec![c + vec2(-5., -8.), c + vec2(7., 0.), c + vec2(-5., 8.)],
                o.text_color,
                Stroke::NONE,
            ));
        } else {
            for dx in [-3., 3.] {
                painter.rect_filled(
                    Rect::from_center_size(c + vec2(dx, 0.), vec2(2., 15.)),
                    CornerRadius::ZERO,
                    o.text_color,
                );
            }
        }

        painter.text(
            current_rect.left_center(),
            Align2::LEFT_CENTER,
            &state.current_time,
            font_id.clone(),
            o.text_color,
        );
        painter.text(
            duration_rect.center(),
            Align2::CENTER_CENTER,
            &state.total_time,
            font_id,
            o.text_color,
        );

        let track_rect = Rect::from_center_size(
            progress_rect.center(),
            vec2(progress_rect.width(), o.track_height),
        );
        let mut fill_rect = track_rect;
        fill_rect.set_right(track_rect.left() + track_rect.width() * state.progress as f32);

        painter.rect_filled(track_rect, rounding, o.track_color);
        painter.rect_filled(fill_rect, rounding, o.fill_color);
        painter.circle_filled(
            fill_rect.right_center() + vec2(o.knob_radius, 0.),
            o.knob_radius,
            o.fill_color,
        );
    }

    /// Stop listening for input and remove the bar's elements.
    pub fn unmount(&mut self) {
        if let Some(mut draggable) = self.draggable.take() {
            draggable.destroy();
            if let Some(surface) = self.progress.surface() {
                surface.remove_element(self.progress.id());
            }
            log::debug!("control bar unmounted");
        }
    }
}

impl<V: Playback + 'static> Drop for VideoControlBar<V> {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Capabilities;
    use egui::{Event, Modifiers, PointerButton};
    use std::collections::VecDeque;

    #[derive(Default)]
    struct FakeVideo {
        time: f64,
        duration: f64,
        playing: bool,
        block_autoplay: bool,
        events: VecDeque<VideoEvent>,
    }

    impl FakeVideo {
        fn with_duration(duration: f64) -> Self {
            let mut video = Self {
                duration,
                ..Default::default()
            };
            video.events.push_back(VideoEvent::DurationChange);
            video
        }
    }

    impl Playback for FakeVideo {
        fn play(&mut self) -> anyhow::Result<()> {
            if self.block_autoplay {
                anyhow::bail!("autoplay blocked");
            }
            self.playing = true;
            self.events.push_back(VideoEvent::Play);
            Ok(())
        }

        fn pause(&mut self) {
            self.playing = false;
            self.events.push_back(VideoEvent::Pause);
        }

        fn current_time(&self) -> f64 {
            self.time
        }

        fn set_current_time(&mut self, seconds: f64) {
            self.time = seconds;
            self.events.push_back(VideoEvent::TimeUpdate);
        }

        fn duration(&self) -> f64 {
            self.duration
        }

        fn poll_event(&mut self) -> Option<VideoEvent> {
            self.events.pop_front()
        }
    }

    fn mounted(video: FakeVideo) -> (Surface, VideoControlBar<FakeVideo>) {
        let surface = Surface::with_capabilities(Capabilities::mouse());
        let bar = VideoControlBar::mount(&surface, Rc::new(RefCell::new(video)));
        bar.progress_element()
            .set_rect(Rect::from_min_max(pos2(100., 0.), pos2(300., 40.)));
        (surface, bar)
    }

    fn press(surface: &Surface, x: f32, pressed: bool) {
        surface.handle_egui_event(&Event::PointerButton {
            pos: pos2(x, 20.),
            button: PointerButton::Primary,
            pressed,
            modifiers: Modifiers::default(),
        });
    }

    #[test]
    fn starts_paused_at_zero() {
        let state = BarState::default();
        assert!(state.paused);
        assert_eq!(state.current_time, "00:00");
        assert_eq!(state.total_time, "00:00");
        assert_eq!(state.progress, 0.);
    }

    #[test]
    fn video_events_update_labels_and_progress() {
        let mut video = FakeVideo::with_duration(125.);
        video.time = 50.;
        video.events.push_back(VideoEvent::TimeUpdate);
        let (_surface, bar) = mounted(video);

        bar.process_events();
        let state = bar.state();
        assert_eq!(state.total_time, "02:05");
        assert_eq!(state.current_time, "00:50");
        assert_eq!(state.progress, 0.4);
    }

    #[test]
    fn time_update_without_duration_keeps_progress_at_zero() {
        let mut state = BarState::default();
        state.apply(VideoEvent::TimeUpdate, 12., f64::NAN);
        assert_eq!(state.progress, 0.);
        assert_eq!(state.current_time, "00:12");
    }

    #[test]
    fn toggle_follows_reported_state() {
        let (_surface, bar) = mounted(FakeVideo::with_duration(10.));
        bar.toggle_playback();
        assert!(bar.video().borrow().playing);
        assert!(bar.state().paused);

        bar.process_events();
        assert!(!bar.state().paused);

        bar.toggle_playback();
        bar.process_events();
        assert!(!bar.video().borrow().playing);
        assert!(bar.state().paused);
    }

    #[test]
    fn blocked_play_leaves_bar_paused() {
        let mut video = FakeVideo::with_duration(10.);
        video.block_autoplay = true;
        let (_surface, bar) = mounted(video);
        bar.toggle_playback();
        bar.process_events();
        assert!(bar.state().paused);
    }

    #[test]
    fn dragging_the_track_seeks_without_moving_it() {
        let (surface, bar) = mounted(FakeVideo::with_duration(100.));
        bar.process_events();

        press(&surface, 150., true);
        surface.handle_egui_event(&Event::PointerMoved(pos2(200., 20.)));
        assert_eq!(bar.state().progress, 0.25);
        assert_eq!(bar.video().borrow().time, 25.);
        assert!(bar.state().dragged);

        // far past the end of the track
        surface.handle_egui_event(&Event::PointerMoved(pos2(900., 20.)));
        assert_eq!(bar.state().progress, 1.);
        assert_eq!(bar.progress_element().computed_transform(), "none");

        // the click that ends the drag must not jump
        press(&surface, 900., false);
        bar.jump_to(120.);
        assert_eq!(bar.state().progress, 1.);
    }

    #[test]
    fn click_jumps_after_a_fresh_press() {
        let (surface, bar) = mounted(FakeVideo::with_duration(60.));
        press(&surface, 150., true);
        press(&surface, 150., false);
        bar.jump_to(150.);
        assert_eq!(bar.state().progress, 0.25);
        assert_eq!(bar.video().borrow().time, 15.);
    }

    #[test]
    fn drag_progress_stays_in_range() {
        let mut state = BarState::default();
        assert_eq!(state.drag_progress(-50., 100.), Some(0.));
        assert_eq!(state.drag_progress(500., 100.), Some(1.));
        assert_eq!(state.drag_progress(10., 0.), None);
    }

    #[test]
    fn unmount_releases_surface() {
        let (surface, mut bar) = mounted(FakeVideo::with_duration(60.));
        let track = bar.progress_element().id();
        bar.unmount();
        assert_eq!(surface.listener_count(), 0);
        assert_eq!(surface.element_at(pos2(150., 20.)), None);
        assert_eq!(bar.progress_element().rect(), Rect::NOTHING);
        assert_eq!(bar.progress_element().id(), track);
    }

    #[test]
    fn ui_lays_out_track_between_labels() {
        let (_surface, mut bar) = mounted(FakeVideo::with_duration(60.));
        let ctx = egui::Context::default();
        let screen = Rect::from_min_size(pos2(0., 0.), vec2(800., 600.));
        let input = egui::RawInput {
            screen_rect: Some(screen),
            ..Default::default()
        };
        let _ = ctx.run(input, |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                bar.ui(ui, screen);
            });
        });

        let track = bar.progress_element().rect();
        assert_eq!(track.left(), 20. + 40. + 50.);
        assert_eq!(track.right(), 800. - 20. - 60.);
        assert_eq!(track.bottom(), 600. - 20.);
        assert_eq!(track.height(), 40.);
    }
}
