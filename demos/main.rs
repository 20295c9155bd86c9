use eframe::NativeOptions;
use egui::{vec2, CentralPanel, Color32, CornerRadius, Rect, ViewportBuilder};
use egui_video_controls::{
    Bounds, DragOptions, Draggable, Element, Matrix, Playback, Surface, VideoControlBar,
    VideoEvent,
};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// A clock standing in for a decoded video.
struct SimulatedVideo {
    time: f64,
    duration: f64,
    playing: bool,
    events: VecDeque<VideoEvent>,
}

impl SimulatedVideo {
    fn new(duration: f64) -> Self {
        Self {
            time: 0.,
            duration,
            playing: false,
            events: VecDeque::from([VideoEvent::DurationChange, VideoEvent::TimeUpdate]),
        }
    }

    fn advance(&mut self, dt: f64) {
        if !self.playing {
            return;
        }
        self.time = (self.time + dt).min(self.duration);
        self.events.push_back(VideoEvent::TimeUpdate);
        if self.time >= self.duration {
            self.pause();
        }
    }
}

impl Playback for SimulatedVideo {
    fn play(&mut self) -> anyhow::Result<()> {
        if self.time >= self.duration {
            self.time = 0.;
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
        self.time = seconds.clamp(0., self.duration);
        self.events.push_back(VideoEvent::TimeUpdate);
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn poll_event(&mut self) -> Option<VideoEvent> {
        self.events.pop_front()
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let mut opt = NativeOptions::default();
    opt.viewport = ViewportBuilder::default().with_inner_size([1270.0, 740.0]);

    eframe::run_native("app", opt, Box::new(|_cc| Ok(Box::new(App::default()))))
        .map_err(|e| anyhow::anyhow!("{}", e))
}

struct App {
    surface: Surface,
    video: Rc<RefCell<SimulatedVideo>>,
    slide: Element,
    draggable: Draggable,
    bar: VideoControlBar<SimulatedVideo>,
}

impl Default for App {
    fn default() -> Self {
        let surface = Surface::new();
        let slide = surface.create_element(Rect::NOTHING);
        let bounds = Bounds {
            min_x: Some(-200.),
            max_x: Some(200.),
            min_y: Some(-150.),
            max_y: Some(150.),
        };
        let draggable = Draggable::new(
            &slide,
            DragOptions::default()
                .with_bounds(bounds)
                .with_on_end(|e| log::info!("slide dropped at {:?}", e.changed_contact_points)),
        );

        let video = Rc::new(RefCell::new(SimulatedVideo::new(95.)));
        let bar = VideoControlBar::mount(&surface, video.clone());

        Self {
            surface,
            video,
            slide,
            draggable,
            bar,
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.surface.process_egui_input(ctx);
        let dt = ctx.input(|i| i.stable_dt);
        self.video.borrow_mut().advance(f64::from(dt));

        CentralPanel::default().show(ctx, |ui| {
            if ui.button("reset slide").clicked() {
                self.draggable.reset();
            }
            let frame = ui.available_rect_before_wrap();

            let layout = Rect::from_center_size(frame.center(), vec2(320., 180.));
            let painted = Matrix::read(&self.slide).transform_rect(layout);
            self.slide.set_rect(painted);
            ui.painter()
                .rect_filled(painted, CornerRadius::same(4), Color32::from_rgb(40, 70, 110));

            self.bar.ui(ui, frame);
        });

        if self.video.borrow().playing || self.draggable.is_dragging() {
            ctx.request_repaint();
        }
    }
}
