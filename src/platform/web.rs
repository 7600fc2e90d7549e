//! Browser host
//!
//! Canvas surface and renderer, `performance.now()` clock, LocalStorage,
//! keyboard/focus listeners and the `requestAnimationFrame` loop. JavaScript
//! drives everything through [`WebGame`]. Listeners and the frame loop are
//! torn down exactly once, by [`WebGame::destroy`].

use std::cell::{Cell, RefCell};
use std::f64::consts::TAU;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, EventTarget, HtmlCanvasElement};

use super::{Clock, Surface};
use crate::audio::AudioManager;
use crate::engine::{
    Collaborators, Engine, EventQueue, Frame, GameEvents, Renderer, ScoreEvent,
};
use crate::persistence::LocalStorage;
use crate::settings::Settings;
use crate::sim::{Entity, GameState, GameStatus};
use crate::tuning::GameConfig;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialized".into());
    }
}

/// Canvas element as a drawable surface
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self { canvas }
    }

    fn context(&self) -> Option<CanvasRenderingContext2d> {
        self.canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
    }
}

impl Surface for CanvasSurface {
    fn has_context(&self) -> bool {
        self.context().is_some()
    }

    fn size(&self) -> Option<(f32, f32)> {
        let (w, h) = (self.canvas.width(), self.canvas.height());
        (w > 0 && h > 0).then_some((w as f32, h as f32))
    }
}

/// `performance.now()`, falling back to `Date.now()`
pub struct PerformanceClock {
    performance: Option<web_sys::Performance>,
}

impl Default for PerformanceClock {
    fn default() -> Self {
        Self {
            performance: web_sys::window().and_then(|w| w.performance()),
        }
    }
}

impl Clock for PerformanceClock {
    fn now_ms(&self) -> f64 {
        match &self.performance {
            Some(p) => p.now(),
            None => js_sys::Date::now(),
        }
    }
}

/// Vector-style line renderer
pub struct CanvasRenderer {
    ctx: CanvasRenderingContext2d,
}

impl CanvasRenderer {
    fn polygon(&self, points: impl Iterator<Item = (f64, f64)>) {
        self.ctx.begin_path();
        for (i, (x, y)) in points.enumerate() {
            if i == 0 {
                self.ctx.move_to(x, y);
            } else {
                self.ctx.line_to(x, y);
            }
        }
        self.ctx.close_path();
        self.ctx.stroke();
    }

    fn dot(&self, x: f64, y: f64, r: f64) {
        self.ctx.begin_path();
        let _ = self.ctx.arc(x, y, r.max(0.1), 0.0, TAU);
        self.ctx.fill();
    }

    fn entity(&self, entity: &Entity, ship_visible: bool) {
        match entity {
            Entity::Ship(ship) => {
                if !ship_visible {
                    return;
                }
                let (pos, rot, r) = (ship.body.pos, ship.body.rotation, ship.tuning.radius);
                let turn = glam::Vec2::from_angle(rot);
                let place = |&(x, y): &(f32, f32)| {
                    let p = pos + turn.rotate(glam::Vec2::new(x, y));
                    (p.x as f64, p.y as f64)
                };
                let hull = [
                    (r, 0.0),
                    (-r * 0.7, r * 0.6),
                    (-r * 0.4, 0.0),
                    (-r * 0.7, -r * 0.6),
                ];
                self.polygon(hull.iter().map(place));
                if ship.thrusting {
                    let flame = [(-r * 0.55, r * 0.3), (-r * 1.3, 0.0), (-r * 0.55, -r * 0.3)];
                    self.polygon(flame.iter().map(place));
                }
            }
            Entity::Asteroid(asteroid) => {
                let turn = glam::Vec2::from_angle(asteroid.body.rotation);
                let pos = asteroid.body.pos;
                self.polygon(asteroid.vertices.iter().map(|v| {
                    let p = pos + turn.rotate(*v);
                    (p.x as f64, p.y as f64)
                }));
            }
            Entity::Bullet(bullet) => {
                self.ctx.set_global_alpha(bullet.alpha() as f64);
                self.dot(bullet.body.pos.x as f64, bullet.body.pos.y as f64, 2.0);
                self.ctx.set_global_alpha(1.0);
            }
            Entity::Saucer(saucer) => {
                let (x, y) = (saucer.body.pos.x as f64, saucer.body.pos.y as f64);
                let r = saucer.class.radius as f64;
                let outline = [
                    (-r, 0.0),
                    (-r * 0.5, r * 0.4),
                    (r * 0.5, r * 0.4),
                    (r, 0.0),
                    (r * 0.5, -r * 0.35),
                    (-r * 0.5, -r * 0.35),
                ];
                self.polygon(outline.into_iter().map(|(dx, dy)| (x + dx, y + dy)));
            }
            Entity::Explosion(explosion) => {
                for p in &explosion.particles {
                    self.ctx.set_global_alpha(p.alpha() as f64);
                    self.ctx.set_fill_style_str(&format!("#{:06x}", p.color));
                    self.dot(p.pos.x as f64, p.pos.y as f64, p.size() as f64);
                }
                self.ctx.set_global_alpha(1.0);
                self.ctx.set_fill_style_str("#ffffff");
            }
        }
    }

    fn hud(&self, state: &GameState, width: f64, height: f64) {
        self.ctx.set_font("16px monospace");
        self.ctx.set_text_align("left");
        let _ = self.ctx.fill_text(&format!("SCORE {}", state.score), 12.0, 24.0);
        let _ = self
            .ctx
            .fill_text(&format!("HIGH {}", state.high_score), 12.0, 44.0);
        self.ctx.set_text_align("right");
        let _ = self.ctx.fill_text(
            &format!("LEVEL {}  LIVES {}", state.level, state.lives),
            width - 12.0,
            24.0,
        );

        let overlay = match state.status {
            GameStatus::Menu => Some("PRESS ENTER TO START".to_string()),
            GameStatus::Paused => Some("PAUSED".to_string()),
            GameStatus::Loading => Some(match state.last_level_bonus {
                Some(bonus) => format!("LEVEL {} CLEAR  +{}", state.level, bonus),
                None => format!("LEVEL {}", state.level + 1),
            }),
            GameStatus::GameOver => Some(format!("GAME OVER  {}  -  PRESS R", state.score)),
            GameStatus::Playing => None,
        };
        if let Some(text) = overlay {
            self.ctx.set_font("28px monospace");
            self.ctx.set_text_align("center");
            let _ = self.ctx.fill_text(&text, width / 2.0, height / 2.0);
        }
    }
}

impl Renderer for CanvasRenderer {
    fn render(&mut self, frame: &Frame<'_>) {
        let (w, h) = (frame.bounds.x as f64, frame.bounds.y as f64);
        self.ctx.set_fill_style_str("#000000");
        self.ctx.fill_rect(0.0, 0.0, w, h);
        self.ctx.set_stroke_style_str("#ffffff");
        self.ctx.set_fill_style_str("#ffffff");
        self.ctx.set_line_width(1.5);

        for entity in &frame.entities {
            self.entity(entity, frame.ship_visible);
        }
        self.hud(&frame.state, w, h);
    }
}

/// Calls optional functions on a JS object
#[derive(Clone)]
struct JsEvents {
    callbacks: JsValue,
}

impl JsEvents {
    fn call(&self, name: &str, args: &[JsValue]) {
        let Ok(func) = js_sys::Reflect::get(&self.callbacks, &JsValue::from_str(name)) else {
            return;
        };
        let Some(func) = func.dyn_ref::<js_sys::Function>() else {
            return;
        };
        let array: js_sys::Array = args.iter().collect();
        if let Err(e) = func.apply(&JsValue::NULL, &array) {
            log::warn!("{name} callback threw: {e:?}");
        }
    }
}

fn to_js<T: serde::Serialize>(value: &T) -> JsValue {
    serde_json::to_string(value)
        .ok()
        .and_then(|json| js_sys::JSON::parse(&json).ok())
        .unwrap_or(JsValue::NULL)
}

impl GameEvents for JsEvents {
    fn on_game_state_change(&mut self, state: &GameState) {
        self.call("onGameStateChange", &[to_js(state)]);
    }

    fn on_score_change(&mut self, score: u64, event: Option<ScoreEvent>) {
        let event = event.as_ref().map(to_js).unwrap_or(JsValue::NULL);
        self.call("onScoreChange", &[JsValue::from_f64(score as f64), event]);
    }

    fn on_lives_change(&mut self, lives: u32) {
        self.call("onLivesChange", &[JsValue::from(lives)]);
    }

    fn on_level_change(&mut self, level: u32) {
        self.call("onLevelChange", &[JsValue::from(level)]);
    }

    fn on_game_over(&mut self, final_score: u64) {
        self.call("onGameOver", &[JsValue::from_f64(final_score as f64)]);
    }
}

/// Engine plus its event queue; JS callbacks only run once the engine
/// borrow has ended, so they may call straight back into `WebGame`
#[derive(Clone)]
struct Host {
    engine: Rc<RefCell<Engine>>,
    queue: EventQueue,
    js: JsEvents,
}

impl Host {
    fn drive<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> R {
        let out = {
            let mut engine = self.engine.borrow_mut();
            f(&mut *engine)
        };
        self.queue.dispatch(&mut self.js.clone());
        out
    }
}

struct Listener {
    target: EventTarget,
    event: &'static str,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

impl Listener {
    fn attach(
        target: EventTarget,
        event: &'static str,
        handler: impl FnMut(web_sys::Event) + 'static,
    ) -> Option<Self> {
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
        target
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            .ok()?;
        Some(Self {
            target,
            event,
            closure,
        })
    }

    fn detach(&self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.closure.as_ref().unchecked_ref());
    }
}

/// Game handle exported to JavaScript
///
/// Closures stay owned here until the handle is freed, even after
/// `destroy`, since `destroy` may be called from inside one of them.
#[wasm_bindgen]
pub struct WebGame {
    host: Host,
    listeners: Vec<Listener>,
    frame_callback: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>,
    frame_handle: Rc<Cell<Option<i32>>>,
    stopped: Rc<Cell<bool>>,
}

#[wasm_bindgen]
impl WebGame {
    /// Attach to `<canvas id=canvas_id>`; `callbacks` may define
    /// `onGameStateChange`, `onScoreChange`, `onLivesChange`, `onLevelChange`
    /// and `onGameOver`. `config_json` optionally overrides gameplay tuning.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas_id: &str,
        callbacks: JsValue,
        config_json: Option<String>,
    ) -> Result<WebGame, JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
            .ok_or_else(|| JsValue::from_str(&format!("no canvas #{canvas_id}")))?;

        let config = match config_json {
            Some(json) => GameConfig::from_json(&json).map_err(|e| e.to_string())?,
            None => GameConfig::default(),
        };

        let queue = EventQueue::new();
        let surface = CanvasSurface::new(canvas);
        let settings = Settings::load(&LocalStorage);
        let mut collaborators = Collaborators::new(PerformanceClock::default())
            .with_events(queue.clone())
            .with_sound(AudioManager::new(&settings))
            .with_store(LocalStorage)
            .with_seed(js_sys::Date::now() as u64);
        if let Some(ctx) = surface.context() {
            collaborators = collaborators.with_renderer(CanvasRenderer { ctx });
        }

        let engine = Engine::new(&surface, collaborators, config).map_err(|e| e.to_string())?;
        let mut game = WebGame {
            host: Host {
                engine: Rc::new(RefCell::new(engine)),
                queue,
                js: JsEvents { callbacks },
            },
            listeners: Vec::new(),
            frame_callback: Rc::new(RefCell::new(None)),
            frame_handle: Rc::new(Cell::new(None)),
            stopped: Rc::new(Cell::new(false)),
        };
        game.attach_listeners(&window, &document);
        game.start_frame_loop();
        log::info!("Astro Drift attached to #{canvas_id}");
        Ok(game)
    }

    fn attach_listeners(&mut self, window: &web_sys::Window, document: &web_sys::Document) {
        let keydown = {
            let host = self.host.clone();
            Listener::attach(window.clone().into(), "keydown", move |event| {
                let Some(event) = event.dyn_ref::<web_sys::KeyboardEvent>() else {
                    return;
                };
                let key = event.key();
                if key == " " || key.starts_with("Arrow") {
                    event.prevent_default();
                }
                host.drive(|engine| engine.key_down(&key));
            })
        };
        let keyup = {
            let host = self.host.clone();
            Listener::attach(window.clone().into(), "keyup", move |event| {
                if let Some(event) = event.dyn_ref::<web_sys::KeyboardEvent>() {
                    host.drive(|engine| engine.key_up(&event.key()));
                }
            })
        };
        let blur = {
            let host = self.host.clone();
            Listener::attach(window.clone().into(), "blur", move |_| {
                host.drive(Engine::focus_lost);
            })
        };
        let visibility = {
            let host = self.host.clone();
            let doc = document.clone();
            Listener::attach(document.clone().into(), "visibilitychange", move |_| {
                if doc.visibility_state() == web_sys::VisibilityState::Hidden {
                    host.drive(Engine::focus_lost);
                }
            })
        };

        self.listeners
            .extend([keydown, keyup, blur, visibility].into_iter().flatten());
    }

    fn start_frame_loop(&mut self) {
        let host = self.host.clone();
        // Weak, so the closure does not keep itself alive
        let callback = Rc::downgrade(&self.frame_callback);
        let handle = self.frame_handle.clone();
        let stopped = self.stopped.clone();

        *self.frame_callback.borrow_mut() = Some(Closure::new(move |_time: f64| {
            handle.set(None);
            if stopped.get() {
                return;
            }
            host.drive(Engine::frame);
            // A callback may have destroyed the game
            if stopped.get() {
                return;
            }
            if let Some(cell) = callback.upgrade() {
                if let Some(next) = cell.borrow().as_ref() {
                    handle.set(request_frame(next));
                }
            }
        }));
        if let Some(first) = self.frame_callback.borrow().as_ref() {
            self.frame_handle.set(request_frame(first));
        }
    }

    pub fn start(&self) {
        self.host.drive(Engine::start);
    }

    pub fn pause(&self) {
        self.host.drive(Engine::pause);
    }

    pub fn resume(&self) {
        self.host.drive(Engine::resume);
    }

    pub fn restart(&self) {
        self.host.drive(Engine::restart);
    }

    /// Current `GameState` as a plain object
    #[wasm_bindgen(js_name = getGameState)]
    pub fn game_state(&self) -> JsValue {
        to_js(&self.host.engine.borrow().game_state())
    }

    /// Active entities plus state, for renderers living on the JS side
    pub fn snapshot(&self) -> JsValue {
        to_js(&self.host.engine.borrow().snapshot())
    }

    /// Stop the frame loop, remove listeners and drop pending timers
    ///
    /// Takes `&self` so an event callback may call it mid-dispatch.
    pub fn destroy(&self) {
        if self.stopped.replace(true) {
            return;
        }
        if let Some(id) = self.frame_handle.take() {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(id);
            }
        }
        for listener in &self.listeners {
            listener.detach();
        }
        self.host.drive(Engine::destroy);
    }
}

impl Drop for WebGame {
    /// Freeing the handle from JS without `destroy` must still unhook listeners
    fn drop(&mut self) {
        self.destroy();
    }
}

fn request_frame(callback: &Closure<dyn FnMut(f64)>) -> Option<i32> {
    web_sys::window()?
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .ok()
}
