//! Not Suika entry point
//!
//! Handles platform-specific initialization and runs the game loop. On the web
//! the game renders into `#canvas` with the HUD in the page; natively it plays a
//! headless demo run with the auto player.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent};

    use not_suika::consts::*;
    use not_suika::highscores::MAX_HIGH_SCORES;
    use not_suika::persistence::LocalStorageStore;
    use not_suika::platform::{self, canvas_to_world};
    use not_suika::renderer::{Effects, RenderState, scene};
    use not_suika::sim::{FrameInput, GameEvent, GamePhase, GameSession, frame};

    /// Game instance holding all state
    struct Game {
        session: GameSession,
        render_state: Option<RenderState>,
        effects: Effects,
        last_time: f64,
        input: FrameInput,
        /// Canvas size in CSS pixels
        canvas_size: Vec2,
    }

    impl Game {
        fn new(seed: u64) -> Self {
            Self {
                session: GameSession::new(seed, Box::new(LocalStorageStore)),
                render_state: None,
                effects: Effects::new(),
                last_time: 0.0,
                input: FrameInput::default(),
                canvas_size: Vec2::new(WINDOW_WIDTH, WINDOW_HEIGHT),
            }
        }

        fn set_pointer(&mut self, x: f32, y: f32) {
            self.input.pointer = Some(canvas_to_world(Vec2::new(x, y), self.canvas_size));
        }

        /// Run one frame of simulation and hand its events to the effects
        fn update(&mut self, dt: f32) {
            let outcome = frame(&mut self.session, &self.input, dt);

            // Clear one-shot inputs after processing
            self.input.confirm_pressed = false;
            self.input.pointer_clicked = false;
            self.input.retry = false;
            self.input.share = false;

            if outcome.retry {
                self.effects.clear();
            }
            if let Some(score) = outcome.share {
                platform::share(score);
            }
            for event in self.session.drain_events() {
                self.effects.handle_event(&event);
                if let GameEvent::Merged { rank, points, .. } = event {
                    log::debug!("Merged into rank {} (+{})", rank, points);
                }
            }
        }

        /// Render the current frame
        fn render(&mut self, dt: f32) {
            let vertices = scene::build(&self.session, &mut self.effects, dt);
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&vertices) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self, document: &Document) {
            if let Some(el) = document.query_selector("#hud-score .hud-value").ok().flatten() {
                el.set_text_content(Some(&self.session.score.to_string()));
            }

            for place in 0..MAX_HIGH_SCORES {
                if let Some(el) = document.get_element_by_id(&format!("hud-rank-{}", place)) {
                    el.set_text_content(Some(&self.session.high_scores.label(place)));
                }
            }

            // Share only makes sense for a finished run
            if let Some(el) = document.get_element_by_id("share-btn") {
                let class = if self.session.phase == GamePhase::GameOver {
                    ""
                } else {
                    "hidden"
                };
                let _ = el.set_attribute("class", class);
            }

            if let Some(el) = document.get_element_by_id("game-over") {
                if self.session.phase == GamePhase::GameOver {
                    let _ = el.set_attribute("class", "");
                    if let Some(score_el) = document.get_element_by_id("final-score") {
                        score_el.set_text_content(Some(&self.session.score.to_string()));
                    }
                } else {
                    let _ = el.set_attribute("class", "hidden");
                }
            }
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Not Suika starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");
        document.set_title(WINDOW_TITLE);

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let dpr = window.device_pixel_ratio();
        let client_w = canvas.client_width();
        let client_h = canvas.client_height();
        let width = (client_w as f64 * dpr) as u32;
        let height = (client_h as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed)));
        game.borrow_mut().canvas_size = Vec2::new(client_w as f32, client_h as f32);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to get adapter");

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let render_state = RenderState::new(surface, &adapter, width, height).await;
        game.borrow_mut().render_state = Some(render_state);

        setup_input_handlers(&canvas, game.clone());
        setup_buttons(&document, game.clone());

        if let Some(hud) = document.get_element_by_id("hud") {
            let _ = hud.set_attribute("class", "");
        }

        request_animation_frame(game);

        log::info!("Not Suika running!");
    }

    /// Position of the first touch relative to the canvas
    fn touch_offset(canvas: &HtmlCanvasElement, event: &TouchEvent) -> Option<(f32, f32)> {
        let touch = event.touches().get(0)?;
        let rect = canvas.get_bounding_client_rect();
        Some((
            touch.client_x() as f32 - rect.left() as f32,
            touch.client_y() as f32 - rect.top() as f32,
        ))
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Mouse move
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                g.canvas_size = Vec2::new(
                    canvas_clone.client_width() as f32,
                    canvas_clone.client_height() as f32,
                );
                g.set_pointer(event.offset_x() as f32, event.offset_y() as f32);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse down: drag to aim, click to drop
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                if event.button() != 0 {
                    return;
                }
                let mut g = game.borrow_mut();
                g.set_pointer(event.offset_x() as f32, event.offset_y() as f32);
                g.input.pointer_held = true;
                g.input.pointer_clicked = true;
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse up anywhere releases the drag
        {
            let game = game.clone();
            let window = web_sys::window().expect("no window");
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().input.pointer_held = false;
            });
            let _ = window
                .add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch start
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                if let Some((x, y)) = touch_offset(&canvas_clone, &event) {
                    g.set_pointer(x, y);
                }
                g.input.pointer_held = true;
                g.input.pointer_clicked = true;
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch move
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some((x, y)) = touch_offset(&canvas_clone, &event) {
                    game.borrow_mut().set_pointer(x, y);
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch end
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: TouchEvent| {
                game.borrow_mut().input.pointer_held = false;
            });
            let _ = canvas
                .add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        let window = web_sys::window().expect("no window");

        // Keyboard down
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "ArrowLeft" | "a" | "A" => g.input.left_held = true,
                    "ArrowRight" | "d" | "D" => g.input.right_held = true,
                    " " | "Enter" => {
                        if !event.repeat() {
                            g.input.confirm_pressed = true;
                        }
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard up
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "ArrowLeft" | "a" | "A" => g.input.left_held = false,
                    "ArrowRight" | "d" | "D" => g.input.right_held = false,
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        if let Some(btn) = document.get_element_by_id("retry-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().input.retry = true;
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("share-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().input.share = true;
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            log::error!("No window; stopping the game loop");
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                STEP_SECONDS
            };
            g.last_time = time;

            g.update(dt);
            g.render(dt);
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                g.update_hud(&document);
            }
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

/// Frames a headless demo may run before giving up (ten minutes at 60 fps)
#[cfg(not(target_arch = "wasm32"))]
const DEMO_FRAME_LIMIT: u64 = 60 * 60 * 10;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use not_suika::persistence::FileStore;
    use not_suika::sim::{AutoPlayer, GameEvent, GamePhase, GameSession, frame};

    env_logger::init();
    log::info!("{} (native) starting...", not_suika::consts::WINDOW_TITLE);
    log::info!("Native mode plays a headless demo - run with `trunk serve` for the web version");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or_else(rand::random);
    let mut session = GameSession::new(seed, Box::new(FileStore::open_default()));
    let mut player = AutoPlayer::new(seed);
    let dt = 1.0 / 60.0;

    let mut merges = 0u32;
    while session.phase == GamePhase::Playing && session.frames < DEMO_FRAME_LIMIT {
        let input = player.next_input(&session);
        frame(&mut session, &input, dt);
        merges += session
            .drain_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::Merged { .. }))
            .count() as u32;
    }

    println!(
        "Seed {}: score {} after {} frames ({} merges)",
        seed, session.score, session.frames, merges
    );
    for place in 0..not_suika::highscores::MAX_HIGH_SCORES {
        println!("  {}", session.high_scores.label(place));
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
