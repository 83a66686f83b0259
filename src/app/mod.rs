//! Main application UI and state management.
//! Screens: sign in, course catalog, study session, study history and the
//! content/admin area for staff.

mod admin;
mod catalog;
mod study;

use admin::AdminState;
use catalog::CatalogState;
use eframe::egui;
use flashconcards::AppConfig;
use flashconcards::database::{SqliteContentStore, SqliteHistoryStore, accounts};
use flashconcards::error::{AppError, Result};
use flashconcards::models::{StudySessionRecord, User};
use flashconcards::study::SessionController;
use log::error;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use study::StudyView;

const TOAST_LIFETIME: Duration = Duration::from_secs(4);

/// Application screen states
#[derive(Default, Clone, Copy, PartialEq, Eq)]
enum AppScreen {
    #[default]
    SignIn,
    Catalog,
    Study,
    History,
    Admin,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ToastKind {
    Info,
    Error,
}

struct Toast {
    message: String,
    kind: ToastKind,
    shown_at: Instant,
}

type Session = SessionController<SqliteContentStore, SqliteHistoryStore>;

/// Main application state
pub struct FlashApp {
    conn: Arc<Mutex<Connection>>,
    current_screen: AppScreen,
    current_user: Option<User>,

    sign_in_email: String,
    sign_in_name: String,

    catalog: CatalogState,
    session: Session,
    study: StudyView,
    history: Vec<StudySessionRecord>,
    admin: AdminState,

    toasts: Vec<Toast>,
    show_confirmation_dialog: bool,
    allowed_to_close: bool,
}

impl eframe::App for FlashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.current_user.is_some() {
            self.render_top_bar(ctx);
        }

        match self.current_screen {
            AppScreen::SignIn => self.render_sign_in_screen(ctx),
            AppScreen::Catalog => self.render_catalog_screen(ctx),
            AppScreen::Study => self.render_study_screen(ctx),
            AppScreen::History => self.render_history_screen(ctx),
            AppScreen::Admin => self.render_admin_screen(ctx),
        }

        self.render_toasts(ctx);

        // Handle window close requests with confirmation dialog
        if ctx.input(|i| i.viewport().close_requested()) && !self.allowed_to_close {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.show_confirmation_dialog = true;
        }

        if self.show_confirmation_dialog {
            egui::Window::new("Do you want to quit?")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("No").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = false;
                        }

                        if ui.button("Yes").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = true;
                            self.leave_study_session();
                            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                        }
                    });
                });
        }
    }
}

impl FlashApp {
    /// Creates the application around an open database.
    pub fn new(conn: Connection, config: AppConfig) -> Self {
        let conn = Arc::new(Mutex::new(conn));
        let session = SessionController::new(
            SqliteContentStore::new(Arc::clone(&conn)),
            SqliteHistoryStore::new(Arc::clone(&conn)),
            config.queue_order(),
        )
        .with_retry_policy(config.save_retry.clone());

        Self {
            conn,
            current_screen: AppScreen::SignIn,
            current_user: None,
            sign_in_email: String::new(),
            sign_in_name: String::new(),
            catalog: CatalogState::default(),
            session,
            study: StudyView::new(),
            history: Vec::new(),
            admin: AdminState::default(),
            toasts: Vec::new(),
            show_confirmation_dialog: false,
            allowed_to_close: false,
        }
    }

    /// Runs `f` with the locked connection.
    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn.lock().map_err(|_| AppError::LockPoisoned)?;
        f(&conn)
    }

    fn notify(&mut self, message: impl Into<String>) {
        self.toasts.push(Toast {
            message: message.into(),
            kind: ToastKind::Info,
            shown_at: Instant::now(),
        });
    }

    fn notify_error(&mut self, context: &str, err: impl std::fmt::Display) {
        error!("{}: {}", context, err);
        self.toasts.push(Toast {
            message: format!("{}: {}", context, err),
            kind: ToastKind::Error,
            shown_at: Instant::now(),
        });
    }

    fn render_toasts(&mut self, ctx: &egui::Context) {
        self.toasts.retain(|t| t.shown_at.elapsed() < TOAST_LIFETIME);
        if self.toasts.is_empty() {
            return;
        }
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::RIGHT_BOTTOM, [-12.0, -12.0])
            .show(ctx, |ui| {
                for toast in &self.toasts {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        let color = match toast.kind {
                            ToastKind::Info => ui.visuals().text_color(),
                            ToastKind::Error => egui::Color32::from_rgb(220, 80, 80),
                        };
                        ui.colored_label(color, &toast.message);
                    });
                }
            });
        ctx.request_repaint_after(Duration::from_millis(250));
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        let mut target: Option<AppScreen> = None;
        let mut sign_out = false;

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("FlashConCards");
                ui.separator();
                let studying = self.current_screen == AppScreen::Study;
                if ui
                    .add_enabled(!studying, egui::Button::new("Courses"))
                    .clicked()
                {
                    target = Some(AppScreen::Catalog);
                }
                if ui
                    .add_enabled(!studying, egui::Button::new("My sessions"))
                    .clicked()
                {
                    target = Some(AppScreen::History);
                }
                let is_staff = self
                    .current_user
                    .as_ref()
                    .is_some_and(|u| u.role.is_staff());
                if is_staff
                    && ui
                        .add_enabled(!studying, egui::Button::new("Manage content"))
                        .clicked()
                {
                    target = Some(AppScreen::Admin);
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.add_enabled(!studying, egui::Button::new("Sign out")).clicked() {
                        sign_out = true;
                    }
                    if let Some(user) = &self.current_user {
                        ui.label(format!("{} ({})", user.name, user.role.as_str()));
                    }
                });
            });
        });

        if sign_out {
            self.current_user = None;
            self.session.reset();
            self.current_screen = AppScreen::SignIn;
            return;
        }
        match target {
            Some(AppScreen::Catalog) => self.open_catalog(),
            Some(AppScreen::History) => self.open_history(),
            Some(AppScreen::Admin) => self.open_admin(),
            _ => {}
        }
    }

    /// Renders the sign in screen: pick an email, or create a profile.
    fn render_sign_in_screen(&mut self, ctx: &egui::Context) {
        let mut action_sign_in = false;
        let mut action_register = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                ui.heading("FlashConCards");
                ui.label("Flashcards for exam preparation");
                ui.add_space(30.0);
            });

            ui.horizontal(|ui| {
                ui.label("Email:");
                ui.text_edit_singleline(&mut self.sign_in_email);
            });
            if ui.button("Sign in").clicked() {
                action_sign_in = true;
            }

            ui.add_space(20.0);
            ui.separator();
            ui.heading("New here?");
            ui.horizontal(|ui| {
                ui.label("Name:");
                ui.text_edit_singleline(&mut self.sign_in_name);
            });
            if ui.button("Create account").clicked() {
                action_register = true;
            }
        });

        if action_sign_in {
            let email = self.sign_in_email.clone();
            match self.with_conn(|conn| accounts::find_user_by_email(&email, conn)) {
                Ok(Some(user)) => self.sign_in(user),
                Ok(None) => self.notify(format!("No account for {}", email.trim())),
                Err(e) => self.notify_error("Sign in failed", e),
            }
        }
        if action_register {
            let email = self.sign_in_email.clone();
            let name = self.sign_in_name.clone();
            match self.with_conn(|conn| accounts::register_user(&email, &name, conn)) {
                Ok(user) => {
                    self.notify(format!("Welcome, {}!", user.name));
                    self.sign_in(user);
                }
                Err(e) => self.notify_error("Could not create account", e),
            }
        }
    }

    fn sign_in(&mut self, user: User) {
        log::info!("User {} signed in", user.email);
        self.current_user = Some(user);
        self.sign_in_name.clear();
        self.open_catalog();
    }

    fn open_history(&mut self) {
        let Some(user_id) = self.current_user.as_ref().map(|u| u.id) else {
            return;
        };
        match self.with_conn(|conn| {
            flashconcards::database::content::get_study_sessions_for_user(user_id, conn)
        }) {
            Ok(records) => {
                self.history = records;
                self.current_screen = AppScreen::History;
            }
            Err(e) => self.notify_error("Could not load your sessions", e),
        }
    }
}
