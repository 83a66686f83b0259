//! Course catalog: pick a course, drill down to a subtopic and start studying.

use super::{AppScreen, FlashApp};
use eframe::egui;
use flashconcards::database::{accounts, db};
use flashconcards::error::AppError;
use flashconcards::models::{Course, Deepening, PaymentStatus, StudyScope, SubTopic, Subject, Topic};
use flashconcards::study::StudyError;
use std::collections::HashMap;

#[derive(Default)]
pub struct CatalogState {
    pub courses: Vec<Course>,
    /// Course id -> whether the signed-in user may study it.
    pub access: HashMap<i64, bool>,
    /// Course id -> status of the user's latest payment for it.
    pub payments: HashMap<i64, PaymentStatus>,
    pub selected_course: Option<usize>,
    pub subjects: Vec<Subject>,
    pub selected_subject: Option<usize>,
    pub topics: Vec<Topic>,
    pub selected_topic: Option<usize>,
    pub subtopics: Vec<SubTopic>,
    /// Active card count per subtopic of the selected topic.
    pub card_counts: HashMap<i64, i64>,
    pub deepenings: Vec<Deepening>,
    pub deepening_subtopic: Option<i64>,
}

impl CatalogState {
    fn course(&self) -> Option<&Course> {
        self.selected_course.and_then(|i| self.courses.get(i))
    }

    fn clear_below_course(&mut self) {
        self.subjects.clear();
        self.selected_subject = None;
        self.clear_below_subject();
    }

    fn clear_below_subject(&mut self) {
        self.topics.clear();
        self.selected_topic = None;
        self.clear_below_topic();
    }

    fn clear_below_topic(&mut self) {
        self.subtopics.clear();
        self.card_counts.clear();
        self.deepenings.clear();
        self.deepening_subtopic = None;
    }
}

enum CatalogAction {
    SelectCourse(usize),
    SelectSubject(usize),
    SelectTopic(usize),
    RequestAccess(usize),
    Study(usize),
    ShowDeepenings(i64),
}

impl FlashApp {
    /// Reloads the catalog for the signed-in user and shows it.
    pub(super) fn open_catalog(&mut self) {
        let Some(user_id) = self.current_user.as_ref().map(|u| u.id) else {
            return;
        };
        // Pick up role changes made by an administrator since sign in.
        let user = match self.with_conn(|conn| accounts::get_user(user_id, conn)) {
            Ok(user) => user,
            Err(AppError::NotFound { .. }) => {
                self.notify("Your account no longer exists.");
                self.current_user = None;
                self.current_screen = AppScreen::SignIn;
                return;
            }
            Err(e) => {
                self.notify_error("Could not load your account", e);
                return;
            }
        };
        self.current_user = Some(user.clone());
        let include_inactive = user.role.is_staff();
        let loaded = self.with_conn(|conn| {
            let courses = db::get_courses(include_inactive, conn)?;
            let mut access = HashMap::new();
            for course in &courses {
                access.insert(course.id, accounts::has_course_access(&user, course, conn)?);
            }
            let payments = accounts::get_payments_for_user(user.id, conn)?
                .into_iter()
                .map(|p| (p.course_id, p.status))
                .collect::<HashMap<_, _>>();
            Ok((courses, access, payments))
        });

        match loaded {
            Ok((courses, access, payments)) => {
                let previous = self.catalog.course().map(|c| c.id);
                self.catalog = CatalogState {
                    courses,
                    access,
                    payments,
                    ..CatalogState::default()
                };
                if let Some(index) = previous
                    .and_then(|id| self.catalog.courses.iter().position(|c| c.id == id))
                {
                    self.select_course(index);
                }
                self.current_screen = AppScreen::Catalog;
            }
            Err(e) => self.notify_error("Could not load courses", e),
        }
    }

    pub(super) fn render_catalog_screen(&mut self, ctx: &egui::Context) {
        let mut action: Option<CatalogAction> = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(format!("Courses ({})", self.catalog.courses.len()));

            egui::ScrollArea::vertical()
                .id_source("courses_list")
                .max_height(180.0)
                .show(ui, |ui| {
                    for (i, course) in self.catalog.courses.iter().enumerate() {
                        let is_selected = self.catalog.selected_course == Some(i);
                        let has_access = self.catalog.access.get(&course.id).copied().unwrap_or(false);

                        ui.horizontal(|ui| {
                            let mut title = format!("{} ({})", course.name, course.price_label());
                            if !course.active {
                                title.push_str(" [inactive]");
                            }
                            if ui.selectable_label(is_selected, title).clicked() {
                                action = Some(CatalogAction::SelectCourse(i));
                            }

                            if !has_access {
                                match self.catalog.payments.get(&course.id) {
                                    Some(PaymentStatus::Pending) => {
                                        ui.label("Payment pending approval");
                                    }
                                    _ => {
                                        if ui.button("Buy access").clicked() {
                                            action = Some(CatalogAction::RequestAccess(i));
                                        }
                                    }
                                }
                            }
                        });
                    }
                });

            ui.separator();

            let Some(course) = self.catalog.course().cloned() else {
                ui.label("Select a course to see its subjects");
                return;
            };
            ui.heading(&course.name);
            if !course.description.is_empty() {
                ui.label(&course.description);
            }
            let has_access = self.catalog.access.get(&course.id).copied().unwrap_or(false);

            let subject_text = self
                .catalog
                .selected_subject
                .and_then(|i| self.catalog.subjects.get(i))
                .map(|s| s.name.clone())
                .unwrap_or_else(|| "Choose a subject".to_string());
            egui::ComboBox::from_label("Subject")
                .selected_text(subject_text)
                .show_ui(ui, |ui| {
                    for (i, subject) in self.catalog.subjects.iter().enumerate() {
                        let selected = self.catalog.selected_subject == Some(i);
                        if ui.selectable_label(selected, &subject.name).clicked() {
                            action = Some(CatalogAction::SelectSubject(i));
                        }
                    }
                });

            if self.catalog.selected_subject.is_some() {
                let topic_text = self
                    .catalog
                    .selected_topic
                    .and_then(|i| self.catalog.topics.get(i))
                    .map(|t| t.name.clone())
                    .unwrap_or_else(|| "Choose a topic".to_string());
                egui::ComboBox::from_label("Topic")
                    .selected_text(topic_text)
                    .show_ui(ui, |ui| {
                        for (i, topic) in self.catalog.topics.iter().enumerate() {
                            let selected = self.catalog.selected_topic == Some(i);
                            if ui.selectable_label(selected, &topic.name).clicked() {
                                action = Some(CatalogAction::SelectTopic(i));
                            }
                        }
                    });
            }

            if self.catalog.selected_topic.is_some() {
                ui.separator();
                ui.heading(format!("Subtopics ({})", self.catalog.subtopics.len()));
                if !has_access {
                    ui.label("Buy access to this course to start studying.");
                }

                egui::ScrollArea::vertical()
                    .id_source("subtopics_list")
                    .max_height(220.0)
                    .show(ui, |ui| {
                        for (i, subtopic) in self.catalog.subtopics.iter().enumerate() {
                            let count = self.catalog.card_counts.get(&subtopic.id).copied().unwrap_or(0);
                            ui.horizontal(|ui| {
                                ui.label(format!("{} ({} cards)", subtopic.name, count));
                                if ui
                                    .add_enabled(has_access && count > 0, egui::Button::new("Study"))
                                    .clicked()
                                {
                                    action = Some(CatalogAction::Study(i));
                                }
                                if ui
                                    .add_enabled(has_access, egui::Button::new("Deepen"))
                                    .clicked()
                                {
                                    action = Some(CatalogAction::ShowDeepenings(subtopic.id));
                                }
                            });
                        }
                    });
            }

            if self.catalog.deepening_subtopic.is_some() {
                ui.separator();
                ui.heading("Deepening");
                if self.catalog.deepenings.is_empty() {
                    ui.label("No deepening content for this subtopic yet.");
                }
                egui::ScrollArea::vertical()
                    .id_source("deepenings_list")
                    .show(ui, |ui| {
                        for deepening in &self.catalog.deepenings {
                            ui.group(|ui| {
                                ui.strong(&deepening.title);
                                ui.label(&deepening.body);
                            });
                        }
                    });
            }
        });

        // Execute deferred actions
        match action {
            Some(CatalogAction::SelectCourse(i)) => self.select_course(i),
            Some(CatalogAction::SelectSubject(i)) => self.select_subject(i),
            Some(CatalogAction::SelectTopic(i)) => self.select_topic(i),
            Some(CatalogAction::RequestAccess(i)) => self.request_access(i),
            Some(CatalogAction::Study(i)) => self.start_study_session(i),
            Some(CatalogAction::ShowDeepenings(id)) => self.show_deepenings(id),
            None => {}
        }
    }

    fn select_course(&mut self, index: usize) {
        let Some(course_id) = self.catalog.courses.get(index).map(|c| c.id) else {
            return;
        };
        self.catalog.selected_course = Some(index);
        self.catalog.clear_below_course();
        match self.with_conn(|conn| db::get_subjects(course_id, conn)) {
            Ok(subjects) => self.catalog.subjects = subjects,
            Err(e) => self.notify_error("Could not load subjects", e),
        }
    }

    fn select_subject(&mut self, index: usize) {
        let Some(subject_id) = self.catalog.subjects.get(index).map(|s| s.id) else {
            return;
        };
        self.catalog.selected_subject = Some(index);
        self.catalog.clear_below_subject();
        match self.with_conn(|conn| db::get_topics(subject_id, conn)) {
            Ok(topics) => self.catalog.topics = topics,
            Err(e) => self.notify_error("Could not load topics", e),
        }
    }

    fn select_topic(&mut self, index: usize) {
        let Some(topic_id) = self.catalog.topics.get(index).map(|t| t.id) else {
            return;
        };
        self.catalog.selected_topic = Some(index);
        self.catalog.clear_below_topic();
        let loaded = self.with_conn(|conn| {
            let subtopics = db::get_subtopics(topic_id, conn)?;
            let mut counts = HashMap::new();
            for subtopic in &subtopics {
                counts.insert(subtopic.id, db::count_active_flashcards(subtopic.id, conn)?);
            }
            Ok((subtopics, counts))
        });
        match loaded {
            Ok((subtopics, counts)) => {
                self.catalog.subtopics = subtopics;
                self.catalog.card_counts = counts;
            }
            Err(e) => self.notify_error("Could not load subtopics", e),
        }
    }

    fn request_access(&mut self, index: usize) {
        let (Some(user), Some(course)) = (
            self.current_user.clone(),
            self.catalog.courses.get(index).cloned(),
        ) else {
            return;
        };
        match self.with_conn(|conn| accounts::request_course_access(user.id, &course, conn)) {
            Ok(payment) => {
                self.catalog.payments.insert(course.id, payment.status);
                self.notify(format!(
                    "Access to '{}' requested ({}). An administrator will confirm the payment.",
                    course.name,
                    course.price_label()
                ));
            }
            Err(e) => self.notify_error("Could not request access", e),
        }
    }

    fn show_deepenings(&mut self, subtopic_id: i64) {
        match self.with_conn(|conn| db::get_deepenings(subtopic_id, conn)) {
            Ok(deepenings) => {
                self.catalog.deepenings = deepenings;
                self.catalog.deepening_subtopic = Some(subtopic_id);
            }
            Err(e) => self.notify_error("Could not load deepening content", e),
        }
    }

    /// Starts a study session for a subtopic of the selected topic.
    fn start_study_session(&mut self, subtopic_index: usize) {
        let (Some(user), Some(course)) = (
            self.current_user.clone(),
            self.catalog.course().cloned(),
        ) else {
            return;
        };
        let subject_id = self
            .catalog
            .selected_subject
            .and_then(|i| self.catalog.subjects.get(i))
            .map(|s| s.id);
        let topic_id = self
            .catalog
            .selected_topic
            .and_then(|i| self.catalog.topics.get(i))
            .map(|t| t.id);
        let subtopic_id = self.catalog.subtopics.get(subtopic_index).map(|s| s.id);
        let (Some(subject_id), Some(topic_id), Some(subtopic_id)) = (subject_id, topic_id, subtopic_id)
        else {
            return;
        };

        if let Err(e) = self.with_conn(|conn| accounts::require_course_access(&user, &course, conn)) {
            self.notify_error("Cannot study this course", e);
            return;
        }

        let scope = StudyScope {
            user_id: user.id,
            course_id: course.id,
            subject_id,
            topic_id,
            subtopic_id,
        };
        match self.session.start(scope) {
            Ok(_) => {
                self.study.begin();
                self.current_screen = AppScreen::Study;
            }
            Err(StudyError::NoCardsAvailable) => {
                self.notify("This subtopic has no cards to study yet.");
            }
            Err(e) => self.notify_error("Could not start studying", e),
        }
    }
}
