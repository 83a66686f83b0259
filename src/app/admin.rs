//! Staff area: content tree editing, course import/export, payment approval
//! and user roles. Moderators only see the content tab.

use super::{AppScreen, FlashApp};
use eframe::egui;
use flashconcards::database::{accounts, db};
use flashconcards::error::Result;
use flashconcards::export::json::{export_json_to_path, import_json, load_course_document, store_course_document};
use flashconcards::models::{Course, Deepening, Flashcard, Payment, PaymentStatus, Role, SubTopic, Subject, Topic, User};

#[derive(Default, Clone, Copy, PartialEq, Eq)]
enum AdminTab {
    #[default]
    Content,
    Payments,
    Users,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Level {
    Subject,
    Topic,
    SubTopic,
}

impl Level {
    fn label(&self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::Topic => "topic",
            Self::SubTopic => "subtopic",
        }
    }
}

struct CourseForm {
    id: Option<i64>,
    name: String,
    description: String,
    price: String,
    active: bool,
}

impl Default for CourseForm {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            description: String::new(),
            price: String::new(),
            active: true,
        }
    }
}

impl CourseForm {
    fn from_course(course: &Course) -> Self {
        Self {
            id: Some(course.id),
            name: course.name.clone(),
            description: course.description.clone(),
            price: format!("{:.2}", course.price_cents as f64 / 100.0),
            active: course.active,
        }
    }

    /// Accepts "49.90", "49,90" or "49".
    fn price_cents(&self) -> Option<i64> {
        let text = self.price.trim().replace(',', ".");
        if text.is_empty() {
            return Some(0);
        }
        let value: f64 = text.parse().ok()?;
        (value >= 0.0).then(|| (value * 100.0).round() as i64)
    }
}

struct CardForm {
    id: Option<i64>,
    front: String,
    back: String,
    explanation: String,
    deepening: String,
    active: bool,
}

impl Default for CardForm {
    fn default() -> Self {
        Self {
            id: None,
            front: String::new(),
            back: String::new(),
            explanation: String::new(),
            deepening: String::new(),
            active: true,
        }
    }
}

fn optional_text(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[derive(Default)]
struct DeepeningForm {
    id: Option<i64>,
    title: String,
    body: String,
}

#[derive(Default)]
pub struct AdminState {
    tab: AdminTab,
    courses: Vec<Course>,
    selected_course: Option<i64>,
    subjects: Vec<Subject>,
    selected_subject: Option<i64>,
    topics: Vec<Topic>,
    selected_topic: Option<i64>,
    subtopics: Vec<SubTopic>,
    selected_subtopic: Option<i64>,
    cards: Vec<Flashcard>,
    deepenings: Vec<Deepening>,

    course_form: CourseForm,
    new_names: [String; 3],
    rename: String,
    card_form: CardForm,
    deepening_form: DeepeningForm,

    payments: Vec<Payment>,
    users: Vec<User>,

    pending_delete: Option<(String, AdminAction)>,
    show_import_result_dialog: bool,
    import_result_message: String,
}

fn slot(level: Level) -> usize {
    match level {
        Level::Subject => 0,
        Level::Topic => 1,
        Level::SubTopic => 2,
    }
}

#[derive(Clone)]
enum AdminAction {
    Tab(AdminTab),
    SelectCourse(i64),
    NewCourse,
    SaveCourse,
    DeleteCourse(i64),
    Select(Level, i64),
    Add(Level),
    Rename(Level, i64),
    Delete(Level, i64),
    EditCard(i64),
    NewCard,
    SaveCard,
    DeleteCard(i64),
    EditDeepening(i64),
    SaveDeepening,
    DeleteDeepening(i64),
    Export(i64),
    Import,
    SetPayment(i64, PaymentStatus),
    SetRole(i64, Role),
    DeleteUser(i64),
}

impl AdminAction {
    /// Deletions wait for a confirmation dialog.
    fn needs_confirmation(&self) -> bool {
        matches!(
            self,
            Self::DeleteCourse(_) | Self::Delete(..) | Self::DeleteCard(_) | Self::DeleteDeepening(_) | Self::DeleteUser(_)
        )
    }
}

/// One level of the content tree as a selectable list with add, rename and
/// delete controls.
fn level_list(
    ui: &mut egui::Ui,
    level: Level,
    items: &[(i64, String)],
    selected: Option<i64>,
    new_name: &mut String,
    rename: &mut String,
    action: &mut Option<AdminAction>,
) {
    ui.strong(format!("{}s ({})", capitalize(level.label()), items.len()));
    egui::ScrollArea::vertical()
        .id_source(level.label())
        .max_height(120.0)
        .show(ui, |ui| {
            for (id, name) in items {
                let is_selected = selected == Some(*id);
                ui.horizontal(|ui| {
                    if ui.selectable_label(is_selected, name).clicked() {
                        *action = Some(AdminAction::Select(level, *id));
                    }
                    if ui.small_button("Delete").clicked() {
                        *action = Some(AdminAction::Delete(level, *id));
                    }
                });
            }
        });
    if let Some(id) = selected {
        ui.horizontal(|ui| {
            ui.text_edit_singleline(rename);
            if ui.button("Rename").clicked() {
                *action = Some(AdminAction::Rename(level, id));
            }
        });
    }
    ui.horizontal(|ui| {
        ui.label(format!("New {}:", level.label()));
        ui.text_edit_singleline(new_name);
        if ui.button("Add").clicked() {
            *action = Some(AdminAction::Add(level));
        }
    });
    ui.separator();
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl FlashApp {
    fn can_manage_accounts(&self) -> bool {
        self.current_user
            .as_ref()
            .is_some_and(|u| u.role.can_manage_accounts())
    }

    pub(super) fn open_admin(&mut self) {
        if !self.current_user.as_ref().is_some_and(|u| u.role.is_staff()) {
            return;
        }
        self.reload_admin_courses();
        if self.can_manage_accounts() {
            self.reload_accounts();
        } else {
            self.admin.tab = AdminTab::Content;
        }
        self.current_screen = AppScreen::Admin;
    }

    fn reload_admin_courses(&mut self) {
        match self.with_conn(|conn| db::get_courses(true, conn)) {
            Ok(courses) => self.admin.courses = courses,
            Err(e) => self.notify_error("Could not load courses", e),
        }
        if let Some(id) = self.admin.selected_course {
            if !self.admin.courses.iter().any(|c| c.id == id) {
                self.admin.selected_course = None;
                self.admin.course_form = CourseForm::default();
            }
        }
        self.reload_tree();
    }

    /// Reloads every list below the selected course, dropping selections
    /// that no longer exist.
    fn reload_tree(&mut self) {
        let admin = &self.admin;
        let (course, subject, topic, subtopic) = (
            admin.selected_course,
            admin.selected_subject,
            admin.selected_topic,
            admin.selected_subtopic,
        );
        let loaded = self.with_conn(|conn| {
            let subjects = match course {
                Some(id) => db::get_subjects(id, conn)?,
                None => Vec::new(),
            };
            let subject = subject.filter(|id| subjects.iter().any(|s| s.id == *id));
            let topics = match subject {
                Some(id) => db::get_topics(id, conn)?,
                None => Vec::new(),
            };
            let topic = topic.filter(|id| topics.iter().any(|t| t.id == *id));
            let subtopics = match topic {
                Some(id) => db::get_subtopics(id, conn)?,
                None => Vec::new(),
            };
            let subtopic = subtopic.filter(|id| subtopics.iter().any(|s| s.id == *id));
            let (cards, deepenings) = match subtopic {
                Some(id) => (db::get_flashcards_for_subtopic(id, conn)?, db::get_deepenings(id, conn)?),
                None => (Vec::new(), Vec::new()),
            };
            Ok((subjects, subject, topics, topic, subtopics, subtopic, cards, deepenings))
        });

        match loaded {
            Ok((subjects, subject, topics, topic, subtopics, subtopic, cards, deepenings)) => {
                let admin = &mut self.admin;
                admin.subjects = subjects;
                admin.selected_subject = subject;
                admin.topics = topics;
                admin.selected_topic = topic;
                admin.subtopics = subtopics;
                admin.selected_subtopic = subtopic;
                admin.cards = cards;
                admin.deepenings = deepenings;
            }
            Err(e) => self.notify_error("Could not load the content tree", e),
        }
    }

    fn reload_accounts(&mut self) {
        match self.with_conn(|conn| Ok((accounts::get_payments(conn)?, accounts::get_users(conn)?))) {
            Ok((payments, users)) => {
                self.admin.payments = payments;
                self.admin.users = users;
            }
            Err(e) => self.notify_error("Could not load accounts", e),
        }
    }

    pub(super) fn render_admin_screen(&mut self, ctx: &egui::Context) {
        let mut action: Option<AdminAction> = None;
        let manage_accounts = self.can_manage_accounts();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                let tab = self.admin.tab;
                if ui.selectable_label(tab == AdminTab::Content, "Content").clicked() {
                    action = Some(AdminAction::Tab(AdminTab::Content));
                }
                if manage_accounts {
                    if ui.selectable_label(tab == AdminTab::Payments, "Payments").clicked() {
                        action = Some(AdminAction::Tab(AdminTab::Payments));
                    }
                    if ui.selectable_label(tab == AdminTab::Users, "Users").clicked() {
                        action = Some(AdminAction::Tab(AdminTab::Users));
                    }
                }
            });
            ui.separator();

            egui::ScrollArea::vertical()
                .id_source("admin_page")
                .show(ui, |ui| match self.admin.tab {
                    AdminTab::Content => self.render_content_tab(ui, &mut action),
                    AdminTab::Payments => self.render_payments_tab(ui, &mut action),
                    AdminTab::Users => self.render_users_tab(ui, &mut action),
                });
        });

        if let Some((message, pending)) = self.admin.pending_delete.clone() {
            egui::Window::new("Confirm deletion")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(&message);
                    ui.horizontal(|ui| {
                        if ui.button("No").clicked() {
                            self.admin.pending_delete = None;
                        }
                        if ui.button("Yes").clicked() {
                            self.admin.pending_delete = None;
                            action = Some(pending.clone());
                        }
                    });
                });
            if let Some(pending_action) = action.take() {
                // Only the confirmed deletion may run while the dialog is open.
                if self.admin.pending_delete.is_none() {
                    self.apply_admin_action(pending_action, true);
                }
            }
        }

        if self.admin.show_import_result_dialog {
            egui::Window::new("Import/Export Result")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(&self.admin.import_result_message);
                    ui.add_space(10.0);
                    if ui.button("OK").clicked() {
                        self.admin.show_import_result_dialog = false;
                    }
                });
        }

        if let Some(action) = action {
            self.apply_admin_action(action, false);
        }
    }

    fn render_content_tab(&mut self, ui: &mut egui::Ui, action: &mut Option<AdminAction>) {
        ui.horizontal(|ui| {
            if ui.button("Import course").clicked() {
                *action = Some(AdminAction::Import);
            }
            if let Some(id) = self.admin.selected_course {
                if ui.button("Export course").clicked() {
                    *action = Some(AdminAction::Export(id));
                }
            }
        });
        ui.separator();

        ui.heading(format!("Courses ({})", self.admin.courses.len()));
        egui::ScrollArea::vertical()
            .id_source("admin_courses")
            .max_height(120.0)
            .show(ui, |ui| {
                for course in &self.admin.courses {
                    let is_selected = self.admin.selected_course == Some(course.id);
                    ui.horizontal(|ui| {
                        let mut title = format!("{} ({})", course.name, course.price_label());
                        if !course.active {
                            title.push_str(" [inactive]");
                        }
                        if ui.selectable_label(is_selected, title).clicked() {
                            *action = Some(AdminAction::SelectCourse(course.id));
                        }
                        if ui.small_button("Delete").clicked() {
                            *action = Some(AdminAction::DeleteCourse(course.id));
                        }
                    });
                }
            });

        let form = &mut self.admin.course_form;
        ui.group(|ui| {
            ui.label(if form.id.is_some() { "Edit course" } else { "New course" });
            ui.horizontal(|ui| {
                ui.label("Name:");
                ui.text_edit_singleline(&mut form.name);
            });
            ui.horizontal(|ui| {
                ui.label("Description:");
                ui.text_edit_multiline(&mut form.description);
            });
            ui.horizontal(|ui| {
                ui.label("Price (R$):");
                ui.text_edit_singleline(&mut form.price);
                ui.checkbox(&mut form.active, "Active");
            });
            ui.horizontal(|ui| {
                if ui.button("Save course").clicked() {
                    *action = Some(AdminAction::SaveCourse);
                }
                if form.id.is_some() && ui.button("New course").clicked() {
                    *action = Some(AdminAction::NewCourse);
                }
            });
        });

        if self.admin.selected_course.is_none() {
            return;
        }
        ui.separator();

        let admin = &mut self.admin;
        let [new_subject, new_topic, new_subtopic] = &mut admin.new_names;
        let subjects: Vec<(i64, String)> = admin.subjects.iter().map(|s| (s.id, s.name.clone())).collect();
        level_list(ui, Level::Subject, &subjects, admin.selected_subject, new_subject, &mut admin.rename, action);

        if admin.selected_subject.is_some() {
            let topics: Vec<(i64, String)> = admin.topics.iter().map(|t| (t.id, t.name.clone())).collect();
            level_list(ui, Level::Topic, &topics, admin.selected_topic, new_topic, &mut admin.rename, action);
        }
        if admin.selected_topic.is_some() {
            let subtopics: Vec<(i64, String)> = admin.subtopics.iter().map(|s| (s.id, s.name.clone())).collect();
            level_list(ui, Level::SubTopic, &subtopics, admin.selected_subtopic, new_subtopic, &mut admin.rename, action);
        }

        if admin.selected_subtopic.is_some() {
            self.render_cards_section(ui, action);
        }
    }

    fn render_cards_section(&mut self, ui: &mut egui::Ui, action: &mut Option<AdminAction>) {
        let admin = &mut self.admin;

        ui.heading(format!("Flashcards ({})", admin.cards.len()));
        egui::ScrollArea::vertical()
            .id_source("admin_cards")
            .max_height(200.0)
            .show(ui, |ui| {
                for (i, card) in admin.cards.iter().enumerate() {
                    ui.group(|ui| {
                        ui.label(format!("{}. Front: {}", i + 1, card.display_front()));
                        ui.label(format!("   Back: {}", card.display_back()));
                        ui.horizontal(|ui| {
                            if !card.active {
                                ui.label("[inactive]");
                            }
                            if ui.small_button("Edit").clicked() {
                                *action = Some(AdminAction::EditCard(card.id));
                            }
                            if ui.small_button("Delete").clicked() {
                                *action = Some(AdminAction::DeleteCard(card.id));
                            }
                        });
                    });
                }
            });

        let form = &mut admin.card_form;
        ui.group(|ui| {
            ui.label(if form.id.is_some() { "Edit flashcard" } else { "New flashcard" });
            ui.horizontal(|ui| {
                ui.label("Front:");
                ui.text_edit_multiline(&mut form.front);
            });
            ui.horizontal(|ui| {
                ui.label("Back:");
                ui.text_edit_multiline(&mut form.back);
            });
            ui.horizontal(|ui| {
                ui.label("Explanation:");
                ui.text_edit_multiline(&mut form.explanation);
            });
            ui.horizontal(|ui| {
                ui.label("Deepening:");
                ui.text_edit_multiline(&mut form.deepening);
            });
            ui.checkbox(&mut form.active, "Active");
            ui.horizontal(|ui| {
                if ui.button("Save flashcard").clicked() {
                    *action = Some(AdminAction::SaveCard);
                }
                if form.id.is_some() && ui.button("New flashcard").clicked() {
                    *action = Some(AdminAction::NewCard);
                }
            });
        });

        ui.separator();
        ui.heading(format!("Deepening content ({})", admin.deepenings.len()));
        for deepening in &admin.deepenings {
            ui.horizontal(|ui| {
                ui.label(&deepening.title);
                if ui.small_button("Edit").clicked() {
                    *action = Some(AdminAction::EditDeepening(deepening.id));
                }
                if ui.small_button("Delete").clicked() {
                    *action = Some(AdminAction::DeleteDeepening(deepening.id));
                }
            });
        }
        let form = &mut admin.deepening_form;
        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.label("Title:");
                ui.text_edit_singleline(&mut form.title);
            });
            ui.label("Body:");
            ui.text_edit_multiline(&mut form.body);
            if ui.button("Save deepening").clicked() {
                *action = Some(AdminAction::SaveDeepening);
            }
        });
    }

    fn render_payments_tab(&mut self, ui: &mut egui::Ui, action: &mut Option<AdminAction>) {
        ui.heading(format!("Payments ({})", self.admin.payments.len()));
        for payment in &self.admin.payments {
            let email = self
                .admin
                .users
                .iter()
                .find(|u| u.id == payment.user_id)
                .map(|u| u.email.as_str())
                .unwrap_or("?");
            let course = self
                .admin
                .courses
                .iter()
                .find(|c| c.id == payment.course_id)
                .map(|c| c.name.as_str())
                .unwrap_or("?");

            ui.horizontal(|ui| {
                ui.label(format!(
                    "#{} {} - {} - R$ {},{:02} - {}",
                    payment.id,
                    email,
                    course,
                    payment.amount_cents / 100,
                    payment.amount_cents % 100,
                    payment.status.as_str()
                ));
                match payment.status {
                    PaymentStatus::Pending => {
                        if ui.small_button("Approve").clicked() {
                            *action = Some(AdminAction::SetPayment(payment.id, PaymentStatus::Approved));
                        }
                        if ui.small_button("Reject").clicked() {
                            *action = Some(AdminAction::SetPayment(payment.id, PaymentStatus::Rejected));
                        }
                    }
                    PaymentStatus::Approved => {
                        if ui.small_button("Refund").clicked() {
                            *action = Some(AdminAction::SetPayment(payment.id, PaymentStatus::Refunded));
                        }
                    }
                    PaymentStatus::Rejected | PaymentStatus::Refunded => {}
                }
            });
        }
    }

    fn render_users_tab(&mut self, ui: &mut egui::Ui, action: &mut Option<AdminAction>) {
        let me = self.current_user.as_ref().map(|u| u.id);
        ui.heading(format!("Users ({})", self.admin.users.len()));
        for user in &self.admin.users {
            ui.horizontal(|ui| {
                ui.label(format!("{} <{}>", user.name, user.email));
                if Some(user.id) == me {
                    ui.label(format!("({}, you)", user.role.as_str()));
                    return;
                }
                for role in [Role::Student, Role::Moderator, Role::Admin] {
                    if ui.selectable_label(user.role == role, role.as_str()).clicked() && user.role != role {
                        *action = Some(AdminAction::SetRole(user.id, role));
                    }
                }
                if ui.small_button("Delete").clicked() {
                    *action = Some(AdminAction::DeleteUser(user.id));
                }
            });
        }
    }

    fn apply_admin_action(&mut self, action: AdminAction, confirmed: bool) {
        if action.needs_confirmation() && !confirmed {
            let message = match &action {
                AdminAction::DeleteCourse(_) => "Delete this course with all its content?".to_string(),
                AdminAction::Delete(level, _) => {
                    format!("Delete this {} with everything below it?", level.label())
                }
                AdminAction::DeleteUser(_) => "Delete this user with their payments and study sessions?".to_string(),
                _ => "Delete this item?".to_string(),
            };
            self.admin.pending_delete = Some((message, action));
            return;
        }

        let result = match action {
            AdminAction::Tab(tab) => {
                self.admin.tab = tab;
                if tab != AdminTab::Content {
                    self.reload_accounts();
                }
                Ok(())
            }
            AdminAction::SelectCourse(id) => {
                self.admin.selected_course = Some(id);
                if let Some(course) = self.admin.courses.iter().find(|c| c.id == id) {
                    self.admin.course_form = CourseForm::from_course(course);
                }
                self.admin.selected_subject = None;
                self.reload_tree();
                Ok(())
            }
            AdminAction::NewCourse => {
                self.admin.selected_course = None;
                self.admin.course_form = CourseForm::default();
                self.reload_tree();
                Ok(())
            }
            AdminAction::SaveCourse => self.save_course(),
            AdminAction::DeleteCourse(id) => self
                .with_conn(|conn| db::delete_course(id, conn))
                .map(|()| self.reload_admin_courses()),
            AdminAction::Select(level, id) => {
                self.select_level(level, id);
                Ok(())
            }
            AdminAction::Add(level) => self.add_level(level),
            AdminAction::Rename(level, id) => self.rename_level(level, id),
            AdminAction::Delete(level, id) => self
                .with_conn(|conn| match level {
                    Level::Subject => db::delete_subject(id, conn),
                    Level::Topic => db::delete_topic(id, conn),
                    Level::SubTopic => db::delete_subtopic(id, conn),
                })
                .map(|()| self.reload_tree()),
            AdminAction::EditCard(id) => {
                if let Some(card) = self.admin.cards.iter().find(|c| c.id == id) {
                    self.admin.card_form = CardForm {
                        id: Some(card.id),
                        front: card.front.clone(),
                        back: card.back.clone(),
                        explanation: card.explanation.clone().unwrap_or_default(),
                        deepening: card.deepening.clone().unwrap_or_default(),
                        active: card.active,
                    };
                }
                Ok(())
            }
            AdminAction::NewCard => {
                self.admin.card_form = CardForm::default();
                Ok(())
            }
            AdminAction::SaveCard => self.save_card(),
            AdminAction::DeleteCard(id) => self
                .with_conn(|conn| db::delete_flashcard(id, conn))
                .map(|()| self.reload_tree()),
            AdminAction::EditDeepening(id) => {
                if let Some(deepening) = self.admin.deepenings.iter().find(|d| d.id == id) {
                    self.admin.deepening_form = DeepeningForm {
                        id: Some(deepening.id),
                        title: deepening.title.clone(),
                        body: deepening.body.clone(),
                    };
                }
                Ok(())
            }
            AdminAction::SaveDeepening => self.save_deepening(),
            AdminAction::DeleteDeepening(id) => self
                .with_conn(|conn| db::delete_deepening(id, conn))
                .map(|()| self.reload_tree()),
            AdminAction::Export(id) => {
                self.handle_export(id);
                Ok(())
            }
            AdminAction::Import => {
                self.handle_import();
                Ok(())
            }
            AdminAction::SetPayment(id, status) => self
                .with_conn(|conn| accounts::set_payment_status(id, status, conn))
                .map(|()| self.reload_accounts()),
            AdminAction::SetRole(id, role) => self
                .with_conn(|conn| accounts::set_user_role(id, role, conn))
                .map(|()| self.reload_accounts()),
            AdminAction::DeleteUser(id) => self
                .with_conn(|conn| accounts::delete_user(id, conn))
                .map(|()| self.reload_accounts()),
        };

        if let Err(e) = result {
            self.notify_error("Action failed", e);
        }
    }

    fn select_level(&mut self, level: Level, id: i64) {
        let admin = &mut self.admin;
        let name = match level {
            Level::Subject => {
                admin.selected_subject = Some(id);
                admin.selected_topic = None;
                admin.subjects.iter().find(|s| s.id == id).map(|s| s.name.clone())
            }
            Level::Topic => {
                admin.selected_topic = Some(id);
                admin.selected_subtopic = None;
                admin.topics.iter().find(|t| t.id == id).map(|t| t.name.clone())
            }
            Level::SubTopic => {
                admin.selected_subtopic = Some(id);
                admin.card_form = CardForm::default();
                admin.deepening_form = DeepeningForm::default();
                admin.subtopics.iter().find(|s| s.id == id).map(|s| s.name.clone())
            }
        };
        admin.rename = name.unwrap_or_default();
        self.reload_tree();
    }

    fn add_level(&mut self, level: Level) -> Result<()> {
        let admin = &self.admin;
        let name = admin.new_names[slot(level)].trim().to_string();
        let (parent, order) = match level {
            Level::Subject => (admin.selected_course, admin.subjects.len()),
            Level::Topic => (admin.selected_subject, admin.topics.len()),
            Level::SubTopic => (admin.selected_topic, admin.subtopics.len()),
        };
        let Some(parent) = parent else {
            return Ok(());
        };
        self.with_conn(|conn| match level {
            Level::Subject => db::create_subject(parent, &name, order as i64, conn),
            Level::Topic => db::create_topic(parent, &name, order as i64, conn),
            Level::SubTopic => db::create_subtopic(parent, &name, order as i64, conn),
        })?;
        self.admin.new_names[slot(level)].clear();
        self.reload_tree();
        Ok(())
    }

    fn rename_level(&mut self, level: Level, id: i64) -> Result<()> {
        let admin = &self.admin;
        let name = admin.rename.trim().to_string();
        match level {
            Level::Subject => {
                if let Some(mut subject) = admin.subjects.iter().find(|s| s.id == id).cloned() {
                    subject.name = name;
                    self.with_conn(|conn| db::update_subject(&subject, conn))?;
                }
            }
            Level::Topic => {
                if let Some(mut topic) = admin.topics.iter().find(|t| t.id == id).cloned() {
                    topic.name = name;
                    self.with_conn(|conn| db::update_topic(&topic, conn))?;
                }
            }
            Level::SubTopic => {
                if let Some(mut subtopic) = admin.subtopics.iter().find(|s| s.id == id).cloned() {
                    subtopic.name = name;
                    self.with_conn(|conn| db::update_subtopic(&subtopic, conn))?;
                }
            }
        }
        self.reload_tree();
        Ok(())
    }

    fn save_course(&mut self) -> Result<()> {
        let form = &self.admin.course_form;
        let Some(price_cents) = form.price_cents() else {
            let message = format!("'{}' is not a valid price", form.price);
            self.notify(message);
            return Ok(());
        };
        let course = Course {
            id: form.id.unwrap_or(0),
            name: form.name.trim().to_string(),
            description: form.description.trim().to_string(),
            price_cents,
            active: form.active,
        };
        let id = match form.id {
            Some(id) => self.with_conn(|conn| db::update_course(&course, conn)).map(|()| id)?,
            None => self.with_conn(|conn| db::create_course(&course, conn))?,
        };
        self.admin.selected_course = Some(id);
        self.reload_admin_courses();
        if let Some(course) = self.admin.courses.iter().find(|c| c.id == id) {
            self.admin.course_form = CourseForm::from_course(course);
        }
        self.notify(format!("Course '{}' saved", course.name));
        Ok(())
    }

    fn save_card(&mut self) -> Result<()> {
        let Some(subtopic_id) = self.admin.selected_subtopic else {
            return Ok(());
        };
        let form = &self.admin.card_form;
        let order_index = match form.id {
            Some(id) => self
                .admin
                .cards
                .iter()
                .find(|c| c.id == id)
                .map(|c| c.order_index)
                .unwrap_or(0),
            None => self.admin.cards.len() as i64,
        };
        let card = Flashcard {
            id: form.id.unwrap_or(0),
            subtopic_id,
            front: form.front.trim().to_string(),
            back: form.back.trim().to_string(),
            explanation: optional_text(&form.explanation),
            deepening: optional_text(&form.deepening),
            order_index,
            active: form.active,
        };
        match form.id {
            Some(_) => self.with_conn(|conn| db::update_flashcard(&card, conn))?,
            None => {
                self.with_conn(|conn| db::create_flashcard(&card, conn))?;
            }
        }
        self.admin.card_form = CardForm::default();
        self.reload_tree();
        Ok(())
    }

    fn save_deepening(&mut self) -> Result<()> {
        let Some(subtopic_id) = self.admin.selected_subtopic else {
            return Ok(());
        };
        let form = &self.admin.deepening_form;
        let deepening = Deepening {
            id: form.id.unwrap_or(0),
            subtopic_id,
            title: form.title.trim().to_string(),
            body: form.body.clone(),
        };
        match form.id {
            Some(_) => self.with_conn(|conn| db::update_deepening(&deepening, conn))?,
            None => {
                self.with_conn(|conn| {
                    db::create_deepening(subtopic_id, &deepening.title, &deepening.body, conn)
                })?;
            }
        }
        self.admin.deepening_form = DeepeningForm::default();
        self.reload_tree();
        Ok(())
    }

    /// Handles course export to a JSON file
    fn handle_export(&mut self, course_id: i64) {
        let document = match self.with_conn(|conn| load_course_document(course_id, conn)) {
            Ok(document) => document,
            Err(e) => {
                self.show_result(format!("Export failed: {}", e));
                return;
            }
        };
        // Open file save dialog
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(format!("{}.json", document.name))
            .add_filter("JSON files", &["json"])
            .save_file()
        {
            match export_json_to_path(&document, &path) {
                Ok(()) => self.show_result(format!(
                    "Course '{}' exported successfully with {} cards!",
                    document.name,
                    document.card_count()
                )),
                Err(e) => self.show_result(format!("Export failed: {}", e)),
            }
        }
    }

    /// Handles course import from a JSON file
    fn handle_import(&mut self) {
        // Open file selection dialog
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON files", &["json"])
            .pick_file()
        else {
            return;
        };

        let stored = import_json(&path).and_then(|document| {
            let id = self.with_conn(|conn| store_course_document(&document, conn))?;
            Ok((id, document))
        });
        match stored {
            Ok((id, document)) => {
                self.admin.selected_course = Some(id);
                self.reload_admin_courses();
                if let Some(course) = self.admin.courses.iter().find(|c| c.id == id) {
                    self.admin.course_form = CourseForm::from_course(course);
                }
                self.show_result(format!(
                    "Course '{}' imported successfully with {} cards!",
                    document.name,
                    document.card_count()
                ));
            }
            Err(e) => self.show_result(format!(
                "Import failed: {}\n\nPlease check if the file has correct structure:\n{{\n  \"name\": \"Course Name\",\n  \"subjects\": [...]\n}}",
                e
            )),
        }
    }

    fn show_result(&mut self, message: String) {
        self.admin.import_result_message = message;
        self.admin.show_import_result_dialog = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_parsing() {
        let mut form = CourseForm::default();
        for (text, expected) in [("49,90", Some(4990)), ("49.9", Some(4990)), ("", Some(0)), ("12", Some(1200))] {
            form.price = text.to_string();
            assert_eq!(form.price_cents(), expected, "price '{}'", text);
        }
        form.price = "-3".to_string();
        assert_eq!(form.price_cents(), None);
        form.price = "abc".to_string();
        assert_eq!(form.price_cents(), None);
    }

    #[test]
    fn test_course_form_round_trips_price() {
        let course = Course {
            id: 4,
            name: "OAB".to_string(),
            description: String::new(),
            price_cents: 4990,
            active: true,
        };
        let form = CourseForm::from_course(&course);
        assert_eq!(form.price, "49.90");
        assert_eq!(form.price_cents(), Some(4990));
    }

    #[test]
    fn test_deletions_need_confirmation() {
        assert!(AdminAction::DeleteCourse(1).needs_confirmation());
        assert!(AdminAction::Delete(Level::Topic, 1).needs_confirmation());
        assert!(!AdminAction::SelectCourse(1).needs_confirmation());
        assert!(!AdminAction::SetPayment(1, PaymentStatus::Approved).needs_confirmation());
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text("  "), None);
        assert_eq!(optional_text(" see art. 5 "), Some("see art. 5".to_string()));
    }
}
