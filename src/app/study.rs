//! Study screen: one card at a time, answer reveal, grading, navigation and
//! the end-of-session summary.

use super::{AppScreen, FlashApp};
use chrono::{DateTime, Local};
use eframe::egui;
use flashconcards::study::{AnswerOutcome, SessionState, SessionSummary};
use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_secs(1);

pub struct StudyView {
    last_tick: Instant,
    /// Result of the last answer, shown above the next card.
    feedback: Option<String>,
}

impl StudyView {
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
            feedback: None,
        }
    }

    pub fn begin(&mut self) {
        self.last_tick = Instant::now();
        self.feedback = None;
    }
}

#[derive(Clone, Copy)]
enum StudyAction {
    Reveal,
    Answer(bool),
    Next,
    Previous,
    Restart,
    End,
    Back,
}

impl FlashApp {
    /// Feeds elapsed wall-clock seconds into the session timer.
    fn tick_session(&mut self, ctx: &egui::Context) {
        if !matches!(self.session.state(), SessionState::InProgress(_)) {
            return;
        }
        while self.study.last_tick.elapsed() >= TICK {
            self.study.last_tick += TICK;
            self.session.tick();
        }
        ctx.request_repaint_after(TICK.saturating_sub(self.study.last_tick.elapsed()));
    }

    fn keyboard_action(&self, ctx: &egui::Context) -> Option<StudyAction> {
        if !matches!(self.session.state(), SessionState::InProgress(_)) {
            return None;
        }
        let revealed = self.session.is_revealed();
        ctx.input(|i| {
            if i.key_pressed(egui::Key::ArrowRight) {
                Some(StudyAction::Next)
            } else if i.key_pressed(egui::Key::ArrowLeft) {
                Some(StudyAction::Previous)
            } else if !revealed && i.key_pressed(egui::Key::Space) {
                Some(StudyAction::Reveal)
            } else if revealed && i.key_pressed(egui::Key::Num1) {
                Some(StudyAction::Answer(false))
            } else if revealed && i.key_pressed(egui::Key::Num2) {
                Some(StudyAction::Answer(true))
            } else {
                None
            }
        })
    }

    pub(super) fn render_study_screen(&mut self, ctx: &egui::Context) {
        self.tick_session(ctx);
        let mut action = self.keyboard_action(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            let stats = *self.session.stats();

            if let Some(scope) = self.session.scope() {
                let course = self.catalog.courses.iter().find(|c| c.id == scope.course_id);
                let subtopic = self.catalog.subtopics.iter().find(|s| s.id == scope.subtopic_id);
                if let (Some(course), Some(subtopic)) = (course, subtopic) {
                    ui.heading(format!("Studying: {} / {}", course.name, subtopic.name));
                }
            }

            ui.horizontal(|ui| {
                ui.label(format!(
                    "Correct: {}   Wrong: {}   Remaining: {}",
                    stats.correct_count,
                    stats.wrong_count,
                    self.session.queue().len()
                ));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!("Time: {}", stats.elapsed_label()));
                });
            });
            ui.add(
                egui::ProgressBar::new(stats.percent_complete())
                    .text(format!("{:.0}%", stats.percent_complete() * 100.0)),
            );
            ui.add_space(10.0);

            if let Some(summary) = self.session.summary().cloned() {
                if self.session.state() == SessionState::Completed {
                    render_summary(ui, &summary);
                    ui.add_space(20.0);
                    ui.horizontal(|ui| {
                        if ui.button("Study again").clicked() {
                            action = Some(StudyAction::Restart);
                        }
                        if ui.button("Back to courses").clicked() {
                            action = Some(StudyAction::Back);
                        }
                    });
                    return;
                }
            }

            let Some(card) = self.session.current_card().cloned() else {
                ui.label("No card to show.");
                if ui.button("Back to courses").clicked() {
                    action = Some(StudyAction::Back);
                }
                return;
            };
            let revealed = self.session.is_revealed();

            if let Some(feedback) = &self.study.feedback {
                ui.label(feedback);
            }
            if let Some(difficulty) = self.session.current_difficulty() {
                ui.label(format!("Difficulty: {}", difficulty.label()));
            }

            ui.group(|ui| {
                ui.set_min_height(200.0);
                ui.vertical_centered(|ui| {
                    ui.add_space(20.0);

                    ui.heading("Question:");
                    ui.label(card.display_front());

                    ui.add_space(20.0);

                    if revealed {
                        ui.heading("Answer:");
                        ui.label(card.display_back());
                        if let Some(explanation) = &card.explanation {
                            ui.add_space(10.0);
                            ui.label(egui::RichText::new(explanation).italics());
                        }
                        if let Some(deepening) = &card.deepening {
                            ui.collapsing("Go deeper", |ui| {
                                ui.label(deepening);
                            });
                        }
                    } else {
                        ui.label("(Press 'Show answer' or Space to reveal)");
                    }

                    ui.add_space(20.0);
                });
            });

            ui.add_space(10.0);

            if revealed {
                ui.label("Did you get it right?");
                ui.horizontal(|ui| {
                    if ui.button("1 - I got it wrong").clicked() {
                        action = Some(StudyAction::Answer(false));
                    }
                    if ui.button("2 - I got it right").clicked() {
                        action = Some(StudyAction::Answer(true));
                    }
                });
            } else if ui.button("Show answer").clicked() {
                action = Some(StudyAction::Reveal);
            }

            ui.add_space(10.0);
            ui.horizontal(|ui| {
                if ui.button("< Previous").clicked() {
                    action = Some(StudyAction::Previous);
                }
                ui.label(format!(
                    "Card {} of {}",
                    self.session.position() + 1,
                    self.session.queue().len()
                ));
                if ui.button("Next >").clicked() {
                    action = Some(StudyAction::Next);
                }
            });

            ui.add_space(20.0);
            ui.horizontal(|ui| {
                if ui.button("Restart").clicked() {
                    action = Some(StudyAction::Restart);
                }
                if ui.button("End session").clicked() {
                    action = Some(StudyAction::End);
                }
            });
        });

        if let Some(action) = action {
            self.apply_study_action(action);
        }
    }

    fn apply_study_action(&mut self, action: StudyAction) {
        let result = match action {
            StudyAction::Reveal => self.session.reveal(),
            StudyAction::Answer(correct) => self.session.answer(correct).map(|report| {
                self.study.feedback = Some(match report.outcome {
                    AnswerOutcome::Correct => "Correct! Card removed from the queue.".to_string(),
                    AnswerOutcome::Incorrect => format!(
                        "Wrong. The card will come back later (difficulty: {}).",
                        report.difficulty.label()
                    ),
                });
                if let Some(summary) = report.finished {
                    self.report_save(&summary);
                }
            }),
            StudyAction::Next => self.session.next(),
            StudyAction::Previous => self.session.previous(),
            StudyAction::Restart => self.session.restart().map(|()| self.study.begin()),
            StudyAction::End => self.session.end().map(|summary| self.report_save(&summary)),
            StudyAction::Back => {
                self.session.reset();
                self.open_catalog();
                if self.current_screen == AppScreen::Study {
                    self.current_screen = AppScreen::Catalog;
                }
                Ok(())
            }
        };
        if let Err(e) = result {
            self.notify_error("Study action failed", e);
        }
    }

    fn report_save(&mut self, summary: &SessionSummary) {
        match &summary.save_error {
            None => self.notify("Session saved"),
            Some(e) => self.notify_error("Session could not be saved", e),
        }
    }

    /// Ends a running session so its progress is kept.
    pub(super) fn leave_study_session(&mut self) {
        if let SessionState::InProgress(_) = self.session.state() {
            if let Err(e) = self.session.end() {
                self.notify_error("Could not end the session", e);
            }
        }
    }
    /// Lists the signed-in user's finished sessions, newest first.
    pub(super) fn render_history_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(format!("My sessions ({})", self.history.len()));
            ui.separator();

            if self.history.is_empty() {
                ui.label("No finished sessions yet.");
                return;
            }

            egui::ScrollArea::vertical()
                .id_source("history_list")
                .show(ui, |ui| {
                    for record in &self.history {
                        let course = self
                            .catalog
                            .courses
                            .iter()
                            .find(|c| c.id == record.scope.course_id)
                            .map(|c| c.name.as_str())
                            .unwrap_or("Unknown course");
                        let finished: DateTime<Local> = record.finished_at.into();

                        ui.group(|ui| {
                            ui.label(format!(
                                "{} - {}{}",
                                finished.format("%Y-%m-%d %H:%M"),
                                course,
                                if record.completed { "" } else { " (ended early)" }
                            ));
                            ui.label(format!(
                                "{} cards, {} correct, {} wrong, {}",
                                record.stats.total_cards,
                                record.stats.correct_count,
                                record.stats.wrong_count,
                                record.stats.elapsed_label()
                            ));
                        });
                    }
                });
        });
    }
}

fn render_summary(ui: &mut egui::Ui, summary: &SessionSummary) {
    let record = &summary.record;
    if record.completed {
        ui.heading("Congratulations!");
        ui.label("You've answered every card in this subtopic correctly!");
    } else {
        ui.heading("Session ended");
    }
    ui.add_space(10.0);
    ui.label(format!("Cards: {}", record.stats.total_cards));
    ui.label(format!("Correct answers: {}", record.stats.correct_count));
    ui.label(format!("Wrong answers: {}", record.stats.wrong_count));
    if let Some(accuracy) = record.stats.accuracy() {
        ui.label(format!("Accuracy: {:.0}%", accuracy * 100.0));
    }
    ui.label(format!("Time: {}", record.stats.elapsed_label()));
    if summary.save_error.is_some() {
        ui.colored_label(
            egui::Color32::from_rgb(220, 80, 80),
            "This session could not be saved to your history.",
        );
    }
}
