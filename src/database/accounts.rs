//! Users, payments and the course access gate.

use crate::error::{AppError, Result};
use crate::models::{Course, Payment, PaymentStatus, Role, User};
use chrono::Utc;
use log::info;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};

fn parse_text<T>(idx: usize, value: String, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    parse(&value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unexpected value '{}'", value).into(),
        )
    })
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        role: parse_text(3, row.get(3)?, Role::parse)?,
        created_at: row.get(4)?,
    })
}

fn payment_from_row(row: &Row) -> rusqlite::Result<Payment> {
    Ok(Payment {
        id: row.get(0)?,
        user_id: row.get(1)?,
        course_id: row.get(2)?,
        amount_cents: row.get(3)?,
        status: parse_text(4, row.get(4)?, PaymentStatus::parse)?,
        created_at: row.get(5)?,
    })
}

// ==================== Users ====================

/// Registers a user. Emails are stored lowercased and must be unique.
pub fn create_user(email: &str, name: &str, role: Role, conn: &Connection) -> Result<User> {
    let email = email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(AppError::Validation(format!("'{}' is not an email address", email)));
    }
    if name.trim().is_empty() {
        return Err(AppError::Validation("User name cannot be empty".to_string()));
    }
    if find_user_by_email(&email, conn)?.is_some() {
        return Err(AppError::Validation(format!("{} is already registered", email)));
    }

    let created_at = Utc::now();
    conn.execute(
        "INSERT INTO users (email, name, role, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![email, name.trim(), role.as_str(), created_at],
    )?;
    let id = conn.last_insert_rowid();
    info!("User {} registered as {}", email, role.as_str());

    Ok(User {
        id,
        email,
        name: name.trim().to_string(),
        role,
        created_at,
    })
}

/// Self-service sign up. The first account becomes the administrator.
pub fn register_user(email: &str, name: &str, conn: &Connection) -> Result<User> {
    let existing: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    let role = if existing == 0 { Role::Admin } else { Role::Student };
    create_user(email, name, role, conn)
}

pub fn find_user_by_email(email: &str, conn: &Connection) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, email, name, role, created_at FROM users WHERE email = ?1",
            params![email.trim().to_lowercase()],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn get_user(user_id: i64, conn: &Connection) -> Result<User> {
    conn.query_row(
        "SELECT id, email, name, role, created_at FROM users WHERE id = ?1",
        params![user_id],
        user_from_row,
    )
    .optional()?
    .ok_or(AppError::not_found("User", user_id))
}

pub fn get_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn.prepare("SELECT id, email, name, role, created_at FROM users ORDER BY email")?;
    let users = stmt
        .query_map([], user_from_row)?
        .collect::<rusqlite::Result<Vec<User>>>()?;
    Ok(users)
}

pub fn set_user_role(user_id: i64, role: Role, conn: &Connection) -> Result<()> {
    let changed = conn.execute(
        "UPDATE users SET role = ?1 WHERE id = ?2",
        params![role.as_str(), user_id],
    )?;
    if changed == 0 {
        return Err(AppError::not_found("User", user_id));
    }
    info!("User {} is now {}", user_id, role.as_str());
    Ok(())
}

pub fn delete_user(user_id: i64, conn: &Connection) -> Result<()> {
    let changed = conn.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
    if changed == 0 {
        return Err(AppError::not_found("User", user_id));
    }
    Ok(())
}

// ==================== Payments ====================

/// Records a pending payment for the course at its current price.
pub fn request_course_access(user_id: i64, course: &Course, conn: &Connection) -> Result<Payment> {
    let existing = get_payments_for_user(user_id, conn)?
        .into_iter()
        .find(|p| {
            p.course_id == course.id
                && matches!(p.status, PaymentStatus::Pending | PaymentStatus::Approved)
        });
    if let Some(payment) = existing {
        return Ok(payment);
    }

    let created_at = Utc::now();
    conn.execute(
        "INSERT INTO payments (user_id, course_id, amount_cents, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user_id,
            course.id,
            course.price_cents,
            PaymentStatus::Pending.as_str(),
            created_at
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!("Payment {} requested by user {} for course {}", id, user_id, course.id);

    Ok(Payment {
        id,
        user_id,
        course_id: course.id,
        amount_cents: course.price_cents,
        status: PaymentStatus::Pending,
        created_at,
    })
}

pub fn set_payment_status(payment_id: i64, status: PaymentStatus, conn: &Connection) -> Result<()> {
    let changed = conn.execute(
        "UPDATE payments SET status = ?1 WHERE id = ?2",
        params![status.as_str(), payment_id],
    )?;
    if changed == 0 {
        return Err(AppError::not_found("Payment", payment_id));
    }
    info!("Payment {} marked {}", payment_id, status.as_str());
    Ok(())
}

pub fn get_payments_for_user(user_id: i64, conn: &Connection) -> Result<Vec<Payment>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, course_id, amount_cents, status, created_at
         FROM payments WHERE user_id = ?1 ORDER BY id",
    )?;
    let payments = stmt
        .query_map(params![user_id], payment_from_row)?
        .collect::<rusqlite::Result<Vec<Payment>>>()?;
    Ok(payments)
}

/// All payments, newest first.
pub fn get_payments(conn: &Connection) -> Result<Vec<Payment>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, course_id, amount_cents, status, created_at
         FROM payments ORDER BY id DESC",
    )?;
    let payments = stmt
        .query_map([], payment_from_row)?
        .collect::<rusqlite::Result<Vec<Payment>>>()?;
    Ok(payments)
}

// ==================== Access ====================

/// Staff study everything; students need a free course or an approved payment.
pub fn has_course_access(user: &User, course: &Course, conn: &Connection) -> Result<bool> {
    if user.role.is_staff() || course.is_free() {
        return Ok(true);
    }
    let approved: i64 = conn.query_row(
        "SELECT COUNT(*) FROM payments WHERE user_id = ?1 AND course_id = ?2 AND status = ?3",
        params![user.id, course.id, PaymentStatus::Approved.as_str()],
        |row| row.get(0),
    )?;
    Ok(approved > 0)
}

pub fn require_course_access(user: &User, course: &Course, conn: &Connection) -> Result<()> {
    if has_course_access(user, course, conn)? {
        Ok(())
    } else {
        Err(AppError::AccessDenied(format!(
            "{} has no access to '{}'",
            user.email, course.name
        )))
    }
}
